use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when a string is not one of an enumeration's declared values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be one of {:?} (got {:?})",
            self.field, self.expected, self.value
        )
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Accepts the declared names, ignoring surrounding whitespace and ASCII case.
        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        field: $field,
                        value: s.to_string(),
                        expected: Self::NAMES,
                    }),
                }
            }
        }
    };
}

string_enum!(AssetType, "type", { Stock => "stock", Crypto => "crypto" });
string_enum!(Volatility, "volatility", { Low => "low", Medium => "medium", High => "high" });
string_enum!(
    /// Direction of a recommendation.
    Signal, "type", { Buy => "buy", Sell => "sell", Hold => "hold" }
);
string_enum!(RiskLevel, "riskLevel", { Low => "low", Medium => "medium", High => "high" });
string_enum!(
    /// Budget bands: low is under $1,000, medium is $1,000 to $10,000, high is above $10,000.
    BudgetCategory, "budgetCategory", { Low => "low", Medium => "medium", High => "high" }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAsset {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// Signed percent change.
    pub change: f64,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub volatility: Volatility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Display name.
    pub asset: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub signal: Signal,
    pub reason: String,
    pub target_price: f64,
    pub stop_loss: f64,
    pub timeframe: String,
    pub risk_level: RiskLevel,
    pub budget_category: BudgetCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub summary: String,
    pub recommendations: Vec<Recommendation>,
    pub top_gainers: Vec<MarketAsset>,
    pub high_volatility: Vec<MarketAsset>,
    pub safe_options: Vec<MarketAsset>,
}

/// A fetched analysis together with where and when it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub analysis_id: Uuid,
    pub provider: String,
    pub as_of_date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
    pub analysis: MarketAnalysis,
}

impl AnalysisSnapshot {
    pub fn new(provider: impl Into<String>, as_of_date: NaiveDate, analysis: MarketAnalysis) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            provider: provider.into(),
            as_of_date,
            fetched_at: Utc::now(),
            analysis,
        }
    }
}
