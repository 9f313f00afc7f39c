use crate::domain::analysis::{BudgetCategory, Recommendation, RiskLevel, UnknownVariant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk facet of the dashboard.
///
/// `Safe` shows only low-risk ideas and `Volatile` only high-risk ones, so medium-risk
/// recommendations are visible from `All` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTab {
    #[default]
    All,
    Safe,
    Volatile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTab {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl RiskTab {
    fn admits(self, risk: RiskLevel) -> bool {
        match self {
            RiskTab::All => true,
            RiskTab::Safe => risk == RiskLevel::Low,
            RiskTab::Volatile => risk == RiskLevel::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTab::All => "all",
            RiskTab::Safe => "safe",
            RiskTab::Volatile => "volatile",
        }
    }
}

impl BudgetTab {
    fn admits(self, budget: BudgetCategory) -> bool {
        match self {
            BudgetTab::All => true,
            BudgetTab::Low => budget == BudgetCategory::Low,
            BudgetTab::Medium => budget == BudgetCategory::Medium,
            BudgetTab::High => budget == BudgetCategory::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BudgetTab::All => "all",
            BudgetTab::Low => "low",
            BudgetTab::Medium => "medium",
            BudgetTab::High => "high",
        }
    }
}

impl fmt::Display for RiskTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BudgetTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTab {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RiskTab::All),
            "safe" => Ok(RiskTab::Safe),
            "volatile" => Ok(RiskTab::Volatile),
            _ => Err(UnknownVariant {
                field: "risk",
                value: s.to_string(),
                expected: &["all", "safe", "volatile"],
            }),
        }
    }
}

impl FromStr for BudgetTab {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(BudgetTab::All),
            "low" => Ok(BudgetTab::Low),
            "medium" => Ok(BudgetTab::Medium),
            "high" => Ok(BudgetTab::High),
            _ => Err(UnknownVariant {
                field: "budget",
                value: s.to_string(),
                expected: &["all", "low", "medium", "high"],
            }),
        }
    }
}

/// Keeps the recommendations admitted by both tabs, in their original order.
pub fn filter_recommendations(
    all: &[Recommendation],
    risk: RiskTab,
    budget: BudgetTab,
) -> Vec<Recommendation> {
    all.iter()
        .filter(|rec| risk.admits(rec.risk_level) && budget.admits(rec.budget_category))
        .cloned()
        .collect()
}
