use crate::domain::analysis::MarketAnalysis;
use chrono::NaiveDate;

pub mod error;
pub mod gemini;
pub mod json;

/// Input of one analysis fetch. The prompt itself is fixed; only its date stamp varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub as_of_date: NaiveDate,
}

impl AnalysisRequest {
    pub fn new(as_of_date: NaiveDate) -> Self {
        Self { as_of_date }
    }

    /// Stamped with the current day, see [`crate::time::as_of::resolve_as_of_date`].
    pub fn for_today(utc_offset_hours: Option<i32>) -> anyhow::Result<Self> {
        let as_of_date =
            crate::time::as_of::resolve_as_of_date(chrono::Utc::now(), utc_offset_hours)?;
        Ok(Self { as_of_date })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn fetch_market_analysis(&self, input: AnalysisRequest)
        -> anyhow::Result<MarketAnalysis>;
}
