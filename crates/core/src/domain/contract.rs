use crate::domain::analysis::{
    AssetType, BudgetCategory, MarketAnalysis, MarketAsset, Recommendation, RiskLevel, Signal,
    Volatility,
};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Analysis exactly as the model emits it. Enumerations stay as strings until validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmMarketAnalysis {
    pub summary: String,
    pub recommendations: Vec<LlmRecommendation>,
    pub top_gainers: Vec<LlmMarketAsset>,
    pub high_volatility: Vec<LlmMarketAsset>,
    pub safe_options: Vec<LlmMarketAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRecommendation {
    pub asset: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub signal: String,
    pub reason: String,
    pub target_price: f64,
    pub stop_loss: f64,
    pub timeframe: String,
    pub risk_level: String,
    pub budget_category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMarketAsset {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub volatility: String,
}

impl LlmMarketAnalysis {
    pub fn validate_and_into_analysis(self) -> anyhow::Result<MarketAnalysis> {
        let summary = self.summary.trim().to_string();
        ensure!(!summary.is_empty(), "summary must be non-empty");

        let recommendations = self
            .recommendations
            .into_iter()
            .enumerate()
            .map(|(i, rec)| {
                rec.validate_and_into_recommendation()
                    .with_context(|| format!("recommendations[{i}] is invalid"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(MarketAnalysis {
            summary,
            recommendations,
            top_gainers: validate_assets("topGainers", self.top_gainers)?,
            high_volatility: validate_assets("highVolatility", self.high_volatility)?,
            safe_options: validate_assets("safeOptions", self.safe_options)?,
        })
    }
}

fn validate_assets(list: &str, assets: Vec<LlmMarketAsset>) -> anyhow::Result<Vec<MarketAsset>> {
    assets
        .into_iter()
        .enumerate()
        .map(|(i, asset)| {
            asset
                .validate_and_into_asset()
                .with_context(|| format!("{list}[{i}] is invalid"))
        })
        .collect()
}

impl LlmRecommendation {
    fn validate_and_into_recommendation(self) -> anyhow::Result<Recommendation> {
        let symbol = non_empty("symbol", &self.symbol)?;
        let asset = non_empty("asset", &self.asset)?;

        ensure!(
            self.target_price.is_finite() && self.target_price > 0.0,
            "targetPrice must be a positive number (got {})",
            self.target_price
        );
        ensure!(
            self.stop_loss.is_finite() && self.stop_loss > 0.0,
            "stopLoss must be a positive number (got {})",
            self.stop_loss
        );

        Ok(Recommendation {
            asset,
            symbol,
            signal: self.signal.parse::<Signal>()?,
            reason: self.reason.trim().to_string(),
            target_price: self.target_price,
            stop_loss: self.stop_loss,
            timeframe: self.timeframe.trim().to_string(),
            risk_level: self.risk_level.parse::<RiskLevel>()?,
            budget_category: self.budget_category.parse::<BudgetCategory>()?,
        })
    }
}

impl LlmMarketAsset {
    fn validate_and_into_asset(self) -> anyhow::Result<MarketAsset> {
        let symbol = non_empty("symbol", &self.symbol)?;
        let name = non_empty("name", &self.name)?;

        ensure!(
            self.price.is_finite() && self.price > 0.0,
            "price must be a positive number (got {})",
            self.price
        );
        ensure!(
            self.change.is_finite(),
            "change must be a finite number (got {})",
            self.change
        );

        Ok(MarketAsset {
            symbol,
            name,
            price: self.price,
            change: self.change,
            asset_type: self.asset_type.parse::<AssetType>()?,
            volatility: self.volatility.parse::<Volatility>()?,
        })
    }
}

fn non_empty(field: &str, value: &str) -> anyhow::Result<String> {
    let trimmed = value.trim();
    ensure!(!trimmed.is_empty(), "{field} must be non-empty");
    Ok(trimmed.to_string())
}
