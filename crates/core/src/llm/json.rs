use crate::domain::analysis::MarketAnalysis;
use crate::domain::contract::LlmMarketAnalysis;
use anyhow::Context;

/// Pulls the JSON object out of model output that may be fenced or wrapped in prose.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if let Some(fenced) = trimmed.strip_prefix("```") {
        // Drop the info string (```json) along with the opening fence line.
        let body = fenced.split_once('\n').map_or("", |(_, rest)| rest);
        let body = body.rfind("```").map_or(body, |end| &body[..end]);
        return Some(body.trim());
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&trimmed[start..=end])
}

/// Decodes and validates a complete analysis. Nothing partial is ever returned.
pub fn parse_analysis(text: &str) -> anyhow::Result<MarketAnalysis> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim());
    anyhow::ensure!(!json_str.is_empty(), "model returned an empty response");
    let parsed = serde_json::from_str::<LlmMarketAnalysis>(json_str)
        .context("model output does not match the market analysis schema")?;
    parsed.validate_and_into_analysis()
}
