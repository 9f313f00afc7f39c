use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

pub const STAGE_TRANSPORT: &str = "transport";
pub const STAGE_HTTP: &str = "http";
pub const STAGE_PARSE: &str = "parse";

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    /// The provider answered, but not with a usable analysis.
    pub fn is_parse_failure(&self) -> bool {
        self.stage == STAGE_PARSE
    }

    pub fn parse(provider: Provider, err: &anyhow::Error, raw_output: Option<String>) -> Self {
        Self {
            provider,
            stage: STAGE_PARSE,
            detail: format!("market analysis unavailable: {err:#}"),
            raw_output,
            raw_response_json: None,
        }
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={}, stage={}): {}",
            self.provider.as_str(),
            self.stage,
            self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
