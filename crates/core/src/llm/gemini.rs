use crate::config::Settings;
use crate::domain::analysis::{
    AssetType, BudgetCategory, MarketAnalysis, RiskLevel, Signal, Volatility,
};
use crate::llm::error::{LlmDiagnosticsError, STAGE_HTTP, STAGE_TRANSPORT};
use crate::llm::json;
use crate::llm::{AnalysisRequest, LlmClient, Provider};
use anyhow::Context;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    google_search: bool,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.gemini_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.gemini_base_url.clone(),
            model: settings.gemini_model.clone(),
            google_search: settings.gemini_google_search,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn transport_error(detail: String) -> LlmDiagnosticsError {
        LlmDiagnosticsError {
            provider: Provider::Gemini,
            stage: STAGE_TRANSPORT,
            detail,
            raw_output: None,
            raw_response_json: None,
        }
    }

    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> anyhow::Result<(serde_json::Value, GenerateContentResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(req)
            .send()
            .await
            .map_err(|e| Self::transport_error(format!("request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| Self::transport_error(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: STAGE_HTTP,
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let decoded = serde_json::from_str::<serde_json::Value>(&text)
            .context("response is not JSON")
            .and_then(|raw| {
                let parsed = serde_json::from_value::<GenerateContentResponse>(raw.clone())
                    .context("failed to decode generateContent response")?;
                Ok((raw, parsed))
            });
        decoded.map_err(|e| LlmDiagnosticsError::parse(Provider::Gemini, &e, Some(text)).into())
    }

    fn request_body(&self, input: &AnalysisRequest) -> GenerateContentRequest {
        let tools = self.google_search.then(|| {
            vec![Tool {
                google_search: serde_json::json!({}),
            }]
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: Self::prompt(input.as_of_date),
                }],
            }],
            tools,
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: Self::response_schema(),
            },
        }
    }

    fn prompt(as_of_date: NaiveDate) -> String {
        [
            format!(
                "Analyze the current stock and crypto markets for today ({}).",
                as_of_date.format("%Y-%m-%d")
            ),
            "Provide a comprehensive analysis including:".to_string(),
            "1. A general market summary.".to_string(),
            "2. Specific buy/sell recommendations with target prices, stop losses, and timing suggestions.".to_string(),
            "3. Categorize recommendations by budget: Low (<$1000), Medium ($1000-$10000), High (>$10000).".to_string(),
            "4. Identify high volatility options for aggressive traders.".to_string(),
            "5. Identify \"Safe Mode\" options (fixed-term style, secure returns like bonds, ETFs, or stablecoins).".to_string(),
            String::new(),
            "Return the data in a structured JSON format.".to_string(),
        ]
        .join("\n")
    }

    /// Schema sent as `responseSchema`. Enumerations come from the domain types so the
    /// request and the validator cannot drift apart.
    fn response_schema() -> serde_json::Value {
        fn names<T: Copy>(all: &[T], as_str: fn(T) -> &'static str) -> Vec<&'static str> {
            all.iter().copied().map(as_str).collect()
        }

        let asset = serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "symbol": {"type": "STRING"},
                "name": {"type": "STRING"},
                "price": {"type": "NUMBER"},
                "change": {"type": "NUMBER"},
                "type": {"type": "STRING", "enum": names(AssetType::ALL, AssetType::as_str)},
                "volatility": {"type": "STRING", "enum": names(Volatility::ALL, Volatility::as_str)}
            },
            "required": ["symbol", "name", "price", "change", "type", "volatility"]
        });

        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "summary": {"type": "STRING"},
                "recommendations": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "asset": {"type": "STRING"},
                            "symbol": {"type": "STRING"},
                            "type": {"type": "STRING", "enum": names(Signal::ALL, Signal::as_str)},
                            "reason": {"type": "STRING"},
                            "targetPrice": {"type": "NUMBER"},
                            "stopLoss": {"type": "NUMBER"},
                            "timeframe": {"type": "STRING"},
                            "riskLevel": {"type": "STRING", "enum": names(RiskLevel::ALL, RiskLevel::as_str)},
                            "budgetCategory": {"type": "STRING", "enum": names(BudgetCategory::ALL, BudgetCategory::as_str)}
                        },
                        "required": [
                            "asset", "symbol", "type", "reason", "targetPrice",
                            "stopLoss", "timeframe", "riskLevel", "budgetCategory"
                        ]
                    }
                },
                "topGainers": {"type": "ARRAY", "items": asset.clone()},
                "highVolatility": {"type": "ARRAY", "items": asset.clone()},
                "safeOptions": {"type": "ARRAY", "items": asset}
            },
            "required": ["summary", "recommendations", "topGainers", "highVolatility", "safeOptions"]
        })
    }

    /// Text of the first candidate, skipping thought parts.
    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let content = res.candidates.first()?.content.as_ref()?;
        let mut out = String::new();
        for part in &content.parts {
            if part.thought.unwrap_or(false) {
                continue;
            }
            if let Some(text) = &part.text {
                out.push_str(text);
            }
        }
        (!out.trim().is_empty()).then_some(out)
    }

    fn empty_response_detail(res: &GenerateContentResponse) -> String {
        let block_reason = res
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        let finish_reason = res
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref());
        match (block_reason, finish_reason) {
            (Some(block), _) => format!("response contained no text (blockReason={block})"),
            (None, Some(finish)) => format!("response contained no text (finishReason={finish})"),
            (None, None) => "response contained no text".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn fetch_market_analysis(
        &self,
        input: AnalysisRequest,
    ) -> anyhow::Result<MarketAnalysis> {
        let req = self.request_body(&input);
        tracing::debug!(%input.as_of_date, model = %self.model, "requesting market analysis");

        let (raw_json, res) = self.generate_content(&req).await?;

        let Some(text) = Self::response_text(&res) else {
            let cause = anyhow::anyhow!(Self::empty_response_detail(&res));
            let mut err = LlmDiagnosticsError::parse(Provider::Gemini, &cause, None);
            err.raw_response_json = Some(raw_json);
            return Err(err.into());
        };

        match json::parse_analysis(&text) {
            Ok(analysis) => {
                tracing::info!(
                    %input.as_of_date,
                    recommendations = analysis.recommendations.len(),
                    "market analysis parsed"
                );
                Ok(analysis)
            }
            Err(e) => {
                let mut err = LlmDiagnosticsError::parse(Provider::Gemini, &e, Some(text));
                err.raw_response_json = Some(raw_json);
                Err(err.into())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    google_search: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
