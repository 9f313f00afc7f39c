//! Round trips against a local axum server standing in for the Gemini endpoint.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tradepulse_core::config::Settings;
use tradepulse_core::dashboard::{Dashboard, SyncOutcome};
use tradepulse_core::domain::analysis::{RiskLevel, Signal};
use tradepulse_core::domain::filter::{BudgetTab, RiskTab};
use tradepulse_core::llm::error::LlmDiagnosticsError;
use tradepulse_core::llm::gemini::GeminiClient;
use tradepulse_core::llm::{AnalysisRequest, LlmClient};

const API_KEY: &str = "test-key";

#[derive(Clone)]
struct FakeGemini {
    replies: Arc<Mutex<Vec<(StatusCode, Value)>>>,
    last_request: Arc<Mutex<Option<(String, Value)>>>,
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *fake.last_request.lock().await = Some((key.clone(), body));

    if key != API_KEY {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "status": "PERMISSION_DENIED"}})),
        );
    }

    let mut replies = fake.replies.lock().await;
    if replies.is_empty() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "no reply queued"})));
    }
    let (status, body) = replies.remove(0);
    (status, Json(body))
}

async fn spawn_fake(replies: Vec<(StatusCode, Value)>) -> (String, FakeGemini) {
    let fake = FakeGemini {
        replies: Arc::new(Mutex::new(replies)),
        last_request: Arc::new(Mutex::new(None)),
    };
    let app = Router::new()
        .route("/v1beta/models/*model_action", post(generate_content))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), fake)
}

fn client(base_url: &str, api_key: &str) -> GeminiClient {
    let settings = Settings {
        gemini_api_key: Some(api_key.to_string()),
        gemini_base_url: base_url.to_string(),
        gemini_timeout_secs: 5,
        ..Settings::default()
    };
    GeminiClient::from_settings(&settings).unwrap()
}

fn candidate_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn btc_aapl_analysis() -> Value {
    json!({
        "summary": "Mixed session: crypto strong, large caps flat.",
        "recommendations": [
            {
                "asset": "Bitcoin", "symbol": "BTC", "type": "buy",
                "reason": "Trend continuation", "targetPrice": 72000, "stopLoss": 64000,
                "timeframe": "1 week", "riskLevel": "high", "budgetCategory": "low"
            },
            {
                "asset": "Apple Inc.", "symbol": "AAPL", "type": "hold",
                "reason": "Consolidating", "targetPrice": 240, "stopLoss": 215,
                "timeframe": "1 month", "riskLevel": "low", "budgetCategory": "high"
            }
        ],
        "topGainers": [
            {"symbol": "BTC", "name": "Bitcoin", "price": 68000, "change": 3.2, "type": "crypto", "volatility": "high"}
        ],
        "highVolatility": [],
        "safeOptions": [
            {"symbol": "USDC", "name": "USD Coin", "price": 1.0, "change": 0.0, "type": "crypto", "volatility": "low"}
        ]
    })
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn stage(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<LlmDiagnosticsError>()
        .map(|d| d.stage)
        .unwrap_or("unknown")
}

#[tokio::test]
async fn fetches_and_validates_analysis() {
    let text = btc_aapl_analysis().to_string();
    let (base, fake) = spawn_fake(vec![(StatusCode::OK, candidate_text(&text))]).await;

    let analysis = client(&base, API_KEY)
        .fetch_market_analysis(AnalysisRequest::new(day()))
        .await
        .unwrap();

    assert_eq!(analysis.recommendations.len(), 2);
    assert_eq!(analysis.recommendations[0].signal, Signal::Buy);
    assert_eq!(analysis.recommendations[1].risk_level, RiskLevel::Low);
    assert_eq!(analysis.safe_options[0].symbol, "USDC");

    let (key, body) = fake.last_request.lock().await.clone().unwrap();
    assert_eq!(key, API_KEY);
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert!(body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("2026-10-16"));
}

#[tokio::test]
async fn non_success_status_is_http_failure() {
    let (base, _fake) = spawn_fake(vec![(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": {"code": 503, "status": "UNAVAILABLE"}}),
    )])
    .await;

    let err = client(&base, API_KEY)
        .fetch_market_analysis(AnalysisRequest::new(day()))
        .await
        .unwrap_err();
    assert_eq!(stage(&err), "http");
    let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
    assert_eq!(diag.raw_response_json.as_ref().unwrap()["error"]["code"], 503);
}

#[tokio::test]
async fn bad_api_key_is_http_failure() {
    let (base, _fake) = spawn_fake(vec![]).await;
    let err = client(&base, "wrong-key")
        .fetch_market_analysis(AnalysisRequest::new(day()))
        .await
        .unwrap_err();
    assert_eq!(stage(&err), "http");
}

#[tokio::test]
async fn malformed_body_is_parse_failure() {
    let (base, _fake) = spawn_fake(vec![
        (StatusCode::OK, candidate_text("{\"summary\": \"truncated")),
        (StatusCode::OK, candidate_text("{\"summary\": \"no lists\"}")),
        (StatusCode::OK, json!({"candidates": []})),
    ])
    .await;
    let client = client(&base, API_KEY);

    for _ in 0..3 {
        let err = client
            .fetch_market_analysis(AnalysisRequest::new(day()))
            .await
            .unwrap_err();
        assert_eq!(stage(&err), "parse");
        assert!(err.to_string().contains("market analysis unavailable"));
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), API_KEY)
        .fetch_market_analysis(AnalysisRequest::new(day()))
        .await
        .unwrap_err();
    assert_eq!(stage(&err), "transport");
}

#[tokio::test]
async fn dashboard_syncs_filters_and_survives_failure() {
    let text = btc_aapl_analysis().to_string();
    let (base, _fake) = spawn_fake(vec![
        (StatusCode::OK, candidate_text(&text)),
        (StatusCode::OK, candidate_text("not json at all")),
    ])
    .await;
    let dashboard = Dashboard::new(Arc::new(client(&base, API_KEY)), None);

    assert!(matches!(dashboard.sync_for(day()).await, SyncOutcome::Applied(_)));

    dashboard.select_risk_tab(RiskTab::Volatile).await;
    dashboard.select_budget_tab(BudgetTab::All).await;
    {
        let state = dashboard.state().await;
        let visible = state.visible_recommendations();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].symbol, "BTC");
    }

    assert!(matches!(dashboard.sync_for(day()).await, SyncOutcome::Failed(_)));
    let state = dashboard.state().await;
    assert_eq!(state.analysis().unwrap().analysis.recommendations.len(), 2);
    assert!(state.last_error().unwrap().contains("market analysis unavailable"));
}
