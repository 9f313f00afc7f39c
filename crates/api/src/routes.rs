use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use tradepulse_core::dashboard::{Dashboard, DashboardState, SyncOutcome};
use tradepulse_core::domain::analysis::{AnalysisSnapshot, Recommendation};
use tradepulse_core::domain::filter::{BudgetTab, RiskTab};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard))
        .route("/recommendations", get(get_recommendations))
        .route("/filters", put(put_filters))
        .route("/sync", post(post_sync))
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn api_error(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.into(),
        }),
    )
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct DashboardView {
    loading: bool,
    risk_tab: RiskTab,
    budget_tab: BudgetTab,
    snapshot: Option<AnalysisSnapshot>,
    visible_recommendations: Vec<Recommendation>,
    notifications: Vec<String>,
    last_error: Option<String>,
}

impl DashboardView {
    fn from_state(state: &DashboardState) -> Self {
        Self {
            loading: state.is_loading(),
            risk_tab: state.risk_tab(),
            budget_tab: state.budget_tab(),
            snapshot: state.analysis().cloned(),
            visible_recommendations: state.visible_recommendations(),
            notifications: state.notifications().map(str::to_string).collect(),
            last_error: state.last_error().map(str::to_string),
        }
    }
}

async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    let dashboard = state.dashboard.state().await;
    Json(DashboardView::from_state(&dashboard))
}

#[derive(Debug, Default, Deserialize)]
struct TabParams {
    risk: Option<String>,
    budget: Option<String>,
}

impl TabParams {
    fn parse(&self) -> Result<(Option<RiskTab>, Option<BudgetTab>), (StatusCode, Json<ApiError>)> {
        let bad_request = |e: tradepulse_core::domain::analysis::UnknownVariant| {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        };
        let risk = self
            .risk
            .as_deref()
            .map(str::parse::<RiskTab>)
            .transpose()
            .map_err(bad_request)?;
        let budget = self
            .budget
            .as_deref()
            .map(str::parse::<BudgetTab>)
            .transpose()
            .map_err(bad_request)?;
        Ok((risk, budget))
    }
}

#[derive(Debug, Serialize)]
struct RecommendationsView {
    risk_tab: RiskTab,
    budget_tab: BudgetTab,
    recommendations: Vec<Recommendation>,
}

/// Filters the current analysis without touching the stored selection.
async fn get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<TabParams>,
) -> ApiResult<RecommendationsView> {
    let (risk, budget) = params.parse()?;
    let dashboard = state.dashboard.state().await;
    let risk_tab = risk.unwrap_or(dashboard.risk_tab());
    let budget_tab = budget.unwrap_or(dashboard.budget_tab());

    Ok(Json(RecommendationsView {
        risk_tab,
        budget_tab,
        recommendations: dashboard.recommendations_for(risk_tab, budget_tab),
    }))
}

async fn put_filters(
    State(state): State<AppState>,
    Json(params): Json<TabParams>,
) -> ApiResult<DashboardView> {
    let (risk, budget) = params.parse()?;
    if let Some(tab) = risk {
        state.dashboard.select_risk_tab(tab).await;
    }
    if let Some(tab) = budget {
        state.dashboard.select_budget_tab(tab).await;
    }

    let dashboard = state.dashboard.state().await;
    Ok(Json(DashboardView::from_state(&dashboard)))
}

async fn post_sync(State(state): State<AppState>) -> ApiResult<AnalysisSnapshot> {
    match state.dashboard.sync().await {
        SyncOutcome::Applied(snapshot) => Ok(Json(snapshot)),
        SyncOutcome::Busy => Err(api_error(StatusCode::CONFLICT, "sync already in progress")),
        SyncOutcome::Failed(error) => {
            sentry::capture_message(&error, sentry::Level::Error);
            Err(api_error(StatusCode::BAD_GATEWAY, error))
        }
        SyncOutcome::Discarded => Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "dashboard is shutting down",
        )),
    }
}
