use crate::dashboard::state::{Action, DashboardState, SyncTicket};
use crate::domain::analysis::AnalysisSnapshot;
use crate::domain::filter::{BudgetTab, RiskTab};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{AnalysisRequest, LlmClient};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Result of one sync attempt. Failures are reported here rather than as errors.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Applied(AnalysisSnapshot),
    /// The fetch failed; the previous analysis, if any, is still in place.
    Failed(String),
    /// Another sync is in flight.
    Busy,
    /// The dashboard was torn down before or during the fetch.
    Discarded,
}

pub struct Dashboard {
    client: Arc<dyn LlmClient>,
    utc_offset_hours: Option<i32>,
    state: Arc<RwLock<DashboardState>>,
}

impl Dashboard {
    pub fn new(client: Arc<dyn LlmClient>, utc_offset_hours: Option<i32>) -> Self {
        Self {
            client,
            utc_offset_hours,
            state: Arc::new(RwLock::new(DashboardState::new())),
        }
    }

    pub async fn state(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().await
    }

    pub async fn select_risk_tab(&self, tab: RiskTab) {
        self.state.write().await.apply(Action::SelectRiskTab(tab));
    }

    pub async fn select_budget_tab(&self, tab: BudgetTab) {
        self.state.write().await.apply(Action::SelectBudgetTab(tab));
    }

    pub async fn teardown(&self) {
        if self.state.write().await.apply(Action::Teardown) {
            tracing::info!("dashboard torn down; in-flight results will be discarded");
        }
    }

    /// Fetches a fresh analysis stamped with today's date.
    pub async fn sync(&self) -> SyncOutcome {
        match AnalysisRequest::for_today(self.utc_offset_hours) {
            Ok(request) => self.sync_for(request.as_of_date).await,
            Err(err) => {
                tracing::error!(error = %err, "cannot resolve analysis date");
                SyncOutcome::Failed(format!("{err:#}"))
            }
        }
    }

    /// Runs one sync. The fetch lives in its own task, so dropping this future does not
    /// abort it and its result still lands in the state.
    pub async fn sync_for(&self, as_of_date: NaiveDate) -> SyncOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            if state.is_torn_down() {
                return SyncOutcome::Discarded;
            }
            match state.try_begin_sync() {
                Some(ticket) => ticket,
                None => return SyncOutcome::Busy,
            }
        };

        let provider = self.client.provider();
        tracing::info!(%as_of_date, ticket = ticket.id(), provider = provider.as_str(), "sync started");

        let task = tokio::spawn(run_sync(
            self.client.clone(),
            self.state.clone(),
            ticket,
            as_of_date,
        ));

        match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let message = format!("sync task failed: {join_err}");
                tracing::error!(%as_of_date, ticket = ticket.id(), error = %message, "sync aborted");
                let mut state = self.state.write().await;
                if !state.apply(Action::SyncFailed {
                    ticket,
                    error: message.clone(),
                }) {
                    return SyncOutcome::Discarded;
                }
                SyncOutcome::Failed(message)
            }
        }
    }
}

async fn run_sync(
    client: Arc<dyn LlmClient>,
    state: Arc<RwLock<DashboardState>>,
    ticket: SyncTicket,
    as_of_date: NaiveDate,
) -> SyncOutcome {
    let provider = client.provider();

    // The lock is released while the request is in flight.
    let result = client
        .fetch_market_analysis(AnalysisRequest::new(as_of_date))
        .await;

    let mut state = state.write().await;
    match result {
        Ok(analysis) => {
            let snapshot = AnalysisSnapshot::new(provider.as_str(), as_of_date, analysis);
            let applied = state.apply(Action::SyncSucceeded {
                ticket,
                snapshot: snapshot.clone(),
            });
            if !applied {
                tracing::warn!(ticket = ticket.id(), "discarding analysis that arrived after teardown");
                return SyncOutcome::Discarded;
            }
            tracing::info!(
                %as_of_date,
                analysis_id = %snapshot.analysis_id,
                recommendations = snapshot.analysis.recommendations.len(),
                "sync applied"
            );
            SyncOutcome::Applied(snapshot)
        }
        Err(err) => {
            let message = format!("{err:#}");
            if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                tracing::error!(
                    %as_of_date,
                    stage = diag.stage,
                    raw_output = diag.raw_output.as_deref().unwrap_or(""),
                    error = %message,
                    "sync failed; keeping previous analysis"
                );
            } else {
                tracing::error!(%as_of_date, error = %message, "sync failed; keeping previous analysis");
            }

            if !state.apply(Action::SyncFailed {
                ticket,
                error: message.clone(),
            }) {
                return SyncOutcome::Discarded;
            }
            SyncOutcome::Failed(message)
        }
    }
}
