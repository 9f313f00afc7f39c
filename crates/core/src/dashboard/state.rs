use crate::domain::analysis::{AnalysisSnapshot, Recommendation};
use crate::domain::filter::{filter_recommendations, BudgetTab, RiskTab};
use std::collections::VecDeque;

pub const MAX_NOTIFICATIONS: usize = 5;

/// Marks the single fetch currently allowed to complete into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket(u64);

impl SyncTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    SyncSucceeded {
        ticket: SyncTicket,
        snapshot: AnalysisSnapshot,
    },
    SyncFailed {
        ticket: SyncTicket,
        error: String,
    },
    SelectRiskTab(RiskTab),
    SelectBudgetTab(BudgetTab),
    /// The owner is going away; in-flight results must no longer land.
    Teardown,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    analysis: Option<AnalysisSnapshot>,
    risk_tab: RiskTab,
    budget_tab: BudgetTab,
    notifications: VecDeque<String>,
    last_error: Option<String>,
    in_flight: Option<SyncTicket>,
    next_ticket: u64,
    torn_down: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a ticket unless a sync is already running or the state was torn down.
    pub fn try_begin_sync(&mut self) -> Option<SyncTicket> {
        if self.torn_down || self.in_flight.is_some() {
            return None;
        }
        self.next_ticket += 1;
        let ticket = SyncTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Applies an action. Returns `false` when the action was ignored.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::SyncSucceeded { ticket, snapshot } => {
                if !self.accepts(ticket) {
                    return false;
                }
                self.in_flight = None;
                self.last_error = None;
                if let Some(first) = snapshot.analysis.recommendations.first() {
                    self.push_notification(format!(
                        "New {} signal for {}",
                        first.signal.as_str().to_ascii_uppercase(),
                        first.symbol
                    ));
                }
                self.analysis = Some(snapshot);
                true
            }
            Action::SyncFailed { ticket, error } => {
                if !self.accepts(ticket) {
                    return false;
                }
                self.in_flight = None;
                self.last_error = Some(error);
                true
            }
            Action::SelectRiskTab(tab) => {
                self.risk_tab = tab;
                true
            }
            Action::SelectBudgetTab(tab) => {
                self.budget_tab = tab;
                true
            }
            Action::Teardown => {
                let changed = !self.torn_down;
                self.torn_down = true;
                self.in_flight = None;
                changed
            }
        }
    }

    fn accepts(&self, ticket: SyncTicket) -> bool {
        !self.torn_down && self.in_flight == Some(ticket)
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_front(message);
        self.notifications.truncate(MAX_NOTIFICATIONS);
    }

    pub fn analysis(&self) -> Option<&AnalysisSnapshot> {
        self.analysis.as_ref()
    }

    pub fn risk_tab(&self) -> RiskTab {
        self.risk_tab
    }

    pub fn budget_tab(&self) -> BudgetTab {
        self.budget_tab
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Newest first.
    pub fn notifications(&self) -> impl Iterator<Item = &str> {
        self.notifications.iter().map(String::as_str)
    }

    pub fn visible_recommendations(&self) -> Vec<Recommendation> {
        self.recommendations_for(self.risk_tab, self.budget_tab)
    }

    pub fn recommendations_for(&self, risk: RiskTab, budget: BudgetTab) -> Vec<Recommendation> {
        match &self.analysis {
            Some(snapshot) => filter_recommendations(&snapshot.analysis.recommendations, risk, budget),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{
        BudgetCategory, MarketAnalysis, Recommendation, RiskLevel, Signal,
    };
    use chrono::NaiveDate;

    fn rec(symbol: &str, signal: Signal, risk: RiskLevel, budget: BudgetCategory) -> Recommendation {
        Recommendation {
            asset: symbol.to_string(),
            symbol: symbol.to_string(),
            signal,
            reason: "r".to_string(),
            target_price: 10.0,
            stop_loss: 5.0,
            timeframe: "1 week".to_string(),
            risk_level: risk,
            budget_category: budget,
        }
    }

    fn snapshot(recommendations: Vec<Recommendation>) -> AnalysisSnapshot {
        AnalysisSnapshot::new(
            "gemini",
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            MarketAnalysis {
                summary: "s".to_string(),
                recommendations,
                top_gainers: vec![],
                high_volatility: vec![],
                safe_options: vec![],
            },
        )
    }

    fn btc_and_aapl() -> AnalysisSnapshot {
        snapshot(vec![
            rec("BTC", Signal::Buy, RiskLevel::High, BudgetCategory::Low),
            rec("AAPL", Signal::Hold, RiskLevel::Low, BudgetCategory::High),
        ])
    }

    #[test]
    fn starts_empty_with_all_tabs() {
        let state = DashboardState::new();
        assert!(state.analysis().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.risk_tab(), RiskTab::All);
        assert_eq!(state.budget_tab(), BudgetTab::All);
        assert!(state.visible_recommendations().is_empty());
    }

    #[test]
    fn only_one_sync_in_flight() {
        let mut state = DashboardState::new();
        let ticket = state.try_begin_sync().unwrap();
        assert!(state.is_loading());
        assert!(state.try_begin_sync().is_none());

        assert!(state.apply(Action::SyncFailed {
            ticket,
            error: "boom".to_string()
        }));
        assert!(!state.is_loading());
        assert!(state.try_begin_sync().is_some());
    }

    #[test]
    fn volatile_tab_shows_only_btc() {
        let mut state = DashboardState::new();
        let ticket = state.try_begin_sync().unwrap();
        assert!(state.apply(Action::SyncSucceeded {
            ticket,
            snapshot: btc_and_aapl()
        }));
        state.apply(Action::SelectRiskTab(RiskTab::Volatile));
        state.apply(Action::SelectBudgetTab(BudgetTab::All));

        let visible = state.visible_recommendations();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].symbol, "BTC");
    }

    #[test]
    fn failure_keeps_previous_analysis() {
        let mut state = DashboardState::new();
        let first = state.try_begin_sync().unwrap();
        let snap = btc_and_aapl();
        let id = snap.analysis_id;
        state.apply(Action::SyncSucceeded {
            ticket: first,
            snapshot: snap,
        });

        let second = state.try_begin_sync().unwrap();
        state.apply(Action::SyncFailed {
            ticket: second,
            error: "market analysis unavailable".to_string(),
        });

        assert_eq!(state.analysis().unwrap().analysis_id, id);
        assert_eq!(state.last_error(), Some("market analysis unavailable"));
    }

    #[test]
    fn success_clears_last_error_and_replaces_analysis() {
        let mut state = DashboardState::new();
        let t = state.try_begin_sync().unwrap();
        state.apply(Action::SyncFailed {
            ticket: t,
            error: "down".to_string(),
        });

        let t = state.try_begin_sync().unwrap();
        state.apply(Action::SyncSucceeded {
            ticket: t,
            snapshot: btc_and_aapl(),
        });
        assert!(state.last_error().is_none());

        let t = state.try_begin_sync().unwrap();
        state.apply(Action::SyncSucceeded {
            ticket: t,
            snapshot: snapshot(vec![]),
        });
        assert!(state.analysis().unwrap().analysis.recommendations.is_empty());
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut state = DashboardState::new();
        let first = state.try_begin_sync().unwrap();
        state.apply(Action::SyncFailed {
            ticket: first,
            error: "x".to_string(),
        });
        let _second = state.try_begin_sync().unwrap();

        assert!(!state.apply(Action::SyncSucceeded {
            ticket: first,
            snapshot: btc_and_aapl()
        }));
        assert!(state.analysis().is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn results_after_teardown_are_discarded() {
        let mut state = DashboardState::new();
        let ticket = state.try_begin_sync().unwrap();
        assert!(state.apply(Action::Teardown));
        assert!(!state.apply(Action::SyncSucceeded {
            ticket,
            snapshot: btc_and_aapl()
        }));
        assert!(state.analysis().is_none());
        assert!(state.try_begin_sync().is_none());
        assert!(!state.apply(Action::Teardown));
    }

    #[test]
    fn notifications_are_newest_first_and_capped() {
        let mut state = DashboardState::new();
        for i in 0..7 {
            let t = state.try_begin_sync().unwrap();
            state.apply(Action::SyncSucceeded {
                ticket: t,
                snapshot: snapshot(vec![rec(
                    &format!("S{i}"),
                    Signal::Sell,
                    RiskLevel::Medium,
                    BudgetCategory::Medium,
                )]),
            });
        }

        let notes: Vec<&str> = state.notifications().collect();
        assert_eq!(notes.len(), MAX_NOTIFICATIONS);
        assert_eq!(notes[0], "New SELL signal for S6");
        assert_eq!(notes[4], "New SELL signal for S2");
    }

    #[test]
    fn empty_analysis_adds_no_notification() {
        let mut state = DashboardState::new();
        let t = state.try_begin_sync().unwrap();
        state.apply(Action::SyncSucceeded {
            ticket: t,
            snapshot: snapshot(vec![]),
        });
        assert_eq!(state.notifications().count(), 0);
    }
}
