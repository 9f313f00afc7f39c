//! Application state for the dashboard: the current analysis, the two filter selectors and
//! the sync lifecycle around them.

pub mod service;
pub mod state;

pub use service::{Dashboard, SyncOutcome};
pub use state::{Action, DashboardState, SyncTicket, MAX_NOTIFICATIONS};
