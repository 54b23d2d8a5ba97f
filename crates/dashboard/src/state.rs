//! Controller state published to the presentation layer.

use common::{DailySummary, ForecastPoint, Reading};
use tokio::sync::watch;

/// Where the controller currently is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    CheckingCache,
    Fetching,
    Retrying {
        attempt: u32,
    },
    Aggregating,
    Notifying,
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub phase: CyclePhase,
    pub readings: Vec<Reading>,
    pub summary: Option<DailySummary>,
    /// Current alert message; `None` when conditions are back to normal.
    pub alert: Option<String>,
    pub forecast: Vec<ForecastPoint>,
    /// Stored summaries, newest date first.
    pub history: Vec<DailySummary>,
    /// Last user-visible error, cleared on the next successful cycle.
    pub last_error: Option<String>,
    /// Epoch milliseconds of the last applied fetch.
    pub last_updated_ms: Option<i64>,
}

/// Write half of the dashboard state channel.
///
/// Mutations go through [`update`](Self::update) so every change produces
/// exactly one notification on the watch channel.
#[derive(Debug, Clone)]
pub struct StateHandle {
    tx: watch::Sender<DashboardState>,
}

impl StateHandle {
    pub fn new() -> (Self, watch::Receiver<DashboardState>) {
        let (tx, rx) = watch::channel(DashboardState::default());
        (Self { tx }, rx)
    }

    pub fn update(&self, f: impl FnOnce(&mut DashboardState)) {
        self.tx.send_modify(f);
    }

    pub fn set_phase(&self, phase: CyclePhase) {
        self.tx.send_modify(|s| s.phase = phase);
    }

    pub fn snapshot(&self) -> DashboardState {
        self.tx.borrow().clone()
    }
}
