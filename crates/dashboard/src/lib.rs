//! Polling/aggregation core of the weather dashboard.
//!
//! The [`engine::Controller`] owns the refresh cycle; everything else here
//! supports it: the restart-persistent [`cache`], the pure [`aggregate`]
//! computations, the [`gateways`] seams to remote services, and the
//! [`state`] channel the presentation layer subscribes to.

pub mod aggregate;
pub mod cache;
pub mod engine;
pub mod gateways;
pub mod state;

pub use engine::{Controller, CycleTrigger};
pub use state::{CyclePhase, DashboardState, StateHandle};
