//! Streaming retention, filtering and pagination core of the sensor dashboard.
//!
//! Follows the Explicit Module Boundary Pattern (EMBP): sibling modules import
//! shared types from this gateway rather than from each other's files.

pub mod config;
pub mod dashboard;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod producer;
pub mod retention;
pub mod routes;
pub mod session;

pub use config::Config;
pub use dashboard::{
    CardView, DashboardController, DashboardSettings, DashboardViewModel, PauseState,
};
pub use models::{FilterSpec, Level, Range, Reading};
pub use pagination::{Page, PageRequest};
pub use producer::{BatchFn, Cadence, Producer, Simulator, Subscription};
pub use retention::RetentionPolicy;
pub use session::{DashboardSession, SharedDashboard};
