//! Route gateway: merges the per-endpoint subrouters and attaches the shared
//! dashboard as router state.

use axum::Router;

use crate::SharedDashboard;

mod dashboard;
mod health;

// ---

pub fn router(dashboard: SharedDashboard) -> Router {
    // ---
    Router::new()
        .merge(dashboard::router())
        .merge(health::router())
        .with_state(dashboard)
}
