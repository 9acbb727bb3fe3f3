use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{FilterSpec, PageRequest, SharedDashboard};

// ---

pub fn router() -> Router<SharedDashboard> {
    // ---
    Router::new()
        .route("/dashboard", get(view))
        .route("/dashboard/filter", put(set_filter))
        .route("/dashboard/filter/reset", post(reset_filters))
        .route("/dashboard/filter/critical-aqi", post(show_critical_aqi))
        .route("/dashboard/time-window", put(set_time_window))
        .route("/dashboard/pause", post(toggle_pause))
        .route("/dashboard/page", post(go_to_page))
}

/// Current view model as JSON.
fn render(dashboard: &SharedDashboard) -> Response {
    // ---
    let view = dashboard.lock().view();
    (StatusCode::OK, Json(view)).into_response()
}

fn bad_request(message: String) -> Response {
    warn!("Rejected dashboard request: {}", message);
    (StatusCode::BAD_REQUEST, Json(message)).into_response()
}

async fn view(State(dashboard): State<SharedDashboard>) -> Response {
    debug!("GET /dashboard");
    render(&dashboard)
}

async fn set_filter(
    State(dashboard): State<SharedDashboard>,
    Json(spec): Json<FilterSpec>,
) -> Response {
    // ---
    info!("PUT /dashboard/filter - {:?}", spec);
    dashboard.lock().set_filter(spec);
    render(&dashboard)
}

async fn reset_filters(State(dashboard): State<SharedDashboard>) -> Response {
    info!("POST /dashboard/filter/reset");
    dashboard.lock().reset_filters();
    render(&dashboard)
}

async fn show_critical_aqi(State(dashboard): State<SharedDashboard>) -> Response {
    info!("POST /dashboard/filter/critical-aqi");
    dashboard.lock().show_critical_aqi();
    render(&dashboard)
}

/// Body of `PUT /dashboard/time-window`.
#[derive(Debug, Deserialize)]
pub struct TimeWindowBody {
    time_window_ms: i64,
}

async fn set_time_window(
    State(dashboard): State<SharedDashboard>,
    Json(body): Json<TimeWindowBody>,
) -> Response {
    // ---
    info!("PUT /dashboard/time-window - {}ms", body.time_window_ms);

    let Some(window) = TimeDelta::try_milliseconds(body.time_window_ms) else {
        return bad_request(format!("Time window out of range: {}ms", body.time_window_ms));
    };

    // Bind the result first so the guard is released before rendering
    let result = dashboard.lock().set_time_window(window, Utc::now());
    if let Err(e) = result {
        return bad_request(e.to_string());
    }
    render(&dashboard)
}

async fn toggle_pause(State(dashboard): State<SharedDashboard>) -> Response {
    // ---
    let state = dashboard.lock().toggle_pause();
    info!("POST /dashboard/pause - now {:?}", state);
    render(&dashboard)
}

/// Query parameters for `POST /dashboard/page`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// `first`, `prev`, `next`, `last` or a page number.
    to: String,
}

async fn go_to_page(
    State(dashboard): State<SharedDashboard>,
    Query(params): Query<PageQuery>,
) -> Response {
    // ---
    let request = match params.to.parse::<PageRequest>() {
        Ok(request) => request,
        Err(e) => return bad_request(e.to_string()),
    };

    let page = dashboard.lock().go_to_page(request);
    debug!("POST /dashboard/page - {:?} -> {}", request, page);
    render(&dashboard)
}
