//! A running dashboard: the shared controller plus its producer subscription.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::producer::{Cadence, Producer, Subscription};
use crate::DashboardController;

// ---

/// Controller shared between the producer callback and the presentation layer.
///
/// The lock is only held for synchronous merge/filter/paginate work and never
/// across an await point.
pub type SharedDashboard = Arc<Mutex<DashboardController>>;

/// Owns the producer subscription for one dashboard session.
pub struct DashboardSession {
    dashboard: SharedDashboard,
    subscription: Option<Subscription>,
    prune_tick: Option<Subscription>,
}

impl DashboardSession {
    // ---
    /// Subscribe `controller` to `producer`.
    ///
    /// A producer that fails to start leaves the dashboard running without
    /// updates. With `prune_every` set, retention is also re-applied on that
    /// period so expired readings disappear without new traffic.
    pub fn start<P: Producer>(
        controller: DashboardController,
        producer: &P,
        cadence: Cadence,
        prune_every: Option<Duration>,
    ) -> Self {
        // ---
        let dashboard: SharedDashboard = Arc::new(Mutex::new(controller));

        let sink = Arc::clone(&dashboard);
        let subscription = match producer.subscribe(
            cadence,
            Box::new(move |batch| {
                sink.lock().on_batch(batch, Utc::now());
            }),
        ) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!(error = %e, "producer failed to start, dashboard will not update");
                None
            }
        };

        let prune_tick = prune_every.filter(|p| !p.is_zero()).map(|period| {
            info!(period_ms = period.as_millis() as u64, "periodic pruning enabled");
            let target = Arc::clone(&dashboard);
            Subscription::every(period, move || target.lock().refresh(Utc::now()))
        });

        Self {
            dashboard,
            subscription,
            prune_tick,
        }
    }

    pub fn dashboard(&self) -> SharedDashboard {
        Arc::clone(&self.dashboard)
    }

    pub fn is_receiving(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// End the session. Consumes `self`, so the producer is unsubscribed
    /// exactly once and no callback runs after this returns.
    pub async fn end(mut self) {
        // ---
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }
        if let Some(tick) = self.prune_tick.take() {
            tick.unsubscribe().await;
        }
        info!("dashboard session ended");
    }
}
