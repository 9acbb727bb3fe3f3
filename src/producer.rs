//! Push-based sources of reading batches.
//!
//! A [`Producer`] calls back with a batch of readings at a fixed cadence until
//! the returned [`Subscription`] is ended. The dashboard only depends on the
//! trait; [`Simulator`] is the synthetic source used by the binary.

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::Reading;

// ---

/// Callback invoked with each emitted batch. Batches may be empty.
pub type BatchFn = Box<dyn FnMut(Vec<Reading>) + Send + 'static>;

/// How often a producer emits and how large its batches may get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub batch_interval: Duration,
    pub max_batch_size: usize,
}

/// A source that can be subscribed to.
pub trait Producer {
    /// Start emitting batches to `on_batch`.
    fn subscribe(&self, cadence: Cadence, on_batch: BatchFn) -> Result<Subscription>;
}

/// Handle to a running background task.
///
/// Ending it cancels the task and waits for it to exit, so no callback fires
/// once [`Subscription::unsubscribe`] returns. Dropping it only cancels.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    // ---
    pub fn new(cancel: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Run `tick` every `period` until cancelled. The first tick fires after
    /// one full period.
    pub fn every<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        // ---
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => tick(),
                }
            }
        });

        Self::new(cancel, handle)
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the task and wait for it to finish.
    pub async fn unsubscribe(mut self) {
        // ---
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "subscription task ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Value ranges of the synthetic readings, matching the dashboard sliders.
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 10.0..=40.0;
const HUMIDITY_RANGE: std::ops::RangeInclusive<f64> = 30.0..=90.0;
const AIR_QUALITY_RANGE: std::ops::RangeInclusive<f64> = 0.0..=200.0;

/// Synthetic producer emitting random readings from a fixed set of sensors.
#[derive(Debug, Clone)]
pub struct Simulator {
    sensor_count: usize,
    seed: Option<u64>,
}

impl Simulator {
    // ---
    pub fn new(sensor_count: usize) -> Self {
        Self {
            sensor_count: sensor_count.max(1),
            seed: None,
        }
    }

    /// Deterministic value stream, for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// One batch of `0..=max_batch_size` readings stamped with the current time.
fn generate_batch(rng: &mut StdRng, sensor_count: usize, max_batch_size: usize) -> Vec<Reading> {
    // ---
    let size = rng.random_range(0..=max_batch_size);
    let timestamp = Utc::now();

    (0..size)
        .map(|_| Reading {
            sensor_id: format!("sensor-{:03}", rng.random_range(1..=sensor_count)),
            timestamp,
            temperature: round1(rng.random_range(TEMPERATURE_RANGE)),
            humidity: round1(rng.random_range(HUMIDITY_RANGE)),
            air_quality: rng.random_range(AIR_QUALITY_RANGE).round(),
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Producer for Simulator {
    fn subscribe(&self, cadence: Cadence, mut on_batch: BatchFn) -> Result<Subscription> {
        // ---
        if cadence.batch_interval.is_zero() {
            bail!("Batch interval must be greater than zero");
        }

        let mut rng = self.rng();
        let sensor_count = self.sensor_count;

        info!(
            interval_ms = cadence.batch_interval.as_millis() as u64,
            max_batch_size = cadence.max_batch_size,
            sensor_count,
            "simulator started"
        );

        Ok(Subscription::every(cadence.batch_interval, move || {
            let batch = generate_batch(&mut rng, sensor_count, cadence.max_batch_size);
            debug!(size = batch.len(), "simulator emitted batch");
            on_batch(batch);
        }))
    }
}
