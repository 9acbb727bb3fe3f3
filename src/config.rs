//! Configuration loader for the `sensorflow-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Every setting has a default, so an empty
//! environment yields a working simulator-backed dashboard.
//!
use std::env;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::TimeDelta;

use crate::producer::Cadence;
use crate::retention::RetentionPolicy;
use crate::{DashboardSettings, FilterSpec};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional integer environment variable that has no default.
macro_rules! parse_env_opt_u64 {
    ($var_name:expr) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
    };
}

/// Parse an optional boolean environment variable with a default value.
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref().map(str::trim) {
            None | Some("") => $default,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => bail!("Invalid {}: expected a boolean, got '{}'", $var_name, other),
        }
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP presentation layer binds to.
    pub bind_addr: SocketAddr,

    /// Time between simulator batches.
    pub batch_interval_ms: u64,

    /// Upper bound on simulator batch size.
    pub max_batch_size: usize,

    /// Number of distinct simulated sensors.
    pub sensor_count: usize,

    /// Retention window, always positive.
    pub time_window: TimeDelta,

    /// Optional cap on the number of retained readings.
    pub max_retained: Option<usize>,

    /// Drop readings repeating an already retained `(sensor_id, timestamp)`.
    pub dedupe: bool,

    /// Cards per page.
    pub page_size: NonZeroUsize,

    /// Period of the retention re-prune tick; zero disables it.
    pub prune_tick_ms: u64,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `DASHBOARD_ADDR` – HTTP bind address (default: `0.0.0.0:8080`)
/// - `BATCH_INTERVAL_MS` – simulator cadence (default: 1000)
/// - `MAX_BATCH_SIZE` – largest simulated batch (default: 100)
/// - `SENSOR_COUNT` – simulated sensors (default: 10)
/// - `TIME_WINDOW_SECS` – retention window (default: 60)
/// - `MAX_RETAINED` – retained reading cap (default: unset)
/// - `DEDUPE` – de-duplicate readings (default: false)
/// - `PAGE_SIZE` – cards per page (default: 12)
/// - `PRUNE_TICK_MS` – periodic re-prune, 0 = on merge only (default: 0)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let bind_addr = env::var("DASHBOARD_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid DASHBOARD_ADDR: {}", e))?;

    let batch_interval_ms = parse_env_u64!("BATCH_INTERVAL_MS", 1000);
    let max_batch_size = parse_env_u64!("MAX_BATCH_SIZE", 100) as usize;
    let sensor_count = parse_env_u64!("SENSOR_COUNT", 10) as usize;
    let time_window_secs = parse_env_u64!("TIME_WINDOW_SECS", 60);
    let max_retained = parse_env_opt_u64!("MAX_RETAINED").map(|n| n as usize);
    let dedupe = parse_env_bool!("DEDUPE", false);
    let page_size = parse_env_u64!("PAGE_SIZE", 12) as usize;
    let prune_tick_ms = parse_env_u64!("PRUNE_TICK_MS", 0);

    if batch_interval_ms == 0 {
        bail!("BATCH_INTERVAL_MS must be greater than zero");
    }
    if sensor_count == 0 {
        bail!("SENSOR_COUNT must be greater than zero");
    }
    if time_window_secs == 0 {
        bail!("TIME_WINDOW_SECS must be greater than zero");
    }
    let time_window = i64::try_from(time_window_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| anyhow!("TIME_WINDOW_SECS out of range: {}", time_window_secs))?;
    let page_size =
        NonZeroUsize::new(page_size).ok_or_else(|| anyhow!("PAGE_SIZE must be greater than zero"))?;

    Ok(Config {
        bind_addr,
        batch_interval_ms,
        max_batch_size,
        sensor_count,
        time_window,
        max_retained,
        dedupe,
        page_size,
        prune_tick_ms,
    })
}

impl Config {
    /// Initial controller settings derived from this configuration.
    pub fn dashboard_settings(&self) -> DashboardSettings {
        // ---
        DashboardSettings {
            policy: RetentionPolicy {
                time_window: Some(self.time_window),
                max_count: self.max_retained,
                dedupe: self.dedupe,
            },
            page_size: self.page_size,
            filter: FilterSpec::default(),
        }
    }

    pub fn cadence(&self) -> Cadence {
        Cadence {
            batch_interval: Duration::from_millis(self.batch_interval_ms),
            max_batch_size: self.max_batch_size,
        }
    }

    pub fn prune_every(&self) -> Option<Duration> {
        (self.prune_tick_ms > 0).then(|| Duration::from_millis(self.prune_tick_ms))
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let max_retained = self
            .max_retained
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  DASHBOARD_ADDR    : {}", self.bind_addr);
        tracing::info!("  BATCH_INTERVAL_MS : {}", self.batch_interval_ms);
        tracing::info!("  MAX_BATCH_SIZE    : {}", self.max_batch_size);
        tracing::info!("  SENSOR_COUNT      : {}", self.sensor_count);
        tracing::info!("  TIME_WINDOW_SECS  : {}", self.time_window.num_seconds());
        tracing::info!("  MAX_RETAINED      : {}", max_retained);
        tracing::info!("  DEDUPE            : {}", self.dedupe);
        tracing::info!("  PAGE_SIZE         : {}", self.page_size);
        tracing::info!("  PRUNE_TICK_MS     : {}", self.prune_tick_ms);
    }
}
