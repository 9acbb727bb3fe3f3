//! Simple data models for the sensor dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// A single sensor observation as emitted by the producer.
///
/// Values are not validated. A reading whose measurement could not be
/// produced carries `NaN`, which never satisfies a range comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: f64,
}

/// Inclusive `[min, max]` bound on one measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    // ---
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends. An inverted range (`min > max`) contains nothing.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Range constraints on temperature, humidity and air quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    // ---
    pub temp: Range,
    pub humidity: Range,
    pub aqi: Range,
}

/// Lower AQI bound used by the "critical air quality" preset.
pub const CRITICAL_AQI_MIN: f64 = 100.0;

impl Default for FilterSpec {
    /// Bounds of the dashboard sliders, which is also what "reset" restores.
    fn default() -> Self {
        Self {
            temp: Range::new(10.0, 40.0),
            humidity: Range::new(30.0, 90.0),
            aqi: Range::new(0.0, 200.0),
        }
    }
}

impl FilterSpec {
    // ---
    /// Same bounds, but only readings with air quality at or above the critical level.
    pub fn with_critical_aqi(self) -> Self {
        Self {
            aqi: Range::new(CRITICAL_AQI_MIN, self.aqi.max),
            ..self
        }
    }
}

/// Severity bucket shown next to each measurement on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Good,
    Warn,
    Bad,
}

impl Level {
    // ---
    pub fn temperature(celsius: f64) -> Self {
        if celsius < 20.0 {
            Level::Good
        } else if celsius <= 30.0 {
            Level::Warn
        } else {
            Level::Bad
        }
    }

    pub fn humidity(percent: f64) -> Self {
        if (30.0..=60.0).contains(&percent) {
            Level::Good
        } else {
            Level::Warn
        }
    }

    pub fn air_quality(aqi: f64) -> Self {
        if aqi < 50.0 {
            Level::Good
        } else if aqi <= 100.0 {
            Level::Warn
        } else {
            Level::Bad
        }
    }
}
