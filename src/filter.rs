//! Range filtering of retained readings.

use crate::{FilterSpec, Reading};

// ---

impl FilterSpec {
    // ---
    /// True iff all three measurements fall inside their inclusive ranges.
    pub fn matches(&self, reading: &Reading) -> bool {
        self.temp.contains(reading.temperature)
            && self.humidity.contains(reading.humidity)
            && self.aqi.contains(reading.air_quality)
    }
}

/// Apply `spec` to `readings`, preserving input order.
///
/// Bounds are not normalized: a dimension with `min > max` matches nothing,
/// so the whole result is empty.
pub fn apply<'a>(readings: &'a [Reading], spec: &FilterSpec) -> Vec<&'a Reading> {
    // ---
    readings.iter().filter(|r| spec.matches(r)).collect()
}
