//! Dashboard controller: owns the retained readings and the user-facing
//! filter, page, pause and time-window state, and derives the view model.
//!
//! Every mutation goes through one of the operation methods below; the view
//! model is recomputed from scratch on each call to [`DashboardController::view`].

use std::num::NonZeroUsize;

use anyhow::{bail, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::pagination::{self, PageRequest};
use crate::retention::{self, RetentionPolicy};
use crate::{filter, FilterSpec, Level, Reading};

// ---

/// Whether incoming batches are merged or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Active,
    Paused,
}

/// Cards per page in the reference layout.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(12) {
    Some(n) => n,
    None => panic!("page size must be non-zero"),
};

/// Initial settings for a controller.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    // ---
    pub policy: RetentionPolicy,
    pub page_size: NonZeroUsize,
    pub filter: FilterSpec,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            policy: RetentionPolicy::time_window(TimeDelta::seconds(60)),
            page_size: DEFAULT_PAGE_SIZE,
            filter: FilterSpec::default(),
        }
    }
}

/// A reading as shown on a card, with its severity levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    // ---
    #[serde(flatten)]
    pub reading: Reading,
    pub temperature_level: Level,
    pub humidity_level: Level,
    pub air_quality_level: Level,
}

impl From<&Reading> for CardView {
    fn from(reading: &Reading) -> Self {
        Self {
            reading: reading.clone(),
            temperature_level: Level::temperature(reading.temperature),
            humidity_level: Level::humidity(reading.humidity),
            air_quality_level: Level::air_quality(reading.air_quality),
        }
    }
}

/// Read-only snapshot consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViewModel {
    // ---
    pub visible_readings: Vec<CardView>,
    pub current_page: usize,
    pub total_pages: usize,
    pub paused: bool,
    pub time_window_ms: Option<i64>,
    pub filter: FilterSpec,
    pub retained_count: usize,
    pub filtered_count: usize,
}

/// Single writer for the retained set and all dashboard configuration.
#[derive(Debug)]
pub struct DashboardController {
    // ---
    retained: Vec<Reading>,
    policy: RetentionPolicy,
    filter: FilterSpec,
    page_size: NonZeroUsize,
    current_page: usize,
    state: PauseState,
}

impl DashboardController {
    // ---
    pub fn new(settings: DashboardSettings) -> Self {
        Self {
            retained: Vec::new(),
            policy: settings.policy,
            filter: settings.filter,
            page_size: settings.page_size,
            current_page: 1,
            state: PauseState::Active,
        }
    }

    /// Merge a producer batch. Returns `false` when the batch was dropped
    /// because the dashboard is paused.
    pub fn on_batch(&mut self, batch: Vec<Reading>, now: DateTime<Utc>) -> bool {
        // ---
        if self.state == PauseState::Paused {
            debug!(dropped = batch.len(), "dashboard paused, dropping batch");
            return false;
        }

        let received = batch.len();
        self.retained = retention::merge(&self.retained, batch, &self.policy, now);
        debug!(received, retained = self.retained.len(), "batch merged");
        true
    }

    /// Re-apply retention without new data, so time-window expiry happens
    /// between batches.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        // ---
        let before = self.retained.len();
        self.retained = retention::merge(&self.retained, Vec::new(), &self.policy, now);
        if self.retained.len() != before {
            debug!(expired = before - self.retained.len(), "pruned expired readings");
        }
    }

    pub fn set_filter(&mut self, spec: FilterSpec) {
        // ---
        info!(?spec, "filter changed");
        self.filter = spec;
        self.current_page = 1;
    }

    pub fn reset_filters(&mut self) {
        self.set_filter(FilterSpec::default());
    }

    pub fn show_critical_aqi(&mut self) {
        self.set_filter(self.filter.with_critical_aqi());
    }

    /// Change the retention window and prune the retained set against it.
    ///
    /// Widening the window cannot bring back readings that were already dropped.
    pub fn set_time_window(&mut self, window: TimeDelta, now: DateTime<Utc>) -> Result<()> {
        // ---
        if window <= TimeDelta::zero() {
            bail!("Time window must be positive, got {}ms", window.num_milliseconds());
        }

        info!(window_ms = window.num_milliseconds(), "time window changed");
        self.policy.time_window = Some(window);
        self.current_page = 1;
        self.refresh(now);
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> PauseState {
        // ---
        self.state = match self.state {
            PauseState::Active => PauseState::Paused,
            PauseState::Paused => PauseState::Active,
        };
        info!(state = ?self.state, "pause toggled");
        self.state
    }

    /// Navigate, storing the clamped page so repeated requests are stable.
    pub fn go_to_page(&mut self, request: PageRequest) -> usize {
        // ---
        let filtered = filter::apply(&self.retained, &self.filter).len();
        let total_pages = pagination::total_pages(filtered, self.page_size);
        let current = pagination::clamp_page(self.current_page as i64, total_pages);

        let requested = request.resolve(current, total_pages);
        self.current_page = pagination::clamp_page(requested, total_pages);
        debug!(?request, page = self.current_page, total_pages, "page changed");
        self.current_page
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn retained(&self) -> &[Reading] {
        &self.retained
    }

    /// Derive the view model from the current state.
    pub fn view(&self) -> DashboardViewModel {
        // ---
        let filtered = filter::apply(&self.retained, &self.filter);
        let page = pagination::slice(&filtered, self.page_size, self.current_page as i64);

        DashboardViewModel {
            visible_readings: page.items.into_iter().map(CardView::from).collect(),
            current_page: page.effective_page,
            total_pages: page.total_pages,
            paused: self.state == PauseState::Paused,
            time_window_ms: self.policy.time_window.map(|w| w.num_milliseconds()),
            filter: self.filter,
            retained_count: self.retained.len(),
            filtered_count: filtered.len(),
        }
    }
}
