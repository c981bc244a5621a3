//! Chart Registry
//!
//! Holds at most one live chart per device key. Every update goes through a
//! single upsert ([`ChartRegistry::render_or_update`]); an existing chart is
//! mutated and redrawn, never replaced.
//!
//! Polled updates use [`ChartRegistry::apply`], which carries a per-key
//! sequence number so a slow response cannot overwrite fresher data.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::line::LineChart;
use super::surface::Page;
use crate::model::{surface_id, DeviceId, SampleSeries};

/// Registry shared between the dashboard and its pollers
pub type SharedRegistry = Arc<RwLock<ChartRegistry>>;

/// One live chart bound to a surface
#[derive(Debug, Clone)]
pub struct ChartHandle {
    instance_id: Uuid,
    surface_id: String,
    chart: LineChart,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    redraws: u64,
}

impl ChartHandle {
    /// Identity of the underlying chart object; stable across updates
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    pub fn chart(&self) -> &LineChart {
        &self.chart
    }

    pub fn labels(&self) -> &[String] {
        self.chart.labels()
    }

    pub fn values(&self) -> &[f64] {
        self.chart.values()
    }

    pub fn is_stale(&self) -> bool {
        self.chart.is_stale()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Draw calls issued on this chart, including the initial one
    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

/// What a render-or-update call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A new chart was bound to the device's surface
    Created,
    /// The existing chart was updated in place
    Updated,
    /// No chart existed and the surface could not be resolved
    SurfaceMissing,
    /// A fresher response was already applied for this key
    Superseded,
}

/// Per-key sequence bookkeeping
#[derive(Debug, Clone, Copy, Default)]
struct SequenceState {
    issued: u64,
    applied: u64,
}

/// Registry options
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
    /// Mark charts whose last poll failed
    pub show_stale_badge: bool,
}

/// Keyed set of live charts for the current view
pub struct ChartRegistry {
    page: Page,
    charts: HashMap<DeviceId, ChartHandle>,
    sequences: HashMap<DeviceId, SequenceState>,
    options: RegistryOptions,
}

impl ChartRegistry {
    pub fn new(page: Page) -> Self {
        Self::with_options(page, RegistryOptions::default())
    }

    pub fn with_options(page: Page, options: RegistryOptions) -> Self {
        Self {
            page,
            charts: HashMap::new(),
            sequences: HashMap::new(),
            options,
        }
    }

    /// Wrap for sharing with pollers
    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    pub fn get(&self, key: &DeviceId) -> Option<&ChartHandle> {
        self.charts.get(key)
    }

    pub fn contains(&self, key: &DeviceId) -> bool {
        self.charts.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &DeviceId> {
        self.charts.keys()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Latest reading shown for a device
    pub fn latest_value(&self, key: &DeviceId) -> Option<f64> {
        self.charts.get(key).and_then(|h| h.values().last().copied())
    }

    /// Create the chart for `key` or update it in place.
    ///
    /// A missing surface is logged and leaves the registry untouched.
    pub fn render_or_update(
        &mut self,
        key: &DeviceId,
        labels: Vec<String>,
        values: Vec<f64>,
    ) -> RenderOutcome {
        if let Some(handle) = self.charts.get_mut(key) {
            handle.chart.set_data(labels, values);
            handle.chart.set_stale(false);
            handle.updated_at = Utc::now();
            handle.redraws += 1;
            Self::redraw(&mut self.page, handle, key);
            return RenderOutcome::Updated;
        }

        let surface = surface_id(key);
        if self.page.surface_mut(&surface).is_none() {
            tracing::error!(
                device_id = %key,
                surface = %surface,
                "Chart surface not found, skipping render"
            );
            return RenderOutcome::SurfaceMissing;
        }

        let mut chart = LineChart::temperature(key.as_str());
        chart.set_data(labels, values);

        let now = Utc::now();
        let mut handle = ChartHandle {
            instance_id: Uuid::new_v4(),
            surface_id: surface,
            chart,
            created_at: now,
            updated_at: now,
            redraws: 1,
        };
        Self::redraw(&mut self.page, &mut handle, key);

        tracing::info!(
            device_id = %key,
            chart_id = %handle.instance_id,
            points = handle.chart.point_count(),
            "Chart created"
        );
        self.charts.insert(key.clone(), handle);
        RenderOutcome::Created
    }

    /// Reserve the next sequence number for an outgoing request on `key`
    pub fn next_sequence(&mut self, key: &DeviceId) -> u64 {
        let state = self.sequences.entry(key.clone()).or_default();
        state.issued += 1;
        state.issued
    }

    /// Highest sequence applied so far for `key` (0 if none)
    pub fn applied_sequence(&self, key: &DeviceId) -> u64 {
        self.sequences.get(key).map(|s| s.applied).unwrap_or(0)
    }

    /// Apply a response tagged with `sequence`, unless a fresher one already landed
    pub fn apply(&mut self, key: &DeviceId, sequence: u64, series: SampleSeries) -> RenderOutcome {
        let applied = self.applied_sequence(key);
        if sequence <= applied {
            tracing::debug!(
                device_id = %key,
                sequence,
                applied,
                "Discarding stale response"
            );
            return RenderOutcome::Superseded;
        }

        let outcome = self.render_or_update(key, series.labels, series.values);
        if matches!(outcome, RenderOutcome::Created | RenderOutcome::Updated) {
            let state = self.sequences.entry(key.clone()).or_default();
            state.applied = sequence;
            state.issued = state.issued.max(sequence);
        }
        outcome
    }

    /// Flag the chart for `key` as stale after the request `sequence` failed.
    ///
    /// No-op unless the stale badge is enabled, the chart exists, and no
    /// fresher response has been applied. Returns whether the chart changed.
    pub fn mark_stale(&mut self, key: &DeviceId, sequence: u64) -> bool {
        if !self.options.show_stale_badge || sequence <= self.applied_sequence(key) {
            return false;
        }

        let Some(handle) = self.charts.get_mut(key) else {
            return false;
        };
        if handle.chart.is_stale() {
            return false;
        }

        handle.chart.set_stale(true);
        handle.redraws += 1;
        Self::redraw(&mut self.page, handle, key);
        true
    }

    /// Drop every chart and sequence; returns how many charts were live
    pub fn clear(&mut self) -> usize {
        let count = self.charts.len();
        self.charts.clear();
        self.sequences.clear();
        count
    }

    fn redraw(page: &mut Page, handle: &mut ChartHandle, key: &DeviceId) {
        match page.surface_mut(&handle.surface_id) {
            Some(surface) => {
                if let Err(e) = surface.draw(&handle.chart) {
                    tracing::warn!(device_id = %key, error = %e, "Chart redraw failed");
                }
            }
            None => {
                tracing::warn!(
                    device_id = %key,
                    surface = %handle.surface_id,
                    "Chart surface disappeared, redraw skipped"
                );
            }
        }
    }
}
