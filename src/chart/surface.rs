//! Rendering Surfaces
//!
//! A [`Page`] is the set of named surfaces charts can be bound to, addressed
//! by id (`chart-<device_id>`). Pages built with a factory can insert
//! surfaces on demand; fixed pages only expose what was registered up front.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::line::LineChart;

/// Errors raised while drawing a chart
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something a line chart can be drawn onto
pub trait ChartSurface: Send + Sync {
    fn draw(&mut self, chart: &LineChart) -> Result<(), SurfaceError>;
}

type SurfaceFactory = Box<dyn Fn(&str) -> Box<dyn ChartSurface> + Send + Sync>;

/// Named rendering surfaces of the current view
pub struct Page {
    surfaces: HashMap<String, Box<dyn ChartSurface>>,
    factory: Option<SurfaceFactory>,
}

impl Page {
    /// A page whose surfaces are all registered up front
    pub fn fixed() -> Self {
        Self {
            surfaces: HashMap::new(),
            factory: None,
        }
    }

    /// A page that creates surfaces on demand
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&str) -> Box<dyn ChartSurface> + Send + Sync + 'static,
    {
        Self {
            surfaces: HashMap::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Page writing one SVG file per surface into `dir`
    pub fn svg(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self::with_factory(move |id| Box::new(SvgSurface::new(dir.join(svg_file_name(id)))))
    }

    /// Page printing a sparkline per redraw
    pub fn terminal() -> Self {
        Self::with_factory(|_| Box::new(TerminalSurface))
    }

    /// Register a surface under `id`, replacing any previous one
    pub fn insert(&mut self, id: impl Into<String>, surface: Box<dyn ChartSurface>) {
        self.surfaces.insert(id.into(), surface);
    }

    /// Make sure a surface exists for `id`, creating it if the page can.
    ///
    /// Returns whether the surface is resolvable afterwards.
    pub fn ensure_surface(&mut self, id: &str) -> bool {
        if self.surfaces.contains_key(id) {
            return true;
        }

        match &self.factory {
            Some(factory) => {
                self.surfaces.insert(id.to_string(), factory(id));
                tracing::debug!(surface = %id, "Inserted chart surface");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.surfaces.contains_key(id)
    }

    /// Resolve a surface by id
    pub fn surface_mut(&mut self, id: &str) -> Option<&mut dyn ChartSurface> {
        self.surfaces.get_mut(id).map(|s| &mut **s as &mut dyn ChartSurface)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// File name of the SVG for surface `id`; ids are opaque backend values, so
/// anything that is not filename-safe is percent-encoded.
pub fn svg_file_name(id: &str) -> String {
    format!("{}.svg", urlencoding::encode(id))
}

#[derive(Default)]
struct PendingWrite {
    svg: Option<String>,
    writing: bool,
}

/// Writes the chart as an SVG file, overwritten on every redraw.
///
/// Inside a tokio runtime the file write runs on the blocking pool; redraws
/// that arrive while a write is running are coalesced and only the newest
/// one is written next.
pub struct SvgSurface {
    path: PathBuf,
    width: f64,
    height: f64,
    pending: Arc<Mutex<PendingWrite>>,
}

impl SvgSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: 800.0,
            height: 400.0,
            pending: Arc::default(),
        }
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// No write is queued or running
    pub fn is_idle(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        !pending.writing && pending.svg.is_none()
    }
}

// Write then rename so readers never see a half-written chart
fn write_svg(path: &Path, svg: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("svg.tmp");
    std::fs::write(&tmp, svg)?;
    std::fs::rename(&tmp, path)
}

fn drain_pending(path: &Path, pending: &Mutex<PendingWrite>) {
    loop {
        let svg = {
            let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
            match pending.svg.take() {
                Some(svg) => svg,
                None => {
                    pending.writing = false;
                    return;
                }
            }
        };

        if let Err(e) = write_svg(path, &svg) {
            tracing::warn!(path = ?path, error = %e, "Failed to write chart");
        }
    }
}

impl ChartSurface for SvgSurface {
    fn draw(&mut self, chart: &LineChart) -> Result<(), SurfaceError> {
        let svg = chart.to_svg(self.width, self.height);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            write_svg(&self.path, &svg)?;
            return Ok(());
        };

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.svg = Some(svg);
        if !pending.writing {
            pending.writing = true;
            let path = self.path.clone();
            let queue = self.pending.clone();
            runtime.spawn_blocking(move || drain_pending(&path, &queue));
        }
        Ok(())
    }
}

/// Prints `title  sparkline  latest` to stdout
pub struct TerminalSurface;

impl ChartSurface for TerminalSurface {
    fn draw(&mut self, chart: &LineChart) -> Result<(), SurfaceError> {
        let latest = match (chart.labels().last(), chart.values().last()) {
            (Some(label), Some(value)) => format!("{:.1} @ {}", value, label),
            _ => "no readings".to_string(),
        };

        let mut out = std::io::stdout().lock();
        writeln!(out, "{:<28} {} {}", chart.display_title(), chart.sparkline(), latest)?;
        Ok(())
    }
}

/// Keeps every drawn frame in memory; clones share the same frames
#[derive(Clone, Default)]
pub struct RecordingSurface {
    frames: Arc<Mutex<Vec<LineChart>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<LineChart> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_frame(&self) -> Option<LineChart> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }
}

impl ChartSurface for RecordingSurface {
    fn draw(&mut self, chart: &LineChart) -> Result<(), SurfaceError> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(chart.clone());
        Ok(())
    }
}
