//! Charting
//!
//! - **LineChart**: single-series temperature chart and its SVG/sparkline rendering
//! - **Page / ChartSurface**: named rendering surfaces charts are bound to
//! - **ChartRegistry**: one live chart per device, updated in place

mod line;
mod registry;
mod surface;

pub use line::LineChart;
pub use registry::{ChartHandle, ChartRegistry, RegistryOptions, RenderOutcome, SharedRegistry};
pub use surface::{ChartSurface, Page, RecordingSurface, SurfaceError, SvgSurface, TerminalSurface};
