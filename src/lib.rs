//! # Wardrobe Dashboard
//!
//! Device and sensor synchronization for the smart-wardrobe dashboard: one
//! temperature chart per registered device, kept fresh by polling the
//! wardrobe backend.
//!
//! ## Flow
//!
//! 1. [`SessionResolver`] resolves the current user once per page load
//! 2. [`DeviceLoader`] loads that user's devices and starts one poller each
//! 3. [`SensorPoller`] fetches samples at a fixed cadence
//! 4. [`ChartRegistry`] creates each chart once and updates it in place
//!
//! ## Modules
//!
//! - [`api`]: Wardrobe backend HTTP client
//! - [`chart`]: Line charts, rendering surfaces and the chart registry
//! - [`dashboard`]: Page-load orchestration and view lifecycle
//! - [`outfit`]: Weather-driven outfit suggestions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wardrobe_dashboard::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default()?;
//!     let api = Arc::new(HttpApiClient::new(&config.api)?);
//!
//!     let dashboard = Dashboard::new(api, DashboardOptions::from(&config.dashboard));
//!     let view = dashboard.load(Page::svg("./charts")).await;
//!
//!     if let Some(message) = view.empty_message() {
//!         println!("{}", message);
//!     }
//!
//!     tokio::signal::ctrl_c().await?;
//!     view.teardown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod loader;
pub mod model;
pub mod outfit;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, ApiResult, HttpApiClient, WardrobeApi};

pub use chart::{
    ChartHandle, ChartRegistry, ChartSurface, LineChart, Page, RecordingSurface, RegistryOptions,
    RenderOutcome, SharedRegistry, SurfaceError, SvgSurface, TerminalSurface,
};

pub use config::{
    generate_default_config, ApiConfig, Config, ConfigError, DashboardConfig, LoggingConfig,
    Renderer,
};

pub use dashboard::{Dashboard, DashboardOptions, DashboardView, ViewState};
pub use loader::{DeviceLoader, EMPTY_STATE_MESSAGE};
pub use model::{Device, DeviceId, SampleBatch, SampleSeries, SensorSample, UserId};
pub use outfit::{OutfitAdvisor, Typewriter};
pub use poller::{PollHandle, PollOutcome, SensorPoller, DEFAULT_POLL_INTERVAL};
pub use session::{SessionError, SessionResolver};
