//! Dashboard
//!
//! Drives one page load: resolve the session, load devices, bind a chart
//! surface and start a poller per device. The returned [`DashboardView`] owns
//! every poller and tears them down deterministically.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::WardrobeApi;
use crate::chart::{ChartRegistry, Page, RegistryOptions, SharedRegistry};
use crate::config::DashboardConfig;
use crate::loader::{DeviceLoader, EMPTY_STATE_MESSAGE};
use crate::model::{Device, UserId};
use crate::poller::{PollHandle, SensorPoller, DEFAULT_POLL_INTERVAL};
use crate::session::SessionResolver;

/// Dashboard behaviour knobs
#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub poll_interval: Duration,
    pub show_stale_badge: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            show_stale_badge: false,
        }
    }
}

impl From<&DashboardConfig> for DashboardOptions {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            show_stale_badge: config.show_stale_badge,
        }
    }
}

/// What the page currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Session could not be resolved; nothing was loaded
    Initial,
    /// The user has no (loadable) devices
    Empty { message: String },
    /// One chart per device, in backend order
    Charts { devices: Vec<Device> },
}

pub struct Dashboard {
    api: Arc<dyn WardrobeApi>,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(api: Arc<dyn WardrobeApi>, options: DashboardOptions) -> Self {
        Self { api, options }
    }

    /// Run the page-load flow against `page`
    pub async fn load(&self, page: Page) -> DashboardView {
        let registry = ChartRegistry::with_options(
            page,
            RegistryOptions {
                show_stale_badge: self.options.show_stale_badge,
            },
        )
        .shared();
        let cancel = CancellationToken::new();

        let user = match SessionResolver::new(self.api.clone()).resolve().await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "Error getting user id");
                return DashboardView::new(ViewState::Initial, None, registry, cancel, Vec::new());
            }
        };

        let loader = DeviceLoader::new(self.api.clone());
        let devices = loader.load(&user).await;

        if devices.is_empty() {
            let state = ViewState::Empty {
                message: EMPTY_STATE_MESSAGE.to_string(),
            };
            return DashboardView::new(state, Some(user), registry, cancel, Vec::new());
        }

        let poller = SensorPoller::new(self.api.clone(), registry.clone(), self.options.poll_interval);
        let handles = loader.bootstrap(&devices, &registry, &poller, &cancel).await;

        tracing::info!(
            user_id = %user,
            charts = handles.len(),
            interval_ms = self.options.poll_interval.as_millis() as u64,
            "Dashboard loaded"
        );

        DashboardView::new(ViewState::Charts { devices }, Some(user), registry, cancel, handles)
    }
}

/// A loaded dashboard; dropping it cancels its pollers
pub struct DashboardView {
    state: ViewState,
    user: Option<UserId>,
    registry: SharedRegistry,
    cancel: CancellationToken,
    pollers: Vec<PollHandle>,
}

impl DashboardView {
    fn new(
        state: ViewState,
        user: Option<UserId>,
        registry: SharedRegistry,
        cancel: CancellationToken,
        pollers: Vec<PollHandle>,
    ) -> Self {
        Self {
            state,
            user,
            registry,
            cancel,
            pollers,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Resolved session user, if any
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }

    /// Text to show instead of charts, if any
    pub fn empty_message(&self) -> Option<&str> {
        match &self.state {
            ViewState::Empty { message } => Some(message),
            _ => None,
        }
    }

    /// Stop every poller, wait for them, and release all charts.
    ///
    /// Returns the number of charts that were live.
    pub async fn teardown(mut self) -> usize {
        self.cancel.cancel();
        let pollers = std::mem::take(&mut self.pollers);
        join_all(pollers.into_iter().map(PollHandle::stop)).await;

        let released = self.registry.write().await.clear();
        tracing::info!(charts = released, "Dashboard torn down");
        released
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
