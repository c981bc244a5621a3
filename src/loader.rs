//! Device Loader
//!
//! Loads the user's devices once per page load and bootstraps one surface and
//! one poller per device. Load failures degrade to an empty list.

use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::WardrobeApi;
use crate::chart::SharedRegistry;
use crate::model::{Device, UserId};
use crate::poller::{PollHandle, SensorPoller};

/// Shown when the user has no devices (or they could not be loaded)
pub const EMPTY_STATE_MESSAGE: &str = "No devices registered. Add one from your profile page.";

pub struct DeviceLoader {
    api: Arc<dyn WardrobeApi>,
}

impl DeviceLoader {
    pub fn new(api: Arc<dyn WardrobeApi>) -> Self {
        Self { api }
    }

    /// Devices for `user` in backend order, duplicates removed.
    ///
    /// Never fails: errors are logged and yield an empty list.
    pub async fn load(&self, user: &UserId) -> Vec<Device> {
        let devices = match self.api.devices(user).await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!(user_id = %user, error = %e, "Error fetching devices");
                return Vec::new();
            }
        };

        if devices.is_empty() {
            tracing::warn!(user_id = %user, "No devices found");
            return devices;
        }

        let mut seen = HashSet::new();
        let total = devices.len();
        let unique: Vec<Device> = devices
            .into_iter()
            .filter(|d| seen.insert(d.device_id.clone()))
            .collect();

        if unique.len() != total {
            tracing::warn!(
                user_id = %user,
                duplicates = total - unique.len(),
                "Dropped devices with duplicate ids"
            );
        }

        tracing::info!(user_id = %user, devices = unique.len(), "Devices loaded");
        unique
    }

    /// Insert a surface for each device and start its poller.
    ///
    /// Each poller gets a child of `cancel`, so cancelling it stops them all.
    pub async fn bootstrap(
        &self,
        devices: &[Device],
        registry: &SharedRegistry,
        poller: &SensorPoller,
        cancel: &CancellationToken,
    ) -> Vec<PollHandle> {
        let mut handles = Vec::with_capacity(devices.len());

        for device in devices {
            let surface = device.surface_id();
            if !registry.write().await.page_mut().ensure_surface(&surface) {
                tracing::warn!(
                    device_id = %device.device_id,
                    surface = %surface,
                    "Page has no surface for device, its chart will not render"
                );
            }

            tracing::debug!(
                device_id = %device.device_id,
                mac_address = %device.mac_address,
                "Starting sensor poller"
            );
            handles.push(poller.spawn(device.clone(), cancel.child_token()));
        }

        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartRegistry, Page, RecordingSurface};
    use crate::poller::DEFAULT_POLL_INTERVAL;
    use crate::testing::{device, FakeApi};

    #[tokio::test]
    async fn test_load_in_backend_order() {
        let api = Arc::new(
            FakeApi::new().devices(vec![device("2", "BB"), device("1", "AA"), device("3", "CC")]),
        );
        let devices = DeviceLoader::new(api).load(&UserId::new("7")).await;

        let ids: Vec<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[tokio::test]
    async fn test_load_failure_degrades_to_empty() {
        let api = Arc::new(FakeApi::new());
        let devices = DeviceLoader::new(api.clone()).load(&UserId::new("7")).await;

        assert!(devices.is_empty());
        assert_eq!(api.calls(), vec!["devices/7".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_dropped() {
        let api = Arc::new(FakeApi::new().devices(vec![
            device("1", "AA"),
            device("1", "AA-dup"),
            device("2", "BB"),
        ]));
        let devices = DeviceLoader::new(api).load(&UserId::new("7")).await;

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].mac_address, "AA");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_one_poller_per_device() {
        for n in [0usize, 1, 4] {
            let devices: Vec<Device> = (0..n)
                .map(|i| device(&i.to_string(), &format!("MAC{}", i)))
                .collect();
            let api = Arc::new(FakeApi::new().devices(devices.clone()));
            let registry = ChartRegistry::new(Page::with_factory(|_| {
                Box::new(RecordingSurface::new())
            }))
            .shared();
            let poller = SensorPoller::new(api.clone(), registry.clone(), DEFAULT_POLL_INTERVAL);
            let cancel = CancellationToken::new();

            let loader = DeviceLoader::new(api);
            let handles = loader.bootstrap(&devices, &registry, &poller, &cancel).await;

            assert_eq!(handles.len(), n);
            let keys: HashSet<_> = handles.iter().map(|h| h.device_id().clone()).collect();
            assert_eq!(keys.len(), n);
            assert_eq!(registry.read().await.page().len(), n);

            cancel.cancel();
            for handle in handles {
                handle.stop().await;
            }
        }
    }
}
