//! Sensor Poller
//!
//! Refreshes one device chart at a fixed cadence. The first cycle runs
//! immediately; later ticks fire on schedule whether or not earlier fetches
//! have returned, so each cycle runs as its own task and carries a sequence
//! number that lets the registry drop late, out-of-order responses.
//!
//! A poller lives until its cancellation token is cancelled.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::WardrobeApi;
use crate::chart::{RenderOutcome, SharedRegistry};
use crate::model::{Device, DeviceId, SampleSeries};

/// Refresh cadence used when nothing is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Spawns and runs polling loops against a shared registry
#[derive(Clone)]
pub struct SensorPoller {
    api: Arc<dyn WardrobeApi>,
    registry: SharedRegistry,
    interval: Duration,
}

/// Result of one fetch-and-render cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Rendered(RenderOutcome),
    Failed,
}

impl SensorPoller {
    pub fn new(api: Arc<dyn WardrobeApi>, registry: SharedRegistry, interval: Duration) -> Self {
        Self {
            api,
            registry,
            // tokio intervals reject a zero period
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `device` until `cancel` fires
    pub fn spawn(&self, device: Device, cancel: CancellationToken) -> PollHandle {
        let poller = self.clone();
        let device_id = device.device_id.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            poller.run(device, token).await;
        });

        PollHandle {
            device_id,
            cancel,
            task,
        }
    }

    async fn run(self, device: Device, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight = JoinSet::new();

        tracing::debug!(
            device_id = %device.device_id,
            interval_ms = self.interval.as_millis() as u64,
            "Poller started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = ticker.tick() => {
                    let sequence = self.registry.write().await.next_sequence(&device.device_id);
                    let poller = self.clone();
                    let device = device.clone();
                    in_flight.spawn(async move {
                        poller.poll_once(&device, sequence).await;
                    });
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(device_id = %device.device_id, "Poll cycle panicked");
                        }
                    }
                }
            }
        }

        // A cycle only observes its abort at its next yield, so drain the set
        // before reporting the poller as stopped.
        in_flight.shutdown().await;
        tracing::debug!(device_id = %device.device_id, "Poller stopped");
    }

    /// One fetch-and-render cycle for a reserved `sequence`.
    ///
    /// Failures are logged and absorbed; the caller's schedule is unaffected.
    pub async fn poll_once(&self, device: &Device, sequence: u64) -> PollOutcome {
        let key = &device.device_id;

        match self.api.temperature(&device.mac_address).await {
            Ok(batch) => {
                if batch.skipped > 0 {
                    tracing::warn!(
                        device_id = %key,
                        skipped = batch.skipped,
                        "Skipped malformed temperature samples"
                    );
                }

                let series = SampleSeries::from_samples(&batch.samples);
                let outcome = self.registry.write().await.apply(key, sequence, series);
                tracing::debug!(device_id = %key, sequence, ?outcome, "Poll applied");
                PollOutcome::Rendered(outcome)
            }
            Err(e) => {
                tracing::error!(
                    device_id = %key,
                    mac_address = %device.mac_address,
                    error = %e,
                    "Error fetching temperature data"
                );
                self.registry.write().await.mark_stale(key, sequence);
                PollOutcome::Failed
            }
        }
    }
}

/// Lifecycle handle of a running poller
pub struct PollHandle {
    device_id: DeviceId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Request the loop to stop; in-flight fetches are aborted and drained
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the loop to exit
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!(device_id = %self.device_id, "Poller panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartRegistry, Page, RecordingSurface, RegistryOptions};
    use crate::testing::{device, samples, FakeApi, Reply};

    fn registry_for(ids: &[&str], options: RegistryOptions) -> (SharedRegistry, Vec<RecordingSurface>) {
        let mut page = Page::fixed();
        let mut recorders = Vec::new();
        for id in ids {
            let recorder = RecordingSurface::new();
            page.insert(format!("chart-{}", id), Box::new(recorder.clone()));
            recorders.push(recorder);
        }
        (ChartRegistry::with_options(page, options).shared(), recorders)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_is_immediate_then_fixed_cadence() {
        let api = Arc::new(
            FakeApi::new().reply("AA", Reply::Samples(samples(&[("10:00", 20.0), ("10:05", 21.0)]))),
        );
        let (registry, _) = registry_for(&["1"], RegistryOptions::default());
        let poller = SensorPoller::new(api.clone(), registry.clone(), DEFAULT_POLL_INTERVAL);

        let handle = poller.spawn(device("1", "AA"), CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.calls_to("temperature/AA"), 1);
        assert_eq!(
            registry.read().await.get(&"1".into()).unwrap().values(),
            [20.0, 21.0]
        );

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.calls_to("temperature/AA"), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_instance_grows_with_new_samples() {
        let api = Arc::new(
            FakeApi::new()
                .reply("AA", Reply::Samples(samples(&[("10:00", 20.0), ("10:05", 21.0)])))
                .reply(
                    "AA",
                    Reply::Samples(samples(&[("10:00", 20.0), ("10:05", 21.0), ("10:10", 19.0)])),
                ),
        );
        let (registry, recorders) = registry_for(&["A"], RegistryOptions::default());
        let poller = SensorPoller::new(api, registry.clone(), DEFAULT_POLL_INTERVAL);

        let handle = poller.spawn(device("A", "AA"), CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(10)).await;
        let first = registry.read().await.get(&"A".into()).unwrap().clone();
        assert_eq!(first.chart().point_count(), 2);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        let second = registry.read().await.get(&"A".into()).unwrap().clone();
        assert_eq!(second.chart().point_count(), 3);
        assert_eq!(second.instance_id(), first.instance_id());
        assert_eq!(registry.read().await.len(), 1);
        assert_eq!(recorders[0].last_frame().unwrap().labels().len(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_discarded() {
        // First request hangs past the second one; its late answer must not win
        let api = Arc::new(
            FakeApi::new()
                .reply_after("AA", Duration::from_secs(12), Reply::Samples(samples(&[("old", 1.0)])))
                .reply("AA", Reply::Samples(samples(&[("old", 1.0), ("new", 2.0)]))),
        );
        let (registry, _) = registry_for(&["1"], RegistryOptions::default());
        let poller = SensorPoller::new(api, registry.clone(), DEFAULT_POLL_INTERVAL);

        let handle = poller.spawn(device("1", "AA"), CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(registry.read().await.latest_value(&"1".into()), Some(2.0));

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(registry.read().await.latest_value(&"1".into()), Some(2.0));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_polling() {
        let api = Arc::new(
            FakeApi::new()
                .reply("AA", Reply::Fail)
                .reply("AA", Reply::Samples(samples(&[("10:00", 20.0)]))),
        );
        let (registry, _) = registry_for(&["1"], RegistryOptions::default());
        let poller = SensorPoller::new(api.clone(), registry.clone(), DEFAULT_POLL_INTERVAL);

        let handle = poller.spawn(device("1", "AA"), CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(registry.read().await.is_empty());

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(api.calls_to("temperature/AA"), 2);
        assert_eq!(registry.read().await.latest_value(&"1".into()), Some(20.0));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_marks_stale_when_enabled() {
        let api = Arc::new(
            FakeApi::new()
                .reply("AA", Reply::Samples(samples(&[("10:00", 20.0)])))
                .reply("AA", Reply::Fail),
        );
        let (registry, _) = registry_for(
            &["1"],
            RegistryOptions {
                show_stale_badge: true,
            },
        );
        let poller = SensorPoller::new(api, registry.clone(), DEFAULT_POLL_INTERVAL);

        let d = device("1", "AA");
        let first = registry.write().await.next_sequence(&d.device_id);
        assert_eq!(
            poller.poll_once(&d, first).await,
            PollOutcome::Rendered(RenderOutcome::Created)
        );

        let second = registry.write().await.next_sequence(&d.device_id);
        assert_eq!(poller.poll_once(&d, second).await, PollOutcome::Failed);
        assert!(registry.read().await.get(&d.device_id).unwrap().is_stale());
        assert_eq!(registry.read().await.latest_value(&d.device_id), Some(20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_fetching() {
        let api = Arc::new(FakeApi::new().reply("AA", Reply::Samples(samples(&[("10:00", 20.0)]))));
        let (registry, _) = registry_for(&["1"], RegistryOptions::default());
        let poller = SensorPoller::new(api.clone(), registry, DEFAULT_POLL_INTERVAL);

        let cancel = CancellationToken::new();
        let handle = poller.spawn(device("1", "AA"), cancel.child_token());

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());

        let calls = api.calls_to("temperature/AA");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.calls_to("temperature/AA"), calls);
    }
}
