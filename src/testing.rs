//! In-process backend used by the flow tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{ApiError, ApiResult, WardrobeApi};
use crate::model::{Device, SampleBatch, SensorSample, UserId};

/// Scripted reply of the temperature endpoint
#[derive(Clone)]
pub(crate) enum Reply {
    Samples(Vec<SensorSample>),
    /// Holds the worker thread before answering, like a slow synchronous parse
    Blocking(Duration, Vec<SensorSample>),
    Fail,
}

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    reply: Reply,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    user: Option<UserId>,
    devices: Option<Vec<Device>>,
    temperature: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

pub(crate) fn device(id: &str, mac: &str) -> Device {
    Device {
        device_id: id.into(),
        mac_address: mac.to_string(),
        name: format!("Sensor {}", id),
    }
}

pub(crate) fn samples(points: &[(&str, f64)]) -> Vec<SensorSample> {
    points
        .iter()
        .map(|(t, v)| SensorSample::new(*t, *v))
        .collect()
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, id: &str) -> Self {
        self.user = Some(UserId::new(id));
        self
    }

    /// Device list for every user; not calling this makes the endpoint fail
    pub fn devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = Some(devices);
        self
    }

    /// Queue a reply for a mac; the last queued reply repeats forever
    pub fn reply(self, mac: &str, reply: Reply) -> Self {
        self.reply_after(mac, Duration::ZERO, reply)
    }

    pub fn reply_after(self, mac: &str, delay: Duration, reply: Reply) -> Self {
        self.temperature
            .lock()
            .unwrap()
            .entry(mac.to_string())
            .or_default()
            .push_back(Scripted { delay, reply });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WardrobeApi for FakeApi {
    async fn current_user(&self) -> ApiResult<UserId> {
        self.record("getId".to_string());
        self.user.clone().ok_or(ApiError::Unavailable)
    }

    async fn devices(&self, user: &UserId) -> ApiResult<Vec<Device>> {
        self.record(format!("devices/{}", user));
        self.devices.clone().ok_or(ApiError::Status {
            status: 500,
            message: "Internal Server Error".to_string(),
        })
    }

    async fn temperature(&self, mac_address: &str) -> ApiResult<SampleBatch> {
        self.record(format!("temperature/{}", mac_address));

        let scripted = {
            let mut scripts = self.temperature.lock().unwrap();
            let queue = scripts.get_mut(mac_address);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let Some(scripted) = scripted else {
            return Err(ApiError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        match scripted.reply {
            Reply::Samples(samples) => Ok(SampleBatch { samples, skipped: 0 }),
            Reply::Blocking(hold, samples) => {
                std::thread::sleep(hold);
                Ok(SampleBatch { samples, skipped: 0 })
            }
            Reply::Fail => Err(ApiError::Unavailable),
        }
    }

    async fn location(&self, user: &UserId) -> ApiResult<String> {
        self.record(format!("location/{}", user));
        Ok("San Diego".to_string())
    }

    async fn generate_outfit(&self, temperature: f64, condition: &str) -> ApiResult<String> {
        self.record(format!("generate-outfit/{}/{}", temperature, condition));
        Ok(format!("Light jacket for {} and {}°C", condition, temperature))
    }
}
