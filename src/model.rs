//! Domain Types
//!
//! Devices, users and sensor samples as the wardrobe backend reports them.
//! Identifiers are opaque: the backend sends them as JSON numbers or strings,
//! and the client keeps them as strings.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier as it appears on the wire (number or string)
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Integer(n) => n.to_string(),
            WireId::Float(f) => f.to_string(),
        }
    }
}

fn deserialize_opaque<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireId::deserialize(deserializer).map(String::from)
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserialize_opaque(deserializer).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

opaque_id!(
    /// Current user's identifier, resolved once per page load
    UserId
);

opaque_id!(
    /// Backend device identifier, also the chart registry key
    DeviceId
);

/// A wardrobe sensor device registered to a user
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    pub device_id: DeviceId,
    pub mac_address: String,
    #[serde(default)]
    pub name: String,
}

impl Device {
    /// Identifier of the rendering surface this device's chart draws on
    pub fn surface_id(&self) -> String {
        surface_id(&self.device_id)
    }
}

/// Rendering surface id for a device key (`chart-<device_id>`)
pub fn surface_id(device_id: &DeviceId) -> String {
    format!("chart-{}", device_id)
}

/// A single temperature reading
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SensorSample {
    pub timestamp: String,
    pub value: f64,
}

impl SensorSample {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Validate one element of a sample list.
    ///
    /// The timestamp must be a string or a number, the value a finite JSON
    /// number. Anything else is rejected.
    pub fn from_json(entry: &serde_json::Value) -> Option<Self> {
        let object = entry.as_object()?;

        let timestamp = match object.get("timestamp")? {
            serde_json::Value::String(s) if !s.is_empty() => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let value = object.get("value")?.as_f64()?;
        if !value.is_finite() {
            return None;
        }

        Some(Self { timestamp, value })
    }
}

/// Sample list returned by the temperature endpoint after validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBatch {
    /// Valid samples in backend order
    pub samples: Vec<SensorSample>,
    /// Number of malformed points that were dropped
    pub skipped: usize,
}

impl SampleBatch {
    /// Validate a temperature response body.
    ///
    /// Returns `None` if the body is not a list. Malformed points are
    /// skipped and counted; order is preserved.
    pub fn from_json(body: &serde_json::Value) -> Option<Self> {
        let entries = body.as_array()?;
        let mut batch = SampleBatch::default();

        for entry in entries {
            match SensorSample::from_json(entry) {
                Some(sample) => batch.samples.push(sample),
                None => batch.skipped += 1,
            }
        }

        Some(batch)
    }
}

/// Parallel label/value sequences projected from a sample list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl SampleSeries {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        Self { labels, values }
    }

    /// Split samples into timestamps and values, keeping index correspondence
    pub fn from_samples(samples: &[SensorSample]) -> Self {
        let (labels, values) = samples
            .iter()
            .map(|s| (s.timestamp.clone(), s.value))
            .unzip();

        Self { labels, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent reading (last in backend order)
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}
