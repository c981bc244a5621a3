//! Response bodies of the wardrobe backend endpoints.

use serde::Deserialize;

use crate::model::{Device, UserId};

/// `GET /api/getId`
#[derive(Debug, Deserialize)]
pub struct UserIdResponse {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// `GET /api/devices/{userId}`
///
/// `devices` may be missing or null when the user has none registered.
#[derive(Debug, Deserialize)]
pub struct DeviceListResponse {
    #[serde(default)]
    pub devices: Option<Vec<Device>>,
}

/// `GET /api/location/{userId}`
#[derive(Debug, Deserialize)]
pub struct LocationResponse {
    pub location: String,
}

/// `GET /api/generate-outfit/{temperature}/{condition}`
#[derive(Debug, Deserialize)]
pub struct OutfitResponse {
    pub outfit: String,
}
