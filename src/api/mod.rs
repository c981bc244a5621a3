//! Wardrobe Backend API
//!
//! Typed access to the backend endpoints the dashboard consumes.
//!
//! # Endpoints
//!
//! - `GET /api/getId` - Current user id
//! - `GET /api/devices/{userId}` - Devices registered to a user
//! - `GET /api/temperature/{mac_address}` - Temperature samples of a device
//! - `GET /api/location/{userId}` - User location (outfit advisor)
//! - `GET /api/generate-outfit/{temperature}/{condition}` - Outfit suggestion
//!
//! Everything downstream talks to [`WardrobeApi`], so tests can swap the
//! HTTP client for an in-process fake.

mod client;
pub mod dto;
pub mod error;

pub use client::HttpApiClient;
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;

use crate::model::{Device, SampleBatch, UserId};

/// Backend operations used by the dashboard flow
#[async_trait]
pub trait WardrobeApi: Send + Sync {
    /// Resolve the user the session belongs to
    async fn current_user(&self) -> ApiResult<UserId>;

    /// Devices for a user; an absent collection is returned as empty
    async fn devices(&self, user: &UserId) -> ApiResult<Vec<Device>>;

    /// Latest temperature samples for a device, validated point by point
    async fn temperature(&self, mac_address: &str) -> ApiResult<SampleBatch>;

    /// Location string used for the weather lookup
    async fn location(&self, user: &UserId) -> ApiResult<String>;

    /// Outfit suggestion for the given weather
    async fn generate_outfit(&self, temperature: f64, condition: &str) -> ApiResult<String>;
}
