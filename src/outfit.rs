//! Outfit Advisor
//!
//! Asks the backend for an outfit matching the current weather and reveals
//! the answer one character at a time.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, ApiResult, WardrobeApi};
use crate::model::UserId;

pub struct OutfitAdvisor {
    api: Arc<dyn WardrobeApi>,
}

impl OutfitAdvisor {
    pub fn new(api: Arc<dyn WardrobeApi>) -> Self {
        Self { api }
    }

    /// Where the user is, for the weather lookup
    pub async fn location(&self, user: &UserId) -> ApiResult<String> {
        let location = self.api.location(user).await?;
        tracing::debug!(user_id = %user, location = %location, "Location resolved");
        Ok(location)
    }

    /// Outfit suggestion for `temperature` (°C) and a weather `condition`
    pub async fn suggest(&self, temperature: f64, condition: &str) -> ApiResult<String> {
        let condition = condition.trim();
        if condition.is_empty() {
            return Err(ApiError::InvalidInput("weather condition is empty".to_string()));
        }
        if !temperature.is_finite() {
            return Err(ApiError::InvalidInput(format!("invalid temperature: {}", temperature)));
        }

        let outfit = self.api.generate_outfit(temperature, condition).await?;
        tracing::info!(temperature, condition = %condition, "Outfit generated");
        Ok(outfit.trim().to_string())
    }
}

/// Character-by-character reveal of a text
#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    delay: Duration,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(Duration::from_millis(30))
    }
}

impl Typewriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Emit each growing prefix of `text`, pausing `delay` between characters
    pub async fn type_out<F>(&self, text: &str, mut emit: F)
    where
        F: FnMut(&str),
    {
        for (idx, c) in text.char_indices() {
            emit(&text[..idx + c.len_utf8()]);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}
