//! Wardrobe Backend HTTP Client
//!
//! reqwest-based implementation of [`WardrobeApi`].

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::dto::{DeviceListResponse, LocationResponse, OutfitResponse, UserIdResponse};
use super::error::{ApiError, ApiResult};
use super::WardrobeApi;
use crate::config::ApiConfig;
use crate::model::{Device, SampleBatch, UserId};

/// HTTP client for the wardrobe backend
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    /// Create a client for the backend described by `config`
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/api", self.base_url);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// GET a path and return the raw body once the status is known to be 2xx
    async fn get_text(&self, url: &str) -> ApiResult<String> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(ApiError::from_transport)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WardrobeApi for HttpApiClient {
    async fn current_user(&self) -> ApiResult<UserId> {
        let response: UserIdResponse = self.get_json(&self.url(&["getId"])).await?;
        response
            .user_id
            .ok_or_else(|| ApiError::Decode("missing user_id".to_string()))
    }

    async fn devices(&self, user: &UserId) -> ApiResult<Vec<Device>> {
        let response: DeviceListResponse =
            self.get_json(&self.url(&["devices", user.as_str()])).await?;
        Ok(response.devices.unwrap_or_default())
    }

    async fn temperature(&self, mac_address: &str) -> ApiResult<SampleBatch> {
        let body: serde_json::Value = self.get_json(&self.url(&["temperature", mac_address])).await?;
        SampleBatch::from_json(&body)
            .ok_or_else(|| ApiError::Decode("temperature response is not a list".to_string()))
    }

    async fn location(&self, user: &UserId) -> ApiResult<String> {
        let response: LocationResponse =
            self.get_json(&self.url(&["location", user.as_str()])).await?;
        Ok(response.location)
    }

    async fn generate_outfit(&self, temperature: f64, condition: &str) -> ApiResult<String> {
        let temperature = temperature.to_string();
        let response: OutfitResponse = self
            .get_json(&self.url(&["generate-outfit", temperature.as_str(), condition]))
            .await?;
        Ok(response.outfit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn spawn_backend(router: Router) -> HttpApiClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = ApiConfig {
            base_url: format!("http://{}/", addr),
            request_timeout_secs: 5,
        };
        HttpApiClient::new(&config).unwrap()
    }

    fn backend() -> Router {
        Router::new()
            .route("/api/getId", get(|| async { Json(json!({"user_id": 3})) }))
            .route(
                "/api/devices/:user_id",
                get(|Path(user_id): Path<String>| async move {
                    if user_id == "3" {
                        Json(json!({"devices": [
                            {"device_id": 1, "mac_address": "24:6F:28:AA:BB:CC", "name": "Closet"},
                            {"device_id": 2, "mac_address": "24:6F:28:DD:EE:FF", "name": "Drawer"}
                        ]}))
                    } else {
                        Json(json!({"devices": []}))
                    }
                }),
            )
            .route(
                "/api/temperature/:mac",
                get(|Path(mac): Path<String>| async move {
                    if mac == "24:6F:28:AA:BB:CC" {
                        (
                            StatusCode::OK,
                            Json(json!([
                                {"timestamp": "2025-03-01 10:00:00", "value": 20.0},
                                {"timestamp": "2025-03-01 10:05:00", "value": 21.5}
                            ])),
                        )
                    } else if mac == "broken" {
                        (StatusCode::OK, Json(json!({"detail": "no readings"})))
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"})))
                    }
                }),
            )
            .route(
                "/api/location/:user_id",
                get(|| async { Json(json!({"location": "San Diego"})) }),
            )
            .route(
                "/api/generate-outfit/:temperature/:condition",
                get(|Path((temperature, condition)): Path<(String, String)>| async move {
                    Json::<Value>(json!({"outfit": format!("{}|{}", temperature, condition)}))
                }),
            )
    }

    #[tokio::test]
    async fn test_current_user_and_devices() {
        let client = spawn_backend(backend()).await;

        let user = client.current_user().await.unwrap();
        assert_eq!(user.as_str(), "3");

        let devices = client.devices(&user).await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_id.as_str(), "1");
        assert_eq!(devices[1].name, "Drawer");

        let none = client.devices(&UserId::new("99")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_temperature_series() {
        let client = spawn_backend(backend()).await;

        let batch = client.temperature("24:6F:28:AA:BB:CC").await.unwrap();
        assert_eq!(batch.samples.len(), 2);
        assert_eq!(batch.samples[1].value, 21.5);
        assert_eq!(batch.skipped, 0);
    }

    #[tokio::test]
    async fn test_temperature_errors() {
        let client = spawn_backend(backend()).await;

        let err = client.temperature("unknown").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));

        let err = client.temperature("broken").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_user_id_is_decode_error() {
        let router = Router::new().route("/api/getId", get(|| async { Json(json!({})) }));
        let client = spawn_backend(router).await;

        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_outfit_and_location() {
        let client = spawn_backend(backend()).await;

        let location = client.location(&UserId::new("3")).await.unwrap();
        assert_eq!(location, "San Diego");

        let outfit = client.generate_outfit(18.5, "light rain").await.unwrap();
        assert_eq!(outfit, "18.5|light rain");
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
        };
        let client = HttpApiClient::new(&config).unwrap();

        let err = client.current_user().await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unavailable | ApiError::Timeout | ApiError::Request(_)
        ));
    }
}
