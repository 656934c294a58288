use crate::config::job_config::RoutingConfig;
use crate::core::routing::{api_error_message, RouteResponse, RoutingError};
use crate::domain::model::PointPair;
use crate::domain::ports::RouteProvider;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;

/// OpenRouteService directions client (`/v2/directions/{profile}/geojson`).
pub struct OrsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    extra_info: Vec<String>,
}

impl OrsClient {
    pub fn new(config: &RoutingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            extra_info: config.extra_info.clone(),
        })
    }

    fn directions_url(&self, profile: &str) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, profile)
    }
}

#[async_trait]
impl RouteProvider for OrsClient {
    async fn directions(
        &self,
        profile: &str,
        pair: &PointPair,
    ) -> std::result::Result<RouteResponse, RoutingError> {
        let url = self.directions_url(profile);

        let mut body = serde_json::json!({
            "coordinates": [
                [pair.origin.lon, pair.origin.lat],
                [pair.destination.lon, pair.destination.lat]
            ]
        });
        if !self.extra_info.is_empty() {
            body["extra_info"] = serde_json::json!(self.extra_info);
        }

        let mut request = self
            .client
            .post(&url)
            .header(ACCEPT, "application/geo+json, application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, key);
        }

        tracing::debug!("POST {}", url);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        RouteResponse::parse(&text)
    }
}
