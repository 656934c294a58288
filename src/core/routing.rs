use crate::domain::model::ModeSummary;
use geojson::FeatureCollection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("routing API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("routing request timed out")]
    Timeout,

    #[error("routing server unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected routing response: {0}")]
    Decode(String),
}

impl RoutingError {
    /// Skippable errors only affect the current pair/profile; the batch keeps going.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, RoutingError::Transport(_))
    }
}

impl From<reqwest::Error> for RoutingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RoutingError::Timeout
        } else if e.is_decode() {
            RoutingError::Decode(e.to_string())
        } else {
            RoutingError::Transport(e)
        }
    }
}

/// A routed answer: the GeoJSON as returned plus its summary.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub collection: FeatureCollection,
    pub summary: ModeSummary,
}

impl RouteResponse {
    pub fn parse(body: &str) -> Result<Self, RoutingError> {
        let collection: FeatureCollection =
            serde_json::from_str(body).map_err(|e| RoutingError::Decode(e.to_string()))?;
        Ok(Self::from_collection(collection))
    }

    /// Distance or duration missing from `features[0].properties.summary` count as 0;
    /// the service omits them for zero-length routes.
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let summary = collection
            .features
            .first()
            .and_then(|feature| feature.properties.as_ref())
            .and_then(|props| props.get("summary"))
            .and_then(|summary| summary.as_object());

        let field = |name: &str| {
            summary
                .and_then(|s| s.get(name))
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
        };

        Self {
            summary: ModeSummary {
                distance: field("distance"),
                duration: field("duration"),
            },
            collection,
        }
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.collection)
    }
}

/// Pulls `error.message` (or a string `error`) out of an API error body.
pub fn api_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.chars().take(200).collect(),
    }
}
