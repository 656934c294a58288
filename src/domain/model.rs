use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(pt: geo::Point<f64>) -> Self {
        Self::new(pt.x(), pt.y())
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.lon, c.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPair {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl PointPair {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

/// Survey attributes carried alongside each sampled pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripAttributes {
    pub vehicle: String,
    pub weekday: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyTrip {
    pub origin_zone: u64,
    pub destination_zone: u64,
    pub attributes: TripAttributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampledPair {
    pub pair: PointPair,
    pub attributes: Option<TripAttributes>,
}

/// Summary of one routed profile: metres and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModeSummary {
    pub distance: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRow {
    pub id: usize,
    pub sample: SampledPair,
    pub haversine_km: f64,
    /// One entry per configured profile, in profile order.
    pub modes: Vec<Option<ModeSummary>>,
}

/// Everything the routing loop produced for a batch of pairs.
#[derive(Debug, Clone, Default)]
pub struct RouteBatchResult {
    pub rows: Vec<RouteRow>,
    pub profiles: Vec<String>,
    pub routed_calls: usize,
    pub skipped_calls: usize,
}
