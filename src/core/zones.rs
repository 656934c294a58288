use crate::utils::error::{EtlError, Result};
use geo::{MultiPolygon, Polygon};
use geojson::GeoJson;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub code: u64,
    pub geometry: MultiPolygon<f64>,
}

/// Zone polygons keyed by code. Features sharing a code are merged into one multipolygon.
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: HashMap<u64, Zone>,
}

impl ZoneIndex {
    /// Parses a GeoJSON FeatureCollection already in EPSG:4326.
    pub fn from_geojson_str(raw: &str, code_property: &str) -> Result<Self> {
        let geojson = raw.parse::<GeoJson>()?;
        let collection = match geojson {
            GeoJson::FeatureCollection(collection) => collection,
            _ => {
                return Err(EtlError::processing(
                    "zone file must be a GeoJSON FeatureCollection",
                ))
            }
        };

        let mut index = ZoneIndex::default();
        let mut skipped = 0;
        for (i, feature) in collection.features.into_iter().enumerate() {
            let code = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(code_property))
                .and_then(parse_code);
            let Some(code) = code else {
                tracing::warn!("Zone feature {} has no usable '{}' property, skipping", i, code_property);
                skipped += 1;
                continue;
            };

            let Some(geometry) = feature.geometry else {
                tracing::warn!("Zone {} has no geometry, skipping", code);
                skipped += 1;
                continue;
            };

            let polygons: Vec<Polygon<f64>> = match geometry.value {
                value @ geojson::Value::Polygon(_) => vec![Polygon::try_from(value)?],
                value @ geojson::Value::MultiPolygon(_) => MultiPolygon::try_from(value)?.0,
                _ => {
                    tracing::warn!("Zone {} is not a Polygon or MultiPolygon, skipping", code);
                    skipped += 1;
                    continue;
                }
            };

            index.insert(code, polygons);
        }

        tracing::debug!("Loaded {} zones ({} features skipped)", index.len(), skipped);
        Ok(index)
    }

    pub fn insert(&mut self, code: u64, polygons: Vec<Polygon<f64>>) {
        self.zones
            .entry(code)
            .or_insert_with(|| Zone {
                code,
                geometry: MultiPolygon::new(Vec::new()),
            })
            .geometry
            .0
            .extend(polygons);
    }

    pub fn get(&self, code: u64) -> Option<&Zone> {
        self.zones.get(&code)
    }

    pub fn require(&self, code: u64) -> Result<&Zone> {
        self.get(code).ok_or(EtlError::ZoneNotFound { code })
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Zone codes appear as integers, as floats with no fraction, or as digit strings.
pub fn parse_code(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
        }
        _ => None,
    }
}
