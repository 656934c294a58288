//! Flat CSV tables: sampled points and per-profile route summaries.
//!
//! Coordinates are written as `[lon, lat]` text cells so files produced by
//! earlier runs of the survey tooling stay readable.

use crate::domain::model::{Coordinate, PointPair, RouteBatchResult, SampledPair, TripAttributes};
use crate::core::survey::parse_weight;
use crate::utils::error::{EtlError, Result};
use csv::StringRecord;

pub fn parse_coordinate(raw: &str) -> Result<Coordinate> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| EtlError::processing(format!("'{}' is not a [lon, lat] cell", raw)))?;

    let values: Vec<f64> = inner
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| EtlError::processing(format!("'{}' has a bad number: {}", raw, e)))?;

    match values.as_slice() {
        [lon, lat] => Ok(Coordinate::new(*lon, *lat)),
        _ => Err(EtlError::processing(format!(
            "'{}' must hold exactly two numbers",
            raw
        ))),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_points(samples: &[SampledPair]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "point_A", "point_B", "vehicle", "weekday", "weight"])?;

    for (id, sample) in samples.iter().enumerate() {
        let attributes = sample.attributes.clone().unwrap_or_default();
        writer.write_record([
            id.to_string(),
            sample.pair.origin.to_string(),
            sample.pair.destination.to_string(),
            attributes.vehicle,
            attributes.weekday,
            optional_number(attributes.weight),
        ])?;
    }

    finish(writer)
}

/// Reads a points table by column name. Only `point_A` and `point_B` are required.
pub fn read_points(bytes: &[u8], limit: Option<usize>) -> Result<Vec<SampledPair>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let point_a = find("point_A").ok_or_else(|| EtlError::ValidationError {
        message: "points file has no 'point_A' column".to_string(),
    })?;
    let point_b = find("point_B").ok_or_else(|| EtlError::ValidationError {
        message: "points file has no 'point_B' column".to_string(),
    })?;
    let vehicle = find("vehicle");
    let weekday = find("weekday");
    let weight = find("weight");
    let has_attributes = vehicle.is_some() || weekday.is_some() || weight.is_some();

    let cell = |record: &StringRecord, index: Option<usize>| -> String {
        index
            .and_then(|i| record.get(i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mut samples = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|limit| samples.len() >= limit) {
            break;
        }
        let record = record?;

        let pair = PointPair::new(
            parse_coordinate(&cell(&record, Some(point_a)))?,
            parse_coordinate(&cell(&record, Some(point_b)))?,
        );
        let attributes = has_attributes.then(|| TripAttributes {
            vehicle: cell(&record, vehicle),
            weekday: cell(&record, weekday),
            weight: parse_weight(&cell(&record, weight)),
        });

        samples.push(SampledPair { pair, attributes });
    }

    Ok(samples)
}

pub fn write_routes(result: &RouteBatchResult) -> Result<Vec<u8>> {
    let with_attributes = result.rows.iter().any(|row| row.sample.attributes.is_some());

    let mut header = vec!["id".to_string(), "point_A".to_string(), "point_B".to_string()];
    if with_attributes {
        header.extend(["vehicle", "weekday", "weight"].map(String::from));
    }
    header.push("haversine_dist".to_string());
    for profile in &result.profiles {
        header.push(format!("{}_dist", profile));
        header.push(format!("{}_time", profile));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;

    for row in &result.rows {
        let mut record = vec![
            row.id.to_string(),
            row.sample.pair.origin.to_string(),
            row.sample.pair.destination.to_string(),
        ];
        if with_attributes {
            let attributes = row.sample.attributes.clone().unwrap_or_default();
            record.push(attributes.vehicle);
            record.push(attributes.weekday);
            record.push(optional_number(attributes.weight));
        }
        record.push(row.haversine_km.to_string());
        for mode in &row.modes {
            record.push(optional_number(mode.map(|m| m.distance)));
            record.push(optional_number(mode.map(|m| m.duration)));
        }
        writer.write_record(&record)?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ModeSummary, RouteRow};

    fn sample(lon: f64, attributes: Option<TripAttributes>) -> SampledPair {
        SampledPair {
            pair: PointPair::new(Coordinate::new(lon, 38.72), Coordinate::new(-9.14, 38.75)),
            attributes,
        }
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("[-9.153140, 38.767118]").unwrap(),
            Coordinate::new(-9.15314, 38.767118)
        );
        assert_eq!(
            parse_coordinate(" [1,2] ").unwrap(),
            Coordinate::new(1.0, 2.0)
        );
        assert!(parse_coordinate("-9.1, 38.7").is_err());
        assert!(parse_coordinate("[1.0]").is_err());
        assert!(parse_coordinate("[a, b]").is_err());
    }

    #[test]
    fn test_points_table_keeps_attributes() {
        let samples = vec![
            sample(
                -9.15,
                Some(TripAttributes {
                    vehicle: "Walking".to_string(),
                    weekday: "3".to_string(),
                    weight: Some(1.5),
                }),
            ),
            sample(-9.16, None),
        ];

        let bytes = write_points(&samples).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("id,point_A,point_B,vehicle,weekday,weight\n"));
        assert!(text.contains("0,\"[-9.15, 38.72]\",\"[-9.14, 38.75]\",Walking,3,1.5"));

        let read = read_points(&bytes, None).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0], samples[0]);
        assert_eq!(read[1].pair, samples[1].pair);
    }

    #[test]
    fn test_read_points_limit_and_legacy_index_column() {
        let raw = "\
,point_A,point_B
0,\"[-9.1, 38.7]\",\"[-9.2, 38.8]\"
1,\"[-9.3, 38.7]\",\"[-9.4, 38.8]\"
2,\"[-9.5, 38.7]\",\"[-9.6, 38.8]\"
";
        let read = read_points(raw.as_bytes(), Some(2)).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].pair.origin, Coordinate::new(-9.3, 38.7));
        assert!(read[0].attributes.is_none());
    }

    #[test]
    fn test_read_points_decimal_comma_weight() {
        let raw = "\
id,point_A,point_B,vehicle,weekday,weight
0,\"[-9.1, 38.7]\",\"[-9.2, 38.8]\",Walking,2,\"12,5\"
1,\"[-9.3, 38.7]\",\"[-9.4, 38.8]\",Car,4,3.25
";
        let read = read_points(raw.as_bytes(), None).unwrap();
        assert_eq!(read[0].attributes.as_ref().unwrap().weight, Some(12.5));
        assert_eq!(read[1].attributes.as_ref().unwrap().weight, Some(3.25));
    }

    #[test]
    fn test_routes_table_leaves_failed_profiles_empty() {
        let result = RouteBatchResult {
            rows: vec![RouteRow {
                id: 0,
                sample: sample(-9.15, None),
                haversine_km: 3.5,
                modes: vec![
                    Some(ModeSummary {
                        distance: 4200.5,
                        duration: 600.0,
                    }),
                    None,
                ],
            }],
            profiles: vec!["driving-car".to_string(), "foot-walking".to_string()],
            ..Default::default()
        };

        let text = String::from_utf8(write_routes(&result).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "id,point_A,point_B,haversine_dist,driving-car_dist,driving-car_time,foot-walking_dist,foot-walking_time"
        );
        assert!(lines[1].ends_with(",3.5,4200.5,600,,"));
    }
}
