use crate::config::job_config::{CodePart, SurveyConfig};
use crate::domain::model::{SurveyTrip, TripAttributes};
use crate::utils::error::{EtlError, Result};
use csv::StringRecord;

/// Reads survey trips. Rows missing any part of either zone code are dropped.
pub fn read_survey(bytes: &[u8], schema: &SurveyConfig) -> Result<Vec<SurveyTrip>> {
    if !schema.delimiter.is_ascii() {
        return Err(EtlError::InvalidConfigValueError {
            field: "survey.delimiter".to_string(),
            value: schema.delimiter.to_string(),
            reason: "Delimiter must be a single ASCII character".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(schema.delimiter as u8)
        .flexible(true)
        .from_reader(bytes);
    let headers = reader.headers()?.clone();

    let origin = column_indices(&headers, &schema.origin_code)?;
    let destination = column_indices(&headers, &schema.destination_code)?;
    let vehicle = column_index(&headers, &schema.vehicle_column)?;
    let weekday = column_index(&headers, &schema.weekday_column)?;
    let weight = column_index(&headers, &schema.weight_column)?;

    let mut trips = Vec::new();
    let mut dropped = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = row + 2;

        let origin_zone = compose_code(&record, &origin, line)?;
        let destination_zone = compose_code(&record, &destination, line)?;
        let (Some(origin_zone), Some(destination_zone)) = (origin_zone, destination_zone) else {
            dropped += 1;
            continue;
        };

        trips.push(SurveyTrip {
            origin_zone,
            destination_zone,
            attributes: TripAttributes {
                vehicle: field(&record, vehicle).to_string(),
                weekday: field(&record, weekday).to_string(),
                weight: parse_weight(field(&record, weight)),
            },
        });
    }

    if dropped > 0 {
        tracing::info!("Dropped {} survey rows with incomplete zone codes", dropped);
    }
    Ok(trips)
}

fn column_index(headers: &StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| EtlError::ValidationError {
            message: format!("survey file has no '{}' column", column),
        })
}

fn column_indices(headers: &StringRecord, parts: &[CodePart]) -> Result<Vec<(usize, usize)>> {
    parts
        .iter()
        .map(|part| Ok((column_index(headers, &part.column)?, part.width)))
        .collect()
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

/// Concatenates the zero-padded parts. `None` when any part is missing.
fn compose_code(record: &StringRecord, parts: &[(usize, usize)], line: usize) -> Result<Option<u64>> {
    let mut code = String::new();
    for &(index, width) in parts {
        let Some(value) = parse_code_part(field(record, index), line)? else {
            return Ok(None);
        };
        code.push_str(&format!("{:0width$}", value, width = width));
    }

    code.parse::<u64>().map(Some).map_err(|_| {
        EtlError::processing(format!("line {}: zone code '{}' does not fit in 64 bits", line, code))
    })
}

fn parse_code_part(raw: &str, line: usize) -> Result<Option<u64>> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(Some(value));
    }
    match raw.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        _ => Err(EtlError::processing(format!(
            "line {}: '{}' is not a zone code",
            line, raw
        ))),
    }
}

/// Accepts decimal commas, as written by Portuguese-locale exports.
pub(crate) fn parse_weight(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok()
}
