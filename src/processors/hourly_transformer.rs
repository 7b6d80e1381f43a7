use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{EtlError, Result};
use crate::models::{HourlyDataset, HourlyRecord, Metric, MetricValues, RawDataset};
use crate::utils::constants::{LOCATION_COLUMN, TIME_FIELD_CANDIDATES};

// Numeric offsets only; a trailing `Z` falls through to NAIVE_FORMATS
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Turns raw source rows into typed hourly rows.
///
/// All type coercion happens here. Values that cannot be coerced become
/// missing and are left for the integrity checker to reject.
pub struct HourlyTransformer {
    time_candidates: Vec<String>,
}

impl HourlyTransformer {
    pub fn new() -> Self {
        Self::with_time_candidates(&TIME_FIELD_CANDIDATES)
    }

    pub fn with_time_candidates(candidates: &[&str]) -> Self {
        Self {
            time_candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// First candidate time column present in `raw`.
    pub fn resolve_time_field<'a>(&'a self, raw: &RawDataset) -> Result<&'a str> {
        self.time_candidates
            .iter()
            .find(|c| raw.has_column(c))
            .map(String::as_str)
            .ok_or_else(|| {
                EtlError::schema(
                    "raw",
                    format!(
                        "none of the expected time columns {:?} found; columns={:?}",
                        self.time_candidates,
                        raw.columns()
                    ),
                )
            })
    }

    pub fn transform(&self, raw: &RawDataset) -> Result<HourlyDataset> {
        if raw.is_empty() {
            return Ok(HourlyDataset::empty());
        }

        let time_field = self.resolve_time_field(raw)?;

        if !raw.has_column(LOCATION_COLUMN) {
            return Err(EtlError::schema(
                "raw",
                format!("expected '{}' column to be present", LOCATION_COLUMN),
            ));
        }

        let columns = raw.columns();
        let metrics: Vec<Metric> = Metric::ALL
            .into_iter()
            .filter(|m| columns.contains(m.column_name()))
            .collect();

        let ignored: BTreeSet<&str> = columns
            .iter()
            .copied()
            .filter(|c| {
                *c != time_field && *c != LOCATION_COLUMN && Metric::from_column_name(c).is_none()
            })
            .collect();
        if !ignored.is_empty() {
            debug!(?ignored, "dropping columns outside the canonical schema");
        }

        let mut bad_timestamps = 0usize;
        let mut coerced_to_missing = 0usize;
        let mut records = Vec::with_capacity(raw.len());

        for record in raw.records() {
            let time_value = record.get(time_field).unwrap_or(&Value::Null);
            let timestamp = parse_instant(time_value);
            if timestamp.is_none() && !time_value.is_null() {
                bad_timestamps += 1;
            }

            let location = record.get(LOCATION_COLUMN).and_then(coerce_string);

            let mut values = MetricValues::default();
            for metric in &metrics {
                let raw_value = record.get(metric.column_name()).unwrap_or(&Value::Null);
                let value = coerce_f64(raw_value);
                if value.is_none() && !raw_value.is_null() {
                    coerced_to_missing += 1;
                }
                values.set(*metric, value);
            }

            records.push(HourlyRecord {
                location,
                timestamp,
                metrics: values,
            });
        }

        if bad_timestamps > 0 {
            warn!(
                count = bad_timestamps,
                column = time_field,
                "unparseable timestamps left missing"
            );
        }
        if coerced_to_missing > 0 {
            warn!(
                count = coerced_to_missing,
                "non-numeric metric values left missing"
            );
        }

        debug!(rows = records.len(), time_field, "transformed hourly rows");
        Ok(HourlyDataset::new(records, metrics))
    }
}

impl Default for HourlyTransformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Transform raw rows with the default time column candidates.
pub fn transform_hourly(raw: &RawDataset) -> Result<HourlyDataset> {
    HourlyTransformer::new().transform(raw)
}

/// Parse a time value into a UTC instant.
///
/// Strings may carry `Z` or an explicit offset; naive strings are taken as
/// UTC. Integers are Unix seconds.
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_instant_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

pub fn parse_instant_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = s.strip_suffix(['Z', 'z']).unwrap_or(s);

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Numeric coercion. NaN and anything non-numeric become `None`; infinities
/// are kept so the integrity checker can report them.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if number.is_nan() {
        None
    } else {
        Some(number)
    }
}

/// Plain string representation of an identity value.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
