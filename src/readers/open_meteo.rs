use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::weather_source::WeatherSource;
use crate::error::{EtlError, Result};
use crate::models::{Location, Metric, RawDataset, RawRecord};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<BTreeMap<String, Vec<Value>>>,
}

/// Open-Meteo forecast API client. Requests are made in UTC for one day.
pub struct OpenMeteoSource {
    client: Client,
    api_url: String,
    metrics: Vec<Metric>,
}

impl OpenMeteoSource {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            metrics: Metric::ALL.to_vec(),
        })
    }

    pub fn with_metrics(mut self, metrics: &[Metric]) -> Self {
        self.metrics = metrics.to_vec();
        self
    }

    fn query(&self, location: &Location, date: NaiveDate) -> Vec<(&'static str, String)> {
        let hourly = self
            .metrics
            .iter()
            .map(|m| m.column_name())
            .collect::<Vec<_>>()
            .join(",");
        let day = date.format("%Y-%m-%d").to_string();

        vec![
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("hourly", hourly),
            ("timezone", "UTC".to_string()),
            ("start_date", day.clone()),
            ("end_date", day),
        ]
    }
}

impl WeatherSource for OpenMeteoSource {
    async fn fetch(&self, location: &Location, date: NaiveDate) -> Result<RawDataset> {
        debug!(location = %location.name, %date, "requesting hourly observations");

        let response = self
            .client
            .get(&self.api_url)
            .query(&self.query(location, date))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EtlError::SourceUnavailable {
                location: location.name.clone(),
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let payload: ForecastResponse = response.json().await?;
        let columns = payload.hourly.ok_or_else(|| EtlError::SourceUnavailable {
            location: location.name.clone(),
            reason: "response has no 'hourly' block".to_string(),
        })?;

        let dataset = pivot_columns(columns)?;
        debug!(location = %location.name, rows = dataset.len(), "received observations");
        Ok(dataset)
    }
}

/// Turn a column-oriented block (`{"time": [...], "x": [...]}`) into rows.
pub fn pivot_columns(columns: BTreeMap<String, Vec<Value>>) -> Result<RawDataset> {
    let row_count = columns.values().map(Vec::len).max().unwrap_or(0);

    if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != row_count) {
        return Err(EtlError::schema(
            "raw",
            format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                row_count
            ),
        ));
    }

    let mut records: Vec<RawRecord> = vec![RawRecord::new(); row_count];
    for (name, values) in columns {
        for (record, value) in records.iter_mut().zip(values) {
            record.insert(name.clone(), value);
        }
    }

    Ok(RawDataset::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_requests_single_utc_day() {
        let source = OpenMeteoSource::new("http://localhost", Duration::from_secs(1))
            .unwrap()
            .with_metrics(&[Metric::Temperature, Metric::Precipitation]);
        let location = Location::new("seattle", 47.6062, -122.3321);

        let query = source.query(&location, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());

        assert!(query.contains(&("hourly", "temperature_2m,precipitation".to_string())));
        assert!(query.contains(&("timezone", "UTC".to_string())));
        assert!(query.contains(&("start_date", "2024-03-07".to_string())));
        assert!(query.contains(&("end_date", "2024-03-07".to_string())));
        assert!(query.contains(&("latitude", "47.6062".to_string())));
    }

    #[test]
    fn test_pivot_columns_to_rows() {
        let payload: ForecastResponse = serde_json::from_value(json!({
            "latitude": 47.6,
            "hourly_units": {"time": "iso8601"},
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "temperature_2m": [5.0, null]
            }
        }))
        .unwrap();

        let dataset = pivot_columns(payload.hourly.unwrap()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0]["time"], json!("2024-01-01T00:00"));
        assert_eq!(dataset.records()[0]["temperature_2m"], json!(5.0));
        assert_eq!(dataset.records()[1]["temperature_2m"], Value::Null);
    }

    #[test]
    fn test_pivot_rejects_ragged_columns() {
        let mut columns = BTreeMap::new();
        columns.insert("time".to_string(), vec![json!("2024-01-01T00:00")]);
        columns.insert("temperature_2m".to_string(), vec![]);

        let result = pivot_columns(columns);
        assert!(matches!(result, Err(EtlError::Schema { .. })));
    }
}
