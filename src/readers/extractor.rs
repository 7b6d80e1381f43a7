use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info};

use super::weather_source::WeatherSource;
use crate::error::{EtlError, Result};
use crate::models::{LocationSet, RawDataset};
use crate::utils::constants::LOCATION_COLUMN;
use crate::utils::progress::ProgressReporter;

/// Fetches every configured location in order and concatenates the rows.
pub struct Extractor<S> {
    source: S,
}

impl<S: WeatherSource> Extractor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch `target_date` (today in UTC when `None`) for each location.
    /// Stops at the first failing location.
    pub async fn extract(
        &self,
        locations: &LocationSet,
        target_date: Option<NaiveDate>,
        progress: Option<&ProgressReporter>,
    ) -> Result<RawDataset> {
        let date = target_date.unwrap_or_else(|| Utc::now().date_naive());
        info!(%date, locations = locations.len(), "extracting observations");

        let mut combined = RawDataset::default();

        for location in locations {
            if let Some(p) = progress {
                p.set_message(&format!("Fetching {}...", location.name));
            }

            let mut rows = self
                .source
                .fetch(location, date)
                .await
                .map_err(|e| match e {
                    passthrough @ (EtlError::SourceUnavailable { .. }
                    | EtlError::Schema { .. }
                    | EtlError::DataQuality { .. }) => passthrough,
                    other => EtlError::SourceUnavailable {
                        location: location.name.clone(),
                        reason: other.to_string(),
                    },
                })?;

            rows.stamp(LOCATION_COLUMN, Value::String(location.name.clone()));
            debug!(location = %location.name, rows = rows.len(), "stamped location");

            combined.append(rows);
        }

        info!(rows = combined.len(), "extraction complete");
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, RawRecord};
    use serde_json::json;
    use std::cell::RefCell;

    struct StubSource {
        calls: RefCell<Vec<(String, NaiveDate)>>,
        fail_on: Option<&'static str>,
    }

    impl StubSource {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl WeatherSource for StubSource {
        async fn fetch(&self, location: &Location, date: NaiveDate) -> Result<RawDataset> {
            self.calls.borrow_mut().push((location.name.clone(), date));

            if self.fail_on == Some(location.name.as_str()) {
                return Err(EtlError::Config("connection refused".to_string()));
            }

            let rows = (0..2)
                .map(|hour| {
                    json!({
                        "time": format!("2024-01-01T{:02}:00Z", hour),
                        "temperature_2m": location.latitude,
                    })
                })
                .filter_map(|v| v.as_object().cloned())
                .collect::<Vec<RawRecord>>();
            Ok(RawDataset::new(rows))
        }
    }

    fn locations() -> LocationSet {
        LocationSet::new(vec![
            Location::new("seattle", 47.6062, -122.3321),
            Location::new("newyork", 40.7128, -74.0060),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_every_row_stamped_with_location() {
        let extractor = Extractor::new(StubSource::new(None));
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let raw = extractor.extract(&locations(), Some(date), None).await.unwrap();

        assert_eq!(raw.len(), 4);
        let tags: Vec<&Value> = raw.records().iter().map(|r| &r["location"]).collect();
        assert_eq!(
            tags,
            vec![
                &json!("seattle"),
                &json!("seattle"),
                &json!("newyork"),
                &json!("newyork")
            ]
        );

        let calls = extractor.source().calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, d)| *d == date));
    }

    #[tokio::test]
    async fn test_failed_location_aborts_run() {
        let extractor = Extractor::new(StubSource::new(Some("seattle")));

        let err = extractor
            .extract(&locations(), NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .await
            .unwrap_err();

        match err {
            EtlError::SourceUnavailable { location, reason } => {
                assert_eq!(location, "seattle");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Nothing after the failing location is fetched
        assert_eq!(extractor.source().calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_keeps_schema_error() {
        struct RaggedSource;

        impl WeatherSource for RaggedSource {
            async fn fetch(&self, _location: &Location, _date: NaiveDate) -> Result<RawDataset> {
                Err(EtlError::schema("raw", "column 'time' has 3 values, expected 24"))
            }
        }

        let extractor = Extractor::new(RaggedSource);
        let err = extractor
            .extract(&locations(), NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .await
            .unwrap_err();

        match err {
            EtlError::Schema { dataset, message } => {
                assert_eq!(dataset, "raw");
                assert!(message.contains("'time'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_location_set() {
        let extractor = Extractor::new(StubSource::new(None));
        let raw = extractor
            .extract(&LocationSet::new(vec![]).unwrap(), None, None)
            .await
            .unwrap();

        assert!(raw.is_empty());
    }
}
