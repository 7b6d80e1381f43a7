use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{CanonicalDataset, CanonicalRecord, LocationSet};
use crate::processors::{DailyAggregator, HourlyTransformer, IntegrityChecker};
use crate::readers::{Extractor, WeatherSource};
use crate::utils::constants::{DAILY_PREFIX, HOURLY_PREFIX};
use crate::utils::progress::ProgressReporter;
use crate::writers::ColumnarSink;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub hourly_rows: usize,
    pub daily_rows: usize,
    pub hourly_locations: Vec<String>,
    pub daily_locations: Vec<String>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "Wrote rows -> hourly: {}, daily: {}\n\
            Locations in hourly: {:?}\n\
            Locations in daily : {:?}",
            self.hourly_rows, self.daily_rows, self.hourly_locations, self.daily_locations
        )
    }
}

/// Extract, transform, validate and load, in that order.
///
/// Both datasets are validated before either is written.
pub struct EtlPipeline<S, K> {
    extractor: Extractor<S>,
    transformer: HourlyTransformer,
    aggregator: DailyAggregator,
    checker: IntegrityChecker,
    sink: K,
}

impl<S: WeatherSource, K: ColumnarSink> EtlPipeline<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            extractor: Extractor::new(source),
            transformer: HourlyTransformer::new(),
            aggregator: DailyAggregator::new(),
            checker: IntegrityChecker::new(),
            sink,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub async fn run(
        &self,
        locations: &LocationSet,
        target_date: Option<NaiveDate>,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let raw = self.extractor.extract(locations, target_date, progress).await?;

        if let Some(p) = progress {
            p.set_message("Transforming...");
        }
        let hourly = self.transformer.transform(&raw)?;
        let daily = self.aggregator.aggregate(&hourly)?;

        let hourly_locations: Vec<String> =
            hourly.locations().into_iter().map(str::to_string).collect();
        let daily_locations: Vec<String> =
            daily.locations().into_iter().map(str::to_string).collect();
        info!(locations = ?hourly_locations, rows = hourly.len(), "hourly dataset ready");
        info!(locations = ?daily_locations, rows = daily.len(), "daily dataset ready");

        if let Some(p) = progress {
            p.set_message("Checking data quality...");
        }
        self.check(&hourly)?;
        self.check(&daily)?;

        if let Some(p) = progress {
            p.set_message("Writing partitions...");
        }
        let hourly_rows = self.sink.write(&hourly, HOURLY_PREFIX)?;
        let daily_rows = self.sink.write(&daily, DAILY_PREFIX)?;

        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Wrote {} hourly and {} daily rows",
                hourly_rows, daily_rows
            ));
        }

        Ok(RunSummary {
            hourly_rows,
            daily_rows,
            hourly_locations,
            daily_locations,
        })
    }

    /// Fail-fast validation; on failure the full integrity report is logged.
    fn check<R: CanonicalRecord>(&self, dataset: &CanonicalDataset<R>) -> Result<()> {
        self.checker.validate(dataset).map_err(|e| {
            let report = self.checker.check_integrity(dataset);
            warn!("{}", report.summary());
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::models::{CanonicalDataset, Location, RawDataset};
    use crate::writers::{ArrowRecord, ParquetPartitionWriter};
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct FixedSource {
        temperature: Value,
    }

    impl WeatherSource for FixedSource {
        async fn fetch(&self, _location: &Location, date: NaiveDate) -> Result<RawDataset> {
            Ok((0..3)
                .map(|hour| {
                    json!({
                        "time": format!("{}T{:02}:00", date, hour),
                        "temperature_2m": self.temperature.clone(),
                        "precipitation": 0.5,
                    })
                })
                .filter_map(|v| v.as_object().cloned())
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: RefCell<Vec<(String, usize)>>,
    }

    impl ColumnarSink for RecordingSink {
        fn write<R: ArrowRecord>(
            &self,
            dataset: &CanonicalDataset<R>,
            base_prefix: &str,
        ) -> Result<usize> {
            self.writes
                .borrow_mut()
                .push((base_prefix.to_string(), dataset.len()));
            Ok(dataset.len())
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
    async fn test_run_writes_both_datasets() {
        let pipeline = EtlPipeline::new(
            FixedSource {
                temperature: json!("4.0"),
            },
            RecordingSink::default(),
        );

        let summary = pipeline
            .run(&locations(), NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .await
            .unwrap();

        assert_eq!(summary.hourly_rows, 6);
        assert_eq!(summary.daily_rows, 2);
        assert_eq!(summary.daily_locations, vec!["newyork", "seattle"]);
        assert_eq!(
            *pipeline.sink().writes.borrow(),
            vec![
                ("weather/hourly".to_string(), 6),
                ("weather/daily".to_string(), 2)
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_metric_blocks_all_writes() {
        let pipeline = EtlPipeline::new(
            FixedSource {
                temperature: json!("n/a"),
            },
            RecordingSink::default(),
        );

        let err = pipeline
            .run(&locations(), NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .await
            .unwrap_err();

        assert!(matches!(err, EtlError::DataQuality { ref dataset, .. } if dataset == "hourly"));
        assert!(pipeline.sink().writes.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_run_to_parquet() {
        let dir = TempDir::new().unwrap();
        let pipeline = EtlPipeline::new(
            FixedSource {
                temperature: json!(2.0),
            },
            ParquetPartitionWriter::new(dir.path()),
        );

        let summary = pipeline
            .run(&locations(), NaiveDate::from_ymd_opt(2024, 2, 29), None)
            .await
            .unwrap();

        assert_eq!(summary.hourly_rows, 6);
        assert!(dir
            .path()
            .join("weather/daily/location=newyork/year=2024/month=02/day=29/part-0000.parquet")
            .exists());
    }
}
