use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{EtlError, Result};
use crate::models::{CanonicalDataset, CanonicalRecord, Granularity, Metric};
use crate::utils::constants::LOCATION_COLUMN;

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub dataset: &'static str,
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub violations: Vec<Violation>,
    pub location_statistics: BTreeMap<String, LocationStatistics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub row: usize,
    pub location: Option<String>,
    pub column: String,
    pub violation_type: ViolationType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViolationType {
    MissingKey,
    MissingValue,
    NonFinite(f64),
}

#[derive(Debug, Clone, Default)]
pub struct LocationStatistics {
    pub total_records: usize,
    pub invalid_records: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location.as_deref().unwrap_or("<null>");
        match self.violation_type {
            ViolationType::MissingKey => write!(
                f,
                "null found in key column '{}' (row {}, location {})",
                self.column, self.row, location
            ),
            ViolationType::MissingValue => write!(
                f,
                "non-numeric/missing value in '{}' (row {}, location {})",
                self.column, self.row, location
            ),
            ViolationType::NonFinite(value) => write!(
                f,
                "non-finite value {} in '{}' (row {}, location {})",
                value, self.column, self.row, location
            ),
        }
    }
}

/// Data-quality gate run on each canonical dataset before it is written.
///
/// Any violation fails the whole dataset; rows are never filtered out.
pub struct IntegrityChecker;

impl IntegrityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Fail on the first violation. Empty datasets pass.
    pub fn validate<R: CanonicalRecord>(&self, dataset: &CanonicalDataset<R>) -> Result<()> {
        let granularity = dataset.granularity();

        for (row, record) in dataset.records().iter().enumerate() {
            if let Some(violation) =
                Self::record_violations(row, record, granularity, dataset.metrics()).first()
            {
                warn!(dataset = granularity.name(), %violation, "data quality check failed");
                return Err(EtlError::data_quality(
                    granularity.name(),
                    violation.to_string(),
                ));
            }
        }

        debug!(
            dataset = granularity.name(),
            rows = dataset.len(),
            "data quality checks passed"
        );
        Ok(())
    }

    /// Collect every violation without failing.
    pub fn check_integrity<R: CanonicalRecord>(
        &self,
        dataset: &CanonicalDataset<R>,
    ) -> IntegrityReport {
        let granularity = dataset.granularity();
        let mut report = IntegrityReport {
            dataset: granularity.name(),
            total_records: dataset.len(),
            valid_records: 0,
            invalid_records: 0,
            violations: Vec::new(),
            location_statistics: BTreeMap::new(),
        };

        for (row, record) in dataset.records().iter().enumerate() {
            let violations = Self::record_violations(row, record, granularity, dataset.metrics());

            let stats = report
                .location_statistics
                .entry(record.location().unwrap_or("<null>").to_string())
                .or_default();
            stats.total_records += 1;

            if violations.is_empty() {
                report.valid_records += 1;
            } else {
                report.invalid_records += 1;
                stats.invalid_records += 1;
                report.violations.extend(violations);
            }
        }

        report
    }

    fn record_violations<R: CanonicalRecord>(
        row: usize,
        record: &R,
        granularity: Granularity,
        metrics: &[Metric],
    ) -> Vec<Violation> {
        let location = record.location().map(str::to_string);
        let violation = |column: &str, violation_type| Violation {
            row,
            location: location.clone(),
            column: column.to_string(),
            violation_type,
        };

        let mut violations = Vec::new();

        if record.location().map_or(true, |l| l.trim().is_empty()) {
            violations.push(violation(LOCATION_COLUMN, ViolationType::MissingKey));
        }
        if !record.has_temporal_key() {
            violations.push(violation(
                granularity.temporal_key(),
                ViolationType::MissingKey,
            ));
        }

        for metric in metrics {
            match record.metrics().get(*metric) {
                None => violations.push(violation(metric.column_name(), ViolationType::MissingValue)),
                Some(v) if v.is_nan() => {
                    violations.push(violation(metric.column_name(), ViolationType::MissingValue))
                }
                Some(v) if !v.is_finite() => {
                    violations.push(violation(metric.column_name(), ViolationType::NonFinite(v)))
                }
                Some(_) => {}
            }
        }

        violations
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("=== Integrity Check Report ({}) ===\n", self.dataset));
        summary.push_str(&format!("Total Records: {}\n", self.total_records));
        summary.push_str(&format!(
            "Valid Records: {} ({:.1}%)\n",
            self.valid_records,
            percentage(self.valid_records, self.total_records)
        ));
        summary.push_str(&format!(
            "Invalid Records: {} ({:.1}%)\n",
            self.invalid_records,
            percentage(self.invalid_records, self.total_records)
        ));

        for (location, stats) in &self.location_statistics {
            summary.push_str(&format!(
                "  {}: {} records, {} invalid\n",
                location, stats.total_records, stats.invalid_records
            ));
        }

        summary.push_str(&format!("\nViolations: {}\n", self.violations.len()));
        if !self.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in self.violations.iter().take(10).enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, violation));
            }
        }

        summary
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DailyDataset, DailyRecord, HourlyDataset, HourlyRecord, MetricValues,
    };
    use chrono::{NaiveDate, TimeZone, Utc};

    fn daily(location: &str, temp: f64) -> DailyRecord {
        DailyRecord::new(
            location,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            MetricValues::default().with(Metric::Temperature, temp),
        )
    }

    #[test]
    fn test_empty_dataset_passes() {
        let checker = IntegrityChecker::new();
        assert!(checker.validate(&HourlyDataset::empty()).is_ok());
        assert!(checker.validate(&DailyDataset::empty()).is_ok());
    }

    #[test]
    fn test_clean_dataset_passes() {
        let dataset = DailyDataset::new(vec![daily("seattle", 5.0), daily("newyork", -3.0)], [Metric::Temperature]);
        assert!(IntegrityChecker::new().validate(&dataset).is_ok());
    }

    #[test]
    fn test_nan_fails_whole_dataset() {
        let dataset = DailyDataset::new(
            vec![daily("seattle", 5.0), daily("newyork", f64::NAN)],
            [Metric::Temperature],
        );

        let err = IntegrityChecker::new().validate(&dataset).unwrap_err();
        match err {
            EtlError::DataQuality { dataset, message } => {
                assert_eq!(dataset, "daily");
                assert!(message.contains("temperature_2m"));
                assert!(message.contains("row 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_infinite_fails() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let dataset = HourlyDataset::new(
            vec![HourlyRecord::new(
                "seattle",
                ts,
                MetricValues::default().with(Metric::WindSpeed, f64::INFINITY),
            )],
            [Metric::WindSpeed],
        );

        let err = IntegrityChecker::new().validate(&dataset).unwrap_err();
        assert!(matches!(err, EtlError::DataQuality { .. }));
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn test_missing_metric_value_fails_only_when_column_present() {
        let record = DailyRecord::new(
            "seattle",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            MetricValues::default(),
        );

        let with_column = DailyDataset::new(vec![record.clone()], [Metric::Precipitation]);
        assert!(IntegrityChecker::new().validate(&with_column).is_err());

        let without_column = DailyDataset::new(vec![record], Vec::<Metric>::new());
        assert!(IntegrityChecker::new().validate(&without_column).is_ok());
    }

    #[test]
    fn test_null_keys_fail() {
        let missing_timestamp = HourlyDataset::new(
            vec![HourlyRecord {
                location: Some("seattle".to_string()),
                timestamp: None,
                metrics: MetricValues::default(),
            }],
            Vec::<Metric>::new(),
        );
        let err = IntegrityChecker::new().validate(&missing_timestamp).unwrap_err();
        assert!(err.to_string().contains("'timestamp'"));

        let missing_location = DailyDataset::new(
            vec![DailyRecord {
                location: None,
                date: NaiveDate::from_ymd_opt(2024, 1, 1),
                metrics: MetricValues::default(),
            }],
            Vec::<Metric>::new(),
        );
        let err = IntegrityChecker::new().validate(&missing_location).unwrap_err();
        assert!(err.to_string().contains("'location'"));
    }

    #[test]
    fn test_report_collects_all_violations() {
        let dataset = DailyDataset::new(
            vec![
                daily("seattle", 5.0),
                daily("seattle", f64::NAN),
                daily("newyork", f64::NEG_INFINITY),
            ],
            [Metric::Temperature],
        );

        let report = IntegrityChecker::new().check_integrity(&dataset);

        assert!(!report.is_clean());
        assert_eq!(report.total_records, 3);
        assert_eq!(report.valid_records, 1);
        assert_eq!(report.invalid_records, 2);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.location_statistics["seattle"].invalid_records, 1);
        assert!(report.summary().contains("Invalid Records: 2"));
    }
}
