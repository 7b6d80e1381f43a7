use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use super::metric::{Metric, MetricValues};
use crate::utils::partition::PartitionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hourly,
    Daily,
}

impl Granularity {
    pub fn name(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }

    /// Column that identifies the row in time.
    pub fn temporal_key(&self) -> &'static str {
        match self {
            Granularity::Hourly => "timestamp",
            Granularity::Daily => "date",
        }
    }
}

/// Behaviour shared by hourly and daily rows.
///
/// Key fields are optional in memory; a missing key survives the transform
/// and is rejected by the integrity checker.
pub trait CanonicalRecord {
    const GRANULARITY: Granularity;

    fn location(&self) -> Option<&str>;

    fn has_temporal_key(&self) -> bool;

    fn date(&self) -> Option<NaiveDate>;

    fn metrics(&self) -> &MetricValues;

    fn year(&self) -> Option<i32> {
        self.date().map(|d| d.year())
    }

    fn month(&self) -> Option<u32> {
        self.date().map(|d| d.month())
    }

    fn day(&self) -> Option<u32> {
        self.date().map(|d| d.day())
    }

    fn partition_key(&self) -> Option<PartitionKey> {
        Some(PartitionKey::new(self.location()?, self.date()?))
    }
}

/// One location at one UTC hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub location: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub metrics: MetricValues,
}

impl HourlyRecord {
    pub fn new(location: &str, timestamp: DateTime<Utc>, metrics: MetricValues) -> Self {
        Self {
            location: Some(location.to_string()),
            timestamp: Some(timestamp),
            metrics,
        }
    }
}

impl CanonicalRecord for HourlyRecord {
    const GRANULARITY: Granularity = Granularity::Hourly;

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn has_temporal_key(&self) -> bool {
        self.timestamp.is_some()
    }

    // Partition date always comes from the UTC-normalized instant
    fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date_naive())
    }

    fn metrics(&self) -> &MetricValues {
        &self.metrics
    }
}

/// One location on one calendar date, rolled up from hourly rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub metrics: MetricValues,
}

impl DailyRecord {
    pub fn new(location: &str, date: NaiveDate, metrics: MetricValues) -> Self {
        Self {
            location: Some(location.to_string()),
            date: Some(date),
            metrics,
        }
    }
}

impl CanonicalRecord for DailyRecord {
    const GRANULARITY: Granularity = Granularity::Daily;

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn has_temporal_key(&self) -> bool {
        self.date.is_some()
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn metrics(&self) -> &MetricValues {
        &self.metrics
    }
}

/// Typed rows plus the metric columns present in their schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDataset<R> {
    records: Vec<R>,
    metrics: Vec<Metric>,
}

pub type HourlyDataset = CanonicalDataset<HourlyRecord>;
pub type DailyDataset = CanonicalDataset<DailyRecord>;

impl<R: CanonicalRecord> CanonicalDataset<R> {
    /// Metric columns are kept in the fixed `Metric::ALL` order without duplicates.
    pub fn new(records: Vec<R>, metrics: impl IntoIterator<Item = Metric>) -> Self {
        let present: BTreeSet<Metric> = metrics.into_iter().collect();
        let metrics = Metric::ALL
            .into_iter()
            .filter(|m| present.contains(m))
            .collect();

        Self { records, metrics }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        R::GRANULARITY
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-null locations, sorted.
    pub fn locations(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.records.iter().filter_map(|r| r.location()).collect();
        names.into_iter().collect()
    }
}
