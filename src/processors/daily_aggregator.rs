use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::models::{
    Aggregation, CanonicalRecord, DailyDataset, DailyRecord, HourlyDataset, Metric, MetricValues,
};

type GroupKey = (Option<String>, Option<NaiveDate>);

/// Running sum and count of non-missing values for one metric.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    total: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total += v;
            self.count += 1;
        }
    }

    fn finish(&self, aggregation: Aggregation) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match aggregation {
            Aggregation::Sum => Some(self.total),
            Aggregation::Mean => Some(self.total / self.count as f64),
        }
    }
}

/// Rolls hourly rows up to one row per `(location, date)`.
pub struct DailyAggregator;

impl DailyAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, hourly: &HourlyDataset) -> Result<DailyDataset> {
        if hourly.is_empty() {
            return Ok(DailyDataset::empty());
        }

        let metrics = hourly.metrics();
        let grouped = self.group_by_location_and_date(hourly);

        let records: Vec<DailyRecord> = grouped
            .into_iter()
            .map(|((location, date), accumulators)| DailyRecord {
                location,
                date,
                metrics: self.finish_group(metrics, &accumulators),
            })
            .collect();

        debug!(
            hourly_rows = hourly.len(),
            daily_rows = records.len(),
            "aggregated daily rows"
        );

        Ok(DailyDataset::new(records, metrics.iter().copied()))
    }

    /// Accumulators per group, ordered by location then date
    fn group_by_location_and_date(
        &self,
        hourly: &HourlyDataset,
    ) -> BTreeMap<GroupKey, BTreeMap<Metric, Accumulator>> {
        let mut grouped: BTreeMap<GroupKey, BTreeMap<Metric, Accumulator>> = BTreeMap::new();

        for record in hourly.records() {
            let key = (record.location().map(str::to_string), record.date());
            let entry = grouped.entry(key).or_default();

            for metric in hourly.metrics() {
                entry
                    .entry(*metric)
                    .or_default()
                    .add(record.metrics.get(*metric));
            }
        }

        grouped
    }

    fn finish_group(
        &self,
        metrics: &[Metric],
        accumulators: &BTreeMap<Metric, Accumulator>,
    ) -> MetricValues {
        let mut values = MetricValues::default();
        for metric in metrics {
            let value = accumulators
                .get(metric)
                .and_then(|acc| acc.finish(metric.aggregation()));
            values.set(*metric, value);
        }
        values
    }
}

impl Default for DailyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate hourly rows into daily rows.
pub fn transform_daily(hourly: &HourlyDataset) -> Result<DailyDataset> {
    DailyAggregator::new().aggregate(hourly)
}
