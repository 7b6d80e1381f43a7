use arrow::array::{
    ArrayRef, Date32Array, Float64Array, Int32Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use crate::error::{EtlError, Result};
use crate::models::{CanonicalRecord, DailyRecord, HourlyRecord, Metric};
use crate::utils::constants::{LOCATION_COLUMN, UNIX_EPOCH_DAYS_FROM_CE};

/// Canonical rows that know their Arrow layout.
pub trait ArrowRecord: CanonicalRecord + Sized {
    fn arrow_schema(metrics: &[Metric]) -> SchemaRef;

    fn to_record_batch(records: &[&Self], metrics: &[Metric], schema: SchemaRef)
        -> Result<RecordBatch>;
}

/// Metric columns are always nullable `Float64`, whatever arrived in memory.
fn metric_fields(metrics: &[Metric]) -> Vec<Field> {
    metrics
        .iter()
        .map(|m| Field::new(m.column_name(), DataType::Float64, true))
        .collect()
}

fn partition_fields() -> Vec<Field> {
    vec![
        Field::new("date", DataType::Date32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
        Field::new("day", DataType::Int32, false),
    ]
}

fn metric_arrays<R: CanonicalRecord>(records: &[&R], metrics: &[Metric]) -> Vec<ArrayRef> {
    metrics
        .iter()
        .map(|m| {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.metrics().get(*m)).collect();
            Arc::new(Float64Array::from(values)) as ArrayRef
        })
        .collect()
}

fn required<'a, R: CanonicalRecord>(records: &[&'a R]) -> Result<(Vec<&'a str>, Vec<NaiveDate>)> {
    let mut locations = Vec::with_capacity(records.len());
    let mut dates = Vec::with_capacity(records.len());

    for record in records {
        let (Some(location), Some(date)) = (record.location(), record.date()) else {
            return Err(EtlError::data_quality(
                R::GRANULARITY.name(),
                "cannot serialize a row without location and date",
            ));
        };
        locations.push(location);
        dates.push(date);
    }

    Ok((locations, dates))
}

fn partition_arrays(dates: &[NaiveDate]) -> Vec<ArrayRef> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
    let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();
    let day_of_month: Vec<i32> = dates.iter().map(|d| d.day() as i32).collect();

    vec![
        Arc::new(Date32Array::from(days)),
        Arc::new(Int32Array::from(years)),
        Arc::new(Int32Array::from(months)),
        Arc::new(Int32Array::from(day_of_month)),
    ]
}

impl ArrowRecord for HourlyRecord {
    fn arrow_schema(metrics: &[Metric]) -> SchemaRef {
        let mut fields = vec![
            Field::new(
                "timestamp",
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                false,
            ),
            Field::new(LOCATION_COLUMN, DataType::Utf8, false),
        ];
        fields.extend(metric_fields(metrics));
        fields.extend(partition_fields());

        Arc::new(Schema::new(fields))
    }

    fn to_record_batch(
        records: &[&Self],
        metrics: &[Metric],
        schema: SchemaRef,
    ) -> Result<RecordBatch> {
        let (locations, dates) = required(records)?;
        let timestamps = records
            .iter()
            .map(|r| r.timestamp.map(|ts| ts.timestamp_micros()))
            .collect::<Option<Vec<i64>>>()
            .ok_or_else(|| {
                EtlError::data_quality("hourly", "cannot serialize a row without timestamp")
            })?;

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC")),
            Arc::new(StringArray::from(locations)),
        ];
        columns.extend(metric_arrays(records, metrics));
        columns.extend(partition_arrays(&dates));

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

impl ArrowRecord for DailyRecord {
    fn arrow_schema(metrics: &[Metric]) -> SchemaRef {
        let mut fields = vec![
            Field::new(LOCATION_COLUMN, DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
        ];
        fields.extend(metric_fields(metrics));
        // date already leads the row for daily files
        fields.extend(partition_fields().into_iter().skip(1));

        Arc::new(Schema::new(fields))
    }

    fn to_record_batch(
        records: &[&Self],
        metrics: &[Metric],
        schema: SchemaRef,
    ) -> Result<RecordBatch> {
        let (locations, dates) = required(records)?;
        let mut partitions = partition_arrays(&dates);
        let date_array = partitions.remove(0);

        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(locations)), date_array];
        columns.extend(metric_arrays(records, metrics));
        columns.extend(partitions);

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}
