pub mod canonical;
pub mod location;
pub mod metric;
pub mod raw;

pub use canonical::{
    CanonicalDataset, CanonicalRecord, DailyDataset, DailyRecord, Granularity, HourlyDataset,
    HourlyRecord,
};
pub use location::{Location, LocationConfig, LocationSet};
pub use metric::{Aggregation, Metric, MetricValues};
pub use raw::{RawDataset, RawRecord};
