pub mod daily_aggregator;
pub mod hourly_transformer;
pub mod integrity_checker;
pub mod pipeline;

pub use daily_aggregator::{transform_daily, DailyAggregator};
pub use hourly_transformer::{transform_hourly, HourlyTransformer};
pub use integrity_checker::{
    IntegrityChecker, IntegrityReport, LocationStatistics, Violation, ViolationType,
};
pub use pipeline::{EtlPipeline, RunSummary};
