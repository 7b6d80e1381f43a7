use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Location, RawDataset};

/// Anything that can return raw hourly observations for one location and day.
///
/// Implementations return rows without a `location` column; the extractor
/// stamps identity after the call.
#[allow(async_fn_in_trait)]
pub trait WeatherSource {
    async fn fetch(&self, location: &Location, date: NaiveDate) -> Result<RawDataset>;
}
