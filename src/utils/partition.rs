use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::constants::PART_FILE_NAME;

/// `(location, year, month, day)`: every row with the same key lands in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub location: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PartitionKey {
    pub fn new(location: &str, date: NaiveDate) -> Self {
        Self {
            location: location.to_string(),
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Hive-style directory, e.g. `location=seattle/year=2024/month=03/day=07`.
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(format!("location={}", self.location))
            .join(format!("year={:04}", self.year))
            .join(format!("month={:02}", self.month))
            .join(format!("day={:02}", self.day))
    }

    /// Full path of this partition's file under `root/base_prefix`.
    pub fn file_path(&self, root: &Path, base_prefix: &str) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in base_prefix.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.join(self.directory()).join(PART_FILE_NAME)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "location={}/year={:04}/month={:02}/day={:02}",
            self.location, self.year, self.month, self.day
        )
    }
}
