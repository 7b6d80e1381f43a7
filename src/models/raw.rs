use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One untyped row as delivered by a weather source.
pub type RawRecord = Map<String, Value>;

/// Untyped rows in source order. Columns are the union of row keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    records: Vec<RawRecord>,
}

impl RawDataset {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: RawRecord) {
        self.records.push(record);
    }

    pub fn append(&mut self, other: RawDataset) {
        self.records.extend(other.records);
    }

    pub fn columns(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.contains_key(name))
    }

    /// Set `column` to `value` on every row, replacing any existing value.
    pub fn stamp(&mut self, column: &str, value: Value) {
        for record in &mut self.records {
            record.insert(column.to_string(), value.clone());
        }
    }
}

impl FromIterator<RawRecord> for RawDataset {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
