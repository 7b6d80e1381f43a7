use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::schema::types::ColumnPath;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::record_batch::ArrowRecord;
use crate::error::{EtlError, Result};
use crate::models::CanonicalDataset;
use crate::utils::constants::{DEFAULT_ROW_GROUP_SIZE, LOCATION_COLUMN};
use crate::utils::partition::PartitionKey;

/// Persists a canonical dataset as one file per partition key.
pub trait ColumnarSink {
    /// Returns the number of rows written; 0 and no writes for an empty dataset.
    fn write<R: ArrowRecord>(&self, dataset: &CanonicalDataset<R>, base_prefix: &str)
        -> Result<usize>;
}

/// Hive-partitioned Parquet files under a root directory (the bucket).
pub struct ParquetPartitionWriter {
    root: PathBuf,
    compression: Compression,
}

impl ParquetPartitionWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compression: Compression::SNAPPY,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(EtlError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn writer_properties(&self) -> WriterProperties {
        // Consumers expect plain strings for location
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(DEFAULT_ROW_GROUP_SIZE)
            .set_column_dictionary_enabled(ColumnPath::from(LOCATION_COLUMN), false)
            .build()
    }

    /// Group rows by partition key. Fails before any write if a row has no key.
    fn partition<'a, R: ArrowRecord>(
        &self,
        dataset: &'a CanonicalDataset<R>,
    ) -> Result<BTreeMap<PartitionKey, Vec<&'a R>>> {
        let mut partitions: BTreeMap<PartitionKey, Vec<&R>> = BTreeMap::new();

        for (row, record) in dataset.records().iter().enumerate() {
            let key = record.partition_key().ok_or_else(|| {
                EtlError::data_quality(
                    dataset.granularity().name(),
                    format!("row {} has no partition key", row),
                )
            })?;
            partitions.entry(key).or_default().push(record);
        }

        Ok(partitions)
    }

    fn write_partition<R: ArrowRecord>(
        &self,
        path: &Path,
        records: &[&R],
        dataset: &CanonicalDataset<R>,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let schema = R::arrow_schema(dataset.metrics());
        let batch = R::to_record_batch(records, dataset.metrics(), schema.clone())?;

        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(self.writer_properties()))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression: self.compression,
        })
    }
}

impl ColumnarSink for ParquetPartitionWriter {
    fn write<R: ArrowRecord>(
        &self,
        dataset: &CanonicalDataset<R>,
        base_prefix: &str,
    ) -> Result<usize> {
        if dataset.is_empty() {
            return Ok(0);
        }

        let partitions = self.partition(dataset)?;
        let mut rows_written = 0;

        for (key, records) in &partitions {
            let path = key.file_path(&self.root, base_prefix);
            self.write_partition(&path, records, dataset)?;

            debug!(partition = %key, rows = records.len(), path = %path.display(), "wrote partition");
            rows_written += records.len();
        }

        info!(
            dataset = dataset.granularity().name(),
            partitions = partitions.len(),
            rows = rows_written,
            prefix = base_prefix,
            "dataset written"
        );
        Ok(rows_written)
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}
