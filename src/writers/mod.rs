pub mod parquet_writer;
pub mod record_batch;

pub use parquet_writer::{ColumnarSink, ParquetFileInfo, ParquetPartitionWriter};
pub use record_batch::ArrowRecord;
