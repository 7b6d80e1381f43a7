use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Weather source unavailable for location '{location}': {reason}")]
    SourceUnavailable { location: String, reason: String },

    #[error("Schema error in {dataset} dataset: {message}")]
    Schema { dataset: String, message: String },

    #[error("Data quality error in {dataset} dataset: {message}")]
    DataQuality { dataset: String, message: String },

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl EtlError {
    pub fn schema(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::Schema {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    pub fn data_quality(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::DataQuality {
            dataset: dataset.into(),
            message: message.into(),
        }
    }
}
