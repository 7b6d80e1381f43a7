/// Accepted names for the raw time column, highest priority first
pub const TIME_FIELD_CANDIDATES: [&str; 2] = ["timestamp", "time"];

/// Identity column stamped on every row by the extractor
pub const LOCATION_COLUMN: &str = "location";

/// Storage prefixes under the bucket
pub const HOURLY_PREFIX: &str = "weather/hourly";
pub const DAILY_PREFIX: &str = "weather/daily";

/// One file per partition per run
pub const PART_FILE_NAME: &str = "part-0000.parquet";

/// Source defaults
pub const DEFAULT_API_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BUCKET: &str = "automated-etl-pipeline";
pub const DEFAULT_CONFIG_FILE: &str = "weather-etl.toml";

/// Environment variables read outside the `WEATHER_` prefix mapping
pub const LOCATIONS_ENV: &str = "WEATHER_LOCATIONS";
pub const BACKFILL_DATE_ENV: &str = "BACKFILL_DATE";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Days between 0001-01-01 and 1970-01-01, for Arrow Date32
pub const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
