use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::constants::HOURLY_PREFIX;

#[derive(Parser)]
#[command(name = "weather-etl")]
#[command(about = "Daily weather ETL: hourly and daily partitioned Parquet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and hide the progress spinner"
    )]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, transform, validate and write one day of weather data
    Run {
        #[arg(short, long, help = "Target date (YYYY-MM-DD) [default: BACKFILL_DATE or today UTC]")]
        date: Option<NaiveDate>,

        #[arg(short, long, help = "Output root directory or mounted bucket")]
        bucket: Option<PathBuf>,

        #[arg(short, long, help = "Configuration file [default: weather-etl.toml if present]")]
        config: Option<PathBuf>,

        #[arg(long, help = "Parquet compression (snappy, gzip, lz4, zstd, none)")]
        compression: Option<String>,
    },

    /// Report stored metric columns whose type is not DOUBLE
    Audit {
        #[arg(short, long, help = "Output root directory or mounted bucket")]
        bucket: Option<PathBuf>,

        #[arg(short, long, default_value = HOURLY_PREFIX)]
        prefix: String,

        #[arg(short, long, help = "Configuration file [default: weather-etl.toml if present]")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
