use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::SchemaAuditor;
use crate::cli::args::{Cli, Commands};
use crate::config::EtlConfig;
use crate::processors::EtlPipeline;
use crate::readers::OpenMeteoSource;
use crate::utils::constants::DEFAULT_CONFIG_FILE;
use crate::utils::progress::ProgressReporter;
use crate::writers::ParquetPartitionWriter;

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(&cli);

    match cli.command {
        Commands::Run {
            date,
            bucket,
            config,
            compression,
        } => {
            let mut config = load_configuration(config.as_deref())?;
            if let Some(bucket) = bucket {
                config.bucket = bucket.display().to_string();
            }
            if let Some(compression) = compression {
                config.compression = compression;
            }
            if date.is_some() {
                config.run_date = date;
            }
            config.log_config();

            let locations = config
                .location_set()
                .context("Invalid location configuration")?;
            let source = OpenMeteoSource::new(&config.api_url, config.request_timeout())?;
            let sink = ParquetPartitionWriter::new(&config.bucket)
                .with_compression(&config.compression)?;
            let pipeline = EtlPipeline::new(source, sink);

            let progress = ProgressReporter::new_spinner("Fetching weather data...", cli.quiet);
            let summary = pipeline
                .run(&locations, config.run_date, Some(&progress))
                .await
                .context("Weather ETL run failed")?;

            println!("{}", summary.summary());
            info!("Weather ETL run complete");
        }

        Commands::Audit {
            bucket,
            prefix,
            config,
        } => {
            let root = match bucket {
                Some(bucket) => bucket,
                None => PathBuf::from(load_configuration(config.as_deref())?.bucket),
            };
            debug!(root = %root.display(), prefix = %prefix, "starting schema audit");

            let report = SchemaAuditor::new()
                .audit(&root, &prefix)
                .with_context(|| format!("Failed to audit {}", root.display()))?;

            print!("{}", report.summary());
            if !report.is_clean() {
                bail!("{} file(s) with schema findings", report.findings.len());
            }
        }
    }

    Ok(())
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_etl={}", cli.log_level())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();

    debug!("Logging initialized at level: {}", cli.log_level());
}

fn load_configuration(path: Option<&Path>) -> Result<EtlConfig> {
    EtlConfig::load(path, Path::new(DEFAULT_CONFIG_FILE)).context("Failed to load configuration")
}
