use sales_etl::config::{csv_file_path, JobConfig};
use sales_etl::{aws, DatasetSource, Pipeline};
use std::env;
use tracing::error;

const TRACING_DEBUG: &str = "TRACING_DEBUG";

/// Runs the job once against the local CSV file. Failures are logged, never
/// turned into a non-zero exit.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(match env::var(TRACING_DEBUG) {
            Ok(_) => tracing::Level::DEBUG,
            Err(_) => tracing::Level::INFO,
        })
        // disable printing the name of the module in every log line.
        .with_target(false)
        .init();

    let config = match JobConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Job failed: {}", e);
            return;
        }
    };
    let sdk_config = aws::load_config().await;
    let pipeline = Pipeline::new(config, aws::collaborators(&sdk_config));

    if let Err(e) = pipeline.run(&DatasetSource::LocalFile(csv_file_path())).await {
        error!("Job failed: {}", e);
    }
}
