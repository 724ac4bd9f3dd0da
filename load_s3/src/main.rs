use lambda_runtime::{run, service_fn, Error};
use load_s3::function_handler;
use sales_etl::{aws, JobConfig, Pipeline};
use std::env;

const TRACING_DEBUG: &str = "TRACING_DEBUG";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(match env::var(TRACING_DEBUG) {
            Ok(_) => tracing::Level::DEBUG,
            Err(_) => tracing::Level::INFO,
        })
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let config = JobConfig::from_env()?;
    let sdk_config = aws::load_config().await;
    let pipeline = Pipeline::new(config, aws::collaborators(&sdk_config));

    run(service_fn(|event| function_handler(event, &pipeline))).await
}
