use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{Error, LambdaEvent};
use percent_encoding::percent_decode_str;
use sales_etl::{DatasetSource, Pipeline};
use tracing::{error, info, warn};

/// Object keys in S3 events are form-encoded: spaces as `+`, the rest as `%XX`.
fn decode_key(encoded: &str) -> Result<String, Error> {
    let spaced = encoded.replace('+', " ");
    let key = percent_decode_str(&spaced)
        .decode_utf8()
        .map_err(|e| Error::from(format!("Invalid object key {:?} in S3 event: {}", encoded, e)))?;
    Ok(key.into_owned())
}

/// Bucket and decoded key of the first record.
pub fn object_location(event: &S3Event) -> Result<(String, String), Error> {
    let record = event
        .records
        .first()
        .ok_or_else(|| Error::from("No records found in S3 event"))?;
    if event.records.len() > 1 {
        warn!("ignoring {} extra records in S3 event", event.records.len() - 1);
    }
    let bucket = record
        .s3
        .bucket
        .name
        .clone()
        .ok_or_else(|| Error::from("No bucket name found in S3 event"))?;
    let encoded = record
        .s3
        .object
        .key
        .as_ref()
        .ok_or_else(|| Error::from("No object key found in S3 event"))?;
    Ok((bucket, decode_key(encoded)?))
}

/// Loads the object named by the event. The invocation succeeds even when the
/// job fails; failures only reach the logs and the SNS topic.
pub async fn function_handler(event: LambdaEvent<S3Event>, pipeline: &Pipeline) -> Result<(), Error> {
    let (bucket, key) = match object_location(&event.payload) {
        Ok(location) => location,
        Err(e) => {
            error!("Job failed: {}", e);
            return Ok(());
        }
    };
    info!("received S3 event for {}/{}", bucket, key);

    if let Err(e) = pipeline.run(&DatasetSource::S3Object { bucket, key }).await {
        error!("Job failed: {}", e);
    }
    Ok(())
}
