use std::sync::Arc;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3 as s3;
use aws_sdk_secretsmanager as secretsmanager;
use aws_sdk_sns as sns;
use aws_sdk_ssm as ssm;
use aws_sdk_sts as sts;
use s3::error::DisplayErrorContext;

use crate::config::AWS_REGION;
use crate::credentials::{ParameterStore, SecretStore};
use crate::database::MySqlConnector;
use crate::dataset::ObjectStore;
use crate::error::BoxError;
use crate::notify::{AccountIdentity, Publisher};
use crate::pipeline::Collaborators;

// SDK errors only print "service error" on their own.
fn sdk_error<E: std::error::Error>(e: E) -> BoxError {
    BoxError::from(DisplayErrorContext(e).to_string())
}

pub async fn load_config() -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(Region::new(AWS_REGION));
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// Real AWS clients plus the MySQL connector, all sharing one SDK config.
pub fn collaborators(config: &SdkConfig) -> Collaborators {
    Collaborators {
        secrets: Arc::new(secretsmanager::Client::new(config)),
        parameters: Arc::new(ssm::Client::new(config)),
        objects: Arc::new(s3::Client::new(config)),
        connector: Arc::new(MySqlConnector),
        identity: Arc::new(sts::Client::new(config)),
        publisher: Arc::new(sns::Client::new(config)),
    }
}

#[async_trait]
impl SecretStore for secretsmanager::Client {
    async fn secret_string(&self, name: &str) -> Result<String, BoxError> {
        let result = self.get_secret_value().secret_id(name).send().await.map_err(sdk_error)?;
        result
            .secret_string()
            .map(|s| s.to_string())
            .ok_or_else(|| BoxError::from(format!("secret {} has no SecretString", name)))
    }
}

#[async_trait]
impl ParameterStore for ssm::Client {
    async fn parameter_value(&self, name: &str) -> Result<String, BoxError> {
        let result = self
            .get_parameter()
            .name(name)
            .with_decryption(false)
            .send()
            .await
            .map_err(sdk_error)?;
        result
            .parameter()
            .and_then(|p| p.value())
            .map(|v| v.to_string())
            .ok_or_else(|| BoxError::from(format!("parameter {} has no value", name)))
    }
}

#[async_trait]
impl ObjectStore for s3::Client {
    async fn object_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BoxError> {
        let resp = self.get_object().bucket(bucket).key(key).send().await.map_err(sdk_error)?;
        let collected = resp.body.collect().await?;
        Ok(collected.into_bytes().to_vec())
    }
}

#[async_trait]
impl AccountIdentity for sts::Client {
    async fn account_id(&self) -> Result<Option<String>, BoxError> {
        let identity = self.get_caller_identity().send().await.map_err(sdk_error)?;
        Ok(identity.account().map(|a| a.to_string()))
    }
}

#[async_trait]
impl Publisher for sns::Client {
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<String, BoxError> {
        let result = self
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(result.message_id().unwrap_or_default().to_string())
    }
}
