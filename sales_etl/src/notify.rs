use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::AWS_REGION;
use crate::error::BoxError;

/// Resolves the account the process runs as (AWS STS in production).
#[async_trait]
pub trait AccountIdentity: Send + Sync {
    /// `None` when the service answered without an account id.
    async fn account_id(&self) -> Result<Option<String>, BoxError>;
}

/// Publishes a message to a topic (AWS SNS in production). Returns the message id.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<String, BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to fetch AWS account ID: {0}")]
    Identity(#[source] BoxError),

    #[error("caller identity has no account ID")]
    MissingAccount,

    #[error("failed to publish to {topic_arn}: {source}")]
    Publish {
        topic_arn: String,
        #[source]
        source: BoxError,
    },
}

pub fn topic_arn(region: &str, account_id: &str, topic_name: &str) -> String {
    format!("arn:aws:sns:{}:{}:{}", region, account_id, topic_name)
}

/// Best-effort failure notifications. The topic ARN is resolved on every send.
#[derive(Clone)]
pub struct Notifier {
    identity: Arc<dyn AccountIdentity>,
    publisher: Arc<dyn Publisher>,
    topic_name: String,
}

impl Notifier {
    pub fn new(identity: Arc<dyn AccountIdentity>, publisher: Arc<dyn Publisher>, topic_name: &str) -> Notifier {
        Notifier { identity, publisher, topic_name: topic_name.to_string() }
    }

    pub async fn topic_arn(&self) -> Result<String, NotifyError> {
        let account_id = self
            .identity
            .account_id()
            .await
            .map_err(NotifyError::Identity)?
            .ok_or(NotifyError::MissingAccount)?;
        Ok(topic_arn(AWS_REGION, &account_id, &self.topic_name))
    }

    /// Sends one notification. Failures are logged and handed back, never raised,
    /// so they cannot replace the error being reported.
    pub async fn notify(&self, subject: &str, message: &str) -> Result<String, NotifyError> {
        match self.send(subject, message).await {
            Ok(message_id) => {
                info!("SNS Notification sent: {}", subject);
                Ok(message_id)
            }
            Err(e) => {
                error!("Failed to send SNS notification: {}", e);
                Err(e)
            }
        }
    }

    async fn send(&self, subject: &str, message: &str) -> Result<String, NotifyError> {
        let topic_arn = self.topic_arn().await?;
        let published = self.publisher.publish(&topic_arn, subject, message).await;
        published.map_err(|source| NotifyError::Publish { topic_arn, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedIdentity, RecordingPublisher};

    #[tokio::test]
    async fn test_publishes_to_account_topic() {
        let publisher = Arc::new(RecordingPublisher::default());
        let notifier = Notifier::new(Arc::new(FixedIdentity::account("123456789012")), publisher.clone(), "dev_sales");

        let message_id = notifier.notify("Sales Job Failed - CSV Read Error", "bad row").await.unwrap();
        assert_eq!(message_id, "message-1");

        let sent = publisher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic_arn, "arn:aws:sns:us-east-1:123456789012:dev_sales");
        assert_eq!(sent[0].subject, "Sales Job Failed - CSV Read Error");
        assert_eq!(sent[0].message, "bad row");
    }

    #[tokio::test]
    async fn test_identity_failure_is_returned_not_raised() {
        let publisher = Arc::new(RecordingPublisher::default());
        let notifier = Notifier::new(Arc::new(FixedIdentity::failing()), publisher.clone(), "dev_sales");
        let err = notifier.notify("subject", "message").await.unwrap_err();
        assert!(matches!(err, NotifyError::Identity(_)));
        assert!(publisher.sent().is_empty());

        let notifier = Notifier::new(Arc::new(FixedIdentity::default()), publisher.clone(), "dev_sales");
        assert!(matches!(notifier.notify("subject", "message").await, Err(NotifyError::MissingAccount)));
    }

    #[tokio::test]
    async fn test_publish_failure() {
        let publisher = Arc::new(RecordingPublisher::failing());
        let notifier = Notifier::new(Arc::new(FixedIdentity::account("123456789012")), publisher, "dev_sales");
        let err = notifier.notify("subject", "message").await.unwrap_err();
        assert!(err.to_string().starts_with("failed to publish to arn:aws:sns:us-east-1:123456789012:dev_sales"));
    }
}
