use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{JobConfig, TABLE_NAME};
use crate::credentials::{self, Credentials, ParameterStore, SecretStore};
use crate::database::{Connector, TableSink, WritePolicy};
use crate::dataset::{self, Dataset, ObjectStore};
use crate::error::JobError;
use crate::notify::{AccountIdentity, Notifier, Publisher};

/// Where the run reads its dataset from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    LocalFile(PathBuf),
    S3Object { bucket: String, key: String },
}

impl Display for DatasetSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSource::LocalFile(path) => write!(f, "{}", path.display()),
            DatasetSource::S3Object { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

/// Every external service a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub secrets: Arc<dyn SecretStore>,
    pub parameters: Arc<dyn ParameterStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub connector: Arc<dyn Connector>,
    pub identity: Arc<dyn AccountIdentity>,
    pub publisher: Arc<dyn Publisher>,
}

/// Credentials -> dataset -> connection -> table write. A failing step sends one
/// notification and ends the run with that step's error.
pub struct Pipeline {
    config: JobConfig,
    secrets: Arc<dyn SecretStore>,
    parameters: Arc<dyn ParameterStore>,
    objects: Arc<dyn ObjectStore>,
    connector: Arc<dyn Connector>,
    notifier: Notifier,
    policy: WritePolicy,
}

impl Pipeline {
    pub fn new(config: JobConfig, collaborators: Collaborators) -> Pipeline {
        let notifier = Notifier::new(collaborators.identity, collaborators.publisher, &config.topic_name);
        Pipeline {
            config,
            secrets: collaborators.secrets,
            parameters: collaborators.parameters,
            objects: collaborators.objects,
            connector: collaborators.connector,
            notifier,
            policy: WritePolicy::ReplaceTable,
        }
    }

    pub async fn run(&self, source: &DatasetSource) -> Result<(), JobError> {
        info!("loading {} into table {}", source, TABLE_NAME);
        let credentials = self.reported(self.credentials().await).await?;
        let dataset = self.reported(self.load(source).await).await?;
        let sink = self.reported(self.connect(&credentials).await).await?;
        self.reported(self.write(sink.as_ref(), &dataset).await).await?;
        info!("Data inserted successfully into AWS RDS MySQL database!");
        Ok(())
    }

    async fn credentials(&self) -> Result<Credentials, JobError> {
        credentials::resolve(
            self.secrets.as_ref(),
            self.parameters.as_ref(),
            &self.config.secret_name,
            self.config.host_parameter.as_deref(),
        )
        .await
        .map_err(JobError::Credentials)
    }

    async fn load(&self, source: &DatasetSource) -> Result<Dataset, JobError> {
        let dataset = match source {
            DatasetSource::LocalFile(path) => dataset::load_local(path).await.map_err(JobError::local_read)?,
            DatasetSource::S3Object { bucket, key } => dataset::load_object(self.objects.as_ref(), bucket, key)
                .await
                .map_err(JobError::object_read)?,
        };
        debug!("read {} rows with columns {:?}", dataset.len(), dataset.column_names());
        Ok(dataset)
    }

    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn TableSink>, JobError> {
        self.connector.connect(credentials).await.map_err(JobError::Connection)
    }

    async fn write(&self, sink: &dyn TableSink, dataset: &Dataset) -> Result<(), JobError> {
        sink.write(TABLE_NAME, dataset, self.policy).await.map_err(JobError::Write)
    }

    // Notification problems are logged by the notifier and never replace `result`.
    async fn reported<T>(&self, result: Result<T, JobError>) -> Result<T, JobError> {
        if let Err(e) = &result {
            let _ = self.notifier.notify(&e.subject(), &e.to_string()).await;
        }
        result
    }
}
