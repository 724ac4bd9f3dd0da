//! In-memory collaborators for exercising the pipeline without AWS or MySQL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::credentials::{Credentials, ParameterStore, SecretStore};
use crate::database::{ConnectionUrl, Connector, TableSink, WritePolicy};
use crate::dataset::{Cell, Dataset, ObjectStore};
use crate::error::BoxError;
use crate::notify::{AccountIdentity, Publisher};
use crate::pipeline::Collaborators;

#[derive(Debug, Default)]
pub struct MemorySecrets {
    secrets: HashMap<String, String>,
    fail: bool,
}

impl MemorySecrets {
    pub fn with(name: &str, payload: &str) -> MemorySecrets {
        MemorySecrets { secrets: HashMap::from([(name.to_string(), payload.to_string())]), fail: false }
    }

    /// Every lookup fails as if access were denied.
    pub fn failing() -> MemorySecrets {
        MemorySecrets { secrets: HashMap::new(), fail: true }
    }
}

#[async_trait]
impl SecretStore for MemorySecrets {
    async fn secret_string(&self, name: &str) -> Result<String, BoxError> {
        if self.fail {
            return Err(BoxError::from(format!("AccessDeniedException: not authorized to read {}", name)));
        }
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| BoxError::from(format!("ResourceNotFoundException: secret {} not found", name)))
    }
}

#[derive(Debug, Default)]
pub struct MemoryParameters {
    parameters: HashMap<String, String>,
}

impl MemoryParameters {
    pub fn with(name: &str, value: &str) -> MemoryParameters {
        MemoryParameters { parameters: HashMap::from([(name.to_string(), value.to_string())]) }
    }
}

#[async_trait]
impl ParameterStore for MemoryParameters {
    async fn parameter_value(&self, name: &str) -> Result<String, BoxError> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| BoxError::from(format!("ParameterNotFound: {}", name)))
    }
}

#[derive(Debug, Default)]
pub struct MemoryObjects {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl MemoryObjects {
    pub fn with(bucket: &str, key: &str, data: Vec<u8>) -> MemoryObjects {
        MemoryObjects { objects: HashMap::from([((bucket.to_string(), key.to_string()), data)]) }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn object_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BoxError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BoxError::from(format!("NoSuchKey: s3://{}/{}", bucket, key)))
    }
}

#[derive(Debug, Default)]
pub struct FixedIdentity {
    account_id: Option<String>,
    fail: bool,
}

impl FixedIdentity {
    pub fn account(account_id: &str) -> FixedIdentity {
        FixedIdentity { account_id: Some(account_id.to_string()), fail: false }
    }

    pub fn failing() -> FixedIdentity {
        FixedIdentity { account_id: None, fail: true }
    }
}

#[async_trait]
impl AccountIdentity for FixedIdentity {
    async fn account_id(&self) -> Result<Option<String>, BoxError> {
        if self.fail {
            return Err(BoxError::from("dispatch failure: no credentials"));
        }
        Ok(self.account_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic_arn: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<Published>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> RecordingPublisher {
        RecordingPublisher { sent: Mutex::new(Vec::new()), fail: true }
    }

    /// Messages published successfully so far.
    pub fn sent(&self) -> Vec<Published> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<String, BoxError> {
        if self.fail {
            return Err(BoxError::from("AuthorizationError: not allowed to publish"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(Published {
            topic_arn: topic_arn.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(format!("message-{}", sent.len()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Tables held in memory. `connect` records the connection URL of every call.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<DatabaseState>>,
    fail_connect: bool,
    fail_write: bool,
}

#[derive(Debug, Default)]
struct DatabaseState {
    urls: Vec<String>,
    tables: HashMap<String, StoredTable>,
    writes: usize,
}

impl MemoryDatabase {
    pub fn failing_connect() -> MemoryDatabase {
        MemoryDatabase { fail_connect: true, ..Default::default() }
    }

    pub fn failing_write() -> MemoryDatabase {
        MemoryDatabase { fail_write: true, ..Default::default() }
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.lock().unwrap().urls.clone()
    }

    pub fn table(&self, name: &str) -> Option<StoredTable> {
        self.state.lock().unwrap().tables.get(name).cloned()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

#[async_trait]
impl Connector for MemoryDatabase {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn TableSink>, BoxError> {
        let url = ConnectionUrl::new(credentials);
        self.state.lock().unwrap().urls.push(url.as_str().to_string());
        if self.fail_connect {
            return Err(BoxError::from("invalid port number"));
        }
        Ok(Box::new(MemorySink { state: self.state.clone(), fail: self.fail_write }))
    }
}

struct MemorySink {
    state: Arc<Mutex<DatabaseState>>,
    fail: bool,
}

#[async_trait]
impl TableSink for MemorySink {
    async fn write(&self, table: &str, dataset: &Dataset, policy: WritePolicy) -> Result<(), BoxError> {
        if self.fail {
            return Err(BoxError::from("Can't connect to MySQL server"));
        }
        let mut state = self.state.lock().unwrap();
        match policy {
            WritePolicy::ReplaceTable => {
                state.tables.insert(
                    table.to_string(),
                    StoredTable {
                        columns: dataset.column_names().iter().map(|c| c.to_string()).collect(),
                        rows: dataset.rows().to_vec(),
                    },
                );
            }
        }
        state.writes += 1;
        Ok(())
    }
}

/// Handles on the fakes behind a [`Collaborators`] value, for assertions.
pub struct Fakes {
    pub database: Arc<MemoryDatabase>,
    pub publisher: Arc<RecordingPublisher>,
}

/// Wraps the fakes into [`Collaborators`], keeping handles to the ones tests inspect.
pub fn collaborators(
    secrets: MemorySecrets,
    parameters: MemoryParameters,
    objects: MemoryObjects,
    database: MemoryDatabase,
    identity: FixedIdentity,
    publisher: RecordingPublisher,
) -> (Collaborators, Fakes) {
    let database = Arc::new(database);
    let publisher = Arc::new(publisher);
    let collaborators = Collaborators {
        secrets: Arc::new(secrets),
        parameters: Arc::new(parameters),
        objects: Arc::new(objects),
        connector: database.clone(),
        identity: Arc::new(identity),
        publisher: publisher.clone(),
    };
    (collaborators, Fakes { database, publisher })
}
