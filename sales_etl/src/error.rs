use std::fmt::{Display, Formatter};

use crate::config::SUBJECT_PREFIX;

/// Error type returned by every collaborator. Same shape as `lambda_runtime::Error`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where a dataset read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    LocalFile,
    S3Object,
}

impl Display for ReadKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadKind::LocalFile => write!(f, "CSV file"),
            ReadKind::S3Object => write!(f, "S3 file"),
        }
    }
}

/// A failed pipeline step. The display text doubles as the notification message.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to retrieve database credentials: {0}")]
    Credentials(#[source] BoxError),

    #[error("Error reading {kind}: {source}")]
    DatasetRead {
        kind: ReadKind,
        #[source]
        source: BoxError,
    },

    #[error("Database connection error: {0}")]
    Connection(#[source] BoxError),

    #[error("Error inserting data into RDS: {0}")]
    Write(#[source] BoxError),
}

impl JobError {
    pub fn local_read(source: impl Into<BoxError>) -> Self {
        JobError::DatasetRead { kind: ReadKind::LocalFile, source: source.into() }
    }

    pub fn object_read(source: impl Into<BoxError>) -> Self {
        JobError::DatasetRead { kind: ReadKind::S3Object, source: source.into() }
    }

    /// Subject line of the failure notification for this kind of error.
    pub fn subject(&self) -> String {
        let reason = match self {
            JobError::Credentials(_) => "Database Credentials Error",
            JobError::DatasetRead { kind: ReadKind::LocalFile, .. } => "CSV Read Error",
            JobError::DatasetRead { kind: ReadKind::S3Object, .. } => "S3 File Read Error",
            JobError::Connection(_) => "Database Connection Error",
            JobError::Write(_) => "Data Insert Error",
        };
        format!("{} - {}", SUBJECT_PREFIX, reason)
    }
}

#[test]
fn test_subjects() {
    assert_eq!(
        JobError::Credentials("denied".into()).subject(),
        "Sales Job Failed - Database Credentials Error"
    );
    assert_eq!(JobError::local_read("bad row").subject(), "Sales Job Failed - CSV Read Error");
    assert_eq!(JobError::object_read("NoSuchKey").subject(), "Sales Job Failed - S3 File Read Error");
    assert_eq!(JobError::Write("gone".into()).to_string(), "Error inserting data into RDS: gone");
    assert_eq!(JobError::object_read("NoSuchKey").to_string(), "Error reading S3 file: NoSuchKey");
}
