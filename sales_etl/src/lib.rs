//! Loads the sales CSV dataset into the `Sale` table of the reporting
//! database, publishing an SNS notification whenever a step fails.
//!
//! The same [`pipeline::Pipeline`] backs both deployables: the `load_local`
//! script reading a file from disk and the `load_s3` Lambda reacting to
//! S3 object events.

pub mod aws;
pub mod config;
pub mod credentials;
pub mod database;
pub mod dataset;
pub mod error;
pub mod notify;
pub mod pipeline;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::JobConfig;
pub use error::{BoxError, JobError, ReadKind};
pub use pipeline::{Collaborators, DatasetSource, Pipeline};
