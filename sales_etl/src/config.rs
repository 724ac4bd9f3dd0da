use std::env;
use std::path::PathBuf;

/// Region every AWS client and the notification topic ARN are pinned to.
pub const AWS_REGION: &str = "us-east-1";
/// Table replaced on every run.
pub const TABLE_NAME: &str = "Sale";
pub const SUBJECT_PREFIX: &str = "Sales Job Failed";
/// Dataset path used by the script when `CSV_FILE_PATH` is not set.
pub const DEFAULT_CSV_FILE_PATH: &str = "Salescsvfile.csv";

const SECRET_NAME: &str = "SECRET_NAME";
const SNS_TOPIC_NAME: &str = "SNS_TOPIC_NAME";
const DB_HOST_PARAMETER: &str = "DB_HOST_PARAMETER";
const CSV_FILE_PATH: &str = "CSV_FILE_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {0} env var")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub secret_name: String,
    pub topic_name: String,
    /// When set, the database host is read from this SSM parameter instead of the secret.
    pub host_parameter: Option<String>,
}

impl JobConfig {
    pub fn from_env() -> Result<JobConfig, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any name -> value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<JobConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(JobConfig {
            secret_name: get(SECRET_NAME).ok_or(ConfigError::Missing(SECRET_NAME))?,
            topic_name: get(SNS_TOPIC_NAME).ok_or(ConfigError::Missing(SNS_TOPIC_NAME))?,
            host_parameter: get(DB_HOST_PARAMETER),
        })
    }
}

/// Local dataset path for the script entry point.
pub fn csv_file_path() -> PathBuf {
    env::var(CSV_FILE_PATH)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CSV_FILE_PATH.to_string())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_required_and_optional_vars() {
        let config = JobConfig::from_lookup(lookup(&[
            ("SECRET_NAME", "dev/rds/database1"),
            ("SNS_TOPIC_NAME", "dev_sales"),
        ]))
        .unwrap();
        assert_eq!(config.secret_name, "dev/rds/database1");
        assert_eq!(config.topic_name, "dev_sales");
        assert_eq!(config.host_parameter, None);

        let config = JobConfig::from_lookup(lookup(&[
            ("SECRET_NAME", "dev/rds/database1"),
            ("SNS_TOPIC_NAME", "dev_sales"),
            ("DB_HOST_PARAMETER", "/dev/rds/host"),
        ]))
        .unwrap();
        assert_eq!(config.host_parameter.as_deref(), Some("/dev/rds/host"));
    }

    #[test]
    fn test_missing_secret_name() {
        let err = JobConfig::from_lookup(lookup(&[("SNS_TOPIC_NAME", "dev_sales"), ("SECRET_NAME", " ")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "missing SECRET_NAME env var");
    }
}
