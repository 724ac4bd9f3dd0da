use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::BoxError;

/// Source of secret payloads (AWS Secrets Manager in production).
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn secret_string(&self, name: &str) -> Result<String, BoxError>;
}

/// Source of plain parameter values (AWS SSM in production). Values are read undecrypted.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn parameter_value(&self, name: &str) -> Result<String, BoxError>;
}

/// Database connection parameters as stored in the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub host: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    pub dbname: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .finish()
    }
}

// RDS-managed secrets store the port as a number, hand-written ones often as a string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl Credentials {
    pub fn from_secret(payload: &str) -> Result<Credentials, BoxError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Fetches the secret and, when `host_parameter` is given, replaces the host with
/// the parameter's value. Either all five fields come back or an error does.
pub async fn resolve(
    secrets: &dyn SecretStore,
    parameters: &dyn ParameterStore,
    secret_name: &str,
    host_parameter: Option<&str>,
) -> Result<Credentials, BoxError> {
    debug!("fetching database credentials from secret {}", secret_name);
    let payload = secrets.secret_string(secret_name).await?;
    let mut credentials = Credentials::from_secret(&payload)?;

    if let Some(parameter) = host_parameter {
        debug!("overriding database host from parameter {}", parameter);
        credentials.host = parameters.parameter_value(parameter).await?.trim().to_string();
    }

    if credentials.host.is_empty() {
        return Err(BoxError::from(format!("secret {} has no database host", secret_name)));
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryParameters, MemorySecrets};

    const SECRET: &str = r#"{"username":"u","password":"p","host":"h","port":3306,"dbname":"d"}"#;

    #[test]
    fn test_port_as_number_or_string() {
        let creds = Credentials::from_secret(SECRET).unwrap();
        assert_eq!(creds.port, 3306);
        let creds = Credentials::from_secret(
            r#"{"username":"u","password":"p","host":"h","port":"3307","dbname":"d","engine":"mysql"}"#,
        )
        .unwrap();
        assert_eq!(creds.port, 3307);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = Credentials::from_secret(r#"{"username":"u","password":"p","host":"h","port":3306}"#)
            .unwrap_err();
        assert!(err.to_string().contains("dbname"));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::from_secret(SECRET).unwrap();
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("\"p\""));
        assert!(printed.contains("********"));
    }

    #[tokio::test]
    async fn test_host_parameter_overrides_secret_host() {
        let secrets = MemorySecrets::with("dev/rds/database1", SECRET);
        let parameters = MemoryParameters::with("/dev/rds/host", "db.internal\n");
        let creds = resolve(&secrets, &parameters, "dev/rds/database1", Some("/dev/rds/host"))
            .await
            .unwrap();
        assert_eq!(creds.host, "db.internal");
        assert_eq!(creds.username, "u");

        let creds = resolve(&secrets, &parameters, "dev/rds/database1", None).await.unwrap();
        assert_eq!(creds.host, "h");
    }

    #[tokio::test]
    async fn test_missing_host_without_parameter() {
        let secrets = MemorySecrets::with(
            "no-host",
            r#"{"username":"u","password":"p","port":3306,"dbname":"d"}"#,
        );
        let err = resolve(&secrets, &MemoryParameters::default(), "no-host", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "secret no-host has no database host");
    }

    #[tokio::test]
    async fn test_unknown_secret() {
        let err = resolve(&MemorySecrets::default(), &MemoryParameters::default(), "missing", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
