//! Reading database credentials out of AWS Secrets Manager.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use serde::{Deserialize, Deserializer};

use crate::error::SqlHelperError;

pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Anything that can hand back the `SecretString` of a secret.
///
/// [`AwsSecretsManager`] is the real implementation; tests substitute an in-memory one.
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Fetch the raw `SecretString` for `secret_id`.
    ///
    /// # Errors
    /// Returns `SecretNotFound`, `AccessDenied` or `ServiceUnavailable`.
    async fn get_secret_value(&self, secret_id: &str) -> Result<String, SqlHelperError>;
}

/// Transport settings for the Secrets Manager client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    pub endpoint_url: Option<String>,
    pub operation_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
}

impl ClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Region, credential profile and transport settings used to open a client.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub region: String,
    pub profile: Option<String>,
    pub client_config: Option<ClientConfig>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
            client_config: None,
        }
    }
}

/// Secrets Manager client bound to one region and profile.
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    client: Client,
}

impl AwsSecretsManager {
    /// Load AWS configuration for `session` and build a client.
    ///
    /// Credentials are resolved lazily, so this does not contact AWS.
    pub async fn from_session(session: &SessionOptions) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(session.region.clone()));
        if let Some(profile) = &session.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&sdk_config);
        if let Some(client_config) = &session.client_config {
            if let Some(url) = &client_config.endpoint_url {
                builder = builder.endpoint_url(url);
            }
            if client_config.operation_timeout.is_some()
                || client_config.connect_timeout.is_some()
            {
                let mut timeouts = TimeoutConfig::builder();
                if let Some(timeout) = client_config.operation_timeout {
                    timeouts = timeouts.operation_timeout(timeout);
                }
                if let Some(timeout) = client_config.connect_timeout {
                    timeouts = timeouts.connect_timeout(timeout);
                }
                builder = builder.timeout_config(timeouts.build());
            }
            if let Some(attempts) = client_config.max_attempts {
                builder =
                    builder.retry_config(RetryConfig::standard().with_max_attempts(attempts));
            }
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl SecretsClient for AwsSecretsManager {
    async fn get_secret_value(&self, secret_id: &str) -> Result<String, SqlHelperError> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service_err) if service_err.is_resource_not_found_exception() => {
                    SqlHelperError::SecretNotFound(secret_id.to_string())
                }
                Some(service_err)
                    if matches!(
                        service_err.code(),
                        Some("AccessDeniedException" | "DecryptionFailure")
                    ) =>
                {
                    SqlHelperError::AccessDenied(format!(
                        "{secret_id}: {}",
                        DisplayErrorContext(&err)
                    ))
                }
                _ => SqlHelperError::ServiceUnavailable(DisplayErrorContext(&err).to_string()),
            })?;

        response.secret_string().map(str::to_string).ok_or_else(|| {
            SqlHelperError::MalformedSecret(format!("{secret_id} has no SecretString"))
        })
    }
}

/// Database credentials stored in a secret.
///
/// Only these five fields are read; anything else in the secret is ignored.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SecretRecord {
    pub host: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    pub dbname: String,
    pub username: String,
    pub password: String,
}

impl SecretRecord {
    /// Parse a `SecretString`.
    ///
    /// # Errors
    /// Returns `SqlHelperError::MalformedSecret` if the payload is not JSON, a required
    /// field is missing, or `port` is not a valid port number.
    pub fn from_secret_string(payload: &str) -> Result<Self, SqlHelperError> {
        serde_json::from_str(payload).map_err(|e| SqlHelperError::MalformedSecret(e.to_string()))
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortField {
    Number(serde_json::Number),
    Text(String),
}

fn deserialize_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    use serde::de::Error;

    let port = match PortField::deserialize(deserializer)? {
        PortField::Number(n) => match n.as_u64() {
            Some(port) => port,
            None => match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 => f as u64,
                _ => return Err(D::Error::custom(format!("invalid port {n}"))),
            },
        },
        PortField::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("invalid port {s:?}")))?,
    };
    u16::try_from(port).map_err(|_| D::Error::custom(format!("port {port} out of range")))
}
