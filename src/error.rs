use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlHelperError {
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    /// The secret id is unknown to Secrets Manager.
    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    /// The caller's identity may not read the secret (or decrypt it).
    #[error("Access denied reading secret: {0}")]
    AccessDenied(String),

    /// Any other failure talking to Secrets Manager (network, throttling, service fault).
    #[error("Secrets Manager unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Malformed secret: {0}")]
    MalformedSecret(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("CA file not found: {}", .0.display())]
    CaFileNotFound(PathBuf),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A normalized value could not be bound to the column type the server asked for.
    #[error("Parameter conversion error: {0}")]
    ParameterError(String),
}

impl SqlHelperError {
    /// True for the three ways fetching the secret itself can fail.
    #[must_use]
    pub fn is_secret_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::SecretNotFound(_) | Self::AccessDenied(_) | Self::ServiceUnavailable(_)
        )
    }
}

impl From<bb8::RunError<SqlHelperError>> for SqlHelperError {
    fn from(err: bb8::RunError<SqlHelperError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => {
                SqlHelperError::ConnectionError("timed out waiting for a pooled connection".into())
            }
        }
    }
}
