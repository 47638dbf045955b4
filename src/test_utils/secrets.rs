use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SqlHelperError;
use crate::secrets::SecretsClient;

enum Entry {
    Payload(String),
    Denied,
    Unavailable,
}

/// A [`SecretsClient`] serving fixed payloads and counting every fetch.
#[derive(Default)]
pub struct StaticSecretsClient {
    entries: HashMap<String, Entry>,
    fetches: AtomicUsize,
}

impl StaticSecretsClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `payload` verbatim as the `SecretString` of `name`.
    #[must_use]
    pub fn with_secret(mut self, name: impl Into<String>, payload: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Entry::Payload(payload.into()));
        self
    }

    #[must_use]
    pub fn with_json(self, name: impl Into<String>, payload: &Value) -> Self {
        self.with_secret(name, payload.to_string())
    }

    /// Answer `name` with `AccessDenied`.
    #[must_use]
    pub fn denying(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Entry::Denied);
        self
    }

    /// Answer `name` with `ServiceUnavailable`.
    #[must_use]
    pub fn unavailable(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Entry::Unavailable);
        self
    }

    /// Number of `get_secret_value` calls so far, failed ones included.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretsClient for StaticSecretsClient {
    async fn get_secret_value(&self, secret_id: &str) -> Result<String, SqlHelperError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(secret_id) {
            Some(Entry::Payload(payload)) => Ok(payload.clone()),
            Some(Entry::Denied) => Err(SqlHelperError::AccessDenied(secret_id.to_string())),
            Some(Entry::Unavailable) => Err(SqlHelperError::ServiceUnavailable(format!(
                "{secret_id}: service unavailable"
            ))),
            None => Err(SqlHelperError::SecretNotFound(secret_id.to_string())),
        }
    }
}
