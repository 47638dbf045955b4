use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::error::SqlHelperError;
use crate::secrets::{ClientConfig, SecretRecord, SecretsClient, SessionOptions};

/// Driver-specific options, keyed by option name. Later writes win.
pub type DriverOptions = Map<String, Value>;

pub const DEFAULT_CHARSET: &str = "utf8";

/// Everything a caller can say about where the credentials live and how to connect.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretConnectionOptions {
    pub secret_name: String,
    pub session: SessionOptions,
    pub charset: String,
    pub host_override: Option<String>,
    /// Ignored unless greater than zero.
    pub port_override: Option<u16>,
    pub ca_file: Option<PathBuf>,
    /// Ignored unless greater than zero.
    pub connect_timeout: Option<Duration>,
    /// Merged after the computed options.
    pub extra: DriverOptions,
}

impl SecretConnectionOptions {
    #[must_use]
    pub fn new(secret_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            session: SessionOptions::default(),
            charset: DEFAULT_CHARSET.to_string(),
            host_override: None,
            port_override: None,
            ca_file: None,
            connect_timeout: None,
            extra: DriverOptions::new(),
        }
    }

    #[must_use]
    pub fn builder(secret_name: impl Into<String>) -> SecretConnectionOptionsBuilder {
        SecretConnectionOptionsBuilder::new(secret_name)
    }
}

/// Fluent builder for [`SecretConnectionOptions`].
#[derive(Debug, Clone)]
pub struct SecretConnectionOptionsBuilder {
    opts: SecretConnectionOptions,
}

impl SecretConnectionOptionsBuilder {
    #[must_use]
    pub fn new(secret_name: impl Into<String>) -> Self {
        Self {
            opts: SecretConnectionOptions::new(secret_name),
        }
    }

    #[must_use]
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.opts.session.profile = Some(profile.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.opts.session.region = region.into();
        self
    }

    #[must_use]
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.opts.session.client_config = Some(config);
        self
    }

    /// Client character set. Connecting fails with `ConfigError` unless it names UTF-8.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.opts.charset = charset.into();
        self
    }

    #[must_use]
    pub fn host_override(mut self, host: impl Into<String>) -> Self {
        self.opts.host_override = Some(host.into());
        self
    }

    #[must_use]
    pub fn port_override(mut self, port: u16) -> Self {
        self.opts.port_override = Some(port);
        self
    }

    #[must_use]
    pub fn ca_file(mut self, path: impl AsRef<Path>) -> Self {
        self.opts.ca_file = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connect_timeout = Some(timeout);
        self
    }

    /// Pass an option straight to the driver; overrides a computed option of the same name.
    #[must_use]
    pub fn driver_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.opts.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> SecretConnectionOptions {
        self.opts
    }
}

/// Connection parameters after the secret has been read and overrides applied.
#[derive(Clone, PartialEq)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub charset: String,
    pub ca_file: Option<PathBuf>,
    pub connect_timeout: Option<Duration>,
    pub extra: DriverOptions,
}

impl ConnectionConfig {
    /// Apply the caller's overrides on top of what the secret says.
    #[must_use]
    pub fn resolve(record: SecretRecord, options: &SecretConnectionOptions) -> Self {
        let endpoint = options.host_override.clone().unwrap_or(record.host);
        let port = options
            .port_override
            .filter(|port| *port > 0)
            .unwrap_or(record.port);

        Self {
            endpoint,
            port,
            dbname: record.dbname,
            user: record.username,
            password: record.password,
            charset: options.charset.clone(),
            ca_file: options.ca_file.clone(),
            connect_timeout: options.connect_timeout.filter(|t| !t.is_zero()),
            extra: options.extra.clone(),
        }
    }

    /// Options for a direct connection: the CA file nests under `ssl`.
    #[must_use]
    pub fn connection_driver_options(&self) -> DriverOptions {
        let ssl = self
            .ca_file
            .as_ref()
            .map(|ca| ("ssl", json!({ "ca": ca.to_string_lossy() })));
        self.driver_options(ssl)
    }

    /// Options for a pooled engine: the CA file is a flat `ssl_ca` key.
    #[must_use]
    pub fn engine_driver_options(&self) -> DriverOptions {
        let ssl = self
            .ca_file
            .as_ref()
            .map(|ca| ("ssl_ca", Value::from(ca.to_string_lossy())));
        self.driver_options(ssl)
    }

    fn driver_options(&self, ssl: Option<(&str, Value)>) -> DriverOptions {
        let mut options = DriverOptions::new();
        options.insert("charset".to_string(), Value::from(self.charset.as_str()));
        if let Some(timeout) = self.connect_timeout {
            options.insert("connect_timeout".to_string(), json!(timeout.as_secs_f64()));
        }
        if let Some((key, value)) = ssl {
            options.insert(key.to_string(), value);
        }
        for (key, value) in &self.extra {
            options.insert(key.clone(), value.clone());
        }
        options
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("charset", &self.charset)
            .field("ca_file", &self.ca_file)
            .field("connect_timeout", &self.connect_timeout)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Fetch the secret named in `options` and resolve it into a [`ConnectionConfig`].
///
/// Every call fetches the secret again.
///
/// # Errors
/// Returns the secret fetch error from `client`, or `SqlHelperError::MalformedSecret`.
pub async fn resolve_connection_config(
    client: &dyn SecretsClient,
    options: &SecretConnectionOptions,
) -> Result<ConnectionConfig, SqlHelperError> {
    let payload = client.get_secret_value(&options.secret_name).await?;
    let record = SecretRecord::from_secret_string(&payload)?;
    let config = ConnectionConfig::resolve(record, options);
    tracing::debug!(
        secret = %options.secret_name,
        endpoint = %config.endpoint,
        port = config.port,
        dbname = %config.dbname,
        user = %config.user,
        "resolved connection config from secret"
    );
    Ok(config)
}
