use std::path::{Path, PathBuf};
use std::time::Duration;

use native_tls::{Certificate, TlsConnector};
use postgres_native_tls::MakeTlsConnector;
use serde_json::Value;
use tokio_postgres::config::SslMode;

use crate::config::{ConnectionConfig, DriverOptions};
use crate::error::SqlHelperError;

/// Where a driver-options map keeps the CA file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsLayout {
    /// `{"ssl": {"ca": "<path>"}}`, used by direct connections.
    Nested,
    /// `{"ssl_ca": "<path>"}`, used by pooled engines.
    Flat,
}

/// A `tokio_postgres::Config` plus the CA file the connector must trust, if any.
#[derive(Debug, Clone)]
pub struct PgConnectParams {
    pub config: tokio_postgres::Config,
    pub ca_file: Option<PathBuf>,
}

/// Translate resolved credentials and a driver-options map into `tokio-postgres` terms.
///
/// `charset` must name UTF-8, the only client encoding `tokio-postgres` speaks. The
/// options `connect_timeout` (seconds), `application_name`, `sslmode` and `keepalives`
/// map to the matching config setters. Any other scalar option is sent to the server as
/// a runtime parameter.
///
/// # Errors
/// Returns `SqlHelperError::ConfigError` for option values of the wrong shape, or for
/// the CA key of the other [`TlsLayout`].
pub fn build_pg_config(
    resolved: &ConnectionConfig,
    options: &DriverOptions,
    layout: TlsLayout,
) -> Result<PgConnectParams, SqlHelperError> {
    let mut config = tokio_postgres::Config::new();
    config
        .host(&resolved.endpoint)
        .port(resolved.port)
        .dbname(&resolved.dbname)
        .user(&resolved.user)
        .password(&resolved.password);

    let mut runtime_params: Vec<(String, String)> = Vec::new();
    let mut ca_file = None;
    let mut ssl_mode_set = false;

    for (key, value) in options {
        match (key.as_str(), layout) {
            ("charset", _) => check_charset(&scalar(key, value)?)?,
            ("connect_timeout", _) => {
                if let Some(timeout) = seconds(key, value)? {
                    config.connect_timeout(timeout);
                }
            }
            ("application_name", _) => {
                config.application_name(&scalar(key, value)?);
            }
            ("sslmode", _) => {
                config.ssl_mode(parse_ssl_mode(&scalar(key, value)?)?);
                ssl_mode_set = true;
            }
            ("keepalives", _) => {
                let enabled = value.as_bool().ok_or_else(|| {
                    SqlHelperError::ConfigError(format!("{key} must be a boolean"))
                })?;
                config.keepalives(enabled);
            }
            ("ssl", TlsLayout::Nested) => {
                ca_file = nested_ca(value)?;
            }
            ("ssl_ca", TlsLayout::Flat) => {
                ca_file = Some(PathBuf::from(scalar(key, value)?));
            }
            ("ssl", TlsLayout::Flat) => {
                return Err(SqlHelperError::ConfigError(
                    "pooled engines take the CA file as a flat `ssl_ca` option".into(),
                ));
            }
            ("ssl_ca", TlsLayout::Nested) => {
                return Err(SqlHelperError::ConfigError(
                    "direct connections take the CA file as `ssl: {ca: ...}`".into(),
                ));
            }
            _ => runtime_params.push((key.clone(), scalar(key, value)?)),
        }
    }

    if ca_file.is_some() && !ssl_mode_set {
        config.ssl_mode(SslMode::Require);
    }

    if !runtime_params.is_empty() {
        let rendered: Vec<String> = runtime_params
            .iter()
            .map(|(k, v)| format!("-c {k}={}", escape_option(v)))
            .collect();
        config.options(&rendered.join(" "));
    }

    Ok(PgConnectParams { config, ca_file })
}

/// Read `path` and build a connector that trusts it.
///
/// # Errors
/// Returns `SqlHelperError::CaFileNotFound` if the file does not exist and
/// `SqlHelperError::TlsError` if it cannot be read or is not a PEM certificate.
pub fn load_tls_connector(path: &Path) -> Result<MakeTlsConnector, SqlHelperError> {
    let pem = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SqlHelperError::CaFileNotFound(path.to_path_buf()),
        _ => SqlHelperError::TlsError(format!("reading {}: {e}", path.display())),
    })?;
    let cert = Certificate::from_pem(&pem)
        .map_err(|e| SqlHelperError::TlsError(format!("parsing {}: {e}", path.display())))?;
    let connector = TlsConnector::builder()
        .add_root_certificate(cert)
        .build()
        .map_err(|e| SqlHelperError::TlsError(e.to_string()))?;
    Ok(MakeTlsConnector::new(connector))
}

fn scalar(key: &str, value: &Value) -> Result<String, SqlHelperError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if *b { "on" } else { "off" }.to_string()),
        _ => Err(SqlHelperError::ConfigError(format!(
            "driver option {key} must be a string, number or boolean"
        ))),
    }
}

// Non-positive timeouts mean "no timeout".
fn seconds(key: &str, value: &Value) -> Result<Option<Duration>, SqlHelperError> {
    let secs = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|secs| secs.is_finite())
    .ok_or_else(|| SqlHelperError::ConfigError(format!("{key} must be a number of seconds")))?;
    if secs <= 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|e| SqlHelperError::ConfigError(format!("{key}: {e}")))
}

fn nested_ca(value: &Value) -> Result<Option<PathBuf>, SqlHelperError> {
    let Value::Object(ssl) = value else {
        return Err(SqlHelperError::ConfigError(
            "ssl must be an object such as {\"ca\": \"/path/to/ca.pem\"}".into(),
        ));
    };
    match ssl.get("ca") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(path)) => Ok(Some(PathBuf::from(path))),
        Some(_) => Err(SqlHelperError::ConfigError("ssl.ca must be a path".into())),
    }
}

fn parse_ssl_mode(mode: &str) -> Result<SslMode, SqlHelperError> {
    match mode.to_ascii_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(SqlHelperError::ConfigError(format!("unsupported sslmode {other}"))),
    }
}

// The driver always negotiates `client_encoding=UTF8`.
fn check_charset(charset: &str) -> Result<(), SqlHelperError> {
    let name: String = charset
        .chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .collect();
    let name = name.to_ascii_lowercase();
    match name.as_str() {
        "utf8" | "utf8mb4" | "unicode" => Ok(()),
        _ => Err(SqlHelperError::ConfigError(format!(
            "charset {charset} is not supported; connections always use UTF-8"
        ))),
    }
}

fn escape_option(value: &str) -> String {
    value.replace('\\', "\\\\").replace(' ', "\\ ")
}
