//! Normalize query parameters and build `PostgreSQL` connections from AWS Secrets Manager.
//!
//! Two independent pieces:
//!
//! - [`normalize_value`] / [`normalize_params`] turn caller values of assorted numeric and
//!   temporal widths into [`SqlValue`]s a binder accepts (NaN and null markers become NULL).
//! - [`get_connection`] / [`get_pooled_engine`] read `{host, port, dbname, username, password}`
//!   from a secret, apply overrides, and return either a connected [`SecretConnection`] or a
//!   lazily-connecting [`Engine`].
//!
//! ```rust,no_run
//! use sql_secret_helper::prelude::*;
//!
//! # async fn run() -> Result<(), SqlHelperError> {
//! let opts = SecretConnectionOptions::builder("prod/app/db")
//!     .host_override("localhost")
//!     .port_override(5433)
//!     .finish();
//! let engine = get_pooled_engine(&opts).await?;
//!
//! let params = normalize_params([RawValue::Float32(1.5), RawValue::Int32(3), "x".into()]);
//! let client = engine.get().await?;
//! client
//!     .execute("INSERT INTO t (a, b, c) VALUES ($1, $2, $3)", &params.as_refs())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connect;
pub mod conversion;
pub mod error;
pub mod postgres;
pub mod prelude;
pub mod secrets;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::{
    ConnectionConfig, DriverOptions, SecretConnectionOptions, SecretConnectionOptionsBuilder,
    resolve_connection_config,
};
pub use connect::{get_connection, get_connection_with, get_pooled_engine, get_pooled_engine_with};
pub use conversion::{SqlParams, normalize_params, normalize_value};
pub use error::SqlHelperError;
pub use postgres::{Engine, EngineUrl, SecretConnection};
pub use secrets::{AwsSecretsManager, ClientConfig, SecretRecord, SecretsClient, SessionOptions};
pub use types::{NOT_A_TIME, RawValue, SqlValue};
