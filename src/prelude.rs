//! Convenient imports for common functionality.

pub use crate::config::{SecretConnectionOptions, SecretConnectionOptionsBuilder};
pub use crate::connect::{
    get_connection, get_connection_with, get_pooled_engine, get_pooled_engine_with,
};
pub use crate::conversion::{SqlParams, normalize_params, normalize_value};
pub use crate::error::SqlHelperError;
pub use crate::postgres::{Engine, EngineUrl, SecretConnection};
pub use crate::secrets::{ClientConfig, SecretsClient, SessionOptions};
pub use crate::types::{RawValue, SqlValue};
