//! Building connections and engines from a secret.

use crate::config::{ConnectionConfig, SecretConnectionOptions, resolve_connection_config};
use crate::error::SqlHelperError;
use crate::postgres::{DRIVER_NAME, Engine, EngineUrl, SecretConnection, TlsLayout, build_pg_config};
use crate::secrets::{AwsSecretsManager, SecretsClient};

/// Fetch the secret from Secrets Manager and open a direct connection.
///
/// ```rust,no_run
/// # use sql_secret_helper::prelude::*;
/// # async fn run() -> Result<(), SqlHelperError> {
/// let opts = SecretConnectionOptions::builder("prod/app/db")
///     .ca_file("/etc/ssl/rds-combined-ca-bundle.pem")
///     .connect_timeout(std::time::Duration::from_secs(30))
///     .finish();
/// let conn = get_connection(&opts).await?;
/// let rows = conn.query("SELECT 1", &[]).await?;
/// # let _ = rows;
/// conn.close().await;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Secret fetch errors, `MalformedSecret`, `ConfigError` for bad driver options,
/// `CaFileNotFound`/`TlsError` for the CA file, and `ConnectionError` if the database
/// cannot be reached or rejects the credentials.
pub async fn get_connection(
    options: &SecretConnectionOptions,
) -> Result<SecretConnection, SqlHelperError> {
    let client = AwsSecretsManager::from_session(&options.session).await;
    get_connection_with(&client, options).await
}

/// [`get_connection`] with a caller-supplied secrets client.
///
/// # Errors
/// Same as [`get_connection`].
pub async fn get_connection_with(
    client: &dyn SecretsClient,
    options: &SecretConnectionOptions,
) -> Result<SecretConnection, SqlHelperError> {
    let resolved = resolve_connection_config(client, options).await?;
    let driver_options = resolved.connection_driver_options();
    let params = build_pg_config(&resolved, &driver_options, TlsLayout::Nested)?;
    SecretConnection::open(&params).await
}

/// Fetch the secret from Secrets Manager and build a lazily-connecting engine.
///
/// Nothing is connected until the first [`Engine::get`].
///
/// # Errors
/// Secret fetch errors, `MalformedSecret`, or `ConfigError` for bad driver options.
/// Connection and CA file errors surface later, from [`Engine::get`].
pub async fn get_pooled_engine(
    options: &SecretConnectionOptions,
) -> Result<Engine, SqlHelperError> {
    let client = AwsSecretsManager::from_session(&options.session).await;
    get_pooled_engine_with(&client, options).await
}

/// [`get_pooled_engine`] with a caller-supplied secrets client.
///
/// # Errors
/// Same as [`get_pooled_engine`].
pub async fn get_pooled_engine_with(
    client: &dyn SecretsClient,
    options: &SecretConnectionOptions,
) -> Result<Engine, SqlHelperError> {
    let resolved = resolve_connection_config(client, options).await?;
    let driver_options = resolved.engine_driver_options();
    let params = build_pg_config(&resolved, &driver_options, TlsLayout::Flat)?;
    Ok(Engine::new(engine_url(&resolved), params))
}

fn engine_url(resolved: &ConnectionConfig) -> EngineUrl {
    EngineUrl {
        drivername: DRIVER_NAME.to_string(),
        username: resolved.user.clone(),
        password: resolved.password.clone(),
        host: resolved.endpoint.clone(),
        port: resolved.port,
        database: resolved.dbname.clone(),
    }
}
