use std::future::Future;
use std::ops::Deref;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use super::config::{PgConnectParams, load_tls_connector};
use crate::error::SqlHelperError;

/// Open one client for `params`, spawning its driver task.
///
/// The CA file (if any) is read here, right before the socket is opened.
pub(crate) async fn connect_client(
    params: &PgConnectParams,
) -> Result<(Client, JoinHandle<()>), SqlHelperError> {
    let target = describe(&params.config);
    match &params.ca_file {
        Some(ca_file) => {
            let tls = load_tls_connector(ca_file)?;
            let (client, connection) = params
                .config
                .connect(tls)
                .await
                .map_err(|e| connect_error(&target, &e))?;
            Ok((client, spawn_driver(target, connection)))
        }
        None => {
            let (client, connection) = params
                .config
                .connect(NoTls)
                .await
                .map_err(|e| connect_error(&target, &e))?;
            Ok((client, spawn_driver(target, connection)))
        }
    }
}

fn spawn_driver<F>(target: String, connection: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(endpoint = %target, error = %e, "postgres connection closed with error");
        }
    })
}

fn connect_error(target: &str, err: &tokio_postgres::Error) -> SqlHelperError {
    SqlHelperError::ConnectionError(format!("connecting to {target}: {err}"))
}

fn describe(config: &tokio_postgres::Config) -> String {
    let host = match config.get_hosts().first() {
        Some(tokio_postgres::config::Host::Tcp(host)) => host.clone(),
        #[cfg(unix)]
        Some(tokio_postgres::config::Host::Unix(path)) => path.display().to_string(),
        None => String::new(),
    };
    let port = config.get_ports().first().copied().unwrap_or_default();
    let dbname = config.get_dbname().unwrap_or_default();
    format!("{host}:{port}/{dbname}")
}

/// A live database connection built from a secret.
///
/// Owns one socket. Call [`SecretConnection::close`] when done; dropping the value
/// also releases the socket on any other exit path.
pub struct SecretConnection {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
    target: String,
}

impl SecretConnection {
    pub(crate) async fn open(params: &PgConnectParams) -> Result<Self, SqlHelperError> {
        let (client, driver) = connect_client(params).await?;
        let target = describe(&params.config);
        tracing::debug!(endpoint = %target, "opened direct postgres connection");
        Ok(Self {
            client: Some(client),
            driver: Some(driver),
            target,
        })
    }

    /// `host:port/dbname` this connection points at.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        self
    }

    /// Close the connection and wait for the driver task to finish.
    pub async fn close(mut self) {
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
        tracing::debug!(endpoint = %self.target, "closed direct postgres connection");
    }
}

impl std::fmt::Debug for SecretConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretConnection")
            .field("target", &self.target)
            .field("closed", &self.client.as_ref().is_none_or(Client::is_closed))
            .finish()
    }
}

impl Deref for SecretConnection {
    type Target = Client;

    fn deref(&self) -> &Client {
        match &self.client {
            Some(client) => client,
            // `close` consumes `self`, so the client is present for any live value.
            None => unreachable!("client is only taken in close()"),
        }
    }
}

impl Drop for SecretConnection {
    fn drop(&mut self) {
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}
