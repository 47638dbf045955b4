use postgresql_embedded::PostgreSQL;
use serde_json::{Value, json};

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

impl EmbeddedPostgres {
    /// A Secrets Manager style payload pointing at this instance.
    #[must_use]
    pub fn secret_json(&self) -> Value {
        json!({
            "engine": "postgres",
            "host": self.host,
            "port": self.port,
            "dbname": self.dbname,
            "username": self.username,
            "password": self.password,
        })
    }
}

/// Set up an embedded `PostgreSQL` instance with database `dbname`.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up, started, or the database
/// cannot be created.
pub async fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();

    // Bundled binaries, so no download
    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(dbname).await?;

    let settings = postgresql.settings();
    let host = settings.host.clone();
    let port = settings.port;
    let username = settings.username.clone();
    let password = settings.password.clone();

    tracing::info!(%host, port, dbname, "embedded postgres started");

    Ok(EmbeddedPostgres {
        postgresql,
        host,
        port,
        username,
        password,
        dbname: dbname.to_string(),
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub async fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    let _ = postgresql.stop().await;
}
