// PostgreSQL side of the helper:
// - config: driver options -> tokio_postgres::Config, CA loading
// - params: binding normalized values into statements
// - connection: direct, immediately connected client
// - engine: lazily-connecting bb8 pool

pub mod config;
pub mod connection;
pub mod engine;
pub mod params;

pub use config::{PgConnectParams, TlsLayout, build_pg_config, load_tls_connector};
pub use connection::SecretConnection;
pub use engine::{DRIVER_NAME, Engine, EngineManager, EngineUrl};
