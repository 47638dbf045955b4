//! Test doubles for code built on this crate.

/// In-memory secrets client.
pub mod secrets;

/// Embedded `PostgreSQL` for end-to-end connection tests.
#[cfg(feature = "test-utils-postgres")]
pub mod postgres;

pub use secrets::StaticSecretsClient;
