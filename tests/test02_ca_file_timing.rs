use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use sql_secret_helper::prelude::*;
use sql_secret_helper::test_utils::StaticSecretsClient;
use tokio::runtime::Runtime;

fn secrets() -> StaticSecretsClient {
    StaticSecretsClient::new().with_json(
        "dummy",
        &json!({
            "username": "root",
            "password": "root",
            "host": "dummy",
            "port": 3306,
            "dbname": "sys"
        }),
    )
}

fn missing_ca() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dummy");
    (dir, path)
}

fn options(ca_file: &PathBuf) -> SecretConnectionOptions {
    SecretConnectionOptions::builder("dummy")
        .host_override("localhost")
        .port_override(3320)
        .ca_file(ca_file)
        .connect_timeout(Duration::from_secs(30))
        .finish()
}

#[test]
fn test02_direct_connection_fails_immediately_on_missing_ca()
-> Result<(), Box<dyn std::error::Error>> {
    let (_dir, ca) = missing_ca();
    let rt = Runtime::new()?;
    rt.block_on(async {
        let err = get_connection_with(&secrets(), &options(&ca)).await.unwrap_err();
        assert!(
            matches!(err, SqlHelperError::CaFileNotFound(ref path) if path == &ca),
            "unexpected error: {err}"
        );
    });
    Ok(())
}

#[test]
fn test02_engine_defers_missing_ca_until_first_use() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, ca) = missing_ca();
    let rt = Runtime::new()?;
    rt.block_on(async {
        let engine = get_pooled_engine_with(&secrets(), &options(&ca)).await?;
        assert_eq!(engine.url().port, 3320);

        let Err(err) = engine.get().await else {
            panic!("checkout should fail without the CA file");
        };
        assert!(
            matches!(err, SqlHelperError::CaFileNotFound(ref path) if path == &ca),
            "unexpected error: {err}"
        );

        // Still not cached: the next checkout reads the file again.
        let Err(err) = engine.get_owned().await else {
            panic!("checkout should fail without the CA file");
        };
        assert!(matches!(err, SqlHelperError::CaFileNotFound(_)));
        Ok::<(), SqlHelperError>(())
    })?;
    Ok(())
}

#[test]
fn test02_unreachable_database_is_a_connection_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let opts = SecretConnectionOptions::builder("dummy")
            .host_override("127.0.0.1")
            .port_override(1)
            .connect_timeout(Duration::from_secs(5))
            .finish();

        let err = get_connection_with(&secrets(), &opts).await.unwrap_err();
        assert!(matches!(err, SqlHelperError::ConnectionError(_)), "{err}");

        let engine = get_pooled_engine_with(&secrets(), &opts).await?;
        let Err(err) = engine.get().await else {
            panic!("nothing listens on port 1");
        };
        assert!(matches!(err, SqlHelperError::ConnectionError(_)), "{err}");
        Ok::<(), SqlHelperError>(())
    })?;
    Ok(())
}
