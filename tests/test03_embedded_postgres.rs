#![cfg(feature = "test-utils-postgres")]

use chrono::NaiveDate;
use sql_secret_helper::prelude::*;
use sql_secret_helper::test_utils::StaticSecretsClient;
use sql_secret_helper::test_utils::postgres::{setup_postgres_embedded, stop_postgres_embedded};
use tokio::runtime::Runtime;

#[test]
fn test03_connection_and_engine_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let pg = setup_postgres_embedded("sys").await?;

        // The secret points somewhere else; the overrides point at the embedded server.
        let mut secret = pg.secret_json();
        secret["host"] = "dummy".into();
        secret["port"] = 3306.into();
        let secrets = StaticSecretsClient::new().with_json("dummy", &secret);

        let opts = SecretConnectionOptions::builder("dummy")
            .host_override(pg.host.clone())
            .port_override(pg.port)
            .connect_timeout(std::time::Duration::from_secs(30))
            .driver_option("application_name", "secret-helper-test")
            .finish();

        let conn = get_connection_with(&secrets, &opts).await?;
        conn.batch_execute(
            "CREATE TABLE readings \
             (f REAL, d DOUBLE PRECISION, i INTEGER, b BIGINT, ts TIMESTAMP, t TEXT)",
        )
        .await?;

        let ts = NaiveDate::from_ymd_opt(2017, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or("bad date")?;
        let params = normalize_params([
            RawValue::Float32(1.1),
            RawValue::Float(f64::NAN),
            RawValue::Int32(3),
            RawValue::NullableInt(None),
            RawValue::timestamp(ts),
            "3".into(),
        ]);
        conn.execute(
            "INSERT INTO readings VALUES ($1, $2, $3, $4, $5, $6)",
            &params.as_refs(),
        )
        .await?;

        let row = conn.query_one("SELECT * FROM readings", &[]).await?;
        assert_eq!(row.get::<_, f32>(0), 1.1f32);
        assert_eq!(row.get::<_, Option<f64>>(1), None);
        assert_eq!(row.get::<_, i32>(2), 3);
        assert_eq!(row.get::<_, Option<i64>>(3), None);
        assert_eq!(row.get::<_, chrono::NaiveDateTime>(4), ts);
        assert_eq!(row.get::<_, String>(5), "3");

        let app: String = conn
            .query_one("SELECT current_setting('application_name')", &[])
            .await?
            .get(0);
        assert_eq!(app, "secret-helper-test");
        conn.close().await;

        let engine = get_pooled_engine_with(&secrets, &opts).await?;
        assert_eq!(engine.state().connections, 0);
        {
            let client = engine.get().await?;
            let count: i64 = client
                .query_one("SELECT count(*) FROM readings", &[])
                .await?
                .get(0);
            assert_eq!(count, 1);
        }
        assert_eq!(engine.state().connections, 1);
        assert_eq!(secrets.fetch_count(), 2);

        drop(engine);
        stop_postgres_embedded(pg).await;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
