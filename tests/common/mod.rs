//! Shared setup for the Postgres-backed suites.
//!
//! Each test gets its own schema so suites can run in parallel against one
//! database. Without `SANCTUARY_TEST_DSN` the tests print a notice and pass.

#![allow(dead_code)]

use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::{env, str::FromStr};
use ulid::Ulid;

pub const SCHEMA_SQL: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/db/sql/01_sanctuary.sql"
));

/// Fresh pool bound to a throwaway schema, or `None` when no database is configured.
pub async fn pool() -> Result<Option<PgPool>> {
    let Ok(dsn) = env::var("SANCTUARY_TEST_DSN") else {
        eprintln!("Skipping integration test: SANCTUARY_TEST_DSN is not set");
        return Ok(None);
    };

    let schema = format!("test_{}", Ulid::new().to_string().to_lowercase());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&dsn)
        .await
        .context("Failed to connect to SANCTUARY_TEST_DSN")?;
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await?;
    admin.close().await;

    let options = PgConnectOptions::from_str(&dsn)?.options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&pool)
        .await
        .context("Failed to apply schema")?;

    Ok(Some(pool))
}
