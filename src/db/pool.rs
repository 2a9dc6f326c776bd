//! Database connection pool
//!
//! Byline stores everything in a single SQLite database, which keeps the
//! platform deployable as one binary plus one file. The pool factory accepts
//! either a plain file path or a full `sqlite:` URL and makes sure the parent
//! directory exists before connecting.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Create the SQLite connection pool from configuration.
///
/// File-based databases are created on first run (`mode=rwc`), including any
/// missing parent directories. Foreign keys are enabled per connection since
/// the schema relies on cascading deletes.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    connect(&config.path, config.max_connections).await
}

async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    // Ensure the database directory exists for file-based SQLite
    if !url.starts_with(":memory:") && !url.starts_with("sqlite::memory:") {
        let path = if url.starts_with("sqlite:") {
            url.trim_start_matches("sqlite:")
        } else {
            url
        };

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }
    }

    // Build the connection URL with create mode for file-based databases
    let connection_url = if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", url)
    };

    let options = SqliteConnectOptions::from_str(&connection_url)
        .with_context(|| format!("Invalid SQLite database URL: {}", url))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    Ok(pool)
}

/// Create a SQLite in-memory database pool for testing
///
/// Pinned to a single connection: every pooled connection to `:memory:` gets
/// its own private database, so tests must not spread across connections.
pub async fn create_test_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("Invalid in-memory database URL")?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .connect_with(options)
        .await
        .context("Failed to create in-memory database")?;

    Ok(pool)
}
