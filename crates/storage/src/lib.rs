use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

use shared::domain::{CounterId, Operation};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCounter {
    pub id: CounterId,
    pub value: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter {id} no longer exists")]
    NotFound { id: i64 },
    #[error("counter storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Returns the counter record, or `None` while the store is still empty.
    pub async fn fetch(&self) -> Result<Option<StoredCounter>, StoreError> {
        let row = sqlx::query("SELECT id, value, updated_at FROM counters LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(read_counter_row))
    }

    pub async fn create(&self, initial_value: i64) -> Result<StoredCounter, StoreError> {
        let row = sqlx::query(
            "INSERT INTO counters (value, updated_at) VALUES (?, ?)
             RETURNING id, value, updated_at",
        )
        .bind(initial_value)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(read_counter_row(row))
    }

    /// Overwrites the value and stamps `updated_at` with the current server
    /// time. The write wins unconditionally; there is no version check.
    pub async fn save(&self, id: CounterId, new_value: i64) -> Result<StoredCounter, StoreError> {
        let row = sqlx::query(
            "UPDATE counters SET value = ?, updated_at = ?
             WHERE id = ?
             RETURNING id, value, updated_at",
        )
        .bind(new_value)
        .bind(Utc::now())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(read_counter_row)
            .ok_or(StoreError::NotFound { id: id.0 })
    }

    /// Returns the counter, inserting the zero-valued record first if none
    /// exists. Lookup and seed run in one transaction so concurrent first
    /// accesses cannot leave more than one row behind.
    pub async fn get_or_create(&self) -> Result<StoredCounter, StoreError> {
        let mut tx = self.pool.begin().await?;
        let counter = resolve_or_seed(&mut tx).await?;
        tx.commit().await?;
        Ok(counter)
    }

    /// Applies one operation as a single fetch-compute-save transaction,
    /// seeding the record if the store is empty. Interleaved updates
    /// serialize at the database instead of losing writes.
    pub async fn apply(&self, operation: Operation) -> Result<StoredCounter, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current = resolve_or_seed(&mut tx).await?;
        let row = sqlx::query(
            "UPDATE counters SET value = ?, updated_at = ?
             WHERE id = ?
             RETURNING id, value, updated_at",
        )
        .bind(operation.apply(current.value))
        .bind(Utc::now())
        .bind(current.id.0)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(read_counter_row(row))
    }
}

async fn resolve_or_seed(
    tx: &mut Transaction<'_, Sqlite>,
) -> Result<StoredCounter, sqlx::Error> {
    if let Some(row) = sqlx::query("SELECT id, value, updated_at FROM counters LIMIT 1")
        .fetch_optional(&mut **tx)
        .await?
    {
        return Ok(read_counter_row(row));
    }

    let row = sqlx::query(
        "INSERT INTO counters (value, updated_at) VALUES (0, ?)
         RETURNING id, value, updated_at",
    )
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;
    Ok(read_counter_row(row))
}

fn read_counter_row(row: SqliteRow) -> StoredCounter {
    StoredCounter {
        id: CounterId(row.get::<i64, _>(0)),
        value: row.get::<i64, _>(1),
        updated_at: row.get::<DateTime<Utc>, _>(2),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
