// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Transaction;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DbError;

/// Create a SqlitePool in WAL mode.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./roster.db")
/// * `max_connections` - upper bound on pooled connections
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid, or `DbError::Sqlx` if
/// the first connection cannot be opened.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(Duration::from_secs(5))
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections.max(1))
		.connect_with(options)
		.await?;

	tracing::debug!(max_connections, "database pool created");
	Ok(pool)
}

/// Begin a transaction that holds the write lock from its first statement,
/// waiting on the busy timeout for it.
///
/// Read-then-write transactions must start here: a deferred transaction
/// fails with SQLITE_BUSY if another connection commits between its read
/// and its write.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, DbError> {
	Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::migrations::run_migrations;
	use sqlx::Row;

	#[tokio::test]
	async fn test_file_pool_uses_wal() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("roster.db").display());

		let pool = create_pool(&url, 2).await.unwrap();
		let mode: String = sqlx::query("PRAGMA journal_mode")
			.fetch_one(&pool)
			.await
			.unwrap()
			.get(0);
		assert_eq!(mode.to_lowercase(), "wal");
	}

	#[tokio::test]
	async fn test_migrations_are_idempotent_on_disk() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("roster.db").display());

		let pool = create_pool(&url, 1).await.unwrap();
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: i64 = sqlx::query(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('role_permissions', 'user_permission_overrides', 'users', 'audit_logs')",
		)
		.fetch_one(&pool)
		.await
		.unwrap()
		.get(0);
		assert_eq!(tables, 4);
	}
}
