// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests that need a throwaway database.

use std::path::Path;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::migrations::run_migrations;
use crate::pool::create_pool;

/// An empty in-memory database. Every `:memory:` connection is its own
/// database, so the pool is pinned to one connection.
pub async fn create_test_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap()
}

/// An in-memory database with every migration applied.
pub async fn create_migrated_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

/// A migrated database file at `path` behind a pool of `max_connections`,
/// for tests that need writers on separate connections.
pub async fn create_migrated_file_pool(path: &Path, max_connections: u32) -> SqlitePool {
	let pool = create_pool(&format!("sqlite:{}", path.display()), max_connections)
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}
