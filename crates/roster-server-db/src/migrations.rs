// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema migrations for the permission tables, the user directory and the
//! audit log.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_role_permissions",
		include_str!("../migrations/001_role_permissions.sql"),
	),
	(
		"002_user_permission_overrides",
		include_str!("../migrations/002_user_permission_overrides.sql"),
	),
	("003_users", include_str!("../migrations/003_users.sql")),
	(
		"004_audit_logs",
		include_str!("../migrations/004_audit_logs.sql"),
	),
];

/// Run all database migrations.
///
/// # Errors
/// Returns `DbError::Sqlx` if a statement fails for any reason other than
/// the object already existing.
///
/// # Note
/// Migrations are idempotent - safe to run multiple times.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			if let Err(e) = sqlx::query(stmt).execute(pool).await {
				let msg = e.to_string();
				if !msg.contains("already exists") {
					tracing::error!(migration = name, error = %e, "migration failed");
					return Err(e.into());
				}
			}
		}
		tracing::debug!(migration = name, "migration applied");
	}

	Ok(())
}
