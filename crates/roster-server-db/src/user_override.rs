// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for per-user permission overrides.
//!
//! Only explicit allows and denies are stored. Unsetting an override deletes
//! its row, so a user with no exceptions has no rows at all.

use async_trait::async_trait;
use chrono::Utc;
use roster_permissions_core::{Permission, PermissionCatalog, UserId, UserOverride};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::pool::begin_write;

#[async_trait]
pub trait UserOverrideStore: Send + Sync {
	async fn get_user_overrides(&self, user_id: UserId) -> Result<Vec<UserOverride>, DbError>;

	/// Upserts (`Some`) or deletes (`None`) one override and returns the value
	/// it replaced, if any.
	async fn set_user_override(
		&self,
		user_id: UserId,
		permission: Permission,
		granted: Option<bool>,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>, DbError>;

	/// Removes every override of `user_id`, returning how many were removed.
	async fn clear_user_overrides(&self, user_id: UserId) -> Result<u64, DbError>;
}

#[derive(Clone)]
pub struct UserOverrideRepository {
	pool: SqlitePool,
}

impl UserOverrideRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn get_user_overrides(&self, user_id: UserId) -> Result<Vec<UserOverride>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT module, action, granted
			FROM user_permission_overrides
			WHERE user_id = ?
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.iter()
			.filter_map(|r| row_to_override(user_id, r))
			.collect())
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id, permission = %permission, ?granted))]
	pub async fn set_user_override(
		&self,
		user_id: UserId,
		permission: Permission,
		granted: Option<bool>,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>, DbError> {
		let mut tx = begin_write(&self.pool).await?;

		let previous: Option<i64> = sqlx::query_scalar(
			r#"
			SELECT granted FROM user_permission_overrides
			WHERE user_id = ? AND module = ? AND action = ?
			"#,
		)
		.bind(user_id.to_string())
		.bind(permission.module.as_str())
		.bind(permission.action.as_str())
		.fetch_optional(&mut *tx)
		.await?;

		match granted {
			Some(granted) => {
				sqlx::query(
					r#"
					INSERT INTO user_permission_overrides (user_id, module, action, granted, updated_by, updated_at)
					VALUES (?, ?, ?, ?, ?, ?)
					ON CONFLICT (user_id, module, action) DO UPDATE SET
						granted = excluded.granted,
						updated_by = excluded.updated_by,
						updated_at = excluded.updated_at
					"#,
				)
				.bind(user_id.to_string())
				.bind(permission.module.as_str())
				.bind(permission.action.as_str())
				.bind(granted as i64)
				.bind(updated_by.map(|u| u.to_string()))
				.bind(Utc::now().to_rfc3339())
				.execute(&mut *tx)
				.await?;
			}
			None => {
				sqlx::query(
					r#"
					DELETE FROM user_permission_overrides
					WHERE user_id = ? AND module = ? AND action = ?
					"#,
				)
				.bind(user_id.to_string())
				.bind(permission.module.as_str())
				.bind(permission.action.as_str())
				.execute(&mut *tx)
				.await?;
			}
		}

		tx.commit().await?;
		Ok(previous.map(|v| v != 0))
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn clear_user_overrides(&self, user_id: UserId) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM user_permission_overrides WHERE user_id = ?")
			.bind(user_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}

fn row_to_override(user_id: UserId, row: &sqlx::sqlite::SqliteRow) -> Option<UserOverride> {
	let module: String = row.get("module");
	let action: String = row.get("action");
	let granted: i64 = row.get("granted");

	match PermissionCatalog::global().parse_key(&format!("{module}:{action}")) {
		Ok(permission) => Some(UserOverride {
			user_id,
			permission,
			granted: Some(granted != 0),
		}),
		Err(e) => {
			tracing::warn!(user_id = %user_id, %module, %action, error = %e, "skipping override outside the catalog");
			None
		}
	}
}

#[async_trait]
impl UserOverrideStore for UserOverrideRepository {
	async fn get_user_overrides(&self, user_id: UserId) -> Result<Vec<UserOverride>, DbError> {
		UserOverrideRepository::get_user_overrides(self, user_id).await
	}

	async fn set_user_override(
		&self,
		user_id: UserId,
		permission: Permission,
		granted: Option<bool>,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>, DbError> {
		UserOverrideRepository::set_user_override(self, user_id, permission, granted, updated_by).await
	}

	async fn clear_user_overrides(&self, user_id: UserId) -> Result<u64, DbError> {
		UserOverrideRepository::clear_user_overrides(self, user_id).await
	}
}
