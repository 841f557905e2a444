// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for per-role default grants.
//!
//! Rows are keyed by the natural key `(role, module, action)`. Writes are
//! upserts so concurrent writers converge last-write-wins, and a full reset
//! replaces a role's rows inside one transaction.

use async_trait::async_trait;
use chrono::Utc;
use roster_permissions_core::{Permission, PermissionCatalog, Role, RoleGrant, UserId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::pool::begin_write;

#[async_trait]
pub trait RolePermissionStore: Send + Sync {
	async fn get_role_grants(&self, role: Role) -> Result<Vec<RoleGrant>, DbError>;

	/// Upserts one grant and returns the value it replaced, if any.
	async fn upsert_role_grant(
		&self,
		role: Role,
		permission: Permission,
		is_granted: bool,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>, DbError>;

	/// Replaces every grant of `role` with `grants` atomically and returns the
	/// grants that were replaced.
	async fn replace_role_grants(
		&self,
		role: Role,
		grants: &[RoleGrant],
		updated_by: Option<UserId>,
	) -> Result<Vec<RoleGrant>, DbError>;
}

#[derive(Clone)]
pub struct RolePermissionRepository {
	pool: SqlitePool,
}

impl RolePermissionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(role = %role))]
	pub async fn get_role_grants(&self, role: Role) -> Result<Vec<RoleGrant>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT role, module, action, is_granted
			FROM role_permissions
			WHERE role = ?
			"#,
		)
		.bind(role.as_str())
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.iter().filter_map(|r| row_to_grant(role, r)).collect())
	}

	#[tracing::instrument(skip(self), fields(role = %role, permission = %permission, is_granted))]
	pub async fn upsert_role_grant(
		&self,
		role: Role,
		permission: Permission,
		is_granted: bool,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>, DbError> {
		let mut tx = begin_write(&self.pool).await?;

		let previous: Option<i64> = sqlx::query_scalar(
			r#"
			SELECT is_granted FROM role_permissions
			WHERE role = ? AND module = ? AND action = ?
			"#,
		)
		.bind(role.as_str())
		.bind(permission.module.as_str())
		.bind(permission.action.as_str())
		.fetch_optional(&mut *tx)
		.await?;

		sqlx::query(
			r#"
			INSERT INTO role_permissions (role, module, action, is_granted, updated_by, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			ON CONFLICT (role, module, action) DO UPDATE SET
				is_granted = excluded.is_granted,
				updated_by = excluded.updated_by,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(role.as_str())
		.bind(permission.module.as_str())
		.bind(permission.action.as_str())
		.bind(is_granted as i64)
		.bind(updated_by.map(|u| u.to_string()))
		.bind(Utc::now().to_rfc3339())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		Ok(previous.map(|v| v != 0))
	}

	#[tracing::instrument(skip(self, grants), fields(role = %role, count = grants.len()))]
	pub async fn replace_role_grants(
		&self,
		role: Role,
		grants: &[RoleGrant],
		updated_by: Option<UserId>,
	) -> Result<Vec<RoleGrant>, DbError> {
		if let Some(stray) = grants.iter().find(|g| g.role != role) {
			return Err(DbError::Conflict(format!(
				"grant for role '{}' in replacement set for '{role}'",
				stray.role
			)));
		}

		let mut tx = begin_write(&self.pool).await?;

		let rows = sqlx::query(
			r#"
			SELECT role, module, action, is_granted
			FROM role_permissions
			WHERE role = ?
			"#,
		)
		.bind(role.as_str())
		.fetch_all(&mut *tx)
		.await?;
		let previous: Vec<RoleGrant> = rows.iter().filter_map(|r| row_to_grant(role, r)).collect();

		sqlx::query("DELETE FROM role_permissions WHERE role = ?")
			.bind(role.as_str())
			.execute(&mut *tx)
			.await?;

		let now = Utc::now().to_rfc3339();
		let updated_by = updated_by.map(|u| u.to_string());
		for grant in grants {
			sqlx::query(
				r#"
				INSERT INTO role_permissions (role, module, action, is_granted, updated_by, updated_at)
				VALUES (?, ?, ?, ?, ?, ?)
				"#,
			)
			.bind(role.as_str())
			.bind(grant.permission.module.as_str())
			.bind(grant.permission.action.as_str())
			.bind(grant.is_granted as i64)
			.bind(updated_by.as_deref())
			.bind(&now)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;
		tracing::info!(role = %role, count = grants.len(), "role grants replaced");
		Ok(previous)
	}
}

/// Maps a row to a grant, skipping rows whose pair is no longer in the
/// catalog.
fn row_to_grant(role: Role, row: &sqlx::sqlite::SqliteRow) -> Option<RoleGrant> {
	let module: String = row.get("module");
	let action: String = row.get("action");
	let is_granted: i64 = row.get("is_granted");

	match PermissionCatalog::global().parse_key(&format!("{module}:{action}")) {
		Ok(permission) => Some(RoleGrant {
			role,
			permission,
			is_granted: is_granted != 0,
		}),
		Err(e) => {
			tracing::warn!(role = %role, %module, %action, error = %e, "skipping role grant outside the catalog");
			None
		}
	}
}

#[async_trait]
impl RolePermissionStore for RolePermissionRepository {
	async fn get_role_grants(&self, role: Role) -> Result<Vec<RoleGrant>, DbError> {
		RolePermissionRepository::get_role_grants(self, role).await
	}

	async fn upsert_role_grant(
		&self,
		role: Role,
		permission: Permission,
		is_granted: bool,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>, DbError> {
		RolePermissionRepository::upsert_role_grant(self, role, permission, is_granted, updated_by)
			.await
	}

	async fn replace_role_grants(
		&self,
		role: Role,
		grants: &[RoleGrant],
		updated_by: Option<UserId>,
	) -> Result<Vec<RoleGrant>, DbError> {
		RolePermissionRepository::replace_role_grants(self, role, grants, updated_by).await
	}
}
