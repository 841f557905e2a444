// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minimal user directory: the attributes authorization needs about a user.
//!
//! Authentication lives elsewhere. This table only answers "what role does
//! this user hold, and are they a platform administrator".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roster_permissions_core::{Actor, CompanyId, Role, UserId};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::begin_write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
	pub id: UserId,
	pub display_name: String,
	pub role: Role,
	pub is_super_admin: bool,
	pub company_id: Option<CompanyId>,
	pub created_at: DateTime<Utc>,
}

impl UserRecord {
	pub fn new(id: UserId, display_name: impl Into<String>, role: Role) -> Self {
		Self {
			id,
			display_name: display_name.into(),
			role,
			is_super_admin: false,
			company_id: None,
			created_at: Utc::now(),
		}
	}

	/// The authorization view of this user.
	pub fn to_actor(&self) -> Actor {
		Actor {
			user_id: self.id,
			role: self.role,
			company_id: self.company_id,
			is_super_admin: self.is_super_admin,
		}
	}
}

#[async_trait]
pub trait UserDirectoryStore: Send + Sync {
	async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, DbError>;
	async fn upsert_user(&self, user: &UserRecord) -> Result<(), DbError>;

	/// Saves `user` only while no platform administrator exists. Returns
	/// false, writing nothing, once one does.
	async fn insert_first_platform_admin(&self, user: &UserRecord) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct UserDirectoryRepository {
	pool: SqlitePool,
}

impl UserDirectoryRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, display_name, role, is_super_admin, company_id, created_at
			FROM users
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_user(&r)).transpose()
	}

	#[tracing::instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
	pub async fn upsert_user(&self, user: &UserRecord) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO users (id, display_name, role, is_super_admin, company_id, created_at)
			VALUES (?, ?, ?, ?, ?, ?)
			ON CONFLICT (id) DO UPDATE SET
				display_name = excluded.display_name,
				role = excluded.role,
				is_super_admin = excluded.is_super_admin,
				company_id = excluded.company_id
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.display_name)
		.bind(user.role.as_str())
		.bind(user.is_super_admin as i64)
		.bind(user.company_id.map(|c| c.to_string()))
		.bind(user.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn insert_first_platform_admin(&self, user: &UserRecord) -> Result<bool, DbError> {
		let mut tx = begin_write(&self.pool).await?;

		let exists: i64 =
			sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE is_super_admin = 1)")
				.fetch_one(&mut *tx)
				.await?;
		if exists != 0 {
			return Ok(false);
		}

		sqlx::query(
			r#"
			INSERT INTO users (id, display_name, role, is_super_admin, company_id, created_at)
			VALUES (?, ?, ?, 1, ?, ?)
			ON CONFLICT (id) DO UPDATE SET
				display_name = excluded.display_name,
				role = excluded.role,
				is_super_admin = 1,
				company_id = excluded.company_id
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.display_name)
		.bind(user.role.as_str())
		.bind(user.company_id.map(|c| c.to_string()))
		.bind(user.created_at.to_rfc3339())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::info!("first platform administrator saved");
		Ok(true)
	}

	fn row_to_user(&self, row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, DbError> {
		let id_str: String = row.get("id");
		let role_str: String = row.get("role");
		let is_super_admin: i64 = row.get("is_super_admin");
		let company_id: Option<String> = row.get("company_id");
		let created_at: String = row.get("created_at");

		let id =
			Uuid::parse_str(&id_str).map_err(|e| DbError::Internal(format!("Invalid user ID: {e}")))?;
		let role: Role = role_str
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid role: {e}")))?;
		let company_id = company_id
			.map(|c| Uuid::parse_str(&c).map(CompanyId::new))
			.transpose()
			.map_err(|e| DbError::Internal(format!("Invalid company ID: {e}")))?;

		Ok(UserRecord {
			id: UserId::new(id),
			display_name: row.get("display_name"),
			role,
			is_super_admin: is_super_admin != 0,
			company_id,
			created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
				.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
				.with_timezone(&Utc),
		})
	}
}

#[async_trait]
impl UserDirectoryStore for UserDirectoryRepository {
	async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, DbError> {
		UserDirectoryRepository::get_user(self, id).await
	}

	async fn upsert_user(&self, user: &UserRecord) -> Result<(), DbError> {
		UserDirectoryRepository::upsert_user(self, user).await
	}

	async fn insert_first_platform_admin(&self, user: &UserRecord) -> Result<bool, DbError> {
		UserDirectoryRepository::insert_first_platform_admin(self, user).await
	}
}
