// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-role default grants, validated and cached in front of the store.

use std::sync::Arc;

use roster_permissions_core::{
	default_grants, Action, Module, PermissionCatalog, PermissionError, Role, RoleGrant,
	RoleGrants, UserId,
};
use roster_server_db::{DbError, RolePermissionStore};
use tracing::instrument;

use crate::cache::KeyedCache;
use crate::error::Result;

pub struct RolePermissionTable {
	store: Arc<dyn RolePermissionStore>,
	cache: KeyedCache<Role, RoleGrants>,
}

impl RolePermissionTable {
	pub fn new(store: Arc<dyn RolePermissionStore>, cache_enabled: bool) -> Self {
		Self {
			store,
			cache: KeyedCache::new(cache_enabled),
		}
	}

	/// Grants for `role`. Permissions without a row are not granted.
	///
	/// `super_admin` has no rows; it bypasses the table entirely.
	#[instrument(skip(self), fields(role = %role))]
	pub async fn get(&self, role: Role) -> std::result::Result<Arc<RoleGrants>, DbError> {
		if role.is_super_admin() {
			return Ok(Arc::new(RoleGrants::new()));
		}
		if let Some(grants) = self.cache.get(&role) {
			return Ok(grants);
		}

		let generation = self.cache.generation();
		let rows = self.store.get_role_grants(role).await?;
		let grants = Arc::new(RoleGrants::from_rows(rows));
		self.cache
			.insert_if_current(role, Arc::clone(&grants), generation);
		Ok(grants)
	}

	/// Upserts one grant and returns the value it replaced.
	#[instrument(skip(self), fields(role = %role, %module, %action, grant = grant))]
	pub async fn set(
		&self,
		role: Role,
		module: Module,
		action: Action,
		grant: bool,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>> {
		let permission = PermissionCatalog::global().require(module, action)?;
		if role.is_super_admin() {
			return Err(PermissionError::ImmutableRole(role).into());
		}

		let previous = self
			.store
			.upsert_role_grant(role, permission, grant, updated_by)
			.await;
		self.cache.invalidate(&role);
		Ok(previous?)
	}

	/// Replaces every grant of `role` with the factory matrix in one
	/// transaction, returning the grants that were replaced.
	#[instrument(skip(self), fields(role = %role))]
	pub async fn reset_to_defaults(
		&self,
		role: Role,
		updated_by: Option<UserId>,
	) -> Result<Vec<RoleGrant>> {
		let defaults = default_grants(role)?;
		let previous = self
			.store
			.replace_role_grants(role, &defaults, updated_by)
			.await;
		self.cache.invalidate(&role);
		Ok(previous?)
	}
}
