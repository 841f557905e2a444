// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-user tri-state overrides, validated and cached in front of the store.

use std::sync::Arc;

use roster_permissions_core::{
	Action, Actor, Module, PermissionCatalog, PermissionError, UserId, UserOverrides,
};
use roster_server_db::{DbError, UserOverrideStore};
use tracing::instrument;

use crate::cache::KeyedCache;
use crate::error::Result;

pub struct UserOverrideTable {
	store: Arc<dyn UserOverrideStore>,
	cache: KeyedCache<UserId, UserOverrides>,
}

impl UserOverrideTable {
	pub fn new(store: Arc<dyn UserOverrideStore>, cache_enabled: bool) -> Self {
		Self {
			store,
			cache: KeyedCache::new(cache_enabled),
		}
	}

	/// Explicit overrides of `user_id`. Absent entries defer to the role.
	#[instrument(skip(self), fields(user_id = %user_id))]
	pub async fn get(&self, user_id: UserId) -> std::result::Result<Arc<UserOverrides>, DbError> {
		if let Some(overrides) = self.cache.get(&user_id) {
			return Ok(overrides);
		}

		let generation = self.cache.generation();
		let rows = self.store.get_user_overrides(user_id).await?;
		let overrides = Arc::new(UserOverrides::from_rows(rows));
		self.cache
			.insert_if_current(user_id, Arc::clone(&overrides), generation);
		Ok(overrides)
	}

	/// Sets (`Some`) or removes (`None`) one override of `target`, returning
	/// the value it replaced.
	///
	/// Users with the super-admin bypass cannot be overridden: the override
	/// would never be consulted.
	#[instrument(skip(self, target), fields(user_id = %target.user_id, %module, %action, ?granted))]
	pub async fn set(
		&self,
		target: &Actor,
		module: Module,
		action: Action,
		granted: Option<bool>,
		updated_by: Option<UserId>,
	) -> Result<Option<bool>> {
		let permission = PermissionCatalog::global().require(module, action)?;
		if target.has_super_admin_bypass() {
			return Err(PermissionError::CannotOverrideSuperAdmin(target.user_id).into());
		}

		let previous = self
			.store
			.set_user_override(target.user_id, permission, granted, updated_by)
			.await;
		self.cache.invalidate(&target.user_id);
		Ok(previous?)
	}

	/// Removes every override of `user_id`, returning how many were removed.
	#[instrument(skip(self), fields(user_id = %user_id))]
	pub async fn clear(&self, user_id: UserId) -> Result<u64> {
		let removed = self.store.clear_user_overrides(user_id).await;
		self.cache.invalidate(&user_id);
		Ok(removed?)
	}
}
