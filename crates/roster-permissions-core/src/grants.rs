// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role grant and user override rows, and the per-key sets the resolver reads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{Permission, PermissionId};
use crate::types::{Role, UserId};

/// A role-level boolean grant. Absence means not granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
	pub role: Role,
	pub permission: Permission,
	pub is_granted: bool,
}

/// A per-user exception to the role default. `None` defers to the role and is
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverride {
	pub user_id: UserId,
	pub permission: Permission,
	pub granted: Option<bool>,
}

/// All materialized grants for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGrants {
	grants: HashMap<PermissionId, bool>,
}

impl RoleGrants {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_rows(rows: impl IntoIterator<Item = RoleGrant>) -> Self {
		Self {
			grants: rows
				.into_iter()
				.map(|g| (g.permission.id, g.is_granted))
				.collect(),
		}
	}

	pub fn insert(&mut self, permission: PermissionId, is_granted: bool) {
		self.grants.insert(permission, is_granted);
	}

	/// The stored row, if any.
	pub fn get(&self, permission: PermissionId) -> Option<bool> {
		self.grants.get(&permission).copied()
	}

	/// Effective grant: a missing row is `false`.
	pub fn is_granted(&self, permission: PermissionId) -> bool {
		self.get(permission).unwrap_or(false)
	}

	pub fn as_map(&self) -> &HashMap<PermissionId, bool> {
		&self.grants
	}

	pub fn len(&self) -> usize {
		self.grants.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grants.is_empty()
	}
}

/// All explicit overrides for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserOverrides {
	overrides: HashMap<PermissionId, bool>,
}

impl UserOverrides {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the set from rows; rows with `granted = None` are ignored.
	pub fn from_rows(rows: impl IntoIterator<Item = UserOverride>) -> Self {
		Self {
			overrides: rows
				.into_iter()
				.filter_map(|o| o.granted.map(|g| (o.permission.id, g)))
				.collect(),
		}
	}

	pub fn insert(&mut self, permission: PermissionId, granted: bool) {
		self.overrides.insert(permission, granted);
	}

	pub fn get(&self, permission: PermissionId) -> Option<bool> {
		self.overrides.get(&permission).copied()
	}

	pub fn as_map(&self) -> &HashMap<PermissionId, bool> {
		&self.overrides
	}

	pub fn len(&self) -> usize {
		self.overrides.len()
	}

	pub fn is_empty(&self) -> bool {
		self.overrides.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{Action, Module, PermissionCatalog};

	fn permission(module: Module, action: Action) -> Permission {
		PermissionCatalog::global().lookup(module, action).unwrap()
	}

	#[test]
	fn missing_role_grant_is_false() {
		let grants = RoleGrants::new();
		let p = permission(Module::Leave, Action::Approve);
		assert_eq!(grants.get(p.id), None);
		assert!(!grants.is_granted(p.id));
	}

	#[test]
	fn role_grants_from_rows() {
		let p = permission(Module::Leave, Action::Approve);
		let grants = RoleGrants::from_rows([RoleGrant {
			role: Role::Manager,
			permission: p,
			is_granted: true,
		}]);
		assert!(grants.is_granted(p.id));
		assert_eq!(grants.len(), 1);
	}

	#[test]
	fn unset_overrides_are_dropped() {
		let user_id = UserId::generate();
		let approve = permission(Module::Leave, Action::Approve);
		let read = permission(Module::Leave, Action::Read);
		let overrides = UserOverrides::from_rows([
			UserOverride {
				user_id,
				permission: approve,
				granted: Some(false),
			},
			UserOverride {
				user_id,
				permission: read,
				granted: None,
			},
		]);
		assert_eq!(overrides.get(approve.id), Some(false));
		assert_eq!(overrides.get(read.id), None);
		assert_eq!(overrides.len(), 1);
	}
}
