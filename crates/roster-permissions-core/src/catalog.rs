// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Static registry of valid (module, action) pairs.
//!
//! Not every action applies to every module: payroll can be approved but not
//! verified, documents can be verified but not approved. The catalog is the
//! single authority on which pairs exist. Every other component validates
//! against it before touching storage.
//!
//! Each valid pair is a [`Permission`] with a stable [`PermissionId`] (its
//! position in catalog order) and a `module:action` key used for display and
//! parsing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::PermissionError;

/// A functional area subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
	Employees,
	Leave,
	Documents,
	Payroll,
	Recruitment,
	Reports,
	Settings,
	AuditLogs,
}

impl Module {
	/// Returns all modules in display order.
	pub fn all() -> &'static [Module] {
		&[
			Module::Employees,
			Module::Leave,
			Module::Documents,
			Module::Payroll,
			Module::Recruitment,
			Module::Reports,
			Module::Settings,
			Module::AuditLogs,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Module::Employees => "employees",
			Module::Leave => "leave",
			Module::Documents => "documents",
			Module::Payroll => "payroll",
			Module::Recruitment => "recruitment",
			Module::Reports => "reports",
			Module::Settings => "settings",
			Module::AuditLogs => "audit_logs",
		}
	}

	/// The actions that apply to this module, in display order.
	pub fn valid_actions(&self) -> &'static [Action] {
		use Action::*;
		match self {
			Module::Employees => &[Create, Read, Update, Delete, Export],
			Module::Leave => &[Create, Read, Update, Delete, Approve],
			Module::Documents => &[Create, Read, Update, Delete, Verify],
			Module::Payroll => &[Create, Read, Update, Approve, Export],
			Module::Recruitment => &[Create, Read, Update, Delete],
			Module::Reports => &[Read, Export],
			Module::Settings => &[Read, Update, ReadPermissions, ManagePermissions],
			Module::AuditLogs => &[Read, Export],
		}
	}
}

impl fmt::Display for Module {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Module {
	type Err = PermissionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Module::all()
			.iter()
			.copied()
			.find(|m| m.as_str() == s)
			.ok_or_else(|| PermissionError::Parse {
				kind: "module",
				value: s.to_string(),
			})
	}
}

/// An operation kind within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Create,
	Read,
	Update,
	Delete,
	Approve,
	Verify,
	Export,
	ReadPermissions,
	ManagePermissions,
}

impl Action {
	/// Returns all actions.
	pub fn all() -> &'static [Action] {
		&[
			Action::Create,
			Action::Read,
			Action::Update,
			Action::Delete,
			Action::Approve,
			Action::Verify,
			Action::Export,
			Action::ReadPermissions,
			Action::ManagePermissions,
		]
	}

	/// Returns true if the action changes tenant data.
	///
	/// Exports only read data, so they are not mutating.
	pub fn is_mutating(&self) -> bool {
		match self {
			Action::Create
			| Action::Update
			| Action::Delete
			| Action::Approve
			| Action::Verify
			| Action::ManagePermissions => true,
			Action::Read | Action::Export | Action::ReadPermissions => false,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Create => "create",
			Action::Read => "read",
			Action::Update => "update",
			Action::Delete => "delete",
			Action::Approve => "approve",
			Action::Verify => "verify",
			Action::Export => "export",
			Action::ReadPermissions => "read_permissions",
			Action::ManagePermissions => "manage_permissions",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Action {
	type Err = PermissionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Action::all()
			.iter()
			.copied()
			.find(|a| a.as_str() == s)
			.ok_or_else(|| PermissionError::Parse {
				kind: "action",
				value: s.to_string(),
			})
	}
}

/// Stable identifier of a catalog permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(u16);

impl PermissionId {
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for PermissionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A valid (module, action) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
	pub id: PermissionId,
	pub module: Module,
	pub action: Action,
}

impl Permission {
	/// The `module:action` key.
	pub fn key(&self) -> String {
		format!("{}:{}", self.module, self.action)
	}

	pub fn is_mutating(&self) -> bool {
		self.action.is_mutating()
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.module, self.action)
	}
}

/// The immutable permission registry.
#[derive(Debug)]
pub struct PermissionCatalog {
	permissions: Vec<Permission>,
	index: HashMap<(Module, Action), PermissionId>,
}

static CATALOG: OnceLock<PermissionCatalog> = OnceLock::new();

impl PermissionCatalog {
	/// The process-wide catalog, built on first use.
	pub fn global() -> &'static PermissionCatalog {
		CATALOG.get_or_init(PermissionCatalog::build)
	}

	fn build() -> Self {
		let mut permissions = Vec::new();
		let mut index = HashMap::new();

		for module in Module::all() {
			for action in module.valid_actions() {
				let id = PermissionId(permissions.len() as u16);
				permissions.push(Permission {
					id,
					module: *module,
					action: *action,
				});
				index.insert((*module, *action), id);
			}
		}

		Self { permissions, index }
	}

	pub fn is_valid(&self, module: Module, action: Action) -> bool {
		self.index.contains_key(&(module, action))
	}

	/// Modules in display order.
	pub fn list_modules(&self) -> &'static [Module] {
		Module::all()
	}

	/// Actions valid for `module`, in display order.
	pub fn list_actions(&self, module: Module) -> &'static [Action] {
		module.valid_actions()
	}

	pub fn lookup(&self, module: Module, action: Action) -> Option<Permission> {
		self.index
			.get(&(module, action))
			.map(|id| self.permissions[id.index()])
	}

	/// Looks up a pair, failing with [`PermissionError::InvalidPermission`] if
	/// the catalog does not define it.
	pub fn require(&self, module: Module, action: Action) -> Result<Permission, PermissionError> {
		self.lookup(module, action)
			.ok_or(PermissionError::InvalidPermission { module, action })
	}

	pub fn get(&self, id: PermissionId) -> Option<Permission> {
		self.permissions.get(id.index()).copied()
	}

	/// Parses a `module:action` key into a catalog permission.
	pub fn parse_key(&self, key: &str) -> Result<Permission, PermissionError> {
		let (module, action) = key.split_once(':').ok_or_else(|| PermissionError::Parse {
			kind: "permission key",
			value: key.to_string(),
		})?;
		self.require(module.parse()?, action.parse()?)
	}

	/// Every permission in catalog order.
	pub fn permissions(&self) -> &[Permission] {
		&self.permissions
	}

	pub fn len(&self) -> usize {
		self.permissions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.permissions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn catalog() -> &'static PermissionCatalog {
		PermissionCatalog::global()
	}

	#[test]
	fn ids_match_catalog_positions() {
		for (i, permission) in catalog().permissions().iter().enumerate() {
			assert_eq!(permission.id.index(), i);
			assert_eq!(catalog().get(permission.id), Some(*permission));
		}
	}

	#[test]
	fn pairs_are_unique() {
		let mut seen = std::collections::HashSet::new();
		for p in catalog().permissions() {
			assert!(seen.insert((p.module, p.action)), "duplicate {p}");
		}
	}

	#[test]
	fn not_every_action_applies_to_every_module() {
		assert!(catalog().is_valid(Module::Leave, Action::Approve));
		assert!(!catalog().is_valid(Module::Leave, Action::Verify));
		assert!(catalog().is_valid(Module::Documents, Action::Verify));
		assert!(!catalog().is_valid(Module::Reports, Action::Delete));
	}

	#[test]
	fn require_rejects_unknown_pair() {
		let err = catalog()
			.require(Module::Reports, Action::Delete)
			.unwrap_err();
		assert!(matches!(
			err,
			PermissionError::InvalidPermission {
				module: Module::Reports,
				action: Action::Delete
			}
		));
	}

	#[test]
	fn list_modules_is_ordered() {
		let modules = catalog().list_modules();
		assert_eq!(modules.first(), Some(&Module::Employees));
		assert_eq!(modules.last(), Some(&Module::AuditLogs));
	}

	#[test]
	fn list_actions_matches_is_valid() {
		for module in catalog().list_modules() {
			for action in Action::all() {
				let listed = catalog().list_actions(*module).contains(action);
				assert_eq!(listed, catalog().is_valid(*module, *action));
			}
		}
	}

	#[test]
	fn parse_key_accepts_module_action() {
		let p = catalog().parse_key("settings:read_permissions").unwrap();
		assert_eq!(p.module, Module::Settings);
		assert_eq!(p.action, Action::ReadPermissions);
		assert_eq!(p.key(), "settings:read_permissions");
	}

	#[test]
	fn parse_key_rejects_malformed_and_invalid() {
		assert!(matches!(
			catalog().parse_key("leave"),
			Err(PermissionError::Parse { .. })
		));
		assert!(matches!(
			catalog().parse_key("leave:fly"),
			Err(PermissionError::Parse { kind: "action", .. })
		));
		assert!(matches!(
			catalog().parse_key("leave:verify"),
			Err(PermissionError::InvalidPermission { .. })
		));
	}

	#[test]
	fn mutating_tags() {
		assert!(Action::Delete.is_mutating());
		assert!(Action::Approve.is_mutating());
		assert!(Action::Verify.is_mutating());
		assert!(Action::ManagePermissions.is_mutating());
		assert!(!Action::Read.is_mutating());
		assert!(!Action::Export.is_mutating());
		assert!(!Action::ReadPermissions.is_mutating());
	}
}
