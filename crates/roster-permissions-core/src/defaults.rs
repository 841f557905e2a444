// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Factory-default role grant matrices.
//!
//! `reset_to_defaults` replaces a role's rows with the complete matrix
//! returned here, including explicit `false` rows for every catalog
//! permission the role does not get, so a reset role has one row per
//! catalog permission.

use crate::catalog::{Action, Module, PermissionCatalog};
use crate::error::{PermissionError, Result};
use crate::grants::RoleGrant;
use crate::types::Role;

use Action::*;
use Module::*;

const HR_MANAGER: &[(Module, Action)] = &[
	(Employees, Create),
	(Employees, Read),
	(Employees, Update),
	(Employees, Export),
	(Leave, Create),
	(Leave, Read),
	(Leave, Update),
	(Leave, Delete),
	(Leave, Approve),
	(Documents, Create),
	(Documents, Read),
	(Documents, Update),
	(Documents, Delete),
	(Documents, Verify),
	(Payroll, Create),
	(Payroll, Read),
	(Payroll, Update),
	(Payroll, Export),
	(Recruitment, Create),
	(Recruitment, Read),
	(Recruitment, Update),
	(Recruitment, Delete),
	(Reports, Read),
	(Reports, Export),
	(Settings, Read),
	(Settings, ReadPermissions),
];

const MANAGER: &[(Module, Action)] = &[
	(Employees, Read),
	(Leave, Read),
	(Leave, Approve),
	(Documents, Read),
	(Recruitment, Read),
	(Recruitment, Update),
	(Reports, Read),
];

const EMPLOYEE: &[(Module, Action)] = &[
	(Employees, Read),
	(Leave, Create),
	(Leave, Read),
	(Documents, Create),
	(Documents, Read),
	(Payroll, Read),
];

/// Returns true if `role` gets `module:action` by default.
pub fn default_grant(role: Role, module: Module, action: Action) -> bool {
	match role {
		Role::SuperAdmin | Role::CompanyAdmin => true,
		Role::HrManager => HR_MANAGER.contains(&(module, action)),
		Role::Manager => MANAGER.contains(&(module, action)),
		Role::Employee => EMPLOYEE.contains(&(module, action)),
	}
}

/// The complete factory matrix for `role`, one row per catalog permission.
///
/// Fails with [`PermissionError::ImmutableRole`] for `super_admin`, whose
/// grants are never materialized.
pub fn default_grants(role: Role) -> Result<Vec<RoleGrant>> {
	if role.is_super_admin() {
		return Err(PermissionError::ImmutableRole(role));
	}

	Ok(PermissionCatalog::global()
		.permissions()
		.iter()
		.map(|p| RoleGrant {
			role,
			permission: *p,
			is_granted: default_grant(role, p.module, p.action),
		})
		.collect())
}
