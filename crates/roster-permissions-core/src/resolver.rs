// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission resolution.
//!
//! [`resolve`] combines the catalog, the actor's role grants, the actor's
//! overrides and the actor's platform flag into a [`Decision`]. Precedence is
//! strict and the first match wins:
//!
//! 1. **Super admin**: allowed, without reading either table
//! 2. **Catalog**: an unknown pair is denied (fail closed, never an error)
//! 3. **User override**: an explicit allow or deny
//! 4. **Role grant**: the role default; a missing row is denied
//!
//! Overrides always outrank role defaults, which always outrank the unset
//! default. The function is pure: callers load the grant sets first.

use tracing::instrument;

use crate::actor::Actor;
use crate::catalog::{Action, Module, PermissionCatalog};
use crate::decision::Decision;
use crate::grants::{RoleGrants, UserOverrides};

/// Resolves whether `actor` may perform `action` on `module`.
///
/// `role_grants` must be the grant set of `actor.role` and `overrides` the
/// override set of `actor.user_id`.
#[instrument(
	level = "debug",
	skip(actor, role_grants, overrides),
	fields(user_id = %actor.user_id, role = %actor.role, %module, %action)
)]
pub fn resolve(
	actor: &Actor,
	module: Module,
	action: Action,
	role_grants: &RoleGrants,
	overrides: &UserOverrides,
) -> Decision {
	if actor.has_super_admin_bypass() {
		return Decision::super_admin();
	}

	let Some(permission) = PermissionCatalog::global().lookup(module, action) else {
		tracing::warn!(%module, %action, "permission check for pair outside the catalog");
		return Decision::deny();
	};

	if let Some(granted) = overrides.get(permission.id) {
		return Decision::from_override(granted);
	}

	match role_grants.get(permission.id) {
		Some(granted) => Decision::from_role(granted),
		None => Decision::deny(),
	}
}
