// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Impersonation gating.
//!
//! While a platform operator is acting as a tenant, mutating actions are
//! blocked before resolution runs, so neither the super-admin bypass nor an
//! explicit allow can let a write through. Read actions and the small set of
//! [`IMPERSONATION_SAFE`] pairs fall through to [`resolve`].

use tracing::instrument;

use crate::actor::Actor;
use crate::catalog::{Action, Module};
use crate::decision::Decision;
use crate::grants::{RoleGrants, UserOverrides};
use crate::resolver::resolve;
use crate::session::ImpersonationState;

/// Pairs that remain available while impersonating, even if classified as
/// mutating.
pub const IMPERSONATION_SAFE: &[(Module, Action)] = &[(Module::Settings, Action::ReadPermissions)];

/// Returns true if the pair is on the impersonation allowlist.
pub fn is_impersonation_safe(module: Module, action: Action) -> bool {
	IMPERSONATION_SAFE
		.iter()
		.any(|(m, a)| *m == module && *a == action)
}

/// Returns true if an impersonating session must be refused this pair.
pub fn blocks(session: &ImpersonationState, module: Module, action: Action) -> bool {
	session.is_impersonating && action.is_mutating() && !is_impersonation_safe(module, action)
}

/// Applies the impersonation gate, then resolves.
///
/// A gated request is denied with source `none` regardless of role, override
/// or super-admin status.
#[instrument(
	level = "debug",
	skip(session, actor, role_grants, overrides),
	fields(user_id = %actor.user_id, impersonating = session.is_impersonating, %module, %action)
)]
pub fn check_and_resolve(
	session: &ImpersonationState,
	actor: &Actor,
	module: Module,
	action: Action,
	role_grants: &RoleGrants,
	overrides: &UserOverrides,
) -> Decision {
	if blocks(session, module, action) {
		tracing::debug!("mutating action blocked during impersonation");
		return Decision::deny();
	}

	resolve(actor, module, action, role_grants, overrides)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::PermissionCatalog;
	use crate::decision::DecisionSource;
	use crate::types::{CompanyId, Role, UserId};

	fn impersonating() -> ImpersonationState {
		ImpersonationState::started(CompanyId::generate())
	}

	fn all_grants(role_value: bool) -> RoleGrants {
		let mut g = RoleGrants::new();
		for p in PermissionCatalog::global().permissions() {
			g.insert(p.id, role_value);
		}
		g
	}

	#[test]
	fn allowlist_contains_read_permissions() {
		assert!(is_impersonation_safe(Module::Settings, Action::ReadPermissions));
		assert!(!is_impersonation_safe(
			Module::Settings,
			Action::ManagePermissions
		));
	}

	#[test]
	fn inactive_session_defers_to_resolver() {
		let actor = Actor::new(UserId::generate(), Role::CompanyAdmin);
		let d = check_and_resolve(
			&ImpersonationState::inactive(),
			&actor,
			Module::Employees,
			Action::Delete,
			&all_grants(true),
			&UserOverrides::new(),
		);
		assert_eq!(d, Decision::from_role(true));
	}

	#[test]
	fn impersonating_super_admin_cannot_mutate() {
		let actor = Actor::platform_admin(UserId::generate());
		let d = check_and_resolve(
			&impersonating(),
			&actor,
			Module::Employees,
			Action::Delete,
			&RoleGrants::new(),
			&UserOverrides::new(),
		);
		assert_eq!(d, Decision::deny());
	}

	#[test]
	fn impersonating_super_admin_can_read() {
		let actor = Actor::platform_admin(UserId::generate());
		let d = check_and_resolve(
			&impersonating(),
			&actor,
			Module::Employees,
			Action::Read,
			&RoleGrants::new(),
			&UserOverrides::new(),
		);
		assert_eq!(d.source, DecisionSource::SuperAdmin);
		assert!(d.allowed);
	}

	#[test]
	fn export_is_not_gated() {
		let actor = Actor::platform_admin(UserId::generate());
		let d = check_and_resolve(
			&impersonating(),
			&actor,
			Module::Payroll,
			Action::Export,
			&RoleGrants::new(),
			&UserOverrides::new(),
		);
		assert!(d.allowed);
	}

	#[test]
	fn allowlisted_pair_passes_the_gate() {
		let actor = Actor::platform_admin(UserId::generate());
		let d = check_and_resolve(
			&impersonating(),
			&actor,
			Module::Settings,
			Action::ReadPermissions,
			&RoleGrants::new(),
			&UserOverrides::new(),
		);
		assert!(d.allowed);
	}

	#[test]
	fn explicit_allow_cannot_escape_the_gate() {
		let actor = Actor::new(UserId::generate(), Role::Manager);
		let approve = PermissionCatalog::global()
			.lookup(Module::Leave, Action::Approve)
			.unwrap();
		let mut overrides = UserOverrides::new();
		overrides.insert(approve.id, true);

		let d = check_and_resolve(
			&impersonating(),
			&actor,
			Module::Leave,
			Action::Approve,
			&all_grants(true),
			&overrides,
		);
		assert_eq!(d, Decision::deny());
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn gated_pairs_never_allowed(
				idx in 0..PermissionCatalog::global().len(),
				is_super_admin in any::<bool>(),
				role_value in any::<bool>(),
				override_value in proptest::option::of(any::<bool>()),
			) {
				let p = PermissionCatalog::global().permissions()[idx];
				let actor = Actor::new(UserId::generate(), Role::CompanyAdmin)
					.with_super_admin(is_super_admin);
				let mut o = UserOverrides::new();
				if let Some(v) = override_value {
					o.insert(p.id, v);
				}

				let d = check_and_resolve(
					&impersonating(),
					&actor,
					p.module,
					p.action,
					&all_grants(role_value),
					&o,
				);

				if p.is_mutating() && !is_impersonation_safe(p.module, p.action) {
					prop_assert_eq!(d, Decision::deny());
				}
			}
		}
	}
}
