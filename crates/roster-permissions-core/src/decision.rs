// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolved permission decisions with provenance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Action, Module};
use crate::types::Role;

/// Why a [`Decision`] was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
	/// Platform super-admin bypass.
	SuperAdmin,
	/// A per-user override granted the permission.
	ExplicitAllow,
	/// A per-user override revoked the permission.
	ExplicitDeny,
	/// The actor's role default decided.
	Role,
	/// Nothing granted it (or the request was invalid or gated).
	None,
}

impl fmt::Display for DecisionSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			DecisionSource::SuperAdmin => "super_admin",
			DecisionSource::ExplicitAllow => "explicit_allow",
			DecisionSource::ExplicitDeny => "explicit_deny",
			DecisionSource::Role => "role",
			DecisionSource::None => "none",
		};
		f.write_str(s)
	}
}

/// The outcome of resolving an (actor, module, action) triple. Derived, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
	pub allowed: bool,
	pub source: DecisionSource,
}

impl Decision {
	pub fn super_admin() -> Self {
		Self {
			allowed: true,
			source: DecisionSource::SuperAdmin,
		}
	}

	pub fn from_override(granted: bool) -> Self {
		Self {
			allowed: granted,
			source: if granted {
				DecisionSource::ExplicitAllow
			} else {
				DecisionSource::ExplicitDeny
			},
		}
	}

	pub fn from_role(granted: bool) -> Self {
		Self {
			allowed: granted,
			source: DecisionSource::Role,
		}
	}

	/// The fail-closed default.
	pub fn deny() -> Self {
		Self {
			allowed: false,
			source: DecisionSource::None,
		}
	}

	/// Human-readable explanation for administration views.
	pub fn describe(&self, role: Role) -> String {
		match (self.allowed, self.source) {
			(_, DecisionSource::SuperAdmin) => "Allowed via super admin".to_string(),
			(_, DecisionSource::ExplicitAllow) => "Allowed by explicit override".to_string(),
			(_, DecisionSource::ExplicitDeny) => "Denied by explicit override".to_string(),
			(true, DecisionSource::Role) => format!("Allowed via role: {role}"),
			(false, DecisionSource::Role) => format!("Denied via role: {role}"),
			(_, DecisionSource::None) => "Denied: not granted".to_string(),
		}
	}
}

/// A decision for one catalog permission, as listed on audit screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
	pub module: Module,
	pub action: Action,
	pub decision: Decision,
}
