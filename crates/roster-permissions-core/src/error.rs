// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::catalog::{Action, Module};
use crate::decision::DecisionSource;
use crate::types::{Role, UserId};

/// Errors raised by permission administration and explicit authorization.
///
/// Routine denials from `can`/`explain` are never errors; only
/// [`PermissionError::Denied`] turns a denial into one, for entry points that
/// guard a mutation.
#[derive(Debug, Error)]
pub enum PermissionError {
	#[error("invalid permission: {module}:{action} is not in the catalog")]
	InvalidPermission { module: Module, action: Action },

	#[error("role '{0}' is immutable")]
	ImmutableRole(Role),

	#[error("cannot override permissions of super admin user {0}")]
	CannotOverrideSuperAdmin(UserId),

	#[error("user {0} is not a platform administrator")]
	NotPlatformAdministrator(UserId),

	#[error("permission administration is forbidden while impersonating")]
	ImpersonationWriteForbidden,

	#[error("permission denied: {module}:{action} ({decided_by})")]
	Denied {
		module: Module,
		action: Action,
		decided_by: DecisionSource,
	},

	#[error("unknown user: {0}")]
	UnknownUser(UserId),

	#[error("session is already impersonating")]
	AlreadyImpersonating,

	#[error("session is not impersonating")]
	NotImpersonating,

	#[error("a platform administrator already exists; bootstrap is closed")]
	PlatformAdministratorExists,

	#[error("unknown {kind}: '{value}'")]
	Parse { kind: &'static str, value: String },
}

impl PermissionError {
	/// Returns true for errors that must be reported as an authorization
	/// failure, distinct from validation or not-found responses.
	pub fn is_authorization_failure(&self) -> bool {
		matches!(
			self,
			PermissionError::Denied { .. }
				| PermissionError::NotPlatformAdministrator(_)
				| PermissionError::ImpersonationWriteForbidden
		)
	}
}

pub type Result<T> = std::result::Result<T, PermissionError>;
