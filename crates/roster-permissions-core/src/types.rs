// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identifier and role types.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`UserId`], [`CompanyId`],
//!   [`SessionId`]) so a user id can never be passed where a company id is expected
//! - **[`Role`]**: the closed set of tenant roles that carry default grants
//!
//! All ID types serialize transparently as UUID strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PermissionError;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(CompanyId, "Unique identifier for a tenant company.");
define_id_type!(SessionId, "Unique identifier for an authenticated session.");

// =============================================================================
// Roles
// =============================================================================

/// Tenant roles. Each role except [`Role::SuperAdmin`] carries a default grant
/// matrix that administrators may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Platform operator. Bypasses every table; never materialized.
	SuperAdmin,
	/// Full control of a single company.
	CompanyAdmin,
	/// HR staff: people operations across the company.
	HrManager,
	/// Line manager: approvals and read access for their reports.
	Manager,
	/// Self-service access.
	Employee,
}

impl Role {
	/// Returns all roles.
	pub fn all() -> &'static [Role] {
		&[
			Role::SuperAdmin,
			Role::CompanyAdmin,
			Role::HrManager,
			Role::Manager,
			Role::Employee,
		]
	}

	/// Returns the roles whose grants live in the role permission table.
	pub fn editable() -> &'static [Role] {
		&[
			Role::CompanyAdmin,
			Role::HrManager,
			Role::Manager,
			Role::Employee,
		]
	}

	/// Returns true for the role that resolves every permission to allowed.
	pub fn is_super_admin(&self) -> bool {
		matches!(self, Role::SuperAdmin)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::SuperAdmin => "super_admin",
			Role::CompanyAdmin => "company_admin",
			Role::HrManager => "hr_manager",
			Role::Manager => "manager",
			Role::Employee => "employee",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = PermissionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"super_admin" => Ok(Role::SuperAdmin),
			"company_admin" => Ok(Role::CompanyAdmin),
			"hr_manager" => Ok(Role::HrManager),
			"manager" => Ok(Role::Manager),
			"employee" => Ok(Role::Employee),
			other => Err(PermissionError::Parse {
				kind: "role",
				value: other.to_string(),
			}),
		}
	}
}
