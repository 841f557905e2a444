// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated principal a permission check is evaluated for.

use serde::{Deserialize, Serialize};

use crate::types::{CompanyId, Role, UserId};

/// Attributes of the user making a request, as supplied by the identity
/// provider. This crate never authenticates; it only authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub user_id: UserId,
	pub role: Role,
	pub company_id: Option<CompanyId>,
	/// Platform-operator capability, independent of the tenant role.
	pub is_super_admin: bool,
}

impl Actor {
	/// Creates a tenant user with the given role and no platform capability.
	pub fn new(user_id: UserId, role: Role) -> Self {
		Self {
			user_id,
			role,
			company_id: None,
			is_super_admin: false,
		}
	}

	/// Creates a platform operator.
	pub fn platform_admin(user_id: UserId) -> Self {
		Self {
			user_id,
			role: Role::SuperAdmin,
			company_id: None,
			is_super_admin: true,
		}
	}

	pub fn with_company(mut self, company_id: CompanyId) -> Self {
		self.company_id = Some(company_id);
		self
	}

	pub fn with_super_admin(mut self, is_super_admin: bool) -> Self {
		self.is_super_admin = is_super_admin;
		self
	}

	/// Returns true if every permission resolves allowed for this actor
	/// without consulting any table.
	pub fn has_super_admin_bypass(&self) -> bool {
		self.is_super_admin || self.role.is_super_admin()
	}

	/// Returns true if the actor may use the administration surface.
	pub fn is_platform_admin(&self) -> bool {
		self.is_super_admin
	}
}
