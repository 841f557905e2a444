// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use roster_permissions_core::{Actor, Role, UserId};
use roster_server_db::testing::create_migrated_test_pool;
use roster_server_db::{
	RolePermissionRepository, UserDirectoryRepository, UserOverrideRepository, UserRecord,
};

use crate::admin::AdministrationService;
use crate::audit::MemoryAuditRecorder;
use crate::identity::DirectoryIdentityProvider;
use crate::override_table::UserOverrideTable;
use crate::role_table::RolePermissionTable;
use crate::service::{PermissionService, RequestContext};
use crate::session::InMemorySessionStore;

/// Services wired over one in-memory database.
pub(crate) struct Fixture {
	pub directory: Arc<UserDirectoryRepository>,
	pub sessions: Arc<InMemorySessionStore>,
	pub audit: Arc<MemoryAuditRecorder>,
	pub permissions: Arc<PermissionService>,
	pub admin: AdministrationService,
}

impl Fixture {
	pub async fn new(cache_enabled: bool) -> Self {
		let pool = create_migrated_test_pool().await;
		let directory = Arc::new(UserDirectoryRepository::new(pool.clone()));
		let sessions = Arc::new(InMemorySessionStore::new());
		let audit = Arc::new(MemoryAuditRecorder::new());

		let permissions = Arc::new(PermissionService::new(
			Arc::new(RolePermissionTable::new(
				Arc::new(RolePermissionRepository::new(pool.clone())),
				cache_enabled,
			)),
			Arc::new(UserOverrideTable::new(
				Arc::new(UserOverrideRepository::new(pool)),
				cache_enabled,
			)),
			sessions.clone(),
			Arc::new(DirectoryIdentityProvider::new(directory.clone())),
		));
		let admin =
			AdministrationService::new(Arc::clone(&permissions), directory.clone(), audit.clone());

		Self {
			directory,
			sessions,
			audit,
			permissions,
			admin,
		}
	}

	/// Applies the factory matrix to every editable role, bypassing the
	/// administration surface so no audit events are produced.
	pub async fn seed_defaults(&self) {
		for role in Role::editable() {
			self.permissions
				.roles()
				.reset_to_defaults(*role, None)
				.await
				.unwrap();
		}
	}

	pub async fn add_user(&self, role: Role) -> Actor {
		let record = UserRecord::new(UserId::generate(), format!("{role} user"), role);
		self.directory.upsert_user(&record).await.unwrap();
		record.to_actor()
	}

	pub async fn add_operator(&self) -> RequestContext {
		let mut record = UserRecord::new(UserId::generate(), "operator", Role::SuperAdmin);
		record.is_super_admin = true;
		self.directory.upsert_user(&record).await.unwrap();
		RequestContext::new(record.to_actor())
	}
}
