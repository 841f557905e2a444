// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Service wiring from resolved configuration.

use std::sync::Arc;

use anyhow::Context;
use roster_server_audit::{
	AuditFilterConfig, AuditService, AuditSeverity, AuditSink, SqliteAuditSink, TracingAuditSink,
};
use roster_server_config::ServerConfig;
use roster_server_db::{
	create_pool, run_migrations, RolePermissionRepository, UserDirectoryRepository,
	UserOverrideRepository,
};
use roster_server_permissions::{
	AdministrationService, AuditRecorder, DirectoryIdentityProvider, InMemorySessionStore,
	NoopAuditRecorder, PermissionService, RolePermissionTable, UserOverrideTable,
};
use tracing::info;

pub struct App {
	pub directory: Arc<UserDirectoryRepository>,
	pub identity: Arc<DirectoryIdentityProvider>,
	pub permissions: Arc<PermissionService>,
	pub admin: AdministrationService,
	audit: Option<Arc<AuditService>>,
}

impl App {
	pub async fn connect(config: &ServerConfig) -> anyhow::Result<Self> {
		let pool = create_pool(&config.database.url, config.database.max_connections)
			.await
			.context("failed to open database")?;
		run_migrations(&pool)
			.await
			.context("failed to run migrations")?;

		let audit = if config.audit.enabled {
			let min_severity: AuditSeverity = config
				.audit
				.min_severity
				.parse()
				.context("invalid audit.min_severity")?;

			let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
			if config.audit.sqlite_sink {
				sinks.push(Arc::new(SqliteAuditSink::new(
					pool.clone(),
					AuditFilterConfig::default(),
				)));
			}
			if config.audit.tracing_sink {
				sinks.push(Arc::new(TracingAuditSink::new(AuditFilterConfig::default())));
			}
			info!(sinks = sinks.len(), %min_severity, "audit pipeline enabled");

			Some(Arc::new(AuditService::new(
				AuditFilterConfig::with_min_severity(min_severity),
				config.audit.queue_capacity,
				config.audit.queue_overflow_policy,
				sinks,
			)))
		} else {
			None
		};

		let recorder: Arc<dyn AuditRecorder> = match &audit {
			Some(service) => service.clone(),
			None => Arc::new(NoopAuditRecorder),
		};

		let cache_enabled = config.permissions.cache_enabled;
		let directory = Arc::new(UserDirectoryRepository::new(pool.clone()));
		let identity = Arc::new(DirectoryIdentityProvider::new(directory.clone()));
		let permissions = Arc::new(PermissionService::new(
			Arc::new(RolePermissionTable::new(
				Arc::new(RolePermissionRepository::new(pool.clone())),
				cache_enabled,
			)),
			Arc::new(UserOverrideTable::new(
				Arc::new(UserOverrideRepository::new(pool)),
				cache_enabled,
			)),
			Arc::new(InMemorySessionStore::new()),
			identity.clone(),
		));
		let admin = AdministrationService::new(Arc::clone(&permissions), directory.clone(), recorder);

		Ok(Self {
			directory,
			identity,
			permissions,
			admin,
			audit,
		})
	}

	/// Flushes pending audit entries before the process exits.
	pub async fn shutdown(&self) {
		if let Some(audit) = &self.audit {
			audit.shutdown().await;
			let stats = audit.stats();
			if stats.dropped > 0 || stats.sink_failures > 0 {
				tracing::warn!(
					dropped = stats.dropped,
					sink_failures = stats.sink_failures,
					"audit entries were not fully delivered"
				);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use roster_permissions_core::{Action, Decision, Module, Role, UserId};
	use roster_server_db::UserRecord;
	use roster_server_permissions::{IdentityProvider, RequestContext};

	async fn connect(dir: &tempfile::TempDir) -> App {
		let mut config = roster_server_config::finalize(Default::default()).unwrap();
		config.database.url = format!("sqlite:{}", dir.path().join("roster.db").display());
		App::connect(&config).await.unwrap()
	}

	#[tokio::test]
	async fn test_bootstrap_and_administer() {
		let dir = tempfile::tempdir().unwrap();
		let app = connect(&dir).await;

		let mut operator = UserRecord::new(UserId::generate(), "ops", Role::SuperAdmin);
		operator.is_super_admin = true;
		app.directory.upsert_user(&operator).await.unwrap();
		let manager = UserRecord::new(UserId::generate(), "lee", Role::Manager);
		app.directory.upsert_user(&manager).await.unwrap();

		let ctx = RequestContext::new(app.identity.resolve_actor(operator.id).await.unwrap());
		app.admin
			.reset_to_defaults(&ctx, Role::Manager)
			.await
			.unwrap();

		let decision = app
			.permissions
			.explain(
				&RequestContext::new(manager.to_actor()),
				Module::Leave,
				Action::Approve,
			)
			.await;
		assert_eq!(decision, Decision::from_role(true));

		app.shutdown().await;
		assert_eq!(app.admin.audit_failures(), 0);
	}

	#[tokio::test]
	async fn test_reopen_keeps_grants() {
		let dir = tempfile::tempdir().unwrap();
		let manager = UserRecord::new(UserId::generate(), "kim", Role::Manager);
		{
			let app = connect(&dir).await;
			app.directory.upsert_user(&manager).await.unwrap();
			app.permissions
				.roles()
				.set(Role::Manager, Module::Reports, Action::Export, true, None)
				.await
				.unwrap();
			app.shutdown().await;
		}

		let app = connect(&dir).await;
		assert!(
			app.permissions
				.can(
					&RequestContext::new(manager.to_actor()),
					Module::Reports,
					Action::Export
				)
				.await
		);
		app.shutdown().await;
	}
}
