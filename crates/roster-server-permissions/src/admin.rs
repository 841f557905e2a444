// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The only writer of role grants, user overrides and user directory entries.
//!
//! Every call must come from a platform administrator acting under their own
//! identity. Refused calls are audited as `access_denied`; successful calls
//! emit exactly one event each, including calls that changed nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use roster_permissions_core::{
	default_grants, Action, CompanyId, EffectivePermission, ImpersonationState, Module,
	PermissionError, Role, RoleGrant, SessionId, UserId,
};
use roster_server_audit::{AuditEventType, AuditLogEntry};
use roster_server_db::{UserDirectoryStore, UserRecord};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::audit::AuditRecorder;
use crate::error::Result;
use crate::service::{PermissionService, RequestContext};

pub struct AdministrationService {
	permissions: Arc<PermissionService>,
	directory: Arc<dyn UserDirectoryStore>,
	audit: Arc<dyn AuditRecorder>,
	audit_failures: AtomicU64,
}

impl AdministrationService {
	pub fn new(
		permissions: Arc<PermissionService>,
		directory: Arc<dyn UserDirectoryStore>,
		audit: Arc<dyn AuditRecorder>,
	) -> Self {
		Self {
			permissions,
			directory,
			audit,
			audit_failures: AtomicU64::new(0),
		}
	}

	/// Audit entries the recorder refused. Mutations are never rolled back
	/// for this; the counter is for monitoring.
	pub fn audit_failures(&self) -> u64 {
		self.audit_failures.load(Ordering::Relaxed)
	}

	#[instrument(skip(self, ctx), fields(operator = %ctx.actor.user_id, role = %role, %module, %action, grant = grant))]
	pub async fn set_role_permission(
		&self,
		ctx: &RequestContext,
		role: Role,
		module: Module,
		action: Action,
		grant: bool,
	) -> Result<Option<bool>> {
		self.authorize_operator(ctx, "set_role_permission")?;
		let operator = ctx.actor.user_id;

		let previous = self
			.permissions
			.roles
			.set(role, module, action, grant, Some(operator))
			.await?;

		self.emit(
			AuditLogEntry::builder(AuditEventType::RolePermissionChanged)
				.actor(operator)
				.resource("role", role.as_str())
				.action(format!("{module}:{action}"))
				.details(json!({
					"role": role,
					"module": module,
					"action": action,
					"grant": grant,
					"actor": operator,
					"previous": previous,
					"changed": previous != Some(grant),
				}))
				.build(),
		);
		info!(?previous, "role permission set");
		Ok(previous)
	}

	/// Sets an explicit allow or deny for one user, or removes it with `None`.
	#[instrument(skip(self, ctx), fields(operator = %ctx.actor.user_id, user_id = %user_id, %module, %action, ?granted))]
	pub async fn set_user_permission(
		&self,
		ctx: &RequestContext,
		user_id: UserId,
		module: Module,
		action: Action,
		granted: Option<bool>,
	) -> Result<Option<bool>> {
		self.authorize_operator(ctx, "set_user_permission")?;
		let operator = ctx.actor.user_id;

		let target = self.permissions.identity.resolve_actor(user_id).await?;
		let previous = self
			.permissions
			.overrides
			.set(&target, module, action, granted, Some(operator))
			.await?;

		self.emit(
			AuditLogEntry::builder(AuditEventType::UserPermissionChanged)
				.actor(operator)
				.target_user(user_id)
				.resource("user", user_id.to_string())
				.action(format!("{module}:{action}"))
				.details(json!({
					"user_id": user_id,
					"module": module,
					"action": action,
					"granted": granted,
					"actor": operator,
					"previous": previous,
					"changed": previous != granted,
				}))
				.build(),
		);
		info!(?previous, "user permission set");
		Ok(previous)
	}

	/// Removes every override of `user_id`, returning how many were removed.
	#[instrument(skip(self, ctx), fields(operator = %ctx.actor.user_id, user_id = %user_id))]
	pub async fn clear_user_permissions(&self, ctx: &RequestContext, user_id: UserId) -> Result<u64> {
		self.authorize_operator(ctx, "clear_user_permissions")?;
		let operator = ctx.actor.user_id;

		self.permissions.identity.resolve_actor(user_id).await?;
		let removed = self.permissions.overrides.clear(user_id).await?;

		self.emit(
			AuditLogEntry::builder(AuditEventType::UserPermissionsCleared)
				.actor(operator)
				.target_user(user_id)
				.resource("user", user_id.to_string())
				.details(json!({
					"user_id": user_id,
					"actor": operator,
					"removed": removed,
					"changed": removed > 0,
				}))
				.build(),
		);
		info!(removed, "user permissions cleared");
		Ok(removed)
	}

	/// Replaces every grant of `role` with the factory matrix, returning the
	/// grants it replaced.
	#[instrument(skip(self, ctx), fields(operator = %ctx.actor.user_id, role = %role))]
	pub async fn reset_to_defaults(&self, ctx: &RequestContext, role: Role) -> Result<Vec<RoleGrant>> {
		self.authorize_operator(ctx, "reset_to_defaults")?;
		let operator = ctx.actor.user_id;

		let previous = self
			.permissions
			.roles
			.reset_to_defaults(role, Some(operator))
			.await?;

		let before: HashMap<_, _> = previous
			.iter()
			.map(|g| (g.permission.id, g.is_granted))
			.collect();
		let defaults = default_grants(role)?;
		let changed = defaults
			.iter()
			.filter(|g| before.get(&g.permission.id) != Some(&g.is_granted))
			.count();

		self.emit(
			AuditLogEntry::builder(AuditEventType::RolePermissionsReset)
				.actor(operator)
				.resource("role", role.as_str())
				.details(json!({
					"role": role,
					"actor": operator,
					"previous_rows": previous.len(),
					"grants_changed": changed,
					"changed": changed > 0,
				}))
				.build(),
		);
		info!(grants_changed = changed, "role reset to defaults");
		Ok(previous)
	}

	/// The resolved decision of every catalog permission for `user_id`.
	pub async fn list_effective_permissions(
		&self,
		ctx: &RequestContext,
		user_id: UserId,
	) -> Result<Vec<EffectivePermission>> {
		self.authorize_operator(ctx, "list_effective_permissions")?;
		self.permissions.list_effective_permissions(user_id).await
	}

	/// Creates or updates a user directory entry, role and platform
	/// administrator flag included, returning the entry it replaced.
	#[instrument(skip(self, ctx, user), fields(operator = %ctx.actor.user_id, user_id = %user.id, role = %user.role, super_admin = user.is_super_admin))]
	pub async fn save_user(
		&self,
		ctx: &RequestContext,
		user: UserRecord,
	) -> Result<Option<UserRecord>> {
		self.authorize_operator(ctx, "save_user")?;
		let operator = ctx.actor.user_id;

		let previous = self.directory.get_user(user.id).await?;
		self.directory.upsert_user(&user).await?;

		self.emit(user_saved(operator, &user, previous.as_ref(), false));
		info!("user directory entry saved");
		Ok(previous)
	}

	/// Saves the first platform administrator without an operator. Refused
	/// with [`PermissionError::PlatformAdministratorExists`] once any
	/// platform administrator exists.
	#[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
	pub async fn bootstrap_platform_admin(&self, mut user: UserRecord) -> Result<UserRecord> {
		user.is_super_admin = true;

		if !self.directory.insert_first_platform_admin(&user).await? {
			self.deny(user.id, "bootstrap_platform_admin", "platform_administrator_exists");
			return Err(PermissionError::PlatformAdministratorExists.into());
		}

		self.emit(user_saved(user.id, &user, None, true));
		info!("platform administrator bootstrapped");
		Ok(user)
	}

	/// Marks the operator's session as acting for `company_id`.
	///
	/// Only platform administrators may impersonate, and not while already
	/// impersonating.
	#[instrument(skip(self, ctx), fields(operator = %ctx.actor.user_id, session_id = %session_id, company_id = %company_id))]
	pub async fn start_impersonation(
		&self,
		ctx: &RequestContext,
		session_id: SessionId,
		company_id: CompanyId,
	) -> Result<ImpersonationState> {
		self.require_platform_admin(ctx, "start_impersonation")?;
		let operator = ctx.actor.user_id;

		let state = self.permissions.sessions.start(session_id, company_id)?;

		self.emit(
			AuditLogEntry::builder(AuditEventType::ImpersonationStarted)
				.actor(operator)
				.resource("session", session_id.to_string())
				.details(json!({
					"actor": operator,
					"session_id": session_id,
					"company_id": company_id,
					"started_at": state.started_at,
				}))
				.build(),
		);
		info!("impersonation started");
		Ok(state)
	}

	/// Ends impersonation on `session_id`, returning the state that ended.
	#[instrument(skip(self, ctx), fields(operator = %ctx.actor.user_id, session_id = %session_id))]
	pub async fn stop_impersonation(
		&self,
		ctx: &RequestContext,
		session_id: SessionId,
	) -> Result<ImpersonationState> {
		self.require_platform_admin(ctx, "stop_impersonation")?;
		let operator = ctx.actor.user_id;

		let state = self.permissions.sessions.stop(session_id)?;

		self.emit(
			AuditLogEntry::builder(AuditEventType::ImpersonationEnded)
				.actor(operator)
				.resource("session", session_id.to_string())
				.details(json!({
					"actor": operator,
					"session_id": session_id,
					"company_id": state.acting_as_company_id,
					"duration_secs": state.elapsed().map(|d| d.num_seconds()),
				}))
				.build(),
		);
		info!("impersonation ended");
		Ok(state)
	}

	fn authorize_operator(&self, ctx: &RequestContext, attempted: &str) -> Result<()> {
		self.require_platform_admin(ctx, attempted)?;

		if self.permissions.session_state(ctx).is_impersonating {
			self.deny(ctx.actor.user_id, attempted, "impersonating");
			return Err(PermissionError::ImpersonationWriteForbidden.into());
		}
		Ok(())
	}

	fn require_platform_admin(&self, ctx: &RequestContext, attempted: &str) -> Result<()> {
		if !ctx.actor.is_platform_admin() {
			self.deny(ctx.actor.user_id, attempted, "not_platform_administrator");
			return Err(PermissionError::NotPlatformAdministrator(ctx.actor.user_id).into());
		}
		Ok(())
	}

	fn deny(&self, actor: UserId, attempted: &str, reason: &str) {
		warn!(operator = %actor, attempted, reason, "administration refused");
		self.emit(
			AuditLogEntry::builder(AuditEventType::AccessDenied)
				.actor(actor)
				.action(attempted)
				.details(json!({
					"actor": actor,
					"attempted": attempted,
					"reason": reason,
				}))
				.build(),
		);
	}

	fn emit(&self, entry: AuditLogEntry) {
		let event_type = entry.event_type;
		if !self.audit.record(entry) {
			self.audit_failures.fetch_add(1, Ordering::Relaxed);
			warn!(%event_type, "audit event not recorded");
		}
	}
}

fn user_saved(
	actor: UserId,
	user: &UserRecord,
	previous: Option<&UserRecord>,
	bootstrap: bool,
) -> AuditLogEntry {
	let changed = previous.map_or(true, |p| {
		p.display_name != user.display_name
			|| p.role != user.role
			|| p.is_super_admin != user.is_super_admin
			|| p.company_id != user.company_id
	});

	AuditLogEntry::builder(AuditEventType::UserSaved)
		.actor(actor)
		.target_user(user.id)
		.resource("user", user.id.to_string())
		.details(json!({
			"user_id": user.id,
			"role": user.role,
			"is_super_admin": user.is_super_admin,
			"company_id": user.company_id,
			"actor": actor,
			"previous": previous.map(|p| json!({
				"role": p.role,
				"is_super_admin": p.is_super_admin,
				"company_id": p.company_id,
			})),
			"changed": changed,
			"bootstrap": bootstrap,
		}))
		.build()
}
