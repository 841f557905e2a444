// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission checks for request handlers.
//!
//! `can` and `explain` never fail: storage errors during a check are logged
//! and the check resolves denied. The impersonation flag is read from the
//! session store on every call and never cached.

use std::sync::Arc;

use roster_permissions_core::gate::blocks;
use roster_permissions_core::{
	check_and_resolve, Action, Actor, Decision, EffectivePermission, ImpersonationState, Module,
	PermissionCatalog, PermissionError, RoleGrants, SessionId, UserId, UserOverrides,
};
use tracing::{debug, error, instrument};

use crate::error::Result;
use crate::identity::IdentityProvider;
use crate::override_table::UserOverrideTable;
use crate::role_table::RolePermissionTable;
use crate::session::SessionStore;

/// Who is asking, and from which session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
	pub actor: Actor,
	/// `None` for requests outside an interactive session, which are never
	/// impersonating.
	pub session_id: Option<SessionId>,
}

impl RequestContext {
	pub fn new(actor: Actor) -> Self {
		Self {
			actor,
			session_id: None,
		}
	}

	pub fn with_session(mut self, session_id: SessionId) -> Self {
		self.session_id = Some(session_id);
		self
	}
}

pub struct PermissionService {
	pub(crate) roles: Arc<RolePermissionTable>,
	pub(crate) overrides: Arc<UserOverrideTable>,
	pub(crate) sessions: Arc<dyn SessionStore>,
	pub(crate) identity: Arc<dyn IdentityProvider>,
}

impl PermissionService {
	pub fn new(
		roles: Arc<RolePermissionTable>,
		overrides: Arc<UserOverrideTable>,
		sessions: Arc<dyn SessionStore>,
		identity: Arc<dyn IdentityProvider>,
	) -> Self {
		Self {
			roles,
			overrides,
			sessions,
			identity,
		}
	}

	pub fn roles(&self) -> &RolePermissionTable {
		&self.roles
	}

	pub fn overrides(&self) -> &UserOverrideTable {
		&self.overrides
	}

	pub fn sessions(&self) -> &dyn SessionStore {
		self.sessions.as_ref()
	}

	pub fn session_state(&self, ctx: &RequestContext) -> ImpersonationState {
		ctx.session_id
			.map(|id| self.sessions.get(id))
			.unwrap_or_default()
	}

	/// Whether the request may perform `module:action`.
	pub async fn can(&self, ctx: &RequestContext, module: Module, action: Action) -> bool {
		self.explain(ctx, module, action).await.allowed
	}

	/// The decision for `module:action` with its provenance.
	pub async fn explain(&self, ctx: &RequestContext, module: Module, action: Action) -> Decision {
		let session = self.session_state(ctx);
		self.evaluate(&ctx.actor, &session, module, action).await
	}

	/// Guard for mutating entry points: `Ok` when allowed, otherwise a
	/// [`PermissionError::Denied`] carrying the deciding source.
	pub async fn authorize(
		&self,
		ctx: &RequestContext,
		module: Module,
		action: Action,
	) -> std::result::Result<Decision, PermissionError> {
		let decision = self.explain(ctx, module, action).await;
		if decision.allowed {
			Ok(decision)
		} else {
			Err(PermissionError::Denied {
				module,
				action,
				decided_by: decision.source,
			})
		}
	}

	/// Gate, then resolve, loading grants only when the answer depends on
	/// them.
	#[instrument(
		skip(self, actor, session),
		fields(user_id = %actor.user_id, impersonating = session.is_impersonating, %module, %action)
	)]
	pub async fn evaluate(
		&self,
		actor: &Actor,
		session: &ImpersonationState,
		module: Module,
		action: Action,
	) -> Decision {
		let needs_tables = !blocks(session, module, action)
			&& !actor.has_super_admin_bypass()
			&& PermissionCatalog::global().is_valid(module, action);

		let decision = if needs_tables {
			match self.load(actor).await {
				Ok((role_grants, overrides)) => {
					check_and_resolve(session, actor, module, action, &role_grants, &overrides)
				}
				Err(e) => {
					error!(error = %e, "failed to load grants, denying");
					Decision::deny()
				}
			}
		} else {
			check_and_resolve(
				session,
				actor,
				module,
				action,
				&RoleGrants::new(),
				&UserOverrides::new(),
			)
		};

		debug!(allowed = decision.allowed, source = %decision.source, "permission decision");
		decision
	}

	/// The resolved decision of every catalog permission for `user_id`, as
	/// the user would see it outside impersonation.
	#[instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_effective_permissions(
		&self,
		user_id: UserId,
	) -> Result<Vec<EffectivePermission>> {
		let actor = self.identity.resolve_actor(user_id).await?;
		let (role_grants, overrides) = self.load(&actor).await?;
		let session = ImpersonationState::inactive();

		Ok(PermissionCatalog::global()
			.permissions()
			.iter()
			.map(|p| EffectivePermission {
				module: p.module,
				action: p.action,
				decision: check_and_resolve(
					&session,
					&actor,
					p.module,
					p.action,
					&role_grants,
					&overrides,
				),
			})
			.collect())
	}

	async fn load(&self, actor: &Actor) -> Result<(Arc<RoleGrants>, Arc<UserOverrides>)> {
		let (role_grants, overrides) = tokio::join!(
			self.roles.get(actor.role),
			self.overrides.get(actor.user_id)
		);
		Ok((role_grants?, overrides?))
	}
}
