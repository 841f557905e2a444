// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server-side permission enforcement for Roster.
//!
//! [`PermissionService`] answers checks for request handlers and
//! [`AdministrationService`] is the only writer of role grants and user
//! overrides. Both sit on cached tables in front of the `roster-server-db`
//! stores; the pure precedence and gating rules live in
//! `roster-permissions-core`.
//!
//! # Example
//!
//! ```ignore
//! let ctx = RequestContext::new(actor).with_session(session_id);
//! if !permissions.can(&ctx, Module::Leave, Action::Approve).await {
//!     return Err(StatusCode::FORBIDDEN);
//! }
//! ```

pub mod admin;
pub mod audit;
pub mod cache;
pub mod error;
pub mod identity;
pub mod override_table;
pub mod role_table;
pub mod service;
pub mod session;

#[cfg(test)]
mod test_support;

pub use admin::AdministrationService;
pub use audit::{AuditRecorder, MemoryAuditRecorder, NoopAuditRecorder};
pub use cache::KeyedCache;
pub use error::{Result, ServiceError};
pub use identity::{DirectoryIdentityProvider, IdentityProvider};
pub use override_table::UserOverrideTable;
pub use role_table::RolePermissionTable;
pub use service::{PermissionService, RequestContext};
pub use session::{InMemorySessionStore, SessionStore};
