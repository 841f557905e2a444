// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core permission types for Roster.
//!
//! This crate holds everything about permissions that does not touch storage:
//! the catalog of valid (module, action) pairs, factory-default role
//! matrices, and the pure functions that turn role grants, user overrides and
//! session state into a [`Decision`].
//!
//! # Architecture
//!
//! - `catalog` - Modules, actions and the registry of valid pairs
//! - `resolver` - Precedence-ordered resolution with provenance
//! - `gate` - Impersonation gating in front of the resolver
//! - `defaults` - Factory grant matrices used by reset
//!
//! # Example
//!
//! ```ignore
//! use roster_permissions_core::{check_and_resolve, Actor, ImpersonationState, Module, Action};
//!
//! let decision = check_and_resolve(
//!     &ImpersonationState::inactive(),
//!     &actor,
//!     Module::Leave,
//!     Action::Approve,
//!     &role_grants,
//!     &overrides,
//! );
//! println!("{}", decision.describe(actor.role));
//! ```

pub mod actor;
pub mod catalog;
pub mod decision;
pub mod defaults;
pub mod error;
pub mod gate;
pub mod grants;
pub mod resolver;
pub mod session;
pub mod types;

pub use actor::Actor;
pub use catalog::{Action, Module, Permission, PermissionCatalog, PermissionId};
pub use decision::{Decision, DecisionSource, EffectivePermission};
pub use defaults::{default_grant, default_grants};
pub use error::{PermissionError, Result};
pub use gate::{check_and_resolve, is_impersonation_safe, IMPERSONATION_SAFE};
pub use grants::{RoleGrant, RoleGrants, UserOverride, UserOverrides};
pub use resolver::resolve;
pub use session::ImpersonationState;
pub use types::{CompanyId, Role, SessionId, UserId};
