// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Roster permissions.
//!
//! Each table has a store trait (used by services, mockable in tests) and a
//! `*Repository` implementation over a shared `SqlitePool`.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod role_permission;
pub mod testing;
pub mod user_directory;
pub mod user_override;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::{begin_write, create_pool};
pub use role_permission::{RolePermissionRepository, RolePermissionStore};
pub use user_directory::{UserDirectoryRepository, UserDirectoryStore, UserRecord};
pub use user_override::{UserOverrideRepository, UserOverrideStore};
