// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

pub mod audit;
pub mod database;
pub mod logging;
pub mod permissions;

pub use audit::{AuditConfig, AuditConfigLayer, QueueOverflowPolicy, SEVERITY_NAMES};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use permissions::{PermissionsConfig, PermissionsConfigLayer};
