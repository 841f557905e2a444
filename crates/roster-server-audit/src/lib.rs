// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit logging for permission administration.
//!
//! Entries are queued on a bounded channel and fanned out to sinks on a
//! background task, so a slow or failing sink never holds up the mutation
//! that produced the entry.

pub mod error;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod sink;

pub use error::{AuditError, AuditResult, AuditSinkError};
pub use event::{AuditEventType, AuditLogBuilder, AuditLogEntry, AuditSeverity};
pub use filter::AuditFilterConfig;
pub use pipeline::{AuditService, AuditStats};
pub use sink::AuditSink;

pub use roster_server_config::{AuditConfig, QueueOverflowPolicy};

#[cfg(feature = "sink-sqlite")]
pub use sink::sqlite::SqliteAuditSink;

#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingAuditSink;
