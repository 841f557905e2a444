// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use super::{AuditSink, AuditSinkError};
use crate::event::{AuditLogEntry, AuditSeverity};
use crate::filter::AuditFilterConfig;

/// Writes audit events to the `roster_audit` tracing target.
pub struct TracingAuditSink {
	filter: AuditFilterConfig,
}

impl TracingAuditSink {
	pub fn new(filter: AuditFilterConfig) -> Self {
		Self { filter }
	}
}

pub fn severity_to_level(severity: AuditSeverity) -> Level {
	match severity {
		AuditSeverity::Debug => Level::DEBUG,
		AuditSeverity::Info | AuditSeverity::Notice => Level::INFO,
		AuditSeverity::Warning => Level::WARN,
		AuditSeverity::Error | AuditSeverity::Critical => Level::ERROR,
	}
}

macro_rules! emit {
	($macro:ident, $entry:expr, $details:expr) => {
		tracing::$macro!(
			target: "roster_audit",
			event_type = %$entry.event_type,
			severity = %$entry.severity,
			id = %$entry.id,
			timestamp = %$entry.timestamp.to_rfc3339(),
			action = %$entry.action,
			actor_user_id = $entry.actor_user_id.map(|u| u.to_string()),
			target_user_id = $entry.target_user_id.map(|u| u.to_string()),
			resource_type = $entry.resource_type.as_deref(),
			resource_id = $entry.resource_id.as_deref(),
			details = $details,
			"audit event"
		)
	};
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let details = if entry.details.is_null() {
			None
		} else {
			Some(entry.details.to_string())
		};

		match severity_to_level(entry.severity) {
			Level::DEBUG => emit!(debug, entry, details),
			Level::INFO => emit!(info, entry, details),
			Level::WARN => emit!(warn, entry, details),
			_ => emit!(error, entry, details),
		}

		Ok(())
	}
}
