// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for audit logging.
//!
//! - [`AuditEventType`]: Enumeration of all auditable events
//! - [`AuditSeverity`]: RFC 5424-compatible severity levels
//! - [`AuditLogEntry`]: Complete audit record
//! - [`AuditLogBuilder`]: Fluent API for constructing entries

use chrono::{DateTime, Utc};
use roster_permissions_core::UserId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuditError;

/// Types of events that can be recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	// Permission administration
	RolePermissionChanged,
	RolePermissionsReset,
	UserPermissionChanged,
	UserPermissionsCleared,

	// User directory
	UserSaved,

	// Impersonation
	ImpersonationStarted,
	ImpersonationEnded,

	// Refused administration
	AccessDenied,
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditEventType::RolePermissionChanged => "role_permission_changed",
			AuditEventType::RolePermissionsReset => "role_permissions_reset",
			AuditEventType::UserPermissionChanged => "user_permission_changed",
			AuditEventType::UserPermissionsCleared => "user_permissions_cleared",
			AuditEventType::UserSaved => "user_saved",
			AuditEventType::ImpersonationStarted => "impersonation_started",
			AuditEventType::ImpersonationEnded => "impersonation_ended",
			AuditEventType::AccessDenied => "access_denied",
		};
		write!(f, "{s}")
	}
}

impl AuditEventType {
	/// Returns the default severity for this event type.
	///
	/// - `Notice`: Administrative changes, user directory writes and impersonation
	/// - `Warning`: Refused administration attempts
	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			AuditEventType::RolePermissionChanged
			| AuditEventType::RolePermissionsReset
			| AuditEventType::UserPermissionChanged
			| AuditEventType::UserPermissionsCleared
			| AuditEventType::UserSaved
			| AuditEventType::ImpersonationStarted
			| AuditEventType::ImpersonationEnded => AuditSeverity::Notice,

			AuditEventType::AccessDenied => AuditSeverity::Warning,
		}
	}
}

/// Severity levels for audit events, compatible with RFC 5424 syslog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
	Error = 3,
	Critical = 2,
}

impl AuditSeverity {
	/// Returns the RFC 5424 numeric severity code.
	pub fn as_syslog_code(&self) -> u8 {
		*self as u8
	}
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Lower numeric value = higher severity (Critical=2 > Debug=7)
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
			AuditSeverity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

impl FromStr for AuditSeverity {
	type Err = AuditError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"debug" => Ok(AuditSeverity::Debug),
			"info" => Ok(AuditSeverity::Info),
			"notice" => Ok(AuditSeverity::Notice),
			"warning" => Ok(AuditSeverity::Warning),
			"error" => Ok(AuditSeverity::Error),
			"critical" => Ok(AuditSeverity::Critical),
			_ => Err(AuditError::ConfigError(format!("unknown severity '{s}'"))),
		}
	}
}

/// An entry in the audit log recording a permission-relevant event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
	/// Unique identifier for this audit entry.
	pub id: Uuid,
	/// When the event occurred.
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	pub severity: AuditSeverity,

	/// The operator who performed the action.
	pub actor_user_id: Option<UserId>,
	/// The user whose permissions were affected, for user-level events.
	pub target_user_id: Option<UserId>,

	/// The type of resource affected (e.g., "role", "user", "session").
	pub resource_type: Option<String>,
	/// The ID of the resource affected.
	pub resource_id: Option<String>,

	/// Short description of the action, e.g. `leave:approve`.
	pub action: String,
	/// Event-specific payload.
	pub details: serde_json::Value,
}

impl AuditLogEntry {
	/// Create a new audit log builder for the given event type.
	pub fn builder(event_type: AuditEventType) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type)
	}
}

/// Builder for constructing audit log entries with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_type: AuditEventType,
	severity: Option<AuditSeverity>,
	actor_user_id: Option<UserId>,
	target_user_id: Option<UserId>,
	resource_type: Option<String>,
	resource_id: Option<String>,
	action: Option<String>,
	details: serde_json::Value,
}

impl AuditLogBuilder {
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			event_type,
			severity: None,
			actor_user_id: None,
			target_user_id: None,
			resource_type: None,
			resource_id: None,
			action: None,
			details: serde_json::Value::Null,
		}
	}

	/// Set the severity level. Defaults to the event type's default severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn actor(mut self, user_id: UserId) -> Self {
		self.actor_user_id = Some(user_id);
		self
	}

	pub fn target_user(mut self, user_id: UserId) -> Self {
		self.target_user_id = Some(user_id);
		self
	}

	pub fn resource(
		mut self,
		resource_type: impl Into<String>,
		resource_id: impl Into<String>,
	) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = Some(resource_id.into());
		self
	}

	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			severity: self
				.severity
				.unwrap_or_else(|| self.event_type.default_severity()),
			actor_user_id: self.actor_user_id,
			target_user_id: self.target_user_id,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			action: self.action.unwrap_or_else(|| self.event_type.to_string()),
			details: self.details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_event_type_display_matches_serde() {
		for event_type in [
			AuditEventType::RolePermissionChanged,
			AuditEventType::RolePermissionsReset,
			AuditEventType::UserPermissionChanged,
			AuditEventType::UserPermissionsCleared,
			AuditEventType::UserSaved,
			AuditEventType::ImpersonationStarted,
			AuditEventType::ImpersonationEnded,
			AuditEventType::AccessDenied,
		] {
			let json = serde_json::to_string(&event_type).unwrap();
			assert_eq!(json, format!("\"{event_type}\""));
		}
	}

	#[test]
	fn test_severity_ordering() {
		assert!(AuditSeverity::Critical > AuditSeverity::Error);
		assert!(AuditSeverity::Warning > AuditSeverity::Notice);
		assert!(AuditSeverity::Info > AuditSeverity::Debug);
	}

	#[test]
	fn test_severity_parse() {
		assert_eq!(
			"Warning".parse::<AuditSeverity>().unwrap(),
			AuditSeverity::Warning
		);
		assert!("loud".parse::<AuditSeverity>().is_err());
	}

	#[test]
	fn test_builder_defaults() {
		let entry = AuditLogEntry::builder(AuditEventType::AccessDenied).build();
		assert_eq!(entry.severity, AuditSeverity::Warning);
		assert_eq!(entry.action, "access_denied");
		assert!(entry.details.is_null());
		assert!(entry.actor_user_id.is_none());
	}

	#[test]
	fn test_builder_sets_fields() {
		let operator = UserId::generate();
		let target = UserId::generate();
		let entry = AuditLogEntry::builder(AuditEventType::UserPermissionChanged)
			.actor(operator)
			.target_user(target)
			.resource("user", target.to_string())
			.action("leave:approve")
			.details(json!({ "granted": false }))
			.build();

		assert_eq!(entry.actor_user_id, Some(operator));
		assert_eq!(entry.target_user_id, Some(target));
		assert_eq!(entry.resource_type.as_deref(), Some("user"));
		assert_eq!(entry.action, "leave:approve");
		assert_eq!(entry.details["granted"], json!(false));
		assert_eq!(entry.severity, AuditSeverity::Notice);
	}
}
