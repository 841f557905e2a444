// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::event::{AuditEventType, AuditLogEntry, AuditSeverity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFilterConfig {
	pub min_severity: AuditSeverity,
	pub include_events: Option<Vec<AuditEventType>>,
	pub exclude_events: Option<Vec<AuditEventType>>,
}

impl Default for AuditFilterConfig {
	fn default() -> Self {
		Self {
			min_severity: AuditSeverity::Info,
			include_events: None,
			exclude_events: None,
		}
	}
}

impl AuditFilterConfig {
	pub fn with_min_severity(min_severity: AuditSeverity) -> Self {
		Self {
			min_severity,
			..Default::default()
		}
	}

	pub fn allows(&self, entry: &AuditLogEntry) -> bool {
		if entry.severity < self.min_severity {
			return false;
		}

		if let Some(ref exclude) = self.exclude_events {
			if exclude.contains(&entry.event_type) {
				return false;
			}
		}

		if let Some(ref include) = self.include_events {
			if !include.contains(&entry.event_type) {
				return false;
			}
		}

		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_entry(event_type: AuditEventType, severity: AuditSeverity) -> AuditLogEntry {
		AuditLogEntry::builder(event_type)
			.severity(severity)
			.build()
	}

	#[test]
	fn test_default_config_allows_info_and_above() {
		let config = AuditFilterConfig::default();

		assert!(config.allows(&make_entry(
			AuditEventType::RolePermissionChanged,
			AuditSeverity::Info
		)));
		assert!(config.allows(&make_entry(
			AuditEventType::AccessDenied,
			AuditSeverity::Warning
		)));
		assert!(!config.allows(&make_entry(
			AuditEventType::RolePermissionChanged,
			AuditSeverity::Debug
		)));
	}

	#[test]
	fn test_min_severity_filter() {
		let config = AuditFilterConfig::with_min_severity(AuditSeverity::Warning);
		assert!(!config.allows(&make_entry(
			AuditEventType::ImpersonationStarted,
			AuditSeverity::Notice
		)));
		assert!(config.allows(&make_entry(
			AuditEventType::AccessDenied,
			AuditSeverity::Warning
		)));
	}

	#[test]
	fn test_exclude_takes_priority() {
		let config = AuditFilterConfig {
			min_severity: AuditSeverity::Debug,
			include_events: Some(vec![AuditEventType::AccessDenied]),
			exclude_events: Some(vec![AuditEventType::AccessDenied]),
		};
		assert!(!config.allows(&make_entry(
			AuditEventType::AccessDenied,
			AuditSeverity::Warning
		)));
	}

	#[test]
	fn test_include_list_restricts() {
		let config = AuditFilterConfig {
			min_severity: AuditSeverity::Debug,
			include_events: Some(vec![AuditEventType::RolePermissionsReset]),
			exclude_events: None,
		};
		assert!(config.allows(&make_entry(
			AuditEventType::RolePermissionsReset,
			AuditSeverity::Notice
		)));
		assert!(!config.allows(&make_entry(
			AuditEventType::RolePermissionChanged,
			AuditSeverity::Notice
		)));
	}

	mod properties {
		use super::*;
		use proptest::prelude::*;

		fn severity() -> impl Strategy<Value = AuditSeverity> {
			prop_oneof![
				Just(AuditSeverity::Debug),
				Just(AuditSeverity::Info),
				Just(AuditSeverity::Notice),
				Just(AuditSeverity::Warning),
				Just(AuditSeverity::Error),
				Just(AuditSeverity::Critical),
			]
		}

		proptest! {
			#[test]
			fn min_severity_matches_syslog_codes(min in severity(), actual in severity()) {
				let config = AuditFilterConfig::with_min_severity(min);
				let entry = make_entry(AuditEventType::RolePermissionChanged, actual);
				prop_assert_eq!(
					config.allows(&entry),
					actual.as_syslog_code() <= min.as_syslog_code()
				);
			}
		}
	}
}
