// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AuditConfigLayer, DatabaseConfigLayer, LoggingConfigLayer, PermissionsConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub audit: Option<AuditConfigLayer>,
	#[serde(default)]
	pub permissions: Option<PermissionsConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.audit, other.audit, AuditConfigLayer::merge);
		merge_option(
			&mut self.permissions,
			other.permissions,
			PermissionsConfigLayer::merge,
		);
	}
}

fn merge_option<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(b), Some(o)) => merge(b, o),
		(None, Some(o)) => *base = Some(o),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
				max_connections: None,
			}),
			..Default::default()
		});
		assert_eq!(
			base.database.unwrap().url.as_deref(),
			Some("sqlite::memory:")
		);
	}

	#[test]
	fn test_merge_combines_fields_within_section() {
		let mut base: ServerConfigLayer = toml::from_str(
			r#"
[database]
url = "sqlite:./a.db"
max_connections = 2
"#,
		)
		.unwrap();
		let overlay: ServerConfigLayer = toml::from_str(
			r#"
[database]
url = "sqlite:./b.db"
"#,
		)
		.unwrap();
		base.merge(overlay);

		let db = base.database.unwrap();
		assert_eq!(db.url.as_deref(), Some("sqlite:./b.db"));
		assert_eq!(db.max_connections, Some(2));
	}
}
