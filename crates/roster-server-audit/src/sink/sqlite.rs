// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AuditSinkError;
use crate::event::AuditLogEntry;
use crate::filter::AuditFilterConfig;
use crate::sink::AuditSink;

/// Appends audit events to the `audit_logs` table.
pub struct SqliteAuditSink {
	pool: SqlitePool,
	filter: AuditFilterConfig,
	name: String,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool, filter: AuditFilterConfig) -> Self {
		Self {
			pool,
			filter,
			name: "sqlite".to_string(),
		}
	}
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
	fn name(&self) -> &str {
		&self.name
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let details_json = serde_json::to_string(&entry.details)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize details: {e}")))?;

		sqlx::query(
			r#"
			INSERT INTO audit_logs (
				id, timestamp, event_type, severity, actor_user_id, target_user_id,
				resource_type, resource_id, action, details, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(entry.id.to_string())
		.bind(entry.timestamp.to_rfc3339())
		.bind(entry.event_type.to_string())
		.bind(entry.severity.to_string())
		.bind(entry.actor_user_id.map(|u| u.to_string()))
		.bind(entry.target_user_id.map(|u| u.to_string()))
		.bind(entry.resource_type.as_deref())
		.bind(entry.resource_id.as_deref())
		.bind(&entry.action)
		.bind(details_json)
		.bind(chrono::Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| AuditSinkError::Transient(format!("failed to insert audit log: {e}")))?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEventType;
	use roster_permissions_core::UserId;
	use roster_server_db::testing::{create_migrated_test_pool, create_test_pool};
	use serde_json::json;

	#[tokio::test]
	async fn test_publish_inserts_row() {
		let pool = create_migrated_test_pool().await;
		let sink = SqliteAuditSink::new(pool.clone(), AuditFilterConfig::default());
		let operator = UserId::generate();

		let entry = AuditLogEntry::builder(AuditEventType::RolePermissionChanged)
			.actor(operator)
			.resource("role", "manager")
			.action("leave:approve")
			.details(json!({ "grant": false, "previous": true, "changed": true }))
			.build();
		sink.publish(Arc::new(entry)).await.unwrap();

		let (event_type, actor, details): (String, String, String) = sqlx::query_as(
			"SELECT event_type, actor_user_id, details FROM audit_logs",
		)
		.fetch_one(&pool)
		.await
		.unwrap();
		assert_eq!(event_type, "role_permission_changed");
		assert_eq!(actor, operator.to_string());
		let details: serde_json::Value = serde_json::from_str(&details).unwrap();
		assert_eq!(details["changed"], json!(true));
	}

	#[tokio::test]
	async fn test_missing_table_is_transient_error() {
		let pool = create_test_pool().await;
		let sink = SqliteAuditSink::new(pool, AuditFilterConfig::default());
		let entry = AuditLogEntry::builder(AuditEventType::AccessDenied).build();

		let result = sink.publish(Arc::new(entry)).await;
		assert!(matches!(result, Err(AuditSinkError::Transient(_))));
	}
}
