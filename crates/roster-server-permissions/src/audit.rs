// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use parking_lot::Mutex;
use roster_server_audit::{AuditLogEntry, AuditService};

/// Append-only destination for administration events.
///
/// `record` must not block the mutation that produced the entry. It returns
/// false when the entry could not be accepted.
pub trait AuditRecorder: Send + Sync {
	fn record(&self, entry: AuditLogEntry) -> bool;
}

impl AuditRecorder for AuditService {
	fn record(&self, entry: AuditLogEntry) -> bool {
		self.log(entry)
	}
}

/// Discards every entry. For deployments with auditing disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditRecorder;

impl AuditRecorder for NoopAuditRecorder {
	fn record(&self, _entry: AuditLogEntry) -> bool {
		true
	}
}

/// Keeps entries in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditRecorder {
	entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditRecorder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entries(&self) -> Vec<AuditLogEntry> {
		self.entries.lock().clone()
	}
}

impl AuditRecorder for MemoryAuditRecorder {
	fn record(&self, entry: AuditLogEntry) -> bool {
		self.entries.lock().push(entry);
		true
	}
}
