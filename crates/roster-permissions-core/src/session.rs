// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-scoped impersonation state.
//!
//! The state is owned by the session, not by a tenant. It is passed
//! explicitly into every check so gating stays a pure function of its inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CompanyId;

/// Whether a session is currently acting as a tenant company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationState {
	pub is_impersonating: bool,
	pub acting_as_company_id: Option<CompanyId>,
	pub started_at: Option<DateTime<Utc>>,
}

impl ImpersonationState {
	/// A session acting under its own identity.
	pub fn inactive() -> Self {
		Self::default()
	}

	/// A session that started impersonating `company_id` now.
	pub fn started(company_id: CompanyId) -> Self {
		Self::started_at(company_id, Utc::now())
	}

	pub fn started_at(company_id: CompanyId, started_at: DateTime<Utc>) -> Self {
		Self {
			is_impersonating: true,
			acting_as_company_id: Some(company_id),
			started_at: Some(started_at),
		}
	}

	/// Time spent impersonating so far, if active.
	pub fn elapsed(&self) -> Option<chrono::Duration> {
		if !self.is_impersonating {
			return None;
		}
		self.started_at.map(|s| Utc::now() - s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_inactive() {
		let state = ImpersonationState::default();
		assert!(!state.is_impersonating);
		assert!(state.acting_as_company_id.is_none());
		assert!(state.elapsed().is_none());
	}

	#[test]
	fn started_records_company_and_time() {
		let company = CompanyId::generate();
		let state = ImpersonationState::started(company);
		assert!(state.is_impersonating);
		assert_eq!(state.acting_as_company_id, Some(company));
		assert!(state.elapsed().unwrap().num_milliseconds() >= 0);
	}
}
