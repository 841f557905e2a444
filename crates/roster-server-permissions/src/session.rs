// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session impersonation state.
//!
//! The session owner (login, expiry, logout) lives outside this crate. The
//! store here only holds the flag, applied atomically per session and read
//! fresh on every check.

use std::collections::HashMap;

use parking_lot::RwLock;
use roster_permissions_core::{CompanyId, ImpersonationState, PermissionError, SessionId};

pub trait SessionStore: Send + Sync {
	/// Current state; sessions without an entry are not impersonating.
	fn get(&self, session_id: SessionId) -> ImpersonationState;

	fn start(
		&self,
		session_id: SessionId,
		company_id: CompanyId,
	) -> Result<ImpersonationState, PermissionError>;

	/// Ends impersonation and returns the state that was active.
	fn stop(&self, session_id: SessionId) -> Result<ImpersonationState, PermissionError>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
	sessions: RwLock<HashMap<SessionId, ImpersonationState>>,
}

impl InMemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Drops a session, as the session owner does on expiry or logout.
	pub fn end_session(&self, session_id: SessionId) {
		self.sessions.write().remove(&session_id);
	}
}

impl SessionStore for InMemorySessionStore {
	fn get(&self, session_id: SessionId) -> ImpersonationState {
		self.sessions
			.read()
			.get(&session_id)
			.copied()
			.unwrap_or_default()
	}

	fn start(
		&self,
		session_id: SessionId,
		company_id: CompanyId,
	) -> Result<ImpersonationState, PermissionError> {
		let mut sessions = self.sessions.write();
		if sessions
			.get(&session_id)
			.is_some_and(|s| s.is_impersonating)
		{
			return Err(PermissionError::AlreadyImpersonating);
		}
		let state = ImpersonationState::started(company_id);
		sessions.insert(session_id, state);
		Ok(state)
	}

	fn stop(&self, session_id: SessionId) -> Result<ImpersonationState, PermissionError> {
		let mut sessions = self.sessions.write();
		match sessions.remove(&session_id) {
			Some(state) if state.is_impersonating => Ok(state),
			_ => Err(PermissionError::NotImpersonating),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unknown_session_is_inactive() {
		let store = InMemorySessionStore::new();
		assert!(!store.get(SessionId::generate()).is_impersonating);
	}

	#[test]
	fn test_start_stop_cycle() {
		let store = InMemorySessionStore::new();
		let session = SessionId::generate();
		let company = CompanyId::generate();

		let started = store.start(session, company).unwrap();
		assert!(started.is_impersonating);
		assert_eq!(store.get(session).acting_as_company_id, Some(company));

		let stopped = store.stop(session).unwrap();
		assert_eq!(stopped.acting_as_company_id, Some(company));
		assert!(!store.get(session).is_impersonating);
	}

	#[test]
	fn test_double_start_rejected() {
		let store = InMemorySessionStore::new();
		let session = SessionId::generate();
		store.start(session, CompanyId::generate()).unwrap();
		assert!(matches!(
			store.start(session, CompanyId::generate()),
			Err(PermissionError::AlreadyImpersonating)
		));
	}

	#[test]
	fn test_stop_without_start_rejected() {
		let store = InMemorySessionStore::new();
		assert!(matches!(
			store.stop(SessionId::generate()),
			Err(PermissionError::NotImpersonating)
		));
	}

	#[test]
	fn test_session_expiry_clears_flag() {
		let store = InMemorySessionStore::new();
		let session = SessionId::generate();
		store.start(session, CompanyId::generate()).unwrap();
		store.end_session(session);
		assert!(!store.get(session).is_impersonating);
	}

	#[test]
	fn test_sessions_are_independent() {
		let store = InMemorySessionStore::new();
		let a = SessionId::generate();
		let b = SessionId::generate();
		store.start(a, CompanyId::generate()).unwrap();
		assert!(store.get(a).is_impersonating);
		assert!(!store.get(b).is_impersonating);
	}
}
