// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use http::StatusCode;
use roster_permissions_core::PermissionError;
use roster_server_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
	#[error(transparent)]
	Permission(#[from] PermissionError),

	#[error("storage error: {0}")]
	Database(#[from] DbError),
}

impl ServiceError {
	/// The HTTP status a server surface should answer with.
	///
	/// Authorization failures get their own status so callers can tell them
	/// apart from validation and not-found responses.
	pub fn status_code(&self) -> StatusCode {
		match self {
			ServiceError::Permission(e) => match e {
				PermissionError::Denied { .. }
				| PermissionError::NotPlatformAdministrator(_)
				| PermissionError::ImpersonationWriteForbidden => StatusCode::FORBIDDEN,
				PermissionError::InvalidPermission { .. } | PermissionError::Parse { .. } => {
					StatusCode::BAD_REQUEST
				}
				PermissionError::UnknownUser(_) => StatusCode::NOT_FOUND,
				PermissionError::ImmutableRole(_)
				| PermissionError::CannotOverrideSuperAdmin(_)
				| PermissionError::AlreadyImpersonating
				| PermissionError::NotImpersonating
				| PermissionError::PlatformAdministratorExists => StatusCode::CONFLICT,
			},
			ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn is_authorization_failure(&self) -> bool {
		matches!(self, ServiceError::Permission(e) if e.is_authorization_failure())
	}
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
