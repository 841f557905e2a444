// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use roster_permissions_core::{Actor, PermissionError, UserId};
use roster_server_db::UserDirectoryStore;

use crate::error::Result;

/// Supplies the authorization attributes of a user. Authentication happens
/// before this point.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	async fn resolve_actor(&self, user_id: UserId) -> Result<Actor>;
}

/// Resolves actors from the local user directory table.
pub struct DirectoryIdentityProvider {
	directory: Arc<dyn UserDirectoryStore>,
}

impl DirectoryIdentityProvider {
	pub fn new(directory: Arc<dyn UserDirectoryStore>) -> Self {
		Self { directory }
	}
}

#[async_trait]
impl IdentityProvider for DirectoryIdentityProvider {
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	async fn resolve_actor(&self, user_id: UserId) -> Result<Actor> {
		match self.directory.get_user(user_id).await? {
			Some(user) => Ok(user.to_actor()),
			None => Err(PermissionError::UnknownUser(user_id).into()),
		}
	}
}
