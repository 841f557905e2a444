// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission engine configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PermissionsConfigLayer {
	pub cache_enabled: Option<bool>,
}

impl PermissionsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.cache_enabled.is_some() {
			self.cache_enabled = other.cache_enabled;
		}
	}

	pub fn finalize(self) -> PermissionsConfig {
		PermissionsConfig {
			cache_enabled: self.cache_enabled.unwrap_or(true),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PermissionsConfig {
	/// Cache role grants and user overrides in process.
	pub cache_enabled: bool,
}

impl Default for PermissionsConfig {
	fn default() -> Self {
		Self {
			cache_enabled: true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cache_enabled_by_default() {
		assert!(PermissionsConfigLayer::default().finalize().cache_enabled);
	}

	#[test]
	fn test_cache_can_be_disabled() {
		let layer: PermissionsConfigLayer = toml::from_str("cache_enabled = false").unwrap();
		assert!(!layer.finalize().cache_enabled);
	}
}
