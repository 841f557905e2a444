// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for Roster permission services.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`ROSTER_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use roster_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	load_from_lookup, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource,
	SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub audit: AuditConfig,
	pub permissions: PermissionsConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`ROSTER_SERVER_*`)
/// 2. Config file (`/etc/roster/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		database: layer.database.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		audit: layer.audit.unwrap_or_default().finalize(),
		permissions: layer.permissions.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		database = %config.database.url,
		log_json = config.logging.json,
		audit_enabled = config.audit.enabled,
		audit_min_severity = %config.audit.min_severity,
		cache_enabled = config.permissions.cache_enabled,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.database.url.trim().is_empty() {
		return Err(ConfigError::Validation(
			"database.url must not be empty".to_string(),
		));
	}

	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be at least 1".to_string(),
		));
	}

	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be at least 1".to_string(),
		));
	}

	let severity = config.audit.min_severity.to_lowercase();
	if !SEVERITY_NAMES.contains(&severity.as_str()) {
		return Err(ConfigError::Validation(format!(
			"audit.min_severity '{}' is not one of {}",
			config.audit.min_severity,
			SEVERITY_NAMES.join(", ")
		)));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FixedSource(ServerConfigLayer, Precedence);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.1
		}

		fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
			Ok(self.0.clone())
		}
	}

	fn db_layer(url: &str) -> ServerConfigLayer {
		ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some(url.to_string()),
				max_connections: None,
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults_finalize() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config, ServerConfig::default());
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(FixedSource(db_layer("sqlite:./env.db"), Precedence::Environment)),
			Box::new(FixedSource(db_layer("sqlite:./file.db"), Precedence::ConfigFile)),
		])
		.unwrap();
		assert_eq!(config.database.url, "sqlite:./env.db");
	}

	#[test]
	fn test_file_source_applies() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.toml");
		std::fs::write(
			&path,
			r#"
[logging]
level = "debug"
json = true
"#,
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(&path)),
		])
		.unwrap();
		assert_eq!(config.logging.level, "debug");
		assert!(config.logging.json);
	}

	#[test]
	fn test_rejects_unknown_severity() {
		let layer = ServerConfigLayer {
			audit: Some(AuditConfigLayer {
				min_severity: Some("loud".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("min_severity"));
	}

	#[test]
	fn test_rejects_zero_queue_capacity() {
		let layer = ServerConfigLayer {
			audit: Some(AuditConfigLayer {
				queue_capacity: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_rejects_empty_database_url() {
		assert!(finalize(db_layer("  ")).is_err());
	}
}
