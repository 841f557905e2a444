// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuditConfigLayer, DatabaseConfigLayer, LoggingConfigLayer, PermissionsConfigLayer,
	QueueOverflowPolicy,
};

/// Default location of the system config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/roster/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: ROSTER_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(|name| std::env::var(name).ok())
	}
}

/// Builds a layer from an arbitrary variable lookup. Empty values are
/// treated as unset.
pub fn load_from_lookup<F>(lookup: F) -> Result<ServerConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let env = Env(&lookup);
	Ok(ServerConfigLayer {
		database: Some(DatabaseConfigLayer {
			url: env.var("ROSTER_SERVER_DATABASE_URL"),
			max_connections: env.parse("ROSTER_SERVER_DATABASE_MAX_CONNECTIONS")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("ROSTER_SERVER_LOG_LEVEL"),
			json: env.bool("ROSTER_SERVER_LOG_JSON"),
		}),
		audit: Some(load_audit(&env)?),
		permissions: Some(PermissionsConfigLayer {
			cache_enabled: env.bool("ROSTER_SERVER_PERMISSIONS_CACHE_ENABLED"),
		}),
	})
}

fn load_audit(env: &Env<'_>) -> Result<AuditConfigLayer, ConfigError> {
	let queue_overflow_policy = match env.var("ROSTER_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY") {
		Some(v) => Some(match v.to_lowercase().as_str() {
			"drop_newest" => QueueOverflowPolicy::DropNewest,
			"drop_oldest" => QueueOverflowPolicy::DropOldest,
			"block" => QueueOverflowPolicy::Block,
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "ROSTER_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY".to_string(),
					message: format!("unknown policy '{v}'"),
				})
			}
		}),
		None => None,
	};

	Ok(AuditConfigLayer {
		enabled: env.bool("ROSTER_SERVER_AUDIT_ENABLED"),
		queue_capacity: env.parse("ROSTER_SERVER_AUDIT_QUEUE_CAPACITY")?,
		queue_overflow_policy,
		min_severity: env.var("ROSTER_SERVER_AUDIT_MIN_SEVERITY"),
		sqlite_sink: env.bool("ROSTER_SERVER_AUDIT_SQLITE_SINK"),
		tracing_sink: env.bool("ROSTER_SERVER_AUDIT_TRACING_SINK"),
	})
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {} value '{v}'", std::any::type_name::<T>()),
			}),
			None => Ok(None),
		}
	}
}
