// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where configuration layers come from.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WardenConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, FeatureFallback, FeaturesConfigLayer, LogFormat, LoggingConfigLayer,
	RebacConfigLayer, ShutdownConfigLayer,
};

/// Merge order of sources. Later levels override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WardenConfigLayer, ConfigError>;
}

/// An empty layer. Every section falls back to its built-in default.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		Ok(WardenConfigLayer::default())
	}
}

/// Sections read from a TOML file. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/warden/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "no config file");
			return Ok(WardenConfigLayer::default());
		}

		debug!(path = %self.path.display(), "reading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WardenConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!(path = %self.path.display(), "config file parsed");
		Ok(layer)
	}
}

/// `WARDEN_<SECTION>_<FIELD>` variables. Empty values count as unset.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("reading WARDEN_* variables");
		layer_from(&Env(|name: &str| std::env::var(name).ok()))
	}
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: FromStr>(&self, name: &str, what: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {what} value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

fn layer_from<F: Fn(&str) -> Option<String>>(
	env: &Env<F>,
) -> Result<WardenConfigLayer, ConfigError> {
	Ok(WardenConfigLayer {
		database: Some(DatabaseConfigLayer {
			url: env.var("WARDEN_DATABASE_URL"),
			max_connections: env.parse("WARDEN_DATABASE_MAX_CONNECTIONS", "u32")?,
		}),
		rebac: Some(RebacConfigLayer {
			url: env.var("WARDEN_REBAC_URL"),
			store_id: env.var("WARDEN_REBAC_STORE_ID"),
			model_id: env.var("WARDEN_REBAC_MODEL_ID"),
			api_token: env.var("WARDEN_REBAC_API_TOKEN"),
			timeout_secs: env.parse("WARDEN_REBAC_TIMEOUT_SECS", "u64")?,
			max_attempts: env.parse("WARDEN_REBAC_MAX_ATTEMPTS", "u32")?,
			list_relation: env.var("WARDEN_REBAC_LIST_RELATION"),
		}),
		features: Some(FeaturesConfigLayer {
			enabled: env.bool("WARDEN_FEATURES_ENABLED"),
			fallback: env.parse::<FeatureFallback>("WARDEN_FEATURES_FALLBACK", "fallback")?,
		}),
		shutdown: Some(ShutdownConfigLayer {
			poll_interval_ms: env.parse("WARDEN_SHUTDOWN_POLL_INTERVAL_MS", "u64")?,
			grace_period_secs: env.parse("WARDEN_SHUTDOWN_GRACE_PERIOD_SECS", "u64")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("WARDEN_LOG_LEVEL"),
			format: env.parse::<LogFormat>("WARDEN_LOG_FORMAT", "log format")?,
		}),
	})
}
