// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server configuration.
//!
//! A [`WardenConfig`] is resolved by merging [`WardenConfigLayer`]s from
//! built-in defaults, an optional TOML file and `WARDEN_*` environment
//! variables, then validating the result. [`load_config`] wires the standard
//! sources; [`load_from_sources`] takes any set of them.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WardenConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct WardenConfig {
	pub database: DatabaseConfig,
	pub rebac: Option<RebacConfig>,
	pub features: FeaturesConfig,
	pub shutdown: ShutdownConfig,
	pub logging: LoggingConfig,
}

/// Resolve configuration from defaults, `/etc/warden/server.toml` and the
/// environment, later sources overriding earlier ones.
pub fn load_config() -> Result<WardenConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WardenConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WardenConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Apply defaults to every unset field and validate.
fn finalize(layer: WardenConfigLayer) -> Result<WardenConfig, ConfigError> {
	let config = WardenConfig {
		database: layer.database.unwrap_or_default().finalize(),
		rebac: layer.rebac.and_then(|l| l.finalize()),
		features: layer.features.unwrap_or_default().finalize(),
		shutdown: layer.shutdown.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	let rebac = config
		.rebac
		.as_ref()
		.map(|r| r.to_string())
		.unwrap_or_else(|| "disabled".to_string());
	info!(
		database = %config.database.url,
		rebac = %rebac,
		features_enabled = config.features.enabled,
		feature_fallback = %config.features.fallback,
		grace_period_secs = config.shutdown.grace_period_secs,
		"Warden configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &WardenConfig) -> Result<(), ConfigError> {
	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be at least 1".to_string(),
		));
	}
	if config.shutdown.poll_interval_ms == 0 {
		return Err(ConfigError::Validation(
			"shutdown.poll_interval_ms must be greater than zero".to_string(),
		));
	}
	if let Some(rebac) = &config.rebac {
		if rebac.max_attempts == 0 {
			return Err(ConfigError::Validation(
				"rebac.max_attempts must be at least 1".to_string(),
			));
		}
		if rebac.list_relation.trim().is_empty() {
			return Err(ConfigError::Validation(
				"rebac.list_relation must not be empty".to_string(),
			));
		}
	}

	Ok(())
}
