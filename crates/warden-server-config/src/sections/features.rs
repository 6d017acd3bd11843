// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Module gate configuration.

use serde::Deserialize;

/// How a read of an unlicensed entity is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureFallback {
	#[default]
	Partial,
	Deny,
}

impl std::str::FromStr for FeatureFallback {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"partial" => Ok(Self::Partial),
			"deny" => Ok(Self::Deny),
			other => Err(format!("expected 'partial' or 'deny', got '{other}'")),
		}
	}
}

impl std::fmt::Display for FeatureFallback {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Partial => write!(f, "partial"),
			Self::Deny => write!(f, "deny"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturesConfig {
	pub enabled: bool,
	pub fallback: FeatureFallback,
}

impl Default for FeaturesConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			fallback: FeatureFallback::Partial,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeaturesConfigLayer {
	pub enabled: Option<bool>,
	pub fallback: Option<FeatureFallback>,
}

impl FeaturesConfigLayer {
	pub fn merge(&mut self, other: FeaturesConfigLayer) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.fallback.is_some() {
			self.fallback = other.fallback;
		}
	}

	pub fn finalize(self) -> FeaturesConfig {
		let defaults = FeaturesConfig::default();
		FeaturesConfig {
			enabled: self.enabled.unwrap_or(defaults.enabled),
			fallback: self.fallback.unwrap_or(defaults.fallback),
		}
	}
}
