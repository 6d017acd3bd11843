// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ReBAC service configuration.
//!
//! The section is optional: without both `url` and `store_id` the server runs
//! without a ReBAC client and every relation-based rule abstains.

use serde::Deserialize;

fn default_timeout_secs() -> u64 {
	5
}

fn default_max_attempts() -> u32 {
	3
}

fn default_list_relation() -> String {
	"can_view".to_string()
}

/// ReBAC configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct RebacConfig {
	pub url: String,
	pub store_id: String,
	pub model_id: Option<String>,
	pub api_token: Option<String>,
	pub timeout_secs: u64,
	pub max_attempts: u32,
	pub list_relation: String,
}

/// ReBAC configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RebacConfigLayer {
	pub url: Option<String>,
	pub store_id: Option<String>,
	pub model_id: Option<String>,
	pub api_token: Option<String>,
	pub timeout_secs: Option<u64>,
	pub max_attempts: Option<u32>,
	pub list_relation: Option<String>,
}

impl RebacConfigLayer {
	pub fn merge(&mut self, other: RebacConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.store_id.is_some() {
			self.store_id = other.store_id;
		}
		if other.model_id.is_some() {
			self.model_id = other.model_id;
		}
		if other.api_token.is_some() {
			self.api_token = other.api_token;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
		if other.list_relation.is_some() {
			self.list_relation = other.list_relation;
		}
	}

	/// Resolve the section, or `None` when no service is configured.
	pub fn finalize(self) -> Option<RebacConfig> {
		let url = self.url?;
		let store_id = self.store_id?;
		Some(RebacConfig {
			url,
			store_id,
			model_id: self.model_id,
			api_token: self.api_token,
			timeout_secs: self.timeout_secs.unwrap_or_else(default_timeout_secs),
			max_attempts: self.max_attempts.unwrap_or_else(default_max_attempts),
			list_relation: self.list_relation.unwrap_or_else(default_list_relation),
		})
	}
}

impl std::fmt::Display for RebacConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} (store {})", self.url, self.store_id)
	}
}
