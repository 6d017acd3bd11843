// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shutdown drain configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_GRACE_PERIOD_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ShutdownConfig {
	pub poll_interval_ms: u64,
	pub grace_period_secs: u64,
}

impl ShutdownConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn grace_period(&self) -> Duration {
		Duration::from_secs(self.grace_period_secs)
	}
}

impl Default for ShutdownConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShutdownConfigLayer {
	pub poll_interval_ms: Option<u64>,
	pub grace_period_secs: Option<u64>,
}

impl ShutdownConfigLayer {
	pub fn merge(&mut self, other: ShutdownConfigLayer) {
		if other.poll_interval_ms.is_some() {
			self.poll_interval_ms = other.poll_interval_ms;
		}
		if other.grace_period_secs.is_some() {
			self.grace_period_secs = other.grace_period_secs;
		}
	}

	pub fn finalize(self) -> ShutdownConfig {
		ShutdownConfig {
			poll_interval_ms: self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
			grace_period_secs: self.grace_period_secs.unwrap_or(DEFAULT_GRACE_PERIOD_SECS),
		}
	}
}
