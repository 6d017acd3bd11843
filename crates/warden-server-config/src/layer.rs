// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, FeaturesConfigLayer, LoggingConfigLayer, RebacConfigLayer,
	ShutdownConfigLayer,
};

/// Warden configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WardenConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub rebac: Option<RebacConfigLayer>,
	#[serde(default)]
	pub features: Option<FeaturesConfigLayer>,
	#[serde(default)]
	pub shutdown: Option<ShutdownConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl WardenConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: WardenConfigLayer) {
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.rebac, other.rebac, RebacConfigLayer::merge);
		merge_option(
			&mut self.features,
			other.features,
			FeaturesConfigLayer::merge,
		);
		merge_option(
			&mut self.shutdown,
			other.shutdown,
			ShutdownConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T>(target: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (target.as_mut(), other) {
		(Some(t), Some(o)) => merge(t, o),
		(None, Some(o)) => *target = Some(o),
		_ => {}
	}
}
