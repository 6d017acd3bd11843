// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Building a store from loaded configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use warden_features::GateFallback;
use warden_rebac::{FgaConfig, FgaHttpClient, RetryConfig};
use warden_server_config::{FeatureFallback, RebacConfig, WardenConfig};
use warden_server_db::{create_pool, run_migrations};

use crate::error::Result;
use crate::schema::SchemaRegistry;
use crate::store::{AuthorizedStore, StoreBuilder};

pub fn gate_fallback(fallback: FeatureFallback) -> GateFallback {
	match fallback {
		FeatureFallback::Partial => GateFallback::PartialResponse,
		FeatureFallback::Deny => GateFallback::HardDeny,
	}
}

pub fn fga_config(config: &RebacConfig) -> FgaConfig {
	let mut fga = FgaConfig::new(config.url.clone(), config.store_id.clone());
	fga.model_id = config.model_id.clone();
	fga.api_token = config.api_token.clone();
	fga.timeout = Duration::from_secs(config.timeout_secs);
	fga.retry = RetryConfig {
		max_attempts: config.max_attempts,
		..RetryConfig::default()
	};
	fga
}

/// Open storage, run migrations and configure a store builder.
///
/// The caller may add workers before building.
#[tracing::instrument(skip_all, fields(database = %config.database.url))]
pub async fn builder_from_config(
	config: &WardenConfig,
	schemas: SchemaRegistry,
) -> Result<StoreBuilder> {
	let pool = create_pool(&config.database.url, config.database.max_connections).await?;
	run_migrations(&pool).await?;

	let mut builder = AuthorizedStore::builder(pool, schemas)
		.features_enabled(config.features.enabled)
		.feature_fallback(gate_fallback(config.features.fallback))
		.poll_interval(config.shutdown.poll_interval())
		.grace_period(config.shutdown.grace_period());

	match &config.rebac {
		Some(rebac) => {
			let client = FgaHttpClient::new(fga_config(rebac))?;
			info!(rebac = %rebac, "relationship service configured");
			builder = builder
				.rebac(Arc::new(client))
				.list_relation(rebac.list_relation.clone());
		}
		None => warn!("no relationship service configured, relationship rows are hidden"),
	}

	Ok(builder)
}

/// Build a store from configuration with no background workers.
pub async fn bootstrap(config: &WardenConfig, schemas: SchemaRegistry) -> Result<AuthorizedStore> {
	builder_from_config(config, schemas).await?.build()
}
