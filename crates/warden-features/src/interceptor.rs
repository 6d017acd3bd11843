// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use tracing::debug;
use warden_authz::{
	AuthorizationContext, AuthzError, ErrorSink, FieldError, Query, QueryInterceptor,
};

use crate::gate::{FeatureGate, GateFallback};

/// Applies the module gate to reads.
///
/// A gated read either returns nothing with a `NoAccessToModule` field error
/// or fails with `FeatureNotEnabled`, depending on the gate's fallback.
#[derive(Debug, Clone)]
pub struct FeatureGateInterceptor {
	gate: FeatureGate,
}

impl FeatureGateInterceptor {
	pub fn new(gate: FeatureGate) -> Self {
		Self { gate }
	}
}

#[async_trait]
impl QueryInterceptor for FeatureGateInterceptor {
	fn name(&self) -> &'static str {
		"feature_gate"
	}

	async fn intercept(
		&self,
		ctx: &AuthorizationContext,
		query: &mut Query,
		sink: &ErrorSink,
	) -> Result<(), AuthzError> {
		let check = self.gate.check_features(ctx, query.entity_type).await?;
		let Some(module) = check.missing_module else {
			return Ok(());
		};

		match self.gate.fallback() {
			GateFallback::HardDeny => Err(AuthzError::FeatureNotEnabled {
				entity_type: query.entity_type,
				module,
			}),
			GateFallback::PartialResponse => {
				let path = query.response_path();
				debug!(
					entity_type = %query.entity_type,
					module = %module,
					path = %path,
					"module missing, emptying result"
				);
				query.make_unsatisfiable();
				sink.push(FieldError::missing_module(path, query.entity_type, module));
				Ok(())
			}
		}
	}
}
