// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use warden_authz::{
	AuthorizationContext, AuthzError, OperationDescriptor, PolicyDecision, PolicyRule, Result,
};

use crate::gate::FeatureGate;

/// Denies mutations on entity types whose required modules the tenant lacks.
///
/// Reads are left to [`crate::FeatureGateInterceptor`], which degrades them
/// instead of failing.
#[derive(Debug, Clone)]
pub struct DenyIfMissingModules {
	gate: FeatureGate,
}

impl DenyIfMissingModules {
	pub fn new(gate: FeatureGate) -> Self {
		Self { gate }
	}
}

#[async_trait]
impl PolicyRule for DenyIfMissingModules {
	fn name(&self) -> &'static str {
		"deny_if_missing_modules"
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		if !op.kind.is_mutation() {
			return Ok(PolicyDecision::Abstain);
		}

		let check = self.gate.check_features(ctx, op.entity_type).await?;
		Ok(match check.missing_module {
			Some(module) => PolicyDecision::Deny(AuthzError::FeatureNotEnabled {
				entity_type: op.entity_type,
				module,
			}),
			None => PolicyDecision::Abstain,
		})
	}
}
