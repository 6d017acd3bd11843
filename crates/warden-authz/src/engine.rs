// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation engine.
//!
//! Evaluation is closed-world: the composed chain is walked in order, the first
//! `Allow` or `Deny` wins and a chain that only abstains is a denial. The
//! context's allow-all flag is the only bypass.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::context::AuthorizationContext;
use crate::decision::PolicyDecision;
use crate::error::{AuthzError, Result};
use crate::operation::OperationDescriptor;
use crate::policy::PolicyRegistry;

#[derive(Debug, Clone)]
pub struct PolicyEngine {
	registry: Arc<PolicyRegistry>,
}

impl PolicyEngine {
	pub fn new(registry: PolicyRegistry) -> Self {
		Self {
			registry: Arc::new(registry),
		}
	}

	pub fn registry(&self) -> &PolicyRegistry {
		&self.registry
	}

	/// Authorize `op`, returning the denial error if it is not allowed.
	#[instrument(
		level = "debug",
		skip(self, ctx, op),
		fields(entity_type = %op.entity_type, kind = %op.kind)
	)]
	pub async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<()> {
		match self.decide(ctx, op).await? {
			PolicyDecision::Allow => Ok(()),
			PolicyDecision::Deny(err) => Err(err),
			PolicyDecision::Abstain => Err(AuthzError::denied(
				op.entity_type,
				op.kind.as_str(),
				"no rule allowed the operation",
			)),
		}
	}

	/// Walk the chain and return the terminal decision.
	///
	/// Never returns [`PolicyDecision::Abstain`]: an exhausted chain is a denial.
	pub async fn decide(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		if ctx.is_cancelled() {
			return Err(AuthzError::Cancelled);
		}

		if ctx.allows_all() {
			debug!(entity_type = %op.entity_type, kind = %op.kind, "allow-all context, skipping rules");
			return Ok(PolicyDecision::Allow);
		}

		for rule in self.registry.chain(op.entity_type, op.kind) {
			match rule.evaluate(ctx, op).await? {
				PolicyDecision::Abstain => continue,
				PolicyDecision::Allow => {
					debug!(
						entity_type = %op.entity_type,
						kind = %op.kind,
						rule = rule.name(),
						"policy allowed"
					);
					return Ok(PolicyDecision::Allow);
				}
				PolicyDecision::Deny(err) => {
					debug!(
						entity_type = %op.entity_type,
						kind = %op.kind,
						rule = rule.name(),
						error = %err,
						"policy denied"
					);
					return Ok(PolicyDecision::Deny(err));
				}
			}
		}

		debug!(entity_type = %op.entity_type, kind = %op.kind, "chain exhausted, denying");
		Ok(PolicyDecision::Deny(AuthzError::denied(
			op.entity_type,
			op.kind.as_str(),
			"no rule allowed the operation",
		)))
	}
}
