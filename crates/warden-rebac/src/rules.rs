// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy rules backed by ReBAC checks.

use std::sync::Arc;

use async_trait::async_trait;
use warden_authz::{
	AuthorizationContext, AuthzError, EntityType, OperationDescriptor, OperationKind,
	PolicyDecision, PolicyRule, Result,
};

use crate::client::{AccessCheck, RebacClient};

/// Allows an operation when the subject holds `relation` on every object it
/// targets, and denies it when any check fails.
///
/// Abstains for operations naming no object (creates, unfiltered reads) and
/// for contexts without a subject.
pub struct AllowIfRelation {
	client: Arc<dyn RebacClient>,
	relation: String,
}

impl AllowIfRelation {
	pub fn new(client: Arc<dyn RebacClient>, relation: impl Into<String>) -> Self {
		Self {
			client,
			relation: relation.into(),
		}
	}
}

#[async_trait]
impl PolicyRule for AllowIfRelation {
	fn name(&self) -> &'static str {
		"allow_if_relation"
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		let Some(subject) = ctx.subject() else {
			return Ok(PolicyDecision::Abstain);
		};

		let ids = op.target_ids();
		if ids.is_empty() {
			return Ok(PolicyDecision::Abstain);
		}

		for id in ids {
			let check = AccessCheck::new(
				subject.id.as_str(),
				subject.subject_type,
				self.relation.as_str(),
				op.entity_type,
				id,
			);
			let allowed = ctx
				.guard(self.client.check_access(&check))
				.await?
				.map_err(AuthzError::from)?;
			if !allowed {
				return Ok(PolicyDecision::Deny(AuthzError::denied(
					op.entity_type,
					self.relation.as_str(),
					"subject lacks relation on target",
				)));
			}
		}

		Ok(PolicyDecision::Allow)
	}
}

/// Allows an operation when the subject holds `relation` on the owning
/// organization.
///
/// Creates without an explicit owner are checked against the active
/// organization. Abstains when no owner can be determined or the check fails.
pub struct AllowIfOrgRelation {
	client: Arc<dyn RebacClient>,
	relation: String,
}

impl AllowIfOrgRelation {
	pub fn new(client: Arc<dyn RebacClient>, relation: impl Into<String>) -> Self {
		Self {
			client,
			relation: relation.into(),
		}
	}

	/// `can_view` on the organization.
	pub fn viewer(client: Arc<dyn RebacClient>) -> Self {
		Self::new(client, "can_view")
	}

	/// `can_edit` on the organization.
	pub fn editor(client: Arc<dyn RebacClient>) -> Self {
		Self::new(client, "can_edit")
	}
}

#[async_trait]
impl PolicyRule for AllowIfOrgRelation {
	fn name(&self) -> &'static str {
		"allow_if_org_relation"
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		let Some(subject) = ctx.subject() else {
			return Ok(PolicyDecision::Abstain);
		};

		let owner = op.resolved_owner_id().or_else(|| match op.kind {
			OperationKind::Create => ctx.active_organization().cloned(),
			_ => None,
		});
		let Some(owner) = owner else {
			return Ok(PolicyDecision::Abstain);
		};

		let check = AccessCheck::new(
			subject.id.as_str(),
			subject.subject_type,
			self.relation.as_str(),
			EntityType::ORGANIZATION,
			owner.as_str(),
		);
		let allowed = ctx
			.guard(self.client.check_access(&check))
			.await?
			.map_err(AuthzError::from)?;

		Ok(if allowed {
			PolicyDecision::Allow
		} else {
			PolicyDecision::Abstain
		})
	}
}
