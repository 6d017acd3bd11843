// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in policy rules.
//!
//! Rules are small, stateless decision functions. They are composed into ordered
//! chains by [`crate::PolicyRegistryBuilder`] and evaluated by
//! [`crate::PolicyEngine`]. A rule that has nothing to say about an operation
//! returns [`PolicyDecision::Abstain`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::AuthorizationContext;
use crate::decision::PolicyDecision;
use crate::error::{AuthzError, Result};
use crate::operation::OperationDescriptor;
use crate::types::{OperationKind, OrgId};

/// A single decision function in a policy chain.
#[async_trait]
pub trait PolicyRule: Send + Sync {
	/// Name used in decision logs.
	fn name(&self) -> &'static str;

	/// Decide on `op`. Errors are reserved for failures of external calls.
	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision>;

	/// Returns true if this rule denies every operation it sees.
	fn is_unconditional_deny(&self) -> bool {
		false
	}
}

pub type SharedRule = Arc<dyn PolicyRule>;

/// Allows every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

#[async_trait]
impl PolicyRule for AlwaysAllow {
	fn name(&self) -> &'static str {
		"always_allow"
	}

	async fn evaluate(
		&self,
		_ctx: &AuthorizationContext,
		_op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		Ok(PolicyDecision::Allow)
	}
}

/// Denies every operation. Terminates every post policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDeny;

#[async_trait]
impl PolicyRule for AlwaysDeny {
	fn name(&self) -> &'static str {
		"always_deny"
	}

	async fn evaluate(
		&self,
		_ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		Ok(PolicyDecision::Deny(AuthzError::denied(
			op.entity_type,
			op.kind.as_str(),
			"no rule allowed the operation",
		)))
	}

	fn is_unconditional_deny(&self) -> bool {
		true
	}
}

/// Denies callers with neither a subject nor a scoped token.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyIfNotAuthenticated;

#[async_trait]
impl PolicyRule for DenyIfNotAuthenticated {
	fn name(&self) -> &'static str {
		"deny_if_not_authenticated"
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		_op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		if ctx.is_authenticated() || ctx.scoped_token().is_some() {
			Ok(PolicyDecision::Abstain)
		} else {
			Ok(PolicyDecision::Deny(AuthzError::NotAuthenticated))
		}
	}
}

/// Allows operations covered by the context's scoped token and denies any
/// operation the token does not cover.
///
/// Abstains when the context carries no token.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowIfScopedToken;

#[async_trait]
impl PolicyRule for AllowIfScopedToken {
	fn name(&self) -> &'static str {
		"allow_if_scoped_token"
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		let Some(token) = ctx.scoped_token() else {
			return Ok(PolicyDecision::Abstain);
		};

		let owner = op.resolved_owner_id();
		if token.permits(op.entity_type, owner.as_ref()) {
			Ok(PolicyDecision::Allow)
		} else {
			Ok(PolicyDecision::Deny(AuthzError::denied(
				op.entity_type,
				op.kind.as_str(),
				"scoped token does not cover this operation",
			)))
		}
	}
}

/// Allows operations whose owning tenant is one of the caller's organizations.
///
/// Creates without an explicit owner are checked against the active
/// organization, which the stamping hook will assign. Updates and deletes
/// abstain until the owner has been read back from storage.
#[derive(Debug, Clone)]
pub struct AllowIfOrgMember {
	kinds: Vec<OperationKind>,
}

impl AllowIfOrgMember {
	pub fn new(kinds: &[OperationKind]) -> Self {
		Self {
			kinds: kinds.to_vec(),
		}
	}

	pub fn all() -> Self {
		Self::new(OperationKind::all())
	}
}

#[async_trait]
impl PolicyRule for AllowIfOrgMember {
	fn name(&self) -> &'static str {
		"allow_if_org_member"
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		if !self.kinds.contains(&op.kind) {
			return Ok(PolicyDecision::Abstain);
		}

		let owner: Option<OrgId> = op.resolved_owner_id().or_else(|| match op.kind {
			OperationKind::Create => ctx.active_organization().cloned(),
			_ => None,
		});

		match owner {
			Some(owner) if ctx.is_member_of(&owner) => Ok(PolicyDecision::Allow),
			_ => Ok(PolicyDecision::Abstain),
		}
	}
}

/// Runs the wrapped rule only for the listed operation kinds.
pub struct ForKinds {
	kinds: Vec<OperationKind>,
	inner: SharedRule,
}

impl ForKinds {
	pub fn new(kinds: &[OperationKind], inner: impl PolicyRule + 'static) -> Self {
		Self {
			kinds: kinds.to_vec(),
			inner: Arc::new(inner),
		}
	}
}

#[async_trait]
impl PolicyRule for ForKinds {
	fn name(&self) -> &'static str {
		self.inner.name()
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		if self.kinds.contains(&op.kind) {
			self.inner.evaluate(ctx, op).await
		} else {
			Ok(PolicyDecision::Abstain)
		}
	}

	fn is_unconditional_deny(&self) -> bool {
		self.inner.is_unconditional_deny() && self.kinds.len() == OperationKind::all().len()
	}
}

type DecideFn =
	dyn Fn(&AuthorizationContext, &OperationDescriptor<'_>) -> PolicyDecision + Send + Sync;

/// A rule backed by a synchronous closure.
pub struct FnRule {
	name: &'static str,
	decide: Box<DecideFn>,
}

/// Wrap a closure as a [`PolicyRule`].
pub fn rule_fn<F>(name: &'static str, decide: F) -> FnRule
where
	F: Fn(&AuthorizationContext, &OperationDescriptor<'_>) -> PolicyDecision + Send + Sync + 'static,
{
	FnRule {
		name,
		decide: Box::new(decide),
	}
}

#[async_trait]
impl PolicyRule for FnRule {
	fn name(&self) -> &'static str {
		self.name
	}

	async fn evaluate(
		&self,
		ctx: &AuthorizationContext,
		op: &OperationDescriptor<'_>,
	) -> Result<PolicyDecision> {
		Ok((self.decide)(ctx, op))
	}
}
