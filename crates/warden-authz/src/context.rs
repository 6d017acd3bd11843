// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request authorization context.
//!
//! An [`AuthorizationContext`] is built once per request by the transport layer
//! and passed by reference through every stage of the pipeline. It is immutable:
//! internal sub-operations that need elevated access derive a child context with
//! [`AuthorizationContext::with_allow_all`] instead of mutating the parent.
//!
//! The context deliberately does not implement `Deserialize`; the allow-all flag
//! must never be derivable from end-user input.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{AuthzError, Result};
use crate::types::{EntityType, OrgId, SubjectId, SubjectType};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
	pub id: SubjectId,
	pub subject_type: SubjectType,
	pub email: Option<String>,
}

impl Subject {
	pub fn user(id: impl Into<SubjectId>) -> Self {
		Self {
			id: id.into(),
			subject_type: SubjectType::User,
			email: None,
		}
	}

	pub fn service(id: impl Into<SubjectId>) -> Self {
		Self {
			id: id.into(),
			subject_type: SubjectType::Service,
			email: None,
		}
	}

	pub fn api_token(id: impl Into<SubjectId>) -> Self {
		Self {
			id: id.into(),
			subject_type: SubjectType::ApiToken,
			email: None,
		}
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}
}

/// Kinds of single-use bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopedTokenKind {
	SignUp,
	PasswordReset,
	EmailVerify,
	Invite,
}

/// A single-use token restricting the operation to one entity type and,
/// optionally, one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedToken {
	pub kind: ScopedTokenKind,
	pub value: String,
	pub entity_type: EntityType,
	pub organization_id: Option<OrgId>,
}

impl ScopedToken {
	pub fn new(kind: ScopedTokenKind, value: impl Into<String>, entity_type: EntityType) -> Self {
		Self {
			kind,
			value: value.into(),
			entity_type,
			organization_id: None,
		}
	}

	pub fn for_organization(mut self, org_id: OrgId) -> Self {
		self.organization_id = Some(org_id);
		self
	}

	/// Returns true if this token permits an operation on `entity_type` owned by `owner`.
	///
	/// A tenant-scoped token never covers a target whose owner is unknown.
	pub fn permits(&self, entity_type: EntityType, owner: Option<&OrgId>) -> bool {
		if self.entity_type != entity_type {
			return false;
		}
		match (&self.organization_id, owner) {
			(Some(scoped), Some(owner)) => scoped == owner,
			(Some(_), None) => false,
			(None, _) => true,
		}
	}
}

/// Markers set only by internal call paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextFlag {
	/// The request is creating a new organization; modules are not provisioned yet.
	OrganizationCreation,
	/// The request is syncing subscription state and must bypass module checks.
	SubscriptionSync,
	/// Deletes are hard deletes and reads include soft-deleted rows.
	SkipSoftDelete,
}

/// Ambient authorization data for a single request.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
	subject: Option<Subject>,
	organization_ids: Vec<OrgId>,
	active_organization: Option<OrgId>,
	allow_all: bool,
	scoped_token: Option<ScopedToken>,
	flags: BTreeSet<ContextFlag>,
	cancellation: CancellationToken,
	deadline: Option<Instant>,
}

impl AuthorizationContext {
	/// Context for an authenticated subject with no memberships yet.
	pub fn for_subject(subject: Subject) -> Self {
		Self {
			subject: Some(subject),
			..Self::anonymous()
		}
	}

	/// Context with no resolvable subject.
	pub fn anonymous() -> Self {
		Self {
			subject: None,
			organization_ids: Vec::new(),
			active_organization: None,
			allow_all: false,
			scoped_token: None,
			flags: BTreeSet::new(),
			cancellation: CancellationToken::new(),
			deadline: None,
		}
	}

	/// Context for trusted internal call paths (boot tasks, migrations, workers).
	pub fn internal() -> Self {
		Self {
			allow_all: true,
			..Self::anonymous()
		}
	}

	/// Derive a child context that bypasses policy evaluation.
	///
	/// Only internal sub-operations may call this. The child shares the parent's
	/// cancellation token and deadline.
	pub fn with_allow_all(&self) -> Self {
		let mut child = self.clone();
		child.allow_all = true;
		child
	}

	/// Derive a child context carrying an internal marker.
	pub fn with_flag(&self, flag: ContextFlag) -> Self {
		let mut child = self.clone();
		child.flags.insert(flag);
		child
	}

	/// Set the tenant memberships, dropping duplicates while keeping first occurrence order.
	pub fn with_organizations(mut self, ids: impl IntoIterator<Item = OrgId>) -> Self {
		let mut seen = BTreeSet::new();
		self.organization_ids = ids
			.into_iter()
			.filter(|id| seen.insert(id.clone()))
			.collect();
		self
	}

	/// Set the currently-authorized tenant.
	pub fn with_active_organization(mut self, org_id: OrgId) -> Self {
		if !self.organization_ids.contains(&org_id) {
			self.organization_ids.push(org_id.clone());
		}
		self.active_organization = Some(org_id);
		self
	}

	pub fn with_scoped_token(mut self, token: ScopedToken) -> Self {
		self.scoped_token = Some(token);
		self
	}

	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;
		self
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(deadline);
		self
	}

	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn subject(&self) -> Option<&Subject> {
		self.subject.as_ref()
	}

	/// Returns the subject or [`AuthzError::NotAuthenticated`].
	pub fn require_subject(&self) -> Result<&Subject> {
		self.subject.as_ref().ok_or(AuthzError::NotAuthenticated)
	}

	pub fn is_authenticated(&self) -> bool {
		self.subject.is_some()
	}

	pub fn organization_ids(&self) -> &[OrgId] {
		&self.organization_ids
	}

	pub fn is_member_of(&self, org_id: &OrgId) -> bool {
		self.organization_ids.contains(org_id)
	}

	/// The currently-authorized tenant.
	///
	/// Falls back to the only membership when exactly one organization is present.
	pub fn active_organization(&self) -> Option<&OrgId> {
		self.active_organization.as_ref().or(match self.organization_ids.as_slice() {
			[only] => Some(only),
			_ => None,
		})
	}

	pub fn allows_all(&self) -> bool {
		self.allow_all
	}

	pub fn scoped_token(&self) -> Option<&ScopedToken> {
		self.scoped_token.as_ref()
	}

	pub fn has_flag(&self, flag: ContextFlag) -> bool {
		self.flags.contains(&flag)
	}

	pub fn skips_soft_delete(&self) -> bool {
		self.has_flag(ContextFlag::SkipSoftDelete)
	}

	/// Returns true for callers recognised as the system itself.
	pub fn is_system_actor(&self) -> bool {
		self.allow_all
			|| matches!(
				self.subject.as_ref().map(|s| s.subject_type),
				Some(SubjectType::Service)
			)
	}

	/// The acting subject ID used for audit attribution.
	pub fn actor_id(&self) -> Option<&str> {
		self.subject.as_ref().map(|s| s.id.as_str())
	}

	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancellation
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancellation.is_cancelled()
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Run `fut` bounded by this context's cancellation token and deadline.
	pub async fn guard<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = T>,
	{
		if self.cancellation.is_cancelled() {
			return Err(AuthzError::Cancelled);
		}

		match self.deadline {
			Some(deadline) => {
				tokio::select! {
					biased;
					_ = self.cancellation.cancelled() => Err(AuthzError::Cancelled),
					_ = tokio::time::sleep_until(deadline) => Err(AuthzError::DeadlineExceeded),
					out = fut => Ok(out),
				}
			}
			None => {
				tokio::select! {
					biased;
					_ = self.cancellation.cancelled() => Err(AuthzError::Cancelled),
					out = fut => Ok(out),
				}
			}
		}
	}
}
