// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant hierarchy expansion.
//!
//! A user in a child tenant also sees memberships rooted in the ancestors of
//! that tenant. The hierarchy itself is owned by storage; this module only walks
//! it through [`TenantHierarchy`].

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use tracing::instrument;
use warden_authz::{AuthorizationContext, AuthzError, OrgId};

/// Read-only access to tenant parent links.
#[async_trait]
pub trait TenantHierarchy: Send + Sync {
	async fn parents_of(&self, org_id: &OrgId) -> Result<Vec<OrgId>, AuthzError>;
}

/// Every ancestor of every tenant in `child_ids`, each listed once in
/// discovery order.
///
/// A visited set bounds the walk, so a malformed hierarchy containing a cycle
/// still terminates. A child that is also an ancestor of another child is
/// included.
#[instrument(skip(ctx, hierarchy, child_ids), fields(children = child_ids.len()))]
pub async fn all_parent_tenant_ids(
	ctx: &AuthorizationContext,
	hierarchy: &dyn TenantHierarchy,
	child_ids: &[OrgId],
) -> Result<Vec<OrgId>, AuthzError> {
	let mut expanded: HashSet<OrgId> = HashSet::new();
	let mut seen: HashSet<OrgId> = HashSet::new();
	let mut ancestors = Vec::new();
	let mut queue: VecDeque<OrgId> = child_ids.iter().cloned().collect();

	while let Some(org_id) = queue.pop_front() {
		if !expanded.insert(org_id.clone()) {
			continue;
		}

		let parents = ctx.guard(hierarchy.parents_of(&org_id)).await??;
		for parent in parents {
			if seen.insert(parent.clone()) {
				ancestors.push(parent.clone());
			}
			if !expanded.contains(&parent) {
				queue.push_back(parent);
			}
		}
	}

	Ok(ancestors)
}
