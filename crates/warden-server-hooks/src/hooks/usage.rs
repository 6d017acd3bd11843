// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Usage counting for metered entity types.
//!
//! Counters move inside the mutation's transaction, so a rolled back mutation
//! leaves them untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use warden_authz::{AuthorizationContext, Mutation, MutationOp, OrgId};
use warden_server_db::{MutationTx, RecordRepository, UsageRepository};

use crate::chain::{MutationHandler, MutationHook, MutationOutcome, SharedHandler};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct UsageCount {
	resource: String,
}

impl UsageCount {
	pub fn new(resource: impl Into<String>) -> Self {
		Self {
			resource: resource.into(),
		}
	}
}

impl MutationHook for UsageCount {
	fn name(&self) -> &'static str {
		"usage_count"
	}

	fn wrap(&self, next: SharedHandler) -> SharedHandler {
		Arc::new(Handler {
			resource: self.resource.clone(),
			next,
		})
	}
}

struct Handler {
	resource: String,
	next: SharedHandler,
}

impl Handler {
	async fn adjust_all(&self, tx: &mut MutationTx, deltas: BTreeMap<OrgId, i64>) -> Result<()> {
		for (org_id, delta) in deltas {
			UsageRepository::adjust(tx, &org_id, &self.resource, delta).await?;
			tracing::debug!(org_id = %org_id, resource = %self.resource, delta, "usage adjusted");
		}
		Ok(())
	}
}

#[async_trait]
impl MutationHandler for Handler {
	async fn handle(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome> {
		let removing = match mutation.op {
			MutationOp::Create => false,
			MutationOp::Delete => true,
			MutationOp::Update => tx.markers().soft_delete,
		};

		if mutation.op == MutationOp::Create {
			let owner = mutation.owner_id.clone();
			let outcome = self.next.handle(ctx, tx, mutation).await?;
			match owner {
				Some(org_id) if !outcome.ids.is_empty() => {
					let deltas = BTreeMap::from([(org_id, outcome.ids.len() as i64)]);
					self.adjust_all(tx, deltas).await?;
				}
				Some(_) => {}
				None => tracing::debug!(resource = %self.resource, "create without tenant, not counted"),
			}
			return Ok(outcome);
		}

		if !removing {
			return self.next.handle(ctx, tx, mutation).await;
		}

		let owners: BTreeMap<String, Option<OrgId>> = RecordRepository::owners(tx, &mutation)
			.await?
			.into_iter()
			.collect();
		let outcome = self.next.handle(ctx, tx, mutation).await?;

		let mut deltas: BTreeMap<OrgId, i64> = BTreeMap::new();
		for id in &outcome.ids {
			if let Some(Some(org_id)) = owners.get(id) {
				*deltas.entry(org_id.clone()).or_default() -= 1;
			}
		}
		self.adjust_all(tx, deltas).await?;
		Ok(outcome)
	}
}
