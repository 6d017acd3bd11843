// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Soft deletion.
//!
//! A delete becomes an update stamping `deleted_at` and `deleted_by`, and the
//! transaction is marked so hooks further in can tell it apart from an
//! ordinary update. Contexts carrying `SkipSoftDelete` purge for real.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use warden_authz::{fields, AuthorizationContext, Mutation, MutationOp};
use warden_server_db::MutationTx;

use crate::chain::{MutationHandler, MutationHook, MutationOutcome, SharedHandler};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftDelete;

impl MutationHook for SoftDelete {
	fn name(&self) -> &'static str {
		"soft_delete"
	}

	fn wrap(&self, next: SharedHandler) -> SharedHandler {
		Arc::new(Handler { next })
	}
}

struct Handler {
	next: SharedHandler,
}

#[async_trait]
impl MutationHandler for Handler {
	async fn handle(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome> {
		if mutation.op != MutationOp::Delete || ctx.skips_soft_delete() {
			return self.next.handle(ctx, tx, mutation).await;
		}

		let actor = ctx.actor_id().unwrap_or(fields::UNKNOWN_ACTOR).to_string();
		let rewritten = mutation
			.into_update()
			.set(fields::DELETED_AT, Utc::now().to_rfc3339())
			.set(fields::DELETED_BY, actor);
		tx.markers_mut().soft_delete = true;
		tracing::debug!(entity_type = %rewritten.entity_type, ids = ?rewritten.ids, "delete rewritten to soft delete");

		self.next.handle(ctx, tx, rewritten).await
	}
}
