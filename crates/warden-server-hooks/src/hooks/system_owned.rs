// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use warden_authz::{fields, AuthorizationContext, Mutation, MutationOp};
use warden_server_db::MutationTx;

use crate::chain::{MutationHandler, MutationHook, MutationOutcome, SharedHandler};
use crate::error::{HookError, Result};

/// Marks records created by the system and keeps the mark fixed afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOwned;

impl MutationHook for SystemOwned {
	fn name(&self) -> &'static str {
		"system_owned"
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
		mut mutation: Mutation,
	) -> Result<MutationOutcome> {
		match mutation.op {
			MutationOp::Create if ctx.is_system_actor() => {
				mutation.set_field(fields::SYSTEM_OWNED, true);
			}
			MutationOp::Create => {
				if mutation.field(fields::SYSTEM_OWNED) == Some(&Value::Bool(true)) {
					return Err(HookError::SystemOwnedImmutable {
						entity_type: mutation.entity_type,
					});
				}
				mutation.fields.remove(fields::SYSTEM_OWNED);
			}
			MutationOp::Update if mutation.touches(fields::SYSTEM_OWNED) => {
				tracing::debug!(entity_type = %mutation.entity_type, "attempt to change system_owned rejected");
				return Err(HookError::SystemOwnedImmutable {
					entity_type: mutation.entity_type,
				});
			}
			_ => {}
		}
		self.next.handle(ctx, tx, mutation).await
	}
}
