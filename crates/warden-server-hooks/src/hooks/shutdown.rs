// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use warden_authz::{AuthorizationContext, Mutation};
use warden_server_db::{MutationTx, ShutdownGate};

use crate::chain::{MutationHandler, MutationHook, MutationOutcome, SharedHandler};
use crate::error::{HookError, Result};

/// Refuses mutations once shutdown has begun.
#[derive(Debug, Clone)]
pub struct ShutdownCheck {
	gate: ShutdownGate,
}

impl ShutdownCheck {
	pub fn new(gate: ShutdownGate) -> Self {
		Self { gate }
	}
}

impl MutationHook for ShutdownCheck {
	fn name(&self) -> &'static str {
		"shutdown_check"
	}

	fn wrap(&self, next: SharedHandler) -> SharedHandler {
		Arc::new(Handler {
			gate: self.gate.clone(),
			next,
		})
	}
}

struct Handler {
	gate: ShutdownGate,
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
		if self.gate.is_set() {
			tracing::debug!(entity_type = %mutation.entity_type, "mutation refused during shutdown");
			return Err(HookError::ShuttingDown);
		}
		self.next.handle(ctx, tx, mutation).await
	}
}
