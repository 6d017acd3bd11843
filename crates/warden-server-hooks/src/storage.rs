// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use warden_authz::{AuthorizationContext, Mutation};
use warden_server_db::{MutationTx, RecordRepository};

use crate::chain::{MutationHandler, MutationOutcome};
use crate::error::Result;

/// The end of every chain: writes the mutation inside the transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageHandler;

#[async_trait]
impl MutationHandler for StorageHandler {
	async fn handle(
		&self,
		_ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome> {
		let ids = RecordRepository::apply(tx, &mutation).await?;
		tracing::debug!(
			entity_type = %mutation.entity_type,
			op = ?mutation.op,
			affected = ids.len(),
			"mutation stored"
		);
		Ok(MutationOutcome {
			entity_type: mutation.entity_type,
			op: mutation.op,
			ids,
		})
	}
}
