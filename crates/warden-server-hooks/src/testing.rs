// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warden_authz::{AuthorizationContext, Mutation};
use warden_server_db::testing::create_migrated_pool;
use warden_server_db::{MutationTx, SqliteDriver, StorageDriver};

use crate::chain::{MutationHandler, MutationHook, MutationOutcome, SharedHandler};
use crate::error::Result;

pub async fn migrated_driver() -> Arc<dyn StorageDriver> {
	Arc::new(SqliteDriver::new(create_migrated_pool().await.unwrap()))
}

/// Records entry and exit around the next handler.
pub struct RecordingHook {
	name: &'static str,
	log: Arc<Mutex<Vec<String>>>,
}

impl RecordingHook {
	pub fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
		Self { name, log }
	}
}

impl MutationHook for RecordingHook {
	fn name(&self) -> &'static str {
		self.name
	}

	fn wrap(&self, next: SharedHandler) -> SharedHandler {
		Arc::new(Recording {
			name: self.name,
			log: self.log.clone(),
			next,
		})
	}
}

struct Recording {
	name: &'static str,
	log: Arc<Mutex<Vec<String>>>,
	next: SharedHandler,
}

#[async_trait]
impl MutationHandler for Recording {
	async fn handle(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome> {
		self.log.lock().unwrap().push(format!("{}:before", self.name));
		let out = self.next.handle(ctx, tx, mutation).await;
		self.log.lock().unwrap().push(format!("{}:after", self.name));
		out
	}
}

/// Captures the mutation that reaches it and reports its ids.
#[derive(Default)]
pub struct CaptureTerminal {
	pub seen: Mutex<Vec<Mutation>>,
}

#[async_trait]
impl MutationHandler for CaptureTerminal {
	async fn handle(
		&self,
		_ctx: &AuthorizationContext,
		_tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome> {
		let outcome = MutationOutcome {
			entity_type: mutation.entity_type,
			op: mutation.op,
			ids: mutation.ids.clone(),
		};
		self.seen.lock().unwrap().push(mutation);
		Ok(outcome)
	}
}

impl CaptureTerminal {
	pub fn last(&self) -> Mutation {
		self.seen.lock().unwrap().last().cloned().unwrap()
	}
}
