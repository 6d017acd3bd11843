// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The process-wide shutdown flag and the driver decorator that honours it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;

use crate::driver::{ConnectionPool, MutationTx, StorageDriver};
use crate::error::{DbError, Result};
use crate::statement::Statement;

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const CLOSED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
	Running,
	Draining,
	Closed,
}

/// Shared shutdown state: `Running -> Draining -> Closed`.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownGate {
	state: Arc<AtomicU8>,
}

impl ShutdownGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Start draining. Returns `true` only for the call that flipped the flag.
	pub fn begin(&self) -> bool {
		let flipped = self
			.state
			.compare_exchange(RUNNING, DRAINING, Ordering::SeqCst, Ordering::SeqCst)
			.is_ok();
		if flipped {
			tracing::info!("shutdown started, rejecting new operations");
		}
		flipped
	}

	/// Back to `Running`. Tests only need this, servers never call it.
	pub fn reset(&self) {
		self.state.store(RUNNING, Ordering::SeqCst);
	}

	pub fn is_set(&self) -> bool {
		self.state.load(Ordering::SeqCst) != RUNNING
	}

	pub fn state(&self) -> ShutdownState {
		match self.state.load(Ordering::SeqCst) {
			RUNNING => ShutdownState::Running,
			DRAINING => ShutdownState::Draining,
			_ => ShutdownState::Closed,
		}
	}

	/// `Err(ShuttingDown)` once shutdown has begun.
	pub fn check(&self) -> Result<()> {
		if self.is_set() {
			Err(DbError::ShuttingDown)
		} else {
			Ok(())
		}
	}

	pub(crate) fn mark_closed(&self) {
		self.state.store(CLOSED, Ordering::SeqCst);
	}
}

/// Rejects new statements and transactions once the gate is set.
pub struct GatedDriver<D> {
	inner: D,
	gate: ShutdownGate,
}

impl<D: StorageDriver> GatedDriver<D> {
	pub fn new(inner: D, gate: ShutdownGate) -> Self {
		Self { inner, gate }
	}

	pub fn gate(&self) -> &ShutdownGate {
		&self.gate
	}

	pub fn inner(&self) -> &D {
		&self.inner
	}
}

#[async_trait]
impl<D: StorageDriver> ConnectionPool for GatedDriver<D> {
	fn in_use_count(&self) -> u32 {
		self.inner.in_use_count()
	}

	async fn close(&self) {
		self.inner.close().await
	}

	fn is_closed(&self) -> bool {
		self.inner.is_closed()
	}
}

#[async_trait]
impl<D: StorageDriver> StorageDriver for GatedDriver<D> {
	async fn execute(&self, stmt: &Statement) -> Result<u64> {
		self.gate.check()?;
		self.inner.execute(stmt).await
	}

	async fn fetch(&self, stmt: &Statement) -> Result<Vec<SqliteRow>> {
		self.gate.check()?;
		self.inner.fetch(stmt).await
	}

	async fn begin(&self) -> Result<MutationTx> {
		self.gate.check()?;
		self.inner.begin().await
	}
}
