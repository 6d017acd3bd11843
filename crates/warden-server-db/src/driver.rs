// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The storage driver seam.
//!
//! Everything above this layer talks to storage through [`StorageDriver`], so
//! the shutdown gate can be put in front of it as a decorator
//! ([`crate::GatedDriver`]).

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::Transaction;

use crate::error::Result;
use crate::statement::Statement;

/// Pool statistics the drain loop needs.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
	/// Connections currently checked out.
	fn in_use_count(&self) -> u32;

	async fn close(&self);

	fn is_closed(&self) -> bool;
}

#[async_trait]
impl ConnectionPool for SqlitePool {
	fn in_use_count(&self) -> u32 {
		self.size().saturating_sub(self.num_idle() as u32)
	}

	async fn close(&self) {
		SqlitePool::close(self).await
	}

	fn is_closed(&self) -> bool {
		SqlitePool::is_closed(self)
	}
}

#[async_trait]
pub trait StorageDriver: ConnectionPool {
	/// Run a statement, returning the number of affected rows.
	async fn execute(&self, stmt: &Statement) -> Result<u64>;

	async fn fetch(&self, stmt: &Statement) -> Result<Vec<SqliteRow>>;

	/// Start a transaction for one mutation.
	async fn begin(&self) -> Result<MutationTx>;
}

/// Per-transaction markers set by mutation hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxMarkers {
	/// A delete was rewritten into an update of `deleted_at`.
	pub soft_delete: bool,
}

/// An open transaction carrying one mutation.
///
/// Statements on an open transaction are never gated; only `begin` is.
pub struct MutationTx {
	tx: Transaction<'static, Sqlite>,
	markers: TxMarkers,
}

impl MutationTx {
	pub fn new(tx: Transaction<'static, Sqlite>) -> Self {
		Self {
			tx,
			markers: TxMarkers::default(),
		}
	}

	pub fn markers(&self) -> &TxMarkers {
		&self.markers
	}

	pub fn markers_mut(&mut self) -> &mut TxMarkers {
		&mut self.markers
	}

	pub async fn execute(&mut self, stmt: &Statement) -> Result<u64> {
		let result = stmt.to_query().execute(&mut *self.tx).await?;
		Ok(result.rows_affected())
	}

	pub async fn fetch(&mut self, stmt: &Statement) -> Result<Vec<SqliteRow>> {
		Ok(stmt.to_query().fetch_all(&mut *self.tx).await?)
	}

	pub async fn commit(self) -> Result<()> {
		self.tx.commit().await?;
		Ok(())
	}

	pub async fn rollback(self) -> Result<()> {
		self.tx.rollback().await?;
		Ok(())
	}
}

impl std::fmt::Debug for MutationTx {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MutationTx")
			.field("markers", &self.markers)
			.finish_non_exhaustive()
	}
}

/// [`StorageDriver`] over a sqlx SQLite pool.
#[derive(Clone, Debug)]
pub struct SqliteDriver {
	pool: SqlitePool,
}

impl SqliteDriver {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

#[async_trait]
impl ConnectionPool for SqliteDriver {
	fn in_use_count(&self) -> u32 {
		self.pool.in_use_count()
	}

	async fn close(&self) {
		self.pool.close().await
	}

	fn is_closed(&self) -> bool {
		self.pool.is_closed()
	}
}

#[async_trait]
impl StorageDriver for SqliteDriver {
	#[tracing::instrument(level = "trace", skip(self, stmt), fields(sql = %stmt.sql))]
	async fn execute(&self, stmt: &Statement) -> Result<u64> {
		let result = stmt.to_query().execute(&self.pool).await?;
		Ok(result.rows_affected())
	}

	#[tracing::instrument(level = "trace", skip(self, stmt), fields(sql = %stmt.sql))]
	async fn fetch(&self, stmt: &Statement) -> Result<Vec<SqliteRow>> {
		Ok(stmt.to_query().fetch_all(&self.pool).await?)
	}

	async fn begin(&self) -> Result<MutationTx> {
		Ok(MutationTx::new(self.pool.begin().await?))
	}
}
