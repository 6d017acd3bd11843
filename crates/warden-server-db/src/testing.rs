// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pools for tests.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::DbError;
use crate::schema::run_migrations;

/// A single-connection in-memory pool.
///
/// Each SQLite memory connection is its own database, so the pool never opens
/// a second one.
pub async fn create_test_pool() -> Result<SqlitePool, DbError> {
	Ok(SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await?)
}

/// [`create_test_pool`] with every table created.
pub async fn create_migrated_pool() -> Result<SqlitePool, DbError> {
	let pool = create_test_pool().await?;
	run_migrations(&pool).await?;
	Ok(pool)
}
