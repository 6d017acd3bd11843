// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Table definitions for the reference record store.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"records",
		r#"
		CREATE TABLE IF NOT EXISTS records (
			id TEXT PRIMARY KEY,
			entity_type TEXT NOT NULL,
			owner_id TEXT,
			system_owned INTEGER NOT NULL DEFAULT 0,
			data TEXT NOT NULL DEFAULT '{}',
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			created_by TEXT,
			updated_by TEXT,
			deleted_at TEXT,
			deleted_by TEXT
		)
		"#,
	),
	(
		"idx_records_entity_owner",
		"CREATE INDEX IF NOT EXISTS idx_records_entity_owner ON records (entity_type, owner_id)",
	),
	(
		"org_parents",
		r#"
		CREATE TABLE IF NOT EXISTS org_parents (
			org_id TEXT NOT NULL,
			parent_id TEXT NOT NULL,
			PRIMARY KEY (org_id, parent_id)
		)
		"#,
	),
	(
		"org_modules",
		r#"
		CREATE TABLE IF NOT EXISTS org_modules (
			org_id TEXT NOT NULL,
			module TEXT NOT NULL,
			enabled INTEGER NOT NULL DEFAULT 1,
			updated_at TEXT NOT NULL,
			PRIMARY KEY (org_id, module)
		)
		"#,
	),
	(
		"usage_counters",
		r#"
		CREATE TABLE IF NOT EXISTS usage_counters (
			org_id TEXT NOT NULL,
			resource TEXT NOT NULL,
			count INTEGER NOT NULL DEFAULT 0,
			updated_at TEXT NOT NULL,
			PRIMARY KEY (org_id, resource)
		)
		"#,
	),
];

/// Create every table the store needs. Safe to run repeatedly.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		sqlx::query(sql).execute(pool).await?;
		tracing::trace!(migration = name, "applied");
	}
	tracing::debug!(count = MIGRATIONS.len(), "migrations applied");
	Ok(())
}
