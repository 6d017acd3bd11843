// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-tenant usage counters.

use std::sync::Arc;

use chrono::Utc;
use sqlx::Row;
use warden_authz::OrgId;

use crate::driver::{MutationTx, StorageDriver};
use crate::error::Result;
use crate::statement::Statement;

#[derive(Clone)]
pub struct UsageRepository {
	driver: Arc<dyn StorageDriver>,
}

impl UsageRepository {
	pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
		Self { driver }
	}

	/// Add `delta` to a tenant's counter inside `tx`. The counter never goes below zero.
	#[tracing::instrument(skip(tx), fields(org_id = %org_id))]
	pub async fn adjust(tx: &mut MutationTx, org_id: &OrgId, resource: &str, delta: i64) -> Result<()> {
		tx.execute(
			&Statement::new(
				r#"
				INSERT INTO usage_counters (org_id, resource, count, updated_at)
				VALUES (?, ?, MAX(?, 0), ?)
				ON CONFLICT (org_id, resource) DO UPDATE
				SET count = MAX(usage_counters.count + ?, 0), updated_at = excluded.updated_at
				"#,
			)
			.bind(org_id.as_str())
			.bind(resource)
			.bind(delta)
			.bind(Utc::now().to_rfc3339())
			.bind(delta),
		)
		.await?;
		Ok(())
	}

	pub async fn count(&self, org_id: &OrgId, resource: &str) -> Result<i64> {
		let rows = self
			.driver
			.fetch(
				&Statement::new(
					"SELECT count FROM usage_counters WHERE org_id = ? AND resource = ?",
				)
				.bind(org_id.as_str())
				.bind(resource),
			)
			.await?;
		match rows.first() {
			Some(row) => Ok(row.try_get("count")?),
			None => Ok(0),
		}
	}
}
