// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant hierarchy and license module repositories.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use warden_authz::{AuthzError, ModuleId, OrgId};
use warden_features::ActiveModuleSource;
use warden_rebac::TenantHierarchy;

use crate::driver::StorageDriver;
use crate::error::DbError;
use crate::statement::Statement;

/// Parent links between tenants (`org_parents`).
#[derive(Clone)]
pub struct OrgHierarchyRepository {
	driver: Arc<dyn StorageDriver>,
}

impl OrgHierarchyRepository {
	pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
		Self { driver }
	}

	#[tracing::instrument(skip(self), fields(child = %child, parent = %parent))]
	pub async fn add_parent(&self, child: &OrgId, parent: &OrgId) -> Result<(), DbError> {
		self.driver
			.execute(
				&Statement::new(
					"INSERT OR IGNORE INTO org_parents (org_id, parent_id) VALUES (?, ?)",
				)
				.bind(child.as_str())
				.bind(parent.as_str()),
			)
			.await?;
		Ok(())
	}

	pub async fn parents(&self, child: &OrgId) -> Result<Vec<OrgId>, DbError> {
		let rows = self
			.driver
			.fetch(
				&Statement::new(
					"SELECT parent_id FROM org_parents WHERE org_id = ? ORDER BY rowid",
				)
				.bind(child.as_str()),
			)
			.await?;
		rows.iter()
			.map(|r| -> Result<OrgId, DbError> { Ok(OrgId::new(r.try_get::<String, _>("parent_id")?)) })
			.collect()
	}
}

#[async_trait]
impl TenantHierarchy for OrgHierarchyRepository {
	async fn parents_of(&self, org_id: &OrgId) -> Result<Vec<OrgId>, AuthzError> {
		Ok(self.parents(org_id).await?)
	}
}

/// Licensed modules per tenant (`org_modules`).
#[derive(Clone)]
pub struct OrgModuleRepository {
	driver: Arc<dyn StorageDriver>,
}

impl OrgModuleRepository {
	pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
		Self { driver }
	}

	#[tracing::instrument(skip(self), fields(org_id = %org_id, module = %module))]
	pub async fn set_enabled(
		&self,
		org_id: &OrgId,
		module: &ModuleId,
		enabled: bool,
	) -> Result<(), DbError> {
		self.driver
			.execute(
				&Statement::new(
					r#"
					INSERT INTO org_modules (org_id, module, enabled, updated_at)
					VALUES (?, ?, ?, ?)
					ON CONFLICT (org_id, module) DO UPDATE
					SET enabled = excluded.enabled, updated_at = excluded.updated_at
					"#,
				)
				.bind(org_id.as_str())
				.bind(module.as_str())
				.bind(enabled)
				.bind(Utc::now().to_rfc3339()),
			)
			.await?;
		tracing::debug!(enabled, "module state updated");
		Ok(())
	}

	pub async fn enable(&self, org_id: &OrgId, module: &ModuleId) -> Result<(), DbError> {
		self.set_enabled(org_id, module, true).await
	}

	pub async fn disable(&self, org_id: &OrgId, module: &ModuleId) -> Result<(), DbError> {
		self.set_enabled(org_id, module, false).await
	}

	pub async fn enabled_modules(&self, org_id: &OrgId) -> Result<BTreeSet<ModuleId>, DbError> {
		let rows = self
			.driver
			.fetch(
				&Statement::new("SELECT module FROM org_modules WHERE org_id = ? AND enabled = 1")
					.bind(org_id.as_str()),
			)
			.await?;
		rows.iter()
			.map(|r| -> Result<ModuleId, DbError> { Ok(ModuleId::new(r.try_get::<String, _>("module")?)) })
			.collect()
	}
}

#[async_trait]
impl ActiveModuleSource for OrgModuleRepository {
	async fn active_modules(&self, tenant: &OrgId) -> Result<BTreeSet<ModuleId>, AuthzError> {
		Ok(self.enabled_modules(tenant).await?)
	}
}
