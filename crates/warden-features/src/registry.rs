// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Module requirements and active module lookup.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use warden_authz::{AuthzError, EntityType, ModuleId, OrgId};

/// The consumed license registry.
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
	/// Modules an entity type requires, in declaration order.
	fn required_modules(&self, entity_type: EntityType) -> Vec<ModuleId>;

	/// Modules the tenant currently has enabled.
	async fn active_modules(&self, tenant: &OrgId) -> Result<BTreeSet<ModuleId>, AuthzError>;
}

/// Where a tenant's enabled modules are read from.
#[async_trait]
pub trait ActiveModuleSource: Send + Sync {
	async fn active_modules(&self, tenant: &OrgId) -> Result<BTreeSet<ModuleId>, AuthzError>;
}

/// Static table of module requirements, filled at boot.
#[derive(Debug, Clone, Default)]
pub struct ModuleRequirements {
	table: HashMap<EntityType, Vec<ModuleId>>,
}

impl ModuleRequirements {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn require(mut self, entity_type: EntityType, modules: &[&str]) -> Self {
		self.insert(entity_type, modules.iter().map(|m| ModuleId::new(*m)));
		self
	}

	pub fn insert(&mut self, entity_type: EntityType, modules: impl IntoIterator<Item = ModuleId>) {
		let entry = self.table.entry(entity_type).or_default();
		for module in modules {
			if !entry.contains(&module) {
				entry.push(module);
			}
		}
	}

	pub fn get(&self, entity_type: EntityType) -> &[ModuleId] {
		self.table.get(&entity_type).map(Vec::as_slice).unwrap_or(&[])
	}
}

/// A [`ModuleRegistry`] joining a requirements table with an active module source.
pub struct TableModuleRegistry<S> {
	requirements: ModuleRequirements,
	source: S,
}

impl<S: ActiveModuleSource> TableModuleRegistry<S> {
	pub fn new(requirements: ModuleRequirements, source: S) -> Self {
		Self {
			requirements,
			source,
		}
	}
}

#[async_trait]
impl<S: ActiveModuleSource> ModuleRegistry for TableModuleRegistry<S> {
	fn required_modules(&self, entity_type: EntityType) -> Vec<ModuleId> {
		self.requirements.get(entity_type).to_vec()
	}

	async fn active_modules(&self, tenant: &OrgId) -> Result<BTreeSet<ModuleId>, AuthzError> {
		self.source.active_modules(tenant).await
	}
}

/// In-memory active modules, keyed by tenant.
#[derive(Debug, Clone, Default)]
pub struct StaticModules {
	active: HashMap<OrgId, BTreeSet<ModuleId>>,
}

impl StaticModules {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn enable(mut self, tenant: &str, modules: &[&str]) -> Self {
		self.active
			.entry(OrgId::new(tenant))
			.or_default()
			.extend(modules.iter().map(|m| ModuleId::new(*m)));
		self
	}
}

#[async_trait]
impl ActiveModuleSource for StaticModules {
	async fn active_modules(&self, tenant: &OrgId) -> Result<BTreeSet<ModuleId>, AuthzError> {
		Ok(self.active.get(tenant).cloned().unwrap_or_default())
	}
}
