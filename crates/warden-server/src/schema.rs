// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity schema registration.
//!
//! Each entity type is registered once at boot with its policy, hooks, required
//! modules, usage resource and read category. The built [`SchemaRegistry`] is
//! immutable and produces the policy and hook registries the store runs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use warden_authz::{
	fields, rule_fn, AllowIfOrgMember, Direction, EntityType, ModuleId, OperationKind, Policy,
	PolicyDecision, PolicyRegistry, PolicyRule, SharedRule,
};
use warden_features::ModuleRequirements;
use warden_server_db::ShutdownGate;
use warden_server_hooks::{
	HookRegistry, MutationHook, SharedHook, ShutdownCheck, SoftDelete, StorageHandler,
	SystemOwned, TenantStamp, UsageCount,
};

use crate::error::{Error, Result};

/// How reads of an entity type are narrowed and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
	/// The tenant itself. Callers see the organizations they belong to,
	/// ordered by name.
	Organization,
	/// Rows owned by one tenant. Callers see rows owned by their organizations.
	TenantOwned,
	/// Tenant-owned membership rows, ordered by join time.
	Membership,
	/// Visibility resolved per row through the ReBAC service.
	Relationship,
	/// Readable by any authenticated caller.
	Shared,
	/// Audit rows recording changes to a `parent` object, named by their
	/// `ref` field. Visible to callers who may audit the parent, newest first.
	History { parent: EntityType },
}

impl EntityCategory {
	/// Whether reads are narrowed to the caller's organizations by owner.
	pub fn is_owner_scoped(&self) -> bool {
		matches!(self, EntityCategory::TenantOwned | EntityCategory::Membership)
	}

	/// Ordering applied when the caller asks for none.
	pub fn default_order(&self) -> Option<(&'static str, Direction)> {
		match self {
			EntityCategory::Organization => Some(("name", Direction::Asc)),
			EntityCategory::Membership => Some((fields::CREATED_AT, Direction::Asc)),
			EntityCategory::History { .. } => Some((fields::CREATED_AT, Direction::Desc)),
			EntityCategory::TenantOwned | EntityCategory::Relationship | EntityCategory::Shared => None,
		}
	}

	/// The policy an entity of this category gets unless it supplies its own.
	///
	/// Reads are open to authenticated callers because the category's row
	/// filter narrows them. Mutations require membership of the owning tenant.
	/// Organizations are created and shared entities written only by internal
	/// callers, as is history. Relationship rows are edited only through rules
	/// the entity adds for its own relations.
	pub fn default_policy(&self) -> Policy {
		let policy = Policy::new().on_read(allow_authenticated());
		let member_kinds: &[OperationKind] = match self {
			EntityCategory::Shared | EntityCategory::History { .. } => return policy,
			EntityCategory::Organization => &[OperationKind::Update, OperationKind::Delete],
			EntityCategory::Relationship => &[OperationKind::Create],
			_ => OperationKind::mutations(),
		};
		policy.on_shared(member_kinds, Arc::new(AllowIfOrgMember::new(member_kinds)))
	}
}

fn allow_authenticated() -> impl PolicyRule {
	rule_fn("allow_authenticated", |ctx, _| {
		if ctx.is_authenticated() {
			PolicyDecision::Allow
		} else {
			PolicyDecision::Abstain
		}
	})
}

/// Everything registered for one entity type.
pub struct EntitySchema {
	pub entity_type: EntityType,
	pub category: EntityCategory,
	policy: Policy,
	hooks: Vec<SharedHook>,
	modules: Vec<ModuleId>,
	usage_resource: Option<String>,
	soft_delete: bool,
	system_owned: bool,
}

impl EntitySchema {
	/// A schema with the category's default policy, soft delete on and no
	/// module requirements.
	pub fn new(entity_type: EntityType, category: EntityCategory) -> Self {
		Self {
			entity_type,
			category,
			policy: category.default_policy(),
			hooks: Vec::new(),
			modules: Vec::new(),
			usage_resource: None,
			soft_delete: true,
			system_owned: false,
		}
	}

	/// Replace the default policy.
	pub fn policy(mut self, policy: Policy) -> Self {
		self.policy = policy;
		self
	}

	/// Append an entity-specific hook, run inside the standard ones.
	pub fn hook(mut self, hook: impl MutationHook + 'static) -> Self {
		self.hooks.push(Arc::new(hook));
		self
	}

	pub fn requires(mut self, modules: &[&str]) -> Self {
		for module in modules {
			let module = ModuleId::new(*module);
			if !self.modules.contains(&module) {
				self.modules.push(module);
			}
		}
		self
	}

	/// Count live rows per owning tenant under `resource`.
	pub fn counts_usage(mut self, resource: impl Into<String>) -> Self {
		self.usage_resource = Some(resource.into());
		self
	}

	/// Deletes remove rows instead of marking them.
	pub fn hard_delete(mut self) -> Self {
		self.soft_delete = false;
		self
	}

	/// Track which rows the system created.
	pub fn system_owned(mut self) -> Self {
		self.system_owned = true;
		self
	}

	pub fn modules(&self) -> &[ModuleId] {
		&self.modules
	}

	pub fn usage_resource(&self) -> Option<&str> {
		self.usage_resource.as_deref()
	}

	pub fn is_soft_delete(&self) -> bool {
		self.soft_delete
	}

	/// Standard hooks in their fixed order, then the entity's own.
	fn hook_list(&self) -> Vec<SharedHook> {
		let mut hooks: Vec<SharedHook> = Vec::new();
		if self.soft_delete {
			hooks.push(Arc::new(SoftDelete));
		}
		if self.category != EntityCategory::Organization {
			hooks.push(Arc::new(TenantStamp));
		}
		if self.system_owned {
			hooks.push(Arc::new(SystemOwned));
		}
		if let Some(resource) = &self.usage_resource {
			hooks.push(Arc::new(UsageCount::new(resource.clone())));
		}
		hooks.extend(self.hooks.iter().cloned());
		hooks
	}
}

impl std::fmt::Debug for EntitySchema {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EntitySchema")
			.field("entity_type", &self.entity_type)
			.field("category", &self.category)
			.field("policy", &self.policy)
			.field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
			.field("modules", &self.modules)
			.field("usage_resource", &self.usage_resource)
			.field("soft_delete", &self.soft_delete)
			.field("system_owned", &self.system_owned)
			.finish()
	}
}

#[derive(Default)]
pub struct SchemaRegistryBuilder {
	pre: Vec<SharedRule>,
	post: Vec<SharedRule>,
	schemas: Vec<EntitySchema>,
}

impl SchemaRegistryBuilder {
	/// A global rule run before every entity's rules.
	pub fn pre(mut self, rule: impl PolicyRule + 'static) -> Self {
		self.pre.push(Arc::new(rule));
		self
	}

	/// A global rule run after every entity's rules, before the final deny.
	pub fn post(mut self, rule: impl PolicyRule + 'static) -> Self {
		self.post.push(Arc::new(rule));
		self
	}

	pub fn register(mut self, schema: EntitySchema) -> Self {
		self.schemas.push(schema);
		self
	}

	pub fn build(self) -> Result<SchemaRegistry> {
		let mut index = HashMap::with_capacity(self.schemas.len());
		for (i, schema) in self.schemas.iter().enumerate() {
			if index.insert(schema.entity_type, i).is_some() {
				return Err(Error::Schema(format!(
					"{} registered twice",
					schema.entity_type
				)));
			}
		}
		debug!(entities = self.schemas.len(), "entity schemas registered");
		Ok(SchemaRegistry {
			pre: self.pre,
			post: self.post,
			schemas: self.schemas,
			index,
		})
	}
}

/// The immutable set of registered entity schemas.
pub struct SchemaRegistry {
	pre: Vec<SharedRule>,
	post: Vec<SharedRule>,
	schemas: Vec<EntitySchema>,
	index: HashMap<EntityType, usize>,
}

impl SchemaRegistry {
	pub fn builder() -> SchemaRegistryBuilder {
		SchemaRegistryBuilder::default()
	}

	pub fn get(&self, entity_type: EntityType) -> Option<&EntitySchema> {
		self.index.get(&entity_type).map(|&i| &self.schemas[i])
	}

	pub fn category(&self, entity_type: EntityType) -> Option<EntityCategory> {
		self.get(entity_type).map(|s| s.category)
	}

	pub fn entity_types(&self) -> impl Iterator<Item = EntityType> + '_ {
		self.schemas.iter().map(|s| s.entity_type)
	}

	pub fn module_requirements(&self) -> ModuleRequirements {
		let mut requirements = ModuleRequirements::new();
		for schema in &self.schemas {
			if !schema.modules.is_empty() {
				requirements.insert(schema.entity_type, schema.modules.iter().cloned());
			}
		}
		requirements
	}

	/// Compose the policy chains. `gate_rules` run after the configured
	/// global pre rules.
	pub fn policy_registry(&self, gate_rules: Vec<SharedRule>) -> Result<PolicyRegistry> {
		let mut builder = PolicyRegistry::builder();
		for rule in self.pre.iter().cloned().chain(gate_rules) {
			builder = builder.pre_shared(rule);
		}
		for rule in self.post.iter().cloned() {
			builder = builder.post_shared(rule);
		}
		for schema in &self.schemas {
			builder = builder.register(schema.entity_type, schema.policy.clone());
		}
		Ok(builder.build()?)
	}

	/// Build every hook chain, with the shutdown check outermost.
	pub fn hook_registry(&self, gate: &ShutdownGate) -> HookRegistry {
		let mut builder = HookRegistry::builder(Arc::new(StorageHandler))
			.global(Arc::new(ShutdownCheck::new(gate.clone())));
		for schema in &self.schemas {
			builder = builder.register(schema.entity_type, schema.hook_list());
		}
		builder.build()
	}
}

impl std::fmt::Debug for SchemaRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SchemaRegistry")
			.field("schemas", &self.schemas)
			.finish()
	}
}
