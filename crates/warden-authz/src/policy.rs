// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy composition.
//!
//! Each entity type registers a [`Policy`] at boot. The registry concatenates
//! the global `pre` rules, the entity's rules for each operation kind and the
//! global `post` rules into one chain per `(entity type, kind)`. The result is
//! immutable; evaluation order is fixed once [`PolicyRegistryBuilder::build`]
//! returns.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{AuthzError, Result};
use crate::rules::{AlwaysDeny, PolicyRule, SharedRule};
use crate::types::{EntityType, OperationKind};

/// Entity-specific rules, keyed by operation kind.
#[derive(Default, Clone)]
pub struct Policy {
	rules: BTreeMap<OperationKind, Vec<SharedRule>>,
}

impl Policy {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append `rule` for the given kinds, sharing one instance.
	pub fn on_shared(mut self, kinds: &[OperationKind], rule: SharedRule) -> Self {
		for kind in kinds {
			self.rules.entry(*kind).or_default().push(Arc::clone(&rule));
		}
		self
	}

	pub fn on(self, kind: OperationKind, rule: impl PolicyRule + 'static) -> Self {
		self.on_shared(&[kind], Arc::new(rule))
	}

	pub fn on_read(self, rule: impl PolicyRule + 'static) -> Self {
		self.on(OperationKind::Read, rule)
	}

	pub fn on_mutations(self, rule: impl PolicyRule + 'static) -> Self {
		self.on_shared(OperationKind::mutations(), Arc::new(rule))
	}

	pub fn on_all(self, rule: impl PolicyRule + 'static) -> Self {
		self.on_shared(OperationKind::all(), Arc::new(rule))
	}

	pub fn rules_for(&self, kind: OperationKind) -> &[SharedRule] {
		self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
	}
}

impl std::fmt::Debug for Policy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut map = f.debug_map();
		for (kind, rules) in &self.rules {
			let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
			map.entry(kind, &names);
		}
		map.finish()
	}
}

#[derive(Default)]
pub struct PolicyRegistryBuilder {
	pre: Vec<SharedRule>,
	post: Vec<SharedRule>,
	policies: Vec<(EntityType, Policy)>,
}

impl PolicyRegistryBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a global rule that runs before any entity rule.
	pub fn pre(mut self, rule: impl PolicyRule + 'static) -> Self {
		self.pre.push(Arc::new(rule));
		self
	}

	/// Append a global rule that runs after every entity rule.
	pub fn post(mut self, rule: impl PolicyRule + 'static) -> Self {
		self.post.push(Arc::new(rule));
		self
	}

	pub fn pre_shared(mut self, rule: SharedRule) -> Self {
		self.pre.push(rule);
		self
	}

	pub fn post_shared(mut self, rule: SharedRule) -> Self {
		self.post.push(rule);
		self
	}

	pub fn register(mut self, entity_type: EntityType, policy: Policy) -> Self {
		self.policies.push((entity_type, policy));
		self
	}

	/// Compose every chain.
	///
	/// Appends [`AlwaysDeny`] when the post rules do not already end in an
	/// unconditional deny. Registering the same entity type twice is an error.
	pub fn build(self) -> Result<PolicyRegistry> {
		let mut post = self.post;
		if !post.last().is_some_and(|r| r.is_unconditional_deny()) {
			post.push(Arc::new(AlwaysDeny));
		}

		let mut chains = HashMap::new();
		let mut entity_types = Vec::with_capacity(self.policies.len());
		for (entity_type, policy) in &self.policies {
			if entity_types.contains(entity_type) {
				return Err(AuthzError::Internal(format!(
					"policy for {entity_type} registered twice"
				)));
			}
			entity_types.push(*entity_type);

			for kind in OperationKind::all() {
				let chain: Vec<SharedRule> = self
					.pre
					.iter()
					.chain(policy.rules_for(*kind))
					.chain(post.iter())
					.cloned()
					.collect();
				chains.insert((*entity_type, *kind), chain);
			}
		}

		let fallback = self.pre.iter().chain(post.iter()).cloned().collect();

		Ok(PolicyRegistry {
			chains,
			fallback,
			entity_types,
		})
	}
}

/// Immutable set of composed rule chains.
pub struct PolicyRegistry {
	chains: HashMap<(EntityType, OperationKind), Vec<SharedRule>>,
	fallback: Vec<SharedRule>,
	entity_types: Vec<EntityType>,
}

impl PolicyRegistry {
	pub fn builder() -> PolicyRegistryBuilder {
		PolicyRegistryBuilder::new()
	}

	/// The composed chain for `entity_type` and `kind`.
	///
	/// Unregistered entity types get the global `pre ++ post` chain.
	pub fn chain(&self, entity_type: EntityType, kind: OperationKind) -> &[SharedRule] {
		self.chains
			.get(&(entity_type, kind))
			.map(Vec::as_slice)
			.unwrap_or(&self.fallback)
	}

	pub fn is_registered(&self, entity_type: EntityType) -> bool {
		self.entity_types.contains(&entity_type)
	}

	pub fn entity_types(&self) -> &[EntityType] {
		&self.entity_types
	}
}

impl std::fmt::Debug for PolicyRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PolicyRegistry")
			.field("entity_types", &self.entity_types)
			.field("fallback_len", &self.fallback.len())
			.finish()
	}
}
