// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage-agnostic write operations.

use serde_json::{Map, Value};

use crate::types::{EntityType, OperationKind, OrgId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOp {
	Create,
	Update,
	Delete,
}

impl MutationOp {
	pub fn kind(&self) -> OperationKind {
		match self {
			MutationOp::Create => OperationKind::Create,
			MutationOp::Update => OperationKind::Update,
			MutationOp::Delete => OperationKind::Delete,
		}
	}
}

/// A pending write. Hooks may rewrite it before it reaches storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
	pub entity_type: EntityType,
	pub op: MutationOp,
	pub ids: Vec<String>,
	pub owner_id: Option<OrgId>,
	pub fields: Map<String, Value>,
	pub cleared: Vec<String>,
	owner_resolved: bool,
}

impl Mutation {
	fn new(entity_type: EntityType, op: MutationOp) -> Self {
		Self {
			entity_type,
			op,
			ids: Vec::new(),
			owner_id: None,
			fields: Map::new(),
			cleared: Vec::new(),
			owner_resolved: false,
		}
	}

	pub fn create(entity_type: EntityType) -> Self {
		Self::new(entity_type, MutationOp::Create)
	}

	pub fn update(entity_type: EntityType, id: impl Into<String>) -> Self {
		Self::new(entity_type, MutationOp::Update).with_id(id)
	}

	pub fn delete(entity_type: EntityType, id: impl Into<String>) -> Self {
		Self::new(entity_type, MutationOp::Delete).with_id(id)
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.ids.push(id.into());
		self
	}

	pub fn with_owner(mut self, owner_id: OrgId) -> Self {
		self.owner_id = Some(owner_id);
		self
	}

	pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.set_field(field, value);
		self
	}

	pub fn clear(mut self, field: impl Into<String>) -> Self {
		self.cleared.push(field.into());
		self
	}

	pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<Value>) {
		self.fields.insert(field.into(), value.into());
	}

	pub fn field(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}

	/// Returns true if the mutation sets or clears `field`.
	pub fn touches(&self, field: &str) -> bool {
		self.fields.contains_key(field) || self.cleared.iter().any(|c| c == field)
	}

	pub fn kind(&self) -> OperationKind {
		self.op.kind()
	}

	/// Replace the owner with the one read back from storage.
	pub fn resolve_owner(&mut self, owner: Option<OrgId>) {
		self.owner_id = owner;
		self.owner_resolved = true;
	}

	/// Returns true once the owner comes from storage rather than the caller.
	pub fn owner_is_resolved(&self) -> bool {
		self.owner_resolved
	}

	/// Rewrite this mutation into an update of the same targets.
	pub fn into_update(mut self) -> Self {
		self.op = MutationOp::Update;
		self
	}
}
