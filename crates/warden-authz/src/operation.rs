// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::mutation::Mutation;
use crate::query::Query;
use crate::types::{EntityType, OperationKind, OrgId};

/// Handle to the operation a rule is deciding on.
#[derive(Debug, Clone, Copy)]
pub enum OperationTarget<'a> {
	Query(&'a Query),
	Mutation(&'a Mutation),
}

/// What every policy rule sees.
#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor<'a> {
	pub entity_type: EntityType,
	pub kind: OperationKind,
	pub target: OperationTarget<'a>,
}

impl<'a> OperationDescriptor<'a> {
	pub fn read(query: &'a Query) -> Self {
		Self {
			entity_type: query.entity_type,
			kind: OperationKind::Read,
			target: OperationTarget::Query(query),
		}
	}

	pub fn mutation(mutation: &'a Mutation) -> Self {
		Self {
			entity_type: mutation.entity_type,
			kind: mutation.kind(),
			target: OperationTarget::Mutation(mutation),
		}
	}

	pub fn query(&self) -> Option<&'a Query> {
		match self.target {
			OperationTarget::Query(q) => Some(q),
			OperationTarget::Mutation(_) => None,
		}
	}

	pub fn as_mutation(&self) -> Option<&'a Mutation> {
		match self.target {
			OperationTarget::Mutation(m) => Some(m),
			OperationTarget::Query(_) => None,
		}
	}

	/// Object ids the operation names explicitly.
	pub fn target_ids(&self) -> Vec<String> {
		match self.target {
			OperationTarget::Query(q) => q.requested_ids(),
			OperationTarget::Mutation(m) => m.ids.clone(),
		}
	}

	/// The tenant owning the target, when the operation names one.
	pub fn owner_id(&self) -> Option<OrgId> {
		match self.target {
			OperationTarget::Query(q) => q.requested_owner().map(OrgId::from),
			OperationTarget::Mutation(m) => m.owner_id.clone(),
		}
	}

	/// The owning tenant a rule may trust.
	///
	/// Updates and deletes report an owner only once it was read back from
	/// storage, never the one the caller named.
	pub fn resolved_owner_id(&self) -> Option<OrgId> {
		match self.target {
			OperationTarget::Mutation(m)
				if matches!(self.kind, OperationKind::Update | OperationKind::Delete)
					&& !m.owner_is_resolved() =>
			{
				None
			}
			_ => self.owner_id(),
		}
	}
}
