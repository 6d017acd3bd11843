// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage-agnostic read operations.
//!
//! A [`Query`] is built by the caller, passed mutably through the interceptors
//! (which may only narrow it) and finally compiled by the storage driver.

use serde_json::Value;

use crate::fields;
use crate::types::EntityType;

/// A single filter condition. All predicates on a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Eq { field: String, value: Value },
	In { field: String, values: Vec<Value> },
	/// Restrict to an explicit set of record ids. An empty list matches nothing.
	IdIn(Vec<String>),
	IsNull(String),
	NotNull(String),
	/// Matches no row.
	Unsatisfiable,
}

/// What the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
	#[default]
	Records,
	IdsOnly,
	Exists,
	Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Asc,
	Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
	pub field: String,
	pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	pub entity_type: EntityType,
	pub predicates: Vec<Predicate>,
	pub selection: Selection,
	pub order_by: Vec<OrderBy>,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	/// Response field this query resolves; used to key per-field errors.
	pub field_path: Option<String>,
	pub include_deleted: bool,
}

impl Query {
	pub fn new(entity_type: EntityType) -> Self {
		Self {
			entity_type,
			predicates: Vec::new(),
			selection: Selection::Records,
			order_by: Vec::new(),
			limit: None,
			offset: None,
			field_path: None,
			include_deleted: false,
		}
	}

	pub fn filter(mut self, predicate: Predicate) -> Self {
		self.predicates.push(predicate);
		self
	}

	pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.filter(Predicate::Eq {
			field: field.into(),
			value: value.into(),
		})
	}

	pub fn owned_by(self, owner_id: impl Into<String>) -> Self {
		self.eq(fields::OWNER_ID, owner_id.into())
	}

	pub fn select(mut self, selection: Selection) -> Self {
		self.selection = selection;
		self
	}

	pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
		self.order_by.push(OrderBy {
			field: field.into(),
			direction,
		});
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	pub fn at_path(mut self, path: impl Into<String>) -> Self {
		self.field_path = Some(path.into());
		self
	}

	pub fn with_deleted(mut self) -> Self {
		self.include_deleted = true;
		self
	}

	/// Narrow the query to `ids`. Always adds the predicate, even for an empty set.
	pub fn restrict_ids(&mut self, ids: Vec<String>) {
		self.predicates.push(Predicate::IdIn(ids));
	}

	/// Rewrite the query so storage returns no rows.
	pub fn make_unsatisfiable(&mut self) {
		self.predicates.push(Predicate::Unsatisfiable);
	}

	pub fn is_unsatisfiable(&self) -> bool {
		self.predicates.iter().any(|p| match p {
			Predicate::Unsatisfiable => true,
			Predicate::IdIn(ids) => ids.is_empty(),
			Predicate::In { values, .. } => values.is_empty(),
			_ => false,
		})
	}

	/// The path per-field errors for this query are attached to.
	pub fn response_path(&self) -> String {
		self.field_path
			.clone()
			.unwrap_or_else(|| self.entity_type.as_str().to_string())
	}

	/// Ids the caller explicitly filtered on, if any.
	pub fn requested_ids(&self) -> Vec<String> {
		let mut out = Vec::new();
		for predicate in &self.predicates {
			match predicate {
				Predicate::Eq { field, value } if field == fields::ID => {
					if let Some(id) = value.as_str() {
						out.push(id.to_string());
					}
				}
				Predicate::In { field, values } if field == fields::ID => {
					out.extend(values.iter().filter_map(|v| v.as_str().map(str::to_string)));
				}
				_ => {}
			}
		}
		out
	}

	/// The owning tenant the caller explicitly filtered on.
	pub fn requested_owner(&self) -> Option<&str> {
		self.predicates.iter().find_map(|p| match p {
			Predicate::Eq { field, value } if field == fields::OWNER_ID => value.as_str(),
			_ => None,
		})
	}
}
