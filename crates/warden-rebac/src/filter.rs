// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ReBAC row filtering.
//!
//! Reads of ReBAC-filtered entity types are narrowed to the object ids the
//! caller may view, as reported by the service's list-objects call. A read
//! naming exactly one id is answered by a single check instead. History rows
//! are narrowed on their `ref` field to parents the caller may audit. The
//! resulting [`AuthorizedIdSet`] is recomputed for every query.
//!
//! Failure handling is asymmetric on purpose: transport failures (connect,
//! timeout, rate limit, 5xx) yield an empty set so the query returns nothing,
//! while request failures (unauthorized, 4xx, malformed response) propagate.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use warden_authz::{
	AuthorizationContext, AuthzError, EntityType, ErrorSink, OrgId, Predicate, Query,
	QueryInterceptor,
};

use crate::client::{AccessCheck, ListObjectsRequest, RebacClient};

/// Relation used for list-objects when none is configured.
pub const DEFAULT_LIST_RELATION: &str = "can_view";

/// Relation needed on a parent object to read its history rows.
pub const HISTORY_RELATION: &str = "can_view_audit_log";

/// Field of a history row naming the object it records.
pub const HISTORY_REF_FIELD: &str = "ref";

/// Object ids a caller may access, tagged with how they were produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedIdSet {
	pub entity_type: EntityType,
	pub tenant: Option<OrgId>,
	ids: BTreeSet<String>,
}

impl AuthorizedIdSet {
	pub fn new(
		entity_type: EntityType,
		tenant: Option<OrgId>,
		ids: impl IntoIterator<Item = String>,
	) -> Self {
		Self {
			entity_type,
			tenant,
			ids: ids.into_iter().collect(),
		}
	}

	pub fn empty(entity_type: EntityType, tenant: Option<OrgId>) -> Self {
		Self::new(entity_type, tenant, std::iter::empty())
	}

	pub fn contains(&self, id: &str) -> bool {
		self.ids.contains(id)
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.ids.iter().map(String::as_str)
	}

	pub fn to_vec(&self) -> Vec<String> {
		self.ids.iter().cloned().collect()
	}
}

#[derive(Clone)]
pub struct RowFilter {
	client: Arc<dyn RebacClient>,
	relation: String,
}

impl RowFilter {
	pub fn new(client: Arc<dyn RebacClient>) -> Self {
		Self {
			client,
			relation: DEFAULT_LIST_RELATION.to_string(),
		}
	}

	pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
		self.relation = relation.into();
		self
	}

	pub fn client(&self) -> &Arc<dyn RebacClient> {
		&self.client
	}

	/// Resolve the ids of `entity_type` the caller may view.
	pub async fn authorized_ids(
		&self,
		ctx: &AuthorizationContext,
		entity_type: EntityType,
	) -> Result<AuthorizedIdSet, AuthzError> {
		self.list_ids(ctx, entity_type, &self.relation).await
	}

	#[instrument(skip(self, ctx), fields(object_type = %object_type, relation = %relation))]
	async fn list_ids(
		&self,
		ctx: &AuthorizationContext,
		object_type: EntityType,
		relation: &str,
	) -> Result<AuthorizedIdSet, AuthzError> {
		let tenant = ctx.active_organization().cloned();

		let Some(subject) = ctx.subject() else {
			debug!("no subject, authorized set is empty");
			return Ok(AuthorizedIdSet::empty(object_type, tenant));
		};

		let request = ListObjectsRequest {
			subject_id: subject.id.as_str().to_string(),
			subject_type: subject.subject_type,
			relation: relation.to_string(),
			object_type,
			context: tenant_context(tenant.as_ref()),
		};

		match ctx.guard(self.client.list_objects(&request)).await? {
			Ok(ids) => {
				debug!(count = ids.len(), "resolved authorized ids");
				Ok(AuthorizedIdSet::new(object_type, tenant, ids))
			}
			Err(err) if err.is_transport() => {
				warn!(error = %err, "rebac transport failure, treating as no access");
				Ok(AuthorizedIdSet::empty(object_type, tenant))
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Check one object directly. The set holds `id` only when the caller may
	/// view it.
	#[instrument(skip(self, ctx), fields(entity_type = %entity_type, relation = %self.relation))]
	pub async fn check_id(
		&self,
		ctx: &AuthorizationContext,
		entity_type: EntityType,
		id: &str,
	) -> Result<AuthorizedIdSet, AuthzError> {
		let tenant = ctx.active_organization().cloned();

		let Some(subject) = ctx.subject() else {
			debug!("no subject, authorized set is empty");
			return Ok(AuthorizedIdSet::empty(entity_type, tenant));
		};

		let mut check = AccessCheck::new(
			subject.id.as_str(),
			subject.subject_type,
			self.relation.as_str(),
			entity_type,
			id,
		);
		check.context = tenant_context(tenant.as_ref());

		match ctx.guard(self.client.check_access(&check)).await? {
			Ok(true) => Ok(AuthorizedIdSet::new(entity_type, tenant, [id.to_string()])),
			Ok(false) => Ok(AuthorizedIdSet::empty(entity_type, tenant)),
			Err(err) if err.is_transport() => {
				warn!(error = %err, "rebac transport failure, treating as no access");
				Ok(AuthorizedIdSet::empty(entity_type, tenant))
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Narrow `query` to the authorized ids. The predicate is applied even when
	/// the set is empty.
	pub async fn apply(
		&self,
		ctx: &AuthorizationContext,
		query: &mut Query,
	) -> Result<AuthorizedIdSet, AuthzError> {
		let set = match single_requested_id(query) {
			Some(id) => self.check_id(ctx, query.entity_type, &id).await?,
			None => self.authorized_ids(ctx, query.entity_type).await?,
		};
		query.restrict_ids(set.to_vec());
		Ok(set)
	}

	/// Narrow a history query to rows whose `parent` object the caller may
	/// audit.
	pub async fn apply_history(
		&self,
		ctx: &AuthorizationContext,
		query: &mut Query,
		parent: EntityType,
	) -> Result<AuthorizedIdSet, AuthzError> {
		let set = self.list_ids(ctx, parent, HISTORY_RELATION).await?;
		query.predicates.push(Predicate::In {
			field: HISTORY_REF_FIELD.to_string(),
			values: set.ids().map(|id| Value::String(id.to_string())).collect(),
		});
		Ok(set)
	}
}

fn single_requested_id(query: &Query) -> Option<String> {
	let mut ids = query.requested_ids();
	ids.dedup();
	match ids.len() {
		1 => ids.pop(),
		_ => None,
	}
}

fn tenant_context(tenant: Option<&OrgId>) -> Map<String, Value> {
	let mut context = Map::new();
	if let Some(org) = tenant {
		context.insert(
			"organization_id".to_string(),
			Value::String(org.as_str().to_string()),
		);
	}
	context
}

#[async_trait]
impl QueryInterceptor for RowFilter {
	fn name(&self) -> &'static str {
		"rebac_row_filter"
	}

	async fn intercept(
		&self,
		ctx: &AuthorizationContext,
		query: &mut Query,
		_sink: &ErrorSink,
	) -> Result<(), AuthzError> {
		if ctx.allows_all() {
			return Ok(());
		}
		self.apply(ctx, query).await.map(|_| ())
	}
}
