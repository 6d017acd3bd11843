// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorized store.
//!
//! Every read passes the shutdown gate, the policy engine, the category row
//! filter and the feature gate before storage sees it. Every write passes the
//! shutdown gate and the policy engine, then runs through the entity's hook
//! chain inside one transaction.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};
use warden_authz::{
	fields, AuthorizationContext, AuthzError, Direction, EntityType, ErrorSink, FieldError,
	Mutation, MutationOp, OperationDescriptor, OrderBy, OrgId, PolicyEngine, Predicate, Query,
	QueryInterceptor, Selection, SharedRule,
};
use warden_features::{
	DenyIfMissingModules, FeatureGate, FeatureGateInterceptor, GateFallback, TableModuleRegistry,
};
use warden_rebac::{
	all_parent_tenant_ids, dedupe_memberships, AccessCheck, AuthorizedIdSet, HasObjectId,
	ListResult, RebacClient, RowFilter, DEFAULT_LIST_RELATION,
};
use warden_server_db::{
	BackgroundWorker, GatedDriver, OrgHierarchyRepository, OrgModuleRepository, QueryOutput,
	Record, RecordRepository, ShutdownGate, SqliteDriver, StorageDriver, UsageRepository,
	DEFAULT_POLL_INTERVAL,
};
use warden_server_hooks::{HookRegistry, MutationOutcome};

use crate::error::Result;
use crate::lifecycle::{Lifecycle, DEFAULT_GRACE_PERIOD};
use crate::schema::{EntityCategory, SchemaRegistry};

/// A read's rows plus the per-field errors raised while authorizing it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
	pub output: QueryOutput,
	pub errors: Vec<FieldError>,
}

impl QueryResponse {
	pub fn into_records(self) -> Vec<Record> {
		self.output.into_records()
	}
}

pub struct StoreBuilder {
	pool: SqlitePool,
	schemas: SchemaRegistry,
	rebac: Option<Arc<dyn RebacClient>>,
	list_relation: String,
	features_enabled: bool,
	fallback: GateFallback,
	poll_interval: Duration,
	grace_period: Duration,
	workers: Vec<Arc<dyn BackgroundWorker>>,
}

impl StoreBuilder {
	pub fn rebac(mut self, client: Arc<dyn RebacClient>) -> Self {
		self.rebac = Some(client);
		self
	}

	/// The relation row filtering and tenant access checks ask for.
	pub fn list_relation(mut self, relation: impl Into<String>) -> Self {
		self.list_relation = relation.into();
		self
	}

	pub fn features_enabled(mut self, enabled: bool) -> Self {
		self.features_enabled = enabled;
		self
	}

	pub fn feature_fallback(mut self, fallback: GateFallback) -> Self {
		self.fallback = fallback;
		self
	}

	pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	/// How long [`Lifecycle::close`] waits for in-flight work.
	pub fn grace_period(mut self, grace_period: Duration) -> Self {
		self.grace_period = grace_period;
		self
	}

	pub fn worker(mut self, worker: Arc<dyn BackgroundWorker>) -> Self {
		self.workers.push(worker);
		self
	}

	pub fn build(self) -> Result<AuthorizedStore> {
		let gate = ShutdownGate::new();
		let driver: Arc<dyn StorageDriver> = Arc::new(GatedDriver::new(
			SqliteDriver::new(self.pool),
			gate.clone(),
		));

		let modules = OrgModuleRepository::new(Arc::clone(&driver));
		let feature_gate = FeatureGate::new(Arc::new(TableModuleRegistry::new(
			self.schemas.module_requirements(),
			modules.clone(),
		)))
		.with_enabled(self.features_enabled)
		.with_fallback(self.fallback);

		let gate_rules: Vec<SharedRule> =
			vec![Arc::new(DenyIfMissingModules::new(feature_gate.clone()))];
		let engine = PolicyEngine::new(self.schemas.policy_registry(gate_rules)?);
		let hooks = self.schemas.hook_registry(&gate);

		let row_filter = self
			.rebac
			.map(|client| RowFilter::new(client).with_relation(self.list_relation.clone()));

		let lifecycle = Lifecycle::new(gate, Arc::clone(&driver))
			.with_workers(self.workers)
			.with_poll_interval(self.poll_interval)
			.with_grace_period(self.grace_period);

		debug!(
			entities = self.schemas.entity_types().count(),
			rebac = row_filter.is_some(),
			features = feature_gate.is_enabled(),
			"authorized store built"
		);

		Ok(AuthorizedStore {
			records: RecordRepository::new(Arc::clone(&driver)),
			hierarchy: OrgHierarchyRepository::new(Arc::clone(&driver)),
			usage: UsageRepository::new(Arc::clone(&driver)),
			modules,
			schemas: Arc::new(self.schemas),
			engine,
			hooks,
			features: FeatureGateInterceptor::new(feature_gate),
			row_filter,
			list_relation: self.list_relation,
			driver,
			lifecycle,
		})
	}
}

#[derive(Clone)]
pub struct AuthorizedStore {
	schemas: Arc<SchemaRegistry>,
	engine: PolicyEngine,
	hooks: HookRegistry,
	driver: Arc<dyn StorageDriver>,
	records: RecordRepository,
	hierarchy: OrgHierarchyRepository,
	modules: OrgModuleRepository,
	usage: UsageRepository,
	features: FeatureGateInterceptor,
	row_filter: Option<RowFilter>,
	list_relation: String,
	lifecycle: Lifecycle,
}

impl AuthorizedStore {
	/// Start building a store over a migrated pool.
	pub fn builder(pool: SqlitePool, schemas: SchemaRegistry) -> StoreBuilder {
		StoreBuilder {
			pool,
			schemas,
			rebac: None,
			list_relation: DEFAULT_LIST_RELATION.to_string(),
			features_enabled: true,
			fallback: GateFallback::default(),
			poll_interval: DEFAULT_POLL_INTERVAL,
			grace_period: DEFAULT_GRACE_PERIOD,
			workers: Vec::new(),
		}
	}

	pub fn schemas(&self) -> &SchemaRegistry {
		&self.schemas
	}

	pub fn lifecycle(&self) -> &Lifecycle {
		&self.lifecycle
	}

	/// Parent links between tenants. Not authorized; for provisioning.
	pub fn hierarchy(&self) -> &OrgHierarchyRepository {
		&self.hierarchy
	}

	/// Per-tenant module switches. Not authorized; for provisioning and billing sync.
	pub fn modules(&self) -> &OrgModuleRepository {
		&self.modules
	}

	pub fn usage(&self) -> &UsageRepository {
		&self.usage
	}

	pub fn begin_shutdown(&self) -> bool {
		self.lifecycle.begin_shutdown()
	}

	pub fn is_shutting_down(&self) -> bool {
		self.lifecycle.is_shutting_down()
	}

	fn ensure_running(&self) -> Result<()> {
		if self.lifecycle.is_shutting_down() {
			return Err(AuthzError::ShuttingDown.into());
		}
		Ok(())
	}

	/// Authorize and run a read.
	///
	/// A query rewritten to match nothing returns the empty answer for its
	/// selection without touching storage.
	#[instrument(skip(self, ctx, query), fields(entity_type = %query.entity_type))]
	pub async fn query(&self, ctx: &AuthorizationContext, mut query: Query) -> Result<QueryResponse> {
		self.ensure_running()?;
		self.engine
			.evaluate(ctx, &OperationDescriptor::read(&query))
			.await?;

		if query.include_deleted && !(ctx.skips_soft_delete() || ctx.allows_all()) {
			debug!("soft-deleted rows requested without opt-out, ignoring");
			query.include_deleted = false;
		}

		let sink = ErrorSink::new();
		self.filter_rows(ctx, &mut query).await?;
		self.features.intercept(ctx, &mut query, &sink).await?;
		self.apply_default_order(&mut query);

		let output = if query.is_unsatisfiable() {
			debug!("query matches nothing, skipping storage");
			QueryOutput::empty(query.selection)
		} else {
			ctx.guard(self.records.query(&query)).await??
		};

		Ok(QueryResponse {
			output,
			errors: sink.errors(),
		})
	}

	/// One record by id, if the caller may see it.
	pub async fn get(
		&self,
		ctx: &AuthorizationContext,
		entity_type: EntityType,
		id: &str,
	) -> Result<Option<Record>> {
		let query = Query::new(entity_type).eq(fields::ID, id).limit(1);
		Ok(self.query(ctx, query).await?.into_records().into_iter().next())
	}

	async fn filter_rows(&self, ctx: &AuthorizationContext, query: &mut Query) -> Result<()> {
		if ctx.allows_all() {
			return Ok(());
		}
		let Some(category) = self.schemas.category(query.entity_type) else {
			query.make_unsatisfiable();
			return Ok(());
		};

		match category {
			EntityCategory::Organization => {
				let ids = ctx
					.organization_ids()
					.iter()
					.map(|o| o.as_str().to_string())
					.collect();
				query.restrict_ids(ids);
			}
			EntityCategory::TenantOwned | EntityCategory::Membership => {
				query.predicates.push(owner_in(ctx.organization_ids()));
			}
			EntityCategory::Relationship => match &self.row_filter {
				Some(filter) => {
					filter.apply(ctx, query).await?;
				}
				None => {
					warn!(
						entity_type = %query.entity_type,
						"no relationship service configured, nothing is visible"
					);
					query.restrict_ids(Vec::new());
				}
			},
			EntityCategory::History { parent } => match &self.row_filter {
				Some(filter) => {
					filter.apply_history(ctx, query, parent).await?;
				}
				None => {
					warn!(
						entity_type = %query.entity_type,
						"no relationship service configured, no history is visible"
					);
					query.make_unsatisfiable();
				}
			},
			EntityCategory::Shared => {}
		}
		Ok(())
	}

	fn apply_default_order(&self, query: &mut Query) {
		if !query.order_by.is_empty() {
			return;
		}
		if let Some((field, direction)) = self
			.schemas
			.category(query.entity_type)
			.and_then(|c| c.default_order())
		{
			query.order_by.push(OrderBy {
				field: field.to_string(),
				direction,
			});
		}
	}

	/// Authorize and apply a write inside one transaction.
	///
	/// Any hook or storage error rolls the transaction back.
	#[instrument(skip(self, ctx, mutation), fields(entity_type = %mutation.entity_type, op = ?mutation.op))]
	pub async fn mutate(
		&self,
		ctx: &AuthorizationContext,
		mut mutation: Mutation,
	) -> Result<MutationOutcome> {
		self.ensure_running()?;
		self.scope_mutation(ctx, &mut mutation).await?;
		self.engine
			.evaluate(ctx, &OperationDescriptor::mutation(&mutation))
			.await?;

		let mut tx = self.driver.begin().await?;
		let chain = self.hooks.chain(mutation.entity_type);
		match chain.run(ctx, &mut tx, mutation).await {
			Ok(outcome) => {
				tx.commit().await?;
				debug!(affected = outcome.ids.len(), "mutation committed");
				Ok(outcome)
			}
			Err(err) => {
				if let Err(rollback) = tx.rollback().await {
					warn!(error = %rollback, "rollback failed");
				}
				debug!(error = %err, "mutation aborted");
				Err(err.into())
			}
		}
	}

	/// Check that updates and deletes only name rows of the caller's tenants,
	/// and replace whatever owner the caller named with the stored one.
	async fn scope_mutation(&self, ctx: &AuthorizationContext, mutation: &mut Mutation) -> Result<()> {
		if ctx.allows_all() {
			return Ok(());
		}
		reject_managed_fields(mutation)?;
		if mutation.op == MutationOp::Create || mutation.ids.is_empty() {
			return Ok(());
		}
		let Some(category) = self.schemas.category(mutation.entity_type) else {
			return Ok(());
		};

		let owners: Vec<Option<OrgId>> = match category {
			EntityCategory::Organization => {
				mutation.ids.iter().map(|id| Some(OrgId::new(id))).collect()
			}
			_ => {
				let query = Query::new(mutation.entity_type)
					.filter(Predicate::IdIn(mutation.ids.clone()))
					.select(Selection::Records);
				ctx.guard(self.records.query(&query))
					.await??
					.into_records()
					.into_iter()
					.map(|record| record.owner_id.map(OrgId::new))
					.collect()
			}
		};

		let denied = |reason: &str| {
			AuthzError::denied(mutation.entity_type, mutation.op.kind().as_str(), reason)
		};
		if category == EntityCategory::Organization || category.is_owner_scoped() {
			if owners.iter().any(Option::is_none) {
				return Err(denied("target has no owning organization").into());
			}
			if owners.iter().flatten().any(|owner| !ctx.is_member_of(owner)) {
				return Err(denied("target belongs to another organization").into());
			}
		}

		// Rules only see an owner every target shares.
		let owner = match owners.split_first() {
			Some((first, rest)) if rest.iter().all(|o| o == first) => first.clone(),
			_ => None,
		};
		if mutation.owner_id.is_some() && mutation.owner_id != owner {
			debug!("caller named a different owner, using the stored one");
		}
		mutation.resolve_owner(owner);
		Ok(())
	}

	/// List membership rows.
	///
	/// Without `tenant`, covers the active tenant and every ancestor, keeping
	/// one row per member. With `tenant`, the caller must hold the list
	/// relation on it and only its direct members are returned.
	#[instrument(skip(self, ctx), fields(entity_type = %entity_type, explicit = tenant.is_some()))]
	pub async fn list_memberships(
		&self,
		ctx: &AuthorizationContext,
		entity_type: EntityType,
		tenant: Option<&OrgId>,
	) -> Result<Vec<Record>> {
		self.ensure_running()?;
		let listing = Query::new(entity_type);
		self.engine
			.evaluate(ctx, &OperationDescriptor::read(&listing))
			.await?;

		let (tenants, current) = match tenant {
			Some(tenant) => {
				self.require_tenant_access(ctx, tenant).await?;
				(vec![tenant.clone()], tenant.clone())
			}
			None => {
				let Some(active) = ctx.active_organization() else {
					debug!("no active organization, no memberships visible");
					return Ok(Vec::new());
				};
				let mut tenants = vec![active.clone()];
				let ancestors =
					all_parent_tenant_ids(ctx, &self.hierarchy, std::slice::from_ref(active)).await?;
				for ancestor in ancestors {
					if !tenants.contains(&ancestor) {
						tenants.push(ancestor);
					}
				}
				(tenants, active.clone())
			}
		};

		let query = Query::new(entity_type)
			.filter(owner_in(&tenants))
			.order_by(fields::CREATED_AT, Direction::Asc);
		let rows = ctx.guard(self.records.query(&query)).await??.into_records();
		let total = rows.len();
		let members = dedupe_memberships(rows, Some(&current));
		debug!(tenants = tenants.len(), rows = total, members = members.len(), "memberships listed");
		Ok(members)
	}

	async fn require_tenant_access(&self, ctx: &AuthorizationContext, tenant: &OrgId) -> Result<()> {
		if ctx.allows_all() {
			return Ok(());
		}
		let subject = ctx.require_subject()?;
		let denied = || {
			AuthzError::denied(
				EntityType::ORGANIZATION,
				self.list_relation.as_str(),
				"no access to organization",
			)
		};
		let Some(filter) = &self.row_filter else {
			return Err(denied().into());
		};

		let check = AccessCheck::new(
			subject.id.as_str(),
			subject.subject_type,
			self.list_relation.as_str(),
			EntityType::ORGANIZATION,
			tenant.as_str(),
		);
		let allowed = ctx
			.guard(filter.client().check_access(&check))
			.await?
			.map_err(AuthzError::from)?;
		if !allowed {
			return Err(denied().into());
		}
		Ok(())
	}

	/// Intersect a listing that already ran with the caller's authorized ids.
	pub async fn filter_listing<T: HasObjectId>(
		&self,
		ctx: &AuthorizationContext,
		entity_type: EntityType,
		listing: ListResult<T>,
	) -> Result<ListResult<T>> {
		self.ensure_running()?;
		if ctx.allows_all() {
			return Ok(listing);
		}
		let authorized = match &self.row_filter {
			Some(filter) => filter.authorized_ids(ctx, entity_type).await?,
			None => AuthorizedIdSet::empty(entity_type, ctx.active_organization().cloned()),
		};
		Ok(listing.filtered(&authorized))
	}
}

/// Reject writes to columns only the store and its hooks maintain.
fn reject_managed_fields(mutation: &Mutation) -> Result<()> {
	let managed: &[&str] = match mutation.op {
		MutationOp::Create => &[
			fields::OWNER_ID,
			fields::CREATED_AT,
			fields::DELETED_AT,
			fields::DELETED_BY,
		],
		MutationOp::Update => &[
			fields::OWNER_ID,
			fields::CREATED_AT,
			fields::CREATED_BY,
			fields::DELETED_AT,
			fields::DELETED_BY,
		],
		MutationOp::Delete => &[],
	};
	match managed.iter().find(|field| mutation.touches(field)) {
		Some(field) => Err(AuthzError::denied(
			mutation.entity_type,
			mutation.op.kind().as_str(),
			format!("{field} is maintained by the store"),
		)
		.into()),
		None => Ok(()),
	}
}

fn owner_in(tenants: &[OrgId]) -> Predicate {
	Predicate::In {
		field: fields::OWNER_ID.to_string(),
		values: tenants
			.iter()
			.map(|t| Value::String(t.as_str().to_string()))
			.collect(),
	}
}

impl std::fmt::Debug for AuthorizedStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthorizedStore")
			.field("schemas", &self.schemas)
			.field("rebac", &self.row_filter.is_some())
			.field("lifecycle", &self.lifecycle)
			.finish()
	}
}
