// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use warden_authz::{
	AuthorizationContext, DenyIfNotAuthenticated, EntityType, ModuleId, Mutation, OperationKind,
	OrgId, Subject,
};
use warden_rebac::testing::InMemoryRebac;
use warden_rebac::AllowIfRelation;
use warden_server::{
	AuthorizedStore, EntityCategory, EntitySchema, SchemaRegistry, StoreBuilder,
};
use warden_server_db::testing::create_migrated_pool;
use warden_server_db::{MutationTx, Record};
use warden_server_hooks::{
	MutationHandler, MutationHook, MutationOutcome, Result as HookResult, SharedHandler,
};

pub const DOCUMENT: EntityType = EntityType::new("document");
pub const DOCUMENT_HISTORY: EntityType = EntityType::new("document_history");
pub const TRUST_CENTER: EntityType = EntityType::new("trust_center");
pub const TICKET: EntityType = EntityType::new("ticket");

pub const ORG_A: &str = "org-a";
pub const ORG_B: &str = "org-b";

/// Blocks a mutation inside its chain until released.
#[derive(Clone, Default)]
pub struct Pause {
	pub entered: Arc<Notify>,
	pub release: Arc<Notify>,
}

impl MutationHook for Pause {
	fn name(&self) -> &'static str {
		"pause"
	}

	fn wrap(&self, next: SharedHandler) -> SharedHandler {
		Arc::new(PausedHandler {
			pause: self.clone(),
			next,
		})
	}
}

struct PausedHandler {
	pause: Pause,
	next: SharedHandler,
}

#[async_trait]
impl MutationHandler for PausedHandler {
	async fn handle(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> HookResult<MutationOutcome> {
		self.pause.entered.notify_one();
		self.pause.release.notified().await;
		self.next.handle(ctx, tx, mutation).await
	}
}

pub fn schemas(rebac: Arc<InMemoryRebac>, pause: Pause) -> SchemaRegistry {
	let document_policy = EntityCategory::Relationship.default_policy().on_shared(
		&[OperationKind::Update, OperationKind::Delete],
		Arc::new(AllowIfRelation::new(rebac, "can_edit")),
	);

	SchemaRegistry::builder()
		.pre(DenyIfNotAuthenticated)
		.register(EntitySchema::new(
			EntityType::ORGANIZATION,
			EntityCategory::Organization,
		))
		.register(
			EntitySchema::new(EntityType::ORG_MEMBERSHIP, EntityCategory::Membership)
				.counts_usage("seats"),
		)
		.register(
			EntitySchema::new(EntityType::GROUP, EntityCategory::TenantOwned)
				.counts_usage("groups")
				.system_owned(),
		)
		.register(EntitySchema::new(DOCUMENT, EntityCategory::Relationship).policy(document_policy))
		.register(EntitySchema::new(
			DOCUMENT_HISTORY,
			EntityCategory::History { parent: DOCUMENT },
		))
		.register(
			EntitySchema::new(TRUST_CENTER, EntityCategory::TenantOwned).requires(&["trust-center"]),
		)
		.register(EntitySchema::new(TICKET, EntityCategory::TenantOwned).hook(pause))
		.build()
		.unwrap()
}

pub struct TestStore {
	pub store: AuthorizedStore,
	pub rebac: Arc<InMemoryRebac>,
	pub pause: Pause,
}

impl TestStore {
	pub async fn new() -> Self {
		Self::with(|builder| builder).await
	}

	pub async fn with(configure: impl FnOnce(StoreBuilder) -> StoreBuilder) -> Self {
		let pool = create_migrated_pool().await.unwrap();
		let rebac = Arc::new(InMemoryRebac::new());
		let pause = Pause::default();
		let builder = AuthorizedStore::builder(pool, schemas(rebac.clone(), pause.clone()))
			.rebac(rebac.clone());
		let store = configure(builder).build().unwrap();
		Self {
			store,
			rebac,
			pause,
		}
	}

	/// Write as the system, bypassing policy.
	pub async fn seed(&self, mutation: Mutation) -> MutationOutcome {
		self.store
			.mutate(&AuthorizationContext::internal(), mutation)
			.await
			.unwrap()
	}

	pub async fn seed_group(&self, id: &str, org: &str) {
		self.seed(
			Mutation::create(EntityType::GROUP)
				.set("id", id)
				.set("name", id)
				.with_owner(OrgId::new(org)),
		)
		.await;
	}

	pub async fn seed_org(&self, id: &str, name: &str) {
		self.seed(
			Mutation::create(EntityType::ORGANIZATION)
				.set("id", id)
				.set("name", name),
		)
		.await;
	}

	pub async fn seed_membership(&self, id: &str, user: &str, org: &str) {
		self.seed(
			Mutation::create(EntityType::ORG_MEMBERSHIP)
				.set("id", id)
				.set("user_id", user)
				.with_owner(OrgId::new(org)),
		)
		.await;
	}

	pub async fn enable_module(&self, org: &str, module: &str) {
		self.store
			.modules()
			.enable(&OrgId::new(org), &ModuleId::new(module))
			.await
			.unwrap();
	}

	/// Read one row as the system, soft-deleted rows included.
	pub async fn raw(&self, entity_type: EntityType, id: &str) -> Option<Record> {
		let ctx = AuthorizationContext::internal();
		let query = warden_authz::Query::new(entity_type)
			.eq("id", id)
			.with_deleted();
		self.store
			.query(&ctx, query)
			.await
			.unwrap()
			.into_records()
			.into_iter()
			.next()
	}
}

pub fn member_of(user: &str, org: &str) -> AuthorizationContext {
	AuthorizationContext::for_subject(Subject::user(user)).with_organizations([OrgId::new(org)])
}

pub fn ids(records: &[Record]) -> Vec<&str> {
	records.iter().map(|r| r.id.as_str()).collect()
}

pub fn data_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
	record.get(field).and_then(Value::as_str)
}
