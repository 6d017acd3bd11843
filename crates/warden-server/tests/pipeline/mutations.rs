// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use warden_authz::{ContextFlag, EntityType, Mutation, MutationOp, OrgId, Query};
use warden_server::ErrorKind;

use super::support::{data_str, ids, member_of, TestStore, DOCUMENT, ORG_A, ORG_B};

#[tokio::test]
async fn create_stamps_tenant_actor_and_usage() {
	let t = TestStore::new().await;
	let alice = member_of("alice", ORG_A);

	let outcome = t
		.store
		.mutate(
			&alice,
			Mutation::create(EntityType::GROUP)
				.set("id", "g1")
				.set("name", "Engineering"),
		)
		.await
		.unwrap();
	assert_eq!(outcome.ids, vec!["g1"]);
	assert_eq!(outcome.op, MutationOp::Create);

	let row = t.raw(EntityType::GROUP, "g1").await.unwrap();
	assert_eq!(row.owner_id.as_deref(), Some(ORG_A));
	assert_eq!(row.created_by.as_deref(), Some("alice"));
	assert_eq!(row.updated_by.as_deref(), Some("alice"));
	assert!(!row.system_owned);
	assert_eq!(data_str(&row, "name"), Some("Engineering"));

	let used = t.store.usage().count(&OrgId::new(ORG_A), "groups").await.unwrap();
	assert_eq!(used, 1);
}

#[tokio::test]
async fn updates_stay_inside_the_callers_tenants() {
	let t = TestStore::new().await;
	t.seed_group("g-a", ORG_A).await;
	t.seed_group("g-b", ORG_B).await;
	let alice = member_of("alice", ORG_A);

	t.store
		.mutate(&alice, Mutation::update(EntityType::GROUP, "g-a").set("name", "Platform"))
		.await
		.unwrap();
	let row = t.raw(EntityType::GROUP, "g-a").await.unwrap();
	assert_eq!(data_str(&row, "name"), Some("Platform"));
	assert_eq!(row.updated_by.as_deref(), Some("alice"));

	let err = t
		.store
		.mutate(&alice, Mutation::update(EntityType::GROUP, "g-b").set("name", "Taken"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);
	let untouched = t.raw(EntityType::GROUP, "g-b").await.unwrap();
	assert_eq!(data_str(&untouched, "name"), Some("g-b"));
}

#[tokio::test]
async fn delete_is_soft_unless_the_caller_opts_out() {
	let t = TestStore::new().await;
	let alice = member_of("alice", ORG_A);
	for id in ["g1", "g2"] {
		t.store
			.mutate(&alice, Mutation::create(EntityType::GROUP).set("id", id))
			.await
			.unwrap();
	}
	let org = OrgId::new(ORG_A);
	assert_eq!(t.store.usage().count(&org, "groups").await.unwrap(), 2);

	let outcome = t
		.store
		.mutate(&alice, Mutation::delete(EntityType::GROUP, "g1"))
		.await
		.unwrap();
	assert_eq!(outcome.op, MutationOp::Update);

	let row = t.raw(EntityType::GROUP, "g1").await.unwrap();
	assert!(row.is_deleted());
	assert_eq!(row.deleted_by.as_deref(), Some("alice"));
	assert_eq!(t.store.usage().count(&org, "groups").await.unwrap(), 1);

	let visible = t
		.store
		.query(&alice, Query::new(EntityType::GROUP))
		.await
		.unwrap()
		.into_records();
	assert_eq!(ids(&visible), vec!["g2"]);

	let asked = t
		.store
		.query(&alice, Query::new(EntityType::GROUP).with_deleted())
		.await
		.unwrap()
		.into_records();
	assert_eq!(ids(&asked), vec!["g2"]);

	let auditor = alice.with_flag(ContextFlag::SkipSoftDelete);
	let mut everything = t
		.store
		.query(&auditor, Query::new(EntityType::GROUP).with_deleted())
		.await
		.unwrap()
		.into_records();
	everything.sort_by(|a, b| a.id.cmp(&b.id));
	assert_eq!(ids(&everything), vec!["g1", "g2"]);

	let outcome = t
		.store
		.mutate(&auditor, Mutation::delete(EntityType::GROUP, "g2"))
		.await
		.unwrap();
	assert_eq!(outcome.op, MutationOp::Delete);
	assert!(t.raw(EntityType::GROUP, "g2").await.is_none());
	assert_eq!(t.store.usage().count(&org, "groups").await.unwrap(), 0);
}

#[tokio::test]
async fn system_owned_flag_cannot_be_changed_by_members() {
	let t = TestStore::new().await;
	let alice = member_of("alice", ORG_A);
	t.store
		.mutate(
			&alice,
			Mutation::create(EntityType::GROUP)
				.set("id", "g1")
				.set("name", "Before"),
		)
		.await
		.unwrap();

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::update(EntityType::GROUP, "g1")
				.set("name", "After")
				.set("system_owned", true),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	let row = t.raw(EntityType::GROUP, "g1").await.unwrap();
	assert_eq!(data_str(&row, "name"), Some("Before"));
	assert!(!row.system_owned);

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::create(EntityType::GROUP)
				.set("id", "g2")
				.set("system_owned", true),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);
	assert!(t.raw(EntityType::GROUP, "g2").await.is_none());
	assert_eq!(
		t.store.usage().count(&OrgId::new(ORG_A), "groups").await.unwrap(),
		1
	);
}

#[tokio::test]
async fn system_creates_are_marked_system_owned() {
	let t = TestStore::new().await;
	t.seed_group("g-sys", ORG_A).await;
	let row = t.raw(EntityType::GROUP, "g-sys").await.unwrap();
	assert!(row.system_owned);
}

#[tokio::test]
async fn relationship_writes_need_the_edit_relation() {
	let t = TestStore::new().await;
	t.seed(
		Mutation::create(DOCUMENT)
			.set("id", "d1")
			.set("title", "Draft")
			.with_owner(OrgId::new(ORG_A)),
	)
	.await;
	let alice = member_of("alice", ORG_A);

	let err = t
		.store
		.mutate(&alice, Mutation::update(DOCUMENT, "d1").set("title", "Final"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	t.rebac.grant("alice", "can_edit", DOCUMENT, "d1");
	t.store
		.mutate(&alice, Mutation::update(DOCUMENT, "d1").set("title", "Final"))
		.await
		.unwrap();
	let row = t.raw(DOCUMENT, "d1").await.unwrap();
	assert_eq!(data_str(&row, "title"), Some("Final"));
}

#[tokio::test]
async fn members_manage_only_their_own_organization() {
	let t = TestStore::new().await;
	t.seed_org(ORG_A, "Alpha").await;
	t.seed_org(ORG_B, "Beta").await;
	let alice = member_of("alice", ORG_A);

	t.store
		.mutate(
			&alice,
			Mutation::update(EntityType::ORGANIZATION, ORG_A).set("name", "Alpha Inc"),
		)
		.await
		.unwrap();
	let row = t.raw(EntityType::ORGANIZATION, ORG_A).await.unwrap();
	assert_eq!(data_str(&row, "name"), Some("Alpha Inc"));

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::update(EntityType::ORGANIZATION, ORG_B).set("name", "Mine now"),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::create(EntityType::ORGANIZATION)
				.set("id", "org-new")
				.set("name", "New"),
		)
		.await
		.unwrap_err();
	assert!(err.is_denial());
	assert!(t.raw(EntityType::ORGANIZATION, "org-new").await.is_none());
}

#[tokio::test]
async fn duplicate_ids_surface_as_conflicts() {
	let t = TestStore::new().await;
	t.seed_group("g1", ORG_A).await;
	let alice = member_of("alice", ORG_A);

	let err = t
		.store
		.mutate(&alice, Mutation::create(EntityType::GROUP).set("id", "g1"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Conflict);
	assert_eq!(
		t.store.usage().count(&OrgId::new(ORG_A), "groups").await.unwrap(),
		1
	);
}

#[tokio::test]
async fn callers_cannot_choose_the_owner_of_an_existing_row() {
	let t = TestStore::new().await;
	t.seed(
		Mutation::create(DOCUMENT)
			.set("id", "d1")
			.set("title", "Draft")
			.with_owner(OrgId::new(ORG_B)),
	)
	.await;
	t.seed_group("g-b", ORG_B).await;
	let alice = member_of("alice", ORG_A);
	let own = OrgId::new(ORG_A);

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::update(DOCUMENT, "d1")
				.with_owner(own.clone())
				.set("title", "Replaced"),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	let err = t
		.store
		.mutate(&alice, Mutation::delete(DOCUMENT, "d1").with_owner(own.clone()))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	let row = t.raw(DOCUMENT, "d1").await.unwrap();
	assert_eq!(data_str(&row, "title"), Some("Draft"));
	assert_eq!(row.owner_id.as_deref(), Some(ORG_B));
	assert!(!row.is_deleted());

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::delete(EntityType::GROUP, "g-b").with_owner(own),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);
	assert!(!t.raw(EntityType::GROUP, "g-b").await.unwrap().is_deleted());
}

#[tokio::test]
async fn members_cannot_rewrite_tenant_or_audit_columns() {
	let t = TestStore::new().await;
	t.seed_group("g-a", ORG_A).await;
	let alice = member_of("alice", ORG_A);

	let attempts = [
		Mutation::update(EntityType::GROUP, "g-a").set("owner_id", ORG_B),
		Mutation::update(EntityType::GROUP, "g-a").clear("owner_id"),
		Mutation::update(EntityType::GROUP, "g-a").set("deleted_at", "2025-01-01T00:00:00Z"),
		Mutation::update(EntityType::GROUP, "g-a").set("deleted_by", "alice"),
		Mutation::update(EntityType::GROUP, "g-a").set("created_by", "mallory"),
	];
	for attempt in attempts {
		let err = t.store.mutate(&alice, attempt).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::PermissionDenied);
	}

	let row = t.raw(EntityType::GROUP, "g-a").await.unwrap();
	assert_eq!(row.owner_id.as_deref(), Some(ORG_A));
	assert!(!row.is_deleted());
	assert!(row.created_by.is_none());

	let err = t
		.store
		.mutate(
			&alice,
			Mutation::create(EntityType::GROUP)
				.set("id", "g-moved")
				.set("owner_id", ORG_B),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);
	assert!(t.raw(EntityType::GROUP, "g-moved").await.is_none());
	assert_eq!(
		t.store.usage().count(&OrgId::new(ORG_B), "groups").await.unwrap(),
		0
	);

	t.store
		.mutate(&alice, Mutation::delete(EntityType::GROUP, "g-a"))
		.await
		.unwrap();
	let row = t.raw(EntityType::GROUP, "g-a").await.unwrap();
	assert_eq!(row.deleted_by.as_deref(), Some("alice"));
}

#[tokio::test]
async fn authorship_is_always_the_caller() {
	let t = TestStore::new().await;
	let alice = member_of("alice", ORG_A);

	t.store
		.mutate(
			&alice,
			Mutation::create(EntityType::GROUP)
				.set("id", "g1")
				.set("created_by", "mallory"),
		)
		.await
		.unwrap();
	let row = t.raw(EntityType::GROUP, "g1").await.unwrap();
	assert_eq!(row.created_by.as_deref(), Some("alice"));
	assert_eq!(row.updated_by.as_deref(), Some("alice"));
}
