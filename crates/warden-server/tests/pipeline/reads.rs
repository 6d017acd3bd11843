// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tokio_util::sync::CancellationToken;
use warden_authz::{AuthorizationContext, EntityType, Mutation, OrgId, Query, Selection};
use warden_rebac::testing::FailureMode;
use warden_rebac::ListResult;
use warden_server::ErrorKind;
use warden_server_db::QueryOutput;

use super::support::{ids, member_of, TestStore, DOCUMENT, DOCUMENT_HISTORY, ORG_A, ORG_B};

async fn seed_documents(t: &TestStore) {
	for id in ["d1", "d2", "d3"] {
		t.seed(
			Mutation::create(DOCUMENT)
				.set("id", id)
				.with_owner(OrgId::new(ORG_A)),
		)
		.await;
	}
}

#[tokio::test]
async fn tenant_owned_reads_only_see_own_organization() {
	let t = TestStore::new().await;
	t.seed_group("g-a1", ORG_A).await;
	t.seed_group("g-a2", ORG_A).await;
	t.seed_group("g-b1", ORG_B).await;

	let records = t
		.store
		.query(&member_of("alice", ORG_A), Query::new(EntityType::GROUP))
		.await
		.unwrap()
		.into_records();
	let mut seen = ids(&records);
	seen.sort();
	assert_eq!(seen, vec!["g-a1", "g-a2"]);

	let other = t
		.store
		.query(
			&member_of("alice", ORG_A),
			Query::new(EntityType::GROUP).owned_by(ORG_B),
		)
		.await
		.unwrap();
	assert_eq!(other.output, QueryOutput::Records(Vec::new()));

	let count = t
		.store
		.query(
			&member_of("bob", ORG_B),
			Query::new(EntityType::GROUP).select(Selection::Count),
		)
		.await
		.unwrap();
	assert_eq!(count.output, QueryOutput::Count(1));
}

#[tokio::test]
async fn get_hides_rows_of_other_tenants() {
	let t = TestStore::new().await;
	t.seed_group("g-b1", ORG_B).await;

	let alice = member_of("alice", ORG_A);
	assert!(t
		.store
		.get(&alice, EntityType::GROUP, "g-b1")
		.await
		.unwrap()
		.is_none());
	let bob = member_of("bob", ORG_B);
	assert!(t
		.store
		.get(&bob, EntityType::GROUP, "g-b1")
		.await
		.unwrap()
		.is_some());
}

#[tokio::test]
async fn anonymous_and_unregistered_reads_are_denied() {
	let t = TestStore::new().await;

	let err = t
		.store
		.query(
			&AuthorizationContext::anonymous(),
			Query::new(EntityType::GROUP),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotAuthenticated);

	let err = t
		.store
		.query(
			&member_of("alice", ORG_A),
			Query::new(EntityType::new("payroll")),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn organizations_are_narrowed_to_memberships_and_ordered_by_name() {
	let t = TestStore::new().await;
	t.seed_org("org-c", "Gamma").await;
	t.seed_org(ORG_A, "Alpha").await;
	t.seed_org(ORG_B, "Beta").await;

	let ctx = AuthorizationContext::for_subject(warden_authz::Subject::user("alice"))
		.with_organizations([OrgId::new("org-c"), OrgId::new(ORG_A)]);
	let records = t
		.store
		.query(&ctx, Query::new(EntityType::ORGANIZATION))
		.await
		.unwrap()
		.into_records();
	assert_eq!(ids(&records), vec![ORG_A, "org-c"]);
}

#[tokio::test]
async fn relationship_reads_follow_the_rebac_service() {
	let t = TestStore::new().await;
	seed_documents(&t).await;
	t.rebac.grant("alice", "can_view", DOCUMENT, "d1");
	t.rebac.grant("alice", "can_view", DOCUMENT, "d3");

	let alice = member_of("alice", ORG_A);
	let records = t
		.store
		.query(&alice, Query::new(DOCUMENT))
		.await
		.unwrap()
		.into_records();
	let mut seen = ids(&records);
	seen.sort();
	assert_eq!(seen, vec!["d1", "d3"]);

	let request = t.rebac.last_list_request().unwrap();
	assert_eq!(request.relation, "can_view");
	assert_eq!(
		request.context.get("organization_id").and_then(|v| v.as_str()),
		Some(ORG_A)
	);

	let bob = member_of("bob", ORG_A);
	let response = t
		.store
		.query(&bob, Query::new(DOCUMENT).select(Selection::Exists))
		.await
		.unwrap();
	assert_eq!(response.output, QueryOutput::Exists(false));
}

#[tokio::test]
async fn single_document_reads_check_instead_of_listing() {
	let t = TestStore::new().await;
	seed_documents(&t).await;
	t.rebac.grant("alice", "can_view", DOCUMENT, "d2");
	let alice = member_of("alice", ORG_A);

	let row = t.store.get(&alice, DOCUMENT, "d2").await.unwrap().unwrap();
	assert_eq!(row.id, "d2");
	assert!(t.store.get(&alice, DOCUMENT, "d1").await.unwrap().is_none());

	assert_eq!(t.rebac.check_count(), 2);
	assert!(t.rebac.last_list_request().is_none());
}

#[tokio::test]
async fn history_follows_the_audit_relation_on_the_parent() {
	let t = TestStore::new().await;
	seed_documents(&t).await;
	for (id, parent) in [("h1", "d1"), ("h2", "d2"), ("h3", "d1")] {
		t.seed(
			Mutation::create(DOCUMENT_HISTORY)
				.set("id", id)
				.set("ref", parent)
				.with_owner(OrgId::new(ORG_A)),
		)
		.await;
	}
	t.rebac.grant("alice", "can_view_audit_log", DOCUMENT, "d1");
	t.rebac.grant("alice", "can_view", DOCUMENT, "d2");
	let alice = member_of("alice", ORG_A);

	let records = t
		.store
		.query(&alice, Query::new(DOCUMENT_HISTORY))
		.await
		.unwrap()
		.into_records();
	let mut seen = ids(&records);
	seen.sort();
	assert_eq!(seen, vec!["h1", "h3"]);

	let request = t.rebac.last_list_request().unwrap();
	assert_eq!(request.relation, "can_view_audit_log");
	assert_eq!(request.object_type, DOCUMENT);

	let err = t
		.store
		.mutate(&alice, Mutation::update(DOCUMENT_HISTORY, "h1").set("ref", "d2"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	t.rebac.fail_with(FailureMode::Timeout);
	let response = t.store.query(&alice, Query::new(DOCUMENT_HISTORY)).await.unwrap();
	assert_eq!(response.output, QueryOutput::Records(Vec::new()));
}

#[tokio::test]
async fn rebac_transport_failures_hide_rows_instead_of_failing() {
	let t = TestStore::new().await;
	seed_documents(&t).await;
	t.rebac.grant("alice", "can_view", DOCUMENT, "d1");
	let alice = member_of("alice", ORG_A);

	t.rebac.fail_with(FailureMode::Timeout);
	let response = t.store.query(&alice, Query::new(DOCUMENT)).await.unwrap();
	assert_eq!(response.output, QueryOutput::Records(Vec::new()));
	assert!(response.errors.is_empty());

	t.rebac.fail_with(FailureMode::Unauthorized);
	let err = t.store.query(&alice, Query::new(DOCUMENT)).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Transport);

	t.rebac.recover();
	let records = t
		.store
		.query(&alice, Query::new(DOCUMENT))
		.await
		.unwrap()
		.into_records();
	assert_eq!(ids(&records), vec!["d1"]);
}

#[tokio::test]
async fn internal_callers_see_every_row() {
	let t = TestStore::new().await;
	seed_documents(&t).await;
	t.seed_group("g-a1", ORG_A).await;
	t.seed_group("g-b1", ORG_B).await;

	let ctx = AuthorizationContext::internal();
	let groups = t
		.store
		.query(&ctx, Query::new(EntityType::GROUP).select(Selection::Count))
		.await
		.unwrap();
	assert_eq!(groups.output, QueryOutput::Count(2));

	let documents = t
		.store
		.query(&ctx, Query::new(DOCUMENT).select(Selection::Count))
		.await
		.unwrap();
	assert_eq!(documents.output, QueryOutput::Count(3));
	assert!(t.rebac.last_list_request().is_none());
}

#[tokio::test]
async fn cancelled_requests_do_not_reach_storage() {
	let t = TestStore::new().await;
	let token = CancellationToken::new();
	let ctx = member_of("alice", ORG_A).with_cancellation(token.clone());
	token.cancel();

	let err = t
		.store
		.query(&ctx, Query::new(EntityType::GROUP))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn listings_that_already_ran_are_post_filtered() {
	let t = TestStore::new().await;
	seed_documents(&t).await;
	t.rebac.grant("alice", "can_view", DOCUMENT, "d2");

	let everything = t
		.store
		.query(&AuthorizationContext::internal(), Query::new(DOCUMENT))
		.await
		.unwrap()
		.into_records();
	assert_eq!(everything.len(), 3);

	let alice = member_of("alice", ORG_A);
	let filtered = t
		.store
		.filter_listing(&alice, DOCUMENT, ListResult::Objects(everything))
		.await
		.unwrap();
	match filtered {
		ListResult::Objects(records) => assert_eq!(ids(&records), vec!["d2"]),
		other => panic!("unexpected shape: {other:?}"),
	}

	let ids_only = t
		.store
		.filter_listing::<warden_server_db::Record>(
			&alice,
			DOCUMENT,
			ListResult::Ids(vec!["d1".to_string(), "d2".to_string()]),
		)
		.await
		.unwrap();
	assert_eq!(ids_only, ListResult::Ids(vec!["d2".to_string()]));
}
