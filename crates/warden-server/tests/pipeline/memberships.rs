// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use warden_authz::{AuthorizationContext, EntityType, OrgId, Subject};
use warden_server::ErrorKind;

use super::support::{data_str, ids, member_of, TestStore};

const COMPANY: &str = "org-company";
const DIVISION: &str = "org-division";
const TEAM: &str = "org-team";

/// team -> division -> company, with members spread across the levels.
async fn seeded() -> TestStore {
	let t = TestStore::new().await;
	let hierarchy = t.store.hierarchy();
	hierarchy
		.add_parent(&OrgId::new(TEAM), &OrgId::new(DIVISION))
		.await
		.unwrap();
	hierarchy
		.add_parent(&OrgId::new(DIVISION), &OrgId::new(COMPANY))
		.await
		.unwrap();

	t.seed_membership("m-alice-company", "alice", COMPANY).await;
	t.seed_membership("m-alice-team", "alice", TEAM).await;
	t.seed_membership("m-bob-division", "bob", DIVISION).await;
	t.seed_membership("m-carol-other", "carol", "org-other").await;
	t
}

#[tokio::test]
async fn listing_covers_ancestors_with_one_row_per_member() {
	let t = seeded().await;

	let members = t
		.store
		.list_memberships(&member_of("alice", TEAM), EntityType::ORG_MEMBERSHIP, None)
		.await
		.unwrap();
	let mut seen = ids(&members);
	seen.sort();
	assert_eq!(seen, vec!["m-alice-team", "m-bob-division"]);

	let alice = members
		.iter()
		.find(|m| data_str(m, "user_id") == Some("alice"))
		.unwrap();
	assert_eq!(alice.owner_id.as_deref(), Some(TEAM));
}

#[tokio::test]
async fn explicit_tenant_needs_the_list_relation() {
	let t = seeded().await;
	let alice = member_of("alice", TEAM);
	let company = OrgId::new(COMPANY);

	let err = t
		.store
		.list_memberships(&alice, EntityType::ORG_MEMBERSHIP, Some(&company))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PermissionDenied);

	t.rebac
		.grant("alice", "can_view", EntityType::ORGANIZATION, COMPANY);
	let members = t
		.store
		.list_memberships(&alice, EntityType::ORG_MEMBERSHIP, Some(&company))
		.await
		.unwrap();
	assert_eq!(ids(&members), vec!["m-alice-company"]);
}

#[tokio::test]
async fn listing_without_an_active_tenant_is_empty() {
	let t = seeded().await;
	let ctx = AuthorizationContext::for_subject(Subject::user("alice"))
		.with_organizations([OrgId::new(TEAM), OrgId::new(COMPANY)]);

	let members = t
		.store
		.list_memberships(&ctx, EntityType::ORG_MEMBERSHIP, None)
		.await
		.unwrap();
	assert!(members.is_empty());
}

#[tokio::test]
async fn cyclic_hierarchies_terminate() {
	let t = seeded().await;
	t.store
		.hierarchy()
		.add_parent(&OrgId::new(COMPANY), &OrgId::new(TEAM))
		.await
		.unwrap();

	let members = t
		.store
		.list_memberships(&member_of("bob", DIVISION), EntityType::ORG_MEMBERSHIP, None)
		.await
		.unwrap();
	let mut seen = ids(&members);
	seen.sort();
	assert_eq!(seen, vec!["m-alice-company", "m-bob-division"]);
}

#[tokio::test]
async fn anonymous_callers_cannot_list() {
	let t = seeded().await;
	let err = t
		.store
		.list_memberships(
			&AuthorizationContext::anonymous(),
			EntityType::ORG_MEMBERSHIP,
			None,
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
}

#[tokio::test]
async fn memberships_count_seats_per_tenant() {
	let t = seeded().await;
	let usage = t.store.usage();
	assert_eq!(usage.count(&OrgId::new(TEAM), "seats").await.unwrap(), 1);
	assert_eq!(usage.count(&OrgId::new(DIVISION), "seats").await.unwrap(), 1);
	assert_eq!(usage.count(&OrgId::new("org-nowhere"), "seats").await.unwrap(), 0);
}
