// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use warden_authz::{
	AuthorizationContext, ContextFlag, FieldErrorCode, ModuleId, Mutation, OrgId, Query, Subject,
};
use warden_features::GateFallback;
use warden_server::ErrorKind;
use warden_server_db::QueryOutput;

use super::support::{ids, member_of, TestStore, ORG_A, ORG_B, TRUST_CENTER};

async fn seed_trust_center(t: &TestStore, id: &str, org: &str) {
	t.seed(
		Mutation::create(TRUST_CENTER)
			.set("id", id)
			.with_owner(OrgId::new(org)),
	)
	.await;
}

#[tokio::test]
async fn unlicensed_reads_come_back_empty_with_a_field_error() {
	let t = TestStore::new().await;
	seed_trust_center(&t, "tc-a", ORG_A).await;
	let alice = member_of("alice", ORG_A);

	let response = t
		.store
		.query(&alice, Query::new(TRUST_CENTER).at_path("organization.trustCenter"))
		.await
		.unwrap();
	assert_eq!(response.output, QueryOutput::Records(Vec::new()));
	assert_eq!(response.errors.len(), 1);
	let error = &response.errors[0];
	assert_eq!(error.path, "organization.trustCenter");
	assert_eq!(error.code, FieldErrorCode::NoAccessToModule);
	assert_eq!(error.missing_module, Some(ModuleId::new("trust-center")));

	let unnamed = t.store.query(&alice, Query::new(TRUST_CENTER)).await.unwrap();
	assert_eq!(unnamed.errors[0].path, "trust_center");

	t.enable_module(ORG_A, "trust-center").await;
	let response = t.store.query(&alice, Query::new(TRUST_CENTER)).await.unwrap();
	assert!(response.errors.is_empty());
	assert_eq!(ids(&response.into_records()), vec!["tc-a"]);
}

#[tokio::test]
async fn unlicensed_writes_are_refused() {
	let t = TestStore::new().await;
	let alice = member_of("alice", ORG_A);

	let err = t
		.store
		.mutate(&alice, Mutation::create(TRUST_CENTER).set("id", "tc-a"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::FeatureNotEnabled);
	assert!(err.is_denial());
	assert!(t.raw(TRUST_CENTER, "tc-a").await.is_none());

	t.enable_module(ORG_A, "trust-center").await;
	t.store
		.mutate(&alice, Mutation::create(TRUST_CENTER).set("id", "tc-a"))
		.await
		.unwrap();
	assert!(t.raw(TRUST_CENTER, "tc-a").await.is_some());
}

#[tokio::test]
async fn hard_deny_fallback_fails_reads() {
	let t = TestStore::with(|builder| builder.feature_fallback(GateFallback::HardDeny)).await;
	seed_trust_center(&t, "tc-a", ORG_A).await;

	let err = t
		.store
		.query(&member_of("alice", ORG_A), Query::new(TRUST_CENTER))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::FeatureNotEnabled);
}

#[tokio::test]
async fn disabled_gate_lets_everything_through() {
	let t = TestStore::with(|builder| builder.features_enabled(false)).await;
	seed_trust_center(&t, "tc-a", ORG_A).await;
	let alice = member_of("alice", ORG_A);

	let response = t.store.query(&alice, Query::new(TRUST_CENTER)).await.unwrap();
	assert!(response.errors.is_empty());
	assert_eq!(ids(&response.into_records()), vec!["tc-a"]);

	t.store
		.mutate(&alice, Mutation::create(TRUST_CENTER).set("id", "tc-a2"))
		.await
		.unwrap();
}

#[tokio::test]
async fn no_active_tenant_fails_closed() {
	let t = TestStore::new().await;
	seed_trust_center(&t, "tc-a", ORG_A).await;
	t.enable_module(ORG_A, "trust-center").await;
	t.enable_module(ORG_B, "trust-center").await;

	let ctx = AuthorizationContext::for_subject(Subject::user("alice"))
		.with_organizations([OrgId::new(ORG_A), OrgId::new(ORG_B)]);
	let response = t.store.query(&ctx, Query::new(TRUST_CENTER)).await.unwrap();
	assert_eq!(response.output, QueryOutput::Records(Vec::new()));
	assert_eq!(response.errors.len(), 1);

	let chosen = ctx.with_active_organization(OrgId::new(ORG_A));
	let response = t.store.query(&chosen, Query::new(TRUST_CENTER)).await.unwrap();
	assert!(response.errors.is_empty());
	assert_eq!(ids(&response.into_records()), vec!["tc-a"]);
}

#[tokio::test]
async fn organization_creation_bypasses_module_checks() {
	let t = TestStore::new().await;
	let provisioning = member_of("alice", ORG_A).with_flag(ContextFlag::OrganizationCreation);

	t.store
		.mutate(&provisioning, Mutation::create(TRUST_CENTER).set("id", "tc-new"))
		.await
		.unwrap();
	let row = t.raw(TRUST_CENTER, "tc-new").await.unwrap();
	assert_eq!(row.owner_id.as_deref(), Some(ORG_A));
}
