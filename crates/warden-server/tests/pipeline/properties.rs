// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;

use proptest::prelude::*;
use warden_authz::{EntityType, OrgId, Query};

use super::support::{member_of, TestStore};

const ORGS: [&str; 3] = ["org-a", "org-b", "org-c"];

fn runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.unwrap()
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(24))]

	/// A member sees exactly the groups its organization owns, whatever the mix.
	#[test]
	fn reads_never_cross_tenants(
		owners in prop::collection::vec(0usize..ORGS.len(), 0..12),
		reader in 0usize..ORGS.len(),
	) {
		let (seen, expected) = runtime().block_on(async {
			let t = TestStore::new().await;
			let mut expected = BTreeSet::new();
			for (n, owner) in owners.iter().enumerate() {
				let id = format!("g{n}");
				t.seed_group(&id, ORGS[*owner]).await;
				if *owner == reader {
					expected.insert(id);
				}
			}

			let records = t
				.store
				.query(&member_of("reader", ORGS[reader]), Query::new(EntityType::GROUP))
				.await
				.unwrap()
				.into_records();
			let seen: BTreeSet<String> = records.into_iter().map(|r| r.id).collect();
			(seen, expected)
		});
		prop_assert_eq!(seen, expected);
	}

	/// Membership listings keep at most one row per user.
	#[test]
	fn membership_listings_have_one_row_per_user(
		rows in prop::collection::vec((0usize..4, 0usize..ORGS.len()), 1..10),
	) {
		let users: Vec<String> = runtime().block_on(async {
			let t = TestStore::new().await;
			t.store
				.hierarchy()
				.add_parent(&OrgId::new(ORGS[0]), &OrgId::new(ORGS[1]))
				.await
				.unwrap();
			t.store
				.hierarchy()
				.add_parent(&OrgId::new(ORGS[1]), &OrgId::new(ORGS[2]))
				.await
				.unwrap();
			for (n, (user, org)) in rows.iter().enumerate() {
				t.seed_membership(&format!("m{n}"), &format!("user-{user}"), ORGS[*org]).await;
			}

			t.store
				.list_memberships(&member_of("reader", ORGS[0]), EntityType::ORG_MEMBERSHIP, None)
				.await
				.unwrap()
				.iter()
				.filter_map(|r| r.get("user_id").and_then(|v| v.as_str()).map(str::to_string))
				.collect()
		});

		let distinct: BTreeSet<&String> = users.iter().collect();
		prop_assert_eq!(distinct.len(), users.len());
		let expected: BTreeSet<String> = rows.iter().map(|(user, _)| format!("user-{user}")).collect();
		prop_assert_eq!(distinct.into_iter().cloned().collect::<BTreeSet<_>>(), expected);
	}
}
