// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership de-duplication across tenants.

use std::collections::HashMap;

use warden_authz::OrgId;

/// A membership row as seen by the de-duplication pass.
pub trait MembershipRow {
	/// The member this row is about (e.g. the user id).
	fn subject_key(&self) -> &str;

	/// The tenant the membership is rooted in.
	fn tenant_id(&self) -> &str;
}

/// Collapse rows for the same subject to a single row.
///
/// The row whose tenant equals `current_tenant` wins; otherwise the first row
/// seen for that subject is kept. Output order follows the first appearance of
/// each subject.
pub fn dedupe_memberships<T: MembershipRow>(rows: Vec<T>, current_tenant: Option<&OrgId>) -> Vec<T> {
	let is_current =
		|row: &T| current_tenant.is_some_and(|tenant| row.tenant_id() == tenant.as_str());

	let mut slots: Vec<T> = Vec::with_capacity(rows.len());
	let mut index: HashMap<String, usize> = HashMap::new();

	for row in rows {
		match index.get(row.subject_key()) {
			Some(&slot) => {
				if is_current(&row) && !is_current(&slots[slot]) {
					slots[slot] = row;
				}
			}
			None => {
				index.insert(row.subject_key().to_string(), slots.len());
				slots.push(row);
			}
		}
	}

	slots
}
