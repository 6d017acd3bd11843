// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column names shared by interceptors, hooks and the storage layer.

pub const ID: &str = "id";
pub const OWNER_ID: &str = "owner_id";
pub const SYSTEM_OWNED: &str = "system_owned";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const CREATED_BY: &str = "created_by";
pub const UPDATED_BY: &str = "updated_by";
pub const DELETED_AT: &str = "deleted_at";
pub const DELETED_BY: &str = "deleted_by";

/// Columns stored outside the JSON data document.
pub const TYPED_COLUMNS: &[&str] = &[
	ID,
	OWNER_ID,
	SYSTEM_OWNED,
	CREATED_AT,
	UPDATED_AT,
	CREATED_BY,
	UPDATED_BY,
	DELETED_AT,
	DELETED_BY,
];

pub fn is_typed_column(field: &str) -> bool {
	TYPED_COLUMNS.contains(&field)
}

/// Actor recorded when a soft delete cannot resolve who issued it.
pub const UNKNOWN_ACTOR: &str = "unknown";
