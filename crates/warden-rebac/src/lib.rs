// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Relationship-based access control for Warden.
//!
//! This crate provides:
//! - [`RebacClient`] - the consumed ReBAC service contract (check and list-objects)
//! - [`FgaHttpClient`] - an OpenFGA-compatible HTTP implementation with retry
//! - [`RowFilter`] - resolves visible object ids and injects them into queries
//! - [`all_parent_tenant_ids`] - ancestor expansion over a [`TenantHierarchy`]
//! - [`dedupe_memberships`] - one membership row per subject across tenants
//! - [`ListResult`] - post-filtering of already-executed listings
//! - [`AllowIfRelation`] and [`AllowIfOrgRelation`] - ReBAC-backed policy rules
//!
//! Transport failures during row filtering degrade to an empty authorized set.
//! They are never interpreted as a grant.

pub mod client;
pub mod dedupe;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod http;
pub mod postfilter;
pub mod retry;
pub mod rules;
pub mod testing;

pub use client::{AccessCheck, ListObjectsRequest, RebacClient};
pub use dedupe::{dedupe_memberships, MembershipRow};
pub use error::RebacError;
pub use filter::{
	AuthorizedIdSet, RowFilter, DEFAULT_LIST_RELATION, HISTORY_REF_FIELD, HISTORY_RELATION,
};
pub use hierarchy::{all_parent_tenant_ids, TenantHierarchy};
pub use http::{FgaConfig, FgaHttpClient};
pub use postfilter::{HasObjectId, ListResult};
pub use retry::{retry, RetryConfig, RetryableError};
pub use rules::{AllowIfOrgRelation, AllowIfRelation};
