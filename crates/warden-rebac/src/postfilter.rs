// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-filtering of listings that already ran.
//!
//! Some listings cannot be narrowed before execution (for example, listings
//! joined through another entity). Their results are intersected with the
//! authorized set afterwards. Id-only and exists listings never hydrate
//! objects, so they are filtered on the raw id list.

use crate::filter::AuthorizedIdSet;

/// Anything carrying the object id the ReBAC service knows it by.
pub trait HasObjectId {
	fn object_id(&self) -> &str;
}

/// The result shapes a listing can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ListResult<T> {
	Objects(Vec<T>),
	Ids(Vec<String>),
	/// Ids matched by an existence check.
	Exists(Vec<String>),
}

impl<T: HasObjectId> ListResult<T> {
	/// Drop every entry not in `authorized`.
	pub fn retain_authorized(&mut self, authorized: &AuthorizedIdSet) {
		match self {
			ListResult::Objects(objects) => objects.retain(|o| authorized.contains(o.object_id())),
			ListResult::Ids(ids) | ListResult::Exists(ids) => {
				ids.retain(|id| authorized.contains(id))
			}
		}
	}

	pub fn filtered(mut self, authorized: &AuthorizedIdSet) -> Self {
		self.retain_authorized(authorized);
		self
	}
}

impl<T> ListResult<T> {
	pub fn len(&self) -> usize {
		match self {
			ListResult::Objects(objects) => objects.len(),
			ListResult::Ids(ids) | ListResult::Exists(ids) => ids.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Whether any entry remains.
	pub fn exists(&self) -> bool {
		!self.is_empty()
	}
}
