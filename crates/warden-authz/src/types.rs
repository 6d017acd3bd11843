// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for authorization.
//!
//! - **ID newtypes**: string-backed wrappers for subjects, organizations and
//!   license modules ([`SubjectId`], [`OrgId`], [`ModuleId`]) preventing accidental mixing
//! - **Entity types**: static names registered at boot ([`EntityType`])
//! - **Subject types**: how the caller authenticated ([`SubjectType`])
//! - **Operation kinds**: read/create/update/delete ([`OperationKind`])

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Create a new ID from any string-like value.
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			/// Borrow the ID as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}

			/// Get the inner string value.
			pub fn into_inner(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_string())
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(id)
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
	};
}

define_id_type!(SubjectId, "Identifier of the caller (user, service or API token).");
define_id_type!(OrgId, "Identifier of a tenant organization.");
define_id_type!(ModuleId, "Identifier of a license module, e.g. `trust-center`.");

// =============================================================================
// Entity Types
// =============================================================================

/// Name of an entity type protected by the authorization layer.
///
/// Entity types are registered statically at boot, so the name is a
/// `&'static str`. The same name is used as the ReBAC object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityType(&'static str);

impl EntityType {
	pub const ORGANIZATION: EntityType = EntityType("organization");
	pub const ORG_MEMBERSHIP: EntityType = EntityType("org_membership");
	pub const GROUP: EntityType = EntityType("group");

	pub const fn new(name: &'static str) -> Self {
		Self(name)
	}

	pub const fn as_str(&self) -> &'static str {
		self.0
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0)
	}
}

impl Serialize for EntityType {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.0)
	}
}

// =============================================================================
// Subject Types
// =============================================================================

/// How the subject of a request authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
	User,
	Service,
	ApiToken,
}

impl SubjectType {
	/// The subject type name used in ReBAC tuples.
	///
	/// API tokens are modelled as service subjects in the relationship graph.
	pub fn rebac_type(&self) -> &'static str {
		match self {
			SubjectType::User => "user",
			SubjectType::Service | SubjectType::ApiToken => "service",
		}
	}
}

impl fmt::Display for SubjectType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SubjectType::User => write!(f, "user"),
			SubjectType::Service => write!(f, "service"),
			SubjectType::ApiToken => write!(f, "api_token"),
		}
	}
}

// =============================================================================
// Operation Kinds
// =============================================================================

/// The kind of operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	Read,
	Create,
	Update,
	Delete,
}

impl OperationKind {
	/// Returns all operation kinds.
	pub fn all() -> &'static [OperationKind] {
		&[
			OperationKind::Read,
			OperationKind::Create,
			OperationKind::Update,
			OperationKind::Delete,
		]
	}

	/// Returns the write kinds.
	pub fn mutations() -> &'static [OperationKind] {
		&[
			OperationKind::Create,
			OperationKind::Update,
			OperationKind::Delete,
		]
	}

	pub fn is_mutation(&self) -> bool {
		!matches!(self, OperationKind::Read)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			OperationKind::Read => "read",
			OperationKind::Create => "create",
			OperationKind::Update => "update",
			OperationKind::Delete => "delete",
		}
	}
}

impl fmt::Display for OperationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
