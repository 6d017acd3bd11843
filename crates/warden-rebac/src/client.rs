// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use serde_json::{Map, Value};
use warden_authz::{EntityType, SubjectType};

use crate::error::RebacError;

/// A single relationship check.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessCheck {
	pub subject_id: String,
	pub subject_type: SubjectType,
	pub relation: String,
	pub object_type: EntityType,
	pub object_id: String,
	pub context: Map<String, Value>,
}

impl AccessCheck {
	pub fn new(
		subject_id: impl Into<String>,
		subject_type: SubjectType,
		relation: impl Into<String>,
		object_type: EntityType,
		object_id: impl Into<String>,
	) -> Self {
		Self {
			subject_id: subject_id.into(),
			subject_type,
			relation: relation.into(),
			object_type,
			object_id: object_id.into(),
			context: Map::new(),
		}
	}
}

/// Enumerate every object of one type the subject holds `relation` on.
#[derive(Debug, Clone, PartialEq)]
pub struct ListObjectsRequest {
	pub subject_id: String,
	pub subject_type: SubjectType,
	pub relation: String,
	pub object_type: EntityType,
	/// Condition context evaluated by the service, e.g. `organization_id`.
	pub context: Map<String, Value>,
}

/// The consumed ReBAC service.
///
/// Both operations are fallible network calls. Implementations do not observe
/// request cancellation; callers bound them with
/// [`warden_authz::AuthorizationContext::guard`].
#[async_trait]
pub trait RebacClient: Send + Sync {
	async fn check_access(&self, check: &AccessCheck) -> Result<bool, RebacError>;

	/// Returns bare object ids, without the `type:` prefix.
	async fn list_objects(&self, request: &ListObjectsRequest) -> Result<Vec<String>, RebacError>;
}
