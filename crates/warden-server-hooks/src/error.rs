// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use warden_authz::{AuthzError, EntityType};
use warden_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
	#[error("Storage is shutting down")]
	ShuttingDown,

	#[error("system_owned on {entity_type} can only be set by the system at creation")]
	SystemOwnedImmutable { entity_type: EntityType },

	#[error("{hook} rejected the mutation: {reason}")]
	Rejected { hook: &'static str, reason: String },

	#[error("Storage error: {0}")]
	Storage(#[from] DbError),
}

impl HookError {
	pub fn rejected(hook: &'static str, reason: impl Into<String>) -> Self {
		HookError::Rejected {
			hook,
			reason: reason.into(),
		}
	}
}

impl From<HookError> for AuthzError {
	fn from(e: HookError) -> Self {
		match e {
			HookError::ShuttingDown | HookError::Storage(DbError::ShuttingDown) => {
				AuthzError::ShuttingDown
			}
			HookError::SystemOwnedImmutable { entity_type } => {
				AuthzError::denied(entity_type, "system_owned", "field is immutable")
			}
			other => AuthzError::Internal(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, HookError>;
