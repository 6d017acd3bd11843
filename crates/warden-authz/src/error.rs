// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::types::{EntityType, ModuleId};

pub type Result<T> = std::result::Result<T, AuthzError>;

/// Errors produced while authorizing an operation.
///
/// Denials carry the entity type and relation attempted so they can be audit
/// logged. They never carry identifiers of other tenants.
#[derive(Debug, Error)]
pub enum AuthzError {
	#[error("permission denied on {entity_type} ({relation}): {reason}")]
	PermissionDenied {
		entity_type: EntityType,
		relation: String,
		reason: String,
	},

	#[error("not authenticated")]
	NotAuthenticated,

	#[error("{entity_type} requires module '{module}' which is not enabled")]
	FeatureNotEnabled {
		entity_type: EntityType,
		module: ModuleId,
	},

	#[error("service is shutting down")]
	ShuttingDown,

	#[error("{service} call failed: {message}")]
	InternalTransport {
		service: &'static str,
		message: String,
	},

	#[error("operation cancelled")]
	Cancelled,

	#[error("operation deadline exceeded")]
	DeadlineExceeded,

	#[error("internal error: {0}")]
	Internal(String),
}

impl AuthzError {
	pub fn denied(
		entity_type: EntityType,
		relation: impl Into<String>,
		reason: impl Into<String>,
	) -> Self {
		AuthzError::PermissionDenied {
			entity_type,
			relation: relation.into(),
			reason: reason.into(),
		}
	}

	/// Returns true for errors that represent an access decision rather than a failure.
	pub fn is_denial(&self) -> bool {
		matches!(
			self,
			AuthzError::PermissionDenied { .. }
				| AuthzError::NotAuthenticated
				| AuthzError::FeatureNotEnabled { .. }
		)
	}
}
