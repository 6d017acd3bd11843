// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The unified server error.

use warden_authz::AuthzError;
use warden_rebac::RebacError;
use warden_server_config::ConfigError;
use warden_server_db::DbError;
use warden_server_hooks::HookError;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the server surfaces.
///
/// Errors from the layers below are kept verbatim; [`Error::kind`] classifies
/// them for transports that map errors to status codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Authz(#[from] AuthzError),

	#[error(transparent)]
	Hook(#[from] HookError),

	#[error(transparent)]
	Db(#[from] DbError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Rebac(#[from] RebacError),

	/// Entity schemas could not be registered.
	#[error("Schema error: {0}")]
	Schema(String),

	#[error("Logging error: {0}")]
	Logging(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	PermissionDenied,
	NotAuthenticated,
	FeatureNotEnabled,
	ShuttingDown,
	Cancelled,
	DeadlineExceeded,
	Transport,
	NotFound,
	Conflict,
	InvalidInput,
	Configuration,
	Internal,
}

impl ErrorKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::PermissionDenied => "permission_denied",
			ErrorKind::NotAuthenticated => "not_authenticated",
			ErrorKind::FeatureNotEnabled => "feature_not_enabled",
			ErrorKind::ShuttingDown => "shutting_down",
			ErrorKind::Cancelled => "cancelled",
			ErrorKind::DeadlineExceeded => "deadline_exceeded",
			ErrorKind::Transport => "transport",
			ErrorKind::NotFound => "not_found",
			ErrorKind::Conflict => "conflict",
			ErrorKind::InvalidInput => "invalid_input",
			ErrorKind::Configuration => "configuration",
			ErrorKind::Internal => "internal",
		}
	}
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

fn authz_kind(err: &AuthzError) -> ErrorKind {
	match err {
		AuthzError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
		AuthzError::NotAuthenticated => ErrorKind::NotAuthenticated,
		AuthzError::FeatureNotEnabled { .. } => ErrorKind::FeatureNotEnabled,
		AuthzError::ShuttingDown => ErrorKind::ShuttingDown,
		AuthzError::InternalTransport { .. } => ErrorKind::Transport,
		AuthzError::Cancelled => ErrorKind::Cancelled,
		AuthzError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
		AuthzError::Internal(_) => ErrorKind::Internal,
	}
}

fn db_kind(err: &DbError) -> ErrorKind {
	match err {
		DbError::ShuttingDown => ErrorKind::ShuttingDown,
		DbError::NotFound(_) => ErrorKind::NotFound,
		DbError::Conflict(_) => ErrorKind::Conflict,
		DbError::InvalidField(_) => ErrorKind::InvalidInput,
		DbError::Sqlx(_) | DbError::Internal(_) | DbError::Serialization(_) => ErrorKind::Internal,
	}
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Authz(e) => authz_kind(e),
			Error::Hook(HookError::ShuttingDown) => ErrorKind::ShuttingDown,
			Error::Hook(HookError::SystemOwnedImmutable { .. }) => ErrorKind::PermissionDenied,
			Error::Hook(HookError::Rejected { .. }) => ErrorKind::InvalidInput,
			Error::Hook(HookError::Storage(e)) | Error::Db(e) => db_kind(e),
			Error::Config(_) => ErrorKind::Configuration,
			Error::Rebac(e) if e.is_transport() => ErrorKind::Transport,
			Error::Rebac(_) => ErrorKind::Internal,
			Error::Schema(_) | Error::Logging(_) => ErrorKind::Configuration,
		}
	}

	/// Returns true for access decisions rather than failures.
	pub fn is_denial(&self) -> bool {
		matches!(
			self.kind(),
			ErrorKind::PermissionDenied | ErrorKind::NotAuthenticated | ErrorKind::FeatureNotEnabled
		)
	}
}
