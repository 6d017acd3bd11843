// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the ReBAC client.

use thiserror::Error;
use warden_authz::AuthzError;

use crate::retry::RetryableError;

/// Errors that can occur when calling the ReBAC service.
#[derive(Debug, Error)]
pub enum RebacError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Request timed out")]
	Timeout,

	#[error("Rate limit exceeded")]
	RateLimited,

	#[error("Unauthorized")]
	Unauthorized,

	/// Invalid or unparseable response.
	#[error("Invalid response from ReBAC service: {0}")]
	InvalidResponse(String),

	#[error("ReBAC API error: {status} - {message}")]
	ApiError { status: u16, message: String },
}

impl RebacError {
	/// Returns true for failures of the transport rather than of the request.
	///
	/// Row filtering treats these as "no access".
	pub fn is_transport(&self) -> bool {
		match self {
			RebacError::Network(_) | RebacError::Timeout | RebacError::RateLimited => true,
			RebacError::ApiError { status, .. } => *status >= 500,
			RebacError::Unauthorized | RebacError::InvalidResponse(_) => false,
		}
	}
}

impl RetryableError for RebacError {
	fn is_retryable(&self) -> bool {
		match self {
			RebacError::Network(e) => e.is_retryable(),
			RebacError::Timeout => true,
			RebacError::RateLimited => true,
			RebacError::Unauthorized => false,
			RebacError::InvalidResponse(_) => false,
			RebacError::ApiError { status, .. } => *status >= 500,
		}
	}
}

impl From<RebacError> for AuthzError {
	fn from(err: RebacError) -> Self {
		AuthzError::InternalTransport {
			service: "rebac",
			message: err.to_string(),
		}
	}
}
