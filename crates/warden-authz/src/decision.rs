// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::AuthzError;

/// The outcome of a single policy rule.
#[derive(Debug)]
pub enum PolicyDecision {
	Allow,
	Deny(AuthzError),
	/// The rule has no opinion; evaluation continues with the next rule.
	Abstain,
}

impl PolicyDecision {
	pub fn is_allow(&self) -> bool {
		matches!(self, PolicyDecision::Allow)
	}

	pub fn is_deny(&self) -> bool {
		matches!(self, PolicyDecision::Deny(_))
	}

	pub fn is_abstain(&self) -> bool {
		matches!(self, PolicyDecision::Abstain)
	}
}
