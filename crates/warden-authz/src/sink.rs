// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-field errors attached to partial responses.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::types::{EntityType, ModuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldErrorCode {
	NoAccessToModule,
}

impl FieldErrorCode {
	pub fn as_str(&self) -> &'static str {
		match self {
			FieldErrorCode::NoAccessToModule => "NoAccessToModule",
		}
	}
}

/// A structured error for one response field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
	pub path: String,
	pub code: FieldErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub missing_module: Option<ModuleId>,
}

impl FieldError {
	pub fn missing_module(path: impl Into<String>, entity_type: EntityType, module: ModuleId) -> Self {
		Self {
			path: path.into(),
			code: FieldErrorCode::NoAccessToModule,
			message: format!("{entity_type} requires the '{module}' module"),
			missing_module: Some(module),
		}
	}
}

/// Request-scoped collector the transport layer drains into its response.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
	errors: Arc<Mutex<Vec<FieldError>>>,
}

impl ErrorSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&self, error: FieldError) {
		let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
		errors.push(error);
	}

	pub fn errors(&self) -> Vec<FieldError> {
		self.errors
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
	}

	pub fn len(&self) -> usize {
		self.errors.lock().unwrap_or_else(|e| e.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
