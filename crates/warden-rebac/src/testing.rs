// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory ReBAC service for tests.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use warden_authz::EntityType;

use crate::client::{AccessCheck, ListObjectsRequest, RebacClient};
use crate::error::RebacError;

/// Failure injected into every subsequent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
	Timeout,
	RateLimited,
	ServerError,
	Unauthorized,
	BadRequest,
	Malformed,
}

impl FailureMode {
	fn to_error(self) -> RebacError {
		match self {
			FailureMode::Timeout => RebacError::Timeout,
			FailureMode::RateLimited => RebacError::RateLimited,
			FailureMode::ServerError => RebacError::ApiError {
				status: 503,
				message: "unavailable".to_string(),
			},
			FailureMode::Unauthorized => RebacError::Unauthorized,
			FailureMode::BadRequest => RebacError::ApiError {
				status: 400,
				message: "invalid request".to_string(),
			},
			FailureMode::Malformed => RebacError::InvalidResponse("missing field".to_string()),
		}
	}
}

type Tuple = (String, String, &'static str, String);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Tuple store answering checks and list-objects from memory.
///
/// Tuples are keyed by subject id only; the subject type is ignored.
#[derive(Debug, Default)]
pub struct InMemoryRebac {
	tuples: Mutex<BTreeSet<Tuple>>,
	failure: Mutex<Option<FailureMode>>,
	latency: Option<Duration>,
	list_requests: Mutex<Vec<ListObjectsRequest>>,
	checks: Mutex<Vec<AccessCheck>>,
}

impl InMemoryRebac {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn grant(
		&self,
		subject_id: &str,
		relation: &str,
		object_type: EntityType,
		object_id: &str,
	) {
		lock(&self.tuples).insert((
			subject_id.to_string(),
			relation.to_string(),
			object_type.as_str(),
			object_id.to_string(),
		));
	}

	pub fn fail_with(&self, mode: FailureMode) {
		*lock(&self.failure) = Some(mode);
	}

	pub fn recover(&self) {
		*lock(&self.failure) = None;
	}

	pub fn last_list_request(&self) -> Option<ListObjectsRequest> {
		lock(&self.list_requests).last().cloned()
	}

	pub fn last_check(&self) -> Option<AccessCheck> {
		lock(&self.checks).last().cloned()
	}

	pub fn check_count(&self) -> usize {
		lock(&self.checks).len()
	}

	async fn simulate(&self) -> Result<(), RebacError> {
		if let Some(latency) = self.latency {
			tokio::time::sleep(latency).await;
		}
		match *lock(&self.failure) {
			Some(mode) => Err(mode.to_error()),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl RebacClient for InMemoryRebac {
	async fn check_access(&self, check: &AccessCheck) -> Result<bool, RebacError> {
		lock(&self.checks).push(check.clone());
		self.simulate().await?;
		let key = (
			check.subject_id.clone(),
			check.relation.clone(),
			check.object_type.as_str(),
			check.object_id.clone(),
		);
		Ok(lock(&self.tuples).contains(&key))
	}

	async fn list_objects(&self, request: &ListObjectsRequest) -> Result<Vec<String>, RebacError> {
		lock(&self.list_requests).push(request.clone());
		self.simulate().await?;
		Ok(lock(&self.tuples)
			.iter()
			.filter(|(subject, relation, object_type, _)| {
				subject == &request.subject_id
					&& relation == &request.relation
					&& *object_type == request.object_type.as_str()
			})
			.map(|(_, _, _, id)| id.clone())
			.collect())
	}
}
