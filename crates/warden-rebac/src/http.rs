// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenFGA-compatible HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, trace};
use warden_authz::SubjectType;

use crate::client::{AccessCheck, ListObjectsRequest, RebacClient};
use crate::error::RebacError;
use crate::retry::{retry, RetryConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct FgaConfig {
	pub base_url: String,
	pub store_id: String,
	pub model_id: Option<String>,
	pub api_token: Option<String>,
	pub timeout: Duration,
	pub retry: RetryConfig,
}

impl FgaConfig {
	pub fn new(base_url: impl Into<String>, store_id: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			store_id: store_id.into(),
			model_id: None,
			api_token: None,
			timeout: DEFAULT_TIMEOUT,
			retry: RetryConfig::default(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct FgaHttpClient {
	http_client: Client,
	config: FgaConfig,
}

#[derive(Debug, Serialize)]
struct TupleKey<'a> {
	user: String,
	relation: &'a str,
	object: String,
}

#[derive(Debug, Serialize)]
struct CheckBody<'a> {
	tuple_key: TupleKey<'a>,
	#[serde(skip_serializing_if = "Option::is_none")]
	authorization_model_id: Option<&'a str>,
	#[serde(skip_serializing_if = "Map::is_empty")]
	context: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
	allowed: bool,
}

#[derive(Debug, Serialize)]
struct ListObjectsBody<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	authorization_model_id: Option<&'a str>,
	#[serde(rename = "type")]
	object_type: &'a str,
	relation: &'a str,
	user: String,
	#[serde(skip_serializing_if = "Map::is_empty")]
	context: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ListObjectsResponse {
	objects: Vec<String>,
}

fn subject_ref(subject_type: SubjectType, subject_id: &str) -> String {
	format!("{}:{subject_id}", subject_type.rebac_type())
}

impl FgaHttpClient {
	pub fn new(config: FgaConfig) -> Result<Self, RebacError> {
		let http_client = Client::builder().timeout(config.timeout).build()?;
		Ok(Self {
			http_client,
			config,
		})
	}

	pub fn config(&self) -> &FgaConfig {
		&self.config
	}

	fn endpoint(&self, operation: &str) -> String {
		format!(
			"{}/stores/{}/{operation}",
			self.config.base_url.trim_end_matches('/'),
			self.config.store_id
		)
	}

	async fn post<B, R>(&self, operation: &str, body: &B) -> Result<R, RebacError>
	where
		B: Serialize + ?Sized,
		R: for<'de> Deserialize<'de>,
	{
		let url = self.endpoint(operation);
		debug!(url = %url, "sending rebac request");

		let mut request = self.http_client.post(&url).json(body);
		if let Some(token) = &self.config.api_token {
			request = request.bearer_auth(token);
		}

		let response = request.send().await.map_err(|e| {
			if e.is_timeout() {
				error!("rebac request timed out");
				return RebacError::Timeout;
			}
			error!(error = %e, "network error during rebac request");
			RebacError::Network(e)
		})?;

		let status = response.status();
		if !status.is_success() {
			let status_code = status.as_u16();
			let body = response.text().await.unwrap_or_default();

			return Err(match status_code {
				401 | 403 => {
					error!(status = status_code, "rebac request unauthorized");
					RebacError::Unauthorized
				}
				429 => {
					error!(status = status_code, "rebac rate limit exceeded");
					RebacError::RateLimited
				}
				_ => {
					error!(status = status_code, body = %body, "rebac api error");
					RebacError::ApiError {
						status: status_code,
						message: body,
					}
				}
			});
		}

		let body = response.text().await.map_err(RebacError::Network)?;
		trace!(body = %body, "rebac response body");

		serde_json::from_str(&body).map_err(|e| {
			error!(error = %e, "failed to parse rebac response");
			RebacError::InvalidResponse(format!("JSON parse error: {e}"))
		})
	}
}

#[async_trait]
impl RebacClient for FgaHttpClient {
	#[instrument(
		skip(self, check),
		fields(relation = %check.relation, object_type = %check.object_type)
	)]
	async fn check_access(&self, check: &AccessCheck) -> Result<bool, RebacError> {
		let body = CheckBody {
			tuple_key: TupleKey {
				user: subject_ref(check.subject_type, &check.subject_id),
				relation: &check.relation,
				object: format!("{}:{}", check.object_type, check.object_id),
			},
			authorization_model_id: self.config.model_id.as_deref(),
			context: &check.context,
		};

		let response: CheckResponse =
			retry(&self.config.retry, || self.post("check", &body)).await?;
		Ok(response.allowed)
	}

	#[instrument(
		skip(self, request),
		fields(relation = %request.relation, object_type = %request.object_type)
	)]
	async fn list_objects(&self, request: &ListObjectsRequest) -> Result<Vec<String>, RebacError> {
		let body = ListObjectsBody {
			authorization_model_id: self.config.model_id.as_deref(),
			object_type: request.object_type.as_str(),
			relation: &request.relation,
			user: subject_ref(request.subject_type, &request.subject_id),
			context: &request.context,
		};

		let response: ListObjectsResponse =
			retry(&self.config.retry, || self.post("list-objects", &body)).await?;

		let prefix = format!("{}:", request.object_type);
		let ids: Vec<String> = response
			.objects
			.into_iter()
			.map(|object| match object.strip_prefix(&prefix) {
				Some(id) => id.to_string(),
				None => object,
			})
			.collect();

		debug!(count = ids.len(), "list-objects completed");
		Ok(ids)
	}
}
