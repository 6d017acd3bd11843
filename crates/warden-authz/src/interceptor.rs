// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::context::AuthorizationContext;
use crate::error::Result;
use crate::query::Query;
use crate::sink::ErrorSink;

/// Inspects and narrows a read before it reaches storage.
///
/// Interceptors may only add restrictions to the query. Non-fatal denials are
/// reported through the sink.
#[async_trait]
pub trait QueryInterceptor: Send + Sync {
	fn name(&self) -> &'static str;

	async fn intercept(
		&self,
		ctx: &AuthorizationContext,
		query: &mut Query,
		sink: &ErrorSink,
	) -> Result<()>;
}
