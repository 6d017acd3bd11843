// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The module gate.
//!
//! # Bypasses
//!
//! The gate answers "ok" without consulting the registry when:
//! - the gate is disabled globally
//! - the context allows all operations
//! - the context carries a scoped token (sign-up, invite, reset, verification)
//! - the context is creating an organization or syncing its subscription
//!
//! A context with no active tenant fails closed for any entity that requires
//! modules.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};
use warden_authz::{AuthorizationContext, AuthzError, ContextFlag, EntityType, ModuleId};

use crate::registry::ModuleRegistry;

/// What the gate does to a read when a module is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum GateFallback {
	/// Empty the result and report a per-field error.
	#[default]
	#[serde(rename = "partial")]
	PartialResponse,
	/// Fail the read with `FeatureNotEnabled`, for transports without per-field errors.
	#[serde(rename = "deny")]
	HardDeny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCheck {
	pub ok: bool,
	pub missing_module: Option<ModuleId>,
}

impl FeatureCheck {
	pub fn allowed() -> Self {
		Self {
			ok: true,
			missing_module: None,
		}
	}

	pub fn missing(module: ModuleId) -> Self {
		Self {
			ok: false,
			missing_module: Some(module),
		}
	}
}

#[derive(Clone)]
pub struct FeatureGate {
	registry: Arc<dyn ModuleRegistry>,
	enabled: bool,
	fallback: GateFallback,
}

impl FeatureGate {
	pub fn new(registry: Arc<dyn ModuleRegistry>) -> Self {
		Self {
			registry,
			enabled: true,
			fallback: GateFallback::default(),
		}
	}

	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn with_fallback(mut self, fallback: GateFallback) -> Self {
		self.fallback = fallback;
		self
	}

	pub fn fallback(&self) -> GateFallback {
		self.fallback
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	fn bypassed(&self, ctx: &AuthorizationContext) -> bool {
		!self.enabled
			|| ctx.allows_all()
			|| ctx.scoped_token().is_some()
			|| ctx.has_flag(ContextFlag::OrganizationCreation)
			|| ctx.has_flag(ContextFlag::SubscriptionSync)
	}

	/// Check every module `entity_type` requires against the active tenant.
	#[instrument(level = "debug", skip(self, ctx), fields(entity_type = %entity_type))]
	pub async fn check_features(
		&self,
		ctx: &AuthorizationContext,
		entity_type: EntityType,
	) -> Result<FeatureCheck, AuthzError> {
		if self.bypassed(ctx) {
			return Ok(FeatureCheck::allowed());
		}

		let required = self.registry.required_modules(entity_type);
		let check = self.has_all_features(ctx, &required).await?;
		if let Some(module) = &check.missing_module {
			debug!(module = %module, "required module not enabled");
		}
		Ok(check)
	}

	/// Whether the active tenant has `module` enabled.
	pub async fn has_feature(
		&self,
		ctx: &AuthorizationContext,
		module: &ModuleId,
	) -> Result<bool, AuthzError> {
		Ok(self
			.has_all_features(ctx, std::slice::from_ref(module))
			.await?
			.ok)
	}

	/// Whether the active tenant has at least one of `modules` enabled.
	///
	/// An empty list is satisfied.
	pub async fn has_any_feature(
		&self,
		ctx: &AuthorizationContext,
		modules: &[ModuleId],
	) -> Result<bool, AuthzError> {
		if modules.is_empty() || self.bypassed(ctx) {
			return Ok(true);
		}
		let Some(tenant) = ctx.active_organization() else {
			return Ok(false);
		};
		let active = ctx.guard(self.registry.active_modules(tenant)).await??;
		Ok(modules.iter().any(|m| active.contains(m)))
	}

	/// Whether the active tenant has every one of `modules` enabled, naming the
	/// first one missing.
	pub async fn has_all_features(
		&self,
		ctx: &AuthorizationContext,
		modules: &[ModuleId],
	) -> Result<FeatureCheck, AuthzError> {
		let Some(first) = modules.first() else {
			return Ok(FeatureCheck::allowed());
		};
		if self.bypassed(ctx) {
			return Ok(FeatureCheck::allowed());
		}
		let Some(tenant) = ctx.active_organization() else {
			return Ok(FeatureCheck::missing(first.clone()));
		};

		let active = ctx.guard(self.registry.active_modules(tenant)).await??;
		Ok(match modules.iter().find(|m| !active.contains(*m)) {
			Some(missing) => FeatureCheck::missing(missing.clone()),
			None => FeatureCheck::allowed(),
		})
	}
}

impl std::fmt::Debug for FeatureGate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FeatureGate")
			.field("enabled", &self.enabled)
			.field("fallback", &self.fallback)
			.finish()
	}
}
