// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! License module gating for Warden.
//!
//! Entity types may require license modules (e.g. `trust-center`). Reads of an
//! entity whose modules the active tenant lacks are rewritten to return nothing
//! and reported as a per-field error; mutations are denied outright.

pub mod gate;
pub mod interceptor;
pub mod registry;
pub mod rules;

pub use gate::{FeatureCheck, FeatureGate, GateFallback};
pub use interceptor::FeatureGateInterceptor;
pub use registry::{
	ActiveModuleSource, ModuleRegistry, ModuleRequirements, StaticModules, TableModuleRegistry,
};
pub use rules::DenyIfMissingModules;
