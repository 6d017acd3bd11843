// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the Warden server.

pub mod database;
pub mod features;
pub mod logging;
pub mod rebac;
pub mod shutdown;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use features::{FeatureFallback, FeaturesConfig, FeaturesConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use rebac::{RebacConfig, RebacConfigLayer};
pub use shutdown::{ShutdownConfig, ShutdownConfigLayer};
