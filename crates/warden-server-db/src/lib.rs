// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reference storage for Warden.
//!
//! This crate provides the SQLite record store the authorization layer wraps:
//! - [`StorageDriver`] is the seam; [`SqliteDriver`] implements it over sqlx
//! - [`GatedDriver`] puts the [`ShutdownGate`] in front of any driver
//! - [`graceful_close`] drains in-use connections before closing the pool
//! - repositories for records, tenant hierarchy, license modules and usage
//!
//! Repositories take an `Arc<dyn StorageDriver>` so every lookup they make is
//! subject to the shutdown gate.

mod compile;
pub mod drain;
pub mod driver;
pub mod error;
pub mod org;
pub mod pool;
pub mod record;
pub mod schema;
pub mod shutdown;
pub mod statement;
pub mod testing;
pub mod usage;

pub use drain::{graceful_close, BackgroundWorker, DrainOptions, DrainOutcome, DEFAULT_POLL_INTERVAL};
pub use driver::{ConnectionPool, MutationTx, SqliteDriver, StorageDriver, TxMarkers};
pub use error::{DbError, Result};
pub use org::{OrgHierarchyRepository, OrgModuleRepository};
pub use pool::create_pool;
pub use record::{QueryOutput, Record, RecordRepository};
pub use schema::run_migrations;
pub use shutdown::{GatedDriver, ShutdownGate, ShutdownState};
pub use statement::{SqlValue, Statement};
pub use usage::UsageRepository;
