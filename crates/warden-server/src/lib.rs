// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden authorization server.
//!
//! This crate wires the authorization crates around the record store:
//! - [`SchemaRegistry`] - entity types registered at boot with their policy,
//!   hooks, required modules, usage resource and read category
//! - [`AuthorizedStore`] - the read and write pipeline every operation passes
//! - [`Lifecycle`] - begin shutdown, drain, close
//! - [`bootstrap`] - building a store from [`WardenConfig`]
//! - [`logging::init`] - tracing subscriber setup

pub mod bootstrap;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod schema;
pub mod store;

pub use bootstrap::{bootstrap, builder_from_config};
pub use error::{Error, ErrorKind, Result};
pub use lifecycle::Lifecycle;
pub use schema::{EntityCategory, EntitySchema, SchemaRegistry, SchemaRegistryBuilder};
pub use store::{AuthorizedStore, QueryResponse, StoreBuilder};
pub use warden_server_config::WardenConfig;
