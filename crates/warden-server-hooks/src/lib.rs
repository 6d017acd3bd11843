// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mutation hooks for Warden.
//!
//! A hook decorates the handler after it (`wrap(next)`), and chains are built
//! once per entity type at registration with the first hook outermost. The
//! terminal [`StorageHandler`] writes the mutation inside the caller's
//! transaction; any hook error aborts the mutation and the caller rolls back.

pub mod chain;
pub mod error;
pub mod hooks;
pub mod storage;

#[cfg(test)]
mod testing;

pub use chain::{
	HookChain, HookRegistry, HookRegistryBuilder, MutationHandler, MutationHook, MutationOutcome,
	SharedHandler, SharedHook,
};
pub use error::{HookError, Result};
pub use hooks::{ShutdownCheck, SoftDelete, SystemOwned, TenantStamp, UsageCount};
pub use storage::StorageHandler;
