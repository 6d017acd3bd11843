// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handler and hook contracts, and the chain built from them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use warden_authz::{AuthorizationContext, EntityType, Mutation, MutationOp};
use warden_server_db::MutationTx;

use crate::error::Result;

/// What a mutation did, reported back up the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
	pub entity_type: EntityType,
	/// The operation that reached storage, after any rewriting.
	pub op: MutationOp,
	pub ids: Vec<String>,
}

#[async_trait]
pub trait MutationHandler: Send + Sync {
	async fn handle(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome>;
}

pub type SharedHandler = Arc<dyn MutationHandler>;

/// A hook decorates the handler after it.
pub trait MutationHook: Send + Sync {
	fn name(&self) -> &'static str;

	fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

pub type SharedHook = Arc<dyn MutationHook>;

/// Hooks composed around a terminal handler, first hook outermost.
#[derive(Clone)]
pub struct HookChain {
	handler: SharedHandler,
	names: Vec<&'static str>,
}

impl HookChain {
	pub fn build(hooks: &[SharedHook], terminal: SharedHandler) -> Self {
		let handler = hooks
			.iter()
			.rev()
			.fold(terminal, |next, hook| hook.wrap(next));
		Self {
			handler,
			names: hooks.iter().map(|h| h.name()).collect(),
		}
	}

	/// Hook names, outermost first.
	pub fn names(&self) -> &[&'static str] {
		&self.names
	}

	#[tracing::instrument(
		level = "debug",
		skip_all,
		fields(entity_type = %mutation.entity_type, op = ?mutation.op, hooks = self.names.len())
	)]
	pub async fn run(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mutation: Mutation,
	) -> Result<MutationOutcome> {
		self.handler.handle(ctx, tx, mutation).await
	}
}

impl std::fmt::Debug for HookChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HookChain").field("hooks", &self.names).finish()
	}
}

/// Chains per entity type, built once at registration.
#[derive(Debug, Clone)]
pub struct HookRegistry {
	chains: HashMap<EntityType, HookChain>,
	fallback: HookChain,
}

impl HookRegistry {
	pub fn builder(terminal: SharedHandler) -> HookRegistryBuilder {
		HookRegistryBuilder {
			terminal,
			global: Vec::new(),
			entities: Vec::new(),
		}
	}

	/// The chain for `entity_type`, or the global-only chain if none was registered.
	pub fn chain(&self, entity_type: EntityType) -> &HookChain {
		self.chains.get(&entity_type).unwrap_or(&self.fallback)
	}
}

pub struct HookRegistryBuilder {
	terminal: SharedHandler,
	global: Vec<SharedHook>,
	entities: Vec<(EntityType, Vec<SharedHook>)>,
}

impl HookRegistryBuilder {
	/// A hook every chain starts with, in the order added.
	pub fn global(mut self, hook: SharedHook) -> Self {
		self.global.push(hook);
		self
	}

	/// Entity-specific hooks, run after the global ones.
	pub fn register(mut self, entity_type: EntityType, hooks: Vec<SharedHook>) -> Self {
		match self.entities.iter_mut().find(|(e, _)| *e == entity_type) {
			Some((_, existing)) => existing.extend(hooks),
			None => self.entities.push((entity_type, hooks)),
		}
		self
	}

	pub fn build(self) -> HookRegistry {
		let chains = self
			.entities
			.into_iter()
			.map(|(entity_type, hooks)| {
				let all: Vec<SharedHook> = self.global.iter().cloned().chain(hooks).collect();
				(entity_type, HookChain::build(&all, self.terminal.clone()))
			})
			.collect();
		HookRegistry {
			chains,
			fallback: HookChain::build(&self.global, self.terminal),
		}
	}
}
