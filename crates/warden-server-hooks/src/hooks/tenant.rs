// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use warden_authz::{fields, AuthorizationContext, Mutation, MutationOp};
use warden_server_db::MutationTx;

use crate::chain::{MutationHandler, MutationHook, MutationOutcome, SharedHandler};
use crate::error::Result;

/// Stamps the owning tenant and the acting subject.
///
/// Creates take the active organization as owner when none is given, and
/// record `created_by`/`updated_by`. Updates record `updated_by`. Only an
/// allow-all context may supply its own `created_by`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantStamp;

impl MutationHook for TenantStamp {
	fn name(&self) -> &'static str {
		"tenant_stamp"
	}

	fn wrap(&self, next: SharedHandler) -> SharedHandler {
		Arc::new(Handler { next })
	}
}

struct Handler {
	next: SharedHandler,
}

#[async_trait]
impl MutationHandler for Handler {
	async fn handle(
		&self,
		ctx: &AuthorizationContext,
		tx: &mut MutationTx,
		mut mutation: Mutation,
	) -> Result<MutationOutcome> {
		match mutation.op {
			MutationOp::Create => {
				if mutation.owner_id.is_none() {
					mutation.owner_id = ctx.active_organization().cloned();
				}
				if let Some(actor) = ctx.actor_id() {
					if !(ctx.allows_all() && mutation.touches(fields::CREATED_BY)) {
						mutation.set_field(fields::CREATED_BY, actor);
					}
					mutation.set_field(fields::UPDATED_BY, actor);
				}
			}
			MutationOp::Update => {
				if let Some(actor) = ctx.actor_id() {
					mutation.set_field(fields::UPDATED_BY, actor);
				}
			}
			MutationOp::Delete => {}
		}
		self.next.handle(ctx, tx, mutation).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chain::HookChain;
	use crate::testing::{migrated_driver, CaptureTerminal};
	use serde_json::json;
	use warden_authz::{EntityType, OrgId, Subject};

	async fn run(ctx: &AuthorizationContext, m: Mutation) -> Mutation {
		let terminal = Arc::new(CaptureTerminal::default());
		let chain = HookChain::build(&[Arc::new(TenantStamp)], terminal.clone());
		let driver = migrated_driver().await;
		let mut tx = driver.begin().await.unwrap();
		chain.run(ctx, &mut tx, m).await.unwrap();
		terminal.last()
	}

	#[tokio::test]
	async fn create_takes_active_tenant_and_actor() {
		let ctx = AuthorizationContext::for_subject(Subject::user("u1"))
			.with_organizations([OrgId::new("org-a")]);
		let seen = run(&ctx, Mutation::create(EntityType::GROUP)).await;
		assert_eq!(seen.owner_id, Some(OrgId::new("org-a")));
		assert_eq!(seen.field(fields::CREATED_BY), Some(&json!("u1")));
		assert_eq!(seen.field(fields::UPDATED_BY), Some(&json!("u1")));
	}

	#[tokio::test]
	async fn explicit_owner_is_kept() {
		let ctx = AuthorizationContext::for_subject(Subject::user("u1"))
			.with_organizations([OrgId::new("org-a"), OrgId::new("org-b")])
			.with_active_organization(OrgId::new("org-a"));
		let seen = run(
			&ctx,
			Mutation::create(EntityType::GROUP).with_owner(OrgId::new("org-b")),
		)
		.await;
		assert_eq!(seen.owner_id, Some(OrgId::new("org-b")));
	}

	#[tokio::test]
	async fn callers_cannot_choose_their_author() {
		let ctx = AuthorizationContext::for_subject(Subject::user("u1"))
			.with_organizations([OrgId::new("org-a")]);
		let seen = run(
			&ctx,
			Mutation::create(EntityType::GROUP).set(fields::CREATED_BY, "mallory"),
		)
		.await;
		assert_eq!(seen.field(fields::CREATED_BY), Some(&json!("u1")));

		let importer = AuthorizationContext::for_subject(Subject::service("importer")).with_allow_all();
		let seen = run(
			&importer,
			Mutation::create(EntityType::GROUP).set(fields::CREATED_BY, "u9"),
		)
		.await;
		assert_eq!(seen.field(fields::CREATED_BY), Some(&json!("u9")));
		assert_eq!(seen.field(fields::UPDATED_BY), Some(&json!("importer")));
	}

	#[tokio::test]
	async fn update_only_stamps_updated_by() {
		let ctx = AuthorizationContext::for_subject(Subject::user("u2"));
		let seen = run(&ctx, Mutation::update(EntityType::GROUP, "g1")).await;
		assert_eq!(seen.field(fields::UPDATED_BY), Some(&json!("u2")));
		assert!(seen.field(fields::CREATED_BY).is_none());
		assert!(seen.owner_id.is_none());
	}
}
