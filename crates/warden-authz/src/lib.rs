// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization primitives for Warden.
//!
//! This crate provides:
//! - [`AuthorizationContext`] - per-request identity, tenant memberships and escape flags
//! - [`Query`] and [`Mutation`] - the operation handles every rule and interceptor sees
//! - [`PolicyRule`] and [`PolicyRegistry`] - statically registered, ordered rule chains
//! - [`PolicyEngine`] - closed-world evaluation of those chains
//! - [`AuthzError`] - the shared error taxonomy
//! - [`ErrorSink`] - per-field errors attachable to a partial response

pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod fields;
pub mod interceptor;
pub mod mutation;
pub mod operation;
pub mod policy;
pub mod query;
pub mod rules;
pub mod sink;
pub mod types;

pub use context::{AuthorizationContext, ContextFlag, ScopedToken, ScopedTokenKind, Subject};
pub use decision::PolicyDecision;
pub use engine::PolicyEngine;
pub use error::{AuthzError, Result};
pub use interceptor::QueryInterceptor;
pub use mutation::{Mutation, MutationOp};
pub use operation::{OperationDescriptor, OperationTarget};
pub use policy::{Policy, PolicyRegistry, PolicyRegistryBuilder};
pub use query::{Direction, OrderBy, Predicate, Query, Selection};
pub use rules::{
	rule_fn, AllowIfOrgMember, AllowIfScopedToken, AlwaysAllow, AlwaysDeny, DenyIfNotAuthenticated,
	ForKinds, PolicyRule, SharedRule,
};
pub use sink::{ErrorSink, FieldError, FieldErrorCode};
pub use types::{EntityType, ModuleId, OperationKind, OrgId, SubjectId, SubjectType};
