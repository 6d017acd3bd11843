// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use warden_authz::{EntityType, Mutation, OrgId, Query};
use warden_server::{ErrorKind, Result};
use warden_server_db::{BackgroundWorker, DrainOutcome, ShutdownState};
use warden_server_hooks::MutationOutcome;

use super::support::{member_of, TestStore, ORG_A, TICKET};

#[derive(Default)]
struct RecordingWorker {
	stopped: AtomicBool,
}

#[async_trait]
impl BackgroundWorker for RecordingWorker {
	fn name(&self) -> &str {
		"recording"
	}

	async fn shutdown(&self) {
		self.stopped.store(true, Ordering::SeqCst);
	}
}

/// Start a ticket write and wait until it is parked inside its hook chain.
async fn paused_ticket(t: &TestStore, id: &str) -> JoinHandle<Result<MutationOutcome>> {
	let store = t.store.clone();
	let mutation = Mutation::create(TICKET).set("id", id);
	let handle = tokio::spawn(async move {
		store
			.mutate(&member_of("alice", ORG_A), mutation)
			.await
	});
	t.pause.entered.notified().await;
	handle
}

#[tokio::test]
async fn new_work_is_refused_once_shutdown_begins() {
	let t = TestStore::new().await;
	t.seed_group("g1", ORG_A).await;
	let alice = member_of("alice", ORG_A);

	assert!(t.store.begin_shutdown());
	assert!(!t.store.begin_shutdown());
	assert!(t.store.is_shutting_down());
	assert_eq!(t.store.lifecycle().state(), ShutdownState::Draining);

	let err = t
		.store
		.query(&alice, Query::new(EntityType::GROUP))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ShuttingDown);

	let err = t
		.store
		.mutate(&alice, Mutation::update(EntityType::GROUP, "g1").set("name", "x"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ShuttingDown);

	let err = t
		.store
		.list_memberships(&alice, EntityType::ORG_MEMBERSHIP, None)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ShuttingDown);
}

#[tokio::test]
async fn in_flight_writes_finish_before_close() {
	let t = TestStore::new().await;
	let write = paused_ticket(&t, "t1").await;

	assert!(t.store.begin_shutdown());
	assert_eq!(t.store.lifecycle().gate().state(), ShutdownState::Draining);

	t.pause.release.notify_one();
	let outcome = write.await.unwrap().unwrap();
	assert_eq!(outcome.ids, vec!["t1"]);

	let cancel = CancellationToken::new();
	let drained = t
		.store
		.lifecycle()
		.close_within(Duration::from_secs(5), &cancel)
		.await;
	assert_eq!(drained, DrainOutcome::Drained);
	assert_eq!(t.store.lifecycle().state(), ShutdownState::Closed);
}

#[tokio::test]
async fn close_gives_up_waiting_at_the_deadline() {
	let t = TestStore::new().await;
	let write = paused_ticket(&t, "t1").await;

	let lifecycle = t.store.lifecycle().clone();
	let close = tokio::spawn(async move {
		lifecycle
			.close_within(Duration::from_millis(30), &CancellationToken::new())
			.await
	});

	tokio::time::sleep(Duration::from_millis(100)).await;
	assert!(t.store.is_shutting_down());
	t.pause.release.notify_one();

	assert_eq!(close.await.unwrap(), DrainOutcome::DeadlineExceeded);
	let _ = write.await.unwrap();
	assert_eq!(t.store.lifecycle().state(), ShutdownState::Closed);
}

#[tokio::test]
async fn close_uses_the_configured_grace_period() {
	let t = TestStore::with(|builder| builder.grace_period(Duration::from_millis(30))).await;
	assert_eq!(t.store.lifecycle().grace_period(), Duration::from_millis(30));
	let write = paused_ticket(&t, "t1").await;

	let lifecycle = t.store.lifecycle().clone();
	let close = tokio::spawn(async move { lifecycle.close(&CancellationToken::new()).await });

	tokio::time::sleep(Duration::from_millis(100)).await;
	t.pause.release.notify_one();

	assert_eq!(close.await.unwrap(), DrainOutcome::DeadlineExceeded);
	let _ = write.await.unwrap();
	assert_eq!(t.store.lifecycle().state(), ShutdownState::Closed);
}

#[tokio::test]
async fn cancelled_drain_still_closes() {
	let t = TestStore::new().await;
	let write = paused_ticket(&t, "t1").await;

	let cancel = CancellationToken::new();
	cancel.cancel();
	let lifecycle = t.store.lifecycle().clone();
	let close = tokio::spawn(async move {
		lifecycle
			.close_within(Duration::from_secs(30), &cancel)
			.await
	});

	tokio::time::sleep(Duration::from_millis(20)).await;
	t.pause.release.notify_one();

	assert_eq!(close.await.unwrap(), DrainOutcome::Cancelled);
	let _ = write.await.unwrap();
	assert_eq!(t.store.lifecycle().state(), ShutdownState::Closed);
}

#[tokio::test]
async fn workers_are_stopped_on_close() {
	let worker = Arc::new(RecordingWorker::default());
	let registered = worker.clone();
	let t = TestStore::with(move |builder| builder.worker(registered)).await;

	let outcome = t
		.store
		.lifecycle()
		.close_within(Duration::from_secs(1), &CancellationToken::new())
		.await;
	assert_eq!(outcome, DrainOutcome::Drained);
	assert!(worker.stopped.load(Ordering::SeqCst));
	assert_eq!(t.store.lifecycle().state(), ShutdownState::Closed);

	let err = t
		.store
		.mutate(
			&member_of("alice", ORG_A),
			Mutation::create(EntityType::GROUP).with_owner(OrgId::new(ORG_A)),
		)
		.await
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ShuttingDown);
}
