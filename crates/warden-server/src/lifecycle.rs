// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process lifecycle: stop taking work, drain, close.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_server_db::{
	graceful_close, BackgroundWorker, DrainOptions, DrainOutcome, ShutdownGate, ShutdownState,
	StorageDriver, DEFAULT_POLL_INTERVAL,
};

/// How long [`Lifecycle::close`] waits for in-flight work by default.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Lifecycle {
	gate: ShutdownGate,
	driver: Arc<dyn StorageDriver>,
	workers: Vec<Arc<dyn BackgroundWorker>>,
	poll_interval: Duration,
	grace_period: Duration,
}

impl Lifecycle {
	pub fn new(gate: ShutdownGate, driver: Arc<dyn StorageDriver>) -> Self {
		Self {
			gate,
			driver,
			workers: Vec::new(),
			poll_interval: DEFAULT_POLL_INTERVAL,
			grace_period: DEFAULT_GRACE_PERIOD,
		}
	}

	pub fn with_workers(mut self, workers: Vec<Arc<dyn BackgroundWorker>>) -> Self {
		self.workers = workers;
		self
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
		self.grace_period = grace_period;
		self
	}

	pub fn grace_period(&self) -> Duration {
		self.grace_period
	}

	pub fn gate(&self) -> &ShutdownGate {
		&self.gate
	}

	/// Stop accepting new work. Returns false if shutdown had already begun.
	pub fn begin_shutdown(&self) -> bool {
		let first = self.gate.begin();
		if first {
			info!(in_use = self.driver.in_use_count(), "shutdown requested");
		}
		first
	}

	pub fn is_shutting_down(&self) -> bool {
		self.gate.is_set()
	}

	pub fn state(&self) -> ShutdownState {
		self.gate.state()
	}

	/// Drain in-flight work until `deadline`, then stop workers and close storage.
	pub async fn graceful_close(
		&self,
		deadline: Instant,
		cancel: &CancellationToken,
	) -> DrainOutcome {
		let options = DrainOptions {
			poll_interval: self.poll_interval,
			deadline,
		};
		graceful_close(
			self.driver.as_ref(),
			&self.gate,
			&self.workers,
			options,
			cancel,
		)
		.await
	}

	pub async fn close_within(&self, grace: Duration, cancel: &CancellationToken) -> DrainOutcome {
		self.graceful_close(Instant::now() + grace, cancel).await
	}

	/// Drain for the configured grace period, then close.
	pub async fn close(&self, cancel: &CancellationToken) -> DrainOutcome {
		self.close_within(self.grace_period, cancel).await
	}
}

impl std::fmt::Debug for Lifecycle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Lifecycle")
			.field("state", &self.gate.state())
			.field("workers", &self.workers.iter().map(|w| w.name()).collect::<Vec<_>>())
			.field("poll_interval", &self.poll_interval)
			.field("grace_period", &self.grace_period)
			.finish()
	}
}
