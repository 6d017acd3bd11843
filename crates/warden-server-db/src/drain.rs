// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::ConnectionPool;
use crate::shutdown::ShutdownGate;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Something running in the background that must stop before the pool closes.
#[async_trait]
pub trait BackgroundWorker: Send + Sync {
	fn name(&self) -> &str;

	async fn shutdown(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct DrainOptions {
	pub poll_interval: Duration,
	pub deadline: Instant,
}

impl DrainOptions {
	pub fn within(grace: Duration) -> Self {
		Self {
			poll_interval: DEFAULT_POLL_INTERVAL,
			deadline: Instant::now() + grace,
		}
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
	/// Every connection was returned before the deadline.
	Drained,
	DeadlineExceeded,
	Cancelled,
}

/// Wait for in-use connections to reach zero, then stop workers and close the pool.
///
/// Sets the gate first, so no new work starts while draining. Workers are
/// stopped and the pool closed whatever the outcome.
#[tracing::instrument(skip_all, fields(workers = workers.len()))]
pub async fn graceful_close<P: ConnectionPool + ?Sized>(
	pool: &P,
	gate: &ShutdownGate,
	workers: &[Arc<dyn BackgroundWorker>],
	options: DrainOptions,
	cancel: &CancellationToken,
) -> DrainOutcome {
	gate.begin();

	let outcome = loop {
		let in_use = pool.in_use_count();
		if in_use == 0 {
			break DrainOutcome::Drained;
		}
		if Instant::now() >= options.deadline {
			break DrainOutcome::DeadlineExceeded;
		}
		debug!(in_use, "waiting for connections to drain");

		tokio::select! {
			biased;
			_ = cancel.cancelled() => break DrainOutcome::Cancelled,
			_ = tokio::time::sleep_until(options.deadline) => {}
			_ = tokio::time::sleep(options.poll_interval) => {}
		}
	};

	match outcome {
		DrainOutcome::Drained => info!("all connections drained"),
		DrainOutcome::DeadlineExceeded => {
			warn!(in_use = pool.in_use_count(), "drain deadline exceeded, closing anyway")
		}
		DrainOutcome::Cancelled => warn!("drain cancelled, closing anyway"),
	}

	for worker in workers {
		debug!(worker = worker.name(), "stopping background worker");
		worker.shutdown().await;
	}
	pool.close().await;
	gate.mark_closed();
	info!("storage closed");

	outcome
}
