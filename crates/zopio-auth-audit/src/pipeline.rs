// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use zopio_auth_config::{AuditConfig, QueueOverflowPolicy};

use crate::error::{AuditError, AuditResult};
use crate::record::AuditRecord;
use crate::sink::{sinks_from_config, AuditSink};

/// Bounded queue feeding audit records to sinks on a background task.
///
/// Records are delivered to every sink whose filter accepts them. Writes for
/// one record run concurrently across sinks, each bounded by `write_timeout`,
/// and the next record is taken only after all of them settle. Per-sink order
/// therefore matches enqueue order.
pub struct AuditService {
	tx: mpsc::Sender<AuditRecord>,
	overflow_policy: QueueOverflowPolicy,
	write_timeout: Duration,
	dropped: Arc<AtomicU64>,
	runtime: Handle,
	task: JoinHandle<()>,
}

impl AuditService {
	/// Must be called from within a tokio runtime. The service keeps a handle
	/// to that runtime, so [`log`](Self::log) may be called from any thread.
	pub fn new(
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		write_timeout: Duration,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));

		let runtime = Handle::current();
		let task = runtime.spawn(Self::background_task(rx, write_timeout, sinks));

		Self {
			tx,
			overflow_policy,
			write_timeout,
			dropped: Arc::new(AtomicU64::new(0)),
			runtime,
			task,
		}
	}

	pub fn from_config(config: &AuditConfig) -> AuditResult<Self> {
		let sinks = sinks_from_config(config)?;
		debug!(sinks = sinks.len(), "starting audit service");
		Ok(Self::new(
			config.queue_capacity,
			config.queue_overflow_policy,
			Duration::from_millis(config.write_timeout_ms),
			sinks,
		))
	}

	async fn background_task(
		mut rx: mpsc::Receiver<AuditRecord>,
		write_timeout: Duration,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(record) = rx.recv().await {
			let record = Arc::new(record);
			let mut writes = JoinSet::new();

			for sink in &sinks {
				if !sink.filter().accepts(record.can) {
					continue;
				}

				let sink = Arc::clone(sink);
				let record = Arc::clone(&record);

				writes.spawn(async move {
					match timeout(write_timeout, sink.write(record)).await {
						Ok(Ok(())) => {}
						Ok(Err(e)) => {
							warn!(sink = sink.name(), error = %e, "audit sink write failed");
						}
						Err(_) => {
							warn!(
								sink = sink.name(),
								timeout_ms = write_timeout.as_millis() as u64,
								"audit sink write timed out"
							);
						}
					}
				});
			}

			while let Some(joined) = writes.join_next().await {
				if let Err(e) = joined {
					warn!(error = %e, "audit sink task failed");
				}
			}
		}

		debug!("audit service stopped");
	}

	/// Queue a record for delivery without waiting.
	///
	/// Returns `true` if the record was queued, `false` if dropped.
	///
	/// # Overflow Policy Behavior
	///
	/// - `DropNewest`: uses `try_send` and drops the new record when the queue is full
	/// - `Block`: spawns a task that waits for capacity, giving up after `write_timeout`
	#[instrument(level = "trace", skip(self, record), fields(audit_id = %record.id))]
	pub fn log(&self, record: AuditRecord) -> bool {
		match self.overflow_policy {
			QueueOverflowPolicy::Block => {
				let tx = self.tx.clone();
				let dropped = Arc::clone(&self.dropped);
				let write_timeout = self.write_timeout;
				self.runtime.spawn(async move {
					if !matches!(timeout(write_timeout, tx.send(record)).await, Ok(Ok(()))) {
						dropped.fetch_add(1, Ordering::Relaxed);
						warn!("audit record dropped: queue stayed full");
					}
				});
				true
			}
			QueueOverflowPolicy::DropNewest => {
				let queued = self.tx.try_send(record).is_ok();
				if !queued {
					self.dropped.fetch_add(1, Ordering::Relaxed);
				}
				queued
			}
		}
	}

	/// Queue a record, waiting at most `write_timeout` for capacity.
	pub async fn log_blocking(&self, record: AuditRecord) -> AuditResult<()> {
		match timeout(self.write_timeout, self.tx.send(record)).await {
			Ok(Ok(())) => Ok(()),
			Ok(Err(_)) => Err(AuditError::Shutdown),
			Err(_) => {
				self.dropped.fetch_add(1, Ordering::Relaxed);
				Err(AuditError::Timeout(self.write_timeout))
			}
		}
	}

	/// Records dropped because the queue was full.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	/// Stops accepting records and waits until everything queued has been
	/// handed to the sinks.
	pub async fn shutdown(self) {
		let Self { tx, task, .. } = self;
		drop(tx);
		if let Err(e) = task.await {
			warn!(error = %e, "audit background task failed");
		}
	}
}
