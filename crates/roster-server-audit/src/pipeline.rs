// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use roster_server_config::QueueOverflowPolicy;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, instrument, warn};

use crate::error::{AuditError, AuditResult};
use crate::event::AuditLogEntry;
use crate::filter::AuditFilterConfig;
use crate::sink::AuditSink;

/// Delivery counters, exposed for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
	/// Entries accepted onto the queue.
	pub queued: u64,
	/// Entries rejected because the queue was full or closed.
	pub dropped: u64,
	/// Failed sink publish attempts.
	pub sink_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
	queued: AtomicU64,
	dropped: AtomicU64,
	sink_failures: AtomicU64,
}

/// Block-policy sends still waiting for queue space.
#[derive(Debug, Default)]
struct PendingSends {
	count: AtomicUsize,
	idle: Notify,
}

impl PendingSends {
	fn begin(&self) {
		self.count.fetch_add(1, Ordering::AcqRel);
	}

	fn finish(&self) {
		if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
			self.idle.notify_waiters();
		}
	}

	async fn wait_idle(&self) {
		loop {
			let idle = self.idle.notified();
			tokio::pin!(idle);
			idle.as_mut().enable();
			if self.count.load(Ordering::Acquire) == 0 {
				return;
			}
			idle.await;
		}
	}
}

pub struct AuditService {
	tx: mpsc::Sender<AuditLogEntry>,
	overflow_policy: QueueOverflowPolicy,
	counters: Arc<Counters>,
	pending: Arc<PendingSends>,
	shutdown: Arc<Notify>,
	worker: Mutex<Option<JoinHandle<()>>>,
}

impl AuditService {
	/// Starts the background fan-out task. Must be called inside a tokio
	/// runtime.
	pub fn new(
		global_filter: AuditFilterConfig,
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));
		let counters = Arc::new(Counters::default());
		let shutdown = Arc::new(Notify::new());

		let worker = tokio::spawn(Self::background_task(
			rx,
			global_filter,
			sinks,
			Arc::clone(&counters),
			Arc::clone(&shutdown),
		));

		Self {
			tx,
			overflow_policy,
			counters,
			pending: Arc::new(PendingSends::default()),
			shutdown,
			worker: Mutex::new(Some(worker)),
		}
	}

	async fn background_task(
		mut rx: mpsc::Receiver<AuditLogEntry>,
		global_filter: AuditFilterConfig,
		sinks: Vec<Arc<dyn AuditSink>>,
		counters: Arc<Counters>,
		shutdown: Arc<Notify>,
	) {
		let mut in_flight = JoinSet::new();

		loop {
			let next = tokio::select! {
				entry = rx.recv() => entry,
				_ = shutdown.notified() => {
					// Stop accepting, then drain what is already queued.
					rx.close();
					rx.recv().await
				}
			};
			let Some(entry) = next else {
				break;
			};

			while in_flight.try_join_next().is_some() {}

			if !global_filter.allows(&entry) {
				continue;
			}

			let entry = Arc::new(entry);

			for sink in &sinks {
				if !sink.filter().allows(&entry) {
					continue;
				}

				let sink = Arc::clone(sink);
				let entry = Arc::clone(&entry);
				let counters = Arc::clone(&counters);

				in_flight.spawn(async move {
					if let Err(e) = sink.publish(entry).await {
						counters.sink_failures.fetch_add(1, Ordering::Relaxed);
						let err = AuditError::SinkError {
							sink: sink.name().to_string(),
							source: e,
						};
						warn!(error = %err, "audit sink publish failed");
					}
				});
			}
		}

		while in_flight.join_next().await.is_some() {}
		debug!("audit pipeline drained");
	}

	/// Waits for pending block-policy sends, stops accepting entries, then
	/// waits until every queued entry has been offered to every sink. Later
	/// calls return immediately.
	pub async fn shutdown(&self) {
		let Some(worker) = self.worker.lock().await.take() else {
			return;
		};
		self.pending.wait_idle().await;
		self.shutdown.notify_one();
		if let Err(e) = worker.await {
			warn!(error = %e, "audit pipeline task failed");
		}
	}

	/// Log an audit event to the queue for processing.
	///
	/// Returns `true` if the event was queued, `false` if dropped. Never
	/// blocks the caller.
	///
	/// # Overflow Policy Behavior
	///
	/// - `Block`: Spawns a task that waits for queue space
	/// - `DropNewest`: Drops the new event when the queue is full
	/// - `DropOldest`: Currently behaves like DropNewest
	#[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
	pub fn log(&self, entry: AuditLogEntry) -> bool {
		match self.overflow_policy {
			QueueOverflowPolicy::Block => {
				let tx = self.tx.clone();
				let counters = Arc::clone(&self.counters);
				let pending = Arc::clone(&self.pending);
				pending.begin();
				tokio::spawn(async move {
					match tx.send(entry).await {
						Ok(()) => {
							counters.queued.fetch_add(1, Ordering::Relaxed);
						}
						Err(_) => {
							counters.dropped.fetch_add(1, Ordering::Relaxed);
							warn!("audit queue closed, event dropped");
						}
					}
					pending.finish();
				});
				true
			}
			QueueOverflowPolicy::DropNewest | QueueOverflowPolicy::DropOldest => {
				match self.try_log(entry) {
					Ok(()) => true,
					Err(e) => {
						warn!(error = %e, "audit event dropped");
						false
					}
				}
			}
		}
	}

	/// Queue an event without waiting, reporting why it was not queued.
	pub fn try_log(&self, entry: AuditLogEntry) -> AuditResult<()> {
		match self.tx.try_send(entry) {
			Ok(()) => {
				self.counters.queued.fetch_add(1, Ordering::Relaxed);
				Ok(())
			}
			Err(mpsc::error::TrySendError::Full(_)) => {
				self.counters.dropped.fetch_add(1, Ordering::Relaxed);
				Err(AuditError::QueueFull)
			}
			Err(mpsc::error::TrySendError::Closed(_)) => {
				self.counters.dropped.fetch_add(1, Ordering::Relaxed);
				Err(AuditError::Shutdown)
			}
		}
	}

	/// Queue an event, waiting for space.
	pub async fn log_blocking(&self, entry: AuditLogEntry) -> AuditResult<()> {
		match self.tx.send(entry).await {
			Ok(()) => {
				self.counters.queued.fetch_add(1, Ordering::Relaxed);
				Ok(())
			}
			Err(_) => {
				self.counters.dropped.fetch_add(1, Ordering::Relaxed);
				Err(AuditError::Shutdown)
			}
		}
	}

	pub fn stats(&self) -> AuditStats {
		AuditStats {
			queued: self.counters.queued.load(Ordering::Relaxed),
			dropped: self.counters.dropped.load(Ordering::Relaxed),
			sink_failures: self.counters.sink_failures.load(Ordering::Relaxed),
		}
	}
}
