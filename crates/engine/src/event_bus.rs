// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Bus (spec §4.6, C4): pub/sub fan-out keyed on an event's wire
//! tag. Spec §9 flags the source's "unbounded handler fan-out" (one
//! spawned task per handler per publish) as a defect; this bus instead
//! dispatches onto a fixed worker pool sized to `cores * 2` with a
//! bounded job queue, so publish volume can never outrun the number of
//! concurrently-running handlers. A handler that panics is caught and
//! logged; it never takes down the pool or a sibling handler (spec §4.6).

use std::collections::HashMap;
use std::sync::Arc;

use brummer_core::Event;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Bounded per-worker job queue depth (spec §5: saturated handler
/// dispatch backs off rather than growing without limit).
const QUEUE_DEPTH_PER_WORKER: usize = 64;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("event queue is full")]
    QueueFull,
}

/// A subscriber callback. Boxed so the bus can hold a heterogeneous set
/// of closures per tag; must be `Send + Sync` since it runs on a pool
/// worker, not the publisher's own task.
pub type Handler = Arc<dyn Fn(Event) + Send + Sync>;

struct Job {
    handler: Handler,
    event: Event,
}

/// Fixed worker pool plus a tag-keyed subscriber table (spec §4.6, §9).
pub struct EventBus {
    subscribers: RwLock<HashMap<&'static str, Vec<Handler>>>,
    workers: Vec<mpsc::Sender<Job>>,
    next_worker: std::sync::atomic::AtomicUsize,
}

impl EventBus {
    /// `worker_count` defaults to `cores * 2` when `None` (spec §9's
    /// recommended sizing); each worker owns a bounded queue of
    /// [`QUEUE_DEPTH_PER_WORKER`] pending jobs.
    pub fn new(worker_count: Option<usize>) -> Arc<Self> {
        let worker_count = worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get() * 2)
                .unwrap_or(4)
        });

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let (tx, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH_PER_WORKER);
            tokio::spawn(async move {
                while let Some(job) = rx.recv().await {
                    run_handler_isolated(id, job).await;
                }
            });
            workers.push(tx);
        }

        Arc::new(Self {
            subscribers: RwLock::new(HashMap::new()),
            workers,
            next_worker: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    /// Registers `handler` for every event whose [`Event::tag`] equals
    /// `tag` (spec §4.6: "subscribers register by event-type tag").
    pub fn subscribe(&self, tag: &'static str, handler: Handler) {
        self.subscribers.write().entry(tag).or_default().push(handler);
    }

    /// Fans `event` out to every subscriber of its tag, each dispatched
    /// onto a pool worker chosen round-robin. Non-blocking: a saturated
    /// worker queue surfaces `QueueFull` rather than blocking the
    /// publisher, matching the `output`-class backpressure policy in
    /// spec §9 (lifecycle events are low-volume enough that callers
    /// needing the stricter block-with-timeout policy can retry).
    pub fn publish(&self, event: Event) -> Result<(), EventBusError> {
        let tag = event.tag();
        let handlers: Vec<Handler> = self
            .subscribers
            .read()
            .get(tag)
            .cloned()
            .unwrap_or_default();

        let mut saturated = false;
        for handler in handlers {
            let worker = self.pick_worker();
            let job = Job {
                handler,
                event: event.clone(),
            };
            if worker.try_send(job).is_err() {
                saturated = true;
            }
        }

        if saturated {
            Err(EventBusError::QueueFull)
        } else {
            Ok(())
        }
    }

    fn pick_worker(&self) -> &mpsc::Sender<Job> {
        let index = self
            .next_worker
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.workers.len();
        &self.workers[index]
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

/// Runs `job.handler` behind `catch_unwind` so a panicking subscriber
/// neither kills this worker nor blocks sibling handlers already queued
/// on other workers (spec §4.6: "Handlers must be isolated"). The
/// handler itself is synchronous, so the pool worker briefly blocks its
/// own task while it runs — acceptable since each worker's queue is
/// bounded and handlers are expected to be cheap formatting/dispatch
/// code, not blocking I/O.
async fn run_handler_isolated(worker_id: usize, job: Job) {
    let Job { handler, event } = job;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event)));
    if let Err(panic) = result {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        error!(worker_id, message, "event bus handler panicked; isolated");
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            warn!("event bus dropped with {} worker tasks outstanding", self.workers.len());
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
