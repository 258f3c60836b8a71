// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded worker pool with a FIFO overflow queue.
//!
//! The pool owns a fixed set of execution units, one per slot, created once at
//! construction and reused for the life of the process. A submitted task runs
//! on a free slot immediately; while every slot is busy tasks wait in arrival
//! order and are started by whichever slot frees up next.
//!
//! # Architecture
//!
//! ```text
//!   submit(task) ──► claim_or_enqueue ──► free slot? ──yes──► spawn_blocking(drive)
//!                                              │                       │
//!                                              no                 run task
//!                                              ▼                       │
//!                                       queue.push_back      queue empty? ──no──► pop_front, run
//!                                                                      │
//!                                                                     yes
//!                                                                      ▼
//!                                                               slot back to free
//! ```
//!
//! Tasks are synchronous closures and run on tokio's blocking thread pool, so
//! slots execute in parallel. Pool bookkeeping lives behind a single
//! `parking_lot::Mutex` that is only held for push/pop operations, never while
//! a task runs and never across an `.await`.
//!
//! A task that panics resolves as [`PoolError::TaskPanicked`]; its slot is
//! released like any other.

use crate::observability::messages::pool::{PoolCreated, TaskPanicked, TaskQueued};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("Worker pool must be created inside a tokio runtime")]
    NoRuntime,

    #[error("Task panicked on its worker slot")]
    TaskPanicked,

    #[error("Worker pool shut down before the task completed")]
    Shutdown,
}

/// Number of slots to create when none is configured.
pub fn default_capacity() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}

/// One isolated execution context. Owned by the pool while free and by the
/// running task while busy.
#[derive(Debug)]
pub struct WorkerSlot<U> {
    index: usize,
    unit: U,
}

impl<U> WorkerSlot<U> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }

    pub fn unit_mut(&mut self) -> &mut U {
        &mut self.unit
    }
}

type Job<U> = Box<dyn FnOnce(&mut WorkerSlot<U>) + Send + 'static>;

struct PoolState<U> {
    free: Vec<WorkerSlot<U>>,
    busy: usize,
    queue: VecDeque<Job<U>>,
}

struct PoolInner<U> {
    capacity: usize,
    state: Mutex<PoolState<U>>,
    runtime: Handle,
}

impl<U: Send + 'static> PoolInner<U> {
    /// Run `job`, then keep draining the queue on the same slot until it is
    /// empty, then hand the slot back.
    fn drive(&self, mut slot: WorkerSlot<U>, mut job: Job<U>) {
        loop {
            job(&mut slot);

            let mut state = self.state.lock();
            match state.queue.pop_front() {
                Some(next) => {
                    drop(state);
                    job = next;
                }
                None => {
                    state.busy -= 1;
                    state.free.push(slot);
                    return;
                }
            }
        }
    }
}

pub struct WorkerPool<U: Send + 'static> {
    inner: Arc<PoolInner<U>>,
}

impl<U: Send + 'static> Clone for WorkerPool<U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<U: Send + 'static> std::fmt::Debug for WorkerPool<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WorkerPool")
            .field("capacity", &self.inner.capacity)
            .field("busy", &state.busy)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl<U: Send + 'static> WorkerPool<U> {
    /// Create `capacity` slots (at least one), calling `template` once per slot.
    ///
    /// Must be called from within a tokio runtime; the runtime handle is kept
    /// for spawning blocking tasks later.
    pub fn new<F>(capacity: usize, template: F) -> Result<Self, PoolError>
    where
        F: Fn(usize) -> U,
    {
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        let capacity = capacity.max(1);

        // Popped from the back, so slot 0 is handed out first.
        let free = (0..capacity)
            .rev()
            .map(|index| WorkerSlot {
                index,
                unit: template(index),
            })
            .collect();

        info!("{}", PoolCreated { capacity });

        Ok(Self {
            inner: Arc::new(PoolInner {
                capacity,
                state: Mutex::new(PoolState {
                    free,
                    busy: 0,
                    queue: VecDeque::new(),
                }),
                runtime,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn busy(&self) -> usize {
        self.inner.state.lock().busy
    }

    pub fn queued(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Take a free slot without waiting. `None` when every slot is busy.
    pub fn acquire(&self) -> Option<WorkerSlot<U>> {
        let mut state = self.inner.state.lock();
        let slot = state.free.pop()?;
        state.busy += 1;
        Some(slot)
    }

    /// Return a slot taken with [`acquire`](Self::acquire).
    ///
    /// If tasks are waiting, the oldest one starts on this slot immediately.
    pub fn release(&self, slot: WorkerSlot<U>) {
        let job = {
            let mut state = self.inner.state.lock();
            match state.queue.pop_front() {
                Some(job) => job,
                None => {
                    state.busy -= 1;
                    state.free.push(slot);
                    return;
                }
            }
        };

        debug!("Slot {} released, starting queued task", slot.index);
        self.spawn(slot, job);
    }

    /// Run `task` on a worker slot and return its output.
    ///
    /// Starts immediately when a slot is free, otherwise waits in FIFO order.
    pub async fn submit<F, R>(&self, task: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut WorkerSlot<U>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job<U> = Box::new(move |slot: &mut WorkerSlot<U>| {
            let index = slot.index;
            let outcome = catch_unwind(AssertUnwindSafe(|| task(slot))).map_err(|_| {
                warn!("{}", TaskPanicked { slot: index });
                PoolError::TaskPanicked
            });
            // Receiver gone means the caller stopped waiting; the slot is still released.
            let _ = tx.send(outcome);
        });

        if let Some((slot, job)) = self.claim_or_enqueue(job) {
            self.spawn(slot, job);
        }

        rx.await.unwrap_or(Err(PoolError::Shutdown))
    }

    fn claim_or_enqueue(&self, job: Job<U>) -> Option<(WorkerSlot<U>, Job<U>)> {
        let mut state = self.inner.state.lock();
        match state.free.pop() {
            Some(slot) => {
                state.busy += 1;
                Some((slot, job))
            }
            None => {
                state.queue.push_back(job);
                debug!(
                    "{}",
                    TaskQueued {
                        capacity: self.inner.capacity,
                        queued: state.queue.len(),
                    }
                );
                None
            }
        }
    }

    fn spawn(&self, slot: WorkerSlot<U>, job: Job<U>) {
        let inner = Arc::clone(&self.inner);
        self.inner
            .runtime
            .spawn_blocking(move || inner.drive(slot, job));
    }
}
