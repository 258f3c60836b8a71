// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Display, Formatter};

/// Worker pool created.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use fragment_distributor::observability::messages::pool::PoolCreated;
///
/// let msg = PoolCreated { capacity: 8 };
/// tracing::info!("{}", msg);
/// ```
pub struct PoolCreated {
    pub capacity: usize,
}

impl Display for PoolCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Created worker pool with {} execution slots", self.capacity)
    }
}

/// All slots busy; a task was parked in the FIFO queue.
pub struct TaskQueued {
    pub capacity: usize,
    pub queued: usize,
}

impl Display for TaskQueued {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "All {} worker slots busy, task queued (queue depth {})",
            self.capacity, self.queued
        )
    }
}

pub struct TaskPanicked {
    pub slot: usize,
}

impl Display for TaskPanicked {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task on worker slot {} panicked, slot released", self.slot)
    }
}
