//! Bounded lifecycle event queue
//!
//! Fixed-capacity ring buffer of [`Event`] with blocking, timeout-aware
//! put/get. One mutex and one condition variable are shared by waiters of
//! both kinds; successful operations broadcast, so there is no FIFO fairness
//! among waiters, only FIFO ordering of the events themselves.
//!
//! Deadlines are computed against the monotonic clock (`Instant`), so a wall
//! clock step can never extend or cut short a timed wait.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The source reported end of stream; the pipeline paused
    Eof,
    /// A node reported an error; the pipeline paused
    Error,
    /// Reserved for runtime reconfiguration; never published today
    Reconfig,
}

/// Lifecycle notification delivered from the worker to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Node error code, present for [`EventKind::Error`]
    pub error: Option<i32>,
}

impl Event {
    pub fn eof() -> Self {
        Self {
            kind: EventKind::Eof,
            error: None,
        }
    }

    pub fn error(code: i32) -> Self {
        Self {
            kind: EventKind::Error,
            error: Some(code),
        }
    }

    pub fn reconfig() -> Self {
        Self {
            kind: EventKind::Reconfig,
            error: None,
        }
    }
}

/// How long a queue operation may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Fail immediately if the operation cannot proceed
    NoWait,
    /// Block until the operation can proceed
    Forever,
    /// Block up to the given duration, then fail
    After(Duration),
}

/// Queue operation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// No-wait operation on a full (put) or empty (get) queue
    #[error("operation would block")]
    WouldBlock,

    /// Timed wait elapsed without the queue becoming usable
    #[error("timed out waiting on event queue")]
    TimedOut,

    /// Capacity must be nonzero at construction
    #[error("event queue capacity must be nonzero")]
    ZeroCapacity,
}

struct Ring {
    slots: Box<[Option<Event>]>,
    read_idx: usize,
    write_idx: usize,
    count: usize,
}

impl Ring {
    fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Fixed-capacity blocking queue of lifecycle events
///
/// Safe for arbitrary producers and consumers through a shared reference;
/// the pipeline uses it single-producer/single-consumer but the queue does
/// not rely on that.
pub struct EventQueue {
    ring: Mutex<Ring>,
    cond: Condvar,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        Ok(Self {
            ring: Mutex::new(Ring {
                slots: vec![None; capacity].into_boxed_slice(),
                read_idx: 0,
                write_idx: 0,
                count: 0,
            }),
            cond: Condvar::new(),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events currently queued
    pub fn len(&self) -> usize {
        self.ring.lock().unwrap().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an event, blocking per `timeout` while the queue is full
    pub fn put(&self, event: Event, timeout: Timeout) -> Result<(), QueueError> {
        let guard = self.ring.lock().unwrap();
        let mut ring = self.wait_until(guard, timeout, |r| !r.is_full())?;

        let idx = ring.write_idx;
        ring.slots[idx] = Some(event);
        ring.write_idx = (idx + 1) % self.capacity;
        ring.count += 1;

        self.cond.notify_all();
        Ok(())
    }

    /// Remove the oldest event, blocking per `timeout` while the queue is empty
    pub fn get(&self, timeout: Timeout) -> Result<Event, QueueError> {
        let guard = self.ring.lock().unwrap();
        let mut ring = self.wait_until(guard, timeout, |r| !r.is_empty())?;

        let idx = ring.read_idx;
        let event = ring.slots[idx]
            .take()
            .unwrap_or_else(|| unreachable!("count > 0 implies slot occupied"));
        ring.read_idx = (idx + 1) % self.capacity;
        ring.count -= 1;

        self.cond.notify_all();
        Ok(event)
    }

    /// Block until `ready` holds, honoring the timeout policy
    fn wait_until<'a, F>(
        &self,
        mut guard: MutexGuard<'a, Ring>,
        timeout: Timeout,
        ready: F,
    ) -> Result<MutexGuard<'a, Ring>, QueueError>
    where
        F: Fn(&Ring) -> bool,
    {
        if ready(&guard) {
            return Ok(guard);
        }

        match timeout {
            Timeout::NoWait => Err(QueueError::WouldBlock),
            Timeout::Forever => {
                while !ready(&guard) {
                    guard = self.cond.wait(guard).unwrap();
                }
                Ok(guard)
            }
            Timeout::After(duration) => {
                let deadline = Instant::now() + duration;
                while !ready(&guard) {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(QueueError::TimedOut);
                    }
                    (guard, _) = self.cond.wait_timeout(guard, remaining).unwrap();
                }
                Ok(guard)
            }
        }
    }
}
