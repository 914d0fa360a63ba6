//! Minimal task spawning abstraction
//!
//! The engine needs exactly spawn and join. Keeping them behind a trait lets
//! the pipeline run on native OS threads or a real-time kernel's task API
//! without change; [`StdSpawner`] is the native default.

use std::thread;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn task: {0}")]
    Spawn(String),
}

/// A running task; joining consumes the handle
trait Task: Send {
    fn join(self: Box<Self>);
}

pub struct TaskHandle {
    inner: Box<dyn Task>,
}

impl TaskHandle {
    /// Wait for the task to finish
    pub fn join(self) {
        self.inner.join();
    }
}

/// Spawns named worker tasks
pub trait TaskSpawner: Send + Sync {
    fn spawn(
        &self,
        name: &str,
        f: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<TaskHandle, SpawnError>;
}

/// Native `std::thread` spawner
#[derive(Debug, Default, Clone, Copy)]
pub struct StdSpawner;

struct StdTask {
    handle: thread::JoinHandle<()>,
}

impl Task for StdTask {
    fn join(self: Box<Self>) {
        if self.handle.join().is_err() {
            tracing::error!("worker task panicked");
        }
    }
}

impl TaskSpawner for StdSpawner {
    fn spawn(
        &self,
        name: &str,
        f: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<TaskHandle, SpawnError> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(f)
            .map(|handle| TaskHandle {
                inner: Box::new(StdTask { handle }),
            })
            .map_err(|e| SpawnError::Spawn(e.to_string()))
    }
}

/// Yield the current task's timeslice
pub fn yield_now() {
    thread::yield_now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_spawn_runs_and_joins() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        let handle = StdSpawner
            .spawn("test-task", Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        handle.join();

        assert!(ran.load(Ordering::SeqCst));
    }
}
