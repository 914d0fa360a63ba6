//! Pipeline engine and state machine
//!
//! Owns the node chain, the shared frame buffer, the event queue, and the
//! worker thread. The worker pulls one frame per iteration through the sink;
//! EOF or a node error pauses playback and publishes an event. `stop` only
//! pauses; `join` is the single teardown path and the only place nodes get
//! closed, so a close can never race an in-flight `process` call.
//!
//! **Key invariant:** frame pulls run outside the state lock. `play`, `stop`
//! and `join` from the controller only ever wait for the brief state checks,
//! never for a slow `process` call.
//!
//! Caller contract: node `process` implementations must be bounded. A pull
//! that never returns hangs `join` indefinitely; there is no forced-kill
//! path.

use std::sync::{Arc, Condvar, Mutex};

use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig};
use crate::events::{Event, EventQueue, QueueError, Timeout};
use crate::format::AudioFormat;
use crate::node::{BoxedNode, FrameBuffer, NodeChain, NodeError, NodeRole};
use crate::task::{SpawnError, StdSpawner, TaskHandle, TaskSpawner};

/// Controller-facing pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed call: missing chain, wrong node role, wrong state
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("node error: {0}")]
    Node(#[from] NodeError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

/// Control flags guarded by the state lock
#[derive(Default)]
struct ControlFlags {
    playing: bool,
    stop_request: bool,
    running: bool,
}

/// State shared between the controller and the worker
struct Shared {
    flags: Mutex<ControlFlags>,
    cond: Condvar,
    events: EventQueue,
}

/// Chain and frame buffer, locked as a unit
///
/// The worker holds this only for the duration of one pull; the controller
/// touches it only while no worker is running (set_nodes before start, close
/// during join).
struct Workspace {
    chain: Option<NodeChain>,
    frame: FrameBuffer,
}

/// What a single frame pull produced
enum StepOutcome {
    Continue,
    Eof,
    Failed(i32),
}

/// A pull-based audio pipeline bound to one worker thread
pub struct Pipeline {
    config: PipelineConfig,
    format: AudioFormat,
    shared: Arc<Shared>,
    workspace: Arc<Mutex<Workspace>>,
    spawner: Arc<dyn TaskSpawner>,
    worker: Option<TaskHandle>,
}

impl Pipeline {
    /// Create an initialized pipeline on the native thread spawner
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_spawner(config, Arc::new(StdSpawner))
    }

    /// Create an initialized pipeline on a caller-provided spawner
    pub fn with_spawner(
        config: PipelineConfig,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let events = EventQueue::new(config.event_queue_len)
            .map_err(|_| PipelineError::InvalidArgument("event queue capacity must be nonzero"))?;

        Ok(Self {
            format: config.stream,
            workspace: Arc::new(Mutex::new(Workspace {
                chain: None,
                frame: FrameBuffer::new(config.frame_samples),
            })),
            shared: Arc::new(Shared {
                flags: Mutex::new(ControlFlags::default()),
                cond: Condvar::new(),
                events,
            }),
            spawner,
            worker: None,
            config,
        })
    }

    /// Assemble the chain; valid only before `start`
    ///
    /// Wires every node's upstream by position: filter i pulls filter i-1 (or
    /// the source for i = 0), the sink pulls the last filter or the source.
    pub fn set_nodes(
        &mut self,
        source: BoxedNode,
        filters: Vec<BoxedNode>,
        sink: BoxedNode,
    ) -> Result<(), PipelineError> {
        if self.worker.is_some() {
            return Err(PipelineError::InvalidArgument(
                "nodes cannot change once started",
            ));
        }
        if source.role() != NodeRole::Source {
            return Err(PipelineError::InvalidArgument("source node must be a Source"));
        }
        if sink.role() != NodeRole::Sink {
            return Err(PipelineError::InvalidArgument("sink node must be a Sink"));
        }
        if filters.iter().any(|f| f.role() != NodeRole::Filter) {
            return Err(PipelineError::InvalidArgument("filter nodes must be Filters"));
        }

        let chain = NodeChain::new(source, filters, sink);
        tracing::debug!(nodes = chain.len(), "chain assembled");
        self.workspace.lock().unwrap().chain = Some(chain);
        Ok(())
    }

    /// Replace the stream format; plain assignment, valid before or after start
    pub fn set_format(&mut self, format: AudioFormat) {
        self.format = format;
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Open all nodes and spawn the worker; no-op if already started
    ///
    /// Any `open` failure aborts before a thread exists, so a partially
    /// started pipeline is never observable.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.worker.is_some() {
            return Ok(());
        }

        {
            let mut workspace = self.workspace.lock().unwrap();
            let chain = workspace
                .chain
                .as_mut()
                .ok_or(PipelineError::InvalidArgument("start requires a node chain"))?;
            chain.open_all()?;
        }

        {
            let mut flags = self.shared.flags.lock().unwrap();
            flags.stop_request = false;
            flags.playing = false;
            flags.running = true;
        }

        let shared = self.shared.clone();
        let workspace = self.workspace.clone();
        let spawned = self.spawner.spawn(
            &self.config.thread_name,
            Box::new(move || worker_loop(shared, workspace)),
        );

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                tracing::info!(thread = %self.config.thread_name, "pipeline started");
                Ok(())
            }
            Err(e) => {
                self.shared.flags.lock().unwrap().running = false;
                Err(e.into())
            }
        }
    }

    /// Resume frame pulls; re-entrant
    pub fn play(&mut self) -> Result<(), PipelineError> {
        if self.worker.is_none() {
            return Err(PipelineError::InvalidArgument("pipeline not started"));
        }

        let mut flags = self.shared.flags.lock().unwrap();
        flags.playing = true;
        self.shared.cond.notify_all();
        tracing::debug!("play");
        Ok(())
    }

    /// Pause frame pulls without tearing down the worker; re-entrant
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if self.worker.is_none() {
            return Err(PipelineError::InvalidArgument("pipeline not started"));
        }

        let mut flags = self.shared.flags.lock().unwrap();
        flags.playing = false;
        self.shared.cond.notify_all();
        tracing::debug!("stop");
        Ok(())
    }

    /// Request worker exit, wait for it, then close all nodes sink → source
    ///
    /// Every node's close is attempted; the first error is returned. A
    /// subsequent `start` re-opens the chain and spawns a fresh worker.
    pub fn join(&mut self) -> Result<(), PipelineError> {
        let handle = self
            .worker
            .take()
            .ok_or(PipelineError::InvalidArgument("pipeline not started"))?;

        {
            let mut flags = self.shared.flags.lock().unwrap();
            flags.stop_request = true;
            self.shared.cond.notify_all();
        }

        handle.join();

        let result = match self.workspace.lock().unwrap().chain.as_mut() {
            Some(chain) => chain.close_all(),
            None => Ok(()),
        };

        tracing::info!("pipeline joined");
        result.map_err(PipelineError::from)
    }

    /// Wait for the next lifecycle event
    pub fn get_event(&self, timeout: Timeout) -> Result<Event, QueueError> {
        self.shared.events.get(timeout)
    }

    pub fn is_started(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the worker thread is alive; it only ever exits inside `join`
    pub fn is_running(&self) -> bool {
        self.shared.flags.lock().unwrap().running
    }

    pub fn is_playing(&self) -> bool {
        self.shared.flags.lock().unwrap().playing
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // A dropped pipeline must not leak its worker; close errors have
        // nowhere to go here
        if self.worker.is_some() {
            let _ = self.join();
        }
    }
}

/// Worker body: idle-wait until playing, pull one frame, repeat
fn worker_loop(shared: Arc<Shared>, workspace: Arc<Mutex<Workspace>>) {
    tracing::debug!("worker up");

    let mut flags = shared.flags.lock().unwrap();
    while !flags.stop_request {
        if !flags.playing {
            flags = shared
                .cond
                .wait_while(flags, |f| !f.playing && !f.stop_request)
                .unwrap();
            if flags.stop_request {
                break;
            }
        }

        drop(flags);
        let outcome = step(&workspace);
        flags = shared.flags.lock().unwrap();

        match outcome {
            StepOutcome::Continue => {}
            StepOutcome::Eof => {
                publish(&shared, Event::eof());
                flags.playing = false;
            }
            StepOutcome::Failed(code) => {
                publish(&shared, Event::error(code));
                flags.playing = false;
            }
        }
    }

    flags.running = false;
    drop(flags);
    tracing::debug!("worker exit");
}

/// Pull one frame through the sink
fn step(workspace: &Mutex<Workspace>) -> StepOutcome {
    let mut guard = workspace.lock().unwrap();
    let workspace = &mut *guard;

    let Some(chain) = workspace.chain.as_mut() else {
        // start() refuses to spawn without a chain
        return StepOutcome::Failed(NodeError::NotImplemented.code());
    };

    match chain.pull(&mut workspace.frame) {
        Ok(0) => StepOutcome::Eof,
        Ok(_) => StepOutcome::Continue,
        Err(e) => {
            tracing::debug!(error = %e, "frame pull failed");
            StepOutcome::Failed(e.code())
        }
    }
}

/// Publish with no-wait semantics: a full queue drops the notification
/// instead of stalling the pull loop.
fn publish(shared: &Shared, event: Event) {
    if shared.events.put(event, Timeout::NoWait).is_err() {
        tracing::debug!(?event, "event queue full, dropping");
    }
}
