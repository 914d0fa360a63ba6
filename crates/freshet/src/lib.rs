//! Freshet: pull-based audio pipeline engine
//!
//! A linear chain of nodes (source → filters → sink) produces fixed-size
//! frames on demand. The engine runs the chain on a dedicated worker thread
//! and hands lifecycle notifications (EOF, error, reconfiguration) to any
//! observer through a bounded queue, so a slow observer can never stall the
//! pull loop.
//!
//! Three pieces make up the core:
//!
//! - **Node contract** ([`node`]): every stage implements open/process/close;
//!   data moves only because something downstream pulled it, recursively down
//!   to the source. One shared frame buffer travels the chain by reference.
//! - **Event queue** ([`events`]): fixed-capacity ring with blocking,
//!   timeout-aware put/get. The worker publishes with no-wait semantics and
//!   drops events on a full queue rather than stalling audio.
//! - **Pipeline engine** ([`pipeline`]): the state machine for init, start,
//!   play/pause, stop, and join, plus the worker loop that pulls one frame
//!   per iteration through the sink.
//!
//! Built-in nodes (gain filter, silence source, buffer source/sink, null
//! sink, WAV file I/O) live in [`nodes`]; anything else plugs in through the
//! [`node::Node`] trait.

pub mod config;
pub mod events;
pub mod format;
pub mod node;
pub mod nodes;
pub mod pipeline;
pub mod task;

pub use config::{ConfigError, PipelineConfig, DEFAULT_EVENT_QUEUE_LEN, MAX_FRAME_SAMPLES};
pub use events::{Event, EventKind, EventQueue, QueueError, Timeout};
pub use format::{AudioFormat, SampleEncoding};
pub use node::{BoxedNode, FrameBuffer, Node, NodeChain, NodeError, NodeRole, Upstream};
pub use nodes::{
    BufferSink, BufferSource, CaptureHandle, GainFilter, NullSink, SilenceSource, WavFileSink,
    WavFileSource, UNITY_GAIN_Q15,
};
pub use pipeline::{Pipeline, PipelineError};
pub use task::{SpawnError, StdSpawner, TaskHandle, TaskSpawner};
