//! Node contract for the pull-based chain
//!
//! A node is one stage of the audio chain: source, filter, or sink. There is
//! no push path: the engine pulls the sink, the sink pulls its upstream
//! through the handle it is given, and so on down to the source. Results
//! propagate back through the one shared [`FrameBuffer`]; no intermediate
//! buffering exists between stages.
//!
//! The chain owner stores nodes tail-to-head (source first, sink last), so a
//! node's upstream is simply everything before it in the owned slice. The
//! linkage is positional: it cannot dangle, alias, or form a cycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position of a node in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Source,
    Filter,
    Sink,
}

/// Error reported by a node operation
///
/// Codes are errno-style negatives, matching what device and codec layers
/// report; [`NodeError::code`] is what `Error` events carry verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The node has no `process` implementation
    #[error("node does not implement process")]
    NotImplemented,

    /// A filter or sink was pulled without an upstream wired
    #[error("node has no upstream")]
    NoUpstream,

    /// A node reported more samples than the frame can hold
    #[error("node produced {produced} samples into capacity {capacity}")]
    Overrun { produced: usize, capacity: usize },

    /// I/O failure in a file-backed node
    #[error("node i/o error: {0}")]
    Io(String),

    /// Device or codec error code, surfaced verbatim
    #[error("node device error {0}")]
    Device(i32),
}

impl NodeError {
    /// Stable code carried inside `Error` events
    pub fn code(&self) -> i32 {
        match self {
            NodeError::NotImplemented => -38,
            NodeError::NoUpstream => -95,
            NodeError::Overrun { .. } => -75,
            NodeError::Io(_) => -5,
            NodeError::Device(code) => *code,
        }
    }
}

/// Reusable fixed-capacity sample buffer shared down the chain
///
/// Capacity is fixed at construction; `len` tracks the samples produced by
/// the most recent pull. Reusing one buffer per iteration keeps the pull
/// path allocation-free.
#[derive(Debug)]
pub struct FrameBuffer {
    samples: Vec<i32>,
    len: usize,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0; capacity],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Samples produced by the most recent pull
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full-capacity mutable view for producers
    pub fn data_mut(&mut self) -> &mut [i32] {
        &mut self.samples
    }

    /// The in-use prefix written by the most recent pull
    pub fn data(&self) -> &[i32] {
        &self.samples[..self.len]
    }

    /// Mutable in-use prefix, for in-place transforms
    pub fn produced_mut(&mut self) -> &mut [i32] {
        let len = self.len;
        &mut self.samples[..len]
    }

    fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.samples.len());
        self.len = len.min(self.samples.len());
    }
}

/// Upstream pull handle handed to filters and sinks
///
/// Pulling drives the rest of the chain recursively down to the source; on
/// success the frame's in-use length is set to the produced count, so the
/// caller may read `frame.data()` directly.
pub trait Upstream {
    fn pull(&mut self, frame: &mut FrameBuffer) -> Result<usize, NodeError>;
}

/// One stage of the audio chain
///
/// `open` and `close` default to no-ops. `process` defaults to
/// [`NodeError::NotImplemented`]: a node that can neither produce nor
/// forward samples is a contract violation, not a silent success.
pub trait Node: Send {
    fn role(&self) -> NodeRole;

    /// Allocate or reset runtime state; called source → sink before the first pull
    fn open(&mut self) -> Result<(), NodeError> {
        Ok(())
    }

    /// Produce `0 < n <= frame.capacity()` samples, or 0 for end of stream
    ///
    /// Filters and sinks receive `Some(upstream)` and are expected to pull it,
    /// then transform the frame in place or pass it through. A returned error
    /// means the buffer contents are not to be trusted.
    fn process(
        &mut self,
        upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        let _ = (upstream, frame);
        Err(NodeError::NotImplemented)
    }

    /// Release runtime state; called sink → source so sinks flush first
    fn close(&mut self) -> Result<(), NodeError> {
        Ok(())
    }
}

pub type BoxedNode = Box<dyn Node>;

/// Owner of an assembled chain: source, filters in order, sink
pub struct NodeChain {
    nodes: Vec<BoxedNode>,
}

impl NodeChain {
    /// Assemble a chain; callers validate roles before constructing
    pub fn new(source: BoxedNode, filters: Vec<BoxedNode>, sink: BoxedNode) -> Self {
        let mut nodes = Vec::with_capacity(filters.len() + 2);
        nodes.push(source);
        nodes.extend(filters);
        nodes.push(sink);
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Open every node, source → filters → sink; the first failure aborts
    pub fn open_all(&mut self) -> Result<(), NodeError> {
        for node in self.nodes.iter_mut() {
            node.open()?;
        }
        Ok(())
    }

    /// Close every node, sink → filters → source
    ///
    /// Best effort: every node's close is attempted even when an earlier one
    /// failed; the first error encountered is the one returned.
    pub fn close_all(&mut self) -> Result<(), NodeError> {
        let mut first_err = None;
        for node in self.nodes.iter_mut().rev() {
            if let Err(e) = node.close() {
                tracing::warn!(error = %e, "node close failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Pull one frame through the sink
    pub fn pull(&mut self, frame: &mut FrameBuffer) -> Result<usize, NodeError> {
        pull_segment(&mut self.nodes, frame)
    }
}

/// Pull the last node of `nodes`, wiring everything before it as upstream
fn pull_segment(nodes: &mut [BoxedNode], frame: &mut FrameBuffer) -> Result<usize, NodeError> {
    let Some((head, rest)) = nodes.split_last_mut() else {
        return Ok(0);
    };

    let produced = if rest.is_empty() {
        head.process(None, frame)?
    } else {
        let mut upstream = SegmentUpstream { nodes: rest };
        head.process(Some(&mut upstream), frame)?
    };

    if produced > frame.capacity() {
        return Err(NodeError::Overrun {
            produced,
            capacity: frame.capacity(),
        });
    }

    frame.set_len(produced);
    Ok(produced)
}

struct SegmentUpstream<'a> {
    nodes: &'a mut [BoxedNode],
}

impl Upstream for SegmentUpstream<'_> {
    fn pull(&mut self, frame: &mut FrameBuffer) -> Result<usize, NodeError> {
        pull_segment(self.nodes, frame)
    }
}
