//! Null sink
//!
//! Pulls its upstream and discards the frame. Useful as the chain head when
//! only the side effects of upstream nodes matter.

use crate::node::{FrameBuffer, Node, NodeError, NodeRole, Upstream};

#[derive(Debug, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl Node for NullSink {
    fn role(&self) -> NodeRole {
        NodeRole::Sink
    }

    fn process(
        &mut self,
        upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        match upstream {
            Some(up) => up.pull(frame),
            None => Ok(0),
        }
    }
}
