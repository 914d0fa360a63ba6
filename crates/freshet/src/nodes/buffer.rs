//! In-memory source and capture sink
//!
//! The pair that exercises a chain end to end without touching the
//! filesystem: [`BufferSource`] feeds a prepared sample vector one frame at
//! a time, [`BufferSink`] pulls its upstream and appends everything it sees
//! into a shared capture vector. The sink can be told to fail on a given
//! pull with a chosen error code, which is how the error-isolation paths get
//! tested.

use std::sync::{Arc, Mutex};

use crate::node::{FrameBuffer, Node, NodeError, NodeRole, Upstream};

/// Feeds a fixed sample vector, one frame per pull, then reports EOF
pub struct BufferSource {
    data: Vec<i32>,
    offset: usize,
}

impl BufferSource {
    pub fn new(data: Vec<i32>) -> Self {
        Self { data, offset: 0 }
    }
}

impl Node for BufferSource {
    fn role(&self) -> NodeRole {
        NodeRole::Source
    }

    fn open(&mut self) -> Result<(), NodeError> {
        self.offset = 0;
        Ok(())
    }

    fn process(
        &mut self,
        _upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        let remaining = self.data.len() - self.offset;
        if remaining == 0 {
            return Ok(0);
        }

        let to_copy = remaining.min(frame.capacity());
        frame.data_mut()[..to_copy]
            .copy_from_slice(&self.data[self.offset..self.offset + to_copy]);
        self.offset += to_copy;
        Ok(to_copy)
    }
}

/// Shared handle onto a [`BufferSink`]'s captured samples
///
/// Clone one before boxing the sink into a pipeline; the pipeline owns the
/// node for its lifetime, so this is the only way to read the capture
/// afterwards.
#[derive(Clone, Default)]
pub struct CaptureHandle {
    samples: Arc<Mutex<Vec<i32>>>,
}

impl CaptureHandle {
    pub fn samples(&self) -> Vec<i32> {
        self.samples.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pulls its upstream and captures every sample it sees
pub struct BufferSink {
    capture: CaptureHandle,
    fail_on_pull: Option<(usize, i32)>,
    pulls: usize,
}

impl BufferSink {
    pub fn new() -> Self {
        Self {
            capture: CaptureHandle::default(),
            fail_on_pull: None,
            pulls: 0,
        }
    }

    /// Fail the `pull`-th process call (0-based) with `code`
    pub fn fail_on_pull(mut self, pull: usize, code: i32) -> Self {
        self.fail_on_pull = Some((pull, code));
        self
    }

    pub fn capture(&self) -> CaptureHandle {
        self.capture.clone()
    }
}

impl Default for BufferSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for BufferSink {
    fn role(&self) -> NodeRole {
        NodeRole::Sink
    }

    fn open(&mut self) -> Result<(), NodeError> {
        self.pulls = 0;
        self.capture.samples.lock().unwrap().clear();
        Ok(())
    }

    fn process(
        &mut self,
        upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        let pull = self.pulls;
        self.pulls += 1;

        if let Some((fail_pull, code)) = self.fail_on_pull {
            if pull == fail_pull {
                return Err(NodeError::Device(code));
            }
        }

        let up = upstream.ok_or(NodeError::NoUpstream)?;
        let produced = up.pull(frame)?;
        if produced == 0 {
            return Ok(0);
        }

        self.capture.samples.lock().unwrap().extend_from_slice(frame.data());
        Ok(produced)
    }
}
