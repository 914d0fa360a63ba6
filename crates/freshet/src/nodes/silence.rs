//! Silence source
//!
//! Produces a fixed number of zeroed frames, then end of stream. The
//! exhaustion counter is per-instance, so any number of pipelines can run in
//! one process without sharing state.

use crate::node::{FrameBuffer, Node, NodeError, NodeRole, Upstream};

pub struct SilenceSource {
    frames_total: usize,
    frames_left: usize,
}

impl SilenceSource {
    pub fn new(frames: usize) -> Self {
        Self {
            frames_total: frames,
            frames_left: frames,
        }
    }
}

impl Node for SilenceSource {
    fn role(&self) -> NodeRole {
        NodeRole::Source
    }

    fn open(&mut self) -> Result<(), NodeError> {
        self.frames_left = self.frames_total;
        Ok(())
    }

    fn process(
        &mut self,
        _upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        if self.frames_left == 0 {
            return Ok(0);
        }
        self.frames_left -= 1;

        let samples = frame.capacity();
        frame.data_mut().fill(0);
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_then_eof() {
        let mut source = SilenceSource::new(2);
        source.open().unwrap();

        let mut frame = FrameBuffer::new(8);
        assert_eq!(source.process(None, &mut frame).unwrap(), 8);
        assert_eq!(source.process(None, &mut frame).unwrap(), 8);
        assert_eq!(source.process(None, &mut frame).unwrap(), 0);
        // EOF is sticky until reopened
        assert_eq!(source.process(None, &mut frame).unwrap(), 0);
    }

    #[test]
    fn test_open_resets_exhaustion() {
        let mut source = SilenceSource::new(1);
        source.open().unwrap();

        let mut frame = FrameBuffer::new(4);
        assert_eq!(source.process(None, &mut frame).unwrap(), 4);
        assert_eq!(source.process(None, &mut frame).unwrap(), 0);

        source.open().unwrap();
        assert_eq!(source.process(None, &mut frame).unwrap(), 4);
    }

    #[test]
    fn test_frames_are_zeroed() {
        let mut source = SilenceSource::new(1);
        source.open().unwrap();

        let mut frame = FrameBuffer::new(4);
        frame.data_mut().copy_from_slice(&[9, 9, 9, 9]);
        source.process(None, &mut frame).unwrap();
        assert_eq!(&frame.data_mut()[..4], &[0, 0, 0, 0]);
    }
}
