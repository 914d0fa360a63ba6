//! Q15 fixed-point gain filter
//!
//! Pulls its upstream and scales every sample in place:
//! `out = (s * gain) >> 15` in 64-bit intermediate arithmetic, so the result
//! is bit-exact across the full i32 range.

use crate::node::{FrameBuffer, Node, NodeError, NodeRole, Upstream};

/// Unity gain in Q15
pub const UNITY_GAIN_Q15: i32 = 32768;

pub struct GainFilter {
    gain_q15: i32,
}

impl GainFilter {
    pub fn new(gain_q15: i32) -> Self {
        Self { gain_q15 }
    }

    pub fn gain(&self) -> i32 {
        self.gain_q15
    }

    pub fn set_gain(&mut self, gain_q15: i32) {
        self.gain_q15 = gain_q15;
    }
}

impl Node for GainFilter {
    fn role(&self) -> NodeRole {
        NodeRole::Filter
    }

    fn open(&mut self) -> Result<(), NodeError> {
        // Gain 0 at open time means unconfigured, not mute
        if self.gain_q15 == 0 {
            self.gain_q15 = UNITY_GAIN_Q15;
        }
        Ok(())
    }

    fn process(
        &mut self,
        upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        let up = upstream.ok_or(NodeError::NoUpstream)?;
        let produced = up.pull(frame)?;
        if produced == 0 {
            return Ok(0);
        }

        for sample in frame.produced_mut() {
            let scaled = (*sample as i64 * self.gain_q15 as i64) >> 15;
            *sample = scaled as i32;
        }

        Ok(produced)
    }
}
