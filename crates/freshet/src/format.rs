//! Audio stream format description
//!
//! Plain data describing how the shared frame buffer's samples are to be
//! interpreted, not how the buffer is allocated. Stream-level validation
//! (whether two nodes actually agree on a rate) belongs to the configuration
//! layer, not here.

use serde::{Deserialize, Serialize};

/// Sample encoding of the frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleEncoding {
    /// Signed 32-bit little-endian
    #[default]
    S32Le,
}

/// Audio stream format
///
/// Immutable once the pipeline is playing; [`crate::Pipeline::set_format`]
/// replaces it wholesale before or after start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate_hz: u32,
    pub channels: u8,
    pub valid_bits_per_sample: u8,
    pub encoding: SampleEncoding,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000,
            channels: 2,
            valid_bits_per_sample: 24,
            encoding: SampleEncoding::S32Le,
        }
    }
}
