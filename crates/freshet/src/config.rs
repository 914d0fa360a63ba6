//! Pipeline configuration
//!
//! Sizing and naming knobs for one pipeline instance. Validation happens
//! once, at pipeline construction; after that the values are fixed for the
//! lifetime of the instance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::AudioFormat;

/// Upper bound on frame size, in interleaved samples across all channels
pub const MAX_FRAME_SAMPLES: usize = 4096;

/// Default capacity of the lifecycle event queue
pub const DEFAULT_EVENT_QUEUE_LEN: usize = 8;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("frame_samples must be in 1..={MAX_FRAME_SAMPLES}, got {0}")]
    FrameSamples(usize),

    #[error("event_queue_len must be nonzero")]
    EventQueueLen,

    #[error("stream format needs a nonzero sample rate and channel count")]
    Stream,
}

/// Configuration for one pipeline instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Samples per frame pull, interleaved across channels
    pub frame_samples: usize,

    /// Capacity of the lifecycle event queue
    pub event_queue_len: usize,

    /// Initial stream format; replaceable via `Pipeline::set_format`
    pub stream: AudioFormat,

    /// Name given to the worker thread
    pub thread_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_samples: 1024,
            event_queue_len: DEFAULT_EVENT_QUEUE_LEN,
            stream: AudioFormat::default(),
            thread_name: "freshet-pipeline".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_samples == 0 || self.frame_samples > MAX_FRAME_SAMPLES {
            return Err(ConfigError::FrameSamples(self.frame_samples));
        }

        if self.event_queue_len == 0 {
            return Err(ConfigError::EventQueueLen);
        }

        if self.stream.sample_rate_hz == 0 || self.stream.channels == 0 {
            return Err(ConfigError::Stream);
        }

        Ok(())
    }
}
