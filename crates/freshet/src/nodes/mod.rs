//! Built-in node implementations
//!
//! Leaf behaviors consumed through the [`crate::node::Node`] contract: a Q15
//! gain filter, a silence source, an in-memory source/sink pair, a null
//! sink, and WAV file I/O. Anything more exotic plugs in externally through
//! the same trait.

mod buffer;
mod gain;
mod null;
mod silence;
mod wav;

pub use buffer::{BufferSink, BufferSource, CaptureHandle};
pub use gain::{GainFilter, UNITY_GAIN_Q15};
pub use null::NullSink;
pub use silence::SilenceSource;
pub use wav::{WavFileSink, WavFileSource};
