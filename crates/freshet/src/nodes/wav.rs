//! WAV file source and sink
//!
//! hound-backed file I/O. Samples cross the chain as i32 regardless of the
//! on-disk bit depth: integer files keep their raw values, float files are
//! scaled to full i32 range.
//!
//! The source pre-decodes the whole file on `open` so the pull path never
//! touches the filesystem; the sink streams and finalizes the header on
//! `close`.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::format::AudioFormat;
use crate::node::{FrameBuffer, Node, NodeError, NodeRole, Upstream};

fn io_err(e: impl std::fmt::Display) -> NodeError {
    NodeError::Io(e.to_string())
}

/// Streams samples from a WAV file, then reports EOF
pub struct WavFileSource {
    path: PathBuf,
    samples: Vec<i32>,
    offset: usize,
}

impl WavFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            samples: Vec::new(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Node for WavFileSource {
    fn role(&self) -> NodeRole {
        NodeRole::Source
    }

    fn open(&mut self) -> Result<(), NodeError> {
        let reader = hound::WavReader::open(&self.path).map_err(io_err)?;
        let spec = reader.spec();

        self.samples = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .into_samples::<i32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(io_err)?,
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i32::MAX as f32) as i32))
                .collect::<Result<Vec<_>, _>>()
                .map_err(io_err)?,
        };
        self.offset = 0;

        tracing::debug!(
            path = %self.path.display(),
            samples = self.samples.len(),
            rate = spec.sample_rate,
            "wav source opened"
        );
        Ok(())
    }

    fn process(
        &mut self,
        _upstream: Option<&mut dyn Upstream>,
        frame: &mut FrameBuffer,
    ) -> Result<usize, NodeError> {
        let remaining = self.samples.len() - self.offset;
        if remaining == 0 {
            return Ok(0);
        }

        let to_copy = remaining.min(frame.capacity());
        frame.data_mut()[..to_copy]
            .copy_from_slice(&self.samples[self.offset..self.offset + to_copy]);
        self.offset += to_copy;
        Ok(to_copy)
    }

    fn close(&mut self) -> Result<(), NodeError> {
        self.samples = Vec::new();
        self.offset = 0;
        Ok(())
    }
}

/// Pulls its upstream and writes every sample to a WAV file
pub struct WavFileSink {
    path: PathBuf,
    format: AudioFormat,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
}

impl WavFileSink {
    pub fn new(path: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            path: path.into(),
            format,
            writer: None,
        }
    }
}

impl Node for WavFileSink {
    fn role(&self) -> NodeRole {
        NodeRole::Sink
    }

    fn open(&mut self) -> Result<(), NodeError> {
        let spec = hound::WavSpec {
            channels: self.format.channels as u16,
            sample_rate: self.format.sample_rate_hz,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Int,
        };
        self.writer = Some(hound::WavWriter::create(&self.path, spec).map_err(io_err)?);
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

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| NodeError::Io("wav sink not opened".to_string()))?;
        for &sample in frame.data() {
            writer.write_sample(sample).map_err(io_err)?;
        }
        Ok(produced)
    }

    fn close(&mut self) -> Result<(), NodeError> {
        match self.writer.take() {
            Some(writer) => writer.finalize().map_err(io_err),
            None => Ok(()),
        }
    }
}
