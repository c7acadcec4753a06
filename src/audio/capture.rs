//! Capture collaborator interface.
//!
//! A [`CaptureBackend`] opens an input stream that emits ordered, opaque
//! binary chunks in a negotiated [`ChunkFormat`]. The session only ever
//! holds the stream through a [`DeviceGuard`], which releases the device
//! exactly once whichever way the capture ends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Interleaved little-endian `f32` PCM
pub const PCM_MIME: &str = "audio/pcm";

/// Default chunk encodings, most preferred first
pub const DEFAULT_FORMATS: &[&str] = &["audio/webm", "audio/ogg", "audio/mp4", PCM_MIME];

/// Encoding of the chunks a stream emits
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkFormat {
    PcmF32Le { sample_rate: u32, channels: u16 },
    Container { mime: String },
}

impl ChunkFormat {
    pub fn mime(&self) -> &str {
        match self {
            ChunkFormat::PcmF32Le { .. } => PCM_MIME,
            ChunkFormat::Container { mime } => mime,
        }
    }
}

/// Processing hints and pacing for an input stream
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    /// Target duration of audio per emitted chunk
    pub chunk_interval: Duration,
    /// Input device name; `None` selects the host default
    pub device: Option<String>,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            chunk_interval: Duration::from_millis(100),
            device: None,
        }
    }
}

/// What the session asks a backend to open
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureRequest {
    pub mime: String,
    pub constraints: CaptureConstraints,
}

pub trait CaptureBackend {
    /// Whether this host can capture audio at all
    fn is_available(&self) -> bool;

    fn supports(&self, mime: &str) -> bool;

    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn CaptureStream>>;
}

pub trait CaptureStream {
    fn format(&self) -> &ChunkFormat;

    /// Chunks emitted since the last poll, in arrival order
    fn poll_chunks(&mut self) -> Vec<Vec<u8>>;

    /// Most recently captured samples for waveform display
    fn recent_samples(&self) -> Vec<f32>;

    /// Stop the device and return any chunks still buffered.
    fn finish(&mut self) -> Vec<Vec<u8>>;
}

/// Pick the first preferred format the backend can produce.
pub fn negotiate_format(preferences: &[String], backend: &dyn CaptureBackend) -> Result<String> {
    let chosen = preferences.iter().find(|mime| backend.supports(mime));
    match chosen {
        Some(mime) => {
            log::debug!("Negotiated capture format {}", mime);
            Ok(mime.clone())
        }
        None => Err(Error::UnsupportedFormat {
            offered: preferences.to_vec(),
        }),
    }
}

/// Scoped owner of an open capture stream
pub struct DeviceGuard {
    stream: Box<dyn CaptureStream>,
    released: bool,
}

impl DeviceGuard {
    pub fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    pub fn format(&self) -> &ChunkFormat {
        self.stream.format()
    }

    pub fn poll_chunks(&mut self) -> Vec<Vec<u8>> {
        self.stream.poll_chunks()
    }

    pub fn recent_samples(&self) -> Vec<f32> {
        self.stream.recent_samples()
    }

    /// Release the device, returning the chunks it still held.
    pub fn finish(mut self) -> Vec<Vec<u8>> {
        self.release()
    }

    fn release(&mut self) -> Vec<Vec<u8>> {
        if self.released {
            return Vec::new();
        }
        self.released = true;
        log::debug!("Releasing capture device");
        self.stream.finish()
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        let dropped = self.release();
        if !dropped.is_empty() {
            log::debug!("Discarded {} chunks on device release", dropped.len());
        }
    }
}
