//! Microphone capture through cpal.
//!
//! The input callback converts samples to `f32`, feeds the live tap and
//! accumulates bytes until a chunk interval's worth is ready, then hands the
//! chunk over a channel. Chunks are raw PCM (`audio/pcm`).

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::buffer::LiveTap;
use super::capture::{CaptureBackend, CaptureRequest, CaptureStream, ChunkFormat, PCM_MIME};
use crate::error::{Error, Result};

/// Information about an available input device
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// Capture backend for the default cpal host
pub struct CpalBackend {
    host: cpal::Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List input devices on this host
    pub fn list_devices(&self) -> Result<Vec<InputDeviceInfo>> {
        let default_name = self
            .host
            .default_input_device()
            .and_then(|d| d.name().ok());

        let devices = self
            .host
            .input_devices()
            .map_err(|e| backend_error(e.to_string()))?;

        let mut infos = Vec::new();
        for device in devices {
            let name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
            let config = device.default_input_config().ok();
            infos.push(InputDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                sample_rate: config.as_ref().map(|c| c.sample_rate().0),
                channels: config.as_ref().map(|c| c.channels()),
                name,
            });
        }
        Ok(infos)
    }

    fn find_device(&self, name: Option<&str>) -> Result<cpal::Device> {
        match name {
            None => self
                .host
                .default_input_device()
                .ok_or_else(|| Error::DeviceNotFound("no default input device".into())),
            Some(wanted) => self
                .host
                .input_devices()
                .map_err(|e| backend_error(e.to_string()))?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| Error::DeviceNotFound(wanted.to_string())),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for CpalBackend {
    fn is_available(&self) -> bool {
        self.host.input_devices().is_ok()
    }

    fn supports(&self, mime: &str) -> bool {
        mime == PCM_MIME
    }

    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn CaptureStream>> {
        if !self.supports(&request.mime) {
            return Err(Error::UnsupportedFormat {
                offered: vec![request.mime.clone()],
            });
        }

        let constraints = &request.constraints;
        if constraints.echo_cancellation || constraints.noise_suppression {
            log::debug!("Input processing constraints are not applied by the cpal backend");
        }

        let device = self.find_device(constraints.device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());

        let supported = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                Error::DeviceNotFound(device_name.clone())
            }
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => Error::UnsupportedFormat {
                offered: vec![request.mime.clone()],
            },
            other => backend_error(other.to_string()),
        })?;

        let sample_format = supported.sample_format();
        let config = supported.config();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        let frames_per_chunk =
            (sample_rate as u128 * constraints.chunk_interval.as_millis() / 1000).max(1) as usize;
        let chunk_bytes = frames_per_chunk * channels as usize * 4;

        let (sender, receiver) = crossbeam_channel::unbounded();
        let pending = Arc::new(Mutex::new(Vec::with_capacity(chunk_bytes)));
        let tap = LiveTap::default();

        let sink = ChunkSink {
            sender,
            pending: pending.clone(),
            chunk_bytes,
            channels: (channels as usize).max(1),
            tap: tap.clone(),
        };

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, sink),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, sink),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, sink),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, sink),
            other => Err(Error::UnsupportedFormat {
                offered: vec![format!("{} ({:?} samples)", request.mime, other)],
            }),
        }?;

        stream.play().map_err(|e| backend_error(e.to_string()))?;

        log::info!(
            "Capturing from '{}': {}Hz, {} channel(s), {:?}",
            device_name,
            sample_rate,
            channels,
            sample_format
        );

        Ok(Box::new(CpalStream {
            stream: Some(stream),
            format: ChunkFormat::PcmF32Le {
                sample_rate,
                channels,
            },
            receiver,
            pending,
            tap,
        }))
    }
}

/// State shared with the realtime input callback
struct ChunkSink {
    sender: Sender<Vec<u8>>,
    pending: Arc<Mutex<Vec<u8>>>,
    chunk_bytes: usize,
    channels: usize,
    tap: LiveTap,
}

impl ChunkSink {
    fn accept<T>(&self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let converted: Vec<f32> = data.iter().map(|&s| f32::from_sample(s)).collect();

        let first_channel: Vec<f32> = converted.iter().copied().step_by(self.channels).collect();
        self.tap.push(&first_channel);

        let mut pending = self.pending.lock();
        pending.extend(converted.iter().flat_map(|s| s.to_le_bytes()));
        if pending.len() >= self.chunk_bytes {
            let chunk = std::mem::replace(&mut *pending, Vec::with_capacity(self.chunk_bytes));
            // receiver gone means the capture already finished
            let _ = self.sender.send(chunk);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: ChunkSink,
) -> Result<cpal::Stream>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| sink.accept(data),
            move |err| log::error!("Input stream error: {}", err),
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                Error::DeviceNotFound("device disappeared while opening".into())
            }
            cpal::BuildStreamError::StreamConfigNotSupported
            | cpal::BuildStreamError::InvalidArgument => Error::UnsupportedFormat {
                offered: vec![PCM_MIME.to_string()],
            },
            other => backend_error(other.to_string()),
        })
}

/// Classify a host error message; denied microphone access only surfaces as text.
fn backend_error(message: String) -> Error {
    let lower = message.to_lowercase();
    let denied = ["permission", "denied", "not authorized", "not permitted"]
        .iter()
        .any(|needle| lower.contains(needle));
    if denied {
        Error::PermissionDenied(message)
    } else {
        Error::CapabilityUnavailable(message)
    }
}

struct CpalStream {
    stream: Option<cpal::Stream>,
    format: ChunkFormat,
    receiver: Receiver<Vec<u8>>,
    pending: Arc<Mutex<Vec<u8>>>,
    tap: LiveTap,
}

impl CaptureStream for CpalStream {
    fn format(&self) -> &ChunkFormat {
        &self.format
    }

    fn poll_chunks(&mut self) -> Vec<Vec<u8>> {
        self.receiver.try_iter().collect()
    }

    fn recent_samples(&self) -> Vec<f32> {
        self.tap.snapshot()
    }

    fn finish(&mut self) -> Vec<Vec<u8>> {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause input stream: {}", e);
            }
            drop(stream);
            log::info!("Input stream closed");
        }

        let mut chunks: Vec<Vec<u8>> = self.receiver.try_iter().collect();
        let tail = std::mem::take(&mut *self.pending.lock());
        if !tail.is_empty() {
            chunks.push(tail);
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(chunk_bytes: usize, channels: usize) -> (ChunkSink, Receiver<Vec<u8>>, LiveTap) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let tap = LiveTap::new(8);
        let sink = ChunkSink {
            sender,
            pending: Arc::new(Mutex::new(Vec::new())),
            chunk_bytes,
            channels,
            tap: tap.clone(),
        };
        (sink, receiver, tap)
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[test]
    fn sink_emits_chunk_once_interval_fills() {
        // two stereo frames per chunk
        let (sink, receiver, _) = sink(16, 2);
        sink.accept(&[0.1f32, 0.2, 0.3]);
        assert!(receiver.try_recv().is_err());

        sink.accept(&[0.4f32, 0.5]);
        let chunk = receiver.try_recv().unwrap();
        assert_eq!(floats(&chunk), vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        assert!(sink.pending.lock().is_empty());

        sink.accept(&[0.6f32]);
        assert!(receiver.try_recv().is_err());
        assert_eq!(floats(&sink.pending.lock()), vec![0.6]);
    }

    #[test]
    fn sink_converts_integer_samples() {
        let (sink, receiver, _) = sink(8, 1);
        sink.accept(&[i16::MIN, 0]);
        let chunk = floats(&receiver.try_recv().unwrap());
        assert_eq!(chunk, vec![-1.0, 0.0]);
    }

    #[test]
    fn tap_sees_only_first_channel() {
        let (sink, _, tap) = sink(1024, 2);
        sink.accept(&[0.1f32, -9.0, 0.2, -9.0, 0.3, -9.0]);
        assert_eq!(tap.snapshot(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn finish_flushes_sent_chunks_then_tail() {
        let (sink, receiver, tap) = sink(8, 1);
        sink.accept(&[0.1f32, 0.2]);
        sink.accept(&[0.3f32]);

        let mut stream = CpalStream {
            stream: None,
            format: ChunkFormat::PcmF32Le {
                sample_rate: 8000,
                channels: 1,
            },
            receiver,
            pending: sink.pending.clone(),
            tap,
        };
        let chunks = stream.finish();
        assert_eq!(chunks.len(), 2);
        assert_eq!(floats(&chunks[0]), vec![0.1, 0.2]);
        assert_eq!(floats(&chunks[1]), vec![0.3]);
        assert!(stream.finish().is_empty());
    }

    #[test]
    fn permission_messages_map_to_permission_denied() {
        let err = backend_error("Microphone access not authorized for this app".into());
        assert!(matches!(err, Error::PermissionDenied(_)));
        let err = backend_error("A backend-specific error has occurred: Permission denied (os error 13)".into());
        assert!(matches!(err, Error::PermissionDenied(_)));
        let err = backend_error("ALSA function 'snd_pcm_open' failed with error 'No such device'".into());
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }
}
