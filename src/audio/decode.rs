use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::RawAudioBuffer;
use super::capture::ChunkFormat;
use crate::error::{Error, Result};

/// Decode collaborator: turns concatenated capture chunks into samples
pub trait Decode {
    fn decode(&self, data: &[u8], format: &ChunkFormat) -> Result<RawAudioBuffer>;
}

/// Decoder for raw PCM and any container symphonia can probe.
///
/// Only the first channel is kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl Decode for SymphoniaDecoder {
    fn decode(&self, data: &[u8], format: &ChunkFormat) -> Result<RawAudioBuffer> {
        if data.is_empty() {
            return Err(Error::DecodeFailure("no audio data captured".into()));
        }
        match format {
            ChunkFormat::PcmF32Le {
                sample_rate,
                channels,
            } => decode_pcm_f32le(data, *sample_rate, *channels),
            ChunkFormat::Container { mime } => {
                let mut hint = Hint::new();
                hint.mime_type(mime);
                decode_source(Box::new(Cursor::new(data.to_vec())), hint)
            }
        }
    }
}

/// Decode interleaved little-endian `f32` PCM, keeping channel 0.
pub fn decode_pcm_f32le(data: &[u8], sample_rate: u32, channels: u16) -> Result<RawAudioBuffer> {
    if channels == 0 {
        return Err(Error::DecodeFailure("PCM stream declares zero channels".into()));
    }
    let frame_bytes = 4 * channels as usize;
    if data.len() % frame_bytes != 0 {
        return Err(Error::DecodeFailure(format!(
            "{} bytes is not a whole number of {}-channel f32 frames",
            data.len(),
            channels
        )));
    }
    let samples = data
        .chunks_exact(frame_bytes)
        .map(|frame| f32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]))
        .collect();
    RawAudioBuffer::new(samples, sample_rate)
        .map_err(|e| Error::DecodeFailure(e.to_string()))
}

/// Decode an audio file from disk.
pub fn decode_file(path: &Path) -> Result<RawAudioBuffer> {
    let file = std::fs::File::open(path)?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    decode_source(Box::new(file), hint)
}

fn decode_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<RawAudioBuffer> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::DecodeFailure(format!("unrecognized audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::DecodeFailure("no audio tracks found".into()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::DecodeFailure("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::DecodeFailure(format!("no decoder for track: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::DecodeFailure(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping corrupt packet: {}", msg);
                continue;
            }
            Err(e) => return Err(Error::DecodeFailure(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        samples.extend(sample_buf.samples().iter().step_by(channels));
    }

    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.1}s",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    RawAudioBuffer::new(samples, sample_rate).map_err(|e| Error::DecodeFailure(e.to_string()))
}
