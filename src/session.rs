//! Recording session lifecycle.
//!
//! ```text
//! Idle -> Capturing -> Finalizing -> Ready -> Analyzing -> Analyzed
//! ```
//!
//! Each state carries exactly the data that is valid in it, so a buffer only
//! exists from `Ready` onwards and a spectrogram only in `Analyzed`.

use std::fmt;
use std::sync::Arc;

use crate::audio::buffer::{meter_level, RawAudioBuffer};
use crate::audio::capture::{
    negotiate_format, CaptureBackend, CaptureConstraints, CaptureRequest, ChunkFormat,
    DeviceGuard, DEFAULT_FORMATS,
};
use crate::audio::decode::Decode;
use crate::error::{Error, ErrorKind, Result};
use crate::spectrogram::{FrameLayout, Progress, Spectrogram, SpectrogramConfig, SpectrogramMatrix};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Capturing,
    Finalizing,
    Ready,
    Analyzing,
    Analyzed,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Capturing => "capturing",
            SessionState::Finalizing => "finalizing",
            SessionState::Ready => "ready",
            SessionState::Analyzing => "analyzing",
            SessionState::Analyzed => "analyzed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format preferences and stream constraints used by `start`
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    /// MIME types in order of preference
    pub formats: Vec<String>,
    pub constraints: CaptureConstraints,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            formats: DEFAULT_FORMATS.iter().map(|s| s.to_string()).collect(),
            constraints: CaptureConstraints::default(),
        }
    }
}

enum State {
    Idle,
    Capturing {
        guard: DeviceGuard,
        format: ChunkFormat,
        chunks: Vec<Vec<u8>>,
    },
    Finalizing,
    Ready {
        buffer: Arc<RawAudioBuffer>,
    },
    Analyzing {
        buffer: Arc<RawAudioBuffer>,
        run_id: u64,
    },
    Analyzed {
        buffer: Arc<RawAudioBuffer>,
        matrix: SpectrogramMatrix,
    },
}

impl State {
    fn tag(&self) -> SessionState {
        match self {
            State::Idle => SessionState::Idle,
            State::Capturing { .. } => SessionState::Capturing,
            State::Finalizing => SessionState::Finalizing,
            State::Ready { .. } => SessionState::Ready,
            State::Analyzing { .. } => SessionState::Analyzing,
            State::Analyzed { .. } => SessionState::Analyzed,
        }
    }
}

/// Ticket for an analysis started with [`RecordingSession::begin_analysis`]
#[derive(Debug)]
pub struct AnalysisRun {
    id: u64,
    buffer: Arc<RawAudioBuffer>,
    config: SpectrogramConfig,
}

impl AnalysisRun {
    pub fn buffer(&self) -> &Arc<RawAudioBuffer> {
        &self.buffer
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    pub fn spectrogram(&self) -> Result<Spectrogram<'_>> {
        Spectrogram::new(&self.buffer, &self.config)
    }
}

pub struct RecordingSession<B, D> {
    backend: B,
    decoder: D,
    settings: CaptureSettings,
    state: State,
    last_error: Option<ErrorKind>,
    next_run_id: u64,
}

impl<B: CaptureBackend, D: Decode> RecordingSession<B, D> {
    pub fn new(backend: B, decoder: D, settings: CaptureSettings) -> Self {
        Self {
            backend,
            decoder,
            settings,
            state: State::Idle,
            last_error: None,
            next_run_id: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.tag()
    }

    /// Kind of the most recent failed transition, cleared on the next success
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn buffer(&self) -> Option<&RawAudioBuffer> {
        match &self.state {
            State::Ready { buffer }
            | State::Analyzing { buffer, .. }
            | State::Analyzed { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    pub fn spectrogram(&self) -> Option<&SpectrogramMatrix> {
        match &self.state {
            State::Analyzed { matrix, .. } => Some(matrix),
            _ => None,
        }
    }

    /// Number of non-empty chunks accumulated by the current capture
    pub fn chunk_count(&self) -> usize {
        match &self.state {
            State::Capturing { chunks, .. } => chunks.len(),
            _ => 0,
        }
    }

    /// Most recently captured samples, empty unless capturing
    pub fn live_samples(&self) -> Vec<f32> {
        match &self.state {
            State::Capturing { guard, .. } => guard.recent_samples(),
            _ => Vec::new(),
        }
    }

    /// Live input level on a 0-100 scale
    pub fn live_level(&self) -> f32 {
        meter_level(&self.live_samples())
    }

    /// Open the input device and begin accumulating chunks.
    ///
    /// Starting from `Ready` or `Analyzed` discards the previous recording.
    /// On failure the session is left in `Idle`.
    pub fn start(&mut self) -> Result<()> {
        match self.state.tag() {
            SessionState::Idle | SessionState::Ready | SessionState::Analyzed => {}
            other => return Err(self.reject(other, "start recording")),
        }

        if !matches!(self.state, State::Idle) {
            log::debug!("Discarding previous recording");
        }
        self.state = State::Idle;

        let guard = self.open_stream().map_err(|e| self.fail(e))?;
        let format = guard.format().clone();
        log::info!("Recording started ({})", format.mime());

        self.state = State::Capturing {
            guard,
            format,
            chunks: Vec::new(),
        };
        self.last_error = None;
        Ok(())
    }

    fn open_stream(&mut self) -> Result<DeviceGuard> {
        if !self.backend.is_available() {
            return Err(Error::CapabilityUnavailable(
                "no audio input capability on this host".into(),
            ));
        }
        let mime = negotiate_format(&self.settings.formats, &self.backend)?;
        let request = CaptureRequest {
            mime,
            constraints: self.settings.constraints.clone(),
        };
        let stream = self.backend.open(&request)?;
        Ok(DeviceGuard::new(stream))
    }

    /// Append one chunk from the capture event stream. Empty chunks are ignored.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<()> {
        match &mut self.state {
            State::Capturing { chunks, .. } => {
                if chunk.is_empty() {
                    log::debug!("Ignoring empty capture chunk");
                } else {
                    log::debug!("Captured chunk of {} bytes", chunk.len());
                    chunks.push(chunk);
                }
                Ok(())
            }
            other => {
                let tag = other.tag();
                Err(self.reject(tag, "accept audio data"))
            }
        }
    }

    /// Move every chunk the device has emitted so far into the session.
    pub fn pump(&mut self) -> Result<usize> {
        let pending = match &mut self.state {
            State::Capturing { guard, .. } => guard.poll_chunks(),
            other => {
                let tag = other.tag();
                return Err(self.reject(tag, "poll the input device"));
            }
        };
        let count = pending.len();
        for chunk in pending {
            self.push_chunk(chunk)?;
        }
        Ok(count)
    }

    /// Stop capturing and decode the recording.
    ///
    /// A no-op outside `Capturing`. The device is released before decoding;
    /// a decode failure returns the session to `Idle`.
    pub fn stop(&mut self) -> Result<()> {
        if !matches!(self.state, State::Capturing { .. }) {
            log::debug!("Stop requested while {}; nothing to do", self.state.tag());
            return Ok(());
        }

        let State::Capturing {
            guard,
            format,
            mut chunks,
        } = std::mem::replace(&mut self.state, State::Finalizing)
        else {
            unreachable!("checked above")
        };

        chunks.extend(guard.finish().into_iter().filter(|c| !c.is_empty()));
        let data = chunks.concat();
        log::info!(
            "Recording stopped: {} chunks, {} bytes",
            chunks.len(),
            data.len()
        );
        drop(chunks);

        match self.decoder.decode(&data, &format) {
            Ok(buffer) => {
                log::info!(
                    "Recording ready: {} samples at {}Hz ({:.1}s)",
                    buffer.len(),
                    buffer.sample_rate(),
                    buffer.duration()
                );
                self.state = State::Ready {
                    buffer: Arc::new(buffer),
                };
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.state = State::Idle;
                let e = match e {
                    Error::DecodeFailure(_) => e,
                    other => Error::DecodeFailure(other.to_string()),
                };
                Err(self.fail(e))
            }
        }
    }

    /// Enter `Analyzing` and hand out the buffer to analyze.
    ///
    /// Configuration problems are reported before the transition, leaving the
    /// session in `Ready` with the buffer intact.
    pub fn begin_analysis(&mut self, config: &SpectrogramConfig) -> Result<AnalysisRun> {
        let buffer = match &self.state {
            State::Ready { buffer } | State::Analyzed { buffer, .. } => buffer.clone(),
            State::Analyzing { .. } => return Err(self.fail(Error::AnalysisInProgress)),
            other => {
                let tag = other.tag();
                return Err(self.reject(tag, "analyze"));
            }
        };

        if let Err(e) = FrameLayout::new(buffer.len(), buffer.sample_rate(), config) {
            self.state = State::Ready { buffer };
            return Err(self.fail(e));
        }

        self.next_run_id += 1;
        let id = self.next_run_id;
        self.state = State::Analyzing {
            buffer: buffer.clone(),
            run_id: id,
        };
        log::debug!("Analysis {} started", id);

        Ok(AnalysisRun {
            id,
            buffer,
            config: config.clone(),
        })
    }

    /// Record the outcome of `run`: `Analyzed` on success, back to `Ready` on failure.
    pub fn finish_analysis(
        &mut self,
        run: AnalysisRun,
        outcome: Result<SpectrogramMatrix>,
    ) -> Result<&SpectrogramMatrix> {
        let buffer = match &self.state {
            State::Analyzing { buffer, run_id } if *run_id == run.id => buffer.clone(),
            other => {
                let tag = other.tag();
                return Err(self.reject(tag, "finish an analysis it did not start"));
            }
        };

        match outcome {
            Ok(matrix) => {
                log::info!(
                    "Analysis {} finished: {} frames x {} bins",
                    run.id,
                    matrix.len(),
                    matrix.bins_per_row()
                );
                self.state = State::Analyzed { buffer, matrix };
                self.last_error = None;
                match &self.state {
                    State::Analyzed { matrix, .. } => Ok(matrix),
                    _ => unreachable!("just set"),
                }
            }
            Err(e) => {
                log::warn!("Analysis {} failed: {}", run.id, e);
                self.state = State::Ready { buffer };
                let e = match e {
                    Error::AnalysisFailed(_) | Error::InvalidConfiguration(_) => e,
                    other => Error::AnalysisFailed(other.to_string()),
                };
                Err(self.fail(e))
            }
        }
    }

    /// Run the spectrogram engine on the current recording, reporting each chunk.
    pub fn analyze<F>(&mut self, config: &SpectrogramConfig, on_progress: F) -> Result<&SpectrogramMatrix>
    where
        F: FnMut(Progress<'_>),
    {
        let run = self.begin_analysis(config)?;
        let outcome = run.spectrogram().map(|s| s.run(on_progress));
        self.finish_analysis(run, outcome)
    }

    /// Drop any recording or analysis and return to `Idle`.
    pub fn reset(&mut self) {
        log::debug!("Resetting session from {}", self.state.tag());
        self.state = State::Idle;
        self.last_error = None;
    }

    fn reject(&mut self, state: SessionState, operation: &'static str) -> Error {
        self.fail(Error::InvalidState {
            state: state.name(),
            operation,
        })
    }

    fn fail(&mut self, error: Error) -> Error {
        log::debug!("Session error in {}: {}", self.state.tag(), error);
        self.last_error = Some(error.kind());
        error
    }
}
