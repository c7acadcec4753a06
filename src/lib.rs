//! Recording-to-spectrogram pipeline.
//!
//! A [`RecordingSession`] owns the capture lifecycle and hands a finalized
//! [`RawAudioBuffer`] to the spectrogram engine, which produces a
//! [`SpectrogramMatrix`] one chunk of frames at a time.

pub mod audio;
pub mod dsp;
pub mod error;
pub mod session;
pub mod spectrogram;
pub mod synth;

pub use audio::buffer::RawAudioBuffer;
pub use error::{Error, ErrorKind, Result};
pub use session::{AnalysisRun, CaptureSettings, RecordingSession, SessionState};
pub use spectrogram::{
    analyze, spawn_analysis, AnalysisEvent, FrameLayout, Progress, Spectrogram,
    SpectrogramConfig, SpectrogramMatrix,
};
