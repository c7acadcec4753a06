use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the capture, decode and analysis pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio capture is not available on this host: {0}")]
    CapabilityUnavailable(String),

    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("No supported capture format among {offered:?}")]
    UnsupportedFormat { offered: Vec<String> },

    #[error("Failed to decode captured audio: {0}")]
    DecodeFailure(String),

    #[error("An analysis is already running for this recording")]
    AnalysisInProgress,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Spectrogram analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },

    #[error("Window length must be at least 2, got {0}")]
    InvalidWindowLength(usize),

    #[error("FFT length must be a power of two, got {0}")]
    NotPowerOfTwo(usize),

    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("Failed to load image: {0}")]
    InvalidImage(String),

    #[error("Failed to load font: {0}")]
    InvalidFont(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Category of an [`Error`], without its detail payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CapabilityUnavailable,
    PermissionDenied,
    DeviceNotFound,
    UnsupportedFormat,
    DecodeFailure,
    AnalysisInProgress,
    InvalidConfiguration,
    AnalysisFailed,
    InvalidState,
    InvalidWindowLength,
    NotPowerOfTwo,
    BufferSizeMismatch,
    InvalidImage,
    InvalidFont,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CapabilityUnavailable(_) => ErrorKind::CapabilityUnavailable,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::DeviceNotFound(_) => ErrorKind::DeviceNotFound,
            Error::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Error::DecodeFailure(_) => ErrorKind::DecodeFailure,
            Error::AnalysisInProgress => ErrorKind::AnalysisInProgress,
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Error::AnalysisFailed(_) => ErrorKind::AnalysisFailed,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::InvalidWindowLength(_) => ErrorKind::InvalidWindowLength,
            Error::NotPowerOfTwo(_) => ErrorKind::NotPowerOfTwo,
            Error::BufferSizeMismatch { .. } => ErrorKind::BufferSizeMismatch,
            Error::InvalidImage(_) => ErrorKind::InvalidImage,
            Error::InvalidFont(_) => ErrorKind::InvalidFont,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// True for failures to acquire the input device
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::CapabilityUnavailable
                | ErrorKind::PermissionDenied
                | ErrorKind::DeviceNotFound
                | ErrorKind::UnsupportedFormat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail() {
        let err = Error::DeviceNotFound("USB Mic".into());
        assert!(err.to_string().contains("USB Mic"));

        let err = Error::InvalidState {
            state: "idle",
            operation: "analyze",
        };
        assert_eq!(err.to_string(), "Cannot analyze while session is idle");
    }

    #[test]
    fn acquisition_kinds_are_distinguishable() {
        let errors = [
            Error::CapabilityUnavailable("no host".into()),
            Error::PermissionDenied("denied".into()),
            Error::DeviceNotFound("none".into()),
            Error::UnsupportedFormat { offered: vec!["audio/webm".into()] },
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(Error::kind).collect();
        assert_eq!(kinds.len(), 4);
        assert!(errors.iter().all(Error::is_acquisition));
        assert!(!Error::AnalysisInProgress.is_acquisition());
    }
}
