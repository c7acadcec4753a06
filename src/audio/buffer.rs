use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Number of samples kept for live waveform display
pub const LIVE_WINDOW: usize = 2048;

/// Finalized single-channel recording
#[derive(Clone, Debug, PartialEq)]
pub struct RawAudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl RawAudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfiguration(
                "sample rate must be positive".into(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Input level on a 0-100 meter scale
pub fn meter_level(samples: &[f32]) -> f32 {
    (rms(samples) * 300.0).min(100.0)
}

/// Rolling window of the most recently captured samples.
///
/// Cloning shares the same window, so the capture callback can write
/// while the session reads.
#[derive(Clone, Debug)]
pub struct LiveTap {
    inner: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl LiveTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let mut window = self.inner.lock();
        let skip = samples.len().saturating_sub(self.capacity);
        for &s in &samples[skip..] {
            if window.len() == self.capacity {
                window.pop_front();
            }
            window.push_back(s);
        }
    }

    pub fn snapshot(&self) -> Vec<f32> {
        self.inner.lock().iter().copied().collect()
    }

    pub fn level(&self) -> f32 {
        meter_level(&self.snapshot())
    }
}

impl Default for LiveTap {
    fn default() -> Self {
        Self::new(LIVE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(RawAudioBuffer::new(vec![0.0; 4], 0).is_err());
        let buf = RawAudioBuffer::new(vec![0.0; 8000], 16000).unwrap();
        assert!((buf.duration() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn meter_clamps_to_hundred() {
        assert_eq!(meter_level(&[]), 0.0);
        assert!((meter_level(&[0.1; 32]) - 30.0).abs() < 1e-3);
        assert_eq!(meter_level(&[1.0; 32]), 100.0);
    }

    #[test]
    fn tap_keeps_latest_samples() {
        let tap = LiveTap::new(4);
        tap.push(&[1.0, 2.0, 3.0]);
        tap.push(&[4.0, 5.0]);
        assert_eq!(tap.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);

        tap.push(&[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(tap.snapshot(), vec![8.0, 9.0, 10.0, 11.0]);

        let shared = tap.clone();
        shared.push(&[0.0]);
        assert_eq!(tap.snapshot(), vec![9.0, 10.0, 11.0, 0.0]);
    }
}
