//! Spectrogram engine.
//!
//! A waveform is cut into overlapping frames of `fft_size` samples, each frame
//! is Hamming-windowed, transformed and reduced to dB magnitudes for the bins
//! inside the analysis band. Rows are produced strictly in frame order, in
//! chunks of `chunk_size` frames, so a caller can render partial progress
//! between chunks.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::audio::buffer::RawAudioBuffer;
use crate::dsp::fft;
use crate::dsp::window::HammingWindow;
use crate::error::{Error, Result};

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_MIN_FREQ: f32 = 0.0;
pub const DEFAULT_MAX_FREQ: f32 = 8000.0;
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Largest accepted frame length (2^20 samples)
pub const MAX_FFT_SIZE: usize = 1 << 20;

/// Floor added to magnitudes before taking the logarithm
pub const MAGNITUDE_EPSILON: f32 = 1e-10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    pub fft_size: usize,
    /// Defaults to `fft_size / 4`
    pub hop_size: Option<usize>,
    pub min_freq: f32,
    pub max_freq: f32,
    /// Frames per scheduling slice; does not affect output values
    pub chunk_size: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            hop_size: None,
            min_freq: DEFAULT_MIN_FREQ,
            max_freq: DEFAULT_MAX_FREQ,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SpectrogramConfig {
    pub fn hop(&self) -> usize {
        self.hop_size.unwrap_or(self.fft_size / 4)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfiguration(msg));
        if self.fft_size < 2 {
            return invalid(format!("fft_size must be at least 2, got {}", self.fft_size));
        }
        if self.fft_size > MAX_FFT_SIZE {
            return invalid(format!(
                "fft_size must be at most {}, got {}",
                MAX_FFT_SIZE, self.fft_size
            ));
        }
        if self.hop() == 0 {
            return invalid("hop_size must be positive".into());
        }
        if !(self.min_freq >= 0.0) || !self.max_freq.is_finite() {
            return invalid(format!(
                "frequency band {}..{} Hz is not valid",
                self.min_freq, self.max_freq
            ));
        }
        if self.min_freq >= self.max_freq {
            return invalid(format!(
                "min_freq ({}) must be below max_freq ({})",
                self.min_freq, self.max_freq
            ));
        }
        if self.chunk_size == 0 {
            return invalid("chunk_size must be positive".into());
        }
        Ok(())
    }
}

/// Frame and bin geometry of one analysis run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameLayout {
    pub sample_rate: u32,
    pub fft_size: usize,
    /// Transform length after power-of-two padding
    pub padded_size: usize,
    pub hop_size: usize,
    pub frame_count: usize,
    pub min_bin: usize,
    pub max_bin: usize,
    /// Width of one bin in Hz
    pub bin_hz: f32,
}

impl FrameLayout {
    pub fn new(total_samples: usize, sample_rate: u32, config: &SpectrogramConfig) -> Result<Self> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(Error::InvalidConfiguration("sample rate must be positive".into()));
        }

        let fft_size = config.fft_size;
        let hop_size = config.hop();
        let padded_size = fft::padded_len(fft_size);

        // A trailing partial hop never forms a frame.
        let frame_count = if total_samples < fft_size {
            0
        } else {
            (total_samples - fft_size) / hop_size
        };

        let bin_hz = sample_rate as f32 / padded_size as f32;
        let nyquist_bins = padded_size / 2;
        let min_bin = (config.min_freq / bin_hz).floor() as usize;
        let max_bin = ((config.max_freq / bin_hz).floor() as usize).min(nyquist_bins);

        if min_bin >= max_bin {
            return Err(Error::InvalidConfiguration(format!(
                "band {}..{} Hz holds no bins at {}Hz with fft_size {}",
                config.min_freq, config.max_freq, sample_rate, fft_size
            )));
        }

        Ok(Self {
            sample_rate,
            fft_size,
            padded_size,
            hop_size,
            frame_count,
            min_bin,
            max_bin,
            bin_hz,
        })
    }

    pub fn bins_per_row(&self) -> usize {
        self.max_bin - self.min_bin
    }
}

/// Time-ordered rows of dB magnitudes, one per frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpectrogramMatrix {
    sample_rate: u32,
    fft_size: usize,
    hop_size: usize,
    min_bin: usize,
    bin_hz: f32,
    rows: Vec<Vec<f32>>,
}

impl SpectrogramMatrix {
    pub fn new(layout: &FrameLayout) -> Self {
        Self {
            sample_rate: layout.sample_rate,
            fft_size: layout.fft_size,
            hop_size: layout.hop_size,
            min_bin: layout.min_bin,
            bin_hz: layout.bin_hz,
            rows: Vec::with_capacity(layout.frame_count),
        }
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn row(&self, frame: usize) -> Option<&[f32]> {
        self.rows.get(frame).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bins_per_row(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Center frequency in Hz of column `bin` of every row
    pub fn frequency_of(&self, bin: usize) -> f32 {
        (self.min_bin + bin) as f32 * self.bin_hz
    }

    /// Start time in seconds of row `frame`
    pub fn time_of(&self, frame: usize) -> f32 {
        (frame * self.hop_size) as f32 / self.sample_rate as f32
    }

    fn append(&mut self, rows: &[Vec<f32>]) {
        debug_assert!(rows
            .iter()
            .all(|r| self.rows.first().map_or(true, |f| f.len() == r.len())));
        self.rows.extend_from_slice(rows);
    }
}

/// Snapshot handed to progress callbacks after each chunk
#[derive(Debug)]
pub struct Progress<'a> {
    pub frames_done: usize,
    pub frame_count: usize,
    /// Rows appended by the chunk that just finished
    pub new_rows: &'a [Vec<f32>],
    /// Everything produced so far
    pub matrix: &'a SpectrogramMatrix,
}

/// Incremental analysis of one buffer.
///
/// Iterating yields one row per frame; [`Spectrogram::next_chunk`] yields a
/// scheduling slice at a time.
pub struct Spectrogram<'a> {
    samples: &'a [f32],
    layout: FrameLayout,
    chunk_size: usize,
    window: HammingWindow,
    windowed: Vec<f32>,
    re: Vec<f32>,
    im: Vec<f32>,
    next_frame: usize,
}

impl<'a> Spectrogram<'a> {
    pub fn new(buffer: &'a RawAudioBuffer, config: &SpectrogramConfig) -> Result<Self> {
        let layout = FrameLayout::new(buffer.len(), buffer.sample_rate(), config)?;
        let window = HammingWindow::new(layout.fft_size)?;

        log::debug!(
            "Spectrogram layout: {} frames, hop {}, bins {}..{} ({:.2} Hz/bin)",
            layout.frame_count,
            layout.hop_size,
            layout.min_bin,
            layout.max_bin,
            layout.bin_hz
        );

        Ok(Self {
            samples: buffer.samples(),
            layout,
            chunk_size: config.chunk_size,
            window,
            windowed: vec![0.0; layout.fft_size],
            re: vec![0.0; layout.padded_size],
            im: vec![0.0; layout.padded_size],
            next_frame: 0,
        })
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn frame_count(&self) -> usize {
        self.layout.frame_count
    }

    pub fn frames_done(&self) -> usize {
        self.next_frame
    }

    pub fn is_finished(&self) -> bool {
        self.next_frame >= self.layout.frame_count
    }

    /// Compute the next `chunk_size` rows, or `None` once every frame is done.
    pub fn next_chunk(&mut self) -> Option<Vec<Vec<f32>>> {
        if self.is_finished() {
            return None;
        }
        let end = (self.next_frame + self.chunk_size).min(self.layout.frame_count);
        let rows = (self.next_frame..end).map(|f| self.compute_frame(f)).collect();
        self.next_frame = end;
        Some(rows)
    }

    /// Drive the analysis to completion, reporting after every chunk.
    pub fn run<F>(mut self, mut on_progress: F) -> SpectrogramMatrix
    where
        F: FnMut(Progress<'_>),
    {
        let mut matrix = SpectrogramMatrix::new(&self.layout);
        while let Some(rows) = self.next_chunk() {
            matrix.append(&rows);
            on_progress(Progress {
                frames_done: self.next_frame,
                frame_count: self.layout.frame_count,
                new_rows: &rows,
                matrix: &matrix,
            });
        }
        matrix
    }

    fn compute_frame(&mut self, frame: usize) -> Vec<f32> {
        let n = self.layout.fft_size;
        let offset = frame * self.layout.hop_size;
        let segment = &self.samples[offset..offset + n];

        for ((o, &s), &w) in self
            .windowed
            .iter_mut()
            .zip(segment)
            .zip(self.window.coefficients())
        {
            *o = s * w;
        }

        self.re[..n].copy_from_slice(&self.windowed);
        self.re[n..].fill(0.0);
        self.im.fill(0.0);
        // both buffers are padded_size long, a power of two
        fft::forward_unchecked(&mut self.re, &mut self.im);

        (self.layout.min_bin..self.layout.max_bin)
            .map(|k| magnitude_db(self.re[k], self.im[k]))
            .collect()
    }
}

impl Iterator for Spectrogram<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }
        let row = self.compute_frame(self.next_frame);
        self.next_frame += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.layout.frame_count - self.next_frame.min(self.layout.frame_count);
        (left, Some(left))
    }
}

/// Magnitude of one coefficient in dB
#[inline]
pub fn magnitude_db(re: f32, im: f32) -> f32 {
    20.0 * ((re * re + im * im).sqrt() + MAGNITUDE_EPSILON).log10()
}

/// Analyze a whole buffer eagerly.
pub fn analyze(buffer: &RawAudioBuffer, config: &SpectrogramConfig) -> Result<SpectrogramMatrix> {
    let spectrogram = Spectrogram::new(buffer, config)?;
    let matrix = spectrogram.run(|_| {});
    log::info!(
        "Spectrogram: {} frames x {} bins",
        matrix.len(),
        matrix.bins_per_row()
    );
    Ok(matrix)
}

/// Messages streamed by [`spawn_analysis`]
#[derive(Debug)]
pub enum AnalysisEvent {
    Rows {
        first_frame: usize,
        frame_count: usize,
        rows: Vec<Vec<f32>>,
    },
    Finished(SpectrogramMatrix),
    Failed(Error),
}

/// Run the engine on a worker thread, streaming one `Rows` event per chunk.
///
/// The channel always ends with exactly one `Finished` or `Failed` event.
pub fn spawn_analysis(
    buffer: Arc<RawAudioBuffer>,
    config: SpectrogramConfig,
) -> (JoinHandle<()>, Receiver<AnalysisEvent>) {
    let (sender, receiver) = crossbeam_channel::unbounded();

    let handle = std::thread::spawn(move || {
        let spectrogram = match Spectrogram::new(&buffer, &config) {
            Ok(s) => s,
            Err(e) => {
                let _ = sender.send(AnalysisEvent::Failed(e));
                return;
            }
        };

        let matrix = spectrogram.run(|progress| {
            let event = AnalysisEvent::Rows {
                first_frame: progress.frames_done - progress.new_rows.len(),
                frame_count: progress.frame_count,
                rows: progress.new_rows.to_vec(),
            };
            if sender.send(event).is_err() {
                log::debug!("Analysis receiver dropped; finishing without listener");
            }
        });
        let _ = sender.send(AnalysisEvent::Finished(matrix));
    });

    (handle, receiver)
}

/// Block until a background analysis ends, forwarding row events to `on_rows`.
pub fn collect_analysis<F>(events: &Receiver<AnalysisEvent>, mut on_rows: F) -> Result<SpectrogramMatrix>
where
    F: FnMut(usize, usize, &[Vec<f32>]),
{
    for event in events.iter() {
        match event {
            AnalysisEvent::Rows {
                first_frame,
                frame_count,
                rows,
            } => on_rows(first_frame + rows.len(), frame_count, &rows),
            AnalysisEvent::Finished(matrix) => return Ok(matrix),
            AnalysisEvent::Failed(e) => return Err(e),
        }
    }
    Err(Error::AnalysisFailed(
        "analysis worker stopped without a result".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn buffer(samples: Vec<f32>, sample_rate: u32) -> RawAudioBuffer {
        RawAudioBuffer::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn default_config_matches_reference() {
        let config = SpectrogramConfig::default();
        assert_eq!(config.fft_size, 2048);
        assert_eq!(config.hop(), 512);
        assert_eq!(config.chunk_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad = [
            SpectrogramConfig { fft_size: 1, ..Default::default() },
            SpectrogramConfig { hop_size: Some(0), ..Default::default() },
            SpectrogramConfig { min_freq: 8000.0, max_freq: 8000.0, ..Default::default() },
            SpectrogramConfig { min_freq: -1.0, ..Default::default() },
            SpectrogramConfig { chunk_size: 0, ..Default::default() },
            SpectrogramConfig { fft_size: MAX_FFT_SIZE + 1, ..Default::default() },
            SpectrogramConfig { fft_size: 1 << 40, ..Default::default() },
            SpectrogramConfig { fft_size: (usize::MAX >> 1) + 2, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfiguration(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn oversized_frame_is_a_config_error_not_a_panic() {
        let empty = buffer(Vec::new(), 16000);
        for fft_size in [MAX_FFT_SIZE * 2, 1 << 40, (usize::MAX >> 1) + 2] {
            let config = SpectrogramConfig { fft_size, ..Default::default() };
            assert!(matches!(
                FrameLayout::new(0, 16000, &config),
                Err(Error::InvalidConfiguration(_))
            ));
            assert!(matches!(
                Spectrogram::new(&empty, &config),
                Err(Error::InvalidConfiguration(_))
            ));
        }
        let largest = SpectrogramConfig { fft_size: MAX_FFT_SIZE, ..Default::default() };
        assert!(FrameLayout::new(0, 16000, &largest).is_ok());
    }

    #[test]
    fn frame_count_follows_floor_formula() {
        let config = SpectrogramConfig::default();
        for len in [0, 100, 2047, 2048, 2559, 2560, 4096, 10_000] {
            let layout = FrameLayout::new(len, 16000, &config).unwrap();
            let expected = if len < 2048 { 0 } else { (len - 2048) / 512 };
            assert_eq!(layout.frame_count, expected, "len={len}");
        }
    }

    #[test]
    fn short_buffer_yields_empty_matrix() {
        let matrix = analyze(&buffer(vec![0.3; 1000], 16000), &SpectrogramConfig::default()).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.bins_per_row(), 0);
    }

    #[test]
    fn silence_is_minus_two_hundred_db() {
        let matrix = analyze(&buffer(vec![0.0; 4096], 16000), &SpectrogramConfig::default()).unwrap();
        assert_eq!(matrix.len(), 4);
        // 16 kHz / 2048 = 7.8125 Hz per bin; 8 kHz lands on the Nyquist bin
        assert_eq!(matrix.bins_per_row(), 1024);
        for row in matrix.rows() {
            assert!(row.iter().all(|&db| (db + 200.0).abs() < 1e-3));
        }
    }

    #[test]
    fn band_is_clamped_to_nyquist() {
        let config = SpectrogramConfig {
            max_freq: 20_000.0,
            ..Default::default()
        };
        let layout = FrameLayout::new(4096, 8000, &config).unwrap();
        assert_eq!(layout.max_bin, 1024);

        let config = SpectrogramConfig {
            min_freq: 5000.0,
            max_freq: 6000.0,
            ..Default::default()
        };
        assert!(matches!(
            FrameLayout::new(4096, 8000, &config),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn band_limits_row_length() {
        let config = SpectrogramConfig {
            min_freq: 1000.0,
            max_freq: 2000.0,
            ..Default::default()
        };
        let layout = FrameLayout::new(8192, 16000, &config).unwrap();
        assert_eq!(layout.min_bin, 128);
        assert_eq!(layout.max_bin, 256);

        let matrix = analyze(&buffer(vec![0.1; 8192], 16000), &config).unwrap();
        assert!(matrix.rows().iter().all(|r| r.len() == 128));
        assert!((matrix.frequency_of(0) - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn sinusoid_peaks_at_its_bin() {
        let k = 100;
        let n = 2048;
        let sample_rate = 16000;
        let freq = k as f32 * sample_rate as f32 / n as f32;
        let samples: Vec<f32> = (0..n + 512)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();

        let matrix = analyze(&buffer(samples, sample_rate), &SpectrogramConfig::default()).unwrap();
        assert_eq!(matrix.len(), 1);
        let row = matrix.row(0).unwrap();

        let peak = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, k);
        for offset in [-3i32, -2, -1, 1, 2, 3] {
            let neighbor = (k as i32 + offset) as usize;
            let drop = row[k] - row[neighbor];
            // the Hamming main lobe spans one bin either side
            let required = if offset.abs() == 1 { 5.0 } else { 20.0 };
            assert!(drop >= required, "bin {neighbor} only {drop} dB below peak");
        }
    }

    #[test]
    fn rows_match_checked_transform_of_padded_frame() {
        let samples: Vec<f32> = (0..3000).map(|i| ((i as f32) * 0.031).sin() * 0.7).collect();
        let config = SpectrogramConfig {
            fft_size: 1000,
            hop_size: Some(250),
            ..Default::default()
        };
        let buf = buffer(samples.clone(), 16000);
        let matrix = analyze(&buf, &config).unwrap();
        let layout = FrameLayout::new(buf.len(), 16000, &config).unwrap();
        assert_eq!(layout.padded_size, 1024);

        let window = HammingWindow::new(1000).unwrap();
        for frame in [0, layout.frame_count - 1] {
            let offset = frame * 250;
            let mut re = vec![0.0; 1024];
            let mut im = vec![0.0; 1024];
            window.apply(&samples[offset..offset + 1000], &mut re[..1000]).unwrap();
            fft::transform(&mut re, &mut im).unwrap();

            let expected: Vec<f32> = (layout.min_bin..layout.max_bin)
                .map(|k| magnitude_db(re[k], im[k]))
                .collect();
            assert_eq!(matrix.row(frame).unwrap(), expected.as_slice(), "frame {frame}");
        }
    }

    #[test]
    fn louder_input_never_lowers_magnitude() {
        let samples: Vec<f32> = (0..4096)
            .map(|i| ((i as f32) * 0.05).sin() * 0.2 + ((i * 7 % 13) as f32 - 6.0) * 0.01)
            .collect();
        let louder: Vec<f32> = samples.iter().map(|s| s * 3.0).collect();

        let quiet = analyze(&buffer(samples, 16000), &SpectrogramConfig::default()).unwrap();
        let loud = analyze(&buffer(louder, 16000), &SpectrogramConfig::default()).unwrap();
        for (q, l) in quiet.rows().iter().zip(loud.rows()) {
            for (a, b) in q.iter().zip(l) {
                assert!(b >= a, "{b} < {a}");
            }
        }
    }

    #[test]
    fn chunking_does_not_change_output() {
        let samples: Vec<f32> = (0..20_000).map(|i| ((i as f32) * 0.013).sin()).collect();
        let buf = buffer(samples, 22050);

        let whole = analyze(&buf, &SpectrogramConfig { chunk_size: 1000, ..Default::default() }).unwrap();
        let sliced = analyze(&buf, &SpectrogramConfig { chunk_size: 3, ..Default::default() }).unwrap();
        let lazy: Vec<Vec<f32>> = Spectrogram::new(&buf, &SpectrogramConfig::default()).unwrap().collect();

        assert_eq!(whole, sliced);
        assert_eq!(whole.rows(), lazy.as_slice());
    }

    #[test]
    fn progress_reports_every_chunk() {
        let buf = buffer(vec![0.5; 2048 + 512 * 120], 16000);
        let spectrogram = Spectrogram::new(&buf, &SpectrogramConfig::default()).unwrap();
        assert_eq!(spectrogram.frame_count(), 120);

        let mut seen = Vec::new();
        let matrix = spectrogram.run(|p| {
            assert_eq!(p.matrix.len(), p.frames_done);
            seen.push((p.frames_done, p.new_rows.len()));
        });
        assert_eq!(seen, vec![(50, 50), (100, 50), (120, 20)]);
        assert_eq!(matrix.len(), 120);
    }

    #[test]
    fn non_power_of_two_frames_are_padded() {
        let config = SpectrogramConfig {
            fft_size: 1000,
            ..Default::default()
        };
        let layout = FrameLayout::new(5000, 16000, &config).unwrap();
        assert_eq!(layout.padded_size, 1024);
        assert_eq!(layout.hop_size, 250);
        assert_eq!(layout.frame_count, 16);

        let matrix = analyze(&buffer(vec![0.0; 5000], 16000), &config).unwrap();
        assert_eq!(matrix.len(), 16);
        assert_eq!(matrix.bins_per_row(), 512);
    }

    #[test]
    fn background_analysis_streams_rows() {
        let buf = Arc::new(buffer(vec![0.25; 2048 + 512 * 60], 16000));
        let expected = analyze(&buf, &SpectrogramConfig::default()).unwrap();

        let (handle, events) = spawn_analysis(buf, SpectrogramConfig::default());
        let mut chunks = Vec::new();
        let matrix = collect_analysis(&events, |done, total, rows| {
            chunks.push((done, total, rows.len()));
        })
        .unwrap();
        handle.join().unwrap();

        assert_eq!(chunks, vec![(50, 60, 50), (60, 60, 10)]);
        assert_eq!(matrix, expected);
    }

    #[test]
    fn background_analysis_reports_bad_config() {
        let buf = Arc::new(buffer(vec![0.0; 4096], 16000));
        let config = SpectrogramConfig {
            fft_size: 0,
            ..Default::default()
        };
        let (handle, events) = spawn_analysis(buf, config);
        let err = collect_analysis(&events, |_, _, _| {}).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn matrix_serializes_with_geometry() {
        let matrix = analyze(&buffer(vec![0.0; 2560], 16000), &SpectrogramConfig::default()).unwrap();
        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(json["fft_size"], 2048);
        assert_eq!(json["hop_size"], 512);
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
        assert!((matrix.time_of(2) - 0.064).abs() < 1e-6);
    }
}
