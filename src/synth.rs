//! Hidden-message synthesis: paint a grayscale canvas into audio so that it
//! shows up when the result is viewed as a spectrogram.
//!
//! Canvas rows map linearly onto `[min_freq, max_freq]` with the bottom row at
//! `min_freq`. Each row contributes a sinusoid whose amplitude follows the
//! row's brightness across the duration of the clip.

use std::f64::consts::PI;
use std::path::Path;

use fontdue::{Font, FontSettings};
use image::imageops::{self, FilterType};
use image::GrayImage;
use rayon::prelude::*;

use crate::error::{Error, Result};

const DEFAULT_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Load the font at `path`, or the embedded monospace font when `None`.
pub fn load_font(path: Option<&Path>) -> Result<Font> {
    let parsed = match path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            Font::from_bytes(bytes, FontSettings::default())
                .map_err(|e| Error::InvalidFont(format!("{}: {}", path.display(), e)))?
        }
        None => Font::from_bytes(DEFAULT_FONT, FontSettings::default())
            .map_err(|e| Error::InvalidFont(format!("embedded font: {}", e)))?,
    };
    Ok(parsed)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SynthConfig {
    /// Seconds of audio to produce
    pub duration: f32,
    pub sample_rate: u32,
    pub min_freq: f32,
    pub max_freq: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            duration: 6.0,
            sample_rate: 44100,
            min_freq: 300.0,
            max_freq: 8000.0,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.duration > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfiguration("sample rate must be positive".into()));
        }
        if !(self.min_freq >= 0.0) || self.min_freq >= self.max_freq {
            return Err(Error::InvalidConfiguration(format!(
                "frequency range {}..{} Hz is not valid",
                self.min_freq, self.max_freq
            )));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.max_freq > nyquist {
            log::warn!(
                "max_freq {} Hz exceeds Nyquist ({} Hz); top rows will alias",
                self.max_freq,
                nyquist
            );
        }
        Ok(())
    }
}

/// Grayscale image with brightness in `0.0..=1.0`, row 0 at the top
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0.0; width * height],
        }
    }

    /// Load an image file as grayscale, resampled to `width` x `height`.
    pub fn from_image(path: &Path, width: usize, height: usize) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| Error::InvalidImage(format!("{}: {}", path.display(), e)))?;
        log::info!(
            "Loaded image {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        Ok(Self::from_luma(&img.to_luma8(), width, height))
    }

    pub fn from_luma(img: &GrayImage, width: usize, height: usize) -> Self {
        if width == 0 || height == 0 || img.width() == 0 || img.height() == 0 {
            return Self::new(width, height);
        }
        let resized = imageops::resize(img, width as u32, height as u32, FilterType::Lanczos3);
        let pixels = resized.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Brightness at `(x, y)`, or `None` outside the canvas
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value.clamp(0.0, 1.0);
        }
    }

    fn row(&self, y: usize) -> &[f32] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0.0)
    }

    /// Write `text` centered, repeated on `lines` slightly offset lines.
    pub fn draw_text(&mut self, font: &Font, text: &str, font_size: f32, lines: usize) {
        let text_w = text
            .chars()
            .map(|ch| font.metrics(ch, font_size).advance_width)
            .sum::<f32>()
            .ceil() as i32;
        let text_h = font_size as i32;
        let lines = lines.max(1) as i32;

        let x0 = (self.width as i32 - text_w) / 2;
        for i in 0..lines {
            let y0 = (self.height as i32 - text_h) / 2 + i * (text_h + 5) / lines;
            self.draw_line(font, text, font_size, x0, y0);
        }
    }

    fn draw_line(&mut self, font: &Font, text: &str, font_size: f32, x: i32, y: i32) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, font_size);
            let glyph_y = y + font_size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = cursor_x + metrics.xmin + gx as i32;
                    let py = glyph_y + gy as i32;
                    if px < 0 || py < 0 {
                        continue;
                    }
                    let (px, py) = (px as usize, py as usize);
                    if let Some(current) = self.get(px, py) {
                        self.set(px, py, current.max(coverage as f32 / 255.0));
                    }
                }
            }

            cursor_x += metrics.advance_width.round() as i32;
        }
    }
}

/// Brightness of `row` at fractional column `x`, clamped at both ends
fn interpolate(row: &[f32], x: f64) -> f32 {
    let last = row.len() - 1;
    if x <= 0.0 {
        return row[0];
    }
    if x >= last as f64 {
        return row[last];
    }
    let i = x.floor() as usize;
    let frac = (x - i as f64) as f32;
    row[i] + (row[i + 1] - row[i]) * frac
}

/// Render `canvas` to a mono signal normalized to a peak of 1.
pub fn synthesize(canvas: &Canvas, config: &SynthConfig) -> Result<Vec<f32>> {
    config.validate()?;
    if canvas.width == 0 || canvas.height == 0 {
        return Err(Error::InvalidConfiguration("canvas has no pixels".into()));
    }

    let n = (config.sample_rate as f64 * config.duration as f64) as usize;
    let step_t = if n > 1 { config.duration as f64 / (n - 1) as f64 } else { 0.0 };
    let step_x = if n > 1 { canvas.width as f64 / (n - 1) as f64 } else { 0.0 };

    let height = canvas.height;
    let span = (config.max_freq - config.min_freq) as f64;
    let tones: Vec<(f64, &[f32])> = (0..height)
        .map(|y| {
            let freq = if height > 1 {
                config.min_freq as f64 + span * y as f64 / (height - 1) as f64
            } else {
                config.min_freq as f64
            };
            // bottom canvas row carries the lowest tone
            (freq, canvas.row(height - 1 - y))
        })
        .filter(|(_, row)| row.iter().any(|&p| p > 0.0))
        .collect();

    log::info!(
        "Synthesizing {} samples from {} active rows",
        n,
        tones.len()
    );

    let mut signal: Vec<f32> = (0..n)
        .into_par_iter()
        .map(|i| {
            let t = i as f64 * step_t;
            let x = i as f64 * step_x;
            tones
                .iter()
                .map(|&(freq, row)| (2.0 * PI * freq * t).sin() * interpolate(row, x) as f64)
                .sum::<f64>() as f32
        })
        .collect();

    let peak = signal.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        signal.iter_mut().for_each(|s| *s /= peak);
    }
    Ok(signal)
}

/// Write a normalized signal as 16-bit mono WAV.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    for &s in samples {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    log::info!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

fn wav_error(e: hound::Error) -> Error {
    match e {
        hound::Error::IoError(io) => Error::Io(io),
        other => Error::Io(std::io::Error::other(other.to_string())),
    }
}
