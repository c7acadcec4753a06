use serde::Deserialize;
use std::path::Path;

use sonagram::audio::capture::DEFAULT_FORMATS;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub synth: SynthSection,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default)]
    pub hop_size: Option<usize>,
    #[serde(default = "default_min_freq")]
    pub min_freq: f32,
    #[serde(default = "default_max_freq")]
    pub max_freq: f32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u64,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default = "default_true")]
    pub echo_cancellation: bool,
    #[serde(default = "default_true")]
    pub noise_suppression: bool,
    #[serde(default = "default_true")]
    pub auto_gain_control: bool,
}

#[derive(Debug, Deserialize)]
pub struct SynthSection {
    #[serde(default = "default_duration")]
    pub duration: f32,
    #[serde(default = "default_synth_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_synth_min")]
    pub min_freq: f32,
    #[serde(default = "default_max_freq")]
    pub max_freq: f32,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            hop_size: None,
            min_freq: default_min_freq(),
            max_freq: default_max_freq(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            chunk_ms: default_chunk_ms(),
            device: None,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

impl Default for SynthSection {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            sample_rate: default_synth_rate(),
            min_freq: default_synth_min(),
            max_freq: default_max_freq(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_fft_size() -> usize { 2048 }
fn default_min_freq() -> f32 { 0.0 }
fn default_max_freq() -> f32 { 8000.0 }
fn default_chunk_size() -> usize { 50 }
fn default_formats() -> Vec<String> { DEFAULT_FORMATS.iter().map(|s| s.to_string()).collect() }
fn default_chunk_ms() -> u64 { 100 }
fn default_true() -> bool { true }
fn default_duration() -> f32 { 6.0 }
fn default_synth_rate() -> u32 { 44100 }
fn default_synth_min() -> f32 { 300.0 }
fn default_width() -> usize { 1200 }
fn default_height() -> usize { 400 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Invalid config {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.analysis.fft_size, 2048);
        assert_eq!(cfg.analysis.chunk_size, 50);
        assert_eq!(cfg.capture.formats[0], "audio/webm");
        assert_eq!(cfg.capture.chunk_ms, 100);
        assert_eq!(cfg.synth.width, 1200);
    }

    #[test]
    fn sections_override_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [analysis]
            fft_size = 1024
            hop_size = 128
            max_freq = 4000.0

            [capture]
            formats = ["audio/pcm"]
            device = "USB Mic"
            echo_cancellation = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.fft_size, 1024);
        assert_eq!(cfg.analysis.hop_size, Some(128));
        assert_eq!(cfg.analysis.max_freq, 4000.0);
        assert_eq!(cfg.analysis.min_freq, 0.0);
        assert_eq!(cfg.capture.formats, vec!["audio/pcm".to_string()]);
        assert_eq!(cfg.capture.device.as_deref(), Some("USB Mic"));
        assert!(!cfg.capture.echo_cancellation);
        assert!(cfg.capture.noise_suppression);
    }
}
