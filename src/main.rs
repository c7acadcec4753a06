mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cli::{AnalysisArgs, AnalyzeArgs, Cli, Command, HideArgs, RecordArgs};
use config::Config;
use sonagram::audio::capture::CaptureConstraints;
use sonagram::audio::decode::{decode_file, SymphoniaDecoder};
use sonagram::audio::device::CpalBackend;
use sonagram::spectrogram::collect_analysis;
use sonagram::synth::{self, Canvas, SynthConfig};
use sonagram::{
    spawn_analysis, CaptureSettings, RecordingSession, Spectrogram, SpectrogramConfig,
    SpectrogramMatrix,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect sonagram.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("sonagram.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("sonagram").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("sonagram").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    match &mut cli.command {
        Command::Record(args) => {
            merge_analysis(&mut args.analysis, &cfg);
            record(args, &cfg)
        }
        Command::Analyze(args) => {
            merge_analysis(&mut args.analysis, &cfg);
            analyze_file(args)
        }
        Command::Hide(args) => {
            merge_synth(args, &cfg);
            hide(args, &cfg)
        }
        Command::Devices => list_devices(),
    }
}

/// Config values apply only where the CLI is at its default
fn merge_analysis(args: &mut AnalysisArgs, cfg: &Config) {
    if args.fft_size == 2048 { args.fft_size = cfg.analysis.fft_size; }
    if args.hop_size.is_none() { args.hop_size = cfg.analysis.hop_size; }
    if args.min_freq == 0.0 { args.min_freq = cfg.analysis.min_freq; }
    if args.max_freq == 8000.0 { args.max_freq = cfg.analysis.max_freq; }
    if args.chunk_size == 50 { args.chunk_size = cfg.analysis.chunk_size; }
}

fn merge_synth(args: &mut HideArgs, cfg: &Config) {
    if args.duration == 6.0 { args.duration = cfg.synth.duration; }
    if args.sample_rate == 44100 { args.sample_rate = cfg.synth.sample_rate; }
    if args.min_freq == 300.0 { args.min_freq = cfg.synth.min_freq; }
    if args.max_freq == 8000.0 { args.max_freq = cfg.synth.max_freq; }
}

fn spectrogram_config(args: &AnalysisArgs) -> SpectrogramConfig {
    SpectrogramConfig {
        fft_size: args.fft_size,
        hop_size: args.hop_size,
        min_freq: args.min_freq,
        max_freq: args.max_freq,
        chunk_size: args.chunk_size,
    }
}

fn frames_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb
}

fn record(args: &RecordArgs, cfg: &Config) -> Result<()> {
    let settings = CaptureSettings {
        formats: cfg.capture.formats.clone(),
        constraints: CaptureConstraints {
            echo_cancellation: cfg.capture.echo_cancellation,
            noise_suppression: cfg.capture.noise_suppression,
            auto_gain_control: cfg.capture.auto_gain_control,
            chunk_interval: Duration::from_millis(cfg.capture.chunk_ms),
            device: args.device.clone().or_else(|| cfg.capture.device.clone()),
        },
    };

    let mut session = RecordingSession::new(CpalBackend::new(), SymphoniaDecoder, settings);
    session.start().context("Failed to start recording")?;

    let meter = ProgressBar::new_spinner();
    meter.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] recording {msg}")
            .unwrap(),
    );

    let length = Duration::from_secs_f32(args.duration.max(0.0));
    let started = Instant::now();
    while started.elapsed() < length {
        session.pump()?;
        let level = session.live_level();
        let filled = (level / 5.0).round() as usize;
        meter.set_message(format!("{:>3.0} |{:<20}|", level, "#".repeat(filled)));
        meter.tick();
        std::thread::sleep(Duration::from_millis(50));
    }
    meter.finish_and_clear();

    session.stop().context("Failed to finalize recording")?;

    if let (Some(path), Some(buffer)) = (&args.save_audio, session.buffer()) {
        synth::write_wav(path, buffer.samples(), buffer.sample_rate())
            .with_context(|| format!("Failed to save recording to {}", path.display()))?;
    }

    let run = session.begin_analysis(&spectrogram_config(&args.analysis))?;
    let (worker, events) = spawn_analysis(run.buffer().clone(), run.config().clone());

    let mut pb: Option<ProgressBar> = None;
    let outcome = collect_analysis(&events, |done, total, _rows| {
        let bar = pb.get_or_insert_with(|| frames_bar(total));
        bar.set_position(done as u64);
    });
    if worker.join().is_err() {
        log::error!("Analysis worker panicked");
    }
    if let Some(bar) = pb {
        bar.finish_with_message("Analysis complete");
    }

    let matrix = session
        .finish_analysis(run, outcome)
        .context("Spectrogram analysis failed")?;
    write_matrix(&args.analysis.output, matrix)
}

fn analyze_file(args: &AnalyzeArgs) -> Result<()> {
    let input = &args.input;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("Input: {}", input.display());
    log::info!("Decoding audio...");
    let buffer = decode_file(input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    let spectrogram = Spectrogram::new(&buffer, &spectrogram_config(&args.analysis))?;
    let layout = *spectrogram.layout();
    log::info!(
        "Analyzing {} frames, {} bins per frame ({:.1}-{:.1} Hz)",
        layout.frame_count,
        layout.bins_per_row(),
        layout.min_bin as f32 * layout.bin_hz,
        layout.max_bin as f32 * layout.bin_hz
    );

    let pb = frames_bar(layout.frame_count);
    let matrix = spectrogram.run(|progress| pb.set_position(progress.frames_done as u64));
    pb.finish_with_message("Analysis complete");

    write_matrix(&args.analysis.output, &matrix)
}

fn write_matrix(path: &Path, matrix: &SpectrogramMatrix) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), matrix)
        .with_context(|| format!("Failed to write spectrogram to {}", path.display()))?;
    log::info!(
        "Wrote {} frames x {} bins to {}",
        matrix.len(),
        matrix.bins_per_row(),
        path.display()
    );
    Ok(())
}

fn hide(args: &HideArgs, cfg: &Config) -> Result<()> {
    let canvas = match (&args.image, &args.text) {
        (Some(image), _) => {
            // 200 columns per second of audio
            let width = (args.duration.max(0.0) * 200.0) as usize;
            Canvas::from_image(image, width, cfg.synth.height)
                .with_context(|| format!("Failed to load image {}", image.display()))?
        }
        (None, Some(text)) => {
            let font = synth::load_font(args.font.as_deref()).context("Failed to load font")?;
            let mut canvas = Canvas::new(cfg.synth.width, cfg.synth.height);
            let font_size = cfg.synth.height as f32 * 0.2;
            canvas.draw_text(&font, text, font_size, args.lines);
            canvas
        }
        (None, None) => anyhow::bail!("Nothing to hide: pass a message or --image"),
    };
    if canvas.is_blank() {
        log::warn!("Canvas has no visible pixels; output will be silent");
    }

    let synth_config = SynthConfig {
        duration: args.duration,
        sample_rate: args.sample_rate,
        min_freq: args.min_freq,
        max_freq: args.max_freq,
    };
    let samples = synth::synthesize(&canvas, &synth_config)?;
    synth::write_wav(&args.output, &samples, args.sample_rate)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log::info!("Done! Output: {}", args.output.display());
    Ok(())
}

fn list_devices() -> Result<()> {
    let devices = CpalBackend::new().list_devices()?;
    if devices.is_empty() {
        println!("No input devices found");
        return Ok(());
    }
    println!("Input devices:");
    for device in &devices {
        let marker = if device.is_default { "*" } else { " " };
        let details = match (device.sample_rate, device.channels) {
            (Some(rate), Some(ch)) => format!("{}Hz, {} ch", rate, ch),
            _ => "unavailable".to_string(),
        };
        println!(" {} {:<40} {}", marker, device.name, details);
    }
    Ok(())
}
