use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonagram", about = "Record audio and turn it into a spectrogram")]
pub struct Cli {
    /// Config file (defaults to ./sonagram.toml or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record from the microphone, then analyze the recording
    Record(RecordArgs),
    /// Analyze an audio file (WAV, MP3, FLAC, OGG)
    Analyze(AnalyzeArgs),
    /// Synthesize audio whose spectrogram shows a message or image
    Hide(HideArgs),
    /// List audio input devices and exit
    Devices,
}

#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// FFT frame length in samples
    #[arg(long, default_value_t = 2048)]
    pub fft_size: usize,

    /// Samples between frames (defaults to fft_size / 4)
    #[arg(long)]
    pub hop_size: Option<usize>,

    /// Lowest frequency kept, in Hz
    #[arg(long, default_value_t = 0.0)]
    pub min_freq: f32,

    /// Highest frequency kept, in Hz
    #[arg(long, default_value_t = 8000.0)]
    pub max_freq: f32,

    /// Frames per progress update
    #[arg(long, default_value_t = 50)]
    pub chunk_size: usize,

    /// Output spectrogram file (JSON)
    #[arg(short, long, default_value = "spectrogram.json")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Recording length in seconds
    #[arg(short, long, default_value_t = 5.0)]
    pub duration: f32,

    /// Input device name (defaults to the system default)
    #[arg(long)]
    pub device: Option<String>,

    /// Also save the raw recording as WAV
    #[arg(long)]
    pub save_audio: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input audio file
    pub input: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["text", "image"])))]
pub struct HideArgs {
    /// Message to draw into the spectrogram
    pub text: Option<String>,

    /// Image to paint into the spectrogram instead of text
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// TrueType/OpenType font for the message (defaults to the built-in font)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Output WAV file
    #[arg(short, long, default_value = "message.wav")]
    pub output: PathBuf,

    /// Clip length in seconds
    #[arg(long, default_value_t = 6.0)]
    pub duration: f32,

    /// Output sample rate
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Frequency of the bottom canvas row, in Hz
    #[arg(long, default_value_t = 300.0)]
    pub min_freq: f32,

    /// Frequency of the top canvas row, in Hz
    #[arg(long, default_value_t = 8000.0)]
    pub max_freq: f32,

    /// Times the message is repeated vertically
    #[arg(long, default_value_t = 4)]
    pub lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hide(args: &[&str]) -> Result<HideArgs, clap::Error> {
        let argv = ["sonagram", "hide"].iter().chain(args);
        Cli::try_parse_from(argv).map(|cli| match cli.command {
            Command::Hide(hide) => hide,
            other => panic!("parsed {other:?}"),
        })
    }

    #[test]
    fn hide_text_needs_no_font() {
        let args = hide(&["HELLO"]).unwrap();
        assert_eq!(args.text.as_deref(), Some("HELLO"));
        assert!(args.font.is_none());
        assert!(args.image.is_none());
    }

    #[test]
    fn hide_takes_text_or_image_but_not_both() {
        let args = hide(&["--image", "cat.png"]).unwrap();
        assert_eq!(args.image, Some(PathBuf::from("cat.png")));
        assert!(hide(&["HELLO", "--image", "cat.png"]).is_err());
        assert!(hide(&[]).is_err());
    }
}
