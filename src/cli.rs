use clap::Parser;
use std::path::PathBuf;

use ytxt::TranscriptSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse the `default_format` config value
    pub fn from_config(value: &str) -> Option<Self> {
        <Self as clap::ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(Parser)]
#[command(
    name = "ytxt",
    about = "Plain-text transcripts from YouTube captions",
    version
)]
pub struct Cli {
    /// YouTube video URL (reads one URL per line from stdin if omitted)
    pub url: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Preferred caption language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// How to fetch captions
    #[arg(short, long, value_enum)]
    pub method: Option<TranscriptSource>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also save the plain-text transcript as <VIDEO_ID>_transcript.txt
    #[arg(short, long)]
    pub save: bool,

    /// Only drop caption lines that repeat the line right before them
    #[arg(long)]
    pub adjacent_dedup: bool,

    /// Seconds to wait for captions before giving up
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show fetch method and transcript metadata
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["ytxt", "https://youtu.be/abc123"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://youtu.be/abc123"));
        assert!(cli.format.is_none());
        assert!(cli.method.is_none());
        assert!(!cli.save);
        assert!(!cli.adjacent_dedup);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "ytxt",
            "-f",
            "json",
            "-l",
            "de",
            "-m",
            "innertube",
            "--save",
            "--adjacent-dedup",
            "--timeout",
            "5",
            "-v",
        ])
        .unwrap();
        assert!(cli.url.is_none());
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.lang.as_deref(), Some("de"));
        assert_eq!(cli.method, Some(TranscriptSource::InnerTube));
        assert!(cli.save);
        assert!(cli.adjacent_dedup);
        assert_eq!(cli.timeout, Some(5));
        assert!(cli.verbose);
    }

    #[test]
    fn test_method_yt_dlp() {
        let cli = Cli::try_parse_from(["ytxt", "--method", "yt-dlp"]).unwrap();
        assert_eq!(cli.method, Some(TranscriptSource::YtDlp));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["ytxt", "-f", "srt"]).is_err());
    }

    #[test]
    fn test_format_from_config() {
        assert_eq!(OutputFormat::from_config("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_config("TEXT"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_config("srt"), None);
    }
}
