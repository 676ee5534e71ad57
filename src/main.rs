use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, bail, eyre};
use log::{debug, info, warn};

mod cli;

use cli::{Cli, OutputFormat};
use ytxt::config::{self, Config};
use ytxt::{Dedup, FetchError, Transcript, TranscriptSource, VideoId};

const MAX_ATTEMPTS: u32 = 3;

const SUPPORTED_FORMATS: &str = "Supported formats:
  https://www.youtube.com/watch?v=ID
  https://youtu.be/ID
  https://www.youtube.com/embed/ID
  https://www.youtube.com/v/ID";

/// Effective settings after merging CLI flags over the config file
struct Settings {
    lang: String,
    method: TranscriptSource,
    format: OutputFormat,
    timeout: Duration,
    dedup: Dedup,
    output: Option<PathBuf>,
    save: bool,
    verbose: bool,
}

impl Settings {
    fn new(cli: &Cli, config: &Config) -> Self {
        let format = cli
            .format
            .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_config))
            .unwrap_or(OutputFormat::Text);
        let dedup = if cli.adjacent_dedup {
            Dedup::Adjacent
        } else {
            config.dedup.unwrap_or_default()
        };

        Settings {
            lang: cli.lang.clone().unwrap_or_else(|| config.lang().to_string()),
            method: cli.method.or(config.method).unwrap_or_default(),
            format,
            timeout: cli.timeout.map(Duration::from_secs).unwrap_or_else(|| config.timeout()),
            dedup,
            output: cli.output.clone(),
            save: cli.save,
            verbose: cli.verbose,
        }
    }
}

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytxt.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytxt")
        .join("logs")
}

fn build_after_help() -> String {
    let yt_dlp_line = match ytxt::ytdlp::installed_version() {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found, needed for --method yt-dlp)".to_string(),
    };

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        config::config_path().display(),
        log_dir().join("ytxt.log").display()
    )
}

/// Retry a fetch with exponential backoff while the failure looks transient
async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt + 1 < max_attempts && e.is_retryable() => {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_transcript(client: &reqwest::Client, video_id: &VideoId, settings: &Settings) -> Result<Transcript> {
    let lang = settings.lang.as_str();

    let payload = match settings.method {
        TranscriptSource::YtDlp => {
            let timeout = settings.timeout;
            retry(MAX_ATTEMPTS, || async move { ytxt::ytdlp::fetch_captions(video_id, lang, timeout).await }).await?
        }
        TranscriptSource::InnerTube => {
            retry(MAX_ATTEMPTS, || async move { ytxt::youtube::fetch_captions(client, video_id, lang).await }).await?
        }
    };
    debug!("Fetched {} bytes of {} captions", payload.text.len(), payload.language);

    Transcript::from_payload(video_id.clone(), settings.method, payload, settings.dedup)
        .map_err(|_| eyre!("no captions available for video {video_id}"))
}

async fn process(client: &reqwest::Client, input: &str, settings: &Settings) -> Result<()> {
    let video_id = match ytxt::resolve_video_id(input) {
        Ok(id) => id,
        Err(e) => bail!("{e}\n\n{SUPPORTED_FORMATS}"),
    };
    debug!("Resolved {input} to video {video_id}");

    let transcript = fetch_transcript(client, &video_id, settings).await?;

    if settings.verbose {
        eprintln!(
            "Video: {}\nSource: {}\nLanguage: {}\nLines: {}",
            transcript.video_id,
            transcript.source,
            transcript.language,
            transcript.text.line_count(),
        );
    }

    let rendered = match settings.format {
        OutputFormat::Text => ytxt::output::render_text(&transcript),
        OutputFormat::Json => ytxt::output::render_json(&transcript),
    };

    if let Some(ref path) = settings.output {
        std::fs::write(path, &rendered)?;
        if settings.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }

    if settings.save {
        let path = ytxt::output::transcript_file_name(&transcript.video_id);
        std::fs::write(&path, ytxt::output::render_text(&transcript))?;
        eprintln!("Transcript saved to: {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file {}: {e}", config::config_path().display());
        Config::default()
    });
    let settings = Settings::new(&cli, &config);

    if settings.verbose {
        let config_path = config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let client = reqwest::Client::builder().timeout(settings.timeout).build()?;

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    let inputs: Vec<&str> = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()).collect();
    if inputs.is_empty() {
        bail!("no URL provided\n\nUsage: ytxt <URL>\n       echo <URL> | ytxt");
    }

    let mut failed = 0;
    for input in &inputs {
        if let Err(e) = process(&client, input, &settings).await {
            warn!("Failed to process {input}: {e}");
            eprintln!("error: {input}: {e}");
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} input(s) failed", inputs.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::cell::Cell;

    fn settings(args: &[&str], config: &Config) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        Settings::new(&cli, config)
    }

    #[test]
    fn test_settings_defaults() {
        let s = settings(&["ytxt"], &Config::default());
        assert_eq!(s.lang, "en");
        assert_eq!(s.method, TranscriptSource::YtDlp);
        assert_eq!(s.format, OutputFormat::Text);
        assert_eq!(s.timeout, Duration::from_secs(config::DEFAULT_TIMEOUT_SECS));
        assert_eq!(s.dedup, Dedup::Anywhere);
    }

    #[test]
    fn test_settings_config_fills_gaps() {
        let config: Config = toml::from_str(
            r#"
default_lang = "de"
default_format = "json"
method = "innertube"
dedup = "adjacent"
"#,
        )
        .unwrap();
        let s = settings(&["ytxt"], &config);
        assert_eq!(s.lang, "de");
        assert_eq!(s.format, OutputFormat::Json);
        assert_eq!(s.method, TranscriptSource::InnerTube);
        assert_eq!(s.dedup, Dedup::Adjacent);
    }

    #[test]
    fn test_settings_cli_wins() {
        let config: Config = toml::from_str(
            r#"
default_lang = "de"
default_format = "json"
method = "innertube"
timeout_secs = 90
"#,
        )
        .unwrap();
        let s = settings(&["ytxt", "-l", "fr", "-f", "text", "-m", "yt-dlp", "--timeout", "5"], &config);
        assert_eq!(s.lang, "fr");
        assert_eq!(s.format, OutputFormat::Text);
        assert_eq!(s.method, TranscriptSource::YtDlp);
        assert_eq!(s.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let calls = Cell::new(0);
        let result: Result<(), FetchError> = retry(3, || {
            calls.set(calls.get() + 1);
            async { Err(FetchError::ToolNotFound("yt-dlp".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(FetchError::ToolNotFound(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retry_retries_transient_error() {
        let calls = Cell::new(0);
        let result = retry(3, || {
            let n = calls.get() + 1;
            calls.set(n);
            async move { if n < 3 { Err(FetchError::Timeout(1)) } else { Ok(n) } }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), FetchError> = retry(2, || {
            calls.set(calls.get() + 1);
            async { Err(FetchError::Timeout(1)) }
        })
        .await;
        assert!(matches!(result, Err(FetchError::Timeout(1))));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_process_rejects_bad_url() {
        let client = reqwest::Client::new();
        let s = settings(&["ytxt"], &Config::default());
        let err = process(&client, "https://vimeo.com/watch?v=abc", &s).await.unwrap_err();
        assert!(err.to_string().contains("not a YouTube host"));
        assert!(err.to_string().contains("Supported formats"));
    }
}
