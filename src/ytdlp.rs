use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::process::Command;

use crate::captions::CaptionPayload;
use crate::error::FetchError;
use crate::resolve::VideoId;

const YT_DLP: &str = "yt-dlp";

/// Download the caption track for a video with yt-dlp, without the video itself.
///
/// Manual subtitles are preferred; auto-generated ones are used when that is
/// all yt-dlp finds. The subtitle file lives in a temporary directory that is
/// removed before this returns.
pub async fn fetch_captions(video_id: &VideoId, lang: &str, timeout: Duration) -> Result<CaptionPayload, FetchError> {
    let tmpdir = tempfile::Builder::new().prefix("ytxt-").tempdir()?;
    let output_template = tmpdir.path().join("%(id)s.%(ext)s");
    let url = video_id.watch_url();

    debug!("Fetching {lang} subtitles via yt-dlp: {url}");

    let mut cmd = Command::new(YT_DLP);
    cmd.args([
        "--skip-download",
        "--write-subs",
        "--write-auto-subs",
        "--sub-langs",
        lang,
        "--sub-format",
        "vtt",
        "--no-playlist",
        "--no-warnings",
        "-o",
    ])
    .arg(&output_template)
    .arg(url.as_str())
    .stdout(Stdio::null())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FetchError::ToolNotFound(YT_DLP.to_string()));
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(FetchError::Timeout(timeout.as_secs())),
    };

    if !output.status.success() {
        return Err(FetchError::ToolFailed {
            tool: YT_DLP.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let path = find_subtitle_file(tmpdir.path(), lang)?.ok_or_else(|| FetchError::NoCaptions {
        video_id: video_id.to_string(),
        lang: lang.to_string(),
    })?;
    debug!("Reading subtitle file: {}", path.display());

    let text = tokio::fs::read_to_string(&path).await?;
    let language = subtitle_language(&path).unwrap_or(lang).to_string();

    Ok(CaptionPayload { text, language })
}

/// The `.vtt` file for `lang` if there is one, else the first `.vtt` found
fn find_subtitle_file(dir: &Path, lang: &str) -> Result<Option<PathBuf>, FetchError> {
    let mut vtts: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("vtt"))
        .collect();
    vtts.sort();

    let preferred = vtts
        .iter()
        .position(|p| subtitle_language(p).is_some_and(|l| l.eq_ignore_ascii_case(lang)));

    Ok(match preferred {
        Some(i) => Some(vtts.swap_remove(i)),
        None => vtts.into_iter().next(),
    })
}

/// Language tag from a yt-dlp subtitle name like `VIDEOID.en-GB.vtt`
fn subtitle_language(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('.').map(|(_, lang)| lang)
}

/// Version string of an installed tool, or `None` when it cannot be run
fn tool_version(name: &str) -> Option<String> {
    std::process::Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

pub fn installed_version() -> Option<String> {
    tool_version(YT_DLP)
}
