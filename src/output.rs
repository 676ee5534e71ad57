use std::path::PathBuf;

use crate::Transcript;
use crate::resolve::VideoId;

/// Render transcript as plain text
pub fn render_text(transcript: &Transcript) -> String {
    transcript.text.to_string()
}

/// Render transcript with its metadata as pretty-printed JSON
pub fn render_json(transcript: &Transcript) -> String {
    // Transcript holds only strings and unit enums
    serde_json::to_string_pretty(transcript).unwrap_or_default()
}

/// File name used by `--save`, e.g. `dQw4w9WgXcQ_transcript.txt`
pub fn transcript_file_name(video_id: &VideoId) -> PathBuf {
    let safe: String = video_id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    PathBuf::from(format!("{safe}_transcript.txt"))
}
