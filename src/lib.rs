pub mod captions;
pub mod config;
pub mod error;
pub mod output;
pub mod resolve;
pub mod youtube;
pub mod ytdlp;

use serde::{Deserialize, Serialize};

pub use captions::{CaptionPayload, CleanedTranscript, Dedup, clean_captions, clean_captions_with};
pub use error::{EmptyTranscript, FetchError, ResolveError};
pub use resolve::{VideoId, resolve_video_id};

/// Where the caption payload came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum TranscriptSource {
    /// Subtitle file written by the yt-dlp tool
    #[default]
    #[serde(rename = "yt-dlp")]
    #[value(name = "yt-dlp")]
    YtDlp,
    /// Caption track fetched from YouTube's InnerTube API
    #[serde(rename = "innertube")]
    #[value(name = "innertube")]
    InnerTube,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::YtDlp => write!(f, "yt-dlp"),
            TranscriptSource::InnerTube => write!(f, "innertube"),
        }
    }
}

/// Cleaned transcript for one video, ready for display or export
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub language: String,
    pub source: TranscriptSource,
    #[serde(flatten)]
    pub text: CleanedTranscript,
}

impl Transcript {
    /// Clean a fetched payload into a transcript for `video_id`
    pub fn from_payload(
        video_id: VideoId,
        source: TranscriptSource,
        payload: CaptionPayload,
        dedup: Dedup,
    ) -> Result<Self, EmptyTranscript> {
        let text = clean_captions_with(&payload.text, dedup)?;
        Ok(Transcript {
            video_id,
            language: payload.language,
            source,
            text,
        })
    }
}
