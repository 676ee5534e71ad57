use thiserror::Error;

/// Why a string could not be turned into a video ID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no URL given")]
    Empty,

    #[error("not a URL: {0}")]
    NotAUrl(String),

    #[error("not a YouTube host: {0}")]
    UnsupportedHost(String),

    #[error("unrecognized YouTube URL path: {0}")]
    UnsupportedPath(String),

    #[error("no video ID in URL: {0}")]
    MissingId(String),
}

/// Cleaning left no caption text at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no caption text left after cleaning")]
pub struct EmptyTranscript;

/// Failures of the external caption fetchers (yt-dlp, InnerTube)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} not found. Install it and make sure it is on your PATH:\n  pip install yt-dlp\n  or: brew install yt-dlp")]
    ToolNotFound(String),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed { tool: String, status: String, stderr: String },

    #[error("timed out after {0}s waiting for captions")]
    Timeout(u64),

    #[error("no {lang} captions available for video {video_id}")]
    NoCaptions { video_id: String, lang: String },

    #[error("transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("no {lang} transcript for video {video_id} (available: {})", .available.join(", "))]
    NoTranscript {
        video_id: String,
        lang: String,
        available: Vec<String>,
    },

    #[error("could not extract InnerTube API key from watch page")]
    ApiKeyMissing,

    #[error("invalid caption track URL: {0}")]
    TrackUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether trying the same fetch again could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(e) => !e.status().is_some_and(|s| s.is_client_error()),
            FetchError::ToolFailed { .. } | FetchError::Timeout(_) | FetchError::ApiKeyMissing => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Timeout(30).is_retryable());
        assert!(
            FetchError::ToolFailed {
                tool: "yt-dlp".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "HTTP Error 503".to_string(),
            }
            .is_retryable()
        );
        assert!(!FetchError::ToolNotFound("yt-dlp".to_string()).is_retryable());
        assert!(!FetchError::TranscriptsDisabled("abc".to_string()).is_retryable());
        assert!(
            !FetchError::NoCaptions {
                video_id: "abc".to_string(),
                lang: "en".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_no_transcript_lists_languages() {
        let err = FetchError::NoTranscript {
            video_id: "abc123".to_string(),
            lang: "fr".to_string(),
            available: vec!["en".to_string(), "de".to_string()],
        };
        assert_eq!(err.to_string(), "no fr transcript for video abc123 (available: en, de)");
    }

    #[test]
    fn test_resolve_error_messages() {
        assert_eq!(ResolveError::Empty.to_string(), "no URL given");
        assert_eq!(
            ResolveError::UnsupportedHost("vimeo.com".to_string()).to_string(),
            "not a YouTube host: vimeo.com"
        );
    }
}
