use std::fmt;

use log::debug;
use serde::Serialize;
use url::Url;

use crate::error::ResolveError;

const WATCH_URL: &str = "https://www.youtube.com/watch";

/// Canonical YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `youtube.com/watch` URL for this video, with the ID query-encoded
    pub fn watch_url(&self) -> Url {
        let mut url = Url::parse(WATCH_URL).expect("WATCH_URL is a valid URL");
        url.query_pairs_mut().append_pair("v", &self.0);
        url
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video ID from a YouTube URL.
///
/// Recognized shapes:
/// - `youtu.be/ID`
/// - `youtube.com/watch?v=ID` (first non-blank `v` wins)
/// - `youtube.com/embed/ID`
/// - `youtube.com/v/ID`
///
/// `www.youtube.com` is accepted wherever `youtube.com` is. Anything else,
/// including scheme-less strings, is an error rather than a panic.
pub fn resolve_video_id(input: &str) -> Result<VideoId, ResolveError> {
    if input.trim().is_empty() {
        return Err(ResolveError::Empty);
    }

    let url = Url::parse(input).map_err(|e| {
        debug!("Failed to parse {input:?} as a URL: {e}");
        ResolveError::NotAUrl(input.to_string())
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| ResolveError::NotAUrl(input.to_string()))?;

    let id = match host {
        "youtu.be" => first_segment(url.path().strip_prefix('/').unwrap_or_default()),
        "youtube.com" | "www.youtube.com" => {
            let path = url.path();
            if path == "/watch" {
                url.query_pairs()
                    .find(|(key, value)| key == "v" && !value.is_empty())
                    .map(|(_, value)| value.into_owned())
            } else if let Some(rest) = path.strip_prefix("/embed/") {
                first_segment(rest)
            } else if let Some(rest) = path.strip_prefix("/v/") {
                first_segment(rest)
            } else {
                return Err(ResolveError::UnsupportedPath(input.to_string()));
            }
        }
        other => return Err(ResolveError::UnsupportedHost(other.to_string())),
    };

    id.map(VideoId).ok_or_else(|| ResolveError::MissingId(input.to_string()))
}

fn first_segment(path: &str) -> Option<String> {
    path.split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
