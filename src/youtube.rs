use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::captions::CaptionPayload;
use crate::error::FetchError;
use crate::resolve::VideoId;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

static API_KEY_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).unwrap(),
    ]
});

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsData {
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTracklistRenderer {
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// "asr" for auto-generated tracks
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetch a WebVTT caption track from YouTube's InnerTube API
pub async fn fetch_captions(client: &reqwest::Client, video_id: &VideoId, lang: &str) -> Result<CaptionPayload, FetchError> {
    // Step 1: Fetch the watch page to get the InnerTube API key
    let watch_url = video_id.watch_url();
    debug!("Fetching watch page: {watch_url}");

    let page_html = client
        .get(watch_url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let api_key = extract_api_key(&page_html)?;
    debug!("Extracted InnerTube API key: {api_key}");

    // Step 2: Call InnerTube player endpoint
    let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

    let body = serde_json::json!({
        "context": {
            "client": {
                "hl": lang,
                "gl": "US",
                "clientName": "WEB",
                "clientVersion": "2.20241126.01.00"
            }
        },
        "videoId": video_id.as_str()
    });

    let resp: InnerTubePlayerResponse = client
        .post(&player_url)
        .header("User-Agent", USER_AGENT)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let tracks = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(FetchError::TranscriptsDisabled(video_id.to_string()));
    }

    let track = select_track(&tracks, lang).ok_or_else(|| FetchError::NoTranscript {
        video_id: video_id.to_string(),
        lang: lang.to_string(),
        available: tracks.iter().map(|t| t.language_code.clone()).collect(),
    })?;
    debug!(
        "Using caption track: lang={} generated={}",
        track.language_code,
        track.is_generated()
    );

    // Step 3: Fetch the track itself as WebVTT
    let text = client
        .get(vtt_track_url(&track.base_url)?)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(CaptionPayload {
        text,
        language: track.language_code.clone(),
    })
}

fn extract_api_key(html: &str) -> Result<String, FetchError> {
    API_KEY_RES
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| caps[1].to_string())
        .ok_or(FetchError::ApiKeyMissing)
}

/// Pick the best track for `lang`: exact code before regional variant,
/// manual captions before auto-generated ones.
fn select_track<'a>(tracks: &'a [CaptionTrack], lang: &str) -> Option<&'a CaptionTrack> {
    let base = base_language(lang);
    let exact = |t: &&CaptionTrack| t.language_code.eq_ignore_ascii_case(lang);
    let regional = |t: &&CaptionTrack| base_language(&t.language_code).eq_ignore_ascii_case(base);

    tracks
        .iter()
        .filter(exact)
        .find(|t| !t.is_generated())
        .or_else(|| tracks.iter().find(exact))
        .or_else(|| tracks.iter().filter(regional).find(|t| !t.is_generated()))
        .or_else(|| tracks.iter().find(regional))
}

fn base_language(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

/// Rewrite a caption track URL so it returns WebVTT instead of the default XML
fn vtt_track_url(base_url: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(&base_url.replace("\\u0026", "&"))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut().clear().extend_pairs(pairs).append_pair("fmt", "vtt");
    Ok(url)
}
