use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EmptyTranscript;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());

const HEADER: &str = "WEBVTT";
const CUE_TIMING: &str = "-->";
const METADATA_PREFIXES: &[&str] = &["Kind:", "Language:"];

/// Unprocessed subtitle track as handed over by a fetcher
#[derive(Debug, Clone)]
pub struct CaptionPayload {
    pub text: String,
    pub language: String,
}

/// Which repeated caption lines get dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dedup {
    /// Drop every later repeat of a line, wherever it appears
    #[default]
    Anywhere,
    /// Drop a line only when it repeats the line kept right before it
    Adjacent,
}

/// Plain-text transcript left after cleaning a caption payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedTranscript {
    text: String,
    lines: usize,
}

impl CleanedTranscript {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of distinct caption lines that went into the text
    pub fn line_count(&self) -> usize {
        self.lines
    }
}

impl fmt::Display for CleanedTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Turn a WebVTT caption payload into a single line of plain text.
///
/// Markup tags are stripped, header/metadata/timing lines dropped, and any
/// caption line seen before is skipped, even when the repeat is not adjacent.
pub fn clean_captions(raw: &str) -> Result<CleanedTranscript, EmptyTranscript> {
    clean_captions_with(raw, Dedup::Anywhere)
}

/// Same as [`clean_captions`] with an explicit deduplication mode.
pub fn clean_captions_with(raw: &str, dedup: Dedup) -> Result<CleanedTranscript, EmptyTranscript> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    // Tags may span line breaks, so strip them before splitting.
    let untagged = strip_tags(raw);

    let candidates = untagged.lines().map(str::trim).filter(|line| is_caption_line(line));

    let mut kept: Vec<&str> = Vec::new();
    match dedup {
        Dedup::Anywhere => {
            let mut seen = HashSet::new();
            kept.extend(candidates.filter(|line| seen.insert(*line)));
        }
        Dedup::Adjacent => {
            for line in candidates {
                if kept.last() != Some(&line) {
                    kept.push(line);
                }
            }
        }
    }

    if kept.is_empty() {
        return Err(EmptyTranscript);
    }

    let text = kept.join(" ").split_whitespace().collect::<Vec<_>>().join(" ");
    debug!("Cleaned captions: {} lines, {} chars", kept.len(), text.len());

    Ok(CleanedTranscript {
        text,
        lines: kept.len(),
    })
}

/// Strip tags until none are left, so `<<b>>` does not leave `<>` behind
fn strip_tags(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let stripped = TAG_RE.replace_all(&text, "");
        if stripped.len() == text.len() {
            return text;
        }
        text = stripped.into_owned();
    }
}

fn is_caption_line(line: &str) -> bool {
    !line.is_empty()
        && !line.starts_with(HEADER)
        && !line.contains(CUE_TIMING)
        && !METADATA_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}
