//! YouTube transcript adapter.

use crate::error::{DelveError, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Only plain watch URLs are accepted.
const WATCH_PREFIX: &str = "https://www.youtube.com/watch?v=";

const INVALID_URL_MESSAGE: &str =
    "Invalid YouTube video URL. Please provide a valid YouTube video URL.";
const NO_TRANSCRIPT_MESSAGE: &str = "No transcript found for the video.";

/// Extract the video ID from a watch URL.
///
/// Returns `None` unless the URL starts with `https://www.youtube.com/watch?v=`.
/// The ID is the text after the last `v=`, up to any further query parameter.
pub fn extract_video_id(video_url: &str) -> Option<String> {
    if !video_url.starts_with(WATCH_PREFIX) {
        return None;
    }

    let id = video_url
        .rsplit("v=")
        .next()?
        .split(['&', '#'])
        .next()?
        .trim();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode", default)]
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

/// Fetches caption text for YouTube videos.
pub struct YoutubeTranscripts {
    client: reqwest::Client,
    base_url: String,
    text_regex: Regex,
    tag_regex: Regex,
    numeric_entity_regex: Regex,
}

impl YoutubeTranscripts {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_regex: Regex::new(r#"(?s)<text[^>]*>(.*?)</text>"#).expect("Invalid regex"),
            tag_regex: Regex::new(r"<[^>]+>").expect("Invalid regex"),
            numeric_entity_regex: Regex::new(r"&#(\d+);").expect("Invalid regex"),
        }
    }

    /// Fetch the transcript of the video at `video_url` as newline-joined text.
    #[instrument(skip(self), fields(video_url = %video_url))]
    pub async fn transcript(&self, video_url: &str) -> Result<String> {
        let Some(video_id) = extract_video_id(video_url) else {
            return Ok(INVALID_URL_MESSAGE.to_string());
        };

        let page = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id.as_str())])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let tracks = caption_tracks(&page).ok_or_else(|| {
            DelveError::upstream(
                "YouTube",
                format!("transcripts are not available for video {}", video_id),
            )
        })?;

        let track = pick_track(&tracks).ok_or_else(|| {
            DelveError::upstream("YouTube", format!("no caption tracks for video {}", video_id))
        })?;
        debug!(language = %track.language_code, "Fetching caption track");

        let xml = self
            .client
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let transcript = self.parse_timed_text(&xml);
        if transcript.is_empty() {
            Ok(NO_TRANSCRIPT_MESSAGE.to_string())
        } else {
            Ok(transcript)
        }
    }

    /// Turn timed-text XML into one line per caption.
    fn parse_timed_text(&self, xml: &str) -> String {
        self.text_regex
            .captures_iter(xml)
            .filter_map(|caps| caps.get(1))
            .map(|m| self.decode_caption(m.as_str()))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn decode_caption(&self, raw: &str) -> String {
        // Caption text is escaped twice: once as XML, once as HTML.
        let unescaped = self.unescape(&self.unescape(raw));

        self.tag_regex
            .replace_all(&unescaped, "")
            .replace('\n', " ")
            .trim()
            .to_string()
    }

    fn unescape(&self, text: &str) -> String {
        let named = text
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'");

        self.numeric_entity_regex
            .replace_all(&named, |caps: &regex::Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Locate and parse the `captionTracks` array embedded in a watch page.
fn caption_tracks(page: &str) -> Option<Vec<CaptionTrack>> {
    const MARKER: &str = "\"captionTracks\":";
    let start = page.find(MARKER)? + MARKER.len();

    serde_json::Deserializer::from_str(&page[start..])
        .into_iter::<Vec<CaptionTrack>>()
        .next()?
        .ok()
}

/// Prefer a manual English track, then generated English, then anything.
fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    let english = |t: &&CaptionTrack| t.language_code.starts_with("en");
    tracks
        .iter()
        .filter(english)
        .find(|t| t.kind.as_deref() != Some("asr"))
        .or_else(|| tracks.iter().find(english))
        .or_else(|| tracks.first())
}
