//! Video transcripts.
//!
//! The transcript is read from the caption tracks listed in the video's watch page, the same
//! data the player uses to show subtitles.
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::types::{ChatError, Result};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

/// A caption track as listed in the player response of a watch page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
	pub base_url: String,
	pub language_code: String,
	/// `Some("asr")` for automatically generated captions.
	#[serde(default)]
	pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Transcript {
	#[serde(rename = "text", default)]
	lines: Vec<TranscriptLine>,
}

#[derive(Debug, Deserialize)]
struct TranscriptLine {
	#[serde(rename = "$text", default)]
	text: String,
}

/// Fetch the transcript of the video at `url`, preferring captions in `languages`.
#[instrument(skip(client))]
pub(super) async fn extract(
	client: &reqwest::Client,
	url: &str,
	languages: &[&str],
) -> Result<String> {
	let id = video_id(url)?;

	let page = fetch(client, &format!("{}?v={}", WATCH_URL, id)).await?;
	let tracks = caption_tracks(&page)?;

	let track = pick_track(&tracks, languages).ok_or_else(|| {
		error!("Video {} has no captions", id);
		ChatError::DocumentExtraction(format!("video {} has no transcript", id))
	})?;

	debug!("Using {} captions of video {}", track.language_code, id);

	let xml = fetch(client, &track.base_url).await?;

	transcript_text(&xml)
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String> {
	client
		.get(url)
		.header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
		.send()
		.await
		.and_then(|res| res.error_for_status())
		.map_err(|e| {
			error!("Failed to fetch {}: {}", url, e);
			ChatError::DocumentExtraction(format!("failed to fetch video data: {}", e))
		})?
		.text()
		.await
		.map_err(|e| {
			error!("Failed to read body of {}: {}", url, e);
			ChatError::DocumentExtraction(format!("failed to read video data: {}", e))
		})
}

/// Video id of a `youtube.com/watch?v=`, `youtu.be/`, `/shorts/`, `/embed/` or `/live/` url.
pub fn video_id(url: &str) -> Result<String> {
	let invalid = || {
		warn!("Not a video url: {}", url);
		ChatError::DocumentExtraction(format!("not a video url: {}", url))
	};

	let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
	let host = parsed.host_str().ok_or_else(invalid)?.trim_start_matches("www.").trim_start_matches("m.");
	let mut segments = parsed.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

	let id = match host {
		"youtu.be" => segments.next().map(str::to_string),
		"youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => match segments.next() {
			Some("watch") =>
				parsed.query_pairs().find(|(key, _)| key == "v").map(|(_, v)| v.into_owned()),
			Some("shorts" | "embed" | "live" | "v") => segments.next().map(str::to_string),
			_ => None,
		},
		_ => None,
	};

	id.filter(|id| id.len() == 11 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
		.ok_or_else(invalid)
}

/// Caption tracks listed in a watch page. An empty list means the video has no captions.
pub fn caption_tracks(page: &str) -> Result<Vec<CaptionTrack>> {
	let Some(start) = page.find(CAPTION_TRACKS_KEY) else {
		return Ok(vec![])
	};

	serde_json::Deserializer::from_str(&page[start + CAPTION_TRACKS_KEY.len()..])
		.into_iter::<Vec<CaptionTrack>>()
		.next()
		.unwrap_or(Ok(vec![]))
		.map_err(|e| {
			error!("Failed to parse caption tracks: {}", e);
			ChatError::DocumentExtraction(format!("unreadable caption list: {}", e))
		})
}

/// First track matching `languages` in order, manual captions before generated ones, falling back
/// to the first track.
pub fn pick_track<'a>(tracks: &'a [CaptionTrack], languages: &[&str]) -> Option<&'a CaptionTrack> {
	let matches = |track: &CaptionTrack, lang: &str| {
		track.language_code == lang || track.language_code.starts_with(&format!("{}-", lang))
	};

	languages
		.iter()
		.find_map(|lang| {
			tracks
				.iter()
				.filter(|track| matches(track, lang))
				.min_by_key(|track| track.kind.is_some())
		})
		.or_else(|| tracks.first())
}

/// Caption lines of a timed-text document joined with spaces.
pub fn transcript_text(xml: &str) -> Result<String> {
	let transcript: Transcript = quick_xml::de::from_str(xml).map_err(|e| {
		error!("Failed to parse transcript: {}", e);
		ChatError::DocumentExtraction(format!("unreadable transcript: {}", e))
	})?;

	Ok(transcript
		.lines
		.iter()
		.map(|line| {
			// Captions arrive escaped twice, e.g. `&amp;#39;`
			let text = quick_xml::escape::unescape(&line.text)
				.map(|text| text.into_owned())
				.unwrap_or_else(|_| line.text.clone());
			text.split_whitespace().collect::<Vec<_>>().join(" ")
		})
		.filter(|line| !line.is_empty())
		.collect::<Vec<_>>()
		.join(" "))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn video_ids_from_common_urls() {
		for url in [
			"https://www.youtube.com/watch?v=dQw4w9WgXcQ",
			"https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
			"https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
			"https://youtu.be/dQw4w9WgXcQ?si=abc",
			"https://www.youtube.com/shorts/dQw4w9WgXcQ",
			"https://www.youtube.com/embed/dQw4w9WgXcQ",
		] {
			assert_eq!(video_id(url).unwrap(), "dQw4w9WgXcQ", "{}", url);
		}
	}

	#[test]
	fn non_video_urls_are_rejected() {
		for url in [
			"https://example.com/watch?v=dQw4w9WgXcQ",
			"https://www.youtube.com/channel/UC123",
			"https://www.youtube.com/watch?v=short",
			"not a url",
		] {
			assert!(matches!(video_id(url), Err(ChatError::DocumentExtraction(_))), "{}", url);
		}
	}

	#[test]
	fn caption_tracks_from_watch_page() {
		let page = r#"<script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=en","name":{"runs":[{"text":"English"}]},"languageCode":"en","kind":"asr"},{"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=pt-BR","name":{"runs":[{"text":"Português"}]},"languageCode":"pt-BR"}],"audioTracks":[]}}};</script>"#;

		let tracks = caption_tracks(page).unwrap();

		assert_eq!(tracks.len(), 2);
		assert_eq!(tracks[0].base_url, "https://www.youtube.com/api/timedtext?v=x&lang=en");
		assert_eq!(tracks[0].kind.as_deref(), Some("asr"));
		assert_eq!(tracks[1].language_code, "pt-BR");
	}

	#[test]
	fn page_without_captions_has_no_tracks() {
		assert!(caption_tracks("<html>no player here</html>").unwrap().is_empty());
	}

	#[test]
	fn track_preference() {
		let track = |lang: &str, kind: Option<&str>| CaptionTrack {
			base_url: format!("https://t/{}", lang),
			language_code: lang.to_string(),
			kind: kind.map(str::to_string),
		};
		let tracks = vec![track("de", None), track("en", Some("asr")), track("en", None)];

		assert_eq!(pick_track(&tracks, &["pt", "en"]), Some(&tracks[2]));
		assert_eq!(pick_track(&tracks, &["fr"]), Some(&tracks[0]));
		assert_eq!(pick_track(&[], &["en"]), None);

		let tracks = vec![track("pt-BR", None)];
		assert_eq!(pick_track(&tracks, &["pt"]), Some(&tracks[0]));
	}

	#[test]
	fn transcript_lines_are_joined() {
		let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="2.1">Hello and welcome</text><text start="2.6" dur="1.9">it&amp;#39;s   a
		test</text><text start="4.5" dur="1"></text><text start="5" dur="1">R&amp;amp;D</text></transcript>"#;

		assert_eq!(transcript_text(xml).unwrap(), "Hello and welcome it's a test R&D");
	}
}
