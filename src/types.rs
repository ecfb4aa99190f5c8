//! Wire types for the public HTTP surface.
//!
//! The `/download` response shape is part of the service contract: top-level
//! video metadata passed through unchanged (null when absent), three link
//! arrays, and a fixed advisory note. Sizes and bitrates are emitted as raw
//! numbers; presentation is the client's concern.

use serde::Serialize;

use crate::extractor::VideoInfo;
use crate::formats::{Classification, NormalizedFormat, VIDEO_ONLY_NOTE};

/// Fixed advisory attached to every successful response.
pub const RESPONSE_NOTE: &str = "Returned direct links if available. If mp4 progressive links are missing, video-only mp4 or chunked streams may be returned.";

// ─── Download response ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub title: Option<String>,
    pub id: Option<String>,
    pub thumbnail: Option<String>,
    /// Seconds, as reported by the extractor.
    pub duration: Option<f64>,
    pub mp4: Vec<VideoLink>,
    pub m4a: Vec<MuxedAudioLink>,
    pub audio_fallbacks: Vec<AudioLink>,
    pub note: &'static str,
}

/// One entry of the `mp4` array.
#[derive(Debug, Serialize)]
pub struct VideoLink {
    pub format_id: Option<String>,
    pub quality_label: Option<String>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
    pub url: String,
    /// Present only on entries substituted from the video-only bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// One entry of the `m4a` array.
#[derive(Debug, Serialize)]
pub struct MuxedAudioLink {
    pub format_id: Option<String>,
    pub abr: Option<f64>,
    pub filesize: Option<u64>,
    pub url: String,
}

/// One entry of the `audio_fallbacks` array.
#[derive(Debug, Serialize)]
pub struct AudioLink {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub abr: Option<f64>,
    pub filesize: Option<u64>,
    pub url: String,
}

impl DownloadResponse {
    /// Combine extractor metadata with the classified buckets.
    ///
    /// Produces exactly one response object; empty buckets are valid output,
    /// the advisory note covers the caveats.
    pub fn assemble(info: VideoInfo, classification: Classification) -> Self {
        let video_note = classification.video_is_fallback.then_some(VIDEO_ONLY_NOTE);

        Self {
            title: info.title,
            id: info.id,
            thumbnail: info.thumbnail,
            duration: info.duration,
            mp4: classification
                .video
                .into_iter()
                .map(|f| VideoLink::from_format(f, video_note))
                .collect(),
            m4a: classification
                .muxed_audio
                .into_iter()
                .map(MuxedAudioLink::from_format)
                .collect(),
            audio_fallbacks: classification
                .audio_fallbacks
                .into_iter()
                .map(AudioLink::from_format)
                .collect(),
            note: RESPONSE_NOTE,
        }
    }
}

impl VideoLink {
    fn from_format(f: NormalizedFormat, note: Option<&'static str>) -> Self {
        Self {
            format_id: f.format_id,
            quality_label: f.quality_label,
            height: f.height,
            filesize: f.filesize,
            url: f.url,
            note,
        }
    }
}

impl MuxedAudioLink {
    fn from_format(f: NormalizedFormat) -> Self {
        Self {
            format_id: f.format_id,
            abr: f.bitrate,
            filesize: f.filesize,
            url: f.url,
        }
    }
}

impl AudioLink {
    fn from_format(f: NormalizedFormat) -> Self {
        Self {
            format_id: f.format_id,
            ext: f.container,
            abr: f.bitrate,
            filesize: f.filesize,
            url: f.url,
        }
    }
}

// ─── Error response ─────────────────────────────────────────────────────────

/// JSON body for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ─── Info ───────────────────────────────────────────────────────────────────

/// Service information response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub version: Version,
    pub build_time: u64,
    pub git: GitInfo,
    /// Name of the metadata extractor binary in use.
    pub extractor: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub semver: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub branch: String,
    pub commit: String,
    pub commit_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::classify;
    use serde_json::json;

    fn info() -> VideoInfo {
        VideoInfo {
            title: Some("Test Video".to_string()),
            id: Some("abc123".to_string()),
            thumbnail: Some("https://i.example/thumb.jpg".to_string()),
            duration: Some(212.5),
            formats: Vec::new(),
        }
    }

    #[test]
    fn metadata_passes_through_unchanged() {
        let response = DownloadResponse::assemble(info(), Classification::default());
        assert_eq!(response.title.as_deref(), Some("Test Video"));
        assert_eq!(response.id.as_deref(), Some("abc123"));
        assert_eq!(response.duration, Some(212.5));
        assert_eq!(response.note, RESPONSE_NOTE);
    }

    #[test]
    fn fallback_entries_all_carry_the_advisory() {
        let raw = vec![
            json!({
                "format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none",
                "height": 1080, "url": "https://cdn.example/137.mp4",
            }),
            json!({
                "format_id": "135", "ext": "mp4", "vcodec": "avc1", "acodec": "none",
                "height": 480, "url": "https://cdn.example/135.mp4",
            }),
        ];
        let response = DownloadResponse::assemble(info(), classify(&raw));
        assert_eq!(response.mp4.len(), 2);
        for link in &response.mp4 {
            assert_eq!(link.note, Some(VIDEO_ONLY_NOTE));
        }
    }

    #[test]
    fn progressive_entries_carry_no_advisory() {
        let raw = vec![json!({
            "format_id": "22", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a.40.2",
            "height": 720, "url": "https://cdn.example/22.mp4",
        })];
        let response = DownloadResponse::assemble(info(), classify(&raw));
        assert_eq!(response.mp4[0].note, None);
    }

    #[test]
    fn serialized_shape_matches_the_contract() {
        let raw = vec![json!({
            "format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2",
            "abr": 128.0, "filesize": 3_400_000u64, "url": "https://cdn.example/140.m4a",
        })];
        let response = DownloadResponse::assemble(info(), classify(&raw));
        let value = serde_json::to_value(&response).unwrap();

        assert!(value.get("mp4").unwrap().as_array().unwrap().is_empty());
        let m4a = &value["m4a"][0];
        assert_eq!(m4a["format_id"], json!("140"));
        assert_eq!(m4a["abr"], json!(128.0));
        assert_eq!(m4a["filesize"], json!(3_400_000u64));
    }

    #[test]
    fn absent_metadata_serializes_as_null() {
        let response =
            DownloadResponse::assemble(VideoInfo::default(), Classification::default());
        let value = serde_json::to_value(&response).unwrap();
        assert!(value["title"].is_null());
        assert!(value["duration"].is_null());
        assert!(value["thumbnail"].is_null());
    }

    #[test]
    fn error_body_omits_absent_details() {
        let body = ErrorBody {
            error: "Missing ?url= parameter".to_string(),
            details: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("details").is_none());
    }
}
