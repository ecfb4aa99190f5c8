//! Format classification core.
//!
//! Takes the raw `formats` array from the metadata extractor (untrusted,
//! loosely typed JSON) and produces the curated buckets served by
//! `/download`: progressive mp4 video (or ranked video-only mp4 when no
//! progressive link exists), m4a audio, and a broadened audio fallback
//! list. Everything in here is a pure function over the input slice; no
//! I/O, no shared state.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Hard cap on every bucket in the response.
pub const MAX_RESULTS: usize = 5;

/// Advisory attached to video entries substituted from the video-only bucket.
pub const VIDEO_ONLY_NOTE: &str = "video-only (no audio)";

/// Substring marking a segmented HLS playlist URL.
const HLS_MARKER: &str = ".m3u8";

/// A raw format record reduced to the fields classification cares about.
///
/// Built by [`normalize`]; every surviving record has a non-empty `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFormat {
    pub url: String,
    pub format_id: Option<String>,
    /// Lowercased container extension (`mp4`, `m4a`, ...).
    pub container: Option<String>,
    /// `None` when the raw codec is absent, empty, or the `"none"` sentinel.
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub height: Option<u32>,
    /// `abr` else `tbr`, unit passed through untouched.
    pub bitrate: Option<f64>,
    /// Exact size preferred over the extractor's approximation.
    pub filesize: Option<u64>,
    pub quality_label: Option<String>,
    pub is_segmented: bool,
}

impl NormalizedFormat {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

/// The ranked, trimmed buckets for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Progressive mp4, or the video-only bucket when no progressive exists.
    pub video: Vec<NormalizedFormat>,
    /// True when `video` was substituted from the video-only bucket.
    pub video_is_fallback: bool,
    /// m4a container or AAC-in-MP4 codec family.
    pub muxed_audio: Vec<NormalizedFormat>,
    /// Last-resort audio-capable records (mp3/m4a/webm or audio-only).
    pub audio_fallbacks: Vec<NormalizedFormat>,
}

/// Run the full pipeline: normalize, bucket, rank, substitute, trim.
///
/// Buckets are evaluated independently; a single format may appear in
/// several of them. Classifying the same slice twice yields identical
/// output.
pub fn classify(raw_formats: &[Value]) -> Classification {
    let formats: Vec<NormalizedFormat> = raw_formats.iter().filter_map(normalize).collect();

    let mut progressive: Vec<NormalizedFormat> = formats
        .iter()
        .filter(|f| is_progressive_video(f))
        .cloned()
        .collect();
    rank_by_height(&mut progressive);

    let (mut video, video_is_fallback) = if progressive.is_empty() {
        let mut video_only: Vec<NormalizedFormat> =
            formats.iter().filter(|f| is_video_only(f)).cloned().collect();
        rank_by_height(&mut video_only);
        (video_only, true)
    } else {
        (progressive, false)
    };

    let mut muxed_audio: Vec<NormalizedFormat> =
        formats.iter().filter(|f| is_muxed_audio(f)).cloned().collect();
    rank_by_bitrate(&mut muxed_audio);

    let mut audio_fallbacks: Vec<NormalizedFormat> =
        formats.iter().filter(|f| is_audio_like(f)).cloned().collect();
    rank_audio_fallbacks(&mut audio_fallbacks);

    video.truncate(MAX_RESULTS);
    muxed_audio.truncate(MAX_RESULTS);
    audio_fallbacks.truncate(MAX_RESULTS);

    Classification {
        video,
        video_is_fallback,
        muxed_audio,
        audio_fallbacks,
    }
}

/// Map one raw record to its canonical shape.
///
/// Returns `None` only when the record has no usable direct URL; every
/// other missing or malformed field degrades to its fallback.
pub fn normalize(raw: &Value) -> Option<NormalizedFormat> {
    let url = raw
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())?
        .to_string();

    let quality_note = string_field(raw, "format_note");
    let height = positive_int(raw.get("height"))
        .or_else(|| quality_note.as_deref().and_then(label_height));
    let quality_label = quality_note.or_else(|| height.map(|h| format!("{h}p")));
    let is_segmented = url.contains(HLS_MARKER);

    Some(NormalizedFormat {
        format_id: string_field(raw, "format_id"),
        container: string_field(raw, "ext").map(|e| e.to_ascii_lowercase()),
        video_codec: codec_field(raw, "vcodec"),
        audio_codec: codec_field(raw, "acodec"),
        height,
        bitrate: non_negative_float(raw.get("abr"))
            .or_else(|| non_negative_float(raw.get("tbr"))),
        filesize: byte_size(raw.get("filesize"))
            .or_else(|| byte_size(raw.get("filesize_approx"))),
        quality_label,
        is_segmented,
        url,
    })
}

// ─── Classifier predicates ──────────────────────────────────────────────────

fn is_progressive_video(f: &NormalizedFormat) -> bool {
    f.container.as_deref() == Some("mp4") && f.has_video() && f.has_audio() && !f.is_segmented
}

fn is_video_only(f: &NormalizedFormat) -> bool {
    f.container.as_deref() == Some("mp4") && f.has_video() && !f.has_audio()
}

fn is_muxed_audio(f: &NormalizedFormat) -> bool {
    f.container.as_deref() == Some("m4a")
        || f.audio_codec.as_deref().is_some_and(|c| c.contains("mp4a"))
}

fn is_audio_like(f: &NormalizedFormat) -> bool {
    matches!(f.container.as_deref(), Some("mp3" | "m4a" | "webm"))
        || (f.has_audio() && !f.has_video())
}

// ─── Rankers ────────────────────────────────────────────────────────────────

// All sorts are stable: ties keep their normalization order.

fn rank_by_height(bucket: &mut [NormalizedFormat]) {
    bucket.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
}

fn rank_by_bitrate(bucket: &mut [NormalizedFormat]) {
    bucket.sort_by(|a, b| b.bitrate.unwrap_or(0.0).total_cmp(&a.bitrate.unwrap_or(0.0)));
}

fn rank_audio_fallbacks(bucket: &mut [NormalizedFormat]) {
    bucket.sort_by(|a, b| {
        container_rank(b.container.as_deref())
            .cmp(&container_rank(a.container.as_deref()))
            .then_with(|| b.bitrate.unwrap_or(0.0).total_cmp(&a.bitrate.unwrap_or(0.0)))
    });
}

fn container_rank(container: Option<&str>) -> u8 {
    match container {
        Some("mp3") => 3,
        Some("m4a") => 2,
        Some("webm") => 1,
        _ => 0,
    }
}

// ─── Lenient field extraction ───────────────────────────────────────────────

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn codec_field(raw: &Value, key: &str) -> Option<String> {
    string_field(raw, key).filter(|c| !c.eq_ignore_ascii_case("none"))
}

fn positive_int(value: Option<&Value>) -> Option<u32> {
    let value = value?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok().filter(|n| *n > 0);
    }
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n as u32)
}

fn non_negative_float(value: Option<&Value>) -> Option<f64> {
    value?.as_f64().filter(|n| n.is_finite() && *n >= 0.0)
}

fn byte_size(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
}

fn label_height(label: &str) -> Option<u32> {
    static LEADING_INT: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_INT.get_or_init(|| Regex::new(r"^\s*(\d+)").expect("static pattern"));
    re.captures(label)?
        .get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|h| *h > 0)
}
