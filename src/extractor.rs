//! Metadata extraction via the external `yt-dlp` tool.
//!
//! The extractor is invoked at most once per request and treated as an
//! untrusted collaborator: it may take seconds, fail, or print garbage.
//! Its output is handled as loose JSON and never assumed to match a fixed
//! schema. The trait seam exists so handlers can be tested against a mock.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ExtractorConfig;
use crate::error::ExtractError;

/// One video's metadata as reported by the extractor.
///
/// Every field is optional; `formats` is empty when the document carries
/// none or the field is malformed.
#[derive(Debug, Clone, Default)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub id: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub formats: Vec<Value>,
}

impl VideoInfo {
    /// Lenient extraction from the tool's JSON document. Wrong-typed fields
    /// degrade to absent rather than failing the request.
    pub fn from_json(mut json: Value) -> Self {
        let formats = match json.get_mut("formats").map(Value::take) {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        };

        Self {
            title: string_of(&json, "title"),
            id: string_of(&json, "id"),
            thumbnail: string_of(&json, "thumbnail"),
            duration: json.get("duration").and_then(Value::as_f64),
            formats,
        }
    }
}

fn string_of(json: &Value, key: &str) -> Option<String> {
    json.get(key).and_then(Value::as_str).map(str::to_string)
}

/// The upstream collaborator contract: one sanitized page URL in, one
/// metadata document out.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<VideoInfo, ExtractError>;
}

/// `MetadataExtractor` backed by the yt-dlp binary.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MetadataExtractor for YtDlpExtractor {
    fn name(&self) -> &str {
        &self.config.binary
    }

    async fn fetch(&self, url: &str) -> Result<VideoInfo, ExtractError> {
        debug!("invoking {} for '{}'", self.config.binary, url);

        let output = Command::new(&self.config.binary)
            .args(["--dump-single-json", "--no-warnings", "--no-playlist"])
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), output)
            .await
            .map_err(|_| ExtractError::Timeout(self.config.timeout_secs))?
            .map_err(|source| ExtractError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "{} exited with {}: {}",
                self.config.binary,
                output.status,
                stderr.trim()
            );
            return Err(ExtractError::Failed(error_line(&stderr)));
        }

        let json: Value = serde_json::from_slice(&output.stdout)?;
        Ok(VideoInfo::from_json(json))
    }
}

/// Reduce the tool's stderr to its most relevant line: the last `ERROR:`
/// line when present, else the last non-empty line.
fn error_line(stderr: &str) -> String {
    let lines = || stderr.lines().map(str::trim);
    let relevant = lines()
        .rev()
        .find(|l| l.to_lowercase().starts_with("error"))
        .or_else(|| lines().rev().find(|l| !l.is_empty()));

    match relevant {
        Some(line) => line
            .strip_prefix("ERROR:")
            .map(str::trim)
            .unwrap_or(line)
            .to_string(),
        None => "extractor produced no error output".to_string(),
    }
}
