use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::types::ErrorBody;

/// Failures from the metadata extraction subprocess.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit; the message is the most relevant stderr line.
    #[error("{0}")]
    Failed(String),

    #[error("extractor returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("metadata fetch timed out after {0}s")]
    Timeout(u64),
}

/// Request-level failures surfaced as JSON error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing ?url= parameter")]
    MissingUrl,

    #[error("Failed to fetch formats")]
    Extraction(#[from] ExtractError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            Self::MissingUrl => None,
            Self::Extraction(source) => Some(source.to_string()),
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (self.status(), Json(body)).into_response()
    }
}
