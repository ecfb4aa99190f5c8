use crate::error::ApiError;
use crate::formats::classify;
use crate::server::AppState;
use crate::types::{DownloadResponse, GitInfo, InfoResponse, Version};
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
}

/// GET /download?url=...
///
/// The missing-parameter failure is reported before any extractor call;
/// extraction failures map to a 500 with the underlying message attached.
pub async fn download(
    Query(params): Query<DownloadQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let raw = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(ApiError::MissingUrl)?;
    let url = sanitize_url(&raw);
    info!("download request: url='{}'", url);

    let video = state.extractor.fetch(url).await?;
    let classification = classify(&video.formats);
    info!(
        "classified {} raw formats: {} video, {} m4a, {} audio fallbacks",
        video.formats.len(),
        classification.video.len(),
        classification.muxed_audio.len(),
        classification.audio_fallbacks.len()
    );

    Ok(Json(DownloadResponse::assemble(video, classification)))
}

/// Strip tracking fragments: everything from the first `?si=` marker on.
/// No other normalization is applied.
fn sanitize_url(url: &str) -> &str {
    match url.find("?si=") {
        Some(idx) => &url[..idx],
        None => url,
    }
}

pub async fn get_info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: Version {
            semver: env!("CARGO_PKG_VERSION").to_string(),
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        },
        build_time: env!("BUILD_TIME").parse().unwrap_or(0),
        git: GitInfo {
            branch: env!("GIT_BRANCH").to_string(),
            commit: env!("GIT_COMMIT").to_string(),
            commit_time: env!("GIT_COMMIT_TIME").parse().unwrap_or(0),
        },
        extractor: state.extractor.name().to_string(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/download", get(download))
        .route("/info", get(get_info))
}
