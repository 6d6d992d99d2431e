//! Player Handlers
//!
//! 除 `state` 外均为投递即返回，结果通过 `/ws/events` 或再次查询 state 观察

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::PlaybackState;
use crate::domain::playback::{PlaybackSpeed, VoiceName};
use crate::infrastructure::http::dto::{
    ApiResponse, DownloadRequest, Empty, GenerateRequest, SeekRequest, SpeedRequest, VoiceRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn player_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PlaybackState>>, ApiError> {
    let snapshot = state.controller.state().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    tracing::debug!(label = %req.label, chars = req.text.chars().count(), "Generate requested");
    state.controller.generate_and_play(req.text, req.label).await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn play(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.controller.play().await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.controller.pause().await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.controller.stop().await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.controller.seek(req.position).await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let speed = PlaybackSpeed::new(req.speed)?;
    state.controller.set_playback_speed(speed).await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn set_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VoiceRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let voice: VoiceName = req.voice.parse()?;
    state.controller.set_voice(voice).await?;
    Ok(Json(ApiResponse::ok()))
}

/// 保存当前音频到下载目录；没有会话时静默忽略
pub async fn download(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    if req.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename must not be empty".to_string()));
    }
    state.controller.download(req.filename).await?;
    Ok(Json(ApiResponse::ok()))
}
