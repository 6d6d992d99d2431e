//! Voice Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::domain::playback::VoiceName;
use crate::infrastructure::http::dto::{ApiResponse, VoicesResponse};
use crate::infrastructure::http::state::AppState;

/// 列出可选音色及当前选择
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<ApiResponse<VoicesResponse>> {
    let selected = state.event_publisher.latest().selected_voice;
    Json(ApiResponse::success(VoicesResponse {
        voices: VoiceName::ALL.iter().map(VoiceName::as_str).collect(),
        selected: selected.as_str(),
    }))
}
