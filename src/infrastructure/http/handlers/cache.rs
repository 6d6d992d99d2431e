//! Cache Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::CacheStats;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::success(state.audio_cache.stats().await))
}
