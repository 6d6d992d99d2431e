//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/player/state         GET   当前播放状态快照
//! - /api/player/generate      POST  生成并播放 `{text, label}`
//! - /api/player/play          POST  播放 / 继续
//! - /api/player/pause         POST  暂停
//! - /api/player/stop          POST  停止并回到 0
//! - /api/player/seek          POST  跳转 `{position}`（秒）
//! - /api/player/speed         POST  设置播放速度 `{speed}`
//! - /api/player/voice         POST  切换音色 `{voice}`
//! - /api/player/download      POST  保存当前音频 `{filename}`
//! - /api/voices               GET   可选音色
//! - /api/audio/{handle_id}    GET   当前可播放引用的音频字节
//! - /api/cache/stats          GET   音频缓存统计
//! - /ws/events                WS    播放器事件推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/player", player_routes())
        .route("/voices", get(handlers::list_voices))
        .route("/audio/:handle_id", get(handlers::get_audio))
        .route("/cache/stats", get(handlers::cache_stats))
}

/// Player 路由
fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/state", get(handlers::player_state))
        .route("/generate", post(handlers::generate))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/stop", post(handlers::stop))
        .route("/seek", post(handlers::seek))
        .route("/speed", post(handlers::set_speed))
        .route("/voice", post(handlers::set_voice))
        .route("/download", post(handlers::download))
}
