//! HTTP Layer - RESTful API + WebSocket
//!
//! 所有播放操作通过 `SessionControllerHandle` 投递给控制器 actor，
//! 状态变化经 `/ws/events` 推送

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::HttpServer;
pub use state::AppState;
