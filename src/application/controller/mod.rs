//! Session Controller - 播放会话编排
//!
//! - session_controller: 单槽状态机（生成、恢复、播放控制）
//! - worker: 拥有状态机的 actor
//! - handle: actor 的客户端

mod commands;
mod handle;
mod preferences;
mod session;
mod session_controller;
mod state;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::{Completion, ControllerCommand};
pub use handle::SessionControllerHandle;
pub use preferences::Preferences;
pub use session::AudioSession;
pub use session_controller::{GenerationOutcome, GenerationTicket, SessionController, PLAYBACK_FAILED};
pub use state::PlaybackState;
pub use worker::ControllerWorker;
