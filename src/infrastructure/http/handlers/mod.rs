//! HTTP Handlers

mod audio;
mod cache;
mod ping;
mod player;
mod voices;
mod websocket;

pub use audio::*;
pub use cache::*;
pub use ping::*;
pub use player::*;
pub use voices::*;
pub use websocket::*;
