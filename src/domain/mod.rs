//! Domain Layer - 领域层
//!
//! Playback Context: 音色、播放速度、文本指纹、最近播放记录与播放状态机

pub mod playback;
