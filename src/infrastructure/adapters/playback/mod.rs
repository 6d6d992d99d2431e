//! Playback Adapter - 播放引擎实现

mod clock_engine;

pub use clock_engine::{ClockEngineConfig, ClockPlaybackEngine};
