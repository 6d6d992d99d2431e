//! Saver Adapter - 音频下载保存实现

mod file_saver;

pub use file_saver::{sanitize_filename, FileAudioSaver};
