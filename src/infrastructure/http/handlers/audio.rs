//! Audio Handlers
//!
//! 提供当前可播放引用对应的音频字节；handle 释放后返回 404

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(handle_id): Path<String>,
) -> Result<Response, ApiError> {
    let handle_id: Uuid = handle_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid handle id: {}", handle_id)))?;

    let audio = state
        .playback_engine
        .resolve(handle_id)
        .ok_or_else(|| ApiError::NotFound(format!("Audio not found: {}", handle_id)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, detect_content_type(&audio))
        .header(header::CONTENT_LENGTH, audio.len())
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(audio.to_vec()))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// 按文件头识别音频格式
fn detect_content_type(audio: &[u8]) -> &'static str {
    match audio {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => "audio/wav",
        [b'I', b'D', b'3', ..] => "audio/mpeg",
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => "audio/mpeg",
        [b'O', b'g', b'g', b'S', ..] => "audio/ogg",
        [b'f', b'L', b'a', b'C', ..] => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::audio::silent_wav;

    #[test]
    fn test_detect_content_type() {
        assert_eq!(detect_content_type(&silent_wav(100, 16000)), "audio/wav");
        assert_eq!(detect_content_type(b"ID3\x04rest"), "audio/mpeg");
        assert_eq!(detect_content_type(&[0xFF, 0xFB, 0x90]), "audio/mpeg");
        assert_eq!(detect_content_type(b"OggS...."), "audio/ogg");
        assert_eq!(detect_content_type(b"audio:Hello"), "application/octet-stream");
        assert_eq!(detect_content_type(&[]), "application/octet-stream");
    }
}
