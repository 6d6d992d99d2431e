//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Player DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    /// 片段标签，缺省时为空串
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// 秒
    pub position: f64,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f32,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub voice: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub filename: String,
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<&'static str>,
    pub selected: &'static str,
}
