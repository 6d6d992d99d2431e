//! 应用层错误定义

use thiserror::Error;

/// 控制器句柄错误
#[derive(Debug, Error)]
pub enum ControllerError {
    /// 控制器已退出
    #[error("Session controller is not running")]
    Closed,

    /// 输入校验失败
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ControllerError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for ControllerError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for ControllerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::Closed
    }
}
