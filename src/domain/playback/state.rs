//! Playback Context - 状态机状态

use serde::{Deserialize, Serialize};

/// 已加载会话的播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Playing,
    Paused,
    /// 自然播放结束，位置已归零
    Ended,
}

/// 对外报告的控制器阶段
///
/// 推导顺序: 生成中 > 错误 > 无会话 > 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Idle,
    Generating,
    Playing,
    Paused,
    Ended,
    Errored,
}

impl PlaybackPhase {
    pub fn derive(generating: bool, errored: bool, session: Option<SessionStatus>) -> Self {
        if generating {
            return Self::Generating;
        }
        if errored {
            return Self::Errored;
        }
        match session {
            None => Self::Idle,
            Some(SessionStatus::Playing) => Self::Playing,
            Some(SessionStatus::Paused) => Self::Paused,
            Some(SessionStatus::Ended) => Self::Ended,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Errored => "errored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_derivation_precedence() {
        assert_eq!(
            PlaybackPhase::derive(true, true, Some(SessionStatus::Playing)),
            PlaybackPhase::Generating
        );
        assert_eq!(
            PlaybackPhase::derive(false, true, Some(SessionStatus::Playing)),
            PlaybackPhase::Errored
        );
        assert_eq!(PlaybackPhase::derive(false, false, None), PlaybackPhase::Idle);
        assert_eq!(
            PlaybackPhase::derive(false, false, Some(SessionStatus::Ended)),
            PlaybackPhase::Ended
        );
    }
}
