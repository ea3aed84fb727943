//! Error types for Anvil
//!
//! 모든 에러를 중앙에서 관리
//!
//! 분류 원칙:
//! - `Validation` / `Security`: 해당 호출을 즉시 중단 (재시도 없음)
//! - `Cancelled`: 협조적 취소 관찰 - 구분 가능한 종료 결과이며 버그가 아님
//! - 개별 파일 읽기 실패, 예산 초과는 에러가 아니라 SkipRecord로 수집됨
//!   (budget 모듈 참조 - 다중 파일 작업은 중단 없이 계속 진행)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Anvil 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 검증 관련 (execute에 도달하지 않음)
    // ========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 보안 관련 (실행 거부, 완화 재시도 금지)
    // ========================================================================
    #[error("Security violation: {0}")]
    Security(String),

    // ========================================================================
    // Tool 관련
    // ========================================================================
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool already registered: {0}")]
    ToolAlreadyRegistered(String),

    #[error("Tool execution failed: {tool} - {message}")]
    ToolExecution { tool: String, message: String },

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 호출 자체를 중단시키는 에러인지 확인 (Validation, Security)
    ///
    /// 다중 파일 작업의 개별 실패는 이 분류에 들어오지 않습니다.
    pub fn is_fatal_for_invocation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::InvalidInput(_) | Error::Security(_)
        )
    }

    /// 보안 위반인지 확인
    pub fn is_security(&self) -> bool {
        matches!(self, Error::Security(_))
    }

    /// 협조적 취소로 종료되었는지 확인
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidInput(_)
                | Error::Security(_)
                | Error::ToolNotFound(_)
                | Error::Timeout(_)
                | Error::Cancelled
        )
    }

    /// Tool 실행 에러 생성 헬퍼
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Validation("bad".into()).is_fatal_for_invocation());
        assert!(Error::Security("escape".into()).is_fatal_for_invocation());
        assert!(!Error::Timeout("30s".into()).is_fatal_for_invocation());
        assert!(!Error::Cancelled.is_fatal_for_invocation());
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        let err = Error::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_security());
        assert_eq!(err.to_string(), "Cancelled");
    }

    #[test]
    fn test_user_facing() {
        assert!(Error::ToolNotFound("xyz".into()).is_user_facing());
        assert!(!Error::Internal("oops".into()).is_user_facing());
    }
}
