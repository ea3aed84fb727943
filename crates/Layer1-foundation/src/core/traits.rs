//! Core Traits - 도구 핵심 인터페이스
//!
//! Layer2 이상에서 구현하는 도구 인터페이스를 정의합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Layer2-Core                                                │
//! │  ├── DeclarativeTool 구현 (read, glob, grep, shell 등)       │
//! │  ├── ToolRegistry (등록/조회/호출)                           │
//! │  └── Context Resolver (계층적 컨텍스트 파일)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer1-Foundation (이 레이어)                              │
//! │  ├── Trait 정의 (DeclarativeTool, ToolInvocation)           │
//! │  ├── ToolEnv (세션 의존성 묶음)                              │
//! │  ├── Workspace (경계, 제외 규칙)                             │
//! │  └── Budget / Security / Tokenizer                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! 선언과 실행이 분리됩니다: `DeclarativeTool::build`는 검증된
//! 파라미터로 호출 객체를 만들기만 하고 (I/O 없음), 부수효과는
//! `ToolInvocation::execute`에서만 일어납니다. 덕분에 실행 전에
//! 호출 내용을 설명하고 확인을 받을 수 있습니다.

use crate::error::Result;
use crate::ToolEnv;
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Tool Meta - 도구 메타데이터
// ============================================================================

/// 도구 메타데이터
#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// 도구 이름 (고유 식별자)
    pub name: String,
    /// 표시 이름
    pub display_name: String,
    /// 모델에게 전달되는 설명
    pub description: String,
    /// 카테고리 (filesystem, execute, network 등)
    pub category: String,
    /// 파괴적 도구 여부 (쓰기/수정/실행)
    pub destructive: bool,
}

impl ToolMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            category: "general".to_string(),
            destructive: false,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }

    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = destructive;
        self
    }
}

// ============================================================================
// Tool Output - 실행 결과
// ============================================================================

/// 도구 실행 결과
///
/// 모델용 내용과 사람용 요약을 분리합니다. 건너뜀 기록은
/// 요약에 노출되어 조용한 누락을 방지합니다.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// 모델에게 전달되는 내용
    pub content: String,
    /// 사람에게 보여주는 요약
    pub summary: String,
    /// 건너뛴 항목들 (경로, 사유)
    pub skipped: Vec<crate::budget::SkipRecord>,
}

impl ToolOutput {
    pub fn new(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            summary: summary.into(),
            skipped: Vec::new(),
        }
    }

    pub fn with_skipped(mut self, skipped: Vec<crate::budget::SkipRecord>) -> Self {
        self.skipped = skipped;
        self
    }

    /// 건너뜀 사유를 요약에 덧붙인 전체 요약
    pub fn full_summary(&self) -> String {
        if self.skipped.is_empty() {
            return self.summary.clone();
        }
        let lines: Vec<String> = self
            .skipped
            .iter()
            .map(|s| format!("- {}: {}", s.path, s.reason))
            .collect();
        format!("{}\nSkipped:\n{}", self.summary, lines.join("\n"))
    }
}

// ============================================================================
// DeclarativeTool / ToolInvocation - 선언과 실행의 분리
// ============================================================================

/// 선언적 도구 인터페이스
///
/// Layer2-core에서 구현합니다. `build`는 순수 함수여야 합니다:
/// 파일 시스템 접근 없이 검증된 파라미터로 호출 객체만 만듭니다.
pub trait DeclarativeTool: Send + Sync {
    /// 도구 이름 (고유 식별자)
    fn name(&self) -> &str;

    /// 도구 메타데이터
    fn meta(&self) -> ToolMeta;

    /// JSON 스키마 (모델에게 광고되는 파라미터 명세)
    fn schema(&self) -> Value;

    /// 파라미터 구조 검증
    ///
    /// 기본 구현은 `schema()`에 대한 구조 검사입니다.
    /// 실패는 `Error::Validation`이며 `build`에 도달하지 않습니다.
    fn validate(&self, params: &Value) -> Result<()> {
        crate::core::schema::validate_against_schema(&self.schema(), params)
    }

    /// 검증된 파라미터로 호출 객체 생성 (I/O 없음)
    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>>;
}

/// 도구 호출 객체
///
/// 한 번의 실행 단위입니다. `execute`는 호출당 한 번 불립니다.
#[async_trait]
pub trait ToolInvocation: Send + Sync {
    /// 실행 내용 설명
    ///
    /// 실제 execute가 사용할 경로/패턴과 정확히 일치해야 합니다.
    /// 확인 프롬프트에 표시됩니다.
    fn description(&self) -> String;

    /// 실행 전 사용자 확인이 필요한지 (자문적 플래그)
    ///
    /// 프레임워크는 집행하지 않습니다. 호스트가 이 값을 보고
    /// 확인 프롬프트를 띄울지 결정합니다.
    fn should_confirm(&self) -> bool {
        false
    }

    /// 도구 실행
    ///
    /// 취소 토큰은 I/O 경계마다 확인해야 하며, 취소 시
    /// `Error::Cancelled`를 반환합니다.
    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput>;
}
