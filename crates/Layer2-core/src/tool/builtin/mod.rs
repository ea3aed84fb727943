//! Builtin Tools - 내장 도구들
//!
//! 세션이 사용하는 핵심 도구 구현
//!
//! ## 도구 목록
//!
//! ### 파일시스템 (Filesystem)
//! - `read` - 파일 읽기 (줄 번호 포함)
//! - `read_many` - 여러 파일 일괄 읽기 (예산 파이프라인)
//! - `write` - 파일 쓰기 (생성 또는 덮어쓰기)
//! - `edit` - 파일 편집 (문자열 치환)
//! - `glob` - 파일 패턴 검색
//! - `grep` - 내용 검색 (정규식, 병렬)
//!
//! ### 실행 (Execute)
//! - `shell` - 셸 명령 실행 (검증기 게이트)
//!
//! ### 웹 (Web)
//! - `web_fetch` - URL 콘텐츠 가져오기
//!
//! ## Layer1 연동
//! - 모든 도구는 `anvil_foundation::DeclarativeTool` 구현
//! - 경로 접근은 `WorkspaceBoundary::check` 통과 필수
//! - 대량 출력은 `OutputBudget` 파이프라인 통과

// Filesystem tools
pub mod edit;
pub mod glob;
pub mod grep;
pub mod read;
pub mod read_many;
pub mod write;

// Execute tools
pub mod shell;

// Web tools
pub mod web_fetch;

// Re-exports
pub use edit::EditTool;
pub use glob::GlobTool;
pub use grep::GrepTool;
pub use read::ReadTool;
pub use read_many::ReadManyTool;
pub use shell::ShellTool;
pub use web_fetch::WebFetchTool;
pub use write::WriteTool;

use anvil_foundation::DeclarativeTool;
use std::sync::Arc;

/// 모든 builtin 도구 인스턴스 생성
pub fn all_tools() -> Vec<Arc<dyn DeclarativeTool>> {
    vec![
        // Filesystem
        Arc::new(ReadTool::new()) as Arc<dyn DeclarativeTool>,
        Arc::new(ReadManyTool::new()),
        Arc::new(WriteTool::new()),
        Arc::new(EditTool::new()),
        Arc::new(GlobTool::new()),
        Arc::new(GrepTool::new()),
        // Execute
        Arc::new(ShellTool::new()),
        // Web
        Arc::new(WebFetchTool::new()),
    ]
}

/// 파일시스템 도구만 반환
pub fn filesystem_tools() -> Vec<Arc<dyn DeclarativeTool>> {
    vec![
        Arc::new(ReadTool::new()) as Arc<dyn DeclarativeTool>,
        Arc::new(ReadManyTool::new()),
        Arc::new(WriteTool::new()),
        Arc::new(EditTool::new()),
        Arc::new(GlobTool::new()),
        Arc::new(GrepTool::new()),
    ]
}

// ============================================================================
// 테스트
// ============================================================================
