//! Workspace - 작업 공간 경계 및 제외 규칙
//!
//! 모든 도구가 공유하는 읽기 전용 컴포넌트입니다. 생성 후 불변이므로
//! 여러 호출이 동시에 안전하게 참조할 수 있습니다.

mod boundary;
mod ignore;

pub use boundary::WorkspaceBoundary;
pub use ignore::{IgnoreRuleSet, IgnoreSource, TOOL_IGNORE_FILE, VCS_IGNORE_FILE};
