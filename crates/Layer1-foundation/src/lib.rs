//! # anvil-foundation
//!
//! Foundation layer for Anvil:
//! - Core: 도구 Trait 정의 (DeclarativeTool, ToolInvocation) + ToolEnv
//! - Workspace: 경계 검사 (WorkspaceBoundary), 제외 규칙 (IgnoreRuleSet)
//! - Budget: 출력 예산 집행 (항목 수 / 크기 / 토큰)
//! - Security: 셸 명령어 검증 (치환 연산자, 금지 패턴)
//! - Tokenizer: 결정적 토큰 추정
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Tool Registry (Layer2-core)                            │
//! │  └── Builtin Tools (read, glob, grep, shell...)         │
//! │                     │                                   │
//! │      validate ──► build ──► execute                     │
//! │         │            │          │                       │
//! │         ▼            ▼          ▼                       │
//! │      Schema       ToolEnv    Boundary / Ignore          │
//! │      검증          (묶음)     / Budget / Security        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod budget;
pub mod config;
pub mod core;
pub mod error;
pub mod security;
pub mod tokenizer;
pub mod workspace;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (핵심 Trait 및 타입)
// ============================================================================
pub use core::{
    // Traits (traits.rs)
    DeclarativeTool,
    // Env (env.rs)
    ShellSettings,
    ShellType,
    ToolEnv,
    ToolInvocation,
    ToolMeta,
    ToolOutput,
};

// 취소 토큰은 실행 인터페이스의 일부
pub use tokio_util::sync::CancellationToken;

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ContextConfig,
    FetchSettings,
    ImportFormat,
    OutputLimits,
    OverflowPolicy,
    RuntimeEnv,
    SETTINGS_FILE,
};

// ============================================================================
// Workspace (경계, 제외 규칙)
// ============================================================================
pub use workspace::{
    IgnoreRuleSet,
    IgnoreSource,
    WorkspaceBoundary,
    TOOL_IGNORE_FILE,
    VCS_IGNORE_FILE,
};

// ============================================================================
// Budget (출력 예산)
// ============================================================================
pub use budget::{BudgetDecision, BudgetReport, OutputBudget, SkipRecord, TRUNCATION_MARKER};

// ============================================================================
// Security (명령어 검증)
// ============================================================================
pub use security::{
    validator as command_validator,
    CommandCheck,
    ForbiddenPattern,
    PatternType,
    ShellCommandValidator,
};

// ============================================================================
// Tokenizer (토큰 추정)
// ============================================================================
pub use tokenizer::{estimate_tokens, prefix_chars_for_budget};
