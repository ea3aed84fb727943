//! anvil-core: Core Runtime for Anvil
//!
//! Layer2 - Agent 도구 구현 레이어
//!
//! # 주요 모듈
//!
//! - `tool`: Tool 시스템 및 Builtin 도구들 (read, write, edit, glob,
//!   grep, shell, web_fetch)
//! - `context`: 계층적 컨텍스트 수집 (전역/상향/하향 + import 확장)
//!
//! # 사용 예시
//!
//! ```ignore
//! use anvil_core::{ToolRegistry, HierarchicalContextResolver};
//! use anvil_foundation::{CancellationToken, ToolEnv, WorkspaceBoundary};
//!
//! // 도구 실행
//! let registry = ToolRegistry::with_builtins()?;
//! let boundary = WorkspaceBoundary::single(&workspace)?;
//! let env = ToolEnv::new("session-1", &workspace, boundary);
//! let cancel = CancellationToken::new();
//!
//! let output = registry
//!     .invoke("read", json!({ "file_path": "src/main.rs" }), &env, &cancel)
//!     .await?;
//!
//! // 세션 컨텍스트 조립
//! let resolver = HierarchicalContextResolver::new(config, runtime);
//! let resolved = resolver.resolve(&workspace, &[])?;
//! ```

// Core modules
pub mod context;
pub mod tool;

// Re-exports: Context
pub use context::{expand_imports, ContextFile, HierarchicalContextResolver, ResolvedContext};

// Re-exports: Tool
pub use tool::{
    // Functions
    all_tools,
    filesystem_tools,
    // Tools
    EditTool,
    GlobTool,
    GrepTool,
    ReadManyTool,
    ReadTool,
    ShellTool,
    // Registry
    ToolDefinition,
    ToolParameters,
    ToolRegistry,
    WebFetchTool,
    WriteTool,
};

// Layer1 re-exports
pub use anvil_foundation::{Error, Result};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
