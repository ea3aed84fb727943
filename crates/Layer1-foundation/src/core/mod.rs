//! Core - 도구 프레임워크 핵심
//!
//! 선언적 도구 인터페이스, 파라미터 스키마 검증, 세션 환경 묶음.

mod env;
pub mod schema;
mod traits;

pub use env::{ShellSettings, ShellType, ToolEnv};
pub use traits::{DeclarativeTool, ToolInvocation, ToolMeta, ToolOutput};
