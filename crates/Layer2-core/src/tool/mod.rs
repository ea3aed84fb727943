//! Tool - 도구 시스템
//!
//! 도구 등록/호출과 builtin 도구 구현.

pub mod builtin;
mod registry;

pub use builtin::{
    all_tools, filesystem_tools, EditTool, GlobTool, GrepTool, ReadManyTool, ReadTool, ShellTool,
    WebFetchTool, WriteTool,
};
pub use registry::{ToolDefinition, ToolParameters, ToolRegistry};
