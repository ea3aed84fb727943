//! Edit Tool - 파일 편집 도구
//!
//! 정확한 문자열 치환으로 파일을 수정합니다.
//! - 파괴적 도구 (should_confirm = true)
//! - old_string은 파일에 존재해야 하며, replace_all이 아니면
//!   정확히 한 번만 나타나야 함 (모호한 편집 거부)
//! - 경계 검사는 해석된 대상 기준

use async_trait::async_trait;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, Result, ToolEnv, ToolInvocation, ToolMeta,
    ToolOutput, WorkspaceBoundary,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Edit 도구 입력
#[derive(Debug, Deserialize)]
pub struct EditInput {
    /// 파일 경로
    pub file_path: String,

    /// 찾을 문자열 (정확히 일치)
    pub old_string: String,

    /// 대체할 문자열
    pub new_string: String,

    /// 모든 출현을 치환 (기본: false)
    #[serde(default)]
    pub replace_all: bool,
}

/// Edit 도구
pub struct EditTool;

impl EditTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "edit";
}

impl Default for EditTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for EditTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Edit File")
            .description("Replace an exact string in a file")
            .category("filesystem")
            .destructive(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to edit"
                },
                "old_string": {
                    "type": "string",
                    "description": "Exact text to replace"
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence (default: false)"
                }
            },
            "required": ["file_path", "old_string", "new_string"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: EditInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid edit input: {}", e)))?;

        if parsed.old_string.is_empty() {
            return Err(Error::InvalidInput("old_string must not be empty".to_string()));
        }
        if parsed.old_string == parsed.new_string {
            return Err(Error::InvalidInput(
                "old_string and new_string are identical".to_string(),
            ));
        }

        Ok(Box::new(EditInvocation {
            path: env.resolve_path(Path::new(&parsed.file_path)),
            old_string: parsed.old_string,
            new_string: parsed.new_string,
            replace_all: parsed.replace_all,
            boundary: Arc::clone(&env.boundary),
        }))
    }
}

/// Edit 호출
struct EditInvocation {
    path: PathBuf,
    old_string: String,
    new_string: String,
    replace_all: bool,
    boundary: Arc<WorkspaceBoundary>,
}

#[async_trait]
impl ToolInvocation for EditInvocation {
    fn description(&self) -> String {
        format!(
            "Edit {} (replace {} occurrence{})",
            self.path.display(),
            if self.replace_all { "every" } else { "one" },
            if self.replace_all { "s" } else { "" }
        )
    }

    fn should_confirm(&self) -> bool {
        true
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let canonical = self.boundary.check(&self.path)?;
        let content = tokio::fs::read_to_string(&canonical).await?;

        let occurrences = content.matches(&self.old_string).count();
        if occurrences == 0 {
            return Err(Error::InvalidInput(format!(
                "old_string not found in {}",
                self.path.display()
            )));
        }
        if !self.replace_all && occurrences > 1 {
            return Err(Error::InvalidInput(format!(
                "old_string appears {} times in {}; provide more context or set replace_all",
                occurrences,
                self.path.display()
            )));
        }

        let updated = if self.replace_all {
            content.replace(&self.old_string, &self.new_string)
        } else {
            content.replacen(&self.old_string, &self.new_string, 1)
        };

        tokio::fs::write(&canonical, &updated).await?;

        let replaced = if self.replace_all { occurrences } else { 1 };
        Ok(ToolOutput::new(
            format!(
                "Replaced {} occurrence(s) in {}",
                replaced,
                self.path.display()
            ),
            format!("Edited {}", self.path.display()),
        ))
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_for(dir: &TempDir) -> ToolEnv {
        let boundary = WorkspaceBoundary::single(dir.path()).unwrap();
        ToolEnv::new("test", dir.path(), boundary)
    }

    #[test]
    fn test_meta_destructive() {
        assert!(EditTool::new().meta().destructive);
    }

    #[test]
    fn test_identical_strings_rejected() {
        let dir = TempDir::new().unwrap();
        let env = env_for(&dir);
        let tool = EditTool::new();

        let result = tool.build(
            json!({ "file_path": "a.txt", "old_string": "x", "new_string": "x" }),
            &env,
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_single_replacement() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello world").unwrap();
        let env = env_for(&dir);
        let tool = EditTool::new();

        let invocation = tool
            .build(
                json!({ "file_path": "a.txt", "old_string": "world", "new_string": "rust" }),
                &env,
            )
            .unwrap();
        invocation.execute(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "hello rust"
        );
    }

    #[tokio::test]
    async fn test_ambiguous_replacement_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "aaa bbb aaa").unwrap();
        let env = env_for(&dir);
        let tool = EditTool::new();

        let invocation = tool
            .build(
                json!({ "file_path": "a.txt", "old_string": "aaa", "new_string": "ccc" }),
                &env,
            )
            .unwrap();
        let result = invocation.execute(&CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        // 파일은 변경되지 않음
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "aaa bbb aaa"
        );
    }

    #[tokio::test]
    async fn test_replace_all() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "aaa bbb aaa").unwrap();
        let env = env_for(&dir);
        let tool = EditTool::new();

        let invocation = tool
            .build(
                json!({
                    "file_path": "a.txt",
                    "old_string": "aaa",
                    "new_string": "ccc",
                    "replace_all": true
                }),
                &env,
            )
            .unwrap();
        invocation.execute(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "ccc bbb ccc"
        );
    }

    #[tokio::test]
    async fn test_not_found_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let env = env_for(&dir);
        let tool = EditTool::new();

        let invocation = tool
            .build(
                json!({ "file_path": "a.txt", "old_string": "missing", "new_string": "x" }),
                &env,
            )
            .unwrap();
        let result = invocation.execute(&CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
