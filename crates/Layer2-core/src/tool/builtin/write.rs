//! Write Tool - 파일 쓰기 도구
//!
//! 파일을 생성하거나 덮어씁니다.
//! - 파괴적 도구 (should_confirm = true)
//! - 경계 검사는 해석된 쓰기 대상 기준 (아직 없는 파일 포함)
//! - 필요한 부모 디렉토리 자동 생성

use async_trait::async_trait;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, Result, ToolEnv, ToolInvocation, ToolMeta,
    ToolOutput, WorkspaceBoundary,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write 도구 입력
#[derive(Debug, Deserialize)]
pub struct WriteInput {
    /// 파일 경로
    pub file_path: String,

    /// 기록할 내용
    pub content: String,
}

/// Write 도구
pub struct WriteTool;

impl WriteTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "write";
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for WriteTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Write File")
            .description("Create or overwrite a file with the given content")
            .category("filesystem")
            .destructive(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: WriteInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid write input: {}", e)))?;

        Ok(Box::new(WriteInvocation {
            path: env.resolve_path(Path::new(&parsed.file_path)),
            content: parsed.content,
            boundary: Arc::clone(&env.boundary),
        }))
    }
}

/// Write 호출
struct WriteInvocation {
    path: PathBuf,
    content: String,
    boundary: Arc<WorkspaceBoundary>,
}

#[async_trait]
impl ToolInvocation for WriteInvocation {
    fn description(&self) -> String {
        format!(
            "Write {} bytes to {}",
            self.content.len(),
            self.path.display()
        )
    }

    fn should_confirm(&self) -> bool {
        true
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // 쓰기 대상은 아직 없을 수 있음 - 실존 조상 기준으로 해석 후 검사
        let canonical = self.boundary.check(&self.path)?;

        if let Some(parent) = canonical.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&canonical, &self.content).await?;

        Ok(ToolOutput::new(
            format!("Wrote {} bytes to {}", self.content.len(), self.path.display()),
            format!("Wrote {}", self.path.display()),
        ))
    }
}

// ============================================================================
// 테스트
// ============================================================================
