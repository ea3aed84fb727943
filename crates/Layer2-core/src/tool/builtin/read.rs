//! Read Tool - 파일 읽기 도구
//!
//! 파일 내용을 읽어서 반환합니다.
//! - 줄 번호 포함 (cat -n 스타일)
//! - offset/limit 지원 (대용량 파일 처리)
//! - 이미지/PDF 등 바이너리 파일 감지
//! - 경계 검증 (해석된 경로 기준, symlink 탈출 차단)

use async_trait::async_trait;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, Result, ToolEnv, ToolInvocation, ToolMeta,
    ToolOutput, WorkspaceBoundary,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read 도구 입력
#[derive(Debug, Deserialize)]
pub struct ReadInput {
    /// 파일 경로 (작업 디렉토리 기준 상대 경로 허용)
    pub file_path: String,

    /// 시작 줄 번호 (1-based, optional)
    #[serde(default)]
    pub offset: Option<u32>,

    /// 최대 읽을 줄 수 (optional, 기본: 2000)
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Read 도구
pub struct ReadTool;

impl ReadTool {
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "read";

    /// 기본 줄 제한
    const DEFAULT_LIMIT: u32 = 2000;
}

impl Default for ReadTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for ReadTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Read File")
            .description("Read file contents with line numbers")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to read (relative paths resolve against the working directory)"
                },
                "offset": {
                    "type": "integer",
                    "description": "Start line number (1-based). Only provide if the file is too large to read at once."
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum lines to read (default: 2000). Only provide if the file is too large to read at once."
                }
            },
            "required": ["file_path"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: ReadInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid read input: {}", e)))?;

        Ok(Box::new(ReadInvocation {
            path: env.resolve_path(Path::new(&parsed.file_path)),
            offset: parsed.offset.unwrap_or(1),
            limit: parsed.limit.unwrap_or(ReadTool::DEFAULT_LIMIT),
            boundary: Arc::clone(&env.boundary),
        }))
    }
}

/// Read 호출
struct ReadInvocation {
    path: PathBuf,
    offset: u32,
    limit: u32,
    boundary: Arc<WorkspaceBoundary>,
}

/// 최대 줄 길이 (이 이상은 잘림)
const MAX_LINE_LENGTH: usize = 2000;

/// 바이너리 파일인지 확인 (확장자 기반)
fn is_binary_file(path: &Path) -> bool {
    let binary_extensions = [
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", // 이미지
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", // 문서
        "zip", "tar", "gz", "rar", "7z", // 압축
        "exe", "dll", "so", "dylib", // 실행
        "mp3", "mp4", "avi", "mov", "mkv", // 미디어
        "woff", "woff2", "ttf", "otf", // 폰트
    ];

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| binary_extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 줄 번호를 붙여 포맷 (offset/limit 적용)
pub(crate) fn format_with_line_numbers(content: &str, offset: u32, limit: u32) -> String {
    let start_line = offset.max(1) as usize;
    let end_line = start_line + limit as usize;

    let mut output = String::new();
    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        if line_num < start_line {
            continue;
        }
        if line_num >= end_line {
            break;
        }

        // 줄 길이 제한 (char 경계 기준)
        let truncated = if line.chars().count() > MAX_LINE_LENGTH {
            let prefix: String = line.chars().take(MAX_LINE_LENGTH).collect();
            format!("{}... [truncated]", prefix)
        } else {
            line.to_string()
        };

        // 줄 번호 포맷: "   123→내용"
        output.push_str(&format!("{:>6}→{}\n", line_num, truncated));
    }
    output
}

#[async_trait]
impl ToolInvocation for ReadInvocation {
    fn description(&self) -> String {
        format!("Read {}", self.path.display())
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // 경계 검사는 해석된 경로 기준
        let canonical = self.boundary.check(&self.path)?;

        if canonical.is_dir() {
            return Err(Error::InvalidInput(format!(
                "Cannot read directory: {}. Use glob to list directory contents.",
                self.path.display()
            )));
        }

        if is_binary_file(&canonical) {
            let ext = canonical.extension().and_then(|e| e.to_str()).unwrap_or("");
            return Ok(ToolOutput::new(
                format!(
                    "[Binary file: {} - use appropriate viewer for {} files]",
                    self.path.display(),
                    ext
                ),
                format!("Binary file {}", self.path.display()),
            ));
        }

        let content = tokio::fs::read_to_string(&canonical).await?;
        let formatted = format_with_line_numbers(&content, self.offset, self.limit);

        if formatted.is_empty() {
            return Ok(ToolOutput::new(
                "[Empty file]",
                format!("Read {} (empty)", self.path.display()),
            ));
        }

        let line_count = formatted.lines().count();
        Ok(ToolOutput::new(
            formatted,
            format!("Read {} lines from {}", line_count, self.path.display()),
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
    fn test_meta() {
        let tool = ReadTool::new();
        let meta = tool.meta();
        assert_eq!(meta.name, "read");
        assert_eq!(meta.category, "filesystem");
        assert!(!meta.destructive);
    }

    #[test]
    fn test_schema() {
        let tool = ReadTool::new();
        let schema = tool.schema();
        assert!(schema.get("properties").is_some());
        assert!(schema["properties"]["file_path"].is_object());
    }

    #[test]
    fn test_validate_rejects_missing_path() {
        let tool = ReadTool::new();
        let result = tool.validate(&json!({ "offset": 3 }));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_binary_file_detection() {
        assert!(is_binary_file(Path::new("image.png")));
        assert!(is_binary_file(Path::new("doc.pdf")));
        assert!(!is_binary_file(Path::new("code.rs")));
        assert!(!is_binary_file(Path::new("readme.md")));
    }

    #[test]
    fn test_line_number_format() {
        let formatted = format_with_line_numbers("alpha\nbeta\ngamma\n", 1, 2000);
        assert!(formatted.contains("     1→alpha"));
        assert!(formatted.contains("     3→gamma"));
    }

    #[test]
    fn test_offset_and_limit() {
        let content = (1..=10).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let formatted = format_with_line_numbers(&content, 3, 2);
        assert!(formatted.contains("     3→line 3"));
        assert!(formatted.contains("     4→line 4"));
        assert!(!formatted.contains("line 5"));
        assert!(!formatted.contains("line 2"));
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello\nworld\n").unwrap();
        let env = env_for(&dir);

        let tool = ReadTool::new();
        let params = json!({ "file_path": "hello.txt" });
        tool.validate(&params).unwrap();

        let invocation = tool.build(params, &env).unwrap();
        let output = invocation.execute(&CancellationToken::new()).await.unwrap();

        assert!(output.content.contains("     1→hello"));
        assert!(output.content.contains("     2→world"));
    }

    #[tokio::test]
    async fn test_read_outside_boundary_rejected() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        std::fs::write(other.path().join("secret.txt"), "x").unwrap();
        let env = env_for(&dir);

        let tool = ReadTool::new();
        let params = json!({
            "file_path": other.path().join("secret.txt").to_string_lossy()
        });
        let invocation = tool.build(params, &env).unwrap();
        let result = invocation.execute(&CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::Security(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_read() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let env = env_for(&dir);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let tool = ReadTool::new();
        let invocation = tool.build(json!({ "file_path": "a.txt" }), &env).unwrap();
        let result = invocation.execute(&cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
