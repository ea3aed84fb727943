//! Glob Tool - 파일 패턴 검색
//!
//! 패턴에 매칭되는 파일 경로 목록을 반환합니다.
//! - gitignore 의미론을 존중하는 디렉토리 순회 (ignore::WalkBuilder)
//! - 주입된 제외 규칙(내장 기본값, .anvilignore 포함) 추가 필터
//! - 결과는 경로 사전순 (결정적)
//! - 해석 후 경계 검사
//! - 결과 수 상한

use async_trait::async_trait;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, IgnoreRuleSet, Result, ToolEnv, ToolInvocation,
    ToolMeta, ToolOutput, WorkspaceBoundary,
};
use ignore::WalkBuilder;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Glob 도구 입력
#[derive(Debug, Deserialize)]
pub struct GlobInput {
    /// 검색 패턴 (예: "**/*.rs", "src/**/*.ts")
    pub pattern: String,

    /// 검색 시작 디렉토리 (optional, 기본: 작업 디렉토리)
    #[serde(default)]
    pub path: Option<String>,
}

/// Glob 도구
pub struct GlobTool;

impl GlobTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "glob";

    /// 최대 결과 수
    const MAX_RESULTS: usize = 1000;
}

impl Default for GlobTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for GlobTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Glob")
            .description("Find files matching a glob pattern, respecting ignore rules")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to match files against (e.g. \"**/*.rs\")"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in (default: working directory)"
                }
            },
            "required": ["pattern"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: GlobInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid glob input: {}", e)))?;

        let compiled = glob::Pattern::new(&parsed.pattern).map_err(|e| {
            Error::InvalidInput(format!("Invalid glob pattern '{}': {}", parsed.pattern, e))
        })?;

        let search_dir = match &parsed.path {
            Some(path) => env.resolve_path(Path::new(path)),
            None => env.working_dir.clone(),
        };

        Ok(Box::new(GlobInvocation {
            pattern: parsed.pattern,
            compiled,
            search_dir,
            working_dir: env.working_dir.clone(),
            boundary: Arc::clone(&env.boundary),
            ignore_rules: Arc::clone(&env.ignore_rules),
        }))
    }
}

/// Glob 호출
struct GlobInvocation {
    pattern: String,
    compiled: glob::Pattern,
    search_dir: PathBuf,
    working_dir: PathBuf,
    boundary: Arc<WorkspaceBoundary>,
    ignore_rules: Arc<IgnoreRuleSet>,
}

#[async_trait]
impl ToolInvocation for GlobInvocation {
    fn description(&self) -> String {
        format!(
            "Glob '{}' in {} (ignore rules applied)",
            self.pattern,
            self.search_dir.display()
        )
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // 검색 루트부터 경계 검사
        let root = self.boundary.check(&self.search_dir)?;

        let mut matches: Vec<String> = Vec::new();
        let mut truncated = false;

        // gitignore/.ignore 존중, 숨김 파일 제외
        let walker = WalkBuilder::new(&root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .build();

        for entry in walker.flatten() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = match path.strip_prefix(&root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };

            // 제외 규칙은 작업 디렉토리 기준 경로로 판정
            let ignore_rel = path.strip_prefix(&self.working_dir).unwrap_or(relative);
            if self.ignore_rules.matches(ignore_rel, false) {
                continue;
            }

            let rel_str = relative.to_string_lossy();
            if self.compiled.matches(&rel_str) && self.boundary.is_within(path) {
                matches.push(rel_str.into_owned());
                if matches.len() >= GlobTool::MAX_RESULTS {
                    truncated = true;
                    break;
                }
            }
        }

        // 순회 순서는 플랫폼 의존적이므로 정렬로 결정성 확보
        matches.sort_unstable();

        let count = matches.len();
        let mut content = matches.join("\n");
        if truncated {
            content.push_str(&format!(
                "\n[Result limit {} reached, output truncated]",
                GlobTool::MAX_RESULTS
            ));
        }
        if content.is_empty() {
            content = format!("No files matched pattern '{}'", self.pattern);
        }

        Ok(ToolOutput::new(
            content,
            format!("glob '{}': {} files", self.pattern, count),
        ))
    }
}

// ============================================================================
// 테스트
// ============================================================================
