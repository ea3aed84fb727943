//! Grep Tool - 병렬 내용 검색 도구
//!
//! 정규식으로 파일 내용을 검색합니다.
//! - rayon 병렬 처리 (파일 단위 fan-out, 단일 수집기 병합)
//! - 순회는 gitignore + 주입된 제외 규칙(내장 기본값, .anvilignore)을 존중
//! - 결과 수 상한
//! - 출력은 파일 사전순 (결정적)

use async_trait::async_trait;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, IgnoreRuleSet, Result, ToolEnv, ToolInvocation,
    ToolMeta, ToolOutput, WorkspaceBoundary,
};
use ignore::WalkBuilder;
use parking_lot::Mutex;
use rayon::prelude::*;
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Grep 도구 입력
#[derive(Debug, Deserialize)]
pub struct GrepInput {
    /// 검색 패턴 (정규식)
    #[serde(alias = "regex", alias = "query")]
    pub pattern: String,

    /// 검색 경로 (기본: 작업 디렉토리)
    #[serde(default, alias = "directory", alias = "dir")]
    pub path: Option<String>,

    /// 대소문자 무시 (기본: false)
    #[serde(default)]
    pub ignore_case: bool,

    /// 최대 매치 수 (기본: 100)
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// 한 줄 매치
#[derive(Debug, Clone)]
struct MatchLine {
    file: String,
    line_num: usize,
    content: String,
}

/// Grep 도구
pub struct GrepTool;

impl GrepTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "grep";

    /// 기본 결과 제한
    const DEFAULT_MAX_RESULTS: usize = 100;

    /// 최대 파일 크기 (50MB) - 큰 파일은 건너뜀
    const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
}

impl Default for GrepTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for GrepTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Grep")
            .description("Search file contents with a regular expression")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in (default: working directory)"
                },
                "ignore_case": {
                    "type": "boolean",
                    "description": "Case-insensitive search (default: false)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of matching lines (default: 100)"
                }
            },
            "required": ["pattern"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: GrepInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid grep input: {}", e)))?;

        // 정규식은 build 단계에서 컴파일 (잘못된 패턴 조기 거부)
        let regex = RegexBuilder::new(&parsed.pattern)
            .case_insensitive(parsed.ignore_case)
            .build()
            .map_err(|e| {
                Error::InvalidInput(format!("Invalid regex '{}': {}", parsed.pattern, e))
            })?;

        let search_dir = match &parsed.path {
            Some(path) => env.resolve_path(Path::new(path)),
            None => env.working_dir.clone(),
        };

        Ok(Box::new(GrepInvocation {
            pattern: parsed.pattern,
            regex,
            search_dir,
            working_dir: env.working_dir.clone(),
            max_results: parsed.max_results.unwrap_or(GrepTool::DEFAULT_MAX_RESULTS),
            boundary: Arc::clone(&env.boundary),
            ignore_rules: Arc::clone(&env.ignore_rules),
        }))
    }
}

/// Grep 호출
struct GrepInvocation {
    pattern: String,
    regex: regex::Regex,
    search_dir: PathBuf,
    working_dir: PathBuf,
    max_results: usize,
    boundary: Arc<WorkspaceBoundary>,
    ignore_rules: Arc<IgnoreRuleSet>,
}

impl GrepInvocation {
    /// 단일 파일 검색
    fn search_file(&self, path: &Path, root: &Path) -> Vec<MatchLine> {
        if let Ok(metadata) = fs::metadata(path) {
            if metadata.len() > GrepTool::MAX_FILE_SIZE {
                return Vec::new();
            }
        }

        // 바이너리 또는 읽기 실패는 매치 없음으로 처리
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        let display = path
            .strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string();

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| self.regex.is_match(line))
            .map(|(i, line)| MatchLine {
                file: display.clone(),
                line_num: i + 1,
                content: line.to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl ToolInvocation for GrepInvocation {
    fn description(&self) -> String {
        format!(
            "Grep /{}/ in {} (ignore rules applied)",
            self.pattern,
            self.search_dir.display()
        )
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let root = self.boundary.check(&self.search_dir)?;

        // 순회로 파일 목록 수집 (gitignore + 주입된 제외 규칙 존중)
        let files: Vec<PathBuf> = WalkBuilder::new(&root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .build()
            .flatten()
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                // 제외 규칙은 작업 디렉토리 기준 경로로 판정
                let relative = path
                    .strip_prefix(&self.working_dir)
                    .or_else(|_| path.strip_prefix(&root));
                match relative {
                    Ok(rel) => !self.ignore_rules.matches(rel, false),
                    Err(_) => true,
                }
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // rayon fan-out, 단일 수집기 병합
        let collected: Mutex<Vec<MatchLine>> = Mutex::new(Vec::new());
        files.par_iter().for_each(|path| {
            let matches = self.search_file(path, &root);
            if !matches.is_empty() {
                collected.lock().extend(matches);
            }
        });

        let mut matches = collected.into_inner();
        // 병렬 수집 순서는 비결정적이므로 파일/줄 기준 정렬
        matches.sort_by(|a, b| a.file.cmp(&b.file).then(a.line_num.cmp(&b.line_num)));

        let total = matches.len();
        let truncated = total > self.max_results;
        matches.truncate(self.max_results);

        let mut content = matches
            .iter()
            .map(|m| format!("{}:{}:{}", m.file, m.line_num, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        if truncated {
            content.push_str(&format!(
                "\n[{} of {} matches shown, result limit reached]",
                self.max_results, total
            ));
        }
        if content.is_empty() {
            content = format!("No matches for /{}/", self.pattern);
        }

        Ok(ToolOutput::new(
            content,
            format!("grep /{}/: {} matches", self.pattern, total),
        ))
    }
}

// ============================================================================
// 테스트
// ============================================================================
