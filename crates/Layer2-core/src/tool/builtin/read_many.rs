//! ReadMany Tool - 여러 파일 일괄 읽기
//!
//! glob 패턴으로 선택한 여러 파일을 한 번에 읽어 이어붙입니다.
//! - include/exclude glob 패턴
//! - 결정적 순서 (경로 사전순 정렬)
//! - 해석 후 경계 검사 + 제외 규칙 필터
//! - 출력 예산 파이프라인 (항목 수 / 크기 / 토큰)
//! - 개별 읽기 실패는 기록 후 계속 (부분 실패가 전체를 막지 않음)
//!
//! 입력과 파일 내용이 같으면 출력도 같습니다 (mtime 등 비결정적
//! 정렬 키를 쓰지 않음).

use async_trait::async_trait;
use anvil_foundation::{
    BudgetDecision, CancellationToken, DeclarativeTool, Error, IgnoreRuleSet, OutputBudget,
    OutputLimits, Result, ToolEnv, ToolInvocation, ToolMeta, ToolOutput, WorkspaceBoundary,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// ReadMany 도구 입력
#[derive(Debug, Deserialize)]
pub struct ReadManyInput {
    /// 포함할 glob 패턴들 (작업 디렉토리 기준)
    pub patterns: Vec<String>,

    /// 제외할 glob 패턴들 (optional)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// ReadMany 도구
pub struct ReadManyTool;

impl ReadManyTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "read_many";
}

impl Default for ReadManyTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for ReadManyTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Read Many Files")
            .description("Read multiple files selected by glob patterns, concatenated with separators")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patterns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Glob patterns selecting files to read, relative to the working directory"
                },
                "exclude": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Glob patterns to exclude from the selection"
                }
            },
            "required": ["patterns"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: ReadManyInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid read_many input: {}", e)))?;

        if parsed.patterns.is_empty() {
            return Err(Error::InvalidInput(
                "read_many requires at least one pattern".to_string(),
            ));
        }

        // exclude 패턴은 build 단계에서 컴파일 (잘못된 패턴 조기 거부)
        let mut exclude = Vec::with_capacity(parsed.exclude.len());
        for pattern in &parsed.exclude {
            let compiled = glob::Pattern::new(pattern).map_err(|e| {
                Error::InvalidInput(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
            exclude.push(compiled);
        }

        Ok(Box::new(ReadManyInvocation {
            patterns: parsed.patterns,
            exclude,
            working_dir: env.working_dir.clone(),
            boundary: Arc::clone(&env.boundary),
            ignore_rules: Arc::clone(&env.ignore_rules),
            limits: env.limits.clone(),
        }))
    }
}

/// ReadMany 호출
struct ReadManyInvocation {
    patterns: Vec<String>,
    exclude: Vec<glob::Pattern>,
    working_dir: PathBuf,
    boundary: Arc<WorkspaceBoundary>,
    ignore_rules: Arc<IgnoreRuleSet>,
    limits: OutputLimits,
}

impl ReadManyInvocation {
    /// 패턴 확장 - 정렬된 고유 후보 집합
    fn expand_candidates(&self) -> Result<Vec<PathBuf>> {
        // BTreeSet으로 중복 제거와 사전순 정렬을 동시에
        let mut candidates = BTreeSet::new();

        for pattern in &self.patterns {
            let full_pattern = if Path::new(pattern).is_absolute() {
                pattern.clone()
            } else {
                self.working_dir.join(pattern).to_string_lossy().into_owned()
            };

            let entries = glob::glob(&full_pattern).map_err(|e| {
                Error::InvalidInput(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;

            for entry in entries.flatten() {
                if entry.is_file() {
                    candidates.insert(entry);
                }
            }
        }

        Ok(candidates.into_iter().collect())
    }

    /// 작업 디렉토리 기준 표시용 경로
    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.working_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// 후보 필터 - 제외 패턴, 제외 규칙, 경계
    ///
    /// 패턴 확장으로 얻은 경로이므로 경계 밖 후보는 치명적 에러가
    /// 아니라 건너뜀으로 처리합니다. 직접 지정 경로의 위반과
    /// 구분됩니다 (read 도구 참조).
    fn filter_candidates(
        &self,
        candidates: Vec<PathBuf>,
        budget: &mut OutputBudget,
    ) -> Vec<PathBuf> {
        let mut kept = Vec::with_capacity(candidates.len());
        let mut excluded = 0usize;
        let mut ignored = 0usize;

        for path in candidates {
            let display = self.display_path(&path);

            if self.exclude.iter().any(|p| p.matches(&display)) {
                excluded += 1;
                continue;
            }

            if let Ok(relative) = path.strip_prefix(&self.working_dir) {
                if self.ignore_rules.matches(relative, false) {
                    ignored += 1;
                    continue;
                }
            }

            match self.boundary.check(&path) {
                Ok(canonical) => kept.push(canonical),
                Err(_) => {
                    budget.record_skip(display, "resolves outside the workspace");
                }
            }
        }

        if excluded > 0 {
            debug!("{} candidates removed by exclude patterns", excluded);
        }
        if ignored > 0 {
            budget.record_skip(
                format!("<{} items>", ignored),
                format!("{} files matched ignore rules", ignored),
            );
        }

        kept
    }
}

#[async_trait]
impl ToolInvocation for ReadManyInvocation {
    fn description(&self) -> String {
        let mut description = format!(
            "Read files matching [{}] under {}",
            self.patterns.join(", "),
            self.working_dir.display()
        );
        if !self.exclude.is_empty() {
            let exclude: Vec<&str> = self.exclude.iter().map(|p| p.as_str()).collect();
            description.push_str(&format!(", excluding [{}]", exclude.join(", ")));
        }
        description
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut budget = OutputBudget::new(self.limits.clone());

        let candidates = self.expand_candidates()?;
        let candidates = self.filter_candidates(candidates, &mut budget);
        let candidates = budget.apply_count_policy(candidates);

        let mut sections = Vec::new();
        let total = candidates.len();

        for (index, path) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let display = self.display_path(path);

            let content = match tokio::fs::read_to_string(path).await {
                Ok(content) => content,
                Err(e) => {
                    // 개별 실패는 기록 후 계속
                    budget.record_skip(&display, format!("read failed: {}", e));
                    continue;
                }
            };

            match budget.try_accept(&display, &content) {
                BudgetDecision::Accept => {
                    sections.push(format!("--- {} ---\n{}", display, content));
                }
                BudgetDecision::AcceptPrefix(prefix) => {
                    sections.push(format!("--- {} ---\n{}", display, prefix));
                    budget.record_remaining(total - index - 1);
                    break;
                }
                BudgetDecision::Skip => continue,
                BudgetDecision::Stop => {
                    // 현재 항목은 try_accept가 이미 기록함
                    budget.record_remaining(total - index - 1);
                    break;
                }
            }
        }

        let report = budget.finalize();
        let summary = format!("read_many: {}", report.summary());
        let skipped = report.skipped;

        Ok(ToolOutput::new(sections.join("\n"), summary).with_skipped(skipped))
    }
}

// ============================================================================
// 테스트
// ============================================================================
