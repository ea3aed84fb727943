//! Hierarchical Context Resolver - 계층적 컨텍스트 파일 수집
//!
//! 세션 시작 시 모델에게 전달할 컨텍스트 문서를 계층적으로
//! 조립합니다. 우선순위 (일반 → 구체, 뒤에 올수록 구체적):
//!
//! 1. 전역 파일: `{home}/{configDir}/{filename}`
//! 2. 상향 스캔: 작업 디렉토리에서 VCS 루트(.git 포함 디렉토리)까지,
//!    루트→리프 순서 (수집 후 역순)
//! 3. 하향 스캔: 작업 디렉토리 기준 BFS, 디렉토리 수 상한,
//!    제외 규칙으로 가지치기, 사전순 정렬
//! 4. 정규화 경로로 중복 제거, 확장 제공 경로는 무조건 마지막
//!
//! 홈 디렉토리는 `RuntimeEnv`로 명시적으로 주입됩니다. 프로세스
//! 전역 상태를 읽지 않으므로 테스트에서 완전히 대체 가능합니다.

use super::imports::expand_imports;
use anvil_foundation::{ContextConfig, IgnoreRuleSet, Result, RuntimeEnv};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// VCS 루트 표식
const VCS_MARKER: &str = ".git";

/// 수집된 컨텍스트 파일
#[derive(Debug, Clone)]
pub struct ContextFile {
    /// 파일 경로 (정규화됨)
    pub path: PathBuf,
    /// 내용 (읽기 실패 시 None - 비치명적)
    pub content: Option<String>,
}

/// 해석 결과
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    /// 이어붙인 최종 문서
    pub document: String,
    /// 내용을 기여한 파일 수
    pub file_count: usize,
    /// 수집된 모든 파일 (읽기 실패 포함)
    pub files: Vec<ContextFile>,
}

/// 계층적 컨텍스트 해석기
///
/// ## 사용법
/// ```ignore
/// let resolver = HierarchicalContextResolver::new(config, runtime);
/// let resolved = resolver.resolve(&working_dir, &[])?;
/// println!("{} files contributed", resolved.file_count);
/// ```
pub struct HierarchicalContextResolver {
    config: ContextConfig,
    runtime: RuntimeEnv,
    ignore_rules: Arc<IgnoreRuleSet>,
}

impl HierarchicalContextResolver {
    pub fn new(config: ContextConfig, runtime: RuntimeEnv) -> Self {
        Self {
            config,
            runtime,
            ignore_rules: Arc::new(IgnoreRuleSet::with_defaults()),
        }
    }

    pub fn with_ignore_rules(mut self, rules: Arc<IgnoreRuleSet>) -> Self {
        self.ignore_rules = rules;
        self
    }

    /// 컨텍스트 해석 (단일 작업 디렉토리)
    ///
    /// `extension_paths`는 무조건 마지막에 덧붙습니다 (중복 제거
    /// 대상이 아님).
    pub fn resolve(
        &self,
        working_dir: &Path,
        extension_paths: &[PathBuf],
    ) -> Result<ResolvedContext> {
        self.resolve_roots(&[working_dir.to_path_buf()], extension_paths)
    }

    /// 컨텍스트 해석 (작업 디렉토리 + 추가 디렉토리들)
    ///
    /// 루트마다 상향/하향 스캔을 수행하고 정규화 경로 기준으로
    /// 한 번만 병합합니다. 전역 파일은 루트와 무관하게 한 번 포함됩니다.
    pub fn resolve_roots(
        &self,
        roots: &[PathBuf],
        extension_paths: &[PathBuf],
    ) -> Result<ResolvedContext> {
        let mut ordered: Vec<PathBuf> = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        let mut push_unique = |ordered: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>, path: PathBuf| {
            if let Ok(canonical) = path.canonicalize() {
                if seen.insert(canonical.clone()) {
                    ordered.push(canonical);
                }
            }
        };

        // 1. 전역 파일
        for path in self.global_files() {
            push_unique(&mut ordered, &mut seen, path);
        }

        for root in roots {
            // 2. 상향 스캔 (루트→리프)
            for path in self.upward_scan(root) {
                push_unique(&mut ordered, &mut seen, path);
            }

            // 3. 하향 스캔 (BFS, 사전순)
            for path in self.downward_scan(root) {
                push_unique(&mut ordered, &mut seen, path);
            }
        }

        // 4. 확장 제공 경로는 무조건 마지막
        for path in extension_paths {
            ordered.push(path.clone());
        }

        let fallback = roots.first().cloned().unwrap_or_else(|| PathBuf::from("."));

        debug!("Context discovery found {} files", ordered.len());

        // 읽기 + import 확장
        let mut files = Vec::with_capacity(ordered.len());
        for path in ordered {
            let content = match std::fs::read_to_string(&path) {
                Ok(raw) => {
                    let base = path.parent().unwrap_or_else(|| fallback.as_path());
                    Some(expand_imports(
                        &raw,
                        base,
                        self.config.import_format,
                        self.config.max_import_depth,
                    ))
                }
                Err(e) => {
                    // 개별 실패는 기록 후 계속
                    warn!("Cannot read context file '{}': {}", path.display(), e);
                    None
                }
            };
            files.push(ContextFile { path, content });
        }

        Ok(assemble(files))
    }

    /// 전역 컨텍스트 파일 후보들
    fn global_files(&self) -> Vec<PathBuf> {
        let home = match &self.runtime.home_dir {
            Some(home) => home,
            None => return Vec::new(),
        };
        self.config
            .filenames
            .iter()
            .map(|name| home.join(&self.config.global_dir_name).join(name))
            .filter(|path| path.is_file())
            .collect()
    }

    /// 상향 스캔 - 작업 디렉토리에서 VCS 루트까지, 루트→리프 순서
    fn upward_scan(&self, working_dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = Vec::new();
        let mut current = Some(working_dir);

        while let Some(dir) = current {
            for name in &self.config.filenames {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    found.push(candidate);
                }
            }
            // VCS 루트 표식이 있는 디렉토리까지 포함하고 중단
            if dir.join(VCS_MARKER).exists() {
                break;
            }
            current = dir.parent();
        }

        // 리프→루트로 수집했으므로 역순으로 루트→리프
        found.reverse();
        found
    }

    /// 하향 스캔 - BFS, 디렉토리 수 상한, 제외 규칙 가지치기
    fn downward_scan(&self, working_dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = Vec::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        let mut scanned = 0usize;

        queue.push_back(working_dir.to_path_buf());

        while let Some(dir) = queue.pop_front() {
            if scanned >= self.config.max_scan_dirs {
                debug!(
                    "Downward scan stopped at directory limit {}",
                    self.config.max_scan_dirs
                );
                break;
            }
            scanned += 1;

            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };

            // BFS 단계 안에서도 결정적 순서를 위해 정렬
            let mut children: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
            children.sort_unstable();

            for child in children {
                let relative = match child.strip_prefix(working_dir) {
                    Ok(rel) => rel,
                    Err(_) => continue,
                };

                if child.is_dir() {
                    if !self.ignore_rules.matches(relative, true) {
                        queue.push_back(child);
                    }
                } else if self
                    .config
                    .filenames
                    .iter()
                    .any(|name| child.file_name().map(|f| f == name.as_str()).unwrap_or(false))
                    && !self.ignore_rules.matches(relative, false)
                {
                    found.push(child);
                }
            }
        }

        found.sort_unstable();
        found
    }
}

/// 수집된 파일들을 하나의 문서로 조립
fn assemble(files: Vec<ContextFile>) -> ResolvedContext {
    let mut sections = Vec::new();
    let mut file_count = 0usize;

    for file in &files {
        if let Some(content) = &file.content {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                continue;
            }
            sections.push(format!(
                "--- Context from: {} ---\n{}\n--- End of Context from: {} ---",
                file.path.display(),
                trimmed,
                file.path.display()
            ));
            file_count += 1;
        }
    }

    ResolvedContext {
        document: sections.join("\n"),
        file_count,
        files,
    }
}

// ============================================================================
// 테스트
// ============================================================================
