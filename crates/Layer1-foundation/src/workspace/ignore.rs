//! Ignore Rules - 경로 제외 규칙 집합
//!
//! 여러 소스(VCS ignore 파일, 도구 전용 ignore 파일, 내장 기본값)의
//! 패턴을 gitignore 의미론으로 컴파일하여 매칭합니다.
//! - 소스 내부: last-match-wins (gitignore 표준, `!` 부정 포함)
//! - 소스 간: 합집합 - 어떤 소스가 제외한 경로는 다른 소스가 되살릴 수 없음
//! - 매칭은 순수 함수 (컴파일 후 I/O 없음, 수천 회 재사용 가능)
//! - 잘못된 패턴은 경고 기록 후 건너뜀 (치명적이지 않음)

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::warn;

/// 도구 전용 ignore 파일명
pub const TOOL_IGNORE_FILE: &str = ".anvilignore";

/// VCS ignore 파일명
pub const VCS_IGNORE_FILE: &str = ".gitignore";

/// 내장 기본 제외 패턴
const BUILTIN_EXCLUDES: &[&str] = &[".git/", "node_modules/", "target/"];

/// 패턴 소스 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreSource {
    /// 내장 기본값
    Builtin,
    /// 버전 관리 ignore 파일 (.gitignore)
    Vcs,
    /// 도구 전용 ignore 파일
    Custom,
}

impl IgnoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreSource::Builtin => "builtin",
            IgnoreSource::Vcs => "vcs",
            IgnoreSource::Custom => "custom",
        }
    }
}

/// 컴파일된 제외 규칙 집합
///
/// ## 사용법
/// ```ignore
/// let mut rules = IgnoreRuleSet::with_defaults();
/// rules.add_source(IgnoreSource::Custom, &["*.log", "build/**"]);
///
/// if rules.matches(Path::new("build/out.js"), false) {
///     // 제외됨
/// }
/// ```
#[derive(Debug)]
pub struct IgnoreRuleSet {
    /// 소스별 컴파일 결과 (추가 순서 유지)
    layers: Vec<(IgnoreSource, Gitignore)>,

    /// 건너뛴 잘못된 패턴 기록
    invalid_patterns: Vec<String>,
}

impl IgnoreRuleSet {
    /// 빈 규칙 집합
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            invalid_patterns: Vec::new(),
        }
    }

    /// 내장 기본 제외 패턴을 포함한 규칙 집합
    pub fn with_defaults() -> Self {
        let mut rules = Self::new();
        rules.add_source(IgnoreSource::Builtin, BUILTIN_EXCLUDES);
        rules
    }

    /// 패턴 소스 추가
    ///
    /// 잘못된 패턴은 경고와 함께 건너뜁니다.
    pub fn add_source<S: AsRef<str>>(&mut self, source: IgnoreSource, patterns: &[S]) {
        // 루트는 상대 경로 매칭만 하므로 비워둠
        let mut builder = GitignoreBuilder::new("");

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let trimmed = pattern.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Err(e) = builder.add_line(None, pattern) {
                warn!(
                    "Skipping malformed ignore pattern '{}' from {} source: {}",
                    pattern,
                    source.as_str(),
                    e
                );
                self.invalid_patterns.push(pattern.to_string());
            }
        }

        match builder.build() {
            Ok(compiled) => self.layers.push((source, compiled)),
            Err(e) => {
                // 빌드 실패는 소스 전체를 건너뜀 - 매칭 자체는 계속 동작
                warn!("Failed to compile {} ignore source: {}", source.as_str(), e);
            }
        }
    }

    /// ignore 파일에서 소스 추가 (파일이 없으면 조용히 통과)
    pub fn add_ignore_file(&mut self, source: IgnoreSource, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                self.add_source(source, &lines);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Cannot read ignore file '{}': {}", path.display(), e);
            }
        }
    }

    /// 작업 공간 루트에서 표준 구성 로드
    ///
    /// 내장 기본값 + `.gitignore` + `.anvilignore` (둘 다 선택적)
    pub fn load_workspace(root: &Path) -> Self {
        let mut rules = Self::with_defaults();
        rules.add_ignore_file(IgnoreSource::Vcs, &root.join(VCS_IGNORE_FILE));
        rules.add_ignore_file(IgnoreSource::Custom, &root.join(TOOL_IGNORE_FILE));
        rules
    }

    /// 상대 경로가 제외 대상인지 확인
    ///
    /// 어느 소스든 제외로 판정하면 제외입니다. 한 소스의 `!` 부정은
    /// 그 소스 안에서만 유효하며 다른 소스의 제외를 되살리지 못합니다.
    pub fn matches(&self, relative_path: &Path, is_dir: bool) -> bool {
        self.layers.iter().any(|(_, gitignore)| {
            gitignore
                .matched_path_or_any_parents(relative_path, is_dir)
                .is_ignore()
        })
    }

    /// 건너뛴 잘못된 패턴들
    pub fn invalid_patterns(&self) -> &[String] {
        &self.invalid_patterns
    }

    /// 등록된 소스 수
    pub fn source_count(&self) -> usize {
        self.layers.len()
    }
}

impl Default for IgnoreRuleSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}
