//! Tool Environment - 세션 의존성 묶음
//!
//! 도구가 필요로 하는 모든 의존성을 명시적으로 전달합니다.
//! 어떤 컴포넌트도 전역 프로세스 상태(현재 디렉토리, 환경 변수)를
//! 직접 읽지 않습니다. 테스트에서 임시 디렉토리로 전체를 대체할
//! 수 있습니다.

use crate::budget::OutputBudget;
use crate::config::{FetchSettings, OutputLimits};
use crate::workspace::{IgnoreRuleSet, WorkspaceBoundary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Shell Settings - 쉘 설정
// ============================================================================

/// 쉘 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellType {
    /// Bash (Linux 기본)
    Bash,
    /// Zsh (macOS 기본)
    Zsh,
    /// Fish
    Fish,
    /// PowerShell (Windows 기본)
    PowerShell,
    /// Cmd (Windows 레거시)
    Cmd,
}

impl ShellType {
    /// 현재 OS의 기본 쉘
    pub fn default_for_os() -> Self {
        #[cfg(target_os = "windows")]
        {
            Self::PowerShell
        }
        #[cfg(target_os = "macos")]
        {
            Self::Zsh
        }
        #[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
        {
            Self::Bash
        }
    }

    /// 쉘 실행 파일 이름
    pub fn executable(&self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Fish => "fish",
            ShellType::PowerShell => {
                #[cfg(target_os = "windows")]
                {
                    "powershell.exe"
                }
                #[cfg(not(target_os = "windows"))]
                {
                    "pwsh"
                }
            }
            ShellType::Cmd => "cmd.exe",
        }
    }

    /// 명령어 실행 인자
    pub fn exec_args(&self) -> Vec<&'static str> {
        match self {
            ShellType::Bash | ShellType::Zsh | ShellType::Fish => vec!["-c"],
            ShellType::PowerShell => vec!["-NoProfile", "-Command"],
            ShellType::Cmd => vec!["/C"],
        }
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellType::Bash => write!(f, "bash"),
            ShellType::Zsh => write!(f, "zsh"),
            ShellType::Fish => write!(f, "fish"),
            ShellType::PowerShell => write!(f, "powershell"),
            ShellType::Cmd => write!(f, "cmd"),
        }
    }
}

/// 쉘 실행 설정
#[derive(Debug, Clone)]
pub struct ShellSettings {
    /// 쉘 타입
    pub shell_type: ShellType,
    /// 명령어 타임아웃 (밀리초)
    pub timeout_ms: u64,
    /// 출력 크기 상한 (바이트)
    pub max_output_bytes: usize,
    /// 추가 환경 변수
    pub env_vars: HashMap<String, String>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            shell_type: ShellType::default_for_os(),
            timeout_ms: 120_000,
            max_output_bytes: 30_000,
            env_vars: HashMap::new(),
        }
    }
}

// ============================================================================
// ToolEnv - 의존성 묶음
// ============================================================================

/// 도구 실행 환경
///
/// ## 사용법
/// ```ignore
/// let env = ToolEnv::new("session-1", working_dir, boundary)
///     .with_limits(limits)
///     .with_shell(shell_settings);
///
/// let invocation = tool.build(params, &env)?;
/// ```
#[derive(Debug, Clone)]
pub struct ToolEnv {
    /// 세션 ID (로그 상관관계용)
    pub session_id: String,
    /// 작업 디렉토리 (상대 경로 해석 기준)
    pub working_dir: PathBuf,
    /// 작업 공간 경계
    pub boundary: Arc<WorkspaceBoundary>,
    /// 제외 규칙
    pub ignore_rules: Arc<IgnoreRuleSet>,
    /// 출력 한도
    pub limits: OutputLimits,
    /// 쉘 설정
    pub shell: ShellSettings,
    /// 네트워크 페치 설정
    pub fetch: FetchSettings,
}

impl ToolEnv {
    pub fn new(
        session_id: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        boundary: WorkspaceBoundary,
    ) -> Self {
        let working_dir = working_dir.into();
        let ignore_rules = IgnoreRuleSet::load_workspace(&working_dir);
        Self {
            session_id: session_id.into(),
            working_dir,
            boundary: Arc::new(boundary),
            ignore_rules: Arc::new(ignore_rules),
            limits: OutputLimits::default(),
            shell: ShellSettings::default(),
            fetch: FetchSettings::default(),
        }
    }

    pub fn with_limits(mut self, limits: OutputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_ignore_rules(mut self, rules: IgnoreRuleSet) -> Self {
        self.ignore_rules = Arc::new(rules);
        self
    }

    pub fn with_shell(mut self, shell: ShellSettings) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchSettings) -> Self {
        self.fetch = fetch;
        self
    }

    /// 상대 경로를 작업 디렉토리 기준 절대 경로로
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// 이 호출을 위한 새 예산
    ///
    /// 예산은 호출 단위입니다. 호출 간 공유하지 않습니다.
    pub fn new_budget(&self) -> OutputBudget {
        OutputBudget::new(self.limits.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_shell_type_default() {
        let shell = ShellType::default_for_os();
        #[cfg(target_os = "windows")]
        assert_eq!(shell, ShellType::PowerShell);
        #[cfg(target_os = "macos")]
        assert_eq!(shell, ShellType::Zsh);
        #[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
        assert_eq!(shell, ShellType::Bash);
    }

    #[test]
    fn test_resolve_relative_path() {
        let dir = TempDir::new().unwrap();
        let boundary = WorkspaceBoundary::single(dir.path()).unwrap();
        let env = ToolEnv::new("s1", dir.path(), boundary);

        let resolved = env.resolve_path(Path::new("src/main.rs"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("src/main.rs"));
    }

    #[test]
    fn test_absolute_path_unchanged() {
        let dir = TempDir::new().unwrap();
        let boundary = WorkspaceBoundary::single(dir.path()).unwrap();
        let env = ToolEnv::new("s1", dir.path(), boundary);

        let absolute = dir.path().join("file.txt");
        assert_eq!(env.resolve_path(&absolute), absolute);
    }

    #[test]
    fn test_budget_is_per_invocation() {
        let dir = TempDir::new().unwrap();
        let boundary = WorkspaceBoundary::single(dir.path()).unwrap();
        let env = ToolEnv::new("s1", dir.path(), boundary);

        let mut first = env.new_budget();
        assert_eq!(first.try_accept("a", "x"), crate::budget::BudgetDecision::Accept);

        // 새 예산은 이전 호출의 소비와 무관
        let second = env.new_budget();
        assert_eq!(second.items_accepted(), 0);
    }
}
