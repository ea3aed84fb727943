//! Configuration - 실행 코어 설정
//!
//! 도구 출력 예산, 컨텍스트 탐색, 네트워크 페치 설정을 정의합니다.
//! 설정값은 상위 계층(설정 퍼시스턴스)에서 소비되어 주입됩니다.
//!
//! ## 설계 원칙
//! 어떤 컴포넌트도 프로세스 환경(홈 디렉토리, 환경 변수)을 직접 읽지 않습니다.
//! 환경 의존 값은 [`RuntimeEnv`]로 한 번만 감지하여 생성자에 명시적으로
//! 전달합니다. 테스트에서는 [`RuntimeEnv::with_home`]으로 대체합니다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 설정 파일명
pub const SETTINGS_FILE: &str = "settings.toml";

// ============================================================================
// 출력 예산 설정
// ============================================================================

/// 예산 초과 시 적용할 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// 한도 도달 시 수용 중단, 초과분을 집계 기록으로 남김
    #[default]
    Warn,
    /// 한도에 맞게 앞부분만 유지 (항목 수: 앞 N개, 토큰: 접두사 + 표식)
    Truncate,
    /// 정렬된 후보에서 균등 간격으로 결정적 표본 추출
    Sample,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Warn => "warn",
            OverflowPolicy::Truncate => "truncate",
            OverflowPolicy::Sample => "sample",
        }
    }
}

/// 도구 출력 한도 설정
///
/// 한 번의 도구 호출이 모델 컨텍스트 윈도우를 넘지 않도록 제한합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLimits {
    /// 호출당 최대 항목 수
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// 항목당 최대 바이트
    #[serde(default = "default_max_item_bytes")]
    pub max_item_bytes: usize,

    /// 호출당 최대 누적 토큰 (추정치)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// 초과 정책
    #[serde(default)]
    pub policy: OverflowPolicy,
}

fn default_max_items() -> usize {
    50
}

fn default_max_item_bytes() -> usize {
    512 * 1024
}

fn default_max_tokens() -> usize {
    50_000
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_item_bytes: default_max_item_bytes(),
            max_tokens: default_max_tokens(),
            policy: OverflowPolicy::default(),
        }
    }
}

impl OutputLimits {
    /// 테스트/특수 용도: 무제한에 가까운 한도
    pub fn generous() -> Self {
        Self {
            max_items: usize::MAX,
            max_item_bytes: usize::MAX,
            max_tokens: usize::MAX,
            policy: OverflowPolicy::Warn,
        }
    }
}

// ============================================================================
// 컨텍스트 탐색 설정
// ============================================================================

/// import 확장 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    /// 지시문 자리에 내용 인라인 치환
    #[default]
    Flat,
    /// 주석 마커로 감싼 트리 구조 포함
    Tree,
}

/// 계층적 컨텍스트 탐색 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// 인식할 컨텍스트 파일명들 (예: ANVIL.md)
    #[serde(default = "default_context_filenames")]
    pub filenames: Vec<String>,

    /// 홈 디렉토리 아래 전역 설정 디렉토리명
    #[serde(default = "default_global_dir")]
    pub global_dir_name: String,

    /// 하향 탐색 시 방문할 최대 디렉토리 수
    #[serde(default = "default_max_scan_dirs")]
    pub max_scan_dirs: usize,

    /// import 확장 형식
    #[serde(default)]
    pub import_format: ImportFormat,

    /// import 재귀 깊이 상한 (순환 탐지의 2차 안전망)
    #[serde(default = "default_max_import_depth")]
    pub max_import_depth: usize,
}

fn default_context_filenames() -> Vec<String> {
    vec!["ANVIL.md".to_string()]
}

fn default_global_dir() -> String {
    ".anvil".to_string()
}

fn default_max_scan_dirs() -> usize {
    200
}

fn default_max_import_depth() -> usize {
    10
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            filenames: default_context_filenames(),
            global_dir_name: default_global_dir(),
            max_scan_dirs: default_max_scan_dirs(),
            import_format: ImportFormat::default(),
            max_import_depth: default_max_import_depth(),
        }
    }
}

// ============================================================================
// 네트워크 페치 설정
// ============================================================================

/// web_fetch 도구 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// 요청 타임아웃 (초)
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// 응답 본문 최대 바이트
    #[serde(default = "default_fetch_max_bytes")]
    pub max_content_bytes: usize,

    /// 최대 리다이렉트 횟수
    #[serde(default = "default_fetch_max_redirects")]
    pub max_redirects: usize,
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_fetch_max_bytes() -> usize {
    1_000_000
}

fn default_fetch_max_redirects() -> usize {
    10
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            max_content_bytes: default_fetch_max_bytes(),
            max_redirects: default_fetch_max_redirects(),
        }
    }
}

// ============================================================================
// 런타임 환경
// ============================================================================

/// 프로세스 환경에서 유래하는 값들의 명시적 묶음
///
/// 싱글톤/전역 접근 대신 생성자에 주입합니다.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    /// 사용자 홈 디렉토리 (감지 실패 시 None)
    pub home_dir: Option<PathBuf>,

    /// 디버그 모드 여부
    pub debug: bool,
}

impl RuntimeEnv {
    /// 프로세스 환경에서 한 번 감지 (프로세스 진입점에서만 호출)
    pub fn detect() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            debug: std::env::var_os("ANVIL_DEBUG").is_some(),
        }
    }

    /// 명시적 홈 디렉토리로 생성 (테스트용)
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: Some(home.into()),
            debug: false,
        }
    }
}
