//! Security - 셸 명령어 검증
//!
//! 실행 전에 명령어 문자열을 어휘적으로 검사합니다. 의도적으로
//! 과차단(over-blocking)합니다: 치환 연산자는 문자열 안 어디에
//! 있어도 거부하며, 인용부 안이라는 이유로 통과시키지 않습니다.
//! OS 샌드박스와 독립적으로 동작하는 1차 방어선입니다.
//! - 치환 연산자 차단 (백틱, `$(`, `<(`, `>(`)
//! - 금지 명령어 패턴 차단 (시스템 파괴, fork bomb, 디스크 덮어쓰기)
//! - 금지 명령어 토큰 차단 (shutdown 등, 어느 위치에 있어도)
//! - 빈 명령어 거부

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

// ============================================================
// 검증 결과
// ============================================================

/// 명령어 검증 판정
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandCheck {
    /// 통과 - 실행 가능
    Allowed,
    /// 거부 - 사유 포함
    Rejected { reason: String },
}

impl CommandCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CommandCheck::Allowed)
    }

    fn rejected(reason: impl Into<String>) -> Self {
        CommandCheck::Rejected {
            reason: reason.into(),
        }
    }
}

// ============================================================
// 치환 연산자 (항상 차단)
// ============================================================

/// 차단되는 치환 연산자들
///
/// 치환은 검사 대상 문자열 바깥에서 임의 명령을 실행하므로
/// 어휘 검사만으로는 안쪽을 판정할 수 없습니다.
const SUBSTITUTION_OPERATORS: &[(&str, &str)] = &[
    ("`", "backtick command substitution"),
    ("$(", "command substitution"),
    ("<(", "process substitution"),
    (">(", "process substitution"),
];

// ============================================================
// 금지 명령어 패턴 (항상 차단)
// ============================================================

/// 금지된 명령어 패턴들
///
/// 정규식은 여기서 한 번 컴파일되어 검증기 수명 동안 재사용됩니다.
fn forbidden_patterns() -> Vec<ForbiddenPattern> {
    let mut patterns = vec![
        // 시스템 파괴
        ForbiddenPattern::new("rm -rf /", "Root filesystem deletion"),
        ForbiddenPattern::new("rm -rf /*", "Root filesystem deletion"),
        ForbiddenPattern::new("rm -fr /", "Root filesystem deletion"),
        // Fork bomb
        ForbiddenPattern::new(":(){ :|:& };:", "Fork bomb"),
        // 네트워크 악용
        ForbiddenPattern::contains("/dev/tcp/", "Network device access"),
        // 프로세스 무차별 종료
        ForbiddenPattern::contains("killall -9", "Mass process kill"),
        ForbiddenPattern::contains("pkill -9", "Mass process kill"),
    ];

    let regexes: &[(&str, &str)] = &[
        (r"rm\s+(-[rf]+\s+)+/\s*$", "Root filesystem deletion"),
        (r"rm\s+(-[rf]+\s+)+/\*", "Root filesystem deletion"),
        (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "Fork bomb"),
        (r"dd\s+if=.*of=/dev/[sh]d[a-z]", "Disk overwrite"),
        (r">\s*/dev/[sh]d[a-z]", "Disk overwrite"),
        (r"mkfs\.", "Filesystem format"),
        (r"bash\s+-i\s+>&\s*/dev/tcp", "Reverse shell"),
    ];
    patterns.extend(
        regexes
            .iter()
            .filter_map(|(pattern, reason)| ForbiddenPattern::regex(pattern, *reason)),
    );
    patterns
}

/// 토큰 단위로 차단되는 명령어들
///
/// sudo 접두사나 인자가 붙어도 잡히도록 shlex 토큰과 비교합니다.
const FORBIDDEN_COMMANDS: &[(&str, &str)] = &[
    ("shutdown", "System shutdown"),
    ("reboot", "System reboot"),
    ("halt", "System halt"),
    ("poweroff", "System poweroff"),
];

/// 금지 패턴 정의
#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub pattern: PatternType,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum PatternType {
    Exact(String),
    Contains(String),
    Regex(Regex),
}

impl ForbiddenPattern {
    pub fn new(exact: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Exact(exact.into()),
            reason: reason.into(),
        }
    }

    pub fn contains(substring: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Contains(substring.into()),
            reason: reason.into(),
        }
    }

    /// 정규식 패턴 생성 - 구성 시점에 컴파일
    ///
    /// 컴파일에 실패하면 경고 후 None을 반환합니다. 매칭 시점에
    /// 조용히 탈락하는 패턴이 생기지 않습니다.
    pub fn regex(pattern: &str, reason: impl Into<String>) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(compiled) => Some(Self {
                pattern: PatternType::Regex(compiled),
                reason: reason.into(),
            }),
            Err(e) => {
                warn!("Skipping invalid forbidden-command regex '{}': {}", pattern, e);
                None
            }
        }
    }

    /// 명령어가 이 패턴에 매칭되는지 확인
    pub fn matches(&self, command: &str) -> bool {
        match &self.pattern {
            PatternType::Exact(s) => command.trim() == s,
            PatternType::Contains(s) => command.contains(s),
            PatternType::Regex(re) => re.is_match(command),
        }
    }
}

// ============================================================
// 검증기
// ============================================================

/// 셸 명령어 검증기 (패턴 캐시)
pub struct ShellCommandValidator {
    forbidden: Vec<ForbiddenPattern>,
}

static VALIDATOR: OnceLock<ShellCommandValidator> = OnceLock::new();

/// 전역 검증기 접근
pub fn validator() -> &'static ShellCommandValidator {
    VALIDATOR.get_or_init(ShellCommandValidator::new)
}

impl ShellCommandValidator {
    pub fn new() -> Self {
        Self {
            forbidden: forbidden_patterns(),
        }
    }

    /// 명령어 검증
    ///
    /// 거부 판정은 항상 구체적 사유를 담습니다.
    pub fn validate(&self, command: &str) -> CommandCheck {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return CommandCheck::rejected("empty command");
        }

        // 1. 치환 연산자 - 인용부 여부와 무관하게 거부
        for (operator, description) in SUBSTITUTION_OPERATORS {
            if trimmed.contains(operator) {
                return CommandCheck::rejected(format!(
                    "command contains {} ('{}')",
                    description, operator
                ));
            }
        }

        // 2. 금지 패턴
        for pattern in &self.forbidden {
            if pattern.matches(trimmed) {
                return CommandCheck::rejected(format!(
                    "forbidden command pattern: {}",
                    pattern.reason
                ));
            }
        }

        // 3. 금지 명령어 토큰 (어휘 분리 실패 시 통째로 비교)
        let tokens = shlex::split(trimmed).unwrap_or_else(|| vec![trimmed.to_string()]);
        for token in &tokens {
            for (name, reason) in FORBIDDEN_COMMANDS {
                if token == name {
                    return CommandCheck::rejected(format!("forbidden command: {}", reason));
                }
            }
        }

        CommandCheck::Allowed
    }

    /// 거부 대상인지 확인
    pub fn is_rejected(&self, command: &str) -> bool {
        !self.validate(command).is_allowed()
    }
}

impl Default for ShellCommandValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command_allowed() {
        let v = ShellCommandValidator::new();

        assert!(v.validate("echo hello").is_allowed());
        assert!(v.validate("ls -la src").is_allowed());
        assert!(v.validate("cargo check").is_allowed());
        assert!(v.validate("git status").is_allowed());
    }

    #[test]
    fn test_substitution_rejected() {
        let v = ShellCommandValidator::new();

        assert!(v.is_rejected("echo $(whoami)"));
        assert!(v.is_rejected("echo `whoami`"));
        assert!(v.is_rejected("diff <(sort a) <(sort b)"));
        assert!(v.is_rejected("tee >(wc -l)"));
    }

    #[test]
    fn test_substitution_rejected_even_quoted() {
        let v = ShellCommandValidator::new();

        // 어휘 검사는 인용부를 해석하지 않음 (과차단 의도)
        assert!(v.is_rejected("echo '$(safe)'"));
        assert!(v.is_rejected("echo \"`date`\""));
    }

    #[test]
    fn test_empty_command_rejected() {
        let v = ShellCommandValidator::new();

        match v.validate("   ") {
            CommandCheck::Rejected { reason } => assert!(reason.contains("empty")),
            CommandCheck::Allowed => panic!("empty command must be rejected"),
        }
    }

    #[test]
    fn test_forbidden_patterns_rejected() {
        let v = ShellCommandValidator::new();

        assert!(v.is_rejected("rm -rf /"));
        assert!(v.is_rejected("rm -rf /*"));
        assert!(v.is_rejected(":(){ :|:& };:"));
        assert!(v.is_rejected("dd if=/dev/zero of=/dev/sda"));
        assert!(v.is_rejected("killall -9 node"));
    }

    #[test]
    fn test_forbidden_command_tokens_rejected() {
        let v = ShellCommandValidator::new();

        // 접두사나 인자가 붙어도 토큰 단위로 잡힘
        assert!(v.is_rejected("shutdown"));
        assert!(v.is_rejected("sudo shutdown -h now"));
        assert!(v.is_rejected("sudo reboot"));
    }

    #[test]
    fn test_similar_but_safe_allowed() {
        let v = ShellCommandValidator::new();

        // 패턴과 유사하지만 작업 공간 안의 일반 삭제
        assert!(v.validate("rm -rf target").is_allowed());
        assert!(v.validate("rm file.txt").is_allowed());
    }

    #[test]
    fn test_rejection_carries_reason() {
        let v = ShellCommandValidator::new();

        match v.validate("echo $(id)") {
            CommandCheck::Rejected { reason } => {
                assert!(reason.contains("command substitution"));
            }
            CommandCheck::Allowed => panic!("substitution must be rejected"),
        }
    }

    #[test]
    fn test_builtin_pattern_table_fully_compiled() {
        // 내장 정규식이 하나라도 잘못되면 여기서 개수가 줄어듦
        let v = ShellCommandValidator::new();
        assert_eq!(v.forbidden.len(), 14);
    }

    #[test]
    fn test_invalid_regex_pattern_dropped_at_construction() {
        assert!(ForbiddenPattern::regex(r"[invalid", "broken").is_none());
        assert!(ForbiddenPattern::regex(r"mkfs\.", "ok").is_some());
    }

    #[test]
    fn test_global_validator_cached() {
        let a = validator() as *const _;
        let b = validator() as *const _;
        assert_eq!(a, b);
    }
}
