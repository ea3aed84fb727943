//! Output Budget - 도구 출력 예산 집행
//!
//! 한 번의 도구 호출 동안 항목 수, 항목당 크기, 누적 토큰 추정치를
//! 단조 증가로 집계하며 한도를 집행합니다. 호출마다 새로 만들고
//! 호출 간 공유하지 않습니다 (예산 풀링 없음).
//!
//! 검사 순서 (비용이 싼 것부터):
//! 1. 항목 수 - 후보 집합에 정책(warn/truncate/sample) 적용
//! 2. 항목당 바이트 - 한도 초과 항목은 정책과 무관하게 개별 건너뜀
//! 3. 누적 토큰 - 지배적 제약 (모델 컨텍스트 윈도우), 정책별 처리
//!
//! 예산 초과는 실패가 아닙니다. 모든 건너뜀은 기계가 읽을 수 있는
//! 사유와 함께 SkipRecord로 남고 사람용 요약에 노출됩니다.

use crate::config::{OutputLimits, OverflowPolicy};
use crate::tokenizer::{estimate_tokens, prefix_chars_for_budget};
use tracing::debug;

/// truncate 정책이 내용 끝에 덧붙이는 표식
pub const TRUNCATION_MARKER: &str = "\n... [truncated: token budget exhausted]";

/// 건너뜀 기록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    /// 건너뛴 항목 경로 (집계 기록은 항목 수 설명)
    pub path: String,
    /// 기계가 읽을 수 있는 사유
    pub reason: String,
}

impl SkipRecord {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// try_accept의 판정 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetDecision {
    /// 수용 - 항목 전체 포함
    Accept,
    /// 부분 수용 - 남은 토큰 예산에 맞춘 접두사 (표식 포함), 이후 중단
    AcceptPrefix(String),
    /// 이 항목만 건너뜀 - 다음 항목 계속
    Skip,
    /// 수용 불가 - 호출자는 순회를 중단해야 함
    Stop,
}

/// 예산 집행 결과 보고
#[derive(Debug, Clone)]
pub struct BudgetReport {
    /// 수용된 항목 수
    pub items_accepted: usize,
    /// 누적 토큰 추정치
    pub tokens_used: usize,
    /// 건너뜀 기록들
    pub skipped: Vec<SkipRecord>,
}

impl BudgetReport {
    /// 사람용 요약 한 줄
    pub fn summary(&self) -> String {
        if self.skipped.is_empty() {
            format!("{} items, ~{} tokens", self.items_accepted, self.tokens_used)
        } else {
            format!(
                "{} items, ~{} tokens, {} skipped",
                self.items_accepted,
                self.tokens_used,
                self.skipped.len()
            )
        }
    }

    /// 건너뜀 사유 목록 (사람용 요약에 덧붙임)
    pub fn skip_lines(&self) -> String {
        self.skipped
            .iter()
            .map(|s| format!("- {}: {}", s.path, s.reason))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 호출 단위 출력 예산
///
/// ## 사용법
/// ```ignore
/// let mut budget = OutputBudget::new(limits);
/// let candidates = budget.apply_count_policy(candidates);
///
/// for item in candidates {
///     match budget.try_accept(&item.path, &item.content) {
///         BudgetDecision::Accept => output.push(item),
///         BudgetDecision::AcceptPrefix(prefix) => { output.push_prefix(prefix); break; }
///         BudgetDecision::Skip => continue,
///         BudgetDecision::Stop => break,
///     }
/// }
/// let report = budget.finalize();
/// ```
#[derive(Debug)]
pub struct OutputBudget {
    limits: OutputLimits,
    items_accepted: usize,
    tokens_used: usize,
    skipped: Vec<SkipRecord>,
    stopped: bool,
}

impl OutputBudget {
    pub fn new(limits: OutputLimits) -> Self {
        Self {
            limits,
            items_accepted: 0,
            tokens_used: 0,
            skipped: Vec::new(),
            stopped: false,
        }
    }

    /// 정렬된 후보 집합에 항목 수 정책 적용
    ///
    /// - `warn`: 앞 max_items개만 유지, 초과분을 집계 기록 하나로 남김
    /// - `truncate`: 기존 순서 기준 앞 max_items개 유지
    /// - `sample`: stride = ceil(total / max_items)로 균등 간격 결정적 추출
    pub fn apply_count_policy<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        let total = items.len();
        let max = self.limits.max_items;
        if total <= max {
            return items;
        }

        let omitted = total - max;
        match self.limits.policy {
            OverflowPolicy::Warn => {
                items.truncate(max);
                self.skipped.push(SkipRecord::new(
                    format!("<{} items>", omitted),
                    format!(
                        "item limit {} reached; {} of {} candidates not considered",
                        max, omitted, total
                    ),
                ));
            }
            OverflowPolicy::Truncate => {
                items.truncate(max);
                self.skipped.push(SkipRecord::new(
                    format!("<{} items>", omitted),
                    format!("candidate list truncated to first {} of {}", max, total),
                ));
            }
            OverflowPolicy::Sample => {
                let stride = total.div_ceil(max);
                let mut sampled = Vec::with_capacity(max);
                let mut index = 0usize;
                for (i, item) in items.into_iter().enumerate() {
                    if i == index && sampled.len() < max {
                        sampled.push(item);
                        index += stride;
                    }
                }
                self.skipped.push(SkipRecord::new(
                    format!("<{} items>", omitted),
                    format!(
                        "sampled {} of {} candidates at stride {}",
                        sampled.len(),
                        total,
                        stride
                    ),
                ));
                items = sampled;
            }
        }

        debug!(
            "Count policy {} applied: {} of {} candidates kept",
            self.limits.policy.as_str(),
            items.len(),
            total
        );
        items
    }

    /// 항목 하나의 수용 판정
    ///
    /// 내부에서 SkipRecord를 기록하므로 호출자는 판정에 따라
    /// 순회만 제어하면 됩니다.
    pub fn try_accept(&mut self, path: &str, content: &str) -> BudgetDecision {
        if self.stopped {
            return BudgetDecision::Stop;
        }

        // 1. 항목 수 (증분 경로로 들어온 경우의 안전망)
        if self.items_accepted >= self.limits.max_items {
            self.stopped = true;
            self.skipped.push(SkipRecord::new(
                path,
                format!("item limit {} reached", self.limits.max_items),
            ));
            return BudgetDecision::Stop;
        }

        // 2. 항목당 크기 - 정책과 무관하게 개별 건너뜀
        let size = content.len();
        if size > self.limits.max_item_bytes {
            self.skipped.push(SkipRecord::new(
                path,
                format!(
                    "item size {} bytes exceeds limit {} bytes",
                    size, self.limits.max_item_bytes
                ),
            ));
            return BudgetDecision::Skip;
        }

        // 3. 누적 토큰
        let cost = estimate_tokens(content);
        if self.tokens_used + cost > self.limits.max_tokens {
            return self.handle_token_overflow(path, content);
        }

        self.tokens_used += cost;
        self.items_accepted += 1;
        BudgetDecision::Accept
    }

    fn handle_token_overflow(&mut self, path: &str, content: &str) -> BudgetDecision {
        match self.limits.policy {
            OverflowPolicy::Warn => {
                self.stopped = true;
                self.skipped.push(SkipRecord::new(
                    path,
                    format!("aggregate token budget {} exhausted", self.limits.max_tokens),
                ));
                BudgetDecision::Stop
            }
            OverflowPolicy::Truncate => {
                let remaining = self.limits.max_tokens.saturating_sub(self.tokens_used);
                let keep = prefix_chars_for_budget(content, remaining);
                let mut prefix: String = content.chars().take(keep).collect();
                prefix.push_str(TRUNCATION_MARKER);

                self.tokens_used += estimate_tokens(&prefix).min(remaining);
                self.items_accepted += 1;
                self.stopped = true;
                self.skipped.push(SkipRecord::new(
                    path,
                    format!(
                        "content truncated to fit remaining token budget ({} tokens)",
                        remaining
                    ),
                ));
                BudgetDecision::AcceptPrefix(prefix)
            }
            OverflowPolicy::Sample => {
                self.skipped.push(SkipRecord::new(
                    path,
                    "skipped to stay within token budget (sample policy)".to_string(),
                ));
                BudgetDecision::Skip
            }
        }
    }

    /// 외부 사유(개별 I/O 실패 등)로 건너뜀 기록
    pub fn record_skip(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkipRecord::new(path, reason));
    }

    /// Stop 이후 남은 항목들을 집계 기록으로 남김
    pub fn record_remaining(&mut self, count: usize) {
        if count > 0 {
            self.skipped.push(SkipRecord::new(
                format!("<{} items>", count),
                format!("{} remaining items not processed (budget exhausted)", count),
            ));
        }
    }

    pub fn items_accepted(&self) -> usize {
        self.items_accepted
    }

    pub fn tokens_used(&self) -> usize {
        self.tokens_used
    }

    /// 집행 결과 보고 생성 (예산 소비 종료)
    pub fn finalize(self) -> BudgetReport {
        BudgetReport {
            items_accepted: self.items_accepted,
            tokens_used: self.tokens_used,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_items: usize, policy: OverflowPolicy) -> OutputLimits {
        OutputLimits {
            max_items,
            max_item_bytes: 1024,
            max_tokens: 1000,
            policy,
        }
    }

    fn candidates(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("file{:02}.txt", i)).collect()
    }

    #[test]
    fn test_truncate_keeps_first_n() {
        let mut budget = OutputBudget::new(limits(3, OverflowPolicy::Truncate));
        let kept = budget.apply_count_policy(candidates(10));

        assert_eq!(kept, vec!["file00.txt", "file01.txt", "file02.txt"]);

        let report = budget.finalize();
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.contains('7'));
    }

    #[test]
    fn test_sample_stride_selection() {
        let mut budget = OutputBudget::new(limits(5, OverflowPolicy::Sample));
        let kept = budget.apply_count_policy(candidates(20));

        // stride = ceil(20/5) = 4 -> 인덱스 0,4,8,12,16
        assert_eq!(
            kept,
            vec![
                "file00.txt",
                "file04.txt",
                "file08.txt",
                "file12.txt",
                "file16.txt"
            ]
        );

        let report = budget.finalize();
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.contains("15"));
    }

    #[test]
    fn test_sample_deterministic() {
        for _ in 0..5 {
            let mut budget = OutputBudget::new(limits(5, OverflowPolicy::Sample));
            let kept = budget.apply_count_policy(candidates(20));
            assert_eq!(kept[0], "file00.txt");
            assert_eq!(kept[4], "file16.txt");
        }
    }

    #[test]
    fn test_under_limit_untouched() {
        let mut budget = OutputBudget::new(limits(50, OverflowPolicy::Warn));
        let kept = budget.apply_count_policy(candidates(10));
        assert_eq!(kept.len(), 10);
        assert!(budget.finalize().skipped.is_empty());
    }

    #[test]
    fn test_oversize_item_skipped_individually() {
        let mut budget = OutputBudget::new(limits(10, OverflowPolicy::Warn));
        let big = "x".repeat(2048);

        assert_eq!(budget.try_accept("big.bin", &big), BudgetDecision::Skip);
        assert_eq!(budget.try_accept("small.txt", "hello"), BudgetDecision::Accept);

        let report = budget.finalize();
        assert_eq!(report.items_accepted, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("2048"));
    }

    #[test]
    fn test_token_overflow_warn_stops() {
        let mut budget = OutputBudget::new(OutputLimits {
            max_items: 100,
            max_item_bytes: 10_000,
            max_tokens: 10,
            policy: OverflowPolicy::Warn,
        });

        // 40 ASCII chars = 10 tokens, 예산 소진
        assert_eq!(budget.try_accept("a.txt", &"x".repeat(40)), BudgetDecision::Accept);
        assert_eq!(budget.try_accept("b.txt", "more text"), BudgetDecision::Stop);
        // 중단 이후에는 항상 Stop
        assert_eq!(budget.try_accept("c.txt", "x"), BudgetDecision::Stop);

        let report = budget.finalize();
        assert_eq!(report.items_accepted, 1);
        assert!(report.skipped[0].reason.contains("token budget"));
    }

    #[test]
    fn test_token_overflow_truncate_prefix() {
        let mut budget = OutputBudget::new(OutputLimits {
            max_items: 100,
            max_item_bytes: 100_000,
            max_tokens: 20,
            policy: OverflowPolicy::Truncate,
        });

        let long = "y".repeat(400);
        match budget.try_accept("long.txt", &long) {
            BudgetDecision::AcceptPrefix(prefix) => {
                assert!(prefix.ends_with(TRUNCATION_MARKER));
                assert!(prefix.len() < long.len());
            }
            other => panic!("expected AcceptPrefix, got {:?}", other),
        }

        // truncate는 수용 후 중단
        assert_eq!(budget.try_accept("next.txt", "z"), BudgetDecision::Stop);
        assert_eq!(budget.finalize().items_accepted, 1);
    }

    #[test]
    fn test_token_overflow_sample_continues() {
        let mut budget = OutputBudget::new(OutputLimits {
            max_items: 100,
            max_item_bytes: 10_000,
            max_tokens: 12,
            policy: OverflowPolicy::Sample,
        });

        assert_eq!(budget.try_accept("a.txt", &"x".repeat(40)), BudgetDecision::Accept);
        // 예산을 넘기는 항목은 건너뛰고 계속
        assert_eq!(budget.try_accept("big.txt", &"y".repeat(100)), BudgetDecision::Skip);
        assert_eq!(budget.try_accept("tiny.txt", "ok"), BudgetDecision::Accept);

        let report = budget.finalize();
        assert_eq!(report.items_accepted, 2);
    }

    #[test]
    fn test_incremental_item_limit() {
        let mut budget = OutputBudget::new(limits(2, OverflowPolicy::Warn));
        assert_eq!(budget.try_accept("a", "1"), BudgetDecision::Accept);
        assert_eq!(budget.try_accept("b", "2"), BudgetDecision::Accept);
        assert_eq!(budget.try_accept("c", "3"), BudgetDecision::Stop);
    }

    #[test]
    fn test_report_summary_mentions_skips() {
        let mut budget = OutputBudget::new(limits(10, OverflowPolicy::Warn));
        budget.record_skip("bad.txt", "permission denied");
        let report = budget.finalize();
        assert!(report.summary().contains("1 skipped"));
        assert!(report.skip_lines().contains("permission denied"));
    }
}
