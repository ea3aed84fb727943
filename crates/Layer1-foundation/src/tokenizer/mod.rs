//! Token Estimation - 문자 기반 토큰 수 추정
//!
//! 외부 토크나이저 의존 없이 내용 길이의 결정적 함수로 토큰 비용을
//! 추정합니다. 예산 계산(budget 모듈)의 지배적 제약이 모델 컨텍스트
//! 윈도우이므로 정확한 인코딩보다 결정성과 속도가 중요합니다.

/// 언어별 평균 문자/토큰 비율
const ASCII_CHARS_PER_TOKEN: f32 = 4.0;
const CJK_CHARS_PER_TOKEN: f32 = 1.5;
const OTHER_CHARS_PER_TOKEN: f32 = 2.0;

/// 텍스트의 토큰 수 추정
///
/// Single-pass character analysis (no allocation):
/// - ASCII: ~4 chars/token
/// - CJK: ~1.5 chars/token
/// - 기타 유니코드: ~2 chars/token
#[inline]
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let mut ascii_count = 0u32;
    let mut cjk_count = 0u32;
    let mut other_count = 0u32;

    for c in text.chars() {
        if c.is_ascii() {
            ascii_count += 1;
        } else if is_cjk(c) {
            cjk_count += 1;
        } else {
            other_count += 1;
        }
    }

    let total = ascii_count as f32 / ASCII_CHARS_PER_TOKEN
        + cjk_count as f32 / CJK_CHARS_PER_TOKEN
        + other_count as f32 / OTHER_CHARS_PER_TOKEN;

    total.ceil() as usize
}

/// 추정 토큰 수가 예산에 맞는 최대 문자 접두사 길이 (바이트가 아닌 char 단위)
///
/// truncate 정책에서 남은 토큰 예산에 맞춰 내용을 자를 때 사용합니다.
pub fn prefix_chars_for_budget(text: &str, token_budget: usize) -> usize {
    if token_budget == 0 {
        return 0;
    }

    // 누적 추정이 예산을 넘기 직전까지의 문자 수를 단조 탐색
    let mut tokens = 0.0f32;
    for (count, c) in text.chars().enumerate() {
        tokens += if c.is_ascii() {
            1.0 / ASCII_CHARS_PER_TOKEN
        } else if is_cjk(c) {
            1.0 / CJK_CHARS_PER_TOKEN
        } else {
            1.0 / OTHER_CHARS_PER_TOKEN
        };
        if tokens.ceil() as usize > token_budget {
            return count;
        }
    }
    text.chars().count()
}

/// CJK 문자 범위 확인
#[inline]
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7AF}'   // 한글 음절
        | '\u{1100}'..='\u{11FF}' // 한글 자모
        | '\u{4E00}'..='\u{9FFF}' // CJK 통합 한자
        | '\u{3400}'..='\u{4DBF}' // CJK 확장 A
        | '\u{3040}'..='\u{30FF}' // 히라가나/가타카나
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_ascii_ratio() {
        // 40 ASCII chars -> 10 tokens
        let text = "a".repeat(40);
        assert_eq!(estimate_tokens(&text), 10);
    }

    #[test]
    fn test_deterministic() {
        let text = "fn main() { println!(\"hello\"); }";
        let first = estimate_tokens(text);
        for _ in 0..10 {
            assert_eq!(estimate_tokens(text), first);
        }
    }

    #[test]
    fn test_cjk_costs_more() {
        let ascii = "hello world!";
        let korean = "안녕하세요 세계!";
        // 글자 수는 비슷해도 CJK가 더 많은 토큰을 소비
        assert!(estimate_tokens(korean) > estimate_tokens(ascii));
    }

    #[test]
    fn test_prefix_fits_budget() {
        let text = "a".repeat(1000);
        let len = prefix_chars_for_budget(&text, 10);
        let prefix: String = text.chars().take(len).collect();
        assert!(estimate_tokens(&prefix) <= 10);
        // 예산을 낭비하지 않음
        assert!(len >= 36);
    }

    #[test]
    fn test_prefix_zero_budget() {
        assert_eq!(prefix_chars_for_budget("abc", 0), 0);
    }

    #[test]
    fn test_prefix_whole_text_when_cheap() {
        assert_eq!(prefix_chars_for_budget("abc", 100), 3);
    }
}
