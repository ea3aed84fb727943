//! Import Expansion - 컨텍스트 파일 import 지시어 처리
//!
//! `@relative/path.md` 지시어를 참조 파일 내용으로 확장합니다.
//! - 경로는 지시어가 있는 파일의 디렉토리 기준
//! - 순환 참조는 방문 집합으로 감지하고 진단 주석으로 대체
//! - 재귀 깊이 상한이 2차 안전망
//! - 참조 파일 읽기 실패는 진단 주석으로 대체 (비치명적)

use anvil_foundation::ImportFormat;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

/// import 지시어 패턴: `@path/to/file.md`
fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // 공백 아닌 경로 문자들, .md로 끝나는 참조만
        Regex::new(r"@([A-Za-z0-9_\-./]+\.md)").expect("import pattern is valid")
    })
}

/// 파일 내용의 import 지시어를 모두 확장
///
/// `visited`는 현재 확장 경로(루트에서 이 파일까지)의 정규화된
/// 경로 집합입니다. 가지마다 복사되므로 형제 가지에서 같은 파일을
/// 다시 import하는 것은 허용되고, 순환만 차단됩니다.
pub fn expand_imports(
    content: &str,
    base_dir: &Path,
    format: ImportFormat,
    max_depth: usize,
) -> String {
    let visited = HashSet::new();
    expand_recursive(content, base_dir, format, &visited, 0, max_depth)
}

fn expand_recursive(
    content: &str,
    base_dir: &Path,
    format: ImportFormat,
    visited: &HashSet<PathBuf>,
    depth: usize,
    max_depth: usize,
) -> String {
    if depth >= max_depth {
        warn!("Import depth limit {} reached, leaving directives unexpanded", max_depth);
        return content.to_string();
    }

    let pattern = import_pattern();
    let mut result = String::with_capacity(content.len());
    let mut last_end = 0;

    for captures in pattern.captures_iter(content) {
        let whole = captures.get(0).expect("capture 0 always present");
        let relative = &captures[1];

        result.push_str(&content[last_end..whole.start()]);
        last_end = whole.end();

        let target = base_dir.join(relative);
        let canonical = match target.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                warn!("Cannot resolve import '{}': {}", target.display(), e);
                result.push_str(&format!("<!-- Import failed: {} -->", relative));
                continue;
            }
        };

        if visited.contains(&canonical) {
            warn!("Import cycle detected at '{}'", canonical.display());
            result.push_str(&format!("<!-- Import cycle detected: {} -->", relative));
            continue;
        }

        let imported = match std::fs::read_to_string(&canonical) {
            Ok(imported) => imported,
            Err(e) => {
                warn!("Cannot read import '{}': {}", canonical.display(), e);
                result.push_str(&format!("<!-- Import failed: {} -->", relative));
                continue;
            }
        };

        // 가지별 방문 집합 (값 복사) - 순환만 차단
        let mut branch_visited = visited.clone();
        branch_visited.insert(canonical.clone());

        let child_base = canonical.parent().unwrap_or(base_dir);
        let expanded = expand_recursive(
            &imported,
            child_base,
            format,
            &branch_visited,
            depth + 1,
            max_depth,
        );

        match format {
            ImportFormat::Flat => {
                result.push_str(&format!(
                    "--- File: {} ---\n{}\n--- End of File: {} ---",
                    relative,
                    expanded.trim_end(),
                    relative
                ));
            }
            ImportFormat::Tree => {
                result.push_str(&format!(
                    "<!-- Imported from: {} -->\n{}\n<!-- End of import from: {} -->",
                    relative,
                    expanded.trim_end(),
                    relative
                ));
            }
        }
    }

    result.push_str(&content[last_end..]);
    result
}

// ============================================================================
// 테스트
// ============================================================================
