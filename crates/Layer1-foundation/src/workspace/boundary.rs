//! Workspace Boundary - 작업 공간 경계 검사
//!
//! 에이전트가 조작할 수 있는 절대 경로 루트들의 집합입니다.
//! - 루트는 생성 시 한 번 정규화 (canonicalize)
//! - 후보 경로는 검사 시마다 정규화하여 `..` 우회와 심볼릭 링크 탈출 차단
//! - glob 확장/디렉토리 순회로 얻은 경로는 반드시 해석 후 검사해야 함
//!   (패턴이 절대 경로로 확장될 수 있으므로 사전 검사로는 불충분)

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// 작업 공간 경계
///
/// ## 사용법
/// ```ignore
/// let boundary = WorkspaceBoundary::new(vec![project_dir])?;
///
/// // 접근 전 검사 - 위반은 Error::Security
/// let canonical = boundary.check(&candidate)?;
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceBoundary {
    /// 정규화된 루트 디렉토리들 (1..N)
    roots: Vec<PathBuf>,
}

impl WorkspaceBoundary {
    /// 루트 집합으로 생성
    ///
    /// 각 루트는 존재하는 디렉토리여야 하며 생성 시 정규화됩니다.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self> {
        if roots.is_empty() {
            return Err(Error::Config(
                "workspace boundary requires at least one root".to_string(),
            ));
        }

        let mut canonical = Vec::with_capacity(roots.len());
        for root in roots {
            let resolved = root.canonicalize().map_err(|e| {
                Error::Config(format!(
                    "cannot resolve workspace root '{}': {}",
                    root.display(),
                    e
                ))
            })?;
            if !resolved.is_dir() {
                return Err(Error::Config(format!(
                    "workspace root is not a directory: {}",
                    resolved.display()
                )));
            }
            canonical.push(resolved);
        }

        Ok(Self { roots: canonical })
    }

    /// 단일 루트로 생성
    pub fn single(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(vec![root.into()])
    }

    /// 정규화된 루트들
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// 경로가 경계 안에 있는지 확인
    pub fn is_within(&self, path: &Path) -> bool {
        self.check(path).is_ok()
    }

    /// 경로를 정규화하여 경계 검사
    ///
    /// 통과 시 정규화된 경로를 반환하고, 위반 시 `Error::Security`를
    /// 반환합니다. 아직 존재하지 않는 경로(쓰기 대상)는 가장 가까운
    /// 실존 조상을 정규화한 뒤 나머지를 덧붙여 판정합니다.
    pub fn check(&self, path: &Path) -> Result<PathBuf> {
        if !path.is_absolute() {
            return Err(Error::Security(format!(
                "path must be absolute: {}",
                path.display()
            )));
        }

        let resolved = canonicalize_allow_missing(path)?;

        if self.roots.iter().any(|root| resolved.starts_with(root)) {
            Ok(resolved)
        } else {
            Err(Error::Security(format!(
                "path '{}' resolves outside the workspace (roots: {})",
                path.display(),
                self.roots
                    .iter()
                    .map(|r| r.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}

/// 존재하지 않는 꼬리를 허용하는 정규화
///
/// 경로 전체가 존재하면 canonicalize 결과를 그대로 사용합니다.
/// 일부만 존재하면 실존 조상까지 canonicalize하고, 남은 부분은
/// 어휘적으로 정규화하여 덧붙입니다.
fn canonicalize_allow_missing(path: &Path) -> Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }

    let normalized = normalize_lexical(path);

    let mut existing = normalized.as_path();
    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();

    loop {
        if existing.exists() {
            break;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            // 루트까지 왔는데도 실존하지 않음
            _ => {
                return Err(Error::Security(format!(
                    "cannot resolve path: {}",
                    path.display()
                )))
            }
        }
    }

    let mut resolved = existing.canonicalize().map_err(|e| {
        Error::Security(format!("cannot resolve path '{}': {}", path.display(), e))
    })?;
    for name in tail.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// 어휘적 경로 정규화 (canonicalize 없이 `.`/`..` 제거)
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                // ".." 이면 마지막 일반 컴포넌트 제거
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, WorkspaceBoundary) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        let boundary = WorkspaceBoundary::single(dir.path()).unwrap();
        (dir, boundary)
    }

    #[test]
    fn test_inside_path_accepted() {
        let (dir, boundary) = fixture();
        let inside = dir.path().join("src/main.rs");
        assert!(boundary.is_within(&inside));

        let canonical = boundary.check(&inside).unwrap();
        assert!(canonical.ends_with("src/main.rs"));
    }

    #[test]
    fn test_root_itself_accepted() {
        let (dir, boundary) = fixture();
        assert!(boundary.is_within(dir.path()));
    }

    #[test]
    fn test_dotdot_traversal_rejected() {
        let (dir, boundary) = fixture();
        let escape = dir.path().join("src/../../outside.txt");
        let result = boundary.check(&escape);
        assert!(matches!(result, Err(Error::Security(_))));
    }

    #[test]
    fn test_dotdot_staying_inside_accepted() {
        let (dir, boundary) = fixture();
        let inside = dir.path().join("src/../src/main.rs");
        assert!(boundary.is_within(&inside));
    }

    #[test]
    fn test_missing_write_target_accepted() {
        let (dir, boundary) = fixture();
        let new_file = dir.path().join("src/new_module.rs");
        assert!(boundary.is_within(&new_file));
    }

    #[test]
    fn test_relative_path_rejected() {
        let (_dir, boundary) = fixture();
        let result = boundary.check(Path::new("src/main.rs"));
        assert!(matches!(result, Err(Error::Security(_))));
    }

    #[test]
    fn test_outside_path_rejected() {
        let (_dir, boundary) = fixture();
        let other = TempDir::new().unwrap();
        let outside = other.path().join("secret.txt");
        std::fs::write(&outside, "x").unwrap();
        assert!(!boundary.is_within(&outside));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, boundary) = fixture();
        let other = TempDir::new().unwrap();
        let target = other.path().join("outside.txt");
        std::fs::write(&target, "secret").unwrap();

        let link = dir.path().join("sneaky.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        // 링크 자체는 루트 안이지만 해석 결과가 밖이므로 거부
        let result = boundary.check(&link);
        assert!(matches!(result, Err(Error::Security(_))));
    }

    #[test]
    fn test_multiple_roots() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let boundary =
            WorkspaceBoundary::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]).unwrap();

        std::fs::write(b.path().join("file.txt"), "x").unwrap();
        assert!(boundary.is_within(&b.path().join("file.txt")));
        assert_eq!(boundary.roots().len(), 2);
    }

    #[test]
    fn test_empty_roots_rejected() {
        let result = WorkspaceBoundary::new(Vec::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
