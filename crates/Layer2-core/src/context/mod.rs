//! Context - 계층적 컨텍스트 수집
//!
//! 세션 시작 시 모델에게 전달할 메모리/지침 문서를 전역, 프로젝트,
//! 하위 디렉토리 계층에서 수집하고 import 지시어를 확장합니다.

mod imports;
mod resolver;

pub use imports::expand_imports;
pub use resolver::{ContextFile, HierarchicalContextResolver, ResolvedContext};
