//! Tool Registry - 도구 등록 및 호출
//!
//! 세션이 사용하는 모든 도구를 관리합니다.
//!
//! ## 기능
//! - 도구 등록/조회 (중복 등록은 에러 - 조용한 덮어쓰기 금지)
//! - Builtin 도구 자동 등록
//! - 모델용 스키마/정의 목록 (capability advertisement)
//! - validate → build → execute 파이프라인 실행
//!
//! ## Layer1 연동
//! - `DeclarativeTool` trait으로 모든 도구 통합

use super::builtin;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, Result, ToolEnv, ToolOutput,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// 도구 레지스트리
///
/// ## 사용법
/// ```ignore
/// let registry = ToolRegistry::with_builtins()?;
///
/// let tool = registry.get("read")?;
/// tool.validate(&params)?;
/// let invocation = tool.build(params, &env)?;
/// let output = invocation.execute(&cancel).await?;
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn DeclarativeTool>>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Builtin 도구들을 포함한 레지스트리 생성
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for tool in builtin::all_tools() {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// 도구 등록
    ///
    /// 같은 이름이 이미 있으면 `Error::ToolAlreadyRegistered`.
    /// 이름 충돌은 등록 순서에 따라 모델에 광고되는 도구가 달라지는
    /// 문제이므로 조용히 덮어쓰지 않습니다.
    pub fn register(&mut self, tool: Arc<dyn DeclarativeTool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::ToolAlreadyRegistered(name));
        }
        debug!("Registered tool '{}'", name);
        self.tools.insert(name, tool);
        Ok(())
    }

    /// 여러 도구 한번에 등록
    pub fn register_all(&mut self, tools: Vec<Arc<dyn DeclarativeTool>>) -> Result<()> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    /// 도구 조회
    pub fn get(&self, name: &str) -> Result<Arc<dyn DeclarativeTool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    /// 도구 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 모든 도구 이름 (정렬됨)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// 도구 개수
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 도구 목록 (이름, 설명)
    pub fn list(&self) -> Vec<(&str, String)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.as_str(), tool.meta().description.clone()))
            .collect()
    }

    /// JSON Schema 형식으로 모든 도구 정보 반환 (모델 광고용)
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let meta = tool.meta();
                let schema = tool.schema();
                serde_json::json!({
                    "name": meta.name,
                    "description": meta.description,
                    "input_schema": schema
                })
            })
            .collect()
    }

    /// 도구 정의 목록 반환
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let meta = tool.meta();
                let schema = tool.schema();
                ToolDefinition {
                    name: meta.name.clone(),
                    description: meta.description.clone(),
                    parameters: ToolParameters {
                        schema_type: "object".to_string(),
                        properties: schema.get("properties").cloned().unwrap_or_default(),
                        required: schema
                            .get("required")
                            .and_then(|v| v.as_array())
                            .map(|arr| {
                                arr.iter()
                                    .filter_map(|v| v.as_str().map(String::from))
                                    .collect()
                            })
                            .unwrap_or_default(),
                    },
                }
            })
            .collect()
    }

    /// 카테고리별 도구 목록
    pub fn by_category(&self) -> HashMap<String, Vec<Arc<dyn DeclarativeTool>>> {
        let mut result: HashMap<String, Vec<Arc<dyn DeclarativeTool>>> = HashMap::new();
        for tool in self.tools.values() {
            let category = tool.meta().category.clone();
            result.entry(category).or_default().push(Arc::clone(tool));
        }
        result
    }

    /// 도구 호출 파이프라인 실행
    ///
    /// validate → build → execute 를 순서대로 수행합니다.
    /// 검증 실패는 build에 도달하지 않고, build는 I/O 없이 끝납니다.
    pub async fn invoke(
        &self,
        name: &str,
        params: serde_json::Value,
        env: &ToolEnv,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput> {
        let start = Instant::now();

        let tool = self.get(name)?;
        tool.validate(&params)?;
        let invocation = tool.build(params, env)?;

        debug!(
            session = %env.session_id,
            tool = name,
            "Invoking: {}",
            invocation.description()
        );

        let result = invocation.execute(cancel).await;

        debug!(
            session = %env.session_id,
            tool = name,
            "Tool '{}' finished in {}ms, success: {}",
            name,
            start.elapsed().as_millis(),
            result.is_ok()
        );

        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 도구 정의 (모델 광고용)
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

/// 도구 파라미터 정의
#[derive(Debug, Clone)]
pub struct ToolParameters {
    pub schema_type: String,
    pub properties: serde_json::Value,
    pub required: Vec<String>,
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = ToolRegistry::with_builtins().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.contains("read"));
        assert!(registry.contains("shell"));
    }

    #[test]
    fn test_registry_get() {
        let registry = ToolRegistry::with_builtins().unwrap();
        let read = registry.get("read").unwrap();
        assert_eq!(read.name(), "read");
    }

    #[test]
    fn test_get_unknown_tool_errors() {
        let registry = ToolRegistry::new();
        let result = registry.get("nonexistent");
        assert!(matches!(result, Err(Error::ToolNotFound(_))));
    }

    #[test]
    fn test_duplicate_registration_errors() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(crate::tool::builtin::read::ReadTool::new()))
            .unwrap();

        let result = registry.register(Arc::new(crate::tool::builtin::read::ReadTool::new()));
        assert!(matches!(result, Err(Error::ToolAlreadyRegistered(_))));
        // 원래 등록은 유지됨
        assert!(registry.contains("read"));
    }

    #[test]
    fn test_registry_schemas() {
        let registry = ToolRegistry::with_builtins().unwrap();
        let schemas = registry.schemas();
        assert!(!schemas.is_empty());

        // 각 스키마는 name, description, input_schema를 가져야 함
        for schema in schemas {
            assert!(schema.get("name").is_some());
            assert!(schema.get("description").is_some());
            assert!(schema.get("input_schema").is_some());
        }
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry = ToolRegistry::with_builtins().unwrap();
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_registry_by_category() {
        let registry = ToolRegistry::with_builtins().unwrap();
        let by_cat = registry.by_category();
        assert!(by_cat.contains_key("filesystem"));
    }
}
