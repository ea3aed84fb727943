//! Schema Validation - 파라미터 구조 검증
//!
//! 도구가 광고한 JSON 스키마에 대해 입력 파라미터의 구조를
//! 검사합니다. 지원 범위는 도구 스키마에 실제로 쓰이는 부분입니다:
//! object/array/string/boolean/number/integer 타입, required 목록,
//! 중첩 properties/items. 선언되지 않은 키는 허용합니다.
//!
//! 실패는 필드 경로를 담은 `Error::Validation`입니다.

use crate::error::{Error, Result};
use serde_json::Value;

/// 스키마에 대한 구조 검증
pub fn validate_against_schema(schema: &Value, params: &Value) -> Result<()> {
    validate_node(schema, params, "")
}

fn validate_node(schema: &Value, value: &Value, path: &str) -> Result<()> {
    let schema_obj = match schema.as_object() {
        Some(obj) => obj,
        // 스키마가 객체가 아니면 검사할 제약이 없음
        None => return Ok(()),
    };

    if let Some(expected) = schema_obj.get("type").and_then(Value::as_str) {
        check_type(expected, value, path)?;
    }

    // required 목록 (object 타입)
    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            let present = value.get(name).map(|v| !v.is_null()).unwrap_or(false);
            if !present {
                return Err(Error::Validation(format!(
                    "missing required field '{}'",
                    join_path(path, name)
                )));
            }
        }
    }

    // 중첩 properties
    if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
        for (name, sub_schema) in properties {
            if let Some(sub_value) = value.get(name) {
                if !sub_value.is_null() {
                    validate_node(sub_schema, sub_value, &join_path(path, name))?;
                }
            }
        }
    }

    // 배열 items
    if let (Some(items), Some(elements)) = (schema_obj.get("items"), value.as_array()) {
        for (i, element) in elements.iter().enumerate() {
            validate_node(items, element, &format!("{}[{}]", path, i))?;
        }
    }

    Ok(())
}

fn check_type(expected: &str, value: &Value, path: &str) -> Result<()> {
    let ok = match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        // integer는 f64로 들어와도 정수값이면 허용
        "integer" => value.is_i64() || value.is_u64(),
        _ => true,
    };

    if ok {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "field '{}' expects type {}, got {}",
            if path.is_empty() { "<root>" } else { path },
            expected,
            type_name(value)
        )))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string" },
                "offset": { "type": "integer" },
                "limit": { "type": "integer" }
            },
            "required": ["file_path"]
        })
    }

    #[test]
    fn test_valid_params_pass() {
        let params = json!({ "file_path": "/tmp/a.txt", "offset": 10 });
        assert!(validate_against_schema(&read_schema(), &params).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let params = json!({ "offset": 10 });
        let err = validate_against_schema(&read_schema(), &params).unwrap_err();
        assert!(err.to_string().contains("file_path"));
    }

    #[test]
    fn test_wrong_type_reports_path() {
        let params = json!({ "file_path": 42 });
        let err = validate_against_schema(&read_schema(), &params).unwrap_err();
        assert!(err.to_string().contains("file_path"));
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let params = json!({ "file_path": "/tmp/a.txt", "extra": true });
        assert!(validate_against_schema(&read_schema(), &params).is_ok());
    }

    #[test]
    fn test_null_treated_as_missing() {
        let params = json!({ "file_path": null });
        assert!(validate_against_schema(&read_schema(), &params).is_err());
    }

    #[test]
    fn test_array_items_validated() {
        let schema = json!({
            "type": "object",
            "properties": {
                "patterns": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["patterns"]
        });

        let good = json!({ "patterns": ["src/**", "*.md"] });
        assert!(validate_against_schema(&schema, &good).is_ok());

        let bad = json!({ "patterns": ["src/**", 3] });
        let err = validate_against_schema(&schema, &bad).unwrap_err();
        assert!(err.to_string().contains("patterns[1]"));
    }

    #[test]
    fn test_nested_object() {
        let schema = json!({
            "type": "object",
            "properties": {
                "options": {
                    "type": "object",
                    "properties": { "depth": { "type": "integer" } },
                    "required": ["depth"]
                }
            }
        });

        let bad = json!({ "options": {} });
        let err = validate_against_schema(&schema, &bad).unwrap_err();
        assert!(err.to_string().contains("options.depth"));
    }
}
