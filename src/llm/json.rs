//! Helpers for validating JSON-mode responses

use super::{LLMError, Result};

/// Remove markdown code fences (```json / ```) around a model response.
///
/// Idempotent: stripping an already stripped string returns it unchanged.
pub fn strip_code_fences(response: &str) -> String {
    response.replace("```json", "").replace("```", "").trim().to_string()
}

/// Check that a stripped response is non-empty, parseable JSON
pub fn validate_json(cleaned: &str) -> Result<serde_json::Value> {
    if cleaned.is_empty() {
        return Err(LLMError::InvalidStructuredOutput("Empty response".to_string()));
    }

    serde_json::from_str(cleaned).map_err(|e| LLMError::InvalidStructuredOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let wrapped = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(wrapped), "{\"a\":1}");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let wrapped = "```json\n{\"a\":1}\n```";
        let once = strip_code_fences(wrapped);
        assert_eq!(strip_code_fences(&once), once);
    }

    #[test]
    fn test_strip_bare_fence_and_whitespace() {
        assert_eq!(strip_code_fences("  ```\n[1, 2]\n```  "), "[1, 2]");
        assert_eq!(strip_code_fences("{\"ok\":true}"), "{\"ok\":true}");
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(matches!(
            validate_json("not json"),
            Err(LLMError::InvalidStructuredOutput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let err = validate_json("").unwrap_err();
        assert!(err.to_string().contains("Empty response"));
    }

    #[test]
    fn test_validate_accepts_array() {
        let value = validate_json("[{\"question\":\"q\"}]").unwrap();
        assert!(value.is_array());
    }
}
