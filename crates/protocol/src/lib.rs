//! JSON payloads shared by the command-line and any other front end.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Machine-readable error codes
pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const PERSISTENCE: &str = "persistence_failure";
    pub const INTERNAL: &str = "internal";
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.code == codes::NOT_FOUND
    }
}

/// Confirmation returned after a repository's outputs were removed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
    pub removed: String,
}

impl ClearCacheResponse {
    pub fn new(repo_name: &str, removed: impl Into<String>) -> Self {
        Self {
            success: true,
            message: format!("Cache cleared for repository '{repo_name}'"),
            removed: removed.into(),
        }
    }
}

pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Two-space indented JSON, the format of every persisted artifact
pub fn serialize_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn error_envelope_omits_empty_fields() {
        let envelope = ErrorEnvelope::new(codes::INVALID_REQUEST, "depth must be within 1..=10");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"code": "invalid_request", "message": "depth must be within 1..=10"})
        );
    }

    #[test]
    fn not_found_envelope_carries_details() {
        let envelope = ErrorEnvelope::new(codes::NOT_FOUND, "Function 'x' not found in CCG")
            .with_details(json!({"candidates": ["a.py:f"]}));
        assert!(envelope.is_not_found());
        let text = serialize_json(&envelope).unwrap();
        assert!(text.contains("\"candidates\":[\"a.py:f\"]"));
    }

    #[test]
    fn clear_cache_message_names_the_repo() {
        let response = ClearCacheResponse::new("demo", "outputs/demo");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": true,
                "message": "Cache cleared for repository 'demo'",
                "removed": "outputs/demo"
            })
        );
    }

    #[test]
    fn pretty_output_uses_two_space_indent() {
        let text = serialize_json_pretty(&json!({"nodes": [1]})).unwrap();
        assert_eq!(text, "{\n  \"nodes\": [\n    1\n  ]\n}");
    }
}
