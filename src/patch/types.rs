//! Wire shapes of a PATCH request body.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `{ schemas: [urn], Operations: [{ op, path?, value? }] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRequest {
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

/// One add/replace/remove instruction. Never mutated after
/// deserialization; path qualification produces a new string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}

/// Recognized operation kinds. The wire `op` field compares
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOpKind {
    Add,
    Replace,
    Remove,
}

impl PatchOpKind {
    pub fn parse(op: &str) -> Option<Self> {
        match op.to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "replace" => Some(Self::Replace),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl PatchOperation {
    pub fn kind(&self) -> Option<PatchOpKind> {
        PatchOpKind::parse(&self.op)
    }

    /// The path with surrounding whitespace stripped, treating an empty
    /// string the same as an absent path.
    pub fn trimmed_path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
