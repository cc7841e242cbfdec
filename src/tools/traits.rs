use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    /// Pretty-printed upstream JSON.
    pub fn json(value: &Value) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(output) => Self {
                success: true,
                output,
                error: None,
            },
            Err(e) => Self::failure(format!("Failed to render response: {e}")),
        }
    }

    /// Failure wrapped as `{"error": "..."}` so callers always get JSON text.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let output = serde_json::to_string_pretty(&json!({ "error": message }))
            .unwrap_or_else(|_| format!("{{\"error\": {message:?}}}"));
        Self {
            success: false,
            output,
            error: Some(message),
        }
    }

    /// Collapse an adapter outcome into a result.
    pub fn from_outcome<E: std::fmt::Display>(outcome: Result<Value, E>) -> Self {
        match outcome {
            Ok(value) => Self::json(&value),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Description of a tool for the protocol layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Core tool trait: one per capability exposed over `tools/call`
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in `tools/call`)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult>;

    /// Get the full spec for registration
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
