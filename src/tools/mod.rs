//! Tools exposed over `tools/call`.
//!
//! Each tool implements the [`Tool`] trait defined in [`traits`]: a name,
//! description, JSON parameter schema, and an async `execute` that returns a
//! [`ToolResult`]. Every tool turns its arguments into one
//! [`TogglRequest`](crate::toggl::TogglRequest) and sends it through the shared
//! [`TogglClient`]. Argument and upstream failures never escape `execute`; they
//! come back as `{"error": ...}` results.
//!
//! [`default_tools`] assembles the registry served by the MCP layer.

pub mod args;
pub mod catalog;
pub mod insights;
pub mod reports;
pub mod time_entries;
pub mod traits;
pub mod webhooks;

pub use catalog::{CatalogKind, CreateTool};
pub use insights::{InsightKind, InsightsTool};
pub use reports::{ReportKind, ReportsV2Tool, ReportsV3Tool};
pub use time_entries::{TimeEntryAction, TimeEntryTool};
pub use traits::Tool;
#[allow(unused_imports)]
pub use traits::{ToolResult, ToolSpec};
pub use webhooks::WebhookSubscriptionsTool;

use crate::toggl::{TogglClient, TogglRequest};
use args::ArgError;
use std::sync::Arc;

/// Create the full tool registry, in listing order.
pub fn default_tools(client: Arc<TogglClient>) -> Vec<Box<dyn Tool>> {
    let mut tools: Vec<Box<dyn Tool>> = Vec::new();
    for kind in ReportKind::ALL {
        tools.push(Box::new(ReportsV2Tool::new(client.clone(), kind)));
    }
    tools.push(Box::new(WebhookSubscriptionsTool::new(client.clone())));
    for kind in ReportKind::ALL {
        tools.push(Box::new(ReportsV3Tool::new(client.clone(), kind)));
    }
    for kind in InsightKind::ALL {
        tools.push(Box::new(InsightsTool::new(client.clone(), kind)));
    }
    for action in TimeEntryAction::ALL {
        tools.push(Box::new(TimeEntryTool::new(client.clone(), action)));
    }
    for kind in CatalogKind::ALL {
        tools.push(Box::new(CreateTool::new(client.clone(), kind)));
    }
    tools
}

/// Send a built request and fold both failure paths into the result.
pub(crate) async fn run_request(
    client: &TogglClient,
    built: Result<TogglRequest, ArgError>,
) -> ToolResult {
    match built {
        Ok(request) => ToolResult::from_outcome(client.send(request).await),
        Err(e) => ToolResult::failure(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toggl::ApiBase;
    use std::collections::HashSet;

    fn tools() -> Vec<Box<dyn Tool>> {
        default_tools(Arc::new(TogglClient::new(None, ApiBase::default(), "TogglMCP")))
    }

    #[test]
    fn default_tools_has_expected_count() {
        assert_eq!(tools().len(), 18);
    }

    #[test]
    fn default_tools_names() {
        let tools = tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        for expected in [
            "get_weekly_report",
            "get_detailed_report",
            "get_summary_report",
            "get_webhook_subscriptions",
            "get_summary_report_v3",
            "get_trends",
            "start_time_entry",
            "create_tag",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len(), "duplicate tool names");
    }

    #[test]
    fn default_tools_all_have_descriptions() {
        for tool in &tools() {
            assert!(
                !tool.description().is_empty(),
                "Tool {} has empty description",
                tool.name()
            );
        }
    }

    #[test]
    fn default_tools_all_have_schemas() {
        for tool in &tools() {
            let schema = tool.parameters_schema();
            assert_eq!(schema["type"], "object", "Tool {} schema type", tool.name());
            assert!(
                schema["properties"].is_object(),
                "Tool {} schema has no properties",
                tool.name()
            );
            if let Some(required) = schema["required"].as_array() {
                for key in required {
                    let key = key.as_str().unwrap();
                    assert!(
                        schema["properties"].get(key).is_some(),
                        "Tool {} requires undeclared {key}",
                        tool.name()
                    );
                }
            }
        }
    }

    #[test]
    fn tool_spec_generation() {
        for tool in &tools() {
            let spec = tool.spec();
            assert_eq!(spec.name, tool.name());
            assert_eq!(spec.description, tool.description());
            assert!(spec.parameters.is_object());
        }
    }

    #[test]
    fn tool_result_serde() {
        let result = ToolResult {
            success: true,
            output: "hello".into(),
            error: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ToolResult = serde_json::from_str(&json).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.output, "hello");
    }

    #[test]
    fn failure_output_is_error_object() {
        let result = ToolResult::failure("boom");
        let parsed: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(parsed, serde_json::json!({"error": "boom"}));
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn missing_credentials_become_wrapped_error() {
        let tools = tools();
        let tool = tools
            .iter()
            .find(|t| t.name() == "get_current_time_entry")
            .unwrap();
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("API token not configured"));
    }
}
