use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::args::{self, ArgError};
use super::traits::{Tool, ToolResult};
use crate::toggl::{ApiSurface, TogglClient, TogglRequest};

/// Lists webhook subscriptions for a workspace.
///
/// The webhooks API identifies callers by `User-Agent`, so the caller's
/// agent string replaces the client default for this request.
pub struct WebhookSubscriptionsTool {
    client: Arc<TogglClient>,
}

impl WebhookSubscriptionsTool {
    pub fn new(client: Arc<TogglClient>) -> Self {
        Self { client }
    }

    pub fn build_request(&self, args: &Value) -> Result<TogglRequest, ArgError> {
        let workspace_id = args::require_id(args, "workspace_id")?;
        let user_agent = args::optional_str(args, "user_agent")?
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(self.client.user_agent())
            .to_string();
        let path = format!("subscriptions/{workspace_id}");
        Ok(TogglRequest::get(self.client.url(ApiSurface::Webhooks, &path)).with_user_agent(user_agent))
    }
}

#[async_trait]
impl Tool for WebhookSubscriptionsTool {
    fn name(&self) -> &str {
        "get_webhook_subscriptions"
    }

    fn description(&self) -> &str {
        "List available webhook subscriptions for a workspace"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workspace_id": {"type": "integer", "description": "Workspace that owns the subscriptions"},
                "user_agent": {"type": "string", "description": "Sent as the User-Agent header (default: TogglMCP)"}
            },
            "required": ["workspace_id"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        Ok(super::run_request(&self.client, self.build_request(&args)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointsConfig;
    use crate::toggl::{ApiBase, Credentials};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn user_agent_defaults_to_client_agent() {
        let client = Arc::new(TogglClient::new(None, ApiBase::default(), "TogglMCP"));
        let tool = WebhookSubscriptionsTool::new(client);
        let request = tool.build_request(&json!({"workspace_id": "12"})).unwrap();
        assert_eq!(
            request.url,
            "https://track.toggl.com/webhooks/api/v1/subscriptions/12"
        );
        assert_eq!(request.user_agent.as_deref(), Some("TogglMCP"));
        assert!(request.query.is_empty());
    }

    #[tokio::test]
    async fn execute_sends_custom_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/webhooks/api/v1/subscriptions/12"))
            .and(header("user-agent", "ops@example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"subscription_id": 1, "enabled": true}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiBase::from_config(&EndpointsConfig::with_host(&server.uri()));
        let client = Arc::new(TogglClient::new(
            Some(Credentials::api_token("tok")),
            api,
            "TogglMCP",
        ));
        let result = WebhookSubscriptionsTool::new(client)
            .execute(json!({"workspace_id": 12, "user_agent": "ops@example.com"}))
            .await
            .unwrap();
        assert!(result.success);
        let parsed: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(parsed[0]["subscription_id"], 1);
    }

    #[tokio::test]
    async fn missing_workspace_is_wrapped_error() {
        let client = Arc::new(TogglClient::new(None, ApiBase::default(), "TogglMCP"));
        let result = WebhookSubscriptionsTool::new(client)
            .execute(json!({}))
            .await
            .unwrap();
        assert!(!result.success);
        let parsed: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(parsed["error"], "Missing required argument: workspace_id");
    }
}
