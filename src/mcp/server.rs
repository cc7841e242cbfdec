//! Request dispatch for the MCP method table.

use serde_json::{json, Value};
use std::sync::Arc;

use super::protocol::{
    CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpPrompt, McpTool,
    PromptMessage, ServerCapabilities, TextContent, JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::config::Config;
use crate::prompts::{self, Prompt, PromptError};
use crate::resources::{ResourceCatalog, ResourceContents, ResourceError};
use crate::toggl::TogglClient;
use crate::tools::args::Now;
use crate::tools::{self, Tool, ToolResult};

pub const SERVER_NAME: &str = "Toggl API";

/// Immutable after construction; transports share it behind an `Arc`.
pub struct McpServer {
    tools: Vec<Box<dyn Tool>>,
    resources: ResourceCatalog,
}

impl McpServer {
    pub fn new(client: Arc<TogglClient>, resources: ResourceCatalog) -> Self {
        Self {
            tools: tools::default_tools(client),
            resources,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = Arc::new(TogglClient::from_config(&config.toggl));
        if !client.has_credentials() {
            tracing::warn!("No Toggl credentials configured; upstream calls will fail");
        }
        let resources = ResourceCatalog::new(client.clone(), config.toggl.resource_api);
        Self::new(client, resources)
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn resources(&self) -> &ResourceCatalog {
        &self.resources
    }

    /// Decode one frame and dispatch it. `None` means nothing is sent back.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(format!("Parse error: {e}")),
                ))
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {e}")),
                ))
            }
        };
        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request
            .jsonrpc
            .as_deref()
            .is_some_and(|v| v != JSONRPC_VERSION)
        {
            let id = request.id?;
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request("Invalid request: jsonrpc must be \"2.0\""),
            ));
        }

        tracing::debug!(method = %request.method, notification = request.is_notification(), "MCP request");
        let params = request.params.unwrap_or(Value::Null);

        let Some(id) = request.id else {
            if !request.method.starts_with("notifications/") {
                tracing::debug!(method = %request.method, "Ignoring notification for a request method");
            }
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool_params(&params).await,
            "resources/list" => Ok(json!({ "resources": self.resources.descriptors() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": self.resources.templates() }))
            }
            "resources/read" => self.read_resource_params(&params).await,
            "prompts/list" => Ok(self.list_prompts()),
            "prompts/get" => self.get_prompt_params(&params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::all(),
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<McpTool> = self
            .tools
            .iter()
            .map(|tool| {
                let spec = tool.spec();
                McpTool {
                    name: spec.name,
                    description: spec.description,
                    input_schema: spec.parameters,
                }
            })
            .collect();
        json!({ "tools": tools })
    }

    fn list_prompts(&self) -> Value {
        let prompts: Vec<McpPrompt> = Prompt::ALL
            .into_iter()
            .map(|p| McpPrompt {
                name: p.name().to_string(),
                description: p.description().to_string(),
                arguments: p.arguments(),
            })
            .collect();
        json!({ "prompts": prompts })
    }

    /// Run a tool by name. Tool failures come back inside the result.
    pub async fn call_tool(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tool = self.tools.iter().find(|t| t.name() == name)?;
        tracing::info!(tool = name, "Calling tool");
        let result = match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => ToolResult::failure(e.to_string()),
        };
        if !result.success {
            tracing::warn!(tool = name, error = result.error.as_deref().unwrap_or(""), "Tool failed");
        }
        Some(result)
    }

    async fn call_tool_params(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;
        let args = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args @ Value::Object(_)) => args.clone(),
            Some(_) => return Err(JsonRpcError::invalid_params("Tool arguments must be an object")),
        };
        let result = self
            .call_tool(name, args)
            .await
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {name}")))?;
        let payload = CallToolResult {
            content: vec![TextContent::new(result.output)],
            is_error: !result.success,
        };
        serde_json::to_value(payload).map_err(|e| JsonRpcError::internal(e.to_string()))
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContents, ResourceError> {
        self.resources.read(uri).await
    }

    async fn read_resource_params(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing resource uri"))?;
        let contents = self.read_resource(uri).await.map_err(|e| {
            tracing::warn!(uri, "Resource read failed: {e}");
            resource_error(&e)
        })?;
        Ok(json!({ "contents": [contents] }))
    }

    /// Render a prompt against this server's resource catalog.
    pub fn get_prompt(&self, name: &str, args: &Value) -> Result<String, PromptError> {
        prompts::render(name, args, Now::current().today, self.resources.api())
    }

    fn get_prompt_params(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing prompt name"))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let text = self
            .get_prompt(name, &args)
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
        let description = Prompt::from_name(name).map_or("", Prompt::description);
        let message = PromptMessage {
            role: "user",
            content: TextContent::new(text),
        };
        Ok(json!({ "description": description, "messages": [message] }))
    }
}

fn resource_error(error: &ResourceError) -> JsonRpcError {
    match error {
        ResourceError::Unknown(_) | ResourceError::InvalidParameter { .. } => {
            JsonRpcError::invalid_params(error.to_string())
        }
        ResourceError::Upstream(_) | ResourceError::Render(_) => JsonRpcError::internal(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceApi;
    use crate::mcp::protocol::{INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use crate::toggl::ApiBase;

    fn offline_server() -> McpServer {
        let client = Arc::new(TogglClient::new(None, ApiBase::default(), "TogglMCP"));
        let resources = ResourceCatalog::new(client.clone(), ResourceApi::V9);
        McpServer::new(client, resources)
    }

    async fn call(server: &McpServer, frame: Value) -> JsonRpcResponse {
        server
            .handle_message(&frame.to_string())
            .await
            .expect("expected a response")
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_capabilities() {
        let server = offline_server();
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = offline_server();
        let frame = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.handle_message(&frame.to_string()).await.is_none());
        let frame = json!({"jsonrpc": "2.0", "method": "ping"});
        assert!(server.handle_message(&frame.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let server = offline_server();
        let response = call(&server, json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(response.id, json!("p"));
        assert_eq!(response.result, Some(json!({})));
    }

    #[tokio::test]
    async fn malformed_frames_map_to_standard_codes() {
        let server = offline_server();
        let parse = server.handle_message("{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, PARSE_ERROR);
        assert_eq!(parse.id, Value::Null);

        let invalid = call(&server, json!({"jsonrpc": "2.0", "id": 4})).await;
        assert_eq!(invalid.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(invalid.id, json!(4));

        let wrong_version = call(&server, json!({"jsonrpc": "1.0", "id": 5, "method": "ping"})).await;
        assert_eq!(wrong_version.error.unwrap().code, INVALID_REQUEST);

        let unknown = call(&server, json!({"jsonrpc": "2.0", "id": 6, "method": "nope"})).await;
        assert_eq!(unknown.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_list_uses_input_schema() {
        let server = offline_server();
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), server.tools().len());
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
        assert!(tools.iter().any(|t| t["name"] == "get_weekly_report"));
    }

    #[tokio::test]
    async fn tools_call_wraps_failures() {
        let server = offline_server();
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "get_weekly_report", "arguments": {}}}),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["error"], "Missing required argument: workspace_id");
    }

    #[tokio::test]
    async fn tools_call_unknown_tool_is_invalid_params() {
        let server = offline_server();
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "rm_rf"}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn resources_read_errors_propagate() {
        let server = offline_server();
        let unknown = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "resources/read", "params": {"uri": "bogus://x"}}),
        )
        .await;
        assert_eq!(unknown.error.unwrap().code, INVALID_PARAMS);

        // No credentials: the upstream call fails before any I/O.
        let upstream = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/read", "params": {"uri": "me://"}}),
        )
        .await;
        let error = upstream.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert!(error.message.contains("API token not configured"));
    }

    #[tokio::test]
    async fn resource_listings_are_camel_case() {
        let server = offline_server();
        let list = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"})).await;
        let resources = list.result.unwrap()["resources"].as_array().unwrap().clone();
        assert!(resources.iter().all(|r| r["mimeType"] == "application/json"));

        let templates = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/templates/list"}),
        )
        .await;
        let templates = templates.result.unwrap()["resourceTemplates"].as_array().unwrap().clone();
        assert!(templates
            .iter()
            .any(|t| t["uriTemplate"] == "workspaces://{workspace_id}/projects"));
    }

    #[tokio::test]
    async fn prompts_list_and_get() {
        let server = offline_server();
        let list = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/list"})).await;
        let prompts = list.result.unwrap()["prompts"].as_array().unwrap().clone();
        assert_eq!(prompts.len(), Prompt::ALL.len());
        assert_eq!(prompts[0]["arguments"][0]["required"], true);

        let get = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "prompts/get", "params": {"name": "project_analysis", "arguments": {"project_id": "11", "workspace_id": "5"}}}),
        )
        .await;
        let result = get.result.unwrap();
        assert_eq!(result["messages"][0]["role"], "user");
        assert_eq!(result["messages"][0]["content"]["type"], "text");
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("- workspaces://5/projects/11\n"), "{text}");
        assert!(server.resources().resolve("workspaces://5/projects/11").is_ok());

        let missing = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/get", "params": {"name": "project_analysis"}}),
        )
        .await;
        assert_eq!(missing.error.unwrap().code, INVALID_PARAMS);
    }
}
