//! Creating projects, clients and tags in a workspace.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::args::{self, ArgError};
use super::traits::{Tool, ToolResult};
use crate::toggl::{ApiSurface, TogglClient, TogglRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Project,
    Client,
    Tag,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [Self::Project, Self::Client, Self::Tag];

    fn collection(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Client => "clients",
            Self::Tag => "tags",
        }
    }
}

pub struct CreateTool {
    client: Arc<TogglClient>,
    kind: CatalogKind,
}

impl CreateTool {
    pub fn new(client: Arc<TogglClient>, kind: CatalogKind) -> Self {
        Self { client, kind }
    }

    pub fn build_request(&self, args: &Value) -> Result<TogglRequest, ArgError> {
        let workspace_id = args::require_id(args, "workspace_id")?;
        let name = args::require_str(args, "name")?;

        let mut body = Map::new();
        body.insert("name".into(), json!(name));
        if self.kind == CatalogKind::Project {
            if let Some(client_id) = args::optional_id(args, "client_id")? {
                body.insert("client_id".into(), json!(client_id));
            }
            if let Some(private) = args::optional_bool(args, "is_private")? {
                body.insert("is_private".into(), json!(private));
            }
            if let Some(color) = args::optional_str(args, "color")? {
                body.insert("color".into(), json!(color));
            }
            body.insert("active".into(), json!(true));
        }

        let path = format!("workspaces/{workspace_id}/{}", self.kind.collection());
        Ok(TogglRequest::post(self.client.url(ApiSurface::V9, &path)).with_body(Value::Object(body)))
    }
}

#[async_trait]
impl Tool for CreateTool {
    fn name(&self) -> &str {
        match self.kind {
            CatalogKind::Project => "create_project",
            CatalogKind::Client => "create_client",
            CatalogKind::Tag => "create_tag",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            CatalogKind::Project => "Create an active project in a workspace",
            CatalogKind::Client => "Create a client in a workspace",
            CatalogKind::Tag => "Create a tag in a workspace",
        }
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = json!({
            "workspace_id": {"type": "integer", "description": "Workspace to create in"},
            "name": {"type": "string"}
        });
        if self.kind == CatalogKind::Project {
            properties["client_id"] = json!({"type": "integer"});
            properties["is_private"] = json!({"type": "boolean"});
            properties["color"] = json!({"type": "string", "description": "Hex color, e.g. #06aaf5"});
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": ["workspace_id", "name"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        Ok(super::run_request(&self.client, self.build_request(&args)).await)
    }
}
