//! Read-only resources: URI templates mapped onto single Toggl GET requests.
//!
//! The catalog is chosen by [`ResourceApi`]: the legacy v8 routes, or the v9
//! routes where project, client and task lookups are scoped to a workspace.
//! Reading a resource returns the upstream JSON pretty-printed, and upstream
//! failures propagate to the caller unchanged.

pub mod template;

pub use template::{TemplateError, UriTemplate};

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ResourceApi;
use crate::toggl::{ApiSurface, TogglClient, TogglError, TogglRequest};

pub const JSON_MIME_TYPE: &str = "application/json";

/// Static description of one resource.
struct ResourceSpec {
    uri: &'static str,
    name: &'static str,
    description: &'static str,
    surface: ApiSurface,
    /// Upstream path; `{param}` placeholders share names with the URI template.
    path: &'static str,
    query: &'static [(&'static str, &'static str)],
}

const ACTIVE_ONLY: &[(&str, &str)] = &[("active", "true")];

const V8_RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        uri: "me://",
        name: "current_user",
        description: "Get current user data",
        surface: ApiSurface::V8,
        path: "me",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://",
        name: "workspaces",
        description: "Get all workspaces for the current user",
        surface: ApiSurface::V8,
        path: "workspaces",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}",
        name: "workspace",
        description: "Get details for a specific workspace",
        surface: ApiSurface::V8,
        path: "workspaces/{workspace_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/users",
        name: "workspace_users",
        description: "Get all users in a workspace (requires admin access)",
        surface: ApiSurface::V8,
        path: "workspaces/{workspace_id}/users",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/clients",
        name: "workspace_clients",
        description: "Get all clients in a workspace",
        surface: ApiSurface::V8,
        path: "workspaces/{workspace_id}/clients",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/projects",
        name: "workspace_projects",
        description: "Get all active projects in a workspace",
        surface: ApiSurface::V8,
        path: "workspaces/{workspace_id}/projects",
        query: ACTIVE_ONLY,
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/tasks",
        name: "workspace_tasks",
        description: "Get all active tasks in a workspace (premium feature)",
        surface: ApiSurface::V8,
        path: "workspaces/{workspace_id}/tasks",
        query: ACTIVE_ONLY,
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/tags",
        name: "workspace_tags",
        description: "Get all tags in a workspace",
        surface: ApiSurface::V8,
        path: "workspaces/{workspace_id}/tags",
        query: &[],
    },
    ResourceSpec {
        uri: "time_entries://{time_entry_id}",
        name: "time_entry",
        description: "Get a specific time entry",
        surface: ApiSurface::V8,
        path: "time_entries/{time_entry_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "time-entries:/current",
        name: "current_time_entry",
        description: "Get the currently running time entry if any",
        surface: ApiSurface::V8,
        path: "time_entries/current",
        query: &[],
    },
    ResourceSpec {
        uri: "projects://{project_id}",
        name: "project",
        description: "Get details for a specific project",
        surface: ApiSurface::V8,
        path: "projects/{project_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "clients://{client_id}",
        name: "client",
        description: "Get details for a specific client",
        surface: ApiSurface::V8,
        path: "clients/{client_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "tags://{tag_id}",
        name: "tag",
        description: "Get details for a specific tag",
        surface: ApiSurface::V8,
        path: "tags/{tag_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "tasks://{task_id}",
        name: "task",
        description: "Get details for a specific task",
        surface: ApiSurface::V8,
        path: "tasks/{task_id}",
        query: &[],
    },
];

const V9_RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        uri: "me://",
        name: "current_user",
        description: "Get current user data",
        surface: ApiSurface::V9,
        path: "me",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://",
        name: "workspaces",
        description: "Get all workspaces for the current user",
        surface: ApiSurface::V9,
        path: "me/workspaces",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}",
        name: "workspace",
        description: "Get details for a specific workspace",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/users",
        name: "workspace_users",
        description: "Get all users in a workspace (requires admin access)",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/users",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/clients",
        name: "workspace_clients",
        description: "Get all clients in a workspace",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/clients",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/projects",
        name: "workspace_projects",
        description: "Get all active projects in a workspace",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/projects",
        query: ACTIVE_ONLY,
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/tasks",
        name: "workspace_tasks",
        description: "Get all active tasks in a workspace (premium feature)",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/tasks",
        query: ACTIVE_ONLY,
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/tags",
        name: "workspace_tags",
        description: "Get all tags in a workspace",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/tags",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/projects/{project_id}",
        name: "project",
        description: "Get details for a specific project",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/projects/{project_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/clients/{client_id}",
        name: "client",
        description: "Get details for a specific client",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/clients/{client_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "workspaces://{workspace_id}/projects/{project_id}/tasks/{task_id}",
        name: "task",
        description: "Get details for a specific task",
        surface: ApiSurface::V9,
        path: "workspaces/{workspace_id}/projects/{project_id}/tasks/{task_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "time_entries://",
        name: "time_entries",
        description: "Get recent time entries for the current user",
        surface: ApiSurface::V9,
        path: "me/time_entries",
        query: &[],
    },
    ResourceSpec {
        uri: "time_entries://{time_entry_id}",
        name: "time_entry",
        description: "Get a specific time entry",
        surface: ApiSurface::V9,
        path: "me/time_entries/{time_entry_id}",
        query: &[],
    },
    ResourceSpec {
        uri: "time-entries:/current",
        name: "current_time_entry",
        description: "Get the currently running time entry if any",
        surface: ApiSurface::V9,
        path: "me/time_entries/current",
        query: &[],
    },
];

/// `resources/list` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// `resources/templates/list` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDescriptor {
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// `resources/read` content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Unknown resource: {0}")]
    Unknown(String),
    #[error("Invalid parameter {name}: {value:?} is not a positive integer")]
    InvalidParameter { name: String, value: String },
    #[error(transparent)]
    Upstream(#[from] TogglError),
    #[error("Failed to render resource: {0}")]
    Render(#[source] serde_json::Error),
}

struct ResourceEntry {
    template: UriTemplate,
    spec: &'static ResourceSpec,
}

/// The resource catalog for one API generation, bound to a client.
pub struct ResourceCatalog {
    client: Arc<TogglClient>,
    api: ResourceApi,
    entries: Vec<ResourceEntry>,
}

impl ResourceCatalog {
    pub fn new(client: Arc<TogglClient>, api: ResourceApi) -> Self {
        let specs = match api {
            ResourceApi::V8 => V8_RESOURCES,
            ResourceApi::V9 => V9_RESOURCES,
        };

        let entries = specs
            .iter()
            .filter_map(|spec| match UriTemplate::parse(spec.uri) {
                Ok(template) => Some(ResourceEntry { template, spec }),
                Err(e) => {
                    tracing::error!(uri = spec.uri, "Skipping malformed resource template: {e}");
                    None
                }
            })
            .collect();

        Self {
            client,
            api,
            entries,
        }
    }

    pub fn api(&self) -> ResourceApi {
        self.api
    }

    /// Parameter-free resources.
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.template.is_concrete())
            .map(|e| ResourceDescriptor {
                uri: e.spec.uri.to_string(),
                name: e.spec.name.to_string(),
                description: e.spec.description.to_string(),
                mime_type: JSON_MIME_TYPE.to_string(),
            })
            .collect()
    }

    /// Parameterized resource templates.
    pub fn templates(&self) -> Vec<ResourceTemplateDescriptor> {
        self.entries
            .iter()
            .filter(|e| !e.template.is_concrete())
            .map(|e| ResourceTemplateDescriptor {
                uri_template: e.spec.uri.to_string(),
                name: e.spec.name.to_string(),
                description: e.spec.description.to_string(),
                mime_type: JSON_MIME_TYPE.to_string(),
            })
            .collect()
    }

    /// Map a URI to its upstream request without performing any I/O.
    pub fn resolve(&self, uri: &str) -> Result<TogglRequest, ResourceError> {
        let (entry, captures) = self
            .entries
            .iter()
            .filter_map(|e| e.template.matches(uri).map(|caps| (e, caps)))
            .max_by_key(|(e, _)| e.template.literal_len())
            .ok_or_else(|| ResourceError::Unknown(uri.to_string()))?;

        let path = render_path(entry.spec.path, &captures)?;
        let mut request = TogglRequest::get(self.client.url(entry.spec.surface, &path));
        for (key, value) in entry.spec.query {
            request = request.with_query(key, value);
        }
        Ok(request)
    }

    /// Resolve, fetch, and pretty-print one resource.
    pub async fn read(&self, uri: &str) -> Result<ResourceContents, ResourceError> {
        let request = self.resolve(uri)?;
        tracing::debug!(uri, url = %request.url, "Reading resource");
        let value = self.client.send(request).await?;
        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: JSON_MIME_TYPE.to_string(),
            text: render_json(&value)?,
        })
    }
}

/// Pretty-print with two-space indentation.
pub fn render_json(value: &Value) -> Result<String, ResourceError> {
    serde_json::to_string_pretty(value).map_err(ResourceError::Render)
}

fn render_path(path: &str, captures: &BTreeMap<String, String>) -> Result<String, ResourceError> {
    let mut rendered = path.to_string();
    for (name, value) in captures {
        let id = value
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ResourceError::InvalidParameter {
                name: name.clone(),
                value: value.clone(),
            })?;
        rendered = rendered.replace(&format!("{{{name}}}"), &id.to_string());
    }
    Ok(rendered)
}
