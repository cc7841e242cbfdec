//! Timer control against the v9 time entry endpoints.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::args::{self, ArgError, Now};
use super::traits::{Tool, ToolResult};
use crate::toggl::{ApiSurface, TogglClient, TogglRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEntryAction {
    Current,
    List,
    Start,
    Stop,
    Delete,
}

impl TimeEntryAction {
    pub const ALL: [TimeEntryAction; 5] = [
        Self::Current,
        Self::List,
        Self::Start,
        Self::Stop,
        Self::Delete,
    ];
}

pub struct TimeEntryTool {
    client: Arc<TogglClient>,
    action: TimeEntryAction,
}

impl TimeEntryTool {
    pub fn new(client: Arc<TogglClient>, action: TimeEntryAction) -> Self {
        Self { client, action }
    }

    fn v9(&self, path: &str) -> String {
        self.client.url(ApiSurface::V9, path)
    }

    pub fn build_request(&self, args: &Value, now: Now) -> Result<TogglRequest, ArgError> {
        match self.action {
            TimeEntryAction::Current => Ok(TogglRequest::get(self.v9("me/time_entries/current"))),
            TimeEntryAction::List => {
                let start = args::optional_date(args, "start_date")?;
                let end = args::optional_date(args, "end_date")?;
                if let (Some(start), Some(end)) = (start, end) {
                    if start > end {
                        return Err(ArgError::Invalid {
                            key: "start_date".into(),
                            expected: "a date on or before the end date",
                        });
                    }
                }
                Ok(TogglRequest::get(self.v9("me/time_entries"))
                    .with_optional_query("start_date", start.map(|d| d.format("%Y-%m-%d")))
                    .with_optional_query("end_date", end.map(|d| d.format("%Y-%m-%d"))))
            }
            TimeEntryAction::Start => {
                let workspace_id = args::require_id(args, "workspace_id")?;
                let mut body = Map::new();
                body.insert("workspace_id".into(), json!(workspace_id));
                if let Some(description) = args::optional_str(args, "description")? {
                    body.insert("description".into(), json!(description));
                }
                if let Some(project_id) = args::optional_id(args, "project_id")? {
                    body.insert("project_id".into(), json!(project_id));
                }
                if let Some(tags) = args::optional_string_list(args, "tags")? {
                    body.insert("tags".into(), json!(tags));
                }
                if let Some(billable) = args::optional_bool(args, "billable")? {
                    body.insert("billable".into(), json!(billable));
                }
                body.insert(
                    "start".into(),
                    json!(now.utc.to_rfc3339_opts(SecondsFormat::Secs, true)),
                );
                // Negative duration marks a running timer.
                body.insert("duration".into(), json!(-1));
                body.insert("created_with".into(), json!(self.client.user_agent()));

                let path = format!("workspaces/{workspace_id}/time_entries");
                Ok(TogglRequest::post(self.v9(&path)).with_body(Value::Object(body)))
            }
            TimeEntryAction::Stop | TimeEntryAction::Delete => {
                let workspace_id = args::require_id(args, "workspace_id")?;
                let entry_id = args::require_id(args, "time_entry_id")?;
                let path = format!("workspaces/{workspace_id}/time_entries/{entry_id}");
                Ok(if self.action == TimeEntryAction::Stop {
                    TogglRequest::new(Method::PATCH, self.v9(&format!("{path}/stop")))
                } else {
                    TogglRequest::new(Method::DELETE, self.v9(&path))
                })
            }
        }
    }
}

#[async_trait]
impl Tool for TimeEntryTool {
    fn name(&self) -> &str {
        match self.action {
            TimeEntryAction::Current => "get_current_time_entry",
            TimeEntryAction::List => "list_time_entries",
            TimeEntryAction::Start => "start_time_entry",
            TimeEntryAction::Stop => "stop_time_entry",
            TimeEntryAction::Delete => "delete_time_entry",
        }
    }

    fn description(&self) -> &str {
        match self.action {
            TimeEntryAction::Current => "Get the running time entry, or null when no timer is running",
            TimeEntryAction::List => "List your time entries, optionally within a date range",
            TimeEntryAction::Start => "Start a new running time entry",
            TimeEntryAction::Stop => "Stop a running time entry",
            TimeEntryAction::Delete => "Delete a time entry",
        }
    }

    fn parameters_schema(&self) -> Value {
        let workspace = json!({"type": "integer", "description": "Workspace of the time entry"});
        let entry = json!({"type": "integer", "description": "Time entry to act on"});
        match self.action {
            TimeEntryAction::Current => json!({"type": "object", "properties": {}}),
            TimeEntryAction::List => json!({
                "type": "object",
                "properties": {
                    "start_date": {"type": "string", "description": "First day (YYYY-MM-DD)"},
                    "end_date": {"type": "string", "description": "Day after the last entry (YYYY-MM-DD)"}
                }
            }),
            TimeEntryAction::Start => json!({
                "type": "object",
                "properties": {
                    "workspace_id": workspace,
                    "description": {"type": "string"},
                    "project_id": {"type": "integer"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "billable": {"type": "boolean"}
                },
                "required": ["workspace_id"]
            }),
            TimeEntryAction::Stop | TimeEntryAction::Delete => json!({
                "type": "object",
                "properties": {
                    "workspace_id": workspace,
                    "time_entry_id": entry
                },
                "required": ["workspace_id", "time_entry_id"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        Ok(super::run_request(&self.client, self.build_request(&args, Now::current())).await)
    }
}
