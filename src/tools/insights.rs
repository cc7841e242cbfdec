//! Insights API: trends, profitability and revenue.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::args::{self, ArgError, Now};
use super::traits::{Tool, ToolResult};
use crate::toggl::{ApiSurface, TogglClient, TogglRequest};

const TREND_SUBJECTS: &[&str] = &["projects", "clients", "users"];
const PROFITABILITY_SUBJECTS: &[&str] = &["projects", "employees"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    Trends,
    Profitability,
    Revenue,
}

impl InsightKind {
    pub const ALL: [InsightKind; 3] = [Self::Trends, Self::Profitability, Self::Revenue];

    fn subjects(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Trends => Some(TREND_SUBJECTS),
            Self::Profitability => Some(PROFITABILITY_SUBJECTS),
            Self::Revenue => None,
        }
    }
}

pub struct InsightsTool {
    client: Arc<TogglClient>,
    kind: InsightKind,
}

impl InsightsTool {
    pub fn new(client: Arc<TogglClient>, kind: InsightKind) -> Self {
        Self { client, kind }
    }

    pub fn build_request(&self, args: &Value, now: Now) -> Result<TogglRequest, ArgError> {
        let workspace_id = args::require_id(args, "workspace_id")?;
        let (start, end) = args::date_range(args, "start_date", "end_date", now.today)?;

        let mut body = Map::new();
        body.insert("start_date".into(), json!(start.format("%Y-%m-%d").to_string()));
        body.insert("end_date".into(), json!(end.format("%Y-%m-%d").to_string()));

        let path = match self.kind {
            InsightKind::Trends => {
                let subject = args::choice(args, "subject", TREND_SUBJECTS, "projects")?;
                format!("workspace/{workspace_id}/trends/{subject}")
            }
            InsightKind::Profitability => {
                let subject = args::choice(args, "subject", PROFITABILITY_SUBJECTS, "projects")?;
                format!("workspace/{workspace_id}/profitability/{subject}")
            }
            InsightKind::Revenue => {
                if let Some(currency) = args::optional_str(args, "currency")? {
                    body.insert("currency".into(), json!(currency));
                }
                format!("workspace/{workspace_id}/revenue")
            }
        };

        Ok(TogglRequest::post(self.client.url(ApiSurface::Insights, &path))
            .with_body(Value::Object(body)))
    }
}

#[async_trait]
impl Tool for InsightsTool {
    fn name(&self) -> &str {
        match self.kind {
            InsightKind::Trends => "get_trends",
            InsightKind::Profitability => "get_profitability",
            InsightKind::Revenue => "get_revenue",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            InsightKind::Trends => "Compare tracked time against the previous period for projects, clients or users",
            InsightKind::Profitability => "Get profitability of projects or employees for a date range",
            InsightKind::Revenue => "Get billable revenue for a date range",
        }
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = json!({
            "workspace_id": {"type": "integer", "description": "Workspace to analyze"},
            "start_date": {"type": "string", "description": "First day (YYYY-MM-DD, default: 7 days ago)"},
            "end_date": {"type": "string", "description": "Last day (YYYY-MM-DD, default: today)"}
        });
        if let Some(subjects) = self.kind.subjects() {
            properties["subject"] = json!({
                "type": "string",
                "enum": subjects,
                "default": "projects"
            });
        } else {
            properties["currency"] = json!({"type": "string", "description": "ISO currency code, e.g. USD"});
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": ["workspace_id"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        Ok(super::run_request(&self.client, self.build_request(&args, Now::current())).await)
    }
}
