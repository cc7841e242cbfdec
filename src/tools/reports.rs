//! Weekly, detailed and summary reports (reports API v2 and v3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::args::{self, ArgError, Now};
use super::traits::{Tool, ToolResult};
use crate::toggl::{ApiSurface, TogglClient, TogglRequest};

const V2_GROUPINGS: &[&str] = &["projects", "clients", "users"];
const V3_GROUPINGS: &[&str] = &["projects", "clients", "users"];
const V3_SUB_GROUPINGS: &[&str] = &["time_entries", "tasks", "projects", "clients", "users"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Weekly,
    Detailed,
    Summary,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [Self::Weekly, Self::Detailed, Self::Summary];
}

/// Reports API v2: `GET /weekly`, `/details`, `/summary` with query parameters.
pub struct ReportsV2Tool {
    client: Arc<TogglClient>,
    kind: ReportKind,
}

impl ReportsV2Tool {
    pub fn new(client: Arc<TogglClient>, kind: ReportKind) -> Self {
        Self { client, kind }
    }

    pub fn build_request(&self, args: &Value) -> Result<TogglRequest, ArgError> {
        let workspace_id = args::require_id(args, "workspace_id")?;
        let user_agent = args::optional_str(args, "user_agent")?
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(self.client.user_agent());
        let since = args::optional_date(args, "since")?;
        let until = args::optional_date(args, "until")?;

        let path = match self.kind {
            ReportKind::Weekly => "weekly",
            ReportKind::Detailed => "details",
            ReportKind::Summary => "summary",
        };

        let mut request = TogglRequest::get(self.client.url(ApiSurface::ReportsV2, path))
            .with_query("workspace_id", workspace_id)
            .with_query("user_agent", user_agent);

        match self.kind {
            ReportKind::Weekly => {}
            ReportKind::Detailed => {
                let page = args::optional_id(args, "page")?.unwrap_or(1);
                request = request.with_query("page", page);
            }
            ReportKind::Summary => {
                let grouping = args::choice(args, "grouping", V2_GROUPINGS, "projects")?;
                request = request.with_query("grouping", grouping);
            }
        }

        Ok(request
            .with_optional_query("since", since.map(|d| d.format("%Y-%m-%d")))
            .with_optional_query("until", until.map(|d| d.format("%Y-%m-%d"))))
    }
}

#[async_trait]
impl Tool for ReportsV2Tool {
    fn name(&self) -> &str {
        match self.kind {
            ReportKind::Weekly => "get_weekly_report",
            ReportKind::Detailed => "get_detailed_report",
            ReportKind::Summary => "get_summary_report",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            ReportKind::Weekly => "Get weekly report data (reports API v2)",
            ReportKind::Detailed => "Get detailed report data, one page at a time (reports API v2)",
            ReportKind::Summary => "Get summary report data grouped by projects, clients or users (reports API v2)",
        }
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = json!({
            "workspace_id": {"type": "integer", "description": "Workspace to report on"},
            "since": {"type": "string", "description": "First day (YYYY-MM-DD)"},
            "until": {"type": "string", "description": "Last day (YYYY-MM-DD)"},
            "user_agent": {"type": "string", "description": "Identifies the caller to Toggl (default: TogglMCP)"}
        });
        match self.kind {
            ReportKind::Weekly => {}
            ReportKind::Detailed => {
                properties["page"] =
                    json!({"type": "integer", "minimum": 1, "default": 1, "description": "Result page"});
            }
            ReportKind::Summary => {
                properties["grouping"] = json!({
                    "type": "string",
                    "enum": V2_GROUPINGS,
                    "default": "projects"
                });
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": ["workspace_id"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        Ok(super::run_request(&self.client, self.build_request(&args)).await)
    }
}

/// Reports API v3: `POST /workspace/{id}/.../time_entries` with a JSON body.
pub struct ReportsV3Tool {
    client: Arc<TogglClient>,
    kind: ReportKind,
}

impl ReportsV3Tool {
    pub fn new(client: Arc<TogglClient>, kind: ReportKind) -> Self {
        Self { client, kind }
    }

    pub fn build_request(&self, args: &Value, now: Now) -> Result<TogglRequest, ArgError> {
        let workspace_id = args::require_id(args, "workspace_id")?;
        let (start, end) = args::date_range(args, "start_date", "end_date", now.today)?;

        let mut body = Map::new();
        body.insert("start_date".into(), json!(start.format("%Y-%m-%d").to_string()));
        body.insert("end_date".into(), json!(end.format("%Y-%m-%d").to_string()));

        let segment = match self.kind {
            ReportKind::Weekly => "weekly",
            ReportKind::Detailed => {
                if let Some(size) = args::optional_id(args, "page_size")? {
                    body.insert("page_size".into(), json!(size));
                }
                if let Some(row) = args::optional_u64(args, "first_row_number")? {
                    body.insert("first_row_number".into(), json!(row));
                }
                "search"
            }
            ReportKind::Summary => {
                let grouping = args::choice(args, "grouping", V3_GROUPINGS, "projects")?;
                body.insert("grouping".into(), json!(grouping));
                if args::optional_str(args, "sub_grouping")?.is_some() {
                    let sub = args::choice(args, "sub_grouping", V3_SUB_GROUPINGS, "time_entries")?;
                    body.insert("sub_grouping".into(), json!(sub));
                }
                "summary"
            }
        };

        let path = format!("workspace/{workspace_id}/{segment}/time_entries");
        Ok(TogglRequest::post(self.client.url(ApiSurface::ReportsV3, &path))
            .with_body(Value::Object(body)))
    }
}

#[async_trait]
impl Tool for ReportsV3Tool {
    fn name(&self) -> &str {
        match self.kind {
            ReportKind::Weekly => "get_weekly_report_v3",
            ReportKind::Detailed => "get_detailed_report_v3",
            ReportKind::Summary => "get_summary_report_v3",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            ReportKind::Weekly => "Get weekly totals for a date range (reports API v3)",
            ReportKind::Detailed => "Search individual time entries for a date range (reports API v3)",
            ReportKind::Summary => "Get summarized totals for a date range (reports API v3)",
        }
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = json!({
            "workspace_id": {"type": "integer", "description": "Workspace to report on"},
            "start_date": {"type": "string", "description": "First day (YYYY-MM-DD, default: 7 days ago)"},
            "end_date": {"type": "string", "description": "Last day (YYYY-MM-DD, default: today)"}
        });
        match self.kind {
            ReportKind::Weekly => {}
            ReportKind::Detailed => {
                properties["page_size"] = json!({"type": "integer", "minimum": 1});
                properties["first_row_number"] = json!({
                    "type": "integer",
                    "minimum": 0,
                    "description": "Row to continue from, as returned by the previous page"
                });
            }
            ReportKind::Summary => {
                properties["grouping"] = json!({
                    "type": "string",
                    "enum": V3_GROUPINGS,
                    "default": "projects"
                });
                properties["sub_grouping"] = json!({"type": "string", "enum": V3_SUB_GROUPINGS});
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toggl::{ApiBase, Credentials};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn client() -> Arc<TogglClient> {
        Arc::new(TogglClient::new(
            Some(Credentials::api_token("tok")),
            ApiBase::default(),
            "TogglMCP",
        ))
    }

    fn fixed_now() -> Now {
        Now {
            today: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            utc: Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap(),
        }
    }

    fn query(request: &TogglRequest) -> Vec<(&str, &str)> {
        request
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn v2_weekly_builds_query_in_order() {
        let tool = ReportsV2Tool::new(client(), ReportKind::Weekly);
        let request = tool
            .build_request(&json!({"workspace_id": 42, "since": "2024-01-01"}))
            .unwrap();
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(
            request.url,
            "https://api.track.toggl.com/reports/api/v2/weekly"
        );
        assert_eq!(
            query(&request),
            [
                ("workspace_id", "42"),
                ("user_agent", "TogglMCP"),
                ("since", "2024-01-01"),
            ]
        );
    }

    #[test]
    fn v2_detailed_defaults_page_to_one() {
        let tool = ReportsV2Tool::new(client(), ReportKind::Detailed);
        let request = tool.build_request(&json!({"workspace_id": 1})).unwrap();
        assert!(request.url.ends_with("/reports/api/v2/details"));
        assert!(query(&request).contains(&("page", "1")));

        let request = tool
            .build_request(&json!({"workspace_id": 1, "page": 3}))
            .unwrap();
        assert!(query(&request).contains(&("page", "3")));
    }

    #[test]
    fn v2_summary_defaults_grouping_and_accepts_user_agent() {
        let tool = ReportsV2Tool::new(client(), ReportKind::Summary);
        let request = tool
            .build_request(&json!({"workspace_id": 1, "user_agent": "me@example.com", "until": "2024-02-01"}))
            .unwrap();
        assert_eq!(
            query(&request),
            [
                ("workspace_id", "1"),
                ("user_agent", "me@example.com"),
                ("grouping", "projects"),
                ("until", "2024-02-01"),
            ]
        );
        assert!(tool
            .build_request(&json!({"workspace_id": 1, "grouping": "planets"}))
            .is_err());
    }

    #[test]
    fn v2_requires_workspace() {
        let tool = ReportsV2Tool::new(client(), ReportKind::Weekly);
        assert_eq!(
            tool.build_request(&json!({})).unwrap_err(),
            ArgError::Missing("workspace_id".into())
        );
    }

    #[test]
    fn v3_weekly_defaults_to_last_seven_days() {
        let tool = ReportsV3Tool::new(client(), ReportKind::Weekly);
        let request = tool
            .build_request(&json!({"workspace_id": 9}), fixed_now())
            .unwrap();
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(
            request.url,
            "https://api.track.toggl.com/reports/api/v3/workspace/9/weekly/time_entries"
        );
        assert_eq!(
            request.body,
            Some(json!({"start_date": "2024-03-08", "end_date": "2024-03-15"}))
        );
    }

    #[test]
    fn v3_detailed_forwards_paging() {
        let tool = ReportsV3Tool::new(client(), ReportKind::Detailed);
        let request = tool
            .build_request(
                &json!({"workspace_id": 9, "start_date": "2024-01-01", "end_date": "2024-01-31", "page_size": 50, "first_row_number": 51}),
                fixed_now(),
            )
            .unwrap();
        assert!(request.url.ends_with("/workspace/9/search/time_entries"));
        assert_eq!(
            request.body,
            Some(json!({
                "start_date": "2024-01-01",
                "end_date": "2024-01-31",
                "page_size": 50,
                "first_row_number": 51
            }))
        );
    }

    #[test]
    fn v3_summary_grouping() {
        let tool = ReportsV3Tool::new(client(), ReportKind::Summary);
        let request = tool
            .build_request(
                &json!({"workspace_id": 9, "grouping": "clients", "sub_grouping": "projects"}),
                fixed_now(),
            )
            .unwrap();
        assert!(request.url.ends_with("/workspace/9/summary/time_entries"));
        let body = request.body.unwrap();
        assert_eq!(body["grouping"], "clients");
        assert_eq!(body["sub_grouping"], "projects");
    }

    #[test]
    fn tool_names_are_distinct() {
        let c = client();
        let mut names: Vec<String> = ReportKind::ALL
            .iter()
            .flat_map(|k| {
                [
                    ReportsV2Tool::new(c.clone(), *k).name().to_string(),
                    ReportsV3Tool::new(c.clone(), *k).name().to_string(),
                ]
            })
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }
}
