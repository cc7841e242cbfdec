//! Prompt templates served over `prompts/list` and `prompts/get`.
//!
//! A prompt is plain text pointing the agent at the resources and tools that
//! answer a question. Arguments arrive as strings from most clients, so ids
//! and dates go through the same parsing as tool arguments. Resource URIs are
//! rendered for the active [`ResourceApi`], so every one the agent is pointed
//! at resolves on the same server.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::config::ResourceApi;
use crate::tools::args::{self, ArgError};

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Unknown prompt: {0}")]
    Unknown(String),
    #[error(transparent)]
    Argument(#[from] ArgError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    AnalyzeTimeEntries,
    ProjectAnalysis,
    WeeklyReview,
    ProfitabilityReview,
}

impl Prompt {
    pub const ALL: [Prompt; 4] = [
        Self::AnalyzeTimeEntries,
        Self::ProjectAnalysis,
        Self::WeeklyReview,
        Self::ProfitabilityReview,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AnalyzeTimeEntries => "analyze_time_entries",
            Self::ProjectAnalysis => "project_analysis",
            Self::WeeklyReview => "weekly_review",
            Self::ProfitabilityReview => "profitability_review",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AnalyzeTimeEntries => "Create a prompt for analyzing time entries",
            Self::ProjectAnalysis => "Create a prompt for analyzing a specific project",
            Self::WeeklyReview => "Create a prompt for reviewing a week of tracked time",
            Self::ProfitabilityReview => "Create a prompt for reviewing workspace profitability",
        }
    }

    pub fn arguments(self) -> Vec<PromptArgument> {
        let workspace = PromptArgument {
            name: "workspace_id",
            description: "Workspace to analyze",
            required: true,
        };
        match self {
            Self::AnalyzeTimeEntries | Self::ProfitabilityReview => vec![workspace],
            Self::ProjectAnalysis => vec![
                PromptArgument {
                    name: "project_id",
                    description: "Project to analyze",
                    required: true,
                },
                PromptArgument {
                    name: "workspace_id",
                    description: "Workspace that owns the project",
                    required: false,
                },
            ],
            Self::WeeklyReview => vec![
                workspace,
                PromptArgument {
                    name: "since",
                    description: "First day (YYYY-MM-DD, default: 7 days ago)",
                    required: false,
                },
                PromptArgument {
                    name: "until",
                    description: "Last day (YYYY-MM-DD, default: today)",
                    required: false,
                },
            ],
        }
    }

    /// Render the prompt text. `args` is the `arguments` object of the call.
    pub fn render(self, args: &Value, today: NaiveDate, api: ResourceApi) -> Result<String, PromptError> {
        let text = match self {
            Self::AnalyzeTimeEntries => {
                let id = args::require_id(args, "workspace_id")?;
                format!(
                    "Please analyze the time entries for workspace {id}.\n\n\
                     You can use the following resources:\n\
                     - workspaces://{id}\n\
                     - workspaces://{id}/projects\n\
                     - workspaces://{id}/clients\n\n\
                     And the following tools:\n\
                     - get_weekly_report\n\
                     - get_detailed_report\n\
                     - get_summary_report\n\n\
                     Please provide insights on time usage patterns and productivity.\n"
                )
            }
            Self::ProjectAnalysis => {
                let id = args::require_id(args, "project_id")?;
                let workspace_id = args::optional_id(args, "workspace_id")?;
                let resources = match (api, workspace_id) {
                    (ResourceApi::V8, _) => format!("- projects://{id}\n"),
                    (ResourceApi::V9, Some(wid)) => {
                        format!("- workspaces://{wid}/projects/{id}\n- workspaces://{wid}/tasks\n")
                    }
                    // v9 scopes projects to a workspace; the agent has to find it first.
                    (ResourceApi::V9, None) => format!(
                        "- workspaces://\n\n\
                         Find the workspace that owns project {id}, then read \
                         workspaces://<workspace_id>/projects/{id}.\n"
                    ),
                };
                format!(
                    "Please analyze project {id}.\n\n\
                     You can use the following resources:\n\
                     {resources}\n\
                     And the following tools:\n\
                     - get_summary_report\n\n\
                     Please provide insights on project progress, time allocation, and any potential issues.\n"
                )
            }
            Self::WeeklyReview => {
                let id = args::require_id(args, "workspace_id")?;
                let (since, until) = args::date_range(args, "since", "until", today)?;
                format!(
                    "Please review the time tracked in workspace {id} from {since} to {until}.\n\n\
                     You can use the following resources:\n\
                     - workspaces://{id}/projects\n\
                     - workspaces://{id}/users\n\n\
                     And the following tools (pass start_date={since} and end_date={until}):\n\
                     - get_weekly_report_v3\n\
                     - get_summary_report_v3\n\
                     - get_detailed_report_v3\n\n\
                     Summarize where the time went, compare days, and call out untracked gaps or unusually long entries.\n",
                    since = since.format("%Y-%m-%d"),
                    until = until.format("%Y-%m-%d"),
                )
            }
            Self::ProfitabilityReview => {
                let id = args::require_id(args, "workspace_id")?;
                format!(
                    "Please review profitability for workspace {id}.\n\n\
                     You can use the following resources:\n\
                     - workspaces://{id}/projects\n\
                     - workspaces://{id}/clients\n\n\
                     And the following tools:\n\
                     - get_profitability\n\
                     - get_revenue\n\
                     - get_trends\n\n\
                     Identify the most and least profitable projects and explain the trends behind them.\n"
                )
            }
        };
        Ok(text)
    }
}

/// Look up and render a prompt by name.
pub fn render(name: &str, args: &Value, today: NaiveDate, api: ResourceApi) -> Result<String, PromptError> {
    Prompt::from_name(name)
        .ok_or_else(|| PromptError::Unknown(name.to_string()))?
        .render(args, today, api)
}
