use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use super::gh::{ToolError, ToolRunner};
use super::types::{RepoName, StatusCheck};

/// Conclusions that count as a failing check.
const FAILING_CONCLUSIONS: [&str; 3] = ["FAILURE", "ERROR", "CANCELLED"];

/// GitHub's placeholder for a timestamp that was never set.
const ZERO_TIMESTAMP_PREFIX: &str = "0001-01-01";

#[derive(Debug, Error)]
pub enum ChecksError {
    #[error("failed to get status checks: {0}")]
    Tool(#[from] ToolError),

    #[error("failed to parse status checks: {0}")]
    Parse(#[from] serde_json::Error),
}

/// `gh pr view --json statusCheckRollup`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRollup {
    #[serde(default)]
    status_check_rollup: Vec<ApiRollupEntry>,
}

/// One rollup entry: either a check run (`name`, `conclusion`, `detailsUrl`)
/// or a commit status context (`context`, `state`, `targetUrl`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiRollupEntry {
    name: Option<String>,
    context: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
    state: Option<String>,
    details_url: Option<String>,
    target_url: Option<String>,
    workflow_name: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
}

fn first_non_empty(a: Option<String>, b: Option<String>) -> String {
    a.filter(|v| !v.is_empty())
        .or_else(|| b.filter(|v| !v.is_empty()))
        .unwrap_or_default()
}

fn timestamp(value: Option<String>) -> String {
    value
        .filter(|v| !v.starts_with(ZERO_TIMESTAMP_PREFIX))
        .unwrap_or_default()
}

impl From<ApiRollupEntry> for StatusCheck {
    fn from(entry: ApiRollupEntry) -> Self {
        let details_url = first_non_empty(entry.details_url, entry.target_url);
        let run_id = extract_run_id(&details_url);
        let command = run_id.as_deref().map(check_command);
        StatusCheck {
            name: first_non_empty(entry.name, entry.context),
            status: entry.status.unwrap_or_default(),
            conclusion: first_non_empty(entry.conclusion, entry.state),
            details_url,
            workflow_name: entry.workflow_name.filter(|w| !w.is_empty()),
            run_id,
            started_at: timestamp(entry.started_at),
            completed_at: timestamp(entry.completed_at),
            check_command: command,
        }
    }
}

/// gh reports conclusions in upper case; other spellings are not failures.
pub fn is_failing(conclusion: &str) -> bool {
    FAILING_CONCLUSIONS.contains(&conclusion)
}

/// Extract the workflow run id from an Actions URL such as
/// `https://github.com/o/r/actions/runs/16637926739/job/123`.
pub fn extract_run_id(details_url: &str) -> Option<String> {
    let (_, rest) = details_url.split_once("/actions/runs/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

pub fn check_command(run_id: &str) -> String {
    format!("gh run view {run_id}")
}

/// Decode a rollup document and keep only failing checks.
pub fn parse_failing_checks(raw: &[u8]) -> Result<Vec<StatusCheck>, ChecksError> {
    let rollup: ApiRollup = serde_json::from_slice(raw)?;
    let total = rollup.status_check_rollup.len();
    let failing: Vec<StatusCheck> = rollup
        .status_check_rollup
        .into_iter()
        .map(StatusCheck::from)
        .filter(|check| is_failing(&check.conclusion))
        .collect();
    debug!(total, failing = failing.len(), "filtered status check rollup");
    Ok(failing)
}

/// Fetch the CI rollup through gh and keep only failing checks.
#[instrument(skip(tool), fields(repo = %repo))]
pub async fn fetch_failing_checks(
    tool: &impl ToolRunner,
    repo: &RepoName,
    pr_number: u64,
) -> Result<Vec<StatusCheck>, ChecksError> {
    let number = pr_number.to_string();
    let repo = repo.to_string();
    let raw = tool
        .run(&[
            "pr",
            "view",
            number.as_str(),
            "--repo",
            repo.as_str(),
            "--json",
            "statusCheckRollup",
        ])
        .await?;
    parse_failing_checks(&raw)
}
