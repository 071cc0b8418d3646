pub mod checks;
pub mod client;
pub mod gh;
pub mod types;
pub mod wire;

pub use client::{ClientError, GitHubClient, JsonFetcher};
pub use gh::{GhCli, ToolRunner};
pub use types::{Feedback, RepoName};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use types::Comment;
use wire::{ApiIssueComment, ApiPull, ApiReview, ApiReviewComment};

const PER_PAGE: &str = "per_page=100";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("no PR found for current branch: {reason}")]
    NoActivePr { reason: String },

    #[error("PR number provided but couldn't determine repository: {reason}")]
    RepoUnknown { reason: String },

    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("failed to decode {resource}: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A pull request to report on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub repo: RepoName,
    pub pr_number: u64,
}

#[derive(Deserialize)]
struct CurrentPr {
    number: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentRepo {
    name_with_owner: String,
}

/// Fill in whichever of PR number and repository were not given,
/// asking gh about the current directory.
#[instrument(skip(tool))]
pub async fn resolve_target(
    tool: &impl ToolRunner,
    pr_number: Option<u64>,
    repo: Option<RepoName>,
) -> Result<Target, FeedbackError> {
    let explicit_number = pr_number.is_some();

    // The current branch's PR belongs to the current repository, not to an
    // arbitrary --repo.
    if let (None, Some(repo)) = (pr_number, &repo) {
        return Err(FeedbackError::NoActivePr {
            reason: format!("a PR number is required with --repo {repo}"),
        });
    }

    let pr_number = match pr_number {
        Some(number) => number,
        None => {
            let raw = tool
                .run(&["pr", "view", "--json", "number"])
                .await
                .map_err(|e| FeedbackError::NoActivePr {
                    reason: e.to_string(),
                })?;
            let current: CurrentPr =
                serde_json::from_slice(&raw).map_err(|e| FeedbackError::NoActivePr {
                    reason: format!("failed to parse PR data: {e}"),
                })?;
            current.number
        }
    };

    let repo = match repo {
        Some(repo) => repo,
        None => {
            let unresolved = |reason: String| {
                if explicit_number {
                    FeedbackError::RepoUnknown { reason }
                } else {
                    FeedbackError::NoActivePr { reason }
                }
            };
            let raw = tool
                .run(&["repo", "view", "--json", "nameWithOwner"])
                .await
                .map_err(|e| unresolved(format!("failed to get repository info: {e}")))?;
            let current: CurrentRepo = serde_json::from_slice(&raw)
                .map_err(|e| unresolved(format!("failed to parse repository data: {e}")))?;
            current
                .name_with_owner
                .parse()
                .map_err(|e: String| unresolved(e))?
        }
    };

    debug!(repo = %repo, pr_number, "resolved target");
    Ok(Target { repo, pr_number })
}

async fn get<T: DeserializeOwned>(
    api: &impl JsonFetcher,
    endpoint: &str,
    resource: &'static str,
) -> Result<T, FeedbackError> {
    let value = api
        .get_json(endpoint)
        .await
        .map_err(|source| FeedbackError::Fetch { resource, source })?;
    serde_json::from_value(value).map_err(|source| FeedbackError::Decode { resource, source })
}

pub async fn fetch_pr_meta(
    api: &impl JsonFetcher,
    target: &Target,
) -> Result<ApiPull, FeedbackError> {
    let endpoint = format!("repos/{}/pulls/{}", target.repo, target.pr_number);
    get(api, &endpoint, "PR details").await
}

/// Top-level review comments; replies are dropped.
pub async fn fetch_anchored_comments(
    api: &impl JsonFetcher,
    target: &Target,
) -> Result<Vec<Comment>, FeedbackError> {
    let endpoint = format!(
        "repos/{}/pulls/{}/comments?{PER_PAGE}",
        target.repo, target.pr_number
    );
    let raw: Vec<ApiReviewComment> = get(api, &endpoint, "review comments").await?;
    let total = raw.len();
    let comments: Vec<Comment> = raw
        .into_iter()
        .filter(|comment| !comment.is_reply())
        .map(Comment::from)
        .collect();
    debug!(total, kept = comments.len(), "filtered review comments");
    Ok(comments)
}

pub async fn fetch_general_comments(
    api: &impl JsonFetcher,
    target: &Target,
) -> Result<Vec<Comment>, FeedbackError> {
    let endpoint = format!(
        "repos/{}/issues/{}/comments?{PER_PAGE}",
        target.repo, target.pr_number
    );
    let raw: Vec<ApiIssueComment> = get(api, &endpoint, "issue comments").await?;
    Ok(raw.into_iter().map(Comment::from).collect())
}

/// Bodies of reviews submitted as plain comments.
pub async fn fetch_review_summaries(
    api: &impl JsonFetcher,
    target: &Target,
) -> Result<Vec<Comment>, FeedbackError> {
    let endpoint = format!(
        "repos/{}/pulls/{}/reviews?{PER_PAGE}",
        target.repo, target.pr_number
    );
    let raw: Vec<ApiReview> = get(api, &endpoint, "reviews").await?;
    Ok(raw
        .into_iter()
        .filter(ApiReview::is_discussion)
        .map(ApiReview::into_comment)
        .collect())
}

/// Build the feedback aggregate for one pull request.
///
/// The four REST fetches are fatal; a failed status check rollup is logged
/// and leaves `status_checks` empty.
#[instrument(skip(api, tool), fields(repo = %target.repo, pr = target.pr_number))]
pub async fn fetch_feedback(
    api: &impl JsonFetcher,
    tool: &impl ToolRunner,
    target: &Target,
) -> Result<Feedback, FeedbackError> {
    let pull = fetch_pr_meta(api, target).await?;
    debug!(title = %pull.title, "received PR metadata");

    let comments = fetch_anchored_comments(api, target).await?;
    let mut general_issues = fetch_general_comments(api, target).await?;
    general_issues.extend(fetch_review_summaries(api, target).await?);

    let status_checks = match checks::fetch_failing_checks(tool, &target.repo, target.pr_number).await
    {
        Ok(checks) => checks,
        Err(err) => {
            warn!(error = %err, "failed to fetch status checks");
            Vec::new()
        }
    };

    info!(
        comments = comments.len(),
        general = general_issues.len(),
        failing_checks = status_checks.len(),
        "collected feedback"
    );

    Ok(Feedback {
        pr_number: pull.number,
        title: pull.title,
        url: pull.html_url,
        comments,
        general_issues,
        status_checks,
    })
}
