//! Narrow decoding types for each GitHub endpoint, and their mapping into
//! the shared `Comment` model.

use serde::Deserialize;

use super::types::{Anchor, Comment, CommentState};

/// Login shown for comments whose author account no longer exists.
const GHOST: &str = "ghost";

#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub login: String,
}

/// `GET repos/{repo}/pulls/{number}`
#[derive(Debug, Deserialize)]
pub struct ApiPull {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

/// `GET repos/{repo}/pulls/{number}/comments`
#[derive(Debug, Deserialize)]
pub struct ApiReviewComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: String,
    pub line: Option<u64>,
    pub start_line: Option<u64>,
    pub original_line: Option<u64>,
    pub diff_hunk: Option<String>,
    pub author_association: Option<String>,
    pub user: Option<ApiUser>,
    pub in_reply_to_id: Option<u64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub outdated: bool,
    pub subject_type: Option<String>,
}

/// `GET repos/{repo}/issues/{number}/comments`
#[derive(Debug, Deserialize)]
pub struct ApiIssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub author_association: Option<String>,
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// `GET repos/{repo}/pulls/{number}/reviews`
#[derive(Debug, Deserialize)]
pub struct ApiReview {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    pub user: Option<ApiUser>,
    pub author_association: Option<String>,
    pub submitted_at: Option<String>,
}

fn login(user: Option<ApiUser>) -> String {
    user.map(|u| u.login).unwrap_or_else(|| GHOST.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ApiReviewComment {
    /// Replies are part of an already-discussed thread.
    pub fn is_reply(&self) -> bool {
        self.in_reply_to_id.is_some()
    }
}

impl From<ApiReviewComment> for Comment {
    fn from(api: ApiReviewComment) -> Self {
        Comment {
            id: api.id,
            body: api.body,
            anchor: Some(Anchor {
                path: api.path,
                line: api.line,
                start_line: api.start_line,
                original_line: api.original_line,
                diff_hunk: non_empty(api.diff_hunk),
                in_reply_to_id: api.in_reply_to_id,
                outdated: api.outdated,
                subject_type: non_empty(api.subject_type),
            }),
            author: login(api.user),
            author_association: non_empty(api.author_association),
            state: CommentState::Unresolved,
            created_at: api.created_at,
            updated_at: api.updated_at,
        }
    }
}

impl From<ApiIssueComment> for Comment {
    fn from(api: ApiIssueComment) -> Self {
        Comment {
            id: api.id,
            body: api.body,
            anchor: None,
            author: login(api.user),
            author_association: non_empty(api.author_association),
            state: CommentState::Unresolved,
            created_at: api.created_at,
            updated_at: api.updated_at,
        }
    }
}

impl ApiReview {
    /// Only plain "COMMENTED" reviews with a body count as discussion;
    /// approvals and change requests are verdicts, not feedback items.
    pub fn is_discussion(&self) -> bool {
        self.state == "COMMENTED" && self.body.as_deref().is_some_and(|b| !b.is_empty())
    }

    pub fn into_comment(self) -> Comment {
        let submitted = self.submitted_at.unwrap_or_default();
        Comment {
            id: self.id,
            body: self.body.unwrap_or_default(),
            anchor: None,
            author: login(self.user),
            author_association: non_empty(self.author_association),
            state: CommentState::Unresolved,
            created_at: submitted.clone(),
            updated_at: submitted,
        }
    }
}
