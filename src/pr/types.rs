use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Aggregated feedback for one pull request.
/// Built once per run by `pr::fetch_feedback` and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub pr_number: u64,
    pub title: String,
    pub url: String,
    /// Top-level review comments anchored to a file, in API order.
    pub comments: Vec<Comment>,
    /// Issue comments followed by review summary bodies.
    pub general_issues: Vec<Comment>,
    /// Only failing checks; passing ones are dropped during normalisation.
    pub status_checks: Vec<StatusCheck>,
}

impl Feedback {
    /// Anchored plus general comments.
    pub fn comment_count(&self) -> usize {
        self.comments.len() + self.general_issues.len()
    }
}

/// A unit of feedback, either anchored to a file or general.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub anchor: Option<Anchor>,
    pub author: String,
    pub author_association: Option<String>,
    pub state: CommentState,
    /// RFC 3339, kept as received.
    pub created_at: String,
    pub updated_at: String,
}

/// File location of a review comment. General comments carry none.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Anchor {
    pub path: String,
    pub line: Option<u64>,
    pub start_line: Option<u64>,
    pub original_line: Option<u64>,
    pub diff_hunk: Option<String>,
    pub in_reply_to_id: Option<u64>,
    pub outdated: bool,
    pub subject_type: Option<String>,
}

/// Wire shape of a comment. Anchor fields are interleaved with the comment's
/// own, so the outer `Option` omits a key and the inner one writes `null`.
#[derive(Serialize)]
struct CommentFields<'a> {
    id: u64,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_line: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_hunk: Option<&'a str>,
    author: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_association: Option<&'a str>,
    state: CommentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<Option<u64>>,
    created_at: &'a str,
    updated_at: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    outdated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_type: Option<&'a str>,
}

impl Serialize for Comment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let anchor = self.anchor.as_ref();
        CommentFields {
            id: self.id,
            body: &self.body,
            path: anchor.map(|a| a.path.as_str()),
            line: anchor.map(|a| a.line),
            start_line: anchor.map(|a| a.start_line),
            original_line: anchor.and_then(|a| a.original_line),
            diff_hunk: anchor.and_then(|a| a.diff_hunk.as_deref()),
            author: &self.author,
            author_association: self.author_association.as_deref(),
            state: self.state,
            in_reply_to_id: anchor.map(|a| a.in_reply_to_id),
            created_at: &self.created_at,
            updated_at: &self.updated_at,
            outdated: anchor.is_some_and(|a| a.outdated),
            subject_type: anchor.and_then(|a| a.subject_type.as_deref()),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    Unresolved,
}

/// A failing CI check from the status rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCheck {
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub details_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub started_at: String,
    pub completed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_command: Option<String>,
}

impl StatusCheck {
    pub fn is_cancelled(&self) -> bool {
        self.conclusion == "CANCELLED"
    }
}

/// Repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoName {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected owner/name, got '{s}'")),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repo_name_parse() {
        let repo: RepoName = "octo/widgets".parse().unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.to_string(), "octo/widgets");
    }

    #[test]
    fn test_repo_name_rejects_malformed() {
        assert!("octo".parse::<RepoName>().is_err());
        assert!("/widgets".parse::<RepoName>().is_err());
        assert!("octo/".parse::<RepoName>().is_err());
        assert!("octo/widgets/extra".parse::<RepoName>().is_err());
    }

    #[test]
    fn test_general_comment_omits_anchor_fields() {
        let comment = Comment {
            id: 7,
            body: "Looks good overall".to_string(),
            anchor: None,
            author: "alice".to_string(),
            author_association: None,
            state: CommentState::Unresolved,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "body": "Looks good overall",
                "author": "alice",
                "state": "unresolved",
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_anchored_comment_keeps_nullable_lines() {
        let comment = Comment {
            id: 8,
            body: "nit".to_string(),
            anchor: Some(Anchor {
                path: "src/lib.rs".to_string(),
                line: Some(3),
                ..Anchor::default()
            }),
            author: "bob".to_string(),
            author_association: Some("MEMBER".to_string()),
            state: CommentState::Unresolved,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(value["path"], "src/lib.rs");
        assert_eq!(value["line"], 3);
        assert!(value["start_line"].is_null());
        assert!(value.as_object().unwrap().contains_key("start_line"));
        assert!(value.as_object().unwrap().contains_key("in_reply_to_id"));
        assert!(!value.as_object().unwrap().contains_key("original_line"));
        assert!(!value.as_object().unwrap().contains_key("diff_hunk"));
        assert!(!value.as_object().unwrap().contains_key("outdated"));
        assert_eq!(value["author_association"], "MEMBER");
    }

    #[test]
    fn test_comment_key_order() {
        let comment = Comment {
            id: 9,
            body: "why?".to_string(),
            anchor: Some(Anchor {
                path: "src/main.rs".to_string(),
                line: Some(12),
                start_line: None,
                original_line: Some(10),
                diff_hunk: Some("@@ -1 +1 @@".to_string()),
                in_reply_to_id: None,
                outdated: true,
                subject_type: Some("line".to_string()),
            }),
            author: "carol".to_string(),
            author_association: Some("OWNER".to_string()),
            state: CommentState::Unresolved,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-02T00:00:00Z".to_string(),
        };
        let text = serde_json::to_string(&comment).unwrap();
        let keys = [
            "\"id\"",
            "\"body\"",
            "\"path\"",
            "\"line\"",
            "\"start_line\"",
            "\"original_line\"",
            "\"diff_hunk\"",
            "\"author\"",
            "\"author_association\"",
            "\"state\"",
            "\"in_reply_to_id\"",
            "\"created_at\"",
            "\"updated_at\"",
            "\"outdated\"",
            "\"subject_type\"",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| text.find(key).unwrap_or_else(|| panic!("{key} missing in {text}")))
            .collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "keys out of order: {text}"
        );
    }

    #[test]
    fn test_status_check_optional_fields() {
        let check = StatusCheck {
            name: "lint".to_string(),
            status: "COMPLETED".to_string(),
            conclusion: "CANCELLED".to_string(),
            details_url: "https://ci.example.com/1".to_string(),
            workflow_name: None,
            run_id: None,
            started_at: String::new(),
            completed_at: String::new(),
            check_command: None,
        };
        assert!(check.is_cancelled());
        let value = serde_json::to_value(&check).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("run_id"));
        assert!(!object.contains_key("check_command"));
        assert!(!object.contains_key("workflow_name"));
        assert_eq!(object["details_url"], "https://ci.example.com/1");
    }
}
