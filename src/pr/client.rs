use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::gh::ToolError;

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no GitHub token found; set GH_TOKEN or run `gh auth login`")]
    MissingToken,

    #[error("no GitHub token configured and `gh auth token` failed: {0}")]
    TokenLookup(#[source] ToolError),

    #[error("page {page} of {url} is not a JSON array")]
    UnexpectedPage { url: String, page: usize },
}

/// Read-only access to a REST endpoint, relative to the API root
/// (e.g. `repos/octo/widgets/pulls/42`).
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, endpoint: &str) -> Result<Value, ClientError>;
}

/// `JsonFetcher` backed by the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: String) -> Result<Self, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl JsonFetcher for GitHubClient {
    /// GETs the endpoint. Array responses follow `Link: rel="next"` and are
    /// concatenated into one array.
    #[instrument(skip(self))]
    async fn get_json(&self, endpoint: &str) -> Result<Value, ClientError> {
        let mut next = Some(self.url_for(endpoint));
        let mut items: Vec<Value> = Vec::new();
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let response = self
                .client
                .get(&url)
                .header(USER_AGENT, "gh-pr-feedback")
                .header(ACCEPT, "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION)
                .bearer_auth(&self.token)
                .send()
                .await?
                .error_for_status()?;

            let next_url = next_page(response.headers());
            let body = response.json::<Value>().await?;
            pages += 1;

            match body {
                Value::Array(page) => {
                    items.extend(page);
                    next = next_url;
                }
                other if pages == 1 => return Ok(other),
                _ => {
                    warn!(pages, url = %url, "non-array page in paginated response");
                    return Err(ClientError::UnexpectedPage { url, page: pages });
                }
            }
        }

        debug!(pages, items = items.len(), "fetched paginated endpoint");
        Ok(Value::Array(items))
    }
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| param.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
