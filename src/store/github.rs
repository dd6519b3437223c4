//! GitHub contents API backend. Files are fetched base64-encoded with a
//! blob `sha`; that sha is the version token and the PUT's compare-and-swap
//! key (GitHub rejects the write when the sha is stale).

use async_trait::async_trait;
use data_encoding::BASE64;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{RemoteFileStore, StoreError, VersionedFile};
use crate::config::Config;

const API_VERSION: &str = "2022-11-28";

pub struct GithubStore {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

impl GithubStore {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("roadmapd")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: config.github_api_base.trim_end_matches('/').to_string(),
            owner: config.repo_owner.clone(),
            repo: config.repo_name.clone(),
            token: config.github_token.clone(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("GitHub API error {}: {}", status.as_u16(), body.trim())
}

/// GitHub wraps base64 payloads at 60 columns; strip the line breaks before
/// decoding.
fn decode_content(raw: &str) -> Result<String, StoreError> {
    let compact: String = raw.split_whitespace().collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Transport(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| StoreError::Transport(format!("content is not UTF-8: {e}")))
}

#[async_trait]
impl RemoteFileStore for GithubStore {
    async fn read(&self, path: &str) -> Result<VersionedFile, StoreError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Transport(error_text(response).await));
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("bad contents response: {e}")))?;
        let content = decode_content(&body.content)?;
        debug!(path, version = %body.sha, "read file");
        Ok(VersionedFile {
            content,
            version: body.sha,
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        expected_version: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let body = json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
            "sha": expected_version,
        });
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = error_text(response).await;
            warn!(path, %message, "conditional write rejected");
            return Err(StoreError::VersionConflict {
                path: path.to_string(),
                message,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(StoreError::Transport(error_text(response).await));
        }
        debug!(path, "wrote file");
        Ok(())
    }
}
