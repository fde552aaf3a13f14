//! HTTP access to the hosting service.
//!
//! Every request made by the remote pipeline goes through [`GitHubClient`]:
//! repository metadata, raw file contents and tarball downloads. A bearer
//! token, when supplied, is attached to all of them.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::reference::RepositoryReference;
use crate::config::{Endpoints, Settings};
use crate::error::{Result, ScaffoldError};

/// Client for the hosting service's API, raw and codeload hosts.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    endpoints: Endpoints,
    token: Option<String>,
}

/// The part of the repository metadata response the engine relies on.
#[derive(Debug, Deserialize)]
struct RepoMetadata {
    default_branch: Option<String>,
}

impl GitHubClient {
    /// Build a client from settings, optionally authenticated.
    pub fn new(settings: &Settings, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&settings.http.user_agent)
            .timeout(settings.http.timeout())
            .build()?;

        Ok(Self {
            http,
            endpoints: settings.endpoints.clone(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// The endpoints this client talks to.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Whether requests carry a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.http.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Look up the repository's default branch.
    pub async fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = format!("{}/repos/{owner}/{repo}", self.endpoints.api_base);
        let resolution_failed = |message: String| ScaffoldError::ResolutionFailed {
            owner: owner.to_string(),
            repo: repo.to_string(),
            message,
        };

        let response = self
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| resolution_failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(ScaffoldError::NotFound {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(resolution_failed(format!("HTTP {status} from {url}")))
            }
            _ => {}
        }

        let metadata: RepoMetadata = response
            .json()
            .await
            .map_err(|e| resolution_failed(format!("unexpected metadata response: {e}")))?;

        metadata
            .default_branch
            .filter(|b| !b.is_empty())
            .ok_or_else(|| resolution_failed("metadata response has no default branch".into()))
    }

    /// URL of a file inside the referenced repository.
    ///
    /// Empty path segments (root package, root template) are elided.
    pub fn raw_url(&self, reference: &RepositoryReference, package: &str, file: &str) -> String {
        let mut url = format!(
            "{}/{}/{}/{}",
            self.endpoints.raw_base, reference.owner, reference.repo_name, reference.branch
        );
        for segment in [reference.sub_path.as_str(), package, file] {
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }

    /// Fetch a file from the repository.
    ///
    /// Returns `Ok(None)` for any non-success status; only transport errors
    /// are reported as errors.
    pub async fn raw_file(
        &self,
        reference: &RepositoryReference,
        package: &str,
        file: &str,
    ) -> Result<Option<String>> {
        let url = self.raw_url(reference, package, file);
        let response = self.get(&url).send().await?;

        if !response.status().is_success() {
            tracing::debug!("{url} -> HTTP {}", response.status());
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }

    /// Tarball URL for the referenced branch.
    pub fn tarball_url(&self, reference: &RepositoryReference) -> String {
        format!(
            "{}/{}/{}/tar.gz/{}",
            self.endpoints.codeload_base, reference.owner, reference.repo_name, reference.branch
        )
    }

    /// Open a streaming download of the repository tarball.
    pub async fn tarball(&self, reference: &RepositoryReference) -> Result<Response> {
        let url = self.tarball_url(reference);
        let download_failed = |message: String| ScaffoldError::DownloadFailed {
            url: url.clone(),
            message,
        };

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| download_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP {}", response.status())));
        }
        if response.content_length() == Some(0) {
            return Err(download_failed("response has no body".into()));
        }

        Ok(response)
    }

    /// Fetch an arbitrary URL as text, failing on non-success statuses.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
