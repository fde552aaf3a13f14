//! Template reference parsing and resolution.
//!
//! Two syntaxes are accepted:
//!
//! - Shorthand: `owner/repo[/sub/path...]`
//! - URL form: `https://github.com/owner/repo[/tree/<branch>[/sub/path...]]`
//!
//! Shorthand is only considered when the input is not an absolute URL.

use std::fmt;
use url::Url;

use super::fetch::GitHubClient;
use crate::error::{Result, ScaffoldError};

/// A fully resolved repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    pub owner: String,
    pub repo_name: String,
    /// Concrete ref name, never empty.
    pub branch: String,
    /// Path of the template inside the repository, empty for the root.
    pub sub_path: String,
}

impl RepositoryReference {
    /// Number of path segments in `sub_path`.
    pub fn sub_path_depth(&self) -> usize {
        segment_count(&self.sub_path)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo_name, self.branch)?;
        if !self.sub_path.is_empty() {
            write!(f, ":{}", self.sub_path)?;
        }
        Ok(())
    }
}

/// A reference as written by the user, before the default branch is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub owner: String,
    pub repo_name: String,
    pub branch: Option<String>,
    pub sub_path: String,
}

impl ParsedReference {
    /// Attach a concrete branch.
    pub fn with_branch(self, branch: String) -> RepositoryReference {
        RepositoryReference {
            owner: self.owner,
            repo_name: self.repo_name,
            branch,
            sub_path: self.sub_path,
        }
    }
}

/// Parse a template reference without touching the network.
///
/// `web_host` is the only host accepted in URL form.
///
/// # Example
///
/// ```
/// use scaffold::remote::parse_reference;
///
/// let parsed = parse_reference("acme/templates/studio/blog", "github.com").unwrap();
/// assert_eq!(parsed.owner, "acme");
/// assert_eq!(parsed.repo_name, "templates");
/// assert_eq!(parsed.sub_path, "studio/blog");
/// assert_eq!(parsed.branch, None);
/// ```
pub fn parse_reference(input: &str, web_host: &str) -> Result<ParsedReference> {
    let input = input.trim();

    match Url::parse(input) {
        Ok(url) if url.has_host() => parse_url(input, &url, web_host),
        Ok(_) => Err(invalid(input, "not a repository URL")),
        Err(_) => parse_shorthand(input),
    }
}

fn parse_shorthand(input: &str) -> Result<ParsedReference> {
    let mut segments = input.trim_matches('/').split('/');
    let owner = segments.next().unwrap_or_default();
    let repo_name = segments.next().unwrap_or_default();
    let sub_path = join_segments(segments);

    build(input, owner, repo_name, None, sub_path)
}

fn parse_url(input: &str, url: &Url, web_host: &str) -> Result<ParsedReference> {
    let host = url.host_str().unwrap_or_default();
    if !host.eq_ignore_ascii_case(web_host) {
        return Err(invalid(input, &format!("expected a {web_host} URL")));
    }

    let mut segments = url.path().trim_matches('/').split('/');
    let owner = segments.next().unwrap_or_default();
    let repo_name = segments.next().unwrap_or_default();

    let (branch, sub_path) = match segments.next() {
        None | Some("") => (None, String::new()),
        Some("tree") => {
            let branch = segments
                .next()
                .filter(|b| !b.is_empty())
                .ok_or_else(|| invalid(input, "missing branch after 'tree'"))?;
            (Some(branch.to_string()), join_segments(segments))
        }
        Some(other) => {
            return Err(invalid(
                input,
                &format!("expected 'tree/<branch>' after the repository, found '{other}'"),
            ))
        }
    };

    build(input, owner, repo_name, branch, sub_path)
}

fn build(
    input: &str,
    owner: &str,
    repo_name: &str,
    branch: Option<String>,
    sub_path: String,
) -> Result<ParsedReference> {
    if owner.is_empty() {
        return Err(invalid(input, "missing repository owner"));
    }
    if repo_name.is_empty() {
        return Err(invalid(input, "missing repository name"));
    }

    Ok(ParsedReference {
        owner: owner.to_string(),
        repo_name: repo_name.to_string(),
        branch,
        sub_path,
    })
}

fn join_segments<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    segments
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn segment_count(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

fn invalid(input: &str, reason: &str) -> ScaffoldError {
    ScaffoldError::InvalidReference {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Resolves template references into concrete repository references.
pub struct RepoReferenceResolver<'a> {
    client: &'a GitHubClient,
}

impl<'a> RepoReferenceResolver<'a> {
    /// Create a resolver backed by the given client.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Parse the reference and look up the default branch when none was given.
    pub async fn resolve(&self, input: &str) -> Result<RepositoryReference> {
        let parsed = parse_reference(input, &self.client.endpoints().web_host)?;

        let branch = match parsed.branch.clone() {
            Some(branch) => branch,
            None => {
                self.client
                    .default_branch(&parsed.owner, &parsed.repo_name)
                    .await?
            }
        };

        let reference = parsed.with_branch(branch);
        tracing::debug!("Resolved template reference {input} to {reference}");
        Ok(reference)
    }
}
