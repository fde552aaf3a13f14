//! Monorepo detection.
//!
//! A template repository may hold several packages declared by a workspace
//! file. Four declaration formats are recognised, checked in this order:
//!
//! 1. `package.json` with `workspaces` (array or `{ packages: [...] }`)
//! 2. `pnpm-workspace.yaml` with `packages`
//! 3. `lerna.json` with `packages`
//! 4. `rush.json` with `projects[].packageName`

use futures::future::join_all;
use serde::Deserialize;

use super::fetch::GitHubClient;
use super::reference::RepositoryReference;

/// A workspace declaration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceFormat {
    PackageJson,
    PnpmWorkspace,
    Lerna,
    Rush,
}

impl WorkspaceFormat {
    /// All formats, in evaluation priority order.
    pub const ALL: [WorkspaceFormat; 4] = [
        WorkspaceFormat::PackageJson,
        WorkspaceFormat::PnpmWorkspace,
        WorkspaceFormat::Lerna,
        WorkspaceFormat::Rush,
    ];

    /// The declaration file for this format.
    pub fn file_name(self) -> &'static str {
        match self {
            WorkspaceFormat::PackageJson => "package.json",
            WorkspaceFormat::PnpmWorkspace => "pnpm-workspace.yaml",
            WorkspaceFormat::Lerna => "lerna.json",
            WorkspaceFormat::Rush => "rush.json",
        }
    }

    /// Extract the package list from a declaration file.
    ///
    /// Returns `None` when the file does not parse or declares nothing.
    pub fn packages(self, content: &str) -> Option<Vec<String>> {
        let packages = match self {
            WorkspaceFormat::PackageJson => {
                let manifest: PackageJsonWorkspaces = serde_json::from_str(content).ok()?;
                match manifest.workspaces? {
                    Workspaces::List(list) => list,
                    Workspaces::Object { packages } => packages,
                }
            }
            WorkspaceFormat::PnpmWorkspace => {
                let workspace: PackagesField = serde_yaml::from_str(content).ok()?;
                workspace.packages
            }
            WorkspaceFormat::Lerna => {
                let lerna: PackagesField = serde_json::from_str(content).ok()?;
                lerna.packages
            }
            WorkspaceFormat::Rush => {
                let rush: RushConfig = serde_json::from_str(content).ok()?;
                rush.projects.into_iter().map(|p| p.package_name).collect()
            }
        };

        let packages: Vec<String> = packages
            .iter()
            .map(|p| normalize_package_path(p))
            .filter(|p| !p.is_empty())
            .collect();

        if packages.is_empty() {
            None
        } else {
            Some(packages)
        }
    }
}

#[derive(Deserialize)]
struct PackageJsonWorkspaces {
    workspaces: Option<Workspaces>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Workspaces {
    List(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

#[derive(Deserialize)]
struct PackagesField {
    #[serde(default)]
    packages: Vec<String>,
}

#[derive(Deserialize)]
struct RushConfig {
    #[serde(default)]
    projects: Vec<RushProject>,
}

#[derive(Deserialize)]
struct RushProject {
    #[serde(rename = "packageName")]
    package_name: String,
}

/// Strip `./` prefixes and trailing slashes from a workspace entry.
pub fn normalize_package_path(path: &str) -> String {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_end_matches('/').to_string()
}

/// Pick the first format, in priority order, that yields packages.
///
/// `contents` pairs each format with the fetched file, if any. The input
/// order does not matter.
pub fn select_packages(contents: &[(WorkspaceFormat, Option<String>)]) -> Option<Vec<String>> {
    WorkspaceFormat::ALL.into_iter().find_map(|format| {
        contents
            .iter()
            .find(|(f, _)| *f == format)
            .and_then(|(_, content)| content.as_deref())
            .and_then(|content| format.packages(content))
    })
}

/// Discovers monorepo member packages of a remote template.
pub struct MonorepoDetector<'a> {
    client: &'a GitHubClient,
}

impl<'a> MonorepoDetector<'a> {
    /// Create a detector backed by the given client.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Return the member package paths, or `None` for a single-package template.
    ///
    /// Unreachable or malformed declaration files count as absent.
    pub async fn detect(&self, reference: &RepositoryReference) -> Option<Vec<String>> {
        let fetches = WorkspaceFormat::ALL.into_iter().map(|format| async move {
            let content = match self.client.raw_file(reference, "", format.file_name()).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!("Ignoring {}: {}", format.file_name(), e);
                    None
                }
            };
            (format, content)
        });

        let contents = join_all(fetches).await;
        let packages = select_packages(&contents);

        match &packages {
            Some(list) => tracing::info!("Detected monorepo with packages: {}", list.join(", ")),
            None => tracing::debug!("No workspace declaration found in {reference}"),
        }
        packages
    }
}
