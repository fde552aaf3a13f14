//! Services the bootstrap sequences call out to.
//!
//! Each collaborator is a trait so callers can swap in their own backends.
//! The implementations here are the ones the command line uses.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::manifest::{with_package_name, PackageManifest};

/// Issues API read tokens for a project.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue_read_token(&self, project_id: &str) -> Result<String>;
}

/// A frontend framework found in a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framework {
    pub slug: String,
    /// Prefix the framework requires for client-visible env variables.
    ///
    /// Informational: injection keeps whatever names the env template uses.
    pub env_prefix: Option<String>,
}

/// Detects the framework a package is built with.
#[async_trait]
pub trait FrameworkDetector: Send + Sync {
    async fn detect(&self, path: &Path) -> Option<Framework>;
}

/// Renames the package in a project's manifest.
#[async_trait]
pub trait PackageNamer: Send + Sync {
    async fn apply_name(&self, project_dir: &Path, name: &str) -> Result<()>;
}

/// What is recorded about a freshly created project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub project_id: String,
    pub template: String,
}

/// Records project metadata with the backing service.
#[async_trait]
pub trait MetadataReporter: Send + Sync {
    async fn report(&self, metadata: &ProjectMetadata) -> Result<()>;
}

/// Initializes version control in a new project.
#[async_trait]
pub trait GitInitializer: Send + Sync {
    async fn init(&self, dir: &Path) -> Result<()>;
}

/// Hands out a token that was supplied up front.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIssuer {
    token: Option<String>,
}

impl StaticTokenIssuer {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl CredentialIssuer for StaticTokenIssuer {
    async fn issue_read_token(&self, project_id: &str) -> Result<String> {
        self.token.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "template needs a read token for project {project_id}; supply one with --read-token"
            )
            .into()
        })
    }
}

/// Framework detection from the dependencies in `package.json`.
#[derive(Debug, Clone, Default)]
pub struct ManifestFrameworkDetector;

/// Dependency name, slug and env prefix, most specific first.
const KNOWN_FRAMEWORKS: &[(&str, &str, Option<&str>)] = &[
    ("next", "nextjs", Some("NEXT_PUBLIC_")),
    ("nuxt", "nuxt", Some("NUXT_PUBLIC_")),
    ("astro", "astro", Some("PUBLIC_")),
    ("@sveltejs/kit", "sveltekit", Some("PUBLIC_")),
    ("@remix-run/react", "remix", None),
    ("gatsby", "gatsby", Some("GATSBY_")),
    ("vite", "vite", Some("VITE_")),
];

impl ManifestFrameworkDetector {
    /// Match a parsed manifest against the known frameworks.
    pub fn from_manifest(manifest: &PackageManifest) -> Option<Framework> {
        KNOWN_FRAMEWORKS
            .iter()
            .find(|(dependency, _, _)| manifest.declares(dependency))
            .map(|(_, slug, prefix)| Framework {
                slug: slug.to_string(),
                env_prefix: prefix.map(String::from),
            })
    }
}

#[async_trait]
impl FrameworkDetector for ManifestFrameworkDetector {
    async fn detect(&self, path: &Path) -> Option<Framework> {
        let manifest = PackageManifest::load(&path.join("package.json")).await.ok()?;
        let framework = Self::from_manifest(&manifest);
        if let Some(framework) = &framework {
            tracing::debug!("Detected {} in {}", framework.slug, path.display());
        }
        framework
    }
}

/// Rewrites the `name` field of `package.json`.
#[derive(Debug, Clone, Default)]
pub struct ManifestPackageNamer;

#[async_trait]
impl PackageNamer for ManifestPackageNamer {
    async fn apply_name(&self, project_dir: &Path, name: &str) -> Result<()> {
        let path = project_dir.join("package.json");
        let content = tokio::fs::read_to_string(&path).await?;
        tokio::fs::write(&path, with_package_name(&content, name)?).await?;
        Ok(())
    }
}

/// Reporter for runs without a backing service.
#[derive(Debug, Clone, Default)]
pub struct NoopMetadataReporter;

#[async_trait]
impl MetadataReporter for NoopMetadataReporter {
    async fn report(&self, metadata: &ProjectMetadata) -> Result<()> {
        tracing::debug!(
            "Not reporting template {} for project {}",
            metadata.template,
            metadata.project_id
        );
        Ok(())
    }
}

/// Runs `git init` and an initial commit.
#[derive(Debug, Clone)]
pub struct CommandGitInitializer {
    pub commit_message: String,
}

impl Default for CommandGitInitializer {
    fn default() -> Self {
        Self {
            commit_message: "Initial commit".to_string(),
        }
    }
}

impl CommandGitInitializer {
    async fn git(dir: &Path, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into())
        }
    }
}

#[async_trait]
impl GitInitializer for CommandGitInitializer {
    async fn init(&self, dir: &Path) -> Result<()> {
        Self::git(dir, &["init"]).await?;
        Self::git(dir, &["add", "."]).await?;
        Self::git(dir, &["commit", "-m", &self.commit_message]).await
    }
}

/// The collaborators a bootstrap run uses.
#[derive(Clone)]
pub struct Collaborators {
    pub credentials: Arc<dyn CredentialIssuer>,
    pub frameworks: Arc<dyn FrameworkDetector>,
    pub package_namer: Arc<dyn PackageNamer>,
    pub metadata: Arc<dyn MetadataReporter>,
    /// Only invoked when set.
    pub git: Option<Arc<dyn GitInitializer>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            credentials: Arc::new(StaticTokenIssuer::default()),
            frameworks: Arc::new(ManifestFrameworkDetector),
            package_namer: Arc::new(ManifestPackageNamer),
            metadata: Arc::new(NoopMetadataReporter),
            git: None,
        }
    }
}

impl Collaborators {
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialIssuer>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_package_namer(mut self, package_namer: Arc<dyn PackageNamer>) -> Self {
        self.package_namer = package_namer;
        self
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataReporter>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_git(mut self, git: Arc<dyn GitInitializer>) -> Self {
        self.git = Some(git);
        self
    }

    /// Report metadata in the background; failures are only logged.
    pub(crate) fn spawn_metadata_update(&self, metadata: ProjectMetadata) -> JoinHandle<()> {
        let reporter = Arc::clone(&self.metadata);
        tokio::spawn(async move {
            if let Err(e) = reporter.report(&metadata).await {
                tracing::warn!("Failed to update project metadata: {e}");
            }
        })
    }

    /// Initialize git if configured; failures are only logged.
    pub(crate) async fn init_git(&self, dir: &Path) {
        if let Some(git) = &self.git {
            if let Err(e) = git.init(dir).await {
                tracing::warn!("Git initialization failed: {e}");
            }
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("git", &self.git.is_some())
            .finish_non_exhaustive()
    }
}
