//! Bootstrapping a project from a remote repository template.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::collaborators::{Collaborators, Framework, ProjectMetadata};
use crate::config::{Settings, TemplateConventions};
use crate::env::{find_env_template, CanonicalVariable, EnvInjection, EnvInjector, EnvValues, RegexEnvInjector};
use crate::error::Result;
use crate::remote::{
    download_and_extract, package_label, ExtractSummary, GitHubClient, MonorepoDetector,
    RepoReferenceResolver, RepositoryReference, TemplateValidator,
};

/// Inputs of a remote bootstrap run.
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// Shorthand or URL reference to the template.
    pub reference: String,
    pub output_dir: PathBuf,
    pub project_id: String,
    pub dataset: String,
    pub package_name: Option<String>,
    pub api_version: Option<String>,
}

/// Env file written for one package.
#[derive(Debug, Clone)]
pub struct PackageEnv {
    pub package: String,
    pub framework: Option<Framework>,
    pub injection: EnvInjection,
}

/// Result of a remote bootstrap run.
#[derive(Debug)]
pub struct RemoteOutcome {
    pub reference: RepositoryReference,
    /// Package paths, `""` for the root.
    pub packages: Vec<String>,
    pub extracted: ExtractSummary,
    pub env_files: Vec<PackageEnv>,
    /// The detached metadata update; awaiting it is optional.
    pub metadata_update: JoinHandle<()>,
}

/// A package whose env template has been inspected.
struct EnvProbe {
    package: String,
    dir: PathBuf,
    needs_read_token: bool,
}

/// Runs the remote sequence: resolve, detect, validate, extract, inject.
pub struct RemoteBootstrap {
    client: GitHubClient,
    conventions: TemplateConventions,
    injector: Arc<dyn EnvInjector>,
    collaborators: Collaborators,
}

impl RemoteBootstrap {
    pub fn new(
        settings: &Settings,
        github_token: Option<String>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::new(settings, github_token)?,
            conventions: settings.conventions.clone(),
            injector: Arc::new(RegexEnvInjector::new(settings.conventions.clone())),
            collaborators,
        })
    }

    /// Replace the env injector.
    pub fn with_injector(mut self, injector: Arc<dyn EnvInjector>) -> Self {
        self.injector = injector;
        self
    }

    pub async fn run(&self, options: &RemoteOptions) -> Result<RemoteOutcome> {
        let reference = RepoReferenceResolver::new(&self.client)
            .resolve(&options.reference)
            .await?;
        tracing::info!("Using template {reference}");

        let packages = MonorepoDetector::new(&self.client)
            .detect(&reference)
            .await
            .unwrap_or_else(|| vec![String::new()]);

        TemplateValidator::new(&self.client, &self.conventions)
            .validate(&reference, &packages)
            .await?;

        let extracted = download_and_extract(&self.client, &reference, &options.output_dir).await?;
        tracing::info!(
            "Extracted {} files into {}",
            extracted.written,
            options.output_dir.display()
        );

        let probes = self.probe_env_templates(&options.output_dir, &packages).await?;

        let mut values = EnvValues::new(&options.project_id, &options.dataset);
        if let Some(version) = &options.api_version {
            values = values.with_api_version(version);
        }
        if probes.iter().any(|p| p.needs_read_token) {
            let token = self
                .collaborators
                .credentials
                .issue_read_token(&options.project_id)
                .await?;
            values = values.with_read_token(token);
        }

        let env_files =
            try_join_all(probes.iter().map(|probe| self.inject_package(probe, &values))).await?;

        if let Some(name) = &options.package_name {
            if let Err(e) = self
                .collaborators
                .package_namer
                .apply_name(&options.output_dir, name)
                .await
            {
                tracing::warn!("Could not set package name to {name}: {e}");
            }
        }

        self.collaborators.init_git(&options.output_dir).await;

        let metadata_update = self.collaborators.spawn_metadata_update(ProjectMetadata {
            project_id: options.project_id.clone(),
            template: reference.to_string(),
        });

        Ok(RemoteOutcome {
            reference,
            packages,
            extracted,
            env_files,
            metadata_update,
        })
    }

    /// Find each package's env template and whether it asks for a read token.
    async fn probe_env_templates(&self, root: &Path, packages: &[String]) -> Result<Vec<EnvProbe>> {
        let read_token = CanonicalVariable::ReadToken.regex(&self.conventions.env_variables)?;
        let mut probes = Vec::new();

        for package in packages {
            let dir = root.join(package);
            let Some(template) = find_env_template(&dir, &self.conventions.env_template_files).await
            else {
                tracing::debug!("No env template in {}", dir.display());
                continue;
            };
            let content = tokio::fs::read_to_string(&template).await?;
            probes.push(EnvProbe {
                package: package.clone(),
                needs_read_token: read_token.is_match(&content),
                dir,
            });
        }

        Ok(probes)
    }

    async fn inject_package(&self, probe: &EnvProbe, values: &EnvValues) -> Result<PackageEnv> {
        let framework = self.collaborators.frameworks.detect(&probe.dir).await;
        if let Some(Framework {
            slug,
            env_prefix: Some(prefix),
        }) = &framework
        {
            tracing::debug!(
                "Package {} uses {slug}; client-visible variables need the {prefix} prefix",
                package_label(&probe.package)
            );
        }
        let output_file = self
            .conventions
            .env_output_for(framework.as_ref().map(|f| f.slug.as_str()));

        let injection = self.injector.inject(&probe.dir, values, output_file).await?;
        tracing::info!("Wrote {}", injection.written.display());

        Ok(PackageEnv {
            package: probe.package.clone(),
            framework,
            injection,
        })
    }
}
