//! Bootstrapping a project from a local template.

use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

use super::collaborators::{Collaborators, ProjectMetadata};
use crate::config::{Settings, TemplateConventions};
use crate::error::Result;
use crate::local::builtin::{self, TemplateManifest, TEMPLATE_MANIFEST};
use crate::local::{
    copy_dir, generate_files, to_typescript_path, write_bundled, write_if_absent,
    FileWriteConflict, GenerateParams, Rename, WriteOutcome,
};
use crate::remote::GitHubClient;

/// Where a local template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalTemplate {
    /// A template compiled into the binary.
    Bundled(String),
    /// A template directory on disk.
    Directory(PathBuf),
}

impl LocalTemplate {
    fn name(&self) -> String {
        match self {
            LocalTemplate::Bundled(name) => name.clone(),
            LocalTemplate::Directory(path) => path.display().to_string(),
        }
    }
}

/// Inputs of a local bootstrap run.
#[derive(Debug, Clone)]
pub struct LocalOptions {
    pub template: LocalTemplate,
    pub output_dir: PathBuf,
    pub project_id: String,
    pub dataset: String,
    /// Defaults to the output directory name.
    pub project_name: Option<String>,
    /// Defaults to a slug of the project name.
    pub package_name: Option<String>,
    pub typescript: bool,
    pub auto_updates: bool,
    /// Schema source fetched over HTTP and written as the schema index.
    pub schema_url: Option<String>,
}

/// Result of a local bootstrap run.
#[derive(Debug)]
pub struct LocalOutcome {
    /// Files copied from the template.
    pub copied: Vec<PathBuf>,
    pub schema_file: Option<PathBuf>,
    /// Generated files that were written.
    pub generated: Vec<PathBuf>,
    /// Generated files left alone because they already existed.
    pub conflicts: Vec<FileWriteConflict>,
    /// The detached metadata update; awaiting it is optional.
    pub metadata_update: JoinHandle<()>,
}

/// Runs the local sequence: copy, fetch schema, generate, write.
pub struct LocalBootstrap {
    client: GitHubClient,
    conventions: TemplateConventions,
    collaborators: Collaborators,
}

impl LocalBootstrap {
    pub fn new(settings: &Settings, collaborators: Collaborators) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::new(settings, None)?,
            conventions: settings.conventions.clone(),
            collaborators,
        })
    }

    pub async fn run(&self, options: &LocalOptions) -> Result<LocalOutcome> {
        let output = &options.output_dir;
        tokio::fs::create_dir_all(output).await?;

        let rename: Option<Rename> = options.typescript.then_some(to_typescript_path as Rename);
        let (copied, manifest) = match &options.template {
            LocalTemplate::Bundled(name) => {
                let template = builtin::get(name)?;
                let copied = write_bundled(&template, output, rename).await?;
                (copied, template.manifest)
            }
            LocalTemplate::Directory(dir) => {
                let copied = copy_dir(dir, output, rename).await?;
                (copied, directory_manifest(dir).await?)
            }
        };
        tracing::info!("Copied {} template files", copied.len());

        let schema_file = match &options.schema_url {
            Some(url) => Some(self.write_schema(url, output, options.typescript).await?),
            None => None,
        };

        let project_name = options.project_name.clone().unwrap_or_else(|| {
            output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "studio".to_string())
        });
        let params = GenerateParams {
            package_name: options
                .package_name
                .clone()
                .unwrap_or_else(|| package_name_from(&project_name)),
            project_name,
            project_id: options.project_id.clone(),
            dataset: options.dataset.clone(),
            typescript: options.typescript,
            auto_updates: options.auto_updates,
            core_dependency: self.conventions.core_dependency.clone(),
        };

        let mut generated = Vec::new();
        let mut conflicts = Vec::new();
        for file in generate_files(&params, &manifest)? {
            match write_if_absent(output, &file).await? {
                WriteOutcome::Written(path) => generated.push(path),
                WriteOutcome::Conflict(conflict) => conflicts.push(conflict),
            }
        }

        self.collaborators.init_git(output).await;

        let metadata_update = self.collaborators.spawn_metadata_update(ProjectMetadata {
            project_id: options.project_id.clone(),
            template: options.template.name(),
        });

        Ok(LocalOutcome {
            copied,
            schema_file,
            generated,
            conflicts,
            metadata_update,
        })
    }

    async fn write_schema(&self, url: &str, output: &Path, typescript: bool) -> Result<PathBuf> {
        let schema = self.client.fetch_text(url).await?;
        let ext = if typescript { "ts" } else { "js" };
        let path = output.join("schemaTypes").join(format!("index.{ext}"));

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, schema).await?;
        tracing::info!("Wrote schema from {url} to {}", path.display());
        Ok(path)
    }
}

async fn directory_manifest(dir: &Path) -> Result<TemplateManifest> {
    let path = dir.join(TEMPLATE_MANIFEST);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => TemplateManifest::parse(&content, &path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TemplateManifest::default()),
        Err(e) => Err(e.into()),
    }
}

/// Lowercase, dash-separated package name derived from a display name.
pub fn package_name_from(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches(['-', '.', '_']);
    if slug.is_empty() {
        "studio".to_string()
    } else {
        slug.to_string()
    }
}
