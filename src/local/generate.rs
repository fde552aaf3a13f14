//! Generated project files for local templates.
//!
//! The manifest and the two config files are rendered from built-in sources
//! and written only where no file exists yet.

use serde_json::{json, Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::builtin::TemplateManifest;
use super::substitution::{process_template, SubstitutionOptions, TemplateVariables};
use crate::error::Result;

const STUDIO_CONFIG_TEMPLATE: &str = r#"import {defineConfig} from 'core'
import {structureTool} from 'core/structure'
import {schemaTypes} from './schemaTypes'

export default defineConfig({
  name: '%sourceName%',
  title: '%projectName%',

  projectId: '%projectId%',
  dataset: '%dataset%',

  plugins: [structureTool()],

  schema: {
    types: schemaTypes,
  },
})
"#;

const CLI_CONFIG_TEMPLATE: &str = r#"import {defineCliConfig} from 'core/cli'

export default defineCliConfig({
  api: {
    projectId: '%projectId%',
    dataset: '%dataset%',
  },
  deployment: {
    /**
     * Enable auto-updates for deployed projects.
     */
    autoUpdates: __BOOL__autoUpdates__,
  },
})
"#;

/// Version range of the core dependency in generated manifests.
pub const CORE_VERSION_RANGE: &str = "latest";

/// A file produced by generation, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub contents: String,
}

/// A generated file that was not written because the target already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWriteConflict {
    pub path: PathBuf,
}

/// What happened to a generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Conflict(FileWriteConflict),
}

/// Inputs for generated files.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub package_name: String,
    pub project_name: String,
    pub project_id: String,
    pub dataset: String,
    pub typescript: bool,
    pub auto_updates: bool,
    pub core_dependency: String,
}

impl GenerateParams {
    /// Extension for generated source files.
    pub fn extension(&self) -> &'static str {
        if self.typescript {
            "ts"
        } else {
            "js"
        }
    }

    fn variables(&self) -> TemplateVariables {
        let mut variables = TemplateVariables::new();
        variables.insert("projectId".into(), self.project_id.as_str().into());
        variables.insert("dataset".into(), self.dataset.as_str().into());
        variables.insert("projectName".into(), self.project_name.as_str().into());
        variables.insert("sourceName".into(), "default".into());
        variables.insert("autoUpdates".into(), self.auto_updates.into());
        variables
    }
}

/// Render the package manifest.
pub fn package_manifest(params: &GenerateParams, template: &TemplateManifest) -> Result<String> {
    let core = &params.core_dependency;

    let mut dependencies = Map::new();
    dependencies.insert(core.clone(), Value::from(CORE_VERSION_RANGE));
    for (name, version) in &template.dependencies {
        dependencies.insert(name.clone(), Value::from(version.as_str()));
    }

    let mut dev_dependencies = Map::new();
    for (name, version) in &template.dev_dependencies {
        dev_dependencies.insert(name.clone(), Value::from(version.as_str()));
    }
    if params.typescript {
        dev_dependencies
            .entry("typescript")
            .or_insert_with(|| Value::from("^5.8"));
    }

    let manifest = json!({
        "name": params.package_name,
        "private": true,
        "version": "1.0.0",
        "main": "package.json",
        "scripts": {
            "dev": format!("{core} dev"),
            "start": format!("{core} start"),
            "build": format!("{core} build"),
            "deploy": format!("{core} deploy"),
        },
        "keywords": [core],
        "dependencies": dependencies,
        "devDependencies": dev_dependencies,
    });

    let mut output = serde_json::to_string_pretty(&manifest).map_err(anyhow::Error::from)?;
    output.push('\n');
    Ok(output)
}

/// Render the manifest, config and CLI config for a local template.
pub fn generate_files(
    params: &GenerateParams,
    template: &TemplateManifest,
) -> Result<Vec<GeneratedFile>> {
    let variables = params.variables();
    let options = SubstitutionOptions {
        include_booleans: true,
    };
    let ext = params.extension();

    Ok(vec![
        GeneratedFile {
            path: PathBuf::from("package.json"),
            contents: package_manifest(params, template)?,
        },
        GeneratedFile {
            path: PathBuf::from(format!("config.{ext}")),
            contents: process_template(STUDIO_CONFIG_TEMPLATE, &variables, options)?,
        },
        GeneratedFile {
            path: PathBuf::from(format!("cli-config.{ext}")),
            contents: process_template(CLI_CONFIG_TEMPLATE, &variables, options)?,
        },
    ])
}

/// Write `file` under `root` unless something is already there.
///
/// Reports a conflict instead of overwriting.
pub async fn write_if_absent(root: &Path, file: &GeneratedFile) -> Result<WriteOutcome> {
    let path = root.join(&file.path);
    let opened = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await;

    match opened {
        Ok(mut handle) => {
            handle.write_all(file.contents.as_bytes()).await?;
            handle.flush().await?;
            Ok(WriteOutcome::Written(path))
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::warn!("{} already exists, leaving it untouched", path.display());
            Ok(WriteOutcome::Conflict(FileWriteConflict { path }))
        }
        Err(e) => Err(e.into()),
    }
}
