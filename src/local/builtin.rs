//! Bundled templates embedded at compile time.
//!
//! Each directory under `templates/` is one template. Its `template.yml`
//! describes the template and lists the packages it adds to the generated
//! manifest; every other file is copied into the project.

use include_dir::{include_dir, Dir, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, ScaffoldError};

/// Embedded templates directory.
static TEMPLATES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// File name of the per-template manifest.
pub const TEMPLATE_MANIFEST: &str = "template.yml";

/// Contents of a `template.yml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateManifest {
    pub description: String,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

impl TemplateManifest {
    /// Parse manifest YAML; `origin` names the file in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ScaffoldError::SettingsParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A template compiled into the binary.
#[derive(Debug, Clone)]
pub struct BundledTemplate {
    pub name: String,
    pub manifest: TemplateManifest,
    dir: &'static Dir<'static>,
}

impl BundledTemplate {
    fn from_dir(dir: &'static Dir<'static>) -> Result<Self> {
        let name = dir
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let manifest = match dir.get_file(dir.path().join(TEMPLATE_MANIFEST)) {
            Some(file) => {
                let content = file.contents_utf8().ok_or_else(|| ScaffoldError::SettingsParse {
                    path: file.path().to_path_buf(),
                    message: "Invalid UTF-8".to_string(),
                })?;
                TemplateManifest::parse(content, file.path())?
            }
            None => TemplateManifest::default(),
        };

        Ok(Self {
            name,
            manifest,
            dir,
        })
    }

    /// All files to copy, with paths relative to the template root.
    pub fn files(&self) -> Vec<(&'static Path, &'static [u8])> {
        let mut files = Vec::new();
        collect_files(self.dir, &mut files);
        files
            .into_iter()
            .filter_map(|file| {
                let relative = file.path().strip_prefix(self.dir.path()).ok()?;
                (relative != Path::new(TEMPLATE_MANIFEST)).then_some((relative, file.contents()))
            })
            .collect()
    }
}

fn collect_files(dir: &'static Dir<'static>, files: &mut Vec<&'static File<'static>>) {
    files.extend(dir.files());
    for child in dir.dirs() {
        collect_files(child, files);
    }
}

/// All bundled templates, sorted by name.
pub fn list() -> Result<Vec<BundledTemplate>> {
    let mut templates = TEMPLATES_DIR
        .dirs()
        .map(BundledTemplate::from_dir)
        .collect::<Result<Vec<_>>>()?;
    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(templates)
}

/// Look up a bundled template by name.
pub fn get(name: &str) -> Result<BundledTemplate> {
    match TEMPLATES_DIR.get_dir(name) {
        Some(dir) if !name.contains(['/', '\\']) => BundledTemplate::from_dir(dir),
        _ => Err(ScaffoldError::UnknownTemplate {
            name: name.to_string(),
        }),
    }
}
