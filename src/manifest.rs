//! Package manifest (`package.json`) access.
//!
//! Only the fields the engine relies on are modelled; everything else in a
//! manifest is carried through untouched when it is rewritten.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// The fields of a package manifest the engine reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,

    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, Value>>,

    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: Option<BTreeMap<String, Value>>,
}

impl PackageManifest {
    /// Parse manifest text. Anything other than a JSON object is an error.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Read and parse a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()).into())
    }

    /// Whether `name` is a direct or dev dependency.
    pub fn declares(&self, name: &str) -> bool {
        [&self.dependencies, &self.dev_dependencies]
            .into_iter()
            .flatten()
            .any(|deps| deps.contains_key(name))
    }
}

/// Set the `name` field of a manifest, keeping all other fields in order.
pub fn with_package_name(content: &str, name: &str) -> Result<String> {
    let mut manifest: Value = serde_json::from_str(content).map_err(anyhow::Error::from)?;
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("package manifest is not a JSON object"))?;
    object.insert("name".to_string(), Value::String(name.to_string()));

    let mut output = serde_json::to_string_pretty(&manifest).map_err(anyhow::Error::from)?;
    output.push('\n');
    Ok(output)
}
