//! Template conventions.
//!
//! The marker files and env variable spellings a remote template has to use.
//! They are plain data so a settings file can adapt the engine to a different
//! product without code changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File names and variable spellings recognised in templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConventions {
    /// Package that at least one template package must depend on.
    pub core_dependency: String,

    /// Package manifest file name.
    pub manifest_file: String,

    /// Config file name variants.
    pub config_files: Vec<String>,

    /// CLI config file name variants.
    pub cli_config_files: Vec<String>,

    /// Env template names, in lookup priority order.
    pub env_template_files: Vec<String>,

    /// Env file written when no framework is detected.
    pub env_output_file: String,

    /// Env file written per detected framework slug.
    pub framework_env_files: BTreeMap<String, String>,

    /// Variable name patterns (regular expressions).
    pub env_variables: EnvVariablePatterns,
}

/// Accepted spellings of the canonical env variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvVariablePatterns {
    pub project_id: String,
    pub dataset: String,
    pub read_token: String,
    pub api_version: String,
}

impl Default for EnvVariablePatterns {
    fn default() -> Self {
        Self {
            project_id: "CORE(?:_STUDIO)?_PROJECT_ID".to_string(),
            dataset: "CORE(?:_STUDIO)?_DATASET".to_string(),
            read_token: "CORE_API_READ_TOKEN".to_string(),
            api_version: "CORE(?:_STUDIO)?_API_VERSION".to_string(),
        }
    }
}

impl Default for TemplateConventions {
    fn default() -> Self {
        let mut framework_env_files = BTreeMap::new();
        framework_env_files.insert("nextjs".to_string(), ".env.local".to_string());

        Self {
            core_dependency: "core".to_string(),
            manifest_file: "package.json".to_string(),
            config_files: strings(&["config.ts", "config.js"]),
            cli_config_files: strings(&["cli-config.ts", "cli-config.js"]),
            env_template_files: strings(&[".env.template", ".env.example", ".env.local.example"]),
            env_output_file: ".env".to_string(),
            framework_env_files,
            env_variables: EnvVariablePatterns::default(),
        }
    }
}

impl TemplateConventions {
    /// The env file to write for a package, given its detected framework.
    pub fn env_output_for(&self, framework_slug: Option<&str>) -> &str {
        framework_slug
            .and_then(|slug| self.framework_env_files.get(slug))
            .map(String::as_str)
            .unwrap_or(&self.env_output_file)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
