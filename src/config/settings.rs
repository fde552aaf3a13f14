//! Engine settings.
//!
//! Settings are read from an optional YAML file. Every section has defaults,
//! so an empty file (or no file at all) yields a working configuration that
//! talks to the public hosting service.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::conventions::TemplateConventions;
use crate::error::{Result, ScaffoldError};

/// Top-level settings for a scaffold run.
///
/// # Example
///
/// ```
/// use scaffold::config::Settings;
///
/// let settings = Settings::parse("http:\n  timeout_secs: 5\n").unwrap();
/// assert_eq!(settings.http.timeout_secs, 5);
/// assert_eq!(settings.endpoints.web_host, "github.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hosting service endpoints.
    pub endpoints: Endpoints,

    /// HTTP client options.
    pub http: HttpSettings,

    /// File names and variable spellings a remote template must follow.
    pub conventions: TemplateConventions,
}

/// Base URLs of the hosting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// REST API base, used for repository metadata.
    pub api_base: String,

    /// Raw file content base.
    pub raw_base: String,

    /// Tarball download base.
    pub codeload_base: String,

    /// Host name accepted in URL-form template references.
    pub web_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            codeload_base: "https://codeload.github.com".to_string(),
            web_host: "github.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every API endpoint at a single base URL.
    ///
    /// Used by tests that serve metadata, raw files and tarballs from one
    /// mock server.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            api_base: base.clone(),
            raw_base: base.clone(),
            codeload_base: base,
            ..Self::default()
        }
    }
}

/// HTTP client options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("scaffold/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpSettings {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Parse settings from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_at(content, Path::new("<inline>"))
    }

    /// Load settings from a file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| ScaffoldError::SettingsParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let settings = Self::parse_at(&content, path)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    fn parse_at(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| ScaffoldError::SettingsParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
