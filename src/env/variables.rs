//! Canonical env variables and the values injected into them.

use regex::Regex;
use std::fmt;

use crate::config::EnvVariablePatterns;
use crate::error::{Result, ScaffoldError};

/// A logical env value that templates may spell in several ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalVariable {
    ProjectId,
    Dataset,
    ReadToken,
    ApiVersion,
}

impl CanonicalVariable {
    /// All variables, in injection order.
    pub const ALL: [CanonicalVariable; 4] = [
        CanonicalVariable::ProjectId,
        CanonicalVariable::Dataset,
        CanonicalVariable::ReadToken,
        CanonicalVariable::ApiVersion,
    ];

    /// The accepted-spelling pattern for this variable.
    pub fn pattern(self, patterns: &EnvVariablePatterns) -> &str {
        match self {
            CanonicalVariable::ProjectId => &patterns.project_id,
            CanonicalVariable::Dataset => &patterns.dataset,
            CanonicalVariable::ReadToken => &patterns.read_token,
            CanonicalVariable::ApiVersion => &patterns.api_version,
        }
    }

    /// Compile the accepted-spelling pattern.
    pub fn regex(self, patterns: &EnvVariablePatterns) -> Result<Regex> {
        compile(self.pattern(patterns))
    }
}

impl fmt::Display for CanonicalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CanonicalVariable::ProjectId => "PROJECT_ID",
            CanonicalVariable::Dataset => "DATASET",
            CanonicalVariable::ReadToken => "READ_TOKEN",
            CanonicalVariable::ApiVersion => "API_VERSION",
        };
        f.write_str(name)
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ScaffoldError::Other(anyhow::anyhow!(
            "invalid env variable pattern '{pattern}': {e}"
        ))
    })
}

/// One variable to inject: what it is, how it is spelled, and its new value.
#[derive(Debug, Clone)]
pub struct EnvTemplateVariable {
    pub canonical: CanonicalVariable,
    pub pattern: String,
    pub value: String,
}

/// Values supplied for env injection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvValues {
    pub project_id: String,
    pub dataset: String,
    pub read_token: Option<String>,
    pub api_version: Option<String>,
}

impl EnvValues {
    /// Values with only the required fields set.
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    /// Attach a read token.
    pub fn with_read_token(mut self, token: impl Into<String>) -> Self {
        self.read_token = Some(token.into());
        self
    }

    /// Attach an API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Pair every canonical variable with its pattern and value.
    ///
    /// A missing read token becomes an empty string and a missing API
    /// version becomes today's UTC date.
    pub fn variables(&self, patterns: &EnvVariablePatterns) -> Vec<EnvTemplateVariable> {
        CanonicalVariable::ALL
            .into_iter()
            .map(|canonical| {
                let value = match canonical {
                    CanonicalVariable::ProjectId => self.project_id.clone(),
                    CanonicalVariable::Dataset => self.dataset.clone(),
                    CanonicalVariable::ReadToken => self.read_token.clone().unwrap_or_default(),
                    CanonicalVariable::ApiVersion => self
                        .api_version
                        .clone()
                        .unwrap_or_else(default_api_version),
                };
                EnvTemplateVariable {
                    canonical,
                    pattern: canonical.pattern(patterns).to_string(),
                    value,
                }
            })
            .collect()
    }
}

/// Today's date in `YYYY-MM-DD` form.
pub fn default_api_version() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
