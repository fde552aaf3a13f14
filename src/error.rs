//! Error types for scaffold operations.
//!
//! This module defines [`ScaffoldError`], the primary error type used throughout
//! the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `ScaffoldError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `ScaffoldError::Other`) for unexpected errors
//! - Best-effort steps log and swallow their own errors instead of returning them

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for scaffold operations.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The template reference could not be parsed into owner and repository.
    #[error("Invalid template reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    /// The repository does not exist or is not visible with the supplied credentials.
    #[error(
        "Repository {owner}/{repo} not found. If this is a private repository, \
         supply a token with read access (e.g. via GITHUB_TOKEN)"
    )]
    NotFound { owner: String, repo: String },

    /// The repository metadata lookup failed for a reason other than 404.
    #[error("Failed to resolve repository {owner}/{repo}: {message}")]
    ResolutionFailed {
        owner: String,
        repo: String,
        message: String,
    },

    /// The template archive could not be downloaded or extracted.
    #[error("Failed to download template archive from {url}: {message}")]
    DownloadFailed { url: String, message: String },

    /// The remote template violates one of the eligibility rules.
    #[error("Template validation failed: {rule}")]
    ValidationFailed { rule: ValidationRule },

    /// No env template file exists in a package directory.
    #[error("No env template found in {}. Expected one of: {}", .dir.display(), .expected.join(", "))]
    EnvTemplateMissing { dir: PathBuf, expected: Vec<String> },

    /// A source template references a placeholder that has no value.
    #[error("Template variable '{name}' is not defined")]
    UndefinedTemplateVariable { name: String },

    /// A boolean placeholder is bound to a non-boolean value.
    #[error("Template variable '{name}' must be a boolean")]
    TemplateVariableType { name: String },

    /// A source template could not be tokenized.
    #[error("Invalid template source at byte {offset}: {message}")]
    TemplateSyntax { offset: usize, message: String },

    /// Referenced bundled template does not exist.
    #[error("Unknown template: {name}")]
    UnknownTemplate { name: String },

    /// Failed to parse the settings file.
    #[error("Failed to parse settings at {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for scaffold operations.
pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// A violated template eligibility rule, with the offending packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// A package has no manifest at all.
    ManifestMissing { package: String },
    /// A package manifest is not valid JSON.
    ManifestInvalid { package: String, message: String },
    /// An env template lacks required variables.
    EnvVariablesMissing {
        package: String,
        file: String,
        missing: Vec<String>,
    },
    /// No package depends on the core dependency.
    NoCoreDependency { dependency: String },
    /// No package carries a config file.
    NoTemplateConfig { files: Vec<String> },
    /// No package carries a CLI config file.
    NoCliConfig { files: Vec<String> },
    /// Some packages have no env template.
    MissingEnvTemplate {
        packages: Vec<String>,
        files: Vec<String>,
    },
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::ManifestMissing { package } => {
                write!(f, "package.json not found in package '{package}'")
            }
            ValidationRule::ManifestInvalid { package, message } => {
                write!(f, "package.json in package '{package}' is invalid: {message}")
            }
            ValidationRule::EnvVariablesMissing {
                package,
                file,
                missing,
            } => write!(
                f,
                "{file} in package '{package}' must define {}",
                missing.join(" and ")
            ),
            ValidationRule::NoCoreDependency { dependency } => write!(
                f,
                "at least one package must declare \"{dependency}\" as a dependency or dev dependency"
            ),
            ValidationRule::NoTemplateConfig { files } => write!(
                f,
                "at least one package must include one of: {}",
                files.join(", ")
            ),
            ValidationRule::NoCliConfig { files } => write!(
                f,
                "at least one package must include one of: {}",
                files.join(", ")
            ),
            ValidationRule::MissingEnvTemplate { packages, files } => write!(
                f,
                "the following packages are missing an env template ({}): {}",
                files.join(", "),
                packages.join(", ")
            ),
        }
    }
}
