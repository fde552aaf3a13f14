//! Remote template validation.
//!
//! Every package of a template is checked concurrently for its marker files.
//! The per-package results are then reduced across the whole template:
//!
//! - at least one package must depend on the core dependency
//! - at least one package must have a config file
//! - at least one package must have a CLI config file
//! - every package must have an env template

use futures::future::try_join_all;
use std::collections::HashMap;

use super::fetch::GitHubClient;
use super::reference::RepositoryReference;
use crate::config::TemplateConventions;
use crate::env::CanonicalVariable;
use crate::error::{Result, ScaffoldError, ValidationRule};
use crate::manifest::PackageManifest;

/// Marker-file findings for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub has_template_config: bool,
    pub has_cli_config: bool,
    pub has_env_file: bool,
    pub declares_core_dependency: bool,
}

/// A package path with its findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageValidation {
    pub package: String,
    pub result: ValidationResult,
}

/// Human name of a package path.
pub fn package_label(package: &str) -> String {
    if package.is_empty() {
        "root".to_string()
    } else {
        package.to_string()
    }
}

/// Evaluate one package from the marker files that were found.
///
/// `files` maps file names to their contents; absent files are not in the map.
pub fn evaluate_package(
    package: &str,
    files: &HashMap<String, String>,
    conventions: &TemplateConventions,
) -> Result<ValidationResult> {
    let fail = |rule| Err(ScaffoldError::ValidationFailed { rule });

    let Some(manifest) = files.get(&conventions.manifest_file) else {
        return fail(ValidationRule::ManifestMissing {
            package: package_label(package),
        });
    };
    let manifest = match PackageManifest::parse(manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            return fail(ValidationRule::ManifestInvalid {
                package: package_label(package),
                message: e.to_string(),
            })
        }
    };

    let present = |names: &[String]| names.iter().any(|name| files.contains_key(name));

    let env_template = conventions
        .env_template_files
        .iter()
        .find_map(|name| files.get(name).map(|content| (name, content)));

    if let Some((file, content)) = env_template {
        let mut missing = Vec::new();
        for variable in [CanonicalVariable::ProjectId, CanonicalVariable::Dataset] {
            let regex = variable.regex(&conventions.env_variables)?;
            if !regex.is_match(content) {
                missing.push(variable.pattern(&conventions.env_variables).to_string());
            }
        }
        if !missing.is_empty() {
            return fail(ValidationRule::EnvVariablesMissing {
                package: package_label(package),
                file: file.clone(),
                missing,
            });
        }
    }

    Ok(ValidationResult {
        has_template_config: present(conventions.config_files.as_slice()),
        has_cli_config: present(conventions.cli_config_files.as_slice()),
        has_env_file: env_template.is_some(),
        declares_core_dependency: manifest.declares(&conventions.core_dependency),
    })
}

/// Apply the cross-package rules.
pub fn reduce_results(
    results: &[PackageValidation],
    conventions: &TemplateConventions,
) -> Result<()> {
    let any = |check: fn(&ValidationResult) -> bool| results.iter().any(|r| check(&r.result));

    let rule = if !any(|r| r.declares_core_dependency) {
        Some(ValidationRule::NoCoreDependency {
            dependency: conventions.core_dependency.clone(),
        })
    } else if !any(|r| r.has_template_config) {
        Some(ValidationRule::NoTemplateConfig {
            files: conventions.config_files.clone(),
        })
    } else if !any(|r| r.has_cli_config) {
        Some(ValidationRule::NoCliConfig {
            files: conventions.cli_config_files.clone(),
        })
    } else {
        let missing: Vec<String> = results
            .iter()
            .filter(|r| !r.result.has_env_file)
            .map(|r| package_label(&r.package))
            .collect();
        (!missing.is_empty()).then(|| ValidationRule::MissingEnvTemplate {
            packages: missing,
            files: conventions.env_template_files.clone(),
        })
    };

    match rule {
        Some(rule) => Err(ScaffoldError::ValidationFailed { rule }),
        None => Ok(()),
    }
}

/// Checks that a remote repository is a usable template.
pub struct TemplateValidator<'a> {
    client: &'a GitHubClient,
    conventions: &'a TemplateConventions,
}

impl<'a> TemplateValidator<'a> {
    pub fn new(client: &'a GitHubClient, conventions: &'a TemplateConventions) -> Self {
        Self {
            client,
            conventions,
        }
    }

    /// Validate all packages; fails on the first violated rule.
    pub async fn validate(
        &self,
        reference: &RepositoryReference,
        packages: &[String],
    ) -> Result<Vec<PackageValidation>> {
        let results = try_join_all(
            packages
                .iter()
                .map(|package| self.validate_package(reference, package)),
        )
        .await?;

        reduce_results(&results, self.conventions)?;
        tracing::info!("Template {reference} passed validation");
        Ok(results)
    }

    async fn validate_package(
        &self,
        reference: &RepositoryReference,
        package: &str,
    ) -> Result<PackageValidation> {
        let conventions = self.conventions;
        let names: Vec<&String> = std::iter::once(&conventions.manifest_file)
            .chain(&conventions.config_files)
            .chain(&conventions.cli_config_files)
            .chain(&conventions.env_template_files)
            .collect();

        let contents = try_join_all(
            names
                .iter()
                .map(|name| self.client.raw_file(reference, package, name)),
        )
        .await?;

        let files: HashMap<String, String> = names
            .into_iter()
            .zip(contents)
            .filter_map(|(name, content)| content.map(|c| (name.clone(), c)))
            .collect();

        tracing::debug!(
            "Package {} has marker files: {:?}",
            package_label(package),
            files.keys().collect::<Vec<_>>()
        );

        let result = evaluate_package(package, &files, conventions)?;
        Ok(PackageValidation {
            package: package.to_string(),
            result,
        })
    }
}
