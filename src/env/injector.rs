//! Env file injection.
//!
//! Values are written into an existing env template by rewriting only the
//! value part of recognised assignment lines. Everything else in the file,
//! including comments, ordering and line endings, is kept byte for byte.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::variables::{compile, EnvTemplateVariable, EnvValues};
use crate::config::TemplateConventions;
use crate::error::{Result, ScaffoldError};

/// Result of a single injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvInjection {
    /// Template file the values were merged into.
    pub template: PathBuf,
    /// File that was written.
    pub written: PathBuf,
}

/// Merges env values into a package directory's env template.
#[async_trait]
pub trait EnvInjector: Send + Sync {
    /// Inject `values` into the env template found in `dir` and write the
    /// result to `dir/output_file`.
    async fn inject(&self, dir: &Path, values: &EnvValues, output_file: &str)
        -> Result<EnvInjection>;
}

/// Line-level regex injector.
#[derive(Debug, Clone, Default)]
pub struct RegexEnvInjector {
    conventions: TemplateConventions,
}

impl RegexEnvInjector {
    pub fn new(conventions: TemplateConventions) -> Self {
        Self { conventions }
    }
}

#[async_trait]
impl EnvInjector for RegexEnvInjector {
    async fn inject(
        &self,
        dir: &Path,
        values: &EnvValues,
        output_file: &str,
    ) -> Result<EnvInjection> {
        let template = find_env_template(dir, &self.conventions.env_template_files)
            .await
            .ok_or_else(|| ScaffoldError::EnvTemplateMissing {
                dir: dir.to_path_buf(),
                expected: self.conventions.env_template_files.clone(),
            })?;

        let content = tokio::fs::read_to_string(&template).await?;
        let variables = values.variables(&self.conventions.env_variables);
        let rendered = apply_env_variables(&content, &variables)?;

        let written = dir.join(output_file);
        tokio::fs::write(&written, rendered).await?;
        tracing::debug!(
            "Wrote {} from {}",
            written.display(),
            template.display()
        );

        Ok(EnvInjection { template, written })
    }
}

/// The first env template that exists in `dir`, in priority order.
pub async fn find_env_template(dir: &Path, candidates: &[String]) -> Option<PathBuf> {
    for name in candidates {
        let path = dir.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Some(path);
        }
    }
    None
}

/// Whether the template quotes its values.
pub fn uses_quoted_values(content: &str) -> bool {
    content.contains("=\"")
}

/// Rewrite the value of the first assignment matching each variable.
///
/// Variables with no matching line are left out; nothing is appended.
pub fn apply_env_variables(content: &str, variables: &[EnvTemplateVariable]) -> Result<String> {
    let quoted = uses_quoted_values(content);
    let mut output = content.to_string();

    for variable in variables {
        output = replace_assignment(&output, &variable.pattern, &variable.value, quoted)?;
    }

    Ok(output)
}

fn replace_assignment(content: &str, pattern: &str, value: &str, quoted: bool) -> Result<String> {
    // Comment lines never match: the name prefix may not contain '#'.
    let line = compile(&format!(r"(?m)^[^#=\r\n]*?(?:{pattern})=[^\r\n]*"))?;

    let Some(found) = line.find(content) else {
        return Ok(content.to_string());
    };

    let name = found
        .as_str()
        .split_once('=')
        .map(|(name, _)| name)
        .unwrap_or_default();

    let assignment = if quoted {
        format!("{name}=\"{value}\"")
    } else {
        format!("{name}={value}")
    };

    let mut output = String::with_capacity(content.len() + value.len());
    output.push_str(&content[..found.start()]);
    output.push_str(&assignment);
    output.push_str(&content[found.end()..]);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvVariablePatterns;
    use tempfile::TempDir;

    fn vars(values: &EnvValues) -> Vec<EnvTemplateVariable> {
        values.variables(&EnvVariablePatterns::default())
    }

    fn values() -> EnvValues {
        EnvValues::new("abc123", "production").with_api_version("2025-01-01")
    }

    #[test]
    fn replaces_unquoted_values() {
        let template = "# Project\nCORE_PROJECT_ID=\nCORE_DATASET=\nOTHER=keep\n";
        let output = apply_env_variables(template, &vars(&values())).unwrap();
        assert_eq!(
            output,
            "# Project\nCORE_PROJECT_ID=abc123\nCORE_DATASET=production\nOTHER=keep\n"
        );
    }

    #[test]
    fn preserves_quoted_style() {
        let template = "CORE_STUDIO_PROJECT_ID=\"\"\nCORE_STUDIO_DATASET=\"\"\nCORE_API_READ_TOKEN=\n";
        let output = apply_env_variables(
            template,
            &vars(&values().with_read_token("sk-read")),
        )
        .unwrap();
        assert_eq!(
            output,
            "CORE_STUDIO_PROJECT_ID=\"abc123\"\nCORE_STUDIO_DATASET=\"production\"\nCORE_API_READ_TOKEN=\"sk-read\"\n"
        );
    }

    #[test]
    fn keeps_framework_prefix_in_name() {
        let template = "NEXT_PUBLIC_CORE_PROJECT_ID=placeholder\nNEXT_PUBLIC_CORE_DATASET=placeholder\n";
        let output = apply_env_variables(template, &vars(&values())).unwrap();
        assert_eq!(
            output,
            "NEXT_PUBLIC_CORE_PROJECT_ID=abc123\nNEXT_PUBLIC_CORE_DATASET=production\n"
        );
    }

    #[test]
    fn never_invents_variables() {
        let template = "CORE_PROJECT_ID=\nCORE_DATASET=\n";
        let output = apply_env_variables(
            template,
            &vars(&values().with_read_token("token")),
        )
        .unwrap();
        assert!(!output.contains("READ_TOKEN"));
        assert!(!output.contains("API_VERSION"));
    }

    #[test]
    fn only_first_matching_line_is_rewritten() {
        let template = "CORE_DATASET=a\nCORE_DATASET=b\n";
        let output = apply_env_variables(template, &vars(&values())).unwrap();
        assert_eq!(output, "CORE_DATASET=production\nCORE_DATASET=b\n");
    }

    #[test]
    fn comments_are_untouched() {
        let template = "# CORE_PROJECT_ID=your-id\nCORE_PROJECT_ID=\n";
        let output = apply_env_variables(template, &vars(&values())).unwrap();
        assert_eq!(output, "# CORE_PROJECT_ID=your-id\nCORE_PROJECT_ID=abc123\n");
    }

    #[test]
    fn crlf_line_endings_are_preserved() {
        let template = "CORE_PROJECT_ID=\r\nCORE_DATASET=\r\nKEEP=1\r\n";
        let output = apply_env_variables(template, &vars(&values())).unwrap();
        assert_eq!(
            output,
            "CORE_PROJECT_ID=abc123\r\nCORE_DATASET=production\r\nKEEP=1\r\n"
        );
    }

    #[test]
    fn injection_is_idempotent() {
        let template = "\n# header\nexport CORE_STUDIO_PROJECT_ID=\"x\"\nCORE_DATASET=\"y\" \nCORE_API_VERSION=\"\"\n\n";
        let variables = vars(&values());
        let once = apply_env_variables(template, &variables).unwrap();
        let twice = apply_env_variables(&once, &variables).unwrap();
        assert_eq!(once, twice);
        assert!(once.starts_with("\n# header\nexport CORE_STUDIO_PROJECT_ID=\"abc123\"\n"));
        assert!(once.contains("CORE_API_VERSION=\"2025-01-01\""));
    }

    #[test]
    fn values_with_dollar_signs_are_literal() {
        let template = "CORE_PROJECT_ID=\n";
        let values = EnvValues::new("$1$2", "d");
        let output = apply_env_variables(template, &vars(&values)).unwrap();
        assert_eq!(output, "CORE_PROJECT_ID=$1$2\n");
    }

    #[tokio::test]
    async fn inject_uses_first_template_in_priority_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".env.example"), "CORE_PROJECT_ID=example\n").unwrap();
        std::fs::write(temp.path().join(".env.template"), "CORE_PROJECT_ID=template\n").unwrap();

        let injector = RegexEnvInjector::default();
        let injection = injector
            .inject(temp.path(), &values(), ".env")
            .await
            .unwrap();

        assert_eq!(injection.template, temp.path().join(".env.template"));
        assert_eq!(
            std::fs::read_to_string(temp.path().join(".env")).unwrap(),
            "CORE_PROJECT_ID=abc123\n"
        );
        assert_eq!(
            std::fs::read_to_string(temp.path().join(".env.template")).unwrap(),
            "CORE_PROJECT_ID=template\n"
        );
    }

    #[tokio::test]
    async fn inject_writes_framework_specific_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".env.local.example"),
            "NEXT_PUBLIC_CORE_DATASET=\n",
        )
        .unwrap();

        let injection = RegexEnvInjector::default()
            .inject(temp.path(), &values(), ".env.local")
            .await
            .unwrap();

        assert_eq!(injection.written, temp.path().join(".env.local"));
        assert_eq!(
            std::fs::read_to_string(&injection.written).unwrap(),
            "NEXT_PUBLIC_CORE_DATASET=production\n"
        );
    }

    #[tokio::test]
    async fn inject_without_template_fails() {
        let temp = TempDir::new().unwrap();
        let result = RegexEnvInjector::default()
            .inject(temp.path(), &values(), ".env")
            .await;
        assert!(matches!(
            result,
            Err(ScaffoldError::EnvTemplateMissing { .. })
        ));
    }
}
