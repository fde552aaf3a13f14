//! Env file handling for materialized packages.
//!
//! Remote templates ship an env template (`.env.template`, `.env.example`
//! or `.env.local.example`). The engine fills in the canonical variables and
//! writes the result next to it, keeping the template's formatting.
//!
//! # Example
//!
//! ```
//! use scaffold::config::EnvVariablePatterns;
//! use scaffold::env::{apply_env_variables, EnvValues};
//!
//! let template = "# Studio\nCORE_STUDIO_PROJECT_ID=\"\"\nCORE_STUDIO_DATASET=\"\"\n";
//! let values = EnvValues::new("abc123", "production");
//! let variables = values.variables(&EnvVariablePatterns::default());
//!
//! let output = apply_env_variables(template, &variables).unwrap();
//! assert_eq!(
//!     output,
//!     "# Studio\nCORE_STUDIO_PROJECT_ID=\"abc123\"\nCORE_STUDIO_DATASET=\"production\"\n"
//! );
//! ```

pub mod injector;
pub mod variables;

pub use injector::{
    apply_env_variables, find_env_template, uses_quoted_values, EnvInjection, EnvInjector,
    RegexEnvInjector,
};
pub use variables::{default_api_version, CanonicalVariable, EnvTemplateVariable, EnvValues};
