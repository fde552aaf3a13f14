//! Scaffold - create configured projects from templates.
//!
//! Scaffold turns a template reference into a ready-to-build project
//! directory. Templates are either bundled with the binary or live in a
//! repository on the hosting service.
//!
//! # Modules
//!
//! - [`bootstrap`] - Local and remote bootstrap sequences and their collaborators
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings: endpoints, HTTP options and template conventions
//! - [`env`] - Env template discovery and variable injection
//! - [`error`] - Error types and result aliases
//! - [`local`] - Bundled templates, file copy and placeholder substitution
//! - [`manifest`] - `package.json` access
//! - [`remote`] - Reference resolution, validation and archive extraction
//!
//! # Example
//!
//! ```
//! use scaffold::local::{process_template, SubstitutionOptions, TemplateVariables};
//!
//! let mut variables = TemplateVariables::new();
//! variables.insert("projectId".to_string(), "abc123".into());
//!
//! let source = "export default {projectId: \"%projectId%\"}";
//! let output = process_template(source, &variables, SubstitutionOptions::default()).unwrap();
//! assert_eq!(output, "export default {projectId: 'abc123'}");
//! ```
//!
//! For end-to-end runs against a mock hosting service, see the integration tests.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod local;
pub mod manifest;
pub mod remote;

pub use error::{Result, ScaffoldError};
