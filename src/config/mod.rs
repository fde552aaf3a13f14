//! Configuration for the scaffold engine.
//!
//! - Endpoint, HTTP and convention settings in [`settings`]
//! - Template file names and env variable spellings in [`conventions`]
//!
//! # Example
//!
//! ```
//! use scaffold::config::Settings;
//!
//! let settings = Settings::load(None).unwrap();
//! assert_eq!(settings.conventions.env_output_file, ".env");
//! ```

pub mod conventions;
pub mod settings;

pub use conventions::{EnvVariablePatterns, TemplateConventions};
pub use settings::{Endpoints, HttpSettings, Settings};
