//! Remote template acquisition.
//!
//! A remote template is a repository (or a directory inside one) on the
//! hosting service. Acquiring it happens in stages:
//!
//! 1. [`RepoReferenceResolver`] turns user input into a [`RepositoryReference`]
//! 2. [`MonorepoDetector`] finds member packages, if any
//! 3. [`TemplateValidator`] checks every package before anything is downloaded
//! 4. [`download_and_extract`] streams the tarball into the output directory

pub mod archive;
pub mod fetch;
pub mod monorepo;
pub mod reference;
pub mod validator;

pub use archive::{download_and_extract, ArchiveExtractor, ExtractSummary};
pub use fetch::GitHubClient;
pub use monorepo::{MonorepoDetector, WorkspaceFormat};
pub use reference::{parse_reference, ParsedReference, RepoReferenceResolver, RepositoryReference};
pub use validator::{package_label, PackageValidation, TemplateValidator, ValidationResult};
