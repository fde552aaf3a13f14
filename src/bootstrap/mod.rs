//! Bootstrap sequences that turn a template into a configured project.
//!
//! [`RemoteBootstrap`] materializes a repository template and fills in its
//! env files. [`LocalBootstrap`] copies a local template and generates the
//! project manifest and config files. Both return an outcome record; nothing
//! is printed here.
//!
//! Neither sequence cleans up after a failure. Files written before the
//! failing step stay on disk.

pub mod collaborators;
pub mod local;
pub mod remote;

pub use collaborators::{
    Collaborators, CommandGitInitializer, CredentialIssuer, Framework, FrameworkDetector,
    GitInitializer, ManifestFrameworkDetector, ManifestPackageNamer, MetadataReporter,
    NoopMetadataReporter, PackageNamer, ProjectMetadata, StaticTokenIssuer,
};
pub use local::{LocalBootstrap, LocalOptions, LocalOutcome, LocalTemplate};
pub use remote::{PackageEnv, RemoteBootstrap, RemoteOptions, RemoteOutcome};
