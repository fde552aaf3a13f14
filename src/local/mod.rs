//! Local template materialization.
//!
//! Local templates are either bundled into the binary ([`builtin`]) or read
//! from a directory. Their files are copied as-is; the manifest and config
//! files are generated with [`process_template`].

pub mod builtin;
pub mod copy;
pub mod generate;
pub mod substitution;

pub use builtin::{BundledTemplate, TemplateManifest};
pub use copy::{copy_dir, to_typescript_path, write_bundled, Rename};
pub use generate::{
    generate_files, write_if_absent, FileWriteConflict, GenerateParams, GeneratedFile,
    WriteOutcome,
};
pub use substitution::{process_template, SubstitutionOptions, TemplateValue, TemplateVariables};
