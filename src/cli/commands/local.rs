//! Local command implementation.
//!
//! The `scaffold local` command materializes a bundled template or a
//! template directory.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::bootstrap::{
    Collaborators, CommandGitInitializer, LocalBootstrap, LocalOptions, LocalTemplate,
};
use crate::cli::args::LocalArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::local::builtin;

use super::dispatcher::{Command, CommandResult};

/// The local command implementation.
pub struct LocalCommand {
    settings: Settings,
    args: LocalArgs,
}

impl LocalCommand {
    /// Create a new local command.
    pub fn new(settings: &Settings, args: LocalArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }

    /// Bundled names win over directories of the same name.
    fn template(&self) -> LocalTemplate {
        let name = &self.args.template;
        if builtin::get(name).is_ok() || !Path::new(name).is_dir() {
            LocalTemplate::Bundled(name.clone())
        } else {
            LocalTemplate::Directory(name.into())
        }
    }
}

#[async_trait]
impl Command for LocalCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let project = &self.args.project;
        let mut collaborators = Collaborators::default();
        if project.git {
            collaborators = collaborators.with_git(Arc::new(CommandGitInitializer::default()));
        }

        let outcome = LocalBootstrap::new(&self.settings, collaborators)?
            .run(&LocalOptions {
                template: self.template(),
                output_dir: project.output.clone(),
                project_id: project.project_id.clone(),
                dataset: project.dataset.clone(),
                project_name: self.args.project_name.clone(),
                package_name: project.package_name.clone(),
                typescript: self.args.typescript,
                auto_updates: self.args.auto_updates,
                schema_url: self.args.schema_url.clone(),
            })
            .await?;

        println!(
            "Created {} ({} template files, {} generated)",
            project.output.display(),
            outcome.copied.len(),
            outcome.generated.len()
        );
        for conflict in &outcome.conflicts {
            println!("  skipped existing {}", conflict.path.display());
        }

        let _ = outcome.metadata_update.await;
        Ok(CommandResult::success())
    }
}
