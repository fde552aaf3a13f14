//! Remote command implementation.
//!
//! The `scaffold remote` command materializes a repository template.

use async_trait::async_trait;
use std::sync::Arc;

use crate::bootstrap::{
    Collaborators, CommandGitInitializer, RemoteBootstrap, RemoteOptions, StaticTokenIssuer,
};
use crate::cli::args::RemoteArgs;
use crate::config::Settings;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The remote command implementation.
pub struct RemoteCommand {
    settings: Settings,
    args: RemoteArgs,
}

impl RemoteCommand {
    /// Create a new remote command.
    pub fn new(settings: &Settings, args: RemoteArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }

    fn collaborators(&self) -> Collaborators {
        let collaborators = Collaborators::default()
            .with_credentials(Arc::new(StaticTokenIssuer::new(self.args.read_token.clone())));
        if self.args.project.git {
            collaborators.with_git(Arc::new(CommandGitInitializer::default()))
        } else {
            collaborators
        }
    }
}

#[async_trait]
impl Command for RemoteCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let project = &self.args.project;
        let bootstrap = RemoteBootstrap::new(
            &self.settings,
            self.args.github_token.clone(),
            self.collaborators(),
        )?;

        let outcome = bootstrap
            .run(&RemoteOptions {
                reference: self.args.reference.clone(),
                output_dir: project.output.clone(),
                project_id: project.project_id.clone(),
                dataset: project.dataset.clone(),
                package_name: project.package_name.clone(),
                api_version: self.args.api_version.clone(),
            })
            .await?;

        println!(
            "Created {} from {} ({} files)",
            project.output.display(),
            outcome.reference,
            outcome.extracted.written
        );
        for env in &outcome.env_files {
            println!("  env: {}", env.injection.written.display());
        }

        // Give the metadata update a chance to finish before the runtime exits.
        let _ = outcome.metadata_update.await;
        Ok(CommandResult::success())
    }
}
