//! List command implementation.
//!
//! The `scaffold list` command prints the bundled templates.

use async_trait::async_trait;

use crate::error::Result;
use crate::local::builtin;

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand;

#[async_trait]
impl Command for ListCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let templates = builtin::list()?;
        let width = templates.iter().map(|t| t.name.len()).max().unwrap_or(0);

        for template in &templates {
            println!(
                "{:width$}  {}",
                template.name, template.manifest.description
            );
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_succeeds() {
        let result = ListCommand.execute().await.unwrap();
        assert!(result.success);
    }
}
