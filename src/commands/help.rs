use async_trait::async_trait;

use super::{Command, CommandResult, Context};

/// Listed in help; the registry renders the text itself.
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "/help"
    }

    fn aliases(&self) -> &[&str] {
        &["/h", "/?"]
    }

    fn description(&self) -> &str {
        "show available commands"
    }

    async fn execute(&self, _ctx: &Context<'_>, _args: &str) -> CommandResult {
        CommandResult::Handled
    }
}
