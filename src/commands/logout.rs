use async_trait::async_trait;

use super::go::navigate;
use super::{Command, CommandResult, Context};
use crate::api;
use crate::router::LOGIN_PATH;

pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    fn name(&self) -> &str {
        "/logout"
    }

    fn description(&self) -> &str {
        "sign out and clear the stored session"
    }

    async fn execute(&self, ctx: &Context<'_>, _args: &str) -> CommandResult {
        if let Err(e) = api::auth::logout(ctx.gateway).await {
            eprintln!("  ✗ failed to clear session: {e:#}");
            return CommandResult::Handled;
        }
        println!("  ✓ signed out");
        if let Err(e) = navigate(ctx, LOGIN_PATH).await {
            eprintln!("  ✗ {e:#}");
        }
        CommandResult::AuthChanged(ctx.gateway.session().status_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Harness;

    #[tokio::test]
    async fn signed_out_logout_needs_no_backend() {
        let harness = Harness::new();
        match LogoutCommand.execute(&harness.ctx(), "").await {
            CommandResult::AuthChanged(status) => assert_eq!(status, "not authenticated"),
            _ => panic!("expected auth change"),
        }
        assert_eq!(
            harness.guard.current_title().as_deref(),
            Some("Sign in - Flowable Workflow")
        );
    }
}
