use async_trait::async_trait;

use super::{Command, CommandResult, Context};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show backend, sign-in status and current screen"
    }

    async fn execute(&self, ctx: &Context<'_>, _args: &str) -> CommandResult {
        print!("{}", summary(ctx));
        CommandResult::Handled
    }
}

fn summary(ctx: &Context<'_>) -> String {
    let session = ctx.gateway.session();
    let mut out = format!(
        "  backend   {}\n  auth      {}\n",
        ctx.gateway.base().origin(),
        session.status_label()
    );
    match session.user_info() {
        Ok(Some(user)) => {
            out.push_str(&format!("  user      {}\n", user.username));
            if let Some(email) = &user.email {
                out.push_str(&format!("  email     {email}\n"));
            }
            if let Some(tenant) = &user.tenant_id {
                out.push_str(&format!("  tenant    {tenant}\n"));
            }
        }
        Ok(None) => {}
        Err(e) => out.push_str(&format!("  user      unreadable ({e})\n")),
    }
    if let Some(title) = ctx.guard.current_title() {
        out.push_str(&format!("  screen    {title}\n"));
    }
    out.push_str(&format!("  db        {}\n", ctx.db_path));
    out
}
