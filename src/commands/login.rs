use std::io::{BufRead, Write};

use async_trait::async_trait;

use super::go::navigate;
use super::{Command, CommandResult, Context};
use crate::api;
use crate::router::HOME_PATH;

pub struct LoginCommand;

#[async_trait]
impl Command for LoginCommand {
    fn name(&self) -> &str {
        "/login"
    }

    fn usage(&self) -> &str {
        "[username]"
    }

    fn description(&self) -> &str {
        "sign in to the workflow backend"
    }

    async fn execute(&self, ctx: &Context<'_>, args: &str) -> CommandResult {
        let username = match args {
            "" => match prompt("  username: ") {
                Some(name) => name,
                None => return CommandResult::Handled,
            },
            name => name.to_string(),
        };
        let Some(password) = prompt("  password: ") else {
            return CommandResult::Handled;
        };

        match api::auth::login(ctx.gateway, &username, &password).await {
            Ok(response) => {
                let name = response
                    .user_info
                    .as_ref()
                    .map(|user| user.display_name().to_string())
                    .unwrap_or(username);
                println!("  ✓ signed in as {name}");
                if let Err(e) = navigate(ctx, HOME_PATH).await {
                    eprintln!("  ✗ {e:#}");
                }
                CommandResult::AuthChanged(ctx.gateway.session().status_label())
            }
            Err(e) => {
                eprintln!("  ✗ {e:#}");
                CommandResult::Handled
            }
        }
    }
}

/// Read one trimmed, non-empty line from stdin. Input is echoed, the
/// password included; pass `-p` to `flowdesk login` to avoid typing it here.
// TODO: read the password without echo once a terminal crate is in the stack.
fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    if std::io::stdout().flush().is_err() {
        return None;
    }
    read_field(&mut std::io::stdin().lock())
}

fn read_field(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        eprintln!("  ✗ failed to read input");
        return None;
    }
    let line = line.trim();
    if line.is_empty() {
        eprintln!("  ✗ nothing entered");
        return None;
    }
    Some(line.to_string())
}
