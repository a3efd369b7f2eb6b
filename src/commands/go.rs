use anyhow::{Result, bail};
use async_trait::async_trait;

use super::{Command, CommandResult, Context};
use crate::router::RouteMatch;
use crate::router::guard::Navigation;
use crate::screens;

/// A redirect lands on login or home, both of which resolve in one more
/// pass; anything longer is a loop.
const MAX_HOPS: usize = 3;

pub struct GoCommand;

#[async_trait]
impl Command for GoCommand {
    fn name(&self) -> &str {
        "/go"
    }

    fn usage(&self) -> &str {
        "<path>"
    }

    fn description(&self) -> &str {
        "navigate to a screen, e.g. /go /task/my-tasks"
    }

    async fn execute(&self, ctx: &Context<'_>, args: &str) -> CommandResult {
        if args.is_empty() {
            for route in ctx.guard.router().routes() {
                if route.redirect.is_none() {
                    println!("  {:<24} {}", route.path, route.title);
                }
            }
            return CommandResult::Handled;
        }
        if let Err(e) = navigate(ctx, args).await {
            eprintln!("  ✗ {e:#}");
        }
        CommandResult::Handled
    }
}

/// Run the guard for `path`, follow its redirects, and print the screen
/// it finally lands on. Returns the matched route, or `None` when nothing
/// is mounted at the path.
pub async fn navigate(ctx: &Context<'_>, path: &str) -> Result<Option<RouteMatch>> {
    let mut target = path.to_string();
    for _ in 0..MAX_HOPS {
        match ctx.guard.before_each(&target) {
            Navigation::Proceed { matched, title } => {
                println!("  ── {title} ──");
                match screens::render(ctx.gateway, &matched).await {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("  ✗ failed to load screen: {e:#}"),
                }
                return Ok(Some(matched));
            }
            Navigation::Redirect { from, to } => {
                println!("  → {from} redirected to {to}");
                target = to.to_string();
            }
            Navigation::NotFound { path } => {
                eprintln!("  ✗ no screen at {path}");
                return Ok(None);
            }
        }
    }
    bail!("too many redirects starting at {path}")
}
