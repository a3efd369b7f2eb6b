//! Built-in REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! and dynamic help generation. A slash input that names no command but
//! matches a route is treated as `/go <path>`.

pub mod call;
pub mod go;
mod help;
mod login;
mod logout;
mod quit;
mod whoami;

use async_trait::async_trait;
use std::sync::Arc;

use crate::gateway::Gateway;
use crate::router::guard::Guard;

/// Shared handles available to commands during execution.
pub struct Context<'a> {
    pub gateway: &'a Gateway,
    pub guard: &'a Guard,
    pub db_path: &'a str,
}

/// What the REPL should do after a command runs.
pub enum CommandResult {
    /// Not a command; the REPL prints a hint.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Sign-in state changed; carries the new status label.
    AuthChanged(String),
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/whoami"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis for `/help`, e.g. `"<path>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is everything after the command word.
    async fn execute(&self, ctx: &Context<'_>, args: &str) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(whoami::WhoamiCommand),
            Arc::new(login::LoginCommand),
            Arc::new(logout::LogoutCommand),
            Arc::new(go::GoCommand),
            Arc::new(call::CallCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, ctx: &Context<'_>) -> CommandResult {
        let input = input.trim();
        let (word, args) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        for command in &self.commands {
            if word == command.name() || command.aliases().contains(&word) {
                // /help needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(ctx, args).await;
            }
        }

        if word.starts_with('/') {
            if args.is_empty() && ctx.guard.router().match_path(word).is_some() {
                return go::GoCommand.execute(ctx, word).await;
            }
            println!("unknown command: {word}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.aliases(), c.usage()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out.push_str("\n  any route path, e.g. /dashboard, navigates like /go\n");
        out
    }

    /// All registered command names (for testing).
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, aliases: &[&str], usage: &str) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ClientSettings;
    use crate::events::EventBus;
    use crate::router::Router;
    use crate::session::Session;

    /// Owns what a [`Context`] borrows. Nothing here touches the network
    /// unless a command issues a call.
    pub(crate) struct Harness {
        pub gateway: Gateway,
        pub guard: Guard,
    }

    impl Harness {
        pub fn new() -> Self {
            let session = Arc::new(Session::in_memory());
            let events = Arc::new(EventBus::default());
            let gateway =
                Gateway::new(&ClientSettings::default(), session.clone(), events.clone()).unwrap();
            let guard = Guard::new(Router::default(), session, events);
            Self { gateway, guard }
        }

        pub fn ctx(&self) -> Context<'_> {
            Context {
                gateway: &self.gateway,
                guard: &self.guard,
                db_path: ":memory:",
            }
        }
    }

    #[test]
    fn all_builtins_registered() {
        let reg = CommandRegistry::new();
        let names = reg.names();
        for name in ["/help", "/whoami", "/login", "/logout", "/go", "/call", "/quit"] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn no_duplicate_triggers() {
        let reg = CommandRegistry::new();
        let triggers = reg.all_triggers();
        let mut seen = Vec::new();
        for t in &triggers {
            assert!(!seen.contains(t), "duplicate trigger: {t}");
            seen.push(t);
        }
    }

    #[test]
    fn help_text_includes_all_commands() {
        let reg = CommandRegistry::new();
        let text = reg.help_text();
        for name in reg.names() {
            assert!(text.contains(name), "help missing: {name}");
        }
        assert!(text.contains("/go <path>"));
    }

    #[tokio::test]
    async fn unknown_slash_command_is_handled() {
        let harness = Harness::new();
        let reg = CommandRegistry::new();
        assert!(matches!(
            reg.dispatch("/foobar baz", &harness.ctx()).await,
            CommandResult::Handled
        ));
    }

    #[tokio::test]
    async fn route_path_navigates() {
        let harness = Harness::new();
        let reg = CommandRegistry::new();
        assert!(matches!(
            reg.dispatch("/dashboard", &harness.ctx()).await,
            CommandResult::Handled
        ));
        // signed out, so the guard sent us to the login screen
        assert_eq!(
            harness.guard.current_title().as_deref(),
            Some("Sign in - Flowable Workflow")
        );
    }

    #[tokio::test]
    async fn non_command_passes_through() {
        let harness = Harness::new();
        let reg = CommandRegistry::new();
        assert!(matches!(
            reg.dispatch("hello world", &harness.ctx()).await,
            CommandResult::NotACommand
        ));
    }

    #[tokio::test]
    async fn registered_command_receives_args() {
        struct EchoCommand;

        #[async_trait]
        impl Command for EchoCommand {
            fn name(&self) -> &str {
                "/echo"
            }
            fn description(&self) -> &str {
                "echo"
            }
            async fn execute(&self, _ctx: &Context<'_>, args: &str) -> CommandResult {
                CommandResult::AuthChanged(args.to_string())
            }
        }

        let harness = Harness::new();
        let mut reg = CommandRegistry::new();
        reg.register(Arc::new(EchoCommand));
        match reg.dispatch("/echo   a b ", &harness.ctx()).await {
            CommandResult::AuthChanged(args) => assert_eq!(args, "a b"),
            _ => panic!("expected echo"),
        }
    }

    #[test]
    fn format_label_variants() {
        assert_eq!(format_label("/whoami", &[], ""), "/whoami");
        assert_eq!(format_label("/help", &["/h", "/?"], ""), "/help (/h, /?)");
        assert_eq!(format_label("/go", &[], "<path>"), "/go <path>");
    }
}
