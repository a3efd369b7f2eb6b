use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::debug;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

use flowdesk::api;
use flowdesk::banner::{BannerInfo, print_banner, print_farewell};
use flowdesk::commands::call::{call, describe, parse_query_pair};
use flowdesk::commands::go::navigate;
use flowdesk::commands::{CommandRegistry, CommandResult, Context};
use flowdesk::config::{
    ClientSettings, Config, KEY_BASE_URL, KEY_ON_UNAUTHORIZED, KEY_TIMEOUT_SECS, Overrides,
};
use flowdesk::consts::default_db_path;
use flowdesk::demo::{self, DEMO_BPMN};
use flowdesk::events::{Event, EventBus};
use flowdesk::gateway::{Gateway, UnauthorizedPolicy};
use flowdesk::router::guard::Guard;
use flowdesk::router::{HOME_PATH, Router};
use flowdesk::session::{MemorySessionStore, Session, SessionStore, SqliteSessionStore};

const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnUnauthorized {
    /// Clear the stored session and report that it expired
    ClearSession,
    /// Only report the failure
    Propagate,
}

impl From<OnUnauthorized> for UnauthorizedPolicy {
    fn from(value: OnUnauthorized) -> Self {
        match value {
            OnUnauthorized::ClearSession => Self::ClearSession,
            OnUnauthorized::Propagate => Self::Propagate,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "flowdesk",
    version,
    about = "Terminal client for a Flowable workflow backend."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Backend origin, e.g. http://localhost:8080
    #[arg(long, global = true, env = "FLOWDESK_BASE_URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long, global = true, env = "FLOWDESK_TIMEOUT")]
    timeout: Option<u64>,

    /// SQLite database for session and config (use :memory: for ephemeral)
    #[arg(short, long, global = true, env = "FLOWDESK_DB")]
    db: Option<String>,

    /// What to do when the backend rejects the stored token
    #[arg(long, global = true, value_enum)]
    on_unauthorized: Option<OnUnauthorized>,

    /// Verbosity, repeat for more (-v warn, -vv info, -vvv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the stored session and confirm it with the backend
    Whoami,
    /// Deploy a process, start it and list the applicant's tasks
    Demo {
        /// BPMN file to deploy instead of the bundled leave process
        #[arg(long)]
        bpmn: Option<PathBuf>,
    },
    /// Upload a BPMN file as a new deployment
    Deploy {
        file: PathBuf,
        /// Deployment name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Send one raw request through the gateway
    Call {
        /// GET, POST, PUT or DELETE
        method: String,
        path: String,
        /// Query parameter, repeatable
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Show, set or unset stored configuration
    Config {
        /// base_url, timeout_secs or on_unauthorized
        key: Option<String>,
        value: Option<String>,
        #[arg(long, conflicts_with = "value")]
        unset: bool,
    },
}

const CONFIG_KEYS: [&str; 3] = [KEY_BASE_URL, KEY_TIMEOUT_SECS, KEY_ON_UNAUTHORIZED];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let db = cli
        .db
        .clone()
        .unwrap_or_else(|| default_db_path().to_string_lossy().into_owned());
    ensure_parent_dir(&db)?;

    let config = Config::open(&db)?;
    if let Some(Command::Config { key, value, unset }) = &cli.command {
        return handle_config(&config, key.as_deref(), value.as_deref(), *unset);
    }

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        timeout_secs: cli.timeout,
        on_unauthorized: cli.on_unauthorized.map(Into::into),
    };
    let settings = ClientSettings::resolve(&config, &overrides)?;
    debug!(?settings, db = %db, "settings resolved");

    let store: Box<dyn SessionStore> = if db == MEMORY_DB {
        Box::new(MemorySessionStore::new())
    } else {
        Box::new(SqliteSessionStore::open(&db)?)
    };
    let session = Arc::new(Session::new(store));
    let events = Arc::new(EventBus::default());
    let gateway = Gateway::new(&settings, session.clone(), events.clone())?;

    if let Some(command) = cli.command {
        return run_command(&gateway, command).await;
    }

    let guard = Guard::new(Router::default(), session, events.clone());
    let db_label: &str = if db == MEMORY_DB { "ephemeral" } else { &db };
    repl(&gateway, &guard, &events, &settings, db_label).await
}

/// Verbosity flags pick the default level; `RUST_LOG` still wins.
fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let verbosity_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy();
    let subscriber = Registry::default()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn ensure_parent_dir(db: &str) -> anyhow::Result<()> {
    if db == MEMORY_DB {
        return Ok(());
    }
    if let Some(parent) = Path::new(db).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn handle_config(
    config: &Config,
    key: Option<&str>,
    value: Option<&str>,
    unset: bool,
) -> anyhow::Result<()> {
    let Some(key) = key else {
        for key in CONFIG_KEYS {
            let stored = config.get(key)?.unwrap_or_else(|| "(default)".to_string());
            println!("{key:<16} {stored}");
        }
        return Ok(());
    };
    if !CONFIG_KEYS.contains(&key) {
        bail!("unknown config key: {key} (expected one of {})", CONFIG_KEYS.join(", "));
    }

    match (value, unset) {
        (_, true) => {
            config.remove(key)?;
            println!("✓ {key} unset");
        }
        (Some(value), false) => {
            // Reject values the resolver would fail on later.
            match key {
                KEY_TIMEOUT_SECS => {
                    value
                        .parse::<u64>()
                        .with_context(|| format!("{key} must be a whole number of seconds"))?;
                }
                KEY_ON_UNAUTHORIZED => {
                    value.parse::<UnauthorizedPolicy>()?;
                }
                _ => {}
            }
            config.set(key, value)?;
            println!("✓ {key} = {value}");
        }
        (None, false) => match config.get(key)? {
            Some(stored) => println!("{stored}"),
            None => println!("(default)"),
        },
    }
    Ok(())
}

async fn run_command(gateway: &Gateway, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    print!("password: ");
                    io::stdout().flush()?;
                    let mut line = String::new();
                    io::stdin().read_line(&mut line)?;
                    line.trim().to_string()
                }
            };
            if password.is_empty() {
                bail!("no password provided");
            }
            let response = api::auth::login(gateway, &username, &password).await?;
            let name = response
                .user_info
                .as_ref()
                .map(|user| user.display_name().to_string())
                .unwrap_or(username);
            println!("✓ signed in as {name}");
        }
        Command::Logout => {
            api::auth::logout(gateway).await?;
            println!("✓ signed out");
        }
        Command::Whoami => {
            let session = gateway.session();
            println!("backend  {}", gateway.base().origin());
            println!("auth     {}", session.status_label());
            if session.is_authenticated() {
                match api::auth::current_user(gateway).await {
                    Ok(user) => println!("user     {} (confirmed by backend)", user.display_name()),
                    Err(e) => println!("user     could not confirm: {e}"),
                }
            }
        }
        Command::Demo { bpmn } => {
            let xml = match bpmn {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => DEMO_BPMN.to_string(),
            };
            demo::run(gateway, &xml).await?;
        }
        Command::Deploy {
            file,
            name,
            category,
        } => {
            let xml = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "process.bpmn".to_string());
            let name = name.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_name.clone())
            });
            let deployment_id =
                api::process::upload_bpmn(gateway, &name, category.as_deref(), &file_name, xml)
                    .await
                    .context("deploy failed")?;
            println!("✓ deployed {name}, deployment id {deployment_id}");
        }
        Command::Call {
            method,
            path,
            query,
            body,
        } => {
            let query = query
                .iter()
                .map(|raw| parse_query_pair(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let body = body
                .map(|raw| serde_json::from_str(&raw).context("--body is not valid JSON"))
                .transpose()?;
            let request = describe(&method, &path, &query, body)?;
            println!("{}", call(gateway, request).await?);
        }
        Command::Config { .. } => bail!("config is handled before connecting"),
    }
    Ok(())
}

async fn repl(
    gateway: &Gateway,
    guard: &Guard,
    events: &EventBus,
    settings: &ClientSettings,
    db_label: &str,
) -> anyhow::Result<()> {
    let registry = CommandRegistry::new();
    let ctx = Context {
        gateway,
        guard,
        db_path: db_label,
    };
    let mut rx = events.subscribe();

    let mut auth_status = gateway.session().status_label();
    print_banner(&BannerInfo {
        backend: gateway.base().origin(),
        auth_status: &auth_status,
        timeout_secs: settings.timeout.as_secs(),
        db: db_label,
    });

    // Open at home, like a browser landing on the app root.
    if let Err(e) = navigate(&ctx, HOME_PATH).await {
        eprintln!("✗ {e:#}");
    }

    // async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        loop {
            match rx.try_recv() {
                Ok(Event::TitleChanged { title }) => set_terminal_title(&title),
                Ok(Event::SessionExpired) => {
                    println!("  ! session expired, sign in again with /login");
                    auth_status = gateway.session().status_label();
                }
                Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "missed events"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        print!("\nflowdesk ({auth_status})> ");
        io::stdout().flush()?;

        // Read next line, interruptible by Ctrl+C
        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Ctrl+C during a command cancels the command, not the REPL
        tokio::select! {
            result = registry.dispatch(input, &ctx) => match result {
                CommandResult::Quit => break,
                CommandResult::AuthChanged(status) => auth_status = status,
                CommandResult::NotACommand => {
                    println!("commands start with /, type /help for a list");
                }
                CommandResult::Handled => {}
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n\ninterrupted");
            }
        }
    }

    print_farewell();
    Ok(())
}

/// Mirror the screen title into the terminal window title.
fn set_terminal_title(title: &str) {
    if io::stdout().is_terminal() {
        print!("\x1b]0;{title}\x07");
        let _ = io::stdout().flush();
    }
}
