//! fieldTask device registration client.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fieldtask_config_and_utils::{init_logging, Config, Paths};

/// fieldTask device registration command-line interface.
#[derive(Parser)]
#[command(name = "fieldtask")]
#[command(about = "Register this device for fieldTask push messaging")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for settings, config and logs. Defaults to ~/.fieldtask
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the server and user, then register the stored push token
    Login {
        /// Server url, e.g. https://sg.smap.com.au
        #[arg(long)]
        server: String,
        /// Username on that server
        #[arg(long)]
        username: String,
    },
    /// Store a new push token and register it
    Token {
        /// Push token issued by the messaging service
        token: String,
    },
    /// Register a token explicitly
    Register {
        #[arg(long)]
        token: String,
        #[arg(long)]
        server: String,
        #[arg(long)]
        username: String,
    },
    /// Show the registration stored for a token
    Lookup {
        #[arg(long)]
        token: String,
    },
    /// Remove the registration for a token
    Unregister {
        #[arg(long)]
        token: String,
    },
    /// Fetch (or reuse) cloud credentials and show their identity and expiry
    Credentials,
    /// Forget credentials, identity and signed-in context
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, &paths, true);

    config.validate()?;
    paths.ensure_dirs()?;

    let state = app::AppState::new(&config, &paths)?;

    match cli.command {
        Commands::Login { server, username } => app::login(&state, &server, &username).await?,
        Commands::Token { token } => app::new_token(&state, &token).await?,
        Commands::Register {
            token,
            server,
            username,
        } => app::register(&state, &token, &server, &username).await?,
        Commands::Lookup { token } => app::lookup(&state, &token).await?,
        Commands::Unregister { token } => app::unregister(&state, &token).await?,
        Commands::Credentials => app::show_credentials(&state).await?,
        Commands::Logout => app::logout(&state)?,
    }

    Ok(())
}
