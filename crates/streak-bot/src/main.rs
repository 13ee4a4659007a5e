//! Streak Bot - Discord daily streak tracker.
//!
//! Run with: `cargo run -p streak-bot`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use streak_bot::{AppState, Bot, Config, api, commands};
use streak_core::leaderboard;
use streak_discord::{ChatPlatform, Gateway, GatewayConfig, RestClient};
use streak_store::{JsonStore, RecordStore};
use streak_types::UserId;

/// Streak Bot - daily streaks, nickname labels and a leaderboard for Discord.
#[derive(Parser, Debug)]
#[command(name = "streak-bot")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Streak file path (overrides config).
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// HTTP bind address (overrides config).
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// Bot token (overrides config).
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to Discord and track streaks (default behavior).
    Run {
        /// Do not start the HTTP server.
        #[arg(long)]
        no_server: bool,
    },

    /// Register the slash commands in the configured guild and exit.
    Register,

    /// Print a user's streak record.
    Show {
        /// Discord user id.
        user: UserId,
    },

    /// Print a leaderboard page.
    Top {
        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("streak_bot=info".parse()?)
                .add_directive("streak_discord=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = load_config(&args)?;

    match args.command {
        Some(Command::Run { no_server }) => run(config, no_server).await,
        None => run(config, false).await,
        Some(Command::Register) => register(config).await,
        Some(Command::Show { user }) => show(&config, &user),
        Some(Command::Top { page }) => top(&config, page),
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(path) = &args.store {
        config.storage.path = path.clone();
    }
    if let Some(token) = &args.token {
        config.discord.token = token.clone();
    }

    config.validate()?;
    Ok(config)
}

fn rest_client(config: &Config) -> anyhow::Result<RestClient> {
    config.discord.require_credentials()?;
    Ok(RestClient::new(
        &config.discord.token,
        &config.discord.application_id,
    )?)
}

async fn run(config: Config, no_server: bool) -> anyhow::Result<()> {
    let rest = Arc::new(rest_client(&config)?);

    let store = JsonStore::open(&config.storage.path)
        .with_context(|| format!("opening {}", config.storage.path.display()))?;

    if let Err(e) = rest
        .register_commands(&config.discord.guild_id, &commands::definitions())
        .await
    {
        warn!("Failed to register slash commands: {}", e);
    }

    let state = AppState::new(store, config.clone());

    if config.server.enabled && !no_server {
        let state = Arc::clone(&state);
        let bind = config.server.bind.clone();
        tokio::spawn(async move {
            if let Err(e) = serve(state, &bind).await {
                error!("HTTP server stopped: {:#}", e);
            }
        });
    } else {
        info!("HTTP server disabled");
    }

    let (events_tx, events_rx) = mpsc::channel(256);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let gateway = tokio::spawn(
        Gateway::new(GatewayConfig::new(config.discord.token.clone())).run(events_tx, shutdown_rx),
    );

    let bot = Bot::new(state, rest);
    tokio::select! {
        _ = bot.run(events_rx) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            let _ = shutdown_tx.send(true);
        }
    }

    gateway.await??;
    Ok(())
}

async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = bind.parse()?;
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn register(config: Config) -> anyhow::Result<()> {
    let rest = rest_client(&config)?;
    let definitions = commands::definitions();
    rest.register_commands(&config.discord.guild_id, &definitions)
        .await?;
    println!(
        "Registered {} commands in guild {}",
        definitions.len(),
        config.discord.guild_id
    );
    Ok(())
}

fn inspect(config: &Config) -> anyhow::Result<JsonStore> {
    JsonStore::load_readonly(&config.storage.path)
        .with_context(|| format!("reading {}", config.storage.path.display()))
}

fn show(config: &Config, user: &UserId) -> anyhow::Result<()> {
    let store = inspect(config)?;
    match store.peek(user) {
        Some(record) => {
            let last = match record.last_message {
                Some(at) => at.format(&time::format_description::well_known::Rfc3339)?,
                None => "never".to_string(),
            };
            println!("{}: {} day(s), last counted message: {}", user, record.streak, last);
        }
        None => println!("{}: no record", user),
    }
    Ok(())
}

fn top(config: &Config, page: i64) -> anyhow::Result<()> {
    let store = inspect(config)?;
    let page = leaderboard::page(store.list_all(), page.saturating_sub(1));

    if page.entries.is_empty() {
        println!("No streaks recorded");
    }
    for entry in &page.entries {
        println!("{:>4}. {:<20} {}", entry.rank, entry.user, entry.streak);
    }
    println!("Page {}/{}", page.index + 1, page.count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_store(path: PathBuf) -> Config {
        let mut config = Config::default();
        config.storage.path = path;
        config
    }

    #[test]
    fn test_show_leaves_corrupt_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        let truncated = r#"{"42": {"streak": 9, "lastMessage": 1705314600000},"#;
        std::fs::write(&path, truncated).unwrap();

        let config = config_with_store(path.clone());
        assert!(show(&config, &UserId::new(42)).is_err());
        assert!(top(&config, 1).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), truncated);
    }

    #[test]
    fn test_top_does_not_create_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo").join("nested").join("x.json");

        let config = config_with_store(path);
        assert!(top(&config, 1).is_err());
        assert!(show(&config, &UserId::new(1)).is_err());
        assert!(!dir.path().join("typo").exists());
    }

    #[test]
    fn test_inspection_reads_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rachas.json");
        let content = r#"{"42":{"streak":9,"lastMessage":1705314600000}}"#;
        std::fs::write(&path, content).unwrap();

        let config = config_with_store(path.clone());
        show(&config, &UserId::new(42)).unwrap();
        show(&config, &UserId::new(7)).unwrap();
        top(&config, 1).unwrap();
        top(&config, i64::MIN).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }
}
