//! # rusty-forum
//!
//! Command-line client for the forum API. Assembles the HTTP gateway, the
//! token store and the services from `configs::Settings`.

mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api_adapters::{HttpForumApi, HttpOptions};
use configs::{LogSettings, Settings};
use domains::{AccessToken, TokenStore, VoteDirection};
use services::{ForumClient, Gateways, VotingOptions};
use storage_adapters::{FileTokenStore, MemoryTokenStore};

#[derive(Parser)]
#[command(name = "rusty-forum", about = "Forum client with optimistic voting", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and keep the access token
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored access token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List threads, optionally narrowed to one category
    Threads {
        #[arg(long)]
        category: Option<String>,
    },

    /// Show a thread with its comments
    Thread { id: String },

    /// Start a new thread
    NewThread {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        category: Option<String>,
    },

    /// Reply to a thread
    Comment {
        thread_id: String,
        #[arg(long)]
        content: String,
    },

    /// Vote on a thread or comment; repeating a vote clears it
    Vote {
        #[command(subcommand)]
        target: VoteCommand,
    },

    /// Show the leaderboard
    Leaderboard,
}

#[derive(Subcommand)]
enum VoteCommand {
    Thread {
        thread_id: String,
        direction: Direction,
    },
    Comment {
        thread_id: String,
        comment_id: String,
        direction: Direction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for VoteDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => VoteDirection::Up,
            Direction::Down => VoteDirection::Down,
        }
    }
}

impl Command {
    /// Login and register establish their own session.
    fn restores_session(&self) -> bool {
        !matches!(self, Command::Register { .. } | Command::Login { .. })
    }
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn token_store(settings: &Settings) -> Arc<dyn TokenStore> {
    if let Some(token) = settings.token() {
        return Arc::new(MemoryTokenStore::with_token(AccessToken::new(token.expose_secret())));
    }
    match settings.token_path() {
        Some(path) => Arc::new(FileTokenStore::new(path)),
        None => Arc::new(MemoryTokenStore::new()),
    }
}

fn build_client(settings: &Settings) -> anyhow::Result<ForumClient> {
    let mut options = HttpOptions {
        request_timeout: settings.request_timeout(),
        ..HttpOptions::default()
    };
    if let Some(user_agent) = &settings.api.user_agent {
        options.user_agent = user_agent.clone();
    }

    let api = HttpForumApi::new(settings.api.base_url.clone(), options)
        .context("building HTTP client")?;
    let voting = VotingOptions {
        timeout: settings.vote_timeout(),
    };

    Ok(ForumClient::new(
        Gateways::from_single(Arc::new(api)),
        token_store(settings),
        voting,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);
    info!(base_url = %settings.api.base_url, "rusty-forum starting");

    let client = build_client(&settings)?;

    if cli.command.restores_session() {
        if let Err(e) = client.restore_session().await {
            warn!(error = %e, "could not restore session");
        }
    }

    commands::run(&client, cli.command).await
}
