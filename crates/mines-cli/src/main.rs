//! # mines
//!
//! Interactive terminal front-end: reads commands from stdin, drives the
//! session manager and prints whatever the event bus publishes.

#![deny(unsafe_code)]

mod commands;
mod render;

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mines_core::{ErrorData, EventKind};
use mines_logging::LoggingConfig;
use mines_session::{EventBus, SessionManager};
use mines_settings::{ClientSettings, GameDefaults};
use mines_transport::{HttpTransport, TransportConfig};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::commands::{Command, HELP};

/// Play mines against a game server.
#[derive(Parser, Debug)]
#[command(name = "mines", about = "Play mines against a game server")]
struct Cli {
    /// Settings file (defaults to `~/.mines/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Game server base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the player.
    #[arg(long)]
    token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Provably-fair client seed.
    #[arg(long)]
    client_seed: Option<String>,

    /// Log as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Flags override every settings layer.
    fn apply(&self, settings: &mut ClientSettings) {
        if let Some(url) = &self.base_url {
            settings.api.base_url.clone_from(url);
        }
        if let Some(token) = &self.token {
            settings.api.auth_token = Some(token.clone());
        }
        if let Some(ms) = self.timeout_ms {
            settings.api.timeout_ms = ms;
        }
        if let Some(seed) = &self.client_seed {
            settings.api.client_seed = Some(seed.clone());
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => mines_settings::load_settings_from_path(path),
        None => mines_settings::load_settings(),
    }
    .context("Failed to load settings")?;
    cli.apply(&mut settings);

    mines_logging::init_logging(&LoggingConfig {
        level: settings.logging.level.clone(),
        json: settings.logging.json,
    })
    .context("Failed to initialize logging")?;

    let transport = HttpTransport::new(TransportConfig {
        base_url: settings.api.base_url.clone(),
        auth_token: settings.api.auth_token.clone().map(SecretString::from),
        timeout: Duration::from_millis(settings.api.timeout_ms),
    })
    .with_context(|| format!("Invalid server configuration for {}", settings.api.base_url))?;

    let bus = Arc::new(EventBus::new());
    for kind in EventKind::ALL {
        let _ = bus.subscribe(kind, |event| println!("{}", render::describe(event)));
    }

    let manager = SessionManager::new(Arc::new(transport), bus);
    manager.set_client_seed(settings.api.client_seed.clone());

    info!(base_url = %settings.api.base_url, "mines client ready");

    // Failures are reported by the requestError listener.
    let _ = manager.request_user_information().await;

    repl(&manager, &settings.game).await
}

async fn repl(manager: &SessionManager, defaults: &GameDefaults) -> Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            return Ok(());
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if command == Command::Quit {
            return Ok(());
        }
        run(manager, defaults, command).await;
    }
}

async fn run(manager: &SessionManager, defaults: &GameDefaults, command: Command) {
    match command {
        Command::User => {
            let _ = manager.request_user_information().await;
        }
        Command::Start { bet, mines } => {
            let config = manager
                .user_profile()
                .map(|profile| profile.config)
                .unwrap_or_default();
            let bet = config.clamp_bet(bet.unwrap_or(defaults.bet_amount));
            let mines = config.clamp_mines(mines.unwrap_or(defaults.mine_count));
            match manager.start_game(bet, mines).await {
                Ok(session) => print!("{}", render::board(&session)),
                Err(e) => report_local(&e),
            }
        }
        Command::Pick(tile) => match manager.pick_tile(tile).await {
            Ok(result) => print!("{}", render::board(&result.session)),
            Err(e) => report_local(&e),
        },
        Command::CashOut => match manager.cash_out().await {
            Ok(result) => {
                print!("{}", render::board(&result.session));
                if let Some(balance) = manager.balance() {
                    println!("balance {balance:.2}");
                }
            }
            Err(e) => report_local(&e),
        },
        Command::Seed(seed) => {
            match &seed {
                Some(seed) => println!("client seed set to {seed}"),
                None => println!("client seed cleared"),
            }
            manager.set_client_seed(seed);
        }
        Command::State => match manager.session() {
            Some(session) => {
                println!("{}", render::summary(&session, manager.game_state()));
                print!("{}", render::board(&session));
            }
            None => println!("no session yet, use 'start'"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Local guard failures are not published, so print them here.
fn report_local(err: &ErrorData) {
    if err.code.is_local() {
        println!("{}", err.message);
    }
}
