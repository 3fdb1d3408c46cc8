//! Skirmish server.
//!
//! Hosts one game for one presentation client over newline-delimited JSON.
//! `RUST_LOG` (or `--log-level`) controls logging.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use skirmish::board::{load_board, CardSchedule, MapDefinition};
use skirmish::config::{GameConfig, PlayerKind, SessionConfig};
use skirmish::game::Game;
use skirmish::policy::RandomPolicy;
use skirmish::session::{Session, SessionEnd};

/// Command line arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Risk engine serving one client over newline-delimited JSON")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9999")]
    bind: SocketAddr,

    /// Comma-separated seat list, e.g. "human,ai,ai,ai"
    #[arg(long, default_value = "human,ai,ai,ai")]
    players: String,

    /// Stop after this many rounds
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Random seed (0 = entropy)
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// JSON map file (defaults to the classic map)
    #[arg(long)]
    map: Option<PathBuf>,

    /// JSON board snapshot applied after the random deal
    #[arg(long)]
    board: Option<PathBuf>,

    /// Card trade-in payouts, comma-separated; trading is off if omitted
    #[arg(long, value_delimiter = ',')]
    card_bonus: Vec<u32>,

    /// Added to each trade-in after the payout list runs out
    #[arg(long, default_value_t = 0)]
    card_bonus_step: u32,

    /// Pause between AI actions in milliseconds
    #[arg(long, default_value_t = 0)]
    ai_delay_ms: u64,

    /// Chance that an AI seat attacks when it can (0 = never)
    #[arg(long, default_value_t = 0.0)]
    ai_attack: f64,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_players(list: &str) -> Result<Vec<PlayerKind>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| PlayerKind::from_name(s).ok_or_else(|| format!("unknown player kind '{}'", s)))
        .collect()
}

fn run(args: Args) -> Result<SessionEnd, Box<dyn Error>> {
    let players = parse_players(&args.players)?;
    let map = match &args.map {
        Some(path) => Arc::new(MapDefinition::load(path)?),
        None => MapDefinition::classic(),
    };
    let card_schedule = (!args.card_bonus.is_empty()).then(|| CardSchedule {
        values: args.card_bonus.clone(),
        increment: args.card_bonus_step,
    });
    let config = GameConfig {
        players,
        card_schedule,
        seed: args.seed,
    };

    let mut game = match &args.board {
        Some(path) => {
            let mut dealt = Game::random(map.clone(), config.clone())?.board().clone();
            let written = load_board(&mut dealt, path)?;
            info!("applied {} territories from {}", written, path.display());
            Game::new(dealt, config)?
        }
        None => Game::random(map, config)?,
    };
    info!(
        "{} regions, {} players, player 1 opens with {} troops",
        game.map().region_count(),
        game.num_players(),
        game.remaining_deploy(game.current_player())
    );

    let session_config = SessionConfig {
        bind: args.bind,
        max_rounds: args.max_rounds,
        ai_delay: Duration::from_millis(args.ai_delay_ms),
        ..SessionConfig::default()
    };
    let policy_seed = if args.seed == 0 { 0 } else { args.seed.wrapping_add(1) };
    let mut session =
        Session::bind(session_config)?.with_policy(RandomPolicy::new(policy_seed).with_attack_probability(args.ai_attack));
    Ok(session.run(&mut game))
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str())).init();

    match run(args) {
        Ok(end) => {
            info!("finished: {:?}", end);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
