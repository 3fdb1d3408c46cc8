//! Self-play game generation CLI.
//!
//! Plays AI-only games and writes one JSON record per game.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- [OPTIONS]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use skirmish::board::CardSchedule;
use skirmish::selfplay::{self, SelfPlayConfig};

#[derive(Parser, Debug)]
#[command(name = "selfplay")]
#[command(about = "Generate self-play games as JSONL")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Seats per game
    #[arg(long, default_value_t = 4)]
    players: u8,

    /// Rounds before a game is cut off
    #[arg(long, default_value_t = 100)]
    max_rounds: u32,

    /// Chance to attack whenever an attack is possible
    #[arg(long, default_value_t = 0.5)]
    attack: f64,

    /// Card trade-in payouts, comma-separated
    #[arg(long, value_delimiter = ',')]
    card_bonus: Vec<u32>,

    /// Added to each trade-in after the payout list runs out
    #[arg(long, default_value_t = 0)]
    card_bonus_step: u32,

    /// Record the encoded state vector at every turn
    #[arg(long)]
    features: bool,

    /// Number of parallel threads
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Random seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suppress progress and summary output
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SelfPlayConfig {
        num_games: args.games,
        players: args.players,
        max_rounds: args.max_rounds,
        attack_probability: args.attack,
        card_schedule: (!args.card_bonus.is_empty()).then(|| CardSchedule {
            values: args.card_bonus.clone(),
            increment: args.card_bonus_step,
        }),
        record_features: args.features,
        threads: args.threads,
        seed: args.seed,
        quiet: args.quiet,
    };

    if !config.quiet {
        info!(
            "self-play: {} games, {} players, max {} rounds, attack {:.2}, {} threads",
            config.num_games, config.players, config.max_rounds, config.attack_probability, config.threads
        );
    }

    let start = Instant::now();
    let games = match selfplay::run_self_play(&config) {
        Ok(games) => games,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    let written = match &args.output {
        Some(path) => File::create(path).and_then(|f| {
            let mut out = BufWriter::new(f);
            selfplay::write_jsonl(&games, &mut out)?;
            out.flush()
        }),
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            selfplay::write_jsonl(&games, &mut out)
        }
    };
    if let Err(e) = written {
        error!("failed to write games: {}", e);
        return ExitCode::FAILURE;
    }

    if !config.quiet {
        info!(
            "completed {} games in {:.1}s ({:.1} games/hour)",
            games.len(),
            elapsed.as_secs_f64(),
            games.len() as f64 / elapsed.as_secs_f64().max(1e-9) * 3600.0
        );
        selfplay::print_summary(&games);
    }
    ExitCode::SUCCESS
}
