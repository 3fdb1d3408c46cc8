//! Headless AI-only games for training data.
//!
//! Every seat is driven by a `RandomPolicy` through the same checked action
//! API the server uses. Each turn's start is recorded (territory and troop
//! counts, optionally the full feature vector) and games are written out as
//! JSONL, one game per line.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{error, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::{CardSchedule, PlayerId};
use crate::config::{GameConfig, PlayerKind};
use crate::encoding::encode_state;
use crate::game::{Game, SetupError};
use crate::policy::{play_phase, RandomPolicy};
use crate::resolve::Phase;

/// Configuration for self-play game generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub num_games: usize,
    /// Seats per game.
    pub players: u8,
    /// Rounds before a game is cut off.
    pub max_rounds: u32,
    /// Chance the policy attacks whenever it can.
    pub attack_probability: f64,
    /// Card payouts (None disables trading).
    pub card_schedule: Option<CardSchedule>,
    /// Store the encoded state vector with every turn.
    pub record_features: bool,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            players: 4,
            max_rounds: 100,
            attack_probability: 0.5,
            card_schedule: None,
            record_features: false,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// State at the start of one player's turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub round: u32,
    pub player: PlayerId,
    /// Deploy allotment for this turn.
    pub income: u32,
    /// Territories held, indexed by seat.
    pub territories: Vec<u32>,
    /// Troops on the board, indexed by seat.
    pub troops: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<f32>>,
}

/// A complete self-play game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub winner: Option<PlayerId>,
    /// Round the game stopped in.
    pub rounds: u32,
    pub turns: Vec<TurnRecord>,
    pub final_territories: Vec<u32>,
}

impl GameRecord {
    /// True if the round cap stopped the game before anyone won.
    pub fn capped(&self) -> bool {
        self.winner.is_none()
    }
}

fn counts(game: &Game) -> (Vec<u32>, Vec<u32>) {
    let board = game.board();
    PlayerId::all(game.num_players())
        .map(|p| (board.territory_count(p), board.total_troops(p)))
        .unzip()
}

/// Plays one game to a win or the round cap.
pub fn play_game(config: &SelfPlayConfig, game_id: usize, rng: &mut SmallRng) -> Result<GameRecord, SetupError> {
    let game_config = GameConfig {
        players: vec![PlayerKind::Ai; config.players as usize],
        card_schedule: config.card_schedule.clone(),
        seed: rng.gen::<u64>() | 1,
    };
    let mut game = Game::classic(game_config)?;
    let mut policy = RandomPolicy::new(rng.gen::<u64>() | 1).with_attack_probability(config.attack_probability);

    let mut turns = Vec::new();
    let mut previous: Option<Vec<f32>> = None;

    while !game.is_over() && game.round() <= config.max_rounds {
        if game.phase() == Phase::Deploy {
            let player = game.current_player();
            let (territories, troops) = counts(&game);
            let features = config.record_features.then(|| {
                let v = encode_state(&game, previous.as_deref());
                previous = Some(v.clone());
                v
            });
            turns.push(TurnRecord {
                round: game.round(),
                player,
                income: game.remaining_deploy(player),
                territories,
                troops,
                features,
            });
        }

        play_phase(&mut game, &mut policy, |_, _| {});
        if game.is_over() {
            break;
        }
        game.end_phase();
    }

    let (final_territories, _) = counts(&game);
    Ok(GameRecord {
        game_id,
        winner: game.winner(),
        rounds: game.round(),
        turns,
        final_territories,
    })
}

fn describe(game: &GameRecord) -> String {
    match game.winner {
        Some(w) => format!("player {} wins", w),
        None => "capped".to_string(),
    }
}

/// Runs self-play generation, producing multiple game records.
///
/// When `config.threads > 1`, games are played concurrently using rayon.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<GameRecord>, SetupError> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| {
        games.push(game);
    })?;
    games.sort_by_key(|g| g.game_id);
    Ok(games)
}

/// Runs self-play generation, calling `on_game` with each completed game
/// record as it finishes.
pub fn run_self_play_with_callback<F>(config: &SelfPlayConfig, on_game: F) -> Result<(), SetupError>
where
    F: FnMut(GameRecord) + Send,
{
    if config.players == 0 {
        return Err(SetupError::NoPlayers);
    }
    if config.threads > 1 {
        run_self_play_parallel(config, on_game);
    } else {
        run_self_play_sequential(config, on_game);
    }
    Ok(())
}

fn seeded(seed: u64) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed)
    } else {
        SmallRng::from_entropy()
    }
}

/// Sequential self-play: plays games one at a time.
fn run_self_play_sequential<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord),
{
    for i in 0..config.num_games {
        let mut rng = seeded(if config.seed != 0 { config.seed.wrapping_add(i as u64) } else { 0 });
        let start = Instant::now();
        match play_game(config, i, &mut rng) {
            Ok(game) => {
                if !config.quiet {
                    info!(
                        "game {}/{}: {} in round {} ({:.1}s)",
                        i + 1,
                        config.num_games,
                        describe(&game),
                        game.rounds,
                        start.elapsed().as_secs_f64()
                    );
                }
                on_game(game);
            }
            Err(e) => error!("game {} could not start: {}", i, e),
        }
    }
}

/// Parallel self-play: plays games concurrently on a rayon pool and hands
/// them to the callback on the calling thread.
fn run_self_play_parallel<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(config.threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            warn!("failed to build thread pool ({}), playing sequentially", e);
            return run_self_play_sequential(config, on_game);
        }
    };

    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<GameRecord>();
    let worker_config = config.clone();
    let handle = std::thread::spawn(move || {
        pool.install(|| {
            (0..worker_config.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    let seed = if worker_config.seed != 0 {
                        worker_config.seed.wrapping_add(i as u64)
                    } else {
                        0
                    };
                    let mut rng = seeded(seed);
                    let start = Instant::now();
                    let game = match play_game(&worker_config, i, &mut rng) {
                        Ok(game) => game,
                        Err(e) => {
                            error!("game {} could not start: {}", i, e);
                            return;
                        }
                    };
                    if !worker_config.quiet {
                        let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        info!(
                            "game {}/{}: {} in round {} ({:.1}s)",
                            n,
                            worker_config.num_games,
                            describe(&game),
                            game.rounds,
                            start.elapsed().as_secs_f64()
                        );
                    }
                    let _ = tx.send(game);
                });
        });
    });

    for game in rx {
        on_game(game);
    }

    if handle.join().is_err() {
        error!("self-play worker thread panicked");
    }
}

/// Writes game records as JSONL (one JSON object per game, one per line).
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        write_game_json(game, out)?;
    }
    out.flush()
}

/// Writes a single game record as one JSON line.
pub fn write_game_json<W: Write>(game: &GameRecord, out: &mut W) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, game)?;
    writeln!(out)
}

/// Prints a summary of self-play results to stderr.
pub fn print_summary(games: &[GameRecord]) {
    let total = games.len();
    let seats = games.iter().map(|g| g.final_territories.len()).max().unwrap_or(0);
    let mut win_counts = vec![0usize; seats];
    let mut capped = 0usize;
    let mut total_rounds = 0u64;

    for game in games {
        total_rounds += u64::from(game.rounds);
        match game.winner {
            Some(w) => {
                if let Some(slot) = win_counts.get_mut(w.index()) {
                    *slot += 1;
                }
            }
            None => capped += 1,
        }
    }

    eprintln!("=== Self-Play Summary ===");
    eprintln!("Games: {}", total);
    eprintln!("Avg rounds/game: {:.1}", total_rounds as f64 / total.max(1) as f64);
    eprintln!("Capped: {}", capped);
    eprintln!("Win distribution:");
    for (i, wins) in win_counts.iter().enumerate() {
        let pct = 100.0 * *wins as f64 / total.max(1) as f64;
        eprintln!("  player {}: {} ({:.1}%)", i + 1, wins, pct);
    }
}
