//! Game state -> flat feature vector for training collaborators.
//!
//! With `R` regions, `C` continents and `P` players the vector is laid out
//! as follows (`P + 1` slots means one per player plus "nobody"):
//!   [R * (P+1)]   region owner one-hot
//!   [R]           region troops, raw
//!   [R]           region troops / largest stack on the board
//!   [R]           neighbors held by the same owner
//!   [C * (P+1)]   continent owner one-hot (nobody unless fully held)
//!   [C * P]       continent progress per player
//!   [P]           income, raw
//!   [P]           income / total income
//!   [P]           current player one-hot
//!   [3]           phase one-hot
//!   [P]           troops remaining to deploy
//!   [P]           total troops per player
//!   [1]           round
//!   [R * (P+1)]   card holder one-hot
//! followed by the same block from the previous call (zeros if none).

use crate::board::{ContinentId, PlayerId};
use crate::game::Game;
use crate::resolve::ALL_PHASES;

/// Length of one state block (without the trailing previous block).
pub fn block_len(regions: usize, continents: usize, players: usize) -> usize {
    let slots = players + 1;
    regions * slots
        + regions * 3
        + continents * slots
        + continents * players
        + players * 3
        + ALL_PHASES.len()
        + players * 2
        + 1
        + regions * slots
}

/// Length of the full vector produced by `encode_state` for `game`.
pub fn feature_len(game: &Game) -> usize {
    let map = game.map();
    2 * block_len(map.region_count(), map.continent_count(), game.num_players() as usize)
}

/// Slot of `owner` in a `P + 1` one-hot group.
#[inline]
fn owner_slot(owner: Option<PlayerId>, players: usize) -> usize {
    match owner {
        Some(p) if p.index() < players => p.index(),
        _ => players,
    }
}

/// Encodes `game` into a feature vector.
///
/// `previous` is the vector returned by an earlier call; its leading state
/// block is appended. Anything shorter is zero-padded.
pub fn encode_state(game: &Game, previous: Option<&[f32]>) -> Vec<f32> {
    let board = game.board();
    let map = game.map();
    let players = game.num_players() as usize;
    let slots = players + 1;
    let block = block_len(map.region_count(), map.continent_count(), players);

    let mut out = Vec::with_capacity(block * 2);

    // Region ownership.
    for (_, t) in board.territories() {
        let mut onehot = vec![0.0; slots];
        onehot[owner_slot(t.owner, players)] = 1.0;
        out.extend_from_slice(&onehot);
    }

    let max_troops = board.territories().map(|(_, t)| t.troops).max().unwrap_or(0).max(1) as f32;
    out.extend(board.territories().map(|(_, t)| t.troops as f32));
    out.extend(board.territories().map(|(_, t)| t.troops as f32 / max_troops));

    out.extend(board.territories().map(|(r, t)| match t.owner {
        Some(owner) => map
            .neighbors(r)
            .iter()
            .filter(|n| board.owner(**n) == Some(owner))
            .count() as f32,
        None => 0.0,
    }));

    // Continents.
    let continents: Vec<ContinentId> = map.continent_ids().collect();
    for &c in &continents {
        let holder = PlayerId::all(game.num_players()).find(|p| board.owns_continent(*p, c));
        let mut onehot = vec![0.0; slots];
        onehot[owner_slot(holder, players)] = 1.0;
        out.extend_from_slice(&onehot);
    }
    for &c in &continents {
        out.extend(PlayerId::all(game.num_players()).map(|p| board.continent_progress(p, c)));
    }

    // Income.
    let income: Vec<f32> = PlayerId::all(game.num_players())
        .map(|p| board.calculate_troop_income(p) as f32)
        .collect();
    let total_income: f32 = income.iter().sum::<f32>().max(1.0);
    out.extend_from_slice(&income);
    out.extend(income.iter().map(|i| i / total_income));

    // Turn state.
    out.extend(PlayerId::all(game.num_players()).map(|p| if p == game.current_player() { 1.0 } else { 0.0 }));
    let mut phase = [0.0; ALL_PHASES.len()];
    phase[game.phase().index()] = 1.0;
    out.extend_from_slice(&phase);
    out.extend(PlayerId::all(game.num_players()).map(|p| game.remaining_deploy(p) as f32));
    out.extend(PlayerId::all(game.num_players()).map(|p| board.total_troops(p) as f32));
    out.push(game.round() as f32);

    // Cards.
    for card in board.cards.cards() {
        let mut onehot = vec![0.0; slots];
        onehot[owner_slot(card.owner, players)] = 1.0;
        out.extend_from_slice(&onehot);
    }

    debug_assert_eq!(out.len(), block);

    let prev = previous.unwrap_or(&[]);
    let take = prev.len().min(block);
    out.extend_from_slice(&prev[..take]);
    out.resize(block * 2, 0.0);
    out
}
