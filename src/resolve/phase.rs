//! Phase sequencing.
//!
//! A turn runs Deploy -> Attack -> Fortify; ending Fortify hands the turn to
//! the next player, wrapping from the last seat back to player 1.

use serde::{Deserialize, Serialize};

use crate::board::PlayerId;

/// The phase within a player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Deploy,
    Attack,
    Fortify,
}

/// All phases in turn order.
pub const ALL_PHASES: [Phase; 3] = [Phase::Deploy, Phase::Attack, Phase::Fortify];

impl Phase {
    /// Returns the lowercase wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Deploy => "deploy",
            Phase::Attack => "attack",
            Phase::Fortify => "fortify",
        }
    }

    /// Parses a phase from its lowercase wire name.
    pub fn from_name(name: &str) -> Option<Phase> {
        match name {
            "deploy" => Some(Phase::Deploy),
            "attack" => Some(Phase::Attack),
            "fortify" => Some(Phase::Fortify),
            _ => None,
        }
    }

    /// Position of this phase within the turn.
    pub const fn index(self) -> usize {
        match self {
            Phase::Deploy => 0,
            Phase::Attack => 1,
            Phase::Fortify => 2,
        }
    }

    /// The phase that follows this one, and whether the turn passes on.
    pub const fn next(self) -> (Phase, bool) {
        match self {
            Phase::Deploy => (Phase::Attack, false),
            Phase::Attack => (Phase::Fortify, false),
            Phase::Fortify => (Phase::Deploy, true),
        }
    }
}

/// Returns the player after `current` among `num_players` seats.
pub fn next_player(current: PlayerId, num_players: u8) -> PlayerId {
    if num_players == 0 || current.0 >= num_players {
        PlayerId(1)
    } else {
        PlayerId(current.0 + 1)
    }
}

/// Computes the `(player, phase)` pair that follows the given one.
pub fn next_turn_state(player: PlayerId, phase: Phase, num_players: u8) -> (PlayerId, Phase) {
    let (next_phase, passes) = phase.next();
    if passes {
        (next_player(player, num_players), next_phase)
    } else {
        (player, next_phase)
    }
}
