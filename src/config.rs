//! Game and session configuration.
//!
//! Plain structs with sensible defaults; the binaries fill them from
//! command-line flags.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::CardSchedule;

/// Default number of seats.
pub const DEFAULT_PLAYERS: usize = 4;

/// Who controls a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// Driven by the remote client.
    Human,
    /// Driven by an in-process policy.
    Ai,
}

impl PlayerKind {
    /// Parses "human"/"user" or "ai" (case-insensitive).
    pub fn from_name(name: &str) -> Option<PlayerKind> {
        match name.to_ascii_lowercase().as_str() {
            "human" | "user" => Some(PlayerKind::Human),
            "ai" | "bot" => Some(PlayerKind::Ai),
            _ => None,
        }
    }
}

/// Rules-level configuration for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// One entry per seat, seat 1 first.
    pub players: Vec<PlayerKind>,
    /// Payouts for card trade-ins; None disables trading.
    pub card_schedule: Option<CardSchedule>,
    /// Random seed (0 = use entropy).
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut players = vec![PlayerKind::Ai; DEFAULT_PLAYERS];
        players[0] = PlayerKind::Human;
        GameConfig {
            players,
            card_schedule: None,
            seed: 0,
        }
    }
}

impl GameConfig {
    /// Number of seats, saturated to the `u8` range.
    pub fn num_players(&self) -> u8 {
        self.players.len().min(u8::MAX as usize) as u8
    }
}

/// Transport-level configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Stop after this many full rounds (None = play until someone wins).
    pub max_rounds: Option<u32>,
    /// Pause between AI actions, purely for presentation pacing.
    pub ai_delay: Duration,
    /// How often blocking socket calls wake up to check for a stop request.
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 9999)),
            max_rounds: None,
            ai_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(100),
        }
    }
}
