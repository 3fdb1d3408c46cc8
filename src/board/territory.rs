//! Per-region mutable state.
//!
//! A territory is either unowned with no troops, or owned by one player
//! with at least one troop.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player seat, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Returns the zero-based index of this player, for array lookups.
    pub const fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }

    /// Builds a player id from a zero-based index.
    pub const fn from_index(idx: usize) -> Self {
        PlayerId(idx as u8 + 1)
    }

    /// Iterates over players `1..=count`.
    pub fn all(count: u8) -> impl Iterator<Item = PlayerId> {
        (1..=count).map(PlayerId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ownership and troop count of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerritoryState {
    pub owner: Option<PlayerId>,
    pub troops: u32,
}

impl TerritoryState {
    /// An unowned, empty territory.
    pub const fn unowned() -> Self {
        TerritoryState {
            owner: None,
            troops: 0,
        }
    }

    /// A territory held by `owner` with `troops` (callers keep troops >= 1).
    pub const fn owned(owner: PlayerId, troops: u32) -> Self {
        TerritoryState {
            owner: Some(owner),
            troops,
        }
    }

    /// Returns true if `player` owns this territory.
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Returns true if the owner/troop invariant holds.
    pub fn is_consistent(&self) -> bool {
        match self.owner {
            Some(_) => self.troops >= 1,
            None => self.troops == 0,
        }
    }
}
