//! Board persistence as a JSON mapping of region name to `{owner, troops}`.
//!
//! Export always writes every region. Import applies a mapping onto an
//! already generated board: unknown region names and extra fields are
//! skipped with a warning, while records that would break the board's
//! owner/troop invariant are rejected before anything is written.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use super::map::RegionId;
use super::state::Board;
use super::territory::{PlayerId, TerritoryState};

/// One region's persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryRecord {
    pub owner: Option<PlayerId>,
    pub troops: u32,
}

/// Region name -> persisted state.
pub type BoardSnapshot = BTreeMap<String, TerritoryRecord>;

/// Errors raised while loading or applying a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to access board file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse board file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("region '{region}' has owner {owner} but only {players} players are seated")]
    UnknownOwner {
        region: String,
        owner: u8,
        players: u8,
    },

    #[error("region '{region}' has owner {owner:?} with {troops} troops")]
    InconsistentTroops {
        region: String,
        owner: Option<PlayerId>,
        troops: u32,
    },
}

impl Board {
    /// Exports every territory keyed by region name.
    pub fn export_snapshot(&self) -> BoardSnapshot {
        self.territories()
            .map(|(r, t)| {
                (
                    self.map().name(r).to_string(),
                    TerritoryRecord {
                        owner: t.owner,
                        troops: t.troops,
                    },
                )
            })
            .collect()
    }

    /// Applies `snapshot` onto this board.
    ///
    /// Regions absent from the snapshot keep their current state. Returns
    /// the number of regions written.
    pub fn apply_snapshot(&mut self, snapshot: &BoardSnapshot) -> Result<usize, SnapshotError> {
        let mut updates: Vec<(RegionId, TerritoryState)> = Vec::with_capacity(snapshot.len());
        for (name, record) in snapshot {
            let Some(region) = self.map().region_id(name) else {
                warn!("ignoring unknown region '{}' in board snapshot", name);
                continue;
            };
            if let Some(owner) = record.owner {
                if !self.is_player(owner) {
                    return Err(SnapshotError::UnknownOwner {
                        region: name.clone(),
                        owner: owner.0,
                        players: self.num_players(),
                    });
                }
            }
            let state = TerritoryState {
                owner: record.owner,
                troops: record.troops,
            };
            if !state.is_consistent() {
                return Err(SnapshotError::InconsistentTroops {
                    region: name.clone(),
                    owner: record.owner,
                    troops: record.troops,
                });
            }
            updates.push((region, state));
        }

        for (region, state) in &updates {
            self.set_territory(*region, *state);
        }
        Ok(updates.len())
    }
}

/// Parses a snapshot from JSON text, tolerating extra fields.
pub fn parse_snapshot(text: &str) -> Result<BoardSnapshot, SnapshotError> {
    Ok(serde_json::from_str(text)?)
}

/// Writes the board's snapshot to `path` as pretty JSON.
pub fn save_board(board: &Board, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let text = serde_json::to_string_pretty(&board.export_snapshot())?;
    fs::write(path, text)?;
    Ok(())
}

/// Reads a snapshot from `path` and applies it onto `board`.
pub fn load_board(board: &mut Board, path: impl AsRef<Path>) -> Result<usize, SnapshotError> {
    let text = fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&text)?;
    board.apply_snapshot(&snapshot)
}
