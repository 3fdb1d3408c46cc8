//! Board representation and game-state types.
//!
//! Contains the immutable map definition, per-region territory state, the
//! board aggregate with its derived queries, the card deck, and board
//! persistence.

pub mod cards;
pub mod classic;
pub mod map;
pub mod snapshot;
pub mod state;
pub mod territory;

pub use cards::{Card, CardError, CardKind, CardManager, CardSchedule, ALL_CARD_KINDS};
pub use map::{ContinentId, ContinentInfo, MapDefinition, MapError, RegionId, RegionInfo};
pub use snapshot::{
    load_board, parse_snapshot, save_board, BoardSnapshot, SnapshotError, TerritoryRecord,
};
pub use state::{Board, MIN_TROOP_INCOME};
pub use territory::{PlayerId, TerritoryState};
