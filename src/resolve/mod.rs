//! Rule resolution.
//!
//! Blitz combat between two territories and the phase sequencing that
//! drives each player's turn.

pub mod combat;
pub mod phase;

pub use combat::{blitz, BlitzResult, Dice, RngDice, ScriptedDice};
pub use phase::{next_player, next_turn_state, Phase, ALL_PHASES};
