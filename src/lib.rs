//! Skirmish: a Risk engine with a single-client session protocol.
//!
//! Exposes the board model, rule resolution, the game state machine,
//! AI policies, the wire protocol, and the TCP session for use by the
//! binaries and integration tests.

pub mod board;
pub mod config;
pub mod encoding;
pub mod game;
pub mod policy;
pub mod protocol;
pub mod resolve;
pub mod selfplay;
pub mod session;
