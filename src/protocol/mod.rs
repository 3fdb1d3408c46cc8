//! Session wire protocol.
//!
//! Newline-delimited JSON records: framing, parsing of client commands,
//! message types, and the dispatcher that applies commands to a `Game`.

pub mod dispatch;
pub mod framing;
pub mod message;
pub mod parser;

pub use dispatch::{full_state, handle_message, outcome_updates, phase_update, territory_update, turn_messages, Dispatch};
pub use framing::{LineBuffer, MAX_FRAME_LEN};
pub use message::{CardView, ClientMessage, ServerMessage};
pub use parser::parse_client_message;
