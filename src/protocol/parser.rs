//! Client frame parser.
//!
//! Turns one framed line into a `ClientMessage`. Bad JSON, unknown types,
//! and missing fields are logged and dropped; the caller keeps reading.

use log::warn;
use serde_json::Value;

use super::message::ClientMessage;

/// Parses a single frame into a `ClientMessage`.
///
/// Returns `None` for blank lines and for anything malformed.
pub fn parse_client_message(line: &str) -> Option<ClientMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            warn!("dropping frame with bad JSON ({}): {:?}", e, trimmed);
            return None;
        }
    };

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => {
            warn!("dropping frame without a type: {:?}", trimmed);
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(msg) => Some(msg),
        Err(e) => {
            warn!("dropping {:?} frame: {}", kind, e);
            None
        }
    }
}
