//! Newline framing.
//!
//! Bytes accumulate until a `\n` arrives; only then is a frame released.
//! Partial frames stay buffered across reads.

use log::warn;

/// Frames longer than this without a newline are discarded.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    buf: Vec<u8>,
    discarding: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes read from the socket.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        if !self.buf.contains(&b'\n') && self.buf.len() > MAX_FRAME_LEN {
            warn!("dropping oversized frame ({} bytes without newline)", self.buf.len());
            self.buf.clear();
            self.discarding = true;
        }
    }

    /// Returns the next complete, non-blank line without its terminator.
    pub fn next_frame(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buf, rest);
            line.pop();
            if self.discarding {
                // Tail of an oversized frame.
                self.discarding = false;
                continue;
            }
            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(trimmed.to_string());
        }
        None
    }

    /// Number of buffered bytes not yet framed.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
