//! One client session over TCP.
//!
//! The session accepts a single presentation client, streams the full board,
//! then drives the turn loop. Human seats are driven by client commands;
//! AI seats by a `Policy`. Every mutation is pushed to the client as soon
//! as it happens. All blocking calls wake up every `poll_interval` to check
//! the stop flag.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::board::PlayerId;
use crate::config::SessionConfig;
use crate::game::Game;
use crate::policy::{Policy, RandomPolicy, MAX_ACTIONS_PER_PHASE};
use crate::protocol::{
    full_state, handle_message, outcome_updates, parse_client_message, turn_messages, LineBuffer, ServerMessage,
};

/// Longest sleep between accept polls.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Read chunk size.
const READ_CHUNK: usize = 4096;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// One player controls the whole map.
    GameOver { winner: Option<PlayerId> },
    /// The configured round cap was reached.
    RoundCap { rounds: u32 },
    /// The client went away.
    Disconnected,
    /// A stop was requested through a `StopHandle`.
    Stopped,
}

/// Failure to set the session up.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("poll interval must be positive")]
    ZeroPollInterval,

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// Cloneable handle that asks a running session to stop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A bound, not yet (or already) connected session.
pub struct Session {
    config: SessionConfig,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
    buffer: LineBuffer,
    stop: StopHandle,
    policy: Box<dyn Policy + Send>,
}

impl Session {
    /// Binds the listening socket.
    pub fn bind(config: SessionConfig) -> Result<Self, SessionError> {
        // Zero is not a valid socket read timeout.
        if config.poll_interval.is_zero() {
            return Err(SessionError::ZeroPollInterval);
        }
        let listener = TcpListener::bind(config.bind).map_err(|source| SessionError::Bind {
            addr: config.bind,
            source,
        })?;
        listener.set_nonblocking(true)?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Session {
            config,
            listener: Some(listener),
            stream: None,
            buffer: LineBuffer::new(),
            stop: StopHandle::new(),
            policy: Box::new(RandomPolicy::new(0)),
        })
    }

    /// Replaces the policy used for AI seats.
    pub fn with_policy(mut self, policy: impl Policy + Send + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// A handle that can stop this session from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Accepts the client and plays `game` until it ends. The connection
    /// and listener are released before returning.
    pub fn run(&mut self, game: &mut Game) -> SessionEnd {
        let end = self.accept().and_then(|()| self.play(game)).unwrap_or_else(|end| end);
        info!("session ended: {:?}", end);
        self.close();
        end
    }

    /// Releases the client connection and the listener. Safe to call more
    /// than once.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("shutdown: {}", e);
            }
            info!("client connection closed");
        }
        if self.listener.take().is_some() {
            info!("listener closed");
        }
    }

    fn accept(&mut self) -> Result<(), SessionEnd> {
        let listener = self.listener.as_ref().ok_or(SessionEnd::Stopped)?;
        let nap = ACCEPT_POLL.min(self.config.poll_interval);
        loop {
            if self.stop.is_stopped() {
                return Err(SessionEnd::Stopped);
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    info!("client connected from {}", addr);
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("failed to set TCP_NODELAY: {}", e);
                    }
                    let configured = stream
                        .set_nonblocking(false)
                        .and_then(|()| stream.set_read_timeout(Some(self.config.poll_interval)));
                    if let Err(e) = configured {
                        error!("failed to configure client socket: {}", e);
                        return Err(SessionEnd::Disconnected);
                    }
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(nap),
                Err(e) => {
                    error!("accept failed: {}", e);
                    thread::sleep(nap);
                }
            }
        }
    }

    fn play(&mut self, game: &mut Game) -> Result<SessionEnd, SessionEnd> {
        self.send(&full_state(game))?;

        loop {
            if self.stop.is_stopped() {
                return Ok(SessionEnd::Stopped);
            }
            if game.is_over() {
                let winner = game.winner();
                self.send(&[ServerMessage::GameOver { winner }])?;
                return Ok(SessionEnd::GameOver { winner });
            }
            if let Some(cap) = self.config.max_rounds {
                if game.round() > cap {
                    return Ok(SessionEnd::RoundCap { rounds: cap });
                }
            }

            let player = game.current_player();
            debug!("player {} {}", player, game.phase().name());
            let phase_done = if game.awaits_client(player) {
                self.human_phase(game)?
            } else {
                self.ai_phase(game, player)?
            };
            if !phase_done || game.is_over() {
                continue;
            }

            let change = game.end_phase();
            self.send(&turn_messages(game, player, change))?;
        }
    }

    /// Services client commands until a matching `end_phase` arrives.
    /// Returns false if the game ended first.
    fn human_phase(&mut self, game: &mut Game) -> Result<bool, SessionEnd> {
        loop {
            let frame = self.read_frame()?;
            let Some(msg) = parse_client_message(&frame) else {
                continue;
            };
            let dispatch = handle_message(game, msg);
            self.send(&dispatch.replies)?;
            if dispatch.end_phase {
                return Ok(true);
            }
            if game.is_over() {
                return Ok(false);
            }
        }
    }

    /// Lets the policy act for `player`, pushing every change.
    fn ai_phase(&mut self, game: &mut Game, player: PlayerId) -> Result<bool, SessionEnd> {
        for _ in 0..MAX_ACTIONS_PER_PHASE {
            if self.stop.is_stopped() {
                return Err(SessionEnd::Stopped);
            }
            let Some(action) = self.policy.next_action(game, player) else {
                break;
            };
            match game.apply(player, &action) {
                Ok(outcome) => {
                    self.send(&outcome_updates(game, &outcome))?;
                    if game.is_over() {
                        return Ok(false);
                    }
                    self.pace()?;
                }
                Err(e) => {
                    warn!("AI action {:?} for player {} refused: {}", action, player, e);
                    break;
                }
            }
        }
        Ok(true)
    }

    /// Interruptible presentation delay between AI actions.
    fn pace(&self) -> Result<(), SessionEnd> {
        if self.config.ai_delay.is_zero() {
            return Ok(());
        }
        let deadline = Instant::now() + self.config.ai_delay;
        loop {
            if self.stop.is_stopped() {
                return Err(SessionEnd::Stopped);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep((deadline - now).min(self.config.poll_interval));
        }
    }

    /// Blocks until one complete frame is buffered.
    fn read_frame(&mut self) -> Result<String, SessionEnd> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(frame) = self.buffer.next_frame() {
                return Ok(frame);
            }
            if self.stop.is_stopped() {
                return Err(SessionEnd::Stopped);
            }
            let stream = self.stream.as_mut().ok_or(SessionEnd::Disconnected)?;
            match stream.read(&mut chunk) {
                Ok(0) => {
                    info!("client disconnected");
                    return Err(SessionEnd::Disconnected);
                }
                Ok(n) => self.buffer.push(&chunk[..n]),
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    warn!("read failed: {}", e);
                    return Err(SessionEnd::Disconnected);
                }
            }
        }
    }

    /// Writes `messages` in order, one frame each.
    fn send(&mut self, messages: &[ServerMessage]) -> Result<(), SessionEnd> {
        if messages.is_empty() {
            return Ok(());
        }
        let mut out = String::new();
        for msg in messages {
            match msg.to_line() {
                Ok(line) => out.push_str(&line),
                Err(e) => error!("failed to encode {:?}: {}", msg, e),
            }
        }
        let stream = self.stream.as_mut().ok_or(SessionEnd::Disconnected)?;
        stream.write_all(out.as_bytes()).and_then(|()| stream.flush()).map_err(|e| {
            warn!("write failed: {}", e);
            SessionEnd::Disconnected
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> SessionConfig {
        SessionConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            poll_interval: Duration::from_millis(20),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn stop_handle_is_shared() {
        let a = StopHandle::new();
        let b = a.clone();
        assert!(!a.is_stopped());
        b.stop();
        b.stop();
        assert!(a.is_stopped());
    }

    #[test]
    fn close_is_idempotent() {
        let mut session = Session::bind(local_config()).unwrap();
        assert!(session.local_addr().is_some());
        session.close();
        session.close();
        assert!(session.local_addr().is_none());
    }

    #[test]
    fn stop_before_accept_returns_stopped() {
        let mut session = Session::bind(local_config()).unwrap();
        session.stop_handle().stop();
        let mut game = Game::classic(crate::config::GameConfig::default()).unwrap();
        assert_eq!(session.run(&mut game), SessionEnd::Stopped);
        // A second run finds nothing to accept on.
        assert_eq!(session.run(&mut game), SessionEnd::Stopped);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = Session::bind(SessionConfig {
            poll_interval: Duration::ZERO,
            ..local_config()
        });
        assert!(matches!(err, Err(SessionError::ZeroPollInterval)));
    }

    #[test]
    fn bind_failure_is_reported() {
        let first = Session::bind(local_config()).unwrap();
        let taken = first.local_addr().unwrap();
        let err = Session::bind(SessionConfig {
            bind: taken,
            ..local_config()
        });
        assert!(matches!(err, Err(SessionError::Bind { .. })));
    }
}
