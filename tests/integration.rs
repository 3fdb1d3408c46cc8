//! Integration tests for the session protocol.
//!
//! Each test binds a session on an ephemeral port, runs it on a background
//! thread, and drives it with a plain TCP client speaking newline-delimited
//! JSON.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use skirmish::board::{Board, MapDefinition, PlayerId};
use skirmish::config::{GameConfig, PlayerKind, SessionConfig};
use skirmish::game::Game;
use skirmish::resolve::ScriptedDice;
use skirmish::session::{Session, SessionEnd, StopHandle};

const TIMEOUT: Duration = Duration::from_secs(5);

fn session_config(max_rounds: Option<u32>) -> SessionConfig {
    SessionConfig {
        bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        max_rounds,
        poll_interval: Duration::from_millis(20),
        ..SessionConfig::default()
    }
}

fn start(game: Game, max_rounds: Option<u32>) -> (SocketAddr, StopHandle, JoinHandle<SessionEnd>) {
    let mut session = Session::bind(session_config(max_rounds)).unwrap();
    let addr = session.local_addr().unwrap();
    let stop = session.stop_handle();
    let handle = thread::spawn(move || {
        let mut game = game;
        session.run(&mut game)
    });
    (addr, stop, handle)
}

/// Two seats: player 1 (human) holds the Americas, player 2 (AI) the rest.
fn split_game() -> Game {
    let map = MapDefinition::classic();
    let mut board = Board::new(map.clone(), 2);
    for r in map.region_ids() {
        let american = map
            .region(r)
            .continent
            .map_or(false, |c| map.continent(c).name.contains("America"));
        board.set_owner(r, PlayerId(if american { 1 } else { 2 }), 1);
    }
    Game::new(
        board,
        GameConfig {
            players: vec![PlayerKind::Human, PlayerKind::Ai],
            card_schedule: None,
            seed: 5,
        },
    )
    .unwrap()
}

struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
        let writer = stream.try_clone().unwrap();
        Client {
            reader: BufReader::new(stream),
            writer,
        }
    }

    fn send(&mut self, value: Value) {
        let mut line = value.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).unwrap();
    }

    fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).unwrap();
        self.writer.flush().unwrap();
    }

    fn recv(&mut self) -> Value {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).unwrap();
        assert!(n > 0, "server closed the connection");
        serde_json::from_str(&line).unwrap()
    }

    /// Returns None if nothing arrives within `wait`.
    fn try_recv(&mut self, wait: Duration) -> Option<Value> {
        self.reader.get_ref().set_read_timeout(Some(wait)).unwrap();
        let mut line = String::new();
        let result = match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(serde_json::from_str(&line).unwrap()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => None,
            Err(e) => panic!("read failed: {}", e),
        };
        self.reader.get_ref().set_read_timeout(Some(TIMEOUT)).unwrap();
        result
    }

    /// Reads messages until one satisfies `pred`, returning all of them.
    fn recv_until(&mut self, pred: impl Fn(&Value) -> bool) -> Vec<Value> {
        let mut seen = Vec::new();
        loop {
            let msg = self.recv();
            let done = pred(&msg);
            seen.push(msg);
            if done {
                return seen;
            }
        }
    }

    /// Consumes the opening board dump and turn/phase announcements.
    fn skip_initial_state(&mut self) -> Vec<Value> {
        self.recv_until(|m| m["type"] == "phase_update")
    }
}

#[test]
fn initial_state_streams_every_region() {
    let (addr, _stop, handle) = start(split_game(), None);
    let mut client = Client::connect(addr);
    let msgs = client.skip_initial_state();

    assert_eq!(msgs.len(), 44);
    let updates: Vec<&Value> = msgs.iter().filter(|m| m["type"] == "territory_update").collect();
    assert_eq!(updates.len(), 42);
    assert!(updates
        .iter()
        .any(|m| m["name"] == "Alaska" && m["owner"] == 1 && m["troops"] == 1));
    assert_eq!(msgs[42], json!({"type": "turn_update", "current_player": 1}));
    assert_eq!(
        msgs[43],
        json!({"type": "phase_update", "player": 1, "phase": "deploy", "is_user": true})
    );

    drop(client);
    assert_eq!(handle.join().unwrap(), SessionEnd::Disconnected);
}

#[test]
fn deploy_success_and_failure() {
    let (addr, stop, handle) = start(split_game(), None);
    let mut client = Client::connect(addr);
    client.skip_initial_state();

    client.send(json!({"type": "deploy_troops", "player_id": 1, "territory": "Alaska", "troops": 3}));
    let response = client.recv();
    assert_eq!(response["type"], "deploy_response");
    assert_eq!(response["success"], true);
    assert_eq!(
        client.recv(),
        json!({"type": "territory_update", "name": "Alaska", "owner": 1, "troops": 4})
    );

    client.send(json!({"type": "deploy_troops", "player_id": 1, "territory": "Kamchatka", "troops": 1}));
    let response = client.recv();
    assert_eq!(response["type"], "deploy_response");
    assert_eq!(response["success"], false);

    // No territory_update follows a failed deploy.
    client.send(json!({"type": "request_troop_income", "player_id": 1}));
    let income = client.recv();
    assert_eq!(income["type"], "troop_income_response");
    assert_eq!(income["player_id"], 1);

    stop.stop();
    assert_eq!(handle.join().unwrap(), SessionEnd::Stopped);
}

#[test]
fn partial_frame_waits_for_newline() {
    let (addr, stop, handle) = start(split_game(), None);
    let mut client = Client::connect(addr);
    client.skip_initial_state();

    let frame = br#"{"type":"deploy_troops","player_id":1,"territory":"Alaska","troops":3}"#;
    client.send_raw(&frame[..20]);
    thread::sleep(Duration::from_millis(50));
    client.send_raw(&frame[20..]);
    assert_eq!(client.try_recv(Duration::from_millis(200)), None);

    client.send_raw(b"\n");
    let response = client.recv();
    assert_eq!(response["type"], "deploy_response");
    assert_eq!(response["success"], true);
    assert_eq!(client.recv()["troops"], 4);

    stop.stop();
    handle.join().unwrap();
}

#[test]
fn malformed_frames_are_skipped() {
    let (addr, stop, handle) = start(split_game(), None);
    let mut client = Client::connect(addr);
    client.skip_initial_state();

    client.send_raw(b"this is not json\n\n{\"type\":\"warp\"}\n{\"type\":\"deploy_troops\"}\n");
    client.send(json!({"type": "request_player_cards"}));
    assert_eq!(
        client.recv(),
        json!({"type": "player_cards_response", "player_id": 1, "cards": []})
    );
    assert_eq!(client.try_recv(Duration::from_millis(100)), None);

    stop.stop();
    assert_eq!(handle.join().unwrap(), SessionEnd::Stopped);
}

#[test]
fn end_phase_drives_turns_and_ai_plays() {
    let (addr, stop, handle) = start(split_game(), None);
    let mut client = Client::connect(addr);
    client.skip_initial_state();

    client.send(json!({"type": "end_phase", "player": 1, "phase": "deploy"}));
    assert_eq!(
        client.recv(),
        json!({"type": "phase_update", "player": 1, "phase": "attack", "is_user": true})
    );

    // A stale end_phase is ignored.
    client.send(json!({"type": "end_phase", "player": 2, "phase": "attack"}));
    client.send(json!({"type": "request_troop_income", "player_id": 2}));
    assert_eq!(client.recv()["type"], "troop_income_response");

    client.send(json!({"type": "end_phase", "player": 1, "phase": "attack"}));
    assert_eq!(client.recv()["phase"], "fortify");

    client.send(json!({"type": "end_phase", "player": 1, "phase": "fortify"}));
    assert_eq!(client.recv(), json!({"type": "turn_update", "current_player": 2}));
    assert_eq!(
        client.recv(),
        json!({"type": "phase_update", "player": 2, "phase": "deploy", "is_user": false})
    );

    // Player 2 holds 29 regions and all of Europe, Africa, Asia, Australia.
    let income = 29 / 3 + 5 + 3 + 7 + 2;
    let ai_turn = client.recv_until(|m| m["type"] == "phase_update" && m["player"] == 1);
    let deploys = ai_turn
        .iter()
        .filter(|m| m["type"] == "territory_update" && m["owner"] == 2)
        .count();
    assert_eq!(deploys, income);
    assert_eq!(ai_turn.last().unwrap()["is_user"], true);
    assert!(ai_turn.iter().any(|m| m == &json!({"type": "turn_update", "current_player": 1})));

    stop.stop();
    assert_eq!(handle.join().unwrap(), SessionEnd::Stopped);
}

#[test]
fn capture_of_last_territory_ends_the_game() {
    let map = MapDefinition::classic();
    let mut board = Board::new(map.clone(), 2);
    for r in map.region_ids() {
        board.set_owner(r, PlayerId(1), 1);
    }
    board.set_owner(map.region_id("Kamchatka").unwrap(), PlayerId(2), 1);
    let game = Game::new(
        board,
        GameConfig {
            players: vec![PlayerKind::Human, PlayerKind::Ai],
            card_schedule: None,
            seed: 1,
        },
    )
    .unwrap()
    .with_dice(ScriptedDice::new([6, 6, 1]));

    let (addr, _stop, handle) = start(game, None);
    let mut client = Client::connect(addr);
    client.skip_initial_state();

    client.send(json!({"type": "deploy_troops", "player_id": 1, "territory": "Alaska", "troops": 2}));
    client.recv_until(|m| m["type"] == "territory_update");
    client.send(json!({"type": "end_phase", "player": 1, "phase": "deploy"}));
    client.recv();

    client.send(json!({"type": "attack", "player_id": 1, "from": "Alaska", "to": "Kamchatka", "move_troops": 2}));
    let response = client.recv();
    assert_eq!(response["type"], "attack_response");
    assert_eq!(response["captured"], true);
    assert_eq!(
        client.recv(),
        json!({"type": "territory_update", "name": "Alaska", "owner": 1, "troops": 1})
    );
    assert_eq!(
        client.recv(),
        json!({"type": "territory_update", "name": "Kamchatka", "owner": 1, "troops": 2})
    );
    assert_eq!(client.recv(), json!({"type": "game_over", "winner": 1}));

    assert_eq!(
        handle.join().unwrap(),
        SessionEnd::GameOver {
            winner: Some(PlayerId(1))
        }
    );
}

#[test]
fn ai_only_game_stops_at_round_cap() {
    let game = Game::classic(GameConfig {
        players: vec![PlayerKind::Ai; 3],
        card_schedule: None,
        seed: 9,
    })
    .unwrap();
    let (addr, _stop, handle) = start(game, Some(2));
    let mut client = Client::connect(addr);

    let mut msgs = Vec::new();
    let mut line = String::new();
    while client.reader.read_line(&mut line).unwrap() > 0 {
        msgs.push(serde_json::from_str::<Value>(&line).unwrap());
        line.clear();
    }
    assert_eq!(handle.join().unwrap(), SessionEnd::RoundCap { rounds: 2 });

    // The opening announcement plus three seat changes per round.
    let turns: Vec<&Value> = msgs.iter().filter(|m| m["type"] == "turn_update").collect();
    assert_eq!(turns.len(), 7);
    assert_eq!(turns.last().unwrap()["current_player"], 1);
    assert!(msgs.iter().all(|m| m["type"] != "game_over"));
}

#[test]
fn human_seat_without_territory_is_played_by_server() {
    let map = MapDefinition::classic();
    let mut board = Board::new(map.clone(), 3);
    for (i, r) in map.region_ids().enumerate() {
        board.set_owner(r, PlayerId(2 + (i % 2) as u8), 1);
    }
    let game = Game::new(
        board,
        GameConfig {
            players: vec![PlayerKind::Human, PlayerKind::Ai, PlayerKind::Ai],
            card_schedule: None,
            seed: 4,
        },
    )
    .unwrap();
    let (addr, _stop, handle) = start(game, Some(1));
    let mut client = Client::connect(addr);

    let mut phases = Vec::new();
    let mut line = String::new();
    while client.reader.read_line(&mut line).unwrap() > 0 {
        let msg: Value = serde_json::from_str(&line).unwrap();
        if msg["type"] == "phase_update" {
            phases.push(msg);
        }
        line.clear();
    }
    assert_eq!(handle.join().unwrap(), SessionEnd::RoundCap { rounds: 1 });

    assert!(phases.iter().any(|m| m["player"] == 1));
    assert!(phases.iter().all(|m| m["is_user"] == false));
}

#[test]
fn stop_during_accept_returns_promptly() {
    let game = split_game();
    let (_addr, stop, handle) = start(game, None);
    thread::sleep(Duration::from_millis(50));

    let requested = Instant::now();
    stop.stop();
    assert_eq!(handle.join().unwrap(), SessionEnd::Stopped);
    assert!(requested.elapsed() < Duration::from_secs(1));
}
