//! Applies client commands to a `Game` and builds the replies.
//!
//! Replies are returned in the order the client must see them: the direct
//! response first, then a `territory_update` for every region the command
//! changed.

use log::{debug, warn};

use crate::board::{PlayerId, RegionId};
use crate::game::{ActionOutcome, Game, TurnChange};
use crate::resolve::Phase;

use super::message::{CardView, ClientMessage, ServerMessage};

/// Result of handling one client command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Messages to send, in order.
    pub replies: Vec<ServerMessage>,
    /// True if the command was an `end_phase` for the current turn.
    pub end_phase: bool,
}

impl Dispatch {
    fn reply(messages: Vec<ServerMessage>) -> Self {
        Dispatch {
            replies: messages,
            end_phase: false,
        }
    }
}

/// A `territory_update` for `region` as it stands now.
pub fn territory_update(game: &Game, region: RegionId) -> ServerMessage {
    let board = game.board();
    ServerMessage::TerritoryUpdate {
        name: game.map().name(region).to_string(),
        owner: board.owner(region),
        troops: board.troops(region),
    }
}

/// Updates for every region an applied action touched.
pub fn outcome_updates(game: &Game, outcome: &ActionOutcome) -> Vec<ServerMessage> {
    outcome
        .touched_regions()
        .into_iter()
        .map(|r| territory_update(game, r))
        .collect()
}

/// One `territory_update` per region followed by the turn and phase.
pub fn full_state(game: &Game) -> Vec<ServerMessage> {
    let mut out: Vec<ServerMessage> = game.map().region_ids().map(|r| territory_update(game, r)).collect();
    out.push(ServerMessage::TurnUpdate {
        current_player: game.current_player(),
    });
    out.push(phase_update(game));
    out
}

/// A `phase_update` for the current turn.
pub fn phase_update(game: &Game) -> ServerMessage {
    let player = game.current_player();
    ServerMessage::PhaseUpdate {
        player,
        phase: game.phase(),
        is_user: game.awaits_client(player),
    }
}

/// Messages announcing a phase change: `turn_update` if the seat changed,
/// then always `phase_update`.
pub fn turn_messages(game: &Game, previous: PlayerId, change: TurnChange) -> Vec<ServerMessage> {
    let mut out = Vec::with_capacity(2);
    if change.player != previous {
        out.push(ServerMessage::TurnUpdate {
            current_player: change.player,
        });
    }
    out.push(phase_update(game));
    out
}

fn cards_response(game: &Game, player: PlayerId) -> ServerMessage {
    let cards = game
        .player_cards(player)
        .into_iter()
        .map(|c| CardView {
            name: game.map().name(c.region).to_string(),
            kind: c.kind,
        })
        .collect();
    ServerMessage::PlayerCardsResponse { player_id: player, cards }
}

/// True if an `end_phase` naming `player`/`phase` refers to the current turn.
fn end_phase_matches(game: &Game, player: Option<PlayerId>, phase: Option<&str>) -> bool {
    if player.is_some_and(|p| p != game.current_player()) {
        return false;
    }
    match phase {
        None => true,
        Some(name) => Phase::from_name(&name.to_ascii_lowercase()) == Some(game.phase()),
    }
}

/// Handles one command from the client.
pub fn handle_message(game: &mut Game, msg: ClientMessage) -> Dispatch {
    debug!("handling {}", msg.kind());
    match msg {
        ClientMessage::RequestTroopIncome { player_id } => Dispatch::reply(vec![ServerMessage::TroopIncomeResponse {
            player_id,
            troop_income: game.troop_income(player_id),
        }]),

        ClientMessage::RequestPlayerCards {} => {
            let player = game.current_player();
            Dispatch::reply(vec![cards_response(game, player)])
        }

        ClientMessage::RequestCurrentPlayerCards { player_id } => {
            let player = player_id.unwrap_or_else(|| game.current_player());
            Dispatch::reply(vec![cards_response(game, player)])
        }

        ClientMessage::DeployTroops {
            player_id,
            territory,
            troops,
        } => {
            let result = game
                .region(&territory)
                .and_then(|region| game.deploy(player_id, region, troops).map(|_| region));
            let mut replies = vec![ServerMessage::DeployResponse {
                success: result.is_ok(),
                player_id,
                territory,
                troops,
            }];
            match result {
                Ok(region) => replies.push(territory_update(game, region)),
                Err(e) => warn!("deploy by player {} refused: {}", player_id, e),
            }
            Dispatch::reply(replies)
        }

        ClientMessage::Attack {
            player_id,
            from,
            to,
            move_troops,
        } => {
            let result = game.region(&from).and_then(|f| {
                let t = game.region(&to)?;
                game.attack(player_id, f, t, move_troops.unwrap_or(i64::MAX)).map(|o| (f, t, o))
            });
            match result {
                Ok((f, t, outcome)) => {
                    let captured = outcome.captured();
                    let mut replies = vec![ServerMessage::AttackResponse {
                        success: true,
                        player_id,
                        from,
                        to,
                        captured,
                    }];
                    replies.push(territory_update(game, f));
                    replies.push(territory_update(game, t));
                    Dispatch::reply(replies)
                }
                Err(e) => {
                    warn!("attack by player {} refused: {}", player_id, e);
                    Dispatch::reply(vec![ServerMessage::AttackResponse {
                        success: false,
                        player_id,
                        from,
                        to,
                        captured: false,
                    }])
                }
            }
        }

        ClientMessage::Fortify {
            player_id,
            from,
            to,
            troops,
        } => {
            let result = game.region(&from).and_then(|f| {
                let t = game.region(&to)?;
                game.fortify(player_id, f, t, troops).map(|moved| (f, t, moved))
            });
            match result {
                Ok((f, t, moved)) => Dispatch::reply(vec![
                    ServerMessage::FortifyResponse {
                        success: true,
                        player_id,
                        from,
                        to,
                        troops: i64::from(moved),
                    },
                    territory_update(game, f),
                    territory_update(game, t),
                ]),
                Err(e) => {
                    warn!("fortify by player {} refused: {}", player_id, e);
                    Dispatch::reply(vec![ServerMessage::FortifyResponse {
                        success: false,
                        player_id,
                        from,
                        to,
                        troops,
                    }])
                }
            }
        }

        ClientMessage::PlayCards { player_id, cards } => {
            let result = cards
                .iter()
                .map(|name| game.region(name))
                .collect::<Result<Vec<_>, _>>()
                .and_then(|regions| game.play_cards(player_id, &regions));
            let (success, bonus) = match result {
                Ok(bonus) => (true, bonus),
                Err(e) => {
                    warn!("card play by player {} refused: {}", player_id, e);
                    (false, 0)
                }
            };
            Dispatch::reply(vec![ServerMessage::PlayCardsResponse {
                success,
                player_id,
                bonus,
            }])
        }

        ClientMessage::EndPhase { player, phase } => {
            if end_phase_matches(game, player, phase.as_deref()) {
                Dispatch {
                    replies: Vec::new(),
                    end_phase: true,
                }
            } else {
                warn!(
                    "ignoring stale end_phase ({:?}, {:?}); current turn is player {} {}",
                    player,
                    phase,
                    game.current_player(),
                    game.phase().name()
                );
                Dispatch::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, MapDefinition};
    use crate::config::{GameConfig, PlayerKind};
    use crate::resolve::ScriptedDice;

    /// Player 1 holds everything except Kamchatka.
    fn game() -> Game {
        let map = MapDefinition::classic();
        let mut board = Board::new(map.clone(), 2);
        for r in map.region_ids() {
            board.set_owner(r, PlayerId(1), 1);
        }
        board.set_owner(map.region_id("Kamchatka").unwrap(), PlayerId(2), 1);
        Game::new(
            board,
            GameConfig {
                players: vec![PlayerKind::Human, PlayerKind::Ai],
                card_schedule: None,
                seed: 3,
            },
        )
        .unwrap()
        .with_dice(ScriptedDice::new([1]))
    }

    fn deploy(player: u8, territory: &str, troops: i64) -> ClientMessage {
        ClientMessage::DeployTroops {
            player_id: PlayerId(player),
            territory: territory.into(),
            troops,
        }
    }

    #[test]
    fn phase_update_marks_who_acts() {
        let g = game();
        assert_eq!(
            phase_update(&g),
            ServerMessage::PhaseUpdate {
                player: PlayerId(1),
                phase: Phase::Deploy,
                is_user: true,
            }
        );

        // A human seat with no territory is played by the server.
        let map = MapDefinition::classic();
        let mut board = Board::new(map.clone(), 3);
        for (i, r) in map.region_ids().enumerate() {
            board.set_owner(r, PlayerId(2 + (i % 2) as u8), 1);
        }
        let g = Game::new(
            board,
            GameConfig {
                players: vec![PlayerKind::Human, PlayerKind::Ai, PlayerKind::Ai],
                card_schedule: None,
                seed: 3,
            },
        )
        .unwrap();
        assert!(g.is_human(PlayerId(1)));
        assert!(!g.awaits_client(PlayerId(1)));
        assert_eq!(
            phase_update(&g),
            ServerMessage::PhaseUpdate {
                player: PlayerId(1),
                phase: Phase::Deploy,
                is_user: false,
            }
        );
    }

    #[test]
    fn successful_deploy_pushes_update() {
        let mut g = game();
        let d = handle_message(&mut g, deploy(1, "Alaska", 3));
        assert!(!d.end_phase);
        assert_eq!(d.replies.len(), 2);
        assert!(matches!(d.replies[0], ServerMessage::DeployResponse { success: true, .. }));
        assert_eq!(
            d.replies[1],
            ServerMessage::TerritoryUpdate {
                name: "Alaska".into(),
                owner: Some(PlayerId(1)),
                troops: 4,
            }
        );
    }

    #[test]
    fn failed_deploy_pushes_nothing_else() {
        let mut g = game();
        for msg in [deploy(1, "Kamchatka", 1), deploy(1, "Atlantis", 1), deploy(2, "Kamchatka", 1)] {
            let d = handle_message(&mut g, msg);
            assert_eq!(d.replies.len(), 1);
            assert!(matches!(d.replies[0], ServerMessage::DeployResponse { success: false, .. }));
        }
    }

    #[test]
    fn income_and_cards_queries() {
        let mut g = game();
        let d = handle_message(&mut g, ClientMessage::RequestTroopIncome { player_id: PlayerId(2) });
        assert_eq!(
            d.replies,
            vec![ServerMessage::TroopIncomeResponse {
                player_id: PlayerId(2),
                troop_income: 3,
            }]
        );

        let d = handle_message(&mut g, ClientMessage::RequestPlayerCards {});
        assert_eq!(
            d.replies,
            vec![ServerMessage::PlayerCardsResponse {
                player_id: PlayerId(1),
                cards: vec![],
            }]
        );

        let d = handle_message(
            &mut g,
            ClientMessage::RequestCurrentPlayerCards {
                player_id: Some(PlayerId(2)),
            },
        );
        assert!(matches!(
            d.replies[0],
            ServerMessage::PlayerCardsResponse { player_id: PlayerId(2), .. }
        ));
    }

    #[test]
    fn end_phase_must_match_turn() {
        let mut g = game();
        let stale = ClientMessage::EndPhase {
            player: Some(PlayerId(2)),
            phase: Some("deploy".into()),
        };
        assert_eq!(handle_message(&mut g, stale), Dispatch::default());

        let wrong_phase = ClientMessage::EndPhase {
            player: Some(PlayerId(1)),
            phase: Some("fortify".into()),
        };
        assert!(!handle_message(&mut g, wrong_phase).end_phase);

        let current = ClientMessage::EndPhase {
            player: Some(PlayerId(1)),
            phase: Some("Deploy".into()),
        };
        assert!(handle_message(&mut g, current).end_phase);
        // Dispatch never advances the game itself.
        assert_eq!(g.phase(), Phase::Deploy);
    }

    #[test]
    fn attack_reports_both_regions() {
        let mut g = game();
        handle_message(&mut g, deploy(1, "Alaska", 2));
        g.end_phase();
        let d = handle_message(
            &mut g,
            ClientMessage::Attack {
                player_id: PlayerId(1),
                from: "Alaska".into(),
                to: "Kamchatka".into(),
                move_troops: None,
            },
        );
        // All-ones dice: the defender holds.
        assert!(matches!(
            d.replies[0],
            ServerMessage::AttackResponse {
                success: true,
                captured: false,
                ..
            }
        ));
        assert_eq!(d.replies.len(), 3);
        assert!(matches!(&d.replies[1], ServerMessage::TerritoryUpdate { troops: 1, .. }));
    }

    #[test]
    fn illegal_fortify_reports_failure() {
        let mut g = game();
        let d = handle_message(
            &mut g,
            ClientMessage::Fortify {
                player_id: PlayerId(1),
                from: "Alaska".into(),
                to: "Alberta".into(),
                troops: 1,
            },
        );
        assert_eq!(d.replies.len(), 1);
        assert!(matches!(d.replies[0], ServerMessage::FortifyResponse { success: false, .. }));
    }

    #[test]
    fn full_state_lists_every_region() {
        let g = game();
        let msgs = full_state(&g);
        assert_eq!(msgs.len(), 42 + 2);
        assert_eq!(
            msgs[43],
            ServerMessage::PhaseUpdate {
                player: PlayerId(1),
                phase: Phase::Deploy,
                is_user: true,
            }
        );
    }

    #[test]
    fn turn_messages_skip_unchanged_player() {
        let mut g = game();
        let change = g.end_phase();
        assert_eq!(turn_messages(&g, PlayerId(1), change).len(), 1);
        g.end_phase();
        let change = g.end_phase();
        let msgs = turn_messages(&g, PlayerId(1), change);
        assert_eq!(msgs[0], ServerMessage::TurnUpdate { current_player: PlayerId(2) });
        assert!(matches!(msgs[1], ServerMessage::PhaseUpdate { is_user: false, .. }));
    }
}
