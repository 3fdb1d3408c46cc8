//! Wire messages.
//!
//! Every record is a JSON object with a `type` discriminator. Unknown extra
//! fields are ignored so older servers accept newer clients.

use serde::{Deserialize, Serialize};

use crate::board::{CardKind, PlayerId};
use crate::resolve::Phase;

/// A client-to-server command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    DeployTroops {
        player_id: PlayerId,
        territory: String,
        troops: i64,
    },
    RequestTroopIncome {
        player_id: PlayerId,
    },
    /// Hand of the current player.
    RequestPlayerCards {},
    /// Hand of `player_id`, or of the current player if omitted.
    RequestCurrentPlayerCards {
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    /// Ends the phase. Missing fields match the current turn.
    EndPhase {
        #[serde(default)]
        player: Option<PlayerId>,
        #[serde(default)]
        phase: Option<String>,
    },
    Attack {
        player_id: PlayerId,
        from: String,
        to: String,
        /// Troops to move in on capture; omitted means as many as possible.
        #[serde(default)]
        move_troops: Option<i64>,
    },
    Fortify {
        player_id: PlayerId,
        from: String,
        to: String,
        troops: i64,
    },
    PlayCards {
        player_id: PlayerId,
        cards: Vec<String>,
    },
}

impl ClientMessage {
    /// The wire `type` value.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::DeployTroops { .. } => "deploy_troops",
            ClientMessage::RequestTroopIncome { .. } => "request_troop_income",
            ClientMessage::RequestPlayerCards {} => "request_player_cards",
            ClientMessage::RequestCurrentPlayerCards { .. } => "request_current_player_cards",
            ClientMessage::EndPhase { .. } => "end_phase",
            ClientMessage::Attack { .. } => "attack",
            ClientMessage::Fortify { .. } => "fortify",
            ClientMessage::PlayCards { .. } => "play_cards",
        }
    }
}

/// One card as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
}

/// A server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    TerritoryUpdate {
        name: String,
        owner: Option<PlayerId>,
        troops: u32,
    },
    TurnUpdate {
        current_player: PlayerId,
    },
    PhaseUpdate {
        player: PlayerId,
        phase: Phase,
        is_user: bool,
    },
    DeployResponse {
        success: bool,
        player_id: PlayerId,
        territory: String,
        troops: i64,
    },
    TroopIncomeResponse {
        player_id: PlayerId,
        troop_income: u32,
    },
    PlayerCardsResponse {
        player_id: PlayerId,
        cards: Vec<CardView>,
    },
    AttackResponse {
        success: bool,
        player_id: PlayerId,
        from: String,
        to: String,
        captured: bool,
    },
    FortifyResponse {
        success: bool,
        player_id: PlayerId,
        from: String,
        to: String,
        troops: i64,
    },
    PlayCardsResponse {
        success: bool,
        player_id: PlayerId,
        bonus: u32,
    },
    GameOver {
        winner: Option<PlayerId>,
    },
}

impl ServerMessage {
    /// Serializes to one newline-terminated frame.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
