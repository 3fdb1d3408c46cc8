//! Game session state and the action API.
//!
//! `Game` owns the board and the turn state machine. Every mutation the
//! server or an AI policy performs goes through one of the checked actions
//! below: `deploy`, `attack`, `fortify`, `play_cards`, and `end_phase`.
//! Failed actions return an `ActionError` and leave the game untouched.

use std::sync::Arc;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, Card, CardError, CardSchedule, MapDefinition, PlayerId, RegionId};
use crate::config::{GameConfig, PlayerKind};
use crate::resolve::{blitz, next_turn_state, BlitzResult, Dice, Phase, RngDice};

/// Why a game could not be set up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("a game needs at least one player")]
    NoPlayers,

    #[error("board is laid out for {board} players but {configured} are configured")]
    PlayerCount { board: u8, configured: usize },

    #[error("board state is inconsistent")]
    InconsistentBoard,
}

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("the game is over")]
    GameOver,

    #[error("action belongs to the {expected} phase, current phase is {actual}")]
    WrongPhase { expected: &'static str, actual: &'static str },

    #[error("it is player {current}'s turn, not player {player}'s")]
    NotYourTurn { player: PlayerId, current: PlayerId },

    #[error("unknown region {0}")]
    UnknownRegion(String),

    #[error("player {player} does not own {region}")]
    NotOwner { player: PlayerId, region: String },

    #[error("cannot attack own territory {0}")]
    OwnTerritory(String),

    #[error("{from} is not adjacent to {to}")]
    NotAdjacent { from: String, to: String },

    #[error("{to} is not reachable from {from} through friendly territory")]
    NotConnected { from: String, to: String },

    #[error("source and destination are both {0}")]
    SameRegion(String),

    #[error("requested {requested} troops, only {available} available")]
    InsufficientTroops { requested: u32, available: u32 },

    #[error("invalid troop amount {0}")]
    InvalidAmount(i64),

    #[error("card trading is disabled")]
    CardsDisabled,

    #[error(transparent)]
    Cards(#[from] CardError),
}

/// Result of a successful attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub blitz: BlitzResult,
    /// Troops moved into the captured region (0 if not captured).
    pub moved: u32,
    /// Card awarded for this capture, if any.
    pub card: Option<RegionId>,
    /// Set when this capture ended the game.
    pub winner: Option<PlayerId>,
}

impl AttackOutcome {
    pub fn captured(&self) -> bool {
        self.blitz.captured()
    }
}

/// One player action, as chosen by a client or a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Deploy { region: RegionId, troops: i64 },
    Attack { from: RegionId, to: RegionId, move_troops: i64 },
    Fortify { from: RegionId, to: RegionId, troops: i64 },
    PlayCards { cards: Vec<RegionId> },
}

/// What a successfully applied `Action` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Deployed { region: RegionId, troops: u32 },
    Attacked { from: RegionId, to: RegionId, outcome: AttackOutcome },
    Fortified { from: RegionId, to: RegionId, moved: u32 },
    CardsPlayed { bonus: u32 },
}

impl ActionOutcome {
    /// Regions whose owner or troop count changed.
    pub fn touched_regions(&self) -> Vec<RegionId> {
        match self {
            ActionOutcome::Deployed { region, .. } => vec![*region],
            ActionOutcome::Attacked { from, to, .. } | ActionOutcome::Fortified { from, to, .. } => {
                vec![*from, *to]
            }
            ActionOutcome::CardsPlayed { .. } => Vec::new(),
        }
    }
}

/// The turn state after `end_phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnChange {
    pub player: PlayerId,
    pub phase: Phase,
    /// True if the turn passed to another seat.
    pub turn_passed: bool,
}

/// Full state of one game.
pub struct Game {
    board: Board,
    players: Vec<PlayerKind>,
    current_player: PlayerId,
    phase: Phase,
    troops_to_deploy: Vec<u32>,
    game_over: bool,
    winner: Option<PlayerId>,
    round: u32,
    card_drawn_this_turn: bool,
    card_schedule: Option<CardSchedule>,
    rng: SmallRng,
    dice: Box<dyn Dice + Send>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("current_player", &self.current_player)
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("troops_to_deploy", &self.troops_to_deploy)
            .field("winner", &self.winner)
            .finish_non_exhaustive()
    }
}

fn seeded_rng(seed: u64) -> SmallRng {
    if seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(seed)
    }
}

impl Game {
    /// Starts a game on an already populated board.
    ///
    /// Player 1 opens in the deploy phase. Every player's allotment is
    /// computed from the board as given.
    pub fn new(board: Board, config: GameConfig) -> Result<Self, SetupError> {
        if config.players.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if board.num_players() as usize != config.players.len() {
            return Err(SetupError::PlayerCount {
                board: board.num_players(),
                configured: config.players.len(),
            });
        }
        if !board.is_consistent() {
            return Err(SetupError::InconsistentBoard);
        }

        let mut rng = seeded_rng(config.seed);
        let dice = RngDice(SmallRng::seed_from_u64(rng.gen()));
        let troops_to_deploy = PlayerId::all(board.num_players())
            .map(|p| board.calculate_troop_income(p))
            .collect();

        let mut game = Game {
            board,
            players: config.players,
            current_player: PlayerId(1),
            phase: Phase::Deploy,
            troops_to_deploy,
            game_over: false,
            winner: None,
            round: 1,
            card_drawn_this_turn: false,
            card_schedule: config.card_schedule,
            rng,
            dice: Box::new(dice),
        };
        game.refresh_winner();
        Ok(game)
    }

    /// Starts a game on a randomly dealt board over `map`.
    pub fn random(map: Arc<MapDefinition>, config: GameConfig) -> Result<Self, SetupError> {
        let mut rng = seeded_rng(config.seed);
        let mut board = Board::new(map, config.num_players());
        board.generate_random_board(&mut rng);
        let mut game = Game::new(board, config)?;
        game.rng = rng;
        Ok(game)
    }

    /// Starts a game on a randomly dealt classic board.
    pub fn classic(config: GameConfig) -> Result<Self, SetupError> {
        Game::random(MapDefinition::classic(), config)
    }

    /// Replaces the dice used for combat.
    pub fn with_dice(mut self, dice: impl Dice + Send + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn map(&self) -> &Arc<MapDefinition> {
        self.board.map()
    }

    pub fn num_players(&self) -> u8 {
        self.board.num_players()
    }

    pub fn players(&self) -> &[PlayerKind] {
        &self.players
    }

    /// Who controls `player`'s seat.
    pub fn player_kind(&self, player: PlayerId) -> Option<PlayerKind> {
        self.players.get(player.index()).copied()
    }

    pub fn is_human(&self, player: PlayerId) -> bool {
        self.player_kind(player) == Some(PlayerKind::Human)
    }

    /// True if `player`'s turn is driven by client commands. A human seat
    /// with no territory is played out by the server instead.
    pub fn awaits_client(&self, player: PlayerId) -> bool {
        self.is_human(player) && !self.is_eliminated(player)
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current round, starting at 1; advances each time play returns to
    /// player 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// True if `player` holds no territory.
    pub fn is_eliminated(&self, player: PlayerId) -> bool {
        self.board.territory_count(player) == 0
    }

    /// Troops `player` still has to place this turn.
    pub fn remaining_deploy(&self, player: PlayerId) -> u32 {
        self.troops_to_deploy.get(player.index()).copied().unwrap_or(0)
    }

    /// Income `player` would receive right now.
    pub fn troop_income(&self, player: PlayerId) -> u32 {
        self.board.calculate_troop_income(player)
    }

    pub fn player_cards(&self, player: PlayerId) -> Vec<Card> {
        self.board.cards.player_cards(player)
    }

    /// True once the current player has earned a card this turn.
    pub fn card_drawn_this_turn(&self) -> bool {
        self.card_drawn_this_turn
    }

    /// Looks up a region by name.
    pub fn region(&self, name: &str) -> Result<RegionId, ActionError> {
        self.map()
            .region_id(name)
            .ok_or_else(|| ActionError::UnknownRegion(name.to_string()))
    }

    fn region_name(&self, region: RegionId) -> String {
        if self.map().contains(region) {
            self.map().name(region).to_string()
        } else {
            format!("#{}", region.index())
        }
    }

    fn check_known(&self, region: RegionId) -> Result<(), ActionError> {
        if self.map().contains(region) {
            Ok(())
        } else {
            Err(ActionError::UnknownRegion(self.region_name(region)))
        }
    }

    fn check_turn(&self, player: PlayerId, phase: Phase) -> Result<(), ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        if self.phase != phase {
            return Err(ActionError::WrongPhase {
                expected: phase.name(),
                actual: self.phase.name(),
            });
        }
        if player != self.current_player {
            return Err(ActionError::NotYourTurn {
                player,
                current: self.current_player,
            });
        }
        Ok(())
    }

    fn check_owner(&self, player: PlayerId, region: RegionId) -> Result<(), ActionError> {
        if self.board.owner(region) == Some(player) {
            Ok(())
        } else {
            Err(ActionError::NotOwner {
                player,
                region: self.region_name(region),
            })
        }
    }

    fn refresh_winner(&mut self) {
        if self.num_players() < 2 {
            return;
        }
        if let Some(winner) = self.board.check_winner() {
            info!("player {} controls the whole map", winner);
            self.winner = Some(winner);
            self.game_over = true;
        }
    }

    /// Advances to the next phase; after fortify the turn passes on and the
    /// new player's allotment is recomputed.
    pub fn end_phase(&mut self) -> TurnChange {
        let (player, phase) = next_turn_state(self.current_player, self.phase, self.num_players());
        let turn_passed = player != self.current_player || self.phase == Phase::Fortify;

        self.phase = phase;
        if turn_passed {
            if player.0 <= self.current_player.0 {
                self.round += 1;
            }
            self.current_player = player;
            self.card_drawn_this_turn = false;
            let income = self.board.calculate_troop_income(player);
            if let Some(slot) = self.troops_to_deploy.get_mut(player.index()) {
                *slot = income;
            }
            debug!("round {}: player {} to deploy {}", self.round, player, income);
        }

        TurnChange {
            player: self.current_player,
            phase: self.phase,
            turn_passed,
        }
    }

    /// Places `amount` troops on `region`.
    ///
    /// Returns the region's new troop count.
    pub fn deploy(&mut self, player: PlayerId, region: RegionId, amount: i64) -> Result<u32, ActionError> {
        self.check_turn(player, Phase::Deploy)?;
        self.check_known(region)?;
        self.check_owner(player, region)?;
        if amount <= 0 {
            return Err(ActionError::InvalidAmount(amount));
        }
        let available = self.remaining_deploy(player);
        let requested = u32::try_from(amount).unwrap_or(u32::MAX);
        if requested > available {
            return Err(ActionError::InsufficientTroops { requested, available });
        }

        if !self.board.deploy_troops(player, region, requested) {
            return Err(ActionError::NotOwner {
                player,
                region: self.region_name(region),
            });
        }
        self.troops_to_deploy[player.index()] -= requested;
        Ok(self.board.troops(region))
    }

    /// Deploys by region index, for callers that choose actions numerically.
    pub fn deploy_by_index(&mut self, player: PlayerId, index: usize, amount: i64) -> Result<u32, ActionError> {
        let region = u16::try_from(index)
            .map(RegionId)
            .map_err(|_| ActionError::UnknownRegion(format!("#{}", index)))?;
        self.deploy(player, region, amount)
    }

    /// Checks the board-level attack conditions: `player` owns `from`, does
    /// not own `to`, the two are adjacent, and `from` has more than one troop.
    pub fn check_attack(&self, player: PlayerId, from: RegionId, to: RegionId) -> Result<(), ActionError> {
        self.check_known(from)?;
        self.check_known(to)?;
        self.check_owner(player, from)?;
        if self.board.owner(to) == Some(player) {
            return Err(ActionError::OwnTerritory(self.region_name(to)));
        }
        if !self.map().is_adjacent(from, to) {
            return Err(ActionError::NotAdjacent {
                from: self.region_name(from),
                to: self.region_name(to),
            });
        }
        let available = self.board.troops(from);
        if available <= 1 {
            return Err(ActionError::InsufficientTroops { requested: 1, available: 0 });
        }
        Ok(())
    }

    pub fn is_valid_attack(&self, player: PlayerId, from: RegionId, to: RegionId) -> bool {
        self.check_attack(player, from, to).is_ok()
    }

    /// Blitzes `to` from `from`.
    ///
    /// On capture the target changes hands and `move_troops` (clamped to
    /// `[1, A - 1]` where `A` is the attacker's strength at capture) end up
    /// in the target; the rest stay behind. The first capture of a turn
    /// earns a card.
    pub fn attack(
        &mut self,
        player: PlayerId,
        from: RegionId,
        to: RegionId,
        move_troops: i64,
    ) -> Result<AttackOutcome, ActionError> {
        self.check_turn(player, Phase::Attack)?;
        self.check_attack(player, from, to)?;

        let result = blitz(self.board.troops(from), self.board.troops(to), self.dice.as_mut());
        let mut outcome = AttackOutcome {
            blitz: result,
            moved: 0,
            card: None,
            winner: None,
        };

        if !result.captured() {
            // Attacker ran out of strength; only losses apply.
            self.board.set_troops(from, result.attacker_remaining);
            self.board.set_troops(to, result.defender_remaining);
            debug!(
                "player {} attack {} -> {} repelled",
                player,
                self.region_name(from),
                self.region_name(to)
            );
            return Ok(outcome);
        }

        let strength = result.attacker_remaining;
        let moved = u32::try_from(move_troops.max(1))
            .unwrap_or(u32::MAX)
            .min(strength.saturating_sub(1).max(1));

        // Defender drops to one occupying troop paid for by the attacker.
        self.board.set_owner(to, player, 1);
        self.board.set_troops(from, strength.saturating_sub(1).max(1));
        if moved > 1 {
            self.board.transfer(from, to, moved - 1);
        }
        outcome.moved = moved;

        if !self.card_drawn_this_turn {
            outcome.card = self.board.cards.award_capture_card(player, to, &mut self.rng);
            self.card_drawn_this_turn = outcome.card.is_some();
        }

        info!(
            "player {} captured {} from {}, moved {}",
            player,
            self.region_name(to),
            self.region_name(from),
            moved
        );

        self.refresh_winner();
        outcome.winner = self.winner;
        Ok(outcome)
    }

    /// Checks fortify conditions other than turn and phase.
    pub fn check_fortify(&self, player: PlayerId, from: RegionId, to: RegionId) -> Result<(), ActionError> {
        self.check_known(from)?;
        self.check_known(to)?;
        if from == to {
            return Err(ActionError::SameRegion(self.region_name(from)));
        }
        self.check_owner(player, from)?;
        self.check_owner(player, to)?;
        let available = self.board.troops(from);
        if available <= 1 {
            return Err(ActionError::InsufficientTroops { requested: 1, available: 0 });
        }
        if !self.board.find_connected_territories(player, from).contains(&to) {
            return Err(ActionError::NotConnected {
                from: self.region_name(from),
                to: self.region_name(to),
            });
        }
        Ok(())
    }

    pub fn is_valid_fortify(&self, player: PlayerId, from: RegionId, to: RegionId) -> bool {
        self.check_fortify(player, from, to).is_ok()
    }

    /// Moves troops between two connected friendly regions.
    ///
    /// `amount` is clamped to `[1, troops(from) - 1]`. Returns the number
    /// actually moved.
    pub fn fortify(&mut self, player: PlayerId, from: RegionId, to: RegionId, amount: i64) -> Result<u32, ActionError> {
        self.check_turn(player, Phase::Fortify)?;
        self.check_fortify(player, from, to)?;

        let max = self.board.troops(from) - 1;
        let moved = u32::try_from(amount.max(1)).unwrap_or(u32::MAX).min(max);
        if !self.board.transfer(from, to, moved) {
            return Err(ActionError::InsufficientTroops { requested: moved, available: max });
        }
        debug!(
            "player {} fortified {} -> {} with {}",
            player,
            self.region_name(from),
            self.region_name(to),
            moved
        );
        Ok(moved)
    }

    /// Trades in three cards during the deploy phase. The payout is added
    /// to the player's remaining allotment and returned.
    pub fn play_cards(&mut self, player: PlayerId, cards: &[RegionId]) -> Result<u32, ActionError> {
        self.check_turn(player, Phase::Deploy)?;
        let schedule = self.card_schedule.as_ref().ok_or(ActionError::CardsDisabled)?;
        let bonus = self.board.cards.play_cards(player, cards, schedule)?;
        if let Some(slot) = self.troops_to_deploy.get_mut(player.index()) {
            *slot = slot.saturating_add(bonus);
        }
        info!("player {} traded cards for {} troops", player, bonus);
        Ok(bonus)
    }

    /// Applies `action` on behalf of `player` through the matching checked
    /// operation.
    pub fn apply(&mut self, player: PlayerId, action: &Action) -> Result<ActionOutcome, ActionError> {
        match *action {
            Action::Deploy { region, troops } => {
                let troops = self.deploy(player, region, troops)?;
                Ok(ActionOutcome::Deployed { region, troops })
            }
            Action::Attack { from, to, move_troops } => {
                let outcome = self.attack(player, from, to, move_troops)?;
                Ok(ActionOutcome::Attacked { from, to, outcome })
            }
            Action::Fortify { from, to, troops } => {
                let moved = self.fortify(player, from, to, troops)?;
                Ok(ActionOutcome::Fortified { from, to, moved })
            }
            Action::PlayCards { ref cards } => {
                let bonus = self.play_cards(player, cards)?;
                Ok(ActionOutcome::CardsPlayed { bonus })
            }
        }
    }
}
