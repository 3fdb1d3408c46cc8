//! AI policies.
//!
//! A policy picks one `Action` at a time for the current player. The caller
//! applies it through `Game::apply`, the same path a remote client uses,
//! and asks again until the policy returns `None`, then ends the phase.

use log::warn;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::board::{PlayerId, RegionId};
use crate::game::{Action, ActionOutcome, Game};
use crate::resolve::Phase;

/// Chooses actions for an AI-controlled seat.
pub trait Policy {
    /// Next action for `player` in the current phase, or None to end it.
    fn next_action(&mut self, game: &Game, player: PlayerId) -> Option<Action>;
}

/// Uniform random play.
///
/// Deploys one troop at a time onto a random owned territory until the
/// allotment is used up. With `attack_probability > 0` it also launches
/// random legal attacks, moving everything it can into captured regions.
/// It never fortifies.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: SmallRng,
    attack_probability: f64,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        RandomPolicy {
            rng,
            attack_probability: 0.0,
        }
    }

    /// Sets the chance of attacking each time an attack is possible.
    pub fn with_attack_probability(mut self, probability: f64) -> Self {
        self.attack_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn choose_deploy(&mut self, game: &Game, player: PlayerId) -> Option<Action> {
        if game.remaining_deploy(player) == 0 {
            return None;
        }
        let owned = game.board().territories_owned_by(player);
        let region = *owned.choose(&mut self.rng)?;
        Some(Action::Deploy { region, troops: 1 })
    }

    fn choose_attack(&mut self, game: &Game, player: PlayerId) -> Option<Action> {
        if self.attack_probability <= 0.0 || !self.rng.gen_bool(self.attack_probability) {
            return None;
        }
        let candidates: Vec<(RegionId, RegionId)> = game
            .board()
            .territories_owned_by(player)
            .into_iter()
            .flat_map(|from| game.map().neighbors(from).iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| game.is_valid_attack(player, from, to))
            .collect();
        let &(from, to) = candidates.choose(&mut self.rng)?;
        let move_troops = i64::from(game.board().troops(from));
        Some(Action::Attack { from, to, move_troops })
    }
}

impl Policy for RandomPolicy {
    fn next_action(&mut self, game: &Game, player: PlayerId) -> Option<Action> {
        if game.is_over() || game.current_player() != player {
            return None;
        }
        match game.phase() {
            Phase::Deploy => self.choose_deploy(game, player),
            Phase::Attack => self.choose_attack(game, player),
            Phase::Fortify => None,
        }
    }
}

/// Upper bound on actions a policy may take in one phase.
pub const MAX_ACTIONS_PER_PHASE: usize = 10_000;

/// Runs `policy` for the current player until it passes or an action is
/// refused, calling `on_applied` after each successful action. The phase
/// is not ended.
pub fn play_phase<P, F>(game: &mut Game, policy: &mut P, mut on_applied: F) -> usize
where
    P: Policy + ?Sized,
    F: FnMut(&Game, &ActionOutcome),
{
    let player = game.current_player();
    let mut applied = 0;
    while applied < MAX_ACTIONS_PER_PHASE {
        let Some(action) = policy.next_action(game, player) else {
            break;
        };
        match game.apply(player, &action) {
            Ok(outcome) => {
                applied += 1;
                on_applied(game, &outcome);
            }
            Err(e) => {
                warn!("policy action {:?} for player {} refused: {}", action, player, e);
                break;
            }
        }
        if game.is_over() {
            break;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, PlayerKind};

    fn game(seed: u64) -> Game {
        Game::classic(GameConfig {
            players: vec![PlayerKind::Ai; 3],
            card_schedule: None,
            seed,
        })
        .unwrap()
    }

    #[test]
    fn random_deploy_uses_whole_allotment() {
        let mut g = game(9);
        let player = g.current_player();
        let income = g.remaining_deploy(player);
        let before = g.board().total_troops(player);
        let mut policy = RandomPolicy::new(1);

        let applied = play_phase(&mut g, &mut policy, |_, _| {});
        assert_eq!(applied as u32, income);
        assert_eq!(g.remaining_deploy(player), 0);
        assert_eq!(g.board().total_troops(player), before + income);
    }

    #[test]
    fn reference_policy_never_attacks() {
        let mut g = game(4);
        g.end_phase();
        let mut policy = RandomPolicy::new(2);
        assert_eq!(policy.next_action(&g, g.current_player()), None);
    }

    #[test]
    fn aggressive_policy_attacks_legally() {
        let mut g = game(21);
        let player = g.current_player();
        let frontier = g
            .board()
            .territories_owned_by(player)
            .into_iter()
            .find(|r| g.map().neighbors(*r).iter().any(|n| g.board().owner(*n) != Some(player)))
            .unwrap();
        let income = g.remaining_deploy(player) as i64;
        g.deploy(player, frontier, income).unwrap();
        g.end_phase();

        let mut policy = RandomPolicy::new(3).with_attack_probability(1.0);
        match policy.next_action(&g, player) {
            Some(Action::Attack { from, to, .. }) => assert!(g.is_valid_attack(player, from, to)),
            other => panic!("expected an attack, got {:?}", other),
        }
        play_phase(&mut g, &mut policy, |game, _| assert!(game.board().is_consistent()));
    }

    #[test]
    fn policy_passes_for_other_players() {
        let g = game(5);
        let mut policy = RandomPolicy::new(6);
        assert_eq!(policy.next_action(&g, PlayerId(2)), None);
    }
}
