//! Blitz combat: repeated dice rounds until one side can no longer fight.
//!
//! The resolver is a pure function of the two troop counts and a `Dice`
//! source. Board-level effects (ownership change, moving in) are applied by
//! the caller from the returned `BlitzResult`.

use rand::Rng;

/// Maximum dice the attacker may roll per round.
pub const MAX_ATTACK_DICE: u32 = 3;

/// Maximum dice the defender may roll per round.
pub const MAX_DEFENSE_DICE: u32 = 2;

/// A source of six-sided die rolls.
pub trait Dice {
    /// Rolls one die, returning a value in `1..=6`.
    fn roll(&mut self) -> u8;
}

/// Dice backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl<R: Rng> Dice for RngDice<R> {
    fn roll(&mut self) -> u8 {
        self.0.gen_range(1..=6)
    }
}

/// Dice that replay a fixed script, cycling when it runs out.
///
/// Useful for deterministic tests and replays. An empty script rolls 1s.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: Vec<u8>,
    pos: usize,
}

impl ScriptedDice {
    pub fn new(script: impl Into<Vec<u8>>) -> Self {
        ScriptedDice {
            script: script.into(),
            pos: 0,
        }
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> u8 {
        if self.script.is_empty() {
            return 1;
        }
        let v = self.script[self.pos % self.script.len()];
        self.pos += 1;
        v.clamp(1, 6)
    }
}

/// Outcome of a blitz attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitzResult {
    /// Attacker troops when the loop stopped (before any moving in).
    pub attacker_remaining: u32,
    /// Defender troops when the loop stopped.
    pub defender_remaining: u32,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    /// Number of dice rounds fought.
    pub rounds: u32,
}

impl BlitzResult {
    /// True if the defender was wiped out.
    pub fn captured(&self) -> bool {
        self.defender_remaining == 0
    }
}

/// Rolls `count` dice sorted highest first.
fn roll_sorted(dice: &mut dyn Dice, count: u32) -> Vec<u8> {
    let mut rolls: Vec<u8> = (0..count).map(|_| dice.roll()).collect();
    rolls.sort_unstable_by(|a, b| b.cmp(a));
    rolls
}

/// Runs rounds while the attacker has more than one troop and the defender
/// has any. Each round the attacker rolls `min(3, attacker - 1)` dice and
/// the defender `min(2, defender)`; highest dice are paired and the
/// defender wins ties.
pub fn blitz(attacker: u32, defender: u32, dice: &mut dyn Dice) -> BlitzResult {
    let mut att = attacker;
    let mut def = defender;
    let mut rounds = 0;

    while att > 1 && def > 0 {
        let attack_roll = roll_sorted(dice, MAX_ATTACK_DICE.min(att - 1));
        let defense_roll = roll_sorted(dice, MAX_DEFENSE_DICE.min(def));

        for (a, d) in attack_roll.iter().zip(defense_roll.iter()) {
            if a > d {
                def -= 1;
            } else {
                att -= 1;
            }
        }
        rounds += 1;
    }

    BlitzResult {
        attacker_remaining: att,
        defender_remaining: def,
        attacker_losses: attacker - att,
        defender_losses: defender - def,
        rounds,
    }
}
