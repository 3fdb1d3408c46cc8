//! Territory cards: the deck, player hands, and set trade-ins.
//!
//! The deck holds one card per region. A player earns at most one card per
//! turn by capturing a territory. Three cards forming a set (three of a kind
//! or one of each kind) can be turned in for bonus troops; the payout
//! follows a configured `CardSchedule` and the cards return to the pool.

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::map::{MapDefinition, RegionId};
use super::territory::PlayerId;

/// The troop type printed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Infantry,
    Cavalry,
    Artillery,
}

/// All card kinds in deck order.
pub const ALL_CARD_KINDS: [CardKind; 3] = [CardKind::Infantry, CardKind::Cavalry, CardKind::Artillery];

/// One card of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub region: RegionId,
    pub kind: CardKind,
    pub owner: Option<PlayerId>,
}

/// Payout table for card trade-ins.
///
/// The n-th trade-in (counted across all players) pays `values[n]`. Once
/// the list is exhausted each further trade-in pays `increment` more than
/// the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSchedule {
    pub values: Vec<u32>,
    #[serde(default)]
    pub increment: u32,
}

impl CardSchedule {
    /// A schedule that always pays the same amount.
    pub fn fixed(bonus: u32) -> Self {
        CardSchedule {
            values: vec![bonus],
            increment: 0,
        }
    }

    /// Returns the payout for the trade-in with zero-based `index`.
    pub fn bonus(&self, index: u32) -> u32 {
        let idx = index as usize;
        match self.values.get(idx) {
            Some(v) => *v,
            None => {
                let last = self.values.last().copied().unwrap_or(0);
                let extra = (idx + 1 - self.values.len().max(1)) as u32;
                last.saturating_add(self.increment.saturating_mul(extra))
            }
        }
    }
}

/// Why a trade-in was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("a set needs exactly 3 cards, got {0}")]
    WrongCount(usize),

    #[error("the same card was listed twice")]
    Duplicate,

    #[error("card for region {0:?} is not held by the player")]
    NotHeld(RegionId),

    #[error("cards do not form a set")]
    NotASet,
}

/// Owns the deck and tracks who holds which card.
#[derive(Debug, Clone)]
pub struct CardManager {
    cards: Vec<Card>,
    sets_traded: u32,
}

impl CardManager {
    /// Creates a full, unassigned deck for `map`. Kinds cycle through
    /// infantry, cavalry, artillery in region order.
    pub fn new(map: &MapDefinition) -> Self {
        let cards = map
            .region_ids()
            .map(|region| Card {
                region,
                kind: ALL_CARD_KINDS[region.index() % ALL_CARD_KINDS.len()],
                owner: None,
            })
            .collect();
        CardManager {
            cards,
            sets_traded: 0,
        }
    }

    /// Returns every card in the deck.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the card for `region`.
    pub fn card(&self, region: RegionId) -> Option<&Card> {
        self.cards.get(region.index())
    }

    /// Returns the cards held by `player`, in region order.
    pub fn player_cards(&self, player: PlayerId) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|c| c.owner == Some(player))
            .copied()
            .collect()
    }

    /// Number of cards still in the unassigned pool.
    pub fn unassigned_count(&self) -> usize {
        self.cards.iter().filter(|c| c.owner.is_none()).count()
    }

    /// Number of sets traded in so far.
    pub fn sets_traded(&self) -> u32 {
        self.sets_traded
    }

    /// Awards a card after `player` captures `captured`.
    ///
    /// Prefers the captured region's own card; otherwise draws uniformly
    /// from the unassigned pool. Returns the region of the awarded card, or
    /// None if the pool is empty.
    pub fn award_capture_card(
        &mut self,
        player: PlayerId,
        captured: RegionId,
        rng: &mut impl Rng,
    ) -> Option<RegionId> {
        let idx = match self.cards.get(captured.index()) {
            Some(card) if card.owner.is_none() => captured.index(),
            _ => self
                .cards
                .iter()
                .enumerate()
                .filter(|(_, c)| c.owner.is_none())
                .map(|(i, _)| i)
                .choose(rng)?,
        };
        self.cards[idx].owner = Some(player);
        Some(self.cards[idx].region)
    }

    /// Checks whether `regions` names a tradeable set held by `player`.
    pub fn validate_set(&self, player: PlayerId, regions: &[RegionId]) -> Result<(), CardError> {
        if regions.len() != 3 {
            return Err(CardError::WrongCount(regions.len()));
        }
        if regions[0] == regions[1] || regions[0] == regions[2] || regions[1] == regions[2] {
            return Err(CardError::Duplicate);
        }
        let mut kinds = [CardKind::Infantry; 3];
        for (slot, region) in kinds.iter_mut().zip(regions) {
            match self.cards.get(region.index()) {
                Some(card) if card.owner == Some(player) => *slot = card.kind,
                _ => return Err(CardError::NotHeld(*region)),
            }
        }
        let all_same = kinds[0] == kinds[1] && kinds[1] == kinds[2];
        let all_different = kinds[0] != kinds[1] && kinds[1] != kinds[2] && kinds[0] != kinds[2];
        if all_same || all_different {
            Ok(())
        } else {
            Err(CardError::NotASet)
        }
    }

    /// Turns in a set: returns the cards to the pool and the payout.
    ///
    /// Nothing changes if the set is invalid.
    pub fn play_cards(
        &mut self,
        player: PlayerId,
        regions: &[RegionId],
        schedule: &CardSchedule,
    ) -> Result<u32, CardError> {
        self.validate_set(player, regions)?;
        for region in regions {
            self.cards[region.index()].owner = None;
        }
        let bonus = schedule.bonus(self.sets_traded);
        self.sets_traded += 1;
        Ok(bonus)
    }

    /// Returns every card to the pool and clears the trade-in counter.
    pub fn reset(&mut self) {
        for card in &mut self.cards {
            card.owner = None;
        }
        self.sets_traded = 0;
    }

    /// Gives `region`'s card to `owner` directly (used when restoring state).
    pub fn set_owner(&mut self, region: RegionId, owner: Option<PlayerId>) -> bool {
        match self.cards.get_mut(region.index()) {
            Some(card) => {
                card.owner = owner;
                true
            }
            None => false,
        }
    }
}
