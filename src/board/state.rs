//! Board state: territory ownership, troops, and derived queries.
//!
//! The board is the single source of truth for who holds what. It owns one
//! `TerritoryState` per map region (indexed by `RegionId`) plus the card
//! deck, and shares the immutable `MapDefinition` by `Arc`.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use super::cards::CardManager;
use super::map::{ContinentId, MapDefinition, RegionId};
use super::territory::{PlayerId, TerritoryState};

/// Minimum troop income regardless of territories held.
pub const MIN_TROOP_INCOME: u32 = 3;

/// Territories needed per troop of income.
pub const TERRITORIES_PER_TROOP: u32 = 3;

/// Complete mutable board for one game.
#[derive(Debug, Clone)]
pub struct Board {
    map: Arc<MapDefinition>,
    territories: Vec<TerritoryState>,
    num_players: u8,
    pub cards: CardManager,
}

impl Board {
    /// Creates an unowned board over `map` for `num_players` players.
    pub fn new(map: Arc<MapDefinition>, num_players: u8) -> Self {
        let territories = vec![TerritoryState::unowned(); map.region_count()];
        let cards = CardManager::new(&map);
        Board {
            map,
            territories,
            num_players,
            cards,
        }
    }

    /// Creates an unowned board over the classic map.
    pub fn classic(num_players: u8) -> Self {
        Self::new(MapDefinition::classic(), num_players)
    }

    /// Returns the map this board is laid over.
    pub fn map(&self) -> &Arc<MapDefinition> {
        &self.map
    }

    /// Number of seated players.
    pub fn num_players(&self) -> u8 {
        self.num_players
    }

    /// Returns true if `player` is seated at this board.
    pub fn is_player(&self, player: PlayerId) -> bool {
        player.0 >= 1 && player.0 <= self.num_players
    }

    /// Resets every territory to unowned with no troops, and clears all hands.
    pub fn generate_unowned_board(&mut self) {
        self.territories.fill(TerritoryState::unowned());
        self.cards.reset();
    }

    /// Deals every region to a player with one troop each.
    ///
    /// Regions are shuffled and split into contiguous chunks of
    /// `total / num_players`; the first `total % num_players` players get
    /// one extra region.
    pub fn generate_random_board(&mut self, rng: &mut impl Rng) {
        self.generate_unowned_board();
        if self.num_players == 0 {
            return;
        }

        let mut order: Vec<RegionId> = self.map.region_ids().collect();
        order.shuffle(rng);

        let total = order.len();
        let players = self.num_players as usize;
        let base = total / players;
        let mut remainder = total % players;

        let mut start = 0;
        for player in PlayerId::all(self.num_players) {
            let mut portion = base;
            if remainder > 0 {
                portion += 1;
                remainder -= 1;
            }
            for region in &order[start..start + portion] {
                self.territories[region.index()] = TerritoryState::owned(player, 1);
            }
            start += portion;
        }
    }

    /// Returns the territory state of `region`.
    pub fn territory(&self, region: RegionId) -> Option<&TerritoryState> {
        self.territories.get(region.index())
    }

    /// Returns the territory state of the region called `name`.
    pub fn territory_by_name(&self, name: &str) -> Option<&TerritoryState> {
        self.map.region_id(name).and_then(|r| self.territory(r))
    }

    /// Iterates over `(region, state)` pairs in region order.
    pub fn territories(&self) -> impl Iterator<Item = (RegionId, &TerritoryState)> {
        self.territories
            .iter()
            .enumerate()
            .map(|(i, t)| (RegionId(i as u16), t))
    }

    /// Owner of `region`, or None if unowned or unknown.
    pub fn owner(&self, region: RegionId) -> Option<PlayerId> {
        self.territory(region).and_then(|t| t.owner)
    }

    /// Troops on `region` (0 for unknown regions).
    pub fn troops(&self, region: RegionId) -> u32 {
        self.territory(region).map_or(0, |t| t.troops)
    }

    /// Number of regions `player` owns.
    pub fn territory_count(&self, player: PlayerId) -> u32 {
        self.territories.iter().filter(|t| t.is_owned_by(player)).count() as u32
    }

    /// Regions `player` owns, in region order.
    pub fn territories_owned_by(&self, player: PlayerId) -> Vec<RegionId> {
        self.territories()
            .filter(|(_, t)| t.is_owned_by(player))
            .map(|(r, _)| r)
            .collect()
    }

    /// Sum of troops across `player`'s territories.
    pub fn total_troops(&self, player: PlayerId) -> u32 {
        self.territories
            .iter()
            .filter(|t| t.is_owned_by(player))
            .map(|t| t.troops)
            .sum()
    }

    /// Adds `n` troops to `region` if `player` owns it.
    ///
    /// Returns false (and changes nothing) for an unknown region or an
    /// ownership mismatch.
    pub fn deploy_troops(&mut self, player: PlayerId, region: RegionId, n: u32) -> bool {
        match self.territories.get_mut(region.index()) {
            Some(t) if t.is_owned_by(player) => {
                t.troops = t.troops.saturating_add(n);
                true
            }
            _ => false,
        }
    }

    /// Overwrites a territory's owner and troops.
    ///
    /// The pair must satisfy the owner/troop invariant; returns false and
    /// changes nothing otherwise.
    pub fn set_territory(&mut self, region: RegionId, state: TerritoryState) -> bool {
        if !state.is_consistent() {
            return false;
        }
        if let Some(owner) = state.owner {
            if !self.is_player(owner) {
                return false;
            }
        }
        match self.territories.get_mut(region.index()) {
            Some(t) => {
                *t = state;
                true
            }
            None => false,
        }
    }

    /// Hands `region` to `owner` with `troops` (at least 1).
    pub fn set_owner(&mut self, region: RegionId, owner: PlayerId, troops: u32) -> bool {
        self.set_territory(region, TerritoryState::owned(owner, troops))
    }

    /// Sets the troop count of an owned region; refuses to drop below 1.
    pub fn set_troops(&mut self, region: RegionId, troops: u32) -> bool {
        match self.territories.get_mut(region.index()) {
            Some(t) if t.owner.is_some() && troops >= 1 => {
                t.troops = troops;
                true
            }
            _ => false,
        }
    }

    /// Moves `n` troops between two regions with the same owner, leaving
    /// at least one behind. Returns false and changes nothing otherwise.
    pub fn transfer(&mut self, from: RegionId, to: RegionId, n: u32) -> bool {
        if from == to || n == 0 {
            return false;
        }
        let (Some(src), Some(dst)) = (self.territory(from), self.territory(to)) else {
            return false;
        };
        if src.owner.is_none() || src.owner != dst.owner || src.troops <= n {
            return false;
        }
        self.territories[from.index()].troops -= n;
        self.territories[to.index()].troops += n;
        true
    }

    /// Returns true if `player` owns every region of `continent`.
    pub fn owns_continent(&self, player: PlayerId, continent: ContinentId) -> bool {
        self.map
            .continent(continent)
            .regions
            .iter()
            .all(|r| self.territories[r.index()].is_owned_by(player))
    }

    /// Fraction of `continent` owned by `player`, in `[0, 1]`.
    pub fn continent_progress(&self, player: PlayerId, continent: ContinentId) -> f32 {
        let regions = &self.map.continent(continent).regions;
        if regions.is_empty() {
            return 0.0;
        }
        let owned = regions
            .iter()
            .filter(|r| self.territories[r.index()].is_owned_by(player))
            .count();
        owned as f32 / regions.len() as f32
    }

    /// Troops `player` receives at the start of their deploy phase:
    /// `max(owned / 3, 3)` plus the bonus of every fully owned continent.
    pub fn calculate_troop_income(&self, player: PlayerId) -> u32 {
        let territory_bonus = (self.territory_count(player) / TERRITORIES_PER_TROOP).max(MIN_TROOP_INCOME);
        let continent_bonus: u32 = self
            .map
            .continent_ids()
            .filter(|c| self.owns_continent(player, *c))
            .map(|c| self.map.continent(c).bonus)
            .sum();
        territory_bonus + continent_bonus
    }

    /// Returns the winner if every owned territory shares one owner.
    ///
    /// A board with nothing owned (including an empty map) has no winner.
    pub fn check_winner(&self) -> Option<PlayerId> {
        let mut owners = self.territories.iter().filter_map(|t| t.owner);
        let first = owners.next()?;
        if owners.all(|o| o == first) {
            Some(first)
        } else {
            None
        }
    }

    /// Regions reachable from `source` through territories owned by
    /// `player`, excluding `source` itself.
    ///
    /// Depth-first with an explicit visited set; every region appears at
    /// most once even though the graph has cycles.
    pub fn find_connected_territories(&self, player: PlayerId, source: RegionId) -> Vec<RegionId> {
        if !self.map.contains(source) {
            return Vec::new();
        }
        let mut visited = vec![false; self.territories.len()];
        let mut stack = vec![source];
        let mut connected = Vec::new();
        visited[source.index()] = true;

        while let Some(current) = stack.pop() {
            for &next in self.map.neighbors(current) {
                if visited[next.index()] || !self.territories[next.index()].is_owned_by(player) {
                    continue;
                }
                visited[next.index()] = true;
                connected.push(next);
                stack.push(next);
            }
        }
        connected
    }

    /// Returns true if every territory satisfies the owner/troop invariant.
    pub fn is_consistent(&self) -> bool {
        self.territories.iter().all(|t| {
            t.is_consistent() && t.owner.map_or(true, |o| self.is_player(o))
        })
    }
}
