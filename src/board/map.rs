//! Immutable map definition: regions, adjacency, and continents.
//!
//! A `MapDefinition` is built once (from the classic table or a JSON file),
//! validated, and then shared by `Arc` with every board that uses it.
//! Regions are addressed by dense `RegionId` indices so per-region state
//! can live in plain vectors.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use super::classic::{CLASSIC_ADJACENCY, CLASSIC_CONTINENTS};

/// Dense index of a region within its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u16);

impl RegionId {
    /// Returns the index as usize for vector lookups.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a continent within its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinentId(pub u16);

impl ContinentId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Static data for one region.
#[derive(Debug, Clone)]
pub struct RegionInfo {
    pub name: String,
    pub neighbors: Vec<RegionId>,
    pub continent: Option<ContinentId>,
}

/// Static data for one continent.
#[derive(Debug, Clone)]
pub struct ContinentInfo {
    pub name: String,
    pub bonus: u32,
    pub regions: Vec<RegionId>,
}

/// Errors raised while building a map definition.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("duplicate region name: '{0}'")]
    DuplicateRegion(String),

    #[error("region '{region}' lists unknown neighbour '{neighbor}'")]
    UnknownNeighbor { region: String, neighbor: String },

    #[error("region '{0}' lists itself as a neighbour")]
    SelfAdjacent(String),

    #[error("adjacency '{from}' -> '{to}' has no reverse edge")]
    Asymmetric { from: String, to: String },

    #[error("continent '{continent}' names unknown region '{region}'")]
    UnknownContinentRegion { continent: String, region: String },

    #[error("region '{region}' belongs to both '{first}' and '{second}'")]
    OverlappingContinents {
        region: String,
        first: String,
        second: String,
    },

    #[error("map has {0} regions, more than the supported maximum")]
    TooManyRegions(usize),

    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse map file: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk map format.
#[derive(Debug, Deserialize)]
struct MapFile {
    regions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    continents: BTreeMap<String, ContinentFile>,
}

#[derive(Debug, Deserialize)]
struct ContinentFile {
    regions: Vec<String>,
    bonus: u32,
}

/// The region graph and continent grouping for one map.
#[derive(Debug, Clone)]
pub struct MapDefinition {
    regions: Vec<RegionInfo>,
    continents: Vec<ContinentInfo>,
    by_name: HashMap<String, RegionId>,
}

impl MapDefinition {
    /// Builds and validates a map from name-based tables.
    ///
    /// Adjacency must be symmetric and irreflexive; continents may only name
    /// known regions and may not overlap. A region outside every continent
    /// is allowed.
    pub fn new<R, N, C, M>(regions: R, continents: C) -> Result<Self, MapError>
    where
        R: IntoIterator<Item = (String, N)>,
        N: IntoIterator<Item = String>,
        C: IntoIterator<Item = (String, u32, M)>,
        M: IntoIterator<Item = String>,
    {
        let raw: Vec<(String, Vec<String>)> = regions
            .into_iter()
            .map(|(name, n)| (name, n.into_iter().collect()))
            .collect();
        if raw.len() > u16::MAX as usize {
            return Err(MapError::TooManyRegions(raw.len()));
        }

        let mut by_name = HashMap::with_capacity(raw.len());
        for (i, (name, _)) in raw.iter().enumerate() {
            if by_name.insert(name.clone(), RegionId(i as u16)).is_some() {
                return Err(MapError::DuplicateRegion(name.clone()));
            }
        }

        let mut infos = Vec::with_capacity(raw.len());
        for (name, neighbor_names) in &raw {
            let mut neighbors = Vec::with_capacity(neighbor_names.len());
            for n in neighbor_names {
                if n == name {
                    return Err(MapError::SelfAdjacent(name.clone()));
                }
                let id = by_name.get(n).copied().ok_or_else(|| MapError::UnknownNeighbor {
                    region: name.clone(),
                    neighbor: n.clone(),
                })?;
                if !neighbors.contains(&id) {
                    neighbors.push(id);
                }
            }
            infos.push(RegionInfo {
                name: name.clone(),
                neighbors,
                continent: None,
            });
        }

        for (i, info) in infos.iter().enumerate() {
            let this = RegionId(i as u16);
            for n in &info.neighbors {
                if !infos[n.index()].neighbors.contains(&this) {
                    return Err(MapError::Asymmetric {
                        from: info.name.clone(),
                        to: infos[n.index()].name.clone(),
                    });
                }
            }
        }

        let mut conts = Vec::new();
        for (c_idx, (c_name, bonus, members)) in continents.into_iter().enumerate() {
            let cid = ContinentId(c_idx as u16);
            let mut ids = Vec::new();
            for m in members {
                let id = by_name.get(&m).copied().ok_or_else(|| {
                    MapError::UnknownContinentRegion {
                        continent: c_name.clone(),
                        region: m.clone(),
                    }
                })?;
                let slot = &mut infos[id.index()].continent;
                if *slot == Some(cid) {
                    continue;
                }
                if let Some(prev) = *slot {
                    let first: &ContinentInfo = &conts[prev.index()];
                    return Err(MapError::OverlappingContinents {
                        region: m,
                        first: first.name.clone(),
                        second: c_name,
                    });
                }
                *slot = Some(cid);
                ids.push(id);
            }
            conts.push(ContinentInfo {
                name: c_name,
                bonus,
                regions: ids,
            });
        }

        Ok(MapDefinition {
            regions: infos,
            continents: conts,
            by_name,
        })
    }

    /// Returns the shared classic 42-region map, built on first use.
    pub fn classic() -> Arc<MapDefinition> {
        static CLASSIC: OnceLock<Arc<MapDefinition>> = OnceLock::new();
        CLASSIC
            .get_or_init(|| {
                let regions = CLASSIC_ADJACENCY.iter().map(|(name, neighbors)| {
                    (
                        name.to_string(),
                        neighbors.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
                    )
                });
                let continents = CLASSIC_CONTINENTS.iter().map(|(name, bonus, members)| {
                    (
                        name.to_string(),
                        *bonus,
                        members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
                    )
                });
                match MapDefinition::new(regions, continents) {
                    Ok(map) => Arc::new(map),
                    // Covered by the `classic` table tests.
                    Err(e) => panic!("classic map table is invalid: {}", e),
                }
            })
            .clone()
    }

    /// Parses a map from JSON text.
    pub fn from_json(text: &str) -> Result<Self, MapError> {
        let file: MapFile = serde_json::from_str(text)?;
        MapDefinition::new(
            file.regions,
            file.continents
                .into_iter()
                .map(|(name, c)| (name, c.bonus, c.regions)),
        )
    }

    /// Loads a map from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Number of continents.
    pub fn continent_count(&self) -> usize {
        self.continents.len()
    }

    /// Iterates over all region ids in index order.
    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        (0..self.regions.len()).map(|i| RegionId(i as u16))
    }

    /// Iterates over all continent ids in index order.
    pub fn continent_ids(&self) -> impl Iterator<Item = ContinentId> + '_ {
        (0..self.continents.len()).map(|i| ContinentId(i as u16))
    }

    /// Looks up a region by name.
    pub fn region_id(&self, name: &str) -> Option<RegionId> {
        self.by_name.get(name).copied()
    }

    /// Returns a region's metadata. Panics on an id from another map.
    pub fn region(&self, id: RegionId) -> &RegionInfo {
        &self.regions[id.index()]
    }

    /// Returns a region's name.
    pub fn name(&self, id: RegionId) -> &str {
        &self.regions[id.index()].name
    }

    /// Returns a region's neighbours.
    pub fn neighbors(&self, id: RegionId) -> &[RegionId] {
        &self.regions[id.index()].neighbors
    }

    /// Returns true if `a` and `b` share a border.
    pub fn is_adjacent(&self, a: RegionId, b: RegionId) -> bool {
        self.regions
            .get(a.index())
            .is_some_and(|r| r.neighbors.contains(&b))
    }

    /// Returns a continent's metadata.
    pub fn continent(&self, id: ContinentId) -> &ContinentInfo {
        &self.continents[id.index()]
    }

    /// Iterates over all continents.
    pub fn continents(&self) -> impl Iterator<Item = &ContinentInfo> {
        self.continents.iter()
    }

    /// Returns true if `id` indexes a region of this map.
    pub fn contains(&self, id: RegionId) -> bool {
        id.index() < self.regions.len()
    }
}
