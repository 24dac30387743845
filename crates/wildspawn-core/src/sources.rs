//! Static spawn candidate sources: zones, regions and tiles.
//!
//! Sources are authored by an external editor, loaded once per reload, and
//! only read by the scheduler. Each source carries a [`SpawnProfile`]: the
//! weather and time triggers plus the six tier lists.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use wildspawn_common::{MapId, Rect, WorldPoint};

use crate::conditions::{TimeTrigger, WeatherTrigger};

/// Tile names looked up instead of `rock`, in order.
pub const ROCK_SYNONYMS: [&str; 2] = ["cave", "cave floor"];

/// Frequency tiers of a spawn source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Water spawns
    Water,
    /// Weather-triggered spawns
    Weather,
    /// Time-of-day-triggered spawns
    Timed,
    /// Common spawns
    Common,
    /// Uncommon spawns
    Uncommon,
    /// Rare spawns
    Rare,
}

/// The six creature-name lists of a spawn source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTiers {
    /// Water creatures
    pub water: Vec<String>,
    /// Weather creatures
    pub weather: Vec<String>,
    /// Timed creatures
    pub timed: Vec<String>,
    /// Common creatures
    pub common: Vec<String>,
    /// Uncommon creatures
    pub uncommon: Vec<String>,
    /// Rare creatures
    pub rare: Vec<String>,
}

impl SpawnTiers {
    /// Tiers with only a common list.
    #[must_use]
    pub fn common<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            common: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Returns the list for a tier.
    #[must_use]
    pub fn list(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Water => &self.water,
            Tier::Weather => &self.weather,
            Tier::Timed => &self.timed,
            Tier::Common => &self.common,
            Tier::Uncommon => &self.uncommon,
            Tier::Rare => &self.rare,
        }
    }

    /// True when every list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            Tier::Water,
            Tier::Weather,
            Tier::Timed,
            Tier::Common,
            Tier::Uncommon,
            Tier::Rare,
        ]
        .into_iter()
        .all(|tier| self.list(tier).is_empty())
    }
}

/// Triggers and tiers shared by every kind of source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnProfile {
    /// Weather condition enabling the weather tier
    pub weather: WeatherTrigger,
    /// Time condition enabling the timed tier
    pub time: TimeTrigger,
    /// Creature lists
    pub tiers: SpawnTiers,
}

impl SpawnProfile {
    /// Profile without triggers.
    #[must_use]
    pub fn new(tiers: SpawnTiers) -> Self {
        Self {
            tiers,
            ..Default::default()
        }
    }
}

/// A rectangular spawn source with a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnZone {
    /// Display name
    pub name: String,
    /// Covered area
    pub bounds: Rect,
    /// Higher priority wins on overlap
    pub priority: i32,
    /// Triggers and tiers
    pub profile: SpawnProfile,
}

/// A spawn source bound to a named server region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRegion {
    /// Name of the server region
    pub region_name: String,
    /// Triggers and tiers
    pub profile: SpawnProfile,
}

/// A spawn source keyed by terrain tile name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTile {
    /// Tile name, matched case-insensitively
    pub tile_name: String,
    /// Triggers and tiers
    pub profile: SpawnProfile,
}

/// All sources authored for one map, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpawnData {
    /// Map the sources belong to
    pub map: MapId,
    /// Rectangular zones, in insertion order
    #[serde(default)]
    pub zones: Vec<SpawnZone>,
    /// Region sources
    #[serde(default)]
    pub regions: Vec<SpawnRegion>,
    /// Tile sources
    #[serde(default)]
    pub tiles: Vec<SpawnTile>,
}

impl MapSpawnData {
    /// Empty data for a map.
    #[must_use]
    pub fn new(map: MapId) -> Self {
        Self {
            map,
            zones: Vec::new(),
            regions: Vec::new(),
            tiles: Vec::new(),
        }
    }
}

/// Indexed sources for one map.
#[derive(Debug, Clone, Default)]
struct MapTables {
    zones: Vec<SpawnZone>,
    regions: AHashMap<String, SpawnRegion>,
    tiles: AHashMap<String, SpawnTile>,
}

/// Lookup tables over every loaded map.
#[derive(Debug, Clone, Default)]
pub struct SpawnDataSet {
    maps: AHashMap<MapId, MapTables>,
}

impl SpawnDataSet {
    /// Creates an empty data set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a map's sources. Data for an already-loaded map is appended.
    pub fn insert_map(&mut self, data: MapSpawnData) {
        let tables = self.maps.entry(data.map).or_default();
        tables.zones.extend(data.zones);
        for region in data.regions {
            tables.regions.insert(region.region_name.clone(), region);
        }
        for tile in data.tiles {
            tables.tiles.insert(tile.tile_name.to_lowercase(), tile);
        }
    }

    /// Adds a single zone after the existing ones.
    pub fn add_zone(&mut self, map: MapId, zone: SpawnZone) {
        self.maps.entry(map).or_default().zones.push(zone);
    }

    /// Adds or replaces a region source.
    pub fn add_region(&mut self, map: MapId, region: SpawnRegion) {
        self.maps
            .entry(map)
            .or_default()
            .regions
            .insert(region.region_name.clone(), region);
    }

    /// Adds or replaces a tile source.
    pub fn add_tile(&mut self, map: MapId, tile: SpawnTile) {
        self.maps
            .entry(map)
            .or_default()
            .tiles
            .insert(tile.tile_name.to_lowercase(), tile);
    }

    /// Highest-priority zone containing the point.
    ///
    /// Ties go to the zone inserted last.
    #[must_use]
    pub fn zone_at(&self, map: MapId, point: WorldPoint) -> Option<&SpawnZone> {
        let tables = self.maps.get(&map)?;
        tables
            .zones
            .iter()
            .rev()
            .filter(|zone| zone.bounds.contains(point))
            .fold(None, |best: Option<&SpawnZone>, zone| match best {
                Some(current) if current.priority >= zone.priority => Some(current),
                _ => Some(zone),
            })
    }

    /// Region source for a server region name.
    #[must_use]
    pub fn region(&self, map: MapId, region_name: &str) -> Option<&SpawnRegion> {
        self.maps.get(&map)?.regions.get(region_name)
    }

    /// Tile source for a tile name, applying the rock synonyms.
    #[must_use]
    pub fn tile(&self, map: MapId, tile_name: &str) -> Option<&SpawnTile> {
        let tables = self.maps.get(&map)?;
        let key = tile_name.to_lowercase();
        if key == "rock" {
            return ROCK_SYNONYMS
                .iter()
                .find_map(|synonym| tables.tiles.get(*synonym));
        }
        tables.tiles.get(&key)
    }

    /// Number of maps with data.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Zone, region and tile counts summed over all maps.
    #[must_use]
    pub fn source_counts(&self) -> (usize, usize, usize) {
        self.maps.values().fold((0, 0, 0), |(z, r, t), tables| {
            (
                z + tables.zones.len(),
                r + tables.regions.len(),
                t + tables.tiles.len(),
            )
        })
    }

    /// True when no map has any source.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_counts() == (0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: MapId = MapId::new(0);

    fn zone(name: &str, priority: i32, creature: &str) -> SpawnZone {
        SpawnZone {
            name: name.to_string(),
            bounds: Rect::new(0, 0, 100, 100),
            priority,
            profile: SpawnProfile::new(SpawnTiers::common([creature])),
        }
    }

    #[test]
    fn test_zone_priority_wins() {
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, zone("high", 5, "Orc"));
        data.add_zone(MAP, zone("low", 2, "Rat"));

        let found = data.zone_at(MAP, WorldPoint::new(50, 50, 0)).expect("zone");
        assert_eq!(found.name, "high");
    }

    #[test]
    fn test_zone_tie_goes_to_latest() {
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, zone("first", 3, "Orc"));
        data.add_zone(MAP, zone("second", 3, "Rat"));

        let found = data.zone_at(MAP, WorldPoint::new(1, 1, 0)).expect("zone");
        assert_eq!(found.name, "second");
    }

    #[test]
    fn test_zone_outside_bounds() {
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, zone("z", 1, "Orc"));
        assert!(data.zone_at(MAP, WorldPoint::new(500, 5, 0)).is_none());
        assert!(data.zone_at(MapId::new(3), WorldPoint::new(5, 5, 0)).is_none());
    }

    #[test]
    fn test_rock_uses_cave_synonyms() {
        let mut data = SpawnDataSet::new();
        data.add_tile(
            MAP,
            SpawnTile {
                tile_name: "Cave Floor".to_string(),
                profile: SpawnProfile::new(SpawnTiers::common(["Bat"])),
            },
        );

        let tile = data.tile(MAP, "rock").expect("synonym lookup");
        assert_eq!(tile.profile.tiers.common, vec!["Bat".to_string()]);
        assert!(data.tile(MAP, "grass").is_none());
    }

    #[test]
    fn test_insert_map_counts() {
        let mut map_data = MapSpawnData::new(MAP);
        map_data.zones.push(zone("z", 1, "Orc"));
        map_data.regions.push(SpawnRegion {
            region_name: "Britain".to_string(),
            profile: SpawnProfile::default(),
        });

        let mut data = SpawnDataSet::new();
        data.insert_map(map_data);

        assert_eq!(data.source_counts(), (1, 1, 0));
        assert_eq!(data.map_count(), 1);
        assert!(data.region(MAP, "Britain").is_some());
    }

    #[test]
    fn test_tiers_is_empty() {
        assert!(SpawnTiers::default().is_empty());
        assert!(!SpawnTiers::common(["Orc"]).is_empty());
    }
}
