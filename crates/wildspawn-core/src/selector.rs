//! Candidate selection: where to spawn and what.
//!
//! A pass first searches for a location around the player, then resolves a
//! creature name from the highest-priority source covering that location.
//! Sources are consulted in a fixed order (zone, region, tile) and the first
//! one that yields a name wins.

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wildspawn_common::{Direction, MapId, PlayerId, WorldPoint};

use crate::conditions::WeatherKind;
use crate::queue::SpawnDecision;
use crate::settings::SettingsStore;
use crate::sources::{SpawnDataSet, SpawnProfile};
use crate::world::{MobileFilter, PlayerState, WorldOracle};

/// Elevation difference past which the player's z is used instead of the surface.
pub const CAVE_FLOOR_TOLERANCE: i32 = 20;

/// Why a selection pass produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SelectionMiss {
    /// The world no longer reports the player
    #[error("Player {0} unavailable")]
    PlayerUnavailable(PlayerId),
    /// The location budget ran out
    #[error("No valid spawn location")]
    NoLocation,
    /// No source covers the location
    #[error("No spawn source at location")]
    NoSource,
    /// Sources matched but every roll failed
    #[error("No creature rolled")]
    NoCreature,
}

/// World conditions at a candidate location.
#[derive(Debug, Clone, Copy)]
struct Conditions {
    water: bool,
    weather: WeatherKind,
    hour: u8,
    rift: bool,
}

/// Picks spawn decisions from the loaded sources and live settings.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector<'a> {
    data: &'a SpawnDataSet,
    settings: &'a SettingsStore,
}

impl<'a> CandidateSelector<'a> {
    /// Creates a selector over the given sources and settings.
    #[must_use]
    pub const fn new(data: &'a SpawnDataSet, settings: &'a SettingsStore) -> Self {
        Self { data, settings }
    }

    /// Runs one full selection pass for a player.
    pub fn select_spawn<W: WorldOracle + ?Sized>(
        &self,
        world: &W,
        rng: &mut Rng,
        player: &PlayerState,
    ) -> Result<SpawnDecision, SelectionMiss> {
        let location = self
            .find_location(world, rng, player)
            .ok_or(SelectionMiss::NoLocation)?;
        let type_name = self.resolve_creature(world, rng, player.map, location)?;
        Ok(SpawnDecision::new(type_name, player.map, location))
    }

    /// Searches for an acceptable point around the player.
    pub fn find_location<W: WorldOracle + ?Sized>(
        &self,
        world: &W,
        rng: &mut Rng,
        player: &PlayerState,
    ) -> Option<WorldPoint> {
        let settings = self.settings.settings();
        let min_range = settings.min_range;
        let max_range = self.settings.effective_max_range().max(min_range);
        let max_crowd = self.settings.effective_max_crowd() as usize;
        let map = player.map;
        let origin = player.location;

        for _ in 0..settings.max_spawn_checks {
            let direction = if rng.u8(0..4) < 3 {
                player.facing
            } else {
                Direction::ALL[rng.usize(..Direction::ALL.len())]
            };
            let distance = rng.i32(min_range..=max_range);
            let jitter = rng.i32(-(distance / 2)..=distance / 2);

            let (dx, dy) = direction.delta();
            let (px, py) = direction.perpendicular();
            let x = origin.x + dx * distance + px * jitter;
            let y = origin.y + dy * distance + py * jitter;

            let mut z = world.surface_z(map, x, y);
            if (z - origin.z).abs() > CAVE_FLOOR_TOLERANCE {
                z = origin.z;
            }
            let candidate = WorldPoint::new(x, y, z);

            if world
                .region_at(map, candidate)
                .is_some_and(|region| !region.allows_spawn)
            {
                continue;
            }
            let crowd = world
                .mobiles_near(map, candidate, min_range, MobileFilter::NonVendor)
                .len();
            if crowd >= max_crowd {
                continue;
            }
            if !world.is_valid_water(map, candidate) && !world.is_spawnable_land(map, candidate) {
                continue;
            }
            return Some(candidate);
        }
        None
    }

    /// Resolves a creature name at a location from zone, region and tile sources.
    pub fn resolve_creature<W: WorldOracle + ?Sized>(
        &self,
        world: &W,
        rng: &mut Rng,
        map: MapId,
        location: WorldPoint,
    ) -> Result<String, SelectionMiss> {
        let region = world.region_at(map, location);
        let conditions = Conditions {
            water: world.is_valid_water(map, location),
            weather: world.weather_at(map, location),
            hour: world.hour_at(map, location),
            rift: region.as_ref().is_some_and(|r| r.rift_enabled),
        };
        let mut matched = false;

        if let Some(zone) = self.data.zone_at(map, location) {
            matched = true;
            if let Some(name) = self.roll_profile(rng, &zone.profile, conditions) {
                return Ok(name);
            }
        }

        if let Some(source) = region
            .as_ref()
            .and_then(|info| self.data.region(map, &info.name))
        {
            matched = true;
            if let Some(name) = self.roll_profile(rng, &source.profile, conditions) {
                return Ok(name);
            }
        }

        if let Some(source) = world
            .tile_name(map, location)
            .and_then(|tile| self.data.tile(map, &tile))
        {
            matched = true;
            if let Some(name) = self.roll_profile(rng, &source.profile, conditions) {
                return Ok(name);
            }
        }

        Err(if matched {
            SelectionMiss::NoCreature
        } else {
            SelectionMiss::NoSource
        })
    }

    fn roll_profile(
        &self,
        rng: &mut Rng,
        profile: &SpawnProfile,
        conditions: Conditions,
    ) -> Option<String> {
        let settings = self.settings.settings();
        let chances = &settings.chances;
        let tiers = &profile.tiers;

        if conditions.water {
            return roll(rng, &tiers.water, chances.water);
        }

        if profile.weather.matches(conditions.weather) {
            let list = if conditions.rift && rng.f64() < settings.rift_chance {
                &tiers.rare
            } else {
                &tiers.weather
            };
            if let Some(name) = roll(rng, list, chances.weather) {
                return Some(name);
            }
        } else if profile.time.matches(conditions.hour) {
            if let Some(name) = roll(rng, &tiers.timed, chances.timed) {
                return Some(name);
            }
        }

        roll(rng, &tiers.rare, chances.rare)
            .or_else(|| roll(rng, &tiers.uncommon, chances.uncommon))
            .or_else(|| roll(rng, &tiers.common, chances.common))
    }
}

/// Uniform pick from `list` if a draw in `[0,1)` falls below `chance`.
fn roll(rng: &mut Rng, list: &[String], chance: f64) -> Option<String> {
    if list.is_empty() || rng.f64() >= chance {
        return None;
    }
    Some(list[rng.usize(..list.len())].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{HourBucket, TimeTrigger, WeatherTrigger};
    use crate::settings::{SpawnSettings, TierChances};
    use crate::sim::{SimMap, SimRegion, SimWorld};
    use crate::sources::{SpawnRegion, SpawnTile, SpawnTiers, SpawnZone};
    use wildspawn_common::Rect;

    const MAP: MapId = MapId::new(0);
    const SPOT: WorldPoint = WorldPoint::new(50, 50, 0);

    fn certain() -> SettingsStore {
        SettingsStore::new(SpawnSettings {
            chances: TierChances {
                water: 1.0,
                weather: 1.0,
                timed: 1.0,
                common: 1.0,
                uncommon: 0.0,
                rare: 0.0,
            },
            ..Default::default()
        })
    }

    fn world() -> SimWorld {
        let mut world = SimWorld::new();
        world.add_map(MAP, SimMap::new(200, 200));
        world
    }

    fn zone(name: &str, priority: i32, creature: &str) -> SpawnZone {
        SpawnZone {
            name: name.to_string(),
            bounds: Rect::new(40, 40, 60, 60),
            priority,
            profile: SpawnProfile::new(SpawnTiers::common([creature])),
        }
    }

    fn player(location: WorldPoint) -> PlayerState {
        PlayerState {
            id: PlayerId::new(1),
            map: MAP,
            location,
            facing: Direction::East,
            lawless: false,
        }
    }

    #[test]
    fn test_zone_priority_wins() {
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, zone("goblin warren", 2, "Goblin"));
        data.add_zone(MAP, zone("orc fort", 5, "Orc"));
        let settings = certain();
        let selector = CandidateSelector::new(&data, &settings);
        let mut rng = Rng::with_seed(1);

        let name = selector.resolve_creature(&world(), &mut rng, MAP, SPOT);
        assert_eq!(name.as_deref(), Ok("Orc"));
    }

    #[test]
    fn test_region_then_tile_sources() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            map.regions.push(SimRegion::new("Britain", Rect::new(0, 0, 99, 199)));
            map.tiles.push((Rect::new(100, 0, 199, 199), "Rock".to_string()));
        }
        let mut data = SpawnDataSet::new();
        data.add_region(
            MAP,
            SpawnRegion {
                region_name: "Britain".to_string(),
                profile: SpawnProfile::new(SpawnTiers::common(["Rat"])),
            },
        );
        data.add_tile(
            MAP,
            SpawnTile {
                tile_name: "Cave Floor".to_string(),
                profile: SpawnProfile::new(SpawnTiers::common(["Bat"])),
            },
        );
        let settings = certain();
        let selector = CandidateSelector::new(&data, &settings);
        let mut rng = Rng::with_seed(2);

        let in_region = selector.resolve_creature(&world, &mut rng, MAP, SPOT);
        let on_rock = selector.resolve_creature(&world, &mut rng, MAP, WorldPoint::new(150, 50, 0));
        assert_eq!(in_region.as_deref(), Ok("Rat"));
        assert_eq!(on_rock.as_deref(), Ok("Bat"));
    }

    #[test]
    fn test_no_source_and_no_creature() {
        let mut data = SpawnDataSet::new();
        let settings = certain();
        let mut rng = Rng::with_seed(3);

        let nothing = CandidateSelector::new(&data, &settings).resolve_creature(
            &world(),
            &mut rng,
            MAP,
            SPOT,
        );
        assert_eq!(nothing, Err(SelectionMiss::NoSource));

        let mut empty = zone("empty", 1, "Orc");
        empty.profile.tiers = SpawnTiers::default();
        data.add_zone(MAP, empty);
        let empty_lists = CandidateSelector::new(&data, &settings).resolve_creature(
            &world(),
            &mut rng,
            MAP,
            SPOT,
        );
        assert_eq!(empty_lists, Err(SelectionMiss::NoCreature));
    }

    #[test]
    fn test_weather_tier_falls_back_to_common() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            map.weather = WeatherKind::Rain;
        }
        let mut rainy = zone("marsh", 1, "Frog");
        rainy.profile.weather = WeatherTrigger::Rain;
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, rainy.clone());
        let settings = certain();
        let mut rng = Rng::with_seed(4);

        // Weather list empty: common tier answers
        let fallback = CandidateSelector::new(&data, &settings)
            .resolve_creature(&world, &mut rng, MAP, SPOT);
        assert_eq!(fallback.as_deref(), Ok("Frog"));

        rainy.profile.tiers.weather = vec!["Water Elemental".to_string()];
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, rainy);
        let weather = CandidateSelector::new(&data, &settings)
            .resolve_creature(&world, &mut rng, MAP, SPOT);
        assert_eq!(weather.as_deref(), Ok("Water Elemental"));
    }

    #[test]
    fn test_rift_substitutes_rare_list() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            map.weather = WeatherKind::Storm;
            let mut rift = SimRegion::new("Rift", Rect::new(0, 0, 199, 199));
            rift.rift_enabled = true;
            map.regions.push(rift);
        }
        let mut stormy = zone("peak", 1, "Orc");
        stormy.profile.weather = WeatherTrigger::Storm;
        stormy.profile.tiers.weather = vec!["Air Elemental".to_string()];
        stormy.profile.tiers.rare = vec!["Daemon".to_string()];
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, stormy);

        let mut settings = certain();
        let mut always = settings.settings().clone();
        always.rift_chance = 1.0;
        settings.replace(always);
        let mut rng = Rng::with_seed(5);

        let name = CandidateSelector::new(&data, &settings)
            .resolve_creature(&world, &mut rng, MAP, SPOT);
        assert_eq!(name.as_deref(), Ok("Daemon"));
    }

    #[test]
    fn test_timed_tier_during_bucket() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            map.hour = 18;
        }
        let mut dusk = zone("graveyard", 1, "Rat");
        dusk.profile.time = TimeTrigger::During(HourBucket::Dusk);
        dusk.profile.tiers.timed = vec!["Zombie".to_string()];
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, dusk);
        let settings = certain();
        let mut rng = Rng::with_seed(6);

        let name = CandidateSelector::new(&data, &settings)
            .resolve_creature(&world, &mut rng, MAP, SPOT);
        assert_eq!(name.as_deref(), Ok("Zombie"));
    }

    #[test]
    fn test_water_point_rolls_water_tier_only() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            map.water.push(Rect::new(0, 0, 199, 199));
        }
        let mut lake = zone("lake", 1, "Orc");
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, lake.clone());
        let settings = certain();
        let mut rng = Rng::with_seed(7);

        let dry = CandidateSelector::new(&data, &settings)
            .resolve_creature(&world, &mut rng, MAP, SPOT);
        assert_eq!(dry, Err(SelectionMiss::NoCreature));

        lake.profile.tiers.water = vec!["Sea Serpent".to_string()];
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, lake);
        let wet = CandidateSelector::new(&data, &settings)
            .resolve_creature(&world, &mut rng, MAP, SPOT);
        assert_eq!(wet.as_deref(), Ok("Sea Serpent"));
    }

    #[test]
    fn test_locations_stay_in_range() {
        let data = SpawnDataSet::new();
        let settings = certain();
        let selector = CandidateSelector::new(&data, &settings);
        let world = world();
        let origin = WorldPoint::new(100, 100, 0);
        let mut rng = Rng::with_seed(8);

        let min = settings.settings().min_range;
        let max = settings.effective_max_range();
        // Diagonal steps plus perpendicular jitter stretch up to ~1.58x
        let outer = (f64::from(max) * 1.6).ceil();
        for _ in 0..200 {
            let spot = selector
                .find_location(&world, &mut rng, &player(origin))
                .expect("open field");
            let d = spot.distance_2d(origin);
            assert!(d >= f64::from(min), "{spot} too close");
            assert!(d <= outer, "{spot} too far");
        }
    }

    #[test]
    fn test_cave_floor_correction() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            map.surface_z = 60;
        }
        let data = SpawnDataSet::new();
        let settings = certain();
        let mut rng = Rng::with_seed(9);
        let underground = WorldPoint::new(100, 100, -10);

        let spot = CandidateSelector::new(&data, &settings)
            .find_location(&world, &mut rng, &player(underground))
            .expect("open field");
        assert_eq!(spot.z, -10);

        if let Some(map) = world.map_mut(MAP) {
            map.surface_z = 5;
        }
        let spot = CandidateSelector::new(&data, &settings)
            .find_location(&world, &mut rng, &player(underground))
            .expect("open field");
        assert_eq!(spot.z, 5);
    }

    #[test]
    fn test_no_location_when_region_forbids() {
        let mut world = world();
        if let Some(map) = world.map_mut(MAP) {
            let mut town = SimRegion::new("Town", Rect::new(0, 0, 199, 199));
            town.allows_spawn = false;
            map.regions.push(town);
        }
        let mut data = SpawnDataSet::new();
        data.add_zone(MAP, zone("anything", 1, "Orc"));
        let settings = certain();
        let mut rng = Rng::with_seed(10);

        let result = CandidateSelector::new(&data, &settings).select_spawn(
            &world,
            &mut rng,
            &player(WorldPoint::new(100, 100, 0)),
        );
        assert_eq!(result, Err(SelectionMiss::NoLocation));
    }

    #[test]
    fn test_crowded_area_rejected() {
        let mut world = world();
        world.register_creature(crate::sim::CreatureTemplate::new("Orc", 10, 0, 10));
        let origin = WorldPoint::new(100, 100, 0);
        for dx in -6..=6 {
            for dy in -6..=6 {
                world
                    .spawn_at("Orc", MAP, origin.offset(dx, dy))
                    .expect("placed");
            }
        }
        let settings = SettingsStore::new(SpawnSettings {
            min_range: 2,
            max_range: 3,
            max_crowd: 1,
            ..Default::default()
        });
        let data = SpawnDataSet::new();
        let mut rng = Rng::with_seed(11);

        let spot = CandidateSelector::new(&data, &settings).find_location(
            &world,
            &mut rng,
            &player(origin),
        );
        assert!(spot.is_none());
    }
}
