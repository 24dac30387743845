//! In-memory reference world.
//!
//! [`SimWorld`] implements [`WorldRuntime`] over plain tables. Maps are
//! rectangles with water, blocked and tile overlays. Later overlays win
//! over earlier ones. The host binary drives it as a stand-in server and
//! the tests use it as a fixture.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use wildspawn_common::{
    Direction, EntityId, MapId, PlayerId, Rect, WorldError, WorldPoint, WorldResult,
};

use crate::conditions::WeatherKind;
use crate::world::{MapRuleset, MobileFilter, PlayerState, RegionInfo, Vitals, WorldOracle, WorldRuntime};

/// Creature type known to the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    /// Type name
    pub name: String,
    /// Max hit points
    pub hits: i32,
    /// Max mana
    pub mana: i32,
    /// Max stamina
    pub stam: i32,
    /// Shopkeepers are ignored by crowd checks
    pub vendor: bool,
}

impl CreatureTemplate {
    /// Creates a non-vendor template.
    #[must_use]
    pub fn new(name: impl Into<String>, hits: i32, mana: i32, stam: i32) -> Self {
        Self {
            name: name.into(),
            hits,
            mana,
            stam,
            vendor: false,
        }
    }

    /// Marks the template as a vendor.
    #[must_use]
    pub fn vendor(mut self) -> Self {
        self.vendor = true;
        self
    }
}

/// Server region on a simulated map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRegion {
    /// Region name
    pub name: String,
    /// Covered area
    pub bounds: Rect,
    /// Whether creatures may spawn inside
    pub allows_spawn: bool,
    /// Whether the rift feature is enabled
    pub rift_enabled: bool,
}

impl SimRegion {
    /// A region that allows spawning, rift disabled.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            bounds,
            allows_spawn: true,
            rift_enabled: false,
        }
    }
}

/// One simulated map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimMap {
    /// Combat ruleset
    pub ruleset: MapRuleset,
    /// Width in tiles
    pub width: i32,
    /// Height in tiles
    pub height: i32,
    /// Tile name where no overlay applies
    pub default_tile: String,
    /// Elevation where no overlay applies
    pub surface_z: i32,
    /// Water areas
    pub water: Vec<Rect>,
    /// Impassable areas
    pub blocked: Vec<Rect>,
    /// Tile name overlays
    pub tiles: Vec<(Rect, String)>,
    /// Elevation overlays
    pub elevations: Vec<(Rect, i32)>,
    /// Server regions
    pub regions: Vec<SimRegion>,
    /// Current weather
    pub weather: WeatherKind,
    /// Current hour (0-23)
    pub hour: u8,
}

impl SimMap {
    /// Flat grassland, clear weather, noon.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            ruleset: MapRuleset::Hostile,
            width,
            height,
            default_tile: "grass".to_string(),
            surface_z: 0,
            water: Vec::new(),
            blocked: Vec::new(),
            tiles: Vec::new(),
            elevations: Vec::new(),
            regions: Vec::new(),
            weather: WeatherKind::Clear,
            hour: 12,
        }
    }

    /// Whether x/y lies on the map.
    #[must_use]
    pub fn in_bounds(&self, point: WorldPoint) -> bool {
        (0..self.width).contains(&point.x) && (0..self.height).contains(&point.y)
    }

    fn is_water(&self, point: WorldPoint) -> bool {
        self.water.iter().any(|rect| rect.contains(point))
    }

    fn region_at(&self, point: WorldPoint) -> Option<&SimRegion> {
        self.regions.iter().rev().find(|region| region.bounds.contains(point))
    }
}

#[derive(Debug, Clone)]
struct SimMobile {
    type_name: String,
    vendor: bool,
    location: Option<(MapId, WorldPoint)>,
    vitals: Vitals,
    dormant: bool,
}

/// In-memory world.
#[derive(Debug, Default)]
pub struct SimWorld {
    maps: AHashMap<MapId, SimMap>,
    templates: AHashMap<String, CreatureTemplate>,
    mobiles: AHashMap<EntityId, SimMobile>,
    players: AHashMap<PlayerId, PlayerState>,
    created: u64,
    effects_played: u64,
}

impl SimWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a map.
    pub fn add_map(&mut self, id: MapId, map: SimMap) {
        self.maps.insert(id, map);
    }

    /// A map by id.
    #[must_use]
    pub fn map(&self, id: MapId) -> Option<&SimMap> {
        self.maps.get(&id)
    }

    /// Mutable access to a map.
    pub fn map_mut(&mut self, id: MapId) -> Option<&mut SimMap> {
        self.maps.get_mut(&id)
    }

    /// Registers a creature type.
    pub fn register_creature(&mut self, template: CreatureTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Adds a player facing north, not lawless.
    pub fn add_player(&mut self, id: PlayerId, map: MapId, location: WorldPoint) {
        self.players.insert(
            id,
            PlayerState {
                id,
                map,
                location,
                facing: Direction::North,
                lawless: false,
            },
        );
    }

    /// Mutable access to a player.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(&id)
    }

    /// Moves a player. Returns false for an unknown player.
    pub fn move_player(&mut self, id: PlayerId, map: MapId, location: WorldPoint) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.map = map;
                player.location = location;
                true
            },
            None => false,
        }
    }

    /// Places a creature directly, bypassing the spawn engine.
    pub fn spawn_at(
        &mut self,
        type_name: &str,
        map: MapId,
        location: WorldPoint,
    ) -> WorldResult<EntityId> {
        let id = self.create_mobile(type_name)?;
        if let Err(e) = self.move_mobile(id, map, location) {
            self.delete_mobile(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Whether a mobile is dormant.
    #[must_use]
    pub fn is_dormant(&self, id: EntityId) -> bool {
        self.mobiles.get(&id).is_some_and(|m| m.dormant)
    }

    /// Current combat target of a mobile.
    #[must_use]
    pub fn combatant(&self, id: EntityId) -> Option<PlayerId> {
        self.mobiles.get(&id).and_then(|m| m.vitals.combatant)
    }

    /// Placed, awake mobiles.
    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.mobiles
            .values()
            .filter(|m| !m.dormant && m.location.is_some())
            .count()
    }

    /// Every existing mobile, dormant ones included.
    #[must_use]
    pub fn mobile_count(&self) -> usize {
        self.mobiles.len()
    }

    /// Mobiles created over the world's lifetime.
    #[must_use]
    pub const fn created_count(&self) -> u64 {
        self.created
    }

    /// Spawn effects played.
    #[must_use]
    pub const fn effects_played(&self) -> u64 {
        self.effects_played
    }

    fn mobile_mut(&mut self, id: EntityId) -> WorldResult<&mut SimMobile> {
        self.mobiles
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))
    }
}

impl WorldOracle for SimWorld {
    fn map_exists(&self, map: MapId) -> bool {
        self.maps.contains_key(&map)
    }

    fn map_ruleset(&self, map: MapId) -> MapRuleset {
        self.maps.get(&map).map(|m| m.ruleset).unwrap_or_default()
    }

    fn player_state(&self, player: PlayerId) -> Option<PlayerState> {
        self.players.get(&player).copied()
    }

    fn players_near(&self, map: MapId, point: WorldPoint, range: i32) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.map == map && p.location.in_range(point, range))
            .map(|p| p.id)
            .collect();
        ids.sort();
        ids
    }

    fn mobiles_near(
        &self,
        map: MapId,
        point: WorldPoint,
        range: i32,
        filter: MobileFilter,
    ) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .mobiles
            .iter()
            .filter(|(_, m)| !m.dormant)
            .filter(|(_, m)| !(filter == MobileFilter::NonVendor && m.vendor))
            .filter(|(_, m)| {
                m.location
                    .is_some_and(|(on, at)| on == map && at.in_range(point, range))
            })
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn mobile_location(&self, id: EntityId) -> Option<(MapId, WorldPoint)> {
        self.mobiles
            .get(&id)
            .filter(|m| !m.dormant)
            .and_then(|m| m.location)
    }

    fn mobile_type(&self, id: EntityId) -> Option<String> {
        self.mobiles.get(&id).map(|m| m.type_name.clone())
    }

    fn is_alive(&self, id: EntityId) -> bool {
        self.mobiles.contains_key(&id)
    }

    fn vitals(&self, id: EntityId) -> Option<Vitals> {
        self.mobiles.get(&id).map(|m| m.vitals)
    }

    fn tile_name(&self, map: MapId, point: WorldPoint) -> Option<String> {
        let map = self.maps.get(&map).filter(|m| m.in_bounds(point))?;
        let name = map
            .tiles
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(point))
            .map_or(&map.default_tile, |(_, name)| name);
        Some(name.clone())
    }

    fn surface_z(&self, map: MapId, x: i32, y: i32) -> i32 {
        let Some(map) = self.maps.get(&map) else {
            return 0;
        };
        let point = WorldPoint::new(x, y, 0);
        map.elevations
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(point))
            .map_or(map.surface_z, |(_, z)| *z)
    }

    fn region_at(&self, map: MapId, point: WorldPoint) -> Option<RegionInfo> {
        let region = self.maps.get(&map)?.region_at(point)?;
        Some(RegionInfo {
            name: region.name.clone(),
            allows_spawn: region.allows_spawn,
            rift_enabled: region.rift_enabled,
        })
    }

    fn region_exists(&self, map: MapId, name: &str) -> bool {
        self.maps
            .get(&map)
            .is_some_and(|m| m.regions.iter().any(|r| r.name == name))
    }

    fn is_valid_water(&self, map: MapId, point: WorldPoint) -> bool {
        self.maps
            .get(&map)
            .is_some_and(|m| m.in_bounds(point) && m.is_water(point))
    }

    fn is_spawnable_land(&self, map: MapId, point: WorldPoint) -> bool {
        self.maps.get(&map).is_some_and(|m| {
            m.in_bounds(point)
                && !m.is_water(point)
                && !m.blocked.iter().any(|rect| rect.contains(point))
        })
    }

    fn weather_at(&self, map: MapId, _point: WorldPoint) -> WeatherKind {
        self.maps.get(&map).map_or(WeatherKind::Clear, |m| m.weather)
    }

    fn hour_at(&self, map: MapId, _point: WorldPoint) -> u8 {
        self.maps.get(&map).map_or(12, |m| m.hour)
    }
}

impl WorldRuntime for SimWorld {
    fn create_mobile(&mut self, type_name: &str) -> WorldResult<EntityId> {
        let template = self
            .templates
            .get(type_name)
            .ok_or_else(|| WorldError::UnknownCreature(type_name.to_string()))?;

        let id = EntityId::new();
        self.mobiles.insert(
            id,
            SimMobile {
                type_name: template.name.clone(),
                vendor: template.vendor,
                location: None,
                vitals: Vitals::full(template.hits, template.mana, template.stam),
                dormant: false,
            },
        );
        self.created += 1;
        Ok(id)
    }

    fn move_mobile(&mut self, id: EntityId, map: MapId, point: WorldPoint) -> WorldResult<()> {
        let in_bounds = self
            .maps
            .get(&map)
            .ok_or(WorldError::UnknownMap(map))?
            .in_bounds(point);
        if !in_bounds {
            return Err(WorldError::PlacementRejected {
                map,
                location: point,
                reason: "outside map bounds".to_string(),
            });
        }
        self.mobile_mut(id)?.location = Some((map, point));
        Ok(())
    }

    fn delete_mobile(&mut self, id: EntityId) {
        self.mobiles.remove(&id);
    }

    fn set_vitals(&mut self, id: EntityId, vitals: Vitals) -> WorldResult<()> {
        self.mobile_mut(id)?.vitals = vitals;
        Ok(())
    }

    fn set_dormant(&mut self, id: EntityId, dormant: bool) -> WorldResult<()> {
        self.mobile_mut(id)?.dormant = dormant;
        Ok(())
    }

    fn set_combatant(&mut self, id: EntityId, target: Option<PlayerId>) -> WorldResult<()> {
        self.mobile_mut(id)?.vitals.combatant = target;
        Ok(())
    }

    fn play_spawn_effect(&mut self, _id: EntityId) {
        self.effects_played += 1;
    }
}
