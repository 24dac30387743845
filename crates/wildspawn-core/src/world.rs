//! Interfaces to the host world runtime.
//!
//! The scheduler never owns creatures. It asks the world to create, move,
//! hide and delete them, and reads terrain, region, weather and clock state
//! through [`WorldOracle`]. Selection only needs the oracle. Materialization,
//! recycling and cleanup need the mutating [`WorldRuntime`].

use serde::{Deserialize, Serialize};
use wildspawn_common::{Direction, EntityId, MapId, PlayerId, WorldPoint, WorldResult};

use crate::conditions::WeatherKind;

/// Combat ruleset of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapRuleset {
    /// Player-versus-player territory.
    #[default]
    Hostile,
    /// Protected territory.
    Safe,
}

/// Live state of a connected player, as the world reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player identity
    pub id: PlayerId,
    /// Current map
    pub map: MapId,
    /// Current location
    pub location: WorldPoint,
    /// Facing direction
    pub facing: Direction,
    /// Flagged lawless (criminal/murderer)
    pub lawless: bool,
}

/// Server region containing a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Region name
    pub name: String,
    /// Whether spawning is allowed inside
    pub allows_spawn: bool,
    /// Whether the rift feature is enabled
    pub rift_enabled: bool,
}

/// Filter for spatial mobile queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MobileFilter {
    /// Every placed mobile.
    Any,
    /// Everything except vendors.
    NonVendor,
}

/// AI control state of a mobile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiState {
    /// Waiting for a reason to act.
    #[default]
    Idle,
    /// Roaming.
    Wander,
    /// Fighting.
    Combat,
    /// Running away.
    Flee,
}

/// Health, mana, stamina and combat state of a mobile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health
    pub hits: i32,
    /// Maximum health
    pub hits_max: i32,
    /// Current mana
    pub mana: i32,
    /// Maximum mana
    pub mana_max: i32,
    /// Current stamina
    pub stam: i32,
    /// Maximum stamina
    pub stam_max: i32,
    /// Poisoned
    pub poisoned: bool,
    /// Current combat target
    pub combatant: Option<PlayerId>,
    /// Has aggressors or is aggressing someone
    pub aggressed: bool,
    /// AI control state
    pub ai: AiState,
}

impl Vitals {
    /// Fresh vitals at their maxima.
    #[must_use]
    pub const fn full(hits: i32, mana: i32, stam: i32) -> Self {
        Self {
            hits,
            hits_max: hits,
            mana,
            mana_max: mana,
            stam,
            stam_max: stam,
            poisoned: false,
            combatant: None,
            aggressed: false,
            ai: AiState::Idle,
        }
    }

    /// Resets to the state of a freshly created mobile.
    pub fn restore(&mut self) {
        self.hits = self.hits_max;
        self.mana = self.mana_max;
        self.stam = self.stam_max;
        self.poisoned = false;
        self.combatant = None;
        self.aggressed = false;
        self.ai = AiState::Idle;
    }

    /// True when vitals are at their maxima with no poison or combat state.
    #[must_use]
    pub fn is_restored(&self) -> bool {
        self.hits == self.hits_max
            && self.mana == self.mana_max
            && self.stam == self.stam_max
            && !self.poisoned
            && self.combatant.is_none()
            && !self.aggressed
            && self.ai == AiState::Idle
    }
}

/// Read-only queries against the world.
pub trait WorldOracle {
    /// Whether the map is part of the live map set.
    fn map_exists(&self, map: MapId) -> bool;

    /// Combat ruleset of the map.
    fn map_ruleset(&self, map: MapId) -> MapRuleset;

    /// Live state of a player, `None` if the world no longer knows them.
    fn player_state(&self, player: PlayerId) -> Option<PlayerState>;

    /// Players on `map` within `range` of `point`.
    fn players_near(&self, map: MapId, point: WorldPoint, range: i32) -> Vec<PlayerId>;

    /// Placed (non-dormant) mobiles on `map` within `range` of `point`.
    fn mobiles_near(
        &self,
        map: MapId,
        point: WorldPoint,
        range: i32,
        filter: MobileFilter,
    ) -> Vec<EntityId>;

    /// Map and location of a placed mobile.
    fn mobile_location(&self, id: EntityId) -> Option<(MapId, WorldPoint)>;

    /// Creature type name of a mobile.
    fn mobile_type(&self, id: EntityId) -> Option<String>;

    /// Whether the mobile exists and is not deleted.
    fn is_alive(&self, id: EntityId) -> bool;

    /// Current vitals of a mobile.
    fn vitals(&self, id: EntityId) -> Option<Vitals>;

    /// Terrain tile name at a point.
    fn tile_name(&self, map: MapId, point: WorldPoint) -> Option<String>;

    /// Surface elevation at x/y.
    fn surface_z(&self, map: MapId, x: i32, y: i32) -> i32;

    /// Server region containing a point.
    fn region_at(&self, map: MapId, point: WorldPoint) -> Option<RegionInfo>;

    /// Whether a server region with this name exists on the map.
    fn region_exists(&self, map: MapId, name: &str) -> bool;

    /// Whether the point is water a creature can spawn in.
    fn is_valid_water(&self, map: MapId, point: WorldPoint) -> bool;

    /// Whether the point is land a creature can spawn on.
    fn is_spawnable_land(&self, map: MapId, point: WorldPoint) -> bool;

    /// Current weather at a point.
    fn weather_at(&self, map: MapId, point: WorldPoint) -> WeatherKind;

    /// In-game clock hour (0-23) at a point.
    fn hour_at(&self, map: MapId, point: WorldPoint) -> u8;
}

/// Entity lifecycle operations.
pub trait WorldRuntime: WorldOracle {
    /// Creates a mobile of the named type, not yet placed.
    fn create_mobile(&mut self, type_name: &str) -> WorldResult<EntityId>;

    /// Places or moves a mobile.
    fn move_mobile(&mut self, id: EntityId, map: MapId, point: WorldPoint) -> WorldResult<()>;

    /// Deletes a mobile. Deleting an unknown id is a no-op.
    fn delete_mobile(&mut self, id: EntityId);

    /// Overwrites a mobile's vitals.
    fn set_vitals(&mut self, id: EntityId, vitals: Vitals) -> WorldResult<()>;

    /// Hides a mobile from the world (or brings it back).
    fn set_dormant(&mut self, id: EntityId, dormant: bool) -> WorldResult<()>;

    /// Sets or clears the mobile's combat target.
    fn set_combatant(&mut self, id: EntityId, target: Option<PlayerId>) -> WorldResult<()>;

    /// Plays the visual/sound effect announcing a spawn.
    fn play_spawn_effect(&mut self, id: EntityId);

    /// Hook run before the mobile is placed.
    fn before_place(&mut self, _id: EntityId, _map: MapId, _point: WorldPoint) -> WorldResult<()> {
        Ok(())
    }

    /// Hook run after the mobile is placed.
    fn after_place(&mut self, _id: EntityId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vitals_restore() {
        let mut vitals = Vitals::full(100, 50, 80);
        vitals.hits = 3;
        vitals.stam = 0;
        vitals.poisoned = true;
        vitals.combatant = Some(PlayerId::new(7));
        vitals.ai = AiState::Combat;
        assert!(!vitals.is_restored());

        vitals.restore();
        assert!(vitals.is_restored());
        assert_eq!(vitals.hits, 100);
    }
}
