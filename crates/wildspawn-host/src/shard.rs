//! One shard: a simulated map, its players and its spawn engine.

use std::path::Path;
use std::time::Duration;

use fastrand::Rng;
use serde::Serialize;
use tracing::{debug, info};
use wildspawn_common::{Direction, MapId, PlayerId, Rect, WorldPoint};
use wildspawn_core::{
    load_settings, load_spawn_data, CreatureTemplate, HourBucket, MetricsSnapshot, RecycleStats,
    SimMap, SimRegion, SimWorld, SpawnDataSet, SpawnEngine, SpawnProfile, SpawnRegion, SpawnTiers,
    SpawnTile, SpawnZone, TimeTrigger, UpdateReport, WeatherKind, WeatherTrigger, WorldEvent,
    WorldOracle, WorldRuntime,
};

use crate::config::HostConfig;

/// Creature types every shard knows: name, hits, mana, stamina.
const BESTIARY: [(&str, i32, i32, i32); 10] = [
    ("Rat", 8, 0, 20),
    ("Wolf", 30, 0, 60),
    ("Orc", 60, 10, 50),
    ("Orc Captain", 110, 20, 80),
    ("Zombie", 45, 0, 30),
    ("Bat", 12, 0, 40),
    ("Water Elemental", 140, 120, 90),
    ("Sea Serpent", 160, 40, 120),
    ("Daemon", 400, 300, 200),
    ("Frog", 6, 0, 15),
];

/// Per-shard report, serialized for operators.
#[derive(Debug, Clone, Serialize)]
pub struct ShardReport {
    /// Shard map
    pub map: u8,
    /// Engine metrics
    pub metrics: MetricsSnapshot,
    /// Recycle pool occupancy
    pub recycle: RecycleStats,
    /// Creatures the world currently holds
    pub world_mobiles: usize,
    /// Creatures the world has ever created
    pub world_created: u64,
}

/// A simulated map driven by one engine.
#[derive(Debug)]
pub struct Shard {
    map: MapId,
    world: SimWorld,
    engine: SpawnEngine,
    players: Vec<PlayerId>,
    rng: Rng,
    kill_chance: f64,
}

impl Shard {
    /// Builds the shard world, loads spawn data and connects its players.
    pub fn new(map: MapId, config: &HostConfig, seed: u64) -> Self {
        let world_map = build_map(config.map_size);
        let mut world = SimWorld::new();
        world.add_map(map, world_map);
        for (name, hits, mana, stam) in BESTIARY {
            world.register_creature(CreatureTemplate::new(name, hits, mana, stam));
        }

        let settings = load_settings(&config.settings_path);
        let data = load_data(&config.data_dir, &world, map, config.map_size);
        let mut engine = SpawnEngine::with_seed(settings, data, seed);
        let mut rng = Rng::with_seed(seed ^ 0x9e37_79b9_7f4a_7c15);

        let center = config.map_size / 2;
        let spread = config.map_size / 4;
        let players: Vec<PlayerId> = (0..config.players_per_shard)
            .map(|i| PlayerId::new(u32::from(map.raw()) * 10_000 + i + 1))
            .collect();
        for &player in &players {
            let at = WorldPoint::new(
                center + rng.i32(-spread..=spread),
                center + rng.i32(-spread..=spread),
                0,
            );
            world.add_player(player, map, at);
            if let Some(state) = world.player_mut(player) {
                state.facing = Direction::ALL[rng.usize(..Direction::ALL.len())];
                state.lawless = rng.f64() < 0.1;
            }
            engine.player_connected(player);
        }

        info!("{map}: {} players, {} spawn maps loaded", players.len(), engine.spawn_data().map_count());
        Self {
            map,
            world,
            engine,
            players,
            rng,
            kill_chance: config.kill_chance,
        }
    }

    /// Shard map.
    #[must_use]
    pub const fn map(&self) -> MapId {
        self.map
    }

    /// Spawn engine.
    #[must_use]
    pub fn engine(&self) -> &SpawnEngine {
        &self.engine
    }

    /// Walks players, occasionally kills a spawn, then updates the engine.
    pub fn step(&mut self, dt: Duration) -> UpdateReport {
        self.walk_players();
        self.hunt();
        self.engine.update(&mut self.world, dt)
    }

    fn walk_players(&mut self) {
        let size = self.world.map(self.map).map_or(0, |m| m.width);
        for &player in &self.players {
            let Some(state) = self.world.player_mut(player) else {
                continue;
            };
            if self.rng.f64() < 0.05 {
                state.facing = Direction::ALL[self.rng.usize(..Direction::ALL.len())];
            }
            let (dx, dy) = state.facing.delta();
            let next = state.location.offset(dx, dy);
            if (0..size).contains(&next.x) && (0..size).contains(&next.y) {
                state.location = next;
            } else {
                state.facing = Direction::ALL[self.rng.usize(..Direction::ALL.len())];
            }
        }
    }

    fn hunt(&mut self) {
        if self.players.is_empty() || self.rng.f64() >= self.kill_chance {
            return;
        }
        let hunter = self.players[self.rng.usize(..self.players.len())];
        let Some(state) = self.world.player_state(hunter) else {
            return;
        };
        let prey = self
            .world
            .mobiles_near(self.map, state.location, 12, wildspawn_core::MobileFilter::NonVendor)
            .first()
            .copied();
        if let Some(id) = prey {
            self.world.delete_mobile(id);
            self.engine.publish(WorldEvent::CreatureDied(id));
            debug!("{hunter} killed {id}");
        }
    }

    /// Current report.
    #[must_use]
    pub fn report(&self) -> ShardReport {
        ShardReport {
            map: self.map.raw(),
            metrics: self.engine.metrics_snapshot(),
            recycle: self.engine.recycle_stats(),
            world_mobiles: self.world.mobile_count(),
            world_created: self.world.created_count(),
        }
    }

    /// Flushes the engine before exit.
    pub fn shutdown(&mut self) -> usize {
        self.engine.shutdown(&mut self.world)
    }
}

/// Grassland with a lake, a rocky ridge, a town and a rift.
fn build_map(size: i32) -> SimMap {
    let mut map = SimMap::new(size, size);
    let q = size / 4;

    map.water.push(Rect::new(0, 0, q - 1, size - 1));
    map.tiles.push((Rect::new(3 * q, 0, size - 1, q), "rock".to_string()));
    map.elevations.push((Rect::new(3 * q, 0, size - 1, q), 15));
    map.blocked.push(Rect::new(2 * q - 4, 2 * q - 4, 2 * q + 4, 2 * q + 4));

    let mut town = SimRegion::new("Town", Rect::new(2 * q - 20, 2 * q - 20, 2 * q + 20, 2 * q + 20));
    town.allows_spawn = false;
    let mut rift = SimRegion::new("Rift", Rect::new(3 * q, 3 * q, size - 1, size - 1));
    rift.rift_enabled = true;
    map.regions.push(SimRegion::new("Wilds", Rect::new(0, 0, size - 1, size - 1)));
    map.regions.push(rift);
    map.regions.push(town);

    map.weather = WeatherKind::Rain;
    map.hour = 18;
    map
}

fn load_data(dir: &Path, world: &SimWorld, map: MapId, size: i32) -> SpawnDataSet {
    let (data, report) = load_spawn_data(dir, world);
    if report.files_loaded > 0 {
        return data;
    }
    info!("No spawn data for {map} in {}, using built-in tables", dir.display());
    demo_data(map, size)
}

/// Built-in tables matching [`build_map`].
fn demo_data(map: MapId, size: i32) -> SpawnDataSet {
    let q = size / 4;
    let mut data = SpawnDataSet::new();

    let mut wilds = SpawnTiers::common(["Rat", "Wolf"]);
    wilds.uncommon = vec!["Orc".to_string()];
    wilds.rare = vec!["Daemon".to_string()];
    wilds.water = vec!["Sea Serpent".to_string()];
    wilds.weather = vec!["Frog".to_string()];
    wilds.timed = vec!["Zombie".to_string()];
    data.add_region(
        map,
        SpawnRegion {
            region_name: "Wilds".to_string(),
            profile: SpawnProfile {
                weather: WeatherTrigger::Rain,
                time: TimeTrigger::During(HourBucket::Dusk),
                tiers: wilds,
            },
        },
    );

    let mut storm = SpawnTiers::common(["Wolf"]);
    storm.weather = vec!["Water Elemental".to_string()];
    storm.rare = vec!["Daemon".to_string()];
    data.add_region(
        map,
        SpawnRegion {
            region_name: "Rift".to_string(),
            profile: SpawnProfile {
                weather: WeatherTrigger::AnyPrecipitation,
                time: TimeTrigger::None,
                tiers: storm,
            },
        },
    );

    let mut camp = SpawnTiers::common(["Orc"]);
    camp.uncommon = vec!["Orc Captain".to_string()];
    data.add_zone(
        map,
        SpawnZone {
            name: "orc camp".to_string(),
            bounds: Rect::new(q, 3 * q, 2 * q, size - 1),
            priority: 10,
            profile: SpawnProfile::new(camp),
        },
    );

    data.add_tile(
        map,
        SpawnTile {
            tile_name: "cave".to_string(),
            profile: SpawnProfile::new(SpawnTiers::common(["Bat"])),
        },
    );
    data
}
