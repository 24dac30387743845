//! The spawn engine: scheduler, drain and periodic sweeps.
//!
//! [`SpawnEngine`] owns every piece of mutable scheduling state. The owner
//! calls [`SpawnEngine::update`] from its own thread with the world and the
//! elapsed time. Notifications posted from other threads through
//! [`SpawnEngine::event_sender`] are applied at the start of each update.

use std::path::Path;
use std::time::{Duration, Instant};

use fastrand::Rng;
use tracing::{debug, error, info, warn};
use wildspawn_common::{EntityId, PlayerId, WorldError};

use crate::active::{ActiveSpawnRecord, ActiveSpawnTable, ExternalCause};
use crate::cleanup::{CleanupReport, CleanupService};
use crate::distance::{DistanceReport, DistanceService};
use crate::error::{SpawnError, SpawnResult};
use crate::events::{EventBus, EventSender, WorldEvent};
use crate::metrics::{MetricsSnapshot, SpawnMetrics};
use crate::persist::{self, LoadReport};
use crate::queue::{PlayerRoster, SpawnDecision};
use crate::recycle::{RecyclePool, RecycleStats};
use crate::selector::{CandidateSelector, SelectionMiss};
use crate::settings::{SettingsStore, SpawnSettings};
use crate::sources::SpawnDataSet;
use crate::timer::IntervalTimer;
use crate::world::{MapRuleset, MobileFilter, WorldRuntime};

/// Outcome of one spawn tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number
    pub tick: u64,
    /// Players visited
    pub visited: usize,
    /// Decisions enqueued
    pub produced: usize,
    /// Decisions popped for materialization
    pub drained: usize,
    /// Creatures placed
    pub placed: usize,
    /// Of those, taken from the recycle pool
    pub reused: usize,
    /// Players skipped because production is paused
    pub skipped_paused: usize,
    /// Players skipped because their queue is full
    pub skipped_backlog: usize,
    /// Players skipped because enough spawns are already around them
    pub skipped_mob_cap: usize,
    /// Selection passes that found nothing
    pub misses: usize,
    /// Materializations that failed
    pub failures: usize,
}

/// What ran during one [`SpawnEngine::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Notifications applied
    pub events: usize,
    /// Spawn tick, if it fired
    pub spawn: Option<TickReport>,
    /// Distance sweep, if it fired
    pub distance: Option<DistanceReport>,
    /// Cleanup sweep, if it fired
    pub cleanup: Option<CleanupReport>,
}

/// Per-player spawn scheduler.
#[derive(Debug)]
pub struct SpawnEngine {
    settings: SettingsStore,
    data: SpawnDataSet,
    roster: PlayerRoster,
    active: ActiveSpawnTable,
    pool: RecyclePool,
    distance: DistanceService,
    cleanup: CleanupService,
    metrics: SpawnMetrics,
    events: EventBus,
    rng: Rng,
    spawn_timer: IntervalTimer,
    distance_timer: IntervalTimer,
    cleanup_timer: IntervalTimer,
    paused: bool,
    saving: bool,
    shut_down: bool,
    tick: u64,
}

impl SpawnEngine {
    /// Creates an engine with an entropy-seeded random source.
    #[must_use]
    pub fn new(settings: SpawnSettings, data: SpawnDataSet) -> Self {
        Self::with_rng(settings, data, Rng::new())
    }

    /// Creates an engine with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(settings: SpawnSettings, data: SpawnDataSet, seed: u64) -> Self {
        Self::with_rng(settings, data, Rng::with_seed(seed))
    }

    fn with_rng(settings: SpawnSettings, data: SpawnDataSet, rng: Rng) -> Self {
        let settings = SettingsStore::new(settings);
        let s = settings.settings();
        let pool = RecyclePool::new(s.global_recycle_cap, s.per_type_recycle_cap);
        let metrics = SpawnMetrics::new(s.metrics_history);
        let spawn_timer = IntervalTimer::from_millis(s.spawn_interval_ms);
        let distance_timer = IntervalTimer::from_millis(s.distance_interval_ms);
        let cleanup_timer = IntervalTimer::from_millis(s.cleanup_interval_ms);

        Self {
            settings,
            data,
            roster: PlayerRoster::new(),
            active: ActiveSpawnTable::new(),
            pool,
            distance: DistanceService::new(),
            cleanup: CleanupService::new(),
            metrics,
            events: EventBus::default(),
            rng,
            spawn_timer,
            distance_timer,
            cleanup_timer,
            paused: false,
            saving: false,
            shut_down: false,
            tick: 0,
        }
    }

    /// Handle for posting notifications from other threads.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.events.sender()
    }

    /// Posts a notification to be applied on the next update.
    pub fn publish(&self, event: WorldEvent) -> bool {
        self.events.publish(event)
    }

    /// Applies pending notifications, then runs whichever jobs are due.
    pub fn update<W: WorldRuntime + ?Sized>(&mut self, world: &mut W, dt: Duration) -> UpdateReport {
        let mut report = UpdateReport {
            events: self.pump_events(world),
            ..Default::default()
        };
        if self.shut_down {
            return report;
        }

        if self.spawn_timer.advance(dt) {
            report.spawn = Some(self.run_spawn_tick(world));
        }
        if self.distance_timer.advance(dt) {
            report.distance = Some(self.run_distance_sweep(world));
        }
        if self.cleanup_timer.advance(dt) {
            report.cleanup = Some(self.run_cleanup(world));
        }
        report
    }

    /// Applies every pending notification in arrival order.
    pub fn pump_events<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> usize {
        let events = self.events.drain();
        let count = events.len();
        for event in events {
            self.handle_event(world, event);
        }
        count
    }

    /// Applies one notification.
    pub fn handle_event<W: WorldRuntime + ?Sized>(&mut self, world: &mut W, event: WorldEvent) {
        match event {
            WorldEvent::PlayerConnected(player) => {
                self.player_connected(player);
            },
            WorldEvent::PlayerDisconnected(player) => {
                self.player_disconnected(player);
            },
            WorldEvent::CreatureDied(id) => self.on_creature_removed(id, ExternalCause::Died),
            WorldEvent::CreatureDeleted(id) => self.on_creature_removed(id, ExternalCause::Deleted),
            WorldEvent::CreatureTamed(id) => self.on_creature_removed(id, ExternalCause::Tamed),
            WorldEvent::WorldSaveBegin => self.begin_world_save(),
            WorldEvent::WorldSaveEnd => self.end_world_save(),
            WorldEvent::Shutdown => {
                self.shutdown(world);
            },
        }
    }

    /// Registers a player. Returns false if already registered.
    pub fn player_connected(&mut self, player: PlayerId) -> bool {
        let capacity = self.settings.settings().max_queue_size;
        let added = self.roster.connect(player, capacity);
        if added {
            debug!("{player} joined the spawn roster");
        }
        added
    }

    /// Unregisters a player, dropping its pending decisions. Returns how many were dropped.
    pub fn player_disconnected(&mut self, player: PlayerId) -> usize {
        match self.roster.disconnect(player) {
            Some(mut context) => {
                let dropped = context.queue_mut().clear();
                debug!("{player} left the spawn roster, {dropped} queued spawns dropped");
                dropped
            },
            None => 0,
        }
    }

    /// Forgets a creature that died, was deleted or was tamed.
    pub fn on_creature_removed(&mut self, id: EntityId, cause: ExternalCause) {
        if self.active.remove_external(id, cause).is_none() && self.pool.forget(id) {
            debug!("Pooled creature {id} removed externally ({cause:?})");
        }
    }

    /// Suspends every timer for the duration of a world save.
    pub fn begin_world_save(&mut self) {
        self.saving = true;
        self.spawn_timer.suspend();
        self.distance_timer.suspend();
        self.cleanup_timer.suspend();
        debug!("Spawn timers suspended for world save");
    }

    /// Resumes the timers after a world save.
    pub fn end_world_save(&mut self) {
        self.saving = false;
        if self.shut_down {
            return;
        }
        self.spawn_timer.resume();
        self.distance_timer.resume();
        self.cleanup_timer.resume();
        debug!("Spawn timers resumed after world save");
    }

    /// Whether a world save is in progress.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    /// Stops producing new decisions. Queued decisions still drain.
    pub fn pause(&mut self) {
        if !self.paused {
            info!("Spawn production paused");
        }
        self.paused = true;
    }

    /// Resumes production.
    pub fn resume(&mut self) {
        if self.paused {
            info!("Spawn production resumed");
        }
        self.paused = false;
    }

    /// Whether production is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether [`SpawnEngine::shutdown`] has run.
    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Runs one spawn tick: production for a batch of players, then the drain.
    pub fn run_spawn_tick<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> TickReport {
        let start = Instant::now();
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..Default::default()
        };

        let batch_size = self.settings.settings().batch_size;
        let batch = self.roster.next_batch(batch_size, self.tick);
        report.visited = batch.len();

        for &player in &batch {
            self.produce(world, player, &mut report);
        }

        for &player in &batch {
            let Some(decision) = self.roster.pop(player) else {
                continue;
            };
            report.drained += 1;
            match self.materialize(world, player, &decision) {
                Ok(reused) => {
                    report.placed += 1;
                    if reused {
                        report.reused += 1;
                    }
                },
                Err(e) => {
                    error!("{e}");
                    report.failures += 1;
                    self.metrics.record_failure();
                },
            }
        }

        self.metrics
            .record_spawn_tick(self.roster.total_queued(), start.elapsed());
        if report.produced + report.drained > 0 {
            debug!(
                "Spawn tick {}: {} visited, {} queued, {} placed ({} reused), {} misses",
                report.tick, report.visited, report.produced, report.placed, report.reused, report.misses
            );
        }
        report
    }

    fn produce<W: WorldRuntime + ?Sized>(
        &mut self,
        world: &mut W,
        player: PlayerId,
        report: &mut TickReport,
    ) {
        if self.paused {
            report.skipped_paused += 1;
            return;
        }

        let queued = self.roster.get(player).map_or(0, |c| c.queue().len());
        if queued >= self.settings.settings().max_queue_size {
            report.skipped_backlog += 1;
            return;
        }

        let Some(state) = world.player_state(player) else {
            self.record_miss(SelectionMiss::PlayerUnavailable(player), report);
            return;
        };

        if self.settings.settings().dynamic_scaling {
            let range = self.settings.settings().max_range;
            let others = world
                .players_near(state.map, state.location, range)
                .into_iter()
                .filter(|other| *other != player)
                .count();
            self.settings.update_scale(others);
        } else {
            self.settings.reset_scale();
        }

        let nearby = world.mobiles_near(
            state.map,
            state.location,
            self.settings.mob_count_range(),
            MobileFilter::Any,
        );
        if self.active.count_among(&nearby) >= self.settings.effective_max_mobs() as usize {
            report.skipped_mob_cap += 1;
            return;
        }

        let selector = CandidateSelector::new(&self.data, &self.settings);
        match selector.select_spawn(&*world, &mut self.rng, &state) {
            Ok(decision) => match self.roster.enqueue(player, decision) {
                Ok(()) => report.produced += 1,
                Err(e) => {
                    debug!("{e}");
                    self.metrics.record_queue_rejection();
                },
            },
            Err(miss) => self.record_miss(miss, report),
        }
    }

    fn record_miss(&mut self, miss: SelectionMiss, report: &mut TickReport) {
        debug!("Spawn selection miss: {miss}");
        report.misses += 1;
        self.metrics.record_miss(miss);
    }

    /// Places a decision's creature. Returns whether it came from the pool.
    fn materialize<W: WorldRuntime + ?Sized>(
        &mut self,
        world: &mut W,
        player: PlayerId,
        decision: &SpawnDecision,
    ) -> SpawnResult<bool> {
        let failed = |source: WorldError| SpawnError::Materialize {
            type_name: decision.type_name.clone(),
            map: decision.map,
            location: decision.location,
            source,
        };

        let (id, reused) = match self.pool.try_reuse(world, &decision.type_name) {
            Some(id) => (id, true),
            None => (world.create_mobile(&decision.type_name).map_err(failed)?, false),
        };

        // Claim the entity before placing it. A claim fails only for an id
        // already tracked, whose creature stays with its record.
        let record =
            ActiveSpawnRecord::new(id, decision.type_name.clone(), decision.map, player, self.tick);
        self.active.insert(record)?;

        let placed = world
            .before_place(id, decision.map, decision.location)
            .and_then(|()| world.move_mobile(id, decision.map, decision.location));
        if let Err(source) = placed {
            self.active.remove_reclaimed(id);
            world.delete_mobile(id);
            return Err(failed(source));
        }
        world.after_place(id);
        world.play_spawn_effect(id);

        let lawless = world.player_state(player).is_some_and(|p| p.lawless);
        let engage = match world.map_ruleset(decision.map) {
            MapRuleset::Hostile => !lawless,
            MapRuleset::Safe => lawless,
        };
        if engage {
            if let Err(e) = world.set_combatant(id, Some(player)) {
                warn!("Could not set combat target of {id}: {e}");
            }
        }

        self.metrics.record_spawn(reused);
        Ok(reused)
    }

    /// Runs the distance sweep now.
    pub fn run_distance_sweep<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> DistanceReport {
        let far_range = self.settings.far_range();
        let report = self.distance.run(&mut self.active, &*world, far_range);
        self.metrics.record_distance(&report);
        report
    }

    /// Runs the cleanup sweep now.
    pub fn run_cleanup<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> CleanupReport {
        let report = self.cleanup.run(&mut self.active, &mut self.pool, world);
        self.metrics.record_cleanup(&report);
        report
    }

    /// Refreshes distance flags and reclaims synchronously.
    pub fn force_cleanup<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> CleanupReport {
        self.run_distance_sweep(world);
        self.run_cleanup(world)
    }

    /// Deletes every active and pooled creature and drops every queued decision.
    ///
    /// Returns the number of creatures deleted.
    pub fn clear_all_spawns<W: WorldRuntime + ?Sized>(&mut self, world: &mut W, reason: &str) -> usize {
        let records = self.active.drain_all();
        for record in &records {
            world.delete_mobile(record.entity);
        }
        let pooled = self.pool.clear_all(world);
        let dropped = self.roster.clear_queues();

        let cleared = records.len() + pooled;
        info!(
            "Cleared {cleared} spawns ({} active, {pooled} pooled, {dropped} queued dropped): {reason}",
            records.len()
        );
        cleared
    }

    /// Flushes everything before the server stops. Later updates only drain the mailbox.
    pub fn shutdown<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> usize {
        if self.shut_down {
            return 0;
        }
        self.force_cleanup(world);
        let cleared = self.clear_all_spawns(world, "shutdown");
        self.spawn_timer.suspend();
        self.distance_timer.suspend();
        self.cleanup_timer.suspend();
        self.shut_down = true;
        info!("Spawn engine shut down");
        cleared
    }

    /// Reloads settings and spawn data from disk.
    ///
    /// A missing settings file means defaults. An unreadable one fails the
    /// reload and leaves the live settings and data untouched.
    pub fn reload_spawn_data<W: WorldRuntime + ?Sized>(
        &mut self,
        world: &mut W,
        dir: &Path,
        settings_path: &Path,
    ) -> SpawnResult<LoadReport> {
        let settings = if settings_path.exists() {
            let mut settings = persist::read_settings_file(settings_path)?;
            settings.validate();
            settings
        } else {
            warn!(
                "Spawn settings {} not found, reloading with defaults",
                settings_path.display()
            );
            SpawnSettings::default()
        };

        self.replace_settings(world, settings);
        let (data, report) = persist::load_spawn_data(dir, &*world);
        self.data = data;
        info!(
            "Spawn data reloaded: {} files, {} zones, {} regions, {} tiles",
            report.files_loaded, report.zones, report.regions, report.tiles
        );
        Ok(report)
    }

    /// Applies new settings: caps, queue sizes, intervals and history.
    pub fn replace_settings<W: WorldRuntime + ?Sized>(&mut self, world: &mut W, settings: SpawnSettings) {
        self.settings.replace(settings);
        let s = self.settings.settings();

        let evicted = self
            .pool
            .apply_caps(world, s.global_recycle_cap, s.per_type_recycle_cap);
        if evicted > 0 {
            info!("Recycle caps lowered, {evicted} pooled creatures deleted");
        }
        self.roster.set_queue_capacity(s.max_queue_size);
        self.spawn_timer
            .set_interval(Duration::from_millis(s.spawn_interval_ms));
        self.distance_timer
            .set_interval(Duration::from_millis(s.distance_interval_ms));
        self.cleanup_timer
            .set_interval(Duration::from_millis(s.cleanup_interval_ms));
        self.metrics.set_history_size(s.metrics_history);
    }

    /// Queues a decision directly for a player.
    pub fn enqueue_decision(&mut self, player: PlayerId, decision: SpawnDecision) -> SpawnResult<()> {
        self.roster.enqueue(player, decision)
    }

    /// Live settings.
    #[must_use]
    pub fn settings(&self) -> &SpawnSettings {
        self.settings.settings()
    }

    /// Scale modifier from the last production pass.
    #[must_use]
    pub fn scale_modifier(&self) -> f64 {
        self.settings.scale_modifier()
    }

    /// Loaded spawn data.
    #[must_use]
    pub fn spawn_data(&self) -> &SpawnDataSet {
        &self.data
    }

    /// Number of creatures in the active set.
    #[must_use]
    pub fn active_spawn_count(&self) -> usize {
        self.active.len()
    }

    /// Active record of a creature.
    #[must_use]
    pub fn active_spawn(&self, id: EntityId) -> Option<&ActiveSpawnRecord> {
        self.active.get(id)
    }

    /// Number of creatures in the recycle pool.
    #[must_use]
    pub fn recycle_pool_count(&self) -> usize {
        self.pool.len()
    }

    /// Recycle pool occupancy.
    #[must_use]
    pub fn recycle_stats(&self) -> RecycleStats {
        self.pool.stats()
    }

    /// Number of players in the roster.
    #[must_use]
    pub fn active_player_count(&self) -> usize {
        self.roster.len()
    }

    /// Pending decisions of a player.
    #[must_use]
    pub fn queue_len(&self, player: PlayerId) -> Option<usize> {
        self.roster.get(player).map(|c| c.queue().len())
    }

    /// Spawn ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current metrics.
    #[must_use]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(
            self.roster.len(),
            self.active.len(),
            self.pool.len(),
            self.roster.total_queued(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::WeatherKind;
    use crate::sim::{CreatureTemplate, SimMap, SimWorld};
    use crate::sources::{SpawnProfile, SpawnTiers, SpawnZone};
    use crate::world::{PlayerState, RegionInfo, Vitals, WorldOracle};
    use wildspawn_common::{MapId, Rect, WorldPoint, WorldResult};

    const MAP: MapId = MapId::new(0);
    const HOME: WorldPoint = WorldPoint::new(100, 100, 0);

    fn orc_world() -> SimWorld {
        let mut world = SimWorld::new();
        world.add_map(MAP, SimMap::new(200, 200));
        world.register_creature(CreatureTemplate::new("Orc", 50, 0, 50));
        world
    }

    fn orc_data() -> SpawnDataSet {
        let mut data = SpawnDataSet::new();
        data.add_zone(
            MAP,
            SpawnZone {
                name: "everywhere".to_string(),
                bounds: Rect::new(0, 0, 199, 199),
                priority: 0,
                profile: SpawnProfile::new(SpawnTiers::common(["Orc"])),
            },
        );
        data
    }

    fn settings() -> SpawnSettings {
        let mut settings = SpawnSettings::default();
        settings.chances.common = 1.0;
        settings
    }

    #[test]
    fn test_tick_places_creature() {
        let mut world = orc_world();
        let player = PlayerId::new(1);
        world.add_player(player, MAP, HOME);
        let mut engine = SpawnEngine::with_seed(settings(), orc_data(), 7);
        engine.player_connected(player);

        let report = engine.run_spawn_tick(&mut world);

        assert_eq!(report.visited, 1);
        assert_eq!(report.produced, 1);
        assert_eq!(report.placed, 1);
        assert_eq!(engine.active_spawn_count(), 1);
        assert_eq!(engine.queue_len(player), Some(0));
        assert_eq!(world.effects_played(), 1);
    }

    #[test]
    fn test_failed_placement_is_dropped() {
        let mut world = orc_world();
        let player = PlayerId::new(1);
        world.add_player(player, MAP, HOME);
        let mut engine = SpawnEngine::with_seed(settings(), SpawnDataSet::new(), 7);
        engine.player_connected(player);
        engine
            .enqueue_decision(player, SpawnDecision::new("Orc", MAP, WorldPoint::new(999, 5, 0)))
            .expect("room");

        let report = engine.run_spawn_tick(&mut world);

        assert_eq!(report.failures, 1);
        assert_eq!(engine.active_spawn_count(), 0);
        assert_eq!(world.mobile_count(), 0);
        assert_eq!(engine.queue_len(player), Some(0));
    }

    /// Delegates to a [`SimWorld`], optionally handing out one fixed id on creation.
    struct RepeatingIdWorld {
        inner: SimWorld,
        repeat: Option<EntityId>,
    }

    impl WorldOracle for RepeatingIdWorld {
        fn map_exists(&self, map: MapId) -> bool {
            self.inner.map_exists(map)
        }
        fn map_ruleset(&self, map: MapId) -> MapRuleset {
            self.inner.map_ruleset(map)
        }
        fn player_state(&self, player: PlayerId) -> Option<PlayerState> {
            self.inner.player_state(player)
        }
        fn players_near(&self, map: MapId, point: WorldPoint, range: i32) -> Vec<PlayerId> {
            self.inner.players_near(map, point, range)
        }
        fn mobiles_near(
            &self,
            map: MapId,
            point: WorldPoint,
            range: i32,
            filter: MobileFilter,
        ) -> Vec<EntityId> {
            self.inner.mobiles_near(map, point, range, filter)
        }
        fn mobile_location(&self, id: EntityId) -> Option<(MapId, WorldPoint)> {
            self.inner.mobile_location(id)
        }
        fn mobile_type(&self, id: EntityId) -> Option<String> {
            self.inner.mobile_type(id)
        }
        fn is_alive(&self, id: EntityId) -> bool {
            self.inner.is_alive(id)
        }
        fn vitals(&self, id: EntityId) -> Option<Vitals> {
            self.inner.vitals(id)
        }
        fn tile_name(&self, map: MapId, point: WorldPoint) -> Option<String> {
            self.inner.tile_name(map, point)
        }
        fn surface_z(&self, map: MapId, x: i32, y: i32) -> i32 {
            self.inner.surface_z(map, x, y)
        }
        fn region_at(&self, map: MapId, point: WorldPoint) -> Option<RegionInfo> {
            self.inner.region_at(map, point)
        }
        fn region_exists(&self, map: MapId, name: &str) -> bool {
            self.inner.region_exists(map, name)
        }
        fn is_valid_water(&self, map: MapId, point: WorldPoint) -> bool {
            self.inner.is_valid_water(map, point)
        }
        fn is_spawnable_land(&self, map: MapId, point: WorldPoint) -> bool {
            self.inner.is_spawnable_land(map, point)
        }
        fn weather_at(&self, map: MapId, point: WorldPoint) -> WeatherKind {
            self.inner.weather_at(map, point)
        }
        fn hour_at(&self, map: MapId, point: WorldPoint) -> u8 {
            self.inner.hour_at(map, point)
        }
    }

    impl WorldRuntime for RepeatingIdWorld {
        fn create_mobile(&mut self, type_name: &str) -> WorldResult<EntityId> {
            match self.repeat {
                Some(id) => Ok(id),
                None => self.inner.create_mobile(type_name),
            }
        }
        fn move_mobile(&mut self, id: EntityId, map: MapId, point: WorldPoint) -> WorldResult<()> {
            self.inner.move_mobile(id, map, point)
        }
        fn delete_mobile(&mut self, id: EntityId) {
            self.inner.delete_mobile(id);
        }
        fn set_vitals(&mut self, id: EntityId, vitals: Vitals) -> WorldResult<()> {
            self.inner.set_vitals(id, vitals)
        }
        fn set_dormant(&mut self, id: EntityId, dormant: bool) -> WorldResult<()> {
            self.inner.set_dormant(id, dormant)
        }
        fn set_combatant(&mut self, id: EntityId, target: Option<PlayerId>) -> WorldResult<()> {
            self.inner.set_combatant(id, target)
        }
        fn play_spawn_effect(&mut self, id: EntityId) {
            self.inner.play_spawn_effect(id);
        }
    }

    #[test]
    fn test_duplicate_entity_is_neither_moved_nor_orphaned() {
        let mut world = RepeatingIdWorld {
            inner: orc_world(),
            repeat: None,
        };
        let player = PlayerId::new(1);
        world.inner.add_player(player, MAP, HOME);
        let mut engine = SpawnEngine::with_seed(settings(), SpawnDataSet::new(), 5);
        engine.player_connected(player);
        engine
            .enqueue_decision(player, SpawnDecision::new("Orc", MAP, HOME.offset(12, 0)))
            .expect("room");
        assert_eq!(engine.run_spawn_tick(&mut world).placed, 1);
        let id = world
            .mobiles_near(MAP, HOME, 20, MobileFilter::Any)
            .first()
            .copied()
            .expect("placed");

        world.repeat = Some(id);
        engine
            .enqueue_decision(player, SpawnDecision::new("Orc", MAP, HOME.offset(-12, 0)))
            .expect("room");
        let report = engine.run_spawn_tick(&mut world);

        assert_eq!(report.failures, 1);
        assert_eq!(report.placed, 0);
        assert!(engine.active_spawn(id).is_some());
        assert_eq!(engine.active_spawn_count(), 1);
        assert_eq!(world.inner.mobile_count(), 1);
        assert_eq!(world.mobile_location(id), Some((MAP, HOME.offset(12, 0))));
    }

    #[test]
    fn test_combatant_rule() {
        for (ruleset, lawless, expect_target) in [
            (MapRuleset::Hostile, false, true),
            (MapRuleset::Hostile, true, false),
            (MapRuleset::Safe, false, false),
            (MapRuleset::Safe, true, true),
        ] {
            let mut world = orc_world();
            if let Some(map) = world.map_mut(MAP) {
                map.ruleset = ruleset;
            }
            let player = PlayerId::new(1);
            world.add_player(player, MAP, HOME);
            if let Some(state) = world.player_mut(player) {
                state.lawless = lawless;
            }
            let mut engine = SpawnEngine::with_seed(settings(), SpawnDataSet::new(), 1);
            engine.player_connected(player);
            engine
                .enqueue_decision(player, SpawnDecision::new("Orc", MAP, HOME.offset(15, 0)))
                .expect("room");
            engine.pause();

            engine.run_spawn_tick(&mut world);

            let id = world
                .mobiles_near(MAP, HOME, 20, MobileFilter::Any)
                .first()
                .copied()
                .expect("placed");
            assert_eq!(
                world.combatant(id).is_some(),
                expect_target,
                "{ruleset:?} lawless={lawless}"
            );
        }
    }

    #[test]
    fn test_external_removal_events() {
        let mut world = orc_world();
        let player = PlayerId::new(1);
        world.add_player(player, MAP, HOME);
        let mut engine = SpawnEngine::with_seed(settings(), orc_data(), 3);
        engine.publish(WorldEvent::PlayerConnected(player));
        engine.pump_events(&mut world);
        engine.run_spawn_tick(&mut world);

        let id = world
            .mobiles_near(MAP, HOME, 100, MobileFilter::Any)
            .first()
            .copied()
            .expect("placed");
        world.delete_mobile(id);
        engine.publish(WorldEvent::CreatureTamed(id));
        let report = engine.update(&mut world, Duration::ZERO);

        assert_eq!(report.events, 1);
        assert!(engine.active_spawn(id).is_none());
    }

    #[test]
    fn test_update_runs_jobs_on_their_intervals() {
        let mut world = orc_world();
        let mut engine = SpawnEngine::with_seed(settings(), orc_data(), 3);

        let mut spawn_ticks = 0;
        let mut distance_sweeps = 0;
        let mut cleanups = 0;
        for _ in 0..100 {
            let report = engine.update(&mut world, Duration::from_millis(100));
            spawn_ticks += usize::from(report.spawn.is_some());
            distance_sweeps += usize::from(report.distance.is_some());
            cleanups += usize::from(report.cleanup.is_some());
        }

        // 10 seconds of updates
        assert_eq!(spawn_ticks, 40);
        assert_eq!(distance_sweeps, 10);
        assert_eq!(cleanups, 1);
    }
}
