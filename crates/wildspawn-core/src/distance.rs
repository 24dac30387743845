//! Periodic distance sweep over the active set.

use tracing::trace;

use crate::active::ActiveSpawnTable;
use crate::world::WorldOracle;

/// Outcome of one distance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistanceReport {
    /// Records examined
    pub checked: usize,
    /// Records newly flagged too far
    pub flagged: usize,
    /// Records whose flag was cleared
    pub cleared: usize,
    /// Records whose entity has no location, left for cleanup
    pub unlocated: usize,
}

/// Flags active spawns that no player is near.
#[derive(Debug, Default)]
pub struct DistanceService {
    sweeps: u64,
}

impl DistanceService {
    /// Creates the service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweeps completed.
    #[must_use]
    pub const fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Recomputes the too-far flag of every record.
    ///
    /// The flag is not sticky: a player walking back clears it.
    pub fn run<W: WorldOracle + ?Sized>(
        &mut self,
        table: &mut ActiveSpawnTable,
        world: &W,
        far_range: i32,
    ) -> DistanceReport {
        let mut report = DistanceReport::default();

        for id in table.ids() {
            report.checked += 1;
            let Some((map, location)) = world.mobile_location(id) else {
                report.unlocated += 1;
                continue;
            };

            let too_far = world.players_near(map, location, far_range).is_empty();
            if table.set_too_far(id, too_far) {
                if too_far {
                    report.flagged += 1;
                } else {
                    report.cleared += 1;
                }
            }
        }

        self.sweeps += 1;
        trace!(
            "Distance sweep: {} checked, {} flagged, {} cleared",
            report.checked,
            report.flagged,
            report.cleared
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::ActiveSpawnRecord;
    use crate::sim::{CreatureTemplate, SimMap, SimWorld};
    use wildspawn_common::{MapId, PlayerId, WorldPoint};

    const MAP: MapId = MapId::new(0);

    #[test]
    fn test_flag_follows_player() {
        let mut world = SimWorld::new();
        world.add_map(MAP, SimMap::new(500, 500));
        world.register_creature(CreatureTemplate::new("Orc", 10, 0, 10));
        let player = PlayerId::new(1);
        world.add_player(player, MAP, WorldPoint::new(100, 100, 0));
        let orc = world
            .spawn_at("Orc", MAP, WorldPoint::new(110, 100, 0))
            .expect("placed");

        let mut table = ActiveSpawnTable::new();
        table
            .insert(ActiveSpawnRecord::new(orc, "Orc", MAP, player, 1))
            .expect("insert");
        let mut service = DistanceService::new();

        let report = service.run(&mut table, &world, 36);
        assert_eq!(report.flagged, 0);

        world.move_player(player, MAP, WorldPoint::new(300, 300, 0));
        let report = service.run(&mut table, &world, 36);
        assert_eq!(report.flagged, 1);
        assert!(table.get(orc).is_some_and(|r| r.too_far));

        world.move_player(player, MAP, WorldPoint::new(105, 100, 0));
        let report = service.run(&mut table, &world, 36);
        assert_eq!(report.cleared, 1);
        assert!(table.get(orc).is_some_and(|r| !r.too_far));
        assert_eq!(service.sweeps(), 3);
    }

    #[test]
    fn test_missing_entity_left_for_cleanup() {
        let mut world = SimWorld::new();
        world.add_map(MAP, SimMap::new(50, 50));
        let mut table = ActiveSpawnTable::new();
        let ghost = wildspawn_common::EntityId::from_raw(77);
        table
            .insert(ActiveSpawnRecord::new(ghost, "Orc", MAP, PlayerId::new(1), 1))
            .expect("insert");

        let report = DistanceService::new().run(&mut table, &world, 36);
        assert_eq!(report.unlocated, 1);
        assert!(table.contains(ghost));
    }
}
