//! Periodic reclamation of flagged and vanished spawns.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::active::{ActiveSpawnTable, ExternalCause};
use crate::recycle::RecyclePool;
use crate::world::WorldRuntime;

/// Outcome of one cleanup sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Records examined
    pub swept: usize,
    /// Records dropped because the entity was gone
    pub missing: usize,
    /// Flagged creatures moved into the pool
    pub recycled: usize,
    /// Flagged creatures deleted because the pool was full
    pub deleted: usize,
    /// Time spent
    pub duration: Duration,
}

/// Moves too-far creatures into the recycle pool, or deletes them.
#[derive(Debug, Default)]
pub struct CleanupService {
    cycles: u64,
    last_duration: Duration,
}

impl CleanupService {
    /// Creates the service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweeps completed.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Duration of the last sweep.
    #[must_use]
    pub const fn last_duration(&self) -> Duration {
        self.last_duration
    }

    /// Reclaims every flagged record and drops records whose entity vanished.
    ///
    /// Records removed since the id snapshot was taken are skipped.
    pub fn run<W: WorldRuntime + ?Sized>(
        &mut self,
        table: &mut ActiveSpawnTable,
        pool: &mut RecyclePool,
        world: &mut W,
    ) -> CleanupReport {
        let start = Instant::now();
        let mut report = CleanupReport::default();

        for id in table.ids() {
            let Some(record) = table.get(id) else {
                continue;
            };
            report.swept += 1;

            if !world.is_alive(id) {
                table.remove_external(id, ExternalCause::Missing);
                report.missing += 1;
                continue;
            }
            if !record.too_far {
                continue;
            }

            let type_name = record.type_name.clone();
            if pool.store(world, id, &type_name) {
                report.recycled += 1;
            } else {
                world.delete_mobile(id);
                report.deleted += 1;
            }
            table.remove_reclaimed(id);
        }

        report.duration = start.elapsed();
        self.cycles += 1;
        self.last_duration = report.duration;
        debug!(
            "Cleanup: {} swept, {} recycled, {} deleted, {} missing in {:?}",
            report.swept, report.recycled, report.deleted, report.missing, report.duration
        );
        report
    }
}
