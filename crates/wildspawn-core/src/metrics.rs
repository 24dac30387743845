//! Counters and timing samples for operators.
//!
//! Metrics observe the scheduler and never feed back into it.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupReport;
use crate::distance::DistanceReport;
use crate::selector::SelectionMiss;

/// Selection misses by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissCounts {
    /// Player vanished from the world
    pub player_unavailable: u64,
    /// Location budget ran out
    pub no_location: u64,
    /// No source covered the location
    pub no_source: u64,
    /// Every roll failed
    pub no_creature: u64,
}

impl MissCounts {
    /// Counts one miss.
    pub fn record(&mut self, miss: SelectionMiss) {
        match miss {
            SelectionMiss::PlayerUnavailable(_) => self.player_unavailable += 1,
            SelectionMiss::NoLocation => self.no_location += 1,
            SelectionMiss::NoSource => self.no_source += 1,
            SelectionMiss::NoCreature => self.no_creature += 1,
        }
    }

    /// Sum over every kind.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.player_unavailable + self.no_location + self.no_source + self.no_creature
    }
}

/// Point-in-time view of the engine, serializable for reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connected players
    pub players: usize,
    /// Creatures in the active set
    pub active_spawns: usize,
    /// Creatures in the recycle pool
    pub pooled: usize,
    /// Decisions currently queued
    pub queued: usize,
    /// Mean queue depth over the history window
    pub avg_queue_depth: f32,
    /// Peak queue depth over the history window
    pub max_queue_depth: usize,
    /// Mean spawn tick time in milliseconds
    pub avg_tick_ms: f32,
    /// Spawn ticks run
    pub spawn_ticks: u64,
    /// Creatures created fresh
    pub spawns_created: u64,
    /// Creatures taken from the pool
    pub spawns_reused: u64,
    /// Share of spawns served by the pool
    pub recycle_rate: f32,
    /// Creatures stored into the pool
    pub recycle_stored: u64,
    /// Creatures deleted because the pool was full
    pub recycle_rejected: u64,
    /// Decisions dropped by full queues
    pub queue_rejections: u64,
    /// Materializations that failed
    pub materialize_failures: u64,
    /// Selection misses
    pub misses: MissCounts,
    /// Distance sweeps run
    pub distance_sweeps: u64,
    /// Cleanup sweeps run
    pub cleanup_cycles: u64,
    /// Duration of the last cleanup in milliseconds
    pub last_cleanup_ms: f32,
}

/// Running counters plus a sliding window of tick samples.
#[derive(Debug)]
pub struct SpawnMetrics {
    queue_depths: VecDeque<usize>,
    tick_times: VecDeque<f32>,
    history_size: usize,
    spawn_ticks: u64,
    spawns_created: u64,
    spawns_reused: u64,
    recycle_stored: u64,
    recycle_rejected: u64,
    queue_rejections: u64,
    materialize_failures: u64,
    misses: MissCounts,
    distance_sweeps: u64,
    cleanup_cycles: u64,
    last_cleanup: Duration,
}

impl Default for SpawnMetrics {
    fn default() -> Self {
        Self::new(120)
    }
}

impl SpawnMetrics {
    /// Creates a collector keeping `history_size` tick samples.
    #[must_use]
    pub fn new(history_size: usize) -> Self {
        let history_size = history_size.max(1);
        Self {
            queue_depths: VecDeque::with_capacity(history_size),
            tick_times: VecDeque::with_capacity(history_size),
            history_size,
            spawn_ticks: 0,
            spawns_created: 0,
            spawns_reused: 0,
            recycle_stored: 0,
            recycle_rejected: 0,
            queue_rejections: 0,
            materialize_failures: 0,
            misses: MissCounts::default(),
            distance_sweeps: 0,
            cleanup_cycles: 0,
            last_cleanup: Duration::ZERO,
        }
    }

    /// Resizes the sample window, dropping the oldest samples.
    pub fn set_history_size(&mut self, history_size: usize) {
        self.history_size = history_size.max(1);
        while self.queue_depths.len() > self.history_size {
            self.queue_depths.pop_front();
        }
        while self.tick_times.len() > self.history_size {
            self.tick_times.pop_front();
        }
    }

    /// Records a finished spawn tick.
    pub fn record_spawn_tick(&mut self, queue_depth: usize, elapsed: Duration) {
        self.spawn_ticks += 1;
        self.queue_depths.push_back(queue_depth);
        if self.queue_depths.len() > self.history_size {
            self.queue_depths.pop_front();
        }
        self.tick_times.push_back(elapsed.as_secs_f32() * 1000.0);
        if self.tick_times.len() > self.history_size {
            self.tick_times.pop_front();
        }
    }

    /// Records a placed creature.
    pub fn record_spawn(&mut self, reused: bool) {
        if reused {
            self.spawns_reused += 1;
        } else {
            self.spawns_created += 1;
        }
    }

    /// Records a selection miss.
    pub fn record_miss(&mut self, miss: SelectionMiss) {
        self.misses.record(miss);
    }

    /// Records a decision rejected by a full queue.
    pub fn record_queue_rejection(&mut self) {
        self.queue_rejections += 1;
    }

    /// Records a failed materialization.
    pub fn record_failure(&mut self) {
        self.materialize_failures += 1;
    }

    /// Records a distance sweep.
    pub fn record_distance(&mut self, _report: &DistanceReport) {
        self.distance_sweeps += 1;
    }

    /// Records a cleanup sweep.
    pub fn record_cleanup(&mut self, report: &CleanupReport) {
        self.cleanup_cycles += 1;
        self.recycle_stored += report.recycled as u64;
        self.recycle_rejected += report.deleted as u64;
        self.last_cleanup = report.duration;
    }

    /// Selection misses so far.
    #[must_use]
    pub const fn misses(&self) -> MissCounts {
        self.misses
    }

    /// Mean queue depth over the window.
    #[must_use]
    pub fn avg_queue_depth(&self) -> f32 {
        if self.queue_depths.is_empty() {
            return 0.0;
        }
        self.queue_depths.iter().sum::<usize>() as f32 / self.queue_depths.len() as f32
    }

    /// Mean spawn tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f32 {
        if self.tick_times.is_empty() {
            return 0.0;
        }
        self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
    }

    /// Builds a snapshot, combining counters with live sizes.
    #[must_use]
    pub fn snapshot(
        &self,
        players: usize,
        active_spawns: usize,
        pooled: usize,
        queued: usize,
    ) -> MetricsSnapshot {
        let spawned = self.spawns_created + self.spawns_reused;
        let recycle_rate = if spawned == 0 {
            0.0
        } else {
            self.spawns_reused as f32 / spawned as f32
        };

        MetricsSnapshot {
            players,
            active_spawns,
            pooled,
            queued,
            avg_queue_depth: self.avg_queue_depth(),
            max_queue_depth: self.queue_depths.iter().copied().max().unwrap_or(0),
            avg_tick_ms: self.avg_tick_ms(),
            spawn_ticks: self.spawn_ticks,
            spawns_created: self.spawns_created,
            spawns_reused: self.spawns_reused,
            recycle_rate,
            recycle_stored: self.recycle_stored,
            recycle_rejected: self.recycle_rejected,
            queue_rejections: self.queue_rejections,
            materialize_failures: self.materialize_failures,
            misses: self.misses,
            distance_sweeps: self.distance_sweeps,
            cleanup_cycles: self.cleanup_cycles,
            last_cleanup_ms: self.last_cleanup.as_secs_f32() * 1000.0,
        }
    }
}
