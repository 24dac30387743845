//! Host lifecycle: shard threads, world saves, reports and shutdown.
//!
//! Each shard runs on its own thread behind a `parking_lot::Mutex`. The main
//! thread never touches engine state directly while the host runs: it posts
//! world-save notifications through each engine's mailbox and only locks a
//! shard to read a report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use tracing::{error, info, warn};
use wildspawn_common::MapId;
use wildspawn_core::{EventSender, WorldEvent};

use crate::config::HostConfig;
use crate::shard::{Shard, ShardReport};

/// All shards plus their mailboxes.
pub struct Host {
    config: HostConfig,
    shards: Vec<Arc<Mutex<Shard>>>,
    mailboxes: Vec<EventSender>,
}

impl Host {
    /// Builds every shard.
    pub fn new(config: HostConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
        info!("Building {} shards (seed {seed})", config.shards);

        let shards: Vec<Arc<Mutex<Shard>>> = (0..config.shards)
            .map(|i| {
                let shard = Shard::new(MapId::new(i), &config, seed.wrapping_add(u64::from(i)));
                Arc::new(Mutex::new(shard))
            })
            .collect();
        let mailboxes = shards
            .iter()
            .map(|shard| shard.lock().engine().event_sender())
            .collect();

        Self {
            config,
            shards,
            mailboxes,
        }
    }

    /// Steps every shard once on the calling thread.
    pub fn step_all(&self, dt: Duration) {
        for shard in &self.shards {
            shard.lock().step(dt);
        }
    }

    /// Posts a notification to every shard.
    pub fn broadcast(&self, event: &WorldEvent) {
        for (i, mailbox) in self.mailboxes.iter().enumerate() {
            if !mailbox.publish(event.clone()) {
                warn!("Shard {i} mailbox rejected {event:?}");
            }
        }
    }

    /// Current report of every shard.
    pub fn reports(&self) -> Vec<ShardReport> {
        self.shards.iter().map(|shard| shard.lock().report()).collect()
    }

    /// Flushes every shard. Returns the number of creatures deleted.
    pub fn shutdown(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().shutdown()).sum()
    }

    fn spawn_workers(&self, running: &Arc<AtomicBool>) -> Result<Vec<JoinHandle<()>>> {
        let tick = Duration::from_millis(self.config.update_ms);
        self.shards
            .iter()
            .map(|shard| {
                let shard = Arc::clone(shard);
                let running = Arc::clone(running);
                let name = format!("shard-{}", shard.lock().map().raw());
                thread::Builder::new()
                    .name(name)
                    .spawn(move || {
                        let mut last = Instant::now();
                        while running.load(Ordering::Relaxed) {
                            let now = Instant::now();
                            shard.lock().step(now - last);
                            last = now;
                            thread::sleep(tick);
                        }
                    })
                    .map_err(|e| anyhow!("failed to start shard thread: {e}"))
            })
            .collect()
    }

    fn log_reports(&self) {
        for report in self.reports() {
            if self.config.json_reports {
                match serde_json::to_string(&report) {
                    Ok(json) => info!(target: "wildspawn::report", "{json}"),
                    Err(e) => error!("Failed to serialize shard report: {e}"),
                }
            } else {
                let m = &report.metrics;
                info!(
                    "map {}: {} players, {} active, {} pooled, {} queued, {:.0}% reused, {} misses",
                    report.map,
                    m.players,
                    m.active_spawns,
                    m.pooled,
                    m.queued,
                    m.recycle_rate * 100.0,
                    m.misses.total()
                );
            }
        }
    }
}

/// Runs the host until the configured time elapses, then flushes every shard.
pub fn run(config: HostConfig) -> Result<()> {
    let run_for = Duration::from_secs(config.run_seconds);
    let report_every = Duration::from_secs(config.report_interval_secs);
    let save_every = Duration::from_secs(config.world_save_interval_secs);
    let save_duration = Duration::from_millis(config.world_save_duration_ms);

    let host = Host::new(config);
    let running = Arc::new(AtomicBool::new(true));
    let workers = host.spawn_workers(&running)?;

    let start = Instant::now();
    let mut last_report = start;
    let mut last_save = start;
    while start.elapsed() < run_for {
        thread::sleep(Duration::from_millis(100));

        if !save_every.is_zero() && last_save.elapsed() >= save_every {
            info!("World save starting");
            host.broadcast(&WorldEvent::WorldSaveBegin);
            thread::sleep(save_duration);
            host.broadcast(&WorldEvent::WorldSaveEnd);
            info!("World save finished");
            last_save = Instant::now();
        }

        if last_report.elapsed() >= report_every {
            host.log_reports();
            last_report = Instant::now();
        }
    }

    running.store(false, Ordering::Relaxed);
    for worker in workers {
        if worker.join().is_err() {
            error!("Shard thread panicked");
        }
    }

    let cleared = host.shutdown();
    host.log_reports();
    info!("All shards flushed, {cleared} spawns removed");
    Ok(())
}
