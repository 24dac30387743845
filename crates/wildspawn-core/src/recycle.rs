//! Capacity-bounded pool of dormant creatures, keyed by type name.
//!
//! Reclaimed creatures are hidden from the world instead of deleted, then
//! handed back oldest-first when the same type is spawned again.

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wildspawn_common::EntityId;

use crate::world::WorldRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecycleEntry {
    entity: EntityId,
    sequence: u64,
}

/// Pool occupancy, as reported to operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleStats {
    /// Pooled count per type, sorted by type name
    pub per_type: Vec<(String, usize)>,
    /// Total pooled
    pub total: usize,
    /// Global cap
    pub global_cap: usize,
    /// Per-type cap
    pub per_type_cap: usize,
}

/// Dormant creatures awaiting reuse.
#[derive(Debug)]
pub struct RecyclePool {
    by_type: AHashMap<String, VecDeque<RecycleEntry>>,
    index: AHashMap<EntityId, String>,
    total: usize,
    global_cap: usize,
    per_type_cap: usize,
    next_sequence: u64,
}

impl RecyclePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(global_cap: usize, per_type_cap: usize) -> Self {
        Self {
            by_type: AHashMap::new(),
            index: AHashMap::new(),
            total: 0,
            global_cap,
            per_type_cap,
            next_sequence: 0,
        }
    }

    /// Total pooled creatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total
    }

    /// True when nothing is pooled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Pooled creatures of one type.
    #[must_use]
    pub fn count_of(&self, type_name: &str) -> usize {
        self.by_type.get(type_name).map_or(0, VecDeque::len)
    }

    /// Whether an entity is pooled.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Whether a store of `type_name` would be accepted.
    #[must_use]
    pub fn has_room(&self, type_name: &str) -> bool {
        self.total < self.global_cap && self.count_of(type_name) < self.per_type_cap
    }

    /// Pools a reclaimed creature, making it dormant.
    ///
    /// Returns false when either cap is reached or the world refuses to hide
    /// the creature. The caller deletes it in that case.
    pub fn store<W: WorldRuntime + ?Sized>(
        &mut self,
        world: &mut W,
        id: EntityId,
        type_name: &str,
    ) -> bool {
        if self.contains(id) || !self.has_room(type_name) {
            return false;
        }
        if let Err(e) = world.set_dormant(id, true) {
            warn!("Could not make {type_name} {id} dormant: {e}");
            return false;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.by_type
            .entry(type_name.to_string())
            .or_default()
            .push_back(RecycleEntry {
                entity: id,
                sequence,
            });
        self.index.insert(id, type_name.to_string());
        self.total += 1;
        true
    }

    /// Takes the oldest pooled creature of `type_name`, restored and awake.
    ///
    /// Entries the world no longer knows are discarded along the way.
    pub fn try_reuse<W: WorldRuntime + ?Sized>(
        &mut self,
        world: &mut W,
        type_name: &str,
    ) -> Option<EntityId> {
        loop {
            let entry = self.by_type.get_mut(type_name)?.pop_front()?;
            self.index.remove(&entry.entity);
            self.total -= 1;

            if !world.is_alive(entry.entity) {
                debug!("Discarding stale pooled {type_name} {}", entry.entity);
                continue;
            }

            match Self::wake(world, entry.entity) {
                Ok(()) => return Some(entry.entity),
                Err(e) => {
                    warn!("Failed to reuse pooled {type_name} {}: {e}", entry.entity);
                    world.delete_mobile(entry.entity);
                },
            }
        }
    }

    fn wake<W: WorldRuntime + ?Sized>(
        world: &mut W,
        id: EntityId,
    ) -> wildspawn_common::WorldResult<()> {
        let mut vitals = world
            .vitals(id)
            .ok_or(wildspawn_common::WorldError::EntityNotFound(id))?;
        vitals.restore();
        world.set_vitals(id, vitals)?;
        world.set_combatant(id, None)?;
        world.set_dormant(id, false)
    }

    /// Drops an entry the world deleted underneath the pool.
    pub fn forget(&mut self, id: EntityId) -> bool {
        let Some(type_name) = self.index.remove(&id) else {
            return false;
        };
        if let Some(entries) = self.by_type.get_mut(&type_name) {
            entries.retain(|entry| entry.entity != id);
        }
        self.total -= 1;
        true
    }

    /// Deletes every pooled creature. Returns how many were deleted.
    pub fn clear_all<W: WorldRuntime + ?Sized>(&mut self, world: &mut W) -> usize {
        let count = self.total;
        for (_, entries) in self.by_type.drain() {
            for entry in entries {
                world.delete_mobile(entry.entity);
            }
        }
        self.index.clear();
        self.total = 0;
        count
    }

    /// Applies new caps, deleting the oldest entries until both hold.
    pub fn apply_caps<W: WorldRuntime + ?Sized>(
        &mut self,
        world: &mut W,
        global_cap: usize,
        per_type_cap: usize,
    ) -> usize {
        self.global_cap = global_cap;
        self.per_type_cap = per_type_cap;

        let mut evicted = Vec::new();
        for entries in self.by_type.values_mut() {
            while entries.len() > per_type_cap {
                if let Some(entry) = entries.pop_front() {
                    evicted.push(entry.entity);
                }
            }
        }
        for id in &evicted {
            self.index.remove(id);
        }
        self.total -= evicted.len();

        while self.total > global_cap {
            let oldest = self
                .by_type
                .iter()
                .filter_map(|(name, entries)| entries.front().map(|e| (e.sequence, name.clone())))
                .min();
            let Some((_, name)) = oldest else { break };
            if let Some(entry) = self.by_type.get_mut(&name).and_then(VecDeque::pop_front) {
                self.index.remove(&entry.entity);
                self.total -= 1;
                evicted.push(entry.entity);
            }
        }

        self.by_type.retain(|_, entries| !entries.is_empty());
        for id in &evicted {
            world.delete_mobile(*id);
        }
        if !evicted.is_empty() {
            debug!("Evicted {} pooled creatures after cap change", evicted.len());
        }
        evicted.len()
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> RecycleStats {
        let mut per_type: Vec<(String, usize)> = self
            .by_type
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, entries)| (name.clone(), entries.len()))
            .collect();
        per_type.sort();
        RecycleStats {
            per_type,
            total: self.total,
            global_cap: self.global_cap,
            per_type_cap: self.per_type_cap,
        }
    }
}
