//! Arena-based table of creatures this system has placed in the world.
//!
//! Every mutation goes through one of four calls: [`ActiveSpawnTable::insert`],
//! [`ActiveSpawnTable::set_too_far`], [`ActiveSpawnTable::remove_reclaimed`]
//! and [`ActiveSpawnTable::remove_external`]. An entity appears in at most
//! one record.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use wildspawn_common::{EntityId, MapId, PlayerId};

use crate::error::{SpawnError, SpawnResult};

/// Why a record left the table without being reclaimed by cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalCause {
    /// Creature was killed
    Died,
    /// Creature was deleted by something else
    Deleted,
    /// Creature was tamed by a player
    Tamed,
    /// World no longer knows the entity
    Missing,
}

/// One placed creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSpawnRecord {
    /// World entity
    pub entity: EntityId,
    /// Creature type name
    pub type_name: String,
    /// Map it was placed on
    pub map: MapId,
    /// Player whose pass produced it
    pub owner: PlayerId,
    /// Spawn tick on which it was placed
    pub spawned_tick: u64,
    /// Set by the distance sweep when no player is near
    pub too_far: bool,
}

impl ActiveSpawnRecord {
    /// Creates an unflagged record.
    #[must_use]
    pub fn new(
        entity: EntityId,
        type_name: impl Into<String>,
        map: MapId,
        owner: PlayerId,
        spawned_tick: u64,
    ) -> Self {
        Self {
            entity,
            type_name: type_name.into(),
            map,
            owner,
            spawned_tick,
            too_far: false,
        }
    }
}

/// Slot storage with a free list and an id index.
#[derive(Debug, Default)]
pub struct ActiveSpawnTable {
    slots: Vec<Option<ActiveSpawnRecord>>,
    free_list: Vec<usize>,
    id_to_index: AHashMap<EntityId, usize>,
}

impl ActiveSpawnTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    /// True when no record exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    /// Whether the entity has a record.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// Record of an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&ActiveSpawnRecord> {
        let index = *self.id_to_index.get(&id)?;
        self.slots.get(index)?.as_ref()
    }

    /// Adds a record. Fails if the entity is already tracked.
    pub fn insert(&mut self, record: ActiveSpawnRecord) -> SpawnResult<()> {
        let id = record.entity;
        if self.id_to_index.contains_key(&id) {
            return Err(SpawnError::AlreadyActive(id));
        }

        let index = if let Some(index) = self.free_list.pop() {
            self.slots[index] = Some(record);
            index
        } else {
            self.slots.push(Some(record));
            self.slots.len() - 1
        };
        self.id_to_index.insert(id, index);
        Ok(())
    }

    /// Sets the too-far flag. Returns true when the flag changed.
    pub fn set_too_far(&mut self, id: EntityId, too_far: bool) -> bool {
        let Some(&index) = self.id_to_index.get(&id) else {
            return false;
        };
        match self.slots.get_mut(index).and_then(Option::as_mut) {
            Some(record) if record.too_far != too_far => {
                record.too_far = too_far;
                true
            },
            _ => false,
        }
    }

    /// Removes a record that cleanup recycled or deleted.
    pub fn remove_reclaimed(&mut self, id: EntityId) -> Option<ActiveSpawnRecord> {
        self.remove(id)
    }

    /// Removes a record whose creature died, was deleted, tamed or went missing.
    pub fn remove_external(
        &mut self,
        id: EntityId,
        cause: ExternalCause,
    ) -> Option<ActiveSpawnRecord> {
        let record = self.remove(id)?;
        tracing::trace!("Active spawn {} removed externally: {cause:?}", record.entity);
        Some(record)
    }

    fn remove(&mut self, id: EntityId) -> Option<ActiveSpawnRecord> {
        let index = self.id_to_index.remove(&id)?;
        let record = self.slots.get_mut(index)?.take();
        self.free_list.push(index);
        record
    }

    /// Iterates over every record.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveSpawnRecord> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Snapshot of tracked ids, so sweeps can mutate the table while walking it.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|record| record.entity).collect()
    }

    /// Number of ids in `ids` that have a record.
    #[must_use]
    pub fn count_among(&self, ids: &[EntityId]) -> usize {
        ids.iter().filter(|id| self.contains(**id)).count()
    }

    /// Removes and returns every record.
    pub fn drain_all(&mut self) -> Vec<ActiveSpawnRecord> {
        self.id_to_index.clear();
        self.free_list.clear();
        self.slots.drain(..).flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: u64) -> ActiveSpawnRecord {
        ActiveSpawnRecord::new(
            EntityId::from_raw(raw),
            "Orc",
            MapId::new(0),
            PlayerId::new(1),
            1,
        )
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut table = ActiveSpawnTable::new();
        table.insert(record(10)).expect("first insert");

        let second = table.insert(record(10));
        assert!(matches!(second, Err(SpawnError::AlreadyActive(_))));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_slot_reuse() {
        let mut table = ActiveSpawnTable::new();
        table.insert(record(1)).expect("insert");
        table.insert(record(2)).expect("insert");

        assert!(table.remove_reclaimed(EntityId::from_raw(1)).is_some());
        table.insert(record(3)).expect("insert");

        assert_eq!(table.len(), 2);
        assert_eq!(table.slots.len(), 2);
        assert!(table.get(EntityId::from_raw(3)).is_some());
        assert!(table.get(EntityId::from_raw(1)).is_none());
    }

    #[test]
    fn test_too_far_flag_toggles() {
        let mut table = ActiveSpawnTable::new();
        let id = EntityId::from_raw(5);
        table.insert(record(5)).expect("insert");

        assert!(table.set_too_far(id, true));
        assert!(!table.set_too_far(id, true));
        assert!(table.get(id).is_some_and(|r| r.too_far));
        assert!(table.set_too_far(id, false));
        assert!(!table.set_too_far(EntityId::from_raw(99), true));
    }

    #[test]
    fn test_remove_external_is_idempotent() {
        let mut table = ActiveSpawnTable::new();
        let id = EntityId::from_raw(7);
        table.insert(record(7)).expect("insert");

        assert!(table.remove_external(id, ExternalCause::Tamed).is_some());
        assert!(table.remove_external(id, ExternalCause::Died).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_count_among_and_drain() {
        let mut table = ActiveSpawnTable::new();
        for raw in 1..=3 {
            table.insert(record(raw)).expect("insert");
        }
        let nearby = [EntityId::from_raw(2), EntityId::from_raw(3), EntityId::from_raw(42)];
        assert_eq!(table.count_among(&nearby), 2);

        let drained = table.drain_all();
        assert_eq!(drained.len(), 3);
        assert!(table.is_empty());
        assert!(table.ids().is_empty());
    }
}
