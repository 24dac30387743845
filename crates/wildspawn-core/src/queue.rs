//! Per-player spawn queues and the round-robin player roster.

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use wildspawn_common::{MapId, PlayerId, WorldPoint};

use crate::error::{SpawnError, SpawnResult};

/// What to spawn and where. Produced by one scheduling pass, consumed once by the drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnDecision {
    /// Creature type name
    pub type_name: String,
    /// Target map
    pub map: MapId,
    /// Target location
    pub location: WorldPoint,
}

impl SpawnDecision {
    /// Creates a new decision.
    #[must_use]
    pub fn new(type_name: impl Into<String>, map: MapId, location: WorldPoint) -> Self {
        Self {
            type_name: type_name.into(),
            map,
            location,
        }
    }
}

/// Bounded FIFO of pending decisions.
#[derive(Debug, Clone)]
pub struct SpawnQueue {
    decisions: VecDeque<SpawnDecision>,
    capacity: usize,
}

impl SpawnQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            decisions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a decision. Returns it back when the queue is full.
    pub fn push(&mut self, decision: SpawnDecision) -> Result<(), SpawnDecision> {
        if self.is_full() {
            return Err(decision);
        }
        self.decisions.push_back(decision);
        Ok(())
    }

    /// Removes the oldest decision.
    pub fn pop(&mut self) -> Option<SpawnDecision> {
        self.decisions.pop_front()
    }

    /// Number of pending decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// True when at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.decisions.len() >= self.capacity
    }

    /// Queue capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity. Decisions past a lowered capacity are dropped, newest first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.decisions.truncate(self.capacity);
    }

    /// Drops every pending decision, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.decisions.len();
        self.decisions.clear();
        count
    }
}

/// Scheduler state for one connected player.
#[derive(Debug, Clone)]
pub struct PlayerContext {
    id: PlayerId,
    queue: SpawnQueue,
    last_visited_tick: Option<u64>,
}

impl PlayerContext {
    /// Creates a context with an empty queue.
    #[must_use]
    pub fn new(id: PlayerId, queue_capacity: usize) -> Self {
        Self {
            id,
            queue: SpawnQueue::new(queue_capacity),
            last_visited_tick: None,
        }
    }

    /// Player identity.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Pending decisions.
    #[must_use]
    pub fn queue(&self) -> &SpawnQueue {
        &self.queue
    }

    /// Mutable access to the pending decisions.
    pub fn queue_mut(&mut self) -> &mut SpawnQueue {
        &mut self.queue
    }

    /// Tick on which the scheduler last visited this player.
    #[must_use]
    pub const fn last_visited_tick(&self) -> Option<u64> {
        self.last_visited_tick
    }

    fn enqueue(&mut self, decision: SpawnDecision) -> SpawnResult<()> {
        let capacity = self.queue.capacity();
        self.queue.push(decision).map_err(|_| SpawnError::QueueFull {
            player: self.id,
            capacity,
        })
    }
}

/// Connected players in connection order, with a round-robin cursor.
#[derive(Debug, Clone, Default)]
pub struct PlayerRoster {
    order: Vec<PlayerId>,
    contexts: AHashMap<PlayerId, PlayerContext>,
    cursor: usize,
}

impl PlayerRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player. Returns false if already connected.
    pub fn connect(&mut self, id: PlayerId, queue_capacity: usize) -> bool {
        if self.contexts.contains_key(&id) {
            return false;
        }
        self.order.push(id);
        self.contexts.insert(id, PlayerContext::new(id, queue_capacity));
        true
    }

    /// Removes a player, returning its context (queue included).
    pub fn disconnect(&mut self, id: PlayerId) -> Option<PlayerContext> {
        let context = self.contexts.remove(&id)?;
        if let Some(index) = self.order.iter().position(|p| *p == id) {
            self.order.remove(index);
            if index < self.cursor {
                self.cursor -= 1;
            }
        }
        if self.cursor >= self.order.len() {
            self.cursor = 0;
        }
        Some(context)
    }

    /// Whether the player is connected.
    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.contexts.contains_key(&id)
    }

    /// Number of connected players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Players in connection order.
    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.order.iter().copied()
    }

    /// Context of a connected player.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&PlayerContext> {
        self.contexts.get(&id)
    }

    /// Mutable context of a connected player.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerContext> {
        self.contexts.get_mut(&id)
    }

    /// Advances the cursor and returns up to `batch_size` distinct players.
    ///
    /// The cursor wraps around the end of the list. A batch never repeats a player.
    pub fn next_batch(&mut self, batch_size: usize, tick: u64) -> Vec<PlayerId> {
        let len = self.order.len();
        if len == 0 {
            return Vec::new();
        }

        let count = batch_size.min(len);
        let batch: Vec<PlayerId> = (0..count)
            .map(|i| self.order[(self.cursor + i) % len])
            .collect();
        self.cursor = (self.cursor + count) % len;

        for id in &batch {
            if let Some(context) = self.contexts.get_mut(id) {
                context.last_visited_tick = Some(tick);
            }
        }
        batch
    }

    /// Appends a decision to a player's queue.
    pub fn enqueue(&mut self, id: PlayerId, decision: SpawnDecision) -> SpawnResult<()> {
        self.contexts
            .get_mut(&id)
            .ok_or(SpawnError::UnknownPlayer(id))?
            .enqueue(decision)
    }

    /// Pops the head of a player's queue.
    pub fn pop(&mut self, id: PlayerId) -> Option<SpawnDecision> {
        self.contexts.get_mut(&id)?.queue.pop()
    }

    /// Applies a new capacity to every queue.
    pub fn set_queue_capacity(&mut self, capacity: usize) {
        for context in self.contexts.values_mut() {
            context.queue.set_capacity(capacity);
        }
    }

    /// Pending decisions across all players.
    #[must_use]
    pub fn total_queued(&self) -> usize {
        self.contexts.values().map(|c| c.queue.len()).sum()
    }

    /// Drops every pending decision.
    pub fn clear_queues(&mut self) -> usize {
        self.contexts.values_mut().map(|c| c.queue.clear()).sum()
    }
}
