//! Mailbox for world notifications.
//!
//! Other threads publish into a channel. The engine drains it at the start of
//! every update, so notifications are applied on the engine's own thread
//! between ticks.
//!
//! Creature notifications are bounded by the mailbox capacity and dropped
//! with a warning once it is full. The cleanup sweep reconciles entities that
//! vanished without a notification. Player and control notifications are
//! never dropped.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::warn;
use wildspawn_common::{EntityId, PlayerId};

/// Default mailbox capacity for creature notifications.
pub const MAILBOX_CAPACITY: usize = 4096;

/// Notifications the world sends to the spawn engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A player logged in
    PlayerConnected(PlayerId),
    /// A player logged out
    PlayerDisconnected(PlayerId),
    /// A creature was killed
    CreatureDied(EntityId),
    /// A creature was deleted by something other than this system
    CreatureDeleted(EntityId),
    /// A creature was tamed
    CreatureTamed(EntityId),
    /// World save starting
    WorldSaveBegin,
    /// World save finished
    WorldSaveEnd,
    /// Server shutting down
    Shutdown,
}

impl WorldEvent {
    /// Whether the event may be dropped when the mailbox is full.
    #[must_use]
    pub const fn is_droppable(&self) -> bool {
        matches!(
            self,
            Self::CreatureDied(_) | Self::CreatureDeleted(_) | Self::CreatureTamed(_)
        )
    }
}

/// Publishing handle of a mailbox. Cheap to clone across threads.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<WorldEvent>,
    capacity: usize,
}

impl EventSender {
    /// Posts an event without blocking. Returns false if it was dropped.
    ///
    /// Only creature notifications are dropped, and only while the mailbox
    /// holds `capacity` or more events.
    pub fn publish(&self, event: WorldEvent) -> bool {
        if event.is_droppable() && self.sender.len() >= self.capacity {
            warn!("Spawn event mailbox full, dropping {event:?}");
            return false;
        }
        match self.sender.send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Spawn event mailbox closed, dropping {:?}", e.into_inner());
                false
            },
        }
    }

}

/// Multi-producer mailbox owned by the engine.
#[derive(Debug)]
pub struct EventBus {
    sender: EventSender,
    receiver: Receiver<WorldEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(MAILBOX_CAPACITY)
    }
}

impl EventBus {
    /// Creates a mailbox holding up to `capacity` creature notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: EventSender {
                sender,
                capacity: capacity.max(1),
            },
            receiver,
        }
    }

    /// Posts an event. See [`EventSender::publish`].
    pub fn publish(&self, event: WorldEvent) -> bool {
        self.sender.publish(event)
    }

    /// Takes every pending event in arrival order.
    pub fn drain(&self) -> Vec<WorldEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Creature notification capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.sender.capacity
    }

    /// Handle for publishing from another thread.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }
}
