//! Error types for the spawn engine.

use thiserror::Error;
use wildspawn_common::{EntityId, MapId, PlayerId, WorldError, WorldPoint};

use crate::persist::DataError;

/// Top-level error type for engine operations.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The world refused to create or place a spawn decision
    #[error("Failed to materialize {type_name} on {map} at {location}: {source}")]
    Materialize {
        /// Creature type of the decision
        type_name: String,
        /// Target map
        map: MapId,
        /// Target location
        location: WorldPoint,
        /// Underlying world error
        #[source]
        source: WorldError,
    },

    /// Spawn data or settings could not be loaded
    #[error("Spawn data error: {0}")]
    Data(#[from] DataError),

    /// The player's queue is at capacity
    #[error("Spawn queue for {player} is full (capacity {capacity})")]
    QueueFull {
        /// Queue owner
        player: PlayerId,
        /// Queue capacity
        capacity: usize,
    },

    /// The player is not connected
    #[error("Player not connected: {0}")]
    UnknownPlayer(PlayerId),

    /// The entity already has an active spawn record
    #[error("Entity {0} is already tracked as an active spawn")]
    AlreadyActive(EntityId),
}

/// Result type alias for engine operations.
pub type SpawnResult<T> = Result<T, SpawnError>;
