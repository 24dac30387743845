//! Error types raised by world collaborators.

use thiserror::Error;

use crate::coords::WorldPoint;
use crate::ids::{EntityId, MapId};

/// Errors reported by the world runtime when it refuses an entity operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// No creature type is registered under this name
    #[error("Unknown creature type: {0}")]
    UnknownCreature(String),

    /// The entity does not exist (or was deleted)
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The map is not part of the live map set
    #[error("Unknown map: {0}")]
    UnknownMap(MapId),

    /// The world refused to place the entity
    #[error("Placement rejected on {map} at {location}: {reason}")]
    PlacementRejected {
        /// Target map
        map: MapId,
        /// Target location
        location: WorldPoint,
        /// Reason given by the world
        reason: String,
    },
}

/// Result type alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
