//! # Wildspawn Common
//!
//! Common types shared by every Wildspawn crate.
//!
//! This crate provides the foundational vocabulary of the spawn scheduler:
//! - Coordinate types (world points, rectangles, compass directions)
//! - ID types (EntityId, PlayerId, MapId)
//! - Schema versions and magic bytes for persisted records
//! - Error types raised by world collaborators
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
