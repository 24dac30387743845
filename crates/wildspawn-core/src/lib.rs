//! # Wildspawn Core
//!
//! Per-player creature spawning for a persistent world server.
//!
//! This crate provides the scheduling engine and everything it owns:
//! - Settings with dynamic scaling by nearby player density
//! - Zone, region and tile spawn sources with weather and time triggers
//! - Versioned loading of spawn data and settings
//! - Candidate selection (location search and tiered creature rolls)
//! - Per-player queues drained by a round-robin scheduler
//! - Active spawn table and a capacity-bounded recycle pool
//! - Distance and cleanup sweeps
//! - Metrics, an event mailbox and interval timers
//! - An in-memory reference world

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod active;
pub mod cleanup;
pub mod conditions;
pub mod distance;
pub mod engine;
pub mod error;
pub mod events;
pub mod metrics;
pub mod persist;
pub mod queue;
pub mod recycle;
pub mod selector;
pub mod settings;
pub mod sim;
pub mod sources;
pub mod timer;
pub mod world;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::active::*;
    pub use crate::cleanup::*;
    pub use crate::conditions::*;
    pub use crate::distance::*;
    pub use crate::engine::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::metrics::*;
    pub use crate::persist::*;
    pub use crate::queue::*;
    pub use crate::recycle::*;
    pub use crate::selector::*;
    pub use crate::settings::*;
    pub use crate::sim::*;
    pub use crate::sources::*;
    pub use crate::timer::*;
    pub use crate::world::*;
}

pub use prelude::*;
