//! # Skirmish Common
//!
//! Common types shared by the Skirmish crates:
//! - ID types (EnemyId, SpawnPointId, ItemTypeId)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
}

pub use prelude::*;
