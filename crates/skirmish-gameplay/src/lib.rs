//! # Skirmish Gameplay
//!
//! Enemy combat AI and population management.
//!
//! This crate provides:
//! - Combatant health/damage contract shared by players and enemies
//! - Enemy state machine (idle, patrol, approach, attack, circle, retreat)
//! - Patrol waypoint controller
//! - Item drop resolver
//! - Spawn point registry and respawn coordinator
//! - Backend contracts for physics, presentation and obstacle queries
//! - TOML configuration and a seeded random source

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod combatant;
pub mod config;
pub mod drops;
pub mod enemy;
pub mod events;
pub mod patrol;
pub mod rng;
pub mod spawn_point;
pub mod spawner;

#[cfg(test)]
mod scenario_tests;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::combatant::*;
    pub use crate::config::*;
    pub use crate::drops::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::patrol::*;
    pub use crate::rng::*;
    pub use crate::spawn_point::*;
    pub use crate::spawner::*;
}

pub use prelude::*;
