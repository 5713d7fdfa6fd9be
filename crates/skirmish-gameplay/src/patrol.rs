//! Cyclic waypoint patrol.
//!
//! The controller keeps its place in the cycle across interruptions: while
//! the enemy is fighting, hurt or attacking it simply holds, and resumes
//! walking toward the same waypoint once the state machine returns to
//! [`EnemyState::Patrol`](crate::enemy::EnemyState::Patrol).

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::rng::SimRng;

/// Distance at which a waypoint counts as reached.
pub const ARRIVAL_THRESHOLD: f32 = 0.1;

/// Fewest waypoints a generated route has.
pub const MIN_GENERATED_POINTS: u32 = 3;
/// Most waypoints a generated route has.
pub const MAX_GENERATED_POINTS: u32 = 5;

/// Where the controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PatrolPhase {
    /// Walking toward the current waypoint
    Travelling,
    /// Standing at a waypoint
    Waiting {
        /// Seconds left before moving on
        remaining: f32,
    },
}

/// Serialized form of a patrol: the route without cycle progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    /// Waypoints in visiting order
    pub waypoints: Vec<Vec2>,
    /// Seconds to wait at each waypoint
    pub wait_time: f32,
}

/// Waypoint cycle with a per-point wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatrolRoute", into = "PatrolRoute")]
pub struct PatrolController {
    waypoints: Vec<Vec2>,
    wait_time: f32,
    index: usize,
    phase: PatrolPhase,
    active: bool,
}

impl PatrolController {
    /// Creates a patrol over `waypoints`. Needs at least two points.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2>, wait_time: f32) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }
        Some(Self {
            waypoints,
            wait_time: wait_time.max(0.0),
            index: 0,
            phase: PatrolPhase::Travelling,
            active: true,
        })
    }

    /// Generates 3-5 waypoints at evenly spaced angles around `center`,
    /// each at a random distance in `[1, radius]`, with a wait in [1, 3] s.
    pub fn generate(center: Vec2, radius: f32, rng: &mut SimRng) -> Self {
        let count = rng.range_inclusive(MIN_GENERATED_POINTS, MAX_GENERATED_POINTS);
        let waypoints = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * TAU;
                let distance = rng.range(1.0, radius);
                center + Vec2::new(angle.cos(), angle.sin()) * distance
            })
            .collect();
        let wait_time = rng.range(1.0, 3.0);

        Self {
            waypoints,
            wait_time,
            index: 0,
            phase: PatrolPhase::Travelling,
            active: true,
        }
    }

    /// Waypoints in visiting order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Index of the waypoint currently targeted.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    /// Waypoint currently targeted.
    #[must_use]
    pub fn current_waypoint(&self) -> Vec2 {
        self.waypoints[self.index]
    }

    /// Wait duration at each waypoint.
    #[must_use]
    pub const fn wait_time(&self) -> f32 {
        self.wait_time
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> PatrolPhase {
        self.phase
    }

    /// Whether the patrol is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Stops the patrol for good (death).
    pub fn stop(&mut self) {
        self.active = false;
        self.phase = PatrolPhase::Travelling;
    }

    /// Restarts a stopped patrol where it left off.
    pub fn resume(&mut self) {
        self.active = true;
    }

    /// Advances the patrol by one tick.
    ///
    /// Returns the movement direction the patrol wants, or `None` while it
    /// holds and leaves movement to the state machine.
    pub fn tick(&mut self, dt: f32, position: Vec2, patrolling: bool, interrupted: bool) -> Option<Vec2> {
        if !self.active {
            return None;
        }

        match self.phase {
            PatrolPhase::Travelling => {
                if interrupted || !patrolling {
                    return None;
                }
                let target = self.current_waypoint();
                if position.distance(target) <= ARRIVAL_THRESHOLD {
                    self.phase = PatrolPhase::Waiting {
                        remaining: self.wait_time,
                    };
                    Some(Vec2::ZERO)
                } else {
                    Some((target - position).normalize_or_zero())
                }
            },
            PatrolPhase::Waiting { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.index = (self.index + 1) % self.waypoints.len();
                    self.phase = PatrolPhase::Travelling;
                } else {
                    self.phase = PatrolPhase::Waiting { remaining };
                }
                patrolling.then_some(Vec2::ZERO)
            },
        }
    }
}

impl TryFrom<PatrolRoute> for PatrolController {
    type Error = String;

    fn try_from(route: PatrolRoute) -> Result<Self, Self::Error> {
        let count = route.waypoints.len();
        Self::new(route.waypoints, route.wait_time)
            .ok_or_else(|| format!("patrol needs at least 2 waypoints, got {count}"))
    }
}

impl From<PatrolController> for PatrolRoute {
    fn from(patrol: PatrolController) -> Self {
        Self {
            waypoints: patrol.waypoints,
            wait_time: patrol.wait_time,
        }
    }
}
