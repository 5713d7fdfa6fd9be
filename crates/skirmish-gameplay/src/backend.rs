//! Engine-facing contracts: physics bodies, presentation, obstacle queries.
//!
//! The gameplay core never resolves collisions or plays animations itself.
//! It talks to these traits, and ships small in-process implementations
//! that the simulation binary and the tests use.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ============================================================================
// Physics
// ============================================================================

/// A movable body owned by one enemy.
pub trait PhysicsBody {
    /// Current position.
    fn position(&self) -> Vec2;

    /// Current velocity.
    fn velocity(&self) -> Vec2;

    /// Overwrites the velocity.
    fn set_velocity(&mut self, velocity: Vec2);

    /// Applies an instantaneous impulse along `direction`.
    fn apply_impulse(&mut self, direction: Vec2, magnitude: f32);

    /// Moves the body to `target` this physics step (kinematic steering).
    fn move_position(&mut self, target: Vec2);

    /// Integrates velocity for one physics step.
    fn step(&mut self, dt: f32);

    /// Enables or disables collisions with other bodies.
    fn set_collision_enabled(&mut self, enabled: bool);

    /// Whether the body currently collides.
    fn collision_enabled(&self) -> bool;
}

/// Unit-mass body with linear damping, integrated explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicBody {
    position: Vec2,
    velocity: Vec2,
    /// Fraction of velocity lost per second
    pub linear_damping: f32,
    collision: bool,
}

impl KinematicBody {
    /// Creates a body at rest.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            linear_damping: 8.0,
            collision: true,
        }
    }

    /// Sets linear damping.
    #[must_use]
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping.max(0.0);
        self
    }
}

impl PhysicsBody for KinematicBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn apply_impulse(&mut self, direction: Vec2, magnitude: f32) {
        self.velocity += direction.normalize_or_zero() * magnitude;
    }

    fn move_position(&mut self, target: Vec2) {
        self.position = target;
    }

    fn step(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        let keep = (1.0 - self.linear_damping * dt).max(0.0);
        self.velocity *= keep;
        if self.velocity.length_squared() < 1e-8 {
            self.velocity = Vec2::ZERO;
        }
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision = enabled;
    }

    fn collision_enabled(&self) -> bool {
        self.collision
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// One-shot presentation triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationCue {
    /// Took a non-lethal hit
    Hurt,
    /// Died
    Dead,
    /// Began an attack wind-up
    AttackStart,
}

/// Fire-and-forget sink for animation state.
pub trait Presenter {
    /// Walking flag.
    fn set_walking(&mut self, walking: bool);

    /// Attacking flag.
    fn set_attacking(&mut self, attacking: bool);

    /// Facing vector (only pushed while moving).
    fn set_facing(&mut self, facing: Vec2);

    /// One-shot trigger.
    fn trigger(&mut self, cue: AnimationCue);
}

/// Presenter that records what it was told.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingPresenter {
    /// Last walking flag
    pub walking: bool,
    /// Last attacking flag
    pub attacking: bool,
    /// Last facing vector
    pub facing: Vec2,
    /// Triggers in the order received
    pub cues: Vec<AnimationCue>,
}

impl RecordingPresenter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times a cue fired.
    #[must_use]
    pub fn count(&self, cue: AnimationCue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }
}

impl Presenter for RecordingPresenter {
    fn set_walking(&mut self, walking: bool) {
        self.walking = walking;
    }

    fn set_attacking(&mut self, attacking: bool) {
        self.attacking = attacking;
    }

    fn set_facing(&mut self, facing: Vec2) {
        self.facing = facing;
    }

    fn trigger(&mut self, cue: AnimationCue) {
        self.cues.push(cue);
    }
}

// ============================================================================
// Obstacles
// ============================================================================

/// Occupancy query used to validate spawn positions.
pub trait ObstacleQuery {
    /// Whether a circle at `position` with `radius` overlaps an obstacle.
    fn overlaps(&self, position: Vec2, radius: f32) -> bool;
}

/// Circular obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleObstacle {
    /// Center
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

/// Obstacle field made of circles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleObstacles {
    obstacles: Vec<CircleObstacle>,
}

impl CircleObstacles {
    /// Creates an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstacle.
    pub fn add(&mut self, center: Vec2, radius: f32) {
        self.obstacles.push(CircleObstacle {
            center,
            radius: radius.max(0.0),
        });
    }

    /// Adds an obstacle (builder form).
    #[must_use]
    pub fn with(mut self, center: Vec2, radius: f32) -> Self {
        self.add(center, radius);
        self
    }

    /// Number of obstacles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Whether the field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl From<Vec<CircleObstacle>> for CircleObstacles {
    fn from(obstacles: Vec<CircleObstacle>) -> Self {
        Self { obstacles }
    }
}

impl ObstacleQuery for CircleObstacles {
    fn overlaps(&self, position: Vec2, radius: f32) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.center.distance(position) < o.radius + radius)
    }
}

// ============================================================================
// Enemy construction
// ============================================================================

/// Creates the engine-side pieces of a freshly spawned enemy.
pub trait EnemyBackend {
    /// Creates a physics body at the spawn position.
    fn create_body(&mut self, position: Vec2) -> Box<dyn PhysicsBody>;

    /// Creates a presenter, if this backend renders anything.
    fn create_presenter(&mut self) -> Option<Box<dyn Presenter>> {
        None
    }
}

/// Headless backend: kinematic bodies, no presentation.
#[derive(Debug, Clone, Default)]
pub struct KinematicBackend {
    /// Damping applied to every body
    pub linear_damping: Option<f32>,
}

impl EnemyBackend for KinematicBackend {
    fn create_body(&mut self, position: Vec2) -> Box<dyn PhysicsBody> {
        let body = KinematicBody::new(position);
        match self.linear_damping {
            Some(damping) => Box::new(body.with_damping(damping)),
            None => Box::new(body),
        }
    }
}
