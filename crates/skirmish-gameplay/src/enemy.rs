//! Enemy combat AI.
//!
//! Each enemy runs a small decision loop once per variable-rate tick:
//! - timed sequences (attack, hurt recovery, death cleanup) advance first
//! - while knocked back, attacking or hurt, evaluation is skipped entirely
//! - otherwise the state is re-evaluated from distance, cooldown and
//!   retreat rolls, then executed into a movement direction
//!
//! Movement is consumed by [`EnemyController::fixed_update`] on the physics
//! tick. Enemies never touch spawner bookkeeping; they publish
//! [`EnemyEvent`]s instead.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{EnemyId, SpawnPointId};
use tracing::{debug, warn};

use crate::backend::{AnimationCue, PhysicsBody, Presenter};
use crate::combatant::{CombatTarget, Combatant, DamageOutcome};
use crate::config::{CircleTuning, EnemyTuning, RetreatTuning};
use crate::drops::DropTable;
use crate::events::{EnemyEvent, EventSender};
use crate::patrol::PatrolController;
use crate::rng::SimRng;

/// Share of the attack duration spent winding up.
pub const WIND_UP_FRACTION: f32 = 0.6;
/// Share of the attack duration spent following through.
pub const FOLLOW_THROUGH_FRACTION: f32 = 0.4;
/// Extra reach allowed when the wind-up lands.
pub const ATTACK_REACH_SLACK: f32 = 0.3;
/// Fraction of knockback force the attacker recoils with.
pub const SELF_KNOCKBACK_SCALE: f32 = 0.2;
/// Seconds after a hit until knockback clears.
pub const KNOCKBACK_CLEAR: f32 = 0.2;
/// Seconds after a hit until hurt clears.
pub const HURT_CLEAR: f32 = 0.5;
/// Seconds between death and removal.
pub const DEATH_CLEANUP: f32 = 1.0;
/// Maximum angular jitter applied to the retreat direction.
pub const RETREAT_JITTER_DEGREES: f32 = 15.0;

const HURT_VELOCITY_SCALE: f32 = 0.95;
const ATTACK_VELOCITY_SCALE: f32 = 0.7;
const MOVING_THRESHOLD_SQ: f32 = 0.01;

// ============================================================================
// States and phases
// ============================================================================

/// Behavioral state selected by the decision function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnemyState {
    /// Standing still, no patrol configured
    #[default]
    Idle,
    /// Walking the patrol route
    Patrol,
    /// Closing in on the target
    Approach,
    /// Attacking
    Attack,
    /// Strafing around the target
    Circle,
    /// Backing away from the target
    Retreat,
}

impl EnemyState {
    /// Get display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Patrol => "Patrol",
            Self::Approach => "Approach",
            Self::Attack => "Attack",
            Self::Circle => "Circle",
            Self::Retreat => "Retreat",
        }
    }
}

/// Progress through an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Before the hit lands
    WindUp {
        /// Seconds left
        remaining: f32,
    },
    /// After the hit
    FollowThrough {
        /// Seconds left
        remaining: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HurtRecovery {
    elapsed: f32,
}

/// Where an enemy is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Fighting
    Alive,
    /// Dead, waiting for cleanup
    Dying {
        /// Seconds until removal
        remaining: f32,
    },
    /// Cleanup done; the spawner drops the instance
    Removed,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Read-only snapshot of an enemy for tooling and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDiagnostics {
    /// Enemy ID
    pub id: EnemyId,
    /// Spawn point of origin
    pub origin: Option<SpawnPointId>,
    /// Current state
    pub state: EnemyState,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Damage per hit
    pub attack_damage: i32,
    /// World position
    pub position: Vec2,
    /// Current movement direction
    pub movement: Vec2,
    /// Retreat in progress
    pub retreating: bool,
    /// Circling direction
    pub circling_clockwise: bool,
    /// Attack cooldown remaining
    pub attack_timer: f32,
    /// Knocked back
    pub knocked_back: bool,
    /// Mid-attack
    pub attacking: bool,
    /// Recovering from a hit
    pub hurt: bool,
    /// Dead
    pub dead: bool,
    /// Last observed target death flag
    pub target_dead: bool,
    /// Detection range
    pub detection_range: f32,
    /// Attack range
    pub attack_range: f32,
    /// Minimum combat distance
    pub min_combat_distance: f32,
    /// Preferred combat distance
    pub optimal_combat_distance: f32,
    /// Retreat completion distance
    pub retreat_distance: f32,
    /// Index of the targeted patrol waypoint
    pub patrol_index: Option<usize>,
    /// Number of state evaluations so far
    pub evaluations: u64,
}

// ============================================================================
// Controller
// ============================================================================

/// One enemy: combatant, decision loop and its engine-side handles.
pub struct EnemyController {
    id: EnemyId,
    origin: Option<SpawnPointId>,
    combatant: Combatant,
    tuning: EnemyTuning,
    drops: DropTable,
    body: Box<dyn PhysicsBody>,
    presenter: Option<Box<dyn Presenter>>,
    events: EventSender,
    rng: SimRng,

    state: EnemyState,
    movement: Vec2,
    moving: bool,
    attack_timer: f32,
    attack: Option<AttackPhase>,
    hurt: Option<HurtRecovery>,
    retreating: bool,
    last_retreat_at: Option<f32>,
    retreat_start: Vec2,
    clockwise: bool,
    last_direction_change: f32,
    patrol: Option<PatrolController>,
    target_dead: bool,
    clock: f32,
    lifecycle: Lifecycle,
    evaluations: u64,
    warned_no_target: bool,
    warned_no_presenter: bool,
}

impl std::fmt::Debug for EnemyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnemyController")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("health", &self.combatant.current_health())
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl EnemyController {
    /// Creates an enemy with default tuning and 50 health.
    #[must_use]
    pub fn new(id: EnemyId, body: Box<dyn PhysicsBody>, events: EventSender, rng: SimRng) -> Self {
        let tuning = EnemyTuning::default();
        Self {
            id,
            origin: None,
            combatant: Combatant::new(50, 10),
            tuning,
            drops: DropTable::new(0.0),
            body,
            presenter: None,
            events,
            rng,
            state: EnemyState::Idle,
            movement: Vec2::ZERO,
            moving: false,
            attack_timer: 0.0,
            attack: None,
            hurt: None,
            retreating: false,
            last_retreat_at: None,
            retreat_start: Vec2::ZERO,
            clockwise: tuning.circle.clockwise,
            last_direction_change: 0.0,
            patrol: None,
            target_dead: false,
            clock: 0.0,
            lifecycle: Lifecycle::Alive,
            evaluations: 0,
            warned_no_target: false,
            warned_no_presenter: false,
        }
    }

    /// Sets the spawn point this enemy came from.
    #[must_use]
    pub fn with_origin(mut self, origin: Option<SpawnPointId>) -> Self {
        self.origin = origin;
        self
    }

    /// Attaches a presenter.
    #[must_use]
    pub fn with_presenter(mut self, presenter: Option<Box<dyn Presenter>>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Sets health and damage (full health).
    #[must_use]
    pub fn with_stats(mut self, health: i32, damage: i32) -> Self {
        self.combatant = Combatant::new(health, damage);
        self
    }

    /// Sets behavioral tuning.
    #[must_use]
    pub fn with_tuning(mut self, tuning: EnemyTuning) -> Self {
        self.tuning = tuning;
        self.clockwise = tuning.circle.clockwise;
        self
    }

    /// Sets the drop table.
    #[must_use]
    pub fn with_drops(mut self, drops: DropTable) -> Self {
        self.drops = drops;
        self
    }

    /// Replaces circling tunables.
    pub fn set_circle_behavior(&mut self, circle: CircleTuning) {
        self.tuning.circle = circle;
        self.clockwise = circle.clockwise;
    }

    /// Replaces retreat tunables.
    pub fn set_retreat_behavior(&mut self, retreat: RetreatTuning) {
        self.tuning.retreat = retreat;
    }

    /// Starts (or restarts) patrolling the given route.
    pub fn start_patrolling(&mut self, patrol: PatrolController) {
        if self.is_dead() {
            return;
        }
        self.patrol = Some(patrol);
    }

    /// Stops patrolling; the enemy idles when out of range.
    pub fn stop_patrolling(&mut self) {
        self.patrol = None;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Enemy ID.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Spawn point of origin.
    #[must_use]
    pub const fn origin(&self) -> Option<SpawnPointId> {
        self.origin
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// Current movement direction (unit vector or zero).
    #[must_use]
    pub const fn movement(&self) -> Vec2 {
        self.movement
    }

    /// Whether the enemy is trying to move.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position()
    }

    /// Physics body.
    #[must_use]
    pub fn body(&self) -> &dyn PhysicsBody {
        self.body.as_ref()
    }

    /// Health and damage.
    #[must_use]
    pub const fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    /// Behavioral tuning.
    #[must_use]
    pub const fn tuning(&self) -> &EnemyTuning {
        &self.tuning
    }

    /// Patrol route, if configured.
    #[must_use]
    pub const fn patrol(&self) -> Option<&PatrolController> {
        self.patrol.as_ref()
    }

    /// Attack cooldown remaining.
    #[must_use]
    pub const fn attack_timer(&self) -> f32 {
        self.attack_timer
    }

    /// Current attack phase.
    #[must_use]
    pub const fn attack_phase(&self) -> Option<AttackPhase> {
        self.attack
    }

    /// Mid-attack.
    #[must_use]
    pub const fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    /// Recovering from a hit.
    #[must_use]
    pub const fn is_hurt(&self) -> bool {
        self.hurt.is_some()
    }

    /// Knocked back (first part of hurt recovery).
    #[must_use]
    pub fn is_knocked_back(&self) -> bool {
        self.hurt.is_some_and(|h| h.elapsed < KNOCKBACK_CLEAR)
    }

    /// Whether any interrupt flag currently gates evaluation.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.is_knocked_back() || self.is_attacking() || self.is_hurt()
    }

    /// Retreat in progress.
    #[must_use]
    pub const fn is_retreating(&self) -> bool {
        self.retreating
    }

    /// Circling direction.
    #[must_use]
    pub const fn is_circling_clockwise(&self) -> bool {
        self.clockwise
    }

    /// Dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.combatant.is_dead()
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether cleanup has finished.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.lifecycle == Lifecycle::Removed
    }

    /// Seconds this enemy has been ticking.
    #[must_use]
    pub const fn clock(&self) -> f32 {
        self.clock
    }

    /// Number of state evaluations performed.
    #[must_use]
    pub const fn evaluation_count(&self) -> u64 {
        self.evaluations
    }

    /// Snapshot for tooling.
    #[must_use]
    pub fn diagnostics(&self) -> EnemyDiagnostics {
        let m = &self.tuning.movement;
        EnemyDiagnostics {
            id: self.id,
            origin: self.origin,
            state: self.state,
            health: self.combatant.current_health(),
            max_health: self.combatant.max_health(),
            attack_damage: self.combatant.attack_damage(),
            position: self.position(),
            movement: self.movement,
            retreating: self.retreating,
            circling_clockwise: self.clockwise,
            attack_timer: self.attack_timer,
            knocked_back: self.is_knocked_back(),
            attacking: self.is_attacking(),
            hurt: self.is_hurt(),
            dead: self.is_dead(),
            target_dead: self.target_dead,
            detection_range: m.detection_range,
            attack_range: m.attack_range,
            min_combat_distance: m.min_combat_distance,
            optimal_combat_distance: m.optimal_combat_distance,
            retreat_distance: self.tuning.retreat.distance,
            patrol_index: self.patrol.as_ref().map(PatrolController::current_index),
            evaluations: self.evaluations,
        }
    }

    // ------------------------------------------------------------------------
    // Debug operations
    // ------------------------------------------------------------------------

    /// Starts a retreat regardless of chance and cooldown.
    pub fn force_retreat(&mut self) {
        if self.is_dead() || self.retreating {
            return;
        }
        self.start_retreat();
    }

    /// Ends a retreat in progress.
    pub fn cancel_retreat(&mut self) {
        self.retreating = false;
    }

    /// Flips the circling direction.
    pub fn toggle_circle_direction(&mut self) {
        self.clockwise = !self.clockwise;
        self.last_direction_change = self.clock;
    }

    // ------------------------------------------------------------------------
    // Variable-rate tick
    // ------------------------------------------------------------------------

    /// Decision tick. Pass `None` when there is no target to fight.
    pub fn update(&mut self, dt: f32, mut target: Option<&mut dyn CombatTarget>) {
        if self.lifecycle != Lifecycle::Alive {
            self.advance_cleanup(dt);
            return;
        }

        self.clock += dt;

        if self.attack_timer > 0.0 {
            self.attack_timer -= dt;
        }

        let snapshot = target.as_deref().map(|t| (t.position(), t.is_dead()));
        self.observe_target(snapshot);

        self.advance_hurt(dt);
        let reborrowed = target.as_deref_mut().map(|t| t as &mut dyn CombatTarget);
        self.advance_attack(dt, reborrowed);

        if !self.is_interrupted() {
            let target_position = snapshot.map(|(position, _)| position);
            self.update_state(target_position);
            self.execute_state(target_position);
            self.evaluations += 1;
        }

        self.tick_patrol(dt);
        self.push_presentation();
    }

    fn observe_target(&mut self, snapshot: Option<(Vec2, bool)>) {
        match snapshot {
            Some((_, true)) if !self.target_dead => self.on_target_death(),
            Some((_, false)) if self.target_dead => {
                self.target_dead = false;
                debug!("{} sees target revived, resuming combat", self.id);
            },
            Some(_) => {},
            None => {
                if !self.warned_no_target {
                    warn!("{} has no target, staying out of combat", self.id);
                    self.warned_no_target = true;
                }
            },
        }
    }

    fn on_target_death(&mut self) {
        self.target_dead = true;
        self.retreating = false;

        if self.attack.take().is_some() {
            if let Some(presenter) = self.presenter.as_mut() {
                presenter.set_attacking(false);
            }
        }

        self.attack_timer = self.tuning.movement.attack_cooldown;
        if let Some(patrol) = self.patrol.as_mut() {
            patrol.resume();
        }
        self.state = self.fallback_state();

        debug!("{} notified of target death, switching to {}", self.id, self.state.display_name());
    }

    fn advance_hurt(&mut self, dt: f32) {
        if let Some(recovery) = self.hurt.as_mut() {
            recovery.elapsed += dt;
            if recovery.elapsed >= HURT_CLEAR {
                self.hurt = None;
            }
        }
    }

    fn advance_attack(&mut self, dt: f32, target: Option<&mut dyn CombatTarget>) {
        let Some(phase) = self.attack else {
            return;
        };

        match phase {
            AttackPhase::WindUp { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.attack = Some(AttackPhase::WindUp { remaining });
                    return;
                }

                if self.target_dead {
                    self.end_attack();
                    return;
                }

                self.strike(target);
                self.attack = Some(AttackPhase::FollowThrough {
                    remaining: self.tuning.movement.attack_duration * FOLLOW_THROUGH_FRACTION,
                });
            },
            AttackPhase::FollowThrough { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.attack = Some(AttackPhase::FollowThrough { remaining });
                } else {
                    self.end_attack();
                    self.attack_timer = self.tuning.movement.attack_cooldown;
                }
            },
        }
    }

    fn strike(&mut self, target: Option<&mut dyn CombatTarget>) {
        let Some(target) = target else {
            return;
        };
        if target.is_dead() {
            return;
        }

        let position = self.body.position();
        let target_position = target.position();
        let reach = self.tuning.movement.attack_range + ATTACK_REACH_SLACK;
        if position.distance(target_position) >= reach || !target.can_take_damage() {
            return;
        }

        let direction = (target_position - position).normalize_or_zero();
        target.take_damage(self.combatant.attack_damage(), direction);
        self.body.apply_impulse(
            -direction,
            self.tuning.movement.knockback_force * SELF_KNOCKBACK_SCALE,
        );
    }

    fn end_attack(&mut self) {
        self.attack = None;
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.set_attacking(false);
        }
    }

    fn fallback_state(&self) -> EnemyState {
        if self.patrol.is_some() {
            EnemyState::Patrol
        } else {
            EnemyState::Idle
        }
    }

    fn update_state(&mut self, target_position: Option<Vec2>) {
        let m = self.tuning.movement;

        let Some(target_position) = target_position.filter(|_| !self.target_dead) else {
            self.state = self.fallback_state();
            self.retreating = false;
            return;
        };

        let distance = self.body.position().distance(target_position);
        self.state = if distance > m.detection_range {
            self.retreating = false;
            self.fallback_state()
        } else if distance > m.attack_range {
            if self.retreating {
                EnemyState::Retreat
            } else {
                EnemyState::Approach
            }
        } else if distance < m.min_combat_distance {
            self.retreat_or_circle()
        } else if self.attack_timer <= 0.0 {
            EnemyState::Attack
        } else {
            self.retreat_or_circle()
        };
    }

    fn retreat_or_circle(&mut self) -> EnemyState {
        if self.should_retreat() {
            EnemyState::Retreat
        } else {
            EnemyState::Circle
        }
    }

    /// Rolls for a retreat. Starts one on success.
    pub(crate) fn should_retreat(&mut self) -> bool {
        let retreat = self.tuning.retreat;
        if !retreat.enabled || self.retreating {
            return false;
        }
        if let Some(last) = self.last_retreat_at {
            if self.clock - last < retreat.cooldown {
                return false;
            }
        }
        if self.rng.value() < retreat.chance {
            self.start_retreat();
            return true;
        }
        false
    }

    fn start_retreat(&mut self) {
        self.retreating = true;
        self.last_retreat_at = Some(self.clock);
        self.retreat_start = self.body.position();
        debug!("{} starting retreat at {:?}", self.id, self.retreat_start);
    }

    fn execute_state(&mut self, target_position: Option<Vec2>) {
        let position = self.body.position();
        let live_target = target_position.filter(|_| !self.target_dead);

        match self.state {
            EnemyState::Idle | EnemyState::Patrol => self.set_movement(Vec2::ZERO),
            EnemyState::Approach => {
                if let Some(target) = live_target {
                    self.set_movement(target - position);
                }
            },
            EnemyState::Attack => {
                self.set_movement(Vec2::ZERO);
                if !self.is_attacking() && self.attack_timer <= 0.0 && !self.target_dead {
                    self.start_attack();
                }
            },
            EnemyState::Circle => {
                if let Some(target) = live_target {
                    let to_target = (target - position).normalize_or_zero();
                    let mut perpendicular = Vec2::new(-to_target.y, to_target.x);
                    if !self.clockwise {
                        perpendicular = -perpendicular;
                    }

                    let circle = self.tuning.circle;
                    if circle.random_direction
                        && self.clock - self.last_direction_change > circle.min_circle_time
                        && self.rng.value() < circle.direction_change_chance
                    {
                        self.clockwise = !self.clockwise;
                        self.last_direction_change = self.clock;
                    }

                    self.set_movement(perpendicular);
                }
            },
            EnemyState::Retreat => {
                if let Some(target) = live_target {
                    if position.distance(target) >= self.tuning.retreat.distance {
                        self.retreating = false;
                        debug!("{} finished retreat, returning to combat", self.id);
                    } else {
                        let away = (position - target).normalize_or_zero();
                        let jitter = self
                            .rng
                            .range(-RETREAT_JITTER_DEGREES, RETREAT_JITTER_DEGREES)
                            .to_radians();
                        self.set_movement(Vec2::from_angle(jitter).rotate(away));
                    }
                }
            },
        }
    }

    fn start_attack(&mut self) {
        self.attack = Some(AttackPhase::WindUp {
            remaining: self.tuning.movement.attack_duration * WIND_UP_FRACTION,
        });
        self.moving = false;
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.set_attacking(true);
            presenter.trigger(AnimationCue::AttackStart);
        }
    }

    fn set_movement(&mut self, direction: Vec2) {
        self.movement = direction.normalize_or_zero();
        self.moving = self.movement.length_squared() > MOVING_THRESHOLD_SQ;
    }

    fn tick_patrol(&mut self, dt: f32) {
        let position = self.body.position();
        let patrolling = self.state == EnemyState::Patrol;
        let interrupted = self.is_interrupted();
        let wanted = self
            .patrol
            .as_mut()
            .and_then(|patrol| patrol.tick(dt, position, patrolling, interrupted));
        if let Some(direction) = wanted {
            self.set_movement(direction);
        }
    }

    fn push_presentation(&mut self) {
        match self.presenter.as_mut() {
            Some(presenter) => {
                if self.movement != Vec2::ZERO {
                    presenter.set_facing(self.movement);
                }
                presenter.set_walking(self.moving);
                presenter.set_attacking(self.attack.is_some());
            },
            None => {
                if !self.warned_no_presenter {
                    warn!("{} has no presenter, animation signals are dropped", self.id);
                    self.warned_no_presenter = true;
                }
            },
        }
    }

    fn advance_cleanup(&mut self, dt: f32) {
        if let Lifecycle::Dying { remaining } = self.lifecycle {
            let remaining = remaining - dt;
            if remaining > 0.0 {
                self.lifecycle = Lifecycle::Dying { remaining };
                return;
            }

            self.lifecycle = Lifecycle::Removed;
            self.emit(EnemyEvent::Removed {
                enemy_id: self.id,
                origin: self.origin,
                position: self.body.position(),
            });
            debug!("{} removed", self.id);
        }
    }

    // ------------------------------------------------------------------------
    // Physics tick
    // ------------------------------------------------------------------------

    /// Physics tick: turns the movement direction into motion.
    pub fn fixed_update(&mut self, dt: f32) {
        match self.lifecycle {
            Lifecycle::Removed => return,
            Lifecycle::Dying { .. } => {
                self.body.step(dt);
                return;
            },
            Lifecycle::Alive => {},
        }

        if self.is_knocked_back() {
            self.body.step(dt);
            return;
        }

        if self.is_hurt() {
            let velocity = self.body.velocity();
            self.body.set_velocity(velocity * HURT_VELOCITY_SCALE);
        } else if self.is_attacking() {
            let velocity = self.body.velocity();
            self.body.set_velocity(velocity * ATTACK_VELOCITY_SCALE);
        } else if self.moving && self.movement != Vec2::ZERO {
            let mut speed = self.tuning.movement.move_speed;
            if self.state == EnemyState::Retreat {
                speed *= self.tuning.retreat.speed_multiplier;
            }
            let next = self.body.position() + self.movement * speed * dt;
            self.body.move_position(next);
        }

        self.body.step(dt);
    }

    // ------------------------------------------------------------------------
    // Damage
    // ------------------------------------------------------------------------

    /// Deals damage with a knockback direction.
    ///
    /// Ignored while dead or still recovering from the previous hit.
    pub fn take_damage(&mut self, amount: i32, direction: Vec2) -> DamageOutcome {
        if self.is_dead() || self.is_hurt() {
            return DamageOutcome::Ignored;
        }

        let outcome = self.combatant.take_damage(amount);
        match outcome {
            DamageOutcome::Killed => self.die(direction),
            DamageOutcome::Hurt { .. } => self.start_hurt(direction),
            DamageOutcome::Ignored => {},
        }
        outcome
    }

    fn start_hurt(&mut self, direction: Vec2) {
        self.hurt = Some(HurtRecovery { elapsed: 0.0 });
        self.retreating = false;
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.trigger(AnimationCue::Hurt);
        }
        self.set_movement(Vec2::ZERO);
        self.body.set_velocity(Vec2::ZERO);
        self.body
            .apply_impulse(direction, self.tuning.movement.knockback_force);
    }

    fn die(&mut self, direction: Vec2) {
        if let Some(patrol) = self.patrol.as_mut() {
            patrol.stop();
        }

        self.retreating = false;
        self.attack = None;
        self.hurt = None;
        self.set_movement(Vec2::ZERO);

        if let Some(presenter) = self.presenter.as_mut() {
            presenter.set_attacking(false);
            presenter.set_walking(false);
            presenter.trigger(AnimationCue::Dead);
        }

        self.body.set_velocity(Vec2::ZERO);
        self.body
            .apply_impulse(direction, self.tuning.movement.knockback_force);

        let position = self.body.position();
        for item in self.drops.resolve(position, &mut self.rng) {
            self.emit(EnemyEvent::ItemDropped {
                enemy_id: self.id,
                item,
            });
        }

        self.body.set_collision_enabled(false);
        self.lifecycle = Lifecycle::Dying {
            remaining: DEATH_CLEANUP,
        };
        self.emit(EnemyEvent::Died {
            enemy_id: self.id,
            position,
        });
        debug!("{} died at {:?}", self.id, position);
    }

    fn emit(&self, event: EnemyEvent) {
        if self.events.try_send(event).is_err() {
            warn!("{} could not publish event, bus full or closed", self.id);
        }
    }
}

impl CombatTarget for EnemyController {
    fn position(&self) -> Vec2 {
        self.body.position()
    }

    fn is_dead(&self) -> bool {
        self.combatant.is_dead()
    }

    fn can_take_damage(&self) -> bool {
        !self.is_dead() && !self.is_hurt()
    }

    fn take_damage(&mut self, amount: i32, direction: Vec2) {
        EnemyController::take_damage(self, amount, direction);
    }
}
