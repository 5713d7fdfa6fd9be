//! Scripted player for the headless arena.
//!
//! The player walks toward the nearest living enemy and swings at it on a
//! cooldown. Hits against the player open a short invincibility window,
//! and after dying the player restarts at its spawn once the restart delay
//! runs out.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_gameplay::{CombatTarget, Combatant, DamageOutcome, EnemyController};
use tracing::{debug, info};

/// Seconds of knockback after a hit.
pub const KNOCKBACK_DURATION: f32 = 0.2;
/// Seconds the player is hurt (no attacking or steering) after a hit.
pub const HURT_DURATION: f32 = 0.5;
/// Seconds of invincibility after a hit.
pub const INVINCIBILITY_DURATION: f32 = 0.8;

/// Player tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Spawn and restart position
    pub spawn: Vec2,
    /// Maximum health
    pub max_health: i32,
    /// Damage per swing
    pub attack_damage: i32,
    /// Swing reach
    pub attack_range: f32,
    /// Seconds between swings
    pub attack_cooldown: f32,
    /// Walking speed
    pub move_speed: f32,
    /// Knockback speed applied when hit
    pub knockback_force: f32,
    /// Seconds dead before restarting
    pub restart_delay: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: Vec2::ZERO,
            max_health: 100,
            attack_damage: 25,
            attack_range: 1.5,
            attack_cooldown: 0.6,
            move_speed: 3.0,
            knockback_force: 5.0,
            restart_delay: 3.0,
        }
    }
}

/// What the player did during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerTick {
    /// Swings that landed
    pub hits: u32,
    /// Enemies killed
    pub kills: u32,
    /// Whether the player restarted this tick
    pub restarted: bool,
}

/// The arena's player.
#[derive(Debug, Clone)]
pub struct Player {
    config: PlayerConfig,
    combatant: Combatant,
    position: Vec2,
    knockback: Vec2,
    since_hit: Option<f32>,
    attack_timer: f32,
    dead_for: f32,
    hits_taken: u32,
    deaths: u32,
}

impl Player {
    /// Creates a player at its spawn position.
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            combatant: Combatant::new(config.max_health, config.attack_damage),
            position: config.spawn,
            knockback: Vec2::ZERO,
            since_hit: None,
            attack_timer: 0.0,
            dead_for: 0.0,
            hits_taken: 0,
            deaths: 0,
            config,
        }
    }

    /// Health and death state.
    #[must_use]
    pub const fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    /// Hits received so far.
    #[must_use]
    pub const fn hits_taken(&self) -> u32 {
        self.hits_taken
    }

    /// Deaths so far.
    #[must_use]
    pub const fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Whether the player is still being pushed back by a hit.
    #[must_use]
    pub fn is_knocked_back(&self) -> bool {
        self.since_hit.is_some_and(|t| t < KNOCKBACK_DURATION)
    }

    /// Whether the player is still recovering from a hit.
    #[must_use]
    pub fn is_hurt(&self) -> bool {
        self.since_hit.is_some_and(|t| t < HURT_DURATION)
    }

    /// Restores full health at the spawn position.
    pub fn reset(&mut self) {
        self.combatant.reset();
        self.position = self.config.spawn;
        self.knockback = Vec2::ZERO;
        self.since_hit = None;
        self.attack_timer = 0.0;
        self.dead_for = 0.0;
        info!("Player restarted at {:?}", self.position);
    }

    /// Advances the player one frame against the current enemies.
    pub fn update(&mut self, dt: f32, enemies: &mut [EnemyController]) -> PlayerTick {
        let mut tick = PlayerTick::default();

        if self.combatant.is_dead() {
            self.dead_for += dt;
            if self.dead_for >= self.config.restart_delay {
                self.reset();
                tick.restarted = true;
            }
            return tick;
        }

        self.advance_hit_windows(dt);
        if self.attack_timer > 0.0 {
            self.attack_timer -= dt;
        }

        if self.is_knocked_back() {
            self.position += self.knockback * dt;
            return tick;
        }
        if self.is_hurt() {
            return tick;
        }

        let position = self.position;
        let Some(enemy) = enemies
            .iter_mut()
            .filter(|e| !e.is_dead())
            .min_by(|a, b| {
                a.position()
                    .distance_squared(position)
                    .total_cmp(&b.position().distance_squared(position))
            })
        else {
            return tick;
        };

        let offset = enemy.position() - position;
        let distance = offset.length();
        if distance > self.config.attack_range {
            self.position += offset / distance * self.config.move_speed * dt;
        } else if self.attack_timer <= 0.0 {
            self.attack_timer = self.config.attack_cooldown;
            match enemy.take_damage(self.combatant.attack_damage(), offset.normalize_or_zero()) {
                DamageOutcome::Killed => {
                    tick.hits += 1;
                    tick.kills += 1;
                    debug!("Player killed {}", enemy.id());
                },
                DamageOutcome::Hurt { .. } => tick.hits += 1,
                DamageOutcome::Ignored => {},
            }
        }

        tick
    }

    fn advance_hit_windows(&mut self, dt: f32) {
        if let Some(elapsed) = self.since_hit.as_mut() {
            *elapsed += dt;
            if *elapsed >= INVINCIBILITY_DURATION {
                self.since_hit = None;
                self.combatant.set_invincible(false);
            }
        }
    }
}

impl CombatTarget for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_dead(&self) -> bool {
        self.combatant.is_dead()
    }

    fn can_take_damage(&self) -> bool {
        self.combatant.can_take_damage()
    }

    fn take_damage(&mut self, amount: i32, direction: Vec2) {
        if !self.combatant.can_take_damage() {
            return;
        }

        match self.combatant.take_damage(amount) {
            DamageOutcome::Hurt { remaining } => {
                self.hits_taken += 1;
                self.since_hit = Some(0.0);
                self.knockback = direction.normalize_or_zero() * self.config.knockback_force;
                self.combatant.set_invincible(true);
                debug!("Player hit for {amount}, {remaining} health left");
            },
            DamageOutcome::Killed => {
                self.hits_taken += 1;
                self.deaths += 1;
                self.since_hit = None;
                self.knockback = Vec2::ZERO;
                info!("Player died");
            },
            DamageOutcome::Ignored => {},
        }
    }
}
