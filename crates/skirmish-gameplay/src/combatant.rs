//! Shared health and damage contract for players and enemies.
//!
//! [`Combatant`] owns the numbers; [`CombatTarget`] is the narrow view an
//! enemy has of whatever it is fighting.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Result of routing damage through [`Combatant::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Damage was rejected (already dead or invincible)
    Ignored,
    /// Damage applied, entity still alive
    Hurt {
        /// Health remaining after the hit
        remaining: i32,
    },
    /// This hit brought health to zero
    Killed,
}

/// Health and damage state shared by every fighting entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    max_health: i32,
    current_health: i32,
    attack_damage: i32,
    dead: bool,
    invincible: bool,
}

impl Combatant {
    /// Creates a combatant at full health.
    #[must_use]
    pub fn new(max_health: i32, attack_damage: i32) -> Self {
        let max_health = max_health.max(1);
        Self {
            max_health,
            current_health: max_health,
            attack_damage: attack_damage.max(0),
            dead: false,
            invincible: false,
        }
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Current health, always within `[0, max_health]`.
    #[must_use]
    pub const fn current_health(&self) -> i32 {
        self.current_health
    }

    /// Damage dealt per successful attack.
    #[must_use]
    pub const fn attack_damage(&self) -> i32 {
        self.attack_damage
    }

    /// Returns whether this combatant has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Returns whether hits are currently ignored.
    #[must_use]
    pub const fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Returns whether a hit would currently land.
    #[must_use]
    pub const fn can_take_damage(&self) -> bool {
        !self.dead && !self.invincible
    }

    /// Toggles the invincibility window.
    pub fn set_invincible(&mut self, invincible: bool) {
        self.invincible = invincible;
    }

    /// Applies damage. The only way health goes down.
    ///
    /// Death is one-shot: once dead, every further call is ignored.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.can_take_damage() {
            return DamageOutcome::Ignored;
        }

        self.current_health = (self.current_health - amount.max(0)).clamp(0, self.max_health);
        if self.current_health == 0 {
            self.dead = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt {
                remaining: self.current_health,
            }
        }
    }

    /// Restores full health and clears death and invincibility.
    pub fn reset(&mut self) {
        self.current_health = self.max_health;
        self.dead = false;
        self.invincible = false;
    }
}

/// What an enemy can see of and do to its target.
///
/// Enemies only read `position`/`is_dead` and call `take_damage`.
pub trait CombatTarget {
    /// Current world position.
    fn position(&self) -> Vec2;

    /// Whether the target has died.
    fn is_dead(&self) -> bool;

    /// Whether a hit would currently land (alive and not invincible).
    fn can_take_damage(&self) -> bool;

    /// Deals damage with a knockback direction.
    fn take_damage(&mut self, amount: i32, direction: Vec2);
}

/// Scriptable target for tests and tooling.
#[derive(Debug, Clone)]
pub struct MockTarget {
    /// Current position
    pub position: Vec2,
    /// Health and death state
    pub combatant: Combatant,
    /// Every hit received, in order
    pub hits: Vec<(i32, Vec2)>,
}

impl MockTarget {
    /// Creates a mock target at a position.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            combatant: Combatant::new(100, 0),
            hits: Vec::new(),
        }
    }

    /// Sets health.
    #[must_use]
    pub fn with_health(mut self, health: i32) -> Self {
        self.combatant = Combatant::new(health, 0);
        self
    }

    /// Kills the target outright.
    pub fn kill(&mut self) {
        let health = self.combatant.current_health();
        self.combatant.set_invincible(false);
        self.combatant.take_damage(health);
    }

    /// Total damage received so far.
    #[must_use]
    pub fn damage_taken(&self) -> i32 {
        self.hits.iter().map(|(amount, _)| amount).sum()
    }
}

impl CombatTarget for MockTarget {
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
        if self.combatant.take_damage(amount) != DamageOutcome::Ignored {
            self.hits.push((amount, direction));
        }
    }
}
