//! Spawn point registry.
//!
//! Two mutually exclusive sources feed the registry:
//! - spawn points that carry their own capacity and respawn policy
//! - manual anchors that share one capacity and the spawner's default
//!   respawn policy
//!
//! Each entry keeps its scan index as its identity so respawn requests can
//! find their way back to it.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::SpawnPointId;
use tracing::debug;

use crate::rng::SimRng;

/// Smallest respawn delay ever scheduled, in seconds.
pub const MIN_RESPAWN_DELAY: f32 = 0.1;

/// Radius of the random offset applied around an anchor.
pub const ANCHOR_SAMPLE_RADIUS: f32 = 0.5;

/// Delay policy for respawning at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnPolicy {
    /// Base delay in seconds
    pub delay: f32,
    /// Random variation (plus or minus seconds)
    pub variation: f32,
    /// Whether respawning happens at all
    pub enabled: bool,
}

impl Default for RespawnPolicy {
    fn default() -> Self {
        Self {
            delay: 5.0,
            variation: 2.0,
            enabled: true,
        }
    }
}

impl RespawnPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(delay: f32, variation: f32) -> Self {
        Self {
            delay: delay.max(MIN_RESPAWN_DELAY),
            variation: variation.max(0.0),
            enabled: true,
        }
    }

    /// Draws a concrete delay: `delay ± variation`, never below the minimum.
    pub fn roll_delay(&self, rng: &mut SimRng) -> f32 {
        let jitter = rng.range(-self.variation, self.variation);
        (self.delay + jitter).max(MIN_RESPAWN_DELAY)
    }
}

/// A configured spawn point with its own capacity and respawn policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPoint {
    /// Human-readable name
    pub name: String,
    /// Anchor position
    pub position: Vec2,
    /// Maximum concurrent enemies from this point
    pub max_enemies: u32,
    /// Disabled points are skipped at registration
    pub enabled: bool,
    /// Respawn policy for enemies that originated here
    pub respawn: RespawnPolicy,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            name: String::from("SpawnPoint"),
            position: Vec2::ZERO,
            max_enemies: 3,
            enabled: true,
            respawn: RespawnPolicy::default(),
        }
    }
}

impl SpawnPoint {
    /// Creates an enabled spawn point with default policy.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self {
            name: name.into(),
            position,
            ..Default::default()
        }
    }

    /// Sets capacity.
    #[must_use]
    pub fn with_max_enemies(mut self, max: u32) -> Self {
        self.max_enemies = max;
        self
    }

    /// Sets respawn policy.
    #[must_use]
    pub fn with_respawn(mut self, respawn: RespawnPolicy) -> Self {
        self.respawn = respawn;
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A bare anchor position used in manual mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualAnchor {
    /// Human-readable name
    pub name: String,
    /// Anchor position
    pub position: Vec2,
}

impl ManualAnchor {
    /// Creates an anchor.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Which source the registry was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnMode {
    /// Spawn points with individual policies
    #[default]
    Points,
    /// Manual anchors using spawner defaults
    Manual,
}

/// Runtime view of one registered spawn location.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnDescriptor {
    id: SpawnPointId,
    name: String,
    anchor: Vec2,
    capacity: u32,
    enabled: bool,
    /// `None` means the spawner's default policy applies
    respawn: Option<RespawnPolicy>,
}

impl SpawnDescriptor {
    /// Identity (scan index).
    #[must_use]
    pub const fn id(&self) -> SpawnPointId {
        self.id
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Anchor position.
    #[must_use]
    pub const fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Maximum concurrent enemies.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether spawning is enabled here.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this entry carries its own respawn policy.
    #[must_use]
    pub const fn has_own_policy(&self) -> bool {
        self.respawn.is_some()
    }

    /// Own respawn policy, if any.
    #[must_use]
    pub const fn respawn_policy(&self) -> Option<RespawnPolicy> {
        self.respawn
    }

    /// Whether enemies from here respawn. Entries without their own
    /// policy defer to the spawner's global switch.
    #[must_use]
    pub fn is_respawning_enabled(&self) -> bool {
        self.respawn.map_or(true, |p| p.enabled)
    }

    /// Whether another enemy may be placed given the current live count.
    #[must_use]
    pub const fn has_room(&self, live: u32) -> bool {
        self.enabled && live < self.capacity
    }

    /// Picks a spawn position near the anchor.
    pub fn sample_position(&self, rng: &mut SimRng) -> Vec2 {
        self.anchor + rng.inside_unit_circle() * ANCHOR_SAMPLE_RADIUS
    }

    /// Rolls a respawn delay, falling back to `defaults` without an own policy.
    pub fn roll_respawn_delay(&self, defaults: &RespawnPolicy, rng: &mut SimRng) -> f32 {
        match self.respawn {
            Some(policy) if policy.enabled => policy.roll_delay(rng),
            _ => defaults.roll_delay(rng),
        }
    }

    /// Sets capacity.
    pub fn set_max_enemies(&mut self, max: u32) {
        self.capacity = max;
    }

    /// Enables or disables spawning here.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the base respawn delay (clamped to the minimum).
    pub fn set_respawn_delay(&mut self, delay: f32) {
        if let Some(policy) = self.respawn.as_mut() {
            policy.delay = delay.max(MIN_RESPAWN_DELAY);
        }
    }

    /// Sets the respawn variation (clamped to zero).
    pub fn set_respawn_variation(&mut self, variation: f32) {
        if let Some(policy) = self.respawn.as_mut() {
            policy.variation = variation.max(0.0);
        }
    }

    /// Enables or disables respawning for enemies from here.
    pub fn set_respawning_enabled(&mut self, enabled: bool) {
        if let Some(policy) = self.respawn.as_mut() {
            policy.enabled = enabled;
        }
    }
}

/// Ordered collection of spawn locations.
#[derive(Debug, Clone, Default)]
pub struct SpawnRegistry {
    mode: SpawnMode,
    entries: Vec<SpawnDescriptor>,
}

impl SpawnRegistry {
    /// Creates an empty registry (the spawner falls back to random placement).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers every enabled spawn point, keeping its scan index as identity.
    #[must_use]
    pub fn from_spawn_points(points: &[SpawnPoint]) -> Self {
        let entries: Vec<SpawnDescriptor> = points
            .iter()
            .enumerate()
            .filter(|(_, point)| point.enabled)
            .map(|(index, point)| SpawnDescriptor {
                id: SpawnPointId::new(index as u32),
                name: point.name.clone(),
                anchor: point.position,
                capacity: point.max_enemies,
                enabled: true,
                respawn: Some(RespawnPolicy {
                    delay: point.respawn.delay.max(MIN_RESPAWN_DELAY),
                    variation: point.respawn.variation.max(0.0),
                    enabled: point.respawn.enabled,
                }),
            })
            .collect();

        debug!("Registered {} spawn points", entries.len());
        Self {
            mode: SpawnMode::Points,
            entries,
        }
    }

    /// Registers manual anchors, each holding `per_point` enemies.
    #[must_use]
    pub fn from_manual(anchors: &[ManualAnchor], per_point: u32) -> Self {
        let entries: Vec<SpawnDescriptor> = anchors
            .iter()
            .enumerate()
            .map(|(index, anchor)| SpawnDescriptor {
                id: SpawnPointId::new(index as u32),
                name: anchor.name.clone(),
                anchor: anchor.position,
                capacity: per_point,
                enabled: true,
                respawn: None,
            })
            .collect();

        debug!("Registered {} manual anchors", entries.len());
        Self {
            mode: SpawnMode::Manual,
            entries,
        }
    }

    /// Source mode.
    #[must_use]
    pub const fn mode(&self) -> SpawnMode {
        self.mode
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by identity.
    #[must_use]
    pub fn get(&self, id: SpawnPointId) -> Option<&SpawnDescriptor> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Mutable lookup for the explicit runtime setters.
    pub fn get_mut(&mut self, id: SpawnPointId) -> Option<&mut SpawnDescriptor> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnDescriptor> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_roll_clamped() {
        let policy = RespawnPolicy {
            delay: 0.0,
            variation: 0.0,
            enabled: true,
        };
        let mut rng = SimRng::new(1);
        assert_eq!(policy.roll_delay(&mut rng), MIN_RESPAWN_DELAY);
    }

    #[test]
    fn test_policy_roll_within_variation() {
        let policy = RespawnPolicy::new(5.0, 2.0);
        let mut rng = SimRng::new(2);
        for _ in 0..200 {
            let d = policy.roll_delay(&mut rng);
            assert!((3.0..=7.0).contains(&d));
        }
    }

    #[test]
    fn test_registry_skips_disabled_but_keeps_scan_index() {
        let points = vec![
            SpawnPoint::new("A", Vec2::ZERO),
            SpawnPoint::new("B", Vec2::X).with_enabled(false),
            SpawnPoint::new("C", Vec2::Y),
        ];
        let registry = SpawnRegistry::from_spawn_points(&points);

        assert_eq!(registry.len(), 2);
        assert!(registry.get(SpawnPointId::new(1)).is_none());
        let c = registry.get(SpawnPointId::new(2)).expect("C registered");
        assert_eq!(c.name(), "C");
        assert!(c.has_own_policy());
    }

    #[test]
    fn test_manual_registry_defers_policy() {
        let anchors = vec![ManualAnchor::new("North", Vec2::new(0.0, 10.0))];
        let registry = SpawnRegistry::from_manual(&anchors, 2);
        let entry = registry.get(SpawnPointId::new(0)).expect("registered");

        assert_eq!(registry.mode(), SpawnMode::Manual);
        assert_eq!(entry.capacity(), 2);
        assert!(!entry.has_own_policy());
        assert!(entry.is_respawning_enabled());

        let defaults = RespawnPolicy::new(1.0, 0.0);
        let mut rng = SimRng::new(3);
        assert_eq!(entry.roll_respawn_delay(&defaults, &mut rng), 1.0);
    }

    #[test]
    fn test_zero_capacity_never_has_room() {
        let points = vec![SpawnPoint::new("Empty", Vec2::ZERO).with_max_enemies(0)];
        let registry = SpawnRegistry::from_spawn_points(&points);
        let entry = registry.get(SpawnPointId::new(0)).expect("registered");
        assert!(!entry.has_room(0));
    }

    #[test]
    fn test_sample_position_near_anchor() {
        let points = vec![SpawnPoint::new("A", Vec2::new(10.0, -4.0))];
        let registry = SpawnRegistry::from_spawn_points(&points);
        let entry = registry.get(SpawnPointId::new(0)).expect("registered");
        let mut rng = SimRng::new(4);
        for _ in 0..100 {
            let pos = entry.sample_position(&mut rng);
            assert!(pos.distance(entry.anchor()) <= ANCHOR_SAMPLE_RADIUS + 1e-4);
        }
    }

    #[test]
    fn test_runtime_setters_clamp() {
        let points = vec![SpawnPoint::new("A", Vec2::ZERO)];
        let mut registry = SpawnRegistry::from_spawn_points(&points);
        let entry = registry.get_mut(SpawnPointId::new(0)).expect("registered");

        entry.set_respawn_delay(-3.0);
        entry.set_respawn_variation(-1.0);
        entry.set_respawning_enabled(false);

        let policy = entry.respawn_policy().expect("own policy");
        assert_eq!(policy.delay, MIN_RESPAWN_DELAY);
        assert_eq!(policy.variation, 0.0);
        assert!(!entry.is_respawning_enabled());
    }
}
