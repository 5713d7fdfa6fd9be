//! Enemy spawner and respawn coordinator.
//!
//! The spawner owns every live enemy and is the only writer of its own
//! bookkeeping (live list, per-point counts, respawn queue). Enemies report
//! back through the event bus, which the spawner drains on its own tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{EnemyId, SpawnPointId};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{EnemyBackend, ObstacleQuery};
use crate::combatant::CombatTarget;
use crate::config::SpawnerConfig;
use crate::drops::DroppedItem;
use crate::enemy::EnemyController;
use crate::events::{EnemyEvent, EventBus};
use crate::patrol::PatrolController;
use crate::rng::SimRng;
use crate::spawn_point::{RespawnPolicy, SpawnMode, SpawnRegistry, MIN_RESPAWN_DELAY};

/// Placement retries after the first candidate is rejected.
pub const SPAWN_RETRIES: u32 = 5;
/// Jitter radius reached on the last placement retry.
pub const SPAWN_JITTER_RADIUS: f32 = 1.5;
/// Attempts at finding a random fallback position.
pub const RANDOM_PLACEMENT_ATTEMPTS: u32 = 30;
/// Closest distance to the origin for random fallback placement.
pub const RANDOM_PLACEMENT_MIN_DISTANCE: f32 = 2.0;

const EVENT_BUS_CAPACITY: usize = 4096;

/// Errors from explicit spawn requests.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// No registered spawn point has this identity.
    #[error("Unknown spawn point: {0}")]
    UnknownSpawnPoint(SpawnPointId),

    /// Every placement candidate was rejected.
    #[error("No valid spawn position near {label}")]
    NoValidPosition {
        /// Where the spawn was attempted
        label: String,
    },

    /// The spawn point is disabled or full.
    #[error("Spawn point {0} has no free capacity")]
    CapacityExhausted(SpawnPointId),
}

/// Result type for spawn operations.
pub type SpawnResult<T> = Result<T, SpawnError>;

/// A pending respawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RespawnRequest {
    /// Where the enemy originally spawned
    pub position: Vec2,
    /// Spawn point to respawn at
    pub origin: SpawnPointId,
    /// Spawner clock time at which the request becomes eligible
    pub ready_at: f32,
}

/// Per-point status for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPointStatus {
    /// Identity
    pub id: SpawnPointId,
    /// Name
    pub name: String,
    /// Live enemies from this point
    pub live: u32,
    /// Capacity
    pub capacity: u32,
    /// Spawning enabled
    pub enabled: bool,
    /// Own respawn policy (`None` uses the spawner default)
    pub respawn: Option<RespawnPolicy>,
}

/// Read-only snapshot of the spawner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerDiagnostics {
    /// Registry source
    pub mode: SpawnMode,
    /// Enemies in the live list (dying ones included)
    pub active: usize,
    /// Queued respawns
    pub pending: usize,
    /// Global respawn switch
    pub global_respawning: bool,
    /// Default respawn policy
    pub default_respawn: RespawnPolicy,
    /// Spawner clock
    pub clock: f32,
    /// Per-point status in registry order
    pub points: Vec<SpawnPointStatus>,
}

/// Owns the enemy population and services the respawn queue.
pub struct EnemySpawner {
    config: SpawnerConfig,
    registry: SpawnRegistry,
    enemies: Vec<EnemyController>,
    homes: HashMap<EnemyId, Vec2>,
    live_counts: HashMap<SpawnPointId, u32>,
    queue: VecDeque<RespawnRequest>,
    bus: EventBus,
    backend: Box<dyn EnemyBackend>,
    obstacles: Box<dyn ObstacleQuery>,
    rng: SimRng,
    clock: f32,
    drain_accumulator: f32,
    next_id: u64,
    drops: Vec<DroppedItem>,
    player_position: Option<Vec2>,
}

impl std::fmt::Debug for EnemySpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnemySpawner")
            .field("mode", &self.registry.mode())
            .field("points", &self.registry.len())
            .field("active", &self.enemies.len())
            .field("pending", &self.queue.len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl EnemySpawner {
    /// Creates a spawner and registers spawn locations from `config`.
    #[must_use]
    pub fn new(
        config: SpawnerConfig,
        backend: Box<dyn EnemyBackend>,
        obstacles: Box<dyn ObstacleQuery>,
    ) -> Self {
        let config = config.validated();
        let registry = match config.mode {
            SpawnMode::Points => SpawnRegistry::from_spawn_points(&config.spawn_points),
            SpawnMode::Manual => {
                SpawnRegistry::from_manual(&config.manual_anchors, config.enemies_per_manual_point)
            },
        };
        Self::with_registry(config, registry, backend, obstacles)
    }

    /// Creates a spawner over an explicit registry.
    #[must_use]
    pub fn with_registry(
        config: SpawnerConfig,
        registry: SpawnRegistry,
        backend: Box<dyn EnemyBackend>,
        obstacles: Box<dyn ObstacleQuery>,
    ) -> Self {
        let config = config.validated();
        let live_counts = registry.iter().map(|d| (d.id(), 0)).collect();
        info!(
            "Spawner ready: {} {:?} locations, cap {}",
            registry.len(),
            registry.mode(),
            config.total_enemies
        );
        Self {
            rng: SimRng::new(config.seed),
            config,
            registry,
            enemies: Vec::new(),
            homes: HashMap::new(),
            live_counts,
            queue: VecDeque::new(),
            bus: EventBus::new(EVENT_BUS_CAPACITY),
            backend,
            obstacles,
            clock: 0.0,
            drain_accumulator: 0.0,
            next_id: 1,
            drops: Vec::new(),
            player_position: None,
        }
    }

    /// Runs the start-of-scene spawn if configured. Returns enemies spawned.
    pub fn start(&mut self) -> u32 {
        if self.config.spawn_all_at_start {
            self.spawn_all_now()
        } else {
            0
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Spawn registry.
    #[must_use]
    pub const fn registry(&self) -> &SpawnRegistry {
        &self.registry
    }

    /// Spawn registry, for the explicit spawn point setters.
    pub fn registry_mut(&mut self) -> &mut SpawnRegistry {
        &mut self.registry
    }

    /// Live enemies, dying ones included.
    #[must_use]
    pub fn enemies(&self) -> &[EnemyController] {
        &self.enemies
    }

    /// Live enemies, mutable (for whatever fights them).
    pub fn enemies_mut(&mut self) -> &mut [EnemyController] {
        &mut self.enemies
    }

    /// Looks up an enemy.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyController> {
        self.enemies.iter().find(|e| e.id() == id)
    }

    /// Looks up an enemy mutably.
    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut EnemyController> {
        self.enemies.iter_mut().find(|e| e.id() == id)
    }

    /// Number of enemies in the live list.
    #[must_use]
    pub fn active_enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Number of queued respawns.
    #[must_use]
    pub fn pending_respawn_count(&self) -> usize {
        self.queue.len()
    }

    /// Queued respawns in scan order.
    pub fn pending_requests(&self) -> impl Iterator<Item = &RespawnRequest> {
        self.queue.iter()
    }

    /// Live enemies that came from `id`.
    #[must_use]
    pub fn live_count(&self, id: SpawnPointId) -> u32 {
        self.live_counts.get(&id).copied().unwrap_or(0)
    }

    /// Spawner clock in seconds.
    #[must_use]
    pub const fn clock(&self) -> f32 {
        self.clock
    }

    /// Last known player position used for spawn validation.
    #[must_use]
    pub const fn player_position(&self) -> Option<Vec2> {
        self.player_position
    }

    /// Overrides the player position used for spawn validation.
    pub fn set_player_position(&mut self, position: Option<Vec2>) {
        self.player_position = position;
    }

    /// Snapshot for tooling.
    #[must_use]
    pub fn diagnostics(&self) -> SpawnerDiagnostics {
        SpawnerDiagnostics {
            mode: self.registry.mode(),
            active: self.enemies.len(),
            pending: self.queue.len(),
            global_respawning: self.config.global_respawning,
            default_respawn: self.config.default_respawn,
            clock: self.clock,
            points: self
                .registry
                .iter()
                .map(|d| SpawnPointStatus {
                    id: d.id(),
                    name: d.name().to_string(),
                    live: self.live_count(d.id()),
                    capacity: d.capacity(),
                    enabled: d.is_enabled(),
                    respawn: d.respawn_policy(),
                })
                .collect(),
        }
    }

    /// Takes every item dropped since the last call.
    pub fn drain_drops(&mut self) -> Vec<DroppedItem> {
        std::mem::take(&mut self.drops)
    }

    // ------------------------------------------------------------------------
    // Runtime controls
    // ------------------------------------------------------------------------

    /// Master respawn switch.
    pub fn set_global_respawning_enabled(&mut self, enabled: bool) {
        self.config.global_respawning = enabled;
        info!(
            "Global enemy respawning {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Sets the default respawn delay (clamped to the minimum).
    pub fn set_default_respawn_delay(&mut self, delay: f32) {
        self.config.default_respawn.delay = delay.max(MIN_RESPAWN_DELAY);
        info!(
            "Default respawn delay set to {} seconds",
            self.config.default_respawn.delay
        );
    }

    /// Despawns everything, resets per-point counts and empties the queue.
    pub fn clear_all_enemies(&mut self) {
        self.enemies.clear();
        self.homes.clear();
        for count in self.live_counts.values_mut() {
            *count = 0;
        }
        self.queue.clear();
        // events from despawned enemies must not touch the fresh counts
        let _ = self.bus.drain();
        info!("All enemies cleared");
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    /// Populates the arena up to the global cap. Returns enemies spawned.
    ///
    /// Registry entries are filled in order up to their capacity. With no
    /// registered entries, enemies are placed randomly around the origin.
    pub fn spawn_all_now(&mut self) -> u32 {
        let cap = self.config.total_enemies as usize;
        let mut spawned = 0;

        if self.registry.is_empty() {
            info!("No spawn points registered, spawning up to {cap} enemies randomly");
            for _ in 0..cap {
                if self.enemies.len() >= cap {
                    break;
                }
                let candidate = self.random_position();
                if self.spawn_at(candidate, None, "Random").is_ok() {
                    spawned += 1;
                }
            }
        } else {
            let ids: Vec<SpawnPointId> = self.registry.iter().map(|d| d.id()).collect();
            'points: for id in ids {
                loop {
                    if self.enemies.len() >= cap {
                        info!("Reached total enemy limit: {cap}");
                        break 'points;
                    }
                    match self.spawn_at_point(id) {
                        Ok(_) => spawned += 1,
                        Err(SpawnError::CapacityExhausted(_)) => break,
                        Err(e) => {
                            warn!("{e}");
                            break;
                        },
                    }
                }
            }
        }

        info!("Initial spawn complete: {spawned} enemies spawned");
        spawned
    }

    /// Spawns one enemy at a registered spawn point.
    pub fn spawn_at_point(&mut self, id: SpawnPointId) -> SpawnResult<EnemyId> {
        let live = self.live_count(id);
        let descriptor = self
            .registry
            .get(id)
            .ok_or(SpawnError::UnknownSpawnPoint(id))?;
        if !descriptor.has_room(live) {
            return Err(SpawnError::CapacityExhausted(id));
        }

        let candidate = descriptor.sample_position(&mut self.rng);
        let label = descriptor.name().to_string();
        self.spawn_at(candidate, Some(id), &label)
    }

    fn spawn_at(
        &mut self,
        candidate: Vec2,
        origin: Option<SpawnPointId>,
        label: &str,
    ) -> SpawnResult<EnemyId> {
        let Some(position) = self.find_valid_position(candidate) else {
            warn!("Could not find valid spawn position at {label}");
            return Err(SpawnError::NoValidPosition {
                label: label.to_string(),
            });
        };

        let id = EnemyId::from_raw(self.next_id);
        self.next_id += 1;

        let (health, damage) = self.roll_stats();
        let body = self.backend.create_body(position);
        let presenter = self.backend.create_presenter();
        let mut enemy = EnemyController::new(id, body, self.bus.sender(), self.rng.fork())
            .with_origin(origin)
            .with_presenter(presenter)
            .with_stats(health, damage)
            .with_tuning(self.config.enemy)
            .with_drops(self.config.drops.clone());

        let patrol = PatrolController::generate(
            position,
            self.config.enemy.movement.patrol_radius,
            &mut self.rng,
        );
        enemy.start_patrolling(patrol);

        self.enemies.push(enemy);
        self.homes.insert(id, position);
        if let Some(origin) = origin {
            *self.live_counts.entry(origin).or_insert(0) += 1;
        }

        debug!("Spawned {id} at {label} ({health} hp, {damage} dmg)");
        Ok(id)
    }

    fn roll_stats(&mut self) -> (i32, i32) {
        let stats = self.config.stats;
        if stats.randomize {
            (
                self.rng.range_i32(stats.min_health, stats.max_health),
                self.rng.range_i32(stats.min_damage, stats.max_damage),
            )
        } else {
            (stats.max_health, stats.max_damage)
        }
    }

    fn is_position_valid(&self, position: Vec2) -> bool {
        if let Some(player) = self.player_position {
            if position.distance(player) < self.config.min_distance_from_player {
                return false;
            }
        }
        !self
            .obstacles
            .overlaps(position, self.config.obstacle_probe_radius)
    }

    fn find_valid_position(&mut self, candidate: Vec2) -> Option<Vec2> {
        if self.is_position_valid(candidate) {
            return Some(candidate);
        }
        for attempt in 0..SPAWN_RETRIES {
            let radius = SPAWN_JITTER_RADIUS * (attempt + 1) as f32 / SPAWN_RETRIES as f32;
            let position = candidate + self.rng.inside_unit_circle() * radius;
            if self.is_position_valid(position) {
                return Some(position);
            }
        }
        None
    }

    fn random_position(&mut self) -> Vec2 {
        let mut position = self.config.origin;
        for _ in 0..RANDOM_PLACEMENT_ATTEMPTS {
            let angle = self.rng.angle();
            let distance = self
                .rng
                .range(RANDOM_PLACEMENT_MIN_DISTANCE, self.config.spawn_radius);
            position = self.config.origin + Vec2::new(angle.cos(), angle.sin()) * distance;
            if self.is_position_valid(position) {
                break;
            }
        }
        position
    }

    // ------------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------------

    /// Decision tick: runs every enemy, then settles bookkeeping and drains
    /// the respawn queue at the configured interval.
    pub fn update(&mut self, dt: f32, mut target: Option<&mut dyn CombatTarget>) {
        self.clock += dt;
        if let Some(target) = target.as_deref() {
            self.player_position = Some(target.position());
        }

        for enemy in &mut self.enemies {
            let reborrowed = target.as_deref_mut().map(|t| t as &mut dyn CombatTarget);
            enemy.update(dt, reborrowed);
        }

        self.process_events();

        self.drain_accumulator += dt;
        while self.drain_accumulator >= self.config.drain_interval {
            self.drain_accumulator -= self.config.drain_interval;
            self.drain_respawn_queue();
        }
    }

    /// Physics tick for every enemy.
    pub fn fixed_update(&mut self, dt: f32) {
        for enemy in &mut self.enemies {
            enemy.fixed_update(dt);
        }
    }

    fn process_events(&mut self) {
        for event in self.bus.drain() {
            match event {
                EnemyEvent::Died { enemy_id, position } => {
                    debug!("{enemy_id} died at {position:?}");
                },
                EnemyEvent::ItemDropped { item, .. } => self.drops.push(item),
                EnemyEvent::Removed {
                    enemy_id, origin, ..
                } => self.on_enemy_removed(enemy_id, origin),
            }
        }
        self.enemies.retain(|e| !e.is_removed());
    }

    fn on_enemy_removed(&mut self, id: EnemyId, origin: Option<SpawnPointId>) {
        let home = self.homes.remove(&id);
        let Some(origin) = origin else {
            return;
        };

        if let Some(count) = self.live_counts.get_mut(&origin) {
            *count = count.saturating_sub(1);
        }

        if !self.config.global_respawning {
            return;
        }

        let Some(descriptor) = self.registry.get(origin) else {
            return;
        };
        if !descriptor.is_respawning_enabled() {
            debug!("Respawn disabled for spawn point: {}", descriptor.name());
            return;
        }

        let delay = descriptor.roll_respawn_delay(&self.config.default_respawn, &mut self.rng);
        let position = home.unwrap_or_else(|| descriptor.anchor());
        self.queue.push_back(RespawnRequest {
            position,
            origin,
            ready_at: self.clock + delay,
        });
        debug!(
            "Respawn requested for {} ({origin}) in {delay:.1} seconds",
            descriptor.name()
        );
    }

    fn drain_respawn_queue(&mut self) {
        if !self.config.global_respawning || self.queue.is_empty() {
            return;
        }

        let cap = self.config.total_enemies as usize;
        for _ in 0..self.queue.len() {
            let Some(request) = self.queue.pop_front() else {
                break;
            };

            if self.clock < request.ready_at {
                self.queue.push_back(request);
                continue;
            }

            let Some(descriptor) = self.registry.get(request.origin) else {
                debug!("Dropping respawn for unknown {}", request.origin);
                continue;
            };
            if !descriptor.is_respawning_enabled() {
                debug!("Respawn disabled for spawn point: {}", descriptor.name());
                continue;
            }

            let has_room = descriptor.has_room(self.live_count(request.origin));
            let under_cap = !self.config.respect_global_limit || self.enemies.len() < cap;
            let retry = RespawnRequest {
                ready_at: self.clock + self.config.retry_delay,
                ..request
            };

            if has_room && under_cap {
                let label = descriptor.name().to_string();
                match self.spawn_at(request.position, Some(request.origin), &label) {
                    Ok(id) => info!("Respawned {id} at {label}"),
                    Err(_) => self.queue.push_back(retry),
                }
            } else {
                self.queue.push_back(retry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CircleObstacles, KinematicBackend};
    use crate::combatant::MockTarget;
    use crate::spawn_point::{ManualAnchor, SpawnPoint};

    const DT: f32 = 1.0 / 60.0;

    fn spawner(config: SpawnerConfig) -> EnemySpawner {
        EnemySpawner::new(
            config,
            Box::new(KinematicBackend::default()),
            Box::new(CircleObstacles::new()),
        )
    }

    fn two_points() -> SpawnerConfig {
        SpawnerConfig {
            spawn_points: vec![
                SpawnPoint::new("West", Vec2::new(-20.0, 0.0)).with_max_enemies(2),
                SpawnPoint::new("East", Vec2::new(20.0, 0.0))
                    .with_max_enemies(3)
                    .with_respawn(RespawnPolicy::new(1.0, 0.0)),
            ],
            total_enemies: 4,
            ..Default::default()
        }
    }

    fn kill(spawner: &mut EnemySpawner, id: EnemyId) {
        let enemy = spawner.enemy_mut(id).expect("enemy exists");
        enemy.take_damage(10_000, Vec2::X);
    }

    #[test]
    fn test_initial_spawn_fills_in_order_until_cap() {
        let mut s = spawner(two_points());
        assert_eq!(s.start(), 4);
        assert_eq!(s.live_count(SpawnPointId::new(0)), 2);
        assert_eq!(s.live_count(SpawnPointId::new(1)), 2);
        assert_eq!(s.active_enemy_count(), 4);
    }

    #[test]
    fn test_spawn_all_respects_capacity_on_repeat() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 100,
            ..two_points()
        });
        assert_eq!(s.spawn_all_now(), 5);
        assert_eq!(s.spawn_all_now(), 0);
    }

    #[test]
    fn test_manual_mode_uses_per_point_capacity() {
        let mut s = spawner(SpawnerConfig {
            mode: SpawnMode::Manual,
            manual_anchors: vec![
                ManualAnchor::new("A", Vec2::new(10.0, 0.0)),
                ManualAnchor::new("B", Vec2::new(-10.0, 0.0)),
            ],
            enemies_per_manual_point: 2,
            ..Default::default()
        });
        assert_eq!(s.start(), 4);
        assert_eq!(s.registry().mode(), SpawnMode::Manual);
    }

    #[test]
    fn test_random_fallback_when_registry_empty() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 6,
            ..Default::default()
        });
        assert_eq!(s.start(), 6);
        for enemy in s.enemies() {
            assert!(enemy.origin().is_none());
            let d = enemy.position().length();
            assert!(d <= 5.0 + SPAWN_JITTER_RADIUS);
        }
    }

    #[test]
    fn test_spawn_rejected_near_player() {
        let mut s = spawner(SpawnerConfig {
            spawn_points: vec![SpawnPoint::new("Camp", Vec2::ZERO)],
            ..Default::default()
        });
        s.set_player_position(Some(Vec2::ZERO));
        let result = s.spawn_at_point(SpawnPointId::new(0));
        assert!(matches!(result, Err(SpawnError::NoValidPosition { .. })));
        assert_eq!(s.active_enemy_count(), 0);
        assert_eq!(s.live_count(SpawnPointId::new(0)), 0);
    }

    #[test]
    fn test_spawn_rejected_inside_obstacle() {
        let obstacles = CircleObstacles::new().with(Vec2::ZERO, 10.0);
        let mut s = EnemySpawner::new(
            SpawnerConfig {
                spawn_points: vec![SpawnPoint::new("Rock", Vec2::ZERO)],
                ..Default::default()
            },
            Box::new(KinematicBackend::default()),
            Box::new(obstacles),
        );
        assert!(s.spawn_at_point(SpawnPointId::new(0)).is_err());
    }

    #[test]
    fn test_unknown_point_errors() {
        let mut s = spawner(two_points());
        let result = s.spawn_at_point(SpawnPointId::new(9));
        assert!(matches!(result, Err(SpawnError::UnknownSpawnPoint(_))));
        let message = result.map(|_| ()).expect_err("unknown point").to_string();
        assert!(message.contains("spawn#9"));
    }

    #[test]
    fn test_stats_within_ranges() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 10,
            ..Default::default()
        });
        s.start();
        for enemy in s.enemies() {
            let c = enemy.combatant();
            assert!((30..=70).contains(&c.max_health()));
            assert!((5..=15).contains(&c.attack_damage()));
            assert!(enemy.patrol().is_some());
        }
    }

    #[test]
    fn test_fixed_stats_use_maxima() {
        let mut config = SpawnerConfig::default();
        config.stats.randomize = false;
        config.total_enemies = 2;
        let mut s = spawner(config);
        s.start();
        for enemy in s.enemies() {
            assert_eq!(enemy.combatant().max_health(), 70);
            assert_eq!(enemy.combatant().attack_damage(), 15);
        }
    }

    #[test]
    fn test_death_queues_respawn_and_frees_capacity() {
        let mut s = spawner(two_points());
        s.start();
        let east = SpawnPointId::new(1);
        let victim = s
            .enemies()
            .iter()
            .find(|e| e.origin() == Some(east))
            .map(EnemyController::id)
            .expect("east enemy");

        kill(&mut s, victim);
        // cleanup delay then removal
        for _ in 0..70 {
            s.update(DT, None);
        }
        assert!(s.enemy(victim).is_none());
        assert_eq!(s.live_count(east), 1);

        let request = *s.pending_requests().next().expect("respawn queued");
        assert_eq!(request.origin, east);
        assert!(request.ready_at > s.clock());

        for _ in 0..120 {
            s.update(DT, None);
        }
        assert_eq!(s.pending_respawn_count(), 0);
        assert_eq!(s.live_count(east), 2);
        assert_eq!(s.active_enemy_count(), 4);
    }

    #[test]
    fn test_random_spawns_never_respawn() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 1,
            ..Default::default()
        });
        s.start();
        let id = s.enemies()[0].id();
        kill(&mut s, id);
        for _ in 0..90 {
            s.update(DT, None);
        }
        assert_eq!(s.active_enemy_count(), 0);
        assert_eq!(s.pending_respawn_count(), 0);
    }

    #[test]
    fn test_disabled_point_respawn_dropped() {
        let mut s = spawner(two_points());
        s.start();
        let west = SpawnPointId::new(0);
        s.registry_mut()
            .get_mut(west)
            .expect("west")
            .set_respawning_enabled(false);
        let id = s
            .enemies()
            .iter()
            .find(|e| e.origin() == Some(west))
            .map(EnemyController::id)
            .expect("west enemy");

        kill(&mut s, id);
        for _ in 0..90 {
            s.update(DT, None);
        }
        assert_eq!(s.pending_respawn_count(), 0);
        assert_eq!(s.live_count(west), 1);
    }

    #[test]
    fn test_global_respawning_off_queues_nothing() {
        let mut s = spawner(two_points());
        s.start();
        s.set_global_respawning_enabled(false);
        let id = s.enemies()[0].id();
        kill(&mut s, id);
        for _ in 0..90 {
            s.update(DT, None);
        }
        assert_eq!(s.pending_respawn_count(), 0);
        assert_eq!(s.active_enemy_count(), 3);
    }

    #[test]
    fn test_blocked_request_retries_with_fixed_delay() {
        let mut config = two_points();
        config.total_enemies = 5;
        let mut s = spawner(config);
        s.start();
        let east = SpawnPointId::new(1);
        let id = s
            .enemies()
            .iter()
            .find(|e| e.origin() == Some(east))
            .map(EnemyController::id)
            .expect("east enemy");

        kill(&mut s, id);
        for _ in 0..70 {
            s.update(DT, None);
        }
        // close the point so the ready request is blocked
        s.registry_mut().get_mut(east).expect("east").set_enabled(false);
        for _ in 0..90 {
            s.update(DT, None);
        }
        let request = *s.pending_requests().next().expect("still queued");
        assert!(request.ready_at > s.clock());
        assert!(request.ready_at <= s.clock() + s.config().retry_delay);
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut s = spawner(two_points());
        s.start();
        let id = s.enemies()[0].id();
        kill(&mut s, id);
        s.clear_all_enemies();

        assert_eq!(s.active_enemy_count(), 0);
        assert_eq!(s.pending_respawn_count(), 0);
        assert!(s.diagnostics().points.iter().all(|p| p.live == 0));
        for _ in 0..90 {
            s.update(DT, None);
        }
        assert_eq!(s.pending_respawn_count(), 0);
    }

    #[test]
    fn test_default_respawn_delay_clamped() {
        let mut s = spawner(SpawnerConfig::default());
        s.set_default_respawn_delay(-5.0);
        assert_eq!(s.config().default_respawn.delay, MIN_RESPAWN_DELAY);
    }

    #[test]
    fn test_player_position_tracked_from_target() {
        let mut s = spawner(SpawnerConfig::default());
        let mut player = MockTarget::new(Vec2::new(3.0, 4.0));
        s.update(DT, Some(&mut player));
        assert_eq!(s.player_position(), Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_diagnostics_lists_points() {
        let mut s = spawner(two_points());
        s.start();
        let diag = s.diagnostics();
        assert_eq!(diag.points.len(), 2);
        assert_eq!(diag.points[1].name, "East");
        assert_eq!(diag.points[1].capacity, 3);
        assert_eq!(diag.active, 4);
    }
}
