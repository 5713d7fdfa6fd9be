//! Gameplay configuration.
//!
//! Every tunable carries the shipped default, so an empty TOML file (or no
//! file at all) produces a playable arena. Values are clamped by
//! [`SkirmishConfig::validated`] after loading.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::CircleObstacle;
use crate::drops::DropTable;
use crate::spawn_point::{ManualAnchor, RespawnPolicy, SpawnMode, SpawnPoint, MIN_RESPAWN_DELAY};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "skirmish.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file.
    #[error("Config file I/O failed for {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its meaningful range and cannot be clamped.
    #[error("Config validation error: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// Enemy tuning
// ============================================================================

/// Movement, range and timing tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Movement speed (units per second)
    pub move_speed: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Total attack duration (wind-up plus follow-through)
    pub attack_duration: f32,
    /// Distance at which attacks are chosen
    pub attack_range: f32,
    /// Distance at which the target is noticed
    pub detection_range: f32,
    /// Kept for configuration parity; no decision reads it
    pub stop_distance: f32,
    /// Impulse magnitude when hit
    pub knockback_force: f32,
    /// Maximum patrol waypoint distance from the spawn position
    pub patrol_radius: f32,
    /// Preferred fighting distance (reported, never decides)
    pub optimal_combat_distance: f32,
    /// Below this distance the enemy backs off or circles
    pub min_combat_distance: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            attack_cooldown: 2.0,
            attack_duration: 0.5,
            attack_range: 1.5,
            detection_range: 5.0,
            stop_distance: 1.0,
            knockback_force: 2.0,
            patrol_radius: 3.0,
            optimal_combat_distance: 1.8,
            min_combat_distance: 1.0,
        }
    }
}

/// Circling tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleTuning {
    /// Per-tick probability of flipping direction once the window elapsed
    pub direction_change_chance: f32,
    /// Minimum seconds between flips
    pub min_circle_time: f32,
    /// Whether flips happen at all
    pub random_direction: bool,
    /// Initial direction
    pub clockwise: bool,
}

impl Default for CircleTuning {
    fn default() -> Self {
        Self {
            direction_change_chance: 0.05,
            min_circle_time: 0.5,
            random_direction: true,
            clockwise: true,
        }
    }
}

/// Retreat tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetreatTuning {
    /// Speed multiplier while retreating
    pub speed_multiplier: f32,
    /// Distance at which a retreat completes
    pub distance: f32,
    /// Seconds between retreat starts
    pub cooldown: f32,
    /// Probability per eligible check
    pub chance: f32,
    /// Whether retreats happen at all
    pub enabled: bool,
}

impl Default for RetreatTuning {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.5,
            distance: 3.5,
            cooldown: 4.0,
            chance: 0.3,
            enabled: true,
        }
    }
}

/// Complete behavioral tuning for one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Movement and ranges
    pub movement: MovementTuning,
    /// Circling
    pub circle: CircleTuning,
    /// Retreating
    pub retreat: RetreatTuning,
}

impl EnemyTuning {
    /// Clamps values into usable ranges.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let m = &mut self.movement;
        m.move_speed = m.move_speed.max(0.0);
        m.attack_cooldown = m.attack_cooldown.max(0.0);
        m.attack_duration = m.attack_duration.max(0.01);
        m.attack_range = m.attack_range.max(0.0);
        m.detection_range = m.detection_range.max(m.attack_range);
        m.stop_distance = m.stop_distance.max(0.0);
        m.knockback_force = m.knockback_force.max(0.0);
        m.patrol_radius = m.patrol_radius.max(1.0);
        m.min_combat_distance = m.min_combat_distance.clamp(0.0, m.attack_range);

        let c = &mut self.circle;
        c.direction_change_chance = c.direction_change_chance.clamp(0.0, 1.0);
        c.min_circle_time = c.min_circle_time.max(0.0);

        let r = &mut self.retreat;
        r.speed_multiplier = r.speed_multiplier.max(0.0);
        r.distance = r.distance.max(0.0);
        r.cooldown = r.cooldown.max(0.0);
        r.chance = r.chance.clamp(0.0, 1.0);
        self
    }
}

/// Health and damage ranges for spawned enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatRanges {
    /// Draw stats from the ranges (otherwise use the maxima)
    pub randomize: bool,
    /// Minimum health
    pub min_health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Minimum attack damage
    pub min_damage: i32,
    /// Maximum attack damage
    pub max_damage: i32,
}

impl Default for StatRanges {
    fn default() -> Self {
        Self {
            randomize: true,
            min_health: 30,
            max_health: 70,
            min_damage: 5,
            max_damage: 15,
        }
    }
}

// ============================================================================
// Spawner
// ============================================================================

/// Spawner configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Seed for every random draw in the run
    pub seed: u64,
    /// Center of the random fallback placement
    pub origin: Vec2,
    /// Populate the arena when the spawner starts
    pub spawn_all_at_start: bool,
    /// Global population cap
    pub total_enemies: u32,
    /// Master respawn switch
    pub global_respawning: bool,
    /// Block respawns while at the global cap
    pub respect_global_limit: bool,
    /// Default policy for manual anchors
    pub default_respawn: RespawnPolicy,
    /// Which registry source to use
    pub mode: SpawnMode,
    /// Spawn points (mode `points`)
    pub spawn_points: Vec<SpawnPoint>,
    /// Manual anchors (mode `manual`)
    pub manual_anchors: Vec<ManualAnchor>,
    /// Capacity of each manual anchor
    pub enemies_per_manual_point: u32,
    /// Maximum distance of random fallback placement
    pub spawn_radius: f32,
    /// Spawns closer than this to the player are rejected
    pub min_distance_from_player: f32,
    /// Radius probed against obstacles
    pub obstacle_probe_radius: f32,
    /// Seconds between respawn queue drains
    pub drain_interval: f32,
    /// Delay added to a ready request that is blocked
    pub retry_delay: f32,
    /// Stat ranges
    pub stats: StatRanges,
    /// Behavior tunables
    pub enemy: EnemyTuning,
    /// Drop table attached to every enemy
    pub drops: DropTable,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_0F_5C1A,
            origin: Vec2::ZERO,
            spawn_all_at_start: true,
            total_enemies: 10,
            global_respawning: true,
            respect_global_limit: true,
            default_respawn: RespawnPolicy::default(),
            mode: SpawnMode::Points,
            spawn_points: Vec::new(),
            manual_anchors: Vec::new(),
            enemies_per_manual_point: 2,
            spawn_radius: 5.0,
            min_distance_from_player: 3.0,
            obstacle_probe_radius: 0.5,
            drain_interval: 0.5,
            retry_delay: 1.0,
            stats: StatRanges::default(),
            enemy: EnemyTuning::default(),
            drops: DropTable::default(),
        }
    }
}

impl SpawnerConfig {
    /// Clamps values into usable ranges.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.default_respawn.delay = self.default_respawn.delay.max(MIN_RESPAWN_DELAY);
        self.default_respawn.variation = self.default_respawn.variation.max(0.0);
        for point in &mut self.spawn_points {
            point.respawn.delay = point.respawn.delay.max(MIN_RESPAWN_DELAY);
            point.respawn.variation = point.respawn.variation.max(0.0);
        }

        self.spawn_radius = self.spawn_radius.max(2.0);
        self.min_distance_from_player = self.min_distance_from_player.max(0.0);
        self.obstacle_probe_radius = self.obstacle_probe_radius.max(0.0);
        self.drain_interval = self.drain_interval.max(0.01);
        self.retry_delay = self.retry_delay.max(MIN_RESPAWN_DELAY);

        let s = &mut self.stats;
        s.min_health = s.min_health.max(1);
        s.max_health = s.max_health.max(s.min_health);
        s.min_damage = s.min_damage.max(0);
        s.max_damage = s.max_damage.max(s.min_damage);

        self.enemy = self.enemy.validated();
        self.drops = self.drops.validated();
        self
    }

    /// Rejects configurations that clamping cannot repair.
    pub fn check(&self) -> ConfigResult<()> {
        let m = &self.enemy.movement;
        let finite = [
            m.move_speed,
            m.attack_cooldown,
            m.attack_duration,
            m.attack_range,
            m.detection_range,
            m.knockback_force,
            self.origin.x,
            self.origin.y,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid(
                "enemy tuning and origin must be finite numbers".to_string(),
            ));
        }

        for (index, point) in self.spawn_points.iter().enumerate() {
            if !point.position.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "spawn point {index} ({}) has a non-finite position",
                    point.name
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkirmishConfig {
    /// Spawner and enemy tuning
    pub spawner: SpawnerConfig,
    /// Obstacles that reject spawn positions
    pub obstacles: Vec<CircleObstacle>,
}

impl SkirmishConfig {
    /// Parses configuration from TOML text, clamps and checks it.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        let config = config.validated();
        config.spawner.check()?;
        Ok(config)
    }

    /// Loads configuration from a specific path.
    /// Returns the default config if the file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default().validated());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Ok(config)
            },
            Err(e) => {
                warn!("Failed to load config file {}: {e}", path.display());
                Err(e)
            },
        }
    }

    /// Saves configuration as pretty TOML.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamps every section into usable ranges.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.spawner = self.spawner.validated();
        for obstacle in &mut self.obstacles {
            obstacle.radius = obstacle.radius.max(0.0);
        }
        self
    }
}
