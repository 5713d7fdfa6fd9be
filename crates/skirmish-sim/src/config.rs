//! Simulation configuration.
//!
//! The arena sections (`[spawner]`, `[[obstacles]]`) are the gameplay
//! crate's own configuration; `[player]` and `[run]` only exist here.

use serde::{Deserialize, Serialize};
use skirmish_gameplay::{ConfigError, ConfigResult, SkirmishConfig};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::player::PlayerConfig;

/// How long and how fast the simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Simulated seconds to run
    pub duration: f32,
    /// Nominal frame rate of the decision tick
    pub frame_rate: f32,
    /// Random frame time variation, as a fraction of the nominal frame time
    pub frame_jitter: f32,
    /// Seconds between progress reports
    pub report_interval: f32,
    /// Emit the final summary as JSON
    pub json_summary: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: 60.0,
            frame_rate: 60.0,
            frame_jitter: 0.25,
            report_interval: 10.0,
            json_summary: false,
        }
    }
}

/// Root configuration of the `skirmish` binary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Spawner, enemy tuning and obstacles
    #[serde(flatten)]
    pub arena: SkirmishConfig,
    /// Scripted player
    pub player: PlayerConfig,
    /// Run length and frame pacing
    pub run: RunConfig,
}

impl SimConfig {
    /// Parses configuration from TOML text, clamps and checks it.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        let config = config.validated();
        config.arena.spawner.check()?;
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

    /// Clamps every section into usable ranges.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.arena = self.arena.validated();

        let p = &mut self.player;
        p.max_health = p.max_health.max(1);
        p.attack_damage = p.attack_damage.max(0);
        p.attack_range = p.attack_range.max(0.1);
        p.attack_cooldown = p.attack_cooldown.max(0.05);
        p.move_speed = p.move_speed.max(0.0);
        p.knockback_force = p.knockback_force.max(0.0);
        p.restart_delay = p.restart_delay.max(0.0);

        let r = &mut self.run;
        r.duration = r.duration.max(0.0);
        r.frame_rate = r.frame_rate.clamp(1.0, 1000.0);
        r.frame_jitter = r.frame_jitter.clamp(0.0, 0.9);
        r.report_interval = r.report_interval.max(0.1);
        self
    }
}
