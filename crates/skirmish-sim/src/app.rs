//! Headless arena application.
//!
//! Wires the configured spawner, the scripted player and the obstacle set
//! together and drives them with a variable-rate decision tick and a fixed
//! 60 Hz physics tick.

use anyhow::Result;
use glam::Vec2;
use serde::Serialize;
use skirmish_gameplay::{
    AnimationCue, CircleObstacles, EnemyBackend, EnemySpawner, KinematicBody, PhysicsBody,
    Presenter, SimRng, SpawnerDiagnostics,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, trace};

use crate::config::SimConfig;
use crate::player::Player;
use crate::timing::FrameTiming;

// ============================================================================
// Backend
// ============================================================================

/// Presenter that forwards animation signals to the trace log.
#[derive(Debug)]
struct TracePresenter {
    label: u32,
    walking: bool,
}

impl Presenter for TracePresenter {
    fn set_walking(&mut self, walking: bool) {
        if walking != self.walking {
            trace!("body#{} walking={walking}", self.label);
            self.walking = walking;
        }
    }

    fn set_attacking(&mut self, _attacking: bool) {}

    fn set_facing(&mut self, _facing: Vec2) {}

    fn trigger(&mut self, cue: AnimationCue) {
        trace!("body#{} cue {cue:?}", self.label);
    }
}

/// Kinematic bodies plus trace-log presentation.
#[derive(Debug, Default)]
struct ArenaBackend {
    created: u32,
}

impl EnemyBackend for ArenaBackend {
    fn create_body(&mut self, position: Vec2) -> Box<dyn PhysicsBody> {
        self.created += 1;
        Box::new(KinematicBody::new(position))
    }

    fn create_presenter(&mut self) -> Option<Box<dyn Presenter>> {
        Some(Box::new(TracePresenter {
            label: self.created,
            walking: false,
        }))
    }
}

// ============================================================================
// Summary
// ============================================================================

/// End-of-run statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Simulated seconds
    pub seconds: f32,
    /// Decision ticks
    pub frames: u64,
    /// Physics ticks
    pub fixed_steps: u64,
    /// Average frame time in milliseconds (recent frames)
    pub average_frame_ms: f32,
    /// Enemies spawned by the initial population
    pub initial_spawns: u32,
    /// Enemies the player killed
    pub enemies_killed: u32,
    /// Swings that landed
    pub player_hits: u32,
    /// Hits the player received
    pub player_hits_taken: u32,
    /// Player deaths
    pub player_deaths: u32,
    /// Player restarts after dying
    pub player_restarts: u32,
    /// Dropped item quantities by name
    pub drops: BTreeMap<String, u32>,
    /// Spawner state at the end of the run
    pub spawner: SpawnerDiagnostics,
}

// ============================================================================
// Application
// ============================================================================

/// The running simulation.
pub struct SkirmishApp {
    config: SimConfig,
    spawner: EnemySpawner,
    player: Player,
    timing: FrameTiming,
    rng: SimRng,
    initial_spawns: u32,
    enemies_killed: u32,
    player_hits: u32,
    player_restarts: u32,
    drops: BTreeMap<String, u32>,
    next_report: f32,
}

impl SkirmishApp {
    /// Builds the arena from configuration.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let obstacles = CircleObstacles::from(config.arena.obstacles.clone());
        let mut spawner = EnemySpawner::new(
            config.arena.spawner.clone(),
            Box::new(ArenaBackend::default()),
            Box::new(obstacles),
        );
        let player = Player::new(config.player);
        spawner.set_player_position(Some(config.player.spawn));
        let initial_spawns = spawner.start();

        Self {
            rng: SimRng::new(config.arena.spawner.seed ^ 0xF4A3_E5),
            next_report: config.run.report_interval,
            config,
            spawner,
            player,
            timing: FrameTiming::default(),
            initial_spawns,
            enemies_killed: 0,
            player_hits: 0,
            player_restarts: 0,
            drops: BTreeMap::new(),
        }
    }

    /// Runs one frame with the given raw delta.
    pub fn frame(&mut self, raw_dt: f32) {
        let dt = self.timing.frame(raw_dt);

        let tick = self.player.update(dt, self.spawner.enemies_mut());
        self.enemies_killed += tick.kills;
        self.player_hits += tick.hits;
        self.player_restarts += u32::from(tick.restarted);

        self.spawner.update(dt, Some(&mut self.player));

        let fixed_dt = self.timing.fixed_dt();
        for _ in 0..self.timing.accumulate(dt) {
            self.spawner.fixed_update(fixed_dt);
        }

        for drop in self.spawner.drain_drops() {
            *self.drops.entry(drop.name).or_insert(0) += drop.quantity;
        }

        if self.timing.elapsed() >= self.next_report {
            self.next_report += self.config.run.report_interval;
            self.report();
        }
    }

    /// Runs until the configured duration has elapsed.
    pub fn run_to_end(&mut self) -> RunSummary {
        let nominal = 1.0 / self.config.run.frame_rate;
        let jitter = self.config.run.frame_jitter;

        while self.timing.elapsed() < self.config.run.duration {
            let raw_dt = nominal * (1.0 + self.rng.range(-jitter, jitter));
            self.frame(raw_dt);
        }

        self.summary()
    }

    fn report(&self) {
        let diagnostics = self.spawner.diagnostics();
        info!(
            "t={:.1}s active={} pending={} kills={} player_hp={}",
            self.timing.elapsed(),
            diagnostics.active,
            diagnostics.pending,
            self.enemies_killed,
            self.player.combatant().current_health()
        );
    }

    /// Snapshot of the run so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seconds: self.timing.elapsed(),
            frames: self.timing.frames(),
            fixed_steps: self.timing.fixed_steps(),
            average_frame_ms: self.timing.average_frame_time_ms(),
            initial_spawns: self.initial_spawns,
            enemies_killed: self.enemies_killed,
            player_hits: self.player_hits,
            player_hits_taken: self.player.hits_taken(),
            player_deaths: self.player.deaths(),
            player_restarts: self.player_restarts,
            drops: self.drops.clone(),
            spawner: self.spawner.diagnostics(),
        }
    }
}

/// Runs the simulation described by the config file at `path`.
pub fn run(path: &Path) -> Result<()> {
    let config = SimConfig::load_from(path)?;

    info!("Configuration loaded:");
    info!("  Spawn mode: {:?}", config.arena.spawner.mode);
    info!("  Enemy cap: {}", config.arena.spawner.total_enemies);
    info!("  Obstacles: {}", config.arena.obstacles.len());
    info!("  Duration: {}s", config.run.duration);

    let json = config.run.json_summary;
    let mut app = SkirmishApp::new(config);
    let summary = app.run_to_end();

    if json {
        info!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!(
            "Ran {:.1}s in {} frames / {} physics steps",
            summary.seconds, summary.frames, summary.fixed_steps
        );
        info!(
            "Enemies killed: {}, player hits: {}, hits taken: {}, player deaths: {}",
            summary.enemies_killed,
            summary.player_hits,
            summary.player_hits_taken,
            summary.player_deaths
        );
        for (name, quantity) in &summary.drops {
            info!("  Dropped {quantity} x {name}");
        }
        info!(
            "Spawner: {} active, {} pending respawns",
            summary.spawner.active, summary.spawner.pending
        );
    }

    Ok(())
}
