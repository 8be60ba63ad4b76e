//! `ascent.yaml` tuning configuration.
//!
//! Every gameplay constant lives here, defaulted to the values the course was
//! tuned against. The stabilization thresholds are tied to the physics
//! backend's solver behavior, so a different backend may need different
//! values; nothing in the core hardcodes them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "ascent.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub movement: MovementConfig,
    pub diagnostics: DiagnosticsConfig,
    pub combat: CombatConfig,
    pub session: SessionConfig,
    pub camera: CameraConfig,
    pub physics: PhysicsConfig,
}

/// Horizontal control, jump and grounding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MovementConfig {
    pub move_speed: f32,
    /// Fraction of `move_speed` available while airborne. Must be < 1.
    pub air_control: f32,
    pub jump_impulse: f32,
    /// Negative; vertical velocity is never allowed below this.
    pub terminal_fall_speed: f32,
    pub player_size: [f32; 3],
    /// Extra ray length past the player's half height.
    pub probe_skin: f32,
    /// Jump needs strictly more consecutive grounded steps than this.
    pub jump_grounded_steps: u32,
    /// Stabilization needs strictly more consecutive grounded steps than this.
    pub stabilize_grounded_steps: u32,
    /// Upward speeds at or above this are treated as an intentional jump.
    pub stabilize_max_rise: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            air_control: 0.5,
            jump_impulse: 20.4,
            terminal_fall_speed: -15.0,
            player_size: [0.9, 0.9, 0.9],
            probe_skin: 0.1,
            jump_grounded_steps: 2,
            stabilize_grounded_steps: 2,
            stabilize_max_rise: 0.5,
        }
    }
}

impl MovementConfig {
    pub fn half_height(&self) -> f32 {
        self.player_size[1] * 0.5
    }

    pub fn probe_length(&self) -> f32 {
        self.half_height() + self.probe_skin
    }
}

/// Anti-stuck, anti-freeze and fall-through heuristics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Squared speed below which the body counts as frozen.
    pub freeze_epsilon: f32,
    /// Airborne steps required before the per-step freeze nudge may fire.
    pub step_freeze_grace_steps: u32,
    pub freeze_nudge: f32,
    pub freeze_check_interval: f32,
    /// Airborne steps required before the periodic freeze kick may fire.
    pub frame_freeze_grace_steps: u32,
    pub freeze_min_height: f32,
    /// Vertical velocity written by the periodic freeze kick.
    pub freeze_kick_speed: f32,
    pub stuck_input_threshold: f32,
    pub stuck_distance_threshold: f32,
    pub stuck_grounded_steps: u32,
    pub stuck_time_limit: f32,
    pub unstuck_vertical_speed: f32,
    pub unstuck_horizontal_speed: f32,
    /// Below this height the player is dead.
    pub fall_death_height: f32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            freeze_epsilon: 0.001,
            step_freeze_grace_steps: 5,
            freeze_nudge: 0.1,
            freeze_check_interval: 0.5,
            frame_freeze_grace_steps: 10,
            freeze_min_height: 0.5,
            freeze_kick_speed: -1.0,
            stuck_input_threshold: 0.1,
            stuck_distance_threshold: 0.05,
            stuck_grounded_steps: 5,
            stuck_time_limit: 0.3,
            unstuck_vertical_speed: 4.0,
            unstuck_horizontal_speed: 2.0,
            fall_death_height: -10.0,
        }
    }
}

/// Enemies, projectiles and invincibility windows.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CombatConfig {
    pub pickup_invincibility: f32,
    /// Post-hit grace window. Shorter than `pickup_invincibility`.
    pub hit_invincibility: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub projectile_spawn_offset: f32,
    pub projectile_hit_radius: f32,
    /// Projectiles with `|x|` beyond this are discarded.
    pub projectile_max_abs_x: f32,
    pub enemy_speed: f32,
    pub enemy_patrol_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            pickup_invincibility: 3.0,
            hit_invincibility: 1.0,
            projectile_speed: 12.0,
            projectile_lifetime: 3.0,
            projectile_spawn_offset: 1.5,
            projectile_hit_radius: 0.5,
            projectile_max_abs_x: 200.0,
            enemy_speed: 2.0,
            enemy_patrol_radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_lives: u32,
    pub status_duration: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_lives: 3,
            status_duration: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub offset: [f32; 3],
    pub smooth_speed: f32,
    pub follow_x: bool,
    pub follow_y: bool,
    pub follow_z: bool,
    pub look_at_player: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: [0.0, 5.0, -15.0],
            smooth_speed: 8.0,
            follow_x: true,
            follow_y: true,
            follow_z: false,
            look_at_player: true,
        }
    }
}

/// Settings consumed by the physics backend rather than the core.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    pub fixed_timestep: f32,
    pub frame_timestep: f32,
    pub player_mass: f32,
    pub player_linear_damping: f32,
    pub player_friction: f32,
    pub platform_friction: f32,
    pub restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            fixed_timestep: 0.02,
            frame_timestep: 1.0 / 60.0,
            player_mass: 1.0,
            player_linear_damping: 1.0,
            player_friction: 0.1,
            platform_friction: 0.2,
            restitution: 0.0,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(p) => write!(f, "config file not found: {}", p.display()),
            ConfigError::Io(e) => write!(f, "IO error reading {}: {}", CONFIG_FILE_NAME, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {}", CONFIG_FILE_NAME, e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Walk up from `start_dir` looking for `ascent.yaml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a config file. Missing sections fall back to defaults.
pub fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<GameConfig, ConfigError> {
    serde_yaml::from_str(contents).map_err(ConfigError::Parse)
}

/// Resolve the config for a run: an explicit path must load, otherwise the
/// nearest `ascent.yaml` is tried and defaults are used when none is found
/// or it fails to parse.
pub fn resolve_config(explicit: Option<&Path>, start_dir: &Path) -> Result<GameConfig, ConfigError> {
    if let Some(path) = explicit {
        let config = load_config(path)?;
        tracing::info!("Loaded config from {:?}", path);
        return Ok(config);
    }

    match find_config(start_dir) {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                Ok(config)
            }
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Ok(GameConfig::default())
            }
        },
        None => {
            tracing::info!("No {} found, using default tuning", CONFIG_FILE_NAME);
            Ok(GameConfig::default())
        }
    }
}

pub fn to_yaml(config: &GameConfig) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(ConfigError::Parse)
}
