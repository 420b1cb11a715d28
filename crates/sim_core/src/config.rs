use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::EnemyKind;
use crate::math::Vec2;

pub const HOT_RELOAD_POLL_SECONDS: f32 = 1.0;

const DEFAULT_PLAYER_SPEED: f32 = 220.0;
const DEFAULT_ENEMY_SPEED: f32 = 140.0;
const DEFAULT_WORLD_EXTENT: f32 = 2000.0;
const DEFAULT_SPAWN_COORD: f32 = 500.0;
/// Upper bound for mover speeds, in world units per second.
pub const MAX_CONFIG_SPEED: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

impl SpawnPoint {
    pub fn position(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub kind: EnemyKind,
}

impl EnemySpawn {
    pub fn position(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Tunables read from the external config file. Missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub world_width: f32,
    pub world_height: f32,
    pub player_spawn: SpawnPoint,
    pub enemy_spawns: Vec<EnemySpawn>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_speed: DEFAULT_PLAYER_SPEED,
            enemy_speed: DEFAULT_ENEMY_SPEED,
            world_width: DEFAULT_WORLD_EXTENT,
            world_height: DEFAULT_WORLD_EXTENT,
            player_spawn: SpawnPoint {
                x: DEFAULT_SPAWN_COORD,
                y: DEFAULT_SPAWN_COORD,
            },
            enemy_spawns: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config json: {message}")]
    Parse { message: String },
    #[error("validation failed at {field}: {message}")]
    Invalid { field: String, message: String },
}

impl GameConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: GameConfig =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                let path = error.path().to_string();
                let source = error.into_inner();
                let message = if path.is_empty() || path == "." {
                    source.to_string()
                } else {
                    format!("at {path}: {source}")
                };
                ConfigError::Parse { message }
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        speed("player_speed", self.player_speed)?;
        speed("enemy_speed", self.enemy_speed)?;
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        finite("player_spawn.x", self.player_spawn.x)?;
        finite("player_spawn.y", self.player_spawn.y)?;
        for (index, spawn) in self.enemy_spawns.iter().enumerate() {
            finite(&format!("enemy_spawns[{index}].x"), spawn.x)?;
            finite(&format!("enemy_spawns[{index}].y"), spawn.y)?;
        }
        Ok(())
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    pub fn player_spawn_position(&self) -> Vec2 {
        self.player_spawn.position()
    }
}

fn finite(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        return Ok(());
    }
    Err(invalid(
        field,
        format!("expected a finite number, got {value}"),
    ))
}

fn speed(field: &str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=MAX_CONFIG_SPEED).contains(&value) {
        return Err(invalid(
            field,
            format!("expected 0..={MAX_CONFIG_SPEED}, got {value}"),
        ));
    }
    Ok(())
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(invalid(field, format!("expected > 0, got {value}")));
    }
    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message,
    }
}

/// Where config snapshots come from. `last_modified` returning `None` means
/// the timestamp could not be read and is treated as unchanged.
pub trait ConfigSource {
    fn last_modified(&self) -> Option<SystemTime>;
    fn load(&self) -> Result<GameConfig, ConfigError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    config: GameConfig,
    modified: Option<SystemTime>,
}

impl StaticConfigSource {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            modified: None,
        }
    }
}

impl ConfigSource for StaticConfigSource {
    fn last_modified(&self) -> Option<SystemTime> {
        self.modified
    }

    fn load(&self) -> Result<GameConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    Timestamp,
    Manual,
}

/// Polls a [`ConfigSource`] on a fixed interval and hands back freshly
/// loaded snapshots.
#[derive(Debug, Clone, Default)]
pub struct HotReloadController {
    poll_elapsed_seconds: f32,
    last_modified: Option<SystemTime>,
}

impl HotReloadController {
    pub fn new(last_modified: Option<SystemTime>) -> Self {
        Self {
            poll_elapsed_seconds: 0.0,
            last_modified,
        }
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// Advances the poll timer and returns a new config when the source
    /// changed or `manual` asks for a reload. Load failures are logged and
    /// leave the recorded timestamp alone so the next poll retries.
    pub fn poll(
        &mut self,
        dt_seconds: f32,
        source: &dyn ConfigSource,
        manual: bool,
    ) -> Option<(GameConfig, ReloadTrigger)> {
        self.poll_elapsed_seconds += dt_seconds.max(0.0);

        if manual {
            let modified = source.last_modified();
            return self
                .load_from(source, modified, ReloadTrigger::Manual)
                .map(|config| (config, ReloadTrigger::Manual));
        }

        if self.poll_elapsed_seconds < HOT_RELOAD_POLL_SECONDS {
            return None;
        }
        self.poll_elapsed_seconds = 0.0;

        let modified = source.last_modified()?;
        if self.last_modified == Some(modified) {
            return None;
        }
        self.load_from(source, Some(modified), ReloadTrigger::Timestamp)
            .map(|config| (config, ReloadTrigger::Timestamp))
    }

    fn load_from(
        &mut self,
        source: &dyn ConfigSource,
        modified: Option<SystemTime>,
        trigger: ReloadTrigger,
    ) -> Option<GameConfig> {
        match source.load() {
            Ok(config) => {
                if modified.is_some() {
                    self.last_modified = modified;
                }
                info!(trigger = ?trigger, "config_loaded");
                Some(config)
            }
            Err(error) => {
                warn!(trigger = ?trigger, error = %error, "config_reload_failed");
                None
            }
        }
    }
}
