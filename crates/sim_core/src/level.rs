use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::entity::{EnemyKind, PickupKind};
use crate::math::Vec2;
use crate::tilemap::{TileGrid, TileMarker, TilemapError};

#[derive(Debug, Error)]
pub enum LevelLoadError {
    #[error("level index {index} out of range (have {count})")]
    OutOfRange { index: usize, count: usize },
    #[error("read level {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse level {path} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
}

/// Indexed sequence of levels. Index 0 is the first level played.
pub trait LevelSource {
    fn level_count(&self) -> usize;
    fn load_level(&self, index: usize) -> Result<TileGrid, LevelLoadError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticLevelSource {
    levels: Vec<TileGrid>,
}

impl StaticLevelSource {
    pub fn new(levels: Vec<TileGrid>) -> Self {
        Self { levels }
    }
}

impl LevelSource for StaticLevelSource {
    fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn load_level(&self, index: usize) -> Result<TileGrid, LevelLoadError> {
        self.levels
            .get(index)
            .cloned()
            .ok_or(LevelLoadError::OutOfRange {
                index,
                count: self.levels.len(),
            })
    }
}

/// Spawn positions read from a grid's markers at level build time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelLayout {
    pub player_spawn: Option<Vec2>,
    pub enemy_spawns: Vec<(EnemyKind, Vec2)>,
    pub pickup_spawns: Vec<(PickupKind, Vec2)>,
}

impl LevelLayout {
    /// The first player marker wins; later ones are ignored.
    pub fn from_grid(grid: &TileGrid) -> Self {
        let mut layout = Self::default();
        for (marker, tile) in grid.markers() {
            let center = grid.tile_center(tile);
            match marker {
                TileMarker::Player => {
                    layout.player_spawn.get_or_insert(center);
                }
                TileMarker::Enemy(kind) => layout.enemy_spawns.push((kind, center)),
                TileMarker::Pickup(kind) => layout.pickup_spawns.push((kind, center)),
            }
        }
        layout
    }

    pub fn token_count(&self) -> u32 {
        let count = self
            .pickup_spawns
            .iter()
            .filter(|(kind, _)| *kind == PickupKind::Token)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
