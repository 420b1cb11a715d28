use thiserror::Error;

use crate::entity::{EnemyKind, PickupKind};
use crate::math::Vec2;

pub const SOLID_TILE_ID: u16 = 1;
pub const TOKEN_MARKER_ID: u16 = 2;
pub const GRUNT_MARKER_ID: u16 = 3;
pub const PLAYER_MARKER_ID: u16 = 4;
pub const HEALTH_MARKER_ID: u16 = 5;
pub const SPEED_MARKER_ID: u16 = 6;
pub const SHIELD_MARKER_ID: u16 = 7;
pub const RUNNER_MARKER_ID: u16 = 8;

const RESOLVE_DEGENERATE_DISTANCE_SQ: f32 = 0.00001;
const MAX_SWEEP_STEPS: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }
}

/// One-shot spawn marker baked into a level's tile ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMarker {
    Player,
    Enemy(EnemyKind),
    Pickup(PickupKind),
}

impl TileMarker {
    pub fn from_tile_id(tile_id: u16) -> Option<Self> {
        match tile_id {
            TOKEN_MARKER_ID => Some(Self::Pickup(PickupKind::Token)),
            GRUNT_MARKER_ID => Some(Self::Enemy(EnemyKind::Grunt)),
            PLAYER_MARKER_ID => Some(Self::Player),
            HEALTH_MARKER_ID => Some(Self::Pickup(PickupKind::Health)),
            SPEED_MARKER_ID => Some(Self::Pickup(PickupKind::Speed)),
            SHIELD_MARKER_ID => Some(Self::Pickup(PickupKind::Shield)),
            RUNNER_MARKER_ID => Some(Self::Enemy(EnemyKind::Runner)),
            _ => None,
        }
    }
}

/// Grid convention:
/// - tile `(0,0)` covers world `[0, tile_size) x [0, tile_size)`.
/// - `+y` grows downward, one row per tile.
/// - anything outside `width x height` reads as solid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tilemap must have at least one row and one column")]
    Empty,
    #[error("tile size must be finite and positive, got {tile_size}")]
    InvalidTileSize { tile_size: f32 },
}

impl TileGrid {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: f32,
        tiles: Vec<u16>,
    ) -> Result<Self, TilemapError> {
        if width == 0 || height == 0 {
            return Err(TilemapError::Empty);
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(TilemapError::InvalidTileSize { tile_size });
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * self.tile_size,
            y: self.height as f32 * self.tile_size,
        }
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as u32) < self.width && (tile.y as u32) < self.height
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if !self.in_bounds(tile) {
            return None;
        }
        Some(tile.y as usize * self.width as usize + tile.x as usize)
    }

    pub fn coord_of(&self, index: usize) -> TileCoord {
        let width = self.width as usize;
        TileCoord {
            x: (index % width) as i32,
            y: (index / width) as i32,
        }
    }

    pub fn tile_at(&self, tile: TileCoord) -> Option<u16> {
        self.index_of(tile)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn is_solid(&self, tile: TileCoord) -> bool {
        self.tile_at(tile)
            .map_or(true, |tile_id| tile_id == SOLID_TILE_ID)
    }

    pub fn is_solid_at_world(&self, world: Vec2) -> bool {
        self.is_solid(self.world_to_tile(world))
    }

    pub fn world_to_tile(&self, world: Vec2) -> TileCoord {
        TileCoord {
            x: (world.x / self.tile_size).floor() as i32,
            y: (world.y / self.tile_size).floor() as i32,
        }
    }

    pub fn tile_center(&self, tile: TileCoord) -> Vec2 {
        Vec2 {
            x: (tile.x as f32 + 0.5) * self.tile_size,
            y: (tile.y as f32 + 0.5) * self.tile_size,
        }
    }

    /// Pushes a circle out of every solid tile it overlaps. Tiles are visited
    /// row-major, so only the tie-break direction at corners depends on order.
    pub fn resolve_circle(&self, position: &mut Vec2, radius: f32) {
        if !position.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let min = self.world_to_tile(Vec2::new(position.x - radius, position.y - radius));
        let max = self.world_to_tile(Vec2::new(position.x + radius, position.y + radius));
        let radius_sq = radius * radius;

        for ty in min.y..=max.y {
            for tx in min.x..=max.x {
                if !self.is_solid(TileCoord { x: tx, y: ty }) {
                    continue;
                }

                let left = tx as f32 * self.tile_size;
                let top = ty as f32 * self.tile_size;
                let right = left + self.tile_size;
                let bottom = top + self.tile_size;

                let closest = Vec2 {
                    x: position.x.clamp(left, right),
                    y: position.y.clamp(top, bottom),
                };
                let offset = *position - closest;
                let distance_sq = offset.length_squared();
                if distance_sq >= radius_sq || distance_sq <= RESOLVE_DEGENERATE_DISTANCE_SQ {
                    continue;
                }

                let distance = distance_sq.sqrt();
                let penetration = radius - distance;
                *position += offset * (penetration / distance);
            }
        }
    }

    /// Moves a circle by `delta` in sub-steps of at most half its radius,
    /// resolving after each one, so a fast mover cannot skip over a wall.
    pub fn sweep_circle(&self, position: &mut Vec2, delta: Vec2, radius: f32) {
        if !delta.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let max_step = (radius * 0.5).min(self.tile_size * 0.5);
        let steps = (delta.length() / max_step)
            .ceil()
            .clamp(1.0, MAX_SWEEP_STEPS as f32) as u32;
        let step = delta * (1.0 / steps as f32);
        for _ in 0..steps {
            *position += step;
            self.resolve_circle(position, radius);
        }
    }

    /// Spawn markers in row-major order, each paired with its tile.
    pub fn markers(&self) -> Vec<(TileMarker, TileCoord)> {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(index, tile_id)| {
                TileMarker::from_tile_id(*tile_id).map(|marker| (marker, self.coord_of(index)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::new(width, height, 64.0, vec![0; (width * height) as usize]).expect("grid")
    }

    fn grid_with_walls(width: u32, height: u32, walls: &[(i32, i32)]) -> TileGrid {
        let mut tiles = vec![0u16; (width * height) as usize];
        for (x, y) in walls {
            tiles[(*y as u32 * width + *x as u32) as usize] = SOLID_TILE_ID;
        }
        TileGrid::new(width, height, 64.0, tiles).expect("grid")
    }

    #[test]
    fn construction_rejects_bad_shapes() {
        assert_eq!(
            TileGrid::new(2, 2, 64.0, vec![0; 3]),
            Err(TilemapError::TileCountMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            TileGrid::new(0, 2, 64.0, Vec::new()),
            Err(TilemapError::Empty)
        );
        assert!(matches!(
            TileGrid::new(1, 1, 0.0, vec![0]),
            Err(TilemapError::InvalidTileSize { .. })
        ));
    }

    #[test]
    fn out_of_bounds_reads_as_solid() {
        let grid = open_grid(3, 3);
        assert!(!grid.is_solid(TileCoord::new(1, 1)));
        assert!(grid.is_solid(TileCoord::new(-1, 0)));
        assert!(grid.is_solid(TileCoord::new(0, 3)));
        assert!(grid.is_solid(TileCoord::new(3, 0)));
        assert!(grid.is_solid_at_world(Vec2::new(-0.5, 10.0)));
    }

    #[test]
    fn world_tile_conversion_uses_floor_division() {
        let grid = open_grid(4, 4);
        let below_edge = grid.world_to_tile(Vec2::new(63.9, 64.0));
        assert_eq!(below_edge, TileCoord::new(0, 1));
        let left_of_origin = grid.world_to_tile(Vec2::new(-0.1, 0.0));
        assert_eq!(left_of_origin, TileCoord::new(-1, 0));
        let center = grid.tile_center(TileCoord::new(2, 1));
        assert_eq!(center, Vec2::new(160.0, 96.0));
        assert_eq!(
            grid.world_to_tile(grid.tile_center(TileCoord::new(3, 2))),
            TileCoord::new(3, 2)
        );
    }

    #[test]
    fn marker_ids_are_not_solid() {
        let tiles = vec![
            SOLID_TILE_ID,
            TOKEN_MARKER_ID,
            GRUNT_MARKER_ID,
            PLAYER_MARKER_ID,
        ];
        let grid = TileGrid::new(4, 1, 32.0, tiles).expect("grid");
        assert!(grid.is_solid(TileCoord::new(0, 0)));
        assert!(!grid.is_solid(TileCoord::new(1, 0)));
        assert_eq!(
            grid.markers(),
            vec![
                (TileMarker::Pickup(PickupKind::Token), TileCoord::new(1, 0)),
                (TileMarker::Enemy(EnemyKind::Grunt), TileCoord::new(2, 0)),
                (TileMarker::Player, TileCoord::new(3, 0)),
            ]
        );
    }

    #[test]
    fn resolve_circle_pushes_out_of_wall_face() {
        let grid = grid_with_walls(5, 5, &[(2, 2)]);
        // wall spans x in [128, 192); circle center 10 units left of the face
        let mut position = Vec2::new(118.0, 160.0);
        grid.resolve_circle(&mut position, 16.0);
        assert!((position.x - 112.0).abs() < 1.0e-4, "x = {}", position.x);
        assert!((position.y - 160.0).abs() < 1.0e-4);
    }

    #[test]
    fn resolve_circle_pushes_diagonally_off_corner() {
        let grid = grid_with_walls(5, 5, &[(2, 2)]);
        let mut position = Vec2::new(120.0, 120.0);
        grid.resolve_circle(&mut position, 16.0);
        let corner = Vec2::new(128.0, 128.0);
        let distance = (position - corner).length();
        assert!((distance - 16.0).abs() < 1.0e-3, "distance = {distance}");
        assert!((position.x - position.y).abs() < 1.0e-4);
    }

    #[test]
    fn resolve_circle_is_idempotent_when_clear() {
        let grid = grid_with_walls(5, 5, &[(2, 2), (2, 3)]);
        let mut position = Vec2::new(100.0, 170.0);
        grid.resolve_circle(&mut position, 16.0);
        let once = position;
        grid.resolve_circle(&mut position, 16.0);
        assert_eq!(position, once);
        assert_eq!(once, Vec2::new(100.0, 170.0));
    }

    #[test]
    fn resolve_circle_keeps_circle_inside_grid_edges() {
        let grid = open_grid(4, 4);
        let mut position = Vec2::new(5.0, 100.0);
        grid.resolve_circle(&mut position, 16.0);
        assert!((position.x - 16.0).abs() < 1.0e-4, "x = {}", position.x);
    }

    #[test]
    fn sweep_circle_stops_at_wall_face_instead_of_tunneling() {
        let grid = grid_with_walls(6, 5, &[(2, 2)]);
        // one-step move would land past the wall at x = 300
        let mut position = Vec2::new(100.0, 160.0);
        grid.sweep_circle(&mut position, Vec2::new(200.0, 0.0), 20.0);
        assert!((position.x - 108.0).abs() < 1.0e-3, "x = {}", position.x);
        assert!((position.y - 160.0).abs() < 1.0e-3);

        let mut open = Vec2::new(100.0, 32.0);
        grid.sweep_circle(&mut open, Vec2::new(150.0, 0.0), 20.0);
        assert!((open.x - 250.0).abs() < 1.0e-3, "x = {}", open.x);
    }
}
