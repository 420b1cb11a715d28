use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::math::Vec2;
use crate::tilemap::{TileCoord, TileGrid};

pub const DEFAULT_MAX_EXPANSIONS: usize = 4096;

/// Bounded A* over the 4-connected grid with unit step cost and a Manhattan
/// heuristic. Returns the tiles from `start` to `goal` inclusive, or an empty
/// list when either endpoint is blocked, no route exists, or the search needs
/// more than `max_expansions` node expansions.
pub fn find_path(
    grid: &TileGrid,
    start: TileCoord,
    goal: TileCoord,
    max_expansions: usize,
) -> Vec<TileCoord> {
    let (Some(start_index), Some(goal_index)) = (grid.index_of(start), grid.index_of(goal)) else {
        return Vec::new();
    };
    if grid.is_solid(start) || grid.is_solid(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let node_count = grid.width() as usize * grid.height() as usize;
    let mut closed = vec![false; node_count];
    let mut best_g = vec![u32::MAX; node_count];
    let mut parent = vec![None::<usize>; node_count];
    let mut open = BinaryHeap::new();
    let mut next_insertion = 0u64;
    let mut expanded = 0usize;

    best_g[start_index] = 0;
    open.push(Reverse(OpenNode {
        f_cost: start.manhattan_distance(goal),
        insertion_order: next_insertion,
        index: start_index,
    }));
    next_insertion += 1;

    while let Some(Reverse(current)) = open.pop() {
        if closed[current.index] {
            continue;
        }
        closed[current.index] = true;

        if current.index == goal_index {
            return reconstruct_tile_path(grid, &parent, start_index, goal_index);
        }

        expanded += 1;
        if expanded > max_expansions {
            return Vec::new();
        }

        let coord = grid.coord_of(current.index);
        let current_g = best_g[current.index];
        for neighbor in neighbors(coord) {
            let Some(neighbor_index) = grid.index_of(neighbor) else {
                continue;
            };
            if closed[neighbor_index] || grid.is_solid(neighbor) {
                continue;
            }

            let tentative_g = current_g.saturating_add(1);
            if tentative_g >= best_g[neighbor_index] {
                continue;
            }

            best_g[neighbor_index] = tentative_g;
            parent[neighbor_index] = Some(current.index);
            open.push(Reverse(OpenNode {
                f_cost: tentative_g.saturating_add(neighbor.manhattan_distance(goal)),
                insertion_order: next_insertion,
                index: neighbor_index,
            }));
            next_insertion += 1;
        }
    }

    Vec::new()
}

// Field order is the heap order: lowest f first, then earliest discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f_cost: u32,
    insertion_order: u64,
    index: usize,
}

fn neighbors(coord: TileCoord) -> [TileCoord; 4] {
    [
        TileCoord::new(coord.x + 1, coord.y),
        TileCoord::new(coord.x - 1, coord.y),
        TileCoord::new(coord.x, coord.y + 1),
        TileCoord::new(coord.x, coord.y - 1),
    ]
}

fn reconstruct_tile_path(
    grid: &TileGrid,
    parent: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Vec<TileCoord> {
    let mut cursor = goal_index;
    let mut indices = vec![cursor];

    while cursor != start_index {
        let Some(next) = parent.get(cursor).copied().flatten() else {
            return Vec::new();
        };
        cursor = next;
        indices.push(cursor);
    }
    indices.reverse();
    indices
        .into_iter()
        .map(|index| grid.coord_of(index))
        .collect()
}

/// Converts a start-to-goal tile path into world waypoints, dropping the
/// start tile the walker already stands on. A single-tile path keeps its only
/// tile so the walker still settles on the goal center.
pub fn waypoints_from_tile_path(grid: &TileGrid, tile_path: &[TileCoord]) -> Vec<Vec2> {
    match tile_path {
        [] => Vec::new(),
        [only] => vec![grid.tile_center(*only)],
        [_, rest @ ..] => rest.iter().map(|tile| grid.tile_center(*tile)).collect(),
    }
}

/// Per-enemy path-following record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathFollow {
    pub waypoints: Vec<Vec2>,
    pub next_waypoint_index: usize,
    pub repath_cooldown_seconds: f32,
    pub last_goal: Option<TileCoord>,
}

impl PathFollow {
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.next_waypoint_index).copied()
    }

    pub fn advance_waypoint(&mut self) {
        if self.next_waypoint_index < self.waypoints.len() {
            self.next_waypoint_index = self.next_waypoint_index.saturating_add(1);
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_waypoint_index >= self.waypoints.len()
    }

    pub fn set_waypoints(&mut self, waypoints: Vec<Vec2>) {
        self.waypoints = waypoints;
        self.next_waypoint_index = 0;
    }

    pub fn remaining_waypoints(&self) -> &[Vec2] {
        self.waypoints
            .get(self.next_waypoint_index..)
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
