use crate::camera::{clamp_camera_zoom, CAMERA_ZOOM_DEFAULT};
use crate::entity::{EntityId, EntityKind};
use crate::math::Vec2;

pub const MAX_DEBUG_ROWS: usize = 256;

const MAX_HEALTH_RANGE: (u32, u32) = (1, 20);
const INVULNERABILITY_RANGE: (f32, f32) = (0.0, 5.0);
const KNOCKBACK_RANGE: (f32, f32) = (0.0, 5000.0);
const SHAKE_STRENGTH_RANGE: (f32, f32) = (0.0, 25.0);

/// Live tunables owned by the simulation and edited through [`TuningEdit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub max_health: u32,
    pub invulnerability_seconds: f32,
    pub knockback_strength: f32,
    pub camera_zoom: f32,
    pub shake_strength: f32,
    pub show_grid: bool,
    pub show_paths: bool,
    pub show_colliders: bool,
    pub show_overlay: bool,
    /// Freezes the world systems; input edges and hot reload keep running.
    pub paused: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            max_health: 5,
            invulnerability_seconds: 0.75,
            knockback_strength: 600.0,
            camera_zoom: CAMERA_ZOOM_DEFAULT,
            shake_strength: 6.0,
            show_grid: true,
            show_paths: false,
            show_colliders: false,
            show_overlay: true,
            paused: false,
        }
    }
}

/// Partial edit from the debug collaborator. `None` leaves a value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TuningEdit {
    pub max_health: Option<u32>,
    pub invulnerability_seconds: Option<f32>,
    pub knockback_strength: Option<f32>,
    pub camera_zoom: Option<f32>,
    pub shake_strength: Option<f32>,
    pub show_grid: Option<bool>,
    pub show_paths: Option<bool>,
    pub show_colliders: Option<bool>,
    pub pause: Option<bool>,
    pub request_reload: bool,
}

impl Tunables {
    /// Applies `edit` with every value clamped to its slider range.
    /// Non-finite floats are dropped.
    pub fn apply(&mut self, edit: &TuningEdit) {
        if let Some(max_health) = edit.max_health {
            self.max_health = max_health.clamp(MAX_HEALTH_RANGE.0, MAX_HEALTH_RANGE.1);
        }
        if let Some(seconds) = finite(edit.invulnerability_seconds) {
            self.invulnerability_seconds =
                seconds.clamp(INVULNERABILITY_RANGE.0, INVULNERABILITY_RANGE.1);
        }
        if let Some(strength) = finite(edit.knockback_strength) {
            self.knockback_strength = strength.clamp(KNOCKBACK_RANGE.0, KNOCKBACK_RANGE.1);
        }
        if let Some(zoom) = finite(edit.camera_zoom) {
            self.camera_zoom = clamp_camera_zoom(zoom);
        }
        if let Some(strength) = finite(edit.shake_strength) {
            self.shake_strength = strength.clamp(SHAKE_STRENGTH_RANGE.0, SHAKE_STRENGTH_RANGE.1);
        }
        if let Some(show_grid) = edit.show_grid {
            self.show_grid = show_grid;
        }
        if let Some(show_paths) = edit.show_paths {
            self.show_paths = show_paths;
        }
        if let Some(show_colliders) = edit.show_colliders {
            self.show_colliders = show_colliders;
        }
        if let Some(pause) = edit.pause {
            self.paused = pause;
        }
    }
}

fn finite(value: Option<f32>) -> Option<f32> {
    value.filter(|value| value.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugEntityRow {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub radius: f32,
    pub ai_seeking: bool,
}

/// Per-tick export for the debug overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugSnapshot {
    pub rows: Vec<DebugEntityRow>,
    /// Total live entities, which may exceed `rows.len()`.
    pub entity_count: usize,
    pub tick: u64,
}
