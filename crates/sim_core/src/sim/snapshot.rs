use crate::entity::{AiState, EntityId, EntityKind, EntityStore};
use crate::flow::FlowState;
use crate::math::Vec2;
use crate::tuning::{DebugEntityRow, DebugSnapshot, MAX_DEBUG_ROWS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub radius: f32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HudCounters {
    pub health: u32,
    pub max_health: u32,
    pub tokens_collected: u32,
    pub tokens_total: u32,
    pub level_index: usize,
    pub speed_buff_seconds: f32,
    pub shield_seconds: f32,
}

/// Everything a renderer needs for one frame. Positions are blended between
/// the previous and current tick by the caller's `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub entities: Vec<RenderEntity>,
    pub camera_position: Vec2,
    pub camera_zoom: f32,
    pub shake_offset: Vec2,
    pub hud: HudCounters,
    pub flow: FlowState,
    pub show_grid: bool,
    pub show_paths: bool,
    pub show_colliders: bool,
    pub show_overlay: bool,
    /// Remaining waypoints per seeking enemy; empty unless paths are shown.
    pub enemy_paths: Vec<(EntityId, Vec<Vec2>)>,
}

pub(crate) fn render_entities(store: &EntityStore, alpha: f32) -> Vec<RenderEntity> {
    let alpha = if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        1.0
    };
    store
        .views()
        .map(|view| RenderEntity {
            id: view.id,
            kind: view.kind,
            position: view.body.interpolated(alpha),
            radius: view.body.radius,
            active: view.active,
        })
        .collect()
}

pub(crate) fn enemy_paths(store: &EntityStore) -> Vec<(EntityId, Vec<Vec2>)> {
    store
        .enemies()
        .iter()
        .filter(|enemy| enemy.active && enemy.ai.state == AiState::Seek)
        .map(|enemy| (enemy.id, enemy.path.remaining_waypoints().to_vec()))
        .collect()
}

pub(crate) fn debug_snapshot(store: &EntityStore, tick: u64) -> DebugSnapshot {
    let entity_count = store.views().filter(|view| view.active).count();
    let rows = store
        .views()
        .filter(|view| view.active)
        .take(MAX_DEBUG_ROWS)
        .map(|view| DebugEntityRow {
            id: view.id,
            kind: view.kind,
            position: view.body.position,
            radius: view.body.radius,
            ai_seeking: view.ai_state == Some(AiState::Seek),
        })
        .collect();
    DebugSnapshot {
        rows,
        entity_count,
        tick,
    }
}
