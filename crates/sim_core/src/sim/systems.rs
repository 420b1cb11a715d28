use tracing::{debug, info};

use super::events::{SimEvent, SimEventBus};
use super::TokenProgress;
use crate::camera::{Camera2D, ShakeCue};
use crate::config::GameConfig;
use crate::entity::{AiState, Body, Enemy, EntityStore, PickupKind, Player};
use crate::flow::{FlowController, FlowState};
use crate::input::InputSnapshot;
use crate::math::{clamp_circle_to_world, Vec2};
use crate::nav::{find_path, waypoints_from_tile_path, DEFAULT_MAX_EXPANSIONS};
use crate::tilemap::{TileCoord, TileGrid};
use crate::tuning::Tunables;

pub const REPATH_INTERVAL_SECONDS: f32 = 0.25;
pub const WAYPOINT_REACH_RADIUS: f32 = 6.0;
pub const SHIELD_GRACE_SECONDS: f32 = 0.35;
pub const SPEED_BUFF_SECONDS: f32 = 4.0;
pub const SPEED_BUFF_MULTIPLIER: f32 = 1.5;
pub const SHIELD_SECONDS: f32 = 6.0;
const KNOCKBACK_DAMPING_PER_SECOND: f32 = 10.0;
const KNOCKBACK_REST_SPEED: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimSystemId {
    StatusTimers,
    PlayerMovement,
    EnemyAi,
    EnemySeparation,
    PlayerEnemyContact,
    Pickups,
    Outcome,
    Camera,
}

impl SimSystemId {
    #[cfg(test)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::StatusTimers => "StatusTimers",
            Self::PlayerMovement => "PlayerMovement",
            Self::EnemyAi => "EnemyAi",
            Self::EnemySeparation => "EnemySeparation",
            Self::PlayerEnemyContact => "PlayerEnemyContact",
            Self::Pickups => "Pickups",
            Self::Outcome => "Outcome",
            Self::Camera => "Camera",
        }
    }
}

pub(crate) const SIM_SYSTEM_ORDER: [SimSystemId; 8] = [
    SimSystemId::StatusTimers,
    SimSystemId::PlayerMovement,
    SimSystemId::EnemyAi,
    SimSystemId::EnemySeparation,
    SimSystemId::PlayerEnemyContact,
    SimSystemId::Pickups,
    SimSystemId::Outcome,
    SimSystemId::Camera,
];

pub(crate) struct SimSystemContext<'a> {
    pub(crate) dt_seconds: f32,
    pub(crate) input: &'a InputSnapshot,
    pub(crate) viewport: (u32, u32),
    pub(crate) config: &'a GameConfig,
    pub(crate) tunables: &'a Tunables,
    pub(crate) grid: &'a TileGrid,
    pub(crate) store: &'a mut EntityStore,
    pub(crate) camera: &'a mut Camera2D,
    pub(crate) flow: &'a mut FlowController,
    pub(crate) tokens: &'a mut TokenProgress,
    pub(crate) events: &'a mut SimEventBus,
}

#[derive(Debug, Default)]
pub(crate) struct SimSystemsHost {
    pub(crate) last_tick_order: Vec<SimSystemId>,
}

impl SimSystemsHost {
    pub(crate) fn run_once_per_tick(&mut self, context: &mut SimSystemContext<'_>) {
        self.last_tick_order.clear();
        for system_id in SIM_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            run_system(system_id, context);
        }
    }
}

fn run_system(system_id: SimSystemId, context: &mut SimSystemContext<'_>) {
    match system_id {
        SimSystemId::StatusTimers => run_status_timers(context),
        SimSystemId::PlayerMovement => run_player_movement(context),
        SimSystemId::EnemyAi => run_enemy_ai(context),
        SimSystemId::EnemySeparation => run_enemy_separation(context),
        SimSystemId::PlayerEnemyContact => run_player_enemy_contact(context),
        SimSystemId::Pickups => run_pickups(context),
        SimSystemId::Outcome => run_outcome(context),
        SimSystemId::Camera => run_camera(context),
    }
}

fn run_status_timers(context: &mut SimSystemContext<'_>) {
    let player = context.store.player_mut();
    player.invulnerable_seconds = (player.invulnerable_seconds - context.dt_seconds).max(0.0);
    player.buffs.decay(context.dt_seconds);
}

fn run_player_movement(context: &mut SimSystemContext<'_>) {
    let dt = context.dt_seconds;
    let world_size = context.config.world_size();
    let grid = context.grid;
    let direction = context.input.movement_axis().normalize_or_zero();
    let player = context.store.player_mut();

    let mut speed = context.config.player_speed;
    if player.buffs.speed_active() {
        speed *= SPEED_BUFF_MULTIPLIER;
    }

    let delta = direction * (speed * dt) + player.knockback_velocity * dt;
    player.knockback_velocity = damp_knockback(player.knockback_velocity, dt);

    let mut position = player.body.position;
    grid.sweep_circle(&mut position, delta, player.body.radius);
    position = clamp_circle_to_world(position, player.body.radius, world_size);
    grid.resolve_circle(&mut position, player.body.radius);
    player.body.position = position;
}

pub(crate) fn damp_knockback(velocity: Vec2, dt_seconds: f32) -> Vec2 {
    let damped = velocity * (-KNOCKBACK_DAMPING_PER_SECOND * dt_seconds).exp();
    if damped.length_squared() < KNOCKBACK_REST_SPEED * KNOCKBACK_REST_SPEED {
        return Vec2::ZERO;
    }
    damped
}

fn run_enemy_ai(context: &mut SimSystemContext<'_>) {
    let dt = context.dt_seconds;
    let grid = context.grid;
    let enemy_speed = context.config.enemy_speed;
    let player_position = context.store.player().body.position;
    let goal_tile = grid.world_to_tile(player_position);

    for enemy in context.store.enemies_mut() {
        if !enemy.active {
            continue;
        }

        let distance_sq = enemy.body.position.distance_squared(player_position);
        let next_state = enemy.ai.next_state(distance_sq);
        if next_state != enemy.ai.state {
            debug!(enemy = enemy.id.0, state = ?next_state, "enemy_ai_changed");
            context.events.emit(SimEvent::EnemyAiChanged {
                id: enemy.id,
                state: next_state,
            });
            enemy.ai.state = next_state;
            if next_state == AiState::Idle {
                enemy.path.clear();
            }
        }
        if enemy.ai.state != AiState::Seek {
            continue;
        }

        enemy.path.repath_cooldown_seconds = (enemy.path.repath_cooldown_seconds - dt).max(0.0);
        let goal_changed = enemy.path.last_goal != Some(goal_tile);
        let cooldown_elapsed = enemy.path.repath_cooldown_seconds <= 0.0;
        if cooldown_elapsed && (goal_changed || enemy.path.is_exhausted()) {
            repath_enemy(enemy, grid, goal_tile, context.events);
        }

        let speed = enemy_speed * enemy.kind.speed_multiplier();
        follow_waypoints(enemy, grid, speed * dt);
        grid.resolve_circle(&mut enemy.body.position, enemy.body.radius);
    }
}

fn repath_enemy(
    enemy: &mut Enemy,
    grid: &TileGrid,
    goal_tile: TileCoord,
    events: &mut SimEventBus,
) {
    let start_tile = grid.world_to_tile(enemy.body.position);
    let tile_path = find_path(grid, start_tile, goal_tile, DEFAULT_MAX_EXPANSIONS);
    enemy.path.repath_cooldown_seconds = REPATH_INTERVAL_SECONDS;
    enemy.path.last_goal = Some(goal_tile);

    if tile_path.is_empty() {
        debug!(
            enemy = enemy.id.0,
            start_x = start_tile.x,
            start_y = start_tile.y,
            goal_x = goal_tile.x,
            goal_y = goal_tile.y,
            "enemy_path_failed"
        );
        enemy.path.set_waypoints(Vec::new());
        events.emit(SimEvent::PathFailed { id: enemy.id });
        return;
    }
    enemy
        .path
        .set_waypoints(waypoints_from_tile_path(grid, &tile_path));
}

fn follow_waypoints(enemy: &mut Enemy, grid: &TileGrid, max_step: f32) {
    let Some(waypoint) = enemy.path.current_waypoint() else {
        return;
    };
    let to_waypoint = waypoint - enemy.body.position;
    let distance = to_waypoint.length();
    if distance > 0.0 {
        let step = max_step.min(distance);
        grid.sweep_circle(
            &mut enemy.body.position,
            to_waypoint * (step / distance),
            enemy.body.radius,
        );
    }
    let reach_sq = WAYPOINT_REACH_RADIUS * WAYPOINT_REACH_RADIUS;
    if enemy.body.position.distance_squared(waypoint) <= reach_sq {
        enemy.path.advance_waypoint();
    }
}

fn run_enemy_separation(context: &mut SimSystemContext<'_>) {
    let grid = context.grid;
    let enemies = context.store.enemies_mut();
    for second in 1..enemies.len() {
        let (head, tail) = enemies.split_at_mut(second);
        let Some(b) = tail.first_mut() else {
            continue;
        };
        if !b.active {
            continue;
        }
        for a in head.iter_mut().filter(|enemy| enemy.active) {
            separate_circles(&mut a.body, &mut b.body);
        }
    }
    for enemy in enemies.iter_mut().filter(|enemy| enemy.active) {
        grid.resolve_circle(&mut enemy.body.position, enemy.body.radius);
    }
}

fn run_player_enemy_contact(context: &mut SimSystemContext<'_>) {
    let world_size = context.config.world_size();
    let tunables = context.tunables;
    let grid = context.grid;
    let (player, enemies) = context.store.player_and_enemies_mut();

    for enemy in enemies.iter_mut().filter(|enemy| enemy.active) {
        if !circles_overlap(&enemy.body, &player.body) {
            continue;
        }
        separate_circles(&mut enemy.body, &mut player.body);
        let normal = (player.body.position - enemy.body.position).normalize_or(Vec2::UNIT_X);

        if !player.is_invulnerable() && player.health > 0 {
            apply_hit(
                player,
                enemy,
                normal,
                tunables,
                context.camera,
                context.events,
            );
        }

        player.body.position =
            clamp_circle_to_world(player.body.position, player.body.radius, world_size);
        grid.resolve_circle(&mut player.body.position, player.body.radius);
    }
}

fn apply_hit(
    player: &mut Player,
    enemy: &Enemy,
    normal: Vec2,
    tunables: &Tunables,
    camera: &mut Camera2D,
    events: &mut SimEventBus,
) {
    if player.buffs.shield_active() {
        player.buffs.shield_seconds = 0.0;
        player.invulnerable_seconds = SHIELD_GRACE_SECONDS;
        camera.start_shake(ShakeCue::Light);
        debug!(enemy = enemy.id.0, "shield_absorbed_hit");
        events.emit(SimEvent::ShieldAbsorbed { by: enemy.id });
        return;
    }

    player.health = player.health.saturating_sub(1);
    player.knockback_velocity = normal * tunables.knockback_strength;
    player.invulnerable_seconds = tunables.invulnerability_seconds;
    camera.start_shake(ShakeCue::Strong);
    debug!(enemy = enemy.id.0, health = player.health, "player_damaged");
    events.emit(SimEvent::PlayerDamaged {
        by: enemy.id,
        health: player.health,
    });
}

fn run_pickups(context: &mut SimSystemContext<'_>) {
    let (player, pickups) = context.store.player_and_pickups_mut();
    for pickup in pickups.iter_mut().filter(|pickup| pickup.active) {
        if !circles_overlap(&pickup.body, &player.body) {
            continue;
        }
        pickup.active = false;
        match pickup.kind {
            PickupKind::Token => context.tokens.collect(),
            // no healing once the player is down
            PickupKind::Health if player.health > 0 => {
                player.health = player.health.saturating_add(1).min(player.max_health);
            }
            PickupKind::Health => {}
            PickupKind::Speed => player.buffs.speed_seconds = SPEED_BUFF_SECONDS,
            PickupKind::Shield => player.buffs.shield_seconds = SHIELD_SECONDS,
        }
        debug!(pickup = pickup.id.0, kind = ?pickup.kind, "pickup_collected");
        context.events.emit(SimEvent::PickupCollected {
            id: pickup.id,
            kind: pickup.kind,
        });
    }
}

fn run_outcome(context: &mut SimSystemContext<'_>) {
    let before = context.flow.state();
    let changed = if context.store.player().health == 0 {
        context.flow.trigger_lose()
    } else if context.tokens.is_complete() {
        context.flow.trigger_win()
    } else {
        false
    };
    if !changed {
        return;
    }
    let after = context.flow.state();
    context.events.emit(SimEvent::FlowChanged {
        from: before,
        to: after,
    });
    if after == FlowState::Lose {
        info!(tokens = context.tokens.collected, "session_lost");
    } else {
        info!(tokens = context.tokens.collected, "session_won");
    }
}

fn run_camera(context: &mut SimSystemContext<'_>) {
    let zoom = context.tunables.camera_zoom;
    context.camera.set_zoom_clamped(zoom);
    context.camera.follow(
        context.store.player().body.position,
        context.viewport,
        context.config.world_size(),
    );
    context.camera.tick_shake(context.dt_seconds);
}

pub(crate) fn circles_overlap(a: &Body, b: &Body) -> bool {
    let radius_sum = a.radius + b.radius;
    a.position.distance_squared(b.position) <= radius_sum * radius_sum
}

/// Pushes both bodies apart by half the overlap each, along `a -> b`.
/// Coincident centers separate along `+x`.
pub(crate) fn separate_circles(a: &mut Body, b: &mut Body) {
    if !circles_overlap(a, b) {
        return;
    }
    let delta = b.position - a.position;
    let normal = delta.normalize_or(Vec2::UNIT_X);
    let penetration = a.radius + b.radius - delta.length();
    if penetration <= 0.0 {
        return;
    }
    let half = normal * (penetration * 0.5);
    a.position -= half;
    b.position += half;
}
