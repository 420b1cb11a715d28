mod events;
mod snapshot;
mod systems;
#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::{info, warn};

use crate::camera::Camera2D;
use crate::config::{ConfigSource, GameConfig, HotReloadController, ReloadTrigger};
use crate::entity::{EnemyKind, EntityStore};
use crate::flow::{FlowAction, FlowController, FlowState};
use crate::input::{ControlEdges, InputAction, InputSnapshot};
use crate::level::{LevelLayout, LevelLoadError, LevelSource};
use crate::math::Vec2;
use crate::tilemap::TileGrid;
use crate::tuning::{DebugSnapshot, Tunables, TuningEdit};

pub use events::SimEvent;
pub use snapshot::{HudCounters, RenderEntity, RenderSnapshot};
pub use systems::{
    REPATH_INTERVAL_SECONDS, SHIELD_GRACE_SECONDS, SHIELD_SECONDS, SPEED_BUFF_MULTIPLIER,
    SPEED_BUFF_SECONDS, WAYPOINT_REACH_RADIUS,
};

use events::SimEventBus;
use systems::{SimSystemContext, SimSystemsHost};

const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("level source has no levels")]
    NoLevels,
    #[error("load level {index}: {source}")]
    Level {
        index: usize,
        #[source]
        source: LevelLoadError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCommand {
    Continue,
    Quit,
}

/// Saturating token counter for the current level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenProgress {
    pub collected: u32,
    pub total: u32,
}

impl TokenProgress {
    pub fn new(total: u32) -> Self {
        Self {
            collected: 0,
            total,
        }
    }

    pub fn collect(&mut self) {
        self.collected = self.collected.saturating_add(1).min(self.total);
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.collected >= self.total
    }
}

/// Single-writer world state advanced one fixed step at a time.
pub struct Simulation {
    config_source: Box<dyn ConfigSource>,
    level_source: Box<dyn LevelSource>,
    config: GameConfig,
    hot_reload: HotReloadController,
    tunables: Tunables,
    reload_requested: bool,
    level_index: usize,
    grid: TileGrid,
    layout: LevelLayout,
    store: EntityStore,
    camera: Camera2D,
    flow: FlowController,
    edges: ControlEdges,
    tokens: TokenProgress,
    systems_host: SimSystemsHost,
    events: SimEventBus,
    debug_snapshot: DebugSnapshot,
    viewport: (u32, u32),
    tick_count: u64,
}

impl Simulation {
    /// Loads level 0 and the initial config. An unreadable config falls back
    /// to defaults; a missing first level is fatal.
    pub fn new(
        config_source: Box<dyn ConfigSource>,
        level_source: Box<dyn LevelSource>,
    ) -> Result<Self, SimulationError> {
        if level_source.level_count() == 0 {
            return Err(SimulationError::NoLevels);
        }
        let grid = level_source
            .load_level(0)
            .map_err(|source| SimulationError::Level { index: 0, source })?;

        let modified = config_source.last_modified();
        let (config, recorded_modified) = match config_source.load() {
            Ok(config) => (config, modified),
            Err(error) => {
                warn!(error = %error, "config_load_failed_using_defaults");
                (GameConfig::default(), None)
            }
        };

        let tunables = Tunables::default();
        let store = EntityStore::new(config.player_spawn_position(), tunables.max_health);
        let mut simulation = Self {
            config_source,
            level_source,
            config,
            hot_reload: HotReloadController::new(recorded_modified),
            tunables,
            reload_requested: false,
            level_index: 0,
            grid,
            layout: LevelLayout::default(),
            store,
            camera: Camera2D::default(),
            flow: FlowController::default(),
            edges: ControlEdges::default(),
            tokens: TokenProgress::default(),
            systems_host: SimSystemsHost::default(),
            events: SimEventBus::default(),
            debug_snapshot: DebugSnapshot::default(),
            viewport: DEFAULT_VIEWPORT,
            tick_count: 0,
        };
        simulation.build_level();
        simulation.export_debug_snapshot();
        Ok(simulation)
    }

    pub fn tick(&mut self, dt_seconds: f32, input: &InputSnapshot) -> TickCommand {
        let dt_seconds = if dt_seconds.is_finite() {
            dt_seconds.max(0.0)
        } else {
            0.0
        };
        self.tick_count = self.tick_count.saturating_add(1);
        self.events.clear_current_tick();
        self.store.store_previous_positions();

        let window_size = input.window_size();
        if window_size.0 > 0 && window_size.1 > 0 {
            self.viewport = window_size;
        }

        let pressed = self.edges.update(input);
        if pressed.pressed(InputAction::DebugToggle) {
            self.tunables.show_overlay = !self.tunables.show_overlay;
        }

        let state_before = self.flow.state();
        let action = self.flow.handle_input(&pressed);
        self.note_flow_change(state_before);

        let mut command = TickCommand::Continue;
        match action {
            FlowAction::None => {}
            FlowAction::AdvanceLevel => self.advance_level(),
            FlowAction::RestartLevel => self.restart_level(),
            FlowAction::Quit => {
                info!(tick = self.tick_count, "quit_requested");
                command = TickCommand::Quit;
            }
        }

        self.poll_hot_reload(dt_seconds);

        let simulating = state_before.is_simulating() && self.flow.state().is_simulating();
        if simulating && !self.tunables.paused {
            let mut context = SimSystemContext {
                dt_seconds,
                input,
                viewport: self.viewport,
                config: &self.config,
                tunables: &self.tunables,
                grid: &self.grid,
                store: &mut self.store,
                camera: &mut self.camera,
                flow: &mut self.flow,
                tokens: &mut self.tokens,
                events: &mut self.events,
            };
            self.systems_host.run_once_per_tick(&mut context);
        }

        self.export_debug_snapshot();
        command
    }

    /// Applies a debug edit. A reload request is honored on the next tick.
    pub fn push_tuning(&mut self, edit: &TuningEdit) {
        self.tunables.apply(edit);
        if edit.request_reload {
            self.reload_requested = true;
        }
        if edit.max_health.is_some() {
            let player = self.store.player_mut();
            player.max_health = self.tunables.max_health;
            player.health = player.health.min(player.max_health);
        }
    }

    pub fn render_snapshot(&self, alpha: f32) -> RenderSnapshot {
        let player = self.store.player();
        RenderSnapshot {
            entities: snapshot::render_entities(&self.store, alpha),
            camera_position: self.camera.position,
            camera_zoom: self.camera.effective_zoom(),
            shake_offset: self.camera.shake_offset(self.tunables.shake_strength),
            hud: HudCounters {
                health: player.health,
                max_health: player.max_health,
                tokens_collected: self.tokens.collected,
                tokens_total: self.tokens.total,
                level_index: self.level_index,
                speed_buff_seconds: player.buffs.speed_seconds,
                shield_seconds: player.buffs.shield_seconds,
            },
            flow: self.flow.state(),
            show_grid: self.tunables.show_grid,
            show_paths: self.tunables.show_paths,
            show_colliders: self.tunables.show_colliders,
            show_overlay: self.tunables.show_overlay,
            enemy_paths: if self.tunables.show_paths {
                snapshot::enemy_paths(&self.store)
            } else {
                Vec::new()
            },
        }
    }

    pub fn flow_state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn tokens(&self) -> TokenProgress {
        self.tokens
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Events emitted during the most recent tick.
    pub fn events(&self) -> &[SimEvent] {
        self.events.current_tick()
    }

    pub fn debug_snapshot(&self) -> &DebugSnapshot {
        &self.debug_snapshot
    }

    fn note_flow_change(&mut self, before: FlowState) {
        let after = self.flow.state();
        if after == before {
            return;
        }
        info!(from = ?before, to = ?after, "flow_changed");
        self.events.emit(SimEvent::FlowChanged {
            from: before,
            to: after,
        });
    }

    fn advance_level(&mut self) {
        let count = self.level_source.level_count();
        let next_index = if count == 0 {
            self.level_index
        } else {
            (self.level_index + 1) % count
        };
        match self.level_source.load_level(next_index) {
            Ok(grid) => {
                self.grid = grid;
                self.level_index = next_index;
            }
            Err(error) => {
                warn!(
                    level = next_index,
                    error = %error,
                    "level_load_failed_keeping_current"
                );
            }
        }
        self.build_level();
    }

    fn restart_level(&mut self) {
        self.build_level();
    }

    fn build_level(&mut self) {
        self.layout = LevelLayout::from_grid(&self.grid);
        let player_spawn = self
            .layout
            .player_spawn
            .unwrap_or_else(|| self.config.player_spawn_position());

        let enemy_spawns = self.enemy_spawns();
        let max_health = self.tunables.max_health;
        self.store.reset_level(player_spawn, max_health);
        self.store.replace_enemies(enemy_spawns);
        for (kind, position) in &self.layout.pickup_spawns {
            self.store.spawn_pickup(*kind, *position);
        }
        self.tokens = TokenProgress::new(self.layout.token_count());
        let world_size = self.config.world_size();
        self.camera.follow(player_spawn, self.viewport, world_size);

        info!(
            level = self.level_index,
            entity_count = self.store.entity_count(),
            enemies = self.store.enemies().len(),
            tokens = self.tokens.total,
            "level_built"
        );
        self.events.emit(SimEvent::LevelBuilt {
            index: self.level_index,
        });
    }

    /// Marker spawns from the level followed by the config spawn list.
    fn enemy_spawns(&self) -> Vec<(EnemyKind, Vec2)> {
        self.layout
            .enemy_spawns
            .iter()
            .copied()
            .chain(
                self.config
                    .enemy_spawns
                    .iter()
                    .map(|spawn| (spawn.kind, spawn.position())),
            )
            .collect()
    }

    fn poll_hot_reload(&mut self, dt_seconds: f32) {
        let manual = std::mem::take(&mut self.reload_requested);
        if let Some((config, trigger)) =
            self.hot_reload
                .poll(dt_seconds, self.config_source.as_ref(), manual)
        {
            self.apply_config(config, trigger);
        }
    }

    /// Swaps in a new config and respawns enemies only. The player keeps its
    /// id, position, health and timers.
    fn apply_config(&mut self, config: GameConfig, trigger: ReloadTrigger) {
        self.config = config;
        let enemy_spawns = self.enemy_spawns();
        self.store.replace_enemies(enemy_spawns);
        info!(
            trigger = ?trigger,
            player_speed = self.config.player_speed,
            enemy_speed = self.config.enemy_speed,
            enemies = self.store.enemies().len(),
            "config_applied"
        );
        self.events.emit(SimEvent::ConfigReloaded { trigger });
    }

    fn export_debug_snapshot(&mut self) {
        self.debug_snapshot = snapshot::debug_snapshot(&self.store, self.tick_count);
    }
}
