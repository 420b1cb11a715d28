pub mod camera;
pub mod config;
pub mod entity;
pub mod flow;
pub mod input;
pub mod level;
pub mod math;
pub mod nav;
pub mod sim;
pub mod tilemap;
pub mod tuning;

pub use camera::{Camera2D, ShakeCue, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN};
pub use config::{
    ConfigError, ConfigSource, EnemySpawn, GameConfig, HotReloadController, ReloadTrigger,
    SpawnPoint, StaticConfigSource, HOT_RELOAD_POLL_SECONDS,
};
pub use entity::{
    AiState, EnemyKind, EntityId, EntityKind, EntityStore, EntityView, PickupKind,
    DEFAULT_AGGRO_RADIUS, PICKUP_RADIUS, PLAYER_RADIUS,
};
pub use flow::{FlowAction, FlowController, FlowState};
pub use input::{ControlEdges, InputAction, InputSnapshot, PressedControls};
pub use level::{LevelLayout, LevelLoadError, LevelSource, StaticLevelSource};
pub use math::Vec2;
pub use nav::{find_path, waypoints_from_tile_path, PathFollow, DEFAULT_MAX_EXPANSIONS};
pub use sim::{
    HudCounters, RenderEntity, RenderSnapshot, SimEvent, Simulation, SimulationError,
    TickCommand, TokenProgress,
};
pub use tilemap::{TileCoord, TileGrid, TileMarker, TilemapError, SOLID_TILE_ID};
pub use tuning::{DebugEntityRow, DebugSnapshot, Tunables, TuningEdit, MAX_DEBUG_ROWS};
