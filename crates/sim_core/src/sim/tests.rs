use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use super::systems::SIM_SYSTEM_ORDER;
use super::*;
use crate::config::{ConfigError, EnemySpawn, SpawnPoint, StaticConfigSource};
use crate::entity::{AiState, EntityKind, PickupKind, PLAYER_RADIUS};
use crate::input::InputAction;
use crate::level::StaticLevelSource;
use crate::tilemap::{TileCoord, GRUNT_MARKER_ID, SOLID_TILE_ID};
use crate::tuning::MAX_DEBUG_ROWS;

const DT: f32 = 1.0 / 60.0;
const TILE: f32 = 64.0;

fn grid_from_rows(rows: &[&str]) -> TileGrid {
    let width = rows[0].len() as u32;
    let height = rows.len() as u32;
    let tiles = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|cell| match cell {
            '#' => 1,
            'T' => 2,
            'G' => 3,
            'P' => 4,
            'H' => 5,
            'S' => 6,
            'D' => 7,
            'R' => 8,
            _ => 0,
        })
        .collect();
    TileGrid::new(width, height, TILE, tiles).expect("grid")
}

fn open_grid(width: u32, height: u32, markers: &[(u32, u32, u16)]) -> TileGrid {
    let mut tiles = vec![0u16; (width * height) as usize];
    for (x, y, id) in markers {
        tiles[(y * width + x) as usize] = *id;
    }
    TileGrid::new(width, height, TILE, tiles).expect("grid")
}

fn simulation(config: GameConfig, levels: Vec<TileGrid>) -> Simulation {
    Simulation::new(
        Box::new(StaticConfigSource::new(config)),
        Box::new(StaticLevelSource::new(levels)),
    )
    .expect("simulation")
}

fn arena_config(player: (f32, f32), enemies: &[(f32, f32)]) -> GameConfig {
    GameConfig {
        world_width: 640.0,
        world_height: 448.0,
        player_spawn: SpawnPoint {
            x: player.0,
            y: player.1,
        },
        enemy_spawns: enemies
            .iter()
            .map(|(x, y)| EnemySpawn {
                x: *x,
                y: *y,
                kind: EnemyKind::Grunt,
            })
            .collect(),
        ..GameConfig::default()
    }
}

/// Empty 10x7 room with the player near the middle and no enemies.
fn open_arena() -> Simulation {
    let config = arena_config((300.0, 224.0), &[]);
    simulation(config, vec![open_grid(10, 7, &[])])
}

fn held(action: InputAction) -> InputSnapshot {
    InputSnapshot::empty().with_action_down(action, true)
}

fn stamp(seconds: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
}

struct SharedConfigState {
    result: Result<GameConfig, String>,
    modified: Option<SystemTime>,
}

#[derive(Clone)]
struct SharedConfigSource {
    state: Rc<RefCell<SharedConfigState>>,
}

impl SharedConfigSource {
    fn new(config: GameConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SharedConfigState {
                result: Ok(config),
                modified: Some(stamp(1)),
            })),
        }
    }

    fn publish(&self, config: GameConfig, seconds: u64) {
        let mut state = self.state.borrow_mut();
        state.result = Ok(config);
        state.modified = Some(stamp(seconds));
    }

    fn break_with(&self, message: &str, seconds: u64) {
        let mut state = self.state.borrow_mut();
        state.result = Err(message.to_string());
        state.modified = Some(stamp(seconds));
    }
}

impl ConfigSource for SharedConfigSource {
    fn last_modified(&self) -> Option<SystemTime> {
        self.state.borrow().modified
    }

    fn load(&self) -> Result<GameConfig, ConfigError> {
        self.state
            .borrow()
            .result
            .clone()
            .map_err(|message| ConfigError::Parse { message })
    }
}

fn shared_simulation(source: &SharedConfigSource, level: TileGrid) -> Simulation {
    Simulation::new(
        Box::new(source.clone()),
        Box::new(StaticLevelSource::new(vec![level])),
    )
    .expect("simulation")
}

struct FlakyLevels {
    first: TileGrid,
}

impl LevelSource for FlakyLevels {
    fn level_count(&self) -> usize {
        2
    }

    fn load_level(&self, index: usize) -> Result<TileGrid, LevelLoadError> {
        if index == 0 {
            return Ok(self.first.clone());
        }
        Err(LevelLoadError::Parse {
            path: PathBuf::from("level_1.csv"),
            line: 3,
            message: "invalid tile id".to_string(),
        })
    }
}

fn has_event(sim: &Simulation, expected: SimEvent) -> bool {
    sim.events().contains(&expected)
}

fn flow_changes(sim: &Simulation) -> usize {
    sim.events()
        .iter()
        .filter(|event| matches!(event, SimEvent::FlowChanged { .. }))
        .count()
}

#[test]
fn construction_requires_at_least_one_level() {
    let result = Simulation::new(
        Box::new(StaticConfigSource::default()),
        Box::new(StaticLevelSource::default()),
    );
    assert!(matches!(result, Err(SimulationError::NoLevels)));
}

#[test]
fn level_build_uses_markers_then_config_spawns() {
    #[rustfmt::skip]
    let level = grid_from_rows(&[
        "#######",
        "#P.T.G#",
        "#.D.R.#",
        "#######",
    ]);
    let config = arena_config((300.0, 300.0), &[(400.0, 200.0)]);
    let sim = simulation(config, vec![level]);

    let store = sim.store();
    assert_eq!(store.player().body.position, Vec2::new(96.0, 96.0));
    let enemy_kinds: Vec<EnemyKind> = store.enemies().iter().map(|enemy| enemy.kind).collect();
    assert_eq!(
        enemy_kinds,
        vec![EnemyKind::Grunt, EnemyKind::Runner, EnemyKind::Grunt]
    );
    assert_eq!(store.enemies()[2].body.position, Vec2::new(400.0, 200.0));
    assert_eq!(store.pickups().len(), 2);
    assert_eq!(sim.tokens(), TokenProgress::new(1));
    assert_eq!(sim.flow_state(), FlowState::Playing);
}

#[test]
fn systems_run_in_declared_order_while_playing() {
    let mut sim = open_arena();
    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.systems_host.last_tick_order, SIM_SYSTEM_ORDER.to_vec());
}

#[test]
fn enemy_seeks_and_routes_around_wall_between_it_and_player() {
    #[rustfmt::skip]
    let level = grid_from_rows(&[
        "..........",
        "..........",
        "....#.....",
        "....#.....",
        "....#.....",
        "..........",
        "..........",
    ]);
    let config = arena_config((460.0, 224.0), &[(160.0, 224.0)]);
    let mut sim = simulation(config, vec![level]);
    let enemy_start = sim.store().enemies()[0].body.position;
    assert_eq!(
        enemy_start.distance_squared(sim.store().player().body.position),
        300.0 * 300.0
    );
    assert_eq!(sim.store().enemies()[0].ai.state, AiState::Idle);

    sim.tick(DT, &InputSnapshot::empty());

    let enemy = &sim.store().enemies()[0];
    assert_eq!(enemy.ai.state, AiState::Seek);
    assert!(has_event(
        &sim,
        SimEvent::EnemyAiChanged {
            id: enemy.id,
            state: AiState::Seek
        }
    ));

    let grid = sim.grid();
    let waypoints = &enemy.path.waypoints;
    assert_eq!(
        waypoints.last(),
        Some(&grid.tile_center(TileCoord::new(7, 3)))
    );
    for waypoint in waypoints {
        assert!(
            !grid.is_solid_at_world(*waypoint),
            "waypoint {waypoint:?} inside wall"
        );
    }
    for pair in waypoints.windows(2) {
        let step = (pair[1] - pair[0]).length();
        assert!(
            (step - TILE).abs() < 1.0e-3,
            "non-adjacent waypoints {pair:?}"
        );
    }
    assert!(
        waypoints
            .iter()
            .map(|waypoint| grid.world_to_tile(*waypoint))
            .any(|tile| tile.y < 2 || tile.y > 4),
        "path never left the wall's rows: {waypoints:?}"
    );

    for _ in 0..90 {
        sim.tick(DT, &InputSnapshot::empty());
        let enemy = &sim.store().enemies()[0];
        assert!(!sim.grid().is_solid_at_world(enemy.body.position));
    }
    let enemy_now = sim.store().enemies()[0].body.position;
    assert_ne!(enemy_now, enemy_start);
}

#[test]
fn lethal_hit_sets_invulnerability_and_loses_once() {
    let config = arena_config((300.0, 224.0), &[(320.0, 224.0)]);
    let mut sim = simulation(config, vec![open_grid(10, 7, &[])]);
    sim.store.player_mut().health = 1;

    sim.tick(DT, &InputSnapshot::empty());

    let player = sim.store().player();
    let enemy_id = sim.store().enemies()[0].id;
    assert_eq!(player.health, 0);
    assert_eq!(
        player.invulnerable_seconds,
        sim.tunables().invulnerability_seconds
    );
    assert!(player.knockback_velocity.x < 0.0);
    assert_eq!(sim.flow_state(), FlowState::Lose);
    assert!(has_event(
        &sim,
        SimEvent::PlayerDamaged {
            by: enemy_id,
            health: 0
        }
    ));
    assert!(has_event(
        &sim,
        SimEvent::FlowChanged {
            from: FlowState::Playing,
            to: FlowState::Lose
        }
    ));
    assert!(sim.camera().is_shaking());

    for _ in 0..30 {
        sim.tick(DT, &InputSnapshot::empty());
        assert_eq!(sim.store().player().health, 0);
        assert!(sim.events().is_empty());
        assert_eq!(sim.flow_state(), FlowState::Lose);
    }
}

#[test]
fn active_shield_absorbs_hit_without_damage() {
    let config = arena_config((300.0, 224.0), &[(320.0, 224.0)]);
    let mut sim = simulation(config, vec![open_grid(10, 7, &[])]);
    {
        let player = sim.store.player_mut();
        player.health = 3;
        player.buffs.shield_seconds = SHIELD_SECONDS;
    }

    sim.tick(DT, &InputSnapshot::empty());

    let player = sim.store().player();
    assert_eq!(player.health, 3);
    assert!(!player.buffs.shield_active());
    assert_eq!(player.invulnerable_seconds, SHIELD_GRACE_SECONDS);
    assert_eq!(player.knockback_velocity, Vec2::ZERO);
    assert_eq!(sim.flow_state(), FlowState::Playing);
    assert!(sim
        .events()
        .iter()
        .any(|event| matches!(event, SimEvent::ShieldAbsorbed { .. })));

    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.store().player().health, 3);
}

#[test]
fn token_collection_saturates_and_wins_once() {
    #[rustfmt::skip]
    let level = grid_from_rows(&[
        "........",
        ".P.T..T.",
        "........",
    ]);
    let mut sim = simulation(GameConfig::default(), vec![level]);
    let token_positions: Vec<Vec2> = sim
        .store()
        .pickups()
        .iter()
        .map(|pickup| pickup.body.position)
        .collect();
    assert_eq!(sim.tokens().total, 2);

    sim.store.player_mut().body.position = token_positions[0];
    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.tokens().collected, 1);
    assert_eq!(sim.flow_state(), FlowState::Playing);

    sim.store.player_mut().body.position = token_positions[1];
    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.tokens().collected, 2);
    assert_eq!(sim.flow_state(), FlowState::Win);
    assert_eq!(flow_changes(&sim), 1);
    assert!(sim.store().pickups().iter().all(|pickup| !pickup.active));

    for _ in 0..10 {
        sim.tick(DT, &InputSnapshot::empty());
        assert_eq!(flow_changes(&sim), 0);
        assert_eq!(sim.tokens().collected, 2);
    }

    let mut progress = TokenProgress::new(2);
    for _ in 0..5 {
        progress.collect();
    }
    assert_eq!(progress.collected, 2);
    assert!(!TokenProgress::new(0).is_complete());
}

#[test]
fn pickups_apply_buffs_and_healing() {
    let level = grid_from_rows(&["P.H.S.D."]);
    let mut sim = simulation(GameConfig::default(), vec![level]);
    let positions: Vec<(PickupKind, Vec2)> = sim
        .store()
        .pickups()
        .iter()
        .map(|pickup| (pickup.kind, pickup.body.position))
        .collect();
    sim.store.player_mut().health = 2;

    for (_, position) in &positions {
        sim.store.player_mut().body.position = *position;
        sim.tick(DT, &InputSnapshot::empty());
    }

    let player = sim.store().player();
    assert_eq!(player.health, 3);
    assert!(player.buffs.speed_active());
    assert!(player.buffs.shield_active());
    assert_eq!(sim.flow_state(), FlowState::Playing);
}

#[test]
fn restart_after_lose_rebuilds_level_with_fresh_player() {
    let config = arena_config((300.0, 224.0), &[(320.0, 224.0)]);
    let mut sim = simulation(config, vec![open_grid(10, 7, &[])]);
    sim.store.player_mut().health = 1;
    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.flow_state(), FlowState::Lose);
    let old_player = sim.store().player().id;

    sim.tick(DT, &held(InputAction::Confirm));
    assert_eq!(sim.flow_state(), FlowState::Lose);

    sim.tick(DT, &held(InputAction::Restart));
    assert_eq!(sim.flow_state(), FlowState::Playing);
    assert!(sim.store().player().id > old_player);
    assert_eq!(sim.store().player().health, sim.tunables().max_health);
    assert_eq!(sim.store().player().body.position, Vec2::new(300.0, 224.0));
    assert!(has_event(&sim, SimEvent::LevelBuilt { index: 0 }));
    assert!(has_event(
        &sim,
        SimEvent::FlowChanged {
            from: FlowState::Lose,
            to: FlowState::Playing
        }
    ));
}

#[test]
fn confirm_after_win_advances_and_wraps_levels() {
    let first = grid_from_rows(&["P.T"]);
    let second = grid_from_rows(&[".T.P"]);
    let mut sim = simulation(GameConfig::default(), vec![first, second]);

    for expected_next in [1usize, 0] {
        let token = sim.store().pickups()[0].body.position;
        sim.store.player_mut().body.position = token;
        sim.tick(DT, &InputSnapshot::empty());
        assert_eq!(sim.flow_state(), FlowState::Win);

        sim.tick(DT, &held(InputAction::Confirm));
        assert_eq!(sim.flow_state(), FlowState::Playing);
        assert_eq!(sim.level_index(), expected_next);
        assert_eq!(sim.tokens(), TokenProgress::new(1));
        sim.tick(DT, &InputSnapshot::empty());
    }
    assert_eq!(sim.grid().width(), 3);
}

#[test]
fn failed_level_advance_keeps_current_grid() {
    let first = grid_from_rows(&["P.T"]);
    let mut sim = Simulation::new(
        Box::new(StaticConfigSource::default()),
        Box::new(FlakyLevels {
            first: first.clone(),
        }),
    )
    .expect("simulation");

    let token = sim.store().pickups()[0].body.position;
    sim.store.player_mut().body.position = token;
    sim.tick(DT, &InputSnapshot::empty());
    sim.tick(DT, &held(InputAction::Confirm));

    assert_eq!(sim.flow_state(), FlowState::Playing);
    assert_eq!(sim.level_index(), 0);
    assert_eq!(sim.grid(), &first);
    assert_eq!(sim.tokens(), TokenProgress::new(1));
    assert!(sim.store().pickups()[0].active);
}

#[test]
fn quit_confirm_freezes_world_and_reports_quit() {
    let mut sim = open_arena();

    let cancel = held(InputAction::Cancel);
    assert_eq!(sim.tick(DT, &cancel), TickCommand::Continue);
    assert_eq!(sim.flow_state(), FlowState::QuitConfirm);
    assert_eq!(sim.tick(DT, &cancel), TickCommand::Continue);
    assert_eq!(sim.flow_state(), FlowState::QuitConfirm);

    let before = sim.store().player().body.position;
    sim.tick(DT, &held(InputAction::MoveRight));
    assert_eq!(sim.store().player().body.position, before);

    assert_eq!(sim.tick(DT, &held(InputAction::Confirm)), TickCommand::Quit);
}

#[test]
fn cancel_twice_resumes_play() {
    let mut sim = open_arena();
    sim.tick(DT, &held(InputAction::Cancel));
    sim.tick(DT, &InputSnapshot::empty());
    sim.tick(DT, &held(InputAction::Cancel));
    assert_eq!(sim.flow_state(), FlowState::Playing);

    let before = sim.store().player().body.position;
    sim.tick(DT, &held(InputAction::MoveRight));
    assert!(sim.store().player().body.position.x > before.x);
}

#[test]
fn diagonal_movement_is_normalized() {
    let mut sim = open_arena();
    let before = sim.store().player().body.position;
    let input = InputSnapshot::empty()
        .with_action_down(InputAction::MoveRight, true)
        .with_action_down(InputAction::MoveDown, true);
    sim.tick(DT, &input);

    let moved = (sim.store().player().body.position - before).length();
    let expected = sim.config().player_speed * DT;
    assert!(
        (moved - expected).abs() < 1.0e-3,
        "moved {moved}, expected {expected}"
    );
}

#[test]
fn hot_reload_respawns_enemies_and_preserves_player() {
    let level = open_grid(20, 12, &[(18, 10, GRUNT_MARKER_ID)]);
    let source = SharedConfigSource::new(GameConfig::default());
    let mut sim = shared_simulation(&source, level);
    {
        let player = sim.store.player_mut();
        player.body.position = Vec2::new(100.0, 100.0);
        player.health = 3;
    }
    let player_before = sim.store().player().clone();
    assert_eq!(sim.store().enemies().len(), 1);

    let changed = GameConfig {
        enemy_speed: 90.0,
        enemy_spawns: vec![
            EnemySpawn {
                x: 1100.0,
                y: 600.0,
                kind: EnemyKind::Grunt,
            },
            EnemySpawn {
                x: 1000.0,
                y: 700.0,
                kind: EnemyKind::Runner,
            },
        ],
        ..GameConfig::default()
    };
    source.publish(changed, 2);

    for _ in 0..3 {
        sim.tick(0.25, &InputSnapshot::empty());
        assert!(!has_event(
            &sim,
            SimEvent::ConfigReloaded {
                trigger: ReloadTrigger::Timestamp
            }
        ));
    }
    sim.tick(0.25, &InputSnapshot::empty());

    assert!(has_event(
        &sim,
        SimEvent::ConfigReloaded {
            trigger: ReloadTrigger::Timestamp
        }
    ));
    assert_eq!(sim.config().enemy_speed, 90.0);
    assert_eq!(sim.store().enemies().len(), 3);
    assert_eq!(sim.store().enemies()[2].kind, EnemyKind::Runner);

    let player = sim.store().player();
    assert_eq!(player.id, player_before.id);
    assert_eq!(player.body.position, player_before.body.position);
    assert_eq!(player.health, 3);
}

#[test]
fn failed_reload_keeps_previous_config_and_retries() {
    let source = SharedConfigSource::new(GameConfig::default());
    let mut sim = shared_simulation(&source, open_grid(12, 12, &[]));
    source.break_with("unexpected end of file", 2);

    sim.tick(0.5, &InputSnapshot::empty());
    sim.tick(0.5, &InputSnapshot::empty());
    assert_eq!(sim.config(), &GameConfig::default());
    assert_eq!(sim.hot_reload.last_modified(), Some(stamp(1)));

    let fixed = GameConfig {
        player_speed: 300.0,
        ..GameConfig::default()
    };
    source.publish(fixed, 2);
    sim.tick(0.5, &InputSnapshot::empty());
    sim.tick(0.5, &InputSnapshot::empty());
    assert_eq!(sim.config().player_speed, 300.0);
}

#[test]
fn manual_reload_request_applies_on_next_tick() {
    let source = SharedConfigSource::new(GameConfig::default());
    let mut sim = shared_simulation(&source, open_grid(12, 12, &[]));
    let changed = GameConfig {
        enemy_speed: 75.0,
        ..GameConfig::default()
    };
    // same timestamp, so only a manual request picks it up
    source.publish(changed, 1);

    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.config().enemy_speed, GameConfig::default().enemy_speed);

    sim.push_tuning(&TuningEdit {
        request_reload: true,
        ..TuningEdit::default()
    });
    sim.tick(DT, &InputSnapshot::empty());
    assert_eq!(sim.config().enemy_speed, 75.0);
    assert!(has_event(
        &sim,
        SimEvent::ConfigReloaded {
            trigger: ReloadTrigger::Manual
        }
    ));

    sim.tick(DT, &InputSnapshot::empty());
    assert!(sim.events().is_empty());
}

#[test]
fn hot_reload_polls_while_frozen() {
    let source = SharedConfigSource::new(GameConfig::default());
    let mut sim = shared_simulation(&source, open_grid(12, 12, &[]));
    sim.tick(DT, &held(InputAction::Cancel));
    assert_eq!(sim.flow_state(), FlowState::QuitConfirm);

    let changed = GameConfig {
        player_speed: 180.0,
        ..GameConfig::default()
    };
    source.publish(changed, 3);
    sim.tick(1.0, &InputSnapshot::empty());

    assert_eq!(sim.flow_state(), FlowState::QuitConfirm);
    assert_eq!(sim.config().player_speed, 180.0);
}

#[test]
fn debug_toggle_flips_overlay_once_per_press() {
    let mut sim = open_arena();
    assert!(sim.tunables().show_overlay);

    sim.tick(DT, &held(InputAction::DebugToggle));
    assert!(!sim.tunables().show_overlay);
    sim.tick(DT, &held(InputAction::DebugToggle));
    assert!(!sim.tunables().show_overlay);
    sim.tick(DT, &InputSnapshot::empty());
    sim.tick(DT, &held(InputAction::DebugToggle));
    assert!(sim.tunables().show_overlay);
}

#[test]
fn debug_snapshot_rows_are_capped() {
    let mut sim = open_arena();
    for index in 0..300 {
        sim.store
            .spawn_pickup(PickupKind::Token, Vec2::new(2000.0 + index as f32, 2000.0));
    }
    sim.tick(DT, &InputSnapshot::empty());

    let snapshot = sim.debug_snapshot();
    assert_eq!(snapshot.rows.len(), MAX_DEBUG_ROWS);
    assert_eq!(snapshot.entity_count, 301);
    assert_eq!(snapshot.rows[0].kind, EntityKind::Player);
    assert_eq!(snapshot.tick, sim.tick_count());
}

#[test]
fn tuning_edits_are_clamped_and_drive_camera_zoom() {
    let mut sim = open_arena();
    sim.push_tuning(&TuningEdit {
        camera_zoom: Some(7.5),
        max_health: Some(2),
        ..TuningEdit::default()
    });
    sim.tick(DT, &InputSnapshot::empty().with_window_size((800, 600)));

    assert_eq!(sim.camera().effective_zoom(), 2.0);
    assert_eq!(sim.store().player().max_health, 2);
    assert_eq!(sim.store().player().health, 2);
    assert_eq!(sim.render_snapshot(1.0).camera_zoom, 2.0);
}

#[test]
fn render_snapshot_interpolates_between_ticks() {
    let mut sim = open_arena();
    sim.push_tuning(&TuningEdit {
        show_paths: Some(true),
        ..TuningEdit::default()
    });
    sim.tick(DT, &held(InputAction::MoveRight));

    let current = sim.store().player().body.position;
    let snapshot = sim.render_snapshot(0.5);
    let player = snapshot.entities[0];
    assert_eq!(player.kind, EntityKind::Player);
    assert!((player.position.x - (300.0 + current.x) * 0.5).abs() < 1.0e-4);
    assert_eq!(snapshot.flow, FlowState::Playing);
    assert!(snapshot.show_paths);
    assert!(snapshot.enemy_paths.is_empty());
    assert_eq!(snapshot.hud.health, 5);
    assert_eq!(sim.render_snapshot(f32::NAN).entities[0].position, current);
}

#[test]
fn player_is_clamped_to_config_world_and_walls() {
    #[rustfmt::skip]
    let level = grid_from_rows(&[
        "......",
        "...#..",
        "......",
    ]);
    let config = GameConfig {
        world_width: 384.0,
        world_height: 192.0,
        player_spawn: SpawnPoint { x: 160.0, y: 96.0 },
        ..GameConfig::default()
    };
    let mut sim = simulation(config, vec![level]);
    for _ in 0..60 {
        sim.tick(DT, &held(InputAction::MoveRight));
    }
    let position = sim.store().player().body.position;
    // wall tile (3,1) starts at x = 192
    assert!(position.x <= 192.0 - 20.0 + 1.0e-3, "x = {}", position.x);

    for _ in 0..120 {
        sim.tick(DT, &held(InputAction::MoveUp));
    }
    assert!((sim.store().player().body.position.y - 20.0).abs() < 1.0e-3);
    let wall = sim.grid().tile_at(TileCoord::new(3, 1));
    assert_eq!(wall, Some(SOLID_TILE_ID));
}

fn wall_column_config(player: (f32, f32), enemies: &[(f32, f32)]) -> GameConfig {
    GameConfig {
        world_width: 448.0,
        world_height: 192.0,
        ..arena_config(player, enemies)
    }
}

#[test]
fn contact_knockback_never_carries_player_through_wall() {
    for strength in [600.0, 1500.0, 5000.0] {
        // wall spans x in [128, 192); player touches its right face
        let level = grid_from_rows(&["..#....", "..#....", "..#...."]);
        let config = wall_column_config((213.0, 96.0), &[(249.0, 96.0)]);
        let mut sim = simulation(config, vec![level]);
        sim.push_tuning(&TuningEdit {
            knockback_strength: Some(strength),
            ..TuningEdit::default()
        });

        let mut was_hit = false;
        for _ in 0..60 {
            sim.tick(DT, &InputSnapshot::empty());
            was_hit |= sim
                .events()
                .iter()
                .any(|event| matches!(event, SimEvent::PlayerDamaged { .. }));
            let position = sim.store().player().body.position;
            assert!(
                position.x >= 192.0 + PLAYER_RADIUS - 1.0e-3,
                "strength {strength}: x = {}",
                position.x
            );
        }
        assert!(was_hit, "strength {strength}: enemy never landed a hit");
    }
}

#[test]
fn fast_config_speeds_stay_out_of_walls() {
    let level = grid_from_rows(&["..#....", "..#....", "..#...."]);
    let config = GameConfig {
        player_speed: 5000.0,
        enemy_speed: 5000.0,
        ..wall_column_config((352.0, 96.0), &[])
    };
    let mut sim = simulation(config, vec![level]);

    for _ in 0..20 {
        sim.tick(DT, &held(InputAction::MoveLeft));
        let x = sim.store().player().body.position.x;
        assert!(x >= 192.0 + PLAYER_RADIUS - 1.0e-3, "x = {x}");
    }

    #[rustfmt::skip]
    let routed = grid_from_rows(&[
        "..........",
        "..........",
        "....#.....",
        "....#.....",
        "....#.....",
        "..........",
        "..........",
    ]);
    let config = GameConfig {
        enemy_speed: 5000.0,
        ..arena_config((460.0, 224.0), &[(160.0, 224.0)])
    };
    let mut sim = simulation(config, vec![routed]);
    for _ in 0..30 {
        sim.tick(DT, &InputSnapshot::empty());
        let enemy = &sim.store().enemies()[0];
        assert!(!sim.grid().is_solid_at_world(enemy.body.position));
    }
}

#[test]
fn goal_change_waits_for_repath_interval() {
    let config = arena_config((460.0, 224.0), &[(160.0, 224.0)]);
    let mut sim = simulation(config, vec![open_grid(10, 7, &[])]);
    sim.tick(DT, &InputSnapshot::empty());
    let first_goal = TileCoord::new(7, 3);
    assert_eq!(sim.store().enemies()[0].path.last_goal, Some(first_goal));

    let moved_goal = TileCoord::new(7, 4);
    sim.store.player_mut().body.position = sim.grid().tile_center(moved_goal);

    let min_wait_ticks = (REPATH_INTERVAL_SECONDS / DT) as u32 - 1;
    let mut repath_after = None;
    for tick in 1..=30u32 {
        sim.tick(DT, &InputSnapshot::empty());
        let enemy = &sim.store().enemies()[0];
        assert_eq!(enemy.ai.state, AiState::Seek);
        if enemy.path.last_goal == Some(moved_goal) {
            repath_after = Some(tick);
            break;
        }
    }

    let repath_after = repath_after.expect("enemy never repathed to the new goal");
    assert!(
        repath_after >= min_wait_ticks,
        "repathed after {repath_after} ticks"
    );
}

#[test]
fn enemy_with_unreachable_goal_holds_position_while_seeking() {
    #[rustfmt::skip]
    let level = grid_from_rows(&[
        "..........",
        "......###.",
        "......#.#.",
        "......###.",
    ]);
    let config = GameConfig {
        world_width: 640.0,
        world_height: 256.0,
        ..arena_config((480.0, 160.0), &[(160.0, 160.0)])
    };
    let mut sim = simulation(config, vec![level]);
    let start = sim.store().enemies()[0].body.position;

    let mut failures = 0;
    for _ in 0..120 {
        sim.tick(DT, &InputSnapshot::empty());
        failures += sim
            .events()
            .iter()
            .filter(|event| matches!(event, SimEvent::PathFailed { .. }))
            .count();
    }

    let enemy = &sim.store().enemies()[0];
    assert_eq!(enemy.ai.state, AiState::Seek);
    assert_eq!(enemy.body.position, start);
    assert!(enemy.path.remaining_waypoints().is_empty());
    assert!(failures >= 2, "path failures: {failures}");
}

#[test]
fn pause_freezes_world_but_keeps_edges_and_reload() {
    let source = SharedConfigSource::new(GameConfig::default());
    let mut sim = shared_simulation(&source, open_grid(12, 12, &[]));
    sim.push_tuning(&TuningEdit {
        pause: Some(true),
        show_colliders: Some(true),
        ..TuningEdit::default()
    });
    let start = sim.store().player().body.position;

    for _ in 0..10 {
        sim.tick(DT, &held(InputAction::MoveRight));
    }
    assert_eq!(sim.store().player().body.position, start);
    assert!(sim.systems_host.last_tick_order.is_empty());

    let changed = GameConfig {
        enemy_speed: 60.0,
        ..GameConfig::default()
    };
    source.publish(changed, 4);
    sim.tick(1.0, &held(InputAction::DebugToggle));
    assert_eq!(sim.config().enemy_speed, 60.0);
    assert!(!sim.tunables().show_overlay);
    assert!(sim.render_snapshot(1.0).show_colliders);

    sim.push_tuning(&TuningEdit {
        pause: Some(false),
        ..TuningEdit::default()
    });
    sim.tick(DT, &held(InputAction::MoveRight));
    assert!(sim.store().player().body.position.x > start.x);
}
