use sim_core::{
    find_path, FlowState, InputAction, InputSnapshot, PickupKind, Simulation, Vec2,
    DEFAULT_MAX_EXPANSIONS,
};

const STEER_DEADZONE: f32 = 4.0;

/// Scripted stand-in for a human player. Walks the shortest grid route to the
/// nearest token and answers the win/lose screens. Buttons are pulsed every
/// other tick so each press reads as a fresh edge.
#[derive(Debug)]
pub(crate) struct Autopilot {
    window_size: (u32, u32),
    quit_after_wins: Option<u32>,
    wins: u32,
    last_state: FlowState,
    tick: u64,
}

impl Autopilot {
    pub(crate) fn new(window_size: (u32, u32), quit_after_wins: Option<u32>) -> Self {
        Self {
            window_size,
            quit_after_wins,
            wins: 0,
            last_state: FlowState::Playing,
            tick: 0,
        }
    }

    pub(crate) fn wins(&self) -> u32 {
        self.wins
    }

    pub(crate) fn next_input(&mut self, sim: &Simulation) -> InputSnapshot {
        self.tick = self.tick.wrapping_add(1);
        let state = sim.flow_state();
        if state == FlowState::Win && self.last_state != FlowState::Win {
            self.wins = self.wins.saturating_add(1);
        }
        self.last_state = state;

        let input = InputSnapshot::empty().with_window_size(self.window_size);
        match state {
            FlowState::Playing if self.wants_quit() => self.pulse(input, InputAction::Cancel),
            FlowState::Playing => steer(input, sim),
            FlowState::Win => self.pulse(input, InputAction::Confirm),
            FlowState::Lose => self.pulse(input, InputAction::Restart),
            FlowState::QuitConfirm if self.wants_quit() => self.pulse(input, InputAction::Confirm),
            FlowState::QuitConfirm => self.pulse(input, InputAction::Cancel),
        }
    }

    fn wants_quit(&self) -> bool {
        self.quit_after_wins.is_some_and(|limit| self.wins >= limit)
    }

    fn pulse(&self, input: InputSnapshot, action: InputAction) -> InputSnapshot {
        input.with_action_down(action, self.tick % 2 == 0)
    }
}

fn steer(input: InputSnapshot, sim: &Simulation) -> InputSnapshot {
    let Some(target) = next_steering_point(sim) else {
        return input;
    };
    let delta = target - sim.store().player().body.position;
    input
        .with_action_down(InputAction::MoveRight, delta.x > STEER_DEADZONE)
        .with_action_down(InputAction::MoveLeft, delta.x < -STEER_DEADZONE)
        .with_action_down(InputAction::MoveDown, delta.y > STEER_DEADZONE)
        .with_action_down(InputAction::MoveUp, delta.y < -STEER_DEADZONE)
}

/// Center of the next tile on the route to the nearest token, or the token
/// itself once the player shares its tile.
fn next_steering_point(sim: &Simulation) -> Option<Vec2> {
    let player_position = sim.store().player().body.position;
    let token = sim
        .store()
        .pickups()
        .iter()
        .filter(|pickup| pickup.active && pickup.kind == PickupKind::Token)
        .map(|pickup| pickup.body.position)
        .min_by(|a, b| {
            a.distance_squared(player_position)
                .total_cmp(&b.distance_squared(player_position))
        })?;

    let grid = sim.grid();
    let route = find_path(
        grid,
        grid.world_to_tile(player_position),
        grid.world_to_tile(token),
        DEFAULT_MAX_EXPANSIONS,
    );
    match route.get(1) {
        Some(next_tile) => Some(grid.tile_center(*next_tile)),
        None => Some(token),
    }
}
