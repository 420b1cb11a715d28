use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Confirm,
    Cancel,
    Restart,
    DebugToggle,
}

const ACTION_COUNT: usize = 8;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Confirm,
        InputAction::Cancel,
        InputAction::Restart,
        InputAction::DebugToggle,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Confirm => 4,
            InputAction::Cancel => 5,
            InputAction::Restart => 6,
            InputAction::DebugToggle => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Held-state view of the controls for one tick, as reported by the input
/// collaborator. Press edges are derived by [`ControlEdges`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Raw movement direction from the held axes, not normalized.
    pub fn movement_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_down(InputAction::MoveUp) {
            axis.y -= 1.0;
        }
        if self.is_down(InputAction::MoveDown) {
            axis.y += 1.0;
        }
        if self.is_down(InputAction::MoveLeft) {
            axis.x -= 1.0;
        }
        if self.is_down(InputAction::MoveRight) {
            axis.x += 1.0;
        }
        axis
    }
}

/// Controls that went from released to held on this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressedControls {
    pressed: ActionStates,
}

impl PressedControls {
    pub fn pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn any(&self) -> bool {
        InputAction::ALL
            .iter()
            .any(|action| self.pressed.is_down(*action))
    }
}

/// Per-control memory of last tick's held state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlEdges {
    previous: ActionStates,
}

impl ControlEdges {
    pub fn update(&mut self, input: &InputSnapshot) -> PressedControls {
        let mut pressed = PressedControls::default();
        for action in InputAction::ALL {
            let is_down = input.is_down(action);
            if is_down && !self.previous.is_down(action) {
                pressed.pressed.set(action, true);
            }
            self.previous.set(action, is_down);
        }
        pressed
    }
}
