use crate::input::{InputAction, PressedControls};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Playing,
    Win,
    Lose,
    QuitConfirm,
}

impl FlowState {
    pub fn is_simulating(self) -> bool {
        self == Self::Playing
    }
}

/// Work the caller must do after a flow transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowAction {
    #[default]
    None,
    AdvanceLevel,
    RestartLevel,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlowController {
    state: FlowState,
}

impl FlowController {
    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn handle_input(&mut self, pressed: &PressedControls) -> FlowAction {
        match self.state {
            FlowState::Playing => {
                if pressed.pressed(InputAction::Cancel) {
                    self.state = FlowState::QuitConfirm;
                }
                FlowAction::None
            }
            FlowState::Win if pressed.pressed(InputAction::Confirm) => {
                self.state = FlowState::Playing;
                FlowAction::AdvanceLevel
            }
            FlowState::Lose if pressed.pressed(InputAction::Restart) => {
                self.state = FlowState::Playing;
                FlowAction::RestartLevel
            }
            FlowState::QuitConfirm if pressed.pressed(InputAction::Confirm) => FlowAction::Quit,
            FlowState::QuitConfirm if pressed.pressed(InputAction::Cancel) => {
                self.state = FlowState::Playing;
                FlowAction::None
            }
            FlowState::Win | FlowState::Lose | FlowState::QuitConfirm => FlowAction::None,
        }
    }

    /// Returns `false` when the session was not in play, so a second trigger
    /// on the same tick is a no-op.
    pub fn trigger_win(&mut self) -> bool {
        self.finish(FlowState::Win)
    }

    pub fn trigger_lose(&mut self) -> bool {
        self.finish(FlowState::Lose)
    }

    fn finish(&mut self, outcome: FlowState) -> bool {
        if self.state != FlowState::Playing {
            return false;
        }
        self.state = outcome;
        true
    }
}
