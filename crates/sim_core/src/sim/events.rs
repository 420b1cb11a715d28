use crate::config::ReloadTrigger;
use crate::entity::{AiState, EntityId, PickupKind};
use crate::flow::FlowState;

/// Notable things that happened during one tick, in emission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    FlowChanged { from: FlowState, to: FlowState },
    PlayerDamaged { by: EntityId, health: u32 },
    ShieldAbsorbed { by: EntityId },
    PickupCollected { id: EntityId, kind: PickupKind },
    EnemyAiChanged { id: EntityId, state: AiState },
    PathFailed { id: EntityId },
    ConfigReloaded { trigger: ReloadTrigger },
    LevelBuilt { index: usize },
}

#[derive(Debug, Default)]
pub(crate) struct SimEventBus {
    current_tick_events: Vec<SimEvent>,
}

impl SimEventBus {
    pub(crate) fn clear_current_tick(&mut self) {
        self.current_tick_events.clear();
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.current_tick_events.push(event);
    }

    pub(crate) fn current_tick(&self) -> &[SimEvent] {
        &self.current_tick_events
    }
}
