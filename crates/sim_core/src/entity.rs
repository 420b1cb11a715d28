use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::nav::PathFollow;

pub const PLAYER_RADIUS: f32 = 20.0;
pub const PICKUP_RADIUS: f32 = 12.0;
pub const DEFAULT_AGGRO_RADIUS: f32 = 350.0;
/// Seek is only abandoned beyond `aggro_radius * AGGRO_HYSTERESIS`.
pub const AGGRO_HYSTERESIS: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    #[default]
    Grunt,
    Runner,
}

impl EnemyKind {
    pub fn radius(self) -> f32 {
        match self {
            Self::Grunt => 18.0,
            Self::Runner => 14.0,
        }
    }

    pub fn speed_multiplier(self) -> f32 {
        match self {
            Self::Grunt => 1.0,
            Self::Runner => 1.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickupKind {
    Token,
    Health,
    Speed,
    Shield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
    Pickup(PickupKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            previous_position: position,
            radius,
        }
    }

    pub fn store_previous(&mut self) {
        self.previous_position = self.position;
    }

    pub fn interpolated(&self, alpha: f32) -> Vec2 {
        self.previous_position.lerp(self.position, alpha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Idle,
    Seek,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiAgent {
    pub state: AiState,
    pub aggro_radius: f32,
    pub hysteresis: f32,
}

impl AiAgent {
    pub fn new(aggro_radius: f32) -> Self {
        Self {
            state: AiState::Idle,
            aggro_radius,
            hysteresis: AGGRO_HYSTERESIS,
        }
    }

    pub fn next_state(&self, distance_sq: f32) -> AiState {
        let aggro_sq = self.aggro_radius * self.aggro_radius;
        let release_radius = self.aggro_radius * self.hysteresis;
        match self.state {
            AiState::Idle if distance_sq <= aggro_sq => AiState::Seek,
            AiState::Seek if distance_sq > release_radius * release_radius => AiState::Idle,
            state => state,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuffTimers {
    pub speed_seconds: f32,
    pub shield_seconds: f32,
}

impl BuffTimers {
    pub fn speed_active(&self) -> bool {
        self.speed_seconds > 0.0
    }

    pub fn shield_active(&self) -> bool {
        self.shield_seconds > 0.0
    }

    pub fn decay(&mut self, dt_seconds: f32) {
        self.speed_seconds = (self.speed_seconds - dt_seconds).max(0.0);
        self.shield_seconds = (self.shield_seconds - dt_seconds).max(0.0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: EntityId,
    pub body: Body,
    pub health: u32,
    pub max_health: u32,
    pub invulnerable_seconds: f32,
    pub knockback_velocity: Vec2,
    pub buffs: BuffTimers,
}

impl Player {
    fn new(id: EntityId, position: Vec2, max_health: u32) -> Self {
        Self {
            id,
            body: Body::new(position, PLAYER_RADIUS),
            health: max_health,
            max_health,
            invulnerable_seconds: 0.0,
            knockback_velocity: Vec2::ZERO,
            buffs: BuffTimers::default(),
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_seconds > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub body: Body,
    pub active: bool,
    pub ai: AiAgent,
    pub path: PathFollow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PickupKind,
    pub body: Body,
    pub active: bool,
}

/// Read-only, kind-erased view used by snapshot exporters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: Body,
    pub active: bool,
    pub ai_state: Option<AiState>,
}

/// Owns every simulated actor. The player is a typed field, so there is
/// always exactly one of it; enemies and pickups live in stable-order vectors
/// that only change size through the rebuild methods below.
#[derive(Debug)]
pub struct EntityStore {
    allocator: EntityIdAllocator,
    player: Player,
    enemies: Vec<Enemy>,
    pickups: Vec<Pickup>,
}

impl EntityStore {
    pub fn new(player_position: Vec2, max_health: u32) -> Self {
        let mut allocator = EntityIdAllocator::default();
        let player = Player::new(allocator.allocate(), player_position, max_health);
        Self {
            allocator,
            player,
            enemies: Vec::new(),
            pickups: Vec::new(),
        }
    }

    /// Drops every entity and spawns a fresh player. Ids keep counting up.
    pub fn reset_level(&mut self, player_position: Vec2, max_health: u32) {
        self.enemies.clear();
        self.pickups.clear();
        self.player = Player::new(self.allocator.allocate(), player_position, max_health);
    }

    /// Rebuilds the enemy subset only; the player is left untouched.
    pub fn replace_enemies<I>(&mut self, spawns: I)
    where
        I: IntoIterator<Item = (EnemyKind, Vec2)>,
    {
        self.enemies.clear();
        for (kind, position) in spawns {
            self.spawn_enemy(kind, position);
        }
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        self.enemies.push(Enemy {
            id,
            kind,
            body: Body::new(position, kind.radius()),
            active: true,
            ai: AiAgent::new(DEFAULT_AGGRO_RADIUS),
            path: PathFollow::default(),
        });
        id
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, position: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        self.pickups.push(Pickup {
            id,
            kind,
            body: Body::new(position, PICKUP_RADIUS),
            active: true,
        });
        id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Split borrow for systems that move the player against enemies.
    pub fn player_and_enemies_mut(&mut self) -> (&mut Player, &mut [Enemy]) {
        (&mut self.player, &mut self.enemies)
    }

    pub fn player_and_pickups_mut(&mut self) -> (&mut Player, &mut [Pickup]) {
        (&mut self.player, &mut self.pickups)
    }

    pub fn entity_count(&self) -> usize {
        1 + self.enemies.len() + self.pickups.len()
    }

    pub fn store_previous_positions(&mut self) {
        self.player.body.store_previous();
        for enemy in &mut self.enemies {
            enemy.body.store_previous();
        }
        for pickup in &mut self.pickups {
            pickup.body.store_previous();
        }
    }

    /// Player first, then enemies, then pickups, each in spawn order.
    pub fn views(&self) -> impl Iterator<Item = EntityView> + '_ {
        let player = std::iter::once(EntityView {
            id: self.player.id,
            kind: EntityKind::Player,
            body: self.player.body,
            active: true,
            ai_state: None,
        });
        let enemies = self.enemies.iter().map(|enemy| EntityView {
            id: enemy.id,
            kind: EntityKind::Enemy(enemy.kind),
            body: enemy.body,
            active: enemy.active,
            ai_state: Some(enemy.ai.state),
        });
        let pickups = self.pickups.iter().map(|pickup| EntityView {
            id: pickup.id,
            kind: EntityKind::Pickup(pickup.kind),
            body: pickup.body,
            active: pickup.active,
            ai_state: None,
        });
        player.chain(enemies).chain(pickups)
    }
}
