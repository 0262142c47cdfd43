//! Test helper functions for setting up rooms and resolver runs.
//!
//! Two levels of setup:
//! - [`quiet_room`] and friends drive a whole [`Room`] through its public API
//! - [`Harness`] runs single resolvers against a bare [`Arena`]

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::{ArenaConfig, GameMode};
use crate::entity::{
    Body, ConnectionId, EntityId, EntityInner, MinionState, PlayerState,
};
use crate::event::{EventQueue, GameEvent};
use crate::kind::Kind;
use crate::resolver::{Resolver, TickContext, ZoneState};
use crate::room::{Room, RoomId, RoomSettings};

// =============================================================================
// Configuration
// =============================================================================

/// Default tuning with everything that acts on its own switched off: no
/// walls, no roaming bots, no orbs, no random wander.
pub fn quiet_config() -> ArenaConfig {
    let mut config = ArenaConfig::default();
    config.map.walls.clear();
    config.minion.bot_spawn_interval = u64::MAX;
    config.minion.wander_chance = 0.0;
    config.minion.hostile_wander_chance = 0.0;
    config.orbs.count = 0;
    config.orbs.respawn_chance = 0.0;
    config.kinds.scissors.crit_chance = 0.0;
    config
}

// =============================================================================
// Room setup
// =============================================================================

/// A seeded room with `config`.
pub fn room_with(config: ArenaConfig, mode: GameMode) -> Room {
    let settings = RoomSettings {
        mode,
        ..RoomSettings::default()
    };
    Room::with_seed(RoomId::new("test"), "Test", settings, Arc::new(config), 42)
        .expect("test config is valid")
}

/// A seeded territorial room with [`quiet_config`].
pub fn quiet_room() -> Room {
    room_with(quiet_config(), GameMode::Territorial)
}

/// Joins one player per kind, in order. The first joiner is host.
pub fn join_players(room: &mut Room, kinds: &[Kind]) -> Vec<ConnectionId> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let connection = ConnectionId::new(i as u64 + 1);
            room.join(connection, &format!("p{i}"), None)
                .expect("room has space");
            room.set_kind(connection, kind).expect("lobby kind change");
            connection
        })
        .collect()
}

/// Starts the match and runs past combat grace and spawn invulnerability.
pub fn start_and_settle(room: &mut Room, host: ConnectionId) {
    room.start(host).expect("host starts");
    let settle = room.config().combat.grace_ticks.max(u64::from(
        room.config().player.spawn_invulnerability,
    )) + 1;
    run_ticks(room, settle);
}

/// Runs `n` ticks.
pub fn run_ticks(room: &mut Room, n: u64) {
    for _ in 0..n {
        room.tick();
    }
}

/// Unit id of a connection's player.
pub fn entity_of(room: &Room, connection: ConnectionId) -> EntityId {
    room.arena()
        .player_of(connection)
        .expect("connection has a player")
}

/// Moves a unit to `pos` and stops it.
pub fn place(room: &mut Room, id: EntityId, pos: Vec2) {
    let e = room.arena_mut().get_mut(id).expect("unit exists");
    e.body.position = pos;
    e.body.velocity = Vec2::ZERO;
    e.body.stun = 0;
}

/// Spawns a minion with explicit hit points.
pub fn spawn_minion(room: &mut Room, kind: Kind, pos: Vec2, hp: f32) -> EntityId {
    let radius = room.config().minion.radius;
    room.arena_mut().spawn(
        Body::new(kind, pos, radius, hp),
        EntityInner::Minion(MinionState::default()),
    )
}

/// Current hit points of a unit.
pub fn hp(room: &Room, id: EntityId) -> f32 {
    room.arena().get(id).expect("unit exists").body.hp()
}

/// Counts queued events matching `pred`.
pub fn count_events(room: &Room, pred: impl Fn(&GameEvent) -> bool) -> usize {
    room.events().iter().filter(|e| pred(e)).count()
}

// =============================================================================
// Resolver harness
// =============================================================================

/// A bare arena plus everything a [`TickContext`] borrows.
pub struct Harness {
    pub config: ArenaConfig,
    pub mode: GameMode,
    pub arena: Arena,
    pub zone: ZoneState,
    pub rng: ChaCha8Rng,
    pub events: EventQueue,
}

impl Harness {
    pub fn new(config: ArenaConfig, mode: GameMode) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let zone = ZoneState::new(&config, mode, &mut rng);
        Self {
            arena: Arena::new(config.grid_cell_size),
            config,
            mode,
            zone,
            rng,
            events: EventQueue::new(),
        }
    }

    /// Spawns an active, full-health player.
    pub fn player(&mut self, kind: Kind, pos: Vec2) -> EntityId {
        let id = self.arena.spawn(
            Body::new(kind, pos, self.config.player.radius, 1.0),
            EntityInner::Player(PlayerState::new(
                ConnectionId::new(self.arena.len() as u64 + 1),
                "h".into(),
                &self.config.progression,
            )),
        );
        let e = self.arena.get_mut(id).expect("just spawned");
        e.apply_stats(&self.config);
        e.body.revive();
        if let Some(state) = e.as_player_mut() {
            state.active = true;
        }
        id
    }

    /// Runs one resolver at `tick`, with the match `elapsed` ticks old.
    pub fn run(&mut self, resolver: &dyn Resolver, tick: u64, elapsed: u64) {
        self.arena.rebuild_grid();
        let mut ctx = TickContext {
            config: &self.config,
            mode: self.mode,
            tick,
            elapsed,
            zone: &mut self.zone,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        resolver.resolve(&mut self.arena, &mut ctx);
    }

    pub fn hp(&self, id: EntityId) -> f32 {
        self.arena.get(id).expect("unit exists").body.hp()
    }
}
