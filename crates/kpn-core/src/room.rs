//! Room module: one match from lobby to game over.
//!
//! A [`Room`] owns every unit of a match, the zone controller state, the
//! room RNG and the event queue. It is the only place the resolver pipeline
//! is driven from.
//!
//! # Lifecycle
//!
//! ```text
//! Lobby --host start--> Active --win--> GameOver --delay--> Lobby
//! ```
//!
//! Players persist across the whole cycle while connected. A reset zeroes
//! their progression (room wins excepted), clears minions and repopulates
//! orbs.
//!
//! # Tick
//!
//! [`Room::tick`] does nothing in the lobby. While a match runs:
//!
//! 1. **SPAWN**: roaming bots, safe-zone shrink and hostile injection,
//!    king-of-the-hill rotation
//! 2. **REVIVE**: any player still dead from last tick is resolved
//! 3. **GRID**: the spatial grid is rebuilt from units in play
//! 4. **RESOLVE**: the resolver pipeline runs in order
//! 5. **PRUNE**: dead minions are removed
//! 6. **RULES**: game-over countdown, or the periodic win check
//!
//! # Commands
//!
//! Player commands only write buffered state (input, kind, perk) or queue
//! events. Nothing a command does moves a unit until the next tick.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kpn_core::config::ArenaConfig;
//! use kpn_core::entity::ConnectionId;
//! use kpn_core::room::{Room, RoomId, RoomSettings};
//!
//! let config = Arc::new(ArenaConfig::default());
//! let mut room = Room::with_seed(RoomId::new("demo"), "Demo", RoomSettings::default(), config, 7).unwrap();
//!
//! let host = ConnectionId::new(1);
//! let ack = room.join(host, "ada", None).unwrap();
//! assert!(ack.host);
//!
//! room.start(host).unwrap();
//! for _ in 0..30 {
//!     room.tick();
//! }
//! assert!(room.is_running());
//! assert_eq!(room.snapshot().players.len(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arena::Arena;
use crate::config::{ArenaConfig, GameMode, PerkDef, PerkId, StaticMap};
use crate::entity::{
    Body, ConnectionId, Entity, EntityId, EntityInner, InputFrame, MinionState, Orb, PlayerState,
};
use crate::error::{CommandError, ConfigError, JoinError};
use crate::event::{EventQueue, GameEvent, WinReason};
use crate::kind::Kind;
use crate::placement;
use crate::resolver::{self, combat, Resolver, TickContext, ZoneState};
use crate::snapshot::Snapshot;

/// Name given to players who join without one.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

// =============================================================================
// Identity and settings
// =============================================================================

/// Identifier of a room in the directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-room options chosen at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    /// Zone rules.
    pub mode: GameMode,
    /// Maximum players. Capped by [`ArenaConfig::max_players`].
    pub capacity: usize,
    /// Password required to join, if any.
    pub password: Option<String>,
    /// Persistent rooms survive being empty.
    pub persistent: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Territorial,
            capacity: 25,
            password: None,
            persistent: false,
        }
    }
}

/// Where a room is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    /// Waiting for the host to start.
    Lobby,
    /// Match running.
    Active,
    /// Match won; still simulating until the reset tick.
    GameOver {
        /// Room tick at which the room returns to the lobby.
        resets_at: u64,
    },
}

/// Everything a client needs after joining.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinAck {
    /// The joining player's unit.
    pub entity: EntityId,
    /// Whether the joiner is now host.
    pub host: bool,
    /// Width and height of the map.
    pub map_size: f32,
    /// Static geometry.
    pub map: StaticMap,
    /// Perk table.
    pub perks: Vec<PerkDef>,
    /// Score that wins a match.
    pub win_score: u32,
    /// Whether the joiner was dropped straight into a running match.
    pub match_running: bool,
}

// =============================================================================
// Room
// =============================================================================

/// One match instance.
pub struct Room {
    id: RoomId,
    name: String,
    settings: RoomSettings,
    config: Arc<ArenaConfig>,
    arena: Arena,
    zone: ZoneState,
    phase: RoomPhase,
    /// Ticks since creation; keeps counting across matches.
    tick: u64,
    /// Tick at which the current match started.
    started_at: u64,
    host: Option<ConnectionId>,
    rng: ChaCha8Rng,
    events: EventQueue,
    pipeline: Vec<Box<dyn Resolver>>,
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .field("tick", &self.tick)
            .field("host", &self.host)
            .field("units", &self.arena.len())
            .field("pipeline", &format!("[{} resolvers]", self.pipeline.len()))
            .finish_non_exhaustive()
    }
}

impl Room {
    /// Creates a room seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by [`ArenaConfig::validate`].
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        settings: RoomSettings,
        config: Arc<ArenaConfig>,
    ) -> Result<Self, ConfigError> {
        Self::build(id, name.into(), settings, config, ChaCha8Rng::from_entropy())
    }

    /// Creates a room with a fixed RNG seed.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by [`ArenaConfig::validate`].
    pub fn with_seed(
        id: RoomId,
        name: impl Into<String>,
        settings: RoomSettings,
        config: Arc<ArenaConfig>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::build(id, name.into(), settings, config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build(
        id: RoomId,
        name: String,
        mut settings: RoomSettings,
        config: Arc<ArenaConfig>,
        mut rng: ChaCha8Rng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        settings.capacity = settings.capacity.min(config.max_players);
        settings.password = settings.password.filter(|p| !p.is_empty());
        let zone = ZoneState::new(&config, settings.mode, &mut rng);
        let mut room = Self {
            id,
            name,
            settings,
            arena: Arena::new(config.grid_cell_size),
            zone,
            phase: RoomPhase::Lobby,
            tick: 0,
            started_at: 0,
            host: None,
            rng,
            events: EventQueue::new(),
            pipeline: resolver::pipeline(),
            config,
        };
        room.clear_world();
        Ok(room)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Room id.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation options.
    #[must_use]
    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Returns `true` from match start until the reset after game over.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, RoomPhase::Lobby)
    }

    /// Ticks since creation.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Ticks since the current match started. Zero in the lobby.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        if self.is_running() {
            self.tick - self.started_at
        } else {
            0
        }
    }

    /// Current host.
    #[must_use]
    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    /// The unit container.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable unit container, for drivers and tests that stage positions.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Zone controller state.
    #[must_use]
    pub fn zone(&self) -> &ZoneState {
        &self.zone
    }

    /// Events queued since the last drain.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        self.events.events()
    }

    /// Connected players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.arena.player_count()
    }

    /// Returns `true` when no player is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.player_count() == 0
    }

    /// Returns the player unit of a connection.
    #[must_use]
    pub fn player(&self, connection: ConnectionId) -> Option<&Entity> {
        self.arena.player_of(connection).and_then(|id| self.arena.get(id))
    }

    fn player_mut(&mut self, connection: ConnectionId) -> Result<&mut Entity, CommandError> {
        let id = self
            .arena
            .player_of(connection)
            .ok_or(CommandError::NotInRoom(connection))?;
        self.arena
            .get_mut(id)
            .ok_or(CommandError::NotInRoom(connection))
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Adds a player for `connection`.
    ///
    /// The first player becomes host. Joining a running match activates the
    /// player at once at its entry point with spawn invulnerability.
    ///
    /// # Errors
    ///
    /// [`JoinError::WrongPassword`], [`JoinError::AlreadyJoined`] or
    /// [`JoinError::RoomFull`].
    pub fn join(
        &mut self,
        connection: ConnectionId,
        name: &str,
        password: Option<&str>,
    ) -> Result<JoinAck, JoinError> {
        if let Some(expected) = &self.settings.password {
            if password != Some(expected.as_str()) {
                return Err(JoinError::WrongPassword);
            }
        }
        if self.arena.player_of(connection).is_some() {
            return Err(JoinError::AlreadyJoined(connection));
        }
        if self.player_count() >= self.settings.capacity {
            return Err(JoinError::RoomFull);
        }

        let config = Arc::clone(&self.config);
        let name = sanitize_name(name, config.player.name_max_len);
        let kind = Kind::default();
        let id = self.arena.spawn(
            Body::new(
                kind,
                config.center(),
                config.player.radius,
                config.kinds.get(kind).max_hp,
            ),
            EntityInner::Player(PlayerState::new(connection, name.clone(), &config.progression)),
        );
        if let Some(player) = self.arena.get_mut(id) {
            player.apply_stats(&config);
        }

        let host = self.host.is_none();
        if host {
            self.host = Some(connection);
        }

        let match_running = self.is_running();
        if match_running {
            self.deploy(id);
        }

        debug!(room = %self.id, %connection, name = %name, host, match_running, "player joined");
        Ok(JoinAck {
            entity: id,
            host,
            map_size: config.map_radius * 2.0,
            map: config.map.clone(),
            perks: config.perks.clone(),
            win_score: config.match_rules.win_score,
            match_running,
        })
    }

    /// Removes the player of `connection`. Returns `false` if it was not here.
    ///
    /// Host passes to the earliest remaining player.
    pub fn leave(&mut self, connection: ConnectionId) -> bool {
        let Some(id) = self.arena.player_of(connection) else {
            return false;
        };
        self.arena.despawn(id);
        if self.host == Some(connection) {
            self.host = self
                .arena
                .players()
                .find_map(|p| p.as_player().map(|s| s.connection));
        }
        debug!(room = %self.id, %connection, host = ?self.host, "player left");
        true
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Buffers the latest input of a player.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotInRoom`].
    pub fn set_input(
        &mut self,
        connection: ConnectionId,
        input: InputFrame,
    ) -> Result<(), CommandError> {
        let player = self.player_mut(connection)?;
        if let Some(state) = player.as_player_mut() {
            state.input = input;
        }
        Ok(())
    }

    /// Changes a player's kind. Lobby only.
    ///
    /// # Errors
    ///
    /// [`CommandError::MatchRunning`], [`CommandError::InvalidKind`] for the
    /// hostile kind, or [`CommandError::NotInRoom`].
    pub fn set_kind(&mut self, connection: ConnectionId, kind: Kind) -> Result<(), CommandError> {
        if self.is_running() {
            return Err(CommandError::MatchRunning);
        }
        if kind.is_hostile() {
            return Err(CommandError::InvalidKind(kind));
        }
        let config = Arc::clone(&self.config);
        let player = self.player_mut(connection)?;
        player.body.kind = kind;
        player.apply_stats(&config);
        player.body.restore_hp();
        Ok(())
    }

    /// Starts the match on behalf of the host.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotHost`] or [`CommandError::MatchRunning`].
    pub fn start(&mut self, connection: ConnectionId) -> Result<(), CommandError> {
        if self.host != Some(connection) {
            return Err(CommandError::NotHost);
        }
        if self.is_running() {
            return Err(CommandError::MatchRunning);
        }
        self.start_match();
        Ok(())
    }

    /// Takes a perk at a level milestone. Restores full hit points.
    ///
    /// # Errors
    ///
    /// [`CommandError::PerkNotPending`], [`CommandError::UnknownPerk`],
    /// [`CommandError::PerkAlreadyHeld`] or [`CommandError::NotInRoom`].
    pub fn select_perk(
        &mut self,
        connection: ConnectionId,
        perk: &str,
    ) -> Result<PerkId, CommandError> {
        let config = Arc::clone(&self.config);
        let room = self.id.clone();
        let player = self.player_mut(connection)?;
        let Some(state) = player.as_player_mut() else {
            return Err(CommandError::NotInRoom(connection));
        };
        if !state.pending_perk {
            return Err(CommandError::PerkNotPending);
        }
        let id = perk
            .parse::<PerkId>()
            .ok()
            .filter(|id| config.perk(*id).is_some())
            .ok_or_else(|| CommandError::UnknownPerk(perk.to_string()))?;
        if state.has_perk(id) {
            return Err(CommandError::PerkAlreadyHeld(perk.to_string()));
        }
        state.perks.push(id);
        state.pending_perk = false;
        player.apply_stats(&config);
        player.body.restore_hp();
        debug!(%room, %connection, perk = %id, "perk selected");
        Ok(id)
    }

    /// Shows an emote over a player and announces it.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotInRoom`].
    pub fn emote(&mut self, connection: ConnectionId, emote: &str) -> Result<(), CommandError> {
        let ticks = self.config.player.emote_ticks;
        let emote: String = emote.chars().filter(|c| !c.is_control()).take(16).collect();
        let player = self.player_mut(connection)?;
        player.body.emote = Some(emote.clone());
        player.body.emote_timer = ticks;
        let entity = player.id();
        self.events.push(GameEvent::Emote { entity, emote });
        Ok(())
    }

    /// Broadcasts a chat line. Blank lines are dropped silently.
    ///
    /// # Errors
    ///
    /// [`CommandError::ChatTooLong`] or [`CommandError::NotInRoom`].
    pub fn chat(&mut self, connection: ConnectionId, message: &str) -> Result<(), CommandError> {
        let max = self.config.player.chat_max_len;
        let name = self
            .player(connection)
            .and_then(|p| p.as_player())
            .map(|s| s.name.clone())
            .ok_or(CommandError::NotInRoom(connection))?;
        let message = message.trim();
        if message.is_empty() {
            return Ok(());
        }
        if message.chars().count() > max {
            return Err(CommandError::ChatTooLong { max });
        }
        self.events.push(GameEvent::Chat {
            name,
            message: message.to_string(),
        });
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts a match: resets the safe zone and capture zones, then activates,
    /// heals and places every connected player with spawn invulnerability.
    pub fn start_match(&mut self) {
        self.phase = RoomPhase::Active;
        self.started_at = self.tick;
        self.zone
            .reinit(&self.config, self.settings.mode, &mut self.rng);
        for id in self.arena.player_ids() {
            self.deploy(id);
        }
        self.events.push(GameEvent::GameStart);
        info!(
            room = %self.id,
            players = self.player_count(),
            mode = %self.settings.mode,
            "match started"
        );
    }

    /// Returns the room to the lobby: clears minions, repopulates orbs, and
    /// zeroes every player's progression. Room wins persist.
    pub fn reset(&mut self) {
        self.phase = RoomPhase::Lobby;
        self.clear_world();
        let config = Arc::clone(&self.config);
        for player in self.arena.players_mut() {
            if let Some(state) = player.as_player_mut() {
                state.reset_progress(&config.progression);
                state.input = InputFrame::default();
            }
            player.apply_stats(&config);
            player.body.revive();
            player.body.velocity = Vec2::ZERO;
            player.body.invulnerable = 0;
            player.body.emote = None;
            player.body.emote_timer = 0;
        }
        self.events.push(GameEvent::GameReset);
        info!(room = %self.id, players = self.player_count(), "room reset");
    }

    /// Drops queued events and resets. Used after a tick failed.
    pub fn force_reset(&mut self) {
        self.events.drain();
        self.reset();
    }

    fn clear_world(&mut self) {
        self.arena.clear_minions();
        self.zone
            .reinit(&self.config, self.settings.mode, &mut self.rng);
        let orbs: Vec<Orb> = (0..self.config.orbs.count)
            .filter_map(|_| placement::orb_position(&self.config, &mut self.rng))
            .map(|position| Orb { position })
            .collect();
        *self.arena.orbs_mut() = orbs;
        self.arena.rebuild_grid();
    }

    /// Activates a player at its entry point, healed and shielded.
    fn deploy(&mut self, id: EntityId) {
        let config = &*self.config;
        let Some(player) = self.arena.get_mut(id) else {
            return;
        };
        let kind = player.kind();
        if let Some(state) = player.as_player_mut() {
            state.active = true;
            state.zone_dwell = 0;
        }
        player.apply_stats(config);
        player.body.revive();
        player.body.velocity = Vec2::ZERO;
        player.body.position = placement::entry_point(
            config,
            self.settings.mode,
            self.zone.zones(),
            kind,
            &mut self.rng,
        );
        player.body.invulnerable = config.player.spawn_invulnerability;
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advances the room by one tick. Does nothing in the lobby.
    pub fn tick(&mut self) {
        if !self.is_running() {
            return;
        }
        self.tick += 1;
        let tick = self.tick;
        let elapsed = self.elapsed();
        let config = Arc::clone(&self.config);

        // PHASE 1: SPAWN
        if tick % config.minion.bot_spawn_interval == 0 {
            self.spawn_bot();
        }
        if self.zone.advance_shrink(elapsed, &config)
            && tick % config.shrink.hostile_interval == 0
            && self.arena.minion_count() < config.max_bots + config.shrink.hostile_cap_bonus
        {
            self.spawn_hostile();
        }
        if self.settings.mode == GameMode::KingOfTheHill {
            if let Some(kind) = self.zone.advance_rotation(&config) {
                let message = format!("Zone changes to {}", kind.as_str().to_uppercase());
                self.events.push(GameEvent::ZoneRotation { kind, message });
                debug!(room = %self.id, %kind, "zone rotated");
            }
        }

        let Self {
            arena,
            zone,
            rng,
            events,
            pipeline,
            settings,
            ..
        } = self;
        let mut ctx = TickContext {
            config: &config,
            mode: settings.mode,
            tick,
            elapsed,
            zone,
            rng,
            events,
        };

        // PHASE 2: REVIVE
        for id in arena.player_ids() {
            if arena.get(id).is_some_and(|p| p.body.is_dead()) {
                combat::resolve_death(arena, id, None, &mut ctx);
            }
        }

        // PHASE 3: GRID
        arena.rebuild_grid();

        // PHASE 4: RESOLVE
        for resolver in pipeline.iter() {
            resolver.resolve(arena, &mut ctx);
        }

        // PHASE 5: PRUNE
        arena.prune_dead_minions();

        // PHASE 6: RULES
        match self.phase {
            RoomPhase::GameOver { resets_at } if tick >= resets_at => self.reset(),
            RoomPhase::Active
                if tick % config.match_rules.win_check_interval == 0
                    && elapsed >= config.match_rules.win_grace_ticks =>
            {
                self.check_win();
            }
            _ => {}
        }
    }

    fn spawn_bot(&mut self) {
        let config = &*self.config;
        if self.arena.minion_count() >= config.max_bots {
            return;
        }
        let Some(&kind) = Kind::CYCLIC.choose(&mut self.rng) else {
            return;
        };
        let Some(at) =
            placement::bot_position(config, self.settings.mode, self.zone.zones(), &mut self.rng)
        else {
            return;
        };
        self.arena.spawn(
            Body::new(kind, at, config.minion.radius, config.minion.hp),
            EntityInner::Minion(MinionState::default()),
        );
    }

    fn spawn_hostile(&mut self) {
        let config = &*self.config;
        if !self.zone.is_shrinking() {
            return;
        }
        let Some(at) = placement::hostile_position(config, self.zone.safe_radius(), &mut self.rng)
        else {
            return;
        };
        self.arena.spawn(
            Body::new(Kind::Zombie, at, config.minion.radius, config.kinds.zombie.max_hp),
            EntityInner::Minion(MinionState::default()),
        );
        self.events.push(GameEvent::HostileSpawned { at });
    }

    fn check_win(&mut self) {
        let win_score = self.config.match_rules.win_score;
        let leader = self
            .arena
            .players_mut()
            .filter_map(Entity::as_player_mut)
            .find(|s| s.active && s.score >= win_score);
        if let Some(state) = leader {
            state.room_wins += 1;
            let winner = state.name.clone();
            self.finish(winner, WinReason::Score);
            return;
        }

        if self.config.match_rules.last_kind_standing
            && self.settings.mode == GameMode::Territorial
        {
            let kinds: Vec<Kind> = self
                .arena
                .players()
                .filter(|p| p.as_player().is_some_and(|s| s.active))
                .map(Entity::kind)
                .collect();
            if let Some(&first) = kinds.first() {
                if kinds.len() >= 2 && kinds.iter().all(|&k| k == first) {
                    for state in self.arena.players_mut().filter_map(Entity::as_player_mut) {
                        if state.active {
                            state.room_wins += 1;
                        }
                    }
                    self.finish(first.as_str().to_uppercase(), WinReason::LastKindStanding);
                }
            }
        }
    }

    fn finish(&mut self, winner: String, reason: WinReason) {
        self.phase = RoomPhase::GameOver {
            resets_at: self.tick + self.config.match_rules.game_over_ticks,
        };
        info!(room = %self.id, winner = %winner, ?reason, "game over");
        self.events.push(GameEvent::GameOver { winner, reason });
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Builds the per-tick state payload.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Takes every queued event.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Appends a resolver that runs after the built-in pipeline.
    pub fn add_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.pipeline.push(resolver);
    }
}

/// Cleans a display name: control characters removed, whitespace trimmed,
/// truncated to `max_len` characters. Blank names become
/// [`DEFAULT_PLAYER_NAME`].
#[must_use]
pub fn sanitize_name(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let name: String = cleaned.trim().chars().take(max_len).collect();
    let name = name.trim_end();
    if name.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        room_with(RoomSettings::default(), ArenaConfig::default())
    }

    fn room_with(settings: RoomSettings, config: ArenaConfig) -> Room {
        Room::with_seed(RoomId::new("t"), "Test", settings, Arc::new(config), 99).unwrap()
    }

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    mod membership_tests {
        use super::*;

        #[test]
        fn first_joiner_is_host() {
            let mut r = room();
            assert!(r.join(conn(1), "ada", None).unwrap().host);
            assert!(!r.join(conn(2), "bo", None).unwrap().host);
            assert_eq!(r.host(), Some(conn(1)));
        }

        #[test]
        fn new_player_is_an_inactive_rock_with_full_hp() {
            let mut r = room();
            r.join(conn(1), "ada", None).unwrap();
            let p = r.player(conn(1)).unwrap();
            assert_eq!(p.kind(), Kind::Rock);
            assert!(!p.is_in_play());
            assert!((p.body.hp() - 220.0).abs() < f32::EPSILON);
        }

        #[test]
        fn password_and_capacity_are_enforced() {
            let settings = RoomSettings {
                capacity: 1,
                password: Some("pw".into()),
                ..RoomSettings::default()
            };
            let mut r = room_with(settings, ArenaConfig::default());
            assert_eq!(r.join(conn(1), "a", None), Err(JoinError::WrongPassword));
            assert_eq!(r.join(conn(1), "a", Some("no")), Err(JoinError::WrongPassword));
            r.join(conn(1), "a", Some("pw")).unwrap();
            assert_eq!(r.join(conn(2), "b", Some("pw")), Err(JoinError::RoomFull));
        }

        #[test]
        fn joining_twice_is_rejected() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            assert_eq!(
                r.join(conn(1), "a", None),
                Err(JoinError::AlreadyJoined(conn(1)))
            );
        }

        #[test]
        fn host_passes_to_earliest_remaining_player() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            r.join(conn(2), "b", None).unwrap();
            r.join(conn(3), "c", None).unwrap();
            assert!(r.leave(conn(1)));
            assert_eq!(r.host(), Some(conn(2)));
            assert!(!r.leave(conn(1)));
            r.leave(conn(2));
            r.leave(conn(3));
            assert_eq!(r.host(), None);
            assert!(r.is_empty());
        }

        #[test]
        fn mid_match_joiner_is_deployed_with_shield() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            r.start(conn(1)).unwrap();
            let ack = r.join(conn(2), "b", None).unwrap();
            assert!(ack.match_running);
            let p = r.player(conn(2)).unwrap();
            assert!(p.is_in_play());
            assert!(p.body.is_invulnerable());
        }
    }

    mod command_tests {
        use super::*;

        #[test]
        fn kind_can_only_change_in_lobby() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            r.set_kind(conn(1), Kind::Paper).unwrap();
            let p = r.player(conn(1)).unwrap();
            assert_eq!(p.kind(), Kind::Paper);
            assert!((p.body.max_hp() - 130.0).abs() < f32::EPSILON);
            assert_eq!(
                r.set_kind(conn(1), Kind::Zombie),
                Err(CommandError::InvalidKind(Kind::Zombie))
            );
            r.start(conn(1)).unwrap();
            assert_eq!(r.set_kind(conn(1), Kind::Rock), Err(CommandError::MatchRunning));
        }

        #[test]
        fn only_host_may_start() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            r.join(conn(2), "b", None).unwrap();
            assert_eq!(r.start(conn(2)), Err(CommandError::NotHost));
            r.start(conn(1)).unwrap();
            assert_eq!(r.start(conn(1)), Err(CommandError::MatchRunning));
        }

        #[test]
        fn perk_requires_pending_milestone() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            assert_eq!(r.select_perk(conn(1), "tank"), Err(CommandError::PerkNotPending));

            r.arena_mut()
                .players_mut()
                .filter_map(Entity::as_player_mut)
                .for_each(|s| s.pending_perk = true);
            assert_eq!(
                r.select_perk(conn(1), "laser"),
                Err(CommandError::UnknownPerk("laser".into()))
            );
            assert_eq!(r.select_perk(conn(1), "tank"), Ok(PerkId::Tank));
            let p = r.player(conn(1)).unwrap();
            assert!((p.body.max_hp() - 330.0).abs() < 1e-3);
            assert!((p.body.hp() - 330.0).abs() < 1e-3);
            assert!(!p.as_player().unwrap().pending_perk);
        }

        #[test]
        fn chat_is_bounded_and_blank_lines_are_dropped() {
            let mut r = room();
            r.join(conn(1), "ada", None).unwrap();
            r.chat(conn(1), "   ").unwrap();
            assert!(r.events().is_empty());
            assert_eq!(
                r.chat(conn(1), &"x".repeat(51)),
                Err(CommandError::ChatTooLong { max: 50 })
            );
            r.chat(conn(1), "gg").unwrap();
            assert_eq!(
                r.events(),
                [GameEvent::Chat {
                    name: "ada".into(),
                    message: "gg".into()
                }]
            );
        }

        #[test]
        fn commands_from_strangers_are_rejected() {
            let mut r = room();
            assert_eq!(
                r.set_input(conn(5), InputFrame::default()),
                Err(CommandError::NotInRoom(conn(5)))
            );
            assert_eq!(r.emote(conn(5), "wave"), Err(CommandError::NotInRoom(conn(5))));
        }

        #[test]
        fn emote_sets_timer_and_announces() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            r.emote(conn(1), "wave").unwrap();
            let p = r.player(conn(1)).unwrap();
            assert_eq!(p.body.emote.as_deref(), Some("wave"));
            assert_eq!(p.body.emote_timer, 60);
            assert!(matches!(r.events()[0], GameEvent::Emote { .. }));
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn lobby_does_not_tick() {
            let mut r = room();
            r.tick();
            assert_eq!(r.tick_count(), 0);
        }

        #[test]
        fn reset_repopulates_orbs_and_clears_minions() {
            let mut r = room();
            r.join(conn(1), "a", None).unwrap();
            assert_eq!(r.arena().orbs().len(), 100);
            r.start(conn(1)).unwrap();
            for _ in 0..80 {
                r.tick();
            }
            assert!(r.arena().minion_count() > 0);
            r.reset();
            assert_eq!(r.arena().minion_count(), 0);
            assert_eq!(r.arena().orbs().len(), 100);
            assert_eq!(r.phase(), RoomPhase::Lobby);
        }

        #[test]
        fn reaching_win_score_ends_the_match_then_resets() {
            let mut config = ArenaConfig::default();
            config.match_rules.win_score = 100;
            let mut r = room_with(RoomSettings::default(), config);
            r.join(conn(1), "ada", None).unwrap();
            r.start(conn(1)).unwrap();
            r.arena_mut()
                .players_mut()
                .filter_map(Entity::as_player_mut)
                .for_each(|s| s.score = 100);

            while r.phase() == RoomPhase::Active {
                r.tick();
                assert!(r.tick_count() <= 150);
            }
            assert_eq!(r.tick_count(), 150);
            assert!(r.events().iter().any(|e| matches!(
                e,
                GameEvent::GameOver { winner, reason: WinReason::Score } if winner == "ada"
            )));
            assert_eq!(r.player(conn(1)).unwrap().as_player().unwrap().room_wins, 1);

            for _ in 0..150 {
                r.tick();
            }
            assert_eq!(r.phase(), RoomPhase::Lobby);
            let state = r.player(conn(1)).unwrap().as_player().unwrap();
            assert_eq!(state.score, 0);
            assert_eq!(state.room_wins, 1);
        }

        #[test]
        fn koth_zone_rotates_after_window() {
            let settings = RoomSettings {
                mode: GameMode::KingOfTheHill,
                ..RoomSettings::default()
            };
            let mut r = room_with(settings, ArenaConfig::default());
            r.join(conn(1), "a", None).unwrap();
            r.start(conn(1)).unwrap();
            let first = r.zone().zones()[0].kind;
            for _ in 0..601 {
                r.tick();
            }
            assert_eq!(r.zone().zones()[0].kind, first.next());
        }
    }

    mod name_tests {
        use super::*;

        #[test]
        fn names_are_trimmed_and_bounded() {
            assert_eq!(sanitize_name("  ada  ", 15), "ada");
            assert_eq!(sanitize_name("a\u{7}b", 15), "ab");
            assert_eq!(sanitize_name("abcdefghijklmnopq", 15).chars().count(), 15);
            assert_eq!(sanitize_name("   ", 15), DEFAULT_PLAYER_NAME);
        }
    }
}
