//! Room directory: every live room of a server and who is in which.
//!
//! # Architecture
//!
//! ```text
//! RoomDirectory
//!   sessions: RwLock<ConnectionId -> RoomId>
//!   rooms:    RwLock<RoomId -> Arc<Mutex<Room>>>
//! ```
//!
//! The room map lock is held only to create, dispose, list or look up rooms.
//! Commands clone the room handle out and lock that room alone.
//! [`RoomDirectory::tick_all`] ticks rooms in parallel; rooms share no
//! mutable state.
//!
//! Locks are always taken in the order sessions, rooms, room.
//!
//! # Failure isolation
//!
//! A panic inside one room's tick is caught, logged, and the room is
//! force-reset to the lobby. Other rooms are unaffected.

use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{ArenaConfig, GameMode, PerkId};
use crate::entity::{ConnectionId, InputFrame};
use crate::error::{CommandError, ConfigError, JoinError};
use crate::event::GameEvent;
use crate::kind::Kind;
use crate::room::{JoinAck, Room, RoomId, RoomSettings};
use crate::snapshot::Snapshot;

/// Id of the room that always exists.
pub const PUBLIC_ROOM: &str = "public";

const PUBLIC_ROOM_NAME: &str = "Public Arena";
const PUBLIC_CAPACITY: usize = 25;
const CUSTOM_CAPACITY: usize = 15;
const ROOM_ID_LEN: usize = 6;
const ROOM_NAME_MAX_LEN: usize = 20;

type RoomHandle = Arc<Mutex<Room>>;

/// What a room publishes after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickFrame {
    /// Room tick the frame belongs to.
    pub tick: u64,
    /// State at the end of the tick.
    pub snapshot: Snapshot,
    /// Events since the previous frame.
    pub events: Vec<GameEvent>,
}

/// Receives per-tick frames for delivery to clients.
pub trait EventSink: Send + Sync {
    /// Publishes one room's frame.
    fn publish(&self, room: &RoomId, frame: TickFrame);
}

/// One line of the room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    /// Room id.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Connected players.
    pub players: usize,
    /// Capacity.
    pub max: usize,
    /// Password protected.
    pub locked: bool,
    /// Zone rules.
    pub mode: GameMode,
}

/// Registry of live rooms and connection sessions.
pub struct RoomDirectory {
    config: Arc<ArenaConfig>,
    rooms: RwLock<BTreeMap<RoomId, RoomHandle>>,
    sessions: RwLock<HashMap<ConnectionId, RoomId>>,
    next_connection: AtomicU64,
    rng: Mutex<ChaCha8Rng>,
}

impl std::fmt::Debug for RoomDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDirectory")
            .field("rooms", &self.room_count())
            .field("connections", &self.connection_count())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RoomDirectory {
    /// Creates a directory holding only the persistent public room.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in `config`.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        let config = Arc::new(config);
        let public = Room::new(
            RoomId::new(PUBLIC_ROOM),
            PUBLIC_ROOM_NAME,
            RoomSettings {
                capacity: PUBLIC_CAPACITY,
                persistent: true,
                ..RoomSettings::default()
            },
            Arc::clone(&config),
        )?;
        let mut rooms = BTreeMap::new();
        rooms.insert(public.id().clone(), Arc::new(Mutex::new(public)));
        Ok(Self {
            config,
            rooms: RwLock::new(rooms),
            sessions: RwLock::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        })
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Hands out a fresh connection id.
    pub fn connect(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    /// Creates a custom room and returns its generated id.
    ///
    /// Blank names fall back to `Room <id>`; blank passwords mean no password.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the shared configuration is invalid.
    pub fn create_room(
        &self,
        name: &str,
        mode: GameMode,
        password: Option<&str>,
    ) -> Result<RoomId, ConfigError> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let id = loop {
            let candidate = self.generate_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let name: String = name.trim().chars().take(ROOM_NAME_MAX_LEN).collect();
        let name = if name.trim().is_empty() {
            format!("Room {id}")
        } else {
            name.trim().to_string()
        };
        let settings = RoomSettings {
            mode,
            capacity: CUSTOM_CAPACITY,
            password: password.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
            persistent: false,
        };
        let locked = settings.password.is_some();
        let room = Room::new(id.clone(), name.clone(), settings, Arc::clone(&self.config))?;
        rooms.insert(id.clone(), Arc::new(Mutex::new(room)));
        info!(room = %id, name = %name, %mode, locked, "room created");
        Ok(id)
    }

    fn generate_id(&self) -> RoomId {
        let mut rng = lock(&self.rng);
        let id: String = (&mut *rng)
            .sample_iter(Alphanumeric)
            .take(ROOM_ID_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        RoomId::new(id)
    }

    /// Lists every room.
    #[must_use]
    pub fn list(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms
            .values()
            .map(|handle| {
                let room = lock(handle);
                RoomSummary {
                    id: room.id().clone(),
                    name: room.name().to_string(),
                    players: room.player_count(),
                    max: room.settings().capacity,
                    locked: room.settings().password.is_some(),
                    mode: room.settings().mode,
                }
            })
            .collect()
    }

    /// Handle to a room, for drivers and tests.
    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Number of live rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of connections currently in a room.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Room a connection is in.
    #[must_use]
    pub fn room_of(&self, connection: ConnectionId) -> Option<RoomId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&connection)
            .cloned()
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Puts a connection into a room.
    ///
    /// # Errors
    ///
    /// [`JoinError::AlreadyJoined`] if the connection is in any room,
    /// [`JoinError::RoomNotFound`], or whatever [`Room::join`] rejects.
    pub fn join(
        &self,
        connection: ConnectionId,
        room: &RoomId,
        name: &str,
        password: Option<&str>,
    ) -> Result<JoinAck, JoinError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&connection) {
            return Err(JoinError::AlreadyJoined(connection));
        }
        let handle = self.room(room).ok_or(JoinError::RoomNotFound)?;
        let ack = lock(&handle).join(connection, name, password)?;
        sessions.insert(connection, room.clone());
        Ok(ack)
    }

    /// Takes a connection out of its room. Empty non-persistent rooms are
    /// disposed. Returns `false` if the connection was in no room.
    pub fn leave(&self, connection: ConnectionId) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let Some(id) = sessions.remove(&connection) else {
            return false;
        };
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = rooms.get(&id) else {
            return true;
        };
        let dispose = {
            let mut room = lock(handle);
            room.leave(connection);
            room.is_empty() && !room.settings().persistent
        };
        if dispose {
            rooms.remove(&id);
            info!(room = %id, "room disposed");
        }
        true
    }

    fn with_player<T>(
        &self,
        connection: ConnectionId,
        f: impl FnOnce(&mut Room) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let handle = self
            .room_of(connection)
            .and_then(|id| self.room(&id))
            .ok_or(CommandError::NotInRoom(connection))?;
        let mut room = lock(&handle);
        let result = f(&mut room);
        if let Err(e) = &result {
            warn!(room = %room.id(), %connection, error = %e, "command rejected");
        }
        result
    }

    /// Buffers a connection's input.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotInRoom`].
    pub fn input(&self, connection: ConnectionId, input: InputFrame) -> Result<(), CommandError> {
        self.with_player(connection, |room| room.set_input(connection, input))
    }

    /// Lobby kind selection.
    ///
    /// # Errors
    ///
    /// See [`Room::set_kind`].
    pub fn set_kind(&self, connection: ConnectionId, kind: Kind) -> Result<(), CommandError> {
        self.with_player(connection, |room| room.set_kind(connection, kind))
    }

    /// Host starts the match.
    ///
    /// # Errors
    ///
    /// See [`Room::start`].
    pub fn start(&self, connection: ConnectionId) -> Result<(), CommandError> {
        self.with_player(connection, |room| room.start(connection))
    }

    /// Perk selection.
    ///
    /// # Errors
    ///
    /// See [`Room::select_perk`].
    pub fn select_perk(&self, connection: ConnectionId, perk: &str) -> Result<PerkId, CommandError> {
        self.with_player(connection, |room| room.select_perk(connection, perk))
    }

    /// Emote.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotInRoom`].
    pub fn emote(&self, connection: ConnectionId, emote: &str) -> Result<(), CommandError> {
        self.with_player(connection, |room| room.emote(connection, emote))
    }

    /// Chat line.
    ///
    /// # Errors
    ///
    /// See [`Room::chat`].
    pub fn chat(&self, connection: ConnectionId, message: &str) -> Result<(), CommandError> {
        self.with_player(connection, |room| room.chat(connection, message))
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Ticks every room once, in parallel, and publishes each room's frame.
    pub fn tick_all(&self, sink: &dyn EventSink) {
        let rooms: Vec<(RoomId, RoomHandle)> = self
            .rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();

        rooms.par_iter().for_each(|(id, handle)| {
            let mut room = lock(handle);
            if panic::catch_unwind(AssertUnwindSafe(|| room.tick())).is_err() {
                error!(room = %id, tick = room.tick_count(), "room tick panicked, resetting");
                room.force_reset();
            }
            let frame = TickFrame {
                tick: room.tick_count(),
                snapshot: room.snapshot(),
                events: room.drain_events(),
            };
            drop(room);
            sink.publish(id, frame);
        });
    }
}
