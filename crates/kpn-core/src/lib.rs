//! # KPN Core
//!
//! Authoritative simulation for the KPN arena: a real-time multiplayer
//! rock-paper-scissors brawler.
//!
//! Players and AI minions each carry a [`Kind`](kind::Kind). On contact the
//! kind that beats the other deals damage; the storm and hostile zombies
//! hurt everyone. Matches end when a player reaches the win score.
//!
//! ## Architecture
//!
//! - **Arena**: unit storage, orbs and the per-tick spatial grid
//! - **Resolvers**: player control, minion steering, collisions, zones
//! - **Room**: one match lifecycle driving the resolver pipeline
//! - **Directory**: every live room, sessions, and the parallel tick
//!
//! Rooms never talk to the network. Each tick a room produces a
//! [`Snapshot`](snapshot::Snapshot) and a list of
//! [`GameEvent`](event::GameEvent)s, and the directory hands both to an
//! [`EventSink`](directory::EventSink).
//!
//! ## Usage
//!
//! ```
//! use kpn_core::config::ArenaConfig;
//! use kpn_core::directory::{EventSink, RoomDirectory, TickFrame, PUBLIC_ROOM};
//! use kpn_core::room::RoomId;
//!
//! struct Discard;
//!
//! impl EventSink for Discard {
//!     fn publish(&self, _room: &RoomId, _frame: TickFrame) {}
//! }
//!
//! let directory = RoomDirectory::new(ArenaConfig::default()).unwrap();
//! let connection = directory.connect();
//! directory.join(connection, &RoomId::new(PUBLIC_ROOM), "ada", None).unwrap();
//! directory.start(connection).unwrap();
//! directory.tick_all(&Discard);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod event;
pub mod kind;
pub mod placement;
pub mod resolver;
pub mod room;
pub mod snapshot;

#[cfg(test)]
mod tests;
