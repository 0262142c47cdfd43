//! Error types.
//!
//! Only rejections that a client can cause, plus configuration validation,
//! are errors. Out-of-range simulation values are clamped where they arise.

use thiserror::Error;

use crate::entity::ConnectionId;
use crate::kind::Kind;

/// Reasons a join request is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// No room with the requested id exists.
    #[error("room not found")]
    RoomNotFound,
    /// The room is at capacity.
    #[error("room is full")]
    RoomFull,
    /// The room is locked and the password did not match.
    #[error("wrong password")]
    WrongPassword,
    /// The connection already has a player in a room.
    #[error("connection {0} already joined a room")]
    AlreadyJoined(ConnectionId),
}

/// Reasons a player command is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The connection has no player in this room.
    #[error("connection {0} is not in a room")]
    NotInRoom(ConnectionId),
    /// A perk was requested without a pending level milestone.
    #[error("no perk selection is pending")]
    PerkNotPending,
    /// The perk is not in the configured perk table.
    #[error("unknown perk `{0}`")]
    UnknownPerk(String),
    /// The perk is already held.
    #[error("perk `{0}` already held")]
    PerkAlreadyHeld(String),
    /// Only the host may do this.
    #[error("only the host may start the match")]
    NotHost,
    /// The command is only valid in the lobby.
    #[error("a match is already running")]
    MatchRunning,
    /// Players cannot take this kind.
    #[error("kind `{0}` cannot be chosen")]
    InvalidKind(Kind),
    /// Chat text is longer than allowed.
    #[error("chat message exceeds {max} characters")]
    ChatTooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tunable is out of its legal range.
    #[error("`{field}` is out of range: {reason}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What was expected.
        reason: &'static str,
    },
    /// A static geometry entry is malformed.
    #[error("{kind} #{index} is malformed")]
    BadGeometry {
        /// Geometry category ("wall", "bush", ...).
        kind: &'static str,
        /// Index into the list.
        index: usize,
    },
    /// A cyclic kind has no capture zone in territorial mode.
    #[error("no capture zone for kind `{0}`")]
    MissingZone(Kind),
    /// JSON could not be parsed.
    #[error("invalid config document: {0}")]
    Parse(String),
}
