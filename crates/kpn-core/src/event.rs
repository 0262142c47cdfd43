//! Discrete room events.
//!
//! Simulation code never talks to the network. It appends [`GameEvent`]s to
//! the room's [`EventQueue`], and the room directory drains the queue after
//! each tick and hands it to the transport together with the snapshot.
//!
//! Events describe what happened (a hit, a kill, a conversion). Presentation
//! details such as colours are left to the client; [`Tone`] only says which
//! family an effect belongs to.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::kind::Kind;

/// Presentation family of an effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Contact damage.
    Hit,
    /// Storm damage.
    Storm,
    /// Healing.
    Heal,
    /// Orb pickup.
    Pickup,
    /// Zone reward.
    Reward,
    /// Skill drain.
    Drain,
    /// Death burst.
    Death,
    /// Minion remains.
    Debris,
    /// Dash trail.
    Motion,
}

/// Why a match ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    /// A player reached the win score.
    Score,
    /// Every active player shares one kind.
    LastKindStanding,
}

/// Something the transport should announce to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Burst of particles.
    Particles {
        /// Where.
        at: Vec2,
        /// Effect family.
        tone: Tone,
        /// Particle count hint.
        count: u32,
    },
    /// A damage or heal number.
    Number {
        /// Where.
        at: Vec2,
        /// Rounded amount.
        value: i32,
        /// Effect family.
        tone: Tone,
    },
    /// A player used a skill.
    Skill {
        /// Caster.
        entity: EntityId,
        /// Caster's kind.
        kind: Kind,
        /// Where.
        at: Vec2,
    },
    /// A player died.
    Kill {
        /// Where.
        at: Vec2,
        /// Killer's kind, `None` for the storm.
        killer: Option<Kind>,
        /// Victim's name.
        victim: String,
        /// Kill-feed line.
        message: String,
    },
    /// A player reached a kill streak worth announcing.
    KillStreak {
        /// Player name.
        name: String,
        /// Kills since last death.
        streak: u32,
    },
    /// A player changed kind at a capture zone.
    Conversion {
        /// Player.
        entity: EntityId,
        /// Where.
        at: Vec2,
        /// New kind.
        kind: Kind,
    },
    /// A minion died.
    MinionDown {
        /// Where.
        at: Vec2,
        /// Killer's kind, `None` for the storm.
        killer: Option<Kind>,
    },
    /// A hostile unit entered the arena.
    HostileSpawned {
        /// Where.
        at: Vec2,
    },
    /// The king-of-the-hill zone changed kind.
    ZoneRotation {
        /// New required kind.
        kind: Kind,
        /// Banner text.
        message: String,
    },
    /// A player emoted.
    Emote {
        /// Player.
        entity: EntityId,
        /// Emote id, opaque to the simulation.
        emote: String,
    },
    /// A chat line.
    Chat {
        /// Sender name.
        name: String,
        /// Text.
        message: String,
    },
    /// A match started.
    GameStart,
    /// The room went back to the lobby.
    GameReset,
    /// A match was won.
    GameOver {
        /// Winner's name, or the winning kind.
        winner: String,
        /// Why.
        reason: WinReason,
    },
}

/// Room-local, append-only event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Appends a rounded number effect.
    #[allow(clippy::cast_possible_truncation)]
    pub fn number(&mut self, at: Vec2, value: f32, tone: Tone) {
        self.push(GameEvent::Number {
            at,
            value: value.round() as i32,
            tone,
        });
    }

    /// Removes and returns every queued event, in order.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queued events.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_in_order() {
        let mut queue = EventQueue::new();
        queue.push(GameEvent::GameStart);
        queue.number(Vec2::ZERO, 39.6, Tone::Hit);
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(drained[0], GameEvent::GameStart);
        assert!(matches!(drained[1], GameEvent::Number { value: 40, .. }));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(GameEvent::KillStreak {
            name: "ada".into(),
            streak: 3,
        })
        .unwrap();
        assert_eq!(json["type"], "kill_streak");
        assert_eq!(json["streak"], 3);
    }
}
