//! Per-tick state payload of a room.
//!
//! Field names are kept short because a snapshot goes out to every client of
//! a room every tick. Coordinates and hit points are truncated toward zero.

use serde::{Deserialize, Serialize};

use crate::config::{PerkId, ZoneDef};
use crate::entity::{Entity, EntityId};
use crate::kind::Kind;
use crate::room::Room;

/// Full state of one room at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every connected player, in join order.
    #[serde(rename = "p")]
    pub players: Vec<PlayerView>,
    /// Every live minion.
    #[serde(rename = "m")]
    pub minions: Vec<MinionView>,
    /// Orb positions.
    #[serde(rename = "o")]
    pub orbs: Vec<[i32; 2]>,
    /// Room-level state.
    #[serde(rename = "st")]
    pub status: RoomStatus,
    /// Capture zones in play.
    #[serde(rename = "z")]
    pub zones: Vec<ZoneDef>,
}

/// A player as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PlayerView {
    /// Unit id.
    pub id: EntityId,
    /// X position.
    pub x: i32,
    /// Y position.
    pub y: i32,
    /// Kind.
    #[serde(rename = "t")]
    pub kind: Kind,
    /// In the current match.
    #[serde(rename = "a")]
    pub active: bool,
    /// Dead this tick.
    #[serde(rename = "d")]
    pub dead: bool,
    /// Display name.
    #[serde(rename = "n")]
    pub name: String,
    /// Hit points.
    pub hp: i32,
    /// Maximum hit points.
    #[serde(rename = "mhp")]
    pub max_hp: i32,
    /// Level.
    #[serde(rename = "lvl")]
    pub level: u32,
    /// Experience toward the next level.
    pub xp: u32,
    /// Experience threshold of the next level.
    #[serde(rename = "nxp")]
    pub next_xp: u32,
    /// A perk choice is waiting.
    #[serde(rename = "pen")]
    pub pending_perk: bool,
    /// Perks held.
    pub perks: Vec<PerkId>,
    /// Skill cooldown remaining.
    #[serde(rename = "scd")]
    pub skill_cooldown: u32,
    /// Skill cooldown after a cast.
    #[serde(rename = "mscd")]
    pub max_skill_cooldown: u32,
    /// Match score.
    pub score: u32,
    /// Match kills.
    pub kills: u32,
    /// Match deaths.
    pub deaths: u32,
    /// Hidden from AI.
    #[serde(rename = "inv")]
    pub invisible: bool,
    /// Standing in a bush.
    #[serde(rename = "inBush")]
    pub in_bush: bool,
    /// Matches won in this room.
    #[serde(rename = "rw")]
    pub room_wins: u32,
    /// Spawn protection active.
    pub invuln: bool,
}

/// A minion as clients see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinionView {
    /// X position.
    pub x: i32,
    /// Y position.
    pub y: i32,
    /// Kind.
    #[serde(rename = "t")]
    pub kind: Kind,
}

/// Room-level part of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatus {
    /// A match is running.
    #[serde(rename = "a")]
    pub active: bool,
    /// Safe-zone radius.
    #[serde(rename = "sz")]
    pub safe_radius: i32,
}

#[allow(clippy::cast_possible_truncation)]
fn trunc(v: f32) -> i32 {
    v as i32
}

impl Snapshot {
    /// Captures the current state of `room`.
    #[must_use]
    pub fn capture(room: &Room) -> Self {
        let arena = room.arena();
        Self {
            players: arena.players().filter_map(PlayerView::of).collect(),
            minions: arena
                .minions()
                .filter(|m| !m.body.is_dead())
                .map(|m| MinionView {
                    x: trunc(m.body.position.x),
                    y: trunc(m.body.position.y),
                    kind: m.kind(),
                })
                .collect(),
            orbs: arena
                .orbs()
                .iter()
                .map(|o| [trunc(o.position.x), trunc(o.position.y)])
                .collect(),
            status: RoomStatus {
                active: room.is_running(),
                safe_radius: trunc(room.zone().safe_radius()),
            },
            zones: room.zone().zones().to_vec(),
        }
    }

    /// Serializes to compact JSON.
    ///
    /// # Errors
    ///
    /// Only if a float is non-finite, which the simulation never produces.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl PlayerView {
    fn of(entity: &Entity) -> Option<Self> {
        let state = entity.as_player()?;
        let body = &entity.body;
        Some(Self {
            id: entity.id(),
            x: trunc(body.position.x),
            y: trunc(body.position.y),
            kind: body.kind,
            active: state.active,
            dead: body.is_dead(),
            name: state.name.clone(),
            hp: trunc(body.hp()),
            max_hp: trunc(body.max_hp()),
            level: state.level,
            xp: state.xp,
            next_xp: state.next_xp,
            pending_perk: state.pending_perk,
            perks: state.perks.clone(),
            skill_cooldown: state.skill_cooldown,
            max_skill_cooldown: state.max_skill_cooldown,
            score: state.score,
            kills: state.kills,
            deaths: state.deaths,
            invisible: body.is_invisible(),
            in_bush: body.in_bush(),
            room_wins: state.room_wins,
            invuln: body.is_invulnerable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::entity::ConnectionId;
    use crate::room::{RoomId, RoomSettings};
    use std::sync::Arc;

    fn room() -> Room {
        Room::with_seed(
            RoomId::new("s"),
            "Snap",
            RoomSettings::default(),
            Arc::new(ArenaConfig::default()),
            3,
        )
        .unwrap()
    }

    #[test]
    fn lobby_snapshot_lists_players_and_orbs() {
        let mut r = room();
        r.join(ConnectionId::new(1), "ada", None).unwrap();
        let snap = r.snapshot();
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].name, "ada");
        assert_eq!(snap.players[0].hp, 220);
        assert!(!snap.players[0].active);
        assert_eq!(snap.orbs.len(), 100);
        assert!(snap.minions.is_empty());
        assert!(!snap.status.active);
        assert_eq!(snap.status.safe_radius, 1500);
        assert_eq!(snap.zones.len(), 3);
    }

    #[test]
    fn json_uses_short_keys() {
        let mut r = room();
        r.join(ConnectionId::new(1), "ada", None).unwrap();
        let json = r.snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["p", "m", "o", "st", "z"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let p = &value["p"][0];
        assert_eq!(p["n"], "ada");
        assert_eq!(p["mhp"], 220);
        assert_eq!(p["pen"], false);
        assert!(p.get("inBush").is_some());
        assert_eq!(value["st"]["sz"], 1500);
    }

    #[test]
    fn positions_truncate_toward_zero() {
        assert_eq!(trunc(12.9), 12);
        assert_eq!(trunc(-3.7), -3);
    }
}
