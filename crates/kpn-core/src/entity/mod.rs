//! Entity module.
//!
//! This module provides the unit types of an arena room:
//! - [`EntityId`]: Unique identifier for units within a room
//! - [`ConnectionId`]: Identity of the client connection that owns a player
//! - [`EntityTag`]: Player or minion
//! - [`EntityInner`]: Tag-specific state
//! - [`Entity`]: A shared [`Body`] plus its [`EntityInner`]
//!
//! # Architecture
//!
//! Every unit shares one movable, damageable [`Body`]. What differs between a
//! player and a minion lives in [`EntityInner`], and code that cares matches
//! on it exhaustively instead of probing for a concrete type.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use kpn_core::entity::{Body, Entity, EntityId, EntityInner, EntityTag, MinionState};
//! use kpn_core::kind::Kind;
//!
//! let minion = Entity::new(
//!     EntityId::new(7),
//!     Body::new(Kind::Paper, Vec2::new(100.0, 100.0), 20.0, 40.0),
//!     EntityInner::Minion(MinionState::default()),
//! );
//!
//! assert_eq!(minion.id().as_u64(), 7);
//! assert_eq!(minion.tag(), EntityTag::Minion);
//! assert!(minion.as_player().is_none());
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ArenaConfig, PerkDef};
use crate::kind::Kind;

pub use components::{Body, Hit, InputFrame, MinionState, Orb, PlayerState, StatusFlags};

/// Unique identifier for a unit within a room.
///
/// Identifiers are handed out in increasing order and never reused, so
/// ordering by id is ordering by spawn time.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Identity of a client connection, assigned by the transport layer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a connection id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Unit category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Human-controlled unit bound to a connection.
    Player,
    /// AI-controlled unit: roaming bot, decoy, or hostile.
    Minion,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Minion => write!(f, "Minion"),
        }
    }
}

/// Tag-specific unit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Player progression, input and cooldowns.
    Player(PlayerState),
    /// Minion ownership and wander state.
    Minion(MinionState),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Player(_) => EntityTag::Player,
            Self::Minion(_) => EntityTag::Minion,
        }
    }
}

/// A unit in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    /// Shared movable and damageable state.
    pub body: Body,
    /// Player or minion state.
    pub inner: EntityInner,
}

impl Entity {
    /// Creates a unit.
    #[must_use]
    pub fn new(id: EntityId, body: Body, inner: EntityInner) -> Self {
        Self { id, body, inner }
    }

    /// Returns the unit's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the unit's category.
    #[must_use]
    pub fn tag(&self) -> EntityTag {
        self.inner.tag()
    }

    /// Returns the unit's kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.body.kind
    }

    /// Returns `true` for players.
    #[must_use]
    pub fn is_player(&self) -> bool {
        matches!(self.inner, EntityInner::Player(_))
    }

    /// Returns the player state, if this is a player.
    #[must_use]
    pub fn as_player(&self) -> Option<&PlayerState> {
        match &self.inner {
            EntityInner::Player(p) => Some(p),
            EntityInner::Minion(_) => None,
        }
    }

    /// Returns the mutable player state, if this is a player.
    #[must_use]
    pub fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.inner {
            EntityInner::Player(p) => Some(p),
            EntityInner::Minion(_) => None,
        }
    }

    /// Returns the minion state, if this is a minion.
    #[must_use]
    pub fn as_minion(&self) -> Option<&MinionState> {
        match &self.inner {
            EntityInner::Minion(m) => Some(m),
            EntityInner::Player(_) => None,
        }
    }

    /// Returns the mutable minion state, if this is a minion.
    #[must_use]
    pub fn as_minion_mut(&mut self) -> Option<&mut MinionState> {
        match &mut self.inner {
            EntityInner::Minion(m) => Some(m),
            EntityInner::Player(_) => None,
        }
    }

    /// Splits a player into its body and player state.
    #[must_use]
    pub fn player_parts_mut(&mut self) -> Option<(&mut Body, &mut PlayerState)> {
        match &mut self.inner {
            EntityInner::Player(p) => Some((&mut self.body, p)),
            EntityInner::Minion(_) => None,
        }
    }

    /// Returns `true` if the unit takes part in the simulation this tick:
    /// alive, and for players, in the match.
    #[must_use]
    pub fn is_in_play(&self) -> bool {
        !self.body.is_dead()
            && match &self.inner {
                EntityInner::Player(p) => p.active,
                EntityInner::Minion(_) => true,
            }
    }

    /// Returns the display name used in kill feeds.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.inner {
            EntityInner::Player(p) => p.name.clone(),
            EntityInner::Minion(_) => self.body.kind.as_str().to_uppercase(),
        }
    }

    /// Iterates the perk definitions a player holds. Empty for minions.
    pub fn perk_defs<'a>(&'a self, config: &'a ArenaConfig) -> impl Iterator<Item = &'a PerkDef> {
        self.as_player()
            .into_iter()
            .flat_map(|p| p.perks.iter())
            .filter_map(|id| config.perk(*id))
    }

    /// Recomputes kind- and perk-derived stats.
    ///
    /// For players: maximum hit points from kind and perks, and the skill
    /// cooldown cap. Current hit points are clamped to the new maximum.
    /// Minions keep their spawn stats.
    pub fn apply_stats(&mut self, config: &ArenaConfig) {
        if !self.is_player() {
            return;
        }
        let stats = config.kinds.get(self.body.kind);
        let hp_factor: f32 = self.perk_defs(config).map(|p| p.hp_multiplier).product();
        let max_hp = stats.max_hp * hp_factor;
        let skill_cooldown = stats.skill_cooldown;
        self.body.set_max_hp(max_hp);
        if let Some(player) = self.as_player_mut() {
            player.max_skill_cooldown = skill_cooldown;
        }
    }

    /// Speed cap from kind and perks, before skill and dash modifiers.
    #[must_use]
    pub fn base_speed(&self, config: &ArenaConfig) -> f32 {
        let stats = config.kinds.get(self.body.kind);
        match self.inner {
            EntityInner::Player(_) => {
                stats.speed * self.perk_defs(config).map(|p| p.speed_multiplier).product::<f32>()
            }
            EntityInner::Minion(_) if self.body.kind.is_hostile() => stats.speed,
            EntityInner::Minion(_) => config.minion.max_speed,
        }
    }

    /// Grants experience to a player, restoring full health on level up.
    ///
    /// Returns the number of levels gained. Minions ignore experience.
    pub fn grant_xp(&mut self, amount: u32, config: &ArenaConfig) -> u32 {
        let Some((body, player)) = self.player_parts_mut() else {
            return 0;
        };
        let levels = player.add_xp(amount, &config.progression);
        if levels > 0 {
            body.restore_hp();
        }
        levels
    }
}
