//! Component structs for units.
//!
//! [`Body`] holds what every unit has: position, velocity, health and status.
//! Health is private so the `0 <= hp <= max_hp` invariant and the dead flag
//! can only change through [`Body::apply_damage`], [`Body::heal`] and the
//! respawn helpers.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{PerkId, ProgressionTuning};
use crate::kind::Kind;

use super::{ConnectionId, EntityId};

bitflags! {
    /// Visibility status of a unit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// Hidden from minion targeting and from opponents' view.
        const INVISIBLE = 1 << 0;
        /// Inside a bush this tick.
        const IN_BUSH = 1 << 1;
    }
}

/// Outcome of a damage application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    /// Target was invulnerable or already dead. Nothing changed.
    Shielded,
    /// Damage applied, target survives.
    Wounded {
        /// Damage requested.
        dealt: f32,
    },
    /// Damage applied and the target dropped to zero.
    Killed {
        /// Damage requested.
        dealt: f32,
    },
}

impl Hit {
    /// Returns `true` if damage was applied.
    #[must_use]
    pub fn landed(self) -> bool {
        !matches!(self, Hit::Shielded)
    }

    /// Damage applied, zero when shielded.
    #[must_use]
    pub fn dealt(self) -> f32 {
        match self {
            Hit::Shielded => 0.0,
            Hit::Wounded { dealt } | Hit::Killed { dealt } => dealt,
        }
    }
}

/// Movable, damageable state shared by all units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Kind; decides stats and matchups.
    pub kind: Kind,
    /// Center.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f32,
    hp: f32,
    max_hp: f32,
    dead: bool,
    /// Remaining stun ticks. A stunned unit ignores input and steering.
    pub stun: u32,
    /// Visibility flags.
    pub flags: StatusFlags,
    /// Remaining invulnerability ticks.
    pub invulnerable: u32,
    /// Remaining ticks of an active skill effect.
    pub skill_active: u32,
    /// Current emote, if any.
    pub emote: Option<String>,
    /// Ticks until the emote clears.
    pub emote_timer: u32,
}

impl Body {
    /// Creates a body at full health.
    #[must_use]
    pub fn new(kind: Kind, position: Vec2, radius: f32, max_hp: f32) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            radius,
            hp: max_hp,
            max_hp,
            dead: false,
            stun: 0,
            flags: StatusFlags::empty(),
            invulnerable: 0,
            skill_active: 0,
            emote: None,
            emote_timer: 0,
        }
    }

    /// Current hit points.
    #[must_use]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Returns `true` once hit points reached zero, until revived.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Returns `true` while invulnerable.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0
    }

    /// Returns `true` while invisible.
    #[must_use]
    pub fn is_invisible(&self) -> bool {
        self.flags.contains(StatusFlags::INVISIBLE)
    }

    /// Sets or clears invisibility.
    pub fn set_invisible(&mut self, value: bool) {
        self.flags.set(StatusFlags::INVISIBLE, value);
    }

    /// Returns `true` while inside a bush.
    #[must_use]
    pub fn in_bush(&self) -> bool {
        self.flags.contains(StatusFlags::IN_BUSH)
    }

    /// Sets or clears the in-bush flag.
    pub fn set_in_bush(&mut self, value: bool) {
        self.flags.set(StatusFlags::IN_BUSH, value);
    }

    /// Applies damage.
    ///
    /// Invulnerable or dead targets are untouched and the call returns
    /// [`Hit::Shielded`] before any side effect. Otherwise hit points drop,
    /// clamped at zero, invisibility breaks, and the target dies if it hit
    /// zero.
    pub fn apply_damage(&mut self, amount: f32) -> Hit {
        if self.dead || self.invulnerable > 0 {
            return Hit::Shielded;
        }
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        self.hp = (self.hp - amount).max(0.0);
        self.set_invisible(false);
        if self.hp <= 0.0 {
            self.dead = true;
            Hit::Killed { dealt: amount }
        } else {
            Hit::Wounded { dealt: amount }
        }
    }

    /// Heals up to maximum. Returns the amount actually restored.
    ///
    /// Dead units cannot be healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Restores a living unit to full health.
    pub fn restore_hp(&mut self) {
        if !self.dead {
            self.hp = self.max_hp;
        }
    }

    /// Changes maximum hit points, clamping current hit points.
    pub fn set_max_hp(&mut self, max_hp: f32) {
        self.max_hp = max_hp.max(1.0);
        self.hp = self.hp.min(self.max_hp);
    }

    /// Brings a dead or living unit back at full health with all status
    /// cleared. Position and velocity are left to the caller.
    pub fn revive(&mut self) {
        self.dead = false;
        self.hp = self.max_hp;
        self.stun = 0;
        self.skill_active = 0;
        self.set_invisible(false);
    }
}

/// Latest input from a player's connection.
///
/// Input is buffered and applied at the start of the next player update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Desired direction, at most unit length.
    pub direction: Vec2,
    /// Dash requested.
    pub dash: bool,
    /// Skill requested.
    pub skill: bool,
}

impl InputFrame {
    /// Builds a frame, normalising the direction.
    ///
    /// Non-finite components become zero. Vectors longer than 1.01 are scaled
    /// to unit length; shorter ones are kept for analog input.
    #[must_use]
    pub fn new(x: f32, y: f32, dash: bool, skill: bool) -> Self {
        let mut direction = Vec2::new(x, y);
        if !direction.is_finite() {
            direction = Vec2::ZERO;
        }
        let len = direction.length();
        if len > 1.01 {
            direction /= len;
        }
        Self {
            direction,
            dash,
            skill,
        }
    }
}

/// Player-only state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Owning connection.
    pub connection: ConnectionId,
    /// Sanitized display name.
    pub name: String,
    /// In the match, as opposed to waiting in the lobby.
    pub active: bool,
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience toward the next level.
    pub xp: u32,
    /// Experience needed for the next level.
    pub next_xp: u32,
    /// Match score.
    pub score: u32,
    /// Players killed this match.
    pub kills: u32,
    /// Deaths this match.
    pub deaths: u32,
    /// Kills since last death.
    pub streak: u32,
    /// Matches won while connected.
    pub room_wins: u32,
    /// Acquired perks, in order.
    pub perks: Vec<PerkId>,
    /// A perk choice is waiting.
    pub pending_perk: bool,
    /// Latest buffered input.
    pub input: InputFrame,
    /// Ticks until the next dash.
    pub dash_cooldown: u32,
    /// Ticks until the next skill.
    pub skill_cooldown: u32,
    /// Skill cooldown cap for the current kind.
    pub max_skill_cooldown: u32,
    /// Consecutive ticks spent in a foreign capture zone.
    pub zone_dwell: u32,
}

impl PlayerState {
    /// Creates a fresh player at level 1.
    #[must_use]
    pub fn new(connection: ConnectionId, name: String, progression: &ProgressionTuning) -> Self {
        Self {
            connection,
            name,
            active: false,
            level: 1,
            xp: 0,
            next_xp: progression.first_threshold,
            score: 0,
            kills: 0,
            deaths: 0,
            streak: 0,
            room_wins: 0,
            perks: Vec::new(),
            pending_perk: false,
            input: InputFrame::default(),
            dash_cooldown: 0,
            skill_cooldown: 0,
            max_skill_cooldown: 0,
            zone_dwell: 0,
        }
    }

    /// Returns `true` if the perk is held.
    #[must_use]
    pub fn has_perk(&self, id: PerkId) -> bool {
        self.perks.contains(&id)
    }

    /// Adds experience, crossing as many levels as the amount covers.
    ///
    /// Each threshold grows by the configured factor, floored. Reaching a
    /// milestone level sets the pending-perk flag. Returns levels gained.
    pub fn add_xp(&mut self, amount: u32, progression: &ProgressionTuning) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.next_xp {
            self.xp -= self.next_xp;
            self.level += 1;
            gained += 1;
            self.next_xp = grow_threshold(self.next_xp, progression.growth);
            if progression.perk_levels.contains(&self.level) {
                self.pending_perk = true;
            }
        }
        gained
    }

    /// Adds score.
    pub fn add_score(&mut self, amount: u32) {
        self.score = self.score.saturating_add(amount);
    }

    /// Zeroes progression for a new match. Room wins persist.
    pub fn reset_progress(&mut self, progression: &ProgressionTuning) {
        self.active = false;
        self.level = 1;
        self.xp = 0;
        self.next_xp = progression.first_threshold;
        self.score = 0;
        self.kills = 0;
        self.deaths = 0;
        self.streak = 0;
        self.perks.clear();
        self.pending_perk = false;
        self.dash_cooldown = 0;
        self.skill_cooldown = 0;
        self.zone_dwell = 0;
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn grow_threshold(current: u32, growth: f32) -> u32 {
    let next = (current as f32 * growth).floor() as u32;
    next.max(current).max(1)
}

/// Minion-only state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MinionState {
    /// Player whose skill spawned this decoy.
    pub owner: Option<EntityId>,
    /// Current wander heading.
    pub wander: Vec2,
}

/// A pickup orb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orb {
    /// Center.
    pub position: Vec2,
}
