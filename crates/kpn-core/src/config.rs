//! Arena configuration.
//!
//! One [`ArenaConfig`] value parameterises every room: tick rate, map size,
//! static geometry, per-kind stats, perk table and all gameplay tunables.
//! Every section is `#[serde(default)]`, so a JSON document only needs to
//! name the values it overrides.
//!
//! Durations are in ticks. At the default 30 Hz, 90 ticks is three seconds.
//!
//! # Example
//!
//! ```
//! use kpn_core::config::ArenaConfig;
//!
//! let config = ArenaConfig::from_json_str(r#"{ "match_rules": { "win_score": 500 } }"#).unwrap();
//! assert_eq!(config.match_rules.win_score, 500);
//! assert_eq!(config.map_radius, 1500.0);
//! ```

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use kpn_spatial::{Circle, Rect};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kind::Kind;

// =============================================================================
// Top level
// =============================================================================

/// Complete tuning and static map for a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Radius of the circular map. The map spans `0..2*radius` on both axes.
    pub map_radius: f32,
    /// Edge length of a spatial grid cell.
    pub grid_cell_size: f32,
    /// Movement sub-steps per tick.
    pub physics_steps: u32,
    /// Hard cap on room capacity.
    pub max_players: usize,
    /// Cap on roaming minions. Hostile injection may exceed it by
    /// [`ShrinkTuning::hostile_cap_bonus`].
    pub max_bots: usize,
    /// Player movement and status tuning.
    pub player: PlayerTuning,
    /// Minion steering tuning.
    pub minion: MinionTuning,
    /// Damage, knockback and rewards.
    pub combat: CombatTuning,
    /// Safe-zone shrink and storm.
    pub shrink: ShrinkTuning,
    /// Capture zones, healing and king-of-the-hill.
    pub zones: ZoneTuning,
    /// Pickup orbs.
    pub orbs: OrbTuning,
    /// Spawn placement retries.
    pub placement: PlacementTuning,
    /// Experience curve and perk milestones.
    pub progression: ProgressionTuning,
    /// Win conditions.
    pub match_rules: MatchRules,
    /// Per-kind base stats.
    pub kinds: KindTable,
    /// Perk definitions.
    pub perks: Vec<PerkDef>,
    /// Static map geometry.
    pub map: StaticMap,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            map_radius: 1500.0,
            grid_cell_size: 250.0,
            physics_steps: 3,
            max_players: 30,
            max_bots: 50,
            player: PlayerTuning::default(),
            minion: MinionTuning::default(),
            combat: CombatTuning::default(),
            shrink: ShrinkTuning::default(),
            zones: ZoneTuning::default(),
            orbs: OrbTuning::default(),
            placement: PlacementTuning::default(),
            progression: ProgressionTuning::default(),
            match_rules: MatchRules::default(),
            kinds: KindTable::default(),
            perks: PerkDef::defaults(),
            map: StaticMap::default(),
        }
    }
}

impl ArenaConfig {
    /// Parses a (possibly partial) JSON document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error from
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the map center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::splat(self.map_radius)
    }

    /// Returns the perk definition for `id`, if configured.
    #[must_use]
    pub fn perk(&self, id: PerkId) -> Option<&PerkDef> {
        self.perks.iter().find(|p| p.id == id)
    }

    /// Checks every value a tick could divide by, index with, or loop on.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tick_rate", self.tick_rate)?;
        positive("physics_steps", self.physics_steps)?;
        finite_positive("map_radius", self.map_radius)?;
        finite_positive("grid_cell_size", self.grid_cell_size)?;
        finite_positive("player.radius", self.player.radius)?;
        finite_positive("minion.radius", self.minion.radius)?;
        finite_positive("minion.hp", self.minion.hp)?;
        finite_positive("minion.max_speed", self.minion.max_speed)?;
        positive("minion.bot_spawn_interval", self.minion.bot_spawn_interval)?;
        positive("shrink.storm_interval", self.shrink.storm_interval)?;
        positive("shrink.hostile_interval", self.shrink.hostile_interval)?;
        positive("zones.heal_interval", self.zones.heal_interval)?;
        positive("zones.koth_reward_interval", self.zones.koth_reward_interval)?;
        positive("match_rules.win_check_interval", self.match_rules.win_check_interval)?;
        positive("progression.first_threshold", self.progression.first_threshold)?;

        if !(self.shrink.min_radius >= 0.0 && self.shrink.min_radius <= self.map_radius) {
            return Err(ConfigError::OutOfRange {
                field: "shrink.min_radius",
                reason: "must lie in 0..=map_radius",
            });
        }
        finite_non_negative("shrink.speed", self.shrink.speed)?;
        if !(self.progression.growth >= 1.0 && self.progression.growth.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "progression.growth",
                reason: "must be finite and at least 1",
            });
        }

        probability("minion.wander_chance", self.minion.wander_chance)?;
        probability("minion.hostile_wander_chance", self.minion.hostile_wander_chance)?;
        probability("orbs.respawn_chance", self.orbs.respawn_chance)?;
        for kind in Kind::CYCLIC {
            let stats = self.kinds.get(kind);
            probability("kinds.crit_chance", stats.crit_chance)?;
            finite_positive("kinds.max_hp", stats.max_hp)?;
            finite_positive("kinds.speed", stats.speed)?;
            finite_positive("kinds.dash_speed", stats.dash_speed)?;
            if stats.regen_amount > 0.0 {
                positive("kinds.regen_interval", stats.regen_interval)?;
            }
            if let Some(skill) = &stats.skill {
                skill.validate()?;
            }
        }
        finite_positive("kinds.zombie.max_hp", self.kinds.zombie.max_hp)?;
        finite_positive("kinds.zombie.speed", self.kinds.zombie.speed)?;

        self.map.validate()
    }
}

fn positive<T: PartialOrd + Default>(field: &'static str, value: T) -> Result<(), ConfigError> {
    if value > T::default() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: "must be positive",
        })
    }
}

fn finite_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: "must be finite and positive",
        })
    }
}

fn finite_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: "must be finite and non-negative",
        })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: "must be a probability in 0..=1",
        })
    }
}

// =============================================================================
// Game mode
// =============================================================================

/// How capture zones behave in a room.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// One home zone per kind: players convert in foreign zones and heal in
    /// their own.
    #[default]
    #[serde(alias = "play")]
    Territorial,
    /// One central zone whose kind rotates; matching players score while inside.
    #[serde(alias = "koth")]
    KingOfTheHill,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Territorial => f.write_str("territorial"),
            GameMode::KingOfTheHill => f.write_str("king_of_the_hill"),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Player movement and status tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Collision radius.
    pub radius: f32,
    /// Velocity multiplier applied each un-stunned tick.
    pub friction: f32,
    /// Fraction of the speed cap added per tick of full input.
    pub acceleration: f32,
    /// Ticks between dashes.
    pub dash_cooldown: u32,
    /// Invulnerability after spawn or respawn.
    pub spawn_invulnerability: u32,
    /// How long an emote stays visible.
    pub emote_ticks: u32,
    /// Maximum display-name length.
    pub name_max_len: usize,
    /// Maximum chat message length.
    pub chat_max_len: usize,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 30.0,
            friction: 0.85,
            acceleration: 0.2,
            dash_cooldown: 60,
            spawn_invulnerability: 90,
            emote_ticks: 60,
            name_max_len: 15,
            chat_max_len: 50,
        }
    }
}

/// Minion steering tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinionTuning {
    /// Collision radius.
    pub radius: f32,
    /// Hit points of a non-hostile minion.
    pub hp: f32,
    /// Speed cap of a non-hostile minion. The hostile cap is its kind speed.
    pub max_speed: f32,
    /// Multiplier from steering vector to velocity change.
    pub steer_gain: f32,
    /// Neighbours closer than this push the minion away.
    pub separation_distance: f32,
    /// Weight of the averaged separation vector.
    pub separation_weight: f32,
    /// Per-tick chance to re-roll the wander vector.
    pub wander_chance: f32,
    /// Half-width of each wander component.
    pub wander_magnitude: f32,
    /// Per-tick wander re-roll chance for hostile units.
    pub hostile_wander_chance: f32,
    /// Half-width of each hostile wander component.
    pub hostile_wander_magnitude: f32,
    /// Extra distance beyond [`ZoneTuning::spawn_radius`] at which minions
    /// steer away from capture zones.
    pub zone_avoid_margin: f32,
    /// Weight of the capture-zone avoidance push.
    pub zone_avoid_weight: f32,
    /// Pull toward the center per unit of distance when outside the safe zone.
    pub storm_pull: f32,
    /// Probe radius of the midpoint line-of-sight test.
    pub sight_probe_radius: f32,
    /// Ticks between roaming bot spawns.
    pub bot_spawn_interval: u64,
    /// Extra distance beyond [`ZoneTuning::spawn_radius`] kept free of bot spawns.
    pub bot_zone_clearance: f32,
}

impl Default for MinionTuning {
    fn default() -> Self {
        Self {
            radius: 20.0,
            hp: 40.0,
            max_speed: 10.0,
            steer_gain: 0.5,
            separation_distance: 50.0,
            separation_weight: 2.0,
            wander_chance: 0.02,
            wander_magnitude: 1.0,
            hostile_wander_chance: 0.05,
            hostile_wander_magnitude: 1.5,
            zone_avoid_margin: 200.0,
            zone_avoid_weight: 4.0,
            storm_pull: 0.02,
            sight_probe_radius: 5.0,
            bot_spawn_interval: 40,
            bot_zone_clearance: 100.0,
        }
    }
}

/// Damage, knockback and rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Ticks after match start before contact damage is enabled.
    pub grace_ticks: u64,
    /// Damage of a normal winning contact.
    pub base_damage: f32,
    /// Damage a minion deals to a player.
    pub minion_vs_player_damage: f32,
    /// Damage a hostile unit deals on contact.
    pub hostile_damage: f32,
    /// Damage a hostile unit takes on contact.
    pub hostile_taken_damage: f32,
    /// Velocity given to the loser of a clash.
    pub knockback: f32,
    /// Fraction of [`knockback`](Self::knockback) applied back to the winner.
    pub recoil_ratio: f32,
    /// Stun applied to the loser of a clash.
    pub hit_stun: u32,
    /// Velocity impulse per unit of overlap between touching units.
    pub overlap_push: f32,
    /// Score lost on death.
    pub death_penalty: u32,
    /// Score for killing a player.
    pub kill_score: u32,
    /// Experience for killing a player.
    pub kill_xp: u32,
    /// Score for killing a minion.
    pub minion_kill_score: u32,
    /// Experience for killing a minion.
    pub minion_kill_xp: u32,
    /// Kill streak at which announcements start.
    pub streak_announce: u32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            grace_ticks: 90,
            base_damage: 40.0,
            minion_vs_player_damage: 10.0,
            hostile_damage: 10.0,
            hostile_taken_damage: 20.0,
            knockback: 20.0,
            recoil_ratio: 0.5,
            hit_stun: 6,
            overlap_push: 0.2,
            death_penalty: 100,
            kill_score: 50,
            kill_xp: 300,
            minion_kill_score: 50,
            minion_kill_xp: 40,
            streak_announce: 2,
        }
    }
}

/// Safe-zone shrink and storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkTuning {
    /// Ticks after match start before the safe zone starts shrinking.
    pub start_tick: u64,
    /// Radius lost per tick while shrinking.
    pub speed: f32,
    /// Smallest safe-zone radius.
    pub min_radius: f32,
    /// Storm damage per storm tick.
    pub storm_damage: f32,
    /// Ticks between storm damage applications.
    pub storm_interval: u64,
    /// Ticks between hostile injection attempts.
    pub hostile_interval: u64,
    /// How far past [`ArenaConfig::max_bots`] hostile injection may go.
    pub hostile_cap_bonus: usize,
    /// Minimum distance outside the safe zone for hostile spawns.
    pub hostile_offset: f32,
    /// Random extra distance for hostile spawns.
    pub hostile_spread: f32,
}

impl Default for ShrinkTuning {
    fn default() -> Self {
        Self {
            start_tick: 3600,
            speed: 0.25,
            min_radius: 300.0,
            storm_damage: 5.0,
            storm_interval: 15,
            hostile_interval: 100,
            hostile_cap_bonus: 10,
            hostile_offset: 100.0,
            hostile_spread: 400.0,
        }
    }
}

/// Capture zones, healing and king-of-the-hill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneTuning {
    /// Nominal zone radius, used for spawn scatter and minion avoidance.
    pub spawn_radius: f32,
    /// Distance within which a player dwells in a zone.
    pub capture_radius: f32,
    /// Dwell ticks a player must exceed before conversion.
    pub capture_ticks: u32,
    /// Distance within which a home zone heals its own kind.
    pub home_heal_radius: f32,
    /// Ticks between healing applications.
    pub heal_interval: u64,
    /// Hit points restored per healing application.
    pub heal_amount: f32,
    /// Ticks between king-of-the-hill rotations.
    pub koth_rotation_ticks: u64,
    /// Ticks between king-of-the-hill rewards.
    pub koth_reward_interval: u64,
    /// Score per king-of-the-hill reward.
    pub koth_score: u32,
    /// Experience per king-of-the-hill reward.
    pub koth_xp: u32,
    /// Distance from center of king-of-the-hill spawn ring.
    pub koth_spawn_ring: f32,
}

impl Default for ZoneTuning {
    fn default() -> Self {
        Self {
            spawn_radius: 180.0,
            capture_radius: 150.0,
            capture_ticks: 45,
            home_heal_radius: 160.0,
            heal_interval: 10,
            heal_amount: 5.0,
            koth_rotation_ticks: 600,
            koth_reward_interval: 30,
            koth_score: 50,
            koth_xp: 20,
            koth_spawn_ring: 1200.0,
        }
    }
}

/// Pickup orbs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbTuning {
    /// Orbs placed on reset.
    pub count: usize,
    /// Clearance an orb needs from walls.
    pub radius: f32,
    /// Distance at which orbs drift toward a player.
    pub magnet_range: f32,
    /// Fraction of the gap closed per tick of magnet pull.
    pub magnet_pull: f32,
    /// Pickup happens within `player radius + pickup_margin`.
    pub pickup_margin: f32,
    /// Score per orb.
    pub score: u32,
    /// Experience per orb.
    pub xp: u32,
    /// Chance a collected orb is replaced.
    pub respawn_chance: f32,
}

impl Default for OrbTuning {
    fn default() -> Self {
        Self {
            count: 100,
            radius: 12.0,
            magnet_range: 200.0,
            magnet_pull: 0.2,
            pickup_margin: 10.0,
            score: 10,
            xp: 40,
            respawn_chance: 0.5,
        }
    }
}

/// Spawn placement retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementTuning {
    /// Attempts per sampling strategy.
    pub retries: u32,
    /// Half-width of the jitter box around a preferred point.
    pub jitter: f32,
    /// Distance from the rim kept free when sampling the whole disc.
    pub rim_margin: f32,
    /// Rim margin for orbs.
    pub orb_rim_margin: f32,
    /// Rim margin for roaming bots.
    pub bot_rim_margin: f32,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            retries: 10,
            jitter: 150.0,
            rim_margin: 50.0,
            orb_rim_margin: 20.0,
            bot_rim_margin: 40.0,
        }
    }
}

/// Experience curve and perk milestones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    /// Experience needed for level 2.
    pub first_threshold: u32,
    /// Threshold multiplier per level (floored).
    pub growth: f32,
    /// Levels that grant a perk choice.
    pub perk_levels: Vec<u32>,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            first_threshold: 50,
            growth: 1.3,
            perk_levels: vec![5, 10, 15],
        }
    }
}

/// Win conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// Score that wins the match.
    pub win_score: u32,
    /// Ticks between win checks.
    pub win_check_interval: u64,
    /// Ticks after start during which win checks are skipped.
    pub win_grace_ticks: u64,
    /// Ticks between game over and the reset to lobby.
    pub game_over_ticks: u64,
    /// In territorial mode, also end the match when every active player
    /// shares one kind.
    pub last_kind_standing: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            win_score: 3000,
            win_check_interval: 30,
            win_grace_ticks: 150,
            game_over_ticks: 150,
            last_kind_standing: false,
        }
    }
}

// =============================================================================
// Kinds, skills, perks
// =============================================================================

/// Active skill of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Skill {
    /// Stun every other-kind unit in range and pull it toward the caster.
    PullStun {
        /// Effect radius.
        radius: f32,
        /// Stun applied.
        stun_ticks: u32,
        /// Velocity toward the caster.
        pull: f32,
    },
    /// Turn invisible and faster for the skill duration and drop a decoy.
    Stealth {
        /// Speed multiplier while active.
        speed_multiplier: f32,
        /// Half-width of the decoy's random launch velocity.
        decoy_speed: f32,
    },
    /// Damage every dominated unit in range and heal by the total.
    Lifesteal {
        /// Effect radius.
        radius: f32,
        /// Damage per target.
        damage: f32,
    },
}

impl Skill {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Skill::PullStun { radius, pull, .. } => {
                finite_positive("skill.pull_stun.radius", radius)?;
                finite_non_negative("skill.pull_stun.pull", pull)
            }
            Skill::Stealth {
                speed_multiplier,
                decoy_speed,
            } => {
                finite_positive("skill.stealth.speed_multiplier", speed_multiplier)?;
                finite_non_negative("skill.stealth.decoy_speed", decoy_speed)
            }
            Skill::Lifesteal { radius, damage } => {
                finite_positive("skill.lifesteal.radius", radius)?;
                finite_non_negative("skill.lifesteal.damage", damage)
            }
        }
    }
}

/// Base stats of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindStats {
    /// Speed cap.
    pub speed: f32,
    /// Base maximum hit points.
    pub max_hp: f32,
    /// Speed cap on a dash tick.
    pub dash_speed: f32,
    /// Skill cooldown.
    pub skill_cooldown: u32,
    /// Skill duration.
    pub skill_duration: u32,
    /// Fraction of incoming damage reflected to a non-hostile attacker.
    pub thorns: f32,
    /// Chance of a critical hit.
    pub crit_chance: f32,
    /// Damage multiplier of a critical hit.
    pub crit_multiplier: f32,
    /// Hit points regenerated per regen tick.
    pub regen_amount: f32,
    /// Ticks between regen applications.
    pub regen_interval: u64,
    /// Active skill.
    pub skill: Option<Skill>,
}

impl Default for KindStats {
    fn default() -> Self {
        Self {
            speed: 8.0,
            max_hp: 100.0,
            dash_speed: 0.0,
            skill_cooldown: 0,
            skill_duration: 0,
            thorns: 0.0,
            crit_chance: 0.0,
            crit_multiplier: 1.0,
            regen_amount: 0.0,
            regen_interval: 0,
            skill: None,
        }
    }
}

/// Stats for every kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTable {
    /// Rock.
    pub rock: KindStats,
    /// Paper.
    pub paper: KindStats,
    /// Scissors.
    pub scissors: KindStats,
    /// Hostile unit. Only `speed` and `max_hp` apply.
    pub zombie: KindStats,
}

impl KindTable {
    /// Returns the stats of `kind`.
    #[must_use]
    pub fn get(&self, kind: Kind) -> &KindStats {
        match kind {
            Kind::Rock => &self.rock,
            Kind::Paper => &self.paper,
            Kind::Scissors => &self.scissors,
            Kind::Zombie => &self.zombie,
        }
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            rock: KindStats {
                speed: 7.0,
                max_hp: 220.0,
                dash_speed: 20.0,
                skill_cooldown: 300,
                skill_duration: 20,
                thorns: 0.3,
                skill: Some(Skill::PullStun {
                    radius: 350.0,
                    stun_ticks: 60,
                    pull: 30.0,
                }),
                ..KindStats::default()
            },
            paper: KindStats {
                speed: 9.5,
                max_hp: 130.0,
                dash_speed: 26.0,
                skill_cooldown: 450,
                skill_duration: 90,
                regen_amount: 3.0,
                regen_interval: 30,
                skill: Some(Skill::Stealth {
                    speed_multiplier: 1.4,
                    decoy_speed: 15.0,
                }),
                ..KindStats::default()
            },
            scissors: KindStats {
                speed: 8.5,
                max_hp: 160.0,
                dash_speed: 24.0,
                skill_cooldown: 250,
                skill_duration: 10,
                crit_chance: 0.25,
                crit_multiplier: 2.0,
                skill: Some(Skill::Lifesteal {
                    radius: 200.0,
                    damage: 30.0,
                }),
                ..KindStats::default()
            },
            zombie: KindStats {
                speed: 14.0,
                max_hp: 60.0,
                ..KindStats::default()
            },
        }
    }
}

/// Identifier of a perk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerkId {
    /// Heal for part of the damage dealt.
    #[serde(rename = "vamp")]
    Vampiric,
    /// More damage, less health.
    #[serde(rename = "glass")]
    GlassCannon,
    /// More health, less speed.
    #[serde(rename = "tank")]
    Tank,
    /// More speed.
    #[serde(rename = "speed")]
    Nitro,
}

impl PerkId {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PerkId::Vampiric => "vamp",
            PerkId::GlassCannon => "glass",
            PerkId::Tank => "tank",
            PerkId::Nitro => "speed",
        }
    }
}

impl fmt::Display for PerkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vamp" => Ok(PerkId::Vampiric),
            "glass" => Ok(PerkId::GlassCannon),
            "tank" => Ok(PerkId::Tank),
            "speed" => Ok(PerkId::Nitro),
            other => Err(other.to_string()),
        }
    }
}

/// A permanent stat modifier chosen at a level milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkDef {
    /// Identifier.
    pub id: PerkId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Multiplier on outgoing contact damage.
    #[serde(default = "one")]
    pub damage_multiplier: f32,
    /// Multiplier on maximum hit points.
    #[serde(default = "one")]
    pub hp_multiplier: f32,
    /// Multiplier on speed cap.
    #[serde(default = "one")]
    pub speed_multiplier: f32,
    /// Fraction of dealt damage healed.
    #[serde(default)]
    pub lifesteal: f32,
}

fn one() -> f32 {
    1.0
}

impl PerkDef {
    fn plain(id: PerkId, name: &str, description: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            damage_multiplier: 1.0,
            hp_multiplier: 1.0,
            speed_multiplier: 1.0,
            lifesteal: 0.0,
        }
    }

    /// The stock perk table.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                lifesteal: 0.2,
                ..Self::plain(PerkId::Vampiric, "Vampirism", "Heal for 20% of damage dealt")
            },
            Self {
                damage_multiplier: 1.5,
                hp_multiplier: 0.7,
                ..Self::plain(PerkId::GlassCannon, "Glass Cannon", "+50% damage, -30% health")
            },
            Self {
                hp_multiplier: 1.5,
                speed_multiplier: 0.9,
                ..Self::plain(PerkId::Tank, "Titanium Plating", "+50% health, -10% speed")
            },
            Self {
                speed_multiplier: 1.2,
                ..Self::plain(PerkId::Nitro, "Nitro", "+20% speed")
            },
        ]
    }
}

// =============================================================================
// Static map
// =============================================================================

/// A capture zone as laid out on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    /// Kind the zone belongs to.
    #[serde(rename = "t")]
    pub kind: Kind,
    /// Center x.
    pub x: f32,
    /// Center y.
    pub y: f32,
}

impl ZoneDef {
    /// Returns the zone center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Static map geometry, produced by an external layout generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticMap {
    /// Solid rectangles.
    pub walls: Vec<Rect>,
    /// Cover circles that hide players.
    pub bushes: Vec<Circle>,
    /// Capture zones for territorial mode.
    pub zones: Vec<ZoneDef>,
    /// Circles that heal any player.
    pub heal_spots: Vec<Circle>,
}

impl StaticMap {
    /// Returns `true` if a circle at `pos` with radius `r` overlaps any wall.
    #[must_use]
    pub fn hits_wall(&self, pos: Vec2, r: f32) -> bool {
        self.walls.iter().any(|w| w.overlaps_circle(pos, r))
    }

    /// Returns the capture zone of `kind`, if laid out.
    #[must_use]
    pub fn zone_of(&self, kind: Kind) -> Option<&ZoneDef> {
        self.zones.iter().find(|z| z.kind == kind)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(index) = self.walls.iter().position(|w| !w.is_valid()) {
            return Err(ConfigError::BadGeometry { kind: "wall", index });
        }
        if let Some(index) = self.bushes.iter().position(|b| !b.is_valid()) {
            return Err(ConfigError::BadGeometry { kind: "bush", index });
        }
        if let Some(index) = self.heal_spots.iter().position(|h| !h.is_valid()) {
            return Err(ConfigError::BadGeometry {
                kind: "heal spot",
                index,
            });
        }
        if let Some(index) = self
            .zones
            .iter()
            .position(|z| z.kind.is_hostile() || !z.x.is_finite() || !z.y.is_finite())
        {
            return Err(ConfigError::BadGeometry { kind: "zone", index });
        }
        for kind in Kind::CYCLIC {
            if self.zone_of(kind).is_none() {
                return Err(ConfigError::MissingZone(kind));
            }
        }
        Ok(())
    }
}

impl Default for StaticMap {
    fn default() -> Self {
        let wall = |x, y| Rect::new(x, y, 120.0, 120.0);
        let bush = |x, y| Circle::new(x, y, 130.0);
        let heal = |x, y| Circle::new(x, y, 90.0);
        Self {
            walls: vec![
                wall(2340.0, 1440.0),
                wall(2129.0, 2018.0),
                wall(1596.0, 2326.0),
                wall(990.0, 2219.0),
                wall(594.0, 1747.0),
                wall(594.0, 1132.0),
                wall(989.0, 660.0),
                wall(1596.0, 553.0),
                wall(2129.0, 861.0),
            ],
            bushes: vec![
                bush(2674.0, 1927.0),
                bush(2125.0, 2582.0),
                bush(1282.0, 2731.0),
                bush(542.0, 2303.0),
                bush(250.0, 1500.0),
                bush(542.0, 696.0),
                bush(1282.0, 268.0),
                bush(2125.0, 417.0),
                bush(2674.0, 1072.0),
            ],
            zones: vec![
                ZoneDef {
                    kind: Kind::Rock,
                    x: 1500.0,
                    y: 2199.0,
                },
                ZoneDef {
                    kind: Kind::Paper,
                    x: 894.0,
                    y: 1149.0,
                },
                ZoneDef {
                    kind: Kind::Scissors,
                    x: 2106.0,
                    y: 1149.0,
                },
            ],
            heal_spots: vec![
                heal(1500.0, 1100.0),
                heal(1846.0, 1700.0),
                heal(1153.0, 1700.0),
            ],
        }
    }
}
