//! Safe zone, storm, healing and capture zones.
//!
//! [`ZoneState`] is the part of a room that the zone rules own: the current
//! safe-zone radius, the capture zones in play, the king-of-the-hill rotation
//! timer, and the last tick each modulus-gated effect fired on. The last one
//! makes every periodic effect fire at most once per tick even if the pass
//! runs twice.
//!
//! [`ZoneResolver`] is the last pass of a tick. In order:
//! 1. Storm damage to units outside the safe zone
//! 2. Healing at heal spots and home zones
//! 3. Capture dwell and conversion (territorial) or zone rewards
//!    (king-of-the-hill)

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::arena::Arena;
use crate::config::{ArenaConfig, GameMode, ZoneDef};
use crate::entity::{Entity, EntityId};
use crate::event::{GameEvent, Tone};
use crate::kind::Kind;

use super::{combat, Resolver, TickContext};

/// Zone controller state of one room.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneState {
    safe_radius: f32,
    map_radius: f32,
    zones: Vec<ZoneDef>,
    rotation_timer: u64,
    last_storm_tick: Option<u64>,
    last_heal_tick: Option<u64>,
    last_reward_tick: Option<u64>,
}

impl ZoneState {
    /// Creates the zone state for a fresh match.
    pub fn new<R: Rng + ?Sized>(config: &ArenaConfig, mode: GameMode, rng: &mut R) -> Self {
        let mut state = Self {
            safe_radius: config.map_radius,
            map_radius: config.map_radius,
            zones: Vec::new(),
            rotation_timer: 0,
            last_storm_tick: None,
            last_heal_tick: None,
            last_reward_tick: None,
        };
        state.reinit(config, mode, rng);
        state
    }

    /// Restores the full safe zone and lays out the capture zones again.
    ///
    /// King-of-the-hill gets a single central zone of a random kind.
    pub fn reinit<R: Rng + ?Sized>(&mut self, config: &ArenaConfig, mode: GameMode, rng: &mut R) {
        self.safe_radius = config.map_radius;
        self.map_radius = config.map_radius;
        self.rotation_timer = 0;
        self.last_storm_tick = None;
        self.last_heal_tick = None;
        self.last_reward_tick = None;
        self.zones = match mode {
            GameMode::Territorial => config.map.zones.clone(),
            GameMode::KingOfTheHill => {
                let kind = Kind::CYCLIC.choose(rng).copied().unwrap_or_default();
                let center = config.center();
                vec![ZoneDef {
                    kind,
                    x: center.x,
                    y: center.y,
                }]
            }
        };
    }

    /// Current safe-zone radius.
    #[must_use]
    pub fn safe_radius(&self) -> f32 {
        self.safe_radius
    }

    /// Returns `true` once the safe zone is smaller than the map.
    #[must_use]
    pub fn is_shrinking(&self) -> bool {
        self.safe_radius < self.map_radius
    }

    /// Capture zones in play.
    #[must_use]
    pub fn zones(&self) -> &[ZoneDef] {
        &self.zones
    }

    /// Shrinks the safe zone by one tick's worth once `elapsed` passes the
    /// configured start. Never drops below the configured minimum.
    ///
    /// Returns `true` while the shrink phase is on.
    pub fn advance_shrink(&mut self, elapsed: u64, config: &ArenaConfig) -> bool {
        if elapsed <= config.shrink.start_tick {
            return false;
        }
        self.safe_radius = (self.safe_radius - config.shrink.speed).max(config.shrink.min_radius);
        true
    }

    /// Advances the king-of-the-hill rotation timer.
    ///
    /// Returns the new required kind when the zone rotates.
    pub fn advance_rotation(&mut self, config: &ArenaConfig) -> Option<Kind> {
        self.rotation_timer += 1;
        if self.rotation_timer <= config.zones.koth_rotation_ticks {
            return None;
        }
        self.rotation_timer = 0;
        let zone = self.zones.first_mut()?;
        zone.kind = zone.kind.next();
        Some(zone.kind)
    }

    fn claim(slot: &mut Option<u64>, tick: u64, interval: u64) -> bool {
        if interval == 0 || tick % interval != 0 || *slot == Some(tick) {
            return false;
        }
        *slot = Some(tick);
        true
    }
}

/// Storm, healing and zone rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneResolver;

impl Resolver for ZoneResolver {
    fn name(&self) -> &'static str {
        "zones"
    }

    fn resolve(&self, arena: &mut Arena, ctx: &mut TickContext<'_>) {
        apply_storm(arena, ctx);
        apply_healing(arena, ctx);
        match ctx.mode {
            GameMode::Territorial => apply_capture(arena, ctx),
            GameMode::KingOfTheHill => apply_rewards(arena, ctx),
        }
    }
}

/// Hits every unit outside the safe zone.
fn apply_storm(arena: &mut Arena, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let shrink = &config.shrink;
    if !ZoneState::claim(&mut ctx.zone.last_storm_tick, ctx.tick, shrink.storm_interval) {
        return;
    }
    let center = config.center();
    let radius = ctx.zone.safe_radius;
    let victims: Vec<EntityId> = arena
        .entities()
        .filter(|e| {
            e.is_in_play() && e.body.position.distance(center) > radius
        })
        .map(Entity::id)
        .collect();

    for id in victims {
        let outcome = combat::strike(arena, id, None, shrink.storm_damage, config);
        if outcome.hit.landed() {
            if let Some(e) = arena.get(id) {
                ctx.events.number(e.body.position, shrink.storm_damage, Tone::Storm);
            }
        }
        combat::settle(arena, id, None, outcome, ctx);
    }
}

/// Heals players standing on a heal spot or near their own home zone.
fn apply_healing(arena: &mut Arena, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let tuning = &config.zones;
    if !ZoneState::claim(&mut ctx.zone.last_heal_tick, ctx.tick, tuning.heal_interval) {
        return;
    }
    let spots = &config.map.heal_spots;
    for e in arena.players_mut().filter(|e| e.is_in_play()) {
        let pos = e.body.position;
        let kind = e.kind();
        let on_spot = spots.iter().any(|s| s.contains(pos));
        let at_home = ctx
            .zone
            .zones
            .iter()
            .any(|z| z.kind == kind && pos.distance(z.center()) < tuning.home_heal_radius);
        if on_spot || at_home {
            let healed = e.body.heal(tuning.heal_amount);
            if healed > 0.0 {
                ctx.events.number(pos, healed, Tone::Heal);
            }
        }
    }
}

/// Territorial mode: dwell in a foreign zone converts the player.
fn apply_capture(arena: &mut Arena, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let tuning = &config.zones;
    for e in arena.players_mut().filter(|e| e.is_in_play()) {
        let pos = e.body.position;
        let zone_kind = ctx
            .zone
            .zones
            .iter()
            .find(|z| pos.distance(z.center()) < tuning.capture_radius)
            .map(|z| z.kind);

        let converted = {
            let Some((body, player)) = e.player_parts_mut() else {
                continue;
            };
            match zone_kind {
                Some(kind) if kind != body.kind => {
                    player.zone_dwell += 1;
                    if player.zone_dwell > tuning.capture_ticks {
                        player.zone_dwell = 0;
                        Some(kind)
                    } else {
                        None
                    }
                }
                _ => {
                    player.zone_dwell = 0;
                    None
                }
            }
        };

        if let Some(kind) = converted {
            let from = e.body.kind;
            e.body.kind = kind;
            e.apply_stats(config);
            e.body.set_invisible(false);
            ctx.events.push(GameEvent::Conversion {
                entity: e.id(),
                at: pos,
                kind,
            });
            debug!(entity = %e.id(), %from, to = %kind, "player converted");
        }
    }
}

/// King-of-the-hill: players of the zone's kind score while inside.
fn apply_rewards(arena: &mut Arena, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let tuning = &config.zones;
    if !ZoneState::claim(
        &mut ctx.zone.last_reward_tick,
        ctx.tick,
        tuning.koth_reward_interval,
    ) {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let shown = tuning.koth_score as f32;
    for e in arena.players_mut().filter(|e| e.is_in_play()) {
        let pos = e.body.position;
        let kind = e.kind();
        let inside = ctx
            .zone
            .zones
            .iter()
            .any(|z| z.kind == kind && pos.distance(z.center()) < tuning.capture_radius);
        if !inside {
            continue;
        }
        e.grant_xp(tuning.koth_xp, config);
        if let Some(p) = e.as_player_mut() {
            p.add_score(tuning.koth_score);
        }
        ctx.events.number(pos, shown, Tone::Reward);
    }
}
