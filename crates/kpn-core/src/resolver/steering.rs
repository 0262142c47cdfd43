//! Minion steering.
//!
//! Each living minion, in spawn order, looks at the units in its 3x3 grid
//! neighbourhood and builds a heading from:
//!
//! 1. A unit vector toward the nearest visible target with a clear midpoint,
//!    or its current wander vector when nothing is in sight. Hostile units
//!    hunt players; every other minion hunts the kind it beats.
//! 2. A push away from nearby capture zones (territorial, non-hostile only).
//! 3. The averaged separation from crowding neighbours.
//! 4. A pull toward the map center while outside the shrinking safe zone
//!    (non-hostile only).
//!
//! The heading is scaled by the steer gain, added to the velocity, and the
//! result is capped at the minion's speed before it moves. Stunned minions
//! skip steering and drift.

use glam::Vec2;
use rand::Rng;

use crate::arena::Arena;
use crate::config::{ArenaConfig, GameMode};
use crate::entity::{Entity, EntityId};

use super::{physics, Resolver, TickContext};

/// Steers and moves minions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteeringResolver;

impl Resolver for SteeringResolver {
    fn name(&self) -> &'static str {
        "steering"
    }

    fn resolve(&self, arena: &mut Arena, ctx: &mut TickContext<'_>) {
        let config = ctx.config;
        let mut nearby = Vec::new();

        for id in arena.minion_ids() {
            let Some(me) = arena.get(id) else {
                continue;
            };
            if me.body.is_dead() {
                continue;
            }
            if me.body.stun > 0 {
                if let Some(me) = arena.get_mut(id) {
                    me.body.stun -= 1;
                    physics::integrate(&mut me.body, config);
                }
                continue;
            }

            nearby.clear();
            arena.grid().query_into(me.body.position, &mut nearby);
            let seen = perceive(arena, me, &nearby, config);
            let speed = me.base_speed(config);

            let Some(me) = arena.get_mut(id) else {
                continue;
            };
            let heading = heading(me, &seen, ctx);
            me.body.velocity += heading * config.minion.steer_gain;
            me.body.velocity = me.body.velocity.clamp_length_max(speed);
            physics::integrate(&mut me.body, config);
        }
    }
}

/// What a minion sees of its neighbourhood.
#[derive(Debug, Default)]
struct Perception {
    separation: Vec2,
    neighbours: u32,
    target: Option<Vec2>,
}

fn perceive(arena: &Arena, me: &Entity, nearby: &[EntityId], config: &ArenaConfig) -> Perception {
    let tuning = &config.minion;
    let pos = me.body.position;
    let hunter = me.kind();
    let mut seen = Perception::default();
    let mut best = f32::INFINITY;

    for &other in nearby {
        if other == me.id() {
            continue;
        }
        let Some(t) = arena.get(other) else {
            continue;
        };
        if t.body.is_dead() || t.body.is_invisible() {
            continue;
        }
        let d = pos.distance(t.body.position);
        if d > 0.0 && d < tuning.separation_distance {
            seen.separation += (pos - t.body.position) / d;
            seen.neighbours += 1;
        }

        let is_prey = if hunter.is_hostile() {
            t.is_player()
        } else {
            hunter.beats(t.kind())
        };
        if is_prey
            && d < best
            && physics::line_clear(&config.map, pos, t.body.position, tuning.sight_probe_radius)
        {
            best = d;
            seen.target = Some(t.body.position);
        }
    }
    seen
}

fn heading(me: &mut Entity, seen: &Perception, ctx: &mut TickContext<'_>) -> Vec2 {
    let config = ctx.config;
    let tuning = &config.minion;
    let pos = me.body.position;
    let hostile = me.kind().is_hostile();

    let mut heading = match seen.target {
        Some(target) => (target - pos).try_normalize().unwrap_or(Vec2::X),
        None => wander(me, ctx),
    };

    if !hostile && ctx.mode == GameMode::Territorial {
        let reach = config.zones.spawn_radius + tuning.zone_avoid_margin;
        for zone in ctx.zone.zones() {
            let away = pos - zone.center();
            let d = away.length();
            if d > 0.0 && d < reach {
                heading += away / d * tuning.zone_avoid_weight;
            }
        }
    }

    if seen.neighbours > 0 {
        #[allow(clippy::cast_precision_loss)]
        let n = seen.neighbours as f32;
        heading += seen.separation / n * tuning.separation_weight;
    }

    if !hostile && ctx.zone.is_shrinking() {
        let center = config.center();
        if pos.distance(center) > ctx.zone.safe_radius() {
            heading += (center - pos) * tuning.storm_pull;
        }
    }

    heading
}

/// Re-rolls the wander vector now and then and returns it.
fn wander(me: &mut Entity, ctx: &mut TickContext<'_>) -> Vec2 {
    let tuning = &ctx.config.minion;
    let (chance, magnitude) = if me.kind().is_hostile() {
        (tuning.hostile_wander_chance, tuning.hostile_wander_magnitude)
    } else {
        (tuning.wander_chance, tuning.wander_magnitude)
    };
    let Some(state) = me.as_minion_mut() else {
        return Vec2::ZERO;
    };
    if ctx.rng.gen::<f32>() < chance {
        let x = (ctx.rng.gen::<f32>() - 0.5) * 2.0 * magnitude;
        let y = (ctx.rng.gen::<f32>() - 0.5) * 2.0 * magnitude;
        state.wander = Vec2::new(x, y);
    }
    state.wander
}
