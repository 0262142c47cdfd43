//! Orb pickup, overlap separation and contact combat.
//!
//! # Orbs
//!
//! Every player in play pulls orbs within magnet range toward itself when the
//! midpoint is clear of walls, and collects those that were within pickup
//! reach before the pull. A collected orb may be replaced elsewhere.
//!
//! # Overlap
//!
//! Units are visited minions first, then players in play, and each is paired
//! with the units in its 3x3 grid neighbourhood. A pair is therefore seen
//! once from each side. Every overlapping visit pushes both units apart and
//! out of walls, and once the grace period is over, a visit whose first unit
//! [`engages`](super::combat::engages) the second is a clash won by the first.

use rand::Rng;

use crate::arena::Arena;
use crate::entity::{EntityId, Orb};
use crate::event::Tone;
use crate::placement;

use super::{combat, physics, Resolver, TickContext};

/// Handles pickups, unit overlap and contact combat.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionResolver;

impl Resolver for CollisionResolver {
    fn name(&self) -> &'static str {
        "collisions"
    }

    fn resolve(&self, arena: &mut Arena, ctx: &mut TickContext<'_>) {
        collect_orbs(arena, ctx);
        resolve_overlaps(arena, ctx);
    }
}

fn collect_orbs(arena: &mut Arena, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let tuning = &config.orbs;

    for id in arena.player_ids() {
        let Some(player) = arena.get(id) else {
            continue;
        };
        if !player.is_in_play() {
            continue;
        }
        let pos = player.body.position;
        let reach = player.body.radius + tuning.pickup_margin;

        let mut collected = 0;
        let orbs = arena.orbs_mut();
        for i in (0..orbs.len()).rev() {
            let orb = &mut orbs[i];
            let d = pos.distance(orb.position);
            if d >= tuning.magnet_range
                || !physics::line_clear(
                    &config.map,
                    pos,
                    orb.position,
                    config.minion.sight_probe_radius,
                )
            {
                continue;
            }
            orb.position += (pos - orb.position) * tuning.magnet_pull;
            if d < reach {
                orbs.remove(i);
                collected += 1;
            }
        }

        for _ in 0..collected {
            if let Some(player) = arena.get_mut(id) {
                if let Some(state) = player.as_player_mut() {
                    state.add_score(tuning.score);
                }
                player.grant_xp(tuning.xp, config);
            }
            #[allow(clippy::cast_precision_loss)]
            let shown = tuning.score as f32;
            ctx.events.number(pos, shown, Tone::Pickup);
            if ctx.rng.gen::<f32>() < tuning.respawn_chance {
                if let Some(position) = placement::orb_position(config, ctx.rng) {
                    arena.orbs_mut().push(Orb { position });
                }
            }
        }
    }
}

fn resolve_overlaps(arena: &mut Arena, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let combat_on = ctx.elapsed > config.combat.grace_ticks;

    let order: Vec<EntityId> = arena
        .minions()
        .chain(arena.players().filter(|p| p.is_in_play()))
        .map(|e| e.id())
        .collect();
    let mut nearby = Vec::new();

    for a in order {
        let Some(first) = arena.get(a) else {
            continue;
        };
        nearby.clear();
        arena.grid().query_into(first.body.position, &mut nearby);

        for &b in &nearby {
            let Some((ea, eb)) = arena.pair_mut(a, b) else {
                continue;
            };
            if ea.body.is_dead() || eb.body.is_dead() {
                continue;
            }
            let Some((push_a, push_b)) =
                physics::separation(&ea.body, &eb.body, config.combat.overlap_push)
            else {
                continue;
            };
            ea.body.velocity += push_a;
            eb.body.velocity += push_b;
            physics::push_out_of_walls(&mut ea.body, &config.map);
            physics::push_out_of_walls(&mut eb.body, &config.map);

            if combat_on && combat::engages(ea.kind(), eb.kind()) {
                combat::clash(arena, a, b, ctx);
            }
        }
    }
}
