//! Contact combat, damage application and death resolution.
//!
//! # Damage
//!
//! A normal clash deals [`CombatTuning::base_damage`], or the reduced
//! minion-versus-player amount. Player attackers multiply by their perks'
//! damage multipliers and roll their kind's critical chance. Hostile units
//! use fixed amounts in both directions and never roll.
//!
//! # Thorns
//!
//! A defender whose kind has thorns reflects that fraction of every landed
//! hit back to a non-hostile attacker. Vampiric healing is applied first, so
//! a drained hit can keep the attacker alive through the reflection.
//!
//! # Death
//!
//! [`resolve_death`] is the only place a death is handled, whatever caused
//! it. Players are penalised, revived and relocated in place; minions stay
//! dead until the room prunes them after the pipeline.
//!
//! [`CombatTuning::base_damage`]: crate::config::CombatTuning::base_damage

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::arena::Arena;
use crate::config::ArenaConfig;
use crate::entity::{EntityId, Hit};
use crate::event::{GameEvent, Tone};
use crate::kind::Kind;
use crate::placement;

use super::TickContext;

/// Returns `true` if contact between `attacker` and `defender` damages the
/// defender.
///
/// A hostile unit on either side always clashes, other hostile units
/// included.
#[must_use]
pub const fn engages(attacker: Kind, defender: Kind) -> bool {
    attacker.beats(defender) || attacker.is_hostile() || defender.is_hostile()
}

/// Outcome of [`strike`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Effect on the target.
    pub hit: Hit,
    /// Thorns damage reflected onto the source.
    pub reflected: Hit,
}

impl Strike {
    const MISSED: Strike = Strike {
        hit: Hit::Shielded,
        reflected: Hit::Shielded,
    };
}

/// Damages `target`, reflecting thorns onto `source`.
///
/// Deaths are reported in the result and left to [`settle`].
pub fn strike(
    arena: &mut Arena,
    target: EntityId,
    source: Option<EntityId>,
    amount: f32,
    config: &ArenaConfig,
) -> Strike {
    draining_strike(arena, target, source, amount, 0.0, config)
}

/// [`strike`] that heals `source` by `drain` times `amount` when the hit
/// lands. The heal lands before thorns are reflected.
pub fn draining_strike(
    arena: &mut Arena,
    target: EntityId,
    source: Option<EntityId>,
    amount: f32,
    drain: f32,
    config: &ArenaConfig,
) -> Strike {
    let Some(defender) = arena.get_mut(target) else {
        return Strike::MISSED;
    };
    let thorns = config.kinds.get(defender.kind()).thorns;
    let hit = defender.body.apply_damage(amount);
    if !hit.landed() {
        return Strike { hit, reflected: Hit::Shielded };
    }

    let mut reflected = Hit::Shielded;
    if let Some(attacker) = source.and_then(|id| arena.get_mut(id)) {
        if drain > 0.0 {
            attacker.body.heal(amount * drain);
        }
        if thorns > 0.0 && !attacker.kind().is_hostile() {
            reflected = attacker.body.apply_damage(hit.dealt() * thorns);
        }
    }
    Strike { hit, reflected }
}

/// Resolves the deaths a [`Strike`] caused.
pub fn settle(
    arena: &mut Arena,
    target: EntityId,
    source: Option<EntityId>,
    outcome: Strike,
    ctx: &mut TickContext<'_>,
) {
    if matches!(outcome.hit, Hit::Killed { .. }) {
        resolve_death(arena, target, source, ctx);
    }
    if let (Some(source), Hit::Killed { .. }) = (source, outcome.reflected) {
        resolve_death(arena, source, Some(target), ctx);
    }
}

/// Resolves a contact between `winner` and `loser`.
///
/// The caller has already checked overlap and [`engages`]. On a landed hit
/// the loser is knocked back and stunned and the winner recoils.
pub fn clash(arena: &mut Arena, winner: EntityId, loser: EntityId, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let tuning = &config.combat;
    let (Some(w), Some(l)) = (arena.get(winner), arena.get(loser)) else {
        return;
    };
    if w.body.is_dead() || l.body.is_dead() {
        return;
    }

    if w.kind().is_hostile() || l.kind().is_hostile() {
        let amount = if w.kind().is_hostile() {
            tuning.hostile_damage
        } else {
            tuning.hostile_taken_damage
        };
        let outcome = strike(arena, loser, Some(winner), amount, config);
        settle(arena, loser, Some(winner), outcome, ctx);
        return;
    }

    let mut damage = if !w.is_player() && l.is_player() {
        tuning.minion_vs_player_damage
    } else {
        tuning.base_damage
    };
    let mut lifesteal = 0.0;
    if w.is_player() {
        damage *= w.perk_defs(config).map(|p| p.damage_multiplier).product::<f32>();
        let stats = config.kinds.get(w.kind());
        if stats.crit_chance > 0.0 && ctx.rng.gen::<f32>() < stats.crit_chance {
            damage *= stats.crit_multiplier;
        }
        lifesteal = w.perk_defs(config).map(|p| p.lifesteal).sum::<f32>();
    }

    let outcome = draining_strike(arena, loser, Some(winner), damage, lifesteal, config);
    if outcome.hit.landed() {
        if let Some((w, l)) = arena.pair_mut(winner, loser) {
            ctx.events.number(l.body.position, damage, Tone::Hit);
            let dir = (l.body.position - w.body.position)
                .try_normalize()
                .unwrap_or(Vec2::X);
            l.body.velocity = dir * tuning.knockback;
            l.body.stun = tuning.hit_stun;
            w.body.velocity -= dir * tuning.knockback * tuning.recoil_ratio;
            if w.is_player() {
                w.body.set_invisible(false);
            }
            if l.is_player() {
                l.body.set_invisible(false);
            }
        }
    }
    settle(arena, loser, Some(winner), outcome, ctx);
}

/// Handles a unit that just died.
///
/// Does nothing unless the unit is dead, so a second call for the same death
/// is harmless. `killer` is `None` for the storm.
pub fn resolve_death(
    arena: &mut Arena,
    victim: EntityId,
    killer: Option<EntityId>,
    ctx: &mut TickContext<'_>,
) {
    let config = ctx.config;
    let killer_kind = killer.and_then(|k| arena.get(k)).map(|k| k.kind());
    let killer_is_player = killer
        .and_then(|k| arena.get(k))
        .is_some_and(|k| k.is_player());
    let Some(entity) = arena.get(victim) else {
        return;
    };
    if !entity.body.is_dead() {
        return;
    }
    let at = entity.body.position;
    let kind = entity.kind();

    if entity.is_player() {
        let respawn =
            placement::respawn_point(config, ctx.mode, ctx.zone.zones(), kind, ctx.rng);
        let Some((body, player)) = arena.get_mut(victim).and_then(|e| e.player_parts_mut())
        else {
            return;
        };
        let killer_label =
            killer_kind.map_or_else(|| "STORM".to_string(), |k| k.as_str().to_uppercase());
        ctx.events.push(GameEvent::Kill {
            at,
            killer: killer_kind,
            victim: player.name.clone(),
            message: format!(
                "{killer_label} eliminates {} (-{})",
                player.name, config.combat.death_penalty
            ),
        });
        ctx.events.push(GameEvent::Particles {
            at,
            tone: Tone::Death,
            count: 20,
        });
        debug!(victim = %player.name, killer = %killer_label, "player eliminated");

        player.score = player.score.saturating_sub(config.combat.death_penalty);
        player.deaths += 1;
        player.streak = 0;
        player.zone_dwell = 0;
        body.revive();
        body.invulnerable = config.player.spawn_invulnerability;
        body.velocity = Vec2::ZERO;
        body.position = respawn;

        if killer_is_player {
            reward_player_kill(arena, killer, ctx);
        }
    } else {
        if killer_is_player {
            if let Some(k) = killer.and_then(|k| arena.get_mut(k)) {
                k.grant_xp(config.combat.minion_kill_xp, config);
                if let Some(p) = k.as_player_mut() {
                    p.add_score(config.combat.minion_kill_score);
                }
            }
        }
        ctx.events.push(GameEvent::MinionDown {
            at,
            killer: killer_kind,
        });
        ctx.events.push(GameEvent::Particles {
            at,
            tone: Tone::Debris,
            count: 10,
        });
    }
}

fn reward_player_kill(arena: &mut Arena, killer: Option<EntityId>, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let Some(k) = killer.and_then(|k| arena.get_mut(k)) else {
        return;
    };
    k.grant_xp(config.combat.kill_xp, config);
    let Some(p) = k.as_player_mut() else {
        return;
    };
    p.add_score(config.combat.kill_score);
    p.kills += 1;
    p.streak += 1;
    if p.streak >= config.combat.streak_announce {
        ctx.events.push(GameEvent::KillStreak {
            name: p.name.clone(),
            streak: p.streak,
        });
    }
}
