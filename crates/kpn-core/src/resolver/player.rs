//! Player update: buffered input, cooldowns, passives and skills.
//!
//! For each active, living player, in join order:
//! 1. Emote and invulnerability timers tick down.
//! 2. A stunned player only burns a stun tick and drifts.
//! 3. Otherwise friction, stealth and bush visibility, regeneration, dash,
//!    skill activation and input acceleration are applied, and the velocity
//!    is capped at the current speed.
//! 4. A skill activated this tick takes effect on the arena.
//! 5. The player moves.

use glam::Vec2;
use rand::Rng;

use crate::arena::Arena;
use crate::config::Skill;
use crate::entity::{Body, Entity, EntityId, EntityInner, MinionState};
use crate::event::{GameEvent, Tone};

use super::{combat, physics, Resolver, TickContext};

/// Applies player input and skills, then moves players.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerResolver;

impl Resolver for PlayerResolver {
    fn name(&self) -> &'static str {
        "players"
    }

    fn resolve(&self, arena: &mut Arena, ctx: &mut TickContext<'_>) {
        for id in arena.player_ids() {
            let Some(entity) = arena.get_mut(id) else {
                continue;
            };
            if !entity.is_in_play() {
                continue;
            }
            let cast = update_controls(entity, ctx);
            if let Some(skill) = cast {
                cast_skill(arena, id, skill, ctx);
            }
            if let Some(entity) = arena.get_mut(id) {
                if entity.is_in_play() {
                    physics::integrate(&mut entity.body, ctx.config);
                }
            }
        }
    }
}

/// Runs timers and input for one player. Returns the skill activated this
/// tick, if any.
fn update_controls(entity: &mut Entity, ctx: &mut TickContext<'_>) -> Option<Skill> {
    let config = ctx.config;
    let id = entity.id();
    let speed_cap = entity.base_speed(config);
    let stats = config.kinds.get(entity.kind());
    let (body, player) = entity.player_parts_mut()?;

    if body.emote_timer > 0 {
        body.emote_timer -= 1;
    } else {
        body.emote = None;
    }
    body.invulnerable = body.invulnerable.saturating_sub(1);

    if body.stun > 0 {
        body.stun -= 1;
        return None;
    }

    body.velocity *= config.player.friction;

    if body.skill_active > 0 {
        body.skill_active -= 1;
        body.set_invisible(true);
    } else {
        let hidden = body.in_bush();
        body.set_invisible(hidden);
    }

    if stats.regen_amount > 0.0
        && stats.regen_interval > 0
        && ctx.tick % stats.regen_interval == 0
    {
        body.heal(stats.regen_amount);
    }

    let mut speed = speed_cap;
    if body.skill_active > 0 {
        if let Some(Skill::Stealth {
            speed_multiplier, ..
        }) = stats.skill
        {
            speed *= speed_multiplier;
        }
    }

    let input = player.input;
    if input.dash && player.dash_cooldown == 0 {
        player.dash_cooldown = config.player.dash_cooldown;
        speed = stats.dash_speed;
        ctx.events.push(GameEvent::Particles {
            at: body.position,
            tone: Tone::Motion,
            count: 5,
        });
    }
    player.dash_cooldown = player.dash_cooldown.saturating_sub(1);

    let mut cast = None;
    if input.skill && player.skill_cooldown == 0 {
        if let Some(skill) = stats.skill {
            player.skill_cooldown = player.max_skill_cooldown;
            ctx.events.push(GameEvent::Skill {
                entity: id,
                kind: body.kind,
                at: body.position,
            });
            if matches!(skill, Skill::Stealth { .. }) {
                body.skill_active = stats.skill_duration;
            }
            cast = Some(skill);
        }
    }
    player.skill_cooldown = player.skill_cooldown.saturating_sub(1);

    body.velocity += input.direction * speed * config.player.acceleration;
    body.velocity = body.velocity.clamp_length_max(speed.max(0.0));
    cast
}

/// Applies the arena-wide effect of a skill.
fn cast_skill(arena: &mut Arena, caster: EntityId, skill: Skill, ctx: &mut TickContext<'_>) {
    let Some(owner) = arena.get(caster) else {
        return;
    };
    let origin = owner.body.position;
    let kind = owner.kind();

    match skill {
        Skill::PullStun {
            radius,
            stun_ticks,
            pull,
        } => {
            for e in arena.entities_mut() {
                if e.id() == caster || !e.is_in_play() || e.kind() == kind {
                    continue;
                }
                let offset = origin - e.body.position;
                if offset.length() < radius {
                    e.body.stun = stun_ticks;
                    e.body.velocity += offset.normalize_or_zero() * pull;
                }
            }
        }
        Skill::Stealth { decoy_speed, .. } => {
            let tuning = &ctx.config.minion;
            let mut body = Body::new(kind, origin, tuning.radius, tuning.hp);
            let spread = decoy_speed.max(0.0);
            body.velocity = Vec2::new(
                ctx.rng.gen_range(-spread..=spread),
                ctx.rng.gen_range(-spread..=spread),
            );
            arena.spawn(
                body,
                EntityInner::Minion(MinionState {
                    owner: Some(caster),
                    wander: Vec2::ZERO,
                }),
            );
        }
        Skill::Lifesteal { radius, damage } => {
            let targets: Vec<(EntityId, Vec2)> = arena
                .entities()
                .filter(|e| {
                    e.id() != caster
                        && e.is_in_play()
                        && kind.beats(e.kind())
                        && e.body.position.distance(origin) < radius
                })
                .map(|e| (e.id(), e.body.position))
                .collect();

            let mut drained = 0.0;
            for (target, at) in targets {
                let outcome = combat::strike(arena, target, Some(caster), damage, ctx.config);
                if outcome.hit.landed() {
                    drained += outcome.hit.dealt();
                    ctx.events.number(at, damage, Tone::Drain);
                }
                combat::settle(arena, target, Some(caster), outcome, ctx);
            }

            if drained > 0.0 {
                if let Some(owner) = arena.get_mut(caster) {
                    let healed = owner.body.heal(drained);
                    ctx.events.number(owner.body.position, healed, Tone::Heal);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArenaConfig, GameMode, PerkId};
    use crate::entity::{ConnectionId, InputFrame, PlayerState};
    use crate::event::EventQueue;
    use crate::kind::Kind;
    use crate::resolver::ZoneState;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        config: ArenaConfig,
        arena: Arena,
        zone: ZoneState,
        rng: ChaCha8Rng,
        events: EventQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let mut config = ArenaConfig::default();
            config.map.walls.clear();
            config.map.bushes.clear();
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let zone = ZoneState::new(&config, GameMode::Territorial, &mut rng);
            Self {
                arena: Arena::new(config.grid_cell_size),
                config,
                zone,
                rng,
                events: EventQueue::new(),
            }
        }

        fn player(&mut self, kind: Kind, pos: Vec2) -> EntityId {
            let id = self.arena.spawn(
                Body::new(kind, pos, self.config.player.radius, 1.0),
                EntityInner::Player(PlayerState::new(
                    ConnectionId::new(1),
                    "ada".into(),
                    &self.config.progression,
                )),
            );
            let e = self.arena.get_mut(id).unwrap();
            e.apply_stats(&self.config);
            e.body.revive();
            e.as_player_mut().unwrap().active = true;
            id
        }

        fn minion(&mut self, kind: Kind, pos: Vec2) -> EntityId {
            self.arena.spawn(
                Body::new(kind, pos, 20.0, 40.0),
                EntityInner::Minion(MinionState::default()),
            )
        }

        fn input(&mut self, id: EntityId, frame: InputFrame) {
            self.arena.get_mut(id).unwrap().as_player_mut().unwrap().input = frame;
        }

        fn run(&mut self, tick: u64) {
            let mut ctx = TickContext {
                config: &self.config,
                mode: GameMode::Territorial,
                tick,
                elapsed: tick,
                zone: &mut self.zone,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            PlayerResolver.resolve(&mut self.arena, &mut ctx);
        }

        fn entity(&self, id: EntityId) -> &Entity {
            self.arena.get(id).unwrap()
        }
    }

    mod movement_tests {
        use super::*;

        #[test]
        fn input_accelerates_up_to_kind_speed() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            fx.input(p, InputFrame::new(1.0, 0.0, false, false));
            fx.run(1);
            let v = fx.entity(p).body.velocity;
            assert!((v.x - 7.0 * 0.2).abs() < 1e-4);
            for tick in 2..200 {
                fx.run(tick);
            }
            assert!(fx.entity(p).body.velocity.length() <= 7.0 + 1e-4);
            assert!(fx.entity(p).body.position.x > 1500.0);
        }

        #[test]
        fn nitro_raises_the_cap() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            fx.arena.get_mut(p).unwrap().as_player_mut().unwrap().perks = vec![PerkId::Nitro];
            fx.input(p, InputFrame::new(0.0, 1.0, false, false));
            for tick in 1..300 {
                fx.run(tick);
                fx.arena.get_mut(p).unwrap().body.position = Vec2::splat(1500.0);
            }
            assert!((fx.entity(p).body.velocity.length() - 7.0 * 1.2).abs() < 0.05);
        }

        #[test]
        fn stunned_player_ignores_input() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            fx.arena.get_mut(p).unwrap().body.stun = 2;
            fx.input(p, InputFrame::new(1.0, 0.0, true, true));
            fx.run(1);
            let e = fx.entity(p);
            assert_eq!(e.body.stun, 1);
            assert_eq!(e.body.velocity, Vec2::ZERO);
            assert_eq!(e.as_player().unwrap().dash_cooldown, 0);
        }

        #[test]
        fn inactive_players_are_frozen() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            {
                let e = fx.arena.get_mut(p).unwrap();
                e.as_player_mut().unwrap().active = false;
                e.body.velocity = Vec2::new(5.0, 0.0);
            }
            fx.run(1);
            assert_eq!(fx.entity(p).body.position, Vec2::splat(1500.0));
        }

        #[test]
        fn timers_tick_down() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            {
                let e = fx.arena.get_mut(p).unwrap();
                e.body.invulnerable = 2;
                e.body.emote = Some("wave".into());
                e.body.emote_timer = 1;
            }
            fx.run(1);
            fx.run(2);
            let e = fx.entity(p);
            assert_eq!(e.body.invulnerable, 0);
            assert!(e.body.emote.is_none());
        }
    }

    mod ability_tests {
        use super::*;

        #[test]
        fn dash_sets_cooldown_and_speed() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Paper, Vec2::splat(1500.0));
            fx.input(p, InputFrame::new(1.0, 0.0, true, false));
            fx.run(1);
            let e = fx.entity(p);
            assert!((e.body.velocity.x - 26.0 * 0.2).abs() < 1e-4);
            assert_eq!(e.as_player().unwrap().dash_cooldown, 59);
        }

        #[test]
        fn skill_respects_cooldown() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            fx.input(p, InputFrame::new(0.0, 0.0, false, true));
            fx.run(1);
            fx.run(2);
            let casts = fx
                .events
                .events()
                .iter()
                .filter(|e| matches!(e, GameEvent::Skill { .. }))
                .count();
            assert_eq!(casts, 1);
            assert_eq!(fx.entity(p).as_player().unwrap().skill_cooldown, 298);
        }

        #[test]
        fn pull_stun_affects_other_kinds_in_range() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Rock, Vec2::splat(1500.0));
            let near = fx.minion(Kind::Paper, Vec2::new(1700.0, 1500.0));
            let ally = fx.minion(Kind::Rock, Vec2::new(1600.0, 1500.0));
            let far = fx.minion(Kind::Scissors, Vec2::new(1900.0, 1500.0));
            fx.input(p, InputFrame::new(0.0, 0.0, false, true));
            fx.run(1);

            let n = fx.entity(near);
            assert_eq!(n.body.stun, 60);
            assert!(n.body.velocity.x < 0.0);
            assert_eq!(fx.entity(ally).body.stun, 0);
            assert_eq!(fx.entity(far).body.stun, 0);
        }

        #[test]
        fn stealth_hides_player_and_drops_owned_decoy() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Paper, Vec2::splat(1500.0));
            fx.input(p, InputFrame::new(0.0, 0.0, false, true));
            fx.run(1);
            fx.input(p, InputFrame::default());
            fx.run(2);

            assert!(fx.entity(p).body.is_invisible());
            let decoy = fx.arena.minions().next().unwrap();
            assert_eq!(decoy.kind(), Kind::Paper);
            assert_eq!(decoy.as_minion().unwrap().owner, Some(p));
        }

        #[test]
        fn lifesteal_drains_prey_and_heals_caster() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Scissors, Vec2::splat(1500.0));
            fx.arena.get_mut(p).unwrap().body.apply_damage(100.0);
            let prey = fx.minion(Kind::Paper, Vec2::new(1600.0, 1500.0));
            let other = fx.minion(Kind::Rock, Vec2::new(1550.0, 1500.0));
            fx.input(p, InputFrame::new(0.0, 0.0, false, true));
            fx.run(1);

            assert!((fx.entity(prey).body.hp() - 10.0).abs() < 1e-4);
            assert!((fx.entity(other).body.hp() - 40.0).abs() < 1e-4);
            assert!((fx.entity(p).body.hp() - 90.0).abs() < 1e-4);
        }

        #[test]
        fn paper_regenerates_on_interval() {
            let mut fx = Fixture::new();
            let p = fx.player(Kind::Paper, Vec2::splat(1500.0));
            fx.arena.get_mut(p).unwrap().body.apply_damage(10.0);
            fx.run(29);
            assert!((fx.entity(p).body.hp() - 120.0).abs() < 1e-4);
            fx.run(30);
            assert!((fx.entity(p).body.hp() - 123.0).abs() < 1e-4);
        }
    }
}
