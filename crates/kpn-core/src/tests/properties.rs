//! Property tests for the invariants every tick must keep.

use glam::Vec2;
use proptest::prelude::*;

use crate::config::{ArenaConfig, GameMode};
use crate::entity::{Body, Hit, InputFrame};
use crate::kind::Kind;
use crate::resolver::ZoneState;

use super::helpers::{join_players, quiet_config, room_with};

#[derive(Debug, Clone, Copy)]
enum Op {
    Damage(f32),
    Heal(f32),
    MaxHp(f32),
    Revive,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-50.0_f32..400.0).prop_map(Op::Damage),
        (-50.0_f32..400.0).prop_map(Op::Heal),
        (1.0_f32..500.0).prop_map(Op::MaxHp),
        Just(Op::Revive),
    ]
}

fn cyclic() -> impl Strategy<Value = Kind> {
    prop::sample::select(Kind::CYCLIC.to_vec())
}

proptest! {
    #[test]
    fn hp_stays_within_bounds(ops in prop::collection::vec(op(), 1..64)) {
        let mut body = Body::new(Kind::Rock, Vec2::ZERO, 30.0, 220.0);
        for op in ops {
            match op {
                Op::Damage(amount) => {
                    let was_dead = body.is_dead();
                    let hit = body.apply_damage(amount);
                    if matches!(hit, Hit::Killed { .. }) {
                        prop_assert!(!was_dead);
                    }
                }
                Op::Heal(amount) => {
                    body.heal(amount);
                }
                Op::MaxHp(max) => body.set_max_hp(max),
                Op::Revive => body.revive(),
            }
            prop_assert!(body.hp() >= 0.0);
            prop_assert!(body.hp() <= body.max_hp());
            prop_assert_eq!(body.is_dead(), body.hp() <= 0.0);
        }
    }

    #[test]
    fn invulnerable_bodies_ignore_damage(
        amount in 0.0_f32..1000.0,
        shield in 1_u32..200,
        invisible in any::<bool>(),
    ) {
        let mut body = Body::new(Kind::Paper, Vec2::ZERO, 30.0, 130.0);
        body.invulnerable = shield;
        body.set_invisible(invisible);
        prop_assert_eq!(body.apply_damage(amount), Hit::Shielded);
        prop_assert!((body.hp() - 130.0).abs() < f32::EPSILON);
        prop_assert_eq!(body.is_invisible(), invisible);
    }

    #[test]
    fn exactly_one_of_two_distinct_cyclic_kinds_wins(a in cyclic(), b in cyclic()) {
        prop_assume!(a != b);
        prop_assert!(a.beats(b) ^ b.beats(a));
        prop_assert!(!a.beats(Kind::Zombie) && !Kind::Zombie.beats(a));
    }

    #[test]
    fn safe_zone_never_grows_nor_undershoots(
        start in 0_u64..50,
        speed in 0.0_f32..40.0,
        min in 0.0_f32..1500.0,
        ticks in 1_u64..400,
    ) {
        let mut config = ArenaConfig::default();
        config.shrink.start_tick = start;
        config.shrink.speed = speed;
        config.shrink.min_radius = min;
        let mut rng = rand::thread_rng();
        let mut zone = ZoneState::new(&config, GameMode::Territorial, &mut rng);
        let mut last = zone.safe_radius();
        for elapsed in 1..=ticks {
            zone.advance_shrink(elapsed, &config);
            let now = zone.safe_radius();
            prop_assert!(now <= last);
            prop_assert!(now >= min);
            last = now;
        }
    }

    #[test]
    fn input_direction_is_never_longer_than_unit(
        x in prop::num::f32::ANY,
        y in prop::num::f32::ANY,
    ) {
        let input = InputFrame::new(x, y, false, false);
        prop_assert!(input.direction.is_finite());
        prop_assert!(input.direction.length() <= 1.01 + 1e-4);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn seeded_matches_keep_units_alive_and_bounded(
        seed in any::<u64>(),
        koth in any::<bool>(),
    ) {
        let mode = if koth { GameMode::KingOfTheHill } else { GameMode::Territorial };
        let mut config = quiet_config();
        config.minion.bot_spawn_interval = 20;
        config.shrink.start_tick = 50;
        config.shrink.speed = 5.0;
        let mut room = room_with(config, mode);
        let c = join_players(&mut room, &[Kind::Rock, Kind::Paper, Kind::Scissors]);
        room.start(c[0]).unwrap();
        for (i, conn) in c.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let angle = seed.wrapping_add(i as u64) as f32;
            room.set_input(*conn, InputFrame::new(angle.cos(), angle.sin(), true, true)).unwrap();
        }
        for _ in 0..300 {
            room.tick();
            for e in room.arena().entities() {
                prop_assert!(e.body.hp() >= 0.0 && e.body.hp() <= e.body.max_hp());
                prop_assert!(e.body.position.is_finite());
                prop_assert!(!e.body.is_dead());
            }
        }
    }
}
