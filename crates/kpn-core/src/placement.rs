//! Spawn placement.
//!
//! Every placement samples a bounded number of random candidates and rejects
//! those that overlap a wall. Player placement never fails: if nothing clear
//! turns up it falls back to the map center and logs a warning. Optional
//! spawns (orbs, bots, hostiles) return `None` instead and are skipped.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use tracing::warn;

use crate::config::{ArenaConfig, GameMode, ZoneDef};
use crate::kind::Kind;

/// Uniform random point in a disc.
pub fn random_in_disc<R: Rng + ?Sized>(rng: &mut R, center: Vec2, radius: f32) -> Vec2 {
    let angle = rng.gen::<f32>() * TAU;
    let r = rng.gen::<f32>().sqrt() * radius.max(0.0);
    center + Vec2::from_angle(angle) * r
}

/// Uniform random point on a circle.
pub fn random_on_ring<R: Rng + ?Sized>(rng: &mut R, center: Vec2, radius: f32) -> Vec2 {
    center + Vec2::from_angle(rng.gen::<f32>() * TAU) * radius
}

fn is_clear(config: &ArenaConfig, pos: Vec2, radius: f32) -> bool {
    pos.is_finite()
        && pos.distance(config.center()) <= config.map_radius - radius
        && !config.map.hits_wall(pos, radius)
}

/// Finds a wall-free spot for a unit of `radius`, as close to `preferred`
/// as the retry budget allows.
///
/// Tries `preferred` itself, then jittered points around it, then random
/// points anywhere on the map. Falls back to the map center.
pub fn safe_position<R: Rng + ?Sized>(
    config: &ArenaConfig,
    preferred: Vec2,
    radius: f32,
    rng: &mut R,
) -> Vec2 {
    if is_clear(config, preferred, radius) {
        return preferred;
    }
    let tuning = &config.placement;
    let jitter = tuning.jitter.max(0.0);
    for _ in 0..tuning.retries {
        let candidate = preferred
            + Vec2::new(
                rng.gen_range(-jitter..=jitter),
                rng.gen_range(-jitter..=jitter),
            );
        if is_clear(config, candidate, radius) {
            return candidate;
        }
    }
    for _ in 0..tuning.retries {
        let candidate = random_in_disc(rng, config.center(), config.map_radius - tuning.rim_margin);
        if is_clear(config, candidate, radius) {
            return candidate;
        }
    }
    warn!(
        x = preferred.x,
        y = preferred.y,
        radius,
        "no clear spawn point found, using map center"
    );
    config.center()
}

/// Where a player of `kind` enters the match: scattered near its home zone,
/// or on the outer ring in king-of-the-hill.
pub fn entry_point<R: Rng + ?Sized>(
    config: &ArenaConfig,
    mode: GameMode,
    zones: &[ZoneDef],
    kind: Kind,
    rng: &mut R,
) -> Vec2 {
    let target = match mode {
        GameMode::KingOfTheHill => random_on_ring(rng, config.center(), config.zones.koth_spawn_ring),
        GameMode::Territorial => match zones.iter().find(|z| z.kind == kind) {
            Some(zone) => random_in_disc(rng, zone.center(), config.zones.spawn_radius * 0.7),
            None => config.center(),
        },
    };
    safe_position(config, target, config.player.radius, rng)
}

/// Where a dead player of `kind` comes back: its home zone center, or the
/// outer ring in king-of-the-hill.
pub fn respawn_point<R: Rng + ?Sized>(
    config: &ArenaConfig,
    mode: GameMode,
    zones: &[ZoneDef],
    kind: Kind,
    rng: &mut R,
) -> Vec2 {
    let target = match mode {
        GameMode::KingOfTheHill => random_on_ring(rng, config.center(), config.zones.koth_spawn_ring),
        GameMode::Territorial => zones
            .iter()
            .find(|z| z.kind == kind)
            .map_or_else(|| config.center(), ZoneDef::center),
    };
    safe_position(config, target, config.player.radius, rng)
}

/// A clear spot for an orb, if one turns up.
pub fn orb_position<R: Rng + ?Sized>(config: &ArenaConfig, rng: &mut R) -> Option<Vec2> {
    let radius = config.map_radius - config.placement.orb_rim_margin;
    (0..config.placement.retries)
        .map(|_| random_in_disc(rng, config.center(), radius))
        .find(|p| !config.map.hits_wall(*p, config.orbs.radius))
}

/// A clear spot for a roaming bot away from capture zones, if one turns up.
pub fn bot_position<R: Rng + ?Sized>(
    config: &ArenaConfig,
    mode: GameMode,
    zones: &[ZoneDef],
    rng: &mut R,
) -> Option<Vec2> {
    let radius = config.map_radius - config.placement.bot_rim_margin;
    let clearance = config.zones.spawn_radius + config.minion.bot_zone_clearance;
    (0..config.placement.retries)
        .map(|_| random_in_disc(rng, config.center(), radius))
        .find(|p| {
            let near_zone = mode == GameMode::Territorial
                && zones.iter().any(|z| p.distance(z.center()) < clearance);
            !near_zone && !config.map.hits_wall(*p, config.player.radius)
        })
}

/// A spot just outside the safe zone for a hostile unit.
///
/// Single attempt; `None` if it lands in a wall.
pub fn hostile_position<R: Rng + ?Sized>(
    config: &ArenaConfig,
    safe_radius: f32,
    rng: &mut R,
) -> Option<Vec2> {
    let shrink = &config.shrink;
    let dist = (safe_radius + shrink.hostile_offset + rng.gen::<f32>() * shrink.hostile_spread)
        .min(config.map_radius - config.placement.rim_margin);
    let pos = random_on_ring(rng, config.center(), dist);
    (!config.map.hits_wall(pos, config.minion.radius + 5.0)).then_some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpn_spatial::Rect;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    mod safe_position_tests {
        use super::*;

        #[test]
        fn clear_preferred_point_is_kept() {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let p = Vec2::new(1500.0, 1500.0);
            assert_eq!(safe_position(&config, p, 30.0, &mut rng), p);
        }

        #[test]
        fn point_inside_wall_is_moved_clear() {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(2);
            let inside = Vec2::new(2400.0, 1500.0);
            let placed = safe_position(&config, inside, 30.0, &mut rng);
            assert!(!config.map.hits_wall(placed, 30.0));
        }

        #[test]
        fn fully_walled_map_falls_back_to_center() {
            let mut config = ArenaConfig::default();
            config.map.walls = vec![Rect::new(-10.0, -10.0, 3100.0, 3100.0)];
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let placed = safe_position(&config, Vec2::new(100.0, 100.0), 30.0, &mut rng);
            assert_eq!(placed, config.center());
        }
    }

    mod entry_tests {
        use super::*;

        #[test]
        fn territorial_entry_is_near_home_zone() {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(4);
            for kind in Kind::CYCLIC {
                let zone = config.map.zone_of(kind).unwrap();
                let p = entry_point(&config, GameMode::Territorial, &config.map.zones, kind, &mut rng);
                // scatter radius plus a full jitter box diagonal at worst
                assert!(p.distance(zone.center()) < 180.0 * 0.7 + 150.0 * 1.5);
            }
        }

        #[test]
        fn koth_entry_is_on_the_outer_ring() {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            let p = entry_point(&config, GameMode::KingOfTheHill, &[], Kind::Rock, &mut rng);
            let d = p.distance(config.center());
            assert!((d - 1200.0).abs() < 250.0, "distance {d}");
        }

        #[test]
        fn hostile_spawn_is_outside_safe_zone() {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(6);
            for _ in 0..50 {
                if let Some(p) = hostile_position(&config, 800.0, &mut rng) {
                    let d = p.distance(config.center());
                    assert!(d >= 899.0 && d <= 1450.5, "distance {d}");
                }
            }
        }

        #[test]
        fn bots_avoid_capture_zones() {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            for _ in 0..50 {
                if let Some(p) =
                    bot_position(&config, GameMode::Territorial, &config.map.zones, &mut rng)
                {
                    for z in &config.map.zones {
                        assert!(p.distance(z.center()) >= 280.0);
                    }
                }
            }
        }
    }

    proptest! {
        #[test]
        fn safe_position_never_overlaps_walls_unless_fallback(
            seed in any::<u64>(),
            x in 0.0_f32..3000.0,
            y in 0.0_f32..3000.0,
        ) {
            let config = ArenaConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let placed = safe_position(&config, Vec2::new(x, y), 30.0, &mut rng);
            prop_assert!(placed == config.center() || !config.map.hits_wall(placed, 30.0));
        }
    }
}
