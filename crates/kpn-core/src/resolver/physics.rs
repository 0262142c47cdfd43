//! Movement integration and static collision.
//!
//! Velocity is displacement per tick. [`integrate`] splits it into
//! `physics_steps` sub-steps so a fast unit cannot tunnel into a wall:
//!
//! 1. Advance on X; if the unit would touch a wall, zero X velocity instead.
//! 2. Same on Y.
//! 3. Push the unit out of any wall it still overlaps (diagonal corners) and
//!    halve its velocity.
//!
//! After the sub-steps the unit is clamped inside the circular map and its
//! in-bush flag is recomputed.

use glam::Vec2;

use crate::config::{ArenaConfig, StaticMap};
use crate::entity::Body;

/// Moves a body by its velocity through the static map.
pub fn integrate(body: &mut Body, config: &ArenaConfig) {
    #[allow(clippy::cast_precision_loss)]
    let steps = config.physics_steps.max(1) as f32;
    let map = &config.map;

    for _ in 0..config.physics_steps.max(1) {
        let step = body.velocity / steps;

        let next_x = Vec2::new(body.position.x + step.x, body.position.y);
        if map.hits_wall(next_x, body.radius) {
            body.velocity.x = 0.0;
        } else {
            body.position = next_x;
        }

        let next_y = Vec2::new(body.position.x, body.position.y + step.y);
        if map.hits_wall(next_y, body.radius) {
            body.velocity.y = 0.0;
        } else {
            body.position = next_y;
        }

        push_out_of_walls(body, map);
    }

    clamp_to_map(body, config);
    update_bush(body, map);
}

/// Pushes a body out of every wall it overlaps, halving its velocity per
/// correction.
pub fn push_out_of_walls(body: &mut Body, map: &StaticMap) {
    for wall in &map.walls {
        if let Some((normal, depth)) = wall.penetration(body.position, body.radius) {
            body.position += normal * depth;
            body.velocity *= 0.5;
        }
    }
}

/// Projects a body back inside the circular map boundary.
pub fn clamp_to_map(body: &mut Body, config: &ArenaConfig) {
    let center = config.center();
    let limit = (config.map_radius - body.radius).max(0.0);
    let offset = body.position - center;
    let dist = offset.length();
    if dist > limit {
        body.position = center + offset / dist * limit;
    }
}

/// Recomputes the in-bush flag.
pub fn update_bush(body: &mut Body, map: &StaticMap) {
    let inside = map.bushes.iter().any(|b| b.contains(body.position));
    body.set_in_bush(inside);
}

/// Velocity impulses that push two overlapping bodies apart.
///
/// Returns `None` when the bodies do not overlap. Coincident centers are
/// separated along +X.
#[must_use]
pub fn separation(a: &Body, b: &Body, push: f32) -> Option<(Vec2, Vec2)> {
    let offset = a.position - b.position;
    let dist = offset.length();
    let reach = a.radius + b.radius;
    if dist >= reach {
        return None;
    }
    let normal = if dist > 0.0 { offset / dist } else { Vec2::X };
    let impulse = normal * (reach - dist) * push;
    Some((impulse, -impulse))
}

/// Returns `true` if the straight line from `from` to `to` is probably clear.
///
/// Tests only the midpoint with a small probe circle.
#[must_use]
pub fn line_clear(map: &StaticMap, from: Vec2, to: Vec2, probe: f32) -> bool {
    !map.hits_wall(from.lerp(to, 0.5), probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Kind;
    use kpn_spatial::Rect;

    fn open_config() -> ArenaConfig {
        let mut config = ArenaConfig::default();
        config.map.walls.clear();
        config.map.bushes.clear();
        config
    }

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(Kind::Rock, Vec2::new(x, y), 30.0, 100.0)
    }

    mod integrate_tests {
        use super::*;

        #[test]
        fn free_movement_applies_full_velocity() {
            let config = open_config();
            let mut b = body_at(1500.0, 1500.0);
            b.velocity = Vec2::new(9.0, -3.0);
            integrate(&mut b, &config);
            assert!((b.position - Vec2::new(1509.0, 1497.0)).length() < 1e-3);
            assert_eq!(b.velocity, Vec2::new(9.0, -3.0));
        }

        #[test]
        fn wall_cancels_only_the_blocked_axis() {
            let mut config = open_config();
            config.map.walls.push(Rect::new(1540.0, 1000.0, 100.0, 1000.0));
            let mut b = body_at(1505.0, 1500.0);
            b.velocity = Vec2::new(12.0, 6.0);
            integrate(&mut b, &config);
            assert!(b.velocity.x.abs() < f32::EPSILON);
            assert!(b.position.y > 1500.0);
            assert!(!config.map.hits_wall(b.position, b.radius));
        }

        #[test]
        fn units_are_clamped_inside_the_map() {
            let config = open_config();
            let mut b = body_at(2960.0, 1500.0);
            b.velocity = Vec2::new(30.0, 0.0);
            integrate(&mut b, &config);
            let dist = b.position.distance(config.center());
            assert!(dist <= config.map_radius - b.radius + 1e-3);
        }

        #[test]
        fn bush_flag_tracks_position() {
            let mut config = open_config();
            config.map.bushes.push(kpn_spatial::Circle::new(1500.0, 1500.0, 100.0));
            let mut b = body_at(1500.0, 1500.0);
            integrate(&mut b, &config);
            assert!(b.in_bush());
            b.position = Vec2::new(1700.0, 1500.0);
            integrate(&mut b, &config);
            assert!(!b.in_bush());
        }
    }

    mod wall_tests {
        use super::*;

        #[test]
        fn push_out_resolves_corner_penetration() {
            let map = StaticMap {
                walls: vec![Rect::new(100.0, 100.0, 100.0, 100.0)],
                ..StaticMap::default()
            };
            let mut b = body_at(90.0, 90.0);
            b.velocity = Vec2::new(4.0, 4.0);
            push_out_of_walls(&mut b, &map);
            assert!(!map.hits_wall(b.position, b.radius - 1e-3));
            assert_eq!(b.velocity, Vec2::new(2.0, 2.0));
        }

        #[test]
        fn midpoint_check_detects_wall_between_points() {
            let map = StaticMap {
                walls: vec![Rect::new(90.0, -50.0, 20.0, 100.0)],
                ..StaticMap::default()
            };
            assert!(!line_clear(&map, Vec2::ZERO, Vec2::new(200.0, 0.0), 5.0));
            assert!(line_clear(&map, Vec2::new(0.0, 200.0), Vec2::new(200.0, 200.0), 5.0));
        }
    }

    mod separation_tests {
        use super::*;

        #[test]
        fn overlapping_bodies_get_opposite_impulses() {
            let a = body_at(0.0, 0.0);
            let b = body_at(40.0, 0.0);
            let (ia, ib) = separation(&a, &b, 0.2).unwrap();
            assert!((ia.x + 4.0).abs() < 1e-4);
            assert_eq!(ia, -ib);
        }

        #[test]
        fn coincident_bodies_separate_along_x() {
            let a = body_at(5.0, 5.0);
            let b = body_at(5.0, 5.0);
            let (ia, _) = separation(&a, &b, 0.2).unwrap();
            assert!(ia.x > 0.0);
            assert!(ia.y.abs() < f32::EPSILON);
        }

        #[test]
        fn distant_bodies_do_not_interact() {
            assert!(separation(&body_at(0.0, 0.0), &body_at(61.0, 0.0), 0.2).is_none());
        }
    }
}
