//! Static geometry primitives.
//!
//! Walls are axis-aligned rectangles given by their top-left corner and size.
//! Bushes, heal spots and similar areas are circles. Both serialize with short
//! field names (`x`, `y`, `w`, `h`, `r`) so map layouts can be written by hand.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, anchored at its minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x.
    pub x: f32,
    /// Minimum y.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Creates a rectangle from its minimum corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    /// Returns the point of the rectangle closest to `p`.
    ///
    /// Points inside the rectangle map to themselves.
    #[must_use]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }

    /// Returns `true` if a circle at `center` with radius `r` strictly
    /// overlaps the rectangle.
    ///
    /// This is a pure inside/outside test, so it compares squared distances.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, r: f32) -> bool {
        center.distance_squared(self.closest_point(center)) < r * r
    }

    /// Computes how far a circle must move to stop overlapping the rectangle.
    ///
    /// Returns the push direction and the penetration depth, or `None` when the
    /// circle does not overlap. A circle whose center lies inside the
    /// rectangle is pushed toward negative y.
    #[must_use]
    pub fn penetration(&self, center: Vec2, r: f32) -> Option<(Vec2, f32)> {
        let offset = center - self.closest_point(center);
        let dist_sq = offset.length_squared();
        if dist_sq >= r * r {
            return None;
        }
        let dist = dist_sq.sqrt();
        if dist > 0.0 {
            Some((offset / dist, r - dist))
        } else {
            Some((Vec2::NEG_Y, r))
        }
    }

    /// Returns `true` if every field is finite and the size is positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w > 0.0
            && self.h > 0.0
    }
}

/// Circle given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center x.
    pub x: f32,
    /// Center y.
    pub y: f32,
    /// Radius.
    pub r: f32,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(x: f32, y: f32, r: f32) -> Self {
        Self { x, y, r }
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Returns `true` if `p` lies strictly inside the circle.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.distance(self.center()) < self.r
    }

    /// Returns `true` if every field is finite and the radius is positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.r.is_finite() && self.r > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod rect_tests {
        use super::*;

        #[test]
        fn closest_point_clamps_outside_points() {
            let wall = Rect::new(0.0, 0.0, 10.0, 10.0);
            assert_eq!(wall.closest_point(Vec2::new(-5.0, 5.0)), Vec2::new(0.0, 5.0));
            assert_eq!(wall.closest_point(Vec2::new(20.0, 20.0)), Vec2::new(10.0, 10.0));
            assert_eq!(wall.closest_point(Vec2::new(3.0, 4.0)), Vec2::new(3.0, 4.0));
        }

        #[test]
        fn circle_overlap_is_strict() {
            let wall = Rect::new(0.0, 0.0, 10.0, 10.0);
            assert!(wall.overlaps_circle(Vec2::new(-4.0, 5.0), 5.0));
            assert!(!wall.overlaps_circle(Vec2::new(-5.0, 5.0), 5.0));
        }

        #[test]
        fn penetration_points_away_from_wall() {
            let wall = Rect::new(0.0, 0.0, 10.0, 10.0);
            let (normal, depth) = wall.penetration(Vec2::new(-2.0, 5.0), 5.0).unwrap();
            assert!((normal - Vec2::NEG_X).length() < 1e-6);
            assert!((depth - 3.0).abs() < 1e-6);
        }

        #[test]
        fn penetration_from_inside_pushes_up() {
            let wall = Rect::new(0.0, 0.0, 10.0, 10.0);
            let (normal, depth) = wall.penetration(Vec2::new(5.0, 5.0), 4.0).unwrap();
            assert_eq!(normal, Vec2::NEG_Y);
            assert!((depth - 4.0).abs() < 1e-6);
        }

        #[test]
        fn no_penetration_when_clear() {
            let wall = Rect::new(0.0, 0.0, 10.0, 10.0);
            assert!(wall.penetration(Vec2::new(30.0, 30.0), 5.0).is_none());
        }

        #[test]
        fn validity_rejects_degenerate_sizes() {
            assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
            assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_valid());
            assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_valid());
        }
    }

    mod circle_tests {
        use super::*;

        #[test]
        fn contains_is_strict() {
            let bush = Circle::new(0.0, 0.0, 10.0);
            assert!(bush.contains(Vec2::new(9.9, 0.0)));
            assert!(!bush.contains(Vec2::new(10.0, 0.0)));
        }

        #[test]
        fn deserializes_short_field_names() {
            let bush: Circle = serde_json::from_str(r#"{"x":1.0,"y":2.0,"r":3.0}"#).unwrap();
            assert_eq!(bush, Circle::new(1.0, 2.0, 3.0));
        }
    }
}
