//! # KPN Spatial
//!
//! Static arena geometry and the per-tick neighbour index used by the KPN
//! arena simulation.
//!
//! The arena is a flat disc. Obstacles are axis-aligned rectangles ([`Rect`]),
//! cover and healing areas are circles ([`Circle`]). Moving units are bucketed
//! into a [`SpatialGrid`] that is rebuilt from scratch every tick.
//!
//! ## Quick Start
//!
//! ```
//! use glam::Vec2;
//! use kpn_spatial::{Rect, SpatialGrid};
//!
//! let wall = Rect::new(100.0, 100.0, 120.0, 120.0);
//! assert!(wall.overlaps_circle(Vec2::new(90.0, 150.0), 30.0));
//!
//! let mut grid = SpatialGrid::new(250.0);
//! grid.insert(Vec2::new(10.0, 10.0), 1_u64);
//! grid.insert(Vec2::new(260.0, 10.0), 2_u64);
//! grid.insert(Vec2::new(900.0, 900.0), 3_u64);
//!
//! let near = grid.query(Vec2::new(20.0, 20.0));
//! assert!(near.contains(&1) && near.contains(&2));
//! assert!(!near.contains(&3));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geometry;
pub mod grid;

pub use geometry::{Circle, Rect};
pub use grid::{CellKey, SpatialGrid};
