//! Crate-level tests that run whole rooms.
//!
//! - `scenarios.rs`: staged matches through the full tick pipeline
//! - `properties.rs`: property tests for hit points, dominance, the safe zone
//!   and input normalisation
//! - `helpers.rs`: room and resolver setup

mod helpers;
mod properties;
