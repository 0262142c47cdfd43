//! Resolver module: the per-tick simulation passes.
//!
//! A room tick runs a fixed pipeline of resolvers over its [`Arena`]. Each
//! resolver reads and mutates the arena in place and reports what happened
//! through the [`EventQueue`] in its [`TickContext`].
//!
//! # Architecture
//!
//! The pipeline order is part of the simulation contract:
//! 1. [`PlayerResolver`]: input, cooldowns, passives, skills, player movement
//! 2. [`SteeringResolver`]: minion AI and minion movement
//! 3. [`CollisionResolver`]: orb pickup, overlap separation, contact combat
//! 4. [`ZoneResolver`]: storm damage, healing, capture and scoring zones
//!
//! Reordering changes outcomes: a minion that dies to a player hit must not
//! get another AI step, and zone healing must see post-combat hit points.
//!
//! # Invariants
//!
//! - Resolvers never remove units. Dead minions are pruned after the pipeline.
//! - Every death, whatever its source, goes through [`combat::resolve_death`].
//! - Resolvers draw randomness only from the context's RNG.
//!
//! # Available Resolvers
//!
//! - [`PlayerResolver`]: Handles player input and skills
//! - [`SteeringResolver`]: Handles minion AI steering
//! - [`CollisionResolver`]: Handles pickups, overlap and combat
//! - [`ZoneResolver`]: Handles storm, healing and zone rules

pub mod combat;
mod collision;
pub mod physics;
mod player;
mod steering;
mod zone;

pub use collision::CollisionResolver;
pub use player::PlayerResolver;
pub use steering::SteeringResolver;
pub use zone::{ZoneResolver, ZoneState};

use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::{ArenaConfig, GameMode};
use crate::event::EventQueue;

/// Everything a resolver may read or write besides the arena.
pub struct TickContext<'a> {
    /// Room configuration.
    pub config: &'a ArenaConfig,
    /// Room game mode.
    pub mode: GameMode,
    /// Room tick counter, used for modulus-gated effects.
    pub tick: u64,
    /// Ticks since the match started.
    pub elapsed: u64,
    /// Safe zone and capture zones.
    pub zone: &'a mut ZoneState,
    /// Room RNG.
    pub rng: &'a mut ChaCha8Rng,
    /// Room event queue.
    pub events: &'a mut EventQueue,
}

/// One pass of the room tick.
///
/// # Example
///
/// ```
/// use kpn_core::arena::Arena;
/// use kpn_core::resolver::{Resolver, TickContext};
///
/// struct Idle;
///
/// impl Resolver for Idle {
///     fn name(&self) -> &'static str {
///         "idle"
///     }
///
///     fn resolve(&self, _arena: &mut Arena, _ctx: &mut TickContext<'_>) {}
/// }
///
/// assert_eq!(Idle.name(), "idle");
/// ```
pub trait Resolver: Send + Sync {
    /// Short name used in traces.
    fn name(&self) -> &'static str;

    /// Runs the pass.
    fn resolve(&self, arena: &mut Arena, ctx: &mut TickContext<'_>);
}

/// Builds the fixed tick pipeline.
#[must_use]
pub fn pipeline() -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(PlayerResolver),
        Box::new(SteeringResolver),
        Box::new(CollisionResolver),
        Box::new(ZoneResolver),
    ]
}
