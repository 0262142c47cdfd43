//! Arena module: the unit container of one room.
//!
//! The Arena stores every unit of a room, the pickup orbs, and the spatial grid.
//! It provides:
//! - Unit storage in id order (ids are monotonically increasing)
//! - Spawn/despawn and lookup by [`EntityId`] or [`ConnectionId`]
//! - Disjoint mutable access to two units at once for pairwise resolution
//! - The per-tick spatial grid rebuild
//!
//! # Spatial Grid Synchronization
//!
//! The grid is NOT updated when units move. [`Arena::rebuild_grid`] runs once
//! per tick before any neighbourhood query; queries later in the tick see
//! start-of-tick cells with current positions, and callers filter by exact
//! distance.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use kpn_core::arena::Arena;
//! use kpn_core::entity::{Body, EntityInner, MinionState};
//! use kpn_core::kind::Kind;
//!
//! let mut arena = Arena::new(250.0);
//! let id = arena.spawn(
//!     Body::new(Kind::Rock, Vec2::new(100.0, 200.0), 20.0, 40.0),
//!     EntityInner::Minion(MinionState::default()),
//! );
//! arena.rebuild_grid();
//!
//! assert!(arena.grid().query(Vec2::new(100.0, 200.0)).contains(&id));
//! ```

use std::collections::BTreeMap;

use kpn_spatial::SpatialGrid;

use crate::entity::{Body, ConnectionId, Entity, EntityId, EntityInner, Orb};

/// Container for all units of a room.
#[derive(Debug, Clone)]
pub struct Arena {
    /// `BTreeMap` keeps iteration in id order, which is spawn order.
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    orbs: Vec<Orb>,
    grid: SpatialGrid<EntityId>,
}

impl Arena {
    /// Creates an empty arena whose grid uses `cell_size`.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            orbs: Vec::new(),
            grid: SpatialGrid::new(cell_size),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Adds a unit and returns its id.
    pub fn spawn(&mut self, body: Body, inner: EntityInner) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, body, inner));
        id
    }

    /// Removes a unit, returning it if present.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Removes dead minions. Players are never removed here.
    ///
    /// Returns how many were removed.
    pub fn prune_dead_minions(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|_, e| e.is_player() || !e.body.is_dead());
        before - self.entities.len()
    }

    /// Removes every minion.
    pub fn clear_minions(&mut self) {
        self.entities.retain(|_, e| e.is_player());
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns a unit by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable unit by id.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns mutable references to two distinct units.
    ///
    /// Returns `None` if `a == b` or either is missing.
    #[must_use]
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        if a == b {
            return None;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let mut range = self.entities.range_mut(lo..=hi);
        let (&first_id, first) = range.next()?;
        let (&last_id, last) = range.next_back()?;
        if first_id != lo || last_id != hi {
            return None;
        }
        if a < b {
            Some((first, last))
        } else {
            Some((last, first))
        }
    }

    /// Returns the player bound to a connection.
    #[must_use]
    pub fn player_of(&self, connection: ConnectionId) -> Option<EntityId> {
        self.entities
            .values()
            .find(|e| e.as_player().is_some_and(|p| p.connection == connection))
            .map(Entity::id)
    }

    /// Iterates all units in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterates all units mutably in id order.
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Iterates players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_player())
    }

    /// Iterates players mutably in join order.
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut().filter(|e| e.is_player())
    }

    /// Iterates minions in spawn order.
    pub fn minions(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| !e.is_player())
    }

    /// Ids of all players, in join order.
    #[must_use]
    pub fn player_ids(&self) -> Vec<EntityId> {
        self.players().map(Entity::id).collect()
    }

    /// Ids of all minions, in spawn order.
    #[must_use]
    pub fn minion_ids(&self) -> Vec<EntityId> {
        self.minions().map(Entity::id).collect()
    }

    /// Number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    /// Number of minions, dead ones included until pruned.
    #[must_use]
    pub fn minion_count(&self) -> usize {
        self.minions().count()
    }

    /// Total number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the arena holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // =========================================================================
    // Orbs
    // =========================================================================

    /// Pickup orbs.
    #[must_use]
    pub fn orbs(&self) -> &[Orb] {
        &self.orbs
    }

    /// Mutable pickup orbs.
    pub fn orbs_mut(&mut self) -> &mut Vec<Orb> {
        &mut self.orbs
    }

    // =========================================================================
    // Spatial grid
    // =========================================================================

    /// Clears the grid and inserts every unit in play.
    pub fn rebuild_grid(&mut self) {
        self.grid.clear();
        for e in self.entities.values() {
            if e.is_in_play() {
                self.grid.insert(e.body.position, e.id());
            }
        }
    }

    /// The spatial grid as of the last rebuild.
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid<EntityId> {
        &self.grid
    }
}
