//! Authoritative tile state management utilities.

use std::collections::BTreeMap;

use soul_collector_core::{Coordinate, Health, TileSnapshot};

/// Result of applying damage to a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The tile was already destroyed, invulnerable, or the damage was zero.
    Ignored,
    /// The tile lost health and is still standing.
    Damaged {
        /// Health left after the hit.
        health: Health,
    },
    /// The hit brought the tile to zero health.
    Destroyed,
}

/// A single destructible board cell.
///
/// The tile only mutates its own health and destroyed flag. Removal from the
/// board is left to the world, which acts on the returned [`DamageOutcome`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileEntity {
    coordinate: Coordinate,
    health: Health,
    destroyed: bool,
}

impl TileEntity {
    /// Creates a standing tile with the provided health points.
    #[must_use]
    pub const fn new(coordinate: Coordinate, health: u32) -> Self {
        Self {
            coordinate,
            health: Health::Points(health),
            destroyed: false,
        }
    }

    /// Cell the tile occupies.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Health the tile has left.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Whether the tile reached zero health.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Removes `amount` health, clamping at zero.
    ///
    /// Late hits on a destroyed tile are expected and ignored.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.destroyed || amount == 0 {
            return DamageOutcome::Ignored;
        }

        let Health::Points(points) = self.health else {
            return DamageOutcome::Ignored;
        };

        let remaining = points.saturating_sub(amount);
        self.health = Health::Points(remaining);
        if remaining == 0 {
            self.destroyed = true;
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged {
                health: self.health,
            }
        }
    }

    /// Protects the tile for the rest of the session.
    pub fn make_invulnerable(&mut self) {
        if !self.destroyed {
            self.health = Health::Invulnerable;
        }
    }

    /// Captures an immutable view of the tile.
    #[must_use]
    pub const fn snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            coordinate: self.coordinate,
            health: self.health,
            destroyed: self.destroyed,
        }
    }
}

/// Sparse registry of every tile still on the board, keyed by coordinate.
#[derive(Debug, Default)]
pub(crate) struct TileRegistry {
    entries: BTreeMap<Coordinate, TileEntity>,
}

impl TileRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, tile: TileEntity) {
        let _ = self.entries.insert(tile.coordinate(), tile);
    }

    pub(crate) fn get(&self, coordinate: Coordinate) -> Option<&TileEntity> {
        self.entries.get(&coordinate)
    }

    pub(crate) fn get_mut(&mut self, coordinate: Coordinate) -> Option<&mut TileEntity> {
        self.entries.get_mut(&coordinate)
    }

    /// Removes the tile at `coordinate`, reporting whether one was present.
    pub(crate) fn remove(&mut self, coordinate: Coordinate) -> bool {
        self.entries.remove(&coordinate).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reports whether a tile that has not been destroyed occupies `coordinate`.
    pub(crate) fn is_live(&self, coordinate: Coordinate) -> bool {
        self.get(coordinate).is_some_and(|tile| !tile.is_destroyed())
    }

    /// Coordinates of every live tile, in coordinate order.
    pub(crate) fn live_coordinates(&self) -> Vec<Coordinate> {
        self.entries
            .values()
            .filter(|tile| !tile.is_destroyed())
            .map(TileEntity::coordinate)
            .collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TileEntity> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
