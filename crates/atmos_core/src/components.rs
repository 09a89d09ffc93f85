//! Entity component definitions.
//!
//! Components are plain data. Behaviour lives in the device modules and in
//! [`Simulation`](crate::simulation::Simulation).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tile::TileIndex;

/// Unique identifier for entities.
pub type EntityId = u64;

/// Identifier of a map. A map holds any number of grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MapId(pub u32);

/// Identifier of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridId(pub u32);

/// Where an entity sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    /// Map the entity is on.
    pub map_id: MapId,
    /// Grid the entity is parented to, if any.
    pub grid: Option<GridId>,
    /// Tile on that grid.
    pub tile: TileIndex,
    /// Whether the entity is fixed to the tile.
    pub anchored: bool,
}

impl Transform {
    /// An anchored transform on a grid tile.
    #[must_use]
    pub const fn anchored(map_id: MapId, grid: GridId, tile: TileIndex) -> Self {
        Self {
            map_id,
            grid: Some(grid),
            tile,
            anchored: true,
        }
    }
}

/// Supplies power to the network.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerSupplier {
    /// Watts the device offers this tick.
    pub max_supply: f32,
    /// Watts the network is drawing.
    pub current_supply: f32,
}

/// Draws power from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerReceiver {
    /// Whether the receiver currently has power.
    pub powered: bool,
}

impl Default for PowerReceiver {
    fn default() -> Self {
        Self { powered: true }
    }
}

/// Marks an entity as an atmospherics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AtmosDevice {
    /// Whether the device has joined the atmosphere and receives updates.
    pub joined: bool,
}

/// Cosmetic state shown by clients. Not part of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Appearance {
    /// Device running animation.
    pub active: bool,
    /// Looping ambient sound.
    pub ambience: bool,
}

/// A container of reagents, e.g. a beaker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReagentContainer {
    /// Maximum total volume.
    pub capacity: f32,
    /// Reagent amounts by reagent id.
    pub reagents: BTreeMap<String, f32>,
}

impl ReagentContainer {
    /// An empty container.
    #[must_use]
    pub fn new(capacity: f32) -> Self {
        Self {
            capacity,
            reagents: BTreeMap::new(),
        }
    }

    /// Total volume held.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.reagents.values().sum()
    }

    /// Add up to `amount` of a reagent, limited by free space.
    ///
    /// Returns the amount actually added.
    pub fn add_reagent(&mut self, reagent: &str, amount: f32) -> f32 {
        let free = (self.capacity - self.total()).max(0.0);
        let added = amount.min(free);
        if added > 0.0 {
            *self.reagents.entry(reagent.to_string()).or_insert(0.0) += added;
        }
        added
    }

    /// Amount of a reagent held.
    #[must_use]
    pub fn amount(&self, reagent: &str) -> f32 {
        self.reagents.get(reagent).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reagent_container_capacity() {
        let mut beaker = ReagentContainer::new(50.0);
        assert_eq!(beaker.add_reagent("Plasma", 30.0), 30.0);
        assert_eq!(beaker.add_reagent("Plasma", 30.0), 20.0);
        assert_eq!(beaker.add_reagent("Water", 5.0), 0.0);
        assert_eq!(beaker.amount("Plasma"), 50.0);
        assert_eq!(beaker.amount("Water"), 0.0);
    }

    #[test]
    fn test_receiver_defaults_powered() {
        assert!(PowerReceiver::default().powered);
    }
}
