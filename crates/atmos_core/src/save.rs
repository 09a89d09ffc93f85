//! World saves.
//!
//! A save holds the entities and grid atmospheres of a set of maps. Pipe
//! nets are not part of it: before encoding, each net's gas is captured
//! onto one of its members as a
//! [`PipeNetGasSnapshot`](crate::snapshot::PipeNetGasSnapshot), and after
//! loading the nets are rebuilt from the node graph, which puts the gas
//! back.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::{GridId, MapId};
use crate::error::{AtmosError, Result};
use crate::nodes::PipeNetId;
use crate::simulation::{Entity, SimEvent, Simulation};
use crate::tile::GridAtmosphere;

/// Save format version for compatibility.
pub const SAVE_VERSION: u32 = 1;

/// Saved state of one or more maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSave {
    /// Save format version.
    pub version: u32,
    /// Tick the save was taken on.
    pub tick: u64,
    /// Maps included.
    pub map_ids: Vec<MapId>,
    /// Entities in id order.
    pub entities: Vec<Entity>,
    /// Grid atmospheres on the saved maps.
    pub grids: BTreeMap<GridId, GridAtmosphere>,
}

impl WorldSave {
    /// Encode with bincode.
    ///
    /// # Errors
    /// Returns [`AtmosError::SaveError`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| AtmosError::SaveError(format!("Failed to serialize world: {e}")))
    }

    /// Decode and check the version.
    ///
    /// # Errors
    /// Returns [`AtmosError::SaveError`] if decoding fails and
    /// [`AtmosError::SaveVersionMismatch`] for saves from another version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let save: Self = bincode::deserialize(bytes)
            .map_err(|e| AtmosError::SaveError(format!("Failed to deserialize world: {e}")))?;

        if save.version != SAVE_VERSION {
            return Err(AtmosError::SaveVersionMismatch {
                expected: SAVE_VERSION,
                found: save.version,
            });
        }

        Ok(save)
    }

    /// Write the save to a file.
    ///
    /// # Errors
    /// Returns an error if encoding or file writing fails.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| AtmosError::SaveError(format!("Failed to write save file: {e}")))
    }

    /// Read a save from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or decoding fails.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| AtmosError::SaveError(format!("Failed to read save file: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Number of entities carrying pipe net gas.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.pipe_net_snapshot.is_some())
            .count()
    }
}

fn on_maps(entity: &Entity, map_ids: &[MapId]) -> bool {
    entity
        .transform
        .map_or(true, |transform| map_ids.contains(&transform.map_id))
}

impl Simulation {
    /// Capture pipe net gas and take a save of `map_ids`.
    ///
    /// Entities without a transform are always included.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture pass fails.
    pub fn save_world(&mut self, map_ids: &[MapId]) -> Result<WorldSave> {
        self.handle_event(&SimEvent::BeforeSerialization {
            map_ids: map_ids.to_vec(),
        })?;

        let entities = self
            .entities()
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.get_entity(id))
            .filter(|entity| on_maps(entity, map_ids))
            .cloned()
            .collect();

        let grids = self
            .grids()
            .iter()
            .filter(|(_, grid)| map_ids.contains(&grid.map_id))
            .map(|(&id, grid)| (id, grid.clone()))
            .collect();

        Ok(WorldSave {
            version: SAVE_VERSION,
            tick: self.get_tick(),
            map_ids: map_ids.to_vec(),
            entities,
            grids,
        })
    }

    /// Load a save into this simulation and rebuild its pipe nets.
    ///
    /// Entities keep their saved ids. Grids replace any with the same id.
    /// The simulation clock jumps forward to the save's tick if it is
    /// behind.
    ///
    /// Returns the nets created by the rebuild.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::SaveVersionMismatch`] for saves from another
    /// version and [`AtmosError::SaveError`] if an entity id is already in
    /// use.
    pub fn load_world(&mut self, save: WorldSave) -> Result<Vec<PipeNetId>> {
        if save.version != SAVE_VERSION {
            return Err(AtmosError::SaveVersionMismatch {
                expected: SAVE_VERSION,
                found: save.version,
            });
        }

        if let Some(entity) = save
            .entities
            .iter()
            .find(|entity| self.entities().contains(entity.id))
        {
            return Err(AtmosError::SaveError(format!(
                "entity {} already exists",
                entity.id
            )));
        }

        let mut seeds = Vec::new();
        for entity in save.entities {
            if entity.node_container.is_some() {
                seeds.push(entity.id);
            }
            self.entities_mut().insert_with_id(entity)?;
        }

        for (id, grid) in save.grids {
            self.add_grid(id, grid);
        }

        if self.get_tick() < save.tick {
            self.set_tick(save.tick);
        }

        let nets = self.rebuild_node_groups(&seeds);
        tracing::debug!(
            maps = save.map_ids.len(),
            nets = nets.len(),
            "Loaded world save"
        );
        Ok(nets)
    }
}
