//! World save inspection.

use std::path::Path;

use atmos_core::save::WorldSave;
use serde::Serialize;

use crate::Result;

/// Summary of a world save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveSummary {
    /// Save format version.
    pub version: u32,
    /// Tick the save was taken on.
    pub tick: u64,
    /// Saved map ids.
    pub maps: Vec<u32>,
    /// Entity count.
    pub entities: usize,
    /// Grid count.
    pub grids: usize,
    /// Tiles with air.
    pub tiles: usize,
    /// Entities carrying pipe net gas.
    pub snapshot_owners: usize,
    /// Saved pipe net mixtures.
    pub snapshot_mixtures: usize,
    /// Moles held in pipe net snapshots.
    pub snapshot_moles: f32,
    /// Generators in the save.
    pub generators: usize,
    /// Recyclers in the save.
    pub recyclers: usize,
}

impl SaveSummary {
    /// Summarise a decoded save.
    #[must_use]
    pub fn from_save(save: &WorldSave) -> Self {
        let snapshots = save
            .entities
            .iter()
            .filter_map(|entity| entity.pipe_net_snapshot.as_ref());

        Self {
            version: save.version,
            tick: save.tick,
            maps: save.map_ids.iter().map(|map| map.0).collect(),
            entities: save.entities.len(),
            grids: save.grids.len(),
            tiles: save
                .grids
                .values()
                .flat_map(|grid| grid.tiles.values())
                .filter(|tile| tile.air.is_some())
                .count(),
            snapshot_owners: save.snapshot_count(),
            snapshot_mixtures: snapshots.clone().map(|s| s.node_air.len()).sum(),
            snapshot_moles: snapshots
                .flat_map(|s| s.node_air.values())
                .map(|air| air.total_moles())
                .sum(),
            generators: save
                .entities
                .iter()
                .filter(|entity| entity.gas_generator.is_some())
                .count(),
            recyclers: save
                .entities
                .iter()
                .filter(|entity| entity.gas_recycler.is_some())
                .count(),
        }
    }
}

/// Read and summarise a save file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn inspect_save(path: &Path) -> Result<SaveSummary> {
    let save = WorldSave::read_from(path)?;
    Ok(SaveSummary::from_save(&save))
}
