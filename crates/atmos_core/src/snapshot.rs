//! Pipe net gas snapshots.
//!
//! Nets are not saved, so before a save each net's mixture is copied onto a
//! single representative node owner as a [`PipeNetGasSnapshot`]. After load,
//! the first node-group rebuild that sees that node in a net writes the gas
//! back.
//!
//! The whole net lives on one owner. If that owner is deleted, or its node
//! ends up in a different net between save and load, the gas is lost or
//! lands in the wrong net. That is accepted behaviour.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{GridId, MapId};
use crate::mixture::GasMixture;
use crate::nodes::{NodeRef, PipeNet, PipeNetStorage};
use crate::simulation::{Entity, EntityStorage};
use crate::tile::GridAtmosphere;

/// Saved pipe net gas keyed by the owner's node name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipeNetGasSnapshot {
    /// Saved mixture per node name.
    pub node_air: BTreeMap<String, GasMixture>,
}

/// What a capture pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureReport {
    /// Stale snapshots removed before capturing.
    pub purged: usize,
    /// Nets written to a snapshot.
    pub captured: usize,
    /// Nets with no named pipe node, whose gas was not saved.
    pub skipped: usize,
}

/// What a restore pass did on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    /// Entries written back into a net.
    pub restored: usize,
    /// Entries whose node no longer exists.
    pub dropped: usize,
    /// Entries left for a later rebuild.
    pub pending: usize,
}

/// First member of `net` that is a pipe node with a non-empty name.
#[must_use]
pub fn select_snapshot_node(net: &PipeNet, entities: &EntityStorage) -> Option<NodeRef> {
    net.nodes
        .iter()
        .find(|node_ref| {
            !node_ref.name.is_empty()
                && entities
                    .get(node_ref.owner)
                    .and_then(|entity| entity.node_container.as_ref())
                    .and_then(|container| container.get(&node_ref.name))
                    .is_some_and(|node| node.is_pipe())
        })
        .cloned()
}

/// Copy every net on the saved maps into a snapshot on one of its nodes.
///
/// Existing snapshots on entities whose transform is on a saved map are
/// removed first so a previous save's gas is not carried over.
pub fn capture_pipe_net_gas(
    entities: &mut EntityStorage,
    grids: &BTreeMap<GridId, GridAtmosphere>,
    nets: &PipeNetStorage,
    map_ids: &[MapId],
) -> CaptureReport {
    let mut report = CaptureReport::default();

    for id in entities.sorted_ids() {
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        let on_saved_map = entity
            .transform
            .is_some_and(|transform| map_ids.contains(&transform.map_id));
        if on_saved_map && entity.pipe_net_snapshot.take().is_some() {
            report.purged += 1;
        }
    }

    for grid in grids.values() {
        if !map_ids.contains(&grid.map_id) {
            continue;
        }

        for &net_id in &grid.pipe_nets {
            let Some(net) = nets.get(net_id) else {
                continue;
            };
            let Some(node) = select_snapshot_node(net, entities) else {
                report.skipped += 1;
                continue;
            };
            let Some(owner) = entities.get_mut(node.owner) else {
                report.skipped += 1;
                continue;
            };

            owner
                .pipe_net_snapshot
                .get_or_insert_with(PipeNetGasSnapshot::default)
                .node_air
                .insert(node.name, net.air.clone());
            report.captured += 1;
        }
    }

    tracing::debug!(
        purged = report.purged,
        captured = report.captured,
        skipped = report.skipped,
        "Captured pipe net gas"
    );

    report
}

/// Write an entity's snapshot entries back into the nets its nodes joined.
///
/// Entries for nodes the entity no longer has as pipes are dropped. Entries
/// whose node has no net yet stay for the next rebuild. The snapshot is
/// removed once it is empty. Saved gas replaces the net's gas outright,
/// volume included.
pub fn restore_pipe_net_gas(entity: &mut Entity, nets: &mut PipeNetStorage) -> RestoreReport {
    let mut report = RestoreReport::default();

    let Some(container) = entity.node_container.as_ref() else {
        return report;
    };
    let Some(snapshot) = entity.pipe_net_snapshot.as_mut() else {
        return report;
    };

    snapshot.node_air.retain(|name, saved| {
        let Some(node) = container.get(name).filter(|node| node.is_pipe()) else {
            report.dropped += 1;
            return false;
        };
        let air = match node.net {
            Some(net) => nets.air_mut(net),
            None => None,
        };
        let Some(air) = air else {
            report.pending += 1;
            return true;
        };

        *air = saved.clone();
        report.restored += 1;
        tracing::trace!(entity = entity.id, node = %name, "Restored pipe net gas");
        false
    });

    if snapshot.node_air.is_empty() {
        entity.pipe_net_snapshot = None;
    }

    report
}
