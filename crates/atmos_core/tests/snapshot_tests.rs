//! Pipe net gas across world saves.
//!
//! These tests go through the public save/load API: capture on
//! `BeforeSerialization`, bincode round trip, rebuild and restore on
//! `NodeGroupsRebuilt`.

use atmos_core::components::MapId;
use atmos_core::gas::Gas;
use atmos_core::nodes::{Node, NodeRef};
use atmos_core::save::WorldSave;
use atmos_core::simulation::{SimEvent, Simulation};
use atmos_test_utils::fixtures::{
    fill_net, fuel_mix, spawn_pipe, spawn_pipe_line, station, MAP, PIPE_VOLUME,
};

fn nitrogen_line(length: usize) -> (Simulation, Vec<u64>) {
    let mut sim = station(8, 1);
    let ids = spawn_pipe_line(&mut sim, length);
    let air = atmos_core::mixture::GasMixture::new(PIPE_VOLUME)
        .with_temperature(310.0)
        .with_moles(Gas::Nitrogen, 30.0);
    fill_net(&mut sim, &NodeRef::new(ids[0], "pipe"), air);
    (sim, ids)
}

fn net_moles(sim: &Simulation) -> f32 {
    sim.nets().iter().map(|net| net.air.total_moles()).sum()
}

fn round_trip(save: &WorldSave) -> WorldSave {
    WorldSave::from_bytes(&save.to_bytes().unwrap()).unwrap()
}

fn snapshot_owner(save: &WorldSave) -> u64 {
    save.entities
        .iter()
        .find(|entity| entity.pipe_net_snapshot.is_some())
        .map(|entity| entity.id)
        .unwrap()
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_line_gas_survives_save() {
    let (mut sim, ids) = nitrogen_line(3);
    let save = round_trip(&sim.save_world(&[MAP]).unwrap());

    assert_eq!(save.snapshot_count(), 1);

    let mut loaded = Simulation::default();
    loaded.load_world(save).unwrap();

    let air = loaded.node_air(&NodeRef::new(ids[2], "pipe")).unwrap();
    assert!((air.get_moles(Gas::Nitrogen) - 30.0).abs() < 1e-4);
    assert!((air.temperature() - 310.0).abs() < 1e-3);
    assert_eq!(air.volume(), PIPE_VOLUME * 3.0);
}

#[test]
fn test_saved_tick_carries_over() {
    let (mut sim, _) = nitrogen_line(2);
    for _ in 0..5 {
        sim.tick(0.5);
    }
    let save = sim.save_world(&[MAP]).unwrap();

    let mut loaded = Simulation::default();
    loaded.load_world(save).unwrap();
    assert_eq!(loaded.get_tick(), 5);
}

// =============================================================================
// Accepted losses
// =============================================================================

#[test]
fn test_deleted_owner_loses_gas() {
    let (mut sim, _) = nitrogen_line(3);
    let mut save = sim.save_world(&[MAP]).unwrap();
    let owner = snapshot_owner(&save);
    save.entities.retain(|entity| entity.id != owner);

    let mut loaded = Simulation::default();
    loaded.load_world(save).unwrap();

    assert!(!loaded.nets().is_empty());
    assert_eq!(net_moles(&loaded), 0.0);
}

#[test]
fn test_unknown_node_entry_is_dropped() {
    let (mut sim, _) = nitrogen_line(2);
    let mut save = sim.save_world(&[MAP]).unwrap();
    let owner = snapshot_owner(&save);
    let entity = save.entities.iter_mut().find(|e| e.id == owner).unwrap();
    let snapshot = entity.pipe_net_snapshot.as_mut().unwrap();
    let air = snapshot.node_air.remove("pipe").unwrap();
    snapshot.node_air.insert("ghost".to_string(), air);

    let mut loaded = Simulation::default();
    loaded.load_world(save).unwrap();

    assert_eq!(net_moles(&loaded), 0.0);
    assert!(loaded.get_entity(owner).unwrap().pipe_net_snapshot.is_none());
}

// =============================================================================
// Pending restores
// =============================================================================

#[test]
fn test_restore_waits_for_a_net() {
    let mut sim = station(4, 1);
    let lone = spawn_pipe(&mut sim, 0, None);
    fill_net(
        &mut sim,
        &NodeRef::new(lone, "pipe"),
        fuel_mix(3.0, 0.0, 293.15),
    );
    let mut save = sim.save_world(&[MAP]).unwrap();

    // Load the pipe without volume so no net forms.
    let entity = save.entities.iter_mut().find(|e| e.id == lone).unwrap();
    let container = entity.node_container.as_mut().unwrap();
    container.nodes.insert("pipe".to_string(), Node::pipe(0.0));

    let mut loaded = Simulation::default();
    loaded.load_world(save).unwrap();
    assert!(loaded.nets().is_empty());
    assert!(loaded.get_entity(lone).unwrap().pipe_net_snapshot.is_some());

    // A new segment joins it into a net and the saved gas comes back.
    spawn_pipe(&mut loaded, 1, Some(lone));
    let air = loaded.node_air(&NodeRef::new(lone, "pipe")).unwrap();
    assert!((air.get_moles(Gas::Methane) - 3.0).abs() < 1e-4);
    assert!(loaded.get_entity(lone).unwrap().pipe_net_snapshot.is_none());
}

// =============================================================================
// Capture scope
// =============================================================================

#[test]
fn test_second_capture_purges_first() {
    let (mut sim, _) = nitrogen_line(2);
    let event = SimEvent::BeforeSerialization { map_ids: vec![MAP] };

    let first = sim.handle_event(&event).unwrap();
    let second = sim.handle_event(&event).unwrap();

    assert_eq!(first.captures[0].captured, 1);
    assert_eq!(first.captures[0].purged, 0);
    assert_eq!(second.captures[0].purged, 1);
    assert_eq!(second.captures[0].captured, 1);
}

#[test]
fn test_other_map_is_not_captured() {
    let (mut sim, _) = nitrogen_line(2);
    let save = sim.save_world(&[MapId(99)]).unwrap();

    assert!(save.entities.is_empty());
    assert!(save.grids.is_empty());
    assert!(sim
        .entities()
        .iter()
        .all(|(_, entity)| entity.pipe_net_snapshot.is_none()));
}
