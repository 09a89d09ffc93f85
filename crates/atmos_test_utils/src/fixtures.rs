//! Test fixtures and helpers.
//!
//! Pre-built station worlds and device rigs for consistent testing. Every
//! fixture lives on [`MAP`] / [`GRID`], filled with standard air.

use atmos_core::components::{EntityId, GridId, MapId, Transform};
use atmos_core::data::{GasGeneratorConfig, GasRecyclingRecipe, RecipeRegistry};
use atmos_core::devices::GasRecycler;
use atmos_core::gas::Gas;
use atmos_core::mixture::GasMixture;
use atmos_core::nodes::{Node, NodeContainer, NodeRef};
use atmos_core::simulation::{EntitySpawnParams, Simulation};
use atmos_core::tile::{GridAtmosphere, TileIndex};

/// Map every fixture is built on.
pub const MAP: MapId = MapId(1);

/// Grid every fixture is built on.
pub const GRID: GridId = GridId(1);

/// Tick length used by the fixtures' callers, in seconds.
pub const TICK_DT: f32 = 0.5;

/// Volume of a single fixture pipe segment (L).
pub const PIPE_VOLUME: f32 = 200.0;

/// An anchored transform on the fixture grid.
#[must_use]
pub fn place(x: i32, y: i32) -> Transform {
    Transform::anchored(MAP, GRID, TileIndex::new(x, y))
}

/// An empty simulation with a `width` × `height` grid of standard air.
#[must_use]
pub fn station(width: i32, height: i32) -> Simulation {
    let mut grid = GridAtmosphere::new(MAP);
    grid.fill_standard_air(width, height);

    let mut sim = Simulation::default();
    sim.add_grid(GRID, grid);
    sim
}

/// Spawn a pipe segment with one node named `"pipe"`, linked to the
/// previous segment if given.
pub fn spawn_pipe(sim: &mut Simulation, x: i32, previous: Option<EntityId>) -> EntityId {
    let mut container = NodeContainer::new().with_node("pipe", Node::pipe(PIPE_VOLUME));
    if let Some(previous) = previous {
        container.connect("pipe", NodeRef::new(previous, "pipe"));
    }
    sim.spawn_entity(EntitySpawnParams {
        transform: Some(place(x, 0)),
        node_container: Some(container),
        ..Default::default()
    })
}

/// Spawn `length` linked pipe segments along the x axis.
pub fn spawn_pipe_line(sim: &mut Simulation, length: usize) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = Vec::with_capacity(length);
    for x in 0..length {
        let x = i32::try_from(x).unwrap_or(i32::MAX);
        let id = spawn_pipe(sim, x, ids.last().copied());
        ids.push(id);
    }
    ids
}

/// Replace the gas in a node's net, keeping the net's volume.
///
/// # Panics
///
/// Panics if the node has no net.
pub fn fill_net(sim: &mut Simulation, node: &NodeRef, gas: GasMixture) {
    let air = sim
        .node_air_mut(node)
        .expect("fixture node should be in a pipe net");
    let volume = air.volume();
    *air = gas;
    air.set_volume(volume);
}

/// A methane / oxygen fuel mix at `temperature`.
#[must_use]
pub fn fuel_mix(methane: f32, oxygen: f32, temperature: f32) -> GasMixture {
    GasMixture::new(PIPE_VOLUME)
        .with_temperature(temperature)
        .with_moles(Gas::Methane, methane)
        .with_moles(Gas::Oxygen, oxygen)
}

/// A generator wired to its own inlet net.
#[derive(Debug, Clone)]
pub struct GeneratorRig {
    /// The world.
    pub sim: Simulation,
    /// Generator entity.
    pub generator: EntityId,
    /// Generator inlet node.
    pub inlet: NodeRef,
}

/// A station with one default methane generator whose inlet net holds
/// `inlet_gas`.
#[must_use]
pub fn generator_rig(inlet_gas: GasMixture) -> GeneratorRig {
    generator_rig_with(GasGeneratorConfig::default(), inlet_gas)
}

/// [`generator_rig`] with a custom profile.
#[must_use]
pub fn generator_rig_with(config: GasGeneratorConfig, inlet_gas: GasMixture) -> GeneratorRig {
    let mut sim = station(3, 3);
    let inlet_name = config.inlet.clone();
    let generator = sim.spawn_entity(EntitySpawnParams {
        transform: Some(place(1, 1)),
        node_container: Some(
            NodeContainer::new().with_node(inlet_name.clone(), Node::pipe(PIPE_VOLUME)),
        ),
        gas_generator: Some(config),
        ..Default::default()
    });
    let inlet = NodeRef::new(generator, inlet_name);
    fill_net(&mut sim, &inlet, inlet_gas);

    GeneratorRig {
        sim,
        generator,
        inlet,
    }
}

/// A recycler with separate inlet and outlet nets.
#[derive(Debug, Clone)]
pub struct RecyclerRig {
    /// The world.
    pub sim: Simulation,
    /// Recycler entity.
    pub recycler: EntityId,
    /// Recycler inlet node.
    pub inlet: NodeRef,
    /// Recycler outlet node.
    pub outlet: NodeRef,
}

/// A station with one recycler running `recipes`, inlet net holding
/// `inlet_gas` and an empty outlet net.
#[must_use]
pub fn recycler_rig(recipes: RecipeRegistry, inlet_gas: GasMixture) -> RecyclerRig {
    let mut sim = station(3, 3).with_recipes(recipes);
    let recycler = GasRecycler::default();
    let container = NodeContainer::new()
        .with_node(recycler.inlet.clone(), Node::pipe(PIPE_VOLUME))
        .with_node(recycler.outlet.clone(), Node::pipe(PIPE_VOLUME));
    let inlet_name = recycler.inlet.clone();
    let outlet_name = recycler.outlet.clone();

    let id = sim.spawn_entity(EntitySpawnParams {
        transform: Some(place(1, 1)),
        node_container: Some(container),
        gas_recycler: Some(recycler),
        ..Default::default()
    });
    let inlet = NodeRef::new(id, inlet_name);
    let outlet = NodeRef::new(id, outlet_name);
    fill_net(&mut sim, &inlet, inlet_gas);

    RecyclerRig {
        sim,
        recycler: id,
        inlet,
        outlet,
    }
}

/// The carbon dioxide recipe: CO2 → O2 above 300 °C, half a unit of
/// carbon scrubbed per mole.
#[must_use]
pub fn carbon_dioxide_recipe() -> GasRecyclingRecipe {
    GasRecyclingRecipe {
        id: "CarbonDioxideToOxygen".to_string(),
        input_gas: Gas::CarbonDioxide,
        output_gas: Gas::Oxygen,
        conversion_ratio: 1.0,
        minimum_temperature: 573.15,
        minimum_pressure: 101.325,
        scrubbed_reagents: [("Carbon".to_string(), 0.5)].into_iter().collect(),
        enabled: true,
    }
}

/// A registry holding only [`carbon_dioxide_recipe`].
///
/// # Panics
///
/// Never; the recipe is valid.
#[must_use]
pub fn carbon_dioxide_registry() -> RecipeRegistry {
    RecipeRegistry::new(vec![carbon_dioxide_recipe()]).expect("fixture recipe is valid")
}

/// Add `moles` of `fuel` to a tile and heat it to `temperature`.
///
/// # Panics
///
/// Panics if the tile has no air.
pub fn heat_tile(sim: &mut Simulation, tile: TileIndex, fuel: Gas, moles: f32, temperature: f32) {
    let air = sim
        .grid_mut(GRID)
        .expect("fixture grid exists")
        .tile_mixture_mut(tile)
        .expect("fixture tile has air");
    air.adjust_moles(fuel, moles);
    air.set_temperature(temperature);
}

/// Total moles in every pipe net and tile.
#[must_use]
pub fn total_moles(sim: &Simulation) -> f32 {
    let nets: f32 = sim.nets().iter().map(|net| net.air.total_moles()).sum();
    let tiles: f32 = sim
        .grids()
        .values()
        .flat_map(|grid| grid.tiles.values())
        .filter_map(|tile| tile.air.as_ref())
        .map(GasMixture::total_moles)
        .sum();
    nets + tiles
}
