//! Core simulation loop.
//!
//! The simulation owns every entity, grid atmosphere and pipe net, and
//! advances them together in [`Simulation::tick`]. Everything that reacts
//! to something happening in the world goes through
//! [`Simulation::handle_event`], which looks the event up in
//! [`EVENT_HANDLERS`] and runs each registered system in table order.
//!
//! # Determinism
//!
//! - Entities are processed in ascending id order.
//! - Grids, tiles and pipe nets live in ordered maps.
//! - No randomness.
//!
//! Floats are used throughout, so identical results are only guaranteed on
//! the same build and platform.
//!
//! # Example
//!
//! ```
//! use atmos_core::components::{GridId, MapId, Transform};
//! use atmos_core::data::GasGeneratorConfig;
//! use atmos_core::nodes::{Node, NodeContainer};
//! use atmos_core::simulation::{EntitySpawnParams, Simulation};
//! use atmos_core::tile::{GridAtmosphere, TileIndex};
//!
//! let mut sim = Simulation::default();
//! let mut grid = GridAtmosphere::new(MapId(1));
//! grid.fill_standard_air(4, 4);
//! sim.add_grid(GridId(1), grid);
//!
//! let generator = sim.spawn_entity(EntitySpawnParams {
//!     transform: Some(Transform::anchored(MapId(1), GridId(1), TileIndex::new(1, 1))),
//!     node_container: Some(NodeContainer::new().with_node("inlet", Node::pipe(200.0))),
//!     gas_generator: Some(GasGeneratorConfig::default()),
//!     ..Default::default()
//! });
//!
//! let events = sim.tick(0.5);
//! assert_eq!(sim.get_tick(), 1);
//! assert_eq!(events.generator_outputs[0].entity, generator);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::atmosphere::{AtmosConfig, AtmosphereSystem, HotspotExposure};
use crate::components::{
    Appearance, AtmosDevice, EntityId, GridId, MapId, PowerReceiver, PowerSupplier,
    ReagentContainer, Transform,
};
use crate::constants::HOTSPOT_MINIMUM_MOLES;
use crate::data::{GasGeneratorConfig, RecipeRegistry};
use crate::devices::recycler::RecyclerOutput;
use crate::devices::{
    gas_generator_update, gas_recycler_update, ExamineLine, GasGenerator, GasGeneratorStatus,
    GasRecycler, GasSimulationContext, GeneratorOutput,
};
use crate::error::{AtmosError, Result};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::nodes::{Node, NodeAdjacency, NodeContainer, NodeRef, PipeNet, PipeNetId, PipeNetStorage};
use crate::reactions::{ReactionPipeline, ReactionResult};
use crate::snapshot::{
    capture_pipe_net_gas, restore_pipe_net_gas, CaptureReport, PipeNetGasSnapshot, RestoreReport,
};
use crate::tile::{GridAtmosphere, TileAtmosphere, TileIndex, TileLocation};

/// An entity with optional components.
///
/// Only components that are `Some` are active for this entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Placement on a grid.
    pub transform: Option<Transform>,
    /// Pipe nodes.
    pub node_container: Option<NodeContainer>,
    /// Saved pipe net gas waiting to be restored.
    pub pipe_net_snapshot: Option<PipeNetGasSnapshot>,
    /// Combustion generator.
    pub gas_generator: Option<GasGenerator>,
    /// Gas recycler.
    pub gas_recycler: Option<GasRecycler>,
    /// Power output.
    pub power_supplier: Option<PowerSupplier>,
    /// Power input.
    pub power_receiver: Option<PowerReceiver>,
    /// Receives atmos device updates.
    pub atmos_device: Option<AtmosDevice>,
    /// Cosmetic state.
    pub appearance: Option<Appearance>,
}

impl Entity {
    /// Create a new entity with the given ID and no components.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            transform: None,
            node_container: None,
            pipe_net_snapshot: None,
            gas_generator: None,
            gas_recycler: None,
            power_supplier: None,
            power_receiver: None,
            atmos_device: None,
            appearance: None,
        }
    }
}

/// Parameters for spawning a new entity.
///
/// All fields are optional; devices get their power, device and
/// appearance components added automatically.
#[derive(Debug, Clone, Default)]
pub struct EntitySpawnParams {
    /// Placement.
    pub transform: Option<Transform>,
    /// Pipe nodes. Connections may point at existing entities.
    pub node_container: Option<NodeContainer>,
    /// Makes the entity a gas generator with this tuning.
    pub gas_generator: Option<GasGeneratorConfig>,
    /// Makes the entity a gas recycler.
    pub gas_recycler: Option<GasRecycler>,
    /// Initial power state for devices. Defaults to powered.
    pub powered: Option<bool>,
}

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) entity lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStorage {
    entities: HashMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Insert an entity under its own ID, as when loading a save.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::SaveError`] if the ID is taken.
    pub fn insert_with_id(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(AtmosError::SaveError(format!(
                "entity {} already exists",
                entity.id
            )));
        }
        self.next_id = self.next_id.max(entity.id + 1);
        self.entities.insert(entity.id, entity);
        Ok(())
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}

/// Something that happened in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// The given maps are about to be saved.
    BeforeSerialization {
        /// Maps being saved.
        map_ids: Vec<MapId>,
    },
    /// The entity's nodes were regrouped into nets.
    NodeGroupsRebuilt {
        /// Entity whose nodes were touched.
        entity: EntityId,
    },
    /// A device joined the atmosphere.
    DeviceEnabled {
        /// Device entity.
        entity: EntityId,
    },
    /// A device left the atmosphere.
    DeviceDisabled {
        /// Device entity.
        entity: EntityId,
    },
    /// Per-tick device update.
    DeviceUpdate {
        /// Device entity.
        entity: EntityId,
        /// Seconds since the last update.
        dt: f32,
    },
    /// A power receiver gained or lost power.
    PowerChanged {
        /// Receiver entity.
        entity: EntityId,
        /// New power state.
        powered: bool,
    },
}

/// Payload-free tag of a [`SimEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`SimEvent::BeforeSerialization`].
    BeforeSerialization,
    /// [`SimEvent::NodeGroupsRebuilt`].
    NodeGroupsRebuilt,
    /// [`SimEvent::DeviceEnabled`].
    DeviceEnabled,
    /// [`SimEvent::DeviceDisabled`].
    DeviceDisabled,
    /// [`SimEvent::DeviceUpdate`].
    DeviceUpdate,
    /// [`SimEvent::PowerChanged`].
    PowerChanged,
}

impl SimEvent {
    /// The event's tag.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::BeforeSerialization { .. } => EventKind::BeforeSerialization,
            Self::NodeGroupsRebuilt { .. } => EventKind::NodeGroupsRebuilt,
            Self::DeviceEnabled { .. } => EventKind::DeviceEnabled,
            Self::DeviceDisabled { .. } => EventKind::DeviceDisabled,
            Self::DeviceUpdate { .. } => EventKind::DeviceUpdate,
            Self::PowerChanged { .. } => EventKind::PowerChanged,
        }
    }
}

/// Systems that handle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKind {
    /// Tracks whether devices are joined to the atmosphere.
    AtmosDevice,
    /// Pipe net gas capture and restore.
    PipeNetSnapshot,
    /// Combustion generators.
    GasGenerator,
    /// Gas recyclers.
    GasRecycler,
}

/// Which system handles which event, in dispatch order.
pub const EVENT_HANDLERS: &[(EventKind, SystemKind)] = &[
    (EventKind::BeforeSerialization, SystemKind::PipeNetSnapshot),
    (EventKind::NodeGroupsRebuilt, SystemKind::PipeNetSnapshot),
    (EventKind::DeviceEnabled, SystemKind::AtmosDevice),
    (EventKind::DeviceEnabled, SystemKind::GasRecycler),
    (EventKind::DeviceDisabled, SystemKind::AtmosDevice),
    (EventKind::DeviceDisabled, SystemKind::GasRecycler),
    (EventKind::DeviceUpdate, SystemKind::GasGenerator),
    (EventKind::DeviceUpdate, SystemKind::GasRecycler),
    (EventKind::PowerChanged, SystemKind::GasGenerator),
];

/// Where a reaction pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionSite {
    /// A pipe net's shared mixture.
    PipeNet(PipeNetId),
    /// A tile's open air.
    Tile(GridId, TileIndex),
}

/// A reaction pass that reacted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionRecord {
    /// Mixture the pass ran on.
    pub site: ReactionSite,
    /// Pass result.
    pub result: ReactionResult,
}

/// Events generated during a simulation tick or event dispatch.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Reaction passes that reacted.
    pub reactions: Vec<ReactionRecord>,
    /// Hotspot exposures raised by fire reactions.
    pub exposures: Vec<HotspotExposure>,
    /// Tiles whose fire went out.
    pub extinguished: Vec<(GridId, TileIndex)>,
    /// Generator updates.
    pub generator_outputs: Vec<GeneratorOutput>,
    /// Recycler updates.
    pub recycler_outputs: Vec<RecyclerOutput>,
    /// Snapshot captures.
    pub captures: Vec<CaptureReport>,
    /// Snapshot restores that did something.
    pub restores: Vec<(EntityId, RestoreReport)>,
}

/// Device view of the world: atmosphere settings, pipe nets and grids.
struct AtmosView<'a> {
    config: &'a AtmosConfig,
    nets: &'a mut PipeNetStorage,
    grids: &'a mut BTreeMap<GridId, GridAtmosphere>,
}

impl GasSimulationContext for AtmosView<'_> {
    fn heat_scale(&self) -> f32 {
        self.config.heat_scale
    }

    fn pump_speedup(&self) -> f32 {
        self.config.speedup
    }

    fn pipe_net_air(&mut self, net: PipeNetId) -> Option<&mut GasMixture> {
        self.nets.air_mut(net)
    }

    fn tile_mixture(&mut self, transform: &Transform) -> Option<&mut GasMixture> {
        let grid = self.grids.get_mut(&transform.grid?)?;
        grid.tile_mixture_mut(transform.tile)
    }
}

/// The atmospherics simulation.
///
/// # System Execution Order
///
/// Each tick:
/// 1. **Pipe net reactions** - one pass per net, no holder
/// 2. **Tile reactions** - one pass per tile, fires may ignite the tile
/// 3. **Hotspot upkeep** - fires without oxygen or fuel go out
/// 4. **Devices** - joined devices in id order, generators then recyclers
/// 5. **Power** - suppliers deliver what they offer
#[derive(Debug, Clone)]
pub struct Simulation {
    tick: u64,
    entities: EntityStorage,
    grids: BTreeMap<GridId, GridAtmosphere>,
    nets: PipeNetStorage,
    atmosphere: AtmosphereSystem,
    reactions: ReactionPipeline,
    recipes: RecipeRegistry,
}

impl Simulation {
    /// Create an empty simulation with the standard reactions and no
    /// recycling recipes.
    #[must_use]
    pub fn new(config: AtmosConfig) -> Self {
        Self {
            tick: 0,
            entities: EntityStorage::new(),
            grids: BTreeMap::new(),
            nets: PipeNetStorage::new(),
            atmosphere: AtmosphereSystem::new(config),
            reactions: ReactionPipeline::standard(),
            recipes: RecipeRegistry::default(),
        }
    }

    /// Replace the reaction set.
    #[must_use]
    pub fn with_reactions(mut self, reactions: ReactionPipeline) -> Self {
        self.reactions = reactions;
        self
    }

    /// Replace the recycling recipes.
    #[must_use]
    pub fn with_recipes(mut self, recipes: RecipeRegistry) -> Self {
        self.recipes = recipes;
        self
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Get a reference to the entity storage.
    #[must_use]
    pub fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable entity by ID.
    pub fn get_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Atmosphere services.
    #[must_use]
    pub fn atmosphere(&self) -> &AtmosphereSystem {
        &self.atmosphere
    }

    /// Recycling recipes.
    #[must_use]
    pub fn recipes(&self) -> &RecipeRegistry {
        &self.recipes
    }

    /// Add or replace a grid.
    pub fn add_grid(&mut self, id: GridId, grid: GridAtmosphere) {
        self.grids.insert(id, grid);
    }

    /// All grids.
    #[must_use]
    pub fn grids(&self) -> &BTreeMap<GridId, GridAtmosphere> {
        &self.grids
    }

    /// A grid, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::GridNotFound`] for unknown grids.
    pub fn grid_mut(&mut self, id: GridId) -> Result<&mut GridAtmosphere> {
        self.grids.get_mut(&id).ok_or(AtmosError::GridNotFound(id.0))
    }

    /// Open air on a tile.
    #[must_use]
    pub fn tile_air(&self, grid: GridId, index: TileIndex) -> Option<&GasMixture> {
        self.grids
            .get(&grid)?
            .tiles
            .get(&index)?
            .air
            .as_ref()
    }

    /// All pipe nets.
    #[must_use]
    pub fn nets(&self) -> &PipeNetStorage {
        &self.nets
    }

    /// The net a node belongs to.
    #[must_use]
    pub fn node_net(&self, node: &NodeRef) -> Option<&PipeNet> {
        let net = self.node(node)?.net?;
        self.nets.get(net)
    }

    /// Gas in the net a node belongs to.
    #[must_use]
    pub fn node_air(&self, node: &NodeRef) -> Option<&GasMixture> {
        self.node_net(node).map(|net| &net.air)
    }

    /// Gas in the net a node belongs to, mutably.
    pub fn node_air_mut(&mut self, node: &NodeRef) -> Option<&mut GasMixture> {
        let net = self.node(node)?.net?;
        self.nets.air_mut(net)
    }

    fn node(&self, node: &NodeRef) -> Option<&Node> {
        self.entities
            .get(node.owner)?
            .node_container
            .as_ref()?
            .get(&node.name)
    }

    /// Advance the simulation by one tick of `dt` seconds.
    ///
    /// Returns events generated during this tick.
    pub fn tick(&mut self, dt: f32) -> TickEvents {
        let mut events = TickEvents::default();

        // 1. Pipe net reactions
        self.run_pipe_net_reactions(&mut events);

        // 2. Tile reactions
        self.run_tile_reactions(&mut events);

        // 3. Hotspot upkeep
        self.run_hotspot_upkeep(&mut events);

        // 4. Device updates
        self.run_device_updates(dt, &mut events);

        // 5. Power delivery
        self.run_power_delivery();

        events.exposures = self.atmosphere.drain_exposures();
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn run_pipe_net_reactions(&mut self, events: &mut TickEvents) {
        let Self {
            nets,
            atmosphere,
            reactions,
            ..
        } = self;

        for net in nets.iter_mut() {
            let result = reactions.react(&mut net.air, None, atmosphere);
            if result.is_reacting() {
                events.reactions.push(ReactionRecord {
                    site: ReactionSite::PipeNet(net.id),
                    result,
                });
            }
        }
    }

    fn run_tile_reactions(&mut self, events: &mut TickEvents) {
        let Self {
            grids,
            atmosphere,
            reactions,
            ..
        } = self;

        for (&grid_id, grid) in grids.iter_mut() {
            for (&index, tile) in &mut grid.tiles {
                let TileAtmosphere { air, hotspot } = tile;
                let Some(air) = air.as_mut() else {
                    continue;
                };
                let mut location = TileLocation {
                    grid: grid_id,
                    index,
                    hotspot,
                };

                let result = reactions.react(air, Some(&mut location), atmosphere);
                if result.is_reacting() {
                    events.reactions.push(ReactionRecord {
                        site: ReactionSite::Tile(grid_id, index),
                        result,
                    });
                }
            }
        }
    }

    fn run_hotspot_upkeep(&mut self, events: &mut TickEvents) {
        for (&grid_id, grid) in &mut self.grids {
            for (&index, tile) in &mut grid.tiles {
                if !tile.hotspot.valid {
                    continue;
                }

                let sustained = match (tile.air.as_ref(), tile.hotspot.fuel) {
                    (Some(air), Some(fuel)) => {
                        air.get_moles(Gas::Oxygen) >= HOTSPOT_MINIMUM_MOLES
                            && air.get_moles(fuel) >= HOTSPOT_MINIMUM_MOLES
                    }
                    _ => false,
                };

                if !sustained {
                    tile.hotspot.extinguish();
                    events.extinguished.push((grid_id, index));
                }
            }
        }
    }

    fn run_device_updates(&mut self, dt: f32, events: &mut TickEvents) {
        for id in self.entities.sorted_ids() {
            let joined = self
                .entities
                .get(id)
                .and_then(|entity| entity.atmos_device)
                .is_some_and(|device| device.joined);
            if !joined {
                continue;
            }

            if let Err(err) = self.dispatch(&SimEvent::DeviceUpdate { entity: id, dt }, events) {
                tracing::warn!(entity = id, error = %err, "Device update failed");
            }
        }
    }

    fn run_power_delivery(&mut self) {
        for id in self.entities.sorted_ids() {
            if let Some(supplier) = self
                .entities
                .get_mut(id)
                .and_then(|entity| entity.power_supplier.as_mut())
            {
                supplier.current_supply = supplier.max_supply;
            }
        }
    }

    /// Dispatch one event to every system registered for it.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] if the event names an entity
    /// that does not exist.
    pub fn handle_event(&mut self, event: &SimEvent) -> Result<TickEvents> {
        let mut events = TickEvents::default();
        self.dispatch(event, &mut events)?;
        events.exposures = self.atmosphere.drain_exposures();
        Ok(events)
    }

    fn dispatch(&mut self, event: &SimEvent, events: &mut TickEvents) -> Result<()> {
        let kind = event.kind();
        for &(_, system) in EVENT_HANDLERS.iter().filter(|(k, _)| *k == kind) {
            self.run_system(system, event, events)?;
        }
        Ok(())
    }

    fn run_system(
        &mut self,
        system: SystemKind,
        event: &SimEvent,
        events: &mut TickEvents,
    ) -> Result<()> {
        let Self {
            entities,
            grids,
            nets,
            atmosphere,
            recipes,
            ..
        } = self;

        match (system, event) {
            (SystemKind::PipeNetSnapshot, SimEvent::BeforeSerialization { map_ids }) => {
                let report = capture_pipe_net_gas(entities, grids, nets, map_ids);
                events.captures.push(report);
            }
            (SystemKind::PipeNetSnapshot, SimEvent::NodeGroupsRebuilt { entity }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                let report = restore_pipe_net_gas(target, nets);
                if report != RestoreReport::default() {
                    events.restores.push((*entity, report));
                }
            }
            (SystemKind::AtmosDevice, SimEvent::DeviceEnabled { entity }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                if let Some(device) = target.atmos_device.as_mut() {
                    device.joined = true;
                }
            }
            (SystemKind::AtmosDevice, SimEvent::DeviceDisabled { entity }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                if let Some(device) = target.atmos_device.as_mut() {
                    device.joined = false;
                }
            }
            (SystemKind::GasRecycler, SimEvent::DeviceEnabled { entity }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                if let Some(recycler) = target.gas_recycler.as_ref() {
                    recycler.enable(target.appearance.as_mut());
                }
            }
            (SystemKind::GasRecycler, SimEvent::DeviceDisabled { entity }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                if let Some(recycler) = target.gas_recycler.as_mut() {
                    recycler.disable(target.appearance.as_mut());
                }
            }
            (SystemKind::GasGenerator, SimEvent::DeviceUpdate { entity, dt }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                let mut view = AtmosView {
                    config: atmosphere.config(),
                    nets,
                    grids,
                };
                if let Some(output) = gas_generator_update(target, &mut view, *dt) {
                    events.generator_outputs.push(output);
                }
            }
            (SystemKind::GasRecycler, SimEvent::DeviceUpdate { entity, .. }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                let mut view = AtmosView {
                    config: atmosphere.config(),
                    nets,
                    grids,
                };
                if let Some(output) = gas_recycler_update(target, recipes, &mut view) {
                    events.recycler_outputs.push(output);
                }
            }
            (SystemKind::GasGenerator, SimEvent::PowerChanged { entity, powered }) => {
                let target = entities
                    .get_mut(*entity)
                    .ok_or(AtmosError::EntityNotFound(*entity))?;
                if let Some(receiver) = target.power_receiver.as_mut() {
                    receiver.powered = *powered;
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Spawn an entity and join its nodes to the pipe network.
    pub fn spawn_entity(&mut self, params: EntitySpawnParams) -> EntityId {
        let mut entity = Entity::new(0); // ID will be assigned by storage
        entity.transform = params.transform;
        entity.node_container = params.node_container;

        let is_device = params.gas_generator.is_some() || params.gas_recycler.is_some();

        if let Some(config) = params.gas_generator {
            entity.gas_generator = Some(GasGenerator::new(config));
            entity.power_supplier = Some(PowerSupplier::default());
            entity.power_receiver = Some(PowerReceiver {
                powered: params.powered.unwrap_or(true),
            });
        }
        if let Some(recycler) = params.gas_recycler {
            entity.gas_recycler = Some(recycler);
        }
        if is_device {
            entity.atmos_device = Some(AtmosDevice::default());
            entity.appearance = Some(Appearance::default());
        }

        let has_nodes = entity.node_container.is_some();
        let id = self.entities.insert(entity);

        if has_nodes {
            self.rebuild_node_groups(&[id]);
        }
        if is_device {
            // The entity exists, so enabling cannot fail.
            let _ = self.handle_event(&SimEvent::DeviceEnabled { entity: id });
        }

        id
    }

    /// Remove an entity, splitting or shrinking the nets it was part of.
    ///
    /// Gas held by the removed pipes is lost.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] if the entity doesn't exist.
    pub fn despawn_entity(&mut self, id: EntityId) -> Result<()> {
        let entity = self
            .entities
            .remove(id)
            .ok_or(AtmosError::EntityNotFound(id))?;

        let Some(container) = entity.node_container else {
            return Ok(());
        };

        let mut seeds = BTreeSet::new();
        for net_id in container.nodes.values().filter_map(|node| node.net) {
            let Some(net) = self.nets.get(net_id) else {
                continue;
            };
            let survivors: Vec<EntityId> = net
                .nodes
                .iter()
                .map(|node| node.owner)
                .filter(|&owner| owner != id)
                .collect();
            if survivors.is_empty() {
                self.drop_net(net_id);
            } else {
                seeds.extend(survivors);
            }
        }

        if !seeds.is_empty() {
            let seeds: Vec<EntityId> = seeds.into_iter().collect();
            self.rebuild_node_groups(&seeds);
        }
        Ok(())
    }

    /// Link two existing nodes and regroup the nets they touch.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] or
    /// [`AtmosError::MissingComponent`] if either node cannot be found.
    pub fn connect_nodes(&mut self, from: &NodeRef, to: &NodeRef) -> Result<()> {
        if self.node(to).is_none() {
            return Err(self.missing_node_error(to));
        }
        let missing = self.missing_node_error(from);
        let linked = self
            .entities
            .get_mut(from.owner)
            .and_then(|entity| entity.node_container.as_mut())
            .is_some_and(|container| container.connect(&from.name, to.clone()));
        if !linked {
            return Err(missing);
        }

        self.rebuild_node_groups(&[from.owner, to.owner]);
        Ok(())
    }

    fn missing_node_error(&self, node: &NodeRef) -> AtmosError {
        if self.entities.contains(node.owner) {
            AtmosError::MissingComponent {
                entity: node.owner,
                component: "node",
            }
        } else {
            AtmosError::EntityNotFound(node.owner)
        }
    }

    fn drop_net(&mut self, id: PipeNetId) -> Option<PipeNet> {
        let net = self.nets.remove(id)?;
        if let Some(grid) = net.grid {
            if let Some(grid) = self.grids.get_mut(&grid) {
                grid.pipe_nets.retain(|&other| other != id);
            }
        }
        Some(net)
    }

    /// Regroup the nodes reachable from `seeds` into fresh nets.
    ///
    /// Every net one of those nodes belonged to is dissolved. Its gas is
    /// shared out by volume between the new nets that inherited its pipes.
    /// Afterwards [`SimEvent::NodeGroupsRebuilt`] is raised for each
    /// touched entity in ascending id order.
    ///
    /// Returns the new nets in creation order.
    pub fn rebuild_node_groups(&mut self, seeds: &[EntityId]) -> Vec<PipeNetId> {
        let adjacency = NodeAdjacency::build(self.entities.iter().filter_map(|(&id, entity)| {
            entity.node_container.as_ref().map(|container| (id, container))
        }));

        let mut seeds = seeds.to_vec();
        seeds.sort_unstable();
        seeds.dedup();

        let mut starts: Vec<NodeRef> = Vec::new();
        for &seed in &seeds {
            if let Some(container) = self
                .entities
                .get(seed)
                .and_then(|entity| entity.node_container.as_ref())
            {
                starts.extend(container.nodes.keys().map(|name| NodeRef::new(seed, name.clone())));
            }
        }

        // Flood until no reached node belongs to an old net we have not
        // pulled in yet.
        let mut old_nets: BTreeSet<PipeNetId> = BTreeSet::new();
        let groups = loop {
            let groups = adjacency.flood(&starts);
            let mut grew = false;
            for node in groups.iter().flatten() {
                let Some(net_id) = self.node(node).and_then(|node| node.net) else {
                    continue;
                };
                if old_nets.insert(net_id) {
                    grew = true;
                    if let Some(net) = self.nets.get(net_id) {
                        starts.extend(net.nodes.iter().cloned());
                    }
                }
            }
            if !grew {
                break groups;
            }
        };

        let old: BTreeMap<PipeNetId, PipeNet> = old_nets
            .iter()
            .filter_map(|&id| self.drop_net(id).map(|net| (id, net)))
            .collect();

        let mut created = Vec::with_capacity(groups.len());
        let mut touched: BTreeSet<EntityId> = seeds.iter().copied().collect();

        for group in groups {
            let volume: f32 = group
                .iter()
                .filter_map(|node| self.node(node))
                .map(Node::volume)
                .sum();

            let net_id = if volume > 0.0 {
                let air = self.inherited_air(&group, &old, volume);
                let grid = group.iter().find_map(|node| {
                    self.entities
                        .get(node.owner)
                        .and_then(|entity| entity.transform)
                        .and_then(|transform| transform.grid)
                });
                let id = self.nets.create(grid, group.clone(), air);
                if let Some(grid) = grid {
                    if let Some(grid) = self.grids.get_mut(&grid) {
                        grid.pipe_nets.push(id);
                    }
                }
                created.push(id);
                Some(id)
            } else {
                None
            };

            for node_ref in &group {
                touched.insert(node_ref.owner);
                if let Some(node) = self
                    .entities
                    .get_mut(node_ref.owner)
                    .and_then(|entity| entity.node_container.as_mut())
                    .and_then(|container| container.nodes.get_mut(&node_ref.name))
                {
                    node.net = net_id;
                }
            }
        }

        tracing::debug!(
            dissolved = old.len(),
            created = created.len(),
            "Rebuilt node groups"
        );

        for entity in touched {
            if self.entities.contains(entity) {
                // Existence checked above; restore itself never fails.
                let _ = self.handle_event(&SimEvent::NodeGroupsRebuilt { entity });
            }
        }

        created
    }

    /// Gas for a new net: each old net gives the share of its volume that
    /// this group's pipes used to hold.
    fn inherited_air(
        &self,
        group: &[NodeRef],
        old: &BTreeMap<PipeNetId, PipeNet>,
        volume: f32,
    ) -> GasMixture {
        let mut shares: BTreeMap<PipeNetId, f32> = BTreeMap::new();
        for node in group.iter().filter_map(|node| self.node(node)) {
            if let Some(old_id) = node.net.filter(|id| old.contains_key(id)) {
                *shares.entry(old_id).or_insert(0.0) += node.volume();
            }
        }

        let mut air: Option<GasMixture> = None;
        for (old_id, share) in shares {
            let Some(old_net) = old.get(&old_id) else {
                continue;
            };
            let old_volume = old_net.air.volume();
            if old_volume <= 0.0 {
                continue;
            }
            let part = old_net.air.clone().remove_ratio(share / old_volume);
            match air.as_mut() {
                Some(air) => air.merge(&part, self.atmosphere.heat_scale()),
                None => {
                    let mut first = part;
                    first.set_volume(volume);
                    air = Some(first);
                }
            }
        }

        air.unwrap_or_else(|| GasMixture::new(volume))
    }

    /// Switch a generator on or off.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] or
    /// [`AtmosError::MissingComponent`].
    pub fn set_generator_enabled(&mut self, entity: EntityId, enabled: bool) -> Result<()> {
        self.generator_mut(entity)?.enabled = enabled;
        Ok(())
    }

    fn generator_mut(&mut self, entity: EntityId) -> Result<&mut GasGenerator> {
        self.entities
            .get_mut(entity)
            .ok_or(AtmosError::EntityNotFound(entity))?
            .gas_generator
            .as_mut()
            .ok_or(AtmosError::MissingComponent {
                entity,
                component: "gas generator",
            })
    }

    /// Change an entity's power state.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] if the entity doesn't exist.
    pub fn set_powered(&mut self, entity: EntityId, powered: bool) -> Result<()> {
        self.handle_event(&SimEvent::PowerChanged { entity, powered })
            .map(|_| ())
    }

    /// Join a device to the atmosphere or take it out.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] if the entity doesn't exist.
    pub fn set_device_joined(&mut self, entity: EntityId, joined: bool) -> Result<()> {
        let event = if joined {
            SimEvent::DeviceEnabled { entity }
        } else {
            SimEvent::DeviceDisabled { entity }
        };
        self.handle_event(&event).map(|_| ())
    }

    /// Put a reagent container in a recycler, returning any it held.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] or
    /// [`AtmosError::MissingComponent`].
    pub fn insert_container(
        &mut self,
        entity: EntityId,
        container: ReagentContainer,
    ) -> Result<Option<ReagentContainer>> {
        Ok(self.recycler_mut(entity)?.container.replace(container))
    }

    /// Take the reagent container out of a recycler.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] or
    /// [`AtmosError::MissingComponent`].
    pub fn eject_container(&mut self, entity: EntityId) -> Result<Option<ReagentContainer>> {
        Ok(self.recycler_mut(entity)?.container.take())
    }

    fn recycler_mut(&mut self, entity: EntityId) -> Result<&mut GasRecycler> {
        self.entities
            .get_mut(entity)
            .ok_or(AtmosError::EntityNotFound(entity))?
            .gas_recycler
            .as_mut()
            .ok_or(AtmosError::MissingComponent {
                entity,
                component: "gas recycler",
            })
    }

    /// UI state of a generator.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] or
    /// [`AtmosError::MissingComponent`].
    pub fn generator_status(&self, entity: EntityId) -> Result<GasGeneratorStatus> {
        let target = self
            .entities
            .get(entity)
            .ok_or(AtmosError::EntityNotFound(entity))?;
        let missing = |component| AtmosError::MissingComponent { entity, component };
        let generator = target
            .gas_generator
            .as_ref()
            .ok_or_else(|| missing("gas generator"))?;
        let supplier = target
            .power_supplier
            .as_ref()
            .ok_or_else(|| missing("power supplier"))?;
        let powered = target.power_receiver.map_or(true, |receiver| receiver.powered);
        Ok(generator.status(supplier, powered))
    }

    /// Examine text for an entity. Empty for entities with nothing to say.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::EntityNotFound`] if the entity doesn't exist.
    pub fn examine(&self, entity: EntityId) -> Result<Vec<ExamineLine>> {
        let target = self
            .entities
            .get(entity)
            .ok_or(AtmosError::EntityNotFound(entity))?;
        let mut lines = Vec::new();

        if let (Some(generator), Some(supplier)) =
            (target.gas_generator.as_ref(), target.power_supplier.as_ref())
        {
            lines.extend(generator.examine(supplier));
        }

        if let Some(recycler) = target.gas_recycler.as_ref() {
            let anchored = target.transform.is_some_and(|transform| transform.anchored);
            let inlet = target
                .node_container
                .as_ref()
                .and_then(|container| container.pipe_net(&recycler.inlet))
                .and_then(|net| self.nets.get(net))
                .map(|net| &net.air);
            lines.extend(recycler.examine(anchored, inlet, &self.recipes));
        }

        Ok(lines)
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        let ids = self.entities.sorted_ids();
        ids.len().hash(&mut hasher);

        for id in ids {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            id.hash(&mut hasher);

            if let Some(transform) = entity.transform {
                transform.map_id.hash(&mut hasher);
                transform.grid.hash(&mut hasher);
                transform.tile.hash(&mut hasher);
            }

            if let Some(generator) = entity.gas_generator.as_ref() {
                generator.enabled.hash(&mut hasher);
                generator.chamber.hash_bits(&mut hasher);
                generator.current_efficiency.to_bits().hash(&mut hasher);
                generator.current_consumption_rate.to_bits().hash(&mut hasher);
            }

            if let Some(recycler) = entity.gas_recycler.as_ref() {
                recycler.reacting.hash(&mut hasher);
                if let Some(container) = recycler.container.as_ref() {
                    for (reagent, amount) in &container.reagents {
                        reagent.hash(&mut hasher);
                        amount.to_bits().hash(&mut hasher);
                    }
                }
            }

            if let Some(supplier) = entity.power_supplier {
                supplier.max_supply.to_bits().hash(&mut hasher);
            }

            if let Some(snapshot) = entity.pipe_net_snapshot.as_ref() {
                for (name, air) in &snapshot.node_air {
                    name.hash(&mut hasher);
                    air.hash_bits(&mut hasher);
                }
            }
        }

        for (grid_id, grid) in &self.grids {
            grid_id.hash(&mut hasher);
            for (index, tile) in &grid.tiles {
                index.hash(&mut hasher);
                if let Some(air) = tile.air.as_ref() {
                    air.hash_bits(&mut hasher);
                }
                tile.hotspot.valid.hash(&mut hasher);
                tile.hotspot.temperature.to_bits().hash(&mut hasher);
            }
        }

        for net in self.nets.iter() {
            net.id.hash(&mut hasher);
            net.air.hash_bits(&mut hasher);
        }

        hasher.finish()
    }

    pub(crate) fn entities_mut(&mut self) -> &mut EntityStorage {
        &mut self.entities
    }

    pub(crate) fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(AtmosConfig::default())
    }
}
