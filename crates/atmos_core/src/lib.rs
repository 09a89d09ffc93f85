//! # Atmos Core
//!
//! Deterministic gas atmospherics simulation for a tile-based space
//! station.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO apart from save files
//! - No randomness
//!
//! ## Crate Structure
//!
//! - [`gas`] - Gas species and their specific heats
//! - [`mixture`] - Gas mixture arithmetic
//! - [`atmosphere`] - Heat scaling, merging and hotspot exposure
//! - [`reactions`] - Reaction effects and the data-driven reaction pipeline
//! - [`nodes`] - Pipe node graph and pipe nets
//! - [`snapshot`] - Saving pipe net gas across a world save
//! - [`devices`] - Gas generator and gas recycler
//! - [`simulation`] - Core simulation loop and event dispatch
//! - [`save`] - World save encoding
//! - [`data`] - RON-loaded recipes and generator profiles

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod atmosphere;
pub mod components;
pub mod constants;
pub mod data;
pub mod devices;
pub mod error;
pub mod gas;
pub mod mixture;
pub mod nodes;
pub mod reactions;
pub mod save;
pub mod simulation;
pub mod snapshot;
pub mod tile;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::atmosphere::{AtmosConfig, AtmosphereSystem, HotspotExposure};
    pub use crate::components::*;
    pub use crate::data::{GasGeneratorConfig, GasRecyclingRecipe, RecipeRegistry};
    pub use crate::devices::{
        ExamineLine, GasGenerator, GasGeneratorStatus, GasRecycler, GeneratorOutput,
        GeneratorStage,
    };
    pub use crate::error::{AtmosError, Result};
    pub use crate::gas::Gas;
    pub use crate::mixture::GasMixture;
    pub use crate::nodes::{Node, NodeContainer, NodeRef, PipeNetId};
    pub use crate::reactions::{ReactionPipeline, ReactionResult};
    pub use crate::save::WorldSave;
    pub use crate::simulation::{EntitySpawnParams, SimEvent, Simulation, TickEvents};
    pub use crate::tile::{GridAtmosphere, TileIndex};
}
