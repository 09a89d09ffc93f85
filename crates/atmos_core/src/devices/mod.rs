//! Atmospherics devices.
//!
//! Device logic is written against [`GasSimulationContext`] rather than the
//! [`Simulation`](crate::simulation::Simulation) itself, so a device update
//! can hold its own entity mutably while it reaches pipe nets and tiles
//! through the context.

pub mod generator;
pub mod recycler;

use std::fmt;

use crate::components::Transform;
use crate::mixture::GasMixture;
use crate::nodes::PipeNetId;

pub use generator::{
    gas_generator_update, CompositionEfficiency, GasGenerator, GasGeneratorStatus,
    GeneratorOutput, GeneratorStage,
};
pub use recycler::{gas_recycler_update, passive_transfer_volume, GasRecycler, RecyclerOutput};

/// Gas lookups a device needs while it updates.
pub trait GasSimulationContext {
    /// Heat scale divisor.
    fn heat_scale(&self) -> f32;

    /// Pump speed multiplier.
    fn pump_speedup(&self) -> f32;

    /// Mixture of a pipe net, if it still exists.
    fn pipe_net_air(&mut self, net: PipeNetId) -> Option<&mut GasMixture>;

    /// Open air of the tile under `transform`, if any.
    fn tile_mixture(&mut self, transform: &Transform) -> Option<&mut GasMixture>;

    /// Merge `giver` into `receiver` at this context's heat scale.
    fn merge(&self, receiver: &mut GasMixture, giver: &GasMixture) {
        receiver.merge(giver, self.heat_scale());
    }
}

/// One line of device examine text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExamineLine {
    /// Watts the network is drawing from a generator.
    GeneratorPower(f32),
    /// Generator efficiency in `[0, 1]`.
    GeneratorEfficiency(f32),
    /// Generator fuel use in mol/s.
    GeneratorConsumption(f32),
    /// A reagent container sits in the recycler.
    RecyclerContainerLoaded,
    /// The recycler has no reagent container.
    RecyclerNoContainer,
    /// The recycler converted gas on its last update.
    RecyclerReacting,
    /// Inlet pressure is below what the recipe needs.
    RecyclerLowPressure,
    /// Inlet temperature is below what the recipe needs.
    RecyclerLowTemperature,
}

impl fmt::Display for ExamineLine {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneratorPower(watts) => {
                write!(f, "It is currently supplying {} W.", *watts as i64)
            }
            Self::GeneratorEfficiency(efficiency) => {
                write!(f, "Efficiency: {:.0}%", efficiency * 100.0)
            }
            Self::GeneratorConsumption(rate) => {
                write!(f, "Fuel consumption: {rate:.1} mol/s")
            }
            Self::RecyclerContainerLoaded => f.write_str("A container is loaded."),
            Self::RecyclerNoContainer => f.write_str("There is no container loaded."),
            Self::RecyclerReacting => f.write_str("It is making gurgling noises."),
            Self::RecyclerLowPressure => f.write_str("The input pressure is too low."),
            Self::RecyclerLowTemperature => f.write_str("The input temperature is too low."),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;

    use super::GasSimulationContext;
    use crate::components::Transform;
    use crate::constants::{CELL_VOLUME, T20C};
    use crate::mixture::GasMixture;
    use crate::nodes::PipeNetId;

    /// Pipe nets in a map and a single tile under every transform.
    pub(crate) struct TestContext {
        pub nets: BTreeMap<PipeNetId, GasMixture>,
        pub tile: Option<GasMixture>,
    }

    impl TestContext {
        pub(crate) fn with_inlet(inlet: GasMixture) -> Self {
            Self {
                nets: BTreeMap::from([(PipeNetId(0), inlet)]),
                tile: Some(GasMixture::new(CELL_VOLUME).with_temperature(T20C)),
            }
        }
    }

    impl GasSimulationContext for TestContext {
        fn heat_scale(&self) -> f32 {
            8.0
        }

        fn pump_speedup(&self) -> f32 {
            1.0
        }

        fn pipe_net_air(&mut self, net: PipeNetId) -> Option<&mut GasMixture> {
            self.nets.get_mut(&net)
        }

        fn tile_mixture(&mut self, _transform: &Transform) -> Option<&mut GasMixture> {
            self.tile.as_mut()
        }
    }
}
