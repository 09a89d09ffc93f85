//! Chlorine trifluoride decomposition: 2 ClF3 -> Cl2 + 3 F2.
//!
//! Violently exothermic. The decomposed mixture is floored at a high
//! temperature and no later reaction runs in the same pass.

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{
    CLF3_DECOMPOSITION_ENERGY_RELEASED, MINIMUM_HEAT_CAPACITY, PLASMA_MINIMUM_BURN_TEMPERATURE,
};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

use super::{apply_released_energy, ReactionEffect, ReactionResult, ReactionScratch};

const DECOMPOSITION_RATE: f32 = 0.15;

/// Lowest temperature a decomposing mixture is left at.
const DECOMPOSITION_TEMPERATURE_FLOOR: f32 = PLASMA_MINIMUM_BURN_TEMPERATURE + 900.0;

/// Lowest temperature the tile is exposed to while decomposing.
const EXPOSURE_TEMPERATURE_FLOOR: f32 = PLASMA_MINIMUM_BURN_TEMPERATURE + 600.0;

/// Decomposes chlorine trifluoride into chlorine and fluorine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChlorineTrifluorideReaction;

impl ReactionEffect for ChlorineTrifluorideReaction {
    fn react(
        &self,
        mixture: &mut GasMixture,
        mut holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
        heat_scale: f32,
        scratch: &mut ReactionScratch,
    ) -> ReactionResult {
        let mut energy_released = 0.0;
        let old_heat_capacity = atmosphere.heat_capacity(mixture, true);
        let temperature = mixture.temperature();
        scratch.fire = 0.0;

        let initial = mixture.get_moles(Gas::ChlorineTrifluoride);
        let rate = initial * DECOMPOSITION_RATE;

        if rate > MINIMUM_HEAT_CAPACITY {
            mixture.set_moles(Gas::ChlorineTrifluoride, initial - rate);
            mixture.adjust_moles(Gas::Chlorine, rate * 0.5);
            mixture.adjust_moles(Gas::Fluorine, rate * 1.5);

            energy_released = CLF3_DECOMPOSITION_ENERGY_RELEASED * rate / heat_scale;
            scratch.fire = rate * 1.5;
        }

        if energy_released > 0.0 {
            apply_released_energy(
                mixture,
                atmosphere,
                old_heat_capacity,
                temperature,
                energy_released,
            );
            mixture.set_temperature(mixture.temperature().max(DECOMPOSITION_TEMPERATURE_FLOOR));
        }

        if rate > MINIMUM_HEAT_CAPACITY {
            if let Some(location) = holder.as_deref_mut() {
                let exposed = EXPOSURE_TEMPERATURE_FLOOR.max(mixture.temperature());
                atmosphere.hotspot_expose(
                    location,
                    mixture,
                    exposed,
                    mixture.volume(),
                    Gas::ChlorineTrifluoride,
                );
            }
        }

        if scratch.fire != 0.0 {
            ReactionResult::REACTING | ReactionResult::STOP_REACTIONS
        } else {
            ReactionResult::NO_REACTION
        }
    }
}
