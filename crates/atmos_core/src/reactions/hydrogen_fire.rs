//! Hydrogen combustion: 2 H2 + O2 -> 2 H2O.

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{
    FIRE_HYDROGEN_ENERGY_RELEASED, FIRE_MINIMUM_TEMPERATURE_TO_EXIST, MINIMUM_HEAT_CAPACITY,
};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

use super::{
    apply_released_energy, burn_temperature_scale, fire_reaction_temperature, ReactionEffect,
    ReactionResult, ReactionScratch,
};

/// Fraction of the hydrogen that burns per pass at full temperature scale.
const BASE_BURN_RATE: f32 = 0.1;

/// Burns hydrogen with oxygen, faster the hotter it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydrogenFireReaction;

impl ReactionEffect for HydrogenFireReaction {
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

        let reaction_temperature = fire_reaction_temperature(mixture, holder.as_deref());
        let temperature_scale = burn_temperature_scale(reaction_temperature);

        if temperature_scale > 0.0 {
            let initial_oxygen = mixture.get_moles(Gas::Oxygen);
            let initial_hydrogen = mixture.get_moles(Gas::Hydrogen);

            // Two hydrogen per oxygen.
            let burn_rate = (initial_hydrogen * temperature_scale * BASE_BURN_RATE)
                .min(initial_oxygen * 2.0);

            if burn_rate > MINIMUM_HEAT_CAPACITY {
                let oxygen_used = burn_rate * 0.5;

                mixture.set_moles(Gas::Hydrogen, initial_hydrogen - burn_rate);
                mixture.set_moles(Gas::Oxygen, initial_oxygen - oxygen_used);
                mixture.adjust_moles(Gas::WaterVapor, burn_rate);

                energy_released = FIRE_HYDROGEN_ENERGY_RELEASED * burn_rate / heat_scale;
                scratch.fire = burn_rate + oxygen_used;
            }
        }

        if energy_released > 0.0 {
            apply_released_energy(
                mixture,
                atmosphere,
                old_heat_capacity,
                temperature,
                energy_released,
            );
        }

        if let Some(location) = holder.as_deref_mut() {
            let temperature = mixture.temperature();
            if temperature > FIRE_MINIMUM_TEMPERATURE_TO_EXIST {
                atmosphere.hotspot_expose(
                    location,
                    mixture,
                    temperature,
                    mixture.volume(),
                    Gas::Hydrogen,
                );
            }
        }

        if scratch.fire != 0.0 {
            ReactionResult::REACTING
        } else {
            ReactionResult::NO_REACTION
        }
    }
}
