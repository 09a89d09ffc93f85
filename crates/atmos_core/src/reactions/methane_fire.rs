//! Methane combustion: CH4 + 2 O2 -> CO2 + 2 H2O.

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{
    FIRE_METHANE_ENERGY_RELEASED, FIRE_MINIMUM_TEMPERATURE_TO_EXIST, MINIMUM_HEAT_CAPACITY,
};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

use super::{
    apply_released_energy, burn_temperature_scale, fire_reaction_temperature, ReactionEffect,
    ReactionResult, ReactionScratch,
};

const BASE_BURN_RATE: f32 = 0.1;

/// Burns methane with oxygen.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethaneFireReaction;

impl ReactionEffect for MethaneFireReaction {
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
            let initial_methane = mixture.get_moles(Gas::Methane);

            // Each methane needs two oxygen.
            let burn_rate = (initial_methane * temperature_scale * BASE_BURN_RATE)
                .min(initial_oxygen * 0.5);

            if burn_rate > MINIMUM_HEAT_CAPACITY {
                let oxygen_used = burn_rate * 2.0;

                mixture.set_moles(Gas::Methane, initial_methane - burn_rate);
                mixture.set_moles(Gas::Oxygen, initial_oxygen - oxygen_used);
                mixture.adjust_moles(Gas::CarbonDioxide, burn_rate);
                mixture.adjust_moles(Gas::WaterVapor, burn_rate * 2.0);

                energy_released = FIRE_METHANE_ENERGY_RELEASED * burn_rate / heat_scale;
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
                    Gas::Methane,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::GridId;
    use crate::constants::PLASMA_UPPER_TEMPERATURE;
    use crate::tile::{Hotspot, TileIndex};

    #[test]
    fn test_stoichiometry() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut mix = GasMixture::new(2500.0)
            .with_temperature(PLASMA_UPPER_TEMPERATURE + 1.0)
            .with_moles(Gas::Methane, 10.0)
            .with_moles(Gas::Oxygen, 40.0);

        let result = MethaneFireReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        assert!(result.is_reacting());
        assert!((mix.get_moles(Gas::Methane) - 9.0).abs() < 1e-4);
        assert!((mix.get_moles(Gas::Oxygen) - 38.0).abs() < 1e-4);
        assert!((mix.get_moles(Gas::CarbonDioxide) - 1.0).abs() < 1e-4);
        assert!((mix.get_moles(Gas::WaterVapor) - 2.0).abs() < 1e-4);
        assert!((scratch.fire - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_oxygen_starved_burn_capped() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut mix = GasMixture::new(2500.0)
            .with_temperature(PLASMA_UPPER_TEMPERATURE + 1.0)
            .with_moles(Gas::Methane, 100.0)
            .with_moles(Gas::Oxygen, 2.0);

        MethaneFireReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        assert!(mix.get_moles(Gas::Oxygen).abs() < 1e-4);
        assert!((mix.get_moles(Gas::Methane) - 99.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_oxygen_no_reaction() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut mix = GasMixture::new(2500.0)
            .with_temperature(PLASMA_UPPER_TEMPERATURE + 1.0)
            .with_moles(Gas::Methane, 100.0);
        let before = mix.clone();

        let result = MethaneFireReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        assert_eq!(result, ReactionResult::NO_REACTION);
        assert_eq!(mix, before);
    }

    #[test]
    fn test_burning_tile_ignites_hotspot() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut hotspot = Hotspot::default();
        let mut location = TileLocation {
            grid: GridId(4),
            index: TileIndex::new(0, 0),
            hotspot: &mut hotspot,
        };
        let mut mix = GasMixture::new(2500.0)
            .with_temperature(1000.0)
            .with_moles(Gas::Methane, 30.0)
            .with_moles(Gas::Oxygen, 60.0);

        MethaneFireReaction.react(&mut mix, Some(&mut location), &mut atmos, 8.0, &mut scratch);

        assert!(hotspot.valid);
        assert_eq!(hotspot.fuel, Some(Gas::Methane));
        assert!(atmos.exposures()[0].ignited);
    }
}
