//! Sabatier process: CO2 + 4 H2 -> CH4 + 2 H2O.

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{
    FIRE_METHANE_ENERGY_RELEASED, GAS_MIN_MOLES, SABATIER_CONVERSION_RATE,
    SABATIER_MINIMUM_PRESSURE,
};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

use super::{apply_released_energy, ReactionEffect, ReactionResult, ReactionScratch};

/// Share of methane combustion energy the Sabatier process gives off.
const EXOTHERMIC_FRACTION: f32 = 0.02;

/// Makes methane from carbon dioxide and hydrogen under pressure.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethaneProductionReaction;

impl ReactionEffect for MethaneProductionReaction {
    fn react(
        &self,
        mixture: &mut GasMixture,
        _holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
        heat_scale: f32,
        _scratch: &mut ReactionScratch,
    ) -> ReactionResult {
        let old_heat_capacity = atmosphere.heat_capacity(mixture, true);
        let temperature = mixture.temperature();

        if mixture.pressure() < SABATIER_MINIMUM_PRESSURE {
            return ReactionResult::NO_REACTION;
        }

        let carbon_dioxide = mixture.get_moles(Gas::CarbonDioxide);
        let hydrogen = mixture.get_moles(Gas::Hydrogen);

        let limiting = carbon_dioxide.min(hydrogen / 4.0);
        let extent = limiting / SABATIER_CONVERSION_RATE;

        if extent <= GAS_MIN_MOLES {
            return ReactionResult::NO_REACTION;
        }

        mixture.adjust_moles(Gas::CarbonDioxide, -extent);
        mixture.adjust_moles(Gas::Hydrogen, -extent * 4.0);
        mixture.adjust_moles(Gas::Methane, extent);
        mixture.adjust_moles(Gas::WaterVapor, extent * 2.0);

        let energy_released = FIRE_METHANE_ENERGY_RELEASED * extent * EXOTHERMIC_FRACTION / heat_scale;
        if energy_released > 0.0 {
            apply_released_energy(
                mixture,
                atmosphere,
                old_heat_capacity,
                temperature,
                energy_released,
            );
        }

        ReactionResult::REACTING
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ONE_ATMOSPHERE, R};

    /// A 100 L mixture at the given pressure, CO2:H2 = 1:4.
    fn feed(pressure: f32) -> GasMixture {
        let temperature = 400.0;
        let total = pressure * 100.0 / (R * temperature);
        GasMixture::new(100.0)
            .with_temperature(temperature)
            .with_moles(Gas::CarbonDioxide, total * 0.2)
            .with_moles(Gas::Hydrogen, total * 0.8)
    }

    #[test]
    fn test_low_pressure_no_reaction() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut mix = feed(ONE_ATMOSPHERE * 0.5);
        let before = mix.clone();

        let result =
            MethaneProductionReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        assert_eq!(result, ReactionResult::NO_REACTION);
        assert_eq!(mix, before);
    }

    #[test]
    fn test_converts_quarter_of_limiting_reagent() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut mix = GasMixture::new(100.0)
            .with_temperature(400.0)
            .with_moles(Gas::CarbonDioxide, 8.0)
            .with_moles(Gas::Hydrogen, 16.0);
        assert!(mix.pressure() > ONE_ATMOSPHERE);

        let result =
            MethaneProductionReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        // Hydrogen limits: 16 / 4 = 4, extent = 1.
        assert_eq!(result, ReactionResult::REACTING);
        assert!((mix.get_moles(Gas::CarbonDioxide) - 7.0).abs() < 1e-5);
        assert!((mix.get_moles(Gas::Hydrogen) - 12.0).abs() < 1e-5);
        assert!((mix.get_moles(Gas::Methane) - 1.0).abs() < 1e-5);
        assert!((mix.get_moles(Gas::WaterVapor) - 2.0).abs() < 1e-5);
        assert!(mix.temperature() > 400.0);
    }

    #[test]
    fn test_missing_hydrogen_no_reaction() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch::default();
        let mut mix = GasMixture::new(100.0)
            .with_temperature(400.0)
            .with_moles(Gas::CarbonDioxide, 50.0);

        let result =
            MethaneProductionReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        assert_eq!(result, ReactionResult::NO_REACTION);
        assert_eq!(mix.get_moles(Gas::CarbonDioxide), 50.0);
    }

    #[test]
    fn test_ignores_fire_scratch() {
        let mut atmos = AtmosphereSystem::default();
        let mut scratch = ReactionScratch { fire: 5.0 };
        let mut mix = feed(ONE_ATMOSPHERE * 3.0);

        let result =
            MethaneProductionReaction.react(&mut mix, None, &mut atmos, 8.0, &mut scratch);

        assert!(result.is_reacting());
        assert_eq!(scratch.fire, 5.0);
    }
}
