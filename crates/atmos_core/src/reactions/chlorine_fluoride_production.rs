//! Chlorine trifluoride synthesis: Cl2 + 3 F2 -> 2 ClF3.

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{CLF3_PRODUCTION_RATE, FIRE_PLASMA_ENERGY_RELEASED, GAS_MIN_MOLES};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

use super::{apply_released_energy, ReactionEffect, ReactionResult, ReactionScratch};

/// Combines chlorine and fluorine into chlorine trifluoride.
///
/// Does nothing in a pass where a fire step already burned something, so
/// freshly decomposed ClF3 is not put straight back together.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChlorineFluorideProductionReaction;

impl ReactionEffect for ChlorineFluorideProductionReaction {
    fn react(
        &self,
        mixture: &mut GasMixture,
        _holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
        heat_scale: f32,
        scratch: &mut ReactionScratch,
    ) -> ReactionResult {
        if scratch.fire != 0.0 {
            return ReactionResult::NO_REACTION;
        }

        let old_heat_capacity = atmosphere.heat_capacity(mixture, true);
        let temperature = mixture.temperature();

        let chlorine = mixture.get_moles(Gas::Chlorine);
        let fluorine = mixture.get_moles(Gas::Fluorine);

        let limiting = chlorine.min(fluorine / 3.0);
        let extent = limiting / CLF3_PRODUCTION_RATE;

        if extent <= GAS_MIN_MOLES {
            return ReactionResult::NO_REACTION;
        }

        mixture.adjust_moles(Gas::Chlorine, -extent);
        mixture.adjust_moles(Gas::Fluorine, -extent * 3.0);
        mixture.adjust_moles(Gas::ChlorineTrifluoride, extent * 2.0);

        let energy_released = FIRE_PLASMA_ENERGY_RELEASED * extent * 0.8 / heat_scale;
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
