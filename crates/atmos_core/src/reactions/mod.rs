//! Gas reactions.
//!
//! Each reaction effect is a single step over one mixture: it reads the
//! mixture, converts some moles, releases energy and reports a
//! [`ReactionResult`]. Effects are grouped into data-driven
//! [`GasReactionPrototype`]s and run in priority order by a
//! [`ReactionPipeline`].
//!
//! Reactions within one pass talk to each other only through the
//! [`ReactionScratch`] record the pipeline hands to every step. Fire
//! reactions write the magnitude of what they burned there, and chlorine
//! fluoride production refuses to run after a fire in the same pass.

mod chlorine_fluoride_production;
mod chlorine_trifluoride;
mod hydrogen_fire;
mod methane_fire;
mod methane_production;
mod prototype;

use serde::{Deserialize, Serialize};

pub use chlorine_fluoride_production::ChlorineFluorideProductionReaction;
pub use chlorine_trifluoride::ChlorineTrifluorideReaction;
pub use hydrogen_fire::HydrogenFireReaction;
pub use methane_fire::MethaneFireReaction;
pub use methane_production::MethaneProductionReaction;
pub use prototype::{GasReactionPrototype, ReactionPipeline};

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{MINIMUM_HEAT_CAPACITY, PLASMA_MINIMUM_BURN_TEMPERATURE, PLASMA_UPPER_TEMPERATURE};
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

/// Outcome flags of a reaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReactionResult(u8);

impl ReactionResult {
    /// Nothing happened.
    pub const NO_REACTION: Self = Self(0);
    /// The reaction converted gas.
    pub const REACTING: Self = Self(1);
    /// No further reactions may run on this mixture this pass.
    pub const STOP_REACTIONS: Self = Self(2);

    /// Whether every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the reacting flag is set.
    #[must_use]
    pub const fn is_reacting(self) -> bool {
        self.contains(Self::REACTING)
    }

    /// Whether the stop flag is set.
    #[must_use]
    pub const fn stops_reactions(self) -> bool {
        self.contains(Self::STOP_REACTIONS)
    }

    /// Raw flag bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for ReactionResult {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ReactionResult {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Per-pass values shared between reaction steps on one mixture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReactionScratch {
    /// Moles burned plus oxidiser used by the last fire step this pass.
    pub fire: f32,
}

/// One reaction step.
pub trait ReactionEffect {
    /// Run the reaction on `mixture`.
    ///
    /// `holder` is the tile the mixture sits on, or `None` for pipe nets and
    /// device chambers. `heat_scale` divides released energy.
    fn react(
        &self,
        mixture: &mut GasMixture,
        holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
        heat_scale: f32,
        scratch: &mut ReactionScratch,
    ) -> ReactionResult;
}

/// Reaction effects that prototypes can name in data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GasReactionEffect {
    /// 2 H2 + O2 -> 2 H2O.
    HydrogenFire,
    /// CH4 + 2 O2 -> CO2 + 2 H2O.
    MethaneFire,
    /// CO2 + 4 H2 -> CH4 + 2 H2O.
    MethaneProduction,
    /// 2 ClF3 -> Cl2 + 3 F2.
    ChlorineTrifluoride,
    /// Cl2 + 3 F2 -> 2 ClF3.
    ChlorineFluorideProduction,
}

impl ReactionEffect for GasReactionEffect {
    fn react(
        &self,
        mixture: &mut GasMixture,
        holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
        heat_scale: f32,
        scratch: &mut ReactionScratch,
    ) -> ReactionResult {
        match self {
            Self::HydrogenFire => {
                HydrogenFireReaction.react(mixture, holder, atmosphere, heat_scale, scratch)
            }
            Self::MethaneFire => {
                MethaneFireReaction.react(mixture, holder, atmosphere, heat_scale, scratch)
            }
            Self::MethaneProduction => {
                MethaneProductionReaction.react(mixture, holder, atmosphere, heat_scale, scratch)
            }
            Self::ChlorineTrifluoride => {
                ChlorineTrifluorideReaction.react(mixture, holder, atmosphere, heat_scale, scratch)
            }
            Self::ChlorineFluorideProduction => ChlorineFluorideProductionReaction
                .react(mixture, holder, atmosphere, heat_scale, scratch),
        }
    }
}

/// Raise the mixture temperature by `energy` joules.
///
/// `old_capacity` and `old_temperature` are the values captured before the
/// moles changed. If the new heat capacity is at or below the floor the
/// temperature is left alone even though energy was released.
pub(crate) fn apply_released_energy(
    mixture: &mut GasMixture,
    atmosphere: &AtmosphereSystem,
    old_capacity: f32,
    old_temperature: f32,
    energy: f32,
) {
    let new_capacity = atmosphere.heat_capacity(mixture, true);
    if new_capacity > MINIMUM_HEAT_CAPACITY {
        mixture.set_temperature((old_temperature * old_capacity + energy) / new_capacity);
    }
}

/// Fraction of full burn rate at `temperature`, in `[0, 1]`.
///
/// Zero at or below [`PLASMA_MINIMUM_BURN_TEMPERATURE`], one above
/// [`PLASMA_UPPER_TEMPERATURE`], linear in between.
#[must_use]
pub fn burn_temperature_scale(temperature: f32) -> f32 {
    if temperature > PLASMA_UPPER_TEMPERATURE {
        1.0
    } else if temperature > PLASMA_MINIMUM_BURN_TEMPERATURE {
        (temperature - PLASMA_MINIMUM_BURN_TEMPERATURE)
            / (PLASMA_UPPER_TEMPERATURE - PLASMA_MINIMUM_BURN_TEMPERATURE)
    } else {
        0.0
    }
}

/// Temperature a fire reaction burns at: the tile hotspot's if one is lit.
pub(crate) fn fire_reaction_temperature(
    mixture: &GasMixture,
    holder: Option<&TileLocation<'_>>,
) -> f32 {
    holder
        .filter(|location| location.hotspot.valid)
        .map_or(mixture.temperature(), |location| location.hotspot.temperature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_flags() {
        let both = ReactionResult::REACTING | ReactionResult::STOP_REACTIONS;
        assert!(both.is_reacting());
        assert!(both.stops_reactions());
        assert!(!ReactionResult::NO_REACTION.is_reacting());
        assert!(ReactionResult::NO_REACTION.contains(ReactionResult::NO_REACTION));

        let mut acc = ReactionResult::NO_REACTION;
        acc |= ReactionResult::REACTING;
        assert_eq!(acc, ReactionResult::REACTING);
    }

    #[test]
    fn test_burn_scale_bounds() {
        assert_eq!(burn_temperature_scale(PLASMA_MINIMUM_BURN_TEMPERATURE), 0.0);
        assert_eq!(burn_temperature_scale(100.0), 0.0);
        assert_eq!(burn_temperature_scale(PLASMA_UPPER_TEMPERATURE + 1.0), 1.0);
        let mid = (PLASMA_MINIMUM_BURN_TEMPERATURE + PLASMA_UPPER_TEMPERATURE) / 2.0;
        assert!((burn_temperature_scale(mid) - 0.5).abs() < 1e-4);
    }
}
