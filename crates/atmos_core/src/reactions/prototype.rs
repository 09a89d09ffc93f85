//! Data-driven reaction prototypes and the pass that runs them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::atmosphere::AtmosphereSystem;
use crate::constants::{
    FIRE_MINIMUM_TEMPERATURE_TO_EXIST, PLASMA_MINIMUM_BURN_TEMPERATURE, TCMB, TMAX,
};
use crate::data::parse_ron;
use crate::error::{AtmosError, Result};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::TileLocation;

use super::{GasReactionEffect, ReactionEffect, ReactionResult, ReactionScratch};

/// A gas reaction: gating thresholds plus the effects to run.
///
/// # Example RON
///
/// ```ron
/// GasReactionPrototype(
///     id: "HydrogenFire",
///     priority: 0,
///     minimum_temperature: 373.15,
///     minimum_requirements: { Oxygen: 0.01, Hydrogen: 0.01 },
///     effects: [HydrogenFire],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasReactionPrototype {
    /// Unique identifier.
    pub id: String,

    /// Higher priorities run first.
    #[serde(default)]
    pub priority: i32,

    /// Mixture temperature must be at least this.
    #[serde(default = "default_minimum_temperature")]
    pub minimum_temperature: f32,

    /// Mixture temperature must be at most this.
    #[serde(default = "default_maximum_temperature")]
    pub maximum_temperature: f32,

    /// Mixture thermal energy must be at least this.
    #[serde(default)]
    pub minimum_energy: f32,

    /// Moles of each listed gas the mixture must hold. Unlisted gases have
    /// no requirement.
    #[serde(default)]
    pub minimum_requirements: BTreeMap<Gas, f32>,

    /// Effects run in order when every threshold holds.
    pub effects: Vec<GasReactionEffect>,
}

fn default_minimum_temperature() -> f32 {
    TCMB
}

fn default_maximum_temperature() -> f32 {
    TMAX
}

impl GasReactionPrototype {
    fn new(id: &str, priority: i32, minimum_temperature: f32, effect: GasReactionEffect) -> Self {
        Self {
            id: id.to_string(),
            priority,
            minimum_temperature,
            maximum_temperature: TMAX,
            minimum_energy: 0.0,
            minimum_requirements: BTreeMap::new(),
            effects: vec![effect],
        }
    }

    fn requires(mut self, gas: Gas, moles: f32) -> Self {
        self.minimum_requirements.insert(gas, moles);
        self
    }

    /// Whether `mixture` clears every threshold of this prototype.
    #[must_use]
    pub fn can_react(&self, mixture: &GasMixture, atmosphere: &AtmosphereSystem) -> bool {
        let temperature = mixture.temperature();
        if temperature < self.minimum_temperature || temperature > self.maximum_temperature {
            return false;
        }
        if atmosphere.thermal_energy(mixture) < self.minimum_energy {
            return false;
        }
        self.minimum_requirements
            .iter()
            .all(|(&gas, &moles)| mixture.get_moles(gas) >= moles)
    }

    /// Run every effect, OR-ing their results.
    pub fn react(
        &self,
        mixture: &mut GasMixture,
        mut holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
        scratch: &mut ReactionScratch,
    ) -> ReactionResult {
        let heat_scale = atmosphere.heat_scale();
        let mut result = ReactionResult::NO_REACTION;
        for effect in &self.effects {
            result |= effect.react(mixture, holder.as_deref_mut(), atmosphere, heat_scale, scratch);
        }
        result
    }

    /// Check the prototype for values no mixture could ever satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::InvalidData`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| AtmosError::InvalidData {
            id: self.id.clone(),
            reason,
        };

        if self.effects.is_empty() {
            return Err(invalid("no effects".to_string()));
        }
        if self.minimum_temperature > self.maximum_temperature {
            return Err(invalid(format!(
                "minimum temperature {} above maximum {}",
                self.minimum_temperature, self.maximum_temperature
            )));
        }
        if let Some((gas, moles)) = self
            .minimum_requirements
            .iter()
            .find(|(_, moles)| !moles.is_finite() || **moles < 0.0)
        {
            return Err(invalid(format!("requirement for {gas} is {moles}")));
        }
        Ok(())
    }
}

/// Reaction prototypes in run order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionPipeline {
    prototypes: Vec<GasReactionPrototype>,
}

impl Default for ReactionPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl ReactionPipeline {
    /// Build a pipeline, sorting by priority (highest first, then by id).
    #[must_use]
    pub fn new(mut prototypes: Vec<GasReactionPrototype>) -> Self {
        prototypes.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        Self { prototypes }
    }

    /// The built-in reaction set.
    #[must_use]
    pub fn standard() -> Self {
        use GasReactionEffect as Effect;

        Self::new(vec![
            GasReactionPrototype::new(
                "ChlorineTrifluorideDecomposition",
                10,
                PLASMA_MINIMUM_BURN_TEMPERATURE,
                Effect::ChlorineTrifluoride,
            )
            .requires(Gas::ChlorineTrifluoride, 0.01),
            GasReactionPrototype::new(
                "HydrogenFire",
                0,
                FIRE_MINIMUM_TEMPERATURE_TO_EXIST,
                Effect::HydrogenFire,
            )
            .requires(Gas::Oxygen, 0.01)
            .requires(Gas::Hydrogen, 0.01),
            GasReactionPrototype::new(
                "MethaneFire",
                -1,
                FIRE_MINIMUM_TEMPERATURE_TO_EXIST,
                Effect::MethaneFire,
            )
            .requires(Gas::Oxygen, 0.01)
            .requires(Gas::Methane, 0.01),
            GasReactionPrototype::new("MethaneProduction", -5, TCMB, Effect::MethaneProduction)
                .requires(Gas::CarbonDioxide, 0.01)
                .requires(Gas::Hydrogen, 0.04),
            GasReactionPrototype::new(
                "ChlorineFluorideProduction",
                -10,
                TCMB,
                Effect::ChlorineFluorideProduction,
            )
            .requires(Gas::Chlorine, 0.01)
            .requires(Gas::Fluorine, 0.03),
        ])
    }

    /// Parse a RON list of prototypes.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::DataParseError`] if the text does not parse and
    /// [`AtmosError::InvalidData`] if a prototype fails validation or an id
    /// repeats.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let prototypes: Vec<GasReactionPrototype> = parse_ron(source_name, text)?;

        let mut seen = std::collections::BTreeSet::new();
        for prototype in &prototypes {
            prototype.validate()?;
            if !seen.insert(prototype.id.as_str()) {
                return Err(AtmosError::InvalidData {
                    id: prototype.id.clone(),
                    reason: "duplicate reaction id".to_string(),
                });
            }
        }

        Ok(Self::new(prototypes))
    }

    /// Prototypes in run order.
    #[must_use]
    pub fn prototypes(&self) -> &[GasReactionPrototype] {
        &self.prototypes
    }

    /// Run one reaction pass over `mixture`.
    ///
    /// Each prototype whose thresholds hold runs its effects; its combined
    /// result becomes the pass result. The pass ends early after a
    /// prototype reports [`ReactionResult::STOP_REACTIONS`].
    pub fn react(
        &self,
        mixture: &mut GasMixture,
        mut holder: Option<&mut TileLocation<'_>>,
        atmosphere: &mut AtmosphereSystem,
    ) -> ReactionResult {
        let mut scratch = ReactionScratch::default();
        let mut result = ReactionResult::NO_REACTION;

        for prototype in &self.prototypes {
            if !prototype.can_react(mixture, atmosphere) {
                continue;
            }

            result = prototype.react(mixture, holder.as_deref_mut(), atmosphere, &mut scratch);

            if result.stops_reactions() {
                break;
            }
        }

        result
    }
}
