//! Gas recycling recipes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::{ONE_ATMOSPHERE, T20C};
use crate::error::{AtmosError, Result};
use crate::gas::Gas;

use super::parse_ron;

/// One gas conversion a recycler can perform.
///
/// # Example RON
///
/// ```ron
/// GasRecyclingRecipe(
///     id: "CarbonDioxideToOxygen",
///     input_gas: CarbonDioxide,
///     output_gas: Oxygen,
///     minimum_temperature: 573.15,
///     scrubbed_reagents: { "Carbon": 0.5 },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasRecyclingRecipe {
    /// Unique identifier.
    pub id: String,

    /// Gas consumed.
    pub input_gas: Gas,

    /// Gas produced.
    pub output_gas: Gas,

    /// Moles of output per mole of input.
    #[serde(default = "default_conversion_ratio")]
    pub conversion_ratio: f32,

    /// Inlet temperature needed, in Kelvin.
    #[serde(default = "default_minimum_temperature")]
    pub minimum_temperature: f32,

    /// Inlet pressure needed, in kPa.
    #[serde(default = "default_minimum_pressure")]
    pub minimum_pressure: f32,

    /// Reagent yield per mole of input, by reagent id.
    #[serde(default)]
    pub scrubbed_reagents: BTreeMap<String, f32>,

    /// Whether the recipe is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

const fn default_conversion_ratio() -> f32 {
    1.0
}

const fn default_minimum_temperature() -> f32 {
    T20C
}

const fn default_minimum_pressure() -> f32 {
    ONE_ATMOSPHERE
}

const fn default_true() -> bool {
    true
}

impl GasRecyclingRecipe {
    /// Whether an inlet at this temperature and pressure meets the thresholds.
    #[must_use]
    pub fn conditions_met(&self, temperature: f32, pressure: f32) -> bool {
        temperature >= self.minimum_temperature && pressure >= self.minimum_pressure
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| AtmosError::InvalidData {
            id: self.id.clone(),
            reason,
        };

        if !self.conversion_ratio.is_finite() || self.conversion_ratio < 0.0 {
            return Err(invalid(format!(
                "conversion ratio {} must be non-negative",
                self.conversion_ratio
            )));
        }
        if let Some((reagent, ratio)) = self
            .scrubbed_reagents
            .iter()
            .find(|(_, ratio)| !ratio.is_finite() || **ratio < 0.0)
        {
            return Err(invalid(format!("reagent {reagent} has yield {ratio}")));
        }
        Ok(())
    }
}

/// Recipes in definition order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipeRegistry {
    recipes: Vec<GasRecyclingRecipe>,
}

impl RecipeRegistry {
    /// Build a registry from recipes.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::InvalidData`] for a bad recipe or a repeated id.
    pub fn new(recipes: Vec<GasRecyclingRecipe>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for recipe in &recipes {
            recipe.validate()?;
            if !seen.insert(recipe.id.as_str()) {
                return Err(AtmosError::InvalidData {
                    id: recipe.id.clone(),
                    reason: "duplicate recipe id".to_string(),
                });
            }
        }
        Ok(Self { recipes })
    }

    /// Parse a RON list of recipes.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::DataParseError`] if the text does not parse, or
    /// any error from [`RecipeRegistry::new`].
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        Self::new(parse_ron(source_name, text)?)
    }

    /// Look up a recipe.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GasRecyclingRecipe> {
        self.recipes.iter().find(|recipe| recipe.id == id)
    }

    /// All recipes in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &GasRecyclingRecipe> {
        self.recipes.iter()
    }

    /// Number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Recipes a device should consider.
    ///
    /// With an empty `ids` list, every enabled recipe. Otherwise the listed
    /// recipes in list order, enabled or not; unknown ids are skipped.
    #[must_use]
    pub fn applicable(&self, ids: &[String]) -> Vec<&GasRecyclingRecipe> {
        if ids.is_empty() {
            return self.recipes.iter().filter(|recipe| recipe.enabled).collect();
        }

        ids.iter()
            .filter_map(|id| {
                let recipe = self.get(id);
                if recipe.is_none() {
                    tracing::warn!(recipe = %id, "Unknown gas recycling recipe");
                }
                recipe
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPES: &str = r#"[
        GasRecyclingRecipe(
            id: "CarbonDioxideToOxygen",
            input_gas: CarbonDioxide,
            output_gas: Oxygen,
            minimum_temperature: 573.15,
            scrubbed_reagents: { "Carbon": 0.5 },
        ),
        GasRecyclingRecipe(
            id: "AmmoniaToNitrogen",
            input_gas: Ammonia,
            output_gas: Nitrogen,
            conversion_ratio: 0.5,
            enabled: false,
        ),
    ]"#;

    #[test]
    fn test_defaults_applied() {
        let registry = RecipeRegistry::from_ron_str("recipes", RECIPES).unwrap();
        let recipe = registry.get("CarbonDioxideToOxygen").unwrap();
        assert_eq!(recipe.conversion_ratio, 1.0);
        assert_eq!(recipe.minimum_pressure, ONE_ATMOSPHERE);
        assert!(recipe.enabled);
        assert_eq!(recipe.scrubbed_reagents.get("Carbon"), Some(&0.5));
    }

    #[test]
    fn test_applicable_recipes() {
        let registry = RecipeRegistry::from_ron_str("recipes", RECIPES).unwrap();

        let all = registry.applicable(&[]);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "CarbonDioxideToOxygen");

        let listed = registry.applicable(&["AmmoniaToNitrogen".to_string(), "Nope".to_string()]);
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].enabled);
    }

    #[test]
    fn test_conditions_met() {
        let registry = RecipeRegistry::from_ron_str("recipes", RECIPES).unwrap();
        let recipe = registry.get("CarbonDioxideToOxygen").unwrap();
        assert!(recipe.conditions_met(600.0, 200.0));
        assert!(!recipe.conditions_met(500.0, 200.0));
        assert!(!recipe.conditions_met(600.0, 50.0));
    }

    #[test]
    fn test_rejects_negative_yield_and_duplicates() {
        let negative = r#"[GasRecyclingRecipe(
            id: "Bad",
            input_gas: Plasma,
            output_gas: Tritium,
            scrubbed_reagents: { "Plasma": -1.0 },
        )]"#;
        assert!(matches!(
            RecipeRegistry::from_ron_str("negative", negative),
            Err(AtmosError::InvalidData { .. })
        ));

        let duplicate = r#"[
            GasRecyclingRecipe(id: "A", input_gas: Plasma, output_gas: Tritium),
            GasRecyclingRecipe(id: "A", input_gas: Oxygen, output_gas: Nitrogen),
        ]"#;
        assert!(matches!(
            RecipeRegistry::from_ron_str("duplicate", duplicate),
            Err(AtmosError::InvalidData { .. })
        ));
    }
}
