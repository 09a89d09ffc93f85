//! Gas generator profiles.

use serde::{Deserialize, Serialize};

use crate::error::{AtmosError, Result};
use crate::gas::Gas;

use super::parse_ron;

/// Tuning for one kind of gas generator.
///
/// Every field has a default, so a profile only lists what it changes.
///
/// # Example RON
///
/// ```ron
/// GasGeneratorConfig(
///     id: "hydrogen_generator",
///     primary_fuel: Hydrogen,
///     primary_ratio: 2.0,
///     secondary_ratio: 1.0,
///     waste_primary: WaterVapor,
///     waste_primary_ratio: 1.0,
///     waste_secondary_ratio: 0.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasGeneratorConfig {
    /// Profile identifier.
    pub id: String,
    /// Inlet node name.
    pub inlet: String,
    /// Optimal primary-to-secondary fuel ratio.
    pub optimal_input_ratio: f32,
    /// Below this, efficiency drops sharply (K).
    pub minimum_temperature: f32,
    /// Peak efficiency temperature (K).
    pub optimal_temperature: f32,
    /// Above this, efficiency falls off (K).
    pub maximum_temperature: f32,
    /// Main fuel, e.g. methane.
    pub primary_fuel: Gas,
    /// Oxidiser, e.g. oxygen.
    pub secondary_fuel: Gas,
    /// Moles of primary fuel per combustion cycle.
    pub primary_ratio: f32,
    /// Moles of oxidiser per combustion cycle.
    pub secondary_ratio: f32,
    /// First combustion product.
    pub waste_primary: Gas,
    /// Second combustion product.
    pub waste_secondary: Gas,
    /// Moles of first product per mole of fuel burned.
    pub waste_primary_ratio: f32,
    /// Moles of second product per mole of fuel burned.
    pub waste_secondary_ratio: f32,
    /// Chamber pressure at which the intake pump stops (kPa).
    pub max_internal_pressure: f32,
    /// Chamber volume (L).
    pub internal_volume: f32,
    /// Intake pump limit (mol/s).
    pub max_inlet_flow_rate: f32,
    /// Fuel burn at full output (mol/s).
    pub max_fuel_consumption_rate: f32,
    /// Output cap (W).
    pub max_power_output: f32,
    /// Flat efficiency scalar in `[0, 1]`.
    pub fuel_efficiency: f32,
    /// Share of burned fuel that escapes unburned.
    pub fuel_slip_rate: f32,
}

impl Default for GasGeneratorConfig {
    fn default() -> Self {
        Self {
            id: "methane_generator".to_string(),
            inlet: "inlet".to_string(),
            optimal_input_ratio: 0.8,
            minimum_temperature: 373.15,
            optimal_temperature: 573.15,
            maximum_temperature: 1273.15,
            primary_fuel: Gas::Methane,
            secondary_fuel: Gas::Oxygen,
            primary_ratio: 1.0,
            secondary_ratio: 2.0,
            waste_primary: Gas::WaterVapor,
            waste_secondary: Gas::CarbonDioxide,
            waste_primary_ratio: 2.0,
            waste_secondary_ratio: 1.0,
            max_internal_pressure: 150.0,
            internal_volume: 200.0,
            max_inlet_flow_rate: 2.0,
            max_fuel_consumption_rate: 10.0,
            max_power_output: 50_000.0,
            fuel_efficiency: 0.9,
            fuel_slip_rate: 0.1,
        }
    }
}

impl GasGeneratorConfig {
    /// Watts produced per mole of fuel at full efficiency.
    #[must_use]
    pub fn power_per_mole(&self) -> f32 {
        self.max_power_output / self.max_fuel_consumption_rate
    }

    /// Parse a RON list of profiles.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::DataParseError`] if the text does not parse and
    /// [`AtmosError::InvalidData`] if a profile fails [`validate`](Self::validate).
    pub fn list_from_ron_str(source_name: &str, text: &str) -> Result<Vec<Self>> {
        let configs: Vec<Self> = parse_ron(source_name, text)?;
        for config in &configs {
            config.validate()?;
        }
        Ok(configs)
    }

    /// Check the profile can run.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosError::InvalidData`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| AtmosError::InvalidData {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.primary_fuel == self.secondary_fuel {
            return Err(invalid("primary and secondary fuel are the same gas"));
        }
        if !(self.minimum_temperature < self.optimal_temperature
            && self.optimal_temperature < self.maximum_temperature)
        {
            return Err(invalid(
                "temperatures must satisfy minimum < optimal < maximum",
            ));
        }
        let positive = [
            self.optimal_input_ratio,
            self.max_internal_pressure,
            self.internal_volume,
            self.max_fuel_consumption_rate,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(invalid(
                "ratio, pressure, volume and consumption limits must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.fuel_efficiency) {
            return Err(invalid("fuel efficiency must be within [0, 1]"));
        }
        Ok(())
    }
}
