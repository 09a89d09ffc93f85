//! Gas generator.
//!
//! Fuel is pumped from the inlet pipe into a private chamber and burned a
//! fraction at a time. Output depends on how close the chamber is to the
//! optimal fuel ratio and temperature. Exhaust goes to the tile the
//! generator stands on and never back into the pipe.
//!
//! An update stops at the first stage that fails:
//!
//! 1. Power and enable gate.
//! 2. Intake pump.
//! 3. Fuel check.
//! 4. Combustion.
//! 5. Exhaust.

use serde::{Deserialize, Serialize};

use crate::components::{Appearance, EntityId, PowerSupplier};
use crate::constants::TCMB;
use crate::data::GasGeneratorConfig;
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::simulation::Entity;

use super::{ExamineLine, GasSimulationContext};

/// Species stripped from the chamber before burning, unless used as fuel.
const INCOMPATIBLE_GASES: [Gas; 6] = [
    Gas::Oxygen,
    Gas::Nitrogen,
    Gas::CarbonDioxide,
    Gas::Plasma,
    Gas::Tritium,
    Gas::WaterVapor,
];

const MINIMUM_PUMP_TRANSFER: f32 = 0.01;
const MINIMUM_TOTAL_FUEL: f32 = 0.5;
const BASE_CONSUMPTION_FRACTION: f32 = 0.05;
const POWER_BOOST: f32 = 1.2;
const COMPOSITION_SIGMA: f32 = 0.15;
const RICHNESS_DEAD_BAND: f32 = 0.05;
const EXHAUST_TEMPERATURE_SWING: f32 = 200.0;
const MINIMUM_EXHAUST_FUEL: f32 = 0.01;
const AMBIENCE_POWER_THRESHOLD: f32 = 100.0;

/// Where an update stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorStage {
    /// No power or switched off.
    Unpowered,
    /// No inlet pipe net to draw from.
    NoInlet,
    /// Less than half a mole of fuel in the chamber.
    InsufficientFuel,
    /// One of the two fuels is absent.
    MissingFuel,
    /// Fuel was burned.
    Running,
}

/// Result of one generator update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorOutput {
    /// Generator entity.
    pub entity: EntityId,
    /// Stage reached.
    pub stage: GeneratorStage,
    /// Watts offered to the network.
    pub power: f32,
    /// Moles of primary fuel burned.
    pub consumed: f32,
    /// Reported fuel use in mol/s.
    pub consumption_rate: f32,
    /// Combined efficiency.
    pub efficiency: f32,
}

/// Efficiency and trade-off multipliers for a chamber composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionEfficiency {
    /// Gaussian penalty around the optimal ratio, in `[0.4, 1]`.
    pub efficiency: f32,
    /// Power scale; above one when rich.
    pub power_multiplier: f32,
    /// Fuel use scale; above one when rich.
    pub fuel_multiplier: f32,
}

/// Generator state shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasGeneratorStatus {
    /// Watts offered this tick.
    pub power_output: f32,
    /// Output cap.
    pub max_power_output: f32,
    /// Combined efficiency.
    pub efficiency: f32,
    /// Composition efficiency from the last burn.
    pub composition_efficiency: f32,
    /// Temperature efficiency from the last burn.
    pub temperature_efficiency: f32,
    /// Fuel use in mol/s.
    pub consumption_rate: f32,
    /// Chamber temperature (K).
    pub fuel_temperature: f32,
    /// Chamber pressure (kPa).
    pub fuel_pressure: f32,
    /// Whether the generator has power.
    pub powered: bool,
}

/// Combustion generator component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasGenerator {
    /// Tuning.
    pub config: GasGeneratorConfig,
    /// Switched on.
    pub enabled: bool,
    /// Internal combustion chamber.
    pub chamber: GasMixture,
    /// Combined efficiency of the last burn.
    pub current_efficiency: f32,
    /// Fuel use in mol/s.
    pub current_consumption_rate: f32,
    /// Composition efficiency of the last burn.
    pub composition_efficiency: f32,
    /// Temperature efficiency of the last burn.
    pub temperature_efficiency: f32,
}

impl GasGenerator {
    /// A switched-on generator with an empty chamber.
    #[must_use]
    pub fn new(config: GasGeneratorConfig) -> Self {
        let chamber = GasMixture::new(config.internal_volume);
        Self {
            config,
            enabled: true,
            chamber,
            current_efficiency: 0.9,
            current_consumption_rate: 0.0,
            composition_efficiency: 1.0,
            temperature_efficiency: 1.0,
        }
    }

    /// Score a chamber composition against the optimal primary fuel fraction.
    ///
    /// Rich mixtures trade fuel economy for power, lean ones the reverse.
    #[must_use]
    pub fn composition_efficiency(&self, mixture: &GasMixture) -> CompositionEfficiency {
        let total = mixture.total_moles();
        if total < 0.01 {
            return CompositionEfficiency {
                efficiency: 0.5,
                power_multiplier: 0.8,
                fuel_multiplier: 1.0,
            };
        }

        let primary_fraction = mixture.get_moles(self.config.primary_fuel) / total;
        let richness = primary_fraction - self.config.optimal_input_ratio;

        let deviation = richness.abs();
        let efficiency = (-(deviation * deviation) / (2.0 * COMPOSITION_SIGMA * COMPOSITION_SIGMA))
            .exp()
            .clamp(0.4, 1.0);

        let (power_multiplier, fuel_multiplier) = if richness > RICHNESS_DEAD_BAND {
            let factor = (richness * 2.0).min(1.0);
            (1.0 + factor * 0.2, 1.0 + factor * 0.4)
        } else if richness < -RICHNESS_DEAD_BAND {
            let factor = (richness.abs() * 2.0).min(1.0);
            (1.0 - factor * 0.2, 1.0 - factor * 0.3)
        } else {
            (1.0, 1.0)
        };

        CompositionEfficiency {
            efficiency,
            power_multiplier,
            fuel_multiplier,
        }
    }

    /// Efficiency multiplier for a chamber temperature.
    ///
    /// Halves per 100 K below the minimum, ramps linearly up to the optimum,
    /// loses up to 20% towards the maximum and halves per 500 K beyond it.
    #[must_use]
    pub fn temperature_efficiency(&self, temperature: f32) -> f32 {
        let GasGeneratorConfig {
            minimum_temperature: min,
            optimal_temperature: optimal,
            maximum_temperature: max,
            ..
        } = self.config;

        if temperature < min {
            let cold = min - temperature;
            return 0.5_f32.powf(cold / 100.0).clamp(0.1, 1.0);
        }
        if temperature < optimal {
            let warm = (temperature - min) / (optimal - min);
            return (0.5 + 0.5 * warm).clamp(0.5, 1.0);
        }
        if temperature < max {
            let hot = (temperature - optimal) / (max - optimal);
            return (1.0 - hot * hot * 0.2).clamp(0.8, 1.0);
        }

        let extreme = temperature - max;
        (0.5_f32.powf(extreme / 500.0) * 0.8).clamp(0.2, 1.0)
    }

    /// UI state.
    #[must_use]
    pub fn status(&self, supplier: &PowerSupplier, powered: bool) -> GasGeneratorStatus {
        GasGeneratorStatus {
            power_output: supplier.max_supply,
            max_power_output: self.config.max_power_output,
            efficiency: self.current_efficiency,
            composition_efficiency: self.composition_efficiency,
            temperature_efficiency: self.temperature_efficiency,
            consumption_rate: self.current_consumption_rate,
            fuel_temperature: self.chamber.temperature(),
            fuel_pressure: self.chamber.pressure(),
            powered,
        }
    }

    /// Examine text: power drawn, efficiency and fuel use.
    #[must_use]
    pub fn examine(&self, supplier: &PowerSupplier) -> Vec<ExamineLine> {
        vec![
            ExamineLine::GeneratorPower(supplier.current_supply),
            ExamineLine::GeneratorEfficiency(self.current_efficiency),
            ExamineLine::GeneratorConsumption(self.current_consumption_rate),
        ]
    }

    fn stopped(&self, entity: EntityId, stage: GeneratorStage) -> GeneratorOutput {
        GeneratorOutput {
            entity,
            stage,
            power: 0.0,
            consumed: 0.0,
            consumption_rate: self.current_consumption_rate,
            efficiency: self.current_efficiency,
        }
    }
}

fn set_cosmetics(appearance: &mut Option<Appearance>, active: bool, ambience: bool) {
    if let Some(appearance) = appearance.as_mut() {
        appearance.active = active;
        appearance.ambience = ambience;
    }
}

/// Run one generator update on `entity`.
///
/// Returns `None` if the entity is not a generator with a power supplier.
pub fn gas_generator_update(
    entity: &mut Entity,
    ctx: &mut impl GasSimulationContext,
    dt: f32,
) -> Option<GeneratorOutput> {
    let Entity {
        id,
        transform,
        node_container,
        gas_generator,
        power_supplier,
        power_receiver,
        appearance,
        ..
    } = entity;
    let id = *id;
    let generator = gas_generator.as_mut()?;
    let supplier = power_supplier.as_mut()?;
    let powered = power_receiver.as_ref().map_or(true, |receiver| receiver.powered);
    let heat_scale = ctx.heat_scale();

    if !powered || !generator.enabled {
        supplier.max_supply = 0.0;
        generator.current_consumption_rate = 0.0;
        set_cosmetics(appearance, false, false);
        return Some(generator.stopped(id, GeneratorStage::Unpowered));
    }

    let inlet_net = node_container
        .as_ref()
        .and_then(|container| container.pipe_net(&generator.config.inlet));
    let Some(inlet) = (match inlet_net {
        Some(net) => ctx.pipe_net_air(net),
        None => None,
    }) else {
        supplier.max_supply = 0.0;
        set_cosmetics(appearance, false, false);
        return Some(generator.stopped(id, GeneratorStage::NoInlet));
    };

    // Intake pump, throttled as the chamber fills.
    let config = &generator.config;
    let pressure = generator.chamber.pressure();
    if pressure < config.max_internal_pressure {
        let flow = 1.0 - pressure / config.max_internal_pressure;
        let max_transfer = config.max_inlet_flow_rate * dt * flow;
        let available = inlet.total_moles().min(max_transfer);
        if available > MINIMUM_PUMP_TRANSFER {
            let transferred = inlet.remove(available);
            generator.chamber.merge(&transferred, heat_scale);
        }
    }

    let primary = config.primary_fuel;
    let secondary = config.secondary_fuel;
    let available_primary = generator.chamber.get_moles(primary);
    let available_secondary = generator.chamber.get_moles(secondary);

    if available_primary + available_secondary < MINIMUM_TOTAL_FUEL {
        supplier.max_supply = 0.0;
        generator.current_consumption_rate = 0.0;
        set_cosmetics(appearance, false, false);
        return Some(generator.stopped(id, GeneratorStage::InsufficientFuel));
    }

    if available_primary <= 0.0 || available_secondary <= 0.0 {
        generator.current_consumption_rate = 0.0;
        generator.current_efficiency = 0.0;
        supplier.max_supply = 0.0;
        set_cosmetics(appearance, false, false);
        return Some(generator.stopped(id, GeneratorStage::MissingFuel));
    }

    let mut stripped: Vec<(Gas, f32)> = Vec::new();
    for gas in INCOMPATIBLE_GASES {
        if gas == primary || gas == secondary {
            continue;
        }
        let moles = generator.chamber.get_moles(gas);
        if moles > 0.0 {
            stripped.push((gas, moles));
            generator.chamber.adjust_moles(gas, -moles);
        }
    }

    let normalized_ratio =
        (available_primary / available_secondary.max(0.01)) / config.optimal_input_ratio;
    let consumption_multiplier = if normalized_ratio > 1.0 {
        1.0 + (normalized_ratio - 1.0).min(1.0) * 0.5
    } else if normalized_ratio < 1.0 {
        1.0 - (1.0 - normalized_ratio) * 0.25
    } else {
        1.0
    };

    let consumed = (available_primary * BASE_CONSUMPTION_FRACTION * consumption_multiplier)
        .min(available_primary);
    let secondary_consumed = (available_secondary
        * BASE_CONSUMPTION_FRACTION
        * consumption_multiplier)
        .min(available_secondary);
    generator.chamber.adjust_moles(primary, -consumed);
    generator.chamber.adjust_moles(secondary, -secondary_consumed);

    let composition = generator.composition_efficiency(&generator.chamber);
    let temperature_efficiency = generator.temperature_efficiency(generator.chamber.temperature());
    let config = &generator.config;

    let efficiency =
        (config.fuel_efficiency * composition.efficiency * temperature_efficiency).clamp(0.0, 1.0);
    let power = (consumed
        * config.power_per_mole()
        * efficiency
        * composition.power_multiplier
        * POWER_BOOST)
        .min(config.max_power_output);
    let consumption_rate = consumed / dt * composition.fuel_multiplier;

    supplier.max_supply = power;

    // Exhaust runs hotter when lean and cooler when rich.
    let new_primary = generator.chamber.get_moles(primary);
    let new_secondary = generator.chamber.get_moles(secondary);
    let remaining = new_primary + new_secondary;
    let richness = if remaining > 0.0 {
        new_primary / remaining - config.optimal_input_ratio
    } else {
        0.0
    };
    let mut exhaust = GasMixture::default().with_temperature(
        (generator.chamber.temperature() - richness * EXHAUST_TEMPERATURE_SWING).max(TCMB),
    );

    if consumed > MINIMUM_EXHAUST_FUEL {
        if normalized_ratio > 1.0 {
            // Rich: incomplete combustion, more unburned fuel.
            let rich = (normalized_ratio - 1.0).min(1.0);
            let completion = 1.0 - rich * 0.4;
            exhaust.adjust_moles(
                config.waste_primary,
                consumed * config.waste_primary_ratio * completion,
            );
            exhaust.adjust_moles(
                config.waste_secondary,
                consumed * config.waste_secondary_ratio * completion,
            );
            exhaust.adjust_moles(primary, consumed * (config.fuel_slip_rate + rich * 0.3));
        } else if normalized_ratio < 1.0 {
            // Lean: complete combustion, surplus oxidiser passes through.
            let lean = 1.0 - normalized_ratio;
            exhaust.adjust_moles(config.waste_primary, consumed * config.waste_primary_ratio);
            exhaust.adjust_moles(config.waste_secondary, consumed * config.waste_secondary_ratio);
            let excess = secondary_consumed - consumed * config.secondary_ratio;
            exhaust.adjust_moles(secondary, excess.max(0.0));
            exhaust.adjust_moles(primary, consumed * config.fuel_slip_rate * (1.0 - lean * 0.5));
        } else {
            exhaust.adjust_moles(config.waste_primary, consumed * config.waste_primary_ratio);
            exhaust.adjust_moles(config.waste_secondary, consumed * config.waste_secondary_ratio);
            exhaust.adjust_moles(primary, consumed * config.fuel_slip_rate);
        }

        for &(gas, moles) in &stripped {
            exhaust.adjust_moles(gas, moles);
        }

        let tile = match transform.as_ref() {
            Some(transform) => ctx.tile_mixture(transform),
            None => None,
        };
        if let Some(tile) = tile {
            tile.merge(&exhaust, heat_scale);
        }
    }

    for &(gas, _) in &stripped {
        let left = generator.chamber.get_moles(gas);
        generator.chamber.adjust_moles(gas, -left);
    }

    generator.current_efficiency = efficiency;
    generator.current_consumption_rate = consumption_rate;
    generator.composition_efficiency = composition.efficiency;
    generator.temperature_efficiency = temperature_efficiency;

    set_cosmetics(
        appearance,
        consumed > 0.0,
        supplier.max_supply > AMBIENCE_POWER_THRESHOLD,
    );

    Some(GeneratorOutput {
        entity: id,
        stage: GeneratorStage::Running,
        power,
        consumed,
        consumption_rate,
        efficiency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{GridId, MapId, PowerReceiver, Transform};
    use crate::devices::testing::TestContext;
    use crate::nodes::{Node, NodeContainer, PipeNetId};
    use crate::tile::TileIndex;

    fn generator_entity() -> Entity {
        let mut container = NodeContainer::new().with_node("inlet", Node::pipe(200.0));
        container.nodes.get_mut("inlet").unwrap().net = Some(PipeNetId(0));
        Entity {
            transform: Some(Transform::anchored(MapId(1), GridId(1), TileIndex::new(0, 0))),
            node_container: Some(container),
            gas_generator: Some(GasGenerator::new(GasGeneratorConfig::default())),
            power_supplier: Some(PowerSupplier::default()),
            power_receiver: Some(PowerReceiver::default()),
            appearance: Some(Appearance::default()),
            ..Entity::new(1)
        }
    }

    fn load_chamber(entity: &mut Entity, chamber: GasMixture) {
        entity.gas_generator.as_mut().unwrap().chamber = chamber;
    }

    #[test]
    fn test_unpowered_zeroes_output() {
        let mut entity = generator_entity();
        entity.power_receiver = Some(PowerReceiver { powered: false });
        entity.power_supplier.as_mut().unwrap().max_supply = 500.0;
        entity.gas_generator.as_mut().unwrap().current_consumption_rate = 3.0;
        let mut ctx = TestContext::with_inlet(GasMixture::new(200.0));

        let output = gas_generator_update(&mut entity, &mut ctx, 1.0).unwrap();

        assert_eq!(output.stage, GeneratorStage::Unpowered);
        assert_eq!(entity.power_supplier.unwrap().max_supply, 0.0);
        assert_eq!(entity.gas_generator.unwrap().current_consumption_rate, 0.0);
        assert_eq!(entity.appearance.unwrap(), Appearance::default());
    }

    #[test]
    fn test_missing_inlet_net() {
        let mut entity = generator_entity();
        entity.node_container = Some(NodeContainer::new().with_node("inlet", Node::pipe(200.0)));
        let mut ctx = TestContext::with_inlet(GasMixture::new(200.0));

        let output = gas_generator_update(&mut entity, &mut ctx, 1.0).unwrap();

        assert_eq!(output.stage, GeneratorStage::NoInlet);
        assert_eq!(entity.power_supplier.unwrap().max_supply, 0.0);
    }

    #[test]
    fn test_zero_secondary_fuel_makes_no_power() {
        let mut entity = generator_entity();
        load_chamber(
            &mut entity,
            GasMixture::new(200.0)
                .with_temperature(573.15)
                .with_moles(Gas::Methane, 40.0),
        );
        let inlet = GasMixture::new(200.0)
            .with_temperature(573.15)
            .with_moles(Gas::Methane, 100.0);
        let mut ctx = TestContext::with_inlet(inlet);

        let output = gas_generator_update(&mut entity, &mut ctx, 1.0).unwrap();

        assert_eq!(output.stage, GeneratorStage::MissingFuel);
        assert_eq!(output.power, 0.0);
        let generator = entity.gas_generator.unwrap();
        assert_eq!(generator.current_consumption_rate, 0.0);
        assert_eq!(generator.current_efficiency, 0.0);
        assert_eq!(entity.power_supplier.unwrap().max_supply, 0.0);
    }

    #[test]
    fn test_too_little_fuel() {
        let mut entity = generator_entity();
        load_chamber(
            &mut entity,
            GasMixture::new(200.0)
                .with_moles(Gas::Methane, 0.2)
                .with_moles(Gas::Oxygen, 0.1),
        );
        let mut ctx = TestContext::with_inlet(GasMixture::new(200.0));

        let output = gas_generator_update(&mut entity, &mut ctx, 1.0).unwrap();

        assert_eq!(output.stage, GeneratorStage::InsufficientFuel);
        assert_eq!(output.consumed, 0.0);
    }

    #[test]
    fn test_optimal_chamber_runs_at_full_efficiency() {
        let mut entity = generator_entity();
        // 80% methane by mole fraction at the optimal temperature. The
        // chamber is above max pressure, so the pump stays idle.
        load_chamber(
            &mut entity,
            GasMixture::new(200.0)
                .with_temperature(573.15)
                .with_moles(Gas::Methane, 8.0)
                .with_moles(Gas::Oxygen, 2.0),
        );
        let mut ctx = TestContext::with_inlet(GasMixture::new(200.0));

        let output = gas_generator_update(&mut entity, &mut ctx, 1.0).unwrap();

        assert_eq!(output.stage, GeneratorStage::Running);
        let generator = entity.gas_generator.as_ref().unwrap();
        assert!((generator.composition_efficiency - 1.0).abs() < 1e-3);
        assert!((generator.temperature_efficiency - 1.0).abs() < 1e-6);

        // Methane:oxygen of 4 is rich by the normalised ratio: 1.5x burn.
        assert!((output.consumed - 0.6).abs() < 1e-4);
        let expected = output.consumed * generator.config.power_per_mole() * 0.9 * 1.2;
        assert!((output.power - expected).abs() < 1.0);
        assert!((entity.power_supplier.unwrap().max_supply - output.power).abs() < 1e-3);

        let appearance = entity.appearance.unwrap();
        assert!(appearance.active);
        assert!(appearance.ambience);
    }

    #[test]
    fn test_rich_exhaust_goes_to_tile() {
        let mut entity = generator_entity();
        load_chamber(
            &mut entity,
            GasMixture::new(200.0)
                .with_temperature(573.15)
                .with_moles(Gas::Methane, 8.0)
                .with_moles(Gas::Oxygen, 2.0)
                .with_moles(Gas::Nitrogen, 5.0),
        );
        let mut ctx = TestContext::with_inlet(GasMixture::new(200.0));

        gas_generator_update(&mut entity, &mut ctx, 1.0).unwrap();

        let tile = ctx.tile.as_ref().unwrap();
        // Fully rich: 60% completion, 40% slip on 0.6 mol burned.
        assert!((tile.get_moles(Gas::WaterVapor) - 0.72).abs() < 1e-3);
        assert!((tile.get_moles(Gas::CarbonDioxide) - 0.36).abs() < 1e-3);
        assert!((tile.get_moles(Gas::Methane) - 0.24).abs() < 1e-3);
        assert!((tile.get_moles(Gas::Nitrogen) - 5.0).abs() < 1e-3);

        let chamber = &entity.gas_generator.as_ref().unwrap().chamber;
        assert_eq!(chamber.get_moles(Gas::Nitrogen), 0.0);
        assert!(ctx.nets[&PipeNetId(0)].is_empty());
    }

    #[test]
    fn test_pump_is_flow_limited() {
        let mut entity = generator_entity();
        let inlet = GasMixture::new(200.0)
            .with_temperature(573.15)
            .with_moles(Gas::Methane, 80.0)
            .with_moles(Gas::Oxygen, 20.0);
        let mut ctx = TestContext::with_inlet(inlet);

        let output = gas_generator_update(&mut entity, &mut ctx, 0.5).unwrap();

        // Empty chamber: full flow of 2 mol/s for half a second.
        let inlet_left = ctx.nets[&PipeNetId(0)].total_moles();
        assert!((inlet_left - 99.0).abs() < 1e-3);
        assert_eq!(output.stage, GeneratorStage::Running);
    }

    #[test]
    fn test_temperature_efficiency_regimes() {
        let generator = GasGenerator::new(GasGeneratorConfig::default());
        assert!((generator.temperature_efficiency(273.15) - 0.5).abs() < 1e-4);
        assert!((generator.temperature_efficiency(473.15) - 0.75).abs() < 1e-4);
        assert!((generator.temperature_efficiency(573.15) - 1.0).abs() < 1e-6);
        assert!((generator.temperature_efficiency(1273.15) - 0.8).abs() < 1e-4);
        assert!((generator.temperature_efficiency(1773.15) - 0.4).abs() < 1e-4);
        assert!((generator.temperature_efficiency(10_000.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_composition_efficiency_lean_and_empty() {
        let generator = GasGenerator::new(GasGeneratorConfig::default());

        let empty = generator.composition_efficiency(&GasMixture::new(200.0));
        assert_eq!(empty.efficiency, 0.5);
        assert_eq!(empty.power_multiplier, 0.8);

        let lean = generator.composition_efficiency(
            &GasMixture::new(200.0)
                .with_moles(Gas::Methane, 3.0)
                .with_moles(Gas::Oxygen, 7.0),
        );
        assert_eq!(lean.efficiency, 0.4);
        assert!((lean.power_multiplier - 0.8).abs() < 1e-6);
        assert!((lean.fuel_multiplier - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_examine_reports_current_supply() {
        let generator = GasGenerator::new(GasGeneratorConfig::default());
        let supplier = PowerSupplier {
            max_supply: 900.0,
            current_supply: 750.0,
        };
        let lines = generator.examine(&supplier);
        assert_eq!(lines[0], ExamineLine::GeneratorPower(750.0));
        assert_eq!(lines[1], ExamineLine::GeneratorEfficiency(0.9));
    }
}
