//! Gas generator scenario runs.
//!
//! Builds a one-tile station with a single generator whose inlet net is
//! filled with a methane/oxygen mix, runs it for a number of ticks and
//! records what the generator did each tick.

use atmos_core::components::{GridId, MapId, Transform};
use atmos_core::data::GasGeneratorConfig;
use atmos_core::devices::{GasGeneratorStatus, GeneratorStage};
use atmos_core::gas::Gas;
use atmos_core::nodes::{Node, NodeContainer, NodeRef};
use atmos_core::simulation::{EntitySpawnParams, Simulation};
use atmos_core::tile::{GridAtmosphere, TileIndex};
use serde::Serialize;

use crate::Result;

/// Inlet net volume (L).
const INLET_VOLUME: f32 = 200.0;

/// What to run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorScenario {
    /// Generator tuning.
    pub config: GasGeneratorConfig,
    /// Ticks to run.
    pub ticks: u32,
    /// Seconds per tick.
    pub dt: f32,
    /// Methane in the inlet net (mol).
    pub methane: f32,
    /// Oxygen in the inlet net (mol).
    pub oxygen: f32,
    /// Inlet gas temperature (K).
    pub temperature: f32,
}

impl Default for GeneratorScenario {
    fn default() -> Self {
        Self {
            config: GasGeneratorConfig::default(),
            ticks: 20,
            dt: 0.5,
            methane: 40.0,
            oxygen: 50.0,
            temperature: 360.0,
        }
    }
}

/// One tick of a generator run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeneratorTick {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// How far the update got.
    pub stage: GeneratorStage,
    /// Power offered (W).
    pub power: f32,
    /// Combined efficiency.
    pub efficiency: f32,
    /// Fuel use (mol/s).
    pub consumption_rate: f32,
    /// Moles left in the inlet net.
    pub inlet_moles: f32,
}

/// Outcome of a generator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorReport {
    /// Profile that ran.
    pub profile: String,
    /// Per-tick rows.
    pub ticks: Vec<GeneratorTick>,
    /// Generator state after the last tick.
    pub status: GasGeneratorStatus,
    /// Carbon dioxide vented onto the tile (mol).
    pub exhaust_carbon_dioxide: f32,
    /// Water vapour vented onto the tile (mol).
    pub exhaust_water_vapor: f32,
}

impl GeneratorReport {
    /// Mean power over all ticks (W).
    #[must_use]
    pub fn mean_power(&self) -> f32 {
        if self.ticks.is_empty() {
            return 0.0;
        }
        self.ticks.iter().map(|tick| tick.power).sum::<f32>() / self.ticks.len() as f32
    }
}

/// Run a scenario.
///
/// # Errors
///
/// Returns an error if the generator cannot be queried after the run.
pub fn run_generator_scenario(scenario: &GeneratorScenario) -> Result<GeneratorReport> {
    let map = MapId(1);
    let grid_id = GridId(1);
    let tile = TileIndex::new(0, 0);

    let mut grid = GridAtmosphere::new(map);
    grid.fill_standard_air(1, 1);
    let baseline = grid
        .tiles
        .get(&tile)
        .and_then(|t| t.air.as_ref())
        .map_or((0.0, 0.0), |air| {
            (
                air.get_moles(Gas::CarbonDioxide),
                air.get_moles(Gas::WaterVapor),
            )
        });

    let mut sim = Simulation::default();
    sim.add_grid(grid_id, grid);

    let inlet_name = scenario.config.inlet.clone();
    let generator = sim.spawn_entity(EntitySpawnParams {
        transform: Some(Transform::anchored(map, grid_id, tile)),
        node_container: Some(
            NodeContainer::new().with_node(inlet_name.clone(), Node::pipe(INLET_VOLUME)),
        ),
        gas_generator: Some(scenario.config.clone()),
        ..Default::default()
    });
    let inlet = NodeRef::new(generator, inlet_name);

    if let Some(air) = sim.node_air_mut(&inlet) {
        air.set_temperature(scenario.temperature);
        air.set_moles(Gas::Methane, scenario.methane);
        air.set_moles(Gas::Oxygen, scenario.oxygen);
    }

    let mut ticks = Vec::with_capacity(scenario.ticks as usize);
    for _ in 0..scenario.ticks {
        let events = sim.tick(scenario.dt);
        let Some(output) = events
            .generator_outputs
            .iter()
            .find(|output| output.entity == generator)
        else {
            continue;
        };

        ticks.push(GeneratorTick {
            tick: sim.get_tick(),
            stage: output.stage,
            power: output.power,
            efficiency: output.efficiency,
            consumption_rate: output.consumption_rate,
            inlet_moles: sim.node_air(&inlet).map_or(0.0, |air| air.total_moles()),
        });
    }

    let status = sim.generator_status(generator)?;
    let (exhaust_carbon_dioxide, exhaust_water_vapor) =
        sim.tile_air(grid_id, tile).map_or((0.0, 0.0), |air| {
            (
                air.get_moles(Gas::CarbonDioxide) - baseline.0,
                air.get_moles(Gas::WaterVapor) - baseline.1,
            )
        });

    tracing::debug!(
        profile = %scenario.config.id,
        ticks = ticks.len(),
        "Generator scenario finished"
    );

    Ok(GeneratorReport {
        profile: scenario.config.id.clone(),
        ticks,
        status,
        exhaust_carbon_dioxide,
        exhaust_water_vapor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_makes_power() {
        let report = run_generator_scenario(&GeneratorScenario::default()).unwrap();

        assert_eq!(report.ticks.len(), 20);
        assert!(report.mean_power() > 0.0);
        assert!(report
            .ticks
            .iter()
            .any(|tick| tick.stage == GeneratorStage::Running));
        assert!(report.exhaust_carbon_dioxide > 0.0);
        assert!(report.exhaust_water_vapor > 0.0);
        assert!(report.status.powered);
    }

    #[test]
    fn test_no_fuel_makes_nothing() {
        let scenario = GeneratorScenario {
            methane: 0.0,
            oxygen: 0.0,
            ..GeneratorScenario::default()
        };
        let report = run_generator_scenario(&scenario).unwrap();

        assert_eq!(report.mean_power(), 0.0);
        assert!(report
            .ticks
            .iter()
            .all(|tick| tick.stage == GeneratorStage::InsufficientFuel));
    }

    #[test]
    fn test_report_serialises() {
        let scenario = GeneratorScenario {
            ticks: 2,
            ..GeneratorScenario::default()
        };
        let report = run_generator_scenario(&scenario).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["profile"], "methane_generator");
        assert_eq!(json["ticks"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["ticks"][0]["stage"], "Running");
    }
}
