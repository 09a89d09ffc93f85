//! Gas recycler.
//!
//! Gas flows passively from the inlet to the outlet pipe when the inlet is
//! at higher pressure. While any applicable recipe's temperature and
//! pressure thresholds hold at the inlet, each enabled recipe converts all
//! of its input gas in the flow, and scrubbed reagents land in the loaded
//! container.

use serde::{Deserialize, Serialize};

use crate::components::{Appearance, EntityId, ReagentContainer};
use crate::constants::{MAX_TRANSFER_RATE, ONE_ATMOSPHERE, PASSIVE_OVERPRESSURE_ATMOSPHERES};
use crate::data::{GasRecyclingRecipe, RecipeRegistry};
use crate::mixture::GasMixture;
use crate::simulation::Entity;

use super::{ExamineLine, GasSimulationContext};

/// Recycler component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasRecycler {
    /// Inlet node name.
    pub inlet: String,
    /// Outlet node name.
    pub outlet: String,
    /// Recipe ids to use. Empty means every enabled recipe.
    pub recipes: Vec<String>,
    /// Whether gas was converted on the last update.
    pub reacting: bool,
    /// Loaded reagent container.
    pub container: Option<ReagentContainer>,
}

impl Default for GasRecycler {
    fn default() -> Self {
        Self {
            inlet: "inlet".to_string(),
            outlet: "outlet".to_string(),
            recipes: Vec::new(),
            reacting: false,
            container: None,
        }
    }
}

/// Result of one recycler update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecyclerOutput {
    /// Recycler entity.
    pub entity: EntityId,
    /// Whether any gas was converted.
    pub reacting: bool,
    /// Moles moved to the outlet.
    pub transferred: f32,
}

impl GasRecycler {
    /// A recycler restricted to the given recipes.
    #[must_use]
    pub fn with_recipes(recipes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            recipes: recipes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Device left the atmosphere.
    pub fn disable(&mut self, appearance: Option<&mut Appearance>) {
        self.reacting = false;
        self.enable(appearance);
    }

    /// Device joined the atmosphere.
    pub fn enable(&self, appearance: Option<&mut Appearance>) {
        if let Some(appearance) = appearance {
            appearance.active = self.reacting;
        }
    }

    /// Examine text for a recycler whose inlet holds `inlet`.
    ///
    /// Nothing is shown for unanchored recyclers or without inlet gas.
    #[must_use]
    pub fn examine(
        &self,
        anchored: bool,
        inlet: Option<&GasMixture>,
        registry: &RecipeRegistry,
    ) -> Vec<ExamineLine> {
        let mut lines = Vec::new();
        let Some(inlet) = inlet.filter(|_| anchored) else {
            return lines;
        };

        lines.push(if self.container.is_some() {
            ExamineLine::RecyclerContainerLoaded
        } else {
            ExamineLine::RecyclerNoContainer
        });

        if self.reacting {
            lines.push(ExamineLine::RecyclerReacting);
            return lines;
        }

        let recipes = registry.applicable(&self.recipes);
        let can_react = recipes.iter().any(|recipe| {
            inlet.get_moles(recipe.input_gas) > 0.0
                && recipe.conditions_met(inlet.temperature(), inlet.pressure())
        });

        if let Some(first) = recipes.first().filter(|_| !can_react) {
            if inlet.pressure() < first.minimum_pressure {
                lines.push(ExamineLine::RecyclerLowPressure);
            }
            if inlet.temperature() < first.minimum_temperature {
                lines.push(ExamineLine::RecyclerLowTemperature);
            }
        }

        lines
    }
}

/// Litres per update moved from inlet to outlet.
///
/// Scales with the square root of the pressure difference and reaches
/// [`MAX_TRANSFER_RATE`] at 300 atmospheres. Zero when the outlet is at
/// higher pressure.
#[must_use]
pub fn passive_transfer_volume(inlet_pressure: f32, outlet_pressure: f32, speedup: f32) -> f32 {
    if inlet_pressure < outlet_pressure {
        return 0.0;
    }
    let alpha =
        MAX_TRANSFER_RATE * speedup / (PASSIVE_OVERPRESSURE_ATMOSPHERES * ONE_ATMOSPHERE).sqrt();
    alpha * (inlet_pressure - outlet_pressure).sqrt()
}

fn convert(
    removed: &mut GasMixture,
    recipe: &GasRecyclingRecipe,
    container: Option<&mut ReagentContainer>,
) -> bool {
    let input = removed.get_moles(recipe.input_gas);
    if input <= 0.0 {
        return false;
    }

    removed.adjust_moles(recipe.input_gas, -input);
    removed.adjust_moles(recipe.output_gas, input * recipe.conversion_ratio);

    if let Some(container) = container {
        for (reagent, ratio) in &recipe.scrubbed_reagents {
            let amount = input * ratio;
            if amount > 0.0 {
                container.add_reagent(reagent, amount);
            }
        }
    }
    true
}

/// Run one recycler update on `entity`.
///
/// Returns `None` if the entity is not a recycler.
pub fn gas_recycler_update(
    entity: &mut Entity,
    registry: &RecipeRegistry,
    ctx: &mut impl GasSimulationContext,
) -> Option<RecyclerOutput> {
    let Entity {
        id,
        node_container,
        gas_recycler,
        appearance,
        ..
    } = entity;
    let id = *id;
    let recycler = gas_recycler.as_mut()?;
    let heat_scale = ctx.heat_scale();
    let speedup = ctx.pump_speedup();

    let idle = |appearance: &mut Option<Appearance>| {
        if let Some(appearance) = appearance.as_mut() {
            appearance.ambience = false;
        }
    };

    let nets = node_container.as_ref().map(|container| {
        (
            container.pipe_net(&recycler.inlet),
            container.pipe_net(&recycler.outlet),
        )
    });
    let Some((Some(inlet_net), Some(outlet_net))) = nets else {
        idle(appearance);
        return Some(RecyclerOutput {
            entity: id,
            reacting: recycler.reacting,
            transferred: 0.0,
        });
    };

    let outlet_pressure = ctx.pipe_net_air(outlet_net).map(|air| air.pressure());
    let (Some(outlet_pressure), Some(inlet)) = (outlet_pressure, ctx.pipe_net_air(inlet_net))
    else {
        idle(appearance);
        return Some(RecyclerOutput {
            entity: id,
            reacting: recycler.reacting,
            transferred: 0.0,
        });
    };

    let recipes = registry.applicable(&recycler.recipes);
    let can_react = recipes.iter().any(|recipe| {
        recipe.enabled && recipe.conditions_met(inlet.temperature(), inlet.pressure())
    });

    let volume = passive_transfer_volume(inlet.pressure(), outlet_pressure, speedup);
    let mut removed = inlet.remove_volume(volume);

    recycler.reacting = false;
    if can_react {
        for recipe in recipes.iter().filter(|recipe| recipe.enabled) {
            if convert(&mut removed, recipe, recycler.container.as_mut()) {
                recycler.reacting = true;
            }
        }
    }

    if let Some(outlet) = ctx.pipe_net_air(outlet_net) {
        outlet.merge(&removed, heat_scale);
    }

    let transferred = removed.total_moles();
    if let Some(appearance) = appearance.as_mut() {
        appearance.active = recycler.reacting;
        appearance.ambience = recycler.reacting || transferred > 0.0;
    }

    Some(RecyclerOutput {
        entity: id,
        reacting: recycler.reacting,
        transferred,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{GridId, MapId, Transform};
    use crate::devices::testing::TestContext;
    use crate::gas::Gas;
    use crate::nodes::{Node, NodeContainer, PipeNetId};
    use crate::tile::TileIndex;

    const RECIPES: &str = r#"[
        GasRecyclingRecipe(
            id: "CarbonDioxideToOxygen",
            input_gas: CarbonDioxide,
            output_gas: Oxygen,
            minimum_temperature: 573.15,
            scrubbed_reagents: { "Carbon": 0.5 },
        ),
    ]"#;

    fn registry() -> RecipeRegistry {
        RecipeRegistry::from_ron_str("recipes", RECIPES).unwrap()
    }

    fn recycler_entity(container: Option<ReagentContainer>) -> Entity {
        let mut nodes = NodeContainer::new()
            .with_node("inlet", Node::pipe(200.0))
            .with_node("outlet", Node::pipe(200.0));
        nodes.nodes.get_mut("inlet").unwrap().net = Some(PipeNetId(0));
        nodes.nodes.get_mut("outlet").unwrap().net = Some(PipeNetId(1));
        Entity {
            transform: Some(Transform::anchored(MapId(1), GridId(1), TileIndex::new(0, 0))),
            node_container: Some(nodes),
            gas_recycler: Some(GasRecycler {
                container,
                ..GasRecycler::default()
            }),
            appearance: Some(Appearance::default()),
            ..Entity::new(3)
        }
    }

    fn context(inlet: GasMixture) -> TestContext {
        let mut ctx = TestContext::with_inlet(inlet);
        ctx.nets.insert(PipeNetId(1), GasMixture::new(200.0));
        ctx
    }

    fn hot_carbon_dioxide() -> GasMixture {
        GasMixture::new(200.0)
            .with_temperature(600.0)
            .with_moles(Gas::CarbonDioxide, 50.0)
    }

    #[test]
    fn test_passive_transfer_volume() {
        assert_eq!(passive_transfer_volume(100.0, 200.0, 1.0), 0.0);
        assert_eq!(passive_transfer_volume(150.0, 150.0, 1.0), 0.0);

        let at_reference = passive_transfer_volume(300.0 * ONE_ATMOSPHERE, 0.0, 1.0);
        assert!((at_reference - MAX_TRANSFER_RATE).abs() < 1e-2);

        let doubled = passive_transfer_volume(300.0 * ONE_ATMOSPHERE, 0.0, 2.0);
        assert!((doubled - 2.0 * MAX_TRANSFER_RATE).abs() < 1e-2);
    }

    #[test]
    fn test_converts_and_scrubs() {
        let mut entity = recycler_entity(Some(ReagentContainer::new(1000.0)));
        let mut ctx = context(hot_carbon_dioxide());

        let output = gas_recycler_update(&mut entity, &registry(), &mut ctx).unwrap();

        assert!(output.reacting);
        let outlet = &ctx.nets[&PipeNetId(1)];
        assert_eq!(outlet.get_moles(Gas::CarbonDioxide), 0.0);
        let converted = outlet.get_moles(Gas::Oxygen);
        assert!(converted > 0.0);
        let inlet = &ctx.nets[&PipeNetId(0)];
        assert!((inlet.get_moles(Gas::CarbonDioxide) + converted - 50.0).abs() < 1e-3);

        let recycler = entity.gas_recycler.as_ref().unwrap();
        let carbon = recycler.container.as_ref().unwrap().amount("Carbon");
        assert!((carbon - converted * 0.5).abs() < 1e-4);

        let appearance = entity.appearance.unwrap();
        assert!(appearance.active);
        assert!(appearance.ambience);
    }

    #[test]
    fn test_cold_gas_passes_through_unchanged() {
        let mut entity = recycler_entity(None);
        let inlet = GasMixture::new(200.0)
            .with_temperature(300.0)
            .with_moles(Gas::CarbonDioxide, 50.0);
        let mut ctx = context(inlet);

        let output = gas_recycler_update(&mut entity, &registry(), &mut ctx).unwrap();

        assert!(!output.reacting);
        assert!(output.transferred > 0.0);
        let outlet = &ctx.nets[&PipeNetId(1)];
        assert_eq!(outlet.get_moles(Gas::Oxygen), 0.0);
        assert!(outlet.get_moles(Gas::CarbonDioxide) > 0.0);
        let appearance = entity.appearance.unwrap();
        assert!(!appearance.active);
        assert!(appearance.ambience);
    }

    #[test]
    fn test_no_flow_against_pressure() {
        let mut entity = recycler_entity(None);
        let mut ctx = context(hot_carbon_dioxide());
        ctx.nets.insert(
            PipeNetId(1),
            GasMixture::new(200.0)
                .with_temperature(600.0)
                .with_moles(Gas::Nitrogen, 500.0),
        );

        let output = gas_recycler_update(&mut entity, &registry(), &mut ctx).unwrap();

        // Conditions hold, but nothing reached the recycler to convert.
        assert!(!output.reacting);
        assert_eq!(output.transferred, 0.0);
        assert_eq!(ctx.nets[&PipeNetId(0)].get_moles(Gas::CarbonDioxide), 50.0);
    }

    #[test]
    fn test_missing_outlet_stops_ambience() {
        let mut entity = recycler_entity(None);
        entity.appearance = Some(Appearance {
            active: false,
            ambience: true,
        });
        let mut ctx = TestContext::with_inlet(hot_carbon_dioxide());

        gas_recycler_update(&mut entity, &registry(), &mut ctx).unwrap();

        assert!(!entity.appearance.unwrap().ambience);
        assert_eq!(ctx.nets[&PipeNetId(0)].get_moles(Gas::CarbonDioxide), 50.0);
    }

    #[test]
    fn test_disable_clears_reacting() {
        let mut recycler = GasRecycler {
            reacting: true,
            ..GasRecycler::default()
        };
        let mut appearance = Appearance {
            active: true,
            ambience: true,
        };

        recycler.disable(Some(&mut appearance));

        assert!(!recycler.reacting);
        assert!(!appearance.active);
    }

    #[test]
    fn test_examine_hints() {
        let registry = registry();
        let recycler = GasRecycler::default();
        let cold = GasMixture::new(200.0)
            .with_temperature(300.0)
            .with_moles(Gas::CarbonDioxide, 50.0);

        let lines = recycler.examine(true, Some(&cold), &registry);
        assert_eq!(
            lines,
            vec![
                ExamineLine::RecyclerNoContainer,
                ExamineLine::RecyclerLowTemperature
            ]
        );

        assert!(recycler.examine(false, Some(&cold), &registry).is_empty());

        let reacting = GasRecycler {
            reacting: true,
            container: Some(ReagentContainer::new(10.0)),
            ..GasRecycler::default()
        };
        assert_eq!(
            reacting.examine(true, Some(&cold), &registry),
            vec![
                ExamineLine::RecyclerContainerLoaded,
                ExamineLine::RecyclerReacting
            ]
        );
    }
}
