//! Property tests for gas conservation.

use atmos_core::atmosphere::AtmosphereSystem;
use atmos_core::constants::DEFAULT_HEAT_SCALE;
use atmos_core::gas::Gas;
use atmos_core::mixture::GasMixture;
use atmos_core::nodes::NodeRef;
use atmos_core::reactions::ReactionPipeline;
use atmos_test_utils::determinism::strategies::{arb_mixture, arb_moles, arb_temperature};
use atmos_test_utils::fixtures::{fill_net, spawn_pipe_line, station, PIPE_VOLUME};
use proptest::prelude::*;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-3 + a.abs().max(b.abs()) * 1e-4
}

fn nitrogen(moles: f32, temperature: f32) -> GasMixture {
    GasMixture::new(PIPE_VOLUME)
        .with_temperature(temperature)
        .with_moles(Gas::Nitrogen, moles)
}

fn net_moles(sim: &atmos_core::simulation::Simulation) -> f32 {
    sim.nets().iter().map(|net| net.air.total_moles()).sum()
}

proptest! {
    #[test]
    fn test_merge_conserves_moles(a in arb_mixture(), b in arb_mixture()) {
        let expected = a.total_moles() + b.total_moles();
        let mut receiver = a.clone();

        receiver.merge(&b, DEFAULT_HEAT_SCALE);

        prop_assert!(close(receiver.total_moles(), expected));
        let (low, high) = if a.temperature() < b.temperature() {
            (a.temperature(), b.temperature())
        } else {
            (b.temperature(), a.temperature())
        };
        prop_assert!(receiver.temperature() >= low - 0.5);
        prop_assert!(receiver.temperature() <= high + 0.5);
    }

    #[test]
    fn test_remove_ratio_conserves_moles(mixture in arb_mixture(), ratio in -0.5f32..1.5) {
        let before = mixture.total_moles();
        let mut source = mixture;

        let removed = source.remove_ratio(ratio);

        prop_assert!(close(source.total_moles() + removed.total_moles(), before));
        prop_assert_eq!(removed.temperature(), source.temperature());
        if ratio <= 0.0 {
            prop_assert!(removed.is_empty());
        }
        if ratio >= 1.0 {
            prop_assert!(source.is_empty());
        }
    }

    #[test]
    fn test_reaction_pass_stays_physical(mixture in arb_mixture()) {
        let pipeline = ReactionPipeline::standard();
        let mut atmosphere = AtmosphereSystem::default();
        let mut air = mixture;

        pipeline.react(&mut air, None, &mut atmosphere);

        // Rounding may leave a species a hair under zero.
        for &moles in air.moles() {
            prop_assert!(moles.is_finite());
            prop_assert!(moles >= -1e-3);
        }
        prop_assert!(air.temperature().is_finite());
        prop_assert!(air.temperature() > 0.0);
    }

    #[test]
    fn test_split_keeps_surviving_share(
        length in 2usize..6,
        cut in 0usize..6,
        moles in 1.0f32..500.0,
        temperature in arb_temperature(),
    ) {
        let cut = cut % length;
        let mut sim = station(8, 1);
        let ids = spawn_pipe_line(&mut sim, length);
        fill_net(&mut sim, &NodeRef::new(ids[0], "pipe"), nitrogen(moles, temperature));

        sim.despawn_entity(ids[cut]).unwrap();

        let expected = moles * (length - 1) as f32 / length as f32;
        prop_assert!(close(net_moles(&sim), expected));
    }

    #[test]
    fn test_join_keeps_both_nets(left in arb_moles(), right in arb_moles()) {
        let mut sim = station(8, 1);
        let first = spawn_pipe_line(&mut sim, 2);
        let second = spawn_pipe_line(&mut sim, 3);
        fill_net(&mut sim, &NodeRef::new(first[0], "pipe"), nitrogen(left, 300.0));
        fill_net(&mut sim, &NodeRef::new(second[0], "pipe"), nitrogen(right, 300.0));
        prop_assert_eq!(sim.nets().len(), 2);

        sim.connect_nodes(
            &NodeRef::new(second[0], "pipe"),
            &NodeRef::new(first[1], "pipe"),
        )
        .unwrap();

        prop_assert_eq!(sim.nets().len(), 1);
        let air = sim.node_air(&NodeRef::new(first[0], "pipe")).unwrap();
        prop_assert!(close(air.total_moles(), left + right));
        prop_assert_eq!(air.volume(), 5.0 * PIPE_VOLUME);
    }
}
