//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entities are always processed in sorted id order; grids, tiles and
//!   nets live in ordered maps.
//!
//! - **Floating-point math**: Results are only compared within one build on
//!   one machine. Hashes use exact bit patterns, so any drift shows up.
//!
//! - **Save/load**: Pipe nets are not saved. Their gas has to survive the
//!   snapshot round trip bit for bit.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual reactions and devices
//! 2. **Property tests**: Random mixtures must still produce deterministic outputs
//! 3. **Integration tests**: Full station scenarios are reproducible
//! 4. **Parallel tests**: Running N simulations in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::thread;

use atmos_core::components::{GridId, MapId};
use atmos_core::nodes::NodeRef;
use atmos_core::save::WorldSave;
use atmos_core::simulation::Simulation;
use atmos_core::tile::{TileAtmosphere, TileIndex};

use crate::fixtures::TICK_DT;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that all runs produced the same hash.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use atmos_test_utils::determinism::verify_determinism;
/// use atmos_test_utils::fixtures::station;
///
/// let result = verify_determinism(
///     3,
///     20,
///     || station(4, 4),
///     |sim| {
///         sim.tick(0.5);
///     },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a simulation setup twice for `num_ticks` of [`TICK_DT`] and compare
/// final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick(TICK_DT);
        },
        Simulation::state_hash,
    );
    result.is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(TICK_DT);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick(TICK_DT);
        sim2.tick(TICK_DT);

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Digest of the exact gas in every pipe node's net, keyed by node.
///
/// Net ids are not stable across a save, so nets are identified by the
/// nodes they contain.
#[must_use]
pub fn pipe_gas_digest(sim: &Simulation) -> u64 {
    let mut hasher = DefaultHasher::new();

    for id in sim.entities().sorted_ids() {
        let Some(container) = sim.get_entity(id).and_then(|e| e.node_container.as_ref()) else {
            continue;
        };
        for name in container.nodes.keys() {
            let node = NodeRef::new(id, name.clone());
            if let Some(air) = sim.node_air(&node) {
                node.hash(&mut hasher);
                air.hash_bits(&mut hasher);
            }
        }
    }

    hasher.finish()
}

/// Run `num_ticks`, save every map in `map_ids`, load the save into a
/// fresh simulation and compare pipe gas and tiles.
///
/// # Returns
///
/// `true` if every net's gas came back bit for bit.
pub fn verify_save_round_trip<F>(setup_fn: F, num_ticks: u64, map_ids: &[MapId]) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.tick(TICK_DT);
    }

    let before = pipe_gas_digest(&sim);

    let Ok(save) = sim.save_world(map_ids) else {
        return false;
    };
    let Ok(bytes) = save.to_bytes() else {
        return false;
    };
    let Ok(save) = WorldSave::from_bytes(&bytes) else {
        return false;
    };

    let mut restored = Simulation::new(*sim.atmosphere().config());
    if restored.load_world(save).is_err() {
        return false;
    }

    pipe_gas_digest(&restored) == before && tiles(&restored) == tiles(&sim)
}

fn tiles(sim: &Simulation) -> Vec<(GridId, &BTreeMap<TileIndex, TileAtmosphere>)> {
    sim.grids()
        .iter()
        .map(|(&id, grid)| (id, &grid.tiles))
        .collect()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for atmospherics tests.
pub mod strategies {
    use atmos_core::constants::TCMB;
    use atmos_core::gas::{Gas, GAS_COUNT};
    use atmos_core::mixture::GasMixture;
    use proptest::prelude::*;

    /// Any gas species.
    pub fn arb_gas() -> impl Strategy<Value = Gas> {
        proptest::sample::select(Gas::ALL.to_vec())
    }

    /// Mole amounts from nothing to a full canister.
    pub fn arb_moles() -> impl Strategy<Value = f32> {
        0.0f32..500.0
    }

    /// Temperatures from deep space to a hot fire.
    pub fn arb_temperature() -> impl Strategy<Value = f32> {
        TCMB..5000.0f32
    }

    /// Pipe and room volumes (L).
    pub fn arb_volume() -> impl Strategy<Value = f32> {
        50.0f32..5000.0
    }

    /// A mixture with random amounts of every species.
    pub fn arb_mixture() -> impl Strategy<Value = GasMixture> {
        (
            arb_volume(),
            arb_temperature(),
            proptest::collection::vec(arb_moles(), GAS_COUNT),
        )
            .prop_map(|(volume, temperature, moles)| {
                let mut mixture = GasMixture::new(volume).with_temperature(temperature);
                for (gas, amount) in Gas::ALL.into_iter().zip(moles) {
                    mixture.set_moles(gas, amount);
                }
                mixture
            })
    }

    /// Methane, oxygen and temperature for a generator inlet.
    pub fn arb_fuel() -> impl Strategy<Value = (f32, f32, f32)> {
        (0.0f32..80.0, 0.0f32..160.0, 250.0f32..1500.0)
    }
}
