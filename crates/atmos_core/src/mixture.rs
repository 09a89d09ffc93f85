//! Gas mixture arithmetic.
//!
//! A [`GasMixture`] is the unit of gas state: moles per species, a
//! temperature and a volume. Pressure and heat capacity are always derived
//! from those three; there is no stored pressure to drift out of sync.
//!
//! Mixtures are plain values. Moving gas between two owners is always an
//! explicit [`GasMixture::remove`]-family call followed by
//! [`GasMixture::merge`] on the receiver.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::constants::{
    GAS_MIN_MOLES, MINIMUM_HEAT_CAPACITY, MINIMUM_TEMPERATURE_DELTA_TO_CONSIDER, R, TCMB, TMAX,
};
use crate::gas::{Gas, GAS_COUNT};

/// Moles per species plus temperature and volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasMixture {
    moles: [f32; GAS_COUNT],
    temperature: f32,
    volume: f32,
}

impl Default for GasMixture {
    fn default() -> Self {
        Self {
            moles: [0.0; GAS_COUNT],
            temperature: TCMB,
            volume: 0.0,
        }
    }
}

impl GasMixture {
    /// Create an empty mixture of the given volume at [`TCMB`].
    #[must_use]
    pub fn new(volume: f32) -> Self {
        Self {
            volume,
            ..Self::default()
        }
    }

    /// Builder-style temperature setter.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.set_temperature(temperature);
        self
    }

    /// Builder-style mole setter.
    #[must_use]
    pub fn with_moles(mut self, gas: Gas, moles: f32) -> Self {
        self.set_moles(gas, moles);
        self
    }

    /// Moles of one species.
    #[must_use]
    pub fn get_moles(&self, gas: Gas) -> f32 {
        self.moles[gas.index()]
    }

    /// The full mole vector in species order.
    #[must_use]
    pub fn moles(&self) -> &[f32; GAS_COUNT] {
        &self.moles
    }

    /// Overwrite the moles of one species.
    pub fn set_moles(&mut self, gas: Gas, moles: f32) {
        debug_assert!(moles.is_finite(), "non-finite moles for {gas}");
        self.moles[gas.index()] = moles;
    }

    /// Add `delta` moles of one species. `delta` may be negative.
    ///
    /// Nothing clamps the result; callers keep totals non-negative.
    pub fn adjust_moles(&mut self, gas: Gas, delta: f32) {
        debug_assert!(delta.is_finite(), "non-finite mole delta for {gas}");
        self.moles[gas.index()] += delta;

        #[cfg(feature = "debug-validation")]
        if self.moles[gas.index()] < 0.0 {
            tracing::warn!(
                gas = %gas,
                moles = self.moles[gas.index()],
                "Mole count went negative"
            );
        }
    }

    /// Temperature in Kelvin.
    #[must_use]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Set temperature, clamped to `[TCMB, TMAX]`.
    pub fn set_temperature(&mut self, temperature: f32) {
        debug_assert!(!temperature.is_nan(), "NaN temperature");
        self.temperature = temperature.clamp(TCMB, TMAX);
    }

    /// Volume in litres.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the volume in litres.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Sum of moles across all species.
    #[must_use]
    pub fn total_moles(&self) -> f32 {
        self.moles.iter().sum()
    }

    /// Pressure in kPa from the ideal gas law. Zero for non-positive volume.
    #[must_use]
    pub fn pressure(&self) -> f32 {
        if self.volume <= 0.0 {
            return 0.0;
        }
        self.total_moles() * R * self.temperature / self.volume
    }

    /// Unfloored sum of moles × specific heat.
    #[must_use]
    pub fn raw_heat_capacity(&self) -> f32 {
        self.moles
            .iter()
            .zip(Gas::ALL)
            .map(|(moles, gas)| moles * gas.specific_heat())
            .sum()
    }

    /// Heat capacity divided by `heat_scale`, floored at [`MINIMUM_HEAT_CAPACITY`].
    #[must_use]
    pub fn scaled_heat_capacity(&self, heat_scale: f32) -> f32 {
        (self.raw_heat_capacity() / heat_scale).max(MINIMUM_HEAT_CAPACITY)
    }

    /// Heat capacity in J/K, floored at [`MINIMUM_HEAT_CAPACITY`].
    #[must_use]
    pub fn heat_capacity(&self) -> f32 {
        self.scaled_heat_capacity(1.0)
    }

    /// Thermal energy in J for the given heat capacity.
    #[must_use]
    pub fn thermal_energy(&self, heat_capacity: f32) -> f32 {
        self.temperature * heat_capacity
    }

    /// Whether the mixture holds no gas at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moles.iter().all(|&m| m == 0.0)
    }

    /// Remove `ratio` of every species into a new mixture.
    ///
    /// Ratios at or below zero return an empty mixture; ratios above one
    /// take everything. The removed part shares this mixture's temperature
    /// and volume. Species that fall below [`GAS_MIN_MOLES`] on either side
    /// are zeroed.
    pub fn remove_ratio(&mut self, ratio: f32) -> GasMixture {
        let mut removed = GasMixture {
            moles: [0.0; GAS_COUNT],
            temperature: self.temperature,
            volume: self.volume,
        };

        if ratio <= 0.0 {
            return removed;
        }
        let ratio = if ratio > 1.0 { 1.0 } else { ratio };

        for i in 0..GAS_COUNT {
            let taken = self.moles[i] * ratio;
            self.moles[i] -= taken;
            removed.moles[i] = taken;

            if self.moles[i] < GAS_MIN_MOLES || self.moles[i].is_nan() {
                self.moles[i] = 0.0;
            }
            if removed.moles[i] < GAS_MIN_MOLES || removed.moles[i].is_nan() {
                removed.moles[i] = 0.0;
            }
        }

        removed
    }

    /// Remove the gas occupying `volume` litres of this mixture.
    pub fn remove_volume(&mut self, volume: f32) -> GasMixture {
        let ratio = volume / self.volume;
        self.remove_ratio(ratio)
    }

    /// Remove `amount` moles, spread proportionally across species.
    pub fn remove(&mut self, amount: f32) -> GasMixture {
        let ratio = amount / self.total_moles();
        self.remove_ratio(ratio)
    }

    /// Add `giver`'s moles to this mixture, blending temperatures by heat capacity.
    ///
    /// Temperature is only blended when the two differ by more than
    /// [`MINIMUM_TEMPERATURE_DELTA_TO_CONSIDER`] and the combined capacity
    /// exceeds [`MINIMUM_HEAT_CAPACITY`]; otherwise it is left as is.
    pub fn merge(&mut self, giver: &GasMixture, heat_scale: f32) {
        if (self.temperature - giver.temperature).abs() > MINIMUM_TEMPERATURE_DELTA_TO_CONSIDER {
            let receiver_capacity = self.scaled_heat_capacity(heat_scale);
            let giver_capacity = giver.scaled_heat_capacity(heat_scale);
            let combined = receiver_capacity + giver_capacity;
            if combined > MINIMUM_HEAT_CAPACITY {
                let energy = giver.thermal_energy(giver_capacity)
                    + self.thermal_energy(receiver_capacity);
                self.set_temperature(energy / combined);
            }
        }

        for (mine, theirs) in self.moles.iter_mut().zip(giver.moles.iter()) {
            *mine += theirs;
        }
    }

    /// Feed the exact bit patterns of this mixture into `hasher`.
    pub fn hash_bits<H: Hasher>(&self, hasher: &mut H) {
        for moles in &self.moles {
            moles.to_bits().hash(hasher);
        }
        self.temperature.to_bits().hash(hasher);
        self.volume.to_bits().hash(hasher);
    }
}
