//! Atmosphere-wide services used by reactions and devices.
//!
//! [`AtmosphereSystem`] owns the heat-scale configuration and the hotspot
//! side effect. It is built once when the [`Simulation`](crate::simulation::Simulation)
//! is set up and handed by reference to whatever needs it.

use serde::{Deserialize, Serialize};

use crate::components::GridId;
use crate::constants::{
    DEFAULT_HEAT_SCALE, HOTSPOT_MINIMUM_MOLES, HOTSPOT_VOLUME_SCALE,
    PLASMA_MINIMUM_BURN_TEMPERATURE,
};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::tile::{TileIndex, TileLocation};

/// Tunables for the atmosphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosConfig {
    /// Divisor applied to heat capacities and reaction energies.
    #[serde(default = "default_heat_scale")]
    pub heat_scale: f32,
    /// Multiplier on pump and passive transfer rates.
    #[serde(default = "default_speedup")]
    pub speedup: f32,
}

fn default_heat_scale() -> f32 {
    DEFAULT_HEAT_SCALE
}

fn default_speedup() -> f32 {
    1.0
}

impl Default for AtmosConfig {
    fn default() -> Self {
        Self {
            heat_scale: DEFAULT_HEAT_SCALE,
            speedup: 1.0,
        }
    }
}

/// A recorded call to [`AtmosphereSystem::hotspot_expose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotExposure {
    /// Grid of the exposed tile.
    pub grid: GridId,
    /// Exposed tile.
    pub tile: TileIndex,
    /// Temperature the tile was exposed to.
    pub temperature: f32,
    /// Volume of the exposure.
    pub volume: f32,
    /// Fuel responsible for the exposure.
    pub fuel: Gas,
    /// Whether this exposure lit a new fire.
    pub ignited: bool,
}

/// Shared atmosphere services.
#[derive(Debug, Clone, Default)]
pub struct AtmosphereSystem {
    config: AtmosConfig,
    exposures: Vec<HotspotExposure>,
}

impl AtmosphereSystem {
    /// Create a system with the given configuration.
    #[must_use]
    pub fn new(config: AtmosConfig) -> Self {
        Self {
            config,
            exposures: Vec::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AtmosConfig {
        &self.config
    }

    /// Heat scale divisor.
    #[must_use]
    pub fn heat_scale(&self) -> f32 {
        self.config.heat_scale
    }

    /// Pump speed multiplier.
    #[must_use]
    pub fn pump_speedup(&self) -> f32 {
        self.config.speedup
    }

    /// Heat capacity of a mixture.
    ///
    /// With `apply_scaling` the heat-scale divisor is left in, which is what
    /// reaction energy balances expect.
    #[must_use]
    pub fn heat_capacity(&self, mixture: &GasMixture, apply_scaling: bool) -> f32 {
        let scaled = mixture.scaled_heat_capacity(self.config.heat_scale);
        if apply_scaling {
            scaled
        } else {
            scaled * self.config.heat_scale
        }
    }

    /// Thermal energy of a mixture using scaled heat capacity.
    #[must_use]
    pub fn thermal_energy(&self, mixture: &GasMixture) -> f32 {
        mixture.thermal_energy(self.heat_capacity(mixture, true))
    }

    /// Merge `giver` into `receiver`.
    pub fn merge(&self, receiver: &mut GasMixture, giver: &GasMixture) {
        receiver.merge(giver, self.config.heat_scale);
    }

    /// Expose a tile to a heat source, possibly igniting or feeding a fire.
    ///
    /// `air` is the tile's open air. Nothing happens without at least
    /// [`HOTSPOT_MINIMUM_MOLES`] of oxygen. An existing fire only grows when
    /// the fuel is present; a new one needs the fuel and a temperature
    /// above [`PLASMA_MINIMUM_BURN_TEMPERATURE`].
    pub fn hotspot_expose(
        &mut self,
        location: &mut TileLocation<'_>,
        air: &GasMixture,
        exposed_temperature: f32,
        exposed_volume: f32,
        fuel: Gas,
    ) {
        let oxygen = air.get_moles(Gas::Oxygen);
        if oxygen < HOTSPOT_MINIMUM_MOLES {
            return;
        }

        let has_fuel = air.get_moles(fuel) >= HOTSPOT_MINIMUM_MOLES;
        let hotspot = &mut *location.hotspot;
        let mut ignited = false;

        if hotspot.valid {
            if has_fuel {
                hotspot.temperature = hotspot.temperature.max(exposed_temperature);
                hotspot.volume = hotspot.volume.max(exposed_volume);
            }
        } else if exposed_temperature > PLASMA_MINIMUM_BURN_TEMPERATURE && has_fuel {
            hotspot.valid = true;
            hotspot.temperature = exposed_temperature;
            hotspot.volume = exposed_volume * HOTSPOT_VOLUME_SCALE;
            hotspot.fuel = Some(fuel);
            ignited = true;
        }

        tracing::trace!(
            grid = location.grid.0,
            x = location.index.x,
            y = location.index.y,
            temperature = exposed_temperature,
            fuel = %fuel,
            ignited,
            "Hotspot exposed"
        );

        self.exposures.push(HotspotExposure {
            grid: location.grid,
            tile: location.index,
            temperature: exposed_temperature,
            volume: exposed_volume,
            fuel,
            ignited,
        });
    }

    /// Exposures recorded since the last drain.
    #[must_use]
    pub fn exposures(&self) -> &[HotspotExposure] {
        &self.exposures
    }

    /// Take all recorded exposures.
    pub fn drain_exposures(&mut self) -> Vec<HotspotExposure> {
        std::mem::take(&mut self.exposures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MINIMUM_HEAT_CAPACITY;
    use crate::tile::Hotspot;

    fn location(hotspot: &mut Hotspot) -> TileLocation<'_> {
        TileLocation {
            grid: GridId(1),
            index: TileIndex::new(0, 0),
            hotspot,
        }
    }

    #[test]
    fn test_heat_capacity_scaling() {
        let atmos = AtmosphereSystem::default();
        let mix = GasMixture::new(1.0).with_moles(Gas::Oxygen, 4.0);
        assert!((atmos.heat_capacity(&mix, true) - 10.0).abs() < 1e-4);
        assert!((atmos.heat_capacity(&mix, false) - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_heat_capacity_empty_is_floored() {
        let atmos = AtmosphereSystem::default();
        let mix = GasMixture::new(1.0);
        assert_eq!(atmos.heat_capacity(&mix, true), MINIMUM_HEAT_CAPACITY);
    }

    #[test]
    fn test_hotspot_ignites_with_fuel_and_oxygen() {
        let mut atmos = AtmosphereSystem::default();
        let mut hotspot = Hotspot::default();
        let air = GasMixture::new(2500.0)
            .with_moles(Gas::Oxygen, 10.0)
            .with_moles(Gas::Methane, 5.0);

        atmos.hotspot_expose(&mut location(&mut hotspot), &air, 800.0, 2500.0, Gas::Methane);

        assert!(hotspot.valid);
        assert_eq!(hotspot.temperature, 800.0);
        assert_eq!(hotspot.volume, 2500.0 * HOTSPOT_VOLUME_SCALE);
        assert_eq!(hotspot.fuel, Some(Gas::Methane));
        assert_eq!(atmos.exposures().len(), 1);
        assert!(atmos.exposures()[0].ignited);
    }

    #[test]
    fn test_hotspot_needs_oxygen() {
        let mut atmos = AtmosphereSystem::default();
        let mut hotspot = Hotspot::default();
        let air = GasMixture::new(2500.0).with_moles(Gas::Methane, 5.0);

        atmos.hotspot_expose(&mut location(&mut hotspot), &air, 800.0, 2500.0, Gas::Methane);

        assert!(!hotspot.valid);
        assert!(atmos.exposures().is_empty());
    }

    #[test]
    fn test_hotspot_cold_exposure_does_not_ignite() {
        let mut atmos = AtmosphereSystem::default();
        let mut hotspot = Hotspot::default();
        let air = GasMixture::new(2500.0)
            .with_moles(Gas::Oxygen, 10.0)
            .with_moles(Gas::Hydrogen, 5.0);

        atmos.hotspot_expose(&mut location(&mut hotspot), &air, 300.0, 2500.0, Gas::Hydrogen);

        assert!(!hotspot.valid);
        assert_eq!(atmos.drain_exposures().len(), 1);
        assert!(atmos.exposures().is_empty());
    }

    #[test]
    fn test_existing_hotspot_only_heats_up() {
        let mut atmos = AtmosphereSystem::default();
        let mut hotspot = Hotspot {
            valid: true,
            temperature: 1000.0,
            volume: 100.0,
            fuel: Some(Gas::Hydrogen),
        };
        let air = GasMixture::new(2500.0)
            .with_moles(Gas::Oxygen, 10.0)
            .with_moles(Gas::Hydrogen, 5.0);

        atmos.hotspot_expose(&mut location(&mut hotspot), &air, 600.0, 50.0, Gas::Hydrogen);
        assert_eq!(hotspot.temperature, 1000.0);
        assert_eq!(hotspot.volume, 100.0);

        atmos.hotspot_expose(&mut location(&mut hotspot), &air, 1500.0, 500.0, Gas::Hydrogen);
        assert_eq!(hotspot.temperature, 1500.0);
        assert_eq!(hotspot.volume, 500.0);
    }
}
