//! Physical constants and tuning values for the atmospherics simulation.
//!
//! Temperatures are in Kelvin, pressures in kPa, volumes in litres and
//! energies in joules.

/// Ideal gas constant, kPa·L/(K·mol).
pub const R: f32 = 8.314_462_6;

/// One standard atmosphere in kPa.
pub const ONE_ATMOSPHERE: f32 = 101.325;

/// Cosmic microwave background temperature; the floor for any mixture.
pub const TCMB: f32 = 2.7;

/// 0 °C.
pub const T0C: f32 = 273.15;

/// 20 °C.
pub const T20C: f32 = 293.15;

/// Hard ceiling for mixture temperature.
pub const TMAX: f32 = 200_000.0;

/// Moles below this are treated as nothing.
pub const GAS_MIN_MOLES: f32 = 0.000_000_05;

/// Heat capacity floor; dividing by anything smaller is unsafe.
pub const MINIMUM_HEAT_CAPACITY: f32 = 0.0003;

/// Temperature delta under which merging skips temperature blending.
pub const MINIMUM_TEMPERATURE_DELTA_TO_CONSIDER: f32 = 0.01;

/// Litres in one tile of open atmosphere.
pub const CELL_VOLUME: f32 = 2500.0;

/// Default heat scale divisor (`atmos.heat_scale`).
pub const DEFAULT_HEAT_SCALE: f32 = 8.0;

// Fire

/// Minimum tile temperature for a hotspot to keep existing.
pub const FIRE_MINIMUM_TEMPERATURE_TO_EXIST: f32 = 100.0 + T0C;

/// Temperature at which fuel gases start to burn.
pub const PLASMA_MINIMUM_BURN_TEMPERATURE: f32 = 100.0 + T0C;

/// Temperature at which fuel gases burn at full rate.
pub const PLASMA_UPPER_TEMPERATURE: f32 = 1370.0 + T0C;

/// Energy per mole of plasma burned.
pub const FIRE_PLASMA_ENERGY_RELEASED: f32 = 160_000.0;

/// Energy per mole of hydrogen burned.
pub const FIRE_HYDROGEN_ENERGY_RELEASED: f32 = 284_000.0;

/// Energy per mole of methane burned.
pub const FIRE_METHANE_ENERGY_RELEASED: f32 = 890_000.0;

/// Energy per mole of chlorine trifluoride decomposed.
pub const CLF3_DECOMPOSITION_ENERGY_RELEASED: f32 = 315_000.0;

/// Moles of oxygen (and of fuel) a tile needs to hold a hotspot.
pub const HOTSPOT_MINIMUM_MOLES: f32 = 0.5;

/// Hotspot volume multiplier applied on ignition.
pub const HOTSPOT_VOLUME_SCALE: f32 = 25.0;

// Reactions

/// Pressure below which the Sabatier process does not run.
pub const SABATIER_MINIMUM_PRESSURE: f32 = ONE_ATMOSPHERE;

/// Divisor applied to the Sabatier limiting reagent each reaction.
pub const SABATIER_CONVERSION_RATE: f32 = 4.0;

/// Divisor applied to the ClF3 production limiting reagent each reaction.
pub const CLF3_PRODUCTION_RATE: f32 = 1.0;

// Devices

/// Maximum litres per second a passive device moves.
pub const MAX_TRANSFER_RATE: f32 = 200.0;

/// Pressure difference (in atmospheres) that yields the maximum transfer rate.
pub const PASSIVE_OVERPRESSURE_ATMOSPHERES: f32 = 300.0;
