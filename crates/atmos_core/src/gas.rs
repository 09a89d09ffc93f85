//! Gas species.

use serde::{Deserialize, Serialize};

/// Number of simulated gas species.
pub const GAS_COUNT: usize = 14;

/// A gas species. The discriminant is the index into mole arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Gas {
    /// O2.
    Oxygen = 0,
    /// N2.
    Nitrogen = 1,
    /// CO2.
    CarbonDioxide = 2,
    /// Plasma.
    Plasma = 3,
    /// Tritium.
    Tritium = 4,
    /// H2O vapour.
    WaterVapor = 5,
    /// NH3.
    Ammonia = 6,
    /// N2O.
    NitrousOxide = 7,
    /// Frezon.
    Frezon = 8,
    /// H2.
    Hydrogen = 9,
    /// CH4.
    Methane = 10,
    /// Cl2.
    Chlorine = 11,
    /// F2.
    Fluorine = 12,
    /// ClF3.
    ChlorineTrifluoride = 13,
}

impl Gas {
    /// Every species in index order.
    pub const ALL: [Gas; GAS_COUNT] = [
        Gas::Oxygen,
        Gas::Nitrogen,
        Gas::CarbonDioxide,
        Gas::Plasma,
        Gas::Tritium,
        Gas::WaterVapor,
        Gas::Ammonia,
        Gas::NitrousOxide,
        Gas::Frezon,
        Gas::Hydrogen,
        Gas::Methane,
        Gas::Chlorine,
        Gas::Fluorine,
        Gas::ChlorineTrifluoride,
    ];

    /// Index into a mole array.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a species by index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Molar specific heat in J/(mol·K).
    #[must_use]
    pub const fn specific_heat(self) -> f32 {
        match self {
            Gas::Oxygen => 20.0,
            Gas::Nitrogen => 30.0,
            Gas::CarbonDioxide => 30.0,
            Gas::Plasma => 200.0,
            Gas::Tritium => 10.0,
            Gas::WaterVapor => 40.0,
            Gas::Ammonia => 20.0,
            Gas::NitrousOxide => 40.0,
            Gas::Frezon => 600.0,
            Gas::Hydrogen => 15.0,
            Gas::Methane => 35.0,
            Gas::Chlorine => 34.0,
            Gas::Fluorine => 31.0,
            Gas::ChlorineTrifluoride => 64.0,
        }
    }

    /// Short chemical label used in logs and tool output.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Gas::Oxygen => "O2",
            Gas::Nitrogen => "N2",
            Gas::CarbonDioxide => "CO2",
            Gas::Plasma => "Plasma",
            Gas::Tritium => "Tritium",
            Gas::WaterVapor => "H2O",
            Gas::Ammonia => "NH3",
            Gas::NitrousOxide => "N2O",
            Gas::Frezon => "Frezon",
            Gas::Hydrogen => "H2",
            Gas::Methane => "CH4",
            Gas::Chlorine => "Cl2",
            Gas::Fluorine => "F2",
            Gas::ChlorineTrifluoride => "ClF3",
        }
    }
}

impl std::fmt::Display for Gas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
