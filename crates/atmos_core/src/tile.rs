//! Grid tiles and their open atmosphere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{GridId, MapId};
use crate::constants::{CELL_VOLUME, ONE_ATMOSPHERE, R, T20C};
use crate::gas::Gas;
use crate::mixture::GasMixture;
use crate::nodes::PipeNetId;

/// Integer tile coordinates on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TileIndex {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl TileIndex {
    /// Create a tile index.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A localised fire on a tile, with its own temperature.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hotspot {
    /// Whether a fire currently exists.
    pub valid: bool,
    /// Fire temperature in Kelvin.
    pub temperature: f32,
    /// Volume of gas the fire is touching, in litres.
    pub volume: f32,
    /// Fuel the fire was lit with.
    pub fuel: Option<Gas>,
}

impl Hotspot {
    /// Put the fire out.
    pub fn extinguish(&mut self) {
        *self = Self::default();
    }
}

/// One tile's atmosphere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TileAtmosphere {
    /// Open air on the tile; `None` for solid tiles.
    pub air: Option<GasMixture>,
    /// Fire state on the tile.
    pub hotspot: Hotspot,
}

impl TileAtmosphere {
    /// A tile of standard station air (21% O2, 79% N2 at 20 °C, 1 atm).
    #[must_use]
    pub fn standard_air() -> Self {
        let total = ONE_ATMOSPHERE * CELL_VOLUME / (R * T20C);
        let air = GasMixture::new(CELL_VOLUME)
            .with_temperature(T20C)
            .with_moles(Gas::Oxygen, total * 0.21)
            .with_moles(Gas::Nitrogen, total * 0.79);
        Self {
            air: Some(air),
            hotspot: Hotspot::default(),
        }
    }

    /// A tile holding the given mixture.
    #[must_use]
    pub fn with_air(air: GasMixture) -> Self {
        Self {
            air: Some(air),
            hotspot: Hotspot::default(),
        }
    }
}

/// Borrowed view of the tile a reaction runs on.
///
/// Reactions receive this as their holder so fire reactions can read the
/// hotspot temperature and ignite the tile. The tile's air is passed
/// separately, which keeps the two borrows disjoint.
#[derive(Debug)]
pub struct TileLocation<'a> {
    /// Grid the tile belongs to.
    pub grid: GridId,
    /// Tile coordinates.
    pub index: TileIndex,
    /// The tile's hotspot.
    pub hotspot: &'a mut Hotspot,
}

/// Atmosphere state for one grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridAtmosphere {
    /// Map the grid sits on.
    pub map_id: MapId,
    /// Tiles by coordinate.
    pub tiles: BTreeMap<TileIndex, TileAtmosphere>,
    /// Pipe nets whose pipes are anchored to this grid. Rebuilt, never saved.
    #[serde(skip)]
    pub pipe_nets: Vec<PipeNetId>,
}

impl GridAtmosphere {
    /// Create an empty grid on the given map.
    #[must_use]
    pub fn new(map_id: MapId) -> Self {
        Self {
            map_id,
            tiles: BTreeMap::new(),
            pipe_nets: Vec::new(),
        }
    }

    /// Fill a rectangle of tiles with standard air.
    pub fn fill_standard_air(&mut self, width: i32, height: i32) {
        for x in 0..width {
            for y in 0..height {
                self.tiles
                    .insert(TileIndex::new(x, y), TileAtmosphere::standard_air());
            }
        }
    }

    /// The open air on a tile, if any.
    pub fn tile_mixture_mut(&mut self, index: TileIndex) -> Option<&mut GasMixture> {
        self.tiles.get_mut(&index).and_then(|t| t.air.as_mut())
    }
}
