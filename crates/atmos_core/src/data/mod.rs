//! Data structures for device and reaction configuration.
//!
//! Everything here deserialises from RON. Parsing from a string is
//! provided; reading files is left to the caller.

mod generator_data;
mod recipe_data;

pub use generator_data::GasGeneratorConfig;
pub use recipe_data::{GasRecyclingRecipe, RecipeRegistry};

use crate::error::{AtmosError, Result};

/// Parse RON text, labelling errors with `source_name`.
pub(crate) fn parse_ron<T: serde::de::DeserializeOwned>(source_name: &str, text: &str) -> Result<T> {
    ron::from_str(text).map_err(|e| AtmosError::DataParseError {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}
