//! Data validation utilities.

use std::path::Path;

use atmos_core::data::{GasGeneratorConfig, RecipeRegistry};
use atmos_core::reactions::ReactionPipeline;
use serde::Serialize;

use crate::{read_text, Result};

/// Reaction prototypes file name.
pub const REACTIONS_FILE: &str = "gas_reactions.ron";
/// Recycler recipes file name.
pub const RECIPES_FILE: &str = "recycling_recipes.ron";
/// Generator profiles file name.
pub const GENERATORS_FILE: &str = "gas_generator.ron";

/// Counts of what a data directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    /// Reaction prototypes.
    pub reactions: usize,
    /// Recycler recipes.
    pub recipes: usize,
    /// Recipes switched off.
    pub disabled_recipes: usize,
    /// Generator profiles.
    pub generators: usize,
}

/// Validate all RON data files in a directory.
///
/// Missing files are skipped with a warning.
///
/// # Errors
///
/// Returns an error if any data file cannot be read or fails validation.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    if let Some(text) = read_optional(&path.join(REACTIONS_FILE))? {
        let pipeline = ReactionPipeline::from_ron_str(REACTIONS_FILE, &text)?;
        report.reactions = pipeline.prototypes().len();
    }

    if let Some(text) = read_optional(&path.join(RECIPES_FILE))? {
        let registry = RecipeRegistry::from_ron_str(RECIPES_FILE, &text)?;
        report.recipes = registry.len();
        report.disabled_recipes = registry.iter().filter(|recipe| !recipe.enabled).count();
    }

    if let Some(text) = read_optional(&path.join(GENERATORS_FILE))? {
        report.generators = GasGeneratorConfig::list_from_ron_str(GENERATORS_FILE, &text)?.len();
    }

    tracing::debug!(?report, "Validated data directory");
    Ok(report)
}

/// Load generator profiles from a data directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a profile is invalid.
pub fn load_generator_profiles(path: &Path) -> Result<Vec<GasGeneratorConfig>> {
    let text = read_text(&path.join(GENERATORS_FILE))?;
    Ok(GasGeneratorConfig::list_from_ron_str(GENERATORS_FILE, &text)?)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Data file missing, skipped");
        return Ok(None);
    }
    read_text(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolError;
    use atmos_core::error::AtmosError;

    fn assets() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/data")
    }

    #[test]
    fn test_shipped_data_is_valid() {
        let report = validate_data_directory(&assets()).unwrap();
        assert_eq!(report.reactions, 5);
        assert_eq!(report.recipes, 3);
        assert_eq!(report.disabled_recipes, 1);
        assert_eq!(report.generators, 2);
    }

    #[test]
    fn test_empty_directory_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_data_directory(dir.path()).unwrap();
        assert_eq!(report, ValidationReport::default());
    }

    #[test]
    fn test_bad_recipe_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(RECIPES_FILE),
            r#"[(id: "bad", input_gas: Oxygen, output_gas: Nitrogen, conversion_ratio: -1.0)]"#,
        )
        .unwrap();

        let err = validate_data_directory(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ToolError::Core(AtmosError::InvalidData { ref id, .. }) if id == "bad"
        ));
    }

    #[test]
    fn test_malformed_ron_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(REACTIONS_FILE), "[(id: ").unwrap();

        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(ToolError::Core(AtmosError::DataParseError { .. }))
        ));
    }
}
