//! Loading curriculum catalogs from JSON

use std::path::Path;

use anyhow::{Context, Result};

use super::model::Curriculum;

/// Catalog shipped inside the binary
const BUILTIN_CURRICULUM: &str = include_str!("../../assets/curriculum.json");

/// Parse and validate a catalog from a JSON string
pub fn from_json(json: &str) -> Result<Curriculum> {
    let curriculum: Curriculum =
        serde_json::from_str(json).with_context(|| "Failed to parse curriculum JSON")?;
    curriculum.validate().with_context(|| "Curriculum failed validation")?;
    Ok(curriculum)
}

/// Load a catalog from a JSON file
pub fn load_file(path: &Path) -> Result<Curriculum> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read curriculum from {:?}", path))?;
    let curriculum = from_json(&contents).with_context(|| format!("In {:?}", path))?;
    tracing::info!(
        phases = curriculum.phase_count(),
        steps = curriculum.step_count(),
        "Loaded curriculum from {:?}",
        path
    );
    Ok(curriculum)
}

/// The built-in catalog
pub fn builtin() -> Result<Curriculum> {
    from_json(BUILTIN_CURRICULUM).with_context(|| "Built-in curriculum is invalid")
}

/// Load from `path` when given, otherwise fall back to the built-in catalog
pub fn load(path: Option<&Path>) -> Result<Curriculum> {
    match path {
        Some(path) => load_file(path),
        None => builtin(),
    }
}
