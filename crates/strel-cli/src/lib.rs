//! # strel-cli — Command-Line Validation
//!
//! Provides the `strel` command-line interface over `strel-schema`.
//!
//! ## Subcommands
//!
//! - `strel validate` — Validate documents against a model.
//! - `strel models` — List the models in a definition document and check
//!   that every referenced model exists.
//!
//! ```bash
//! strel validate --models models.yaml --model Person --structure array people.json
//! strel validate --models models.yaml --model Person --salvage --blanking person.yaml
//! strel models --models models.yaml
//! ```
//!
//! ## Exit Codes
//!
//! `0` when everything is valid, `1` when any document fails validation,
//! `2` on operational errors (unreadable files, unknown models).

pub mod models;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use strel_core::Value;
use strel_schema::{Api, ModelDefinitions};

/// Load model definitions and build an [`Api`] over them.
///
/// With `debug`, validator diagnostics are emitted through `tracing`.
pub fn load_api(models: &Path, debug: bool) -> Result<Api> {
    let definitions = ModelDefinitions::from_path(models)
        .with_context(|| format!("failed to load model definitions from {}", models.display()))?;
    tracing::info!(
        models = definitions.len(),
        path = %models.display(),
        "loaded model definitions"
    );
    Ok(Api::setup(definitions.into_config().debug_enabled(move || debug)))
}

/// Read a document to validate. `.yaml` and `.yml` files are parsed as
/// YAML, anything else as JSON.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let json: serde_json::Value = match ext {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
    };
    Ok(Value::from(json))
}

/// Name under which a document's failures are reported: its file stem.
pub fn subject_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("subject")
        .to_string()
}
