#![allow(clippy::doc_markdown)] // README uses "OpenAPI" and "OData" proper nouns throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod context;
mod error;
pub mod handler;
pub mod openapi;
pub mod path;
mod path_item;
pub mod restriction;

use std::path::Path;

use odata_edm::EdmModel;

/// Default `$ref` of the error response every operation declares as its
/// `default` response.
///
/// Override via [`Settings::default_response_ref`] when the service's
/// components use a different name.
pub const DEFAULT_ERROR_RESPONSE_REF: &str = "#/components/responses/error";

pub use config::Settings;
pub use context::ODataContext;
pub use error::{Error, Result};
pub use handler::{HandlerRegistry, OperationHandler, Verb};
pub use openapi::PathsDocument;
pub use path::{ODataPath, PathKind, PathProvider};
pub use path_item::PathItemAssembler;
pub use restriction::RestrictionEvaluator;

/// Generate the path items and tags for `model` with the built-in handlers.
///
/// Runs the whole pipeline: context construction (reference validation),
/// path discovery and path item assembly.
///
/// # Errors
///
/// Returns an error if the model references unknown types, properties or
/// operations, or if a discovered path cannot be described.
pub fn generate(model: &EdmModel, settings: &Settings) -> Result<PathsDocument> {
    let context = ODataContext::new(model, settings)?;
    let paths = PathProvider::new(&context).paths()?;
    tracing::info!(paths = paths.len(), "discovered resource paths");
    let registry = HandlerRegistry::new();
    PathItemAssembler::new(&context, &registry).assemble(&paths)
}

/// Load an EDM model from a YAML (or JSON) file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a model.
pub fn load_model(path: &Path) -> Result<EdmModel> {
    let content = std::fs::read_to_string(path)?;
    let model: EdmModel = serde_yaml_ng::from_str(&content)?;
    tracing::debug!(
        path = %path.display(),
        entity_types = model.entity_types.len(),
        operations = model.operations.len(),
        "loaded model"
    );
    Ok(model)
}
