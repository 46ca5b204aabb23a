//! Read-only OData Entity Data Model (EDM) types for the odata-openapi ecosystem.
//!
//! This crate holds the in-memory shape of a service's metadata: entity types
//! with keys and navigation properties, the entity container (entity sets,
//! singletons, operation imports), bound and unbound operations, and the raw
//! vocabulary annotations attached to each element.
//!
//! Parsing CSDL documents is left to an external loader. The types derive
//! `serde` traits so a loader (or a test fixture) can build them from YAML or
//! JSON. `odata-openapi` borrows a model for the duration of a generation run
//! and never mutates it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod index;
pub mod model;
pub mod vocabulary;

pub use index::EdmIndex;
pub use model::{
    Annotations, EdmModel, EntityContainer, EntitySet, EntityType, NavigationProperty, Operation,
    OperationImport, OperationKind, Parameter, Singleton, StructuralProperty, TypeRef,
};
