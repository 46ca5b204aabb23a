//! Typed error enum for the `odata-openapi` library API.
//!
//! Library consumers can match on specific variants. The CLI (`main.rs`)
//! converts these to `anyhow::Error` at the binary boundary for richer
//! context messages.

use crate::handler::Verb;
use crate::path::PathKind;

/// Errors produced by `odata-openapi` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading settings or model files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// A model element references an entity type or operation that does not
    /// exist.
    #[error("'{referenced_by}' references unknown type or operation '{name}'")]
    UnresolvedType {
        /// The unresolved qualified name.
        name: String,
        /// The element holding the reference.
        referenced_by: String,
    },

    /// A key names a property the entity type does not declare or inherit.
    #[error("entity type '{entity_type}' has no property '{property}'")]
    UnresolvedProperty {
        /// Qualified entity type name.
        entity_type: String,
        /// The missing property name.
        property: String,
    },

    /// A segment sequence violates the path invariants.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// Identifiers of the offending segment sequence.
        path: String,
        /// Which invariant was violated.
        reason: &'static str,
    },

    /// No handler is registered for this path shape and verb.
    ///
    /// Every generated path is reachable by construction, so this means the
    /// handler registry is incomplete.
    #[error("no operation handler for {kind} {verb} (path '{path}')")]
    UnsupportedPathShape {
        /// Shape of the path's terminal segment(s).
        kind: PathKind,
        /// Requested verb.
        verb: Verb,
        /// Canonical path string.
        path: String,
    },

    /// A handler could not resolve a context element its path shape requires.
    #[error("cannot resolve {missing} for path '{path}'")]
    MissingContext {
        /// Canonical path string.
        path: String,
        /// The missing element (e.g., `"entity type before type cast"`).
        missing: &'static str,
    },

    /// The same (path, verb) pair was produced twice.
    #[error("duplicate {verb} operation for path '{path}'")]
    DuplicateOperation {
        /// Canonical path string.
        path: String,
        /// Duplicated verb.
        verb: Verb,
    },

    /// Generation was cancelled by the caller.
    #[error("path generation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    /// Required for use in async contexts and across thread boundaries.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };

    #[test]
    fn unsupported_shape_message_names_kind_and_verb() {
        let err = Error::UnsupportedPathShape {
            kind: PathKind::Ref,
            verb: Verb::Patch,
            path: "/Orders({id})/Customer/$ref".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no operation handler for Ref PATCH (path '/Orders({id})/Customer/$ref')"
        );
    }
}
