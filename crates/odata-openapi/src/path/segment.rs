//! Path segment variants.

use odata_edm::{
    EntitySet, EntityType, NavigationProperty, Operation, OperationImport, Singleton,
    StructuralProperty,
};

/// The root of a path: an entity set or a singleton.
#[derive(Debug, Clone, Copy)]
pub enum NavigationSource<'a> {
    /// A collection of entities.
    EntitySet(&'a EntitySet),
    /// A single entity.
    Singleton(&'a Singleton),
}

impl<'a> NavigationSource<'a> {
    /// Container name of the source.
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            Self::EntitySet(set) => &set.name,
            Self::Singleton(singleton) => &singleton.name,
        }
    }

    /// Whether the source addresses many entities.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::EntitySet(_))
    }

    /// Annotations of the source element.
    #[must_use]
    pub fn annotations(&self) -> &'a odata_edm::Annotations {
        match self {
            Self::EntitySet(set) => &set.annotations,
            Self::Singleton(singleton) => &singleton.annotations,
        }
    }
}

/// One segment of a resource path.
///
/// The set of variants is closed; every consumer matches exhaustively.
#[derive(Debug, Clone)]
pub enum Segment<'a> {
    /// Entity set or singleton, always the first segment.
    NavigationSource {
        /// The source element.
        source: NavigationSource<'a>,
        /// Its declared entity type.
        entity_type: &'a EntityType,
    },
    /// Key predicate selecting one entity of a collection.
    Key {
        /// Entity type the key belongs to.
        entity_type: &'a EntityType,
        /// Key properties in declaration order (one for single keys).
        properties: Vec<&'a StructuralProperty>,
    },
    /// Traversal of a navigation property.
    NavigationProperty {
        /// The property.
        property: &'a NavigationProperty,
        /// Entity type declaring the property.
        declaring_type: &'a EntityType,
        /// Resolved target entity type.
        target: &'a EntityType,
    },
    /// Cast to a derived entity type.
    TypeCast {
        /// The cast target.
        entity_type: &'a EntityType,
    },
    /// A bound action or function.
    Operation {
        /// The operation.
        operation: &'a Operation,
    },
    /// An action or function import, always the only segment.
    OperationImport {
        /// The import.
        import: &'a OperationImport,
        /// The imported operation.
        operation: &'a Operation,
    },
    /// `$value` of a media entity.
    StreamContent {
        /// The media entity type.
        entity_type: &'a EntityType,
    },
    /// A named `Edm.Stream` property.
    StreamProperty {
        /// The stream property.
        property: &'a StructuralProperty,
        /// Entity type the property is read from.
        entity_type: &'a EntityType,
    },
    /// `$ref` of a navigation property.
    Ref,
}

impl<'a> Segment<'a> {
    /// Entity type addressed after this segment, if the segment yields one.
    #[must_use]
    pub fn entity_type(&self) -> Option<&'a EntityType> {
        match self {
            Self::NavigationSource { entity_type, .. }
            | Self::Key { entity_type, .. }
            | Self::TypeCast { entity_type } => Some(entity_type),
            Self::NavigationProperty { target, .. } => Some(target),
            Self::Operation { .. }
            | Self::OperationImport { .. }
            | Self::StreamContent { .. }
            | Self::StreamProperty { .. }
            | Self::Ref => None,
        }
    }

    /// Short identifier used in diagnostics and restriction paths.
    #[must_use]
    pub fn identifier(&self) -> &'a str {
        match self {
            Self::NavigationSource { source, .. } => source.name(),
            Self::Key { .. } => "{key}",
            Self::NavigationProperty { property, .. } => &property.name,
            Self::TypeCast { entity_type } => &entity_type.name,
            Self::Operation { operation } => &operation.name,
            Self::OperationImport { import, .. } => &import.name,
            Self::StreamContent { .. } => "$value",
            Self::StreamProperty { property, .. } => &property.name,
            Self::Ref => "$ref",
        }
    }

    /// Whether nothing may follow this segment.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Operation { .. }
            | Self::OperationImport { .. }
            | Self::StreamContent { .. }
            | Self::StreamProperty { .. }
            | Self::Ref => true,
            Self::NavigationSource { .. }
            | Self::Key { .. }
            | Self::NavigationProperty { .. }
            | Self::TypeCast { .. } => false,
        }
    }
}
