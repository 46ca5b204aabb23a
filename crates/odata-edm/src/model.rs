//! EDM element types.
//!
//! Names of schema elements (entity types, operations) are always
//! namespace-qualified (`NS.Customer`); container elements (entity sets,
//! singletons, imports) use their bare container names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Vocabulary annotations attached to one model element, keyed by qualified
/// term name (e.g., `Org.OData.Capabilities.V1.InsertRestrictions`).
///
/// Values are raw CSDL-JSON records. They are interpreted by consumers, not
/// validated here.
pub type Annotations = BTreeMap<String, serde_json::Value>;

/// A complete, read-only service model.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EdmModel {
    /// All entity types across all schemas.
    pub entity_types: Vec<EntityType>,
    /// All actions and functions, bound and unbound.
    pub operations: Vec<Operation>,
    /// The entity container. A model without one exposes no paths.
    pub container: Option<EntityContainer>,
}

/// An entity type with its keys, properties and inheritance link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityType {
    /// Qualified name (`NS.Customer`).
    pub name: String,
    /// Qualified name of the base type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    /// Whether the type is abstract.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Whether instances are media entities (`HasStream`).
    #[serde(default)]
    pub has_stream: bool,
    /// Declared key property names. Empty when the key is inherited or absent.
    #[serde(default)]
    pub key: Vec<String>,
    /// Declared structural properties.
    #[serde(default)]
    pub properties: Vec<StructuralProperty>,
    /// Declared navigation properties.
    #[serde(default)]
    pub navigation_properties: Vec<NavigationProperty>,
    /// Annotations on the type itself.
    #[serde(default)]
    pub annotations: Annotations,
}

impl EntityType {
    /// Name without the namespace (`Customer` for `NS.Customer`).
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Namespace part of the qualified name (`NS` for `NS.Customer`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// Find a property declared directly on this type.
    #[must_use]
    pub fn declared_property(&self, name: &str) -> Option<&StructuralProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A primitive- or complex-typed property.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StructuralProperty {
    /// Property name.
    pub name: String,
    /// Type name, e.g. `Edm.Int32`, `Edm.Stream`, `Collection(Edm.String)`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the property accepts `null`.
    #[serde(default = "default_true")]
    pub nullable: bool,
}

impl StructuralProperty {
    /// Whether this property is an explicit `Edm.Stream` property.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.type_name == "Edm.Stream"
    }
}

/// A relationship from one entity type to another.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NavigationProperty {
    /// Property name.
    pub name: String,
    /// Target type: `NS.Order` or `Collection(NS.Order)`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the target is contained (`ContainsTarget`).
    #[serde(default)]
    pub contains_target: bool,
    /// Whether a single-valued target may be absent.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Annotations on the property.
    #[serde(default)]
    pub annotations: Annotations,
}

impl NavigationProperty {
    /// Parsed target type reference.
    #[must_use]
    pub fn target(&self) -> TypeRef<'_> {
        TypeRef::parse(&self.type_name)
    }

    /// Whether the property targets many entities.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.target().collection
    }
}

/// Action or function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Side-effecting operation, invoked with POST.
    Action,
    /// Side-effect-free operation, invoked with GET.
    Function,
}

/// A bound or unbound action or function.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Operation {
    /// Qualified name (`NS.renew`).
    pub name: String,
    /// Action or function.
    pub kind: OperationKind,
    /// Whether the first parameter is the binding parameter.
    #[serde(default)]
    pub is_bound: bool,
    /// Parameters in declaration order, binding parameter first when bound.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Return type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// Annotations on the operation.
    #[serde(default)]
    pub annotations: Annotations,
}

impl Operation {
    /// Name without the namespace.
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Whether this is a function.
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.kind == OperationKind::Function
    }

    /// The binding parameter type, for bound operations.
    #[must_use]
    pub fn binding_type(&self) -> Option<TypeRef<'_>> {
        if !self.is_bound {
            return None;
        }
        self.parameters.first().map(|p| TypeRef::parse(&p.type_name))
    }

    /// Parameters excluding the binding parameter.
    #[must_use]
    pub fn non_binding_parameters(&self) -> &[Parameter] {
        if self.is_bound && !self.parameters.is_empty() {
            &self.parameters[1..]
        } else {
            &self.parameters
        }
    }
}

/// An operation parameter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the parameter accepts `null`.
    #[serde(default = "default_true")]
    pub nullable: bool,
}

/// The entity container: the service's addressable roots.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EntityContainer {
    /// Container name.
    pub name: String,
    /// Entity sets in declaration order.
    pub entity_sets: Vec<EntitySet>,
    /// Singletons in declaration order.
    pub singletons: Vec<Singleton>,
    /// Action and function imports in declaration order.
    pub operation_imports: Vec<OperationImport>,
}

/// A named collection of entities.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntitySet {
    /// Set name.
    pub name: String,
    /// Qualified element type name.
    pub entity_type: String,
    /// Annotations on the set.
    #[serde(default)]
    pub annotations: Annotations,
}

/// A named single entity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Singleton {
    /// Singleton name.
    pub name: String,
    /// Qualified type name.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Annotations on the singleton.
    #[serde(default)]
    pub annotations: Annotations,
}

/// An action or function import exposing an unbound operation at the root.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperationImport {
    /// Import name.
    pub name: String,
    /// Qualified name of the imported operation.
    pub operation: String,
    /// Entity set the result belongs to, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
    /// Annotations on the import.
    #[serde(default)]
    pub annotations: Annotations,
}

/// A parsed type reference: `NS.T` or `Collection(NS.T)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef<'a> {
    /// Element type name.
    pub name: &'a str,
    /// Whether the reference is collection-valued.
    pub collection: bool,
}

impl<'a> TypeRef<'a> {
    /// Parse a type name, unwrapping `Collection(...)`.
    #[must_use]
    pub fn parse(type_name: &'a str) -> Self {
        let trimmed = type_name.trim();
        match trimmed
            .strip_prefix("Collection(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => Self {
                name: inner.trim(),
                collection: true,
            },
            None => Self {
                name: trimmed,
                collection: false,
            },
        }
    }

    /// Whether the element type is an `Edm.*` primitive.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.name.starts_with("Edm.")
    }
}

/// Text after the last `.` of a qualified name.
#[must_use]
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or(qualified, |(_, name)| name)
}

fn default_true() -> bool {
    true
}
