//! Capability restriction evaluator.
//!
//! All capability annotations of a model are parsed once per run into a flat
//! `Element → Restriction` map. Lookups are then pure map reads:
//!
//! - a navigation property resolves first to its declaring-type-level record
//!   (the property's own `NavigationRestrictions`, or the declaring type's
//!   `RestrictedProperties` entry naming it), then to the root navigation
//!   source's `RestrictedProperties` entry for the slash-joined path, then to
//!   permissive defaults;
//! - records are never merged across sources: the first match wins.

use std::collections::HashMap;

use odata_edm::vocabulary::{self, capability_term};
use odata_edm::{Annotations, EdmModel, NavigationProperty};
use serde_json::Value;

/// Effective capability policy of one navigable element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Restriction {
    /// The element can be navigated to.
    pub navigable: bool,
    /// Entities can be addressed by key.
    pub indexable_by_key: bool,
    /// Entities can be read.
    pub readable: bool,
    /// Entities can be created.
    pub insertable: bool,
    /// Entities can be updated.
    pub updatable: bool,
    /// Entities can be deleted.
    pub deletable: bool,
    /// Supported query options.
    pub query: QuerySupport,
    /// Required permission scopes per access kind.
    pub permissions: Permissions,
}

/// Which system query options a collection supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuerySupport {
    /// `$top`
    pub top: bool,
    /// `$skip`
    pub skip: bool,
    /// `$search`
    pub search: bool,
    /// `$filter`
    pub filter: bool,
    /// `$count`
    pub count: bool,
    /// `$orderby`
    pub orderby: bool,
    /// `$select`
    pub select: bool,
    /// `$expand`
    pub expand: bool,
}

/// Permission requirements grouped by access kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    /// Reading (collection or single).
    pub read: Vec<PermissionScheme>,
    /// Reading a single entity by key, when it differs from `read`.
    pub read_by_key: Option<Vec<PermissionScheme>>,
    /// Creating.
    pub insert: Vec<PermissionScheme>,
    /// Updating.
    pub update: Vec<PermissionScheme>,
    /// Deleting.
    pub delete: Vec<PermissionScheme>,
    /// Invoking an operation.
    pub invoke: Vec<PermissionScheme>,
}

/// One authorization scheme and the scopes it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionScheme {
    /// Security scheme name (e.g., `Delegated`).
    pub scheme_name: String,
    /// Scopes granting the permission.
    pub scopes: Vec<String>,
}

impl Restriction {
    /// Fully permissive defaults, used when no annotation applies.
    pub const PERMISSIVE: Self = Self {
        navigable: true,
        indexable_by_key: true,
        readable: true,
        insertable: true,
        updatable: true,
        deletable: true,
        query: QuerySupport {
            top: true,
            skip: true,
            search: true,
            filter: true,
            count: true,
            orderby: true,
            select: true,
            expand: true,
        },
        permissions: Permissions {
            read: Vec::new(),
            read_by_key: None,
            insert: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
            invoke: Vec::new(),
        },
    };

    /// Parse an element's annotation bag (qualified term names).
    #[must_use]
    pub fn from_annotations(annotations: &Annotations) -> Self {
        Self::parse(|short| match short {
            "Navigability" => annotations
                .get(vocabulary::NAVIGATION_RESTRICTIONS)
                .and_then(|r| r.get("Navigability")),
            other => annotations.get(capability_term(other).as_str()),
        })
    }

    /// Parse a `RestrictedProperties` entry record (short property names).
    #[must_use]
    pub fn from_record(record: &Value) -> Self {
        Self::parse(|short| record.get(short))
    }

    fn parse<'v>(get: impl Fn(&str) -> Option<&'v Value>) -> Self {
        let read = get("ReadRestrictions");
        let insert = get("InsertRestrictions");
        let update = get("UpdateRestrictions");
        let delete = get("DeleteRestrictions");

        Self {
            navigable: get("Navigability").is_none_or(|v| !is_navigability_none(v)),
            indexable_by_key: tag_value(get("IndexableByKey")),
            readable: record_flag(read, "Readable"),
            insertable: record_flag(insert, "Insertable"),
            updatable: record_flag(update, "Updatable"),
            deletable: record_flag(delete, "Deletable"),
            query: QuerySupport {
                top: tag_value(get("TopSupported")),
                skip: tag_value(get("SkipSupported")),
                search: record_flag(get("SearchRestrictions"), "Searchable"),
                filter: record_flag(get("FilterRestrictions"), "Filterable"),
                count: record_flag(get("CountRestrictions"), "Countable"),
                orderby: record_flag(get("SortRestrictions"), "Sortable"),
                select: record_flag(get("SelectSupport"), "Supported"),
                expand: record_flag(get("ExpandRestrictions"), "Expandable"),
            },
            permissions: Permissions {
                read: permission_schemes(read),
                read_by_key: read
                    .and_then(|r| r.get("ReadByKeyRestrictions"))
                    .map(|r| permission_schemes(Some(r))),
                insert: permission_schemes(insert),
                update: permission_schemes(update),
                delete: permission_schemes(delete),
                invoke: permission_schemes(get("OperationRestrictions")),
            },
        }
    }
}

impl Default for Restriction {
    fn default() -> Self {
        Self::PERMISSIVE
    }
}

static PERMISSIVE: Restriction = Restriction::PERMISSIVE;

/// An annotatable element restrictions are indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    /// An entity set or singleton, by container name.
    NavigationSource(String),
    /// A navigation property on its declaring entity type.
    NavigationProperty {
        /// Qualified declaring type name.
        declaring_type: String,
        /// Property name.
        property: String,
    },
    /// A `RestrictedProperties` entry of a navigation source, by path.
    RestrictedPath {
        /// Navigation source name.
        source: String,
        /// Slash-joined navigation property path (`Orders/Items`).
        path: String,
    },
    /// An action or function, by qualified name.
    Operation(String),
}

impl Element {
    /// Navigation source element.
    #[must_use]
    pub fn source(name: &str) -> Self {
        Self::NavigationSource(name.to_string())
    }

    /// Navigation property element.
    #[must_use]
    pub fn property(declaring_type: &str, property: &str) -> Self {
        Self::NavigationProperty {
            declaring_type: declaring_type.to_string(),
            property: property.to_string(),
        }
    }
}

/// Pre-indexed restriction lookups for one model.
#[derive(Debug, Default)]
pub struct RestrictionEvaluator {
    restrictions: HashMap<Element, Restriction>,
    derived_type_constraints: HashMap<Element, Vec<String>>,
}

impl RestrictionEvaluator {
    /// Parse and index every capability annotation in the model.
    #[must_use]
    pub fn new(model: &EdmModel) -> Self {
        let mut evaluator = Self::default();

        if let Some(container) = &model.container {
            let sources = container
                .entity_sets
                .iter()
                .map(|s| (&s.name, &s.annotations))
                .chain(
                    container
                        .singletons
                        .iter()
                        .map(|s| (&s.name, &s.annotations)),
                );
            for (name, annotations) in sources {
                evaluator.index_source(name, annotations);
            }
        }

        for ty in &model.entity_types {
            for property in &ty.navigation_properties {
                evaluator.index_property(&ty.name, property);
            }
            // Type-level entries only fill gaps left by property-level annotations.
            for entry in restricted_properties(&ty.annotations) {
                if let Some(name) = entry.get("NavigationProperty").and_then(Value::as_str) {
                    evaluator
                        .restrictions
                        .entry(Element::property(&ty.name, name))
                        .or_insert_with(|| Restriction::from_record(entry));
                }
            }
        }

        for op in &model.operations {
            if has_capabilities(&op.annotations) {
                evaluator.restrictions.insert(
                    Element::Operation(op.name.clone()),
                    Restriction::from_annotations(&op.annotations),
                );
            }
        }

        evaluator
    }

    fn index_source(&mut self, name: &str, annotations: &Annotations) {
        if has_capabilities(annotations) {
            self.restrictions
                .insert(Element::source(name), Restriction::from_annotations(annotations));
        }

        for entry in restricted_properties(annotations) {
            let Some(path) = entry.get("NavigationProperty").and_then(Value::as_str) else {
                continue;
            };
            self.restrictions
                .entry(Element::RestrictedPath {
                    source: name.to_string(),
                    path: path.to_string(),
                })
                .or_insert_with(|| Restriction::from_record(entry));
        }

        self.index_derived_type_constraint(Element::source(name), annotations);
    }

    fn index_property(&mut self, declaring_type: &str, property: &NavigationProperty) {
        let element = Element::property(declaring_type, &property.name);
        let annotations = &property.annotations;

        if has_capabilities(annotations) {
            let entry = restricted_properties(annotations).find(|e| {
                e.get("NavigationProperty")
                    .and_then(Value::as_str)
                    .is_none_or(|p| p == property.name)
            });
            let restriction = match entry {
                Some(entry) => {
                    let mut r = Restriction::from_record(entry);
                    if entry.get("Navigability").is_none() {
                        r.navigable = Restriction::from_annotations(annotations).navigable;
                    }
                    r
                }
                None => Restriction::from_annotations(annotations),
            };
            self.restrictions.insert(element.clone(), restriction);
        }

        self.index_derived_type_constraint(element, annotations);
    }

    fn index_derived_type_constraint(&mut self, element: Element, annotations: &Annotations) {
        let Some(value) = annotations.get(vocabulary::DERIVED_TYPE_CONSTRAINT) else {
            return;
        };
        let Some(entries) = value.as_array() else {
            tracing::warn!(?element, "DerivedTypeConstraint is not a collection, ignoring");
            return;
        };

        let mut allowed = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.as_str() {
                Some(name) => allowed.push(name.to_string()),
                None => tracing::warn!(?element, %entry, "skipping non-string DerivedTypeConstraint entry"),
            }
        }
        self.derived_type_constraints.insert(element, allowed);
    }

    /// Restriction recorded for exactly this element, if any.
    #[must_use]
    pub fn get(&self, element: &Element) -> Option<&Restriction> {
        self.restrictions.get(element)
    }

    /// Effective restriction of an entity set or singleton.
    #[must_use]
    pub fn navigation_source(&self, name: &str) -> &Restriction {
        self.get(&Element::source(name)).unwrap_or(&PERMISSIVE)
    }

    /// Effective restriction of a navigation property reached from `source`
    /// along `path` (slash-joined property path ending in `property`).
    #[must_use]
    pub fn navigation_property(
        &self,
        source: &str,
        declaring_type: &str,
        property: &str,
        path: &str,
    ) -> &Restriction {
        self.get(&Element::property(declaring_type, property))
            .or_else(|| {
                self.get(&Element::RestrictedPath {
                    source: source.to_string(),
                    path: path.to_string(),
                })
            })
            .unwrap_or(&PERMISSIVE)
    }

    /// Effective restriction of an action or function.
    #[must_use]
    pub fn operation(&self, name: &str) -> &Restriction {
        self.get(&Element::Operation(name.to_string()))
            .unwrap_or(&PERMISSIVE)
    }

    /// The `DerivedTypeConstraint` allow-list of an element, if annotated.
    #[must_use]
    pub fn derived_type_constraint(&self, element: &Element) -> Option<&[String]> {
        self.derived_type_constraints
            .get(element)
            .map(Vec::as_slice)
    }

    /// Whether the element's allow-list names `type_name`.
    #[must_use]
    pub fn allows_derived_type(&self, element: &Element, type_name: &str) -> bool {
        self.derived_type_constraint(element)
            .is_some_and(|allowed| allowed.iter().any(|t| t == type_name))
    }
}

fn has_capabilities(annotations: &Annotations) -> bool {
    annotations
        .keys()
        .any(|term| term.starts_with(vocabulary::CAPABILITIES_NAMESPACE))
}

fn restricted_properties(annotations: &Annotations) -> impl Iterator<Item = &Value> {
    annotations
        .get(vocabulary::NAVIGATION_RESTRICTIONS)
        .and_then(|r| r.get("RestrictedProperties"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// `None` or `…NavigationType/None`.
fn is_navigability_none(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s == "None" || s.ends_with("/None"))
}

/// A tag term: bare boolean, or absent (= supported).
fn tag_value(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(true)
}

fn record_flag(record: Option<&Value>, field: &str) -> bool {
    record
        .and_then(|r| r.get(field))
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn permission_schemes(record: Option<&Value>) -> Vec<PermissionScheme> {
    let Some(permissions) = record
        .and_then(|r| r.get("Permissions"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    permissions
        .iter()
        .filter_map(|p| {
            let scheme_name = p.get("SchemeName")?.as_str()?.to_string();
            let scopes = p
                .get("Scopes")
                .and_then(Value::as_array)
                .map(|scopes| {
                    scopes
                        .iter()
                        .filter_map(|s| s.get("Scope").and_then(Value::as_str))
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(PermissionScheme {
                scheme_name,
                scopes,
            })
        })
        .collect()
}
