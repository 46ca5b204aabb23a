//! Resource paths: ordered, validated segment sequences.
//!
//! An [`ODataPath`] is immutable once built. Extending it with
//! [`ODataPath::with`] clones the prefix and checks the new segment against
//! the sequence rules:
//!
//! - the first segment is a navigation source or an operation import, and
//!   neither appears anywhere else;
//! - a key follows an entity set or a collection-valued navigation property;
//! - a type cast never directly follows another type cast;
//! - `$ref` follows a navigation property;
//! - operations and stream segments are terminal.
//!
//! The canonical path string comes from [`ODataPath::render`], which depends
//! on [`Settings`] (key style, key parameter naming).

pub mod provider;
pub mod segment;

use std::collections::HashSet;
use std::fmt;

use odata_edm::{EntityType, TypeRef};

pub use provider::{PathProvider, MAX_TYPE_CAST_DEPTH};
pub use segment::{NavigationSource, Segment};

use crate::config::Settings;
use crate::error::{Error, Result};

/// Shape of a path, derived from its terminal segment(s).
///
/// Together with a [`Verb`](crate::handler::Verb) this selects the
/// operation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathKind {
    /// `/Customers`
    EntitySet,
    /// `/Customers({ID})`
    Entity,
    /// `/Me`
    Singleton,
    /// `/Customers({ID})/Orders`, optionally keyed
    NavigationProperty,
    /// `/Customers({ID})/Orders/$ref`
    Ref,
    /// `/Customers({ID})/$value` or a stream property
    MediaEntity,
    /// `/Customers({ID})/NS.renew`
    Operation,
    /// `/ResetDataSource`
    OperationImport,
    /// `/People/NS.Employee`
    TypeCast,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EntitySet => "EntitySet",
            Self::Entity => "Entity",
            Self::Singleton => "Singleton",
            Self::NavigationProperty => "NavigationProperty",
            Self::Ref => "Ref",
            Self::MediaEntity => "MediaEntity",
            Self::Operation => "Operation",
            Self::OperationImport => "OperationImport",
            Self::TypeCast => "TypeCast",
        };
        f.write_str(name)
    }
}

/// A validated resource path.
#[derive(Debug, Clone)]
pub struct ODataPath<'a> {
    segments: Vec<Segment<'a>>,
    kind: PathKind,
}

impl<'a> ODataPath<'a> {
    /// Build a path from a full segment sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the sequence breaks a segment rule.
    pub fn new(segments: Vec<Segment<'a>>) -> Result<Self> {
        let mut prev: Option<&Segment<'a>> = None;
        for segment in &segments {
            check_follows(prev, segment).map_err(|reason| invalid(&segments, reason))?;
            prev = Some(segment);
        }
        let kind = kind_of(&segments).ok_or_else(|| invalid(&segments, "empty path"))?;
        Ok(Self { segments, kind })
    }

    /// A new path with `segment` appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `segment` may not follow this path.
    pub fn with(&self, segment: Segment<'a>) -> Result<Self> {
        check_follows(self.segments.last(), &segment)
            .map_err(|reason| invalid(&self.segments, reason))?;
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        let kind = kind_of(&segments).ok_or_else(|| invalid(&segments, "empty path"))?;
        Ok(Self { segments, kind })
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// The path's shape.
    #[must_use]
    pub fn kind(&self) -> PathKind {
        self.kind
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`: paths hold at least one segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The root navigation source, unless the path is an operation import.
    #[must_use]
    pub fn source(&self) -> Option<NavigationSource<'a>> {
        match self.segments.first() {
            Some(Segment::NavigationSource { source, .. }) => Some(*source),
            _ => None,
        }
    }

    /// Entity types of all segments that yield one, in path order.
    pub fn entity_types(&self) -> impl Iterator<Item = &'a EntityType> + '_ {
        self.segments.iter().filter_map(Segment::entity_type)
    }

    /// Entity type addressed by the last segment yielding one.
    #[must_use]
    pub fn entity_type(&self) -> Option<&'a EntityType> {
        self.segments.iter().rev().find_map(Segment::entity_type)
    }

    /// Number of type-cast segments.
    #[must_use]
    pub fn type_cast_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::TypeCast { .. }))
            .count()
    }

    /// Whether the addressed resource is collection-valued.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        let mut collection = false;
        for segment in &self.segments {
            match segment {
                Segment::NavigationSource { source, .. } => collection = source.is_collection(),
                Segment::Key { .. }
                | Segment::StreamContent { .. }
                | Segment::StreamProperty { .. } => collection = false,
                Segment::NavigationProperty { property, .. } => {
                    collection = property.is_collection();
                }
                Segment::Operation { operation } | Segment::OperationImport { operation, .. } => {
                    collection = operation
                        .return_type
                        .as_deref()
                        .is_some_and(|t| TypeRef::parse(t).collection);
                }
                Segment::TypeCast { .. } | Segment::Ref => {}
            }
        }
        collection
    }

    /// Slash-joined navigation property and type-cast identifiers, as used by
    /// `RestrictedProperties` entries of the root navigation source.
    #[must_use]
    pub fn restriction_path(&self) -> String {
        restriction_path(&self.segments)
    }

    /// Canonical path string and its parameters.
    #[must_use]
    pub fn render(&self, settings: &Settings) -> RenderedPath<'a> {
        let mut name = String::new();
        let mut parameters = Vec::new();
        let mut names = ParameterNames::default();

        for segment in &self.segments {
            match segment {
                Segment::NavigationSource { source, .. } => {
                    name.push('/');
                    name.push_str(source.name());
                }
                Segment::Key {
                    entity_type,
                    properties,
                } => {
                    if let [property] = properties.as_slice() {
                        let property = *property;
                        let base = if settings.prefix_entity_type_name_before_key {
                            format!("{}-{}", entity_type.short_name(), property.name)
                        } else {
                            property.name.clone()
                        };
                        let placeholder = names.unique(&base);
                        if settings.key_as_segment {
                            name.push_str(&format!("/{{{placeholder}}}"));
                        } else {
                            name.push_str(&format!("({{{placeholder}}})"));
                        }
                        parameters.push(PathParameter {
                            description: format!("key: {placeholder} of {}", entity_type.short_name()),
                            name: placeholder,
                            type_name: &property.type_name,
                            key_type: Some(entity_type.short_name()),
                        });
                    } else {
                        let mut parts = Vec::with_capacity(properties.len());
                        for &property in properties {
                            let placeholder = names.unique(&property.name);
                            parts.push(format!("{}={{{placeholder}}}", property.name));
                            parameters.push(PathParameter {
                                description: format!("key: {placeholder} of {}", entity_type.short_name()),
                                name: placeholder,
                                type_name: &property.type_name,
                                key_type: Some(entity_type.short_name()),
                            });
                        }
                        name.push_str(&format!("({})", parts.join(",")));
                    }
                }
                Segment::NavigationProperty { property, .. } => {
                    name.push('/');
                    name.push_str(&property.name);
                }
                Segment::TypeCast { entity_type } => {
                    name.push('/');
                    name.push_str(&entity_type.name);
                }
                Segment::Operation { operation } => {
                    name.push('/');
                    name.push_str(&operation.name);
                    if operation.is_function() {
                        render_function_parameters(*operation, &mut name, &mut parameters, &mut names);
                    }
                }
                Segment::OperationImport { import, operation } => {
                    name.push('/');
                    name.push_str(&import.name);
                    if operation.is_function() {
                        render_function_parameters(*operation, &mut name, &mut parameters, &mut names);
                    }
                }
                Segment::StreamContent { .. } => name.push_str("/$value"),
                Segment::StreamProperty { property, .. } => {
                    name.push('/');
                    name.push_str(&property.name);
                }
                Segment::Ref => name.push_str("/$ref"),
            }
        }

        RenderedPath { name, parameters }
    }
}

/// A path's canonical string and the parameters its placeholders declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPath<'a> {
    /// Canonical path string (`/Customers({ID})/Orders`).
    pub name: String,
    /// One entry per `{placeholder}`, in path order.
    pub parameters: Vec<PathParameter<'a>>,
}

/// A `{placeholder}` in a canonical path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParameter<'a> {
    /// Placeholder name, unique within the path.
    pub name: String,
    /// EDM type of the key property or function parameter.
    pub type_name: &'a str,
    /// Human-readable description.
    pub description: String,
    /// Short name of the entity type whose key this placeholder carries.
    pub key_type: Option<&'a str>,
}

/// Slash-joined navigation property and type-cast identifiers of `segments`.
#[must_use]
pub fn restriction_path(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .filter(|s| matches!(s, Segment::NavigationProperty { .. } | Segment::TypeCast { .. }))
        .map(Segment::identifier)
        .collect::<Vec<_>>()
        .join("/")
}

fn render_function_parameters<'a>(
    operation: &'a odata_edm::Operation,
    name: &mut String,
    parameters: &mut Vec<PathParameter<'a>>,
    names: &mut ParameterNames,
) {
    let mut parts = Vec::new();
    for parameter in operation.non_binding_parameters() {
        let placeholder = names.unique(&parameter.name);
        parts.push(format!("{}={{{placeholder}}}", parameter.name));
        parameters.push(PathParameter {
            name: placeholder.clone(),
            type_name: &parameter.type_name,
            description: format!("Usage: {}={{{placeholder}}}", parameter.name),
            key_type: None,
        });
    }
    name.push_str(&format!("({})", parts.join(",")));
}

/// Hands out placeholder names, suffixing repeats (`ID`, `ID1`, `ID2`).
///
/// A suffixed candidate is skipped when an earlier placeholder already
/// took that name verbatim.
#[derive(Default)]
struct ParameterNames {
    used: HashSet<String>,
}

impl ParameterNames {
    fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 1;
        while self.used.contains(&name) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

fn check_follows(prev: Option<&Segment<'_>>, segment: &Segment<'_>) -> std::result::Result<(), &'static str> {
    let Some(prev) = prev else {
        return match segment {
            Segment::NavigationSource { .. } | Segment::OperationImport { .. } => Ok(()),
            _ => Err("path must start with an entity set, singleton or operation import"),
        };
    };

    if prev.is_terminal() {
        return Err("segment follows a terminal segment");
    }

    match segment {
        Segment::NavigationSource { .. } | Segment::OperationImport { .. } => {
            Err("navigation sources and imports must be the first segment")
        }
        Segment::Key { properties, .. } => {
            if properties.is_empty() {
                return Err("key segment without key properties");
            }
            match prev {
                Segment::NavigationSource {
                    source: NavigationSource::EntitySet(_),
                    ..
                } => Ok(()),
                Segment::NavigationProperty { property, .. } if property.is_collection() => Ok(()),
                _ => Err("key segment must follow a collection"),
            }
        }
        Segment::TypeCast { .. } => match prev {
            Segment::TypeCast { .. } => Err("type cast directly follows a type cast"),
            _ => Ok(()),
        },
        Segment::Ref => match prev {
            Segment::NavigationProperty { .. } => Ok(()),
            _ => Err("$ref must follow a navigation property"),
        },
        Segment::NavigationProperty { .. }
        | Segment::Operation { .. }
        | Segment::StreamContent { .. }
        | Segment::StreamProperty { .. } => Ok(()),
    }
}

fn kind_of(segments: &[Segment<'_>]) -> Option<PathKind> {
    let kind = match segments {
        [] => return None,
        [.., Segment::NavigationProperty { .. }, Segment::Key { .. }]
        | [.., Segment::NavigationProperty { .. }] => PathKind::NavigationProperty,
        [.., Segment::Key { .. }] => PathKind::Entity,
        [.., Segment::NavigationSource { source, .. }] => match source {
            NavigationSource::EntitySet(_) => PathKind::EntitySet,
            NavigationSource::Singleton(_) => PathKind::Singleton,
        },
        [.., Segment::TypeCast { .. }] => PathKind::TypeCast,
        [.., Segment::Operation { .. }] => PathKind::Operation,
        [.., Segment::OperationImport { .. }] => PathKind::OperationImport,
        [.., Segment::StreamContent { .. } | Segment::StreamProperty { .. }] => PathKind::MediaEntity,
        [.., Segment::Ref] => PathKind::Ref,
    };
    Some(kind)
}

fn invalid(segments: &[Segment<'_>], reason: &'static str) -> Error {
    Error::InvalidPath {
        path: segments
            .iter()
            .map(Segment::identifier)
            .collect::<Vec<_>>()
            .join("/"),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use odata_edm::EdmModel;
    use pretty_assertions::assert_eq;

    fn model() -> EdmModel {
        serde_yaml_ng::from_str(indoc! {r"
            entity_types:
              - name: NS.Customer
                key: [ID]
                properties:
                  - { name: ID, type: Edm.Int32 }
                navigation_properties:
                  - { name: Orders, type: Collection(NS.Order), contains_target: true }
                  - { name: Lines, type: Collection(NS.Line), contains_target: true }
              - name: NS.Order
                key: [ID, Line]
                properties:
                  - { name: ID, type: Edm.Int32 }
                  - { name: Line, type: Edm.Int32 }
              - name: NS.Line
                key: [ID1, ID]
                properties:
                  - { name: ID1, type: Edm.Int32 }
                  - { name: ID, type: Edm.String }
            operations:
              - name: NS.delta
                kind: function
                is_bound: true
                parameters:
                  - { name: bindingParameter, type: Collection(NS.Customer) }
                  - { name: since, type: Edm.String }
            container:
              entity_sets:
                - { name: Customers, entity_type: NS.Customer }
              singletons:
                - { name: Me, type: NS.Customer }
        "})
        .unwrap()
    }

    fn customers(model: &EdmModel) -> ODataPath<'_> {
        let container = model.container.as_ref().unwrap();
        ODataPath::new(vec![Segment::NavigationSource {
            source: NavigationSource::EntitySet(&container.entity_sets[0]),
            entity_type: &model.entity_types[0],
        }])
        .unwrap()
    }

    fn customer_key(model: &EdmModel) -> Segment<'_> {
        let customer = &model.entity_types[0];
        Segment::Key {
            entity_type: customer,
            properties: vec![&customer.properties[0]],
        }
    }

    fn orders_nav(model: &EdmModel) -> Segment<'_> {
        let customer = &model.entity_types[0];
        Segment::NavigationProperty {
            property: &customer.navigation_properties[0],
            declaring_type: customer,
            target: &model.entity_types[1],
        }
    }

    #[test]
    fn renders_single_key_styles() {
        let model = model();
        let path = customers(&model).with(customer_key(&model)).unwrap();

        assert_eq!(path.render(&Settings::default()).name, "/Customers({ID})");
        assert_eq!(
            path.render(&Settings::default().key_as_segment(true)).name,
            "/Customers/{ID}"
        );
        assert_eq!(
            path.render(&Settings::default().prefix_entity_type_name_before_key(true))
                .name,
            "/Customers({Customer-ID})"
        );
        assert_eq!(path.kind(), PathKind::Entity);
        assert!(!path.is_collection());
    }

    #[test]
    fn composite_key_placeholders_are_unique() {
        let model = model();
        let order = &model.entity_types[1];
        let path = customers(&model)
            .with(customer_key(&model))
            .unwrap()
            .with(orders_nav(&model))
            .unwrap()
            .with(Segment::Key {
                entity_type: order,
                properties: order.properties.iter().collect(),
            })
            .unwrap();

        let rendered = path.render(&Settings::default());
        assert_eq!(rendered.name, "/Customers({ID})/Orders(ID={ID1},Line={Line})");
        let names: Vec<&str> = rendered.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "ID1", "Line"]);
        assert_eq!(path.kind(), PathKind::NavigationProperty);
        assert_eq!(path.restriction_path(), "Orders");
    }

    #[test]
    fn suffixed_placeholder_skips_names_taken_by_key_properties() {
        let model = model();
        let customer = &model.entity_types[0];
        let line = &model.entity_types[2];
        let path = customers(&model)
            .with(customer_key(&model))
            .unwrap()
            .with(Segment::NavigationProperty {
                property: &customer.navigation_properties[1],
                declaring_type: customer,
                target: line,
            })
            .unwrap()
            .with(Segment::Key {
                entity_type: line,
                properties: line.properties.iter().collect(),
            })
            .unwrap();

        let rendered = path.render(&Settings::default());
        assert_eq!(rendered.name, "/Customers({ID})/Lines(ID1={ID1},ID={ID2})");
        let names: Vec<&str> = rendered.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "ID1", "ID2"]);
        assert_eq!(rendered.parameters[2].type_name, "Edm.String");
    }

    #[test]
    fn key_parameters_name_their_entity_type() {
        let model = model();
        let path = customers(&model).with(customer_key(&model)).unwrap();
        let rendered = path.render(&Settings::default().prefix_entity_type_name_before_key(true));
        let key = &rendered.parameters[0];
        assert_eq!(key.description, "key: Customer-ID of Customer");
        assert_eq!(key.key_type, Some("Customer"));

        let function = customers(&model)
            .with(Segment::Operation {
                operation: &model.operations[0],
            })
            .unwrap()
            .render(&Settings::default());
        assert_eq!(function.parameters[0].key_type, None);
    }

    #[test]
    fn renders_bound_function_with_parameters() {
        let model = model();
        let path = customers(&model)
            .with(Segment::Operation {
                operation: &model.operations[0],
            })
            .unwrap();
        let rendered = path.render(&Settings::default());
        assert_eq!(rendered.name, "/Customers/NS.delta(since={since})");
        assert_eq!(rendered.parameters[0].type_name, "Edm.String");
        assert_eq!(path.kind(), PathKind::Operation);
    }

    #[test]
    fn kinds_follow_terminal_segment() {
        let model = model();
        let root = customers(&model);
        assert_eq!(root.kind(), PathKind::EntitySet);
        assert!(root.is_collection());

        let nav = root
            .with(customer_key(&model))
            .unwrap()
            .with(orders_nav(&model))
            .unwrap();
        assert_eq!(nav.kind(), PathKind::NavigationProperty);
        assert!(nav.is_collection());
        assert_eq!(nav.with(Segment::Ref).unwrap().kind(), PathKind::Ref);
        assert_eq!(nav.with(Segment::Ref).unwrap().render(&Settings::default()).name, "/Customers({ID})/Orders/$ref");

        let me = ODataPath::new(vec![Segment::NavigationSource {
            source: NavigationSource::Singleton(&model.container.as_ref().unwrap().singletons[0]),
            entity_type: &model.entity_types[0],
        }])
        .unwrap();
        assert_eq!(me.kind(), PathKind::Singleton);
        assert_eq!(
            me.with(Segment::StreamContent {
                entity_type: &model.entity_types[0]
            })
            .unwrap()
            .kind(),
            PathKind::MediaEntity
        );
    }

    #[test]
    fn rejects_invalid_sequences() {
        let model = model();
        let customer = &model.entity_types[0];

        assert!(matches!(
            ODataPath::new(vec![customer_key(&model)]),
            Err(Error::InvalidPath { .. })
        ));
        assert!(ODataPath::new(Vec::new()).is_err());

        let root = customers(&model);
        assert!(root.with(Segment::Ref).is_err());

        let cast = root
            .with(Segment::TypeCast {
                entity_type: customer,
            })
            .unwrap();
        assert!(cast
            .with(Segment::TypeCast {
                entity_type: customer
            })
            .is_err());

        let value = root
            .with(customer_key(&model))
            .unwrap()
            .with(Segment::StreamContent {
                entity_type: customer,
            })
            .unwrap();
        let err = value.with(orders_nav(&model)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid path 'Customers/{key}/$value': segment follows a terminal segment"
        );
    }

    #[test]
    fn path_kind_display_is_variant_name() {
        assert_eq!(PathKind::MediaEntity.to_string(), "MediaEntity");
        assert_eq!(PathKind::OperationImport.to_string(), "OperationImport");
    }
}
