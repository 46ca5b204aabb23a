//! Operation handlers: one per (path kind, verb).
//!
//! A handler turns a finished path into one [`Operation`]. All handlers run
//! the same phases, each a separate trait method so they can be tested and
//! overridden independently:
//!
//! | Phase | Method |
//! |-------|--------|
//! | summary, description, operation id | [`OperationHandler::basic_info`] |
//! | tags | [`OperationHandler::tags`] |
//! | path and query parameters | [`OperationHandler::parameters`] |
//! | request body | [`OperationHandler::request_body`] |
//! | responses | [`OperationHandler::responses`] |
//! | security requirements | [`OperationHandler::security`] |
//! | vendor extensions | [`OperationHandler::extensions`] |
//!
//! Tags are returned with each [`HandlerOutput`] rather than written to a
//! shared catalogue; the assembler merges them.

mod entity;
mod entity_set;
pub mod helpers;
mod media;
mod navigation;
mod operation;
mod reference;
mod singleton;
mod type_cast;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use odata_edm::{EntityType, NavigationProperty, Operation as EdmOperation, OperationImport, StructuralProperty};
use serde::Serialize;

use crate::config::Settings;
use crate::context::ODataContext;
use crate::error::{Error, Result};
use crate::openapi::{Extensions, Operation, Parameter, RequestBody, Response, SecurityRequirement, Tag};
use crate::path::{restriction_path, NavigationSource, ODataPath, PathKind, RenderedPath, Segment};
use crate::restriction::Restriction;

/// HTTP method of an operation.
///
/// Ordered as `OpenAPI` path items list them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

/// The navigation property a path traverses last.
#[derive(Debug, Clone, Copy)]
pub struct NavigationContext<'a> {
    /// The property.
    pub property: &'a NavigationProperty,
    /// Type declaring the property.
    pub declaring_type: &'a EntityType,
    /// Entity type of the path before the property.
    pub owner: &'a EntityType,
    /// Target entity type.
    pub target: &'a EntityType,
    /// Index of the property's segment in the path.
    pub position: usize,
}

/// The cast a path ends with.
#[derive(Debug, Clone, Copy)]
pub struct CastContext<'a> {
    /// Entity type before the cast.
    pub parent: &'a EntityType,
    /// Cast target.
    pub target: &'a EntityType,
}

/// Context elements resolved once per path, shared by all its handlers.
#[derive(Debug)]
pub struct OperationContext<'c, 'a> {
    odata: &'c ODataContext<'a>,
    path: &'c ODataPath<'a>,
    rendered: RenderedPath<'a>,
    source: Option<NavigationSource<'a>>,
    entity_type: Option<&'a EntityType>,
    navigation: Option<NavigationContext<'a>>,
    cast: Option<CastContext<'a>>,
    operation: Option<&'a EdmOperation>,
    import: Option<&'a OperationImport>,
    stream_property: Option<&'a StructuralProperty>,
    restriction: &'c Restriction,
    collection: bool,
}

impl<'c, 'a> OperationContext<'c, 'a> {
    /// Resolve the elements the path's shape requires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if the shape needs an element the
    /// path does not provide (for example a type cast with no entity type
    /// before it).
    pub fn resolve(odata: &'c ODataContext<'a>, path: &'c ODataPath<'a>) -> Result<Self> {
        let rendered = path.render(odata.settings);
        let segments = path.segments();
        let missing = |what: &'static str| Error::MissingContext {
            path: rendered.name.clone(),
            missing: what,
        };

        let source = path.source();

        let mut navigation = None;
        for (position, segment) in segments.iter().enumerate().rev() {
            if let Segment::NavigationProperty {
                property,
                declaring_type,
                target,
            } = segment
            {
                let owner = segments[..position]
                    .iter()
                    .rev()
                    .find_map(Segment::entity_type)
                    .ok_or_else(|| missing("entity type owning the navigation property"))?;
                navigation = Some(NavigationContext {
                    property: *property,
                    declaring_type: *declaring_type,
                    owner,
                    target: *target,
                    position,
                });
                break;
            }
        }

        let (cast, operation, import, stream_property, entity_type) = match segments {
            [rest @ .., Segment::TypeCast { entity_type }] => {
                let parent = rest
                    .iter()
                    .rev()
                    .find_map(Segment::entity_type)
                    .ok_or_else(|| missing("entity type before type cast"))?;
                let cast = CastContext {
                    parent,
                    target: *entity_type,
                };
                (Some(cast), None, None, None, Some(*entity_type))
            }
            [.., Segment::Operation { operation }] => (None, Some(*operation), None, None, path.entity_type()),
            [.., Segment::OperationImport { import, operation }] => {
                (None, Some(*operation), Some(*import), None, None)
            }
            [.., Segment::StreamContent { entity_type }] => (None, None, None, None, Some(*entity_type)),
            [.., Segment::StreamProperty {
                property,
                entity_type,
            }] => (None, None, None, Some(*property), Some(*entity_type)),
            _ => (None, None, None, None, path.entity_type()),
        };

        let kind = path.kind();
        match kind {
            PathKind::EntitySet
            | PathKind::Entity
            | PathKind::Singleton
            | PathKind::MediaEntity
            | PathKind::TypeCast => {
                source.ok_or_else(|| missing("navigation source"))?;
                entity_type.ok_or_else(|| missing("entity type"))?;
            }
            PathKind::NavigationProperty | PathKind::Ref => {
                source.ok_or_else(|| missing("navigation source"))?;
                navigation.ok_or_else(|| missing("navigation property"))?;
            }
            PathKind::Operation | PathKind::OperationImport => {
                operation.ok_or_else(|| missing("operation"))?;
            }
        }

        let restrictions = &odata.restrictions;
        let restriction = match (&navigation, source, operation) {
            (Some(nav), Some(source), _) => restrictions.navigation_property(
                source.name(),
                &nav.declaring_type.name,
                &nav.property.name,
                &restriction_path(&segments[..=nav.position]),
            ),
            (None, Some(source), _) => restrictions.navigation_source(source.name()),
            (_, None, Some(operation)) => restrictions.operation(&operation.name),
            (_, None, None) => return Err(missing("navigation source")),
        };

        Ok(Self {
            odata,
            path,
            collection: path.is_collection(),
            rendered,
            source,
            entity_type,
            navigation,
            cast,
            operation,
            import,
            stream_property,
            restriction,
        })
    }

    /// The run context.
    #[must_use]
    pub fn odata(&self) -> &'c ODataContext<'a> {
        self.odata
    }

    /// Conversion settings.
    #[must_use]
    pub fn settings(&self) -> &'a Settings {
        self.odata.settings
    }

    /// The path being described.
    #[must_use]
    pub fn path(&self) -> &'c ODataPath<'a> {
        self.path
    }

    /// The path's shape.
    #[must_use]
    pub fn kind(&self) -> PathKind {
        self.path.kind()
    }

    /// Canonical path string.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.rendered.name
    }

    /// Rendered path with its placeholder parameters.
    #[must_use]
    pub fn rendered(&self) -> &RenderedPath<'a> {
        &self.rendered
    }

    /// Whether the addressed resource is collection-valued.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Effective restriction of the last navigable element (the last
    /// navigation property, else the navigation source, else the imported
    /// operation).
    #[must_use]
    pub fn restriction(&self) -> &'c Restriction {
        self.restriction
    }

    /// Root navigation source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] for operation import paths.
    pub fn source(&self) -> Result<NavigationSource<'a>> {
        self.source.ok_or_else(|| self.missing("navigation source"))
    }

    /// Entity type the operation acts on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if the path yields no entity type.
    pub fn entity_type(&self) -> Result<&'a EntityType> {
        self.entity_type.ok_or_else(|| self.missing("entity type"))
    }

    /// Last navigation property on the path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if the path has none.
    pub fn navigation(&self) -> Result<NavigationContext<'a>> {
        self.navigation.ok_or_else(|| self.missing("navigation property"))
    }

    /// The cast the path ends with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if the path does not end with one.
    pub fn cast(&self) -> Result<CastContext<'a>> {
        self.cast.ok_or_else(|| self.missing("entity type before type cast"))
    }

    /// The bound or imported operation the path ends with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if the path does not end with one.
    pub fn operation(&self) -> Result<&'a EdmOperation> {
        self.operation.ok_or_else(|| self.missing("operation"))
    }

    /// The operation import, for import paths.
    #[must_use]
    pub fn import(&self) -> Option<&'a OperationImport> {
        self.import
    }

    /// The named stream property, for stream property paths.
    #[must_use]
    pub fn stream_property(&self) -> Option<&'a StructuralProperty> {
        self.stream_property
    }

    /// Verbs the path supports under its restriction.
    #[must_use]
    pub fn verbs(&self) -> Vec<Verb> {
        let r = self.restriction;
        let gated = |allowed: bool, verb: Verb| allowed.then_some(verb);

        let verbs = match self.kind() {
            PathKind::EntitySet => vec![gated(r.readable, Verb::Get), gated(r.insertable, Verb::Post)],
            PathKind::Entity => vec![
                gated(r.readable, Verb::Get),
                gated(r.updatable, Verb::Patch),
                gated(r.deletable, Verb::Delete),
            ],
            PathKind::Singleton => vec![gated(r.readable, Verb::Get), gated(r.updatable, Verb::Patch)],
            PathKind::NavigationProperty => {
                let contained = self.navigation.is_some_and(|n| n.property.contains_target);
                if !contained {
                    vec![gated(r.readable, Verb::Get)]
                } else if self.collection {
                    vec![gated(r.readable, Verb::Get), gated(r.insertable, Verb::Post)]
                } else {
                    vec![
                        gated(r.readable, Verb::Get),
                        gated(r.updatable, Verb::Patch),
                        gated(r.deletable, Verb::Delete),
                    ]
                }
            }
            PathKind::Ref => {
                if self.navigation.is_some_and(|n| n.property.is_collection()) {
                    vec![Some(Verb::Get), Some(Verb::Post), Some(Verb::Delete)]
                } else {
                    vec![Some(Verb::Get), Some(Verb::Put), Some(Verb::Delete)]
                }
            }
            PathKind::MediaEntity => vec![gated(r.readable, Verb::Get), gated(r.updatable, Verb::Put)],
            PathKind::Operation | PathKind::OperationImport => {
                vec![self.operation.map(|op| if op.is_function() { Verb::Get } else { Verb::Post })]
            }
            PathKind::TypeCast => vec![Some(Verb::Get)],
        };

        verbs.into_iter().flatten().collect()
    }

    fn missing(&self, what: &'static str) -> Error {
        Error::MissingContext {
            path: self.rendered.name.clone(),
            missing: what,
        }
    }
}

/// Summary, description and operation id of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicInfo {
    /// Summary line.
    pub summary: String,
    /// Longer description, when the model documents the element.
    pub description: Option<String>,
    /// Operation id (emitted only when enabled in settings).
    pub operation_id: String,
}

/// Synthesizes one operation for one (path kind, verb) pair.
pub trait OperationHandler: fmt::Debug + Send + Sync {
    /// Path kind this handler serves.
    fn kind(&self) -> PathKind;

    /// Verb this handler serves.
    fn verb(&self) -> Verb;

    /// Summary, description and operation id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if a required element is absent.
    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo>;

    /// Tags of the operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if a required element is absent.
    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>>;

    /// Parameters: the path's placeholders by default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if a required element is absent.
    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        Ok(helpers::path_parameters(cx))
    }

    /// Request body: none by default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if a required element is absent.
    fn request_body(&self, _cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(None)
    }

    /// Responses, including the default error response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContext`] if a required element is absent.
    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>>;

    /// Security requirements from the restriction's permissions for this verb.
    fn security(&self, cx: &OperationContext<'_, '_>) -> Vec<SecurityRequirement> {
        helpers::security(helpers::permissions_for(cx, self.verb()))
    }

    /// Vendor extensions.
    fn extensions(&self, _cx: &OperationContext<'_, '_>) -> Extensions {
        helpers::operation_type("operation")
    }
}

/// One synthesized operation plus the tags it introduced.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    /// The operation.
    pub operation: Operation,
    /// Tags for the run-wide catalogue.
    pub tags: Vec<Tag>,
}

/// Run all phases of `handler` for one path.
///
/// # Errors
///
/// Propagates [`Error::MissingContext`] from any phase.
pub fn create_operation(
    handler: &dyn OperationHandler,
    cx: &OperationContext<'_, '_>,
) -> Result<HandlerOutput> {
    let info = handler.basic_info(cx)?;
    let tags = handler.tags(cx)?;

    let operation = Operation {
        summary: Some(info.summary),
        description: info.description,
        operation_id: cx.settings().enable_operation_id.then_some(info.operation_id),
        tags: tags.iter().map(|t| t.name.clone()).collect(),
        parameters: handler.parameters(cx)?,
        request_body: handler.request_body(cx)?,
        responses: handler.responses(cx)?,
        security: handler.security(cx),
        extensions: handler.extensions(cx),
    };

    Ok(HandlerOutput { operation, tags })
}

/// Handlers keyed by (path kind, verb).
#[derive(Debug)]
pub struct HandlerRegistry {
    handlers: HashMap<(PathKind, Verb), Box<dyn OperationHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// A registry with every built-in handler.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let handlers: Vec<Box<dyn OperationHandler>> = vec![
            Box::new(entity_set::EntitySetGet),
            Box::new(entity_set::EntitySetPost),
            Box::new(entity::EntityGet),
            Box::new(entity::EntityPatch),
            Box::new(entity::EntityDelete),
            Box::new(singleton::SingletonGet),
            Box::new(singleton::SingletonPatch),
            Box::new(navigation::NavigationGet),
            Box::new(navigation::NavigationPost),
            Box::new(navigation::NavigationPatch),
            Box::new(navigation::NavigationDelete),
            Box::new(reference::RefGet),
            Box::new(reference::RefPost),
            Box::new(reference::RefPut),
            Box::new(reference::RefDelete),
            Box::new(media::MediaGet),
            Box::new(media::MediaPut),
            Box::new(operation::OperationInvoke::new(PathKind::Operation, Verb::Get)),
            Box::new(operation::OperationInvoke::new(PathKind::Operation, Verb::Post)),
            Box::new(operation::OperationInvoke::new(PathKind::OperationImport, Verb::Get)),
            Box::new(operation::OperationInvoke::new(PathKind::OperationImport, Verb::Post)),
            Box::new(type_cast::TypeCastGet),
        ];
        for handler in handlers {
            registry.register(handler);
        }
        registry
    }

    /// A registry with no handlers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, returning the one it replaces.
    pub fn register(&mut self, handler: Box<dyn OperationHandler>) -> Option<Box<dyn OperationHandler>> {
        self.handlers.insert((handler.kind(), handler.verb()), handler)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The handler for `verb` on the context's path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPathShape`] if none is registered.
    pub fn get(&self, cx: &OperationContext<'_, '_>, verb: Verb) -> Result<&dyn OperationHandler> {
        self.handlers
            .get(&(cx.kind(), verb))
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::UnsupportedPathShape {
                kind: cx.kind(),
                verb,
                path: cx.name().to_string(),
            })
    }
}
