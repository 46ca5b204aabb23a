//! Building blocks shared by the handlers: schemas, parameters, responses,
//! tags, operation ids and security.

use std::collections::BTreeMap;

use odata_edm::vocabulary::{CORE_DESCRIPTION, CORE_LONG_DESCRIPTION};
use odata_edm::{Annotations, EntityType, TypeRef};
use serde_json::{json, Value};

use super::{OperationContext, Verb};
use crate::openapi::{content, Extensions, Parameter, RequestBody, Response, Schema, SecurityRequirement, Tag};
use crate::path::Segment;
use crate::restriction::PermissionScheme;

/// Component schema path of an entity type.
#[must_use]
pub fn schema_ref(entity_type: &EntityType) -> String {
    format!("#/components/schemas/{}", entity_type.name)
}

/// Schema of one entity: a reference, or `anyOf` the type and its subtypes
/// when derived-type references are enabled.
#[must_use]
pub fn entity_schema(cx: &OperationContext<'_, '_>, entity_type: &EntityType) -> Schema {
    let base = Schema::reference(&schema_ref(entity_type));
    if !cx.settings().enable_derived_types_references_for_responses {
        return base;
    }
    let derived = cx.odata().index.derived_types(entity_type);
    if derived.is_empty() {
        return base;
    }
    let mut any_of = vec![base];
    any_of.extend(derived.into_iter().map(|t| Schema::reference(&schema_ref(t))));
    Schema {
        any_of,
        ..Schema::default()
    }
}

/// `{ value: [entity], @odata.nextLink }` wrapper of a collection response.
#[must_use]
pub fn collection_schema(cx: &OperationContext<'_, '_>, entity_type: &EntityType) -> Schema {
    let mut properties = BTreeMap::from([(
        "value".to_string(),
        Schema::array(entity_schema(cx, entity_type)),
    )]);
    if cx.settings().enable_pagination {
        properties.insert(
            "@odata.nextLink".to_string(),
            Schema {
                nullable: true,
                ..Schema::typed("string", None)
            },
        );
    }
    Schema::object(
        Some(&format!("Collection of {}", entity_type.short_name())),
        properties,
    )
}

/// `OpenAPI` type and format of an `Edm.*` primitive.
#[must_use]
pub fn primitive_schema(type_name: &str) -> Option<Schema> {
    let (schema_type, format) = match type_name {
        "Edm.String" => ("string", None),
        "Edm.Boolean" => ("boolean", None),
        "Edm.Byte" => ("integer", Some("uint8")),
        "Edm.SByte" => ("integer", Some("int8")),
        "Edm.Int16" => ("integer", Some("int16")),
        "Edm.Int32" => ("integer", Some("int32")),
        "Edm.Int64" => ("integer", Some("int64")),
        "Edm.Single" => ("number", Some("float")),
        "Edm.Double" => ("number", Some("double")),
        "Edm.Decimal" => ("number", Some("decimal")),
        "Edm.Guid" => ("string", Some("uuid")),
        "Edm.Date" => ("string", Some("date")),
        "Edm.DateTimeOffset" => ("string", Some("date-time")),
        "Edm.TimeOfDay" => ("string", Some("time")),
        "Edm.Duration" => ("string", Some("duration")),
        "Edm.Binary" => ("string", Some("base64url")),
        "Edm.Stream" => ("string", Some("binary")),
        _ => return None,
    };
    Some(Schema::typed(schema_type, format))
}

/// Schema of any type reference: primitives inline, entity types through
/// [`entity_schema`], everything else by component reference.
#[must_use]
pub fn type_schema(cx: &OperationContext<'_, '_>, type_name: &str) -> Schema {
    let type_ref = TypeRef::parse(type_name);
    let element = primitive_schema(type_ref.name)
        .or_else(|| {
            cx.odata()
                .index
                .entity_type(type_ref.name)
                .map(|t| entity_schema(cx, t))
        })
        .unwrap_or_else(|| Schema::reference(&format!("#/components/schemas/{}", type_ref.name)));
    if type_ref.collection {
        Schema::array(element)
    } else {
        element
    }
}

/// The path's `{placeholder}` parameters.
#[must_use]
pub fn path_parameters(cx: &OperationContext<'_, '_>) -> Vec<Parameter> {
    cx.rendered()
        .parameters
        .iter()
        .map(|p| {
            let schema = primitive_schema(p.type_name).unwrap_or_else(|| Schema::typed("string", None));
            let mut parameter = Parameter::path(&p.name, &p.description, schema);
            if let Some(key_type) = p.key_type {
                parameter
                    .extensions
                    .insert("x-ms-docs-key-type".to_string(), Value::from(key_type));
            }
            parameter
        })
        .collect()
}

/// System query options for reading `entity_type`.
///
/// Paging, search, filter, count and ordering apply to collections only;
/// `$select` and `$expand` apply to single reads too. Each option is gated
/// by its restriction flag.
#[must_use]
pub fn query_parameters(
    cx: &OperationContext<'_, '_>,
    entity_type: &EntityType,
    collection: bool,
) -> Vec<Parameter> {
    let index = &cx.odata().index;
    let query = cx.restriction().query;
    let mut parameters = Vec::new();

    let Some(entity_type) = index.entity_type(&entity_type.name) else {
        return parameters;
    };
    let properties: Vec<&str> = index
        .structural_properties(entity_type)
        .iter()
        .map(|p| p.name.as_str())
        .collect();

    if collection {
        let count = Schema {
            minimum: Some(0),
            ..Schema::typed("integer", None)
        };
        if query.top {
            parameters.push(Parameter::query("$top", "Show only the first n items", count.clone()));
        }
        if query.skip {
            parameters.push(Parameter::query("$skip", "Skip the first n items", count));
        }
        if query.search {
            parameters.push(Parameter::query(
                "$search",
                "Search items by search phrases",
                Schema::typed("string", None),
            ));
        }
        if query.filter {
            parameters.push(Parameter::query(
                "$filter",
                "Filter items by property values",
                Schema::typed("string", None),
            ));
        }
        if query.count {
            parameters.push(Parameter::query(
                "$count",
                "Include count of items",
                Schema::typed("boolean", None),
            ));
        }
        if query.orderby {
            let values = properties
                .iter()
                .flat_map(|p| [json!(p), json!(format!("{p} desc"))])
                .collect();
            parameters.push(array_option("$orderby", "Order items by property values", values));
        }
    }

    if query.select {
        let values = properties.iter().map(|p| json!(p)).collect();
        parameters.push(array_option("$select", "Select properties to be returned", values));
    }
    if query.expand {
        let values = std::iter::once(json!("*"))
            .chain(
                index
                    .navigation_properties(entity_type)
                    .into_iter()
                    .map(|(_, np)| json!(np.name)),
            )
            .collect();
        parameters.push(array_option("$expand", "Expand related entities", values));
    }

    parameters
}

fn array_option(name: &str, description: &str, values: Vec<Value>) -> Parameter {
    let items = Schema {
        enum_values: values,
        ..Schema::typed("string", None)
    };
    Parameter {
        style: Some("form".to_string()),
        explode: Some(false),
        ..Parameter::query(
            name,
            description,
            Schema {
                unique_items: Some(true),
                ..Schema::array(items)
            },
        )
    }
}

/// Optional `If-Match` header carrying an `ETag`.
#[must_use]
pub fn if_match() -> Parameter {
    Parameter::header("If-Match", "ETag", Schema::typed("string", None))
}

/// Response map with the default error response added.
#[must_use]
pub fn responses(
    cx: &OperationContext<'_, '_>,
    entries: impl IntoIterator<Item = (&'static str, Response)>,
) -> BTreeMap<String, Response> {
    let mut map: BTreeMap<String, Response> = entries
        .into_iter()
        .map(|(code, response)| (code.to_string(), response))
        .collect();
    map.insert(
        "default".to_string(),
        Response::reference(&cx.settings().default_response_ref),
    );
    map
}

/// `204 Success`.
#[must_use]
pub fn no_content() -> (&'static str, Response) {
    ("204", Response::new("Success", BTreeMap::new()))
}

/// A JSON response with `schema`.
#[must_use]
pub fn json_response(description: &str, schema: Schema) -> Response {
    Response::new(description, content("application/json", schema))
}

/// A binary media response.
#[must_use]
pub fn octet_stream_response(description: &str) -> Response {
    Response::new(
        description,
        content("application/octet-stream", Schema::typed("string", Some("binary"))),
    )
}

/// A required JSON body holding one entity.
#[must_use]
pub fn entity_body(entity_type: &EntityType, description: &str) -> RequestBody {
    RequestBody {
        description: description.to_string(),
        required: true,
        content: content("application/json", Schema::reference(&schema_ref(entity_type))),
    }
}

/// A required `{ "@odata.id": … }` body.
#[must_use]
pub fn ref_body() -> RequestBody {
    let properties = BTreeMap::from([("@odata.id".to_string(), Schema::typed("string", None))]);
    RequestBody {
        description: "New navigation property ref value".to_string(),
        required: true,
        content: content("application/json", Schema::object(None, properties)),
    }
}

/// `LongDescription`, falling back to `Description`.
#[must_use]
pub fn description(annotations: &Annotations) -> Option<String> {
    annotations
        .get(CORE_LONG_DESCRIPTION)
        .or_else(|| annotations.get(CORE_DESCRIPTION))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// `{source}.{TypeShortName}`, page-typed for collections.
#[must_use]
pub fn entity_tag(source: &str, entity_type: &EntityType, collection: bool) -> Tag {
    let name = format!("{source}.{}", entity_type.short_name());
    if collection {
        Tag::page(name)
    } else {
        Tag::new(name)
    }
}

/// Operation id prefix: the source name followed by navigation property
/// names and cast type short names, dot-separated.
#[must_use]
pub fn id_prefix(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::NavigationSource { source, .. } => Some(source.name()),
            Segment::NavigationProperty { property, .. } => Some(property.name.as_str()),
            Segment::TypeCast { entity_type } => Some(entity_type.short_name()),
            Segment::Key { .. }
            | Segment::Operation { .. }
            | Segment::OperationImport { .. }
            | Segment::StreamContent { .. }
            | Segment::StreamProperty { .. }
            | Segment::Ref => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Permission schemes of the context's restriction that apply to `verb`.
#[must_use]
pub fn permissions_for<'c>(cx: &OperationContext<'c, '_>, verb: Verb) -> &'c [PermissionScheme] {
    let permissions = &cx.restriction().permissions;
    match verb {
        Verb::Get => match &permissions.read_by_key {
            Some(by_key) if !cx.is_collection() => by_key,
            _ => &permissions.read,
        },
        Verb::Post => &permissions.insert,
        Verb::Put | Verb::Patch => &permissions.update,
        Verb::Delete => &permissions.delete,
    }
}

/// One security requirement per permission scheme.
#[must_use]
pub fn security(schemes: &[PermissionScheme]) -> Vec<SecurityRequirement> {
    schemes
        .iter()
        .map(|s| BTreeMap::from([(s.scheme_name.clone(), s.scopes.clone())]))
        .collect()
}

/// `x-ms-docs-operation-type`.
#[must_use]
pub fn operation_type(kind: &str) -> Extensions {
    Extensions::from([("x-ms-docs-operation-type".to_string(), Value::from(kind))])
}

/// Adds `x-ms-pageable` when pagination is enabled.
pub fn add_pageable(cx: &OperationContext<'_, '_>, extensions: &mut Extensions) {
    let settings = cx.settings();
    if settings.enable_pagination {
        extensions.insert(
            "x-ms-pageable".to_string(),
            json!({
                "nextLinkName": "@odata.nextLink",
                "operationName": settings.pageable_operation_name,
            }),
        );
    }
}
