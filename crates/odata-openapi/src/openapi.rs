//! Output object model: the subset of `OpenAPI` 3 objects the generator
//! produces.
//!
//! Types serialize with `serde` into `OpenAPI` field names. Rendering to
//! text is left to the caller (the CLI uses `serde_yaml_ng` or
//! `serde_json`).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::handler::Verb;

/// Vendor extensions (`x-…`) attached to an object.
pub type Extensions = BTreeMap<String, Value>;

/// Security scheme name → required scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// Operations available at one canonical path.
pub type PathItem = BTreeMap<Verb, Operation>;

/// Result of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathsDocument {
    /// Canonical path string → path item.
    pub paths: BTreeMap<String, PathItem>,
    /// Tag catalogue collected from all operations, sorted by name.
    pub tags: Vec<Tag>,
}

/// One HTTP operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Operation {
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description, from `Core.Description` annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation identifier.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Tag names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Path and query parameters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body for mutating verbs.
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Status code (or `default`) → response.
    pub responses: BTreeMap<String, Response>,
    /// Alternative security requirements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    /// Vendor extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// `{placeholder}` in the path.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be supplied.
    pub required: bool,
    /// Value schema.
    pub schema: Schema,
    /// Serialization style (`form` for array query options).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Whether arrays explode into repeated parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    /// Vendor extensions (e.g., `x-ms-docs-key-type`).
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parameter {
    /// A required path parameter.
    #[must_use]
    pub fn path(name: &str, description: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            location: ParameterLocation::Path,
            description: Some(description.to_string()),
            required: true,
            schema,
            style: None,
            explode: None,
            extensions: Extensions::new(),
        }
    }

    /// An optional query parameter.
    #[must_use]
    pub fn query(name: &str, description: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            location: ParameterLocation::Query,
            description: Some(description.to_string()),
            required: false,
            schema,
            style: None,
            explode: None,
            extensions: Extensions::new(),
        }
    }

    /// An optional header parameter.
    #[must_use]
    pub fn header(name: &str, description: &str, schema: Schema) -> Self {
        Self {
            location: ParameterLocation::Header,
            ..Self::query(name, description, schema)
        }
    }
}

/// A schema object, reduced to the fields the generator emits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    /// Reference to a component schema.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// JSON type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Lower bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    /// Array item schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Whether array items must be unique.
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Object properties.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Union of alternatives.
    #[serde(rename = "anyOf", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    /// Whether `null` is allowed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl Schema {
    /// `$ref` to a component.
    #[must_use]
    pub fn reference(reference: &str) -> Self {
        Self {
            reference: Some(reference.to_string()),
            ..Self::default()
        }
    }

    /// A primitive type with an optional format.
    #[must_use]
    pub fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(ToString::to_string),
            ..Self::default()
        }
    }

    /// An array of `items`.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// An object with the given properties.
    #[must_use]
    pub fn object(title: Option<&str>, properties: BTreeMap<String, Self>) -> Self {
        Self {
            title: title.map(ToString::to_string),
            schema_type: Some("object".to_string()),
            properties,
            ..Self::default()
        }
    }
}

/// Media type → content description.
pub type Content = BTreeMap<String, MediaType>;

/// Payload of one media type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    /// Payload schema.
    pub schema: Schema,
}

/// Builds a single-entry content map.
#[must_use]
pub fn content(media_type: &str, schema: Schema) -> Content {
    BTreeMap::from([(media_type.to_string(), MediaType { schema })])
}

/// An operation request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    /// Description.
    pub description: String,
    /// Whether a body must be sent.
    pub required: bool,
    /// Payload by media type.
    pub content: Content,
}

/// One response of an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    /// Reference to a component response.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Payload by media type.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub content: Content,
}

impl Response {
    /// `$ref` to a component response.
    #[must_use]
    pub fn reference(reference: &str) -> Self {
        Self {
            reference: Some(reference.to_string()),
            ..Self::default()
        }
    }

    /// An inline response.
    #[must_use]
    pub fn new(description: &str, content: Content) -> Self {
        Self {
            reference: None,
            description: Some(description.to_string()),
            content,
        }
    }
}

/// A tag with optional vendor extensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Vendor extensions (e.g., `x-ms-docs-toc-type`).
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Tag {
    /// A plain tag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensions: Extensions::new(),
        }
    }

    /// A tag grouping collection-shaped operations on one page.
    #[must_use]
    pub fn page(name: impl Into<String>) -> Self {
        let mut tag = Self::new(name);
        tag.extensions
            .insert("x-ms-docs-toc-type".to_string(), Value::from("page"));
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn operation_serializes_openapi_field_names() {
        let mut operation = Operation {
            summary: Some("Get entities from Customers".to_string()),
            operation_id: Some("Customers.ListCustomer".to_string()),
            tags: vec!["Customers.Customer".to_string()],
            parameters: vec![Parameter::query(
                "$top",
                "Show only the first n items",
                Schema {
                    minimum: Some(0),
                    ..Schema::typed("integer", None)
                },
            )],
            ..Operation::default()
        };
        operation
            .responses
            .insert("default".to_string(), Response::reference("#/components/responses/error"));
        operation
            .extensions
            .insert("x-ms-docs-operation-type".to_string(), json!("operation"));

        assert_eq!(
            serde_json::to_value(&operation).unwrap(),
            json!({
                "summary": "Get entities from Customers",
                "operationId": "Customers.ListCustomer",
                "tags": ["Customers.Customer"],
                "parameters": [{
                    "name": "$top",
                    "in": "query",
                    "description": "Show only the first n items",
                    "required": false,
                    "schema": { "type": "integer", "minimum": 0 }
                }],
                "responses": {
                    "default": { "$ref": "#/components/responses/error" }
                },
                "x-ms-docs-operation-type": "operation"
            })
        );
    }

    #[test]
    fn path_item_keys_are_lowercase_verbs() {
        let mut item = PathItem::new();
        item.insert(Verb::Patch, Operation::default());
        item.insert(Verb::Get, Operation::default());
        let value = serde_json::to_value(&item).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["get", "patch"]);
    }

    #[test]
    fn page_tag_flattens_extension() {
        assert_eq!(
            serde_json::to_value(Tag::page("People.Person")).unwrap(),
            json!({ "name": "People.Person", "x-ms-docs-toc-type": "page" })
        );
    }
}
