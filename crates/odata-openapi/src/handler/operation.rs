//! Bound operations (`/Customers({ID})/NS.renew`) and operation imports
//! (`/Reset`).
//!
//! Functions are invoked with `GET`, actions with `POST`; one handler type
//! covers all four combinations.

use std::collections::BTreeMap;

use odata_edm::model::short_name;
use odata_edm::{Operation, TypeRef};

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{content, Extensions, RequestBody, Response, Schema, SecurityRequirement, Tag};
use crate::path::{PathKind, Segment};

/// Invocation of a bound operation or an operation import.
#[derive(Debug)]
pub struct OperationInvoke {
    kind: PathKind,
    verb: Verb,
}

impl OperationInvoke {
    /// A handler for `kind` ([`PathKind::Operation`] or
    /// [`PathKind::OperationImport`]) invoked with `verb`.
    #[must_use]
    pub fn new(kind: PathKind, verb: Verb) -> Self {
        Self { kind, verb }
    }
}

fn kind_label(cx: &OperationContext<'_, '_>) -> Result<&'static str> {
    Ok(if cx.operation()?.is_function() {
        "function"
    } else {
        "action"
    })
}

/// `{prefix}.{name}` for a bound operation.
///
/// Key segments contribute their entity type so entity-bound and
/// collection-bound overloads differ. Overloaded functions append their
/// non-binding parameter names (`Customers.top-n-m`).
fn bound_operation_id(cx: &OperationContext<'_, '_>, operation: &Operation) -> String {
    let segments = cx.path().segments();
    let parents = segments.split_last().map_or(segments, |(_, parents)| parents);
    let mut parts: Vec<&str> = Vec::new();
    for segment in parents {
        match segment {
            Segment::NavigationSource { source, .. } => parts.push(source.name()),
            Segment::NavigationProperty { property, .. } => parts.push(&property.name),
            Segment::Key { entity_type, .. } | Segment::TypeCast { entity_type } => {
                parts.push(entity_type.short_name());
            }
            Segment::Operation { .. }
            | Segment::OperationImport { .. }
            | Segment::StreamContent { .. }
            | Segment::StreamProperty { .. }
            | Segment::Ref => {}
        }
    }
    parts.push(operation.short_name());
    let mut id = parts.join(".");

    let overloaded = operation.is_function()
        && cx
            .odata()
            .model
            .operations
            .iter()
            .filter(|o| o.is_function() && o.name == operation.name)
            .count()
            > 1;
    if overloaded {
        for parameter in operation.non_binding_parameters() {
            id.push('-');
            id.push_str(&parameter.name);
        }
    }
    id
}

impl OperationHandler for OperationInvoke {
    fn kind(&self) -> PathKind {
        self.kind
    }

    fn verb(&self) -> Verb {
        self.verb
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let operation = cx.operation()?;
        let label = kind_label(cx)?;

        let (summary, operation_id, description) = match cx.import() {
            Some(import) => {
                let group = if operation.is_function() {
                    "FunctionImports"
                } else {
                    "ActionImports"
                };
                (
                    format!("Invoke {label}Import {}", import.name),
                    format!("{group}.{}", import.name),
                    helpers::description(&import.annotations),
                )
            }
            None => (
                format!("Invoke {label} {}", operation.short_name()),
                bound_operation_id(cx, operation),
                None,
            ),
        };

        Ok(BasicInfo {
            summary,
            description: description.or_else(|| helpers::description(&operation.annotations)),
            operation_id,
        })
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        let operation = cx.operation()?;
        let name = match cx.import() {
            Some(import) => import.entity_set.clone().unwrap_or_else(|| import.name.clone()),
            None => {
                let group = if operation.is_function() { "Functions" } else { "Actions" };
                format!("{}.{group}", cx.source()?.name())
            }
        };
        Ok(vec![Tag::new(name)])
    }

    fn request_body(&self, cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        let operation = cx.operation()?;
        if operation.is_function() || operation.non_binding_parameters().is_empty() {
            return Ok(None);
        }
        let properties = operation
            .non_binding_parameters()
            .iter()
            .map(|p| {
                let mut schema = helpers::type_schema(cx, &p.type_name);
                schema.nullable = p.nullable && !TypeRef::parse(&p.type_name).collection;
                (p.name.clone(), schema)
            })
            .collect();
        Ok(Some(RequestBody {
            description: "Action parameters".to_string(),
            required: true,
            content: content("application/json", Schema::object(None, properties)),
        }))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let Some(return_type) = &cx.operation()?.return_type else {
            return Ok(helpers::responses(cx, [helpers::no_content()]));
        };
        let type_ref = TypeRef::parse(return_type);
        let schema = if type_ref.collection {
            Schema::object(
                Some(&format!("Collection of {}", short_name(type_ref.name))),
                BTreeMap::from([("value".to_string(), helpers::type_schema(cx, return_type))]),
            )
        } else {
            helpers::type_schema(cx, return_type)
        };
        Ok(helpers::responses(
            cx,
            [("200", helpers::json_response("Success", schema))],
        ))
    }

    fn security(&self, cx: &OperationContext<'_, '_>) -> Vec<SecurityRequirement> {
        cx.operation().map_or_else(
            |_| Vec::new(),
            |operation| {
                let restriction = cx.odata().restrictions.operation(&operation.name);
                helpers::security(&restriction.permissions.invoke)
            },
        )
    }

    fn extensions(&self, cx: &OperationContext<'_, '_>) -> Extensions {
        helpers::operation_type(kind_label(cx).unwrap_or("operation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::handler::create_operation;
    use crate::handler::tests::{model, with_path, MODEL};
    use odata_edm::EdmModel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn collection_bound_function() {
        with_path(&model(), &Settings::default(), "/Customers/NS.delta()", |cx| {
            let handler = OperationInvoke::new(PathKind::Operation, Verb::Get);
            let output = create_operation(&handler, cx).unwrap();
            let op = output.operation;
            assert_eq!(op.summary.as_deref(), Some("Invoke function delta"));
            assert_eq!(op.operation_id.as_deref(), Some("Customers.delta"));
            assert_eq!(output.tags, vec![Tag::new("Customers.Functions")]);
            assert!(op.request_body.is_none());
            assert_eq!(op.extensions["x-ms-docs-operation-type"], json!("function"));

            let schema = &op.responses["200"].content["application/json"].schema;
            assert_eq!(schema.title.as_deref(), Some("Collection of Customer"));
            assert_eq!(schema.properties["value"].schema_type.as_deref(), Some("array"));
        });
    }

    #[test]
    fn entity_bound_action_takes_parameters_in_body() {
        with_path(&model(), &Settings::default(), "/Customers({ID})/NS.renew", |cx| {
            let handler = OperationInvoke::new(PathKind::Operation, Verb::Post);
            let op = create_operation(&handler, cx).unwrap().operation;
            assert_eq!(op.summary.as_deref(), Some("Invoke action renew"));
            assert_eq!(op.operation_id.as_deref(), Some("Customers.Customer.renew"));
            assert_eq!(op.parameters.len(), 1);

            let body = op.request_body.unwrap();
            let schema = &body.content["application/json"].schema;
            assert_eq!(
                schema.properties["months"].format.as_deref(),
                Some("int32")
            );
            assert!(op.responses.contains_key("204"));
            assert_eq!(op.extensions["x-ms-docs-operation-type"], json!("action"));
        });
    }

    #[test]
    fn overloads_get_distinct_operation_ids() {
        let overloads = [
            "  - { name: NS.reset, kind: action }",
            "  - { name: NS.delta, kind: function, is_bound: true, parameters: [{ name: b, type: NS.Customer }] }",
            "  - name: NS.top",
            "    kind: function",
            "    is_bound: true",
            "    parameters:",
            "      - { name: b, type: Collection(NS.Customer) }",
            "      - { name: n, type: Edm.Int32 }",
            "  - name: NS.top",
            "    kind: function",
            "    is_bound: true",
            "    parameters:",
            "      - { name: b, type: Collection(NS.Customer) }",
            "      - { name: n, type: Edm.Int32 }",
            "      - { name: m, type: Edm.Int32 }",
        ]
        .join("\n");
        let yaml = MODEL.replace("  - { name: NS.reset, kind: action }", &overloads);
        let model: EdmModel = serde_yaml_ng::from_str(&yaml).unwrap();
        let settings = Settings::default();
        let handler = OperationInvoke::new(PathKind::Operation, Verb::Get);
        let id = |name: &str| {
            with_path(&model, &settings, name, |cx| {
                create_operation(&handler, cx).unwrap().operation.operation_id.unwrap()
            })
        };

        assert_eq!(id("/Customers/NS.delta()"), "Customers.delta");
        assert_eq!(id("/Customers({ID})/NS.delta()"), "Customers.Customer.delta");
        assert_eq!(id("/Customers/NS.top(n={n})"), "Customers.top-n");
        assert_eq!(id("/Customers/NS.top(n={n},m={m})"), "Customers.top-n-m");
    }

    #[test]
    fn action_import() {
        with_path(&model(), &Settings::default(), "/Reset", |cx| {
            let handler = OperationInvoke::new(PathKind::OperationImport, Verb::Post);
            let output = create_operation(&handler, cx).unwrap();
            assert_eq!(output.operation.summary.as_deref(), Some("Invoke actionImport Reset"));
            assert_eq!(output.operation.operation_id.as_deref(), Some("ActionImports.Reset"));
            assert_eq!(output.tags, vec![Tag::new("Reset")]);
            assert!(output.operation.request_body.is_none());
        });
    }

    #[test]
    fn invoke_permissions_become_security() {
        let yaml = MODEL.replace(
            "  - { name: NS.reset, kind: action }",
            "  - name: NS.reset\n    kind: action\n    annotations:\n      \
             Org.OData.Capabilities.V1.OperationRestrictions:\n        Permissions:\n          \
             - SchemeName: oauth\n            Scopes: [{ Scope: Admin }]",
        );
        let model: EdmModel = serde_yaml_ng::from_str(&yaml).unwrap();
        with_path(&model, &Settings::default(), "/Reset", |cx| {
            let handler = OperationInvoke::new(PathKind::OperationImport, Verb::Post);
            let op = create_operation(&handler, cx).unwrap().operation;
            assert_eq!(
                op.security,
                vec![BTreeMap::from([("oauth".to_string(), vec!["Admin".to_string()])])]
            );
        });
    }
}
