//! `/Customers({ID})`: read, update and delete by key.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{Parameter, RequestBody, Response, Tag};
use crate::path::PathKind;

fn tags(cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
    Ok(vec![helpers::entity_tag(cx.source()?.name(), cx.entity_type()?, false)])
}

fn basic_info(cx: &OperationContext<'_, '_>, summary: &str, action: &str) -> Result<BasicInfo> {
    let source = cx.source()?;
    Ok(BasicInfo {
        summary: format!("{summary} {}", source.name()),
        description: None,
        operation_id: format!("{}.{action}{}", source.name(), cx.entity_type()?.short_name()),
    })
}

/// `GET /Customers({ID})`
#[derive(Debug)]
pub struct EntityGet;

impl OperationHandler for EntityGet {
    fn kind(&self) -> PathKind {
        PathKind::Entity
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let mut info = basic_info(cx, "Get entity from", "Get")?;
        info.summary.push_str(" by key");
        Ok(info)
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        let mut parameters = helpers::path_parameters(cx);
        parameters.extend(helpers::query_parameters(cx, cx.entity_type()?, false));
        Ok(parameters)
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let schema = helpers::entity_schema(cx, cx.entity_type()?);
        Ok(helpers::responses(
            cx,
            [("200", helpers::json_response("Retrieved entity", schema))],
        ))
    }
}

/// `PATCH /Customers({ID})`
#[derive(Debug)]
pub struct EntityPatch;

impl OperationHandler for EntityPatch {
    fn kind(&self) -> PathKind {
        PathKind::Entity
    }

    fn verb(&self) -> Verb {
        Verb::Patch
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Update entity in", "Update")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn request_body(&self, cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(helpers::entity_body(cx.entity_type()?, "New property values")))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        Ok(helpers::responses(cx, [helpers::no_content()]))
    }
}

/// `DELETE /Customers({ID})`
#[derive(Debug)]
pub struct EntityDelete;

impl OperationHandler for EntityDelete {
    fn kind(&self) -> PathKind {
        PathKind::Entity
    }

    fn verb(&self) -> Verb {
        Verb::Delete
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Delete entity from", "Delete")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        let mut parameters = helpers::path_parameters(cx);
        parameters.push(helpers::if_match());
        Ok(parameters)
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        Ok(helpers::responses(cx, [helpers::no_content()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::handler::create_operation;
    use crate::handler::tests::{model, with_path};
    use crate::openapi::ParameterLocation;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_by_key_has_key_and_projection_parameters() {
        with_path(&model(), &Settings::default(), "/Customers({ID})", |cx| {
            let op = create_operation(&EntityGet, cx).unwrap().operation;
            assert_eq!(op.summary.as_deref(), Some("Get entity from Customers by key"));
            assert_eq!(op.operation_id.as_deref(), Some("Customers.GetCustomer"));
            let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["ID", "$select", "$expand"]);
            assert_eq!(op.parameters[0].location, ParameterLocation::Path);
            assert!(op.parameters[0].required);
            assert_eq!(op.parameters[0].schema.format.as_deref(), Some("int32"));
            assert_eq!(op.parameters[0].description.as_deref(), Some("key: ID of Customer"));
            assert_eq!(
                op.parameters[0].extensions.get("x-ms-docs-key-type"),
                Some(&serde_json::json!("Customer"))
            );
        });
    }

    #[test]
    fn update_and_delete_return_no_content() {
        with_path(&model(), &Settings::default(), "/Customers({ID})", |cx| {
            let patch = create_operation(&EntityPatch, cx).unwrap().operation;
            assert_eq!(patch.operation_id.as_deref(), Some("Customers.UpdateCustomer"));
            assert!(patch.responses.contains_key("204"));
            assert!(patch.request_body.is_some());

            let delete = create_operation(&EntityDelete, cx).unwrap().operation;
            assert_eq!(delete.summary.as_deref(), Some("Delete entity from Customers"));
            let names: Vec<&str> = delete.parameters.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["ID", "If-Match"]);
            assert_eq!(delete.parameters[1].location, ParameterLocation::Header);
            assert_eq!(delete.tags, vec!["Customers.Customer"]);
        });
    }
}
