//! `/Customers({ID})/BestFriend/$ref`: reading and editing links.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{Parameter, RequestBody, Response, Schema, Tag};
use crate::path::PathKind;

fn tags(cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
    let navigation = cx.navigation()?;
    Ok(vec![helpers::entity_tag(cx.source()?.name(), navigation.owner, false)])
}

fn basic_info(cx: &OperationContext<'_, '_>, summary: &str, action: &str) -> Result<BasicInfo> {
    let navigation = cx.navigation()?;
    let prefix = helpers::id_prefix(&cx.path().segments()[..navigation.position]);
    Ok(BasicInfo {
        summary: format!("{summary} {} from {}", navigation.property.name, cx.source()?.name()),
        description: None,
        operation_id: format!("{prefix}.{action}{}", navigation.property.name),
    })
}

/// `GET …/$ref`
#[derive(Debug)]
pub struct RefGet;

impl OperationHandler for RefGet {
    fn kind(&self) -> PathKind {
        PathKind::Ref
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Get ref of", "GetRef")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let link = Schema::typed("string", None);
        let schema = if cx.navigation()?.property.is_collection() {
            Schema::object(
                Some("Collection of links of navigation property"),
                BTreeMap::from([("value".to_string(), Schema::array(link))]),
            )
        } else {
            link
        };
        Ok(helpers::responses(
            cx,
            [("200", helpers::json_response("Retrieved navigation property link", schema))],
        ))
    }
}

/// `POST …/$ref` (collection-valued properties)
#[derive(Debug)]
pub struct RefPost;

impl OperationHandler for RefPost {
    fn kind(&self) -> PathKind {
        PathKind::Ref
    }

    fn verb(&self) -> Verb {
        Verb::Post
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Create new navigation property ref to", "CreateRef")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn request_body(&self, _cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(helpers::ref_body()))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        Ok(helpers::responses(cx, [helpers::no_content()]))
    }
}

/// `PUT …/$ref` (single-valued properties)
#[derive(Debug)]
pub struct RefPut;

impl OperationHandler for RefPut {
    fn kind(&self) -> PathKind {
        PathKind::Ref
    }

    fn verb(&self) -> Verb {
        Verb::Put
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Update the ref of navigation property", "UpdateRef")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn request_body(&self, _cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(helpers::ref_body()))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        Ok(helpers::responses(cx, [helpers::no_content()]))
    }
}

/// `DELETE …/$ref`
///
/// Collection-valued properties name the link to remove with `@id`.
#[derive(Debug)]
pub struct RefDelete;

impl OperationHandler for RefDelete {
    fn kind(&self) -> PathKind {
        PathKind::Ref
    }

    fn verb(&self) -> Verb {
        Verb::Delete
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Delete ref of navigation property", "DeleteRef")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        let mut parameters = helpers::path_parameters(cx);
        parameters.push(helpers::if_match());
        if cx.navigation()?.property.is_collection() {
            parameters.push(Parameter {
                required: true,
                ..Parameter::query("@id", "Delete Uri", Schema::typed("string", None))
            });
        }
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
    use crate::handler::tests::{model, with_path, MODEL};
    use odata_edm::EdmModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_valued_link() {
        with_path(
            &model(),
            &Settings::default(),
            "/Customers({ID})/BestFriend/$ref",
            |cx| {
                let get = create_operation(&RefGet, cx).unwrap();
                assert_eq!(
                    get.operation.summary.as_deref(),
                    Some("Get ref of BestFriend from Customers")
                );
                assert_eq!(get.operation.operation_id.as_deref(), Some("Customers.GetRefBestFriend"));
                assert_eq!(get.tags, vec![Tag::new("Customers.Customer")]);
                assert_eq!(
                    get.operation.responses["200"].content["application/json"]
                        .schema
                        .schema_type
                        .as_deref(),
                    Some("string")
                );

                let put = create_operation(&RefPut, cx).unwrap().operation;
                assert_eq!(put.operation_id.as_deref(), Some("Customers.UpdateRefBestFriend"));
                assert!(put.request_body.unwrap().content["application/json"]
                    .schema
                    .properties
                    .contains_key("@odata.id"));

                let delete = create_operation(&RefDelete, cx).unwrap().operation;
                assert!(delete.parameters.iter().all(|p| p.name != "@id"));
            },
        );
    }

    #[test]
    fn collection_valued_link_requires_id_on_delete() {
        let yaml = MODEL.replace(
            "{ name: BestFriend, type: NS.Customer }",
            "{ name: Friends, type: Collection(NS.Customer) }",
        );
        let model: EdmModel = serde_yaml_ng::from_str(&yaml).unwrap();
        with_path(&model, &Settings::default(), "/Customers({ID})/Friends/$ref", |cx| {
            let get = create_operation(&RefGet, cx).unwrap().operation;
            let schema = &get.responses["200"].content["application/json"].schema;
            assert!(schema.properties.contains_key("value"));

            let post = create_operation(&RefPost, cx).unwrap().operation;
            assert_eq!(post.operation_id.as_deref(), Some("Customers.CreateRefFriends"));

            let delete = create_operation(&RefDelete, cx).unwrap().operation;
            let id = delete.parameters.iter().find(|p| p.name == "@id").unwrap();
            assert!(id.required);
        });
    }
}
