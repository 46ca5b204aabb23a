//! `/…/$value` and named stream properties: binary content.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{content, RequestBody, Response, Schema, Tag};
use crate::path::PathKind;

fn tags(cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
    Ok(vec![helpers::entity_tag(cx.source()?.name(), cx.entity_type()?, false)])
}

/// Summary subject and operation id suffix: `media content`/`Content` for
/// `$value`, the property name otherwise.
fn subject(cx: &OperationContext<'_, '_>) -> (String, String) {
    match cx.stream_property() {
        Some(property) => (property.name.clone(), upper_first(&property.name)),
        None => ("media content".to_string(), "Content".to_string()),
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn basic_info(cx: &OperationContext<'_, '_>, summary: &str, action: &str) -> Result<BasicInfo> {
    let (what, suffix) = subject(cx);
    Ok(BasicInfo {
        summary: format!(
            "{summary} {what} for {} from {}",
            cx.entity_type()?.short_name(),
            cx.source()?.name()
        ),
        description: None,
        operation_id: format!("{}.{action}{suffix}", helpers::id_prefix(cx.path().segments())),
    })
}

/// `GET …/$value`
#[derive(Debug)]
pub struct MediaGet;

impl OperationHandler for MediaGet {
    fn kind(&self) -> PathKind {
        PathKind::MediaEntity
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Get", "Get")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        Ok(helpers::responses(
            cx,
            [("200", helpers::octet_stream_response("Retrieved media content"))],
        ))
    }
}

/// `PUT …/$value`
#[derive(Debug)]
pub struct MediaPut;

impl OperationHandler for MediaPut {
    fn kind(&self) -> PathKind {
        PathKind::MediaEntity
    }

    fn verb(&self) -> Verb {
        Verb::Put
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        basic_info(cx, "Update", "Update")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn request_body(&self, _cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(RequestBody {
            description: "New media content".to_string(),
            required: true,
            content: content("application/octet-stream", Schema::typed("string", Some("binary"))),
        }))
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
    fn media_entity_content() {
        with_path(
            &model(),
            &Settings::default(),
            "/Customers({ID})/Orders({OrderId})/$value",
            |cx| {
                let get = create_operation(&MediaGet, cx).unwrap();
                assert_eq!(
                    get.operation.summary.as_deref(),
                    Some("Get media content for Order from Customers")
                );
                assert_eq!(
                    get.operation.operation_id.as_deref(),
                    Some("Customers.Orders.GetContent")
                );
                assert_eq!(get.tags, vec![Tag::new("Customers.Order")]);
                assert!(get.operation.responses["200"]
                    .content
                    .contains_key("application/octet-stream"));

                let put = create_operation(&MediaPut, cx).unwrap().operation;
                assert_eq!(put.operation_id.as_deref(), Some("Customers.Orders.UpdateContent"));
                assert!(put.request_body.unwrap().required);
            },
        );
    }

    #[test]
    fn named_stream_property() {
        let yaml = MODEL.replace(
            "      - { name: Name, type: Edm.String }",
            "      - { name: Name, type: Edm.String }\n      - { name: photo, type: Edm.Stream }",
        );
        let model: EdmModel = serde_yaml_ng::from_str(&yaml).unwrap();
        with_path(&model, &Settings::default(), "/Me/photo", |cx| {
            let get = create_operation(&MediaGet, cx).unwrap().operation;
            assert_eq!(get.summary.as_deref(), Some("Get photo for Customer from Me"));
            assert_eq!(get.operation_id.as_deref(), Some("Me.GetPhoto"));
        });
    }

    #[test]
    fn upper_first_handles_empty() {
        assert_eq!(upper_first(""), "");
        assert_eq!(upper_first("photo"), "Photo");
    }
}
