//! `/Me`: read and update a singleton.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{Parameter, RequestBody, Response, Tag};
use crate::path::PathKind;

fn tags(cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
    Ok(vec![helpers::entity_tag(cx.source()?.name(), cx.entity_type()?, false)])
}

/// `GET /Me`
#[derive(Debug)]
pub struct SingletonGet;

impl OperationHandler for SingletonGet {
    fn kind(&self) -> PathKind {
        PathKind::Singleton
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let source = cx.source()?;
        Ok(BasicInfo {
            summary: format!("Get {}", source.name()),
            description: helpers::description(source.annotations()),
            operation_id: format!("{}.Get{}", source.name(), cx.entity_type()?.short_name()),
        })
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

/// `PATCH /Me`
#[derive(Debug)]
pub struct SingletonPatch;

impl OperationHandler for SingletonPatch {
    fn kind(&self) -> PathKind {
        PathKind::Singleton
    }

    fn verb(&self) -> Verb {
        Verb::Patch
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let source = cx.source()?;
        Ok(BasicInfo {
            summary: format!("Update {}", source.name()),
            description: None,
            operation_id: format!("{}.Update{}", source.name(), cx.entity_type()?.short_name()),
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::handler::create_operation;
    use crate::handler::tests::{model, with_path};
    use pretty_assertions::assert_eq;

    #[test]
    fn singleton_read_and_update() {
        with_path(&model(), &Settings::default(), "/Me", |cx| {
            let get = create_operation(&SingletonGet, cx).unwrap();
            assert_eq!(get.operation.summary.as_deref(), Some("Get Me"));
            assert_eq!(get.operation.operation_id.as_deref(), Some("Me.GetCustomer"));
            assert_eq!(get.tags, vec![Tag::new("Me.Customer")]);
            let names: Vec<&str> = get.operation.parameters.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["$select", "$expand"]);

            let patch = create_operation(&SingletonPatch, cx).unwrap().operation;
            assert_eq!(patch.summary.as_deref(), Some("Update Me"));
            assert_eq!(patch.operation_id.as_deref(), Some("Me.UpdateCustomer"));
            assert!(patch.responses.contains_key("204"));
        });
    }
}
