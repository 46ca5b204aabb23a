//! `/Customers/NS.VipCustomer` and `/Customers({ID})/NS.VipCustomer`:
//! reading through a derived-type cast.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{Extensions, Parameter, Response, Tag};
use crate::path::PathKind;

/// `GET` through a type cast.
///
/// Responses reference the target type's own schema (or its derived-type
/// union); no `{parent}.To.{target}` component is referenced. Tags are
/// `{source}.{Target}`.
#[derive(Debug)]
pub struct TypeCastGet;

impl OperationHandler for TypeCastGet {
    fn kind(&self) -> PathKind {
        PathKind::TypeCast
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let cast = cx.cast()?;
        let segments = cx.path().segments();
        let before_cast = segments.split_last().map_or(segments, |(_, rest)| rest);
        let prefix = helpers::id_prefix(before_cast);
        let (parent, target) = (cast.parent.short_name(), cast.target.short_name());

        let (summary, action) = if cx.is_collection() {
            (
                format!("Get the items of type {target} in the {parent} collection"),
                "List",
            )
        } else {
            (format!("Get the item of type {parent} as {target}"), "Get")
        };
        Ok(BasicInfo {
            summary,
            description: None,
            operation_id: format!("{prefix}.{action}{parent}.As{target}"),
        })
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        Ok(vec![helpers::entity_tag(
            cx.source()?.name(),
            cx.cast()?.target,
            cx.is_collection(),
        )])
    }

    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        let mut parameters = helpers::path_parameters(cx);
        parameters.extend(helpers::query_parameters(
            cx,
            cx.cast()?.target,
            cx.is_collection(),
        ));
        Ok(parameters)
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let target = cx.cast()?.target;
        let response = if cx.is_collection() {
            helpers::json_response("Retrieved entities", helpers::collection_schema(cx, target))
        } else {
            helpers::json_response("Retrieved entity", helpers::entity_schema(cx, target))
        };
        Ok(helpers::responses(cx, [("200", response)]))
    }

    fn extensions(&self, cx: &OperationContext<'_, '_>) -> Extensions {
        let mut extensions = helpers::operation_type("operation");
        if cx.is_collection() {
            helpers::add_pageable(cx, &mut extensions);
        }
        extensions
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
    fn collection_cast() {
        let settings = Settings::default().enable_pagination(true);
        with_path(&model(), &settings, "/Customers/NS.VipCustomer", |cx| {
            let output = create_operation(&TypeCastGet, cx).unwrap();
            let op = output.operation;
            assert_eq!(
                op.summary.as_deref(),
                Some("Get the items of type VipCustomer in the Customer collection")
            );
            assert_eq!(
                op.operation_id.as_deref(),
                Some("Customers.ListCustomer.AsVipCustomer")
            );
            assert_eq!(output.tags, vec![Tag::page("Customers.VipCustomer")]);
            assert!(op.parameters.iter().any(|p| p.name == "$filter"));
            assert!(op.extensions.contains_key("x-ms-pageable"));
        });
    }

    #[test]
    fn single_entity_cast() {
        with_path(&model(), &Settings::default(), "/Me/NS.VipCustomer", |cx| {
            let op = create_operation(&TypeCastGet, cx).unwrap().operation;
            assert_eq!(
                op.summary.as_deref(),
                Some("Get the item of type Customer as VipCustomer")
            );
            assert_eq!(op.operation_id.as_deref(), Some("Me.GetCustomer.AsVipCustomer"));
            assert_eq!(
                op.responses["200"].content["application/json"].schema.reference.as_deref(),
                Some("#/components/schemas/NS.VipCustomer")
            );
        });
    }
}
