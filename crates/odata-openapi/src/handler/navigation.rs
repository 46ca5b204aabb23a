//! `/Customers({ID})/Orders` and `/Customers({ID})/Orders({OrderId})`:
//! operations on navigation property targets.
//!
//! Non-contained targets are read-only here; writes go through the target's
//! own entity set or the `$ref` path.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{Extensions, Parameter, RequestBody, Response, Tag};
use crate::path::PathKind;

fn tags(cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
    let navigation = cx.navigation()?;
    Ok(vec![helpers::entity_tag(
        cx.source()?.name(),
        navigation.target,
        cx.is_collection(),
    )])
}

fn basic_info(cx: &OperationContext<'_, '_>, summary: String, action: &str) -> Result<BasicInfo> {
    let navigation = cx.navigation()?;
    let prefix = helpers::id_prefix(&cx.path().segments()[..navigation.position]);
    Ok(BasicInfo {
        summary,
        description: None,
        operation_id: format!("{prefix}.{action}{}", navigation.property.name),
    })
}

/// `GET /Customers({ID})/Orders`
#[derive(Debug)]
pub struct NavigationGet;

impl OperationHandler for NavigationGet {
    fn kind(&self) -> PathKind {
        PathKind::NavigationProperty
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let navigation = cx.navigation()?;
        let summary = format!("Get {} from {}", navigation.property.name, cx.source()?.name());
        let action = if cx.is_collection() { "List" } else { "Get" };
        let mut info = basic_info(cx, summary, action)?;
        info.description = helpers::description(&navigation.property.annotations);
        Ok(info)
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        let mut parameters = helpers::path_parameters(cx);
        parameters.extend(helpers::query_parameters(
            cx,
            cx.entity_type()?,
            cx.is_collection(),
        ));
        Ok(parameters)
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let entity_type = cx.entity_type()?;
        let response = if cx.is_collection() {
            helpers::json_response(
                "Retrieved navigation property",
                helpers::collection_schema(cx, entity_type),
            )
        } else {
            helpers::json_response(
                "Retrieved navigation property",
                helpers::entity_schema(cx, entity_type),
            )
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

/// `POST /Customers({ID})/Orders` (contained collections only)
#[derive(Debug)]
pub struct NavigationPost;

impl OperationHandler for NavigationPost {
    fn kind(&self) -> PathKind {
        PathKind::NavigationProperty
    }

    fn verb(&self) -> Verb {
        Verb::Post
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let navigation = cx.navigation()?;
        let summary = format!(
            "Create new navigation property to {} for {}",
            navigation.property.name,
            cx.source()?.name()
        );
        basic_info(cx, summary, "Create")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn request_body(&self, cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(helpers::entity_body(cx.entity_type()?, "New navigation property")))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let schema = helpers::entity_schema(cx, cx.entity_type()?);
        Ok(helpers::responses(
            cx,
            [("201", helpers::json_response("Created navigation property", schema))],
        ))
    }
}

/// `PATCH /Customers({ID})/Orders({OrderId})` (contained targets only)
#[derive(Debug)]
pub struct NavigationPatch;

impl OperationHandler for NavigationPatch {
    fn kind(&self) -> PathKind {
        PathKind::NavigationProperty
    }

    fn verb(&self) -> Verb {
        Verb::Patch
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let navigation = cx.navigation()?;
        let summary = format!(
            "Update the navigation property {} in {}",
            navigation.property.name,
            cx.source()?.name()
        );
        basic_info(cx, summary, "Update")
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        tags(cx)
    }

    fn request_body(&self, cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(helpers::entity_body(cx.entity_type()?, "New navigation property values")))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        Ok(helpers::responses(cx, [helpers::no_content()]))
    }
}

/// `DELETE /Customers({ID})/Orders({OrderId})` (contained targets only)
#[derive(Debug)]
pub struct NavigationDelete;

impl OperationHandler for NavigationDelete {
    fn kind(&self) -> PathKind {
        PathKind::NavigationProperty
    }

    fn verb(&self) -> Verb {
        Verb::Delete
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let navigation = cx.navigation()?;
        let summary = format!(
            "Delete navigation property {} for {}",
            navigation.property.name,
            cx.source()?.name()
        );
        basic_info(cx, summary, "Delete")
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
