//! `/Customers`: list and create.

use std::collections::BTreeMap;

use super::helpers;
use super::{BasicInfo, OperationContext, OperationHandler, Verb};
use crate::error::Result;
use crate::openapi::{Extensions, Parameter, RequestBody, Response, Tag};
use crate::path::PathKind;

/// `GET /Customers`
#[derive(Debug)]
pub struct EntitySetGet;

impl OperationHandler for EntitySetGet {
    fn kind(&self) -> PathKind {
        PathKind::EntitySet
    }

    fn verb(&self) -> Verb {
        Verb::Get
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let source = cx.source()?;
        let entity_type = cx.entity_type()?;
        Ok(BasicInfo {
            summary: format!("Get entities from {}", source.name()),
            description: helpers::description(source.annotations()),
            operation_id: format!("{}.List{}", source.name(), entity_type.short_name()),
        })
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        Ok(vec![helpers::entity_tag(cx.source()?.name(), cx.entity_type()?, true)])
    }

    fn parameters(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Parameter>> {
        Ok(helpers::query_parameters(cx, cx.entity_type()?, true))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let schema = helpers::collection_schema(cx, cx.entity_type()?);
        Ok(helpers::responses(
            cx,
            [("200", helpers::json_response("Retrieved entities", schema))],
        ))
    }

    fn extensions(&self, cx: &OperationContext<'_, '_>) -> Extensions {
        let mut extensions = helpers::operation_type("operation");
        helpers::add_pageable(cx, &mut extensions);
        extensions
    }
}

/// `POST /Customers`
#[derive(Debug)]
pub struct EntitySetPost;

impl OperationHandler for EntitySetPost {
    fn kind(&self) -> PathKind {
        PathKind::EntitySet
    }

    fn verb(&self) -> Verb {
        Verb::Post
    }

    fn basic_info(&self, cx: &OperationContext<'_, '_>) -> Result<BasicInfo> {
        let source = cx.source()?;
        let entity_type = cx.entity_type()?;
        Ok(BasicInfo {
            summary: format!("Add new entity to {}", source.name()),
            description: None,
            operation_id: format!("{}.Create{}", source.name(), entity_type.short_name()),
        })
    }

    fn tags(&self, cx: &OperationContext<'_, '_>) -> Result<Vec<Tag>> {
        Ok(vec![helpers::entity_tag(cx.source()?.name(), cx.entity_type()?, true)])
    }

    fn request_body(&self, cx: &OperationContext<'_, '_>) -> Result<Option<RequestBody>> {
        Ok(Some(helpers::entity_body(cx.entity_type()?, "New entity")))
    }

    fn responses(&self, cx: &OperationContext<'_, '_>) -> Result<BTreeMap<String, Response>> {
        let schema = helpers::entity_schema(cx, cx.entity_type()?);
        Ok(helpers::responses(
            cx,
            [("201", helpers::json_response("Created entity", schema))],
        ))
    }
}
