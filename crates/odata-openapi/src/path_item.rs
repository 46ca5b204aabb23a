//! Path item assembly: one path item per discovered path, one operation per
//! supported verb.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::context::ODataContext;
use crate::error::{Error, Result};
use crate::handler::{create_operation, HandlerRegistry, OperationContext};
use crate::openapi::{PathItem, PathsDocument, Tag};
use crate::path::ODataPath;

/// Turns discovered paths into path items using a handler registry.
#[derive(Debug)]
pub struct PathItemAssembler<'c, 'a> {
    context: &'c ODataContext<'a>,
    registry: &'c HandlerRegistry,
}

impl<'c, 'a> PathItemAssembler<'c, 'a> {
    /// An assembler over `context` dispatching to `registry`.
    #[must_use]
    pub fn new(context: &'c ODataContext<'a>, registry: &'c HandlerRegistry) -> Self {
        Self { context, registry }
    }

    /// Build the path items and the tag catalogue for `paths`.
    ///
    /// Paths whose restrictions leave no verb produce no path item. Tags
    /// reported by several operations are merged by name; extensions are
    /// combined.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingContext`] if a path lacks an element its shape needs.
    /// - [`Error::UnsupportedPathShape`] if no handler is registered for a
    ///   (path kind, verb) pair.
    /// - [`Error::DuplicateOperation`] if two paths render to the same string
    ///   and both define the same verb.
    pub fn assemble(&self, paths: &[ODataPath<'a>]) -> Result<PathsDocument> {
        let mut items: BTreeMap<String, PathItem> = BTreeMap::new();
        let mut tags: BTreeMap<String, Tag> = BTreeMap::new();
        let mut operations = 0usize;

        for path in paths {
            let cx = OperationContext::resolve(self.context, path)?;
            let verbs = cx.verbs();
            if verbs.is_empty() {
                tracing::debug!(path = %cx.name(), "no operations allowed, skipping path");
                continue;
            }

            let mut item = PathItem::new();
            for verb in verbs {
                let handler = self.registry.get(&cx, verb)?;
                let output = create_operation(handler, &cx)?;
                for tag in output.tags {
                    merge_tag(&mut tags, tag);
                }
                item.insert(verb, output.operation);
            }

            match items.entry(cx.name().to_string()) {
                Entry::Vacant(slot) => {
                    operations += item.len();
                    slot.insert(item);
                }
                Entry::Occupied(mut slot) => {
                    for (verb, operation) in item {
                        if slot.get().contains_key(&verb) {
                            return Err(Error::DuplicateOperation {
                                path: cx.name().to_string(),
                                verb,
                            });
                        }
                        slot.get_mut().insert(verb, operation);
                        operations += 1;
                    }
                }
            }
        }

        tracing::debug!(
            paths = items.len(),
            operations,
            tags = tags.len(),
            "path items assembled"
        );
        Ok(PathsDocument {
            paths: items,
            tags: tags.into_values().collect(),
        })
    }
}

fn merge_tag(tags: &mut BTreeMap<String, Tag>, tag: Tag) {
    match tags.entry(tag.name.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(tag);
        }
        Entry::Occupied(mut slot) => slot.get_mut().extensions.extend(tag.extensions),
    }
}
