//! Run-scoped generation context.
//!
//! Bundles the borrowed model, the settings and everything derived from them
//! once per run: the type index, the pre-indexed restrictions and the bound
//! operation table. Building the context also checks the model's references,
//! so later stages can rely on every name resolving.

use std::collections::HashMap;

use odata_edm::{EdmIndex, EdmModel, Operation};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::restriction::RestrictionEvaluator;

/// An operation bound to an entity type.
#[derive(Debug, Clone, Copy)]
pub struct BoundOperation<'a> {
    /// The operation.
    pub operation: &'a Operation,
    /// Whether the binding parameter is collection-valued.
    pub collection: bool,
}

/// Everything a generation run reads.
#[derive(Debug)]
pub struct ODataContext<'a> {
    /// The source model.
    pub model: &'a EdmModel,
    /// Conversion settings.
    pub settings: &'a Settings,
    /// Type lookups.
    pub index: EdmIndex<'a>,
    /// Capability restrictions.
    pub restrictions: RestrictionEvaluator,
    /// Binding entity type name → operations bound to it, declaration order.
    bound_operations: HashMap<&'a str, Vec<BoundOperation<'a>>>,
}

impl<'a> ODataContext<'a> {
    /// Index the model and validate its references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedType`] for a dangling base type, navigation
    /// target, container element type or imported operation, and
    /// [`Error::UnresolvedProperty`] for a key naming an unknown property.
    pub fn new(model: &'a EdmModel, settings: &'a Settings) -> Result<Self> {
        let index = EdmIndex::new(model);
        validate(model, &index)?;

        let mut bound_operations: HashMap<&str, Vec<BoundOperation<'_>>> = HashMap::new();
        for operation in &model.operations {
            let Some(binding) = operation.binding_type() else {
                continue;
            };
            // Operations bound to complex or primitive types have no path.
            let Some(ty) = index.entity_type(binding.name) else {
                tracing::trace!(operation = %operation.name, binding = binding.name, "skipping operation not bound to an entity type");
                continue;
            };
            bound_operations
                .entry(ty.name.as_str())
                .or_default()
                .push(BoundOperation {
                    operation,
                    collection: binding.collection,
                });
        }

        Ok(Self {
            model,
            settings,
            index,
            restrictions: RestrictionEvaluator::new(model),
            bound_operations,
        })
    }

    /// Operations whose binding parameter is exactly `entity_type`.
    #[must_use]
    pub fn bound_operations(&self, entity_type: &str) -> &[BoundOperation<'a>] {
        self.bound_operations
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn validate<'a>(model: &'a EdmModel, index: &EdmIndex<'a>) -> Result<()> {
    let resolve = |name: &str, referenced_by: &str| {
        index
            .entity_type(name)
            .map(|_| ())
            .ok_or_else(|| Error::UnresolvedType {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    };

    for ty in &model.entity_types {
        if let Some(base) = ty.base_type.as_deref() {
            resolve(base, &ty.name)?;
        }
        for property in &ty.navigation_properties {
            resolve(property.target().name, &format!("{}/{}", ty.name, property.name))?;
        }
        for key in index.key(ty) {
            if index.find_property(ty, key).is_none() {
                return Err(Error::UnresolvedProperty {
                    entity_type: ty.name.clone(),
                    property: key.clone(),
                });
            }
        }
    }

    let Some(container) = &model.container else {
        return Ok(());
    };
    for set in &container.entity_sets {
        resolve(&set.entity_type, &set.name)?;
    }
    for singleton in &container.singletons {
        resolve(&singleton.entity_type, &singleton.name)?;
    }
    for import in &container.operation_imports {
        if index.operation(&import.operation).is_none() {
            return Err(Error::UnresolvedType {
                name: import.operation.clone(),
                referenced_by: import.name.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn model(yaml: &str) -> EdmModel {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn indexes_bound_operations_by_binding_type() {
        let model = model(indoc! {r"
            entity_types:
              - { name: NS.Customer, key: [ID], properties: [{ name: ID, type: Edm.Int32 }] }
            operations:
              - name: NS.delta
                kind: function
                is_bound: true
                parameters: [{ name: b, type: Collection(NS.Customer) }]
              - name: NS.renew
                kind: action
                is_bound: true
                parameters: [{ name: b, type: NS.Customer }]
              - name: NS.onAddress
                kind: action
                is_bound: true
                parameters: [{ name: b, type: NS.Address }]
              - { name: NS.reset, kind: action }
        "});
        let settings = Settings::default();
        let context = ODataContext::new(&model, &settings).unwrap();

        let bound = context.bound_operations("NS.Customer");
        assert_eq!(bound.len(), 2);
        assert!(bound[0].collection);
        assert_eq!(bound[1].operation.name, "NS.renew");
        assert!(!bound[1].collection);
        assert!(context.bound_operations("NS.Address").is_empty());
    }

    #[test]
    fn dangling_entity_set_type_is_an_error() {
        let model = model(indoc! {r"
            container:
              entity_sets:
                - { name: Customers, entity_type: NS.Missing }
        "});
        let settings = Settings::default();
        let err = ODataContext::new(&model, &settings).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Customers' references unknown type or operation 'NS.Missing'"
        );
    }

    #[test]
    fn unknown_key_property_is_an_error() {
        let model = model("entity_types:\n  - { name: NS.Customer, key: [ID] }\n");
        let settings = Settings::default();
        assert!(matches!(
            ODataContext::new(&model, &settings),
            Err(Error::UnresolvedProperty { .. })
        ));
    }

    #[test]
    fn dangling_navigation_target_is_an_error() {
        let model = model(indoc! {r"
            entity_types:
              - name: NS.Customer
                navigation_properties:
                  - { name: Orders, type: Collection(NS.Order) }
        "});
        let settings = Settings::default();
        assert!(matches!(
            ODataContext::new(&model, &settings),
            Err(Error::UnresolvedType { name, .. }) if name == "NS.Order"
        ));
    }
}
