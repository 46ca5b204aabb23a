//! Per-run lookup index over an [`EdmModel`].
//!
//! Built once per generation run. Lookups that the model answers only by
//! linear scans (type by name, derived types, inherited members) become map
//! lookups, which matters for models with thousands of entity types.

use std::collections::{HashMap, HashSet};

use crate::model::{EdmModel, EntityType, NavigationProperty, Operation, StructuralProperty};

/// Read-only index over a borrowed model.
#[derive(Debug)]
pub struct EdmIndex<'a> {
    entity_types: HashMap<&'a str, &'a EntityType>,
    /// Base type name → directly derived types, in declaration order.
    derived: HashMap<&'a str, Vec<&'a EntityType>>,
    operations: HashMap<&'a str, &'a Operation>,
}

impl<'a> EdmIndex<'a> {
    /// Index a model.
    #[must_use]
    pub fn new(model: &'a EdmModel) -> Self {
        let mut entity_types = HashMap::with_capacity(model.entity_types.len());
        let mut derived: HashMap<&str, Vec<&EntityType>> = HashMap::new();

        for ty in &model.entity_types {
            entity_types.insert(ty.name.as_str(), ty);
            if let Some(base) = ty.base_type.as_deref() {
                derived.entry(base).or_default().push(ty);
            }
        }

        let operations = model
            .operations
            .iter()
            .map(|op| (op.name.as_str(), op))
            .collect();

        Self {
            entity_types,
            derived,
            operations,
        }
    }

    /// Find an entity type by qualified name.
    #[must_use]
    pub fn entity_type(&self, name: &str) -> Option<&'a EntityType> {
        self.entity_types.get(name).copied()
    }

    /// Find an operation by qualified name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&'a Operation> {
        self.operations.get(name).copied()
    }

    /// The direct base type, if declared and resolvable.
    #[must_use]
    pub fn base_type(&self, ty: &EntityType) -> Option<&'a EntityType> {
        ty.base_type.as_deref().and_then(|b| self.entity_type(b))
    }

    /// `ty` followed by its ancestors, nearest first.
    ///
    /// Stops at the first unresolvable or repeated base so a malformed
    /// inheritance cycle cannot loop forever.
    #[must_use]
    pub fn type_chain(&self, ty: &'a EntityType) -> Vec<&'a EntityType> {
        let mut chain = vec![ty];
        let mut seen: HashSet<&str> = HashSet::from([ty.name.as_str()]);
        let mut current = ty;
        while let Some(base) = self.base_type(current) {
            if !seen.insert(base.name.as_str()) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// All direct and transitive subtypes of `ty`, breadth-first in
    /// declaration order.
    #[must_use]
    pub fn derived_types(&self, ty: &EntityType) -> Vec<&'a EntityType> {
        let mut result = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: Vec<&str> = vec![ty.name.as_str()];

        while !queue.is_empty() {
            let mut next = Vec::new();
            for name in queue {
                for child in self.derived.get(name).map(Vec::as_slice).unwrap_or_default() {
                    if child.name != ty.name && seen.insert(child.name.as_str()) {
                        result.push(*child);
                        next.push(child.name.as_str());
                    }
                }
            }
            queue = next;
        }

        result
    }

    /// Whether `ty` has at least one subtype.
    #[must_use]
    pub fn has_derived_types(&self, ty: &EntityType) -> bool {
        self.derived.get(ty.name.as_str()).is_some_and(|d| !d.is_empty())
    }

    /// Effective key property names: declared, or inherited from the nearest
    /// base declaring one.
    #[must_use]
    pub fn key(&self, ty: &'a EntityType) -> &'a [String] {
        self.type_chain(ty)
            .into_iter()
            .find(|t| !t.key.is_empty())
            .map(|t| t.key.as_slice())
            .unwrap_or_default()
    }

    /// Whether the type is `HasStream`, directly or by inheritance.
    #[must_use]
    pub fn has_stream(&self, ty: &'a EntityType) -> bool {
        self.type_chain(ty).iter().any(|t| t.has_stream)
    }

    /// Find a structural property declared on `ty` or inherited.
    #[must_use]
    pub fn find_property(&self, ty: &'a EntityType, name: &str) -> Option<&'a StructuralProperty> {
        self.type_chain(ty)
            .into_iter()
            .find_map(|t| t.declared_property(name))
    }

    /// Structural properties of `ty` including inherited ones, base first.
    #[must_use]
    pub fn structural_properties(&self, ty: &'a EntityType) -> Vec<&'a StructuralProperty> {
        self.type_chain(ty)
            .into_iter()
            .rev()
            .flat_map(|t| t.properties.iter())
            .collect()
    }

    /// Navigation properties of `ty` including inherited ones, base first,
    /// each paired with its declaring type.
    #[must_use]
    pub fn navigation_properties(
        &self,
        ty: &'a EntityType,
    ) -> Vec<(&'a EntityType, &'a NavigationProperty)> {
        self.type_chain(ty)
            .into_iter()
            .rev()
            .flat_map(|t| t.navigation_properties.iter().map(move |np| (t, np)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn model() -> EdmModel {
        serde_yaml_ng::from_str(indoc! {r"
            entity_types:
              - name: NS.Entity
                key: [id]
                properties:
                  - { name: id, type: Edm.String }
                navigation_properties:
                  - { name: owner, type: NS.User }
              - name: NS.User
                base_type: NS.Entity
                properties:
                  - { name: mail, type: Edm.String }
              - name: NS.Admin
                base_type: NS.User
                has_stream: true
              - name: NS.Group
                base_type: NS.Entity
        "})
        .unwrap()
    }

    #[test]
    fn derived_types_are_transitive_and_ordered() {
        let model = model();
        let index = EdmIndex::new(&model);
        let entity = index.entity_type("NS.Entity").unwrap();
        let names: Vec<&str> = index
            .derived_types(entity)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["NS.User", "NS.Group", "NS.Admin"]);
        assert!(index.has_derived_types(entity));
        assert!(!index.has_derived_types(index.entity_type("NS.Admin").unwrap()));
    }

    #[test]
    fn key_is_inherited() {
        let model = model();
        let index = EdmIndex::new(&model);
        let admin = index.entity_type("NS.Admin").unwrap();
        assert_eq!(index.key(admin), ["id".to_string()]);
        assert_eq!(index.find_property(admin, "id").unwrap().type_name, "Edm.String");
    }

    #[test]
    fn members_are_inherited_base_first() {
        let model = model();
        let index = EdmIndex::new(&model);
        let admin = index.entity_type("NS.Admin").unwrap();

        let props: Vec<&str> = index
            .structural_properties(admin)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(props, vec!["id", "mail"]);

        let navs = index.navigation_properties(admin);
        assert_eq!(navs.len(), 1);
        assert_eq!(navs[0].0.name, "NS.Entity");
        assert_eq!(navs[0].1.name, "owner");
    }

    #[test]
    fn chain_and_stream_flag() {
        let model = model();
        let index = EdmIndex::new(&model);
        let admin = index.entity_type("NS.Admin").unwrap();
        let user = index.entity_type("NS.User").unwrap();
        let chain: Vec<&str> = index.type_chain(admin).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(chain, vec!["NS.Admin", "NS.User", "NS.Entity"]);
        assert!(index.has_stream(admin));
        assert!(!index.has_stream(user));
    }

    #[test]
    fn inheritance_cycle_terminates() {
        let model: EdmModel = serde_yaml_ng::from_str(indoc! {r"
            entity_types:
              - { name: NS.A, base_type: NS.B }
              - { name: NS.B, base_type: NS.A }
        "})
        .unwrap();
        let index = EdmIndex::new(&model);
        let a = index.entity_type("NS.A").unwrap();
        assert_eq!(index.type_chain(a).len(), 2);
        assert_eq!(index.derived_types(a).len(), 1);
    }
}
