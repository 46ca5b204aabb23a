//! Path discovery over an entity container.
//!
//! Expansion starts from one path per entity set and singleton and recurses
//! into keys, navigation properties, stream leaves, type casts and bound
//! operations. Every branch consults the restriction evaluator first.
//!
//! Recursion is bounded two ways: navigation never continues into an entity
//! type already present on the path, and at most [`MAX_TYPE_CAST_DEPTH`]
//! type casts appear on one path.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use odata_edm::{EntityType, NavigationProperty};

use super::{NavigationSource, ODataPath, Segment};
use crate::context::ODataContext;
use crate::error::{Error, Result};
use crate::restriction::Element;

/// Maximum number of type-cast segments on one path.
pub const MAX_TYPE_CAST_DEPTH: usize = 2;

/// Produces the deduplicated path set of a model.
///
/// # Example
///
/// ```ignore
/// let context = ODataContext::new(&model, &settings)?;
/// for path in PathProvider::new(&context).paths()? {
///     println!("{}", path.render(&settings).name);
/// }
/// ```
#[derive(Debug)]
pub struct PathProvider<'c, 'a> {
    context: &'c ODataContext<'a>,
    cancelled: Option<&'c AtomicBool>,
}

/// Expansion state of a single-entity path.
struct Frame<'a> {
    path: ODataPath<'a>,
    entity_type: &'a EntityType,
    /// Element whose `DerivedTypeConstraint` governs casts at this point.
    owner: Element,
}

/// Deduplicating path sink, keyed by canonical path string.
struct Collector<'a> {
    seen: HashSet<String>,
    paths: Vec<ODataPath<'a>>,
}

impl<'c, 'a> PathProvider<'c, 'a> {
    /// Create a provider for one generation run.
    #[must_use]
    pub fn new(context: &'c ODataContext<'a>) -> Self {
        Self {
            context,
            cancelled: None,
        }
    }

    /// Abort with [`Error::Cancelled`] once `flag` becomes `true`.
    ///
    /// The flag is checked before each navigation source and before every
    /// single-entity expansion.
    #[must_use]
    pub fn with_cancellation(mut self, flag: &'c AtomicBool) -> Self {
        self.cancelled = Some(flag);
        self
    }

    /// All reachable paths in discovery order: entity sets, then
    /// singletons, then operation imports.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when cancelled, or an unresolved-reference
    /// error if the model changed shape since the context was built.
    pub fn paths(&self) -> Result<Vec<ODataPath<'a>>> {
        let mut collector = Collector {
            seen: HashSet::new(),
            paths: Vec::new(),
        };

        let model: &'a odata_edm::EdmModel = self.context.model;
        let Some(container) = &model.container else {
            tracing::debug!("model has no entity container, no paths generated");
            return Ok(Vec::new());
        };

        for set in &container.entity_sets {
            self.check_cancelled()?;
            tracing::trace!(entity_set = %set.name, "expanding entity set");
            let entity_type = self.entity_type(&set.entity_type, &set.name)?;
            let root = ODataPath::new(vec![Segment::NavigationSource {
                source: NavigationSource::EntitySet(set),
                entity_type,
            }])?;
            collector.add(self, root.clone());

            let owner = Element::source(&set.name);
            self.expand_collection(&mut collector, &root, entity_type, &owner)?;

            let restriction = self.context.restrictions.navigation_source(&set.name);
            if restriction.indexable_by_key {
                if let Some(key) = self.key_segment(entity_type)? {
                    let keyed = root.with(key)?;
                    collector.add(self, keyed.clone());
                    self.expand_entity(
                        &mut collector,
                        &Frame {
                            path: keyed,
                            entity_type,
                            owner,
                        },
                        None,
                    )?;
                }
            }
        }

        for singleton in &container.singletons {
            self.check_cancelled()?;
            tracing::trace!(singleton = %singleton.name, "expanding singleton");
            let entity_type = self.entity_type(&singleton.entity_type, &singleton.name)?;
            let root = ODataPath::new(vec![Segment::NavigationSource {
                source: NavigationSource::Singleton(singleton),
                entity_type,
            }])?;
            collector.add(self, root.clone());
            self.expand_entity(
                &mut collector,
                &Frame {
                    path: root,
                    entity_type,
                    owner: Element::source(&singleton.name),
                },
                None,
            )?;
        }

        if self.context.settings.enable_operation_import_paths {
            for import in &container.operation_imports {
                let operation = self.context.index.operation(&import.operation).ok_or_else(|| {
                    Error::UnresolvedType {
                        name: import.operation.clone(),
                        referenced_by: import.name.clone(),
                    }
                })?;
                let path = ODataPath::new(vec![Segment::OperationImport { import, operation }])?;
                collector.add(self, path);
            }
        }

        tracing::debug!(paths = collector.paths.len(), "path discovery complete");
        Ok(collector.paths)
    }

    /// Continuations of a collection-valued path: collection-bound operations
    /// and collection-shaped casts.
    fn expand_collection(
        &self,
        collector: &mut Collector<'a>,
        path: &ODataPath<'a>,
        entity_type: &'a EntityType,
        owner: &Element,
    ) -> Result<()> {
        self.add_operations(collector, path, entity_type, true, owner, None)?;

        if !self.casts_allowed(path, entity_type) {
            return Ok(());
        }
        for subtype in self.context.index.derived_types(entity_type) {
            if !self.cast_permitted(owner, subtype) {
                continue;
            }
            let cast = path.with(Segment::TypeCast {
                entity_type: subtype,
            })?;
            if collector.add(self, cast.clone()) {
                self.add_operations(collector, &cast, subtype, true, owner, Some(entity_type))?;
            }
        }
        Ok(())
    }

    /// Continuations of a single-entity path.
    ///
    /// `pre_cast` is set when the frame's last segment is a type cast: only
    /// members introduced below that type are added, everything else is
    /// already reachable from the uncast path.
    fn expand_entity(
        &self,
        collector: &mut Collector<'a>,
        frame: &Frame<'a>,
        pre_cast: Option<&'a EntityType>,
    ) -> Result<()> {
        self.check_cancelled()?;
        let index = &self.context.index;
        let settings = self.context.settings;

        if settings.enable_navigation_property_paths {
            for (declaring, property) in index.navigation_properties(frame.entity_type) {
                if self.introduced(declaring, pre_cast) {
                    self.add_navigation(collector, frame, declaring, property)?;
                }
            }
        }

        self.add_streams(collector, frame, pre_cast)?;
        self.add_operations(
            collector,
            &frame.path,
            frame.entity_type,
            false,
            &frame.owner,
            pre_cast,
        )?;

        if !self.casts_allowed(&frame.path, frame.entity_type) {
            return Ok(());
        }
        for subtype in index.derived_types(frame.entity_type) {
            if !self.cast_permitted(&frame.owner, subtype) {
                continue;
            }
            let cast = frame.path.with(Segment::TypeCast {
                entity_type: subtype,
            })?;
            if collector.add(self, cast.clone()) {
                self.expand_entity(
                    collector,
                    &Frame {
                        path: cast,
                        entity_type: subtype,
                        owner: frame.owner.clone(),
                    },
                    Some(frame.entity_type),
                )?;
            }
        }
        Ok(())
    }

    fn add_navigation(
        &self,
        collector: &mut Collector<'a>,
        frame: &Frame<'a>,
        declaring: &'a EntityType,
        property: &'a NavigationProperty,
    ) -> Result<()> {
        let index = &self.context.index;
        let target = self.entity_type(
            property.target().name,
            &format!("{}/{}", declaring.name, property.name),
        )?;
        let nav = frame.path.with(Segment::NavigationProperty {
            property,
            declaring_type: declaring,
            target,
        })?;

        let source = frame.path.source().map(|s| s.name()).unwrap_or_default();
        let restriction = self.context.restrictions.navigation_property(
            source,
            &declaring.name,
            &property.name,
            &nav.restriction_path(),
        );
        if !restriction.navigable {
            tracing::trace!(property = %property.name, "navigation suppressed by restriction");
            return Ok(());
        }
        if !collector.add(self, nav.clone()) {
            return Ok(());
        }

        // Non-contained targets are addressed through their own sources.
        if !property.contains_target {
            collector.add(self, nav.with(Segment::Ref)?);
            return Ok(());
        }

        let cyclic = frame.path.entity_types().any(|t| t.name == target.name);
        let owner = Element::property(&declaring.name, &property.name);

        if !property.is_collection() {
            if !cyclic {
                self.expand_entity(
                    collector,
                    &Frame {
                        path: nav,
                        entity_type: target,
                        owner,
                    },
                    None,
                )?;
            }
            return Ok(());
        }

        if !cyclic {
            self.expand_collection(collector, &nav, target, &owner)?;
        }
        if !restriction.indexable_by_key {
            return Ok(());
        }
        let Some(key) = self.key_segment(target)? else {
            return Ok(());
        };
        let keyed = nav.with(key)?;
        if collector.add(self, keyed.clone()) && !cyclic {
            self.expand_entity(
                collector,
                &Frame {
                    path: keyed,
                    entity_type: target,
                    owner,
                },
                None,
            )?;
        }
        Ok(())
    }

    fn add_streams(
        &self,
        collector: &mut Collector<'a>,
        frame: &Frame<'a>,
        pre_cast: Option<&'a EntityType>,
    ) -> Result<()> {
        let index = &self.context.index;
        let properties = index.structural_properties(frame.entity_type);
        let mut has_content_property = false;

        for property in properties.into_iter().filter(|p| p.is_stream()) {
            has_content_property |= property.name.eq_ignore_ascii_case("content");
            let declared_below = pre_cast.is_none_or(|pre| index.find_property(pre, &property.name).is_none());
            if declared_below {
                collector.add(
                    self,
                    frame.path.with(Segment::StreamProperty {
                        property,
                        entity_type: frame.entity_type,
                    })?,
                );
            }
        }

        // An explicit `content` stream property takes the place of `$value`.
        let media = index.has_stream(frame.entity_type)
            && !has_content_property
            && pre_cast.is_none_or(|pre| !index.has_stream(pre));
        if media {
            collector.add(
                self,
                frame.path.with(Segment::StreamContent {
                    entity_type: frame.entity_type,
                })?,
            );
        }
        Ok(())
    }

    /// Bound operations whose binding type is `entity_type` or an ancestor,
    /// with the given binding shape.
    fn add_operations(
        &self,
        collector: &mut Collector<'a>,
        path: &ODataPath<'a>,
        entity_type: &'a EntityType,
        collection: bool,
        owner: &Element,
        pre_cast: Option<&'a EntityType>,
    ) -> Result<()> {
        let settings = self.context.settings;
        if !settings.enable_operation_paths {
            return Ok(());
        }
        if pre_cast.is_some()
            && settings.require_derived_types_constraint_for_bound_operations
            && !self
                .context
                .restrictions
                .allows_derived_type(owner, &entity_type.name)
        {
            return Ok(());
        }

        for ty in self.context.index.type_chain(entity_type) {
            if !self.introduced(ty, pre_cast) {
                continue;
            }
            for bound in self.context.bound_operations(&ty.name) {
                if bound.collection == collection {
                    collector.add(
                        self,
                        path.with(Segment::Operation {
                            operation: bound.operation,
                        })?,
                    );
                }
            }
        }
        Ok(())
    }

    /// Whether members declared on `declaring` are new below `pre_cast`.
    fn introduced(&self, declaring: &EntityType, pre_cast: Option<&'a EntityType>) -> bool {
        pre_cast.is_none_or(|pre| {
            !self
                .context
                .index
                .type_chain(pre)
                .iter()
                .any(|t| t.name == declaring.name)
        })
    }

    fn casts_allowed(&self, path: &ODataPath<'a>, entity_type: &EntityType) -> bool {
        self.context.settings.enable_type_cast_segments
            && path.type_cast_count() < MAX_TYPE_CAST_DEPTH
            && !matches!(path.segments().last(), Some(Segment::TypeCast { .. }))
            && self.context.index.has_derived_types(entity_type)
    }

    fn cast_permitted(&self, owner: &Element, subtype: &EntityType) -> bool {
        !self
            .context
            .settings
            .require_derived_types_constraint_for_type_cast_segments
            || self
                .context
                .restrictions
                .allows_derived_type(owner, &subtype.name)
    }

    fn key_segment(&self, entity_type: &'a EntityType) -> Result<Option<Segment<'a>>> {
        let index = &self.context.index;
        let key = index.key(entity_type);
        if key.is_empty() {
            return Ok(None);
        }
        let properties = key
            .iter()
            .map(|name| {
                index
                    .find_property(entity_type, name)
                    .ok_or_else(|| Error::UnresolvedProperty {
                        entity_type: entity_type.name.clone(),
                        property: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Segment::Key {
            entity_type,
            properties,
        }))
    }

    fn entity_type(&self, name: &str, referenced_by: &str) -> Result<&'a EntityType> {
        self.context
            .index
            .entity_type(name)
            .ok_or_else(|| Error::UnresolvedType {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancelled {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

impl<'a> Collector<'a> {
    /// Record `path` unless its canonical string was seen before.
    fn add(&mut self, provider: &PathProvider<'_, 'a>, path: ODataPath<'a>) -> bool {
        let name = path.render(provider.context.settings).name;
        if self.seen.insert(name) {
            self.paths.push(path);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use indoc::indoc;
    use odata_edm::EdmModel;
    use pretty_assertions::assert_eq;

    fn names(yaml: &str, settings: &Settings) -> Vec<String> {
        let model: EdmModel = serde_yaml_ng::from_str(yaml).unwrap();
        let context = ODataContext::new(&model, settings).unwrap();
        PathProvider::new(&context)
            .paths()
            .unwrap()
            .iter()
            .map(|p| p.render(settings).name)
            .collect()
    }

    const CUSTOMER: &str = indoc! {r"
        entity_types:
          - name: NS.Customer
            key: [ID]
            properties:
              - { name: ID, type: Edm.Int32 }
    "};

    #[test]
    fn entity_set_with_key_yields_collection_and_entity() {
        let yaml = format!(
            "{CUSTOMER}{}",
            indoc! {r"
                container:
                  entity_sets:
                    - { name: Customers, entity_type: NS.Customer }
            "}
        );
        assert_eq!(
            names(&yaml, &Settings::default()),
            vec!["/Customers", "/Customers({ID})"]
        );
    }

    #[test]
    fn indexable_by_key_false_keeps_only_collection() {
        let yaml = format!(
            "{CUSTOMER}{}",
            indoc! {r"
                container:
                  entity_sets:
                    - name: Customers
                      entity_type: NS.Customer
                      annotations:
                        Org.OData.Capabilities.V1.IndexableByKey: false
            "}
        );
        assert_eq!(names(&yaml, &Settings::default()), vec!["/Customers"]);
    }

    #[test]
    fn no_container_yields_no_paths() {
        assert!(names(CUSTOMER, &Settings::default()).is_empty());
    }

    const PEOPLE: &str = indoc! {r"
        entity_types:
          - name: NS.Person
            key: [UserName]
            properties:
              - { name: UserName, type: Edm.String }
              - { name: Photo, type: Edm.Stream }
            navigation_properties:
              - { name: Friends, type: Collection(NS.Person) }
              - { name: Trips, type: Collection(NS.Trip), contains_target: true }
          - name: NS.Employee
            base_type: NS.Person
            navigation_properties:
              - { name: Peers, type: Collection(NS.Person) }
          - name: NS.Trip
            key: [TripId]
            has_stream: true
            properties:
              - { name: TripId, type: Edm.Int32 }
        operations:
          - name: NS.GetFavoriteAirline
            kind: function
            is_bound: true
            parameters: [{ name: person, type: NS.Person }]
          - name: NS.GetPeersForTrip
            kind: function
            is_bound: true
            parameters:
              - { name: employee, type: NS.Employee }
              - { name: tripId, type: Edm.Int32 }
        container:
          entity_sets:
            - { name: People, entity_type: NS.Person }
    "};

    #[test]
    fn expands_navigation_streams_casts_and_operations() {
        assert_eq!(
            names(PEOPLE, &Settings::default()),
            vec![
                "/People",
                "/People/NS.Employee",
                "/People({UserName})",
                "/People({UserName})/Friends",
                "/People({UserName})/Friends/$ref",
                "/People({UserName})/Trips",
                "/People({UserName})/Trips({TripId})",
                "/People({UserName})/Trips({TripId})/$value",
                "/People({UserName})/Photo",
                "/People({UserName})/NS.GetFavoriteAirline()",
                "/People({UserName})/NS.Employee",
                "/People({UserName})/NS.Employee/Peers",
                "/People({UserName})/NS.Employee/Peers/$ref",
                "/People({UserName})/NS.Employee/NS.GetPeersForTrip(tripId={tripId})",
            ]
        );
    }

    #[test]
    fn navigability_none_removes_subtree() {
        let settings = Settings::default();
        let all = names(PEOPLE, &settings);
        let restricted = PEOPLE.replace(
            "- { name: Trips, type: Collection(NS.Trip), contains_target: true }",
            "- name: Trips\n        type: Collection(NS.Trip)\n        contains_target: true\n        \
             annotations:\n          Org.OData.Capabilities.V1.NavigationRestrictions:\n            \
             Navigability: None",
        );
        let pruned = names(&restricted, &settings);
        assert!(pruned.iter().all(|p| !p.contains("/Trips")));
        assert_eq!(all.len() - pruned.len(), 3);
    }

    #[test]
    fn derived_type_constraint_gates_subtype_operations() {
        let settings =
            Settings::default().require_derived_types_constraint_for_bound_operations(true);
        let without = names(PEOPLE, &settings);
        assert!(!without.iter().any(|p| p.contains("GetPeersForTrip")));

        let constrained = PEOPLE.replace(
            "- { name: People, entity_type: NS.Person }",
            "- name: People\n      entity_type: NS.Person\n      annotations:\n        \
             Org.OData.Validation.V1.DerivedTypeConstraint: [NS.Employee]",
        );
        let with = names(&constrained, &settings);
        assert_eq!(with.len(), without.len() + 1);
        assert!(with.contains(
            &"/People({UserName})/NS.Employee/NS.GetPeersForTrip(tripId={tripId})".to_string()
        ));
    }

    #[test]
    fn type_cast_constraint_gates_casts() {
        let settings =
            Settings::default().require_derived_types_constraint_for_type_cast_segments(true);
        let paths = names(PEOPLE, &settings);
        assert!(!paths.iter().any(|p| p.contains("NS.Employee")));
    }

    #[test]
    fn contained_cycle_is_emitted_but_not_continued() {
        let yaml = indoc! {r"
            entity_types:
              - name: NS.Folder
                key: [id]
                properties: [{ name: id, type: Edm.String }]
                navigation_properties:
                  - { name: children, type: Collection(NS.Folder), contains_target: true }
            container:
              singletons:
                - { name: root, type: NS.Folder }
        "};
        assert_eq!(
            names(yaml, &Settings::default()),
            vec!["/root", "/root/children", "/root/children({id})"]
        );
    }

    #[test]
    fn operation_imports_render_by_kind() {
        let yaml = indoc! {r"
            operations:
              - name: NS.GetNearestAirport
                kind: function
                parameters:
                  - { name: lat, type: Edm.Double }
                  - { name: lon, type: Edm.Double }
              - { name: NS.ResetDataSource, kind: action }
            container:
              operation_imports:
                - { name: GetNearestAirport, operation: NS.GetNearestAirport }
                - { name: ResetDataSource, operation: NS.ResetDataSource }
        "};
        assert_eq!(
            names(yaml, &Settings::default()),
            vec!["/GetNearestAirport(lat={lat},lon={lon})", "/ResetDataSource"]
        );
    }

    #[test]
    fn cancellation_is_observed() {
        let model: EdmModel = serde_yaml_ng::from_str(PEOPLE).unwrap();
        let settings = Settings::default();
        let context = ODataContext::new(&model, &settings).unwrap();
        let flag = AtomicBool::new(true);
        let result = PathProvider::new(&context).with_cancellation(&flag).paths();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn generation_is_deterministic() {
        let settings = Settings::default();
        assert_eq!(names(PEOPLE, &settings), names(PEOPLE, &settings));
    }
}
