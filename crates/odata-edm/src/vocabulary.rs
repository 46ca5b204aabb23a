//! Qualified names of the vocabulary terms consumers interpret.

/// `Org.OData.Capabilities.V1` namespace prefix.
pub const CAPABILITIES_NAMESPACE: &str = "Org.OData.Capabilities.V1";

/// Navigation restrictions (`Navigability`, `RestrictedProperties`).
pub const NAVIGATION_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.NavigationRestrictions";
/// Read restrictions (`Readable`, `Permissions`, `ReadByKeyRestrictions`).
pub const READ_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.ReadRestrictions";
/// Insert restrictions (`Insertable`, `Permissions`).
pub const INSERT_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.InsertRestrictions";
/// Update restrictions (`Updatable`, `Permissions`).
pub const UPDATE_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.UpdateRestrictions";
/// Delete restrictions (`Deletable`, `Permissions`).
pub const DELETE_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.DeleteRestrictions";
/// Whether entities can be addressed by key.
pub const INDEXABLE_BY_KEY: &str = "Org.OData.Capabilities.V1.IndexableByKey";
/// `$top` support.
pub const TOP_SUPPORTED: &str = "Org.OData.Capabilities.V1.TopSupported";
/// `$skip` support.
pub const SKIP_SUPPORTED: &str = "Org.OData.Capabilities.V1.SkipSupported";
/// `$search` support (`Searchable`).
pub const SEARCH_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.SearchRestrictions";
/// `$filter` support (`Filterable`).
pub const FILTER_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.FilterRestrictions";
/// `$count` support (`Countable`).
pub const COUNT_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.CountRestrictions";
/// `$orderby` support (`Sortable`).
pub const SORT_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.SortRestrictions";
/// `$select` support (`Supported`).
pub const SELECT_SUPPORT: &str = "Org.OData.Capabilities.V1.SelectSupport";
/// `$expand` support (`Expandable`).
pub const EXPAND_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.ExpandRestrictions";
/// Operation permissions (`Permissions`).
pub const OPERATION_RESTRICTIONS: &str = "Org.OData.Capabilities.V1.OperationRestrictions";

/// Allow-list of derived types usable in place of the declared type.
pub const DERIVED_TYPE_CONSTRAINT: &str = "Org.OData.Validation.V1.DerivedTypeConstraint";

/// Short description (`Org.OData.Core.V1.Description`).
pub const CORE_DESCRIPTION: &str = "Org.OData.Core.V1.Description";
/// Long description (`Org.OData.Core.V1.LongDescription`).
pub const CORE_LONG_DESCRIPTION: &str = "Org.OData.Core.V1.LongDescription";

/// Qualify a capabilities term name (`TopSupported` →
/// `Org.OData.Capabilities.V1.TopSupported`).
#[must_use]
pub fn capability_term(short: &str) -> String {
    format!("{CAPABILITIES_NAMESPACE}.{short}")
}
