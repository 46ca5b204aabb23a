//! Generation settings loaded from YAML.
//!
//! Externalizes the conversion knobs (key style, pagination, operation ids,
//! derived-type policies) so they live next to the service metadata instead
//! of being hardcoded in Rust source.
//!
//! # File format
//!
//! ```yaml
//! # api/odata/settings.yaml
//! key_as_segment: false
//! prefix_entity_type_name_before_key: false
//! enable_operation_id: true
//!
//! # Adds `@odata.nextLink` and the `x-ms-pageable` extension to collection reads.
//! enable_pagination: true
//! pageable_operation_name: listMore
//!
//! # Subtypes need an explicit DerivedTypeConstraint allow-list.
//! require_derived_types_constraint_for_bound_operations: true
//! require_derived_types_constraint_for_type_cast_segments: false
//!
//! # Responses reference `anyOf` the type and all its subtypes.
//! enable_derived_types_references_for_responses: false
//! ```

use std::path::Path;

use serde::Deserialize;

/// Default `pageable_operation_name`.
pub const DEFAULT_PAGEABLE_OPERATION_NAME: &str = "listMore";

/// Conversion settings for one generation run.
///
/// Loaded from a YAML file via [`Settings::load`], or built in code from
/// [`Settings::default`] with the builder methods below.
///
/// # Example
///
/// ```ignore
/// let settings = Settings::default()
///     .key_as_segment(true)
///     .enable_pagination(true);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Render single keys as a path segment (`/Customers/{ID}`) instead of
    /// parentheses (`/Customers({ID})`).
    pub key_as_segment: bool,

    /// Prefix single-key parameter names with the entity type name
    /// (`{Customer-ID}`).
    pub prefix_entity_type_name_before_key: bool,

    /// Add next-link properties and the pageable extension to collection reads.
    pub enable_pagination: bool,

    /// Emit `operationId` on every operation.
    pub enable_operation_id: bool,

    /// Operations bound to a subtype need the subtype in the owning
    /// element's `DerivedTypeConstraint`.
    pub require_derived_types_constraint_for_bound_operations: bool,

    /// Response schemas reference the type and all its subtypes (`anyOf`).
    pub enable_derived_types_references_for_responses: bool,

    /// `operationName` of the `x-ms-pageable` extension.
    pub pageable_operation_name: String,

    /// Emit type-cast segments for derived types.
    pub enable_type_cast_segments: bool,

    /// Type-cast segments need the subtype in the owning element's
    /// `DerivedTypeConstraint`.
    pub require_derived_types_constraint_for_type_cast_segments: bool,

    /// Expand navigation properties.
    pub enable_navigation_property_paths: bool,

    /// Emit bound action/function paths.
    pub enable_operation_paths: bool,

    /// Emit action/function import paths.
    pub enable_operation_import_paths: bool,

    /// `$ref` of the default (error) response.
    pub default_response_ref: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_as_segment: false,
            prefix_entity_type_name_before_key: false,
            enable_pagination: false,
            enable_operation_id: true,
            require_derived_types_constraint_for_bound_operations: false,
            enable_derived_types_references_for_responses: false,
            pageable_operation_name: DEFAULT_PAGEABLE_OPERATION_NAME.to_string(),
            enable_type_cast_segments: true,
            require_derived_types_constraint_for_type_cast_segments: false,
            enable_navigation_property_paths: true,
            enable_operation_paths: true,
            enable_operation_import_paths: true,
            default_response_ref: crate::DEFAULT_ERROR_RESPONSE_REF.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml_ng::from_str(&content)?;
        Ok(settings)
    }

    /// Enable or disable key-as-segment rendering.
    #[must_use]
    pub fn key_as_segment(mut self, enabled: bool) -> Self {
        self.key_as_segment = enabled;
        self
    }

    /// Enable or disable entity type prefixes on single-key parameter names.
    #[must_use]
    pub fn prefix_entity_type_name_before_key(mut self, enabled: bool) -> Self {
        self.prefix_entity_type_name_before_key = enabled;
        self
    }

    /// Enable or disable pagination properties and extensions.
    #[must_use]
    pub fn enable_pagination(mut self, enabled: bool) -> Self {
        self.enable_pagination = enabled;
        self
    }

    /// Enable or disable `operationId` generation.
    #[must_use]
    pub fn enable_operation_id(mut self, enabled: bool) -> Self {
        self.enable_operation_id = enabled;
        self
    }

    /// Require derived-type constraints for operations bound to subtypes.
    #[must_use]
    pub fn require_derived_types_constraint_for_bound_operations(mut self, enabled: bool) -> Self {
        self.require_derived_types_constraint_for_bound_operations = enabled;
        self
    }

    /// Enable or disable `anyOf` derived-type response schemas.
    #[must_use]
    pub fn enable_derived_types_references_for_responses(mut self, enabled: bool) -> Self {
        self.enable_derived_types_references_for_responses = enabled;
        self
    }

    /// Set the pageable extension's `operationName`.
    #[must_use]
    pub fn pageable_operation_name(mut self, name: &str) -> Self {
        self.pageable_operation_name = name.to_string();
        self
    }

    /// Enable or disable type-cast segments.
    #[must_use]
    pub fn enable_type_cast_segments(mut self, enabled: bool) -> Self {
        self.enable_type_cast_segments = enabled;
        self
    }

    /// Require derived-type constraints for type-cast segments.
    #[must_use]
    pub fn require_derived_types_constraint_for_type_cast_segments(
        mut self,
        enabled: bool,
    ) -> Self {
        self.require_derived_types_constraint_for_type_cast_segments = enabled;
        self
    }

    /// Enable or disable navigation property expansion.
    #[must_use]
    pub fn enable_navigation_property_paths(mut self, enabled: bool) -> Self {
        self.enable_navigation_property_paths = enabled;
        self
    }

    /// Enable or disable bound operation paths.
    #[must_use]
    pub fn enable_operation_paths(mut self, enabled: bool) -> Self {
        self.enable_operation_paths = enabled;
        self
    }

    /// Enable or disable operation import paths.
    #[must_use]
    pub fn enable_operation_import_paths(mut self, enabled: bool) -> Self {
        self.enable_operation_import_paths = enabled;
        self
    }

    /// Set the default (error) response `$ref`.
    #[must_use]
    pub fn default_response_ref(mut self, ref_path: &str) -> Self {
        self.default_response_ref = ref_path.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_defaults() {
        let settings: Settings = serde_yaml_ng::from_str("{}").unwrap();
        assert!(!settings.key_as_segment);
        assert!(!settings.enable_pagination);
        assert!(settings.enable_operation_id);
        assert!(settings.enable_type_cast_segments);
        assert!(!settings.require_derived_types_constraint_for_bound_operations);
        assert_eq!(settings.pageable_operation_name, "listMore");
        assert_eq!(
            settings.default_response_ref,
            "#/components/responses/error"
        );
    }

    #[test]
    fn deserialize_full() {
        let yaml = r##"
key_as_segment: true
prefix_entity_type_name_before_key: true
enable_pagination: true
enable_operation_id: false
require_derived_types_constraint_for_bound_operations: true
enable_derived_types_references_for_responses: true
pageable_operation_name: nextPage
default_response_ref: "#/components/responses/ODataError"
"##;
        let settings: Settings = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(settings.key_as_segment);
        assert!(settings.prefix_entity_type_name_before_key);
        assert!(settings.enable_pagination);
        assert!(!settings.enable_operation_id);
        assert!(settings.require_derived_types_constraint_for_bound_operations);
        assert!(settings.enable_derived_types_references_for_responses);
        assert_eq!(settings.pageable_operation_name, "nextPage");
        assert_eq!(
            settings.default_response_ref,
            "#/components/responses/ODataError"
        );
        // Unlisted options keep defaults
        assert!(settings.enable_navigation_property_paths);
        assert!(!settings.require_derived_types_constraint_for_type_cast_segments);
    }

    #[test]
    fn builder_overrides_defaults() {
        let settings = Settings::default()
            .key_as_segment(true)
            .enable_operation_id(false)
            .pageable_operation_name("more");
        assert!(settings.key_as_segment);
        assert!(!settings.enable_operation_id);
        assert_eq!(settings.pageable_operation_name, "more");
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("odata-openapi-settings-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.yaml");
        std::fs::write(&path, "enable_pagination: true\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(settings.enable_pagination);
        assert!(settings.enable_operation_id);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = Settings::load(Path::new("/nonexistent/settings.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_yaml_returns_error() {
        let dir = std::env::temp_dir().join("odata-openapi-settings-invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.yaml");
        std::fs::write(&path, "enable_pagination: [[[invalid").unwrap();

        let result = Settings::load(&path);
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
