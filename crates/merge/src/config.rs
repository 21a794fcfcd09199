//! Merge configuration. The serializable parts load from TOML, strategy functions are set in
//! code.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use schema::{EnumValue, Field, InputValue};

use crate::{MergeError, MergeFieldCandidate, MergeTypeCandidate};

/// Options of [`crate::merge_type_defs`].
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct MergeTypeDefsConfig {
    /// Add a `schema` definition for root types using the default names.
    pub use_schema_definition: bool,
    /// Add a `schema { query: Query }` definition even without any root type.
    pub force_schema_definition: bool,
    /// Fail on any field type change, nullability included, instead of adopting non-null.
    pub throw_on_conflict: bool,
    /// Order definitions, fields, arguments and values by name.
    pub sort: bool,
    /// `Type`, `Type.*` or `Type.field` entries left out of the result.
    pub exclusions: Vec<String>,
    /// Keep the first definition of a field instead of checking and merging redefinitions.
    pub ignore_field_conflicts: bool,
    /// Earlier argument definitions win over later ones.
    pub reverse_arguments: bool,
    /// Earlier applied directives come first.
    pub reverse_directives: bool,
    /// Keep the order of enum values as first seen across sources.
    pub consistent_enum_merge: bool,
    /// Emit type extensions as plain definitions.
    pub convert_extensions: bool,
}

impl Default for MergeTypeDefsConfig {
    fn default() -> Self {
        MergeTypeDefsConfig {
            use_schema_definition: true,
            force_schema_definition: false,
            throw_on_conflict: false,
            sort: false,
            exclusions: Vec::new(),
            ignore_field_conflicts: false,
            reverse_arguments: false,
            reverse_directives: false,
            consistent_enum_merge: false,
            convert_extensions: false,
        }
    }
}

impl MergeTypeDefsConfig {
    pub fn from_toml(toml: &str) -> Result<Self, MergeError> {
        toml::from_str(toml).map_err(|error| MergeError::Config(error.to_string()))
    }

    pub(crate) fn excludes_type(&self, type_name: &str) -> bool {
        self.exclusions
            .iter()
            .any(|exclusion| exclusion == type_name || exclusion.strip_suffix(".*") == Some(type_name))
    }

    pub(crate) fn excludes_field(&self, type_name: &str, field_name: &str) -> bool {
        self.exclusions.iter().any(|exclusion| {
            exclusion
                .split_once('.')
                .is_some_and(|(ty, field)| ty == type_name && field == field_name)
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Off,
    Warn,
    #[default]
    Error,
}

/// Consistency checks run while merging candidates. Unset values fall back to the enclosing
/// scope, and finally to the defaults.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ValidationSettings {
    pub validation_level: Option<ValidationLevel>,
    /// Report any nullability difference, at the validation level, instead of warning about
    /// unsafe ones.
    pub strict_null_comparison: Option<bool>,
    /// Scalars allowed to stand in for the keyed scalar across subschemas.
    pub proxiable_scalars: IndexMap<String, Vec<String>>,
}

impl ValidationSettings {
    fn overlay(&mut self, scope: &ValidationSettings) {
        if scope.validation_level.is_some() {
            self.validation_level = scope.validation_level;
        }
        if scope.strict_null_comparison.is_some() {
            self.strict_null_comparison = scope.strict_null_comparison;
        }
        for (scalar, proxies) in &scope.proxiable_scalars {
            self.proxiable_scalars.insert(scalar.clone(), proxies.clone());
        }
    }

    pub fn level(&self) -> ValidationLevel {
        self.validation_level.unwrap_or_default()
    }

    pub fn is_strict_null_comparison(&self) -> bool {
        self.strict_null_comparison.unwrap_or_default()
    }

    pub fn is_proxiable(&self, scalar: &str, proxy: &str) -> bool {
        self.proxiable_scalars
            .get(scalar)
            .is_some_and(|proxies| proxies.iter().any(|candidate| candidate == proxy))
    }
}

/// Merge configuration of a subschema, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct SubschemaMergeConfig(pub IndexMap<String, TypeMergeConfig>);

impl SubschemaMergeConfig {
    pub fn from_toml(toml: &str) -> Result<Self, MergeError> {
        toml::from_str(toml).map_err(|error| MergeError::Config(error.to_string()))
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeMergeConfig> {
        self.0.get(type_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeMergeConfig {
    /// This subschema's definition of the type is authoritative.
    pub canonical: bool,
    pub fields: IndexMap<String, FieldMergeConfig>,
}

impl TypeMergeConfig {
    pub fn canonical() -> Self {
        TypeMergeConfig {
            canonical: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_canonical_field(mut self, field_name: impl Into<String>) -> Self {
        self.fields.insert(field_name.into(), FieldMergeConfig { canonical: true });
        self
    }

    pub fn is_field_canonical(&self, field_name: &str) -> bool {
        self.fields.get(field_name).is_some_and(|field| field.canonical)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldMergeConfig {
    pub canonical: bool,
}

/// Picks the candidate owning the merged type. It is moved last, so it wins default ties.
pub type TypeCandidateMerger = Arc<dyn Fn(&[MergeTypeCandidate]) -> Result<usize, MergeError> + Send + Sync>;

/// Description of the merged type, given the ordered candidates.
pub type TypeDescriptionsMerger = Arc<dyn Fn(&[MergeTypeCandidate]) -> Option<String> + Send + Sync>;

pub type FieldConfigMerger = Arc<dyn Fn(&[MergeFieldCandidate<'_, Field>]) -> Result<Field, MergeError> + Send + Sync>;

pub type InputFieldConfigMerger =
    Arc<dyn Fn(&[MergeFieldCandidate<'_, InputValue>]) -> Result<InputValue, MergeError> + Send + Sync>;

pub type EnumValueConfigMerger =
    Arc<dyn Fn(&[MergeFieldCandidate<'_, EnumValue>]) -> Result<EnumValue, MergeError> + Send + Sync>;

/// Options of candidate merging. Every strategy falls back to the documented default when
/// unset.
#[derive(Clone, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct TypeMergingOptions {
    pub validation_settings: ValidationSettings,
    /// Settings per `Type`, `Type.field` or `Type.field.argument`, the most specific winning.
    pub validation_scopes: IndexMap<String, ValidationSettings>,
    #[serde(skip)]
    pub type_candidate_merger: Option<TypeCandidateMerger>,
    #[serde(skip)]
    pub type_descriptions_merger: Option<TypeDescriptionsMerger>,
    #[serde(skip)]
    pub field_config_merger: Option<FieldConfigMerger>,
    #[serde(skip)]
    pub input_field_config_merger: Option<InputFieldConfigMerger>,
    #[serde(skip)]
    pub enum_value_config_merger: Option<EnumValueConfigMerger>,
}

impl TypeMergingOptions {
    pub fn from_toml(toml: &str) -> Result<Self, MergeError> {
        toml::from_str(toml).map_err(|error| MergeError::Config(error.to_string()))
    }

    /// Effective settings of a `Type.field.argument` style namespace.
    pub fn validation_settings(&self, namespace: &str) -> ValidationSettings {
        let mut settings = self.validation_settings.clone();

        let mut scope = String::with_capacity(namespace.len());
        for (i, part) in namespace.split('.').enumerate() {
            if i > 0 {
                scope.push('.');
            }
            scope.push_str(part);

            if let Some(overrides) = self.validation_scopes.get(&scope) {
                settings.overlay(overrides);
            }
        }

        settings
    }
}

impl fmt::Debug for TypeMergingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMergingOptions")
            .field("validation_settings", &self.validation_settings)
            .field("validation_scopes", &self.validation_scopes)
            .field("type_candidate_merger", &self.type_candidate_merger.is_some())
            .field("type_descriptions_merger", &self.type_descriptions_merger.is_some())
            .field("field_config_merger", &self.field_config_merger.is_some())
            .field("input_field_config_merger", &self.input_field_config_merger.is_some())
            .field("enum_value_config_merger", &self.enum_value_config_merger.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_defs_config_from_toml() {
        let config = MergeTypeDefsConfig::from_toml(
            r#"
            throwOnConflict = true
            sort = true
            exclusions = ["Internal", "Query.debug"]
            "#,
        )
        .unwrap();

        assert!(config.use_schema_definition);
        assert!(config.throw_on_conflict);
        assert!(config.sort);
        assert!(config.excludes_type("Internal"));
        assert!(!config.excludes_type("Query"));
        assert!(config.excludes_field("Query", "debug"));

        let error = MergeTypeDefsConfig::from_toml("unknown = 1").unwrap_err();
        assert!(error.to_string().starts_with("Invalid merge configuration: "));
    }

    #[test]
    fn scoped_validation_settings() {
        let options = TypeMergingOptions::from_toml(
            r#"
            [validationSettings]
            validationLevel = "warn"
            proxiableScalars = { String = ["ID"] }

            [validationScopes."Product"]
            strictNullComparison = true

            [validationScopes."Product.price"]
            validationLevel = "off"
            "#,
        )
        .unwrap();

        let settings = options.validation_settings("Product.name");
        assert_eq!(settings.level(), ValidationLevel::Warn);
        assert!(settings.is_strict_null_comparison());
        assert!(settings.is_proxiable("String", "ID"));

        let settings = options.validation_settings("Product.price.currency");
        assert_eq!(settings.level(), ValidationLevel::Off);
        assert!(settings.is_strict_null_comparison());

        assert_eq!(options.validation_settings("Other").level(), ValidationLevel::Warn);
        assert_eq!(TypeMergingOptions::default().validation_settings("X").level(), ValidationLevel::Error);
    }

    #[test]
    fn subschema_merge_config_from_toml() {
        let config = SubschemaMergeConfig::from_toml(
            r#"
            [Product]
            canonical = true

            [User.fields.name]
            canonical = true
            "#,
        )
        .unwrap();

        assert!(config.get("Product").unwrap().canonical);
        assert!(config.get("User").unwrap().is_field_canonical("name"));
        assert!(!config.get("User").unwrap().canonical);
    }
}
