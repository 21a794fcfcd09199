//! Merging of GraphQL type definitions, resolver maps and whole schemas.
//!
//! Two levels are available. [`merge_type_defs`] works on SDL documents and folds definitions
//! sharing a name. [`merge_candidates`] works on built types and is what [`merge_schemas`] runs
//! for every type name found across subschemas, with canonical claims and consistency
//! validation.

mod candidates;
mod config;
mod error;
mod schemas;
mod type_defs;

pub use candidates::{merge_candidates, MergeFieldCandidate, MergeTypeCandidate};
pub use config::{
    EnumValueConfigMerger, FieldConfigMerger, FieldMergeConfig, InputFieldConfigMerger, MergeTypeDefsConfig,
    SubschemaMergeConfig, TypeCandidateMerger, TypeDescriptionsMerger, TypeMergeConfig, TypeMergingOptions,
    ValidationLevel, ValidationSettings,
};
pub use error::MergeError;
pub use schemas::{make_executable_schema, merge_resolvers, merge_schemas, Subschema};
pub use type_defs::{merge_type_defs, TypeSource};
