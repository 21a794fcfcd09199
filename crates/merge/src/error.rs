use schema::{SchemaError, TypeCategory};

/// Merge failures. There is no partially merged result: any of these stops the merge.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("Cannot merge different type categories into common type {type_name}: found {first} and {second}.")]
    CategoryMismatch {
        type_name: String,
        first: TypeCategory,
        second: TypeCategory,
    },
    #[error("Multiple canonical definitions for \"{0}\"")]
    MultipleCanonical(String),
    #[error("No candidates to merge for type \"{0}\".")]
    NoCandidates(String),
    /// A consistency check configured at the error level failed.
    #[error("{0}")]
    Validation(String),
    #[error("Unable to merge GraphQL type \"{type_name}\": {message}")]
    TypeDefinition { type_name: String, message: String },
    #[error(
        "Unable to merge GraphQL directive \"{name}\". \nExisting directive:  \n\t{existing} \nReceived directive: \n\t{received}"
    )]
    DirectiveDefinition {
        name: String,
        existing: String,
        received: String,
    },
    #[error("{0}")]
    Parse(String),
    #[error("Invalid merge configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MergeError {
    pub(crate) fn type_definition(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        MergeError::TypeDefinition {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}
