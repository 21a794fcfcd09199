use merge::MergeError;
use schema::SchemaError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoaderError {
    #[error("Unable to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("Unable to parse {location}: {message}")]
    Parse { location: String, message: String },
    #[error("No loader is able to load \"{0}\"")]
    NoLoader(String),
    /// Every loader able to load the pointer failed.
    #[error("Failed to load \"{pointer}\":\n{}", .errors.iter().map(|error| format!("  - {error}")).collect::<Vec<_>>().join("\n"))]
    Aggregate { pointer: String, errors: Vec<LoaderError> },
    #[error("Unable to find any GraphQL type definitions for the following pointers:\n{}", .0.iter().map(|pointer| format!("  - {pointer}")).collect::<Vec<_>>().join("\n"))]
    NoTypeDefinitions(Vec<String>),
    #[error("Invalid load options: {0}")]
    Config(String),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
