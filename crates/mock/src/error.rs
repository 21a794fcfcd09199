use schema::SchemaError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MockError {
    #[error("No mock defined for type \"{0}\"")]
    NoMock(String),
    #[error("{0} does not exist on schema")]
    UnknownType(String),
    #[error("{field_name} does not exist on type {type_name}")]
    UnknownField { type_name: String, field_name: String },
    #[error("Value returned by the mock for {0} is not an object")]
    NotAnObject(String),
    #[error("Please return a __typename in \"{0}\"")]
    MissingTypename(String),
    #[error("Field {field_name} is a key field of {type_name} and you are trying to set it to {value} while the key is {key}")]
    KeyFieldMismatch {
        type_name: String,
        field_name: String,
        value: String,
        key: String,
    },
    #[error("Value to set in {type_name}.{field_name} is not normalizable: {message}")]
    NotNormalizable {
        type_name: String,
        field_name: String,
        message: String,
    },
    #[error("{0}")]
    InvalidValue(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
