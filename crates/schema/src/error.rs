use crate::TypeCategory;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("{0}")]
    Parse(String),
    #[error("There can be only one type named \"{0}\".")]
    DuplicateType(String),
    #[error("There can be only one directive named \"@{0}\".")]
    DuplicateDirective(String),
    #[error("Must provide only one schema definition.")]
    DuplicateSchemaDefinition,
    #[error("Cannot extend type \"{0}\" because it is not defined.")]
    UnknownExtendedType(String),
    #[error("Cannot extend non-{expected} type \"{name}\".")]
    ExtensionKindMismatch { name: String, expected: TypeCategory },
    #[error("Field \"{type_name}.{field_name}\" can only be defined once.")]
    DuplicateField { type_name: String, field_name: String },
    #[error("{}", .0.join("\n\n"))]
    Invalid(Vec<String>),
    #[error("\"{0}\" defined in resolvers, but not in schema")]
    UnknownResolverType(String),
    #[error("{type_name}.{field_name} defined in resolvers, but not in schema")]
    UnknownResolverField { type_name: String, field_name: String },
    #[error("{type_name}.{value} was defined in resolvers, but not present within {type_name}")]
    UnknownResolverEnumValue { type_name: String, value: String },
    #[error("Resolvers for \"{type_name}\" cannot be applied to a {category} type")]
    ResolverKindMismatch { type_name: String, category: TypeCategory },
}
