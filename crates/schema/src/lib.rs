//! In-memory GraphQL type system: named types, fields and directives, SDL building and
//! printing, and resolver attachment.

mod build;
mod error;
mod path;
mod print;
mod resolver_map;
mod resolvers;
mod scalars;
mod schema;
mod signal;
mod to_ast;
mod types;
mod validate;

pub use async_graphql_parser::{parse_query, parse_schema, types as ast, Pos, Positioned};
pub use async_graphql_value::{ConstValue, Name, Number, Value};

pub use build::{
    build_ast_schema, build_schema, directive_from_ast, enum_value_from_ast, field_from_ast, input_value_from_ast,
    type_from_ast, SchemaRoots, TypeDefinitions,
};
pub use error::SchemaError;
pub use path::{PathSegment, ResponsePath};
pub use print::print_document;
pub use resolver_map::{
    add_resolvers_to_schema, AddResolversOptions, FieldResolvers, ObjectResolvers, ResolverMap,
};
pub use resolvers::{
    ArgumentValues, ContextValue, FieldError, FieldResult, FieldValue, IsTypeOf, ResolveInfo, Resolver,
    ResolverContext, TypeResolver, TypeResolverContext, ValueStream, VariableValues,
};
pub use scalars::{inspect, is_builtin_scalar, ScalarFn, BUILTIN_SCALARS};
pub use schema::{
    is_builtin_directive, Schema, SchemaBuilder, SchemaInner, BUILTIN_DIRECTIVES, DEFAULT_DEPRECATION_REASON,
};
pub use signal::{AbortController, AbortSignal};
pub use to_ast::{directive_to_ast, enum_value_to_ast, field_to_ast, input_value_to_ast, type_to_ast};
pub use types::{
    directive_location_name, Directive, DirectiveDefinition, EnumType, EnumValue, Extensions, Field, InputObjectType,
    InputValue, InterfaceType, NamedType, ObjectType, ScalarType, TypeCategory, TypeRef, UnionType,
};
pub use wrapping::{ListWrapping, Wrapping};
