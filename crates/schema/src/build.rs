//! Building the type system model from SDL.

use async_graphql_parser::{
    parse_schema,
    types::{self as ast, TypeKind, TypeSystemDefinition},
    Positioned,
};
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::{
    schema::DEFAULT_DEPRECATION_REASON, Directive, DirectiveDefinition, EnumType, EnumValue, Field, InputObjectType,
    InputValue, InterfaceType, NamedType, ObjectType, ScalarType, Schema, SchemaBuilder, SchemaError, TypeCategory,
    TypeRef, UnionType,
};

/// Parses SDL and builds a validated schema from it.
pub fn build_schema(sdl: &str) -> Result<Schema, SchemaError> {
    let document = parse_schema(sdl).map_err(|error| SchemaError::Parse(error.to_string()))?;
    build_ast_schema(&document)
}

pub fn build_ast_schema(document: &ast::ServiceDocument) -> Result<Schema, SchemaError> {
    TypeDefinitions::from_document(document)?.into_builder().finish()
}

/// Root operation types declared by a `schema` definition.
#[derive(Debug, Clone, Default)]
pub struct SchemaRoots {
    pub query: Option<Name>,
    pub mutation: Option<Name>,
    pub subscription: Option<Name>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::SchemaDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::SchemaDefinition>>,
}

/// Types and directives of one SDL document, with extensions applied but not validated.
#[derive(Debug, Clone, Default)]
pub struct TypeDefinitions {
    pub types: IndexMap<Name, NamedType>,
    pub directives: IndexMap<Name, DirectiveDefinition>,
    pub schema: Option<SchemaRoots>,
}

impl TypeDefinitions {
    pub fn from_document(document: &ast::ServiceDocument) -> Result<Self, SchemaError> {
        let mut definitions = TypeDefinitions::default();
        let mut type_extensions = Vec::new();
        let mut schema_extensions = Vec::new();

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Type(ty) if ty.node.extend => type_extensions.push(ty),
                TypeSystemDefinition::Type(ty) => {
                    let named_type = type_from_ast(ty)?;
                    let name = named_type.name().clone();
                    if definitions.types.insert(name.clone(), named_type).is_some() {
                        return Err(SchemaError::DuplicateType(name.to_string()));
                    }
                }
                TypeSystemDefinition::Directive(directive) => {
                    let directive = directive_from_ast(directive);
                    let name = directive.name.clone();
                    if definitions.directives.insert(name.clone(), directive).is_some() {
                        return Err(SchemaError::DuplicateDirective(name.to_string()));
                    }
                }
                TypeSystemDefinition::Schema(schema) if schema.node.extend => schema_extensions.push(schema),
                TypeSystemDefinition::Schema(schema) => {
                    if definitions.schema.is_some() {
                        return Err(SchemaError::DuplicateSchemaDefinition);
                    }

                    definitions.schema = Some(SchemaRoots {
                        query: schema.node.query.as_ref().map(|name| name.node.clone()),
                        mutation: schema.node.mutation.as_ref().map(|name| name.node.clone()),
                        subscription: schema.node.subscription.as_ref().map(|name| name.node.clone()),
                        directives: schema.node.directives.iter().map(Directive::from_ast).collect(),
                        ast_node: Some(schema.clone()),
                        extension_ast_nodes: Vec::new(),
                    });
                }
            }
        }

        for extension in type_extensions {
            let name = &extension.node.name.node;
            let Some(ty) = definitions.types.get_mut(name) else {
                return Err(SchemaError::UnknownExtendedType(name.to_string()));
            };

            extend_type(ty, extension)?;
        }

        for extension in schema_extensions {
            let roots = definitions.schema.get_or_insert_with(SchemaRoots::default);
            let node = &extension.node;

            if let Some(query) = &node.query {
                roots.query = Some(query.node.clone());
            }
            if let Some(mutation) = &node.mutation {
                roots.mutation = Some(mutation.node.clone());
            }
            if let Some(subscription) = &node.subscription {
                roots.subscription = Some(subscription.node.clone());
            }

            roots.directives.extend(node.directives.iter().map(Directive::from_ast));
            roots.extension_ast_nodes.push(extension.clone());
        }

        Ok(definitions)
    }

    /// Root types default to `Query`, `Mutation` and `Subscription` without a schema definition.
    pub fn into_builder(self) -> SchemaBuilder {
        let TypeDefinitions {
            types,
            directives,
            schema,
        } = self;

        let roots = schema.unwrap_or_else(|| {
            let by_name = |name: &str| types.contains_key(name).then(|| Name::new(name));
            SchemaRoots {
                query: by_name("Query"),
                mutation: by_name("Mutation"),
                subscription: by_name("Subscription"),
                ..SchemaRoots::default()
            }
        });

        let mut builder = Schema::builder().ast_node(roots.ast_node.clone());

        if let Some(query) = roots.query {
            builder = builder.query_type(query);
        }
        if let Some(mutation) = roots.mutation {
            builder = builder.mutation_type(mutation);
        }
        if let Some(subscription) = roots.subscription {
            builder = builder.subscription_type(subscription);
        }

        for directive in roots.directives {
            builder = builder.schema_directive(directive);
        }
        for node in roots.extension_ast_nodes {
            builder = builder.extension_ast_node(node);
        }
        for ty in types.into_values() {
            builder = builder.register_type(ty);
        }
        for directive in directives.into_values() {
            builder = builder.register_directive(directive);
        }

        builder
    }
}

fn description(description: &Option<Positioned<String>>) -> Option<String> {
    description.as_ref().map(|description| description.node.clone())
}

fn directives(directives: &[Positioned<ast::ConstDirective>]) -> Vec<Directive> {
    directives.iter().map(Directive::from_ast).collect()
}

pub(crate) fn deprecation_reason(directives: &[Positioned<ast::ConstDirective>]) -> Option<String> {
    let deprecated = directives
        .iter()
        .find(|directive| directive.node.name.node == "deprecated")?;

    match deprecated.node.get_argument("reason").map(|reason| &reason.node) {
        Some(ConstValue::String(reason)) => Some(reason.clone()),
        _ => Some(DEFAULT_DEPRECATION_REASON.to_string()),
    }
}

/// Converts one (non extension) type definition.
pub fn type_from_ast(definition: &Positioned<ast::TypeDefinition>) -> Result<NamedType, SchemaError> {
    let node = &definition.node;
    let name = node.name.node.clone();

    let ty = match &node.kind {
        TypeKind::Scalar => {
            let mut scalar = ScalarType::new(&name);
            scalar.specified_by_url = node
                .directives
                .iter()
                .find(|directive| directive.node.name.node == "specifiedBy")
                .and_then(|directive| directive.node.get_argument("url"))
                .and_then(|url| match &url.node {
                    ConstValue::String(url) => Some(url.clone()),
                    _ => None,
                });
            scalar.description = description(&node.description);
            scalar.directives = directives(&node.directives);
            scalar.ast_node = Some(definition.clone());
            NamedType::Scalar(scalar)
        }
        TypeKind::Object(object) => {
            let mut ty = ObjectType::new(&name);
            ty.description = description(&node.description);
            ty.fields = fields_from_ast(&name, &object.fields)?;
            ty.interfaces = object.implements.iter().map(|name| name.node.clone()).collect();
            ty.directives = directives(&node.directives);
            ty.ast_node = Some(definition.clone());
            NamedType::Object(ty)
        }
        TypeKind::Interface(interface) => {
            let mut ty = InterfaceType::new(&name);
            ty.description = description(&node.description);
            ty.fields = fields_from_ast(&name, &interface.fields)?;
            ty.interfaces = interface.implements.iter().map(|name| name.node.clone()).collect();
            ty.directives = directives(&node.directives);
            ty.ast_node = Some(definition.clone());
            NamedType::Interface(ty)
        }
        TypeKind::Union(union) => {
            let mut ty = UnionType::new(&name);
            ty.description = description(&node.description);
            ty.members = union.members.iter().map(|name| name.node.clone()).collect();
            ty.directives = directives(&node.directives);
            ty.ast_node = Some(definition.clone());
            NamedType::Union(ty)
        }
        TypeKind::Enum(enum_type) => {
            let mut ty = EnumType::new(&name);
            ty.description = description(&node.description);
            ty.values = enum_type
                .values
                .iter()
                .map(|value| {
                    let value = enum_value_from_ast(value);
                    (value.name.clone(), value)
                })
                .collect();
            ty.directives = directives(&node.directives);
            ty.ast_node = Some(definition.clone());
            NamedType::Enum(ty)
        }
        TypeKind::InputObject(input) => {
            let mut ty = InputObjectType::new(&name);
            ty.description = description(&node.description);
            ty.fields = input_values_from_ast(&input.fields);
            ty.directives = directives(&node.directives);
            ty.ast_node = Some(definition.clone());
            NamedType::InputObject(ty)
        }
    };

    Ok(ty)
}

fn fields_from_ast(
    type_name: &str,
    definitions: &[Positioned<ast::FieldDefinition>],
) -> Result<IndexMap<Name, Field>, SchemaError> {
    let mut fields = IndexMap::with_capacity(definitions.len());

    for definition in definitions {
        let field = field_from_ast(definition);
        let name = field.name.clone();
        if fields.insert(name.clone(), field).is_some() {
            return Err(SchemaError::DuplicateField {
                type_name: type_name.to_string(),
                field_name: name.to_string(),
            });
        }
    }

    Ok(fields)
}

pub fn field_from_ast(definition: &Positioned<ast::FieldDefinition>) -> Field {
    let node = &definition.node;
    let mut field = Field::new(&node.name.node, TypeRef::from_ast(&node.ty.node));
    field.description = description(&node.description);
    field.arguments = input_values_from_ast(&node.arguments);
    field.deprecation_reason = deprecation_reason(&node.directives);
    field.directives = directives(&node.directives);
    field.ast_node = Some(definition.clone());
    field
}

fn input_values_from_ast(definitions: &[Positioned<ast::InputValueDefinition>]) -> IndexMap<Name, InputValue> {
    definitions
        .iter()
        .map(|definition| {
            let value = input_value_from_ast(definition);
            (value.name.clone(), value)
        })
        .collect()
}

pub fn input_value_from_ast(definition: &Positioned<ast::InputValueDefinition>) -> InputValue {
    let node = &definition.node;
    let mut value = InputValue::new(&node.name.node, TypeRef::from_ast(&node.ty.node));
    value.description = description(&node.description);
    value.default_value = node.default_value.as_ref().map(|value| value.node.clone());
    value.deprecation_reason = deprecation_reason(&node.directives);
    value.directives = directives(&node.directives);
    value.ast_node = Some(definition.clone());
    value
}

pub fn enum_value_from_ast(definition: &Positioned<ast::EnumValueDefinition>) -> EnumValue {
    let node = &definition.node;
    let mut value = EnumValue::new(&node.value.node);
    value.description = description(&node.description);
    value.deprecation_reason = deprecation_reason(&node.directives);
    value.directives = directives(&node.directives);
    value.ast_node = Some(definition.clone());
    value
}

pub fn directive_from_ast(definition: &Positioned<ast::DirectiveDefinition>) -> DirectiveDefinition {
    let node = &definition.node;
    let mut directive = DirectiveDefinition::new(
        &node.name.node,
        node.locations.iter().map(|location| location.node),
    );
    directive.description = description(&node.description);
    directive.arguments = input_values_from_ast(&node.arguments);
    directive.is_repeatable = node.is_repeatable;
    directive.ast_node = Some(definition.clone());
    directive
}

fn extend_type(ty: &mut NamedType, extension: &Positioned<ast::TypeDefinition>) -> Result<(), SchemaError> {
    let node = &extension.node;
    let name = ty.name().to_string();

    let mismatch = |expected: TypeCategory| SchemaError::ExtensionKindMismatch {
        name: name.clone(),
        expected,
    };

    match (&mut *ty, &node.kind) {
        (NamedType::Scalar(scalar), TypeKind::Scalar) => {
            scalar.directives.extend(directives(&node.directives));
        }
        (NamedType::Object(object), TypeKind::Object(extension)) => {
            extend_fields(&name, &mut object.fields, &extension.fields)?;
            object
                .interfaces
                .extend(extension.implements.iter().map(|name| name.node.clone()));
            object.directives.extend(directives(&node.directives));
        }
        (NamedType::Interface(interface), TypeKind::Interface(extension)) => {
            extend_fields(&name, &mut interface.fields, &extension.fields)?;
            interface
                .interfaces
                .extend(extension.implements.iter().map(|name| name.node.clone()));
            interface.directives.extend(directives(&node.directives));
        }
        (NamedType::Union(union), TypeKind::Union(extension)) => {
            union
                .members
                .extend(extension.members.iter().map(|name| name.node.clone()));
            union.directives.extend(directives(&node.directives));
        }
        (NamedType::Enum(enum_type), TypeKind::Enum(extension)) => {
            for value in &extension.values {
                let value = enum_value_from_ast(value);
                enum_type.values.insert(value.name.clone(), value);
            }
            enum_type.directives.extend(directives(&node.directives));
        }
        (NamedType::InputObject(input), TypeKind::InputObject(extension)) => {
            for field in &extension.fields {
                let field = input_value_from_ast(field);
                if input.fields.contains_key(&field.name) {
                    return Err(SchemaError::DuplicateField {
                        type_name: name.clone(),
                        field_name: field.name.to_string(),
                    });
                }
                input.fields.insert(field.name.clone(), field);
            }
            input.directives.extend(directives(&node.directives));
        }
        (existing, _) => return Err(mismatch(existing.category())),
    }

    ty.extension_ast_nodes_mut().push(extension.clone());

    Ok(())
}

fn extend_fields(
    type_name: &str,
    fields: &mut IndexMap<Name, Field>,
    definitions: &[Positioned<ast::FieldDefinition>],
) -> Result<(), SchemaError> {
    for definition in definitions {
        let field = field_from_ast(definition);
        if fields.contains_key(&field.name) {
            return Err(SchemaError::DuplicateField {
                type_name: type_name.to_string(),
                field_name: field.name.to_string(),
            });
        }
        fields.insert(field.name.clone(), field);
    }

    Ok(())
}
