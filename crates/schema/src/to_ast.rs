use async_graphql_parser::{
    types::{self as ast, TypeKind, TypeSystemDefinition},
    Positioned,
};
use async_graphql_value::{ConstValue, Name};

use crate::{
    is_builtin_directive, is_builtin_scalar, print_document, schema::DEFAULT_DEPRECATION_REASON, types::positioned,
    Directive, DirectiveDefinition, EnumValue, Field, InputValue, NamedType, SchemaInner,
};

impl SchemaInner {
    /// Converts the schema back into a type system document. Built-in scalars and directives
    /// are left out, and a schema definition is only emitted when root types use custom names.
    pub fn to_document(&self) -> ast::ServiceDocument {
        let mut definitions = Vec::with_capacity(self.types.len() + 1);

        if self.needs_schema_definition() {
            definitions.push(TypeSystemDefinition::Schema(positioned(ast::SchemaDefinition {
                extend: false,
                directives: self.schema_directives.iter().map(Directive::to_ast).collect(),
                query: self.query_type.clone().map(positioned),
                mutation: self.mutation_type.clone().map(positioned),
                subscription: self.subscription_type.clone().map(positioned),
            })));
        }

        definitions.extend(
            self.directives
                .values()
                .filter(|directive| !is_builtin_directive(&directive.name))
                .map(|directive| TypeSystemDefinition::Directive(directive_to_ast(directive))),
        );

        definitions.extend(
            self.types
                .values()
                .filter(|ty| !(is_builtin_scalar(ty.name()) && matches!(ty, NamedType::Scalar(_))))
                .map(|ty| TypeSystemDefinition::Type(type_to_ast(ty))),
        );

        ast::ServiceDocument { definitions }
    }

    /// The schema printed as SDL.
    pub fn sdl(&self) -> String {
        print_document(&self.to_document())
    }

    fn needs_schema_definition(&self) -> bool {
        let roots = [
            (&self.query_type, "Query"),
            (&self.mutation_type, "Mutation"),
            (&self.subscription_type, "Subscription"),
        ];

        !self.schema_directives.is_empty()
            || roots
                .iter()
                .any(|(root, default)| root.as_ref().is_some_and(|name| name != default))
    }
}

pub fn type_to_ast(ty: &NamedType) -> Positioned<ast::TypeDefinition> {
    let kind = match ty {
        NamedType::Scalar(_) => TypeKind::Scalar,
        NamedType::Object(object) => TypeKind::Object(ast::ObjectType {
            implements: object.interfaces.iter().cloned().map(positioned).collect(),
            fields: object.fields.values().map(field_to_ast).collect(),
        }),
        NamedType::Interface(interface) => TypeKind::Interface(ast::InterfaceType {
            implements: interface.interfaces.iter().cloned().map(positioned).collect(),
            fields: interface.fields.values().map(field_to_ast).collect(),
        }),
        NamedType::Union(union) => TypeKind::Union(ast::UnionType {
            members: union.members.iter().cloned().map(positioned).collect(),
        }),
        NamedType::Enum(enum_type) => TypeKind::Enum(ast::EnumType {
            values: enum_type.values.values().map(enum_value_to_ast).collect(),
        }),
        NamedType::InputObject(input) => TypeKind::InputObject(ast::InputObjectType {
            fields: input.fields.values().map(input_value_to_ast).collect(),
        }),
    };

    let mut directives: Vec<_> = ty.directives().iter().map(Directive::to_ast).collect();

    if let NamedType::Scalar(scalar) = ty {
        let has_specified_by = scalar.directives.iter().any(|directive| directive.name == "specifiedBy");
        if let (Some(url), false) = (&scalar.specified_by_url, has_specified_by) {
            directives.push(Directive::new("specifiedBy").with_argument("url", url.as_str()).to_ast());
        }
    }

    positioned(ast::TypeDefinition {
        extend: false,
        description: ty.description().map(|description| positioned(description.to_string())),
        name: positioned(ty.name().clone()),
        directives,
        kind,
    })
}

pub fn field_to_ast(field: &Field) -> Positioned<ast::FieldDefinition> {
    positioned(ast::FieldDefinition {
        description: field.description.clone().map(positioned),
        name: positioned(field.name.clone()),
        arguments: field.arguments.values().map(input_value_to_ast).collect(),
        ty: positioned(field.ty.to_ast()),
        directives: with_deprecation(&field.directives, field.deprecation_reason.as_deref()),
    })
}

pub fn input_value_to_ast(value: &InputValue) -> Positioned<ast::InputValueDefinition> {
    positioned(ast::InputValueDefinition {
        description: value.description.clone().map(positioned),
        name: positioned(value.name.clone()),
        ty: positioned(value.ty.to_ast()),
        default_value: value.default_value.clone().map(positioned),
        directives: with_deprecation(&value.directives, value.deprecation_reason.as_deref()),
    })
}

pub fn enum_value_to_ast(value: &EnumValue) -> Positioned<ast::EnumValueDefinition> {
    positioned(ast::EnumValueDefinition {
        description: value.description.clone().map(positioned),
        value: positioned(value.name.clone()),
        directives: with_deprecation(&value.directives, value.deprecation_reason.as_deref()),
    })
}

pub fn directive_to_ast(directive: &DirectiveDefinition) -> Positioned<ast::DirectiveDefinition> {
    positioned(ast::DirectiveDefinition {
        description: directive.description.clone().map(positioned),
        name: positioned(directive.name.clone()),
        arguments: directive.arguments.values().map(input_value_to_ast).collect(),
        is_repeatable: directive.is_repeatable,
        locations: directive.locations.iter().copied().map(positioned).collect(),
    })
}

/// Applied directives, adding `@deprecated` when the deprecation only lives in the model.
fn with_deprecation(directives: &[Directive], deprecation_reason: Option<&str>) -> Vec<Positioned<ast::ConstDirective>> {
    let mut nodes: Vec<_> = directives.iter().map(Directive::to_ast).collect();

    let Some(reason) = deprecation_reason else {
        return nodes;
    };

    if directives.iter().any(|directive| directive.name == "deprecated") {
        return nodes;
    }

    let mut deprecated = Directive::new("deprecated");
    if reason != DEFAULT_DEPRECATION_REASON {
        deprecated
            .arguments
            .insert(Name::new("reason"), ConstValue::String(reason.to_string()));
    }
    nodes.push(deprecated.to_ast());

    nodes
}

#[cfg(test)]
mod tests {
    use crate::{build_schema, Field, ObjectType, Schema, TypeRef};

    #[test]
    fn default_root_names_skip_the_schema_definition() {
        let schema = build_schema("type Query { hello: String }").unwrap();
        assert_eq!(schema.sdl(), "type Query {\n  hello: String\n}\n");
    }

    #[test]
    fn custom_root_names_print_a_schema_definition() {
        let schema = Schema::builder()
            .query_type("Root")
            .register_type(crate::NamedType::Object(
                ObjectType::new("Root").field(Field::new("hello", TypeRef::non_null("String"))),
            ))
            .finish()
            .unwrap();

        insta::assert_snapshot!(schema.sdl(), @r###"
        schema {
          query: Root
        }

        type Root {
          hello: String!
        }
        "###);
    }

    #[test]
    fn deprecations_without_directive_are_printed() {
        let mut field = Field::new("old", TypeRef::named("Int"));
        field.deprecation_reason = Some("use new".into());

        let schema = Schema::builder()
            .query_type("Query")
            .register_type(crate::NamedType::Object(ObjectType::new("Query").field(field)))
            .finish()
            .unwrap();

        assert_eq!(
            schema.sdl(),
            "type Query {\n  old: Int @deprecated(reason: \"use new\")\n}\n"
        );
    }
}
