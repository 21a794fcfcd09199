//! SDL level merging: definitions sharing a name are folded into one, later sources merged
//! into earlier ones.

mod directives;
mod fields;
mod named_types;

use indexmap::IndexMap;
use schema::{
    ast::{self, TypeSystemDefinition},
    parse_schema, Name, Positioned, Schema,
};

use crate::{MergeError, MergeTypeDefsConfig};

pub(crate) use named_types::merge_type_definition;

const ROOT_TYPES: [(ast::OperationType, &str); 3] = [
    (ast::OperationType::Query, "Query"),
    (ast::OperationType::Mutation, "Mutation"),
    (ast::OperationType::Subscription, "Subscription"),
];

/// Anything type definitions can be read from.
#[derive(Debug, Clone)]
pub enum TypeSource {
    Sdl(String),
    Document(ast::ServiceDocument),
    Schema(Schema),
}

impl TypeSource {
    fn into_document(self) -> Result<ast::ServiceDocument, MergeError> {
        match self {
            TypeSource::Sdl(sdl) => parse_schema(&sdl).map_err(|error| MergeError::Parse(error.to_string())),
            TypeSource::Document(document) => Ok(document),
            TypeSource::Schema(schema) => Ok(schema.to_document()),
        }
    }
}

impl From<&str> for TypeSource {
    fn from(sdl: &str) -> Self {
        TypeSource::Sdl(sdl.to_string())
    }
}

impl From<String> for TypeSource {
    fn from(sdl: String) -> Self {
        TypeSource::Sdl(sdl)
    }
}

impl From<ast::ServiceDocument> for TypeSource {
    fn from(document: ast::ServiceDocument) -> Self {
        TypeSource::Document(document)
    }
}

impl From<Schema> for TypeSource {
    fn from(schema: Schema) -> Self {
        TypeSource::Schema(schema)
    }
}

impl From<&Schema> for TypeSource {
    fn from(schema: &Schema) -> Self {
        TypeSource::Schema(schema.clone())
    }
}

/// Merges every type definition, directive definition and schema definition of `sources`
/// into a single document.
pub fn merge_type_defs<S>(
    sources: impl IntoIterator<Item = S>,
    config: &MergeTypeDefsConfig,
) -> Result<ast::ServiceDocument, MergeError>
where
    S: Into<TypeSource>,
{
    let mut merged = MergedDefinitions::default();

    let documents = sources
        .into_iter()
        .map(|source| source.into().into_document())
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(sources = documents.len(), "merging type definitions");

    // Directive definitions first, so type merging sees all of them.
    for document in &documents {
        for definition in &document.definitions {
            if let TypeSystemDefinition::Directive(directive) = definition {
                merged.add_directive(directive)?;
            }
        }
    }

    for document in &documents {
        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Type(ty) => merged.add_type(ty, config)?,
                TypeSystemDefinition::Schema(schema) => merged.add_schema(schema, config),
                TypeSystemDefinition::Directive(_) => (),
            }
        }
    }

    Ok(merged.into_document(config))
}

#[derive(Default)]
struct MergedDefinitions {
    types: IndexMap<Name, Positioned<ast::TypeDefinition>>,
    directives: IndexMap<Name, Positioned<ast::DirectiveDefinition>>,
    schema: Option<Positioned<ast::SchemaDefinition>>,
}

impl MergedDefinitions {
    fn add_type(&mut self, ty: &Positioned<ast::TypeDefinition>, config: &MergeTypeDefsConfig) -> Result<(), MergeError> {
        let name = &ty.node.name.node;

        if config.excludes_type(name) {
            self.types.shift_remove(name);
            return Ok(());
        }

        tracing::trace!(type_name = name.as_str(), "merging type definition");

        match self.types.get_mut(name) {
            Some(existing) => *existing = merge_type_definition(ty, existing.clone(), config)?,
            None => {
                self.types.insert(name.clone(), named_types::normalize(ty.clone(), config));
            }
        }

        Ok(())
    }

    fn add_directive(&mut self, directive: &Positioned<ast::DirectiveDefinition>) -> Result<(), MergeError> {
        let name = directive.node.name.node.clone();

        let merged = match self.directives.get(&name) {
            Some(existing) => directives::merge_directive_definition(directive, existing)?,
            None => directive.clone(),
        };

        self.directives.insert(name, merged);

        Ok(())
    }

    /// Root operation types of the newer definition win.
    fn add_schema(&mut self, schema: &Positioned<ast::SchemaDefinition>, config: &MergeTypeDefsConfig) {
        let merged = match self.schema.take() {
            Some(mut existing) => {
                let node = &schema.node;
                let merged = &mut existing.node;

                merged.extend = merged.extend && node.extend && !config.convert_extensions;
                merged.directives = directives::merge_directives(&node.directives, std::mem::take(&mut merged.directives), config);

                if node.query.is_some() {
                    merged.query.clone_from(&node.query);
                }
                if node.mutation.is_some() {
                    merged.mutation.clone_from(&node.mutation);
                }
                if node.subscription.is_some() {
                    merged.subscription.clone_from(&node.subscription);
                }

                existing
            }
            None => {
                let mut schema = schema.clone();
                schema.node.extend = schema.node.extend && !config.convert_extensions;
                schema
            }
        };

        self.schema = Some(merged);
    }

    fn into_document(self, config: &MergeTypeDefsConfig) -> ast::ServiceDocument {
        let MergedDefinitions {
            mut types,
            mut directives,
            mut schema,
        } = self;

        if config.use_schema_definition {
            let definition = schema.get_or_insert_with(|| {
                Positioned::new(
                    ast::SchemaDefinition {
                        extend: false,
                        directives: Vec::new(),
                        query: None,
                        mutation: None,
                        subscription: None,
                    },
                    Default::default(),
                )
            });

            for (operation, default_name) in ROOT_TYPES {
                let root = match operation {
                    ast::OperationType::Query => &mut definition.node.query,
                    ast::OperationType::Mutation => &mut definition.node.mutation,
                    ast::OperationType::Subscription => &mut definition.node.subscription,
                };

                if root.is_none() && types.contains_key(default_name) {
                    *root = Some(Positioned::new(Name::new(default_name), Default::default()));
                }
            }
        }

        if schema.as_ref().is_some_and(|schema| !has_root_types(&schema.node)) {
            schema = None;
        }

        if config.force_schema_definition && schema.is_none() {
            schema = Some(Positioned::new(
                ast::SchemaDefinition {
                    extend: false,
                    directives: Vec::new(),
                    query: Some(Positioned::new(Name::new("Query"), Default::default())),
                    mutation: None,
                    subscription: None,
                },
                Default::default(),
            ));
        }

        if config.sort {
            types.sort_by(|a, _, b, _| a.as_str().cmp(b.as_str()));
            directives.sort_by(|a, _, b, _| a.as_str().cmp(b.as_str()));
        }

        let mut definitions: Vec<_> = directives
            .into_values()
            .map(TypeSystemDefinition::Directive)
            .chain(types.into_values().map(TypeSystemDefinition::Type))
            .collect();

        definitions.extend(schema.map(TypeSystemDefinition::Schema));

        ast::ServiceDocument { definitions }
    }
}

fn has_root_types(schema: &ast::SchemaDefinition) -> bool {
    schema.query.is_some() || schema.mutation.is_some() || schema.subscription.is_some()
}

#[cfg(test)]
mod tests {
    use schema::print_document;

    use super::*;

    fn merge(sources: &[&str], config: &MergeTypeDefsConfig) -> String {
        print_document(&merge_type_defs(sources.iter().copied(), config).unwrap())
    }

    #[test]
    fn disjoint_sources_are_concatenated() {
        let sdl = merge(
            &["type Query { a: A }", "type A { id: ID! }"],
            &MergeTypeDefsConfig::default(),
        );

        insta::assert_snapshot!(sdl, @r###"
        type Query {
          a: A
        }

        type A {
          id: ID!
        }

        schema {
          query: Query
        }
        "###);
    }

    #[test]
    fn schema_definition_is_optional() {
        let config = MergeTypeDefsConfig {
            use_schema_definition: false,
            ..Default::default()
        };

        assert_eq!(merge(&["type Query { a: Int }"], &config), "type Query {\n  a: Int\n}\n");

        let config = MergeTypeDefsConfig {
            use_schema_definition: false,
            force_schema_definition: true,
            ..Default::default()
        };

        assert!(merge(&["type A { a: Int }"], &config).ends_with("schema {\n  query: Query\n}\n"));
    }

    #[test]
    fn explicit_schema_definitions_merge_root_types() {
        let sdl = merge(
            &[
                "schema { query: Root } type Root { a: Int }",
                "schema { mutation: Change } type Change { b: Int }",
            ],
            &MergeTypeDefsConfig::default(),
        );

        assert!(sdl.ends_with("schema {\n  query: Root\n  mutation: Change\n}\n"));
    }

    #[test]
    fn exclusions_and_sorting() {
        let config = MergeTypeDefsConfig {
            sort: true,
            exclusions: vec!["Hidden".into(), "Query.secret".into()],
            use_schema_definition: false,
            ..Default::default()
        };

        let sdl = merge(
            &["type Query { b: Int secret: Int a: Int } type Hidden { x: Int }", "type B { x: Int }"],
            &config,
        );

        insta::assert_snapshot!(sdl, @r###"
        type B {
          x: Int
        }

        type Query {
          a: Int
          b: Int
        }
        "###);
    }

    #[test]
    fn extensions_are_converted_on_request() {
        let config = MergeTypeDefsConfig {
            convert_extensions: true,
            use_schema_definition: false,
            ..Default::default()
        };

        assert_eq!(merge(&["extend type User { a: Int }"], &config), "type User {\n  a: Int\n}\n");

        let config = MergeTypeDefsConfig {
            use_schema_definition: false,
            ..Default::default()
        };

        assert_eq!(
            merge(&["extend type User { a: Int }"], &config),
            "extend type User {\n  a: Int\n}\n"
        );
        assert_eq!(
            merge(&["extend type User { a: Int }", "type User { b: Int }"], &config),
            "type User {\n  a: Int\n  b: Int\n}\n"
        );
    }

    #[test]
    fn invalid_sdl_is_a_parse_error() {
        let error = merge_type_defs(["type {"], &MergeTypeDefsConfig::default()).unwrap_err();
        assert!(matches!(error, MergeError::Parse(_)));
    }
}
