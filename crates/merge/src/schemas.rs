//! Schema level entry points: resolver maps, executable schemas and subschema merging.

use indexmap::IndexMap;
use schema::{
    add_resolvers_to_schema, ast::OperationType, build_ast_schema, is_builtin_directive, is_builtin_scalar,
    AddResolversOptions, DirectiveDefinition, Name, ResolverMap, Schema, TypeDefinitions,
};

use crate::{
    merge_candidates, merge_type_defs, MergeError, MergeTypeCandidate, MergeTypeDefsConfig, SubschemaMergeConfig,
    TypeMergingOptions, TypeSource,
};

const ROOT_TYPES: [(OperationType, &str); 3] = [
    (OperationType::Query, "Query"),
    (OperationType::Mutation, "Mutation"),
    (OperationType::Subscription, "Subscription"),
];

/// Deep merge of resolver maps, later maps winning.
pub fn merge_resolvers(maps: impl IntoIterator<Item = ResolverMap>) -> ResolverMap {
    maps.into_iter().fold(ResolverMap::new(), |mut merged, map| {
        merged.merge(map);
        merged
    })
}

/// Merges the type definitions, builds a schema from them and attaches the merged resolvers.
pub fn make_executable_schema<S>(
    type_defs: impl IntoIterator<Item = S>,
    resolvers: impl IntoIterator<Item = ResolverMap>,
) -> Result<Schema, MergeError>
where
    S: Into<TypeSource>,
{
    let document = merge_type_defs(type_defs, &MergeTypeDefsConfig::default())?;
    let schema = build_ast_schema(&document)?;

    let resolvers = merge_resolvers(resolvers);
    if resolvers.is_empty() {
        return Ok(schema);
    }

    Ok(add_resolvers_to_schema(&schema, &resolvers, AddResolversOptions::default())?)
}

/// A schema taking part in a merge, with its merge configuration.
#[derive(Debug, Clone)]
pub struct Subschema {
    pub name: Option<String>,
    pub schema: Schema,
    pub merge: SubschemaMergeConfig,
}

impl Subschema {
    pub fn new(schema: Schema) -> Self {
        Subschema {
            name: None,
            schema,
            merge: SubschemaMergeConfig::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_merge_config(mut self, merge: SubschemaMergeConfig) -> Self {
        self.merge = merge;
        self
    }

    /// Name of `type_name` in the merged schema: root types are grouped under the default root
    /// names.
    fn merged_type_name<'a>(&self, type_name: &'a str) -> &'a str {
        ROOT_TYPES
            .iter()
            .find(|(operation, _)| {
                self.schema
                    .root_type_name(*operation)
                    .is_some_and(|root| root.as_str() == type_name)
            })
            .map_or(type_name, |(_, default_name)| *default_name)
    }
}

/// Merges subschemas and additional type definitions into one schema, type by type through
/// [`merge_candidates`], then attaches `resolvers`.
pub fn merge_schemas<S>(
    subschemas: &[Subschema],
    type_defs: impl IntoIterator<Item = S>,
    resolvers: impl IntoIterator<Item = ResolverMap>,
    options: &TypeMergingOptions,
) -> Result<Schema, MergeError>
where
    S: Into<TypeSource>,
{
    let mut candidates: IndexMap<Name, Vec<MergeTypeCandidate>> = IndexMap::new();
    let mut directives: IndexMap<Name, DirectiveDefinition> = IndexMap::new();

    tracing::debug!(subschemas = subschemas.len(), "merging schemas");

    for subschema in subschemas {
        for (type_name, ty) in &subschema.schema.types {
            if is_builtin_scalar(type_name) {
                continue;
            }

            let merged_name = Name::new(subschema.merged_type_name(type_name));

            let mut ty = ty.clone();
            ty.set_name(merged_name.clone());

            let mut candidate = MergeTypeCandidate::new(ty);
            if let Some(name) = &subschema.name {
                candidate = candidate.with_source(name.clone());
            }
            if let Some(config) = subschema.merge.get(type_name) {
                candidate = candidate.with_merge_config(config.clone());
            }

            candidates.entry(merged_name).or_default().push(candidate);
        }

        for (name, directive) in &subschema.schema.directives {
            if !is_builtin_directive(name) {
                directives.insert(name.clone(), directive.clone());
            }
        }
    }

    let config = MergeTypeDefsConfig {
        use_schema_definition: false,
        convert_extensions: true,
        ..Default::default()
    };
    let document = merge_type_defs(type_defs, &config)?;
    let definitions = TypeDefinitions::from_document(&document)?;

    for (type_name, ty) in definitions.types {
        candidates
            .entry(type_name)
            .or_default()
            .push(MergeTypeCandidate::new(ty));
    }
    directives.extend(definitions.directives);

    let mut builder = Schema::builder();

    for (operation, default_name) in ROOT_TYPES {
        if !candidates.contains_key(default_name) {
            continue;
        }
        builder = match operation {
            OperationType::Query => builder.query_type(default_name),
            OperationType::Mutation => builder.mutation_type(default_name),
            OperationType::Subscription => builder.subscription_type(default_name),
        };
    }

    for (type_name, candidates) in candidates {
        builder = builder.register_type(merge_candidates(&type_name, candidates, options)?);
    }

    for directive in directives.into_values() {
        builder = builder.register_directive(directive);
    }

    let schema = builder.finish()?;

    let resolvers = merge_resolvers(resolvers);
    if resolvers.is_empty() {
        return Ok(schema);
    }

    Ok(add_resolvers_to_schema(&schema, &resolvers, AddResolversOptions::default())?)
}
