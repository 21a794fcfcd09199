//! Candidate merging: every definition of a type name across subschemas folded into one type.

mod validate;

use indexmap::IndexMap;
use itertools::Itertools;
use schema::{
    ast, field_to_ast, Directive, EnumType, Extensions, Field, InputObjectType, InputValue, InterfaceType, Name,
    NamedType, ObjectType, Positioned, ScalarType, TypeCategory, UnionType,
};

use crate::{type_defs::merge_type_definition, MergeError, MergeTypeDefsConfig, TypeMergeConfig, TypeMergingOptions};

/// One definition of a type, with the subschema it comes from.
#[derive(Debug, Clone)]
pub struct MergeTypeCandidate {
    pub ty: NamedType,
    /// Name of the subschema defining the type.
    pub source: Option<String>,
    pub merge_config: Option<TypeMergeConfig>,
}

impl MergeTypeCandidate {
    pub fn new(ty: NamedType) -> Self {
        MergeTypeCandidate {
            ty,
            source: None,
            merge_config: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_merge_config(mut self, merge_config: TypeMergeConfig) -> Self {
        self.merge_config = Some(merge_config);
        self
    }

    pub fn is_canonical(&self) -> bool {
        self.merge_config.as_ref().is_some_and(|config| config.canonical)
    }

    fn is_field_canonical(&self, field_name: &str) -> bool {
        self.merge_config
            .as_ref()
            .is_some_and(|config| config.is_field_canonical(field_name))
    }
}

/// One definition of a field, input field or enum value, within its type candidate.
#[derive(Debug)]
pub struct MergeFieldCandidate<'a, T> {
    pub config: &'a T,
    pub field_name: &'a str,
    pub type_name: &'a str,
    pub candidate: &'a MergeTypeCandidate,
}

impl<T> MergeFieldCandidate<'_, T> {
    /// Canonical through a field-level or a type-level claim.
    pub fn is_canonical(&self) -> bool {
        self.candidate.is_field_canonical(self.field_name) || self.candidate.is_canonical()
    }
}

/// Merges all definitions of `type_name` into a single type. Candidates must share one type
/// category.
pub fn merge_candidates(
    type_name: &str,
    mut candidates: Vec<MergeTypeCandidate>,
    options: &TypeMergingOptions,
) -> Result<NamedType, MergeError> {
    let Some(first) = candidates.first() else {
        return Err(MergeError::NoCandidates(type_name.to_string()));
    };

    let category = first.ty.category();
    if let Some(other) = candidates.iter().find(|candidate| candidate.ty.category() != category) {
        return Err(MergeError::CategoryMismatch {
            type_name: type_name.to_string(),
            first: category,
            second: other.ty.category(),
        });
    }

    tracing::trace!(type_name, candidates = candidates.len(), "merging type candidates");

    let chosen = match &options.type_candidate_merger {
        Some(merger) => merger(&candidates)?,
        None => default_type_candidate(type_name, &candidates)?,
    };
    if chosen >= candidates.len() {
        return Err(MergeError::Config(format!(
            "type candidate merger picked candidate {chosen} of {} for \"{type_name}\"",
            candidates.len()
        )));
    }
    let chosen = candidates.remove(chosen);
    candidates.push(chosen);

    let candidates = &candidates[..];
    let description = match &options.type_descriptions_merger {
        Some(merger) => merger(candidates),
        None => candidates
            .last()
            .and_then(|candidate| candidate.ty.description().map(str::to_string)),
    };

    let merged = Merged {
        name: Name::new(type_name),
        description,
        directives: merge_directives(candidates),
        extension_ast_nodes: candidates
            .iter()
            .flat_map(|candidate| candidate.ty.extension_ast_nodes().iter().cloned())
            .collect(),
        extensions: merge_extensions(candidates),
    };

    let mut ty = match category {
        TypeCategory::Scalar => merge_scalar(merged, candidates),
        TypeCategory::Object => merge_object(merged, type_name, candidates, options)?,
        TypeCategory::Interface => merge_interface(merged, type_name, candidates, options)?,
        TypeCategory::Union => merge_union(merged, candidates),
        TypeCategory::Enum => merge_enum(merged, type_name, candidates, options)?,
        TypeCategory::InputObject => merge_input_object(merged, type_name, candidates, options)?,
    };

    ty.set_ast_node(merge_ast_nodes(&ty, candidates)?);

    Ok(ty)
}

/// A single canonical candidate owns the type, otherwise the last one.
fn default_type_candidate(type_name: &str, candidates: &[MergeTypeCandidate]) -> Result<usize, MergeError> {
    let mut canonical = candidates.iter().positions(MergeTypeCandidate::is_canonical);

    match (canonical.next(), canonical.next()) {
        (Some(_), Some(_)) => Err(MergeError::MultipleCanonical(type_name.to_string())),
        (Some(position), None) => Ok(position),
        (None, _) => Ok(candidates.len().saturating_sub(1)),
    }
}

/// What every category shares.
struct Merged {
    name: Name,
    description: Option<String>,
    directives: Vec<Directive>,
    extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    extensions: Extensions,
}

fn merge_scalar(merged: Merged, candidates: &[MergeTypeCandidate]) -> NamedType {
    let mut scalar = match candidates.last().map(|candidate| &candidate.ty) {
        Some(NamedType::Scalar(scalar)) => scalar.clone(),
        _ => ScalarType::new(merged.name.as_str()),
    };

    scalar.name = merged.name;
    scalar.description = merged.description;
    scalar.directives = merged.directives;
    scalar.extension_ast_nodes = merged.extension_ast_nodes;
    scalar.extensions = merged.extensions;

    NamedType::Scalar(scalar)
}

fn merge_object(
    merged: Merged,
    type_name: &str,
    candidates: &[MergeTypeCandidate],
    options: &TypeMergingOptions,
) -> Result<NamedType, MergeError> {
    Ok(NamedType::Object(ObjectType {
        name: merged.name,
        description: merged.description,
        fields: merge_fields(type_name, candidates, options)?,
        interfaces: merge_interfaces(candidates),
        is_type_of: candidates
            .iter()
            .rev()
            .find_map(|candidate| candidate.ty.as_object().and_then(|object| object.is_type_of.clone())),
        directives: merged.directives,
        ast_node: None,
        extension_ast_nodes: merged.extension_ast_nodes,
        extensions: merged.extensions,
    }))
}

fn merge_interface(
    merged: Merged,
    type_name: &str,
    candidates: &[MergeTypeCandidate],
    options: &TypeMergingOptions,
) -> Result<NamedType, MergeError> {
    Ok(NamedType::Interface(InterfaceType {
        name: merged.name,
        description: merged.description,
        fields: merge_fields(type_name, candidates, options)?,
        interfaces: merge_interfaces(candidates),
        resolve_type: candidates.iter().rev().find_map(|candidate| {
            candidate
                .ty
                .as_interface()
                .and_then(|interface| interface.resolve_type.clone())
        }),
        directives: merged.directives,
        ast_node: None,
        extension_ast_nodes: merged.extension_ast_nodes,
        extensions: merged.extensions,
    }))
}

fn merge_union(merged: Merged, candidates: &[MergeTypeCandidate]) -> NamedType {
    NamedType::Union(UnionType {
        name: merged.name,
        description: merged.description,
        members: candidates
            .iter()
            .filter_map(|candidate| candidate.ty.as_union())
            .flat_map(|union| union.members.iter())
            .unique()
            .cloned()
            .collect(),
        resolve_type: candidates
            .iter()
            .rev()
            .find_map(|candidate| candidate.ty.as_union().and_then(|union| union.resolve_type.clone())),
        directives: merged.directives,
        ast_node: None,
        extension_ast_nodes: merged.extension_ast_nodes,
        extensions: merged.extensions,
    })
}

fn merge_enum(
    merged: Merged,
    type_name: &str,
    candidates: &[MergeTypeCandidate],
    options: &TypeMergingOptions,
) -> Result<NamedType, MergeError> {
    validate::validate_enum_consistency(type_name, candidates, options);

    let groups = group_by_name(type_name, candidates, |ty| ty.as_enum().map(|enum_type| &enum_type.values));
    let mut values = IndexMap::with_capacity(groups.len());

    for (value_name, group) in groups {
        let value = match &options.enum_value_config_merger {
            Some(merger) => merger(&group)?,
            None => pick_candidate(&group, false)?.config.clone(),
        };
        values.insert(Name::new(value_name), value);
    }

    Ok(NamedType::Enum(EnumType {
        name: merged.name,
        description: merged.description,
        values,
        directives: merged.directives,
        ast_node: None,
        extension_ast_nodes: merged.extension_ast_nodes,
        extensions: merged.extensions,
    }))
}

fn merge_input_object(
    merged: Merged,
    type_name: &str,
    candidates: &[MergeTypeCandidate],
    options: &TypeMergingOptions,
) -> Result<NamedType, MergeError> {
    let groups = group_by_name(type_name, candidates, |ty| {
        ty.as_input_object().map(|input| &input.fields)
    });
    let mut fields = IndexMap::with_capacity(groups.len());

    for (field_name, group) in groups {
        let field: InputValue = match &options.input_field_config_merger {
            Some(merger) => merger(&group)?,
            None => pick_candidate(&group, true)?.config.clone(),
        };

        validate::validate_input_field_consistency(&field, &group, options)?;
        validate::validate_input_field_inclusion(type_name, field_name, group.len(), candidates.len(), options)?;

        fields.insert(Name::new(field_name), field);
    }

    Ok(NamedType::InputObject(InputObjectType {
        name: merged.name,
        description: merged.description,
        fields,
        directives: merged.directives,
        ast_node: None,
        extension_ast_nodes: merged.extension_ast_nodes,
        extensions: merged.extensions,
    }))
}

fn merge_fields(
    type_name: &str,
    candidates: &[MergeTypeCandidate],
    options: &TypeMergingOptions,
) -> Result<IndexMap<Name, Field>, MergeError> {
    let groups = group_by_name(type_name, candidates, NamedType::fields);
    let mut fields = IndexMap::with_capacity(groups.len());

    for (field_name, group) in groups {
        let field: Field = match &options.field_config_merger {
            Some(merger) => merger(&group)?,
            None => pick_candidate(&group, true)?.config.clone(),
        };

        validate::validate_field_consistency(&field, &group, options)?;

        fields.insert(Name::new(field_name), field);
    }

    Ok(fields)
}

/// Definitions grouped by field or value name, in order of first appearance.
fn group_by_name<'a, T: 'a>(
    type_name: &'a str,
    candidates: &'a [MergeTypeCandidate],
    entries: impl Fn(&'a NamedType) -> Option<&'a IndexMap<Name, T>>,
) -> IndexMap<&'a str, Vec<MergeFieldCandidate<'a, T>>> {
    let mut groups: IndexMap<&str, Vec<_>> = IndexMap::new();

    for candidate in candidates {
        for (name, config) in entries(&candidate.ty).into_iter().flatten() {
            groups.entry(name.as_str()).or_default().push(MergeFieldCandidate {
                config,
                field_name: name.as_str(),
                type_name,
                candidate,
            });
        }
    }

    groups
}

/// A field-level canonical claim wins, then the first type-level canonical candidate, then the
/// last candidate.
fn pick_candidate<'b, 'a, T>(
    group: &'b [MergeFieldCandidate<'a, T>],
    field_level: bool,
) -> Result<&'b MergeFieldCandidate<'a, T>, MergeError> {
    let Some(last) = group.last() else {
        return Err(MergeError::NoCandidates(String::new()));
    };

    if field_level {
        let mut claims = group
            .iter()
            .filter(|field| field.candidate.is_field_canonical(field.field_name));

        if let Some(claim) = claims.next() {
            if claims.next().is_some() {
                return Err(MergeError::MultipleCanonical(format!(
                    "{}.{}",
                    last.type_name, last.field_name
                )));
            }
            return Ok(claim);
        }
    }

    Ok(group
        .iter()
        .find(|field| field.candidate.is_canonical())
        .unwrap_or(last))
}

fn merge_interfaces(candidates: &[MergeTypeCandidate]) -> Vec<Name> {
    candidates
        .iter()
        .flat_map(|candidate| match &candidate.ty {
            NamedType::Object(object) => object.interfaces.as_slice(),
            NamedType::Interface(interface) => interface.interfaces.as_slice(),
            _ => &[],
        })
        .unique()
        .cloned()
        .collect()
}

/// Applied directives by name, later candidates overriding earlier ones in place.
fn merge_directives(candidates: &[MergeTypeCandidate]) -> Vec<Directive> {
    let mut directives: IndexMap<Name, Directive> = IndexMap::new();

    for directive in candidates.iter().flat_map(|candidate| candidate.ty.directives()) {
        directives.insert(directive.name.clone(), directive.clone());
    }

    directives.into_values().collect()
}

fn merge_extensions(candidates: &[MergeTypeCandidate]) -> Extensions {
    let mut extensions = Extensions::new();

    for candidate in candidates {
        for (key, value) in candidate.ty.extensions() {
            extensions.insert(key.clone(), value.clone());
        }
    }

    extensions
}

/// Folds the candidates' AST nodes into one, then puts the AST of canonical fields in place of
/// whatever the fold kept.
fn merge_ast_nodes(
    merged: &NamedType,
    candidates: &[MergeTypeCandidate],
) -> Result<Option<Positioned<ast::TypeDefinition>>, MergeError> {
    let config = MergeTypeDefsConfig {
        ignore_field_conflicts: true,
        ..Default::default()
    };

    let mut nodes = candidates.iter().filter_map(|candidate| candidate.ty.ast_node());
    let Some(first) = nodes.next() else {
        return Ok(None);
    };

    let mut node = nodes.try_fold(first.clone(), |merged, node| merge_type_definition(node, merged, &config))?;

    let canonical_fields = merged.fields().into_iter().flatten().filter(|(name, _)| {
        candidates.iter().any(|candidate| {
            let defines_field = candidate.ty.fields().is_some_and(|fields| fields.contains_key(*name));
            candidate.is_field_canonical(name) || (candidate.is_canonical() && defines_field)
        })
    });

    let ast_fields = match &mut node.node.kind {
        ast::TypeKind::Object(object) => Some(&mut object.fields),
        ast::TypeKind::Interface(interface) => Some(&mut interface.fields),
        _ => None,
    };

    if let Some(ast_fields) = ast_fields {
        for (name, field) in canonical_fields {
            let canonical = field.ast_node.clone().unwrap_or_else(|| field_to_ast(field));
            if let Some(ast_field) = ast_fields.iter_mut().find(|ast_field| &ast_field.node.name.node == name) {
                *ast_field = canonical;
            }
        }
    }

    node.node.name.node = merged.name().clone();

    Ok(Some(node))
}
