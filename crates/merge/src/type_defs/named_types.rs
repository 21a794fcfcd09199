use schema::{
    ast::{self, TypeKind},
    Name, Positioned,
};

use super::{
    directives::merge_directives,
    fields::{merge_fields, sort_by_name, tidy_fields},
};
use crate::{MergeError, MergeTypeDefsConfig};

/// Merges a new definition of a type into the existing one.
pub(crate) fn merge_type_definition(
    new: &Positioned<ast::TypeDefinition>,
    mut existing: Positioned<ast::TypeDefinition>,
    config: &MergeTypeDefsConfig,
) -> Result<Positioned<ast::TypeDefinition>, MergeError> {
    let type_name = existing.node.name.node.to_string();
    let merged = &mut existing.node;

    merged.kind = match (std::mem::replace(&mut merged.kind, TypeKind::Scalar), &new.node.kind) {
        (TypeKind::Scalar, TypeKind::Scalar) => TypeKind::Scalar,
        (TypeKind::Object(object), TypeKind::Object(new)) => TypeKind::Object(ast::ObjectType {
            implements: merge_names(&new.implements, object.implements),
            fields: merge_fields(&type_name, &new.fields, object.fields, config)?,
        }),
        (TypeKind::Interface(interface), TypeKind::Interface(new)) => TypeKind::Interface(ast::InterfaceType {
            implements: merge_names(&new.implements, interface.implements),
            fields: merge_fields(&type_name, &new.fields, interface.fields, config)?,
        }),
        (TypeKind::Union(union), TypeKind::Union(new)) => TypeKind::Union(ast::UnionType {
            members: merge_names(&new.members, union.members),
        }),
        (TypeKind::Enum(enum_type), TypeKind::Enum(new)) => TypeKind::Enum(ast::EnumType {
            values: merge_enum_values(&new.values, enum_type.values, config),
        }),
        (TypeKind::InputObject(input), TypeKind::InputObject(new)) => TypeKind::InputObject(ast::InputObjectType {
            fields: merge_fields(&type_name, &new.fields, input.fields, config)?,
        }),
        (existing, new) => {
            return Err(MergeError::type_definition(
                type_name,
                format!("Cannot merge {} with {}", kind_name(&existing), kind_name(new)),
            ))
        }
    };

    if new.node.description.is_some() {
        merged.description.clone_from(&new.node.description);
    }

    let directives = std::mem::take(&mut merged.directives);
    merged.directives = merge_directives(&new.node.directives, directives, config);

    merged.extend = merged.extend && new.node.extend && !config.convert_extensions;

    Ok(existing)
}

/// First definition of a type: only exclusions, sorting and extension conversion apply.
pub(super) fn normalize(
    mut ty: Positioned<ast::TypeDefinition>,
    config: &MergeTypeDefsConfig,
) -> Positioned<ast::TypeDefinition> {
    let type_name = ty.node.name.node.to_string();
    let node = &mut ty.node;

    node.extend = node.extend && !config.convert_extensions;

    match &mut node.kind {
        TypeKind::Object(ast::ObjectType { fields, .. }) | TypeKind::Interface(ast::InterfaceType { fields, .. }) => {
            *fields = tidy_fields(&type_name, std::mem::take(fields), config);
        }
        TypeKind::InputObject(input) => {
            input.fields = tidy_fields(&type_name, std::mem::take(&mut input.fields), config);
        }
        TypeKind::Enum(enum_type) if config.sort => {
            sort_by_name(&mut enum_type.values, |value| &value.node.value.node);
        }
        TypeKind::Enum(_) | TypeKind::Union(_) | TypeKind::Scalar => (),
    }

    ty
}

fn merge_names(new: &[Positioned<Name>], mut existing: Vec<Positioned<Name>>) -> Vec<Positioned<Name>> {
    for name in new {
        if !existing.iter().any(|existing| existing.node == name.node) {
            existing.push(name.clone());
        }
    }

    existing
}

/// New values come first unless `consistent_enum_merge` keeps the existing order.
fn merge_enum_values(
    new: &[Positioned<ast::EnumValueDefinition>],
    existing: Vec<Positioned<ast::EnumValueDefinition>>,
    config: &MergeTypeDefsConfig,
) -> Vec<Positioned<ast::EnumValueDefinition>> {
    let (mut values, others) = if config.consistent_enum_merge {
        (existing, new.to_vec())
    } else {
        (new.to_vec(), existing)
    };

    for other in others {
        match values.iter_mut().find(|value| value.node.value.node == other.node.value.node) {
            Some(value) => {
                if value.node.description.is_none() {
                    value.node.description = other.node.description;
                }
                let directives = std::mem::take(&mut value.node.directives);
                value.node.directives = merge_directives(&other.node.directives, directives, config);
            }
            None => values.push(other),
        }
    }

    if config.sort {
        sort_by_name(&mut values, |value| &value.node.value.node);
    }

    values
}

fn kind_name(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::Scalar => "a scalar",
        TypeKind::Object(_) => "an object type",
        TypeKind::Interface(_) => "an interface",
        TypeKind::Union(_) => "a union",
        TypeKind::Enum(_) => "an enum",
        TypeKind::InputObject(_) => "an input object",
    }
}

#[cfg(test)]
mod tests {
    use schema::print_document;

    use crate::merge_type_defs;

    use super::*;

    fn merge(sources: &[&str], config: MergeTypeDefsConfig) -> Result<String, MergeError> {
        let config = MergeTypeDefsConfig {
            use_schema_definition: false,
            ..config
        };

        merge_type_defs(sources.iter().copied(), &config).map(|document| print_document(&document))
    }

    #[test]
    fn enum_values_are_unioned() {
        let sources = ["enum Color { RED GREEN }", "enum Color { BLUE RED }"];

        assert_eq!(
            merge(&sources, MergeTypeDefsConfig::default()).unwrap(),
            "enum Color {\n  BLUE\n  RED\n  GREEN\n}\n"
        );

        let config = MergeTypeDefsConfig {
            consistent_enum_merge: true,
            ..Default::default()
        };
        assert_eq!(
            merge(&sources, config).unwrap(),
            "enum Color {\n  RED\n  GREEN\n  BLUE\n}\n"
        );
    }

    #[test]
    fn union_members_and_interfaces_are_unioned() {
        let sdl = merge(
            &[
                "union U = A | B type T implements I { id: ID }",
                "union U = B | C type T implements J & I { id: ID }",
            ],
            MergeTypeDefsConfig::default(),
        )
        .unwrap();

        assert_eq!(
            sdl,
            "union U = A | B | C\n\ntype T implements I & J {\n  id: ID\n}\n"
        );
    }

    #[test]
    fn descriptions_of_later_definitions_win() {
        let sdl = merge(
            &["\"first\" type T { id: ID }", "type T { id: ID }", "\"third\" type T { id: ID }"],
            MergeTypeDefsConfig::default(),
        )
        .unwrap();

        assert_eq!(sdl, "\"\"\"third\"\"\"\ntype T {\n  id: ID\n}\n");
    }

    #[test]
    fn categories_must_match() {
        let error = merge(&["type T { id: ID }", "input T { id: ID }"], MergeTypeDefsConfig::default()).unwrap_err();

        assert_eq!(
            error.to_string(),
            "Unable to merge GraphQL type \"T\": Cannot merge an object type with an input object"
        );
    }
}
