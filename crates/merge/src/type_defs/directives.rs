use schema::{
    ast::{self, TypeSystemDefinition},
    print_document, ConstValue, Name, Positioned,
};

use crate::{MergeError, MergeTypeDefsConfig};

type DirectiveArgument = (Positioned<Name>, Positioned<ConstValue>);

/// Applied directives: one entry per directive name, arguments of repeated applications merged.
pub(crate) fn merge_directives(
    new: &[Positioned<ast::ConstDirective>],
    existing: Vec<Positioned<ast::ConstDirective>>,
    config: &MergeTypeDefsConfig,
) -> Vec<Positioned<ast::ConstDirective>> {
    let (base, additions) = if config.reverse_directives {
        (new.to_vec(), existing)
    } else {
        (existing, new.to_vec())
    };

    let mut result: Vec<Positioned<ast::ConstDirective>> = Vec::with_capacity(base.len() + additions.len());

    for directive in base.into_iter().chain(additions) {
        let name = &directive.node.name.node;

        match result.iter_mut().find(|merged| &merged.node.name.node == name) {
            Some(merged) => {
                let arguments = std::mem::take(&mut merged.node.arguments);
                merged.node.arguments = merge_directive_arguments(directive.node.arguments, arguments, config);
            }
            None => result.push(directive),
        }
    }

    result
}

fn merge_directive_arguments(
    new: Vec<DirectiveArgument>,
    mut existing: Vec<DirectiveArgument>,
    config: &MergeTypeDefsConfig,
) -> Vec<DirectiveArgument> {
    for (name, value) in new {
        match existing.iter_mut().find(|(existing, _)| existing.node == name.node) {
            Some(_) if config.reverse_arguments => (),
            Some(existing) => existing.1 = value,
            None => existing.push((name, value)),
        }
    }

    existing
}

/// Definitions of the same directive must declare the same arguments. Locations are unioned.
pub(crate) fn merge_directive_definition(
    new: &Positioned<ast::DirectiveDefinition>,
    existing: &Positioned<ast::DirectiveDefinition>,
) -> Result<Positioned<ast::DirectiveDefinition>, MergeError> {
    if !same_arguments(&new.node.arguments, &existing.node.arguments) {
        return Err(MergeError::DirectiveDefinition {
            name: new.node.name.node.to_string(),
            existing: print_definition(existing),
            received: print_definition(new),
        });
    }

    let mut merged = existing.clone();
    for location in &new.node.locations {
        if !merged
            .node
            .locations
            .iter()
            .any(|existing| existing.node == location.node)
        {
            merged.node.locations.push(*location);
        }
    }

    if merged.node.description.is_none() {
        merged.node.description.clone_from(&new.node.description);
    }
    merged.node.is_repeatable |= new.node.is_repeatable;

    Ok(merged)
}

fn same_arguments(
    a: &[Positioned<ast::InputValueDefinition>],
    b: &[Positioned<ast::InputValueDefinition>],
) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(a, b)| {
            a.node.name.node == b.node.name.node
                && a.node.ty.node == b.node.ty.node
                && a.node.default_value.as_ref().map(|value| &value.node)
                    == b.node.default_value.as_ref().map(|value| &value.node)
        })
}

fn print_definition(definition: &Positioned<ast::DirectiveDefinition>) -> String {
    let mut definition = definition.clone();
    definition.node.description = None;

    let document = ast::ServiceDocument {
        definitions: vec![TypeSystemDefinition::Directive(definition)],
    };

    print_document(&document).trim_end().to_string()
}
