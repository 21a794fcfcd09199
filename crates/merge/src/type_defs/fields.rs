use schema::{ast, Name, Positioned, TypeRef};

use super::directives::merge_directives;
use crate::{MergeError, MergeTypeDefsConfig};

/// Field-like definitions of object, interface and input object types.
pub(super) trait FieldNode: Clone {
    fn name(&self) -> &Name;

    fn ty_mut(&mut self) -> &mut Positioned<ast::Type>;

    fn ty(&self) -> &Positioned<ast::Type>;

    fn description_mut(&mut self) -> &mut Option<Positioned<String>>;

    fn description(&self) -> Option<&Positioned<String>>;

    fn directives_mut(&mut self) -> &mut Vec<Positioned<ast::ConstDirective>>;

    fn directives(&self) -> &[Positioned<ast::ConstDirective>];

    /// Merges what is specific to the kind of definition.
    fn merge_rest(&mut self, new: &Self, config: &MergeTypeDefsConfig);

    fn sort(&mut self) {}
}

impl FieldNode for ast::FieldDefinition {
    fn name(&self) -> &Name {
        &self.name.node
    }

    fn ty_mut(&mut self) -> &mut Positioned<ast::Type> {
        &mut self.ty
    }

    fn ty(&self) -> &Positioned<ast::Type> {
        &self.ty
    }

    fn description_mut(&mut self) -> &mut Option<Positioned<String>> {
        &mut self.description
    }

    fn description(&self) -> Option<&Positioned<String>> {
        self.description.as_ref()
    }

    fn directives_mut(&mut self) -> &mut Vec<Positioned<ast::ConstDirective>> {
        &mut self.directives
    }

    fn directives(&self) -> &[Positioned<ast::ConstDirective>] {
        &self.directives
    }

    fn merge_rest(&mut self, new: &Self, config: &MergeTypeDefsConfig) {
        let existing = std::mem::take(&mut self.arguments);
        self.arguments = merge_arguments(&new.arguments, existing, config);
    }

    fn sort(&mut self) {
        sort_by_name(&mut self.arguments, |argument| &argument.node.name.node);
    }
}

impl FieldNode for ast::InputValueDefinition {
    fn name(&self) -> &Name {
        &self.name.node
    }

    fn ty_mut(&mut self) -> &mut Positioned<ast::Type> {
        &mut self.ty
    }

    fn ty(&self) -> &Positioned<ast::Type> {
        &self.ty
    }

    fn description_mut(&mut self) -> &mut Option<Positioned<String>> {
        &mut self.description
    }

    fn description(&self) -> Option<&Positioned<String>> {
        self.description.as_ref()
    }

    fn directives_mut(&mut self) -> &mut Vec<Positioned<ast::ConstDirective>> {
        &mut self.directives
    }

    fn directives(&self) -> &[Positioned<ast::ConstDirective>] {
        &self.directives
    }

    fn merge_rest(&mut self, new: &Self, _: &MergeTypeDefsConfig) {
        if self.default_value.is_none() {
            self.default_value.clone_from(&new.default_value);
        }
    }
}

/// Existing fields keep their position, new ones are appended.
pub(super) fn merge_fields<T: FieldNode>(
    type_name: &str,
    new: &[Positioned<T>],
    mut existing: Vec<Positioned<T>>,
    config: &MergeTypeDefsConfig,
) -> Result<Vec<Positioned<T>>, MergeError> {
    for field in new {
        match existing.iter_mut().find(|existing| existing.node.name() == field.node.name()) {
            Some(_) if config.ignore_field_conflicts => (),
            Some(existing) => merge_field(type_name, &field.node, &mut existing.node, config)?,
            None => existing.push(field.clone()),
        }
    }

    Ok(tidy_fields(type_name, existing, config))
}

/// Applies field exclusions and sorting.
pub(super) fn tidy_fields<T: FieldNode>(
    type_name: &str,
    mut fields: Vec<Positioned<T>>,
    config: &MergeTypeDefsConfig,
) -> Vec<Positioned<T>> {
    fields.retain(|field| !config.excludes_field(type_name, field.node.name()));

    if config.sort {
        sort_by_name(&mut fields, |field| field.node.name());
        for field in &mut fields {
            field.node.sort();
        }
    }

    fields
}

fn merge_field<T: FieldNode>(
    type_name: &str,
    new: &T,
    existing: &mut T,
    config: &MergeTypeDefsConfig,
) -> Result<(), MergeError> {
    merge_field_type(type_name, new.name().as_str(), new.ty(), existing.ty_mut(), config)?;

    if let Some(description) = new.description() {
        *existing.description_mut() = Some(description.clone());
    }

    let directives = std::mem::take(existing.directives_mut());
    *existing.directives_mut() = merge_directives(new.directives(), directives, config);

    existing.merge_rest(new, config);

    Ok(())
}

/// A redefinition must keep the named type and the list structure. Non-null wins over nullable.
fn merge_field_type(
    type_name: &str,
    field_name: &str,
    new: &Positioned<ast::Type>,
    existing: &mut Positioned<ast::Type>,
    config: &MergeTypeDefsConfig,
) -> Result<(), MergeError> {
    if new.node == existing.node {
        return Ok(());
    }

    let (declared, received) = (TypeRef::from_ast(&existing.node), TypeRef::from_ast(&new.node));

    if declared.name != received.name {
        return Err(MergeError::type_definition(
            type_name,
            format!(
                "Field \"{field_name}\" already defined with a different type. Declared as \"{}\", but you tried to override with \"{}\"",
                declared.name, received.name
            ),
        ));
    }

    if config.throw_on_conflict || declared.wrapping.list_depth() != received.wrapping.list_depth() {
        return Err(MergeError::type_definition(
            type_name,
            format!("Field '{type_name}.{field_name}' changed type from '{declared}' to '{received}'"),
        ));
    }

    if !new.node.nullable && existing.node.nullable {
        *existing = new.clone();
    }

    Ok(())
}

/// Existing arguments first, a redefinition replacing the earlier one unless `reverse_arguments`.
pub(super) fn merge_arguments(
    new: &[Positioned<ast::InputValueDefinition>],
    mut existing: Vec<Positioned<ast::InputValueDefinition>>,
    config: &MergeTypeDefsConfig,
) -> Vec<Positioned<ast::InputValueDefinition>> {
    for argument in new {
        match existing
            .iter_mut()
            .find(|existing| existing.node.name.node == argument.node.name.node)
        {
            Some(_) if config.reverse_arguments => (),
            Some(existing) => *existing = argument.clone(),
            None => existing.push(argument.clone()),
        }
    }

    if config.sort {
        sort_by_name(&mut existing, |argument| &argument.node.name.node);
    }

    existing
}

pub(super) fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &Name) {
    items.sort_by(|a, b| name(a).as_str().cmp(name(b).as_str()));
}
