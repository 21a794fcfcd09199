use std::collections::HashSet;

use indexmap::IndexMap;
use schema::{ast, ConstValue, NamedType, ObjectType, Positioned};

use crate::{context::ExecutionContext, GraphqlError};

/// Fields selected on one runtime type, grouped by response key in selection order.
pub(crate) type GroupedFields<'a> = IndexMap<&'a str, Vec<&'a Positioned<ast::Field>>>;

#[derive(Default)]
pub(crate) struct CollectedFields<'a> {
    pub(crate) fields: GroupedFields<'a>,
    pub(crate) deferred: Vec<DeferredFragment<'a>>,
}

/// A fragment split off with `@defer`, executed after its parent payload.
pub(crate) struct DeferredFragment<'a> {
    pub(crate) label: Option<String>,
    pub(crate) selection_set: &'a ast::SelectionSet,
    /// Named fragments enclosing the deferred selection set.
    pub(crate) ancestors: Vec<&'a str>,
}

impl<'a> ExecutionContext<'a> {
    /// Collects the fields of `selection_sets` applying to `runtime_type`.
    pub(crate) fn collect_fields(
        &self,
        runtime_type: &ObjectType,
        selection_sets: impl IntoIterator<Item = &'a ast::SelectionSet>,
    ) -> Result<CollectedFields<'a>, GraphqlError> {
        self.collect_fields_within(runtime_type, selection_sets, &[])
    }

    /// Same as [`Self::collect_fields`] for selection sets nested in the `ancestors` fragments,
    /// as deferred fragments are.
    pub(crate) fn collect_fields_within(
        &self,
        runtime_type: &ObjectType,
        selection_sets: impl IntoIterator<Item = &'a ast::SelectionSet>,
        ancestors: &[&'a str],
    ) -> Result<CollectedFields<'a>, GraphqlError> {
        let mut collected = CollectedFields::default();
        let mut visited_fragments = HashSet::new();
        let mut ancestors = ancestors.to_vec();

        for selection_set in selection_sets {
            self.collect_selection_set(
                runtime_type,
                selection_set,
                &mut collected,
                &mut visited_fragments,
                &mut ancestors,
            )?;
        }

        Ok(collected)
    }

    fn collect_selection_set(
        &self,
        runtime_type: &ObjectType,
        selection_set: &'a ast::SelectionSet,
        collected: &mut CollectedFields<'a>,
        visited_fragments: &mut HashSet<&'a str>,
        ancestors: &mut Vec<&'a str>,
    ) -> Result<(), GraphqlError> {
        for selection in &selection_set.items {
            match &selection.node {
                ast::Selection::Field(field) => {
                    if !self.should_include(&field.node.directives)? {
                        continue;
                    }

                    collected
                        .fields
                        .entry(field.node.response_key().node.as_str())
                        .or_default()
                        .push(field);
                }
                ast::Selection::InlineFragment(fragment) => {
                    let fragment = &fragment.node;
                    if !self.should_include(&fragment.directives)? {
                        continue;
                    }

                    let condition = fragment.type_condition.as_ref().map(|condition| &condition.node.on.node);
                    if !self.does_fragment_condition_match(condition.map(|name| name.as_str()), runtime_type) {
                        continue;
                    }

                    if let Some(label) = self.defer_label(&fragment.directives)? {
                        collected.deferred.push(DeferredFragment {
                            label,
                            selection_set: &fragment.selection_set.node,
                            ancestors: ancestors.clone(),
                        });
                        continue;
                    }

                    self.collect_selection_set(
                        runtime_type,
                        &fragment.selection_set.node,
                        collected,
                        visited_fragments,
                        ancestors,
                    )?;
                }
                ast::Selection::FragmentSpread(spread) => {
                    let spread = &spread.node;
                    let fragment_name = spread.fragment_name.node.as_str();

                    if !self.should_include(&spread.directives)? {
                        continue;
                    }

                    let defer = self.defer_label(&spread.directives)?;

                    // A deferred spread is executed on its own later, so only a spread of an
                    // enclosing fragment would loop.
                    let seen = match defer {
                        Some(_) => ancestors.contains(&fragment_name),
                        None => visited_fragments.contains(fragment_name),
                    };
                    if seen {
                        continue;
                    }

                    let Some(fragment) = self.fragments.get(fragment_name) else {
                        continue;
                    };

                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    if !self.does_fragment_condition_match(Some(condition), runtime_type) {
                        continue;
                    }

                    match defer {
                        Some(label) => {
                            let mut fragment_ancestors = ancestors.clone();
                            fragment_ancestors.push(fragment_name);
                            collected.deferred.push(DeferredFragment {
                                label,
                                selection_set: &fragment.node.selection_set.node,
                                ancestors: fragment_ancestors,
                            });
                        }
                        None => {
                            visited_fragments.insert(fragment_name);
                            ancestors.push(fragment_name);
                            self.collect_selection_set(
                                runtime_type,
                                &fragment.node.selection_set.node,
                                collected,
                                visited_fragments,
                                ancestors,
                            )?;
                            ancestors.pop();
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// `@skip` and `@include` handling.
    fn should_include(&self, directives: &[Positioned<ast::Directive>]) -> Result<bool, GraphqlError> {
        if let Some(arguments) = self.directive_arguments("skip", directives)? {
            if arguments.get("if") == Some(&ConstValue::Boolean(true)) {
                return Ok(false);
            }
        }

        if let Some(arguments) = self.directive_arguments("include", directives)? {
            if arguments.get("if") == Some(&ConstValue::Boolean(false)) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// `Some(label)` when the fragment is deferred.
    fn defer_label(&self, directives: &[Positioned<ast::Directive>]) -> Result<Option<Option<String>>, GraphqlError> {
        if !self.incremental {
            return Ok(None);
        }

        let Some(arguments) = self.directive_arguments("defer", directives)? else {
            return Ok(None);
        };

        if arguments.get("if") == Some(&ConstValue::Boolean(false)) {
            return Ok(None);
        }

        let label = match arguments.get("label") {
            Some(ConstValue::String(label)) => Some(label.clone()),
            _ => None,
        };

        Ok(Some(label))
    }

    fn does_fragment_condition_match(&self, condition: Option<&str>, runtime_type: &ObjectType) -> bool {
        let Some(condition) = condition else {
            return true;
        };

        if condition == runtime_type.name.as_str() {
            return true;
        }

        match self.schema.get_type(condition) {
            Some(ty @ (NamedType::Interface(_) | NamedType::Union(_))) => {
                self.schema.is_sub_type(ty.name(), &runtime_type.name)
            }
            _ => false,
        }
    }
}
