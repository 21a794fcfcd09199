use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use futures_util::{
    future::{select, Either},
    pin_mut,
};
use schema::{
    ast, AbortSignal, ArgumentValues, ContextValue, Field, FieldError, FieldResult, FieldValue, Name, ObjectType,
    PathSegment, Positioned, ResolveInfo, Resolver, ResponsePath, Schema, TypeResolver, VariableValues,
};

use crate::{
    coercion::{coerce_argument_values, coerce_variable_values},
    incremental::Workload,
    ExecutionArgs, GraphqlError,
};

pub(crate) const ABORTED: &str = "This operation was aborted";

/// Per-request state shared by every field of one operation.
pub(crate) struct ExecutionContext<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) fragments: &'a HashMap<Name, Positioned<ast::FragmentDefinition>>,
    pub(crate) operation: &'a Positioned<ast::OperationDefinition>,
    pub(crate) operation_name: Option<&'a Name>,
    pub(crate) root_value: Arc<FieldValue>,
    pub(crate) context_value: &'a ContextValue,
    pub(crate) variable_values: VariableValues,
    pub(crate) field_resolver: Option<&'a Resolver>,
    pub(crate) type_resolver: Option<&'a TypeResolver>,
    pub(crate) subscribe_field_resolver: Option<&'a Resolver>,
    pub(crate) signal: AbortSignal,
    pub(crate) incremental: bool,
}

impl<'a> ExecutionContext<'a> {
    /// Selects the operation and coerces its variables. Failures are request errors.
    pub(crate) fn prepare(args: &'a ExecutionArgs, signal: AbortSignal) -> Result<Self, Vec<GraphqlError>> {
        let (operation_name, operation) = select_operation(&args.document, args.operation_name.as_deref())?;

        tracing::debug!(
            operation_name = operation_name.map_or("<anonymous>", |name| name.as_str()),
            operation_type = operation_kind(operation.node.ty),
            "operation selected"
        );

        let variable_values =
            coerce_variable_values(&args.schema, &operation.node.variable_definitions, &args.variable_values)?;

        Ok(ExecutionContext {
            schema: &args.schema,
            fragments: &args.document.fragments,
            operation,
            operation_name,
            root_value: args.root_value.clone(),
            context_value: args.context_value.as_ref(),
            variable_values,
            field_resolver: args.field_resolver.as_ref(),
            type_resolver: args.type_resolver.as_ref(),
            subscribe_field_resolver: args.subscribe_field_resolver.as_ref(),
            signal,
            incremental: args.incremental,
        })
    }

    /// Same request executed against another root value, as done for subscription events.
    pub(crate) fn with_root_value(&self, root_value: FieldValue) -> Self {
        ExecutionContext {
            schema: self.schema,
            fragments: self.fragments,
            operation: self.operation,
            operation_name: self.operation_name,
            root_value: Arc::new(root_value),
            context_value: self.context_value,
            variable_values: self.variable_values.clone(),
            field_resolver: self.field_resolver,
            type_resolver: self.type_resolver,
            subscribe_field_resolver: self.subscribe_field_resolver,
            signal: self.signal.clone(),
            incremental: false,
        }
    }

    pub(crate) fn root_type(&self) -> Result<&'a ObjectType, GraphqlError> {
        let schema: &'a Schema = self.schema;

        schema.root_type(self.operation.node.ty).ok_or_else(|| {
            GraphqlError::new(format!(
                "Schema is not configured to execute {} operation.",
                operation_kind(self.operation.node.ty)
            ))
            .with_location(self.operation.pos)
        })
    }

    pub(crate) fn resolve_info<'s>(&'s self, plan: &'s FieldPlan<'a>, path: &'s ResponsePath) -> ResolveInfo<'s> {
        ResolveInfo {
            field_name: &plan.field.name,
            field_nodes: &plan.field_nodes,
            return_type: &plan.field.ty,
            parent_type: plan.parent_type,
            path,
            schema: self.schema,
            fragments: self.fragments,
            root_value: &self.root_value,
            operation: self.operation,
            variable_values: &self.variable_values,
            signal: &self.signal,
        }
    }

    /// Arguments of `name` if it is applied in `directives`.
    pub(crate) fn directive_arguments(
        &self,
        name: &str,
        directives: &[Positioned<ast::Directive>],
    ) -> Result<Option<ArgumentValues>, GraphqlError> {
        let Some(directive) = directives.iter().find(|directive| directive.node.name.node.as_str() == name) else {
            return Ok(None);
        };

        let Some(definition) = self.schema.directive(name) else {
            return Ok(None);
        };

        coerce_argument_values(
            self.schema,
            &definition.arguments,
            &directive.node.arguments,
            &self.variable_values,
            directive.pos,
        )
        .map(Some)
    }

    /// Runs `future` unless the request gets aborted first.
    pub(crate) async fn with_abort<T>(&self, future: impl Future<Output = FieldResult<T>>) -> FieldResult<T> {
        if self.signal.is_aborted() {
            return Err(FieldError::new(ABORTED));
        }

        let aborted = self.signal.aborted();
        pin_mut!(future, aborted);

        match select(future, aborted).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => Err(FieldError::new(ABORTED)),
        }
    }
}

pub(crate) fn operation_kind(ty: ast::OperationType) -> &'static str {
    match ty {
        ast::OperationType::Query => "query",
        ast::OperationType::Mutation => "mutation",
        ast::OperationType::Subscription => "subscription",
    }
}

fn select_operation<'a>(
    document: &'a ast::ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<(Option<&'a Name>, &'a Positioned<ast::OperationDefinition>), Vec<GraphqlError>> {
    let mut selected = None;

    for (name, operation) in document.operations.iter() {
        match operation_name {
            Some(operation_name) => {
                if name.is_some_and(|name| name.as_str() == operation_name) {
                    selected = Some((name, operation));
                }
            }
            None => {
                if selected.is_some() {
                    return Err(vec![GraphqlError::new(
                        "Must provide operation name if query contains multiple operations.",
                    )]);
                }
                selected = Some((name, operation));
            }
        }
    }

    selected.ok_or_else(|| {
        let message = match operation_name {
            Some(name) => format!("Unknown operation named \"{name}\"."),
            None => "Must provide an operation.".to_string(),
        };
        vec![GraphqlError::new(message)]
    })
}

/// A field being executed: its definition and every node selecting it under one response key.
#[derive(Clone)]
pub(crate) struct FieldPlan<'a> {
    pub(crate) parent_type: &'a ObjectType,
    pub(crate) field: &'a Field,
    pub(crate) field_node: &'a Positioned<ast::Field>,
    pub(crate) field_nodes: Vec<&'a Positioned<ast::Field>>,
}

/// Errors and follow-up work of one payload: the initial response, a deferred fragment or
/// a streamed item.
pub(crate) struct Scope<'a> {
    errors: Mutex<Vec<GraphqlError>>,
    nulled_paths: Mutex<Vec<Vec<PathSegment>>>,
    workloads: Mutex<Vec<Workload<'a>>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new() -> Self {
        Scope {
            errors: Mutex::new(Vec::new()),
            nulled_paths: Mutex::new(Vec::new()),
            workloads: Mutex::new(Vec::new()),
        }
    }

    /// Records an error and the path it nulled.
    pub(crate) fn add_error(&self, error: GraphqlError, nulled_path: &ResponsePath) {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).push(error);
        self.nulled_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(nulled_path.to_vec());
    }

    pub(crate) fn add_workload(&self, workload: Workload<'a>) {
        self.workloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(workload);
    }

    /// Errors of the payload and the work it spawned, minus work below a nulled path.
    pub(crate) fn finish(self) -> (Vec<GraphqlError>, Vec<Workload<'a>>) {
        let errors = self.errors.into_inner().unwrap_or_else(PoisonError::into_inner);
        let nulled_paths = self.nulled_paths.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut workloads = self.workloads.into_inner().unwrap_or_else(PoisonError::into_inner);

        workloads.retain(|workload| {
            let path = workload.path().to_vec();
            let nulled = nulled_paths.iter().any(|nulled| path.starts_with(nulled));

            if nulled {
                tracing::trace!(path = ?path, "dropping incremental work below a nulled path");
            }

            !nulled
        });

        (errors, workloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_selection() {
        let document = schema::parse_query("query A { a } query B { b }").unwrap();

        let error = select_operation(&document, None).unwrap_err();
        assert_eq!(
            error[0].message,
            "Must provide operation name if query contains multiple operations."
        );

        let error = select_operation(&document, Some("C")).unwrap_err();
        assert_eq!(error[0].message, "Unknown operation named \"C\".");

        let (name, operation) = select_operation(&document, Some("B")).unwrap();
        assert_eq!(name.map(Name::as_str), Some("B"));
        assert_eq!(operation.node.selection_set.node.items.len(), 1);
    }
}
