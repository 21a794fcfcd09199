//! Field resolution and value completion.

use std::sync::Arc;

use futures_util::{
    future::{join_all, BoxFuture},
    stream::BoxStream,
    StreamExt,
};
use indexmap::IndexMap;
use schema::{
    ast, inspect, ConstValue, FieldResult, FieldValue, Name, NamedType, ObjectType, PathSegment, Positioned,
    ResolverContext, ResponsePath, TypeRef, TypeResolverContext,
};

use crate::{
    coercion::coerce_argument_values,
    collect::{DeferredFragment, GroupedFields},
    context::{ExecutionContext, FieldPlan, Scope},
    default_resolvers::default_field_resolver,
    incremental::{DeferredWork, StreamItems, StreamWork, Workload},
    GraphqlError,
};

pub(crate) type CompletionResult = Result<ConstValue, GraphqlError>;

struct StreamDirective {
    initial_count: usize,
    label: Option<String>,
}

impl<'a> ExecutionContext<'a> {
    /// Executes the operation against the root value. Errors reaching the root null the data.
    pub(crate) async fn execute_operation(&self, scope: &Scope<'a>) -> ConstValue {
        match self.execute_root_selection_set(scope).await {
            Ok(data) => data,
            Err(error) => {
                scope.add_error(error, &ResponsePath::root());
                ConstValue::Null
            }
        }
    }

    async fn execute_root_selection_set(&self, scope: &Scope<'a>) -> CompletionResult {
        let root_type = self.root_type()?;
        let path = ResponsePath::root();
        let operation: &'a Positioned<ast::OperationDefinition> = self.operation;

        let collected = self.collect_fields(root_type, [&operation.node.selection_set.node])?;
        self.defer_fragments(scope, root_type, &self.root_value, &path, collected.deferred);

        let fields = match operation.node.ty {
            ast::OperationType::Mutation => {
                self.execute_fields_serially(scope, root_type, &self.root_value, &path, collected.fields)
                    .await?
            }
            _ => {
                self.execute_fields(scope, root_type, &self.root_value, &path, collected.fields)
                    .await?
            }
        };

        Ok(ConstValue::Object(fields))
    }

    /// Starts every field without waiting on its siblings. Keys keep selection order.
    pub(crate) async fn execute_fields(
        &self,
        scope: &Scope<'a>,
        parent_type: &'a ObjectType,
        source: &Arc<FieldValue>,
        path: &ResponsePath,
        fields: GroupedFields<'a>,
    ) -> Result<IndexMap<Name, ConstValue>, GraphqlError> {
        let futures = fields.into_iter().map(|(response_key, field_nodes)| async move {
            let field_path = path.child(response_key, Some(&parent_type.name));
            let result = self
                .execute_field(scope, parent_type, source, field_nodes, field_path)
                .await;
            (response_key, result)
        });

        let mut object = IndexMap::new();
        for (response_key, result) in join_all(futures).await {
            if let Some(value) = result.transpose()? {
                object.insert(Name::new(response_key), value);
            }
        }

        Ok(object)
    }

    /// Mutation root fields: each one settles before the next one starts.
    async fn execute_fields_serially(
        &self,
        scope: &Scope<'a>,
        parent_type: &'a ObjectType,
        source: &Arc<FieldValue>,
        path: &ResponsePath,
        fields: GroupedFields<'a>,
    ) -> Result<IndexMap<Name, ConstValue>, GraphqlError> {
        let mut object = IndexMap::new();

        for (response_key, field_nodes) in fields {
            let field_path = path.child(response_key, Some(&parent_type.name));
            let result = self
                .execute_field(scope, parent_type, source, field_nodes, field_path)
                .await;

            if let Some(value) = result.transpose()? {
                object.insert(Name::new(response_key), value);
            }
        }

        Ok(object)
    }

    /// `None` when the field isn't defined on `parent_type`.
    async fn execute_field(
        &self,
        scope: &Scope<'a>,
        parent_type: &'a ObjectType,
        source: &Arc<FieldValue>,
        field_nodes: Vec<&'a Positioned<ast::Field>>,
        path: ResponsePath,
    ) -> Option<CompletionResult> {
        let field_node = *field_nodes.first()?;
        let field_name = field_node.node.name.node.as_str();

        if field_name == "__typename" {
            return Some(Ok(ConstValue::String(parent_type.name.to_string())));
        }

        let field = parent_type.fields.get(field_name)?;

        tracing::trace!(parent_type = parent_type.name.as_str(), field = field_name, "resolving field");

        let plan = FieldPlan {
            parent_type,
            field,
            field_node,
            field_nodes,
        };

        let result = self.resolve_field(scope, &plan, source, &path).await;
        Some(handle_field_error(scope, result, &field.ty, &path))
    }

    async fn resolve_field(
        &self,
        scope: &Scope<'a>,
        plan: &FieldPlan<'a>,
        source: &Arc<FieldValue>,
        path: &ResponsePath,
    ) -> CompletionResult {
        let args = coerce_argument_values(
            self.schema,
            &plan.field.arguments,
            &plan.field_node.node.arguments,
            &self.variable_values,
            plan.field_node.pos,
        )
        .map_err(|error| error.with_path(path))?;

        let info = self.resolve_info(plan, path);
        let ctx = ResolverContext {
            source,
            args: &args,
            context: self.context_value,
            info: &info,
        };

        let resolved = match plan.field.resolve.as_ref().or(self.field_resolver) {
            Some(resolver) => self.with_abort(resolver.call(ctx)).await,
            None => self.with_abort(async { default_field_resolver(ctx) }).await,
        };

        let value = resolved.map_err(|error| GraphqlError::from_field_error(error, &plan.field_nodes, path))?;

        self.complete_value(scope, plan, &plan.field.ty, path.clone(), value).await
    }

    /// Completes `value` against `ty`, recursing into lists and objects.
    pub(crate) fn complete_value<'s>(
        &'s self,
        scope: &'s Scope<'a>,
        plan: &'s FieldPlan<'a>,
        ty: &'s TypeRef,
        path: ResponsePath,
        value: FieldValue,
    ) -> BoxFuture<'s, CompletionResult> {
        Box::pin(async move {
            if ty.is_non_null() {
                let inner = ty.without_non_null();
                let completed = self.complete_value(scope, plan, &inner, path.clone(), value).await?;

                if completed == ConstValue::Null {
                    return Err(GraphqlError::at_field(
                        format!(
                            "Cannot return null for non-nullable field {}.{}.",
                            plan.parent_type.name, plan.field.name
                        ),
                        &plan.field_nodes,
                        &path,
                    ));
                }

                return Ok(completed);
            }

            if value.is_null() {
                return Ok(ConstValue::Null);
            }

            if let Some(item_type) = ty.item_type() {
                return self.complete_list_value(scope, plan, &item_type, &path, value).await;
            }

            let schema = self.schema;
            let Some(named_type) = schema.get_type(&ty.name) else {
                return Err(GraphqlError::at_field(
                    format!("Unknown type \"{}\".", ty.name),
                    &plan.field_nodes,
                    &path,
                ));
            };

            match named_type {
                NamedType::Scalar(_) | NamedType::Enum(_) => complete_leaf_value(plan, named_type, &path, &value),
                NamedType::Object(object_type) => self.complete_object_value(scope, plan, object_type, path, value).await,
                NamedType::Interface(_) | NamedType::Union(_) => {
                    self.complete_abstract_value(scope, plan, named_type, path, value).await
                }
                NamedType::InputObject(input) => Err(GraphqlError::at_field(
                    format!("Cannot complete value of unexpected output type: \"{}\".", input.name),
                    &plan.field_nodes,
                    &path,
                )),
            }
        })
    }

    async fn complete_list_value(
        &self,
        scope: &Scope<'a>,
        plan: &FieldPlan<'a>,
        item_type: &TypeRef,
        path: &ResponsePath,
        value: FieldValue,
    ) -> CompletionResult {
        let stream = self.stream_directive(plan, path)?;

        let mut items = match value.into_inner() {
            FieldValue::List(items) => items,
            FieldValue::Value(ConstValue::List(items)) => items.into_iter().map(FieldValue::Value).collect(),
            FieldValue::Stream(source) => {
                return self
                    .complete_async_list_value(scope, plan, item_type, path, source.into_inner(), stream)
                    .await
            }
            _ => {
                return Err(GraphqlError::at_field(
                    format!(
                        "Expected Iterable, but did not find one for field \"{}.{}\".",
                        plan.parent_type.name, plan.field.name
                    ),
                    &plan.field_nodes,
                    path,
                ))
            }
        };

        let remaining = match &stream {
            Some(directive) if directive.initial_count < items.len() => items.split_off(directive.initial_count),
            _ => Vec::new(),
        };

        let completed = join_all(items.into_iter().enumerate().map(|(index, item)| {
            self.complete_list_item_value(scope, plan, item_type, path.child(index, None), item)
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        if let Some(directive) = stream {
            if !remaining.is_empty() {
                scope.add_workload(Workload::Stream(StreamWork {
                    label: directive.label,
                    plan: plan.clone(),
                    item_type: item_type.clone(),
                    path: path.clone(),
                    next_index: completed.len(),
                    items: StreamItems::Iter(remaining.into_iter()),
                }));
            }
        }

        Ok(ConstValue::List(completed))
    }

    /// Lists produced by a stream are pulled one item at a time.
    async fn complete_async_list_value(
        &self,
        scope: &Scope<'a>,
        plan: &FieldPlan<'a>,
        item_type: &TypeRef,
        path: &ResponsePath,
        mut source: BoxStream<'static, FieldResult<FieldValue>>,
        stream: Option<StreamDirective>,
    ) -> CompletionResult {
        let mut completed = Vec::new();

        loop {
            if let Some(directive) = &stream {
                if completed.len() >= directive.initial_count {
                    scope.add_workload(Workload::Stream(StreamWork {
                        label: directive.label.clone(),
                        plan: plan.clone(),
                        item_type: item_type.clone(),
                        path: path.clone(),
                        next_index: completed.len(),
                        items: StreamItems::Source(source),
                    }));
                    break;
                }
            }

            let item_path = path.child(completed.len(), None);

            let next = self
                .with_abort(async { Ok(source.next().await) })
                .await
                .map_err(|error| GraphqlError::from_field_error(error, &plan.field_nodes, &item_path))?;

            let Some(item) = next else {
                break;
            };

            let item = item.map_err(|error| GraphqlError::from_field_error(error, &plan.field_nodes, &item_path))?;
            completed.push(
                self.complete_list_item_value(scope, plan, item_type, item_path, item)
                    .await?,
            );
        }

        Ok(ConstValue::List(completed))
    }

    /// Completes one list item. A failing nullable item only nulls its own index.
    pub(crate) async fn complete_list_item_value(
        &self,
        scope: &Scope<'a>,
        plan: &FieldPlan<'a>,
        item_type: &TypeRef,
        path: ResponsePath,
        item: FieldValue,
    ) -> CompletionResult {
        let result = self.complete_value(scope, plan, item_type, path.clone(), item).await;
        handle_field_error(scope, result, item_type, &path)
    }

    fn stream_directive(&self, plan: &FieldPlan<'a>, path: &ResponsePath) -> Result<Option<StreamDirective>, GraphqlError> {
        // Only the list of the field itself is streamed, never nested lists.
        if !self.incremental || !matches!(path.key(), Some(PathSegment::Field(_))) {
            return Ok(None);
        }

        let Some(arguments) = self
            .directive_arguments("stream", &plan.field_node.node.directives)
            .map_err(|error| error.with_path(path))?
        else {
            return Ok(None);
        };

        if arguments.get("if") == Some(&ConstValue::Boolean(false)) {
            return Ok(None);
        }

        let initial_count = match arguments.get("initialCount") {
            Some(ConstValue::Number(number)) => number.as_i64().and_then(|count| usize::try_from(count).ok()),
            _ => Some(0),
        };

        let Some(initial_count) = initial_count else {
            return Err(GraphqlError::at_field(
                "initialCount must be a positive integer",
                &plan.field_nodes,
                path,
            ));
        };

        let label = match arguments.get("label") {
            Some(ConstValue::String(label)) => Some(label.clone()),
            _ => None,
        };

        Ok(Some(StreamDirective { initial_count, label }))
    }

    async fn complete_object_value(
        &self,
        scope: &Scope<'a>,
        plan: &FieldPlan<'a>,
        object_type: &'a ObjectType,
        path: ResponsePath,
        value: FieldValue,
    ) -> CompletionResult {
        if let Some(is_type_of) = &object_type.is_type_of {
            let info = self.resolve_info(plan, &path);
            let ctx = TypeResolverContext {
                value: &value,
                context: self.context_value,
                info: &info,
                abstract_type: &object_type.name,
            };

            let is_type_of = self
                .with_abort(is_type_of.call(ctx))
                .await
                .map_err(|error| GraphqlError::from_field_error(error, &plan.field_nodes, &path))?;

            if !is_type_of {
                return Err(GraphqlError::at_field(
                    format!(
                        "Expected value of type \"{}\" but got: {}.",
                        object_type.name,
                        value.describe()
                    ),
                    &plan.field_nodes,
                    &path,
                ));
            }
        }

        let source = Arc::new(value);
        let field_nodes: &[&'a Positioned<ast::Field>] = &plan.field_nodes;
        let collected = self
            .collect_fields(
                object_type,
                field_nodes.iter().map(|&field| &field.node.selection_set.node),
            )
            .map_err(|error| error.with_path(&path))?;

        self.defer_fragments(scope, object_type, &source, &path, collected.deferred);

        let fields = self
            .execute_fields(scope, object_type, &source, &path, collected.fields)
            .await?;

        Ok(ConstValue::Object(fields))
    }

    async fn complete_abstract_value(
        &self,
        scope: &Scope<'a>,
        plan: &FieldPlan<'a>,
        abstract_type: &'a NamedType,
        path: ResponsePath,
        value: FieldValue,
    ) -> CompletionResult {
        let runtime_type = self
            .resolve_runtime_type(plan, abstract_type, &path, &value)
            .await
            .map_err(|error| GraphqlError::from_field_error(error, &plan.field_nodes, &path))?;

        let object_type = self.ensure_valid_runtime_type(runtime_type, abstract_type, plan, &path)?;

        self.complete_object_value(scope, plan, object_type, path, value.into_inner())
            .await
    }

    /// Explicit runtime type first, then type resolvers, then `__typename` and `isTypeOf`.
    async fn resolve_runtime_type(
        &self,
        plan: &FieldPlan<'a>,
        abstract_type: &NamedType,
        path: &ResponsePath,
        value: &FieldValue,
    ) -> FieldResult<Option<String>> {
        if let Some(type_name) = value.type_name() {
            return Ok(Some(type_name.to_string()));
        }

        let info = self.resolve_info(plan, path);
        let ctx = TypeResolverContext {
            value,
            context: self.context_value,
            info: &info,
            abstract_type: abstract_type.name(),
        };

        let type_resolver = match abstract_type {
            NamedType::Interface(interface) => interface.resolve_type.as_ref(),
            NamedType::Union(union) => union.resolve_type.as_ref(),
            _ => None,
        };

        if let Some(type_resolver) = type_resolver.or(self.type_resolver) {
            return self.with_abort(type_resolver.call(ctx)).await;
        }

        if let Some(ConstValue::Object(object)) = value.as_value() {
            if let Some(ConstValue::String(type_name)) = object.get("__typename") {
                return Ok(Some(type_name.clone()));
            }
        }

        for type_name in self.schema.possible_types(abstract_type.name()) {
            let Some(is_type_of) = self.schema.object(type_name).and_then(|object| object.is_type_of.as_ref()) else {
                continue;
            };

            if self.with_abort(is_type_of.call(ctx)).await? {
                return Ok(Some(type_name.to_string()));
            }
        }

        Ok(None)
    }

    fn ensure_valid_runtime_type(
        &self,
        runtime_type: Option<String>,
        abstract_type: &NamedType,
        plan: &FieldPlan<'a>,
        path: &ResponsePath,
    ) -> Result<&'a ObjectType, GraphqlError> {
        let abstract_name = abstract_type.name();
        let error = |message: String| GraphqlError::at_field(message, &plan.field_nodes, path);

        let Some(runtime_type) = runtime_type else {
            return Err(error(format!(
                "Abstract type \"{abstract_name}\" must resolve to an Object type at runtime for field \"{}.{}\". Either the \"{abstract_name}\" type should provide a \"resolveType\" function or each possible type should provide an \"isTypeOf\" function.",
                plan.parent_type.name, plan.field.name
            )));
        };

        let schema = self.schema;
        let object_type = match schema.get_type(&runtime_type) {
            None => {
                return Err(error(format!(
                    "Abstract type \"{abstract_name}\" was resolved to a type \"{runtime_type}\" that does not exist inside the schema."
                )))
            }
            Some(NamedType::Object(object_type)) => object_type,
            Some(_) => {
                return Err(error(format!(
                    "Abstract type \"{abstract_name}\" was resolved to a non-object type \"{runtime_type}\"."
                )))
            }
        };

        if !schema.is_possible_type(abstract_name, &runtime_type) {
            return Err(error(format!(
                "Runtime Object type \"{runtime_type}\" is not a possible type for \"{abstract_name}\"."
            )));
        }

        Ok(object_type)
    }

    pub(crate) fn defer_fragments(
        &self,
        scope: &Scope<'a>,
        object_type: &'a ObjectType,
        source: &Arc<FieldValue>,
        path: &ResponsePath,
        fragments: Vec<DeferredFragment<'a>>,
    ) {
        for fragment in fragments {
            scope.add_workload(Workload::Defer(DeferredWork {
                label: fragment.label,
                path: path.clone(),
                object_type,
                source: source.clone(),
                selection_set: fragment.selection_set,
                ancestors: fragment.ancestors,
            }));
        }
    }
}

/// Records the error of a nullable position and nulls it, or keeps propagating it upward.
pub(crate) fn handle_field_error(
    scope: &Scope<'_>,
    result: CompletionResult,
    ty: &TypeRef,
    path: &ResponsePath,
) -> CompletionResult {
    match result {
        Ok(value) => Ok(value),
        Err(error) if ty.is_non_null() => Err(error),
        Err(error) => {
            scope.add_error(error, path);
            Ok(ConstValue::Null)
        }
    }
}

fn complete_leaf_value(
    plan: &FieldPlan<'_>,
    leaf_type: &NamedType,
    path: &ResponsePath,
    value: &FieldValue,
) -> CompletionResult {
    let error = |message: String| GraphqlError::at_field(message, &plan.field_nodes, path);

    let Some(raw) = value.as_value() else {
        return Err(error(format!(
            "Expected a value of type \"{}\" but received: {}",
            leaf_type.name(),
            value.describe()
        )));
    };

    let serialized = match leaf_type {
        NamedType::Scalar(scalar) => (scalar.serialize)(raw),
        NamedType::Enum(enum_type) => enum_type
            .serialize(raw)
            .map(|name| ConstValue::Enum(name.clone()))
            .ok_or_else(|| format!("Enum \"{}\" cannot represent value: {}", enum_type.name, inspect(raw))),
        other => Err(format!("Type \"{}\" is not a leaf type.", other.name())),
    };

    match serialized {
        Ok(ConstValue::Null) => Err(error(format!(
            "Expected `{}.serialize({})` to return non-nullable value, returned: null",
            leaf_type.name(),
            inspect(raw)
        ))),
        Ok(serialized) => Ok(serialized),
        Err(message) => Err(error(message)),
    }
}
