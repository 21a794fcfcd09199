use std::sync::Arc;

use futures_util::{future, stream::BoxStream, Stream, StreamExt};
use schema::{AbortSignal, FieldResult, FieldValue, ResolverContext, ResponsePath};

use crate::{
    coercion::coerce_argument_values,
    context::{ExecutionContext, FieldPlan, Scope},
    default_resolvers::default_field_resolver,
    ExecutionArgs, GraphqlError, Response, ResponseStream, SubscriptionOutcome,
};

/// Subscribes to the operation's root field and executes the operation once per event,
/// with the event as root value.
///
/// Setup failures (missing subscription root, invalid variables, a failing or non-stream
/// `subscribe` resolver) are returned as an error response rather than a stream.
pub async fn subscribe(args: ExecutionArgs) -> SubscriptionOutcome {
    let controller = Arc::new(args.abort_controller());
    let mut events = subscription_stream(args, controller.signal()).boxed();

    match events.next().await {
        Some(Setup::Ready) => {
            let responses = events.filter_map(|event| {
                future::ready(match event {
                    Setup::Item(response) => Some(response),
                    _ => None,
                })
            });

            SubscriptionOutcome::Stream(ResponseStream::new(responses.boxed(), controller))
        }
        Some(Setup::Failed(response)) => SubscriptionOutcome::Error(response),
        Some(Setup::Item(_)) | None => SubscriptionOutcome::Error(Response::default()),
    }
}

/// Resolves the subscription root field into its raw source event stream, without
/// executing anything per event.
pub async fn create_source_event_stream(
    args: ExecutionArgs,
) -> Result<ResponseStream<FieldResult<FieldValue>>, Response> {
    let controller = Arc::new(args.abort_controller());
    let mut events = source_stream(args, controller.signal()).boxed();

    match events.next().await {
        Some(Setup::Ready) => {
            let events = events.filter_map(|event| {
                future::ready(match event {
                    Setup::Item(event) => Some(event),
                    _ => None,
                })
            });

            Ok(ResponseStream::new(events.boxed(), controller))
        }
        Some(Setup::Failed(response)) => Err(response),
        Some(Setup::Item(_)) | None => Err(Response::default()),
    }
}

enum Setup<T> {
    Failed(Response),
    Ready,
    Item(T),
}

fn subscription_stream(args: ExecutionArgs, signal: AbortSignal) -> impl Stream<Item = Setup<Response>> + Send + 'static {
    async_stream::stream! {
        let ctx = match ExecutionContext::prepare(&args, signal) {
            Ok(ctx) => ctx,
            Err(errors) => {
                yield Setup::Failed(Response::from_errors(errors));
                return;
            }
        };

        let mut source = match ctx.source_event_stream().await {
            Ok(source) => source,
            Err(error) => {
                yield Setup::Failed(Response::from_errors(vec![error]));
                return;
            }
        };

        yield Setup::Ready;

        while let Ok(Some(event)) = ctx.with_abort(async { Ok(source.next().await) }).await {
            match event {
                Ok(event) => {
                    let event_ctx = ctx.with_root_value(event);
                    let scope = Scope::new();
                    let data = event_ctx.execute_operation(&scope).await;
                    let (errors, _) = scope.finish();

                    yield Setup::Item(Response::from_data(data, errors));
                }
                Err(error) => {
                    tracing::debug!(error = error.message.as_str(), "subscription source stream failed");

                    yield Setup::Item(Response::from_errors(vec![GraphqlError::from(error)]));
                    break;
                }
            }
        }
    }
}

fn source_stream(
    args: ExecutionArgs,
    signal: AbortSignal,
) -> impl Stream<Item = Setup<FieldResult<FieldValue>>> + Send + 'static {
    async_stream::stream! {
        let ctx = match ExecutionContext::prepare(&args, signal) {
            Ok(ctx) => ctx,
            Err(errors) => {
                yield Setup::Failed(Response::from_errors(errors));
                return;
            }
        };

        let mut source = match ctx.source_event_stream().await {
            Ok(source) => source,
            Err(error) => {
                yield Setup::Failed(Response::from_errors(vec![error]));
                return;
            }
        };

        yield Setup::Ready;

        while let Ok(Some(event)) = ctx.with_abort(async { Ok(source.next().await) }).await {
            yield Setup::Item(event);
        }
    }
}

impl<'a> ExecutionContext<'a> {
    async fn source_event_stream(&self) -> Result<BoxStream<'static, FieldResult<FieldValue>>, GraphqlError> {
        let root_type = self.root_type()?;
        let operation = self.operation;
        let collected = self.collect_fields(root_type, [&operation.node.selection_set.node])?;

        if collected.fields.len() != 1 {
            let message = match self.operation_name {
                Some(name) => format!("Subscription \"{name}\" must select only one top level field."),
                None => "Anonymous Subscription must select only one top level field.".to_string(),
            };
            return Err(GraphqlError::new(message).with_location(operation.pos));
        }

        let Some((response_key, field_nodes)) = collected.fields.into_iter().next() else {
            return Err(GraphqlError::new("Subscription must select a top level field.").with_location(operation.pos));
        };

        let Some(field_node) = field_nodes.first().copied() else {
            return Err(GraphqlError::new("Subscription must select a top level field.").with_location(operation.pos));
        };

        let field_name = field_node.node.name.node.as_str();
        let Some(field) = root_type.fields.get(field_name) else {
            return Err(
                GraphqlError::new(format!("The subscription field \"{field_name}\" is not defined."))
                    .with_location(field_node.pos),
            );
        };

        let path = ResponsePath::root().child(response_key, Some(&root_type.name));
        let plan = FieldPlan {
            parent_type: root_type,
            field,
            field_node,
            field_nodes,
        };

        let args = coerce_argument_values(
            self.schema,
            &field.arguments,
            &field_node.node.arguments,
            &self.variable_values,
            field_node.pos,
        )
        .map_err(|error| error.with_path(&path))?;

        let info = self.resolve_info(&plan, &path);
        let ctx = ResolverContext {
            source: &self.root_value,
            args: &args,
            context: self.context_value,
            info: &info,
        };

        let resolved = match field.subscribe.as_ref().or(self.subscribe_field_resolver) {
            Some(subscribe) => self.with_abort(subscribe.call(ctx)).await,
            None => self.with_abort(async { default_field_resolver(ctx) }).await,
        };

        let value = resolved.map_err(|error| GraphqlError::from_field_error(error, &plan.field_nodes, &path))?;

        match value.into_inner() {
            FieldValue::Stream(stream) => {
                tracing::debug!(field = field_name, "subscription source stream created");
                Ok(stream.into_inner())
            }
            other => Err(GraphqlError::at_field(
                format!(
                    "Subscription field must return Async Iterable. Received: {}.",
                    other.describe()
                ),
                &plan.field_nodes,
                &path,
            )),
        }
    }
}
