use std::sync::Arc;

use futures_util::{future, pin_mut, stream, Stream, StreamExt};
use schema::AbortSignal;

use crate::{
    context::{ExecutionContext, Scope},
    ExecutionArgs, ExecutionOutcome, InitialPayload, Response, ResponseStream, StreamingPayload, SubsequentPayload,
};

/// Executes a query or mutation.
///
/// Returns a single response unless `@defer` or `@stream` split work off the initial
/// payload, in which case the initial payload and every subsequent one are streamed.
/// Request errors, like an unknown operation name or invalid variables, produce a response
/// without data.
pub async fn execute(args: ExecutionArgs) -> ExecutionOutcome {
    let controller = Arc::new(args.abort_controller());
    let mut payloads = execution_stream(args, controller.signal()).boxed();

    match payloads.next().await {
        Some(Emitted::Initial(initial)) => {
            let subsequent = payloads.filter_map(|emitted| {
                future::ready(match emitted {
                    Emitted::Subsequent(payload) => Some(StreamingPayload::Subsequent(payload)),
                    _ => None,
                })
            });

            let payloads = stream::once(future::ready(StreamingPayload::Initial(initial)))
                .chain(subsequent)
                .boxed();

            ExecutionOutcome::Incremental(ResponseStream::new(payloads, controller))
        }
        Some(Emitted::Complete(response)) => ExecutionOutcome::Single(response),
        Some(Emitted::Subsequent(_)) | None => ExecutionOutcome::Single(Response::default()),
    }
}

enum Emitted {
    /// Everything was delivered at once.
    Complete(Response),
    Initial(InitialPayload),
    Subsequent(SubsequentPayload),
}

fn execution_stream(args: ExecutionArgs, signal: AbortSignal) -> impl Stream<Item = Emitted> + Send + 'static {
    async_stream::stream! {
        let ctx = match ExecutionContext::prepare(&args, signal) {
            Ok(ctx) => ctx,
            Err(errors) => {
                yield Emitted::Complete(Response::from_errors(errors));
                return;
            }
        };

        let scope = Scope::new();
        let data = ctx.execute_operation(&scope).await;
        let (errors, workloads) = scope.finish();

        if workloads.is_empty() {
            yield Emitted::Complete(Response::from_data(data, errors));
            return;
        }

        yield Emitted::Initial(InitialPayload {
            data,
            errors,
            has_next: true,
        });

        let subsequent = ctx.subsequent_payloads(workloads);
        pin_mut!(subsequent);

        while let Some(payload) = subsequent.next().await {
            yield Emitted::Subsequent(payload);
        }
    }
}
