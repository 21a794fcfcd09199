//! Payloads delivered after the initial response: deferred fragments and streamed list items.

use std::sync::Arc;

use futures_util::{
    stream::{BoxStream, FuturesUnordered},
    Stream, StreamExt,
};
use schema::{ast, ConstValue, FieldResult, FieldValue, ObjectType, ResponsePath, TypeRef};

use crate::{
    context::{ExecutionContext, FieldPlan, Scope},
    execute::CompletionResult,
    GraphqlError, IncrementalResult, SubsequentPayload,
};

/// Work split off a payload, executed once that payload is complete.
pub(crate) enum Workload<'a> {
    Defer(DeferredWork<'a>),
    Stream(StreamWork<'a>),
}

impl Workload<'_> {
    pub(crate) fn path(&self) -> &ResponsePath {
        match self {
            Workload::Defer(work) => &work.path,
            Workload::Stream(work) => &work.path,
        }
    }
}

pub(crate) struct DeferredWork<'a> {
    pub(crate) label: Option<String>,
    pub(crate) path: ResponsePath,
    pub(crate) object_type: &'a ObjectType,
    pub(crate) source: Arc<FieldValue>,
    pub(crate) selection_set: &'a ast::SelectionSet,
    pub(crate) ancestors: Vec<&'a str>,
}

/// Remaining items of a `@stream` list, sent one payload per item.
pub(crate) struct StreamWork<'a> {
    pub(crate) label: Option<String>,
    pub(crate) plan: FieldPlan<'a>,
    pub(crate) item_type: TypeRef,
    /// Path of the list field.
    pub(crate) path: ResponsePath,
    pub(crate) next_index: usize,
    pub(crate) items: StreamItems,
}

pub(crate) enum StreamItems {
    Iter(std::vec::IntoIter<FieldValue>),
    Source(BoxStream<'static, FieldResult<FieldValue>>),
}

struct WorkloadOutcome<'a> {
    /// `None` once a stream is exhausted.
    result: Option<IncrementalResult>,
    workloads: Vec<Workload<'a>>,
}

impl<'a> ExecutionContext<'a> {
    /// Runs the workloads of the initial payload and everything they spawn.
    ///
    /// Workloads run concurrently; a payload is emitted as soon as its workload is done and
    /// the last one carries `hasNext: false`.
    pub(crate) fn subsequent_payloads<'s>(
        &'s self,
        workloads: Vec<Workload<'a>>,
    ) -> impl Stream<Item = SubsequentPayload> + Send + 's
    where
        'a: 's,
    {
        async_stream::stream! {
            let mut pending: FuturesUnordered<_> = workloads
                .into_iter()
                .map(|workload| self.run_workload(workload))
                .collect();

            while let Some(outcome) = pending.next().await {
                for workload in outcome.workloads {
                    pending.push(self.run_workload(workload));
                }

                let has_next = !pending.is_empty();

                match outcome.result {
                    Some(result) => {
                        yield SubsequentPayload {
                            incremental: vec![result],
                            has_next,
                        };
                    }
                    None if !has_next => {
                        yield SubsequentPayload {
                            incremental: Vec::new(),
                            has_next,
                        };
                    }
                    None => {}
                }
            }
        }
    }

    async fn run_workload(&self, workload: Workload<'a>) -> WorkloadOutcome<'a> {
        match workload {
            Workload::Defer(work) => self.run_deferred(work).await,
            Workload::Stream(work) => self.run_stream(work).await,
        }
    }

    async fn run_deferred(&self, work: DeferredWork<'a>) -> WorkloadOutcome<'a> {
        tracing::trace!(path = ?work.path, label = work.label.as_deref(), "executing deferred fragment");

        let scope = Scope::new();
        let data = match self.execute_deferred_fragment(&scope, &work).await {
            Ok(data) => data,
            Err(error) => {
                scope.add_error(error, &work.path);
                ConstValue::Null
            }
        };

        let (errors, workloads) = scope.finish();

        WorkloadOutcome {
            result: Some(IncrementalResult::Defer {
                data,
                path: work.path.to_vec(),
                label: work.label,
                errors,
            }),
            workloads,
        }
    }

    async fn execute_deferred_fragment(&self, scope: &Scope<'a>, work: &DeferredWork<'a>) -> CompletionResult {
        let collected = self
            .collect_fields_within(work.object_type, [work.selection_set], &work.ancestors)
            .map_err(|error| error.with_path(&work.path))?;

        self.defer_fragments(scope, work.object_type, &work.source, &work.path, collected.deferred);

        let fields = self
            .execute_fields(scope, work.object_type, &work.source, &work.path, collected.fields)
            .await?;

        Ok(ConstValue::Object(fields))
    }

    async fn run_stream(&self, mut work: StreamWork<'a>) -> WorkloadOutcome<'a> {
        let item_path = work.path.child(work.next_index, None);

        let next = match &mut work.items {
            StreamItems::Iter(items) => Ok(items.next()),
            StreamItems::Source(source) => self.with_abort(async { source.next().await.transpose() }).await,
        };

        let item = match next {
            Ok(Some(item)) => item,
            Ok(None) => {
                return WorkloadOutcome {
                    result: None,
                    workloads: Vec::new(),
                }
            }
            Err(error) => {
                let error = GraphqlError::from_field_error(error, &work.plan.field_nodes, &item_path);
                return WorkloadOutcome {
                    result: Some(IncrementalResult::Stream {
                        items: None,
                        path: item_path.to_vec(),
                        label: work.label,
                        errors: vec![error],
                    }),
                    workloads: Vec::new(),
                };
            }
        };

        let scope = Scope::new();
        let completed = self
            .complete_list_item_value(&scope, &work.plan, &work.item_type, item_path.clone(), item)
            .await;
        let (mut errors, mut workloads) = scope.finish();

        match completed {
            Ok(item) => {
                let result = IncrementalResult::Stream {
                    items: Some(vec![item]),
                    path: item_path.to_vec(),
                    label: work.label.clone(),
                    errors,
                };

                work.next_index += 1;
                workloads.push(Workload::Stream(work));

                WorkloadOutcome {
                    result: Some(result),
                    workloads,
                }
            }
            // A non-null item failed: the stream ends with this error.
            Err(error) => {
                errors.push(error);

                WorkloadOutcome {
                    result: Some(IncrementalResult::Stream {
                        items: None,
                        path: item_path.to_vec(),
                        label: work.label,
                        errors,
                    }),
                    workloads: Vec::new(),
                }
            }
        }
    }
}
