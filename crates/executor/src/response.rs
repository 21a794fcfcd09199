use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures_util::{stream::BoxStream, Stream};
use schema::{AbortController, ConstValue, PathSegment};

use crate::GraphqlError;

/// Result of a single execution, or of one subscription event.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Response {
    /// `None` when the request failed before execution started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ConstValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl Response {
    pub fn from_data(data: ConstValue, errors: Vec<GraphqlError>) -> Self {
        Response {
            data: Some(data),
            errors,
        }
    }

    pub fn from_errors(errors: Vec<GraphqlError>) -> Self {
        Response { data: None, errors }
    }

    pub fn into_json(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Payload of a response using `@defer` or `@stream`.
///
/// A deferred fragment's data is complete on its own: fields it shares with the initial
/// payload are sent again rather than deduplicated.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum StreamingPayload {
    Initial(InitialPayload),
    Subsequent(SubsequentPayload),
}

impl StreamingPayload {
    pub fn has_next(&self) -> bool {
        match self {
            StreamingPayload::Initial(payload) => payload.has_next,
            StreamingPayload::Subsequent(payload) => payload.has_next,
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayload {
    pub data: ConstValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsequentPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incremental: Vec<IncrementalResult>,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum IncrementalResult {
    Defer {
        data: ConstValue,
        path: Vec<PathSegment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<GraphqlError>,
    },
    Stream {
        /// `null` when an item failed and the error propagated up to the list item.
        items: Option<Vec<ConstValue>>,
        path: Vec<PathSegment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<GraphqlError>,
    },
}

impl IncrementalResult {
    pub fn path(&self) -> &[PathSegment] {
        match self {
            IncrementalResult::Defer { path, .. } | IncrementalResult::Stream { path, .. } => path,
        }
    }
}

/// What `execute` produced.
pub enum ExecutionOutcome {
    Single(Response),
    Incremental(ResponseStream<StreamingPayload>),
}

impl ExecutionOutcome {
    /// The single response, if no incremental delivery happened.
    pub fn into_single(self) -> Option<Response> {
        match self {
            ExecutionOutcome::Single(response) => Some(response),
            ExecutionOutcome::Incremental(_) => None,
        }
    }

    pub fn into_incremental(self) -> Option<ResponseStream<StreamingPayload>> {
        match self {
            ExecutionOutcome::Single(_) => None,
            ExecutionOutcome::Incremental(stream) => Some(stream),
        }
    }
}

impl std::fmt::Debug for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionOutcome::Single(response) => f.debug_tuple("Single").field(response).finish(),
            ExecutionOutcome::Incremental(_) => f.write_str("Incremental"),
        }
    }
}

/// What `subscribe` produced: a setup failure or one response per source event.
pub enum SubscriptionOutcome {
    Error(Response),
    Stream(ResponseStream<Response>),
}

impl SubscriptionOutcome {
    pub fn into_stream(self) -> Option<ResponseStream<Response>> {
        match self {
            SubscriptionOutcome::Error(_) => None,
            SubscriptionOutcome::Stream(stream) => Some(stream),
        }
    }

    pub fn into_error(self) -> Option<Response> {
        match self {
            SubscriptionOutcome::Error(response) => Some(response),
            SubscriptionOutcome::Stream(_) => None,
        }
    }
}

impl std::fmt::Debug for SubscriptionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionOutcome::Error(response) => f.debug_tuple("Error").field(response).finish(),
            SubscriptionOutcome::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A stream of payloads owning the request it was produced from.
///
/// Closing or dropping it aborts the request signal and drops any pending resolver and the
/// underlying source stream. A closed stream only yields `None`. A signal given through
/// [`ExecutionArgs::signal`](crate::ExecutionArgs::signal) is left untouched by closing.
pub struct ResponseStream<T> {
    inner: Option<BoxStream<'static, T>>,
    controller: Arc<AbortController>,
}

impl<T> ResponseStream<T> {
    pub(crate) fn new(inner: BoxStream<'static, T>, controller: Arc<AbortController>) -> Self {
        ResponseStream {
            inner: Some(inner),
            controller,
        }
    }

    /// Stops the stream. Calling it more than once is a no-op.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!("response stream closed");
            self.controller.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = &mut *self;

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            poll => poll,
        }
    }
}

impl<T> Drop for ResponseStream<T> {
    fn drop(&mut self) {
        self.controller.abort();
    }
}
