#![allow(unused_crate_dependencies)]

use std::sync::{Arc, Mutex};

use futures::{channel::mpsc, StreamExt};
use graphql_toolkit_executor::{create_source_event_stream, subscribe, ExecutionArgs, Response};
use pretty_assertions::assert_eq;
use schema::{
    add_resolvers_to_schema, build_schema, AbortController, AddResolversOptions, ConstValue, FieldError,
    FieldResult, FieldValue, Resolver, ResolverMap, Schema,
};
use serde_json::json;

const SDL: &str = r"
    type Query { noop: String }
    type Subscription { counter: Int other: Int notAStream: Int }
";

fn echo_event() -> Resolver {
    Resolver::sync(|ctx| Ok(FieldValue::value(ctx.source.as_value().cloned().unwrap_or(ConstValue::Null))))
}

fn schema(counter: Resolver) -> Schema {
    let resolvers = ResolverMap::new()
        .subscription("Subscription", "counter", counter, Some(echo_event()))
        .subscription(
            "Subscription",
            "notAStream",
            Resolver::sync(|_| Ok(FieldValue::value(1))),
            None,
        );

    add_resolvers_to_schema(&build_schema(SDL).unwrap(), &resolvers, AddResolversOptions::default()).unwrap()
}

fn events(events: Vec<FieldResult<FieldValue>>) -> Resolver {
    let events = Arc::new(Mutex::new(Some(events)));
    Resolver::sync(move |_| {
        let events = events.lock().unwrap().take().unwrap_or_default();
        Ok(FieldValue::stream(futures::stream::iter(events)))
    })
}

/// Resolver subscribing to the receiving end of a channel, once.
fn channel() -> (mpsc::UnboundedSender<FieldResult<FieldValue>>, Resolver) {
    let (sender, receiver) = mpsc::unbounded();
    let receiver = Arc::new(Mutex::new(Some(receiver)));

    let resolver = Resolver::sync(move |_| {
        let receiver = receiver.lock().unwrap().take().ok_or("already subscribed")?;
        Ok(FieldValue::stream(receiver))
    });

    (sender, resolver)
}

async fn setup_error(schema: Schema, query: &str) -> serde_json::Value {
    subscribe(ExecutionArgs::parse(schema, query).unwrap())
        .await
        .into_error()
        .unwrap()
        .into_json()
}

#[tokio::test]
async fn every_event_is_executed_in_order() {
    let counter = events((1..=3).map(|n| Ok(FieldValue::value(n))).collect());
    let stream = subscribe(ExecutionArgs::parse(schema(counter), "subscription { counter }").unwrap())
        .await
        .into_stream()
        .unwrap();

    let responses: Vec<_> = stream.map(Response::into_json).collect().await;

    assert_eq!(
        responses,
        [
            json!({ "data": { "counter": 1 } }),
            json!({ "data": { "counter": 2 } }),
            json!({ "data": { "counter": 3 } }),
        ]
    );
}

#[tokio::test]
async fn published_events_are_delivered_until_closed() {
    let (sender, counter) = channel();
    let mut stream = subscribe(ExecutionArgs::parse(schema(counter), "subscription { value: counter }").unwrap())
        .await
        .into_stream()
        .unwrap();

    sender.unbounded_send(Ok(FieldValue::value(1))).unwrap();
    sender.unbounded_send(Ok(FieldValue::value(2))).unwrap();

    assert_eq!(stream.next().await.unwrap().into_json(), json!({ "data": { "value": 1 } }));
    assert_eq!(stream.next().await.unwrap().into_json(), json!({ "data": { "value": 2 } }));

    stream.close();
    stream.close();

    assert!(stream.next().await.is_none());
    assert!(sender.unbounded_send(Ok(FieldValue::value(3))).is_err());
}

#[tokio::test]
async fn external_abort_ends_the_stream() {
    let (sender, counter) = channel();
    let controller = AbortController::new();
    let args = ExecutionArgs::parse(schema(counter), "subscription { counter }")
        .unwrap()
        .signal(controller.signal());

    let mut stream = subscribe(args).await.into_stream().unwrap();

    sender.unbounded_send(Ok(FieldValue::value(1))).unwrap();
    assert_eq!(stream.next().await.unwrap().into_json(), json!({ "data": { "counter": 1 } }));

    controller.abort();

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn closing_the_stream_leaves_the_external_signal_alone() {
    let (sender, counter) = channel();
    let controller = AbortController::new();
    let args = ExecutionArgs::parse(schema(counter), "subscription { counter }")
        .unwrap()
        .signal(controller.signal());

    let mut stream = subscribe(args).await.into_stream().unwrap();

    sender.unbounded_send(Ok(FieldValue::value(1))).unwrap();
    assert_eq!(stream.next().await.unwrap().into_json(), json!({ "data": { "counter": 1 } }));

    stream.close();

    assert!(stream.next().await.is_none());
    assert!(!controller.signal().is_aborted());
}

#[tokio::test]
async fn source_error_is_reported_and_ends_the_stream() {
    let counter = events(vec![Ok(FieldValue::value(1)), Err(FieldError::new("source failed")), Ok(FieldValue::value(2))]);
    let stream = subscribe(ExecutionArgs::parse(schema(counter), "subscription { counter }").unwrap())
        .await
        .into_stream()
        .unwrap();

    let responses: Vec<_> = stream.map(Response::into_json).collect().await;

    assert_eq!(
        responses,
        [
            json!({ "data": { "counter": 1 } }),
            json!({ "errors": [{ "message": "source failed" }] }),
        ]
    );
}

#[tokio::test]
async fn setup_errors() {
    let schema = schema(events(Vec::new()));

    assert_eq!(
        setup_error(schema.clone(), "subscription { counter other }").await,
        json!({
            "errors": [{
                "message": "Anonymous Subscription must select only one top level field.",
                "locations": [{ "line": 1, "column": 1 }]
            }]
        })
    );

    let response = setup_error(schema.clone(), "subscription Named { counter other }").await;
    assert_eq!(
        response["errors"][0]["message"],
        json!("Subscription \"Named\" must select only one top level field.")
    );

    let response = setup_error(schema.clone(), "subscription { notAStream }").await;
    assert_eq!(
        response["errors"][0]["message"],
        json!("Subscription field must return Async Iterable. Received: 1.")
    );
    assert_eq!(response["errors"][0]["path"], json!(["notAStream"]));

    let response = setup_error(schema, "subscription { missing }").await;
    assert_eq!(
        response["errors"][0]["message"],
        json!("The subscription field \"missing\" is not defined.")
    );

    let schema = build_schema("type Query { noop: String }").unwrap();
    let response = setup_error(schema, "subscription { counter }").await;
    assert_eq!(
        response["errors"][0]["message"],
        json!("Schema is not configured to execute subscription operation.")
    );
}

#[tokio::test]
async fn failing_subscribe_resolver_is_a_setup_error() {
    let counter = Resolver::sync(|_| Err(FieldError::new("not allowed")));
    let response = setup_error(schema(counter), "subscription { counter }").await;

    assert_eq!(
        response,
        json!({
            "errors": [{
                "message": "not allowed",
                "locations": [{ "line": 1, "column": 16 }],
                "path": ["counter"]
            }]
        })
    );
}

#[tokio::test]
async fn source_event_stream_yields_raw_events() {
    let counter = events(vec![Ok(FieldValue::value("a")), Ok(FieldValue::value("b"))]);
    let stream = create_source_event_stream(ExecutionArgs::parse(schema(counter), "subscription { counter }").unwrap())
        .await
        .unwrap();

    let events: Vec<_> = stream
        .map(|event| event.unwrap().as_value().cloned().unwrap())
        .collect()
        .await;

    assert_eq!(events, [ConstValue::from("a"), ConstValue::from("b")]);
}
