#![allow(unused_crate_dependencies)]

use std::{
    sync::{Arc, Mutex, Once},
    time::Duration,
};

use graphql_toolkit_executor::{execute, ExecutionArgs, Response};
use pretty_assertions::assert_eq;
use schema::{
    add_resolvers_to_schema, build_schema, AddResolversOptions, ConstValue, FieldError, FieldValue, Resolver,
    ResolverMap, Schema, TypeResolver,
};
use serde_json::json;

fn setup_logging() {
    static LOGGING: Once = Once::new();
    LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("graphql_toolkit_executor=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init();
    });
}

fn schema_with(sdl: &str, resolvers: ResolverMap) -> Schema {
    let schema = build_schema(sdl).unwrap();
    add_resolvers_to_schema(&schema, &resolvers, AddResolversOptions::default()).unwrap()
}

fn root(value: serde_json::Value) -> FieldValue {
    FieldValue::value(ConstValue::from_json(value).unwrap())
}

async fn run(args: ExecutionArgs) -> Response {
    setup_logging();
    execute(args).await.into_single().unwrap()
}

async fn run_query(schema: &Schema, query: &str) -> serde_json::Value {
    run(ExecutionArgs::parse(schema.clone(), query).unwrap()).await.into_json()
}

fn empty_object(_: schema::ResolverContext<'_>) -> Result<FieldValue, FieldError> {
    Ok(FieldValue::value(ConstValue::Object(Default::default())))
}

#[tokio::test]
async fn properties_of_the_root_value_are_resolved_by_default() {
    let schema = build_schema("type Query { hello: String nested: Nested } type Nested { a: Int b: [Int] }").unwrap();
    let args = ExecutionArgs::parse(schema, "{ hello nested { a b } alias: hello }")
        .unwrap()
        .root_value(root(json!({ "hello": "world", "nested": { "a": 1, "b": [1, 2] } })));

    let response = run(args).await;

    assert_eq!(
        response.into_json(),
        json!({ "data": { "hello": "world", "nested": { "a": 1, "b": [1, 2] }, "alias": "world" } })
    );
}

#[tokio::test]
async fn sibling_fields_survive_an_error() {
    let resolvers = ResolverMap::new()
        .field("Query", "a", Resolver::sync(|_| Ok(FieldValue::value("a"))))
        .field(
            "Query",
            "b",
            Resolver::sync(|_| Err(FieldError::new("b failed").with_extension("code", "B_FAILED"))),
        )
        .field("Query", "c", Resolver::sync(|_| Ok(FieldValue::value("c"))));
    let schema = schema_with("type Query { a: String b: String c: String }", resolvers);

    let response = run_query(&schema, "{ a b c }").await;

    assert_eq!(
        response,
        json!({
            "data": { "a": "a", "b": null, "c": "c" },
            "errors": [{
                "message": "b failed",
                "locations": [{ "line": 1, "column": 5 }],
                "path": ["b"],
                "extensions": { "code": "B_FAILED" }
            }]
        })
    );
}

#[tokio::test]
async fn errors_propagate_to_the_nearest_nullable_field() {
    let resolvers = ResolverMap::new()
        .field("Query", "nullableA", Resolver::sync(empty_object))
        .field("A", "nullableA", Resolver::sync(empty_object))
        .field("A", "nonNullA", Resolver::sync(empty_object))
        .field("A", "throws", Resolver::sync(|_| Err(FieldError::new("Catch me if you can"))));
    let schema = schema_with(
        "type Query { nullableA: A } type A { nullableA: A nonNullA: A! throws: String! }",
        resolvers,
    );

    let response = run(
        ExecutionArgs::parse(
            schema,
            "{ nullableA { aliasedA: nullableA { nonNullA { anotherA: nonNullA { throws } } } } }",
        )
        .unwrap(),
    )
    .await;

    assert_eq!(response.data.unwrap().into_json().unwrap(), json!({ "nullableA": { "aliasedA": null } }));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Catch me if you can");
    assert_eq!(
        serde_json::to_value(&response.errors[0].path).unwrap(),
        json!(["nullableA", "aliasedA", "nonNullA", "anotherA", "throws"])
    );
}

#[tokio::test]
async fn null_for_a_non_null_field_is_an_error() {
    let schema = build_schema("type Query { a: A } type A { b: String! }").unwrap();
    let args = ExecutionArgs::parse(schema, "{ a { b } }")
        .unwrap()
        .root_value(root(json!({ "a": { "b": null } })));

    let response = run(args).await.into_json();

    assert_eq!(response["data"], json!({ "a": null }));
    assert_eq!(
        response["errors"][0]["message"],
        json!("Cannot return null for non-nullable field A.b.")
    );
    assert_eq!(response["errors"][0]["path"], json!(["a", "b"]));
}

#[tokio::test]
async fn a_non_null_root_field_nulls_the_whole_data() {
    let resolvers = ResolverMap::new().field("Query", "a", Resolver::sync(|_| Err(FieldError::new("boom"))));
    let schema = schema_with("type Query { a: String! b: String }", resolvers);

    let response = run_query(&schema, "{ a b }").await;

    assert_eq!(response["data"], json!(null));
    assert_eq!(response["errors"][0]["message"], json!("boom"));
}

#[tokio::test]
async fn mutation_fields_run_serially() {
    let order = Arc::new(Mutex::new(Vec::new()));

    let slow = {
        let order = order.clone();
        Resolver::new(move |_| {
            let order = order.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                order.lock().unwrap().push("first");
                Ok(FieldValue::value(1))
            })
        })
    };
    let fast = {
        let order = order.clone();
        Resolver::sync(move |_| {
            order.lock().unwrap().push("second");
            Ok(FieldValue::value(2))
        })
    };

    let resolvers = ResolverMap::new()
        .field("Mutation", "first", slow)
        .field("Mutation", "second", fast);
    let schema = schema_with(
        "type Query { noop: String } type Mutation { first: Int second: Int }",
        resolvers,
    );

    let response = run_query(&schema, "mutation { first second }").await;

    assert_eq!(response, json!({ "data": { "first": 1, "second": 2 } }));
    assert_eq!(*order.lock().unwrap(), ["first", "second"]);
}

#[tokio::test]
async fn a_null_in_a_non_null_mutation_field_stops_the_following_ones() {
    let sync_called = Arc::new(Mutex::new(false));

    let async_null_error = Resolver::new(|_| {
        Box::pin(async {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            Ok(FieldValue::null())
        })
    });
    let sync_null_error = {
        let sync_called = sync_called.clone();
        Resolver::sync(move |_| {
            *sync_called.lock().unwrap() = true;
            Ok(FieldValue::null())
        })
    };

    let resolvers = ResolverMap::new()
        .field("Mutation", "asyncNullError", async_null_error)
        .field("Mutation", "syncNullError", sync_null_error);
    let schema = schema_with(
        "type Query { noop: String } type Mutation { asyncNullError: Int! syncNullError: Int! }",
        resolvers,
    );

    let response = run_query(&schema, "mutation { asyncNullError syncNullError }").await;

    assert_eq!(
        response,
        json!({
            "data": null,
            "errors": [{
                "message": "Cannot return null for non-nullable field Mutation.asyncNullError.",
                "locations": [{ "line": 1, "column": 12 }],
                "path": ["asyncNullError"]
            }]
        })
    );
    assert!(!*sync_called.lock().unwrap());
}

#[tokio::test]
async fn variables_and_arguments_are_coerced() {
    let double = Resolver::sync(|ctx| {
        let n = ctx.arg("n").and_then(|n| match n {
            ConstValue::Number(n) => n.as_i64(),
            _ => None,
        });
        Ok(FieldValue::value(n.unwrap_or_default() * 2))
    });
    let schema = schema_with(
        "type Query { double(n: Int! = 21): Int }",
        ResolverMap::new().field("Query", "double", double),
    );

    let mut variables = indexmap::IndexMap::new();
    variables.insert(schema::Name::new("n"), ConstValue::from(4));
    let args = ExecutionArgs::parse(schema.clone(), "query ($n: Int!) { double(n: $n) default: double }")
        .unwrap()
        .variable_values(variables);

    assert_eq!(
        run(args).await.into_json(),
        json!({ "data": { "double": 8, "default": 42 } })
    );

    let response = run(ExecutionArgs::parse(schema.clone(), "query ($n: Int!) { double(n: $n) }").unwrap()).await;
    assert_eq!(response.data, None);
    assert_eq!(
        response.errors[0].message,
        "Variable \"$n\" of required type \"Int!\" was not provided."
    );

    let mut variables = indexmap::IndexMap::new();
    variables.insert(schema::Name::new("n"), ConstValue::from("four"));
    let args = ExecutionArgs::parse(schema, "query ($n: Int!) { double(n: $n) }")
        .unwrap()
        .variable_values(variables);
    let response = run(args).await;
    assert_eq!(response.data, None);
    assert!(response.errors[0]
        .message
        .starts_with("Variable \"$n\" got invalid value \"four\"; "));
}

#[tokio::test]
async fn abstract_types_resolve_through_typename_and_type_resolvers() {
    let sdl = r"
        interface Pet { name: String }
        type Dog implements Pet { name: String barks: Boolean }
        type Cat implements Pet { name: String meows: Boolean }
        union Any = Dog | Cat
        type Query { pets: [Pet] any: [Any] }
    ";
    let query = "{ pets { name ... on Dog { barks } ... on Cat { meows } } any { __typename } }";
    let root_value = json!({
        "pets": [
            { "__typename": "Dog", "name": "Odie", "barks": true },
            { "__typename": "Cat", "name": "Garfield", "meows": false }
        ],
        "any": [{ "kind": "cat" }]
    });

    let resolve_any = TypeResolver::sync(|ctx| {
        let kind = match ctx.value.as_value() {
            Some(ConstValue::Object(object)) => object.get("kind").cloned(),
            _ => None,
        };
        Ok(match kind {
            Some(ConstValue::String(kind)) if kind == "cat" => Some("Cat".to_string()),
            _ => Some("Dog".to_string()),
        })
    });
    let schema = schema_with(sdl, ResolverMap::new().resolve_type("Any", resolve_any));

    let args = ExecutionArgs::parse(schema, query).unwrap().root_value(root(root_value));

    assert_eq!(
        run(args).await.into_json(),
        json!({
            "data": {
                "pets": [
                    { "name": "Odie", "barks": true },
                    { "name": "Garfield", "meows": false }
                ],
                "any": [{ "__typename": "Cat" }]
            }
        })
    );
}

#[tokio::test]
async fn unresolvable_abstract_types_are_field_errors() {
    let schema = build_schema(
        "interface Pet { name: String } type Dog implements Pet { name: String } type Query { pet: Pet }",
    )
    .unwrap();
    let args = ExecutionArgs::parse(schema, "{ pet { name } }")
        .unwrap()
        .root_value(root(json!({ "pet": { "name": "Odie" } })));

    let response = run(args).await.into_json();

    assert_eq!(response["data"], json!({ "pet": null }));
    assert_eq!(
        response["errors"][0]["message"],
        json!("Abstract type \"Pet\" must resolve to an Object type at runtime for field \"Query.pet\". Either the \"Pet\" type should provide a \"resolveType\" function or each possible type should provide an \"isTypeOf\" function.")
    );
}

#[tokio::test]
async fn list_items_are_completed_independently() {
    let items = Resolver::sync(|_| {
        Ok(FieldValue::list([
            FieldValue::value(1),
            FieldValue::null(),
            FieldValue::value(3),
        ]))
    });
    let schema = schema_with(
        "type Query { nullable: [Int] nonNullItems: [Int!] }",
        ResolverMap::new()
            .field("Query", "nullable", items.clone())
            .field("Query", "nonNullItems", items),
    );

    let response = run_query(&schema, "{ nullable nonNullItems }").await;

    assert_eq!(response["data"], json!({ "nullable": [1, null, 3], "nonNullItems": null }));
    assert_eq!(response["errors"][0]["path"], json!(["nonNullItems", 1]));

    let schema = build_schema("type Query { list: [Int] }").unwrap();
    let args = ExecutionArgs::parse(schema, "{ list }")
        .unwrap()
        .root_value(root(json!({ "list": 1 })));
    let response = run(args).await.into_json();

    assert_eq!(response["data"], json!({ "list": null }));
    assert!(response["errors"][0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Expected Iterable"));
}

#[tokio::test]
async fn enum_values_are_serialized_through_their_internal_value() {
    let schema = schema_with(
        "enum Color { RED GREEN } type Query { favorite: Color other: Color }",
        ResolverMap::new()
            .enum_values("Color", [("RED", ConstValue::from(0)), ("GREEN", ConstValue::from(1))])
            .field("Query", "favorite", Resolver::sync(|_| Ok(FieldValue::value(1))))
            .field("Query", "other", Resolver::sync(|_| Ok(FieldValue::value(7)))),
    );

    let response = run_query(&schema, "{ favorite other }").await;

    assert_eq!(response["data"], json!({ "favorite": "GREEN", "other": null }));
    assert_eq!(
        response["errors"][0]["message"],
        json!("Enum \"Color\" cannot represent value: 7")
    );
}

#[tokio::test]
async fn skip_and_include_directives() {
    let schema = build_schema("type Query { a: String b: String }").unwrap();
    let mut variables = indexmap::IndexMap::new();
    variables.insert(schema::Name::new("yes"), ConstValue::Boolean(true));

    let args = ExecutionArgs::parse(schema, "query ($yes: Boolean!) { a @skip(if: $yes) b @include(if: $yes) }")
        .unwrap()
        .variable_values(variables)
        .root_value(root(json!({ "a": "a", "b": "b" })));

    assert_eq!(run(args).await.into_json(), json!({ "data": { "b": "b" } }));
}

#[tokio::test]
async fn operation_selection_errors() {
    let schema = build_schema("type Query { a: String }").unwrap();

    let response = run(ExecutionArgs::parse(schema.clone(), "query A { a } query B { a }").unwrap()).await;
    assert_eq!(
        response.into_json(),
        json!({ "errors": [{ "message": "Must provide operation name if query contains multiple operations." }] })
    );

    let response = run(
        ExecutionArgs::parse(schema.clone(), "query A { a }")
            .unwrap()
            .operation_name("C"),
    )
    .await;
    assert_eq!(
        response.into_json(),
        json!({ "errors": [{ "message": "Unknown operation named \"C\"." }] })
    );

    let response = run(ExecutionArgs::parse(schema, "mutation { a }").unwrap()).await;
    assert_eq!(response.data, Some(ConstValue::Null));
    assert_eq!(
        response.errors[0].message,
        "Schema is not configured to execute mutation operation."
    );
}

#[tokio::test]
async fn context_value_reaches_resolvers() {
    struct Viewer(&'static str);

    let schema = schema_with(
        "type Query { me: String }",
        ResolverMap::new().field(
            "Query",
            "me",
            Resolver::sync(|ctx| Ok(FieldValue::value(ctx.data::<Viewer>().map(|viewer| viewer.0).unwrap_or_default()))),
        ),
    );

    let args = ExecutionArgs::parse(schema, "{ me }").unwrap().context_value(Viewer("jane"));

    assert_eq!(run(args).await.into_json(), json!({ "data": { "me": "jane" } }));
}

#[tokio::test]
async fn typename_of_the_root_type() {
    let schema = build_schema("type Query { a: String }").unwrap();
    assert_eq!(
        run_query(&schema, "{ __typename }").await,
        json!({ "data": { "__typename": "Query" } })
    );
}
