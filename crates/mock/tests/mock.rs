#![allow(unused_crate_dependencies)]

use std::sync::Arc;

use executor::{execute, ExecutionArgs};
use graphql_toolkit_mock::{
    add_mocks_to_schema, AddMocksOptions, GetArgs, MockStore, Mocks, SetArgs, StoreValue, ROOT_KEY,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use schema::{
    add_resolvers_to_schema, build_schema, AddResolversOptions, ConstValue, FieldValue, Resolver, ResolverMap, Schema,
};
use serde_json::json;

const SDL: &str = indoc! {r#"
    type Query {
      viewer: User!
      search(term: String!): [SearchResult!]!
      version: String
    }

    type Mutation {
      rename(name: String!): User!
    }

    type User {
      id: ID!
      name: String!
      role: Role!
      friends: [User!]!
    }

    type Post {
      id: ID!
      title: String!
    }

    union SearchResult = User | Post

    enum Role {
      ADMIN
      MEMBER
    }
"#};

fn schema() -> Schema {
    build_schema(SDL).unwrap()
}

fn const_value(value: serde_json::Value) -> ConstValue {
    ConstValue::from_json(value).unwrap()
}

async fn run(schema: &Schema, query: &str) -> serde_json::Value {
    execute(ExecutionArgs::parse(schema.clone(), query).unwrap())
        .await
        .into_single()
        .unwrap()
        .into_json()
}

#[tokio::test]
async fn mocked_schemas_answer_consistently() {
    let store = Arc::new(MockStore::new(schema()));
    let schema = add_mocks_to_schema(store.clone(), AddMocksOptions::default()).unwrap();

    let query = "{ viewer { id name role friends { id name } } }";
    let first = run(&schema, query).await;
    let second = run(&schema, query).await;

    assert_eq!(first, second);

    let viewer = &first["data"]["viewer"];
    assert_eq!(viewer["name"], json!("Hello World"));
    assert!(["ADMIN", "MEMBER"].contains(&viewer["role"].as_str().unwrap()));
    assert_eq!(viewer["friends"].as_array().unwrap().len(), 2);

    let id = viewer["id"].as_str().unwrap();
    assert!(store.has("User", id));
}

#[tokio::test]
async fn stored_values_are_served() {
    let store = Arc::new(MockStore::new(schema()));
    store
        .set(SetArgs::field(
            "Query",
            ROOT_KEY,
            "viewer",
            const_value(json!({ "id": "me", "name": "Ada", "role": "ADMIN", "friends": [] })),
        ))
        .unwrap();

    let schema = add_mocks_to_schema(store, AddMocksOptions::default()).unwrap();

    assert_eq!(
        run(&schema, "{ viewer { id name role friends { id } } }").await,
        json!({ "data": { "viewer": { "id": "me", "name": "Ada", "role": "ADMIN", "friends": [] } } })
    );
}

#[tokio::test]
async fn abstract_fields_resolve_to_stored_entities() {
    let store = Arc::new(MockStore::new(schema()).with_mocks(Mocks::empty().mock("SearchResult", || {
        const_value(json!({ "__typename": "Post", "title": "Mocking" }))
    })));
    let schema = add_mocks_to_schema(store, AddMocksOptions::default()).unwrap();

    let response = run(
        &schema,
        r#"{ search(term: "mock") { __typename ... on Post { title } ... on User { name } } }"#,
    )
    .await;

    assert_eq!(
        response,
        json!({
            "data": {
                "search": [
                    { "__typename": "Post", "title": "Mocking" },
                    { "__typename": "Post", "title": "Mocking" }
                ]
            }
        })
    );
}

#[tokio::test]
async fn custom_resolvers_use_the_store() {
    let store = Arc::new(MockStore::new(schema()));

    let rename = {
        let store = store.clone();
        Resolver::sync(move |ctx| {
            let viewer = store.get(GetArgs::field("Query", ROOT_KEY, "viewer"))?;
            let StoreValue::Ref(viewer) = viewer else {
                return Ok(FieldValue::null());
            };

            let name = ctx.arg("name").cloned().unwrap_or(ConstValue::Null);
            store.set(SetArgs::ref_field(&viewer, "name", name))?;

            Ok(StoreValue::Ref(viewer).into())
        })
    };

    let schema = add_mocks_to_schema(
        store,
        AddMocksOptions {
            resolvers: ResolverMap::new().field("Mutation", "rename", rename),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(
        run(&schema, r#"mutation { rename(name: "Grace") { name } }"#).await,
        json!({ "data": { "rename": { "name": "Grace" } } })
    );
    assert_eq!(
        run(&schema, "{ viewer { name } }").await,
        json!({ "data": { "viewer": { "name": "Grace" } } })
    );
}

#[tokio::test]
async fn preserved_resolvers_take_precedence() {
    let resolvers = ResolverMap::new().field(
        "Query",
        "version",
        Resolver::sync(|_| Ok(FieldValue::value("1.0.0"))),
    );
    let schema = add_resolvers_to_schema(&schema(), &resolvers, AddResolversOptions::default()).unwrap();

    let store = Arc::new(MockStore::new(schema));

    let preserving = add_mocks_to_schema(
        store.clone(),
        AddMocksOptions {
            preserve_resolvers: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(
        run(&preserving, "{ version }").await,
        json!({ "data": { "version": "1.0.0" } })
    );

    let replacing = add_mocks_to_schema(store, AddMocksOptions::default()).unwrap();
    assert_eq!(
        run(&replacing, "{ version }").await,
        json!({ "data": { "version": "Hello World" } })
    );
}

#[tokio::test]
async fn mock_errors_become_field_errors() {
    let schema = build_schema("scalar Date type Query { today: Date }").unwrap();
    let store = Arc::new(MockStore::new(schema));
    let schema = add_mocks_to_schema(store, AddMocksOptions::default()).unwrap();

    let response = run(&schema, "{ today }").await;

    assert_eq!(response["data"], json!({ "today": null }));
    assert_eq!(
        response["errors"][0]["message"],
        json!("No mock defined for type \"Date\"")
    );
}
