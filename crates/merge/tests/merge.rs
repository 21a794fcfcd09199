#![allow(unused_crate_dependencies)]

use std::sync::Arc;

use executor::{execute, ExecutionArgs};
use graphql_toolkit_merge::{
    make_executable_schema, merge_candidates, merge_resolvers, merge_schemas, merge_type_defs, MergeError,
    MergeTypeCandidate, MergeTypeDefsConfig, Subschema, SubschemaMergeConfig, TypeMergeConfig, TypeMergingOptions,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use schema::{
    build_schema, print_document, ConstValue, Field, FieldValue, NamedType, ObjectType, Resolver, ResolverMap, Schema, TypeRef,
};
use serde_json::json;

async fn run(schema: Schema, query: &str) -> serde_json::Value {
    execute(ExecutionArgs::parse(schema, query).unwrap())
        .await
        .into_single()
        .unwrap()
        .into_json()
}

fn json_value(value: serde_json::Value) -> ConstValue {
    ConstValue::from_json(value).unwrap()
}

fn user(description: &str) -> NamedType {
    let mut user = ObjectType::new("User")
        .field(Field::new("id", TypeRef::non_null("ID")))
        .field({
            let mut name = Field::new("name", TypeRef::named("String"));
            name.description = Some(description.to_string());
            name
        });
    user.description = Some(description.to_string());
    NamedType::Object(user)
}

#[test]
fn field_level_canonical_claims_win_over_type_level_ones() {
    let candidates = vec![
        MergeTypeCandidate::new(user("accounts"))
            .with_source("accounts")
            .with_merge_config(TypeMergeConfig::default().with_canonical_field("name")),
        MergeTypeCandidate::new(user("profiles"))
            .with_source("profiles")
            .with_merge_config(TypeMergeConfig::canonical()),
        MergeTypeCandidate::new(user("reviews")).with_source("reviews"),
    ];

    let merged = merge_candidates("User", candidates, &TypeMergingOptions::default()).unwrap();

    assert_eq!(merged.description(), Some("profiles"));

    let fields = merged.fields().unwrap();
    assert_eq!(fields["name"].description.as_deref(), Some("accounts"));
    assert_eq!(fields["id"].description, None);
}

#[test]
fn multiple_field_level_claims_are_an_error() {
    let claim = || TypeMergeConfig::default().with_canonical_field("name");
    let candidates = vec![
        MergeTypeCandidate::new(user("a")).with_merge_config(claim()),
        MergeTypeCandidate::new(user("b")),
        MergeTypeCandidate::new(user("c")).with_merge_config(claim()),
    ];

    let error = merge_candidates("User", candidates, &TypeMergingOptions::default()).unwrap_err();
    assert_eq!(error, MergeError::MultipleCanonical("User.name".into()));
}

#[test]
fn custom_strategies_replace_the_defaults() {
    let options = TypeMergingOptions {
        type_candidate_merger: Some(Arc::new(|_: &[MergeTypeCandidate]| -> Result<usize, MergeError> { Ok(0) })),
        type_descriptions_merger: Some(Arc::new(|candidates: &[MergeTypeCandidate]| {
            let descriptions: Vec<_> = candidates.iter().filter_map(|candidate| candidate.ty.description()).collect();
            Some(descriptions.join(" + "))
        })),
        ..Default::default()
    };

    let merged = merge_candidates(
        "User",
        vec![
            MergeTypeCandidate::new(user("first")),
            MergeTypeCandidate::new(user("second")),
        ],
        &options,
    )
    .unwrap();

    // The chosen candidate moves last.
    assert_eq!(merged.description(), Some("second + first"));
    assert_eq!(merged.fields().unwrap()["name"].description.as_deref(), Some("first"));
}

#[test]
fn type_defs_with_directives_and_extensions() {
    let document = merge_type_defs(
        [
            indoc! {r#"
                directive @cache(maxAge: Int) on OBJECT | FIELD_DEFINITION

                type Query {
                  users: [User!]! @cache(maxAge: 10)
                }

                type User @cache(maxAge: 60) {
                  id: ID!
                }
            "#},
            indoc! {r#"
                directive @cache(maxAge: Int) on OBJECT | INTERFACE

                extend type User @cache(maxAge: 30) {
                  name: String
                }

                extend type Query {
                  user(id: ID!): User
                }
            "#},
        ],
        &MergeTypeDefsConfig::default(),
    )
    .unwrap();

    insta::assert_snapshot!(print_document(&document), @r###"
    directive @cache(maxAge: Int) on OBJECT | FIELD_DEFINITION | INTERFACE

    type Query {
      users: [User!]! @cache(maxAge: 10)
      user(id: ID!): User
    }

    type User @cache(maxAge: 30) {
      id: ID!
      name: String
    }

    schema {
      query: Query
    }
    "###);
}

#[test]
fn directive_definitions_must_agree() {
    let error = merge_type_defs(
        [
            "directive @cache(maxAge: Int) on OBJECT",
            "directive @cache(maxAge: String) on OBJECT",
        ],
        &MergeTypeDefsConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(error, MergeError::DirectiveDefinition { ref name, .. } if name == "cache"));
}

#[tokio::test]
async fn executable_schema_from_split_type_defs() {
    let books = ResolverMap::new().field(
        "Query",
        "books",
        Resolver::sync(|_| {
            Ok(FieldValue::list([FieldValue::value(json_value(json!({ "title": "Dune" })))]))
        }),
    );
    let authors = ResolverMap::new().field(
        "Query",
        "authors",
        Resolver::sync(|_| Ok(FieldValue::list([FieldValue::value(json_value(json!({ "name": "Herbert" })))]))),
    );

    let schema = make_executable_schema(
        [
            "type Query { books: [Book] } type Book { title: String }",
            "type Query { authors: [Author] } type Author { name: String }",
        ],
        [books, authors],
    )
    .unwrap();

    assert_eq!(
        run(schema, "{ books { title } authors { name } }").await,
        json!({ "data": { "books": [{ "title": "Dune" }], "authors": [{ "name": "Herbert" }] } })
    );
}

#[test]
fn later_resolver_maps_win() {
    let first = ResolverMap::new().field("Query", "a", Resolver::sync(|_| Ok(FieldValue::value(1))));
    let second = ResolverMap::new()
        .field("Query", "a", Resolver::sync(|_| Ok(FieldValue::value(2))))
        .field("Query", "b", Resolver::sync(|_| Ok(FieldValue::value(3))));

    let merged = merge_resolvers([first, second]);
    let query = &merged.objects["Query"];

    assert_eq!(query.fields.len(), 2);
    assert!(query.fields["a"].resolve.is_some());
}

#[tokio::test]
async fn subschemas_are_merged_under_default_root_names() {
    let accounts = build_schema(indoc! {r#"
        schema { query: AccountsQuery }

        type AccountsQuery { me: User }

        "An account"
        type User { id: ID! name: String }
    "#})
    .unwrap();

    let reviews = build_schema(indoc! {r#"
        type Query { topReviews: [Review!]! }

        type Review { body: String author: User }

        "A reviewer"
        type User { id: ID! reviews: [Review!] }
    "#})
    .unwrap();

    let merge_config = SubschemaMergeConfig::from_toml(
        r#"
        [User]
        canonical = true
        "#,
    )
    .unwrap();

    let resolvers = ResolverMap::new()
        .field(
            "Query",
            "me",
            Resolver::sync(|_| Ok(FieldValue::value(json_value(json!({ "id": "1", "name": "Ada" }))))),
        )
        .field(
            "Query",
            "topReviews",
            Resolver::sync(|_| {
                Ok(FieldValue::value(json_value(json!([
                    { "body": "Great", "author": { "id": "1", "name": "Ada" } }
                ]))))
            }),
        );

    let schema = merge_schemas(
        &[
            Subschema::new(accounts).with_name("accounts").with_merge_config(merge_config),
            Subschema::new(reviews).with_name("reviews"),
        ],
        ["extend type Query { version: String }"],
        [resolvers],
        &TypeMergingOptions::default(),
    )
    .unwrap();

    assert_eq!(schema.query_type.as_deref(), Some("Query"));

    let user = schema.get_type("User").unwrap();
    assert_eq!(user.description(), Some("An account"));
    let fields: Vec<_> = user.fields().unwrap().keys().map(|name| name.as_str()).collect();
    // Fields in order of first appearance, the canonical candidate coming last.
    assert_eq!(fields, ["id", "reviews", "name"]);

    let query_fields: Vec<_> = schema
        .query_type()
        .unwrap()
        .fields
        .keys()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(query_fields, ["me", "topReviews", "version"]);

    assert_eq!(
        run(schema, "{ me { name } topReviews { body author { id name } } }").await,
        json!({
            "data": {
                "me": { "name": "Ada" },
                "topReviews": [{ "body": "Great", "author": { "id": "1", "name": "Ada" } }]
            }
        })
    );
}

#[test]
fn subschema_category_conflicts_fail_the_merge() {
    let first = build_schema("type Query { a: Thing } type Thing { id: ID }").unwrap();
    let second = build_schema("type Query { b: Thing } enum Thing { A }").unwrap();

    let error = merge_schemas(
        &[Subschema::new(first), Subschema::new(second)],
        Vec::<&str>::new(),
        [],
        &TypeMergingOptions::default(),
    )
    .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Cannot merge different type categories into common type Thing: found object and enum."
    );
}
