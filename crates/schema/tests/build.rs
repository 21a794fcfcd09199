#![allow(unused_crate_dependencies)]

use graphql_toolkit_schema::{build_schema, NamedType, SchemaError, TypeRef};
use pretty_assertions::assert_eq;

#[test]
fn extensions_are_applied_to_their_base_type() {
    let schema = build_schema(indoc::indoc! {r#"
        type Query { a: String }
        extend type Query { b: Int }

        enum Color { RED }
        extend enum Color { BLUE }

        union Any = Query
        extend union Any = Other
        type Other { id: ID! }

        input Filter { a: String }
        extend input Filter { b: [Int!] }
    "#})
    .unwrap();

    let query = schema.object("Query").unwrap();
    assert_eq!(query.fields.keys().map(|name| name.as_str()).collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(query.extension_ast_nodes.len(), 1);

    let color = schema.get_type("Color").and_then(NamedType::as_enum).unwrap();
    assert_eq!(color.values.keys().map(|name| name.as_str()).collect::<Vec<_>>(), ["RED", "BLUE"]);

    assert_eq!(schema.possible_types("Any").len(), 2);

    let filter = schema.get_type("Filter").and_then(NamedType::as_input_object).unwrap();
    assert_eq!(filter.fields["b"].ty, TypeRef::parse("[Int!]").unwrap());
}

#[test]
fn definition_errors() {
    let error = build_schema("type Query { a: String } extend type Missing { b: Int }").unwrap_err();
    assert_eq!(error, SchemaError::UnknownExtendedType("Missing".into()));
    assert_eq!(error.to_string(), "Cannot extend type \"Missing\" because it is not defined.");

    let error = build_schema("type Query { a: String } extend enum Query { B }").unwrap_err();
    assert_eq!(error.to_string(), "Cannot extend non-object type \"Query\".");

    let error = build_schema("type Query { a: String } type Query { b: String }").unwrap_err();
    assert_eq!(error.to_string(), "There can be only one type named \"Query\".");

    let error = build_schema("type Query { a: String } extend type Query { a: Int }").unwrap_err();
    assert_eq!(error.to_string(), "Field \"Query.a\" can only be defined once.");
}

#[test]
fn schema_definition_selects_root_types() {
    let schema = build_schema(
        r"
        schema { query: Root mutation: Change }
        type Root { a: String }
        type Change { b: String }
        type Query { unused: String }
        ",
    )
    .unwrap();

    assert_eq!(schema.query_type().map(|root| root.name.as_str()), Some("Root"));
    assert_eq!(schema.mutation_type().map(|root| root.name.as_str()), Some("Change"));
    assert!(schema.subscription_type().is_none());
    assert!(schema.is_root_type("Change"));
    assert!(!schema.is_root_type("Query"));
}

#[test]
fn deprecations_and_defaults() {
    let schema = build_schema(
        r#"
        type Query {
          old(limit: Int = 10): String @deprecated
          older: String @deprecated(reason: "gone")
        }
        "#,
    )
    .unwrap();

    let query = schema.object("Query").unwrap();
    assert_eq!(query.fields["old"].deprecation_reason.as_deref(), Some("No longer supported"));
    assert_eq!(query.fields["older"].deprecation_reason.as_deref(), Some("gone"));
    assert_eq!(
        query.fields["old"].arguments["limit"].default_value,
        Some(graphql_toolkit_schema::ConstValue::from(10))
    );
}

#[test]
fn printed_sdl_rebuilds_the_same_schema() {
    let sdl = indoc::indoc! {r#"
        schema {
          query: Root
        }

        directive @auth(requires: Role = ADMIN) on OBJECT | FIELD_DEFINITION

        """A node"""
        interface Node {
          id: ID!
        }

        type Root implements Node @auth {
          id: ID!
          users(first: Int = 10, filter: UserFilter): [User!]! @auth(requires: USER)
        }

        type User implements Node {
          id: ID!
          role: Role
        }

        enum Role {
          ADMIN
          USER
        }

        input UserFilter {
          role: Role
        }

        scalar Date @specifiedBy(url: "https://example.com/date")
    "#};

    let schema = build_schema(sdl).unwrap();
    let printed = schema.sdl();

    assert_eq!(printed, sdl);

    let rebuilt = build_schema(&printed).unwrap();
    assert_eq!(rebuilt.sdl(), printed);
}
